//! Runtime for driving the email session
//!
//! One event loop owns the session state. Intents arrive with a reply
//! channel; backend calls run as background tasks and post their
//! completion back into the same loop, so the state is only ever touched
//! in one place.

mod executor;


use executor::SessionRuntime;

use crate::contract::ClassifierBackend;
use crate::session::{Event, SessionSnapshot, TransitionError};
use thiserror::Error;
use tokio::sync::{broadcast, mpsc, oneshot, watch};

const EVENT_CHANNEL_CAPACITY: usize = 32;
const BROADCAST_CAPACITY: usize = 128;

/// Events sent to SSE clients
#[derive(Debug, Clone)]
pub enum SessionEvent {
    StateChange { snapshot: SessionSnapshot },
    Error { message: String },
}

/// An event on its way into the loop. Intents carry a reply; completions don't.
pub(crate) struct Envelope {
    pub event: Event,
    pub reply: Option<oneshot::Sender<Result<(), TransitionError>>>,
}

impl Envelope {
    pub fn completion(event: Event) -> Self {
        Self { event, reply: None }
    }
}

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error(transparent)]
    Rejected(#[from] TransitionError),
    #[error("Sessão encerrada")]
    Stopped,
}

/// Handle to interact with a running session
#[derive(Clone)]
pub struct SessionHandle {
    session_id: String,
    event_tx: mpsc::Sender<Envelope>,
    broadcast_tx: broadcast::Sender<SessionEvent>,
    snapshot_rx: watch::Receiver<SessionSnapshot>,
}

impl SessionHandle {
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Send an intent and wait until the loop has committed (or refused) it.
    /// Backend calls the intent starts are still running when this returns.
    pub async fn dispatch(&self, event: Event) -> Result<(), DispatchError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.event_tx
            .send(Envelope {
                event,
                reply: Some(reply_tx),
            })
            .await
            .map_err(|_| DispatchError::Stopped)?;
        reply_rx.await.map_err(|_| DispatchError::Stopped)??;
        Ok(())
    }

    /// Latest published snapshot
    pub fn snapshot(&self) -> SessionSnapshot {
        self.snapshot_rx.borrow().clone()
    }

    #[cfg(test)]
    pub fn watch(&self) -> watch::Receiver<SessionSnapshot> {
        self.snapshot_rx.clone()
    }

    /// Subscribe to state changes and refused intents
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.broadcast_tx.subscribe()
    }
}

/// Start a session loop on the current tokio runtime.
///
/// The loop stops once every handle is dropped and no backend call is in flight.
pub fn spawn<B: ClassifierBackend + 'static>(backend: B) -> SessionHandle {
    let session_id = uuid::Uuid::new_v4().to_string();
    let (event_tx, event_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
    let (broadcast_tx, _) = broadcast::channel(BROADCAST_CAPACITY);
    let (snapshot_tx, snapshot_rx) = watch::channel(SessionSnapshot::default());

    let runtime = SessionRuntime::new(
        session_id.clone(),
        backend,
        event_rx,
        event_tx.downgrade(),
        broadcast_tx.clone(),
        snapshot_tx,
    );

    let id = session_id.clone();
    tokio::spawn(async move {
        runtime.run().await;
        tracing::info!(session_id = %id, "Session runtime finished");
    });

    SessionHandle {
        session_id,
        event_tx,
        broadcast_tx,
        snapshot_rx,
    }
}
