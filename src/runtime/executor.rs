//! Session runtime executor

use super::{Envelope, SessionEvent};

use crate::contract::ClassifierBackend;
use crate::session::{transition, Effect, Event, SessionSnapshot, SessionState};
use std::future::Future;
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, watch};

/// Owns the session state and executes the effects of each transition
pub struct SessionRuntime<B>
where
    B: ClassifierBackend + 'static,
{
    session_id: String,
    state: SessionState,
    backend: Arc<B>,
    event_rx: mpsc::Receiver<Envelope>,
    /// Upgraded per backend call so the loop can end once handles are gone
    event_tx: mpsc::WeakSender<Envelope>,
    broadcast_tx: broadcast::Sender<SessionEvent>,
    snapshot_tx: watch::Sender<SessionSnapshot>,
}

impl<B> SessionRuntime<B>
where
    B: ClassifierBackend + 'static,
{
    pub(crate) fn new(
        session_id: String,
        backend: B,
        event_rx: mpsc::Receiver<Envelope>,
        event_tx: mpsc::WeakSender<Envelope>,
        broadcast_tx: broadcast::Sender<SessionEvent>,
        snapshot_tx: watch::Sender<SessionSnapshot>,
    ) -> Self {
        Self {
            session_id,
            state: SessionState::new(),
            backend: Arc::new(backend),
            event_rx,
            event_tx,
            broadcast_tx,
            snapshot_tx,
        }
    }

    pub async fn run(mut self) {
        tracing::info!(session_id = %self.session_id, "Starting session runtime");

        while let Some(envelope) = self.event_rx.recv().await {
            self.process_event(envelope);
        }

        tracing::info!(session_id = %self.session_id, "Session runtime stopped");
    }

    fn process_event(&mut self, envelope: Envelope) {
        let Envelope { event, reply } = envelope;
        let name = event.name();
        let is_intent = event.is_intent();

        let outcome = match transition(&self.state, event) {
            Ok(result) => {
                if result.is_noop() && !is_intent {
                    tracing::debug!(
                        session_id = %self.session_id,
                        event = name,
                        generation = self.state.generation,
                        epoch = self.state.epoch,
                        "Discarding stale completion"
                    );
                } else {
                    tracing::debug!(
                        session_id = %self.session_id,
                        event = name,
                        backend_calls = result.effects.iter().filter(|e| e.is_backend_call()).count(),
                        "Transition committed"
                    );
                }
                self.state = result.new_state;
                for effect in result.effects {
                    self.execute_effect(effect);
                }
                Ok(())
            }
            Err(e) => {
                // Refusals are user-facing (e.g. "classification in progress")
                tracing::warn!(session_id = %self.session_id, event = name, error = %e, "Intent refused");
                let _ = self.broadcast_tx.send(SessionEvent::Error {
                    message: e.to_string(),
                });
                Err(e)
            }
        };

        if let Some(reply) = reply {
            let _ = reply.send(outcome);
        }
    }

    fn execute_effect(&self, effect: Effect) {
        match effect {
            Effect::PublishState => {
                let snapshot = SessionSnapshot::from_state(&self.state);
                self.snapshot_tx.send_replace(snapshot.clone());
                // No subscribers is fine
                let _ = self.broadcast_tx.send(SessionEvent::StateChange { snapshot });
            }

            Effect::Classify { generation, input } => {
                tracing::info!(session_id = %self.session_id, generation, "Classifying email");
                self.spawn_call(move |backend| async move {
                    let outcome = backend.classify(&input).await;
                    Event::ClassifyCompleted {
                        generation,
                        outcome,
                    }
                });
            }

            Effect::SubmitFeedback {
                epoch,
                generation,
                draft,
            } => {
                tracing::info!(
                    session_id = %self.session_id,
                    epoch,
                    predicted = %draft.predicted_category,
                    corrected = draft.corrected_category.is_some(),
                    "Submitting feedback"
                );
                self.spawn_call(move |backend| async move {
                    let outcome = backend.submit_feedback(&draft).await;
                    Event::FeedbackCompleted {
                        epoch,
                        generation,
                        outcome,
                    }
                });
            }

            Effect::Retrain { epoch, generation } => {
                tracing::info!(session_id = %self.session_id, epoch, "Requesting retrain");
                self.spawn_call(move |backend| async move {
                    let outcome = backend.retrain().await;
                    Event::RetrainCompleted {
                        epoch,
                        generation,
                        outcome,
                    }
                });
            }
        }
    }

    /// Run a backend call in the background and feed its completion back in
    fn spawn_call<F, Fut>(&self, call: F)
    where
        F: FnOnce(Arc<B>) -> Fut + Send + 'static,
        Fut: Future<Output = Event> + Send + 'static,
    {
        let Some(event_tx) = self.event_tx.upgrade() else {
            tracing::warn!(session_id = %self.session_id, "Session closing, dropping backend call");
            return;
        };
        let backend = Arc::clone(&self.backend);

        tokio::spawn(async move {
            let event = call(backend).await;
            if event_tx.send(Envelope::completion(event)).await.is_err() {
                tracing::debug!("Session stopped before completion was delivered");
            }
        });
    }
}
