//! Email session state machine
//!
//! Elm-style: a pure `transition` maps (state, event) to a new state plus
//! effects. The runtime owns the state and executes the effects.

mod display;
mod effect;
pub mod event;
pub mod state;
pub(crate) mod transition;

#[cfg(test)]
mod proptests;

pub use display::SessionSnapshot;
pub use effect::Effect;
pub use event::{CorrectionEdit, Event};
pub use state::{SessionState, SessionStatus};
pub use transition::{transition, TransitionError, TransitionResult};
