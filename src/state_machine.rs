//! Send-message state machine
//!
//! Pure state transitions in the Elm Architecture style: the runtime feeds
//! events in and executes the returned effects.

mod effect;
pub mod event;
pub mod state;
pub(crate) mod transition;

#[cfg(test)]
mod proptests;

pub use effect::Effect;
pub use event::Event;
pub use state::{ConvContext, ConvState};
pub use transition::{transition, TransitionError};
#[cfg(test)]
pub use transition::APOLOGY_MESSAGE;
