//! Presence-driven session control
//!
//! Decides who the active participant is and when games start and end.
//! Like a game simulation step, it is driven entirely by the caller:
//! - One `tick` per frame with an explicit `dt`
//! - No threads, no wall clock, no global lookups
//! - Collaborators are handed in at construction

pub mod hooks;
pub mod selector;
pub mod state;
pub mod tick;
pub mod zone;

pub use hooks::{
    ElementId, FeedbackSink, KioskHooks, ResultKind, ResultScreen, ResultScreens, UiElement,
};
pub use selector::{select_candidate, select_candidate_excluding};
pub use state::{SessionSnapshot, SessionState, SessionStatus, SessionTimers};
pub use tick::{ExhibitionSession, TickInput};
pub use zone::PlayZone;
