//! Output collaborators and the result-screen registry
//!
//! Everything the session emits goes through these traits and is delivered
//! synchronously inside the tick that decided it.

use serde::{Deserialize, Serialize};

use crate::consts::WARNING_ELEMENT_NAME;

/// Handle for a UI element registered by the owning scene
pub type ElementId = u32;

/// Commands the session issues to the surrounding game
pub trait KioskHooks {
    /// A participant has locked in (or was preserved across a restart)
    fn start_game(&mut self);

    /// Tear down the current session and reload the menu
    fn reset_to_menu(&mut self);

    /// Show or hide the "come back" warning on the active result screen
    fn show_warning(&mut self, target: ElementId, visible: bool);

    /// Menu hand-gesture input on/off
    fn set_gestures_enabled(&mut self, _enabled: bool) {}
}

/// Lock-in progress display
pub trait FeedbackSink {
    /// Show the progress ring at `progress` in [0, 1]
    fn update_progress(&mut self, progress: f32);

    fn hide(&mut self);
}

/// Which result screen is showing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResultKind {
    Win,
    Lose,
}

/// A named element on a result screen
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UiElement {
    pub name: String,
    pub id: ElementId,
}

impl UiElement {
    pub fn new(name: impl Into<String>, id: ElementId) -> Self {
        Self {
            name: name.into(),
            id,
        }
    }
}

/// One result screen as registered by the scene
#[derive(Debug, Clone, Default)]
pub struct ResultScreen {
    /// Explicitly assigned warning element (preferred)
    pub warning: Option<ElementId>,
    /// Elements registered by name, searched when no warning is assigned
    pub elements: Vec<UiElement>,
}

impl ResultScreen {
    pub fn with_warning(warning: ElementId) -> Self {
        Self {
            warning: Some(warning),
            elements: Vec::new(),
        }
    }

    pub fn with_elements(elements: Vec<UiElement>) -> Self {
        Self {
            warning: None,
            elements,
        }
    }

    /// The warning element: assigned one first, then the registry by name
    pub fn resolve_warning(&self) -> Option<ElementId> {
        self.warning.or_else(|| {
            self.elements
                .iter()
                .find(|e| e.name == WARNING_ELEMENT_NAME)
                .map(|e| e.id)
        })
    }
}

/// Both result screens. Either may be missing from a scene.
#[derive(Debug, Clone, Default)]
pub struct ResultScreens {
    pub win: Option<ResultScreen>,
    pub lose: Option<ResultScreen>,
}

impl ResultScreens {
    pub fn screen(&self, kind: ResultKind) -> Option<&ResultScreen> {
        match kind {
            ResultKind::Win => self.win.as_ref(),
            ResultKind::Lose => self.lose.as_ref(),
        }
    }

    /// Warning target for the active screen, if one can be resolved
    pub fn warning_for(&self, kind: ResultKind) -> Option<ElementId> {
        self.screen(kind).and_then(ResultScreen::resolve_warning)
    }
}
