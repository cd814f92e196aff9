//! Kiosk Presence headless driver
//!
//! Runs the session against a seeded visitor script at a fixed timestep and
//! plays the part of the surrounding game: rounds end on a win/lose screen,
//! menu resets reload the session, and a replacement participant restarts
//! the round.
//!
//! Usage: `kiosk-presence [settings.json] [seed]`

use std::path::PathBuf;

use kiosk_presence::consts::SIM_DT;
use kiosk_presence::session::{
    ElementId, ExhibitionSession, FeedbackSink, KioskHooks, ResultKind, ResultScreen,
    ResultScreens, SessionState, TickInput, UiElement,
};
use kiosk_presence::visitors::VisitorScript;
use kiosk_presence::{Settings, TrackedBodies};

/// Simulated round length before a result screen appears
const ROUND_SECONDS: f32 = 25.0;
const VISITOR_COUNT: usize = 12;
const VISITOR_SPAN: f32 = 240.0;

const WIN_WARNING: ElementId = 10;
const LOSE_WARNING: ElementId = 21;

/// Stand-in for the game, menu and result screens
struct KioskShell {
    showing_menu: bool,
    playing: bool,
    result: Option<ResultKind>,
    round_time: f32,
    rounds: u32,
    /// Restart requested by a menu reset (not fast)
    reload_menu: bool,
}

impl KioskShell {
    fn new() -> Self {
        Self {
            showing_menu: true,
            playing: false,
            result: None,
            round_time: 0.0,
            rounds: 0,
            reload_menu: false,
        }
    }

    /// Run the round clock; a finished round shows a result screen
    fn advance(&mut self, dt: f32) {
        if !self.playing || self.result.is_some() {
            return;
        }
        self.round_time += dt;
        if self.round_time >= ROUND_SECONDS {
            let kind = if self.rounds % 2 == 0 {
                ResultKind::Win
            } else {
                ResultKind::Lose
            };
            log::info!("Round {} over: {:?}", self.rounds + 1, kind);
            self.result = Some(kind);
            self.rounds += 1;
        }
    }

    fn input(&self) -> TickInput {
        TickInput {
            result_screen: self.result,
            showing_menu: self.showing_menu,
        }
    }

    /// Result screen dismissed for a new round
    fn replay(&mut self) {
        self.result = None;
        self.playing = false;
    }
}

impl KioskHooks for KioskShell {
    fn start_game(&mut self) {
        log::info!("Game started");
        self.showing_menu = false;
        self.playing = true;
        self.round_time = 0.0;
    }

    fn reset_to_menu(&mut self) {
        log::info!("Reset to menu");
        self.showing_menu = true;
        self.playing = false;
        self.result = None;
        self.reload_menu = true;
    }

    fn show_warning(&mut self, target: ElementId, visible: bool) {
        log::info!("Warning element {target} visible: {visible}");
    }

    fn set_gestures_enabled(&mut self, enabled: bool) {
        log::debug!("Menu gestures enabled: {enabled}");
    }
}

/// Progress ring that logs quarter steps
#[derive(Default)]
struct LogRing {
    last_quarter: Option<u8>,
}

impl FeedbackSink for LogRing {
    fn update_progress(&mut self, progress: f32) {
        let quarter = (progress * 4.0) as u8;
        if self.last_quarter != Some(quarter) {
            log::info!("Lock-in progress {:.0}%", progress * 100.0);
            self.last_quarter = Some(quarter);
        }
    }

    fn hide(&mut self) {
        log::debug!("Lock-in feedback hidden");
        self.last_quarter = None;
    }
}

fn main() {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let settings = args
        .next()
        .map(PathBuf::from)
        .map(|path| Settings::load_or_default(&path))
        .unwrap_or_default();
    let seed = args.next().and_then(|s| s.parse().ok()).unwrap_or(42);
    log::info!("Kiosk Presence (headless) starting with seed {seed}");

    let screens = ResultScreens {
        win: Some(ResultScreen::with_warning(WIN_WARNING)),
        lose: Some(ResultScreen::with_elements(vec![
            UiElement::new("GameOverTitle", 20),
            UiElement::new("Warning", LOSE_WARNING),
        ])),
    };

    let mut script = VisitorScript::random(seed, VISITOR_COUNT, VISITOR_SPAN);
    let mut session = ExhibitionSession::new(settings, Some(TrackedBodies::new()), KioskShell::new())
        .with_feedback(LogRing::default())
        .with_result_screens(screens);

    let steps = ((script.duration() + 30.0) / SIM_DT) as u64;
    let mut last_primary = None;

    for step in 0..steps {
        let frame = script.frame(SIM_DT);
        if let Some(presence) = session.presence_mut() {
            presence.update_frame(frame);
        }

        let shell = session.hooks_mut();
        shell.advance(SIM_DT);
        let input = shell.input();
        session.tick(&input, SIM_DT);

        // Menu reload: forget everyone and warm up again
        if std::mem::take(&mut session.hooks_mut().reload_menu) {
            if let Some(presence) = session.presence_mut() {
                presence.clear_users();
            }
            session.restart(false);
        }

        // A replacement participant restarts the round straight away
        let primary = session.primary_id();
        if session.state() == SessionState::Result && primary != last_primary {
            session.hooks_mut().replay();
            session.restart(true);
        }
        last_primary = primary;

        if step % 60 == 0 {
            match serde_json::to_string(&session.snapshot()) {
                Ok(json) => log::debug!("{json}"),
                Err(err) => log::warn!("Snapshot not serializable: {err}"),
            }
        }
    }

    log::info!(
        "Finished after {:.0}s: {} rounds played",
        script.time(),
        session.hooks().rounds
    );
}
