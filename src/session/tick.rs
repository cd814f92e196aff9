//! Per-frame session tick
//!
//! Advances the session state machine by one frame. All waiting is done by
//! accumulating `dt` against thresholds, so a run can be replayed exactly
//! from a list of frames.

use super::hooks::{ElementId, FeedbackSink, KioskHooks, ResultKind, ResultScreens};
use super::selector::{select_candidate, select_candidate_excluding};
use super::state::{SessionSnapshot, SessionState, SessionStatus, SessionTimers};
use crate::clamp01;
use crate::presence::{BodyId, Candidate, PresenceSource};
use crate::settings::Settings;

/// External flags sampled once per frame
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Win/lose screen currently showing
    pub result_screen: Option<ResultKind>,
    /// Main menu is on screen (no idle timeout there)
    pub showing_menu: bool,
}

/// The kiosk session controller
pub struct ExhibitionSession<P, H, F> {
    settings: Settings,
    state: SessionState,
    timers: SessionTimers,
    /// Candidate locking in (Scanning) or replacement (Result)
    pending_id: Option<BodyId>,

    presence: Option<P>,
    hooks: H,
    feedback: Option<F>,
    result_screens: ResultScreens,

    /// Warning element resolved on Result entry
    active_warning: Option<ElementId>,
    warning_visible: bool,
    feedback_visible: bool,
    /// `reset_to_menu` already sent for the current absence
    menu_reset_sent: bool,
    /// Missing-sensor warning already logged
    sensor_warned: bool,
    /// Skip the warmup settle delay
    fast_restart: bool,
}

impl<P, H, F> ExhibitionSession<P, H, F>
where
    P: PresenceSource,
    H: KioskHooks,
    F: FeedbackSink,
{
    /// Create a session in Warmup. `presence` may be `None` until the
    /// sensor comes up; the session waits for it.
    pub fn new(settings: Settings, presence: Option<P>, hooks: H) -> Self {
        Self {
            settings,
            state: SessionState::Warmup,
            timers: SessionTimers::default(),
            pending_id: None,
            presence,
            hooks,
            feedback: None,
            result_screens: ResultScreens::default(),
            active_warning: None,
            warning_visible: false,
            feedback_visible: false,
            menu_reset_sent: false,
            sensor_warned: false,
            fast_restart: false,
        }
    }

    pub fn with_feedback(mut self, feedback: F) -> Self {
        self.feedback = Some(feedback);
        self
    }

    pub fn with_result_screens(mut self, screens: ResultScreens) -> Self {
        self.result_screens = screens;
        self
    }

    /// Skip the settle delay so a preserved primary is picked up on the
    /// first tick
    pub fn with_fast_restart(mut self, fast_restart: bool) -> Self {
        self.fast_restart = fast_restart;
        self
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn timers(&self) -> &SessionTimers {
        &self.timers
    }

    pub fn pending_id(&self) -> Option<BodyId> {
        self.pending_id
    }

    pub fn primary_id(&self) -> Option<BodyId> {
        self.presence.as_ref().and_then(|p| p.primary_id())
    }

    pub fn warning_visible(&self) -> bool {
        self.warning_visible
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn hooks(&self) -> &H {
        &self.hooks
    }

    pub fn hooks_mut(&mut self) -> &mut H {
        &mut self.hooks
    }

    pub fn feedback(&self) -> Option<&F> {
        self.feedback.as_ref()
    }

    pub fn presence(&self) -> Option<&P> {
        self.presence.as_ref()
    }

    /// Sensor drivers push frames through this
    pub fn presence_mut(&mut self) -> Option<&mut P> {
        self.presence.as_mut()
    }

    /// Sensor came up (or was replaced)
    pub fn attach_presence(&mut self, presence: P) {
        self.presence = Some(presence);
    }

    /// Sensor went away; the session pauses until one is attached again
    pub fn detach_presence(&mut self) -> Option<P> {
        self.presence.take()
    }

    /// Back to Warmup after an external restart signal
    pub fn restart(&mut self, fast_restart: bool) {
        log::info!(
            "Session restart from {} (fast: {})",
            self.state.as_str(),
            fast_restart
        );
        self.hide_warning();
        self.hide_feedback();
        self.state = SessionState::Warmup;
        self.timers.reset();
        self.pending_id = None;
        self.active_warning = None;
        self.menu_reset_sent = false;
        self.fast_restart = fast_restart;
    }

    /// Status line for the waiting screen
    pub fn status(&self) -> SessionStatus {
        match self.state {
            SessionState::Warmup if self.timers.state < self.warmup_delay() => {
                SessionStatus::Initializing
            }
            _ if !self.presence_available() => SessionStatus::WaitingForSensor,
            SessionState::Warmup => SessionStatus::Initializing,
            SessionState::Idle => SessionStatus::StandInFront,
            SessionState::Scanning => SessionStatus::LockingIn,
            SessionState::Gameplay => SessionStatus::Playing,
            SessionState::Result => SessionStatus::Result,
        }
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            state: self.state,
            status: self.status(),
            timers: self.timers,
            pending_id: self.pending_id,
            primary_id: self.primary_id(),
            tracked_bodies: self.presence.as_ref().map_or(0, |p| p.candidate_count()),
            warning_visible: self.warning_visible,
        }
    }

    /// Advance the session by one frame
    pub fn tick(&mut self, input: &TickInput, dt: f32) {
        if self.state == SessionState::Warmup {
            self.tick_warmup(dt);
            return;
        }

        if !self.check_presence() {
            return;
        }

        // Result screen shown or dismissed by gameplay
        match (self.state, input.result_screen) {
            (SessionState::Gameplay, Some(kind)) => {
                self.enter_result(kind);
                return;
            }
            (SessionState::Result, None) => {
                self.leave_result();
                return;
            }
            _ => {}
        }

        match self.state {
            SessionState::Warmup => {}
            SessionState::Idle => self.tick_idle(input, dt),
            SessionState::Scanning => self.tick_scanning(dt),
            SessionState::Gameplay => self.tick_gameplay(dt),
            SessionState::Result => self.tick_result(dt),
        }
    }

    fn tick_warmup(&mut self, dt: f32) {
        self.timers.state += dt;
        if self.timers.state < self.warmup_delay() {
            return;
        }
        if !self.check_presence() {
            return;
        }

        // A primary preserved across a restart skips the lock-in
        let preserved = self
            .presence
            .as_ref()
            .and_then(|p| p.primary_id().filter(|&id| p.is_tracked(id)));

        match preserved {
            Some(id) => {
                log::info!("Found existing primary {id}; fast-tracking to gameplay");
                self.start_gameplay();
            }
            None => self.enter_idle(),
        }
    }

    fn tick_idle(&mut self, input: &TickInput, dt: f32) {
        let candidates = self.candidates();
        if let Some(id) = select_candidate(&self.settings.zone, &candidates) {
            log::info!("Candidate {id} entered the zone; locking in");
            self.pending_id = Some(id);
            self.timers.state = 0.0;
            self.transition(SessionState::Scanning);
            return;
        }

        // Nobody is expected while the menu is up
        if input.showing_menu {
            return;
        }

        self.timers.idle_or_abandon += dt;
        if self.timers.idle_or_abandon >= self.settings.abandon_timeout {
            self.request_menu_reset("nobody in front of the kiosk");
        }
    }

    fn tick_scanning(&mut self, dt: f32) {
        let Some(pending) = self.pending_id else {
            self.enter_idle();
            return;
        };

        // Only a fully empty frame aborts; a different body at index 0
        // keeps the lock-in running
        let (first, count) = self
            .presence
            .as_ref()
            .map_or((None, 0), |p| (p.candidate_id_at(0), p.candidate_count()));
        if first != Some(pending) && count == 0 {
            log::info!("Candidate {pending} left before lock-in");
            self.enter_idle();
            return;
        }

        self.timers.state += dt;
        self.show_progress(self.timers.state / self.settings.lock_in_duration);

        if self.timers.state >= self.settings.lock_in_duration {
            if let Some(presence) = self.presence.as_mut() {
                presence.set_primary_id(pending);
            }
            log::info!("Participant {pending} locked in");
            self.start_gameplay();
        }
    }

    fn tick_gameplay(&mut self, dt: f32) {
        if self.primary_tracked() {
            self.timers.idle_or_abandon = 0.0;
            self.timers.recovery = 0.0;
            self.menu_reset_sent = false;
            return;
        }

        let overflow = self.accumulate_recovery(dt);
        if self.timers.recovery < self.settings.recovery_grace_period {
            return;
        }

        self.timers.idle_or_abandon += overflow;
        if self.timers.idle_or_abandon >= self.settings.abandon_timeout {
            self.request_menu_reset("participant abandoned the game");
        }
    }

    fn tick_result(&mut self, dt: f32) {
        self.timers.state += dt;
        if self.timers.state >= self.settings.abandon_timeout {
            self.request_menu_reset("result screen timed out");
            return;
        }

        if self.primary_tracked() {
            self.timers.recovery = 0.0;
            self.hide_warning();
            return;
        }

        self.timers.recovery += dt;
        if self.timers.recovery < self.settings.recovery_grace_period {
            return;
        }

        self.show_warning();

        let primary = self.primary_id();
        let candidates = self.candidates();
        let Some(id) = select_candidate_excluding(&self.settings.zone, &candidates, primary) else {
            // No progress with nobody present
            self.timers.idle_or_abandon = 0.0;
            self.hide_feedback();
            return;
        };

        if self.pending_id != Some(id) {
            log::info!("Replacement candidate {id} stepped in");
            self.pending_id = Some(id);
            self.timers.idle_or_abandon = 0.0;
        }

        self.timers.idle_or_abandon += dt;
        self.show_progress(self.timers.idle_or_abandon / self.settings.lock_in_duration);

        if self.timers.idle_or_abandon >= self.settings.lock_in_duration {
            if let Some(presence) = self.presence.as_mut() {
                presence.set_primary_id(id);
            }
            log::info!("Primary swapped to {id}");
            self.hide_warning();
            self.hide_feedback();
            self.timers.recovery = 0.0;
            self.timers.idle_or_abandon = 0.0;
            self.pending_id = None;
        }
    }

    fn enter_idle(&mut self) {
        self.transition(SessionState::Idle);
        self.pending_id = None;
        self.timers.state = 0.0;
        self.hide_feedback();
        self.hooks.set_gestures_enabled(true);
    }

    fn start_gameplay(&mut self) {
        self.transition(SessionState::Gameplay);
        self.pending_id = None;
        self.timers.reset();
        self.hide_feedback();
        self.hooks.set_gestures_enabled(false);
        self.hooks.start_game();
    }

    fn enter_result(&mut self, kind: ResultKind) {
        log::info!("{kind:?} screen detected");
        self.transition(SessionState::Result);
        self.timers.state = 0.0;
        self.timers.idle_or_abandon = 0.0;
        self.pending_id = None;

        self.active_warning = self.result_screens.warning_for(kind);
        match self.active_warning {
            Some(target) => {
                self.hooks.show_warning(target, false);
                self.warning_visible = false;
            }
            None => {
                log::error!("No warning element on the {kind:?} screen; absence warning disabled");
            }
        }
    }

    fn leave_result(&mut self) {
        self.hide_warning();
        self.hide_feedback();
        self.active_warning = None;
        self.transition(SessionState::Gameplay);
    }

    fn transition(&mut self, next: SessionState) {
        log::info!("Session {} -> {}", self.state.as_str(), next.as_str());
        self.state = next;
        self.menu_reset_sent = false;
    }

    /// Add `dt` to the recovery timer and return the part of it that fell
    /// past the grace period
    fn accumulate_recovery(&mut self, dt: f32) -> f32 {
        let grace = self.settings.recovery_grace_period;
        let before = self.timers.recovery;
        self.timers.recovery += dt;
        if self.timers.recovery < grace {
            0.0
        } else {
            self.timers.recovery - before.max(grace)
        }
    }

    fn request_menu_reset(&mut self, reason: &str) {
        if self.menu_reset_sent {
            return;
        }
        log::info!("Resetting to menu: {reason}");
        self.menu_reset_sent = true;
        self.hooks.reset_to_menu();
    }

    fn show_progress(&mut self, progress: f32) {
        if !self.settings.visual_feedback {
            return;
        }
        if let Some(feedback) = self.feedback.as_mut() {
            feedback.update_progress(clamp01(progress));
            self.feedback_visible = true;
        }
    }

    fn hide_feedback(&mut self) {
        if !self.feedback_visible {
            return;
        }
        if let Some(feedback) = self.feedback.as_mut() {
            feedback.hide();
        }
        self.feedback_visible = false;
    }

    fn show_warning(&mut self) {
        if let Some(target) = self.active_warning {
            if !self.warning_visible {
                self.hooks.show_warning(target, true);
                self.warning_visible = true;
            }
        }
    }

    fn hide_warning(&mut self) {
        if let Some(target) = self.active_warning {
            if self.warning_visible {
                self.hooks.show_warning(target, false);
                self.warning_visible = false;
            }
        }
    }

    fn warmup_delay(&self) -> f32 {
        if self.fast_restart {
            0.0
        } else {
            self.settings.warmup_duration
        }
    }

    fn presence_available(&self) -> bool {
        self.presence.as_ref().is_some_and(|p| p.is_initialized())
    }

    /// Presence gate: warn once while missing, note when it comes back
    fn check_presence(&mut self) -> bool {
        let available = self.presence_available();
        if !available && !self.sensor_warned {
            log::warn!(
                "Presence source not available; session paused in {}",
                self.state.as_str()
            );
            self.sensor_warned = true;
        } else if available && self.sensor_warned {
            log::info!("Presence source available; resuming");
            self.sensor_warned = false;
        }
        available
    }

    fn candidates(&self) -> Vec<Candidate> {
        self.presence
            .as_ref()
            .map(|p| p.candidates())
            .unwrap_or_default()
    }

    fn primary_tracked(&self) -> bool {
        self.presence
            .as_ref()
            .is_some_and(|p| p.primary_id().is_some_and(|id| p.is_tracked(id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::presence::TrackedBodies;
    use crate::session::hooks::{ResultScreen, UiElement};
    use glam::Vec3;

    const DT: f32 = 0.25;

    #[derive(Debug, Default)]
    struct Recorder {
        started: u32,
        resets: u32,
        warnings: Vec<(ElementId, bool)>,
        gestures: Vec<bool>,
    }

    impl KioskHooks for Recorder {
        fn start_game(&mut self) {
            self.started += 1;
        }

        fn reset_to_menu(&mut self) {
            self.resets += 1;
        }

        fn show_warning(&mut self, target: ElementId, visible: bool) {
            self.warnings.push((target, visible));
        }

        fn set_gestures_enabled(&mut self, enabled: bool) {
            self.gestures.push(enabled);
        }
    }

    #[derive(Debug, Default)]
    struct Ring {
        updates: Vec<f32>,
        hides: u32,
        visible: bool,
    }

    impl FeedbackSink for Ring {
        fn update_progress(&mut self, progress: f32) {
            self.updates.push(progress);
            self.visible = true;
        }

        fn hide(&mut self) {
            self.hides += 1;
            self.visible = false;
        }
    }

    type TestSession = ExhibitionSession<TrackedBodies, Recorder, Ring>;

    const WIN_WARNING: ElementId = 11;
    const LOSE_WARNING: ElementId = 22;

    fn settings() -> Settings {
        Settings {
            warmup_duration: 0.5,
            ..Settings::default()
        }
    }

    fn screens() -> ResultScreens {
        ResultScreens {
            win: Some(ResultScreen::with_warning(WIN_WARNING)),
            lose: Some(ResultScreen::with_elements(vec![
                UiElement::new("GameOver", 21),
                UiElement::new("Warning", LOSE_WARNING),
            ])),
        }
    }

    fn session() -> TestSession {
        ExhibitionSession::new(settings(), Some(TrackedBodies::new()), Recorder::default())
            .with_feedback(Ring::default())
            .with_result_screens(screens())
    }

    fn id(raw: u64) -> BodyId {
        BodyId::new(raw).unwrap()
    }

    fn place(session: &mut TestSession, bodies: &[(u64, f32, f32)]) {
        let frame = bodies
            .iter()
            .map(|&(raw, x, z)| Candidate::new(id(raw), Vec3::new(x, 0.0, z)));
        session.presence_mut().unwrap().update_frame(frame);
    }

    fn ticks(session: &mut TestSession, input: &TickInput, count: usize) {
        for _ in 0..count {
            session.tick(input, DT);
        }
    }

    /// Run Warmup to completion
    fn warmed() -> TestSession {
        let mut session = session();
        ticks(&mut session, &TickInput::default(), 2);
        assert_eq!(session.state(), SessionState::Idle);
        session
    }

    /// Lock body 1 in at the zone center
    fn playing() -> TestSession {
        let mut session = warmed();
        place(&mut session, &[(1, 0.0, 1.0)]);
        ticks(&mut session, &TickInput::default(), 21);
        assert_eq!(session.state(), SessionState::Gameplay);
        session
    }

    fn win() -> TickInput {
        TickInput {
            result_screen: Some(ResultKind::Win),
            ..Default::default()
        }
    }

    #[test]
    fn test_warmup_waits_for_settle_delay() {
        let mut session = session();
        session.tick(&TickInput::default(), DT);
        assert_eq!(session.state(), SessionState::Warmup);
        assert_eq!(session.status(), SessionStatus::Initializing);

        session.tick(&TickInput::default(), DT);
        assert_eq!(session.state(), SessionState::Idle);
        assert_eq!(session.status(), SessionStatus::StandInFront);
        assert_eq!(session.hooks().gestures, vec![true]);
        assert_eq!(session.hooks().started, 0);
    }

    #[test]
    fn test_warmup_fast_tracks_preserved_primary() {
        let mut store = TrackedBodies::new();
        store.update_frame([Candidate::new(id(5), Vec3::new(0.0, 0.0, 1.5))]);
        store.set_primary_id(id(5));

        let mut session: TestSession =
            ExhibitionSession::new(settings(), Some(store), Recorder::default())
                .with_fast_restart(true);
        session.tick(&TickInput::default(), DT);

        assert_eq!(session.state(), SessionState::Gameplay);
        assert_eq!(session.hooks().started, 1);
        assert_eq!(session.hooks().gestures, vec![false]);
        assert_eq!(session.primary_id(), Some(id(5)));
    }

    #[test]
    fn test_warmup_ignores_untracked_primary() {
        let mut store = TrackedBodies::new();
        store.set_primary_id(id(5));

        let mut session: TestSession =
            ExhibitionSession::new(settings(), Some(store), Recorder::default());
        ticks(&mut session, &TickInput::default(), 2);

        assert_eq!(session.state(), SessionState::Idle);
        assert_eq!(session.hooks().started, 0);
    }

    #[test]
    fn test_missing_sensor_pauses_in_warmup() {
        let mut session: TestSession =
            ExhibitionSession::new(settings(), None, Recorder::default());
        ticks(&mut session, &TickInput::default(), 40);
        assert_eq!(session.state(), SessionState::Warmup);
        assert_eq!(session.status(), SessionStatus::WaitingForSensor);

        session.attach_presence(TrackedBodies::new());
        session.tick(&TickInput::default(), DT);
        assert_eq!(session.state(), SessionState::Idle);
    }

    #[test]
    fn test_uninitialized_sensor_pauses_idle() {
        let mut session = warmed();
        session.presence_mut().unwrap().set_initialized(false);

        let input = TickInput::default();
        ticks(&mut session, &input, 100);
        assert_eq!(session.state(), SessionState::Idle);
        assert_eq!(session.timers().idle_or_abandon, 0.0);
        assert_eq!(session.hooks().resets, 0);
        assert_eq!(session.status(), SessionStatus::WaitingForSensor);

        session.presence_mut().unwrap().set_initialized(true);
        place(&mut session, &[(3, 0.0, 1.0)]);
        session.tick(&input, DT);
        assert_eq!(session.state(), SessionState::Scanning);
    }

    #[test]
    fn test_detached_sensor_freezes_gameplay() {
        let mut session = playing();
        let store = session.detach_presence().unwrap();
        ticks(&mut session, &TickInput::default(), 200);
        assert_eq!(session.state(), SessionState::Gameplay);
        assert_eq!(session.timers().recovery, 0.0);
        assert_eq!(session.hooks().resets, 0);

        session.attach_presence(store);
        session.tick(&TickInput::default(), DT);
        assert_eq!(session.timers().recovery, 0.0);
    }

    #[test]
    fn test_scenario_a_lock_in() {
        let mut session = warmed();
        place(&mut session, &[(1, 0.0, 1.0)]);

        session.tick(&TickInput::default(), DT);
        assert_eq!(session.state(), SessionState::Scanning);
        assert_eq!(session.pending_id(), Some(id(1)));
        assert_eq!(session.status(), SessionStatus::LockingIn);

        ticks(&mut session, &TickInput::default(), 20);
        assert_eq!(session.state(), SessionState::Gameplay);
        assert_eq!(session.primary_id(), Some(id(1)));
        assert_eq!(session.pending_id(), None);
        assert_eq!(session.hooks().started, 1);
        assert_eq!(session.hooks().gestures, vec![true, false]);

        let ring = session.feedback().unwrap();
        assert!(!ring.visible);
        assert_eq!(ring.hides, 1);
    }

    #[test]
    fn test_lock_in_boundary_tick() {
        let mut session = warmed();
        place(&mut session, &[(1, 0.0, 1.0)]);
        session.tick(&TickInput::default(), DT);

        // 19 ticks = 4.75 s
        ticks(&mut session, &TickInput::default(), 19);
        assert_eq!(session.state(), SessionState::Scanning);
        assert_eq!(session.timers().state, 4.75);

        // exactly 5.0 s
        session.tick(&TickInput::default(), DT);
        assert_eq!(session.state(), SessionState::Gameplay);
    }

    #[test]
    fn test_scanning_progress_monotonic() {
        let mut session = warmed();
        place(&mut session, &[(1, 0.2, 1.4)]);
        session.tick(&TickInput::default(), DT);

        let mut last_timer = session.timers().state;
        for _ in 0..19 {
            session.tick(&TickInput::default(), DT);
            assert!(session.timers().state > last_timer);
            last_timer = session.timers().state;
        }

        let updates = &session.feedback().unwrap().updates;
        assert_eq!(updates.len(), 19);
        assert!(updates.windows(2).all(|w| w[0] <= w[1]));
        assert!(updates.iter().all(|p| (0.0..=1.0).contains(p)));
        assert_eq!(updates[0], 0.05);
    }

    #[test]
    fn test_scanning_without_visual_feedback() {
        let mut settings = settings();
        settings.visual_feedback = false;
        let mut session: TestSession =
            ExhibitionSession::new(settings, Some(TrackedBodies::new()), Recorder::default())
                .with_feedback(Ring::default());
        ticks(&mut session, &TickInput::default(), 2);
        place(&mut session, &[(1, 0.0, 1.0)]);
        ticks(&mut session, &TickInput::default(), 21);

        assert_eq!(session.state(), SessionState::Gameplay);
        let ring = session.feedback().unwrap();
        assert!(ring.updates.is_empty());
        assert_eq!(ring.hides, 0);
    }

    #[test]
    fn test_scanning_aborts_on_empty_frame() {
        let mut session = warmed();
        place(&mut session, &[(1, 0.0, 1.0)]);
        ticks(&mut session, &TickInput::default(), 8);
        assert_eq!(session.state(), SessionState::Scanning);

        place(&mut session, &[]);
        session.tick(&TickInput::default(), DT);
        assert_eq!(session.state(), SessionState::Idle);
        assert_eq!(session.pending_id(), None);
        assert_eq!(session.timers().state, 0.0);
        assert_eq!(session.feedback().unwrap().hides, 1);
    }

    #[test]
    fn test_scanning_continues_with_other_body_first() {
        let mut session = warmed();
        place(&mut session, &[(1, 0.0, 1.0)]);
        session.tick(&TickInput::default(), DT);

        // Pending body gone but someone else is tracked: lock-in keeps going
        place(&mut session, &[(8, 1.0, 2.0)]);
        ticks(&mut session, &TickInput::default(), 20);
        assert_eq!(session.state(), SessionState::Gameplay);
        assert_eq!(session.primary_id(), Some(id(1)));
    }

    #[test]
    fn test_idle_ignores_out_of_zone_bodies() {
        let mut session = warmed();
        place(&mut session, &[(1, 2.0, 1.0), (2, 0.0, 3.5)]);
        ticks(&mut session, &TickInput::default(), 10);
        assert_eq!(session.state(), SessionState::Idle);
    }

    #[test]
    fn test_idle_picks_nearest() {
        let mut session = warmed();
        place(&mut session, &[(4, 0.5, 2.2), (6, 0.1, 0.9)]);
        session.tick(&TickInput::default(), DT);
        assert_eq!(session.pending_id(), Some(id(6)));
    }

    #[test]
    fn test_idle_timeout_off_menu() {
        let mut session = warmed();
        let input = TickInput::default();

        ticks(&mut session, &input, 59);
        assert_eq!(session.hooks().resets, 0);
        session.tick(&input, DT);
        assert_eq!(session.hooks().resets, 1);

        ticks(&mut session, &input, 20);
        assert_eq!(session.state(), SessionState::Idle);
        assert_eq!(session.hooks().resets, 1);
    }

    #[test]
    fn test_scenario_e_no_timeout_on_menu() {
        let mut session = warmed();
        let input = TickInput {
            showing_menu: true,
            ..Default::default()
        };
        ticks(&mut session, &input, 400);
        assert_eq!(session.state(), SessionState::Idle);
        assert_eq!(session.timers().idle_or_abandon, 0.0);
        assert_eq!(session.hooks().resets, 0);
    }

    #[test]
    fn test_scenario_b_brief_occlusion() {
        let mut session = playing();
        let input = TickInput::default();

        place(&mut session, &[]);
        for _ in 0..2 {
            session.tick(&input, DT);
            assert_eq!(session.timers().idle_or_abandon, 0.0);
        }
        assert_eq!(session.timers().recovery, 0.5);

        place(&mut session, &[(1, 0.0, 1.0)]);
        session.tick(&input, DT);
        assert_eq!(session.state(), SessionState::Gameplay);
        assert_eq!(session.timers().recovery, 0.0);
        assert_eq!(session.timers().idle_or_abandon, 0.0);
        assert_eq!(session.hooks().resets, 0);
    }

    #[test]
    fn test_scenario_c_abandon_fires_once() {
        let mut session = playing();
        let input = TickInput::default();
        place(&mut session, &[]);

        // 15.75 s gone: 14.75 s past grace
        ticks(&mut session, &input, 63);
        assert_eq!(session.timers().idle_or_abandon, 14.75);
        assert_eq!(session.hooks().resets, 0);

        // 16 s gone: 15 s past grace
        session.tick(&input, DT);
        assert_eq!(session.timers().idle_or_abandon, 15.0);
        assert_eq!(session.hooks().resets, 1);

        ticks(&mut session, &input, 40);
        assert_eq!(session.hooks().resets, 1);
    }

    #[test]
    fn test_abandon_rearms_after_return() {
        let mut session = playing();
        let input = TickInput::default();

        place(&mut session, &[]);
        ticks(&mut session, &input, 64);
        assert_eq!(session.hooks().resets, 1);

        place(&mut session, &[(1, 0.0, 1.0)]);
        session.tick(&input, DT);
        place(&mut session, &[]);
        ticks(&mut session, &input, 64);
        assert_eq!(session.hooks().resets, 2);
    }

    #[test]
    fn test_result_entry_hides_warning() {
        let mut session = playing();
        session.tick(&win(), DT);

        assert_eq!(session.state(), SessionState::Result);
        assert_eq!(session.timers().state, 0.0);
        assert_eq!(session.timers().idle_or_abandon, 0.0);
        assert_eq!(session.pending_id(), None);
        assert_eq!(session.hooks().warnings, vec![(WIN_WARNING, false)]);
    }

    #[test]
    fn test_result_warning_found_by_name() {
        let mut session = playing();
        let lose = TickInput {
            result_screen: Some(ResultKind::Lose),
            ..Default::default()
        };
        session.tick(&lose, DT);
        assert_eq!(session.hooks().warnings, vec![(LOSE_WARNING, false)]);
    }

    #[test]
    fn test_result_dismissed_returns_to_gameplay() {
        let mut session = playing();
        session.tick(&win(), DT);
        ticks(&mut session, &win(), 4);

        session.tick(&TickInput::default(), DT);
        assert_eq!(session.state(), SessionState::Gameplay);
    }

    #[test]
    fn test_result_timeout_hard_ceiling() {
        let mut session = playing();
        let input = win();
        session.tick(&input, DT);

        // Participant still present, screen lingers
        ticks(&mut session, &input, 59);
        assert_eq!(session.hooks().resets, 0);
        session.tick(&input, DT);
        assert_eq!(session.hooks().resets, 1);
        ticks(&mut session, &input, 10);
        assert_eq!(session.hooks().resets, 1);
    }

    #[test]
    fn test_result_warning_after_grace() {
        let mut session = playing();
        let input = win();
        session.tick(&input, DT);
        place(&mut session, &[]);

        ticks(&mut session, &input, 3);
        assert!(!session.warning_visible());

        session.tick(&input, DT);
        assert!(session.warning_visible());
        assert_eq!(session.timers().idle_or_abandon, 0.0);

        // Participant comes back
        place(&mut session, &[(1, 0.0, 1.0)]);
        session.tick(&input, DT);
        assert!(!session.warning_visible());
        assert_eq!(session.timers().recovery, 0.0);
        assert_eq!(
            session.hooks().warnings,
            vec![(WIN_WARNING, false), (WIN_WARNING, true), (WIN_WARNING, false)]
        );
    }

    #[test]
    fn test_scenario_d_replacement_takes_over() {
        let mut session = playing();
        let input = win();
        session.tick(&input, DT);

        place(&mut session, &[(2, 0.2, 1.5)]);

        // 3 ticks of grace, then 19 ticks of replacement lock-in (4.75 s)
        ticks(&mut session, &input, 22);
        assert_eq!(session.primary_id(), Some(id(1)));
        assert_eq!(session.pending_id(), Some(id(2)));
        assert_eq!(session.timers().idle_or_abandon, 4.75);
        assert!(session.warning_visible());
        assert!(session.feedback().unwrap().visible);

        session.tick(&input, DT);
        assert_eq!(session.primary_id(), Some(id(2)));
        assert!(!session.warning_visible());
        assert!(!session.feedback().unwrap().visible);
        assert_eq!(session.timers().recovery, 0.0);
        assert_eq!(session.state(), SessionState::Result);

        // New primary is tracked from here on
        session.tick(&input, DT);
        assert!(!session.warning_visible());
        assert_eq!(session.hooks().started, 1);
    }

    #[test]
    fn test_replacement_change_restarts_lock_in() {
        let mut session = playing();
        let input = win();
        session.tick(&input, DT);

        place(&mut session, &[(2, 0.2, 1.5)]);
        ticks(&mut session, &input, 12);
        assert_eq!(session.pending_id(), Some(id(2)));
        assert_eq!(session.timers().idle_or_abandon, 2.25);

        place(&mut session, &[(3, 0.0, 1.1)]);
        session.tick(&input, DT);
        assert_eq!(session.pending_id(), Some(id(3)));
        assert_eq!(session.timers().idle_or_abandon, 0.25);
    }

    #[test]
    fn test_replacement_progress_resets_when_nobody_present() {
        let mut session = playing();
        let input = win();
        session.tick(&input, DT);

        place(&mut session, &[(2, 0.2, 1.5)]);
        ticks(&mut session, &input, 10);
        assert!(session.timers().idle_or_abandon > 0.0);

        place(&mut session, &[]);
        session.tick(&input, DT);
        assert_eq!(session.timers().idle_or_abandon, 0.0);
        assert!(!session.feedback().unwrap().visible);
        assert!(session.warning_visible());
    }

    #[test]
    fn test_replacement_must_be_in_zone() {
        let mut session = playing();
        let input = win();
        session.tick(&input, DT);

        place(&mut session, &[(2, 2.5, 1.5)]);
        ticks(&mut session, &input, 40);
        assert_eq!(session.primary_id(), Some(id(1)));
        assert_eq!(session.pending_id(), None);
    }

    #[test]
    fn test_missing_warning_element_degrades() {
        let mut session: TestSession =
            ExhibitionSession::new(settings(), Some(TrackedBodies::new()), Recorder::default())
                .with_feedback(Ring::default())
                .with_result_screens(ResultScreens {
                    win: Some(ResultScreen::with_elements(vec![UiElement::new("Title", 1)])),
                    lose: None,
                });
        ticks(&mut session, &TickInput::default(), 2);
        place(&mut session, &[(1, 0.0, 1.0)]);
        ticks(&mut session, &TickInput::default(), 21);

        let input = win();
        session.tick(&input, DT);
        assert_eq!(session.state(), SessionState::Result);

        place(&mut session, &[(2, 0.2, 1.5)]);
        ticks(&mut session, &input, 23);

        // Swap still happens, just without a visible warning
        assert_eq!(session.primary_id(), Some(id(2)));
        assert!(session.hooks().warnings.is_empty());
        assert!(!session.warning_visible());
    }

    #[test]
    fn test_restart_clears_session() {
        let mut session = playing();
        session.tick(&win(), DT);
        place(&mut session, &[(2, 0.2, 1.5)]);
        ticks(&mut session, &win(), 8);
        assert!(session.warning_visible());

        session.restart(false);
        assert_eq!(session.state(), SessionState::Warmup);
        assert_eq!(*session.timers(), SessionTimers::default());
        assert_eq!(session.pending_id(), None);
        assert!(!session.warning_visible());
        assert!(!session.feedback().unwrap().visible);

        // Primary 1 is gone, so warmup falls through to Idle
        ticks(&mut session, &TickInput::default(), 2);
        assert_eq!(session.state(), SessionState::Idle);
    }

    #[test]
    fn test_fast_restart_keeps_participant() {
        let mut session = playing();
        session.restart(true);
        session.tick(&TickInput::default(), DT);

        assert_eq!(session.state(), SessionState::Gameplay);
        assert_eq!(session.primary_id(), Some(id(1)));
        assert_eq!(session.hooks().started, 2);
    }

    #[test]
    fn test_snapshot_serializes() {
        let session = playing();
        let snapshot = session.snapshot();
        assert_eq!(snapshot.state, SessionState::Gameplay);
        assert_eq!(snapshot.status, SessionStatus::Playing);
        assert_eq!(snapshot.primary_id, Some(id(1)));
        assert_eq!(snapshot.tracked_bodies, 1);

        let json = serde_json::to_string(&snapshot).unwrap();
        assert!(json.contains("\"state\":\"Gameplay\""));
        assert!(json.contains("\"primary_id\":1"));
    }

    #[test]
    fn test_replay_is_deterministic() {
        let script: Vec<Vec<(u64, f32, f32)>> = (0..200)
            .map(|i| match i {
                0..=30 => vec![],
                31..=90 => vec![(4, 0.3, 1.2)],
                91..=95 => vec![],
                96..=150 => vec![(4, 0.3, 1.2), (9, -0.8, 2.0)],
                _ => vec![(9, -0.8, 2.0)],
            })
            .collect();

        let run = || {
            let mut session = session();
            for frame in &script {
                place(&mut session, frame);
                session.tick(&TickInput::default(), DT);
            }
            (session.state(), *session.timers(), session.primary_id())
        };

        assert_eq!(run(), run());
    }
}
