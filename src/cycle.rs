//! Tick and progress cycle.
//!
//! [`Cycle`] is a pure state machine over caller-supplied timestamps
//! (milliseconds, e.g. `performance.now()`). It decides what happens on each
//! tick and frame; the front end owns the actual timer and
//! `requestAnimationFrame` loop and drops them when the cycle says so.
//!
//! ```text
//!   Idle ──start──▶ Running ──stop──▶ Idle
//!                    │  ▲
//!          tick/frame│  │reconfigure (immediate tick, re-anchored)
//!                    └──┘
//! ```

use crate::config::{IDLE_COLOR, IDLE_SYMBOL};
use crate::settings::Settings;
use crate::{next_color, next_stimulus, Stimulus, StimulusParams};
use log::{debug, info};
use rand::Rng;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum Phase {
    #[default]
    Idle,
    Running,
}

/// Everything that, when changed mid-run, restarts the tick schedule.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CycleParams {
    pub stimulus: StimulusParams,
    pub interval_ms: f64,
}

impl From<&Settings> for CycleParams {
    fn from(s: &Settings) -> Self {
        Self {
            stimulus: s.stimulus_params(),
            interval_ms: s.interval_ms(),
        }
    }
}

/// What the display surface renders.
#[derive(Debug, Clone, PartialEq)]
pub struct DisplayFrame {
    pub symbol: String,
    pub color: &'static str,
    /// Incremented on every tick; used as the element key to replay the
    /// entry animation.
    pub pop: u64,
    pub progress: f64,
}

impl Default for DisplayFrame {
    fn default() -> Self {
        Self {
            symbol: IDLE_SYMBOL.to_string(),
            color: IDLE_COLOR,
            pop: 0,
            progress: 0.0,
        }
    }
}

/// Result of one tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tick {
    pub stimulus: Stimulus,
    pub color: &'static str,
    pub at: f64,
    /// The audio cue should be played for this tick.
    pub cue: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Reconfigured {
    /// Nothing schedule-relevant changed.
    Unchanged,
    /// Parameters were stored; the cycle is idle so nothing else happens.
    Updated,
    /// The schedule was restarted with an immediate tick.
    Restarted(Tick),
}

#[derive(Debug, Clone)]
pub struct Cycle {
    phase: Phase,
    params: CycleParams,
    show_progress: bool,
    audio: bool,
    last_stimulus: Option<Stimulus>,
    last_color: Option<&'static str>,
    last_tick_at: f64,
    progress: f64,
    display: DisplayFrame,
}

impl Cycle {
    pub fn new(settings: &Settings) -> Self {
        Self {
            phase: Phase::Idle,
            params: CycleParams::from(settings),
            show_progress: settings.show_progress,
            audio: settings.audio_on,
            last_stimulus: None,
            last_color: None,
            last_tick_at: 0.0,
            progress: 0.0,
            display: DisplayFrame::default(),
        }
    }

    pub fn is_running(&self) -> bool {
        self.phase == Phase::Running
    }

    pub fn params(&self) -> &CycleParams {
        &self.params
    }

    pub fn interval_ms(&self) -> f64 {
        self.params.interval_ms
    }

    pub fn progress(&self) -> f64 {
        self.progress
    }

    pub fn last_stimulus(&self) -> Option<Stimulus> {
        self.last_stimulus
    }

    pub fn last_color(&self) -> Option<&'static str> {
        self.last_color
    }

    /// Whether the per-frame progress loop should be running.
    pub fn frame_loop_active(&self) -> bool {
        self.is_running() && self.show_progress
    }

    /// Absolute time of the next scheduled tick, if running.
    pub fn next_tick_at(&self) -> Option<f64> {
        self.is_running()
            .then(|| self.last_tick_at + self.params.interval_ms)
    }

    pub fn display(&self) -> DisplayFrame {
        DisplayFrame {
            progress: self.progress,
            ..self.display.clone()
        }
    }

    /// Idle → Running, with one immediate tick. Returns `None` if already
    /// running.
    pub fn start<R: Rng + ?Sized>(&mut self, rng: &mut R, now: f64) -> Option<Tick> {
        if self.is_running() {
            return None;
        }
        info!(
            "Starting cycle: every {} ms, progress {}",
            self.params.interval_ms,
            if self.show_progress { "on" } else { "off" }
        );
        self.phase = Phase::Running;
        self.tick(rng, now)
    }

    /// Emit the next stimulus and restart the progress cycle at `now`.
    /// A tick delivered while idle is ignored.
    pub fn tick<R: Rng + ?Sized>(&mut self, rng: &mut R, now: f64) -> Option<Tick> {
        if !self.is_running() {
            return None;
        }
        let stimulus = next_stimulus(rng, &self.params.stimulus, self.last_stimulus);
        let color = next_color(rng, self.last_color);
        self.last_stimulus = Some(stimulus);
        self.last_color = Some(color);
        self.last_tick_at = now;
        self.progress = 0.0;
        self.display.symbol = stimulus.symbol();
        self.display.color = color;
        self.display.pop = self.display.pop.wrapping_add(1);
        debug!("Tick at {:.1} ms: {} in {}", now, stimulus, color);
        Some(Tick {
            stimulus,
            color,
            at: now,
            cue: self.audio,
        })
    }

    /// Recompute progress for an animation frame at `now`.
    ///
    /// Returns `None` when the frame loop should not be running; the caller
    /// stops requesting frames in that case.
    pub fn frame(&mut self, now: f64) -> Option<f64> {
        if !self.frame_loop_active() {
            return None;
        }
        let elapsed = now - self.last_tick_at;
        self.progress = (elapsed / self.params.interval_ms).clamp(0.0, 1.0);
        Some(self.progress)
    }

    /// Running → Idle. Progress drops to 0 and the no-repeat history is
    /// cleared; the last shown symbol stays on screen. Returns whether the
    /// cycle was running.
    pub fn stop(&mut self) -> bool {
        if !self.is_running() {
            return false;
        }
        info!("Stopping cycle");
        self.phase = Phase::Idle;
        self.progress = 0.0;
        self.last_stimulus = None;
        self.last_color = None;
        true
    }

    /// Adopt new settings. While running, a change to the interval, range,
    /// mode, arrow set or no-repeat flag re-anchors the schedule at `now` with
    /// an immediate tick.
    pub fn reconfigure<R: Rng + ?Sized>(
        &mut self,
        rng: &mut R,
        now: f64,
        settings: &Settings,
    ) -> Reconfigured {
        self.set_audio_enabled(settings.audio_on);
        self.set_progress_enabled(settings.show_progress);

        let params = CycleParams::from(settings);
        if params == self.params {
            return Reconfigured::Unchanged;
        }
        self.params = params;
        if !self.is_running() {
            return Reconfigured::Updated;
        }
        debug!("Schedule changed mid-run, re-anchoring at {:.1} ms", now);
        match self.tick(rng, now) {
            Some(tick) => Reconfigured::Restarted(tick),
            None => Reconfigured::Updated,
        }
    }

    /// Turning progress off cancels the frame loop and resets progress.
    pub fn set_progress_enabled(&mut self, enabled: bool) {
        self.show_progress = enabled;
        if !enabled {
            self.progress = 0.0;
        }
    }

    pub fn set_audio_enabled(&mut self, enabled: bool) {
        self.audio = enabled;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::SettingsUpdate;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn settings(interval_sec: f64) -> Settings {
        Settings {
            interval_sec,
            min: 1,
            max: 4,
            no_repeat: true,
            show_progress: true,
            ..Settings::default()
        }
    }

    #[test]
    fn start_ticks_immediately_and_schedules_the_next() {
        let mut rng = StdRng::seed_from_u64(42);
        let mut cycle = Cycle::new(&settings(5.0));

        let first = cycle.start(&mut rng, 0.0).expect("immediate tick");
        let v0 = match first.stimulus {
            Stimulus::Number(n) => n,
            other => panic!("unexpected {:?}", other),
        };
        assert!((1..=4).contains(&v0));
        assert_eq!(cycle.next_tick_at(), Some(5_000.0));

        let second = cycle.tick(&mut rng, 5_000.0).expect("second tick");
        assert_ne!(second.stimulus, first.stimulus);
        assert_ne!(second.color, first.color);
        assert_eq!(cycle.next_tick_at(), Some(10_000.0));
    }

    #[test]
    fn start_while_running_is_a_no_op() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut cycle = Cycle::new(&settings(5.0));
        assert!(cycle.start(&mut rng, 0.0).is_some());
        assert!(cycle.start(&mut rng, 100.0).is_none());
        assert_eq!(cycle.display().pop, 1);
    }

    #[test]
    fn progress_grows_then_resets_on_tick() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut cycle = Cycle::new(&settings(5.0));
        cycle.start(&mut rng, 1_000.0);

        let mut last = 0.0;
        for t in (1_000..=6_000).step_by(250) {
            let p = cycle.frame(t as f64).expect("frame loop active");
            assert!(p >= last, "progress went backwards at {}", t);
            assert!((0.0..=1.0).contains(&p));
            last = p;
        }
        assert_eq!(last, 1.0);
        assert_eq!(cycle.frame(9_000.0), Some(1.0));

        cycle.tick(&mut rng, 6_000.0);
        assert_eq!(cycle.progress(), 0.0);
        assert_eq!(cycle.frame(8_500.0), Some(0.5));
    }

    #[test]
    fn frames_before_the_tick_clamp_to_zero() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut cycle = Cycle::new(&settings(5.0));
        cycle.start(&mut rng, 1_000.0);
        assert_eq!(cycle.frame(900.0), Some(0.0));
    }

    #[test]
    fn stop_resets_progress_and_ignores_later_frames() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut cycle = Cycle::new(&settings(5.0));
        cycle.start(&mut rng, 0.0);
        cycle.frame(2_500.0);
        assert_eq!(cycle.progress(), 0.5);

        assert!(cycle.stop());
        assert_eq!(cycle.progress(), 0.0);
        assert!(!cycle.frame_loop_active());
        assert_eq!(cycle.frame(3_000.0), None);
        assert_eq!(cycle.progress(), 0.0);
        assert!(cycle.tick(&mut rng, 5_000.0).is_none());
        assert_eq!(cycle.next_tick_at(), None);
        assert!(!cycle.stop());
    }

    #[test]
    fn stop_clears_history_but_keeps_the_display() {
        let mut rng = StdRng::seed_from_u64(8);
        let mut cycle = Cycle::new(&settings(5.0));
        let tick = cycle.start(&mut rng, 0.0).unwrap();
        cycle.stop();
        assert_eq!(cycle.last_stimulus(), None);
        assert_eq!(cycle.last_color(), None);
        let shown = cycle.display();
        assert_eq!(shown.symbol, tick.stimulus.symbol());
        assert_eq!(shown.color, tick.color);
        assert_eq!(shown.progress, 0.0);
    }

    #[test]
    fn interval_change_re_anchors_from_the_change() {
        let mut rng = StdRng::seed_from_u64(13);
        let mut s = settings(5.0);
        let mut cycle = Cycle::new(&s);
        cycle.start(&mut rng, 0.0);
        cycle.tick(&mut rng, 5_000.0);

        s.apply(SettingsUpdate::IntervalSec(2.0));
        match cycle.reconfigure(&mut rng, 6_200.0, &s) {
            Reconfigured::Restarted(tick) => assert_eq!(tick.at, 6_200.0),
            other => panic!("expected restart, got {:?}", other),
        }
        assert_eq!(cycle.next_tick_at(), Some(8_200.0));
        assert_eq!(cycle.interval_ms(), 2_000.0);
    }

    #[test]
    fn unrelated_changes_do_not_restart() {
        let mut rng = StdRng::seed_from_u64(21);
        let mut s = settings(5.0);
        let mut cycle = Cycle::new(&s);
        cycle.start(&mut rng, 0.0);

        s.apply(SettingsUpdate::AudioOn(true));
        s.apply(SettingsUpdate::GrowFont);
        assert_eq!(cycle.reconfigure(&mut rng, 1_000.0, &s), Reconfigured::Unchanged);
        assert_eq!(cycle.next_tick_at(), Some(5_000.0));
        assert!(cycle.tick(&mut rng, 5_000.0).unwrap().cue);
    }

    #[test]
    fn idle_reconfigure_only_stores_parameters() {
        let mut rng = StdRng::seed_from_u64(34);
        let mut s = settings(5.0);
        let mut cycle = Cycle::new(&s);
        s.apply(SettingsUpdate::Max(10));
        assert_eq!(cycle.reconfigure(&mut rng, 0.0, &s), Reconfigured::Updated);
        assert!(!cycle.is_running());
        assert_eq!(cycle.params().stimulus.high, 10);
        assert_eq!(cycle.display(), DisplayFrame::default());
    }

    #[test]
    fn disabling_progress_cancels_the_frame_loop() {
        let mut rng = StdRng::seed_from_u64(55);
        let mut s = settings(4.0);
        let mut cycle = Cycle::new(&s);
        cycle.start(&mut rng, 0.0);
        cycle.frame(1_000.0);
        assert_eq!(cycle.progress(), 0.25);

        s.apply(SettingsUpdate::ShowProgress(false));
        cycle.reconfigure(&mut rng, 1_500.0, &s);
        assert!(!cycle.frame_loop_active());
        assert_eq!(cycle.progress(), 0.0);
        assert_eq!(cycle.frame(2_000.0), None);
        assert!(cycle.is_running());
    }

    #[test]
    fn mode_switch_mid_run_emits_an_arrow() {
        let mut rng = StdRng::seed_from_u64(89);
        let mut s = settings(5.0);
        let mut cycle = Cycle::new(&s);
        cycle.start(&mut rng, 0.0);
        s.apply(SettingsUpdate::Mode(crate::Mode::Arrows));
        match cycle.reconfigure(&mut rng, 100.0, &s) {
            Reconfigured::Restarted(tick) => {
                assert!(matches!(tick.stimulus, Stimulus::Arrow { .. }))
            }
            other => panic!("expected restart, got {:?}", other),
        }
    }

    #[test]
    fn clamped_interval_drives_the_schedule() {
        let mut rng = StdRng::seed_from_u64(144);
        let mut cycle = Cycle::new(&settings(0.05));
        cycle.start(&mut rng, 0.0);
        assert_eq!(cycle.next_tick_at(), Some(250.0));
    }

    #[test]
    fn consecutive_ticks_never_repeat_over_a_long_run() {
        let mut rng = StdRng::seed_from_u64(233);
        let mut cycle = Cycle::new(&settings(1.0));
        let mut prev = cycle.start(&mut rng, 0.0).unwrap();
        for i in 1..1000 {
            let next = cycle.tick(&mut rng, i as f64 * 1_000.0).unwrap();
            assert_ne!(next.stimulus, prev.stimulus);
            assert_ne!(next.color, prev.color);
            prev = next;
        }
        assert_eq!(cycle.display().pop, 1000);
    }
}
