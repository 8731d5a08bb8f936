//! Playback controller for a single trace.
//!
//! # States
//!
//! ```text
//! Ready ──step/seek──▶ Stepping ──play──▶ Playing ◀──resume── Paused
//!   │                     ▲                 │  └────pause────▶  │
//!   └────────play─────────┼─────────────────┤                   │
//!                         │                 ▼                   │
//!                 step failed         Completed      cancel ────┴─▶ Cancelled
//! ```
//!
//! The position, the current frame and the state live behind one mutex, and
//! every frame is emitted while that mutex is held. A `cancel` that has
//! returned has therefore also ruled out any later frame from the play loop.
//!
//! The play loop waits out each delay on a `watch` channel so that `pause`
//! keeps whatever part of the delay is left and `cancel` interrupts it at once.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use stepwise_trace::{Position, SeekPolicy, Trace, TraceId, VisualState};
use tokio::sync::{broadcast, watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use crate::accumulator::{Accumulator, Materialized, SkippedStep};
use crate::config::PlaybackConfig;
use crate::error::{Error, Result};
use crate::events::{Frame, Notice, PlaybackEvent};

/// Playback speed multiplier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaybackSpeed {
    /// 0.25x speed
    QuarterSpeed,
    /// 0.5x speed
    HalfSpeed,
    /// Normal speed (1x)
    Normal,
    /// 2x speed
    Double,
    /// 4x speed
    Quadruple,
    /// 10x speed
    TenX,
    /// No delay between steps
    Maximum,
}

impl PlaybackSpeed {
    /// Get the speed multiplier.
    pub fn multiplier(&self) -> f64 {
        match self {
            PlaybackSpeed::QuarterSpeed => 0.25,
            PlaybackSpeed::HalfSpeed => 0.5,
            PlaybackSpeed::Normal => 1.0,
            PlaybackSpeed::Double => 2.0,
            PlaybackSpeed::Quadruple => 4.0,
            PlaybackSpeed::TenX => 10.0,
            PlaybackSpeed::Maximum => f64::INFINITY,
        }
    }

    /// Per-step delay at this speed.
    pub fn delay(&self, base: Duration) -> Duration {
        match self {
            PlaybackSpeed::Maximum => Duration::ZERO,
            speed => base.div_f64(speed.multiplier()),
        }
    }
}

/// Current state of playback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaybackState {
    /// No trace installed
    Idle,
    /// Trace installed, positioned before the first step
    Ready,
    /// Driven manually by step and seek
    Stepping,
    /// Auto-playing
    Playing,
    /// Auto-play suspended mid-delay
    Paused,
    /// Positioned on the last step
    Completed,
    /// Retired; no further frames
    Cancelled,
}

impl PlaybackState {
    /// Whether a controller in this state still needs cancelling before it
    /// can be discarded.
    pub fn is_live(&self) -> bool {
        !matches!(self, Self::Idle | Self::Completed | Self::Cancelled)
    }
}

impl fmt::Display for PlaybackState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Ready => write!(f, "ready"),
            Self::Stepping => write!(f, "stepping"),
            Self::Playing => write!(f, "playing"),
            Self::Paused => write!(f, "paused"),
            Self::Completed => write!(f, "completed"),
            Self::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Playback status for sending to frontend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaybackStatus {
    pub trace: TraceId,
    pub position: Position,
    pub total_steps: usize,
    pub state: PlaybackState,
    pub delay_ms: u64,
    pub progress: f64,
    pub policy: SeekPolicy,
}

/// What the play loop is told between steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Signal {
    Run,
    Pause,
    Stop,
}

struct Core {
    state: PlaybackState,
    frame: Materialized,
    delay: Duration,
    /// Bumped whenever a play loop is started or retired
    generation: u64,
    task: Option<JoinHandle<()>>,
    /// Unsupported steps already reported
    reported: BTreeSet<usize>,
}

struct Shared {
    trace: Trace,
    initial: Arc<VisualState>,
    accumulator: Accumulator,
    core: Mutex<Core>,
    signal: watch::Sender<Signal>,
    events: broadcast::Sender<PlaybackEvent>,
}

/// Drives one trace: position, stepping, seeking and auto-play.
///
/// Cheap to clone; clones control the same playback.
#[derive(Clone)]
pub struct PlaybackController {
    shared: Arc<Shared>,
}

impl fmt::Debug for PlaybackController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlaybackController")
            .field("trace", &self.shared.trace.id())
            .field("steps", &self.shared.trace.len())
            .finish()
    }
}

impl PlaybackController {
    /// Create a controller positioned before the first step, using the
    /// built-in transition table for the initial structure.
    pub fn new(trace: Trace, initial: VisualState, config: &PlaybackConfig) -> Self {
        let accumulator = Accumulator::for_domain(initial.structure.domain());
        Self::with_accumulator(trace, initial, accumulator, config)
    }

    /// Create a controller with a custom accumulator.
    pub fn with_accumulator(
        trace: Trace,
        initial: VisualState,
        accumulator: Accumulator,
        config: &PlaybackConfig,
    ) -> Self {
        let initial = Arc::new(initial);
        let frame = Materialized::initial(trace.id(), Arc::clone(&initial));
        let (signal, _) = watch::channel(Signal::Run);
        let (events, _) = broadcast::channel(config.event_capacity.max(1));
        let core = Core {
            state: PlaybackState::Ready,
            frame,
            delay: config.base_delay,
            generation: 0,
            task: None,
            reported: BTreeSet::new(),
        };
        Self {
            shared: Arc::new(Shared {
                trace,
                initial,
                accumulator,
                core: Mutex::new(core),
                signal,
                events,
            }),
        }
    }

    /// The trace being played.
    pub fn trace(&self) -> &Trace {
        &self.shared.trace
    }

    /// Receive every frame, state change and notice from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<PlaybackEvent> {
        self.shared.events.subscribe()
    }

    pub async fn state(&self) -> PlaybackState {
        self.shared.core.lock().await.state
    }

    pub async fn position(&self) -> Position {
        self.shared.core.lock().await.frame.position
    }

    /// The most recently materialized frame.
    pub async fn current(&self) -> Frame {
        let core = self.shared.core.lock().await;
        self.shared.frame_of(&core.frame)
    }

    pub async fn status(&self) -> PlaybackStatus {
        let core = self.shared.core.lock().await;
        let total_steps = self.shared.trace.len();
        let progress = if total_steps == 0 {
            0.0
        } else {
            core.frame.position.applied() as f64 / total_steps as f64
        };
        PlaybackStatus {
            trace: self.shared.trace.id(),
            position: core.frame.position,
            total_steps,
            state: core.state,
            delay_ms: u64::try_from(core.delay.as_millis()).unwrap_or(u64::MAX),
            progress,
            policy: self.shared.trace.policy(),
        }
    }

    /// Advance one step. A no-op on the last step.
    pub async fn step_forward(&self) -> Result<Position> {
        let shared = &self.shared;
        let mut core = shared.core.lock().await;
        shared.ensure_manual(&core, "step forward")?;
        let Some(target) = core.frame.position.next_within(shared.trace.len()) else {
            return Ok(core.frame.position);
        };
        shared.move_to(&mut core, target)?;
        shared.settle(&mut core);
        Ok(target)
    }

    /// Go back one step. A no-op before the first step.
    pub async fn step_backward(&self) -> Result<Position> {
        let shared = &self.shared;
        let mut core = shared.core.lock().await;
        shared.ensure_manual(&core, "step backward")?;
        let Some(target) = core.frame.position.prev() else {
            return Ok(core.frame.position);
        };
        shared.move_to(&mut core, target)?;
        shared.settle(&mut core);
        Ok(target)
    }

    /// Jump to `target`, clamped to `[-1, len - 1]`.
    pub async fn seek(&self, target: i64) -> Result<Position> {
        let shared = &self.shared;
        let mut core = shared.core.lock().await;
        shared.ensure_manual(&core, "seek")?;
        let clamped = Position::clamped(target, shared.trace.len());
        if i64::from(clamped) != target {
            debug!(requested = target, position = %clamped, "seek target clamped");
        }
        if clamped == core.frame.position {
            return Ok(clamped);
        }
        shared.move_to(&mut core, clamped)?;
        shared.settle(&mut core);
        Ok(clamped)
    }

    /// Auto-play with `delay` between steps.
    ///
    /// A no-op while already playing; resumes when paused; rewinds first when
    /// positioned on the last step.
    pub async fn play(&self, delay: Duration) -> Result<()> {
        let shared = &self.shared;
        let mut core = shared.core.lock().await;
        match core.state {
            PlaybackState::Playing => return Ok(()),
            PlaybackState::Paused => {
                core.delay = delay;
                shared.signal.send_replace(Signal::Run);
                shared.set_state(&mut core, PlaybackState::Playing);
                return Ok(());
            }
            PlaybackState::Cancelled => return Err(shared.reject(&core, "play")),
            _ => {}
        }

        core.delay = delay;
        if shared.trace.is_empty() {
            shared.set_state(&mut core, PlaybackState::Completed);
            return Ok(());
        }
        if core.frame.position == shared.trace.last_position() {
            shared.move_to(&mut core, Position::BEFORE_START)?;
        }

        core.generation += 1;
        shared.signal.send_replace(Signal::Run);
        shared.set_state(&mut core, PlaybackState::Playing);
        if let Some(stale) = core.task.take() {
            stale.abort();
        }
        let signal = shared.signal.subscribe();
        core.task = Some(tokio::spawn(run_loop(
            Arc::clone(shared),
            signal,
            core.generation,
        )));
        info!(
            trace = %shared.trace.id(),
            from = %core.frame.position,
            delay_ms = delay.as_millis() as u64,
            "playback started"
        );
        Ok(())
    }

    /// Auto-play at a preset speed relative to `base`.
    pub async fn play_at(&self, speed: PlaybackSpeed, base: Duration) -> Result<()> {
        self.play(speed.delay(base)).await
    }

    /// Suspend auto-play, keeping the rest of the current delay.
    pub async fn pause(&self) {
        let shared = &self.shared;
        let mut core = shared.core.lock().await;
        if core.state == PlaybackState::Playing {
            shared.signal.send_replace(Signal::Pause);
            shared.set_state(&mut core, PlaybackState::Paused);
        }
    }

    /// Continue auto-play with the remainder of the interrupted delay.
    pub async fn resume(&self) {
        let shared = &self.shared;
        let mut core = shared.core.lock().await;
        if core.state == PlaybackState::Paused {
            shared.signal.send_replace(Signal::Run);
            shared.set_state(&mut core, PlaybackState::Playing);
        }
    }

    /// Change the per-step delay; applies from the next step.
    pub async fn set_delay(&self, delay: Duration) {
        self.shared.core.lock().await.delay = delay;
    }

    /// Retire this controller. Idempotent.
    ///
    /// Once this returns no further frame is emitted.
    pub async fn cancel(&self) {
        let shared = &self.shared;
        let mut core = shared.core.lock().await;
        if core.state == PlaybackState::Cancelled {
            return;
        }
        core.generation += 1;
        shared.signal.send_replace(Signal::Stop);
        shared.set_state(&mut core, PlaybackState::Cancelled);
        info!(trace = %shared.trace.id(), position = %core.frame.position, "playback cancelled");
    }

    /// Wait for the current play loop, if any, to finish.
    pub async fn join(&self) {
        let task = self.shared.core.lock().await.task.take();
        if let Some(task) = task {
            if let Err(err) = task.await {
                if !err.is_cancelled() {
                    warn!(error = %err, "play loop ended abnormally");
                }
            }
        }
    }

    /// Cancel and wait up to `grace` for the play loop to drain, aborting it
    /// if it overruns.
    pub async fn shutdown(&self, grace: Duration) {
        self.cancel().await;
        let task = self.shared.core.lock().await.task.take();
        let Some(mut task) = task else {
            return;
        };
        if tokio::time::timeout(grace, &mut task).await.is_err() {
            warn!(
                trace = %self.shared.trace.id(),
                grace_ms = grace.as_millis() as u64,
                "play loop overran cancellation grace period, aborting"
            );
            task.abort();
        }
    }
}

impl Shared {
    fn frame_of(&self, materialized: &Materialized) -> Frame {
        Frame {
            trace: materialized.trace,
            position: materialized.position,
            state: Arc::clone(&materialized.state),
            note: self
                .trace
                .get(materialized.position)
                .and_then(|step| step.note.clone()),
        }
    }

    fn emit(&self, event: PlaybackEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }

    fn set_state(&self, core: &mut Core, state: PlaybackState) {
        if core.state != state {
            debug!(from = %core.state, to = %state, "playback state changed");
            core.state = state;
            self.emit(PlaybackEvent::StateChanged { state });
        }
    }

    fn reject(&self, core: &Core, operation: &'static str) -> Error {
        let error = Error::InvalidOperation {
            operation,
            state: core.state,
        };
        warn!(trace = %self.trace.id(), %error, "operation rejected");
        self.emit(PlaybackEvent::Notice(Notice::warning(&error)));
        error
    }

    fn ensure_manual(&self, core: &Core, operation: &'static str) -> Result<()> {
        match core.state {
            PlaybackState::Playing | PlaybackState::Cancelled => Err(self.reject(core, operation)),
            _ => Ok(()),
        }
    }

    /// State after a manual move. A paused loop stays paused and will carry
    /// on from the new position.
    fn settle(&self, core: &mut Core) {
        if core.state == PlaybackState::Paused {
            return;
        }
        let position = core.frame.position;
        let state = if position.is_before_start() {
            PlaybackState::Ready
        } else if position == self.trace.last_position() {
            PlaybackState::Completed
        } else {
            PlaybackState::Stepping
        };
        self.set_state(core, state);
    }

    /// Materialize `target`, install it as the current frame and emit it.
    /// On failure the current frame is kept and playback halts.
    fn move_to(&self, core: &mut Core, target: Position) -> Result<Position> {
        match self
            .accumulator
            .seek(&self.initial, &self.trace, &core.frame, target)
        {
            Ok(frame) => {
                self.report_skipped(core, &frame.skipped);
                core.frame = frame;
                debug!(trace = %self.trace.id(), position = %target, "frame materialized");
                self.emit(PlaybackEvent::Frame(self.frame_of(&core.frame)));
                Ok(target)
            }
            Err(err) => {
                let error = Error::AnimationStepFailed {
                    position: err.position,
                    cause: err.source,
                };
                error!(
                    trace = %self.trace.id(),
                    halted_at = %core.frame.position,
                    %error,
                    "halting playback"
                );
                self.emit(PlaybackEvent::Notice(Notice::error(&error)));
                self.signal.send_replace(Signal::Stop);
                self.set_state(core, PlaybackState::Stepping);
                Err(error)
            }
        }
    }

    fn report_skipped(&self, core: &mut Core, skipped: &[SkippedStep]) {
        for step in skipped {
            if !core.reported.insert(step.position) {
                continue;
            }
            let error = Error::UnknownStepKind {
                position: step.position,
                kind: step.kind,
            };
            warn!(trace = %self.trace.id(), %error, "step skipped");
            self.emit(PlaybackEvent::Notice(Notice::warning(&error)));
        }
    }

    /// One auto-play step. Returns whether the loop should continue.
    fn advance(&self, core: &mut Core) -> bool {
        let Some(target) = core.frame.position.next_within(self.trace.len()) else {
            self.set_state(core, PlaybackState::Completed);
            return false;
        };
        if self.move_to(core, target).is_err() {
            return false;
        }
        if target == self.trace.last_position() {
            self.set_state(core, PlaybackState::Completed);
            info!(trace = %self.trace.id(), "playback completed");
            return false;
        }
        true
    }
}

async fn run_loop(shared: Arc<Shared>, mut signal: watch::Receiver<Signal>, generation: u64) {
    let mut carried = None;
    loop {
        let delay = match carried.take() {
            Some(delay) => delay,
            None => shared.core.lock().await.delay,
        };
        if !wait_step_delay(&mut signal, delay).await {
            break;
        }

        let mut core = shared.core.lock().await;
        if core.generation != generation {
            break;
        }
        match core.state {
            PlaybackState::Playing => {}
            // Paused between the delay expiring and taking the lock.
            PlaybackState::Paused => {
                carried = Some(Duration::ZERO);
                continue;
            }
            _ => break,
        }
        if !shared.advance(&mut core) {
            break;
        }
    }
    debug!(generation, "play loop exited");
}

/// Wait out `delay`, freezing the remainder while paused.
///
/// Returns `false` if the loop was told to stop.
async fn wait_step_delay(signal: &mut watch::Receiver<Signal>, delay: Duration) -> bool {
    let mut remaining = delay;
    loop {
        let current = *signal.borrow_and_update();
        match current {
            Signal::Stop => return false,
            Signal::Pause => {
                if signal.changed().await.is_err() {
                    return false;
                }
            }
            Signal::Run => {
                let started = Instant::now();
                tokio::select! {
                    _ = tokio::time::sleep(remaining) => return true,
                    changed = signal.changed() => {
                        if changed.is_err() {
                            return false;
                        }
                        remaining = remaining.saturating_sub(started.elapsed());
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accumulator::FoldError;
    use stepwise_trace::{Step, StepKind};

    const DELAY: Duration = Duration::from_millis(100);

    fn controller(values: &[i64], kinds: Vec<StepKind>) -> PlaybackController {
        let trace = Trace::new(kinds.into_iter().map(Step::new).collect());
        PlaybackController::new(
            trace,
            VisualState::array(values.to_vec()),
            &PlaybackConfig::default(),
        )
    }

    fn compares(count: usize) -> Vec<StepKind> {
        (0..count).map(|_| StepKind::Compare { i: 0, j: 1 }).collect()
    }

    fn drain(rx: &mut broadcast::Receiver<PlaybackEvent>) -> Vec<PlaybackEvent> {
        let mut out = Vec::new();
        while let Ok(event) = rx.try_recv() {
            out.push(event);
        }
        out
    }

    fn frames(events: &[PlaybackEvent]) -> Vec<Position> {
        events.iter().filter_map(|e| e.as_frame()).map(|f| f.position).collect()
    }

    #[tokio::test]
    async fn boundaries_are_no_ops() {
        let ctl = controller(&[2, 1], vec![StepKind::Swap { i: 0, j: 1 }]);
        let mut rx = ctl.subscribe();

        assert_eq!(ctl.step_backward().await.unwrap(), Position::BEFORE_START);
        assert_eq!(ctl.step_forward().await.unwrap(), Position::at(0));
        assert_eq!(ctl.step_forward().await.unwrap(), Position::at(0));
        assert_eq!(ctl.state().await, PlaybackState::Completed);

        assert_eq!(ctl.seek(-40).await.unwrap(), Position::BEFORE_START);
        assert_eq!(ctl.seek(40).await.unwrap(), Position::at(0));

        let events = drain(&mut rx);
        assert_eq!(
            frames(&events),
            vec![Position::at(0), Position::BEFORE_START, Position::at(0)]
        );
    }

    #[tokio::test]
    async fn step_backward_replays_from_start() {
        let ctl = controller(
            &[3, 1, 2],
            vec![
                StepKind::Swap { i: 0, j: 1 },
                StepKind::Swap { i: 1, j: 2 },
                StepKind::MarkSorted { indices: vec![2] },
            ],
        );
        ctl.seek(2).await.unwrap();
        ctl.step_backward().await.unwrap();

        let frame = ctl.current().await;
        assert_eq!(frame.position, Position::at(1));
        assert_eq!(frame.state.values(), Some(&[1, 2, 3][..]));
        assert!(frame.state.sorted.is_empty());
        assert_eq!(ctl.state().await, PlaybackState::Stepping);
    }

    #[tokio::test(start_paused = true)]
    async fn play_runs_to_completion() {
        let ctl = controller(&[1, 2], compares(4));
        let mut rx = ctl.subscribe();

        ctl.play(DELAY).await.unwrap();
        ctl.join().await;

        assert_eq!(ctl.state().await, PlaybackState::Completed);
        assert_eq!(ctl.position().await, Position::at(3));
        let positions = frames(&drain(&mut rx));
        assert_eq!(positions, (0..4).map(Position::at).collect::<Vec<_>>());
    }

    #[tokio::test(start_paused = true)]
    async fn manual_moves_are_rejected_while_playing() {
        let ctl = controller(&[1, 2], compares(5));
        ctl.play(DELAY).await.unwrap();

        let err = ctl.step_forward().await.unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidOperation {
                state: PlaybackState::Playing,
                ..
            }
        ));
        assert!(ctl.step_backward().await.is_err());
        assert!(ctl.seek(3).await.is_err());

        // A second play is a no-op rather than a second loop.
        ctl.play(Duration::from_millis(1)).await.unwrap();
        assert_eq!(ctl.status().await.delay_ms, 100);
        ctl.cancel().await;
    }

    #[tokio::test(start_paused = true)]
    async fn pause_keeps_the_remaining_delay() {
        let ctl = controller(&[1, 2], compares(3));
        ctl.play(DELAY).await.unwrap();

        tokio::time::sleep(Duration::from_millis(60)).await;
        ctl.pause().await;
        tokio::time::sleep(Duration::from_millis(1_000)).await;
        assert_eq!(ctl.position().await, Position::BEFORE_START);

        ctl.resume().await;
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert_eq!(ctl.position().await, Position::BEFORE_START);
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(ctl.position().await, Position::at(0));
        ctl.cancel().await;
    }

    #[tokio::test(start_paused = true)]
    async fn stepping_while_paused_moves_the_loop() {
        let ctl = controller(&[1, 2], compares(4));
        ctl.play(DELAY).await.unwrap();
        ctl.pause().await;

        assert_eq!(ctl.step_forward().await.unwrap(), Position::at(0));
        assert_eq!(ctl.step_forward().await.unwrap(), Position::at(1));
        assert_eq!(ctl.state().await, PlaybackState::Paused);

        ctl.resume().await;
        ctl.join().await;
        assert_eq!(ctl.position().await, Position::at(3));
        assert_eq!(ctl.state().await, PlaybackState::Completed);
    }

    #[tokio::test(start_paused = true)]
    async fn no_frames_after_cancel() {
        let ctl = controller(&[1, 2], compares(50));
        let mut rx = ctl.subscribe();
        ctl.play(Duration::from_millis(10)).await.unwrap();

        tokio::time::sleep(Duration::from_millis(35)).await;
        ctl.cancel().await;
        let before = frames(&drain(&mut rx));
        let position = ctl.position().await;
        assert_eq!(before.last().copied(), Some(position));

        tokio::time::sleep(Duration::from_millis(500)).await;
        assert!(frames(&drain(&mut rx)).is_empty());
        assert_eq!(ctl.position().await, position);
        assert_eq!(ctl.state().await, PlaybackState::Cancelled);

        // Idempotent, and the controller stays retired.
        ctl.cancel().await;
        assert!(ctl.step_forward().await.is_err());
        assert!(ctl.play(DELAY).await.is_err());
        ctl.join().await;
    }

    #[tokio::test(start_paused = true)]
    async fn failure_halts_at_last_good_position() {
        let ctl = controller(
            &[2, 1],
            vec![
                StepKind::Compare { i: 0, j: 1 },
                StepKind::Swap { i: 0, j: 1 },
                StepKind::Swap { i: 0, j: 7 },
                StepKind::MarkSorted { indices: vec![0] },
            ],
        );
        let mut rx = ctl.subscribe();
        ctl.play(DELAY).await.unwrap();
        ctl.join().await;

        assert_eq!(ctl.position().await, Position::at(1));
        assert_eq!(ctl.state().await, PlaybackState::Stepping);
        let notices: Vec<_> = drain(&mut rx)
            .into_iter()
            .filter_map(|e| match e {
                PlaybackEvent::Notice(n) => Some(n),
                _ => None,
            })
            .collect();
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].code, "animation_step_failed");

        // Manual inspection still works.
        assert_eq!(ctl.step_backward().await.unwrap(), Position::at(0));
        let err = ctl.seek(3).await.unwrap_err();
        match err {
            Error::AnimationStepFailed { position, cause } => {
                assert_eq!(position, 2);
                assert_eq!(cause, FoldError::OutOfRange { index: 7, len: 2 });
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(ctl.position().await, Position::at(0));
    }

    #[tokio::test(start_paused = true)]
    async fn play_from_the_end_rewinds() {
        let ctl = controller(&[1, 2], compares(2));
        ctl.seek(1).await.unwrap();
        assert_eq!(ctl.state().await, PlaybackState::Completed);

        let mut rx = ctl.subscribe();
        ctl.play(DELAY).await.unwrap();
        ctl.join().await;
        assert_eq!(
            frames(&drain(&mut rx)),
            vec![Position::BEFORE_START, Position::at(0), Position::at(1)]
        );
    }

    #[tokio::test]
    async fn unknown_steps_are_reported_once() {
        let ctl = controller(
            &[1, 2],
            vec![StepKind::Unknown, StepKind::Swap { i: 0, j: 1 }],
        );
        let mut rx = ctl.subscribe();

        ctl.step_forward().await.unwrap();
        ctl.step_forward().await.unwrap();
        ctl.seek(-1).await.unwrap();
        ctl.seek(1).await.unwrap();

        let codes: Vec<_> = drain(&mut rx)
            .into_iter()
            .filter_map(|e| match e {
                PlaybackEvent::Notice(n) => Some(n.code),
                _ => None,
            })
            .collect();
        assert_eq!(codes, vec!["unknown_step_kind"]);
        assert_eq!(ctl.current().await.state.values(), Some(&[2, 1][..]));
    }

    #[tokio::test]
    async fn unknown_steps_are_reported_from_snapshots() {
        let trace = Trace::new(vec![
            Step::new(StepKind::Unknown).with_snapshot(VisualState::array(vec![1, 2])),
            Step::new(StepKind::Compare { i: 0, j: 1 })
                .with_snapshot(VisualState::array(vec![1, 2])),
        ]);
        assert_eq!(trace.policy(), SeekPolicy::Snapshots);
        let ctl = PlaybackController::new(
            trace,
            VisualState::array(vec![1, 2]),
            &PlaybackConfig::default(),
        );
        let mut rx = ctl.subscribe();

        ctl.step_forward().await.unwrap();
        ctl.step_forward().await.unwrap();

        let codes: Vec<_> = drain(&mut rx)
            .into_iter()
            .filter_map(|e| match e {
                PlaybackEvent::Notice(n) => Some(n.code),
                _ => None,
            })
            .collect();
        assert_eq!(codes, vec!["unknown_step_kind"]);
    }

    #[tokio::test]
    async fn empty_trace_completes_immediately() {
        let ctl = controller(&[1], Vec::new());
        ctl.play(DELAY).await.unwrap();
        assert_eq!(ctl.state().await, PlaybackState::Completed);
        assert_eq!(ctl.position().await, Position::BEFORE_START);
        assert_eq!(ctl.status().await.progress, 0.0);
    }

    #[tokio::test]
    async fn status_reports_progress() {
        let ctl = controller(&[1, 2], compares(4));
        ctl.seek(1).await.unwrap();
        ctl.set_delay(Duration::from_millis(250)).await;

        let status = ctl.status().await;
        assert_eq!(status.position, Position::at(1));
        assert_eq!(status.total_steps, 4);
        assert_eq!(status.progress, 0.5);
        assert_eq!(status.delay_ms, 250);
        assert_eq!(status.policy, SeekPolicy::Replay);
    }

    #[test]
    fn speed_delays() {
        let base = Duration::from_millis(400);
        assert_eq!(PlaybackSpeed::Normal.delay(base), base);
        assert_eq!(PlaybackSpeed::Double.delay(base), Duration::from_millis(200));
        assert_eq!(PlaybackSpeed::QuarterSpeed.delay(base), Duration::from_millis(1_600));
        assert_eq!(PlaybackSpeed::Maximum.delay(base), Duration::ZERO);
        assert!(PlaybackSpeed::Maximum.multiplier().is_infinite());
    }

    #[test]
    fn live_states() {
        assert!(PlaybackState::Playing.is_live());
        assert!(PlaybackState::Ready.is_live());
        assert!(!PlaybackState::Completed.is_live());
        assert!(!PlaybackState::Cancelled.is_live());
        assert_eq!(PlaybackState::Paused.to_string(), "paused");
    }
}
