//! Stepwise Replay Engine
//!
//! Deterministic playback of recorded algorithm traces.
//!
//! # Architecture
//!
//! - **Accumulator**: folds a trace prefix into a visual state through a
//!   per-domain [`TransitionTable`]
//! - **Controller**: position, stepping, seeking and auto-play of one trace
//! - **Supervisor**: swaps the active controller when a new run is requested
//! - **Events**: frames, state changes and notices broadcast to renderers
//!
//! # Usage
//!
//! ```ignore
//! let supervisor = SessionSupervisor::new(PlaybackConfig::from_env());
//! let controller = supervisor
//!     .start_session(VisualState::array(values), async { produce_steps() })
//!     .await?;
//!
//! let mut events = controller.subscribe();
//! controller.play(Duration::from_millis(200)).await?;
//! ```

mod accumulator;
mod config;
mod controller;
mod error;
mod events;
mod supervisor;
mod tables;

pub use accumulator::{
    Accumulator, FoldError, MaterializeError, Materialized, SkippedStep, Transition,
    TransitionTable,
};
pub use config::{
    env_parse, PlaybackConfig, DEFAULT_CANCEL_GRACE, DEFAULT_EVENT_CAPACITY, DEFAULT_STEP_DELAY,
};
pub use controller::{PlaybackController, PlaybackSpeed, PlaybackState, PlaybackStatus};
pub use error::{Error, Result};
pub use events::{Frame, Notice, NoticeLevel, PlaybackEvent};
pub use supervisor::SessionSupervisor;
pub use tables::{for_domain, ArrayTable, GraphTable, PegTable, TreeTable};
