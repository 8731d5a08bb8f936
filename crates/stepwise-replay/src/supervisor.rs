//! Session supervisor: owns at most one live controller at a time.
//!
//! Starting a session produces the new trace first and only then retires the
//! old controller, so a failing producer leaves the current session playing.
//! Starts are serialized; two overlapping requests never leave two live
//! controllers behind.

use std::future::Future;

use stepwise_trace::{Step, Trace, VisualState};
use tokio::sync::{watch, Mutex};
use tracing::{info, warn};

use crate::config::PlaybackConfig;
use crate::controller::{PlaybackController, PlaybackState};
use crate::error::{Error, Result};

/// Replaces the active playback session on request.
#[derive(Debug)]
pub struct SessionSupervisor {
    config: PlaybackConfig,
    starting: Mutex<()>,
    current: watch::Sender<Option<PlaybackController>>,
}

impl SessionSupervisor {
    pub fn new(config: PlaybackConfig) -> Self {
        let (current, _) = watch::channel(None);
        Self {
            config,
            starting: Mutex::new(()),
            current,
        }
    }

    pub fn config(&self) -> &PlaybackConfig {
        &self.config
    }

    /// Run `producer` and, if it yields a trace, make it the active session.
    ///
    /// On producer failure the previous session is left untouched and
    /// [`Error::TraceUnavailable`] is returned.
    pub async fn start_session<F, E>(
        &self,
        initial: VisualState,
        producer: F,
    ) -> Result<PlaybackController>
    where
        F: Future<Output = std::result::Result<Vec<Step>, E>>,
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        let _starting = self.starting.lock().await;
        let steps = producer.await.map_err(|err| {
            let error = Error::TraceUnavailable(err.into());
            warn!(%error, "producer failed, keeping current session");
            error
        })?;
        self.install(initial, Trace::new(steps)).await
    }

    /// Make an already built trace the active session.
    pub async fn start_with_trace(
        &self,
        initial: VisualState,
        trace: Trace,
    ) -> Result<PlaybackController> {
        let _starting = self.starting.lock().await;
        self.install(initial, trace).await
    }

    async fn install(&self, initial: VisualState, trace: Trace) -> Result<PlaybackController> {
        let domain = initial.structure.domain();
        if let Err(err) = trace.check_domain(domain) {
            warn!(trace = %trace.id(), error = %err, "rejecting trace, keeping current session");
            return Err(Error::TraceUnavailable(Box::new(err)));
        }

        if let Some(previous) = self.current() {
            previous.shutdown(self.config.cancel_grace).await;
        }

        let controller = PlaybackController::new(trace, initial, &self.config);
        info!(
            trace = %controller.trace().id(),
            steps = controller.trace().len(),
            %domain,
            "session started"
        );
        self.current.send_replace(Some(controller.clone()));
        Ok(controller)
    }

    /// The active controller, if any.
    pub fn current(&self) -> Option<PlaybackController> {
        self.current.borrow().clone()
    }

    /// Be told whenever the active controller changes.
    pub fn watch(&self) -> watch::Receiver<Option<PlaybackController>> {
        self.current.subscribe()
    }

    /// Cancel and drop the active controller.
    pub async fn end_session(&self) {
        let _starting = self.starting.lock().await;
        if let Some(previous) = self.current.send_replace(None) {
            previous.shutdown(self.config.cancel_grace).await;
            info!(trace = %previous.trace().id(), "session ended");
        }
    }

    /// State of the active controller, or [`PlaybackState::Idle`].
    pub async fn state(&self) -> PlaybackState {
        match self.current() {
            Some(controller) => controller.state().await,
            None => PlaybackState::Idle,
        }
    }
}
