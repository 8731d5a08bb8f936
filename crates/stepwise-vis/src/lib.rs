//! Stepwise Visualization Server
//!
//! Reference algorithm producers and a browser front end for trace replay.
//!
//! # Architecture
//!
//! - **Producers**: Run a sort, search, traversal or recursion over an input
//!   and record every step it takes
//! - **Sessions**: One live playback session at a time, replaced on each run
//! - **WebSocket**: Streams frames and playback state to the browser
//! - **REST API**: Start runs, control playback, read the current frame
//!
//! # Usage
//!
//! ```ignore
//! let server = VisServer::new(ServerConfig::from_env());
//! server.serve().await?;
//! ```

mod config;
mod error;
pub mod producers;
mod server;

pub use config::ServerConfig;
pub use error::{Error, Result};
pub use producers::{Algorithm, Family, Input, InputGenerator, Run};
pub use server::{AppState, RunRequest, RunResponse, VisServer};

#[cfg(test)]
mod tests {
    use super::*;
    use stepwise_replay::{PlaybackController, PlaybackState};
    use tokio_test::{assert_err, assert_ok};

    #[tokio::test]
    async fn produced_runs_replay_to_completion() {
        let mut inputs = InputGenerator::new(7);
        for algorithm in Algorithm::ALL {
            let input = inputs.input_for(algorithm, 6);
            let run = assert_ok!(producers::produce(algorithm, &input, false));
            let trace = stepwise_trace::Trace::new(run.steps);
            let controller = PlaybackController::new(
                trace.clone(),
                run.initial,
                &stepwise_replay::PlaybackConfig::default(),
            );
            assert_ok!(controller.seek(trace.len() as i64).await);
            let expected = if trace.is_empty() {
                PlaybackState::Ready
            } else {
                PlaybackState::Completed
            };
            assert_eq!(controller.state().await, expected, "{algorithm}");
        }
    }

    #[test]
    fn unknown_algorithms_are_rejected() {
        assert_err!("bogo-sort".parse::<Algorithm>());
        assert_eq!(assert_ok!("Bubble_Sort".parse::<Algorithm>()), Algorithm::BubbleSort);
    }
}
