//! Server configuration.

use std::net::SocketAddr;
use std::time::Duration;

use stepwise_replay::{env_parse, PlaybackConfig};

/// Configuration for the visualization server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to listen on
    pub addr: SocketAddr,
    /// How long a producer may run before the request fails
    pub producer_timeout: Duration,
    /// Input size used when a run request does not give one
    pub input_size: usize,
    /// Largest input, generated or explicit, a run may use
    pub max_input_size: usize,
    /// Seed for generated inputs
    pub seed: u64,
    /// Settings for every playback session
    pub playback: PlaybackConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from(([127, 0, 0, 1], 3000)),
            producer_timeout: Duration::from_secs(5),
            input_size: 12,
            max_input_size: 512,
            seed: 42,
            playback: PlaybackConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Load from the environment:
    ///
    /// - `STEPWISE_ADDR`
    /// - `STEPWISE_PRODUCER_TIMEOUT_MS`
    /// - `STEPWISE_INPUT_SIZE`
    /// - `STEPWISE_MAX_INPUT_SIZE`
    /// - `STEPWISE_SEED`
    ///
    /// plus everything [`PlaybackConfig::from_env`] reads.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            addr: env_parse("STEPWISE_ADDR").unwrap_or(defaults.addr),
            producer_timeout: env_parse("STEPWISE_PRODUCER_TIMEOUT_MS")
                .map(Duration::from_millis)
                .unwrap_or(defaults.producer_timeout),
            input_size: env_parse("STEPWISE_INPUT_SIZE")
                .filter(|&size: &usize| size > 0)
                .unwrap_or(defaults.input_size),
            max_input_size: env_parse("STEPWISE_MAX_INPUT_SIZE")
                .filter(|&max: &usize| max > 0)
                .unwrap_or(defaults.max_input_size),
            seed: env_parse("STEPWISE_SEED").unwrap_or(defaults.seed),
            playback: PlaybackConfig::from_env(),
        }
    }

    #[must_use]
    pub fn with_addr(mut self, addr: SocketAddr) -> Self {
        self.addr = addr;
        self
    }

    #[must_use]
    pub fn with_producer_timeout(mut self, timeout: Duration) -> Self {
        self.producer_timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_input_size(mut self, size: usize) -> Self {
        self.input_size = size.max(1);
        self
    }

    #[must_use]
    pub fn with_max_input_size(mut self, max: usize) -> Self {
        self.max_input_size = max.max(1);
        self
    }

    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    #[must_use]
    pub fn with_playback(mut self, playback: PlaybackConfig) -> Self {
        self.playback = playback;
        self
    }
}
