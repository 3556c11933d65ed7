//! Transform configuration.

use std::time::Duration;

/// Configuration for an indexing transform.
#[derive(Debug, Clone)]
pub struct TransformConfig {
    /// Maximum number of indexer callbacks that may be outstanding at once.
    ///
    /// With the default of 1, `push` does not return until the previous
    /// record's callback has finished. Values of 0 are treated as 1.
    pub max_in_flight: usize,

    /// How long `push` and `finish` wait for outstanding callbacks
    /// (`None` = wait indefinitely).
    pub completion_timeout: Option<Duration>,

    /// Maximum number of records held for decoration (`None` = unbounded).
    ///
    /// Every record of a run is held until input ends, so memory grows
    /// with the input unless this is set.
    pub max_buffered: Option<usize>,
}

impl Default for TransformConfig {
    fn default() -> Self {
        Self {
            max_in_flight: 1,
            completion_timeout: None,
            max_buffered: None,
        }
    }
}

impl TransformConfig {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the maximum number of outstanding callbacks.
    #[must_use]
    pub const fn max_in_flight(mut self, limit: usize) -> Self {
        self.max_in_flight = limit;
        self
    }

    /// Sets the completion timeout.
    #[must_use]
    pub const fn completion_timeout(mut self, timeout: Duration) -> Self {
        self.completion_timeout = Some(timeout);
        self
    }

    /// Sets the holding buffer limit.
    #[must_use]
    pub const fn max_buffered(mut self, limit: usize) -> Self {
        self.max_buffered = Some(limit);
        self
    }

    /// Returns the effective in-flight limit.
    pub(crate) fn in_flight_limit(&self) -> usize {
        self.max_in_flight.max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = TransformConfig::default();
        assert_eq!(config.max_in_flight, 1);
        assert!(config.completion_timeout.is_none());
        assert!(config.max_buffered.is_none());
    }

    #[test]
    fn builder_pattern() {
        let config = TransformConfig::new()
            .max_in_flight(8)
            .completion_timeout(Duration::from_secs(5))
            .max_buffered(100);

        assert_eq!(config.max_in_flight, 8);
        assert_eq!(config.completion_timeout, Some(Duration::from_secs(5)));
        assert_eq!(config.max_buffered, Some(100));
    }

    #[test]
    fn zero_in_flight_means_one() {
        assert_eq!(TransformConfig::new().max_in_flight(0).in_flight_limit(), 1);
    }
}
