//! Distance/time gate over raw GPS samples.
//!
//! A sample replaces the current [`StableLocation`] when it lies at least
//! `min_distance_meters` from it **or** at least `min_update_interval_ms`
//! has passed since it was accepted. The first sample always wins.

use serde::Serialize;
use wayfinder_core::{AppConfig, LocationSample, StableLocation};

use crate::error::PositionError;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplerConfig {
    pub min_distance_meters: f64,
    pub min_update_interval_ms: u64,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            min_distance_meters: 10.0,
            min_update_interval_ms: 2_000,
        }
    }
}

impl SamplerConfig {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            min_distance_meters: config.min_distance_meters,
            min_update_interval_ms: config.min_update_interval_ms,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "error", rename_all = "snake_case")]
pub enum SamplerStatus {
    /// No sample accepted yet.
    Waiting,
    Tracking,
    /// The provider reported an error; samples are ignored until restart.
    Unavailable(PositionError),
}

/// Result of feeding one sample (or error) into the sampler.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Observation {
    Accepted(StableLocation),
    NoChange,
    Unavailable(PositionError),
}

#[derive(Debug, Clone)]
pub struct LocationSampler {
    config: SamplerConfig,
    last: Option<StableLocation>,
    status: SamplerStatus,
}

impl LocationSampler {
    #[must_use]
    pub fn new(config: SamplerConfig) -> Self {
        Self {
            config,
            last: None,
            status: SamplerStatus::Waiting,
        }
    }

    #[must_use]
    pub fn config(&self) -> SamplerConfig {
        self.config
    }

    #[must_use]
    pub fn status(&self) -> SamplerStatus {
        self.status
    }

    /// The last accepted location, if any.
    #[must_use]
    pub fn current(&self) -> Option<StableLocation> {
        self.last
    }

    /// Feeds one raw sample through the gate.
    ///
    /// While the sampler is unavailable every sample is ignored and the
    /// pending error is returned again. Samples with non-finite or
    /// out-of-range coordinates are dropped.
    pub fn observe(&mut self, sample: LocationSample) -> Observation {
        if let SamplerStatus::Unavailable(err) = self.status {
            tracing::debug!(error = %err, "ignoring sample while location is unavailable");
            return Observation::Unavailable(err);
        }

        if !sample.point().is_valid() {
            tracing::debug!(
                lat = sample.lat,
                lng = sample.lng,
                "dropping sample with invalid coordinates"
            );
            return Observation::NoChange;
        }

        let Some(prev) = self.last else {
            tracing::debug!(lat = sample.lat, lng = sample.lng, "first location fix");
            return self.accept(sample);
        };

        let distance = prev.point().distance_to(&sample.point());
        // Samples stamped before the last acceptance count as zero elapsed.
        let elapsed_ms = sample.timestamp_ms.saturating_sub(prev.accepted_at_ms);

        if distance >= self.config.min_distance_meters
            || elapsed_ms >= self.config.min_update_interval_ms
        {
            tracing::debug!(distance_m = distance, elapsed_ms, "location accepted");
            self.accept(sample)
        } else {
            tracing::trace!(distance_m = distance, elapsed_ms, "location jitter suppressed");
            Observation::NoChange
        }
    }

    /// Records a provider failure and stops accepting samples.
    pub fn report_error(&mut self, err: PositionError) -> Observation {
        tracing::warn!(error = %err, recoverable = err.is_recoverable(), "location unavailable");
        self.status = SamplerStatus::Unavailable(err);
        Observation::Unavailable(err)
    }

    /// Clears an unavailable status so samples are accepted again.
    ///
    /// The last accepted location is kept; the next sample is gated against
    /// it as usual.
    pub fn restart(&mut self) {
        self.status = if self.last.is_some() {
            SamplerStatus::Tracking
        } else {
            SamplerStatus::Waiting
        };
    }

    /// Forgets everything, as if newly created.
    pub fn reset(&mut self) {
        self.last = None;
        self.status = SamplerStatus::Waiting;
    }

    fn accept(&mut self, sample: LocationSample) -> Observation {
        let stable = StableLocation::from(sample);
        self.last = Some(stable);
        self.status = SamplerStatus::Tracking;
        Observation::Accepted(stable)
    }
}
