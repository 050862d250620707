//! Turns a noisy stream of platform GPS readings into a stable location
//! signal.
//!
//! [`LocationSampler`] is the synchronous distance/time gate.
//! [`LocationWatch`] owns a sampler plus the provider subscription inside a
//! tokio task and publishes [`LocationSignal`] updates over a
//! `tokio::sync::watch` channel. Dropping the watch releases the
//! subscription.

pub mod error;
pub mod provider;
pub mod sampler;
pub mod watch;

pub use error::PositionError;
pub use provider::{current_position, ChannelProvider, PositionEvent, PositionProvider, ProviderHandle};
pub use sampler::{LocationSampler, Observation, SamplerConfig, SamplerStatus};
pub use watch::{LocationSignal, LocationWatch};
