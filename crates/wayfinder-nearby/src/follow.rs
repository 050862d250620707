//! Re-centres nearby queries whenever the location watch accepts a new fix.

use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use wayfinder_core::{FetchRequestParams, StableLocation};
use wayfinder_locate::{LocationSignal, SamplerStatus};

use crate::nearby::NearbyDataFetcher;

/// Which fetch slots follow the location.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FollowTargets {
    pub places: bool,
    pub suggestions: bool,
    pub weather: bool,
}

impl Default for FollowTargets {
    fn default() -> Self {
        Self {
            places: true,
            suggestions: true,
            weather: true,
        }
    }
}

/// Background task feeding accepted locations into a [`NearbyDataFetcher`].
///
/// Only locations that changed while tracking trigger requests, so the
/// sampler's gate is the only throttle and the fetcher's debounce collapses
/// whatever bursts remain. Dropping the follower stops the task.
pub struct LocationFollower {
    task: JoinHandle<()>,
}

impl LocationFollower {
    /// Must be called from within a tokio runtime.
    pub fn spawn(
        fetcher: Arc<NearbyDataFetcher>,
        mut signal: watch::Receiver<LocationSignal>,
        template: FetchRequestParams,
        targets: FollowTargets,
    ) -> Self {
        let task = tokio::spawn(async move {
            let mut last: Option<StableLocation> = None;
            loop {
                let current = *signal.borrow_and_update();
                if let (SamplerStatus::Tracking, Some(location)) = (current.status, current.location) {
                    if last != Some(location) {
                        last = Some(location);
                        recentre(&fetcher, &template, targets, location);
                    }
                }
                if signal.changed().await.is_err() {
                    tracing::debug!("location signal closed, follower exiting");
                    break;
                }
            }
        });
        Self { task }
    }

    pub fn stop(self) {
        drop(self);
    }
}

impl Drop for LocationFollower {
    fn drop(&mut self) {
        self.task.abort();
    }
}

fn recentre(
    fetcher: &NearbyDataFetcher,
    template: &FetchRequestParams,
    targets: FollowTargets,
    location: StableLocation,
) {
    let center = location.point();
    tracing::debug!(lat = center.lat, lng = center.lng, "re-centring nearby queries");
    let params = template.with_center(center);
    if targets.places {
        fetcher.request_places(params.clone());
    }
    if targets.suggestions {
        fetcher.request_suggestions(params);
    }
    if targets.weather {
        fetcher.request_weather(center);
    }
}
