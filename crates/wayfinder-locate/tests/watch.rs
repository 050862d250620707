//! Integration tests for `LocationWatch` driven by a scripted `ChannelProvider`.

use std::time::Duration;

use wayfinder_core::LocationSample;
use wayfinder_locate::{
    ChannelProvider, LocationSignal, LocationWatch, PositionError, ProviderHandle,
    SamplerConfig, SamplerStatus,
};

const LAT: f64 = 21.028_5;
const LNG: f64 = 105.854_2;

async fn wait_for_registrations(handle: &ProviderHandle, n: usize) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while handle.registrations() < n || !handle.is_watching() {
            tokio::task::yield_now().await;
        }
    })
    .await
    .expect("provider registration did not happen");
}

async fn next_signal(rx: &mut tokio::sync::watch::Receiver<LocationSignal>) -> LocationSignal {
    tokio::time::timeout(Duration::from_secs(5), rx.changed())
        .await
        .expect("no signal change")
        .expect("watch task ended");
    *rx.borrow_and_update()
}

#[tokio::test]
async fn starts_waiting_with_no_location() {
    let (provider, handle) = ChannelProvider::new(8);
    let watch = LocationWatch::start(provider, SamplerConfig::default());
    let signal = watch.current();
    assert_eq!(signal.status, SamplerStatus::Waiting);
    assert!(signal.location.is_none());
    wait_for_registrations(&handle, 1).await;
}

#[tokio::test]
async fn publishes_accepted_samples_and_suppresses_jitter() {
    let (provider, handle) = ChannelProvider::new(8);
    let watch = LocationWatch::start(provider, SamplerConfig::default());
    let mut rx = watch.subscribe();
    wait_for_registrations(&handle, 1).await;

    handle.push_sample(LocationSample::new(LAT, LNG, 0)).await;
    let first = next_signal(&mut rx).await;
    assert_eq!(first.status, SamplerStatus::Tracking);
    assert_eq!(first.location.unwrap().accepted_at_ms, 0);

    handle
        .push_sample(LocationSample::new(21.028_51, 105.854_21, 500))
        .await;
    handle
        .push_sample(LocationSample::new(LAT, LNG, 2_500))
        .await;
    let second = next_signal(&mut rx).await;
    assert_eq!(second.location.unwrap().accepted_at_ms, 2_500);
}

#[tokio::test]
async fn error_releases_subscription_until_restart() {
    let (provider, handle) = ChannelProvider::new(8);
    let watch = LocationWatch::start(provider, SamplerConfig::default());
    let mut rx = watch.subscribe();
    wait_for_registrations(&handle, 1).await;

    handle.push_sample(LocationSample::new(LAT, LNG, 0)).await;
    next_signal(&mut rx).await;

    handle.push_error(PositionError::PermissionDenied).await;
    let signal = next_signal(&mut rx).await;
    assert_eq!(
        signal.status,
        SamplerStatus::Unavailable(PositionError::PermissionDenied)
    );
    assert!(signal.location.is_some(), "last real fix is kept");

    tokio::time::timeout(Duration::from_secs(5), handle.released())
        .await
        .expect("registration should be released after an error");
    assert!(
        !handle
            .push_sample(LocationSample::new(LAT + 1.0, LNG, 10_000))
            .await
    );

    watch.restart();
    wait_for_registrations(&handle, 2).await;
    let restarted = next_signal(&mut rx).await;
    assert_eq!(restarted.status, SamplerStatus::Tracking);

    handle
        .push_sample(LocationSample::new(LAT + 0.01, LNG, 12_000))
        .await;
    let moved = next_signal(&mut rx).await;
    assert_eq!(moved.location.unwrap().accepted_at_ms, 12_000);
}

#[tokio::test]
async fn dropping_watch_releases_provider_registration() {
    let (provider, handle) = ChannelProvider::new(8);
    let watch = LocationWatch::start(provider, SamplerConfig::default());
    let mut rx = watch.subscribe();
    wait_for_registrations(&handle, 1).await;

    watch.stop();

    tokio::time::timeout(Duration::from_secs(5), handle.released())
        .await
        .expect("registration should be released on stop");
    assert!(!handle.push_sample(LocationSample::new(LAT, LNG, 0)).await);
    assert!(
        rx.changed().await.is_err(),
        "signal sender should be gone after stop"
    );
}

#[tokio::test]
async fn provider_closing_the_watch_reports_unavailable() {
    let (provider, handle) = ChannelProvider::new(8);
    let watch = LocationWatch::start(provider, SamplerConfig::default());
    let mut rx = watch.subscribe();
    wait_for_registrations(&handle, 1).await;

    handle.push_sample(LocationSample::new(LAT, LNG, 0)).await;
    assert_eq!(next_signal(&mut rx).await.status, SamplerStatus::Tracking);

    handle.close_watch();
    let lost = next_signal(&mut rx).await;
    assert_eq!(
        lost.status,
        SamplerStatus::Unavailable(PositionError::PositionUnavailable)
    );
    assert!(lost.location.is_some(), "last fix is kept");

    watch.restart();
    wait_for_registrations(&handle, 2).await;
    handle.push_sample(LocationSample::new(LAT, LNG, 5_000)).await;
    let back = tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            let signal = next_signal(&mut rx).await;
            if signal.status == SamplerStatus::Tracking
                && signal.location.is_some_and(|l| l.accepted_at_ms == 5_000)
            {
                return signal;
            }
        }
    })
    .await
    .expect("watch did not recover after restart");
    assert_eq!(back.status, SamplerStatus::Tracking);
}
