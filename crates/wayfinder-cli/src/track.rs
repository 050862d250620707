//! `track`: stdin positions → location watch → follower → fetcher, printing
//! every published state change as one JSON line.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::io::BufReader;
use tokio::sync::mpsc;
use tokio::time::Instant;
use wayfinder_core::{AppConfig, GeoPoint};
use wayfinder_locate::{ChannelProvider, LocationWatch, SamplerConfig, SamplerStatus};
use wayfinder_nearby::{
    BackendClient, FetcherConfig, FollowTargets, LocationFollower, NearbyDataFetcher,
};

use crate::input::feed;
use crate::query::build_params;
use crate::TrackArgs;

#[derive(Debug, Serialize)]
struct Update<'a, T: Serialize> {
    kind: &'a str,
    state: &'a T,
}

fn emit<T: Serialize>(kind: &str, state: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string(&Update { kind, state })?);
    Ok(())
}

pub(crate) fn follow_targets(args: &TrackArgs) -> FollowTargets {
    FollowTargets {
        places: true,
        suggestions: !args.no_suggestions,
        weather: !args.no_weather,
    }
}

pub(crate) async fn run_track(
    config: &AppConfig,
    client: BackendClient,
    args: TrackArgs,
) -> anyhow::Result<()> {
    // The centre is replaced on every accepted fix.
    let template = build_params(config, GeoPoint { lat: 0.0, lng: 0.0 }, &args.query)?;

    let (provider, handle) = ChannelProvider::new(64);
    let watch = LocationWatch::start(provider, SamplerConfig::from_app_config(config));
    let fetcher = Arc::new(NearbyDataFetcher::new(
        Arc::new(client),
        FetcherConfig::from_app_config(config),
    ));
    let follower = LocationFollower::spawn(
        Arc::clone(&fetcher),
        watch.subscribe(),
        template,
        follow_targets(&args),
    );

    let (restart_tx, mut restart_rx) = mpsc::unbounded_channel();
    let mut feeder = tokio::spawn(feed(
        BufReader::new(tokio::io::stdin()),
        handle,
        Some(restart_tx),
    ));

    let mut location = watch.subscribe();
    let mut places = fetcher.subscribe_places();
    let mut suggestions = fetcher.subscribe_suggestions();
    let mut weather = fetcher.subscribe_weather();

    let mut input_open = true;
    let linger = tokio::time::sleep(Duration::from_secs(86_400));
    tokio::pin!(linger);

    loop {
        tokio::select! {
            joined = &mut feeder, if input_open => {
                input_open = false;
                let delivered = joined??;
                tracing::info!(delivered, linger_ms = args.linger_ms, "input closed");
                linger.as_mut().reset(Instant::now() + Duration::from_millis(args.linger_ms));
            }
            () = &mut linger, if !input_open => break,
            Some(()) = restart_rx.recv() => {
                tracing::info!("restarting location watch");
                watch.restart();
            }
            Ok(()) = location.changed() => {
                let signal = *location.borrow_and_update();
                if let SamplerStatus::Unavailable(err) = signal.status {
                    tracing::warn!(error = %err, recoverable = err.is_recoverable(), "{}", err.user_message());
                }
                emit("location", &signal)?;
            }
            Ok(()) = places.changed() => {
                let state = places.borrow_and_update().clone();
                emit("places", &state)?;
            }
            Ok(()) = suggestions.changed() => {
                let state = suggestions.borrow_and_update().clone();
                emit("suggestions", &state)?;
            }
            Ok(()) = weather.changed() => {
                let state = weather.borrow_and_update().clone();
                emit("weather", &state)?;
            }
        }
    }

    follower.stop();
    fetcher.shutdown();
    watch.stop();
    Ok(())
}
