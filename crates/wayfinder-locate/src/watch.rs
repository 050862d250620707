//! Owner task for a sampler and its provider subscription.

use serde::Serialize;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use wayfinder_core::StableLocation;

use crate::error::PositionError;
use crate::provider::{PositionEvent, PositionProvider};
use crate::sampler::{LocationSampler, Observation, SamplerConfig, SamplerStatus};

/// What consumers of a [`LocationWatch`] see.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LocationSignal {
    pub status: SamplerStatus,
    /// Last accepted location. Kept while unavailable; never synthesized.
    pub location: Option<StableLocation>,
}

impl LocationSignal {
    fn from_sampler(sampler: &LocationSampler) -> Self {
        Self {
            status: sampler.status(),
            location: sampler.current(),
        }
    }
}

#[derive(Debug)]
enum Control {
    Restart,
}

/// A running location watch.
///
/// Spawns a task that registers with the provider, gates samples through a
/// [`LocationSampler`] and publishes every accepted location or status
/// change. On a provider error the registration is dropped and nothing is
/// watched until [`LocationWatch::restart`]. Dropping the `LocationWatch`
/// aborts the task, which releases the registration.
pub struct LocationWatch {
    signal: watch::Receiver<LocationSignal>,
    control: mpsc::UnboundedSender<Control>,
    task: JoinHandle<()>,
}

impl LocationWatch {
    /// Starts watching. Must be called from within a tokio runtime.
    pub fn start<P: PositionProvider>(provider: P, config: SamplerConfig) -> Self {
        let sampler = LocationSampler::new(config);
        let (signal_tx, signal) = watch::channel(LocationSignal::from_sampler(&sampler));
        let (control, control_rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(run(provider, sampler, signal_tx, control_rx));
        Self {
            signal,
            control,
            task,
        }
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<LocationSignal> {
        self.signal.clone()
    }

    #[must_use]
    pub fn current(&self) -> LocationSignal {
        *self.signal.borrow()
    }

    /// Re-registers with the provider after an error (explicit retry).
    pub fn restart(&self) {
        if self.control.send(Control::Restart).is_err() {
            tracing::debug!("restart requested after location watch stopped");
        }
    }

    /// Stops the watch and releases the provider registration.
    pub fn stop(self) {
        drop(self);
    }
}

impl Drop for LocationWatch {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn run<P: PositionProvider>(
    mut provider: P,
    mut sampler: LocationSampler,
    signal: watch::Sender<LocationSignal>,
    mut control: mpsc::UnboundedReceiver<Control>,
) {
    let mut events = Some(provider.watch_position());
    tracing::debug!("location watch registered");

    loop {
        tokio::select! {
            event = next_event(&mut events) => match event {
                Some(PositionEvent::Sample(sample)) => {
                    if let Observation::Accepted(_) = sampler.observe(sample) {
                        publish(&signal, &sampler);
                    }
                }
                Some(PositionEvent::Error(err)) => {
                    sampler.report_error(err);
                    // Stop expecting samples until an explicit restart.
                    events = None;
                    publish(&signal, &sampler);
                }
                None => {
                    tracing::warn!("provider closed the location watch");
                    sampler.report_error(PositionError::PositionUnavailable);
                    events = None;
                    publish(&signal, &sampler);
                }
            },
            cmd = control.recv() => match cmd {
                Some(Control::Restart) => {
                    sampler.restart();
                    events = Some(provider.watch_position());
                    tracing::debug!("location watch re-registered");
                    publish(&signal, &sampler);
                }
                None => break,
            },
        }
    }
}

async fn next_event(
    events: &mut Option<mpsc::Receiver<PositionEvent>>,
) -> Option<PositionEvent> {
    match events {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}

fn publish(signal: &watch::Sender<LocationSignal>, sampler: &LocationSampler) {
    let next = LocationSignal::from_sampler(sampler);
    signal.send_if_modified(|current| {
        if *current == next {
            false
        } else {
            *current = next;
            true
        }
    });
}
