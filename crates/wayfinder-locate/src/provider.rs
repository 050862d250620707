//! Platform geolocation seam.
//!
//! A provider hands out a channel per watch registration. The registration
//! lives exactly as long as the returned receiver: dropping it closes the
//! channel, which the platform side observes as "watch cleared".

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use wayfinder_core::LocationSample;

use crate::error::PositionError;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PositionEvent {
    Sample(LocationSample),
    Error(PositionError),
}

pub trait PositionProvider: Send + 'static {
    /// Starts a continuous watch. Events flow until the receiver is dropped.
    fn watch_position(&mut self) -> mpsc::Receiver<PositionEvent>;
}

/// Reads a single position by registering a watch, taking its first event
/// and releasing the registration.
///
/// # Errors
///
/// - The provider's own [`PositionError`] if its first event is an error.
/// - [`PositionError::Timeout`] if nothing arrives within `timeout`.
/// - [`PositionError::PositionUnavailable`] if the provider closes the
///   watch without reporting anything.
pub async fn current_position<P: PositionProvider>(
    provider: &mut P,
    timeout: Duration,
) -> Result<LocationSample, PositionError> {
    let mut events = provider.watch_position();
    let first = tokio::time::timeout(timeout, events.recv()).await;
    drop(events);

    match first {
        Ok(Some(PositionEvent::Sample(sample))) => Ok(sample),
        Ok(Some(PositionEvent::Error(err))) => Err(err),
        Ok(None) => Err(PositionError::PositionUnavailable),
        Err(_) => Err(PositionError::Timeout),
    }
}

type Slot = Arc<Mutex<Option<mpsc::Sender<PositionEvent>>>>;

/// In-process provider driven through a [`ProviderHandle`].
///
/// Used by the CLI to replay samples from stdin and by tests to script GPS
/// behaviour. Each `watch_position` call replaces the previous registration.
pub struct ChannelProvider {
    slot: Slot,
    registrations: Arc<AtomicUsize>,
    capacity: usize,
}

/// Producer side of a [`ChannelProvider`].
#[derive(Clone)]
pub struct ProviderHandle {
    slot: Slot,
    registrations: Arc<AtomicUsize>,
}

impl ChannelProvider {
    #[must_use]
    pub fn new(capacity: usize) -> (Self, ProviderHandle) {
        let slot: Slot = Arc::new(Mutex::new(None));
        let registrations = Arc::new(AtomicUsize::new(0));
        let provider = Self {
            slot: Arc::clone(&slot),
            registrations: Arc::clone(&registrations),
            capacity: capacity.max(1),
        };
        (
            provider,
            ProviderHandle {
                slot,
                registrations,
            },
        )
    }
}

impl PositionProvider for ChannelProvider {
    fn watch_position(&mut self) -> mpsc::Receiver<PositionEvent> {
        let (tx, rx) = mpsc::channel(self.capacity);
        *self.slot.lock().unwrap_or_else(PoisonError::into_inner) = Some(tx);
        self.registrations.fetch_add(1, Ordering::SeqCst);
        rx
    }
}

impl ProviderHandle {
    fn sender(&self) -> Option<mpsc::Sender<PositionEvent>> {
        self.slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Delivers an event to the active registration.
    ///
    /// Returns `false` when nobody is watching; the event is dropped, as a
    /// platform would drop readings after `clearWatch`.
    pub async fn push(&self, event: PositionEvent) -> bool {
        match self.sender() {
            Some(tx) => tx.send(event).await.is_ok(),
            None => false,
        }
    }

    pub async fn push_sample(&self, sample: LocationSample) -> bool {
        self.push(PositionEvent::Sample(sample)).await
    }

    pub async fn push_error(&self, err: PositionError) -> bool {
        self.push(PositionEvent::Error(err)).await
    }

    #[must_use]
    pub fn is_watching(&self) -> bool {
        self.sender().is_some_and(|tx| !tx.is_closed())
    }

    /// Total number of watch registrations made so far.
    #[must_use]
    pub fn registrations(&self) -> usize {
        self.registrations.load(Ordering::SeqCst)
    }

    /// Ends the current registration from the provider side, as a platform
    /// does when it stops delivering positions.
    pub fn close_watch(&self) {
        self.slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
    }

    /// Resolves once the current registration has been released.
    pub async fn released(&self) {
        if let Some(tx) = self.sender() {
            tx.closed().await;
        }
    }
}
