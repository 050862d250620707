//! Nearby-data fetching: the backend client, debounced fetch slots and the
//! follower that ties them to a location watch.

pub mod client;
pub mod error;
pub mod fetcher;
pub mod follow;
pub mod nearby;
pub mod normalize;
pub(crate) mod retry;
pub mod source;
pub mod state;

pub use client::BackendClient;
pub use error::BackendError;
pub use fetcher::{DebounceConfig, DebouncedFetcher, FetchFn, FetchFuture};
pub use follow::{FollowTargets, LocationFollower};
pub use nearby::{
    FetcherConfig, NearbyDataFetcher, DESTINATIONS_LABEL, PLACES_LABEL, ROUTE_LABEL,
    SUGGESTIONS_LABEL, WEATHER_LABEL,
};
pub use normalize::display_address;
pub use source::PlaceSource;
pub use state::{FetchState, FetchStatus};
