//! Observable state of one fetch slot.

use serde::Serialize;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FetchStatus {
    #[default]
    Idle,
    Loading,
    Success,
    Error,
}

/// Status, last good data and last error message of a fetch slot.
///
/// `data` is only replaced by a successful response, so it stays visible
/// while a refresh is loading or after it fails (stale-while-revalidate).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FetchState<T> {
    pub status: FetchStatus,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T> Default for FetchState<T> {
    fn default() -> Self {
        Self {
            status: FetchStatus::Idle,
            data: None,
            error: None,
        }
    }
}

impl<T> FetchState<T> {
    pub(crate) fn begin_loading(&mut self) {
        self.status = FetchStatus::Loading;
    }

    pub(crate) fn succeed(&mut self, data: T) {
        self.status = FetchStatus::Success;
        self.data = Some(data);
        self.error = None;
    }

    pub(crate) fn fail(&mut self, message: String) {
        self.status = FetchStatus::Error;
        self.error = Some(message);
    }

    pub(crate) fn reset(&mut self) {
        *self = Self::default();
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.status == FetchStatus::Loading
    }

    /// Loading while older data is still on screen.
    #[must_use]
    pub fn is_refreshing(&self) -> bool {
        self.is_loading() && self.data.is_some()
    }

    /// The error to show in place of content: only when the last attempt
    /// failed and there is no prior data to fall back on.
    #[must_use]
    pub fn blocking_error(&self) -> Option<&str> {
        match (self.status, &self.data) {
            (FetchStatus::Error, None) => self.error.as_deref(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_idle_and_empty() {
        let state = FetchState::<u32>::default();
        assert_eq!(state.status, FetchStatus::Idle);
        assert!(state.data.is_none());
        assert!(state.error.is_none());
    }

    #[test]
    fn failure_keeps_previous_data() {
        let mut state = FetchState::default();
        state.begin_loading();
        state.succeed(vec![1, 2, 3]);
        state.begin_loading();
        assert!(state.is_refreshing());
        state.fail("boom".to_owned());
        assert_eq!(state.status, FetchStatus::Error);
        assert_eq!(state.data, Some(vec![1, 2, 3]));
        assert_eq!(state.error.as_deref(), Some("boom"));
        assert!(state.blocking_error().is_none());
    }

    #[test]
    fn error_blocks_only_without_data() {
        let mut state = FetchState::<u32>::default();
        state.begin_loading();
        assert!(!state.is_refreshing());
        state.fail("offline".to_owned());
        assert_eq!(state.blocking_error(), Some("offline"));
    }

    #[test]
    fn success_clears_previous_error() {
        let mut state = FetchState::default();
        state.fail("offline".to_owned());
        state.begin_loading();
        assert_eq!(state.error.as_deref(), Some("offline"));
        state.succeed(7);
        assert!(state.error.is_none());
        assert_eq!(state.status, FetchStatus::Success);
    }

    #[test]
    fn serializes_status_lowercase() {
        let mut state = FetchState::default();
        state.succeed(1);
        assert_eq!(
            serde_json::to_value(&state).unwrap(),
            serde_json::json!({ "status": "success", "data": 1, "error": null })
        );
    }
}
