//! Load state of a statement view

use serde::Serialize;

/// Where the current load stands
///
/// `TransientlyFailed` keeps the loading indicator up with no banner, so the
/// caller can retry silently. `Failed` carries the user-visible message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum LoadState {
    #[default]
    Idle,
    Loading,
    Loaded,
    TransientlyFailed,
    Failed { message: String },
}

impl LoadState {
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading | Self::TransientlyFailed)
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            Self::Failed { message } => Some(message),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_failure_still_loading() {
        let state = LoadState::TransientlyFailed;
        assert!(state.is_loading());
        assert!(!state.is_error());
        assert!(state.error_message().is_none());
    }

    #[test]
    fn test_failed_carries_message() {
        let state = LoadState::Failed {
            message: "Account not found".to_string(),
        };
        assert!(!state.is_loading());
        assert!(state.is_error());
        assert_eq!(state.error_message(), Some("Account not found"));
    }
}
