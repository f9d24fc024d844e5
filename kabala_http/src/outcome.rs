//! Classified result of a single page fetch.

use std::time::Duration;

/// Outcome of one GET request.
///
/// Every request resolves to exactly one variant; callers decide whether to
/// retry by matching on it rather than by inspecting nullable fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Any 2xx response, with the full body.
    Success { status: u16, body: String },
    /// HTTP 429 or 403. `retry_after` carries the server hint, if any.
    RateLimited {
        status: u16,
        retry_after: Option<Duration>,
    },
    /// Any other non-success status. Not worth retrying.
    Failed { status: u16 },
    /// The request never produced a status (connect error, timeout, body read).
    Network { reason: String },
}

impl FetchOutcome {
    /// Status codes treated as "slow down" signals.
    pub const RATE_LIMIT_STATUSES: [u16; 2] = [429, 403];

    /// HTTP status, or `0` when the request failed at the transport level.
    pub fn status(&self) -> u16 {
        match self {
            Self::Success { status, .. }
            | Self::RateLimited { status, .. }
            | Self::Failed { status } => *status,
            Self::Network { .. } => 0,
        }
    }

    /// The page body; present if and only if the fetch succeeded.
    pub fn html(&self) -> Option<&str> {
        match self {
            Self::Success { body, .. } => Some(body),
            _ => None,
        }
    }

    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::RateLimited { retry_after, .. } => *retry_after,
            _ => None,
        }
    }

    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Self::RateLimited { .. })
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn html_only_present_on_success() {
        let ok = FetchOutcome::Success {
            status: 200,
            body: "<html></html>".into(),
        };
        assert_eq!(ok.html(), Some("<html></html>"));
        assert_eq!(ok.status(), 200);

        let blocked = FetchOutcome::RateLimited {
            status: 429,
            retry_after: Some(Duration::from_secs(5)),
        };
        assert_eq!(blocked.html(), None);
        assert!(blocked.is_rate_limited());
        assert_eq!(blocked.retry_after(), Some(Duration::from_secs(5)));
    }

    #[test]
    fn network_failure_reports_status_zero() {
        let outcome = FetchOutcome::Network {
            reason: "connection refused".into(),
        };
        assert_eq!(outcome.status(), 0);
        assert!(!outcome.is_rate_limited());
        assert_eq!(outcome.retry_after(), None);
    }

    #[test]
    fn failed_is_not_rate_limited() {
        let outcome = FetchOutcome::Failed { status: 404 };
        assert!(!outcome.is_rate_limited());
        assert!(!outcome.is_success());
        assert_eq!(outcome.status(), 404);
    }
}
