//! Per-attempt and final negotiation outcomes

use axum::http::StatusCode;
use bytes::Bytes;

/// Result of one backend attempt, or of a whole negotiation
#[derive(Debug, Clone)]
pub enum BackendOutcome {
    /// The backend answered exactly 200
    Accepted { body: Bytes, status: StatusCode },
    /// Anything else
    Rejected(Rejection),
}

impl BackendOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, BackendOutcome::Accepted { .. })
    }
}

/// Why an attempt was not accepted
#[derive(Debug, Clone)]
pub enum Rejection {
    /// The backend answered with a status other than 200
    Status {
        status: StatusCode,
        body: Option<Bytes>,
    },
    /// The attempt exceeded its timeout
    Timeout,
    /// Connection failure or other transport error
    Transport(String),
    /// The candidate body could not be serialized
    InvalidCandidate(String),
    /// The attempt space was empty
    NoAttempts,
}

impl Rejection {
    /// Backend status, if the backend answered at all
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Rejection::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// True for a 401 or 403 answer
    pub fn is_auth_failure(&self) -> bool {
        matches!(
            self.status(),
            Some(StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN)
        )
    }

    /// Label used in logs and metrics
    pub fn kind(&self) -> &'static str {
        match self {
            Rejection::Status { .. } if self.is_auth_failure() => "auth_rejected",
            Rejection::Status { .. } => "status_rejected",
            Rejection::Timeout => "timeout",
            Rejection::Transport(_) => "transport_error",
            Rejection::InvalidCandidate(_) => "invalid_candidate",
            Rejection::NoAttempts => "no_attempts",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_failure_detection() {
        for status in [StatusCode::UNAUTHORIZED, StatusCode::FORBIDDEN] {
            let rejection = Rejection::Status { status, body: None };
            assert!(rejection.is_auth_failure());
            assert_eq!(rejection.kind(), "auth_rejected");
        }

        let rejection = Rejection::Status {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            body: None,
        };
        assert!(!rejection.is_auth_failure());
        assert_eq!(rejection.kind(), "status_rejected");
    }

    #[test]
    fn test_transport_rejections_have_no_status() {
        assert_eq!(Rejection::Timeout.status(), None);
        assert_eq!(Rejection::Transport("refused".into()).status(), None);
        assert!(!Rejection::Timeout.is_auth_failure());
    }
}
