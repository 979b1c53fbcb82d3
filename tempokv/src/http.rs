//! HTTP surface of the rate limiter, independent of any server framework.
//!
//! [`RateLimitHeaders`] goes on every limited response; a refused request is
//! answered with [`TooManyRequests`].

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;

use crate::limiter::Decision;

/// Header carrying the applied limit.
pub const LIMIT_HEADER: &str = "X-RateLimit-Limit";
/// Header carrying the requests left in the window.
pub const REMAINING_HEADER: &str = "X-RateLimit-Remaining";
/// Header carrying the window reset time, in unix seconds.
pub const RESET_HEADER: &str = "X-RateLimit-Reset";
/// Header telling a refused client when to retry, in seconds.
pub const RETRY_AFTER_HEADER: &str = "Retry-After";

/// Seconds sent in `Retry-After` on a refusal.
pub const RETRY_AFTER_SECS: u64 = 60;

/// The `X-RateLimit-*` headers for one decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitHeaders {
    /// Applied limit.
    pub limit: u32,
    /// Requests left in the window.
    pub remaining: u32,
    /// Unix seconds at which the window resets.
    pub reset: i64,
}

impl RateLimitHeaders {
    /// Headers describing `decision`.
    pub fn from_decision(decision: &Decision) -> Self {
        Self {
            limit: decision.limit,
            remaining: decision.remaining,
            reset: decision.reset_at_wall.timestamp(),
        }
    }

    /// Header name/value pairs, in a fixed order.
    pub fn pairs(&self) -> [(&'static str, String); 3] {
        [
            (LIMIT_HEADER, self.limit.to_string()),
            (REMAINING_HEADER, self.remaining.to_string()),
            (RESET_HEADER, self.reset.to_string()),
        ]
    }
}

impl From<&Decision> for RateLimitHeaders {
    fn from(decision: &Decision) -> Self {
        Self::from_decision(decision)
    }
}

#[derive(Serialize)]
struct ErrorDetail<'a> {
    code: &'a str,
    message: &'a str,
    #[serde(rename = "type")]
    kind: &'a str,
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: ErrorDetail<'a>,
    success: bool,
    timestamp: String,
}

/// The response to a refused request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TooManyRequests {
    /// Limit headers for the refusing decision.
    pub headers: RateLimitHeaders,
    /// Human-readable reason.
    pub message: String,
    /// When the refusal happened.
    pub at: DateTime<Utc>,
}

impl TooManyRequests {
    /// HTTP status code.
    pub const STATUS: u16 = 429;

    /// Refusal for `decision`, stamped at `at`.
    pub fn new(decision: &Decision, at: DateTime<Utc>) -> Self {
        Self {
            headers: RateLimitHeaders::from_decision(decision),
            message: "Too many requests, please try again later.".to_string(),
            at,
        }
    }

    /// Replace the message.
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Status code, always 429.
    pub fn status(&self) -> u16 {
        Self::STATUS
    }

    /// All response headers: the limit headers followed by `Retry-After`.
    pub fn headers(&self) -> Vec<(&'static str, String)> {
        let mut out = self.headers.pairs().to_vec();
        out.push((RETRY_AFTER_HEADER, RETRY_AFTER_SECS.to_string()));
        out
    }

    /// JSON error body.
    pub fn body(&self) -> serde_json::Result<String> {
        serde_json::to_string(&ErrorBody {
            error: ErrorDetail {
                code: "TOO_MANY_REQUESTS",
                message: &self.message,
                kind: "RATE_LIMIT_EXCEEDED",
            },
            success: false,
            timestamp: self.at.to_rfc3339_opts(SecondsFormat::Millis, true),
        })
    }
}
