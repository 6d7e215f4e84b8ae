//! `/health` endpoint.

use serde::Serialize;
use std::time::Instant;

/// Health check response body.
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Always `"ok"` when the server is running.
    pub status: String,
    /// Seconds since the server started.
    pub uptime_secs: u64,
    /// Number of live device sessions.
    pub live_sessions: usize,
}

/// Build a health response from live counters.
pub fn health_check(start_time: Instant, live_sessions: usize) -> HealthResponse {
    HealthResponse {
        status: "ok".into(),
        uptime_secs: start_time.elapsed().as_secs(),
        live_sessions,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_is_ok() {
        let resp = health_check(Instant::now(), 0);
        assert_eq!(resp.status, "ok");
    }

    #[test]
    fn uptime_increases() {
        let start = Instant::now()
            .checked_sub(std::time::Duration::from_secs(60))
            .unwrap();
        let resp = health_check(start, 0);
        assert!(resp.uptime_secs >= 59);
    }

    #[test]
    fn session_count_tracked() {
        let resp = health_check(Instant::now(), 3);
        assert_eq!(resp.live_sessions, 3);
    }

    #[test]
    fn serialization() {
        let resp = health_check(Instant::now(), 2);
        let json: serde_json::Value =
            serde_json::from_str(&serde_json::to_string(&resp).unwrap()).unwrap();
        assert_eq!(json["status"], "ok");
        assert_eq!(json["live_sessions"], 2);
        assert!(json["uptime_secs"].is_number());
    }
}
