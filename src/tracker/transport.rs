//! HTTP transport for the tracker REST API

use log::debug;
use std::time::Duration;

use super::error::{TrackerError, TrackerResult};

/// Source of JSON documents addressed by URL.
///
/// The production implementation performs blocking HTTP GETs; tests supply
/// canned responses.
pub trait TrackerTransport {
    fn get_json(&self, url: &str) -> TrackerResult<serde_json::Value>;
}

impl<T: TrackerTransport + ?Sized> TrackerTransport for &T {
    fn get_json(&self, url: &str) -> TrackerResult<serde_json::Value> {
        (**self).get_json(url)
    }
}

/// Blocking HTTP transport backed by `ureq`
#[derive(Clone)]
pub struct UreqTransport {
    agent: ureq::Agent,
}

impl UreqTransport {
    pub fn new() -> Self {
        Self::with_timeouts(Duration::from_secs(10), Duration::from_secs(60))
    }

    pub fn with_timeouts(connect: Duration, read: Duration) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout_connect(connect)
            .timeout_read(read)
            .build();
        Self { agent }
    }
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl TrackerTransport for UreqTransport {
    fn get_json(&self, url: &str) -> TrackerResult<serde_json::Value> {
        debug!("GET {}", url);
        let response = self
            .agent
            .get(url)
            .set("Accept", "application/json")
            .call()
            .map_err(|e| match e {
                ureq::Error::Status(code, resp) => {
                    let body = resp.into_string().unwrap_or_default();
                    TrackerError::transport(url, format_status_error(code, &body))
                }
                other => TrackerError::transport(url, other.to_string()),
            })?;

        response
            .into_json::<serde_json::Value>()
            .map_err(|e| TrackerError::invalid_response(url, e.to_string()))
    }
}

/// Error status with the tracker's `errorMessages`, or the raw body when it
/// has none
pub fn format_status_error(code: u16, body: &str) -> String {
    let messages: Vec<String> = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|json| json.get("errorMessages").and_then(|m| m.as_array()).cloned())
        .unwrap_or_default()
        .iter()
        .filter_map(|m| m.as_str().map(str::to_string))
        .collect();

    let detail = if messages.is_empty() {
        body.trim().chars().take(200).collect::<String>()
    } else {
        messages.join("; ")
    };

    if detail.is_empty() {
        format!("HTTP {}", code)
    } else {
        format!("HTTP {}: {}", code, detail)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_status_error_uses_error_messages() {
        let body = r#"{"errorMessages":["The value 'NOPE' does not exist for the field 'project'."],"errors":{}}"#;
        assert_eq!(
            format_status_error(400, body),
            "HTTP 400: The value 'NOPE' does not exist for the field 'project'."
        );
    }

    #[test]
    fn test_format_status_error_falls_back_to_body() {
        assert_eq!(format_status_error(503, "  Service Unavailable \n"), "HTTP 503: Service Unavailable");
        assert_eq!(format_status_error(404, ""), "HTTP 404");
        assert_eq!(format_status_error(400, r#"{"errorMessages":[]}"#), r#"HTTP 400: {"errorMessages":[]}"#);
    }
}
