//! HTTP client for the power-monitoring backend.

use super::PowerLimitCommand;
use crate::telemetry::extract::parse_sample;
use crate::telemetry::{NetworkError, PowerSample};
use reqwest::blocking::{Client, Response};
use std::time::Duration;

/// Default connect timeout and total request deadline for every backend call.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(2000);

/// The two backend operations the core depends on.
pub trait TelemetryBackend: Send + Sync {
    /// Fetch and decode the most recent reading.
    fn fetch_latest(&self) -> Result<PowerSample, NetworkError>;

    /// Request an output power cap. Returns the raw acknowledgement body.
    fn set_power_limit(&self, percent: i32) -> Result<String, NetworkError>;
}

/// Blocking HTTP implementation of [`TelemetryBackend`].
///
/// Idle connections are never pooled, so each call opens one connection and it is
/// closed once the response has been read, whatever the outcome.
pub struct BackendClient {
    client: Client,
    base_url: String,
}

impl BackendClient {
    /// Create a client for `base_url` (e.g. `http://host:4020/api/v1`).
    ///
    /// `timeout` bounds connecting and, separately, the whole request including the
    /// body. That total deadline stands in for a read timeout, so a response still
    /// streaming when it expires fails as [`NetworkError::Timeout`].
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, NetworkError> {
        let client = Client::builder()
            .connect_timeout(timeout)
            .timeout(timeout)
            .pool_max_idle_per_host(0)
            .build()
            .map_err(|e| NetworkError::Transport(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

impl TelemetryBackend for BackendClient {
    fn fetch_latest(&self) -> Result<PowerSample, NetworkError> {
        let url = format!("{}/telemetry/latest", self.base_url);
        log::trace!("GET {}", url);

        let response = self.client.get(&url).send().map_err(classify)?;
        let body = read_body(response)?;

        Ok(parse_sample(&body)?)
    }

    fn set_power_limit(&self, percent: i32) -> Result<String, NetworkError> {
        let url = format!("{}/control/power_limit", self.base_url);
        let command = PowerLimitCommand::new(percent);

        log::info!("Sending power limit to {}: {:?}", url, command);

        let response = self.client.post(&url).json(&command).send().map_err(classify)?;
        read_body(response)
    }
}

/// Read the whole body; a non-2xx status still has its body read for the error.
fn read_body(response: Response) -> Result<String, NetworkError> {
    let status = response.status();
    if status.is_success() {
        response.text().map_err(classify)
    } else {
        let body = response.text().unwrap_or_default();
        Err(NetworkError::BackendStatus {
            status: status.as_u16(),
            body,
        })
    }
}

fn classify(e: reqwest::Error) -> NetworkError {
    if e.is_timeout() {
        NetworkError::Timeout(e.to_string())
    } else {
        NetworkError::Transport(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::telemetry::ParseError;
    use std::io::{BufRead, BufReader, Read, Write};
    use std::net::TcpListener;
    use std::thread::{self, JoinHandle};

    /// Serve one canned response on a loopback port and return the raw request text.
    fn serve_once(status_line: &'static str, body: &'static str) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let base = format!("http://{}/api/v1", listener.local_addr().unwrap());
        let handle = thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut reader = BufReader::new(stream.try_clone().unwrap());
            let mut request = String::new();
            let mut content_length = 0usize;
            loop {
                let mut line = String::new();
                if reader.read_line(&mut line).unwrap() == 0 {
                    break;
                }
                if let Some(value) = line.to_ascii_lowercase().strip_prefix("content-length:") {
                    content_length = value.trim().parse().unwrap();
                }
                request.push_str(&line);
                if line == "\r\n" {
                    break;
                }
            }
            let mut payload = vec![0u8; content_length];
            reader.read_exact(&mut payload).unwrap();
            request.push_str(&String::from_utf8(payload).unwrap());

            let response = format!(
                "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status_line,
                body.len(),
                body
            );
            stream.write_all(response.as_bytes()).unwrap();
            stream.flush().unwrap();
            request
        });
        (base, handle)
    }

    #[test]
    fn fetch_latest_decodes_sample() {
        let (base, server) = serve_once("200 OK", r#"{"voltage_V": -1.200, "current_A": 3, "power_W": 12.34}"#);
        let client = BackendClient::new(&base, DEFAULT_TIMEOUT).unwrap();

        let sample = client.fetch_latest().unwrap();
        assert_eq!(sample, PowerSample::new(3.0, -1.2, 12.34));

        let request = server.join().unwrap();
        assert!(request.starts_with("GET /api/v1/telemetry/latest "), "{request}");
    }

    #[test]
    fn fetch_latest_reports_status_and_body() {
        let (base, server) = serve_once("503 Service Unavailable", "sensor offline");
        let client = BackendClient::new(&base, DEFAULT_TIMEOUT).unwrap();

        assert_eq!(
            client.fetch_latest(),
            Err(NetworkError::BackendStatus {
                status: 503,
                body: "sensor offline".into(),
            })
        );
        server.join().unwrap();
    }

    #[test]
    fn fetch_latest_fails_whole_on_missing_field() {
        let (base, server) = serve_once("200 OK", r#"{"current_A":1,"power_W":2}"#);
        let client = BackendClient::new(&base, DEFAULT_TIMEOUT).unwrap();

        assert_eq!(
            client.fetch_latest(),
            Err(NetworkError::Payload(ParseError::FieldNotFound("voltage_V".into())))
        );
        server.join().unwrap();
    }

    #[test]
    fn set_power_limit_posts_json_and_returns_ack() {
        let (base, server) = serve_once("200 OK", r#"{"ok":true,"percent":90}"#);
        let client = BackendClient::new(&format!("{}/", base), DEFAULT_TIMEOUT).unwrap();

        let ack = client.set_power_limit(90).unwrap();
        assert_eq!(ack, r#"{"ok":true,"percent":90}"#);

        let request = server.join().unwrap();
        assert!(request.starts_with("POST /api/v1/control/power_limit "), "{request}");
        assert!(request.to_ascii_lowercase().contains("content-type: application/json"));
        assert!(request.ends_with(r#"{"percent":90}"#), "{request}");
    }

    #[test]
    fn set_power_limit_rejects_non_success_status() {
        let (base, server) = serve_once("500 Internal Server Error", "limit rejected");
        let client = BackendClient::new(&base, DEFAULT_TIMEOUT).unwrap();

        let err = client.set_power_limit(85).unwrap_err();
        assert_eq!(
            err,
            NetworkError::BackendStatus {
                status: 500,
                body: "limit rejected".into(),
            }
        );
        server.join().unwrap();
    }

    #[test]
    fn unresponsive_backend_times_out() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let base = format!("http://{}/api/v1", listener.local_addr().unwrap());
        thread::spawn(move || {
            let (_stream, _) = listener.accept().unwrap();
            thread::sleep(Duration::from_secs(2));
        });

        let client = BackendClient::new(&base, Duration::from_millis(200)).unwrap();
        assert!(matches!(client.fetch_latest(), Err(NetworkError::Timeout(_))));
    }

    #[test]
    fn refused_connection_is_transport_error() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let base = format!("http://{}/api/v1", listener.local_addr().unwrap());
        drop(listener);

        let client = BackendClient::new(&base, DEFAULT_TIMEOUT).unwrap();
        assert!(matches!(client.fetch_latest(), Err(NetworkError::Transport(_))));
    }
}
