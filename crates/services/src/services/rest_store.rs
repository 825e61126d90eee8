//! Completion source backed by a hosted PostgREST-style database API.

use async_trait::async_trait;
use db::models::completion::{CompletionRecord, RawCompletionRow};
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use tracing::{debug, warn};
use url::Url;

use super::{
    completers::DateWindow,
    completion_source::{CompletionSource, CompletionSourceError},
    config::RestConfig,
};

const EXERCISE_LOGS_PATH: &str = "rest/v1/exercise_logs";

/// Embedded selection: each log with its route and member.
const COMPLETION_SELECT: &str = "id,logged_at,\
route:routes(id,wall_type,grade_value,grade_detail,name,hold_count),\
profile:profiles(id,name)";

#[derive(Debug, Clone)]
pub struct RestCompletionSource {
    http: Client,
    endpoint: Url,
    api_key: SecretString,
}

impl RestCompletionSource {
    pub fn new(config: &RestConfig) -> Result<Self, CompletionSourceError> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| CompletionSourceError::Transport(e.to_string()))?;
        Ok(Self {
            http,
            endpoint: exercise_logs_endpoint(&config.base_url)?,
            api_key: config.api_key.clone(),
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

/// `{base}/rest/v1/exercise_logs`, tolerating a base URL with or without a
/// trailing slash or a path prefix.
fn exercise_logs_endpoint(base_url: &Url) -> Result<Url, CompletionSourceError> {
    let mut base = base_url.clone();
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    base.join(EXERCISE_LOGS_PATH)
        .map_err(|e| CompletionSourceError::InvalidEndpoint(e.to_string()))
}

/// Filter parameters for completed logs inside `window`.
fn completion_query(window: &DateWindow) -> Vec<(&'static str, String)> {
    let mut query = vec![
        ("select", COMPLETION_SELECT.to_string()),
        ("is_completed", "eq.true".to_string()),
    ];
    if window.is_single_day() {
        query.push(("logged_at", format!("eq.{}", window.start.format("%Y-%m-%d"))));
    } else {
        query.push(("logged_at", format!("gte.{}", window.start.format("%Y-%m-%d"))));
        query.push(("logged_at", format!("lte.{}", window.end.format("%Y-%m-%d"))));
    }
    query
}

/// Decode each row on its own; an off-shape row is logged and dropped.
fn decode_rows(rows: Vec<Value>) -> Vec<CompletionRecord> {
    rows.into_iter()
        .enumerate()
        .filter_map(|(index, row)| match RawCompletionRow::from_value(row) {
            Ok(raw) => Some(raw.normalize()),
            Err(e) => {
                warn!(index, error = %e, "Skipping malformed completion row");
                None
            }
        })
        .collect()
}

fn transport_error(e: reqwest::Error) -> CompletionSourceError {
    if e.is_timeout() {
        CompletionSourceError::Timeout
    } else if e.is_decode() {
        CompletionSourceError::Decode(e.to_string())
    } else {
        CompletionSourceError::Transport(e.to_string())
    }
}

#[async_trait]
impl CompletionSource for RestCompletionSource {
    async fn fetch_completed(
        &self,
        window: DateWindow,
    ) -> Result<Vec<CompletionRecord>, CompletionSourceError> {
        let api_key = self.api_key.expose_secret();
        let response = self
            .http
            .get(self.endpoint.clone())
            .query(&completion_query(&window))
            .header("apikey", api_key)
            .bearer_auth(api_key)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CompletionSourceError::Http {
                status: status.as_u16(),
                body,
            });
        }

        let rows: Vec<Value> = response.json().await.map_err(transport_error)?;
        let fetched = rows.len();
        let records = decode_rows(rows);
        debug!(
            fetched,
            decoded = records.len(),
            start = %window.start,
            end = %window.end,
            "Fetched completions"
        );
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use chrono::NaiveDate;
    use tokio::{
        io::{AsyncReadExt, AsyncWriteExt},
        net::TcpListener,
        task::JoinHandle,
    };

    use super::*;
    use crate::services::completers::rank_completers;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn rest_config(base: &str) -> RestConfig {
        RestConfig {
            base_url: Url::parse(base).unwrap(),
            api_key: SecretString::from("anon".to_string()),
            timeout: Duration::from_millis(500),
        }
    }

    /// Answers a single request with `status` and `body`; the handle yields
    /// the raw request head.
    async fn serve_once(status: &'static str, body: &'static str) -> (Url, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 4096];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
            }
            let response = format!(
                "HTTP/1.1 {status}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                body.len()
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();
            String::from_utf8_lossy(&request).into_owned()
        });
        (Url::parse(&format!("http://{addr}")).unwrap(), handle)
    }

    fn source_for(base: Url) -> RestCompletionSource {
        RestCompletionSource::new(&RestConfig {
            base_url: base,
            api_key: SecretString::from("k".to_string()),
            timeout: Duration::from_secs(5),
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_fetch_sends_filters_and_credentials() {
        let body = r#"[{
            "id": "log-1",
            "logged_at": "2024-06-04",
            "route": [{ "id": "r-1", "wall_type": "overhang", "grade_value": "12", "grade_detail": "a", "name": "Roof", "hold_count": 12 }],
            "profile": [{ "id": "p-1", "name": "Kim" }]
        }]"#;
        let (base, server) = serve_once("200 OK", body).await;

        let records = source_for(base)
            .fetch_completed(DateWindow::this_week(date("2024-06-05")))
            .await
            .unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, "log-1");
        assert_eq!(records[0].route.as_ref().unwrap().name, "Roof");
        assert_eq!(records[0].member.as_ref().unwrap().name, "Kim");

        let request = server.await.unwrap();
        let request_line = request.lines().next().unwrap();
        assert!(request_line.starts_with("GET /rest/v1/exercise_logs?select="));
        assert!(request_line.contains("is_completed=eq.true"));
        assert!(request_line.contains("logged_at=gte.2024-06-03&logged_at=lte.2024-06-05"));

        let head = request.to_ascii_lowercase();
        assert!(head.contains("\r\napikey: k\r\n"));
        assert!(head.contains("\r\nauthorization: bearer k\r\n"));
    }

    #[tokio::test]
    async fn test_off_shape_row_does_not_hide_valid_rows() {
        let body = r#"[
            { "id": "log-1", "logged_at": "2024-06-05",
              "route": { "id": "r-1", "wall_type": "overhang", "grade_value": "12", "grade_detail": "a", "name": "Roof", "hold_count": 12 },
              "profile": { "id": "p-1", "name": "Kim" } },
            { "id": "log-2", "logged_at": "2024-06-05",
              "route": { "id": "r-2", "wall_type": "vertical", "grade_value": "11", "grade_detail": "d", "name": "Arete", "hold_count": null },
              "profile": { "id": "p-2", "name": "Lee" } },
            { "id": "log-3", "logged_at": "not a date",
              "route": { "id": "r-3", "grade_value": "13", "grade_detail": "d", "name": "Broken" } }
        ]"#;
        let (base, server) = serve_once("200 OK", body).await;

        let records = source_for(base)
            .fetch_completed(DateWindow::today(date("2024-06-05")))
            .await
            .unwrap();
        server.await.unwrap();

        assert_eq!(records.len(), 2);
        let top = rank_completers(&records, 3);
        let lines: Vec<(&str, &str)> = top
            .iter()
            .map(|c| (c.member_name.as_str(), c.grade.as_str()))
            .collect();
        assert_eq!(lines, vec![("Kim", "12-a"), ("Lee", "11-d")]);
    }

    #[tokio::test]
    async fn test_error_status_maps_to_http_error() {
        let (base, server) = serve_once("500 Internal Server Error", r#"{"msg":"x"}"#).await;

        let result = source_for(base)
            .fetch_completed(DateWindow::today(date("2024-06-05")))
            .await;
        server.await.unwrap();

        match result {
            Err(CompletionSourceError::Http { status, body }) => {
                assert_eq!(status, 500);
                assert_eq!(body, r#"{"msg":"x"}"#);
            }
            other => panic!("expected http error, got {other:?}"),
        }
    }

    #[test]
    fn test_endpoint_joins_base_url() {
        let plain = RestCompletionSource::new(&rest_config("https://abc.supabase.co")).unwrap();
        assert_eq!(
            plain.endpoint().as_str(),
            "https://abc.supabase.co/rest/v1/exercise_logs"
        );

        let prefixed = RestCompletionSource::new(&rest_config("http://localhost:8000/proxy")).unwrap();
        assert_eq!(
            prefixed.endpoint().as_str(),
            "http://localhost:8000/proxy/rest/v1/exercise_logs"
        );
    }

    #[test]
    fn test_single_day_uses_equality_filter() {
        let query = completion_query(&DateWindow::today(date("2024-06-05")));
        assert!(query.contains(&("is_completed", "eq.true".to_string())));
        assert!(query.contains(&("logged_at", "eq.2024-06-05".to_string())));
        assert_eq!(query.iter().filter(|(k, _)| *k == "logged_at").count(), 1);
    }

    #[test]
    fn test_range_uses_inclusive_bounds() {
        let query = completion_query(&DateWindow::this_week(date("2024-06-05")));
        assert!(query.contains(&("logged_at", "gte.2024-06-03".to_string())));
        assert!(query.contains(&("logged_at", "lte.2024-06-05".to_string())));
        assert!(query[0].1.contains("route:routes("));
    }

    #[tokio::test]
    async fn test_unreachable_backend_is_an_error() {
        // nothing listens on port 9 of the loopback interface
        let source = RestCompletionSource::new(&rest_config("http://127.0.0.1:9")).unwrap();
        let result = source
            .fetch_completed(DateWindow::today(date("2024-06-05")))
            .await;
        assert!(matches!(
            result,
            Err(CompletionSourceError::Transport(_) | CompletionSourceError::Timeout)
        ));
    }
}
