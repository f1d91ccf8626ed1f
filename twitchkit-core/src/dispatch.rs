//! Request construction and retrying dispatch.
//!
//! The dispatcher turns a method, path, query and body into a [`RequestSpec`],
//! sends it through an [`HttpTransport`], and retries transient failures
//! (transport errors and HTTP 500) with exponential backoff plus jitter.
//! Every other non-2xx status is classified immediately.

use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};
use url::Url;

use crate::classify::classify;
use crate::error::{Error, ErrorEnvelope, Result};
use crate::transport::{
    HttpMethod, HttpRequest, HttpResponse, HttpTransport, RequestBody, TransportError,
};

/// Default number of retries after the initial attempt.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Default exponential backoff base.
pub const DEFAULT_BACKOFF_BASE: f64 = 2.0;

/// One query parameter value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryValue {
    /// Not sent.
    Absent,
    /// Sent once.
    Scalar(String),
    /// Sent once per element, in order.
    List(Vec<String>),
}

impl QueryValue {
    fn is_present(&self) -> bool {
        match self {
            Self::Absent => false,
            Self::Scalar(_) => true,
            Self::List(values) => !values.is_empty(),
        }
    }
}

/// Ordered query parameters for a single call.
///
/// ```
/// use twitchkit_core::QueryParams;
///
/// let query = QueryParams::new()
///     .scalar("first", 20)
///     .list("user_id", ["1", "2"]);
/// assert_eq!(query.pairs().len(), 3);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    entries: Vec<(String, QueryValue)>,
}

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn scalar(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        self.push(name, QueryValue::Scalar(value.to_string()));
        self
    }

    /// Adds a scalar when `value` is `Some`, otherwise records it as absent.
    pub fn optional<V: ToString>(mut self, name: impl Into<String>, value: Option<V>) -> Self {
        let value = match value {
            Some(v) => QueryValue::Scalar(v.to_string()),
            None => QueryValue::Absent,
        };
        self.push(name, value);
        self
    }

    pub fn list<I, V>(mut self, name: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: ToString,
    {
        let values = values.into_iter().map(|v| v.to_string()).collect();
        self.push(name, QueryValue::List(values));
        self
    }

    pub fn push(&mut self, name: impl Into<String>, value: QueryValue) {
        self.entries.push((name.into(), value));
    }

    pub fn get(&self, name: &str) -> Option<&QueryValue> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }

    /// Names of every parameter, including absent ones.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(n, _)| n.as_str())
    }

    /// True if `name` carries a value that would be sent.
    pub fn is_present(&self, name: &str) -> bool {
        self.entries
            .iter()
            .any(|(n, v)| n == name && v.is_present())
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Wire pairs: scalars in caller order, then one pair per list element.
    pub fn pairs(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::new();
        for (name, value) in &self.entries {
            if let QueryValue::Scalar(v) = value {
                pairs.push((name.clone(), v.clone()));
            }
        }
        for (name, value) in &self.entries {
            if let QueryValue::List(values) = value {
                pairs.extend(values.iter().map(|v| (name.clone(), v.clone())));
            }
        }
        pairs
    }
}

/// Retry schedule for transient failures.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Retries after the initial attempt.
    pub max_retries: u32,
    /// Exponential base, always greater than one.
    pub base_delay: f64,
    /// Length of one backoff unit.
    pub delay_unit: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            base_delay: DEFAULT_BACKOFF_BASE,
            delay_unit: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_retries: u32, base_delay: f64, delay_unit: Duration) -> Result<Self> {
        if !base_delay.is_finite() || base_delay <= 1.0 {
            return Err(Error::config(format!(
                "backoff base must be greater than 1, got {base_delay}"
            )));
        }
        Ok(Self {
            max_retries,
            base_delay,
            delay_unit,
        })
    }

    /// Delay before retry `retry` (1-based) with the given jitter in `[0, 1)`.
    ///
    /// Saturates at [`Duration::MAX`] once the backoff no longer fits.
    pub fn delay_with_jitter(&self, retry: u32, jitter: f64) -> Duration {
        let exponent = i32::try_from(retry).unwrap_or(i32::MAX);
        let units = self.base_delay.powi(exponent) + jitter;
        Duration::try_from_secs_f64(self.delay_unit.as_secs_f64() * units).unwrap_or(Duration::MAX)
    }

    /// Delay before retry `retry` (1-based) with fresh uniform jitter.
    pub fn delay_for(&self, retry: u32) -> Duration {
        let jitter: f64 = rand::thread_rng().r#gen::<f64>();
        self.delay_with_jitter(retry, jitter)
    }

    /// Total attempts, including the first.
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }
}

/// A request ready to dispatch. Built once per call.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestSpec {
    pub method: HttpMethod,
    pub url: Url,
    pub body: Option<RequestBody>,
}

/// Successful result of a call.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Json(serde_json::Value),
    /// 204, or a 2xx with an empty body.
    NoContent,
}

impl Payload {
    pub fn json(&self) -> Option<&serde_json::Value> {
        match self {
            Self::Json(value) => Some(value),
            Self::NoContent => None,
        }
    }

    pub fn into_json(self) -> Option<serde_json::Value> {
        match self {
            Self::Json(value) => Some(value),
            Self::NoContent => None,
        }
    }

    /// The `data` member Helix wraps most results in.
    pub fn data(&self) -> Option<&serde_json::Value> {
        self.json().and_then(|v| v.get("data"))
    }

    pub fn is_no_content(&self) -> bool {
        matches!(self, Self::NoContent)
    }

    /// Deserialize the JSON body into `T`.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T> {
        match self {
            Self::Json(value) => serde_json::from_value(value.clone()).map_err(|e| Error::Decode {
                message: e.to_string(),
            }),
            Self::NoContent => Err(Error::Decode {
                message: "response had no content".to_string(),
            }),
        }
    }
}

/// Failure worth another attempt.
#[derive(Debug)]
enum Transient {
    Transport(TransportError),
    ServerError(ErrorEnvelope),
}

impl Transient {
    fn into_error(self, attempts: u32) -> Error {
        match self {
            Self::Transport(err) => Error::Network {
                attempts,
                message: err.to_string(),
            },
            Self::ServerError(envelope) => Error::Api(envelope),
        }
    }
}

/// What a single attempt produced.
#[derive(Debug)]
enum AttemptOutcome {
    Done(Payload),
    Terminal(Error),
    Transient(Transient),
}

fn decode_success(response: &HttpResponse) -> Result<Payload> {
    if response.status == 204 || response.body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Payload::NoContent);
    }
    serde_json::from_slice(&response.body)
        .map(Payload::Json)
        .map_err(|e| Error::Decode {
            message: format!("status {}: {}", response.status, e),
        })
}

fn outcome_of(result: std::result::Result<HttpResponse, TransportError>, attempt: u32) -> AttemptOutcome {
    match result {
        Ok(response) if response.is_success() => match decode_success(&response) {
            Ok(payload) => AttemptOutcome::Done(payload),
            Err(err) => AttemptOutcome::Terminal(err),
        },
        Ok(response) if response.status == 500 => {
            AttemptOutcome::Transient(Transient::ServerError(classify(500, &response.body)))
        }
        Ok(response) => {
            AttemptOutcome::Terminal(Error::Api(classify(response.status, &response.body)))
        }
        Err(err) if err.is_transient() => AttemptOutcome::Transient(Transient::Transport(err)),
        Err(err) => AttemptOutcome::Terminal(Error::Network {
            attempts: attempt,
            message: err.to_string(),
        }),
    }
}

/// Builds requests against a base URL and sends them with retry.
#[derive(Clone)]
pub struct RequestDispatcher {
    transport: Arc<dyn HttpTransport>,
    base_url: String,
    retry: RetryPolicy,
}

impl std::fmt::Debug for RequestDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestDispatcher")
            .field("base_url", &self.base_url)
            .field("retry", &self.retry)
            .finish_non_exhaustive()
    }
}

impl RequestDispatcher {
    pub fn new(
        transport: Arc<dyn HttpTransport>,
        base_url: impl Into<String>,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            transport,
            base_url: base_url.into(),
            retry,
        }
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    /// Base URL followed by `path`, then the query pairs.
    pub fn build_url(&self, path: &str, query: &QueryParams) -> Result<Url> {
        let base = self.base_url.trim_end_matches('/');
        let joined = if path.starts_with('/') {
            format!("{base}{path}")
        } else {
            format!("{base}/{path}")
        };

        let mut url = Url::parse(&joined)
            .map_err(|e| Error::invalid_request(format!("invalid URL {joined}: {e}")))?;

        let pairs = query.pairs();
        if !pairs.is_empty() {
            url.query_pairs_mut().extend_pairs(pairs);
        }
        Ok(url)
    }

    pub fn build_request(
        &self,
        method: HttpMethod,
        path: &str,
        query: &QueryParams,
        body: Option<RequestBody>,
    ) -> Result<RequestSpec> {
        Ok(RequestSpec {
            method,
            url: self.build_url(path, query)?,
            body,
        })
    }

    /// Send `spec`, retrying transient failures.
    pub async fn dispatch(&self, spec: &RequestSpec, headers: &[(String, String)]) -> Result<Payload> {
        let mut attempt: u32 = 0;

        loop {
            attempt += 1;

            let request = HttpRequest {
                method: spec.method,
                url: spec.url.clone(),
                headers: headers.to_vec(),
                body: spec.body.clone(),
            };

            debug!(
                method = %spec.method,
                path = spec.url.path(),
                attempt,
                "sending request"
            );

            match outcome_of(self.transport.execute(request).await, attempt) {
                AttemptOutcome::Done(payload) => return Ok(payload),
                AttemptOutcome::Terminal(err) => return Err(err),
                AttemptOutcome::Transient(failure) => {
                    if attempt > self.retry.max_retries {
                        warn!(
                            method = %spec.method,
                            path = spec.url.path(),
                            attempts = attempt,
                            "giving up after transient failures"
                        );
                        return Err(failure.into_error(attempt));
                    }

                    let delay = self.retry.delay_for(attempt);
                    warn!(
                        method = %spec.method,
                        path = spec.url.path(),
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        failure = ?failure,
                        "transient failure, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicU32, Ordering};

    use async_trait::async_trait;
    use parking_lot::Mutex;

    use super::*;
    use crate::error::ErrorKind;

    struct Scripted {
        script: Mutex<VecDeque<std::result::Result<HttpResponse, TransportError>>>,
        calls: AtomicU32,
    }

    impl Scripted {
        fn new(script: Vec<std::result::Result<HttpResponse, TransportError>>) -> Arc<Self> {
            Arc::new(Self {
                script: Mutex::new(script.into()),
                calls: AtomicU32::new(0),
            })
        }

        fn calls(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl HttpTransport for Scripted {
        async fn execute(
            &self,
            _request: HttpRequest,
        ) -> std::result::Result<HttpResponse, TransportError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.script
                .lock()
                .pop_front()
                .unwrap_or_else(|| Err(TransportError::Connect("script exhausted".into())))
        }
    }

    fn dispatcher(transport: Arc<Scripted>, max_retries: u32) -> RequestDispatcher {
        let retry = RetryPolicy::new(max_retries, 2.0, Duration::from_millis(1)).unwrap();
        RequestDispatcher::new(transport, "https://api.twitch.tv/helix", retry)
    }

    fn spec(d: &RequestDispatcher) -> RequestSpec {
        d.build_request(HttpMethod::Get, "/users", &QueryParams::new(), None)
            .unwrap()
    }

    #[test]
    fn pairs_put_scalars_before_lists() {
        let query = QueryParams::new()
            .list("id", ["1", "2", "3"])
            .scalar("first", 20)
            .optional::<String>("after", None)
            .scalar("type", "all");

        assert_eq!(
            query.pairs(),
            vec![
                ("first".to_string(), "20".to_string()),
                ("type".to_string(), "all".to_string()),
                ("id".to_string(), "1".to_string()),
                ("id".to_string(), "2".to_string()),
                ("id".to_string(), "3".to_string()),
            ]
        );
    }

    #[test]
    fn presence_ignores_absent_and_empty_lists() {
        let query = QueryParams::new()
            .optional::<&str>("after", None)
            .list::<_, &str>("id", [])
            .scalar("first", 1);

        assert!(!query.is_present("after"));
        assert!(!query.is_present("id"));
        assert!(query.is_present("first"));
        assert_eq!(query.names().count(), 3);
    }

    #[test]
    fn url_has_no_question_mark_without_pairs() {
        let d = dispatcher(Scripted::new(vec![]), 0);
        let url = d.build_url("/users", &QueryParams::new()).unwrap();
        assert_eq!(url.as_str(), "https://api.twitch.tv/helix/users");

        let url = d
            .build_url("users", &QueryParams::new().optional::<&str>("login", None))
            .unwrap();
        assert_eq!(url.as_str(), "https://api.twitch.tv/helix/users");
    }

    #[test]
    fn url_encodes_pairs_in_order() {
        let d = dispatcher(Scripted::new(vec![]), 0);
        let query = QueryParams::new()
            .scalar("login", "some user")
            .list("id", ["7", "8"]);
        let url = d.build_url("/users", &query).unwrap();
        assert_eq!(url.query(), Some("login=some+user&id=7&id=8"));
    }

    #[test]
    fn delay_stays_within_jitter_band() {
        let policy = RetryPolicy::new(3, 2.0, Duration::from_secs(1)).unwrap();
        for retry in 1..=3 {
            let floor = 2f64.powi(retry as i32);
            for _ in 0..50 {
                let secs = policy.delay_for(retry).as_secs_f64();
                assert!(secs >= floor && secs < floor + 1.0, "retry {retry}: {secs}");
            }
        }
        assert_eq!(policy.delay_with_jitter(2, 0.5), Duration::from_millis(4500));
    }

    #[test]
    fn delay_saturates_for_large_retry_counts() {
        let policy = RetryPolicy::new(100, 2.0, Duration::from_secs(1)).unwrap();
        assert_eq!(policy.delay_for(70), Duration::MAX);
        assert_eq!(policy.delay_with_jitter(u32::MAX, 0.0), Duration::MAX);
        assert!(policy.delay_for(63) < Duration::MAX);
    }

    #[test]
    fn backoff_base_must_exceed_one() {
        assert!(RetryPolicy::new(3, 1.0, Duration::from_secs(1)).is_err());
        assert!(RetryPolicy::new(3, f64::NAN, Duration::from_secs(1)).is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn permanent_transport_failure_attempts_k_plus_one_times() {
        let transport = Scripted::new(vec![]);
        let d = dispatcher(transport.clone(), 3);

        let err = d.dispatch(&spec(&d), &[]).await.unwrap_err();

        assert!(matches!(err, Error::Network { attempts: 4, .. }));
        assert_eq!(transport.calls(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn recovers_after_timeouts() {
        let transport = Scripted::new(vec![
            Err(TransportError::Timeout("t".into())),
            Err(TransportError::Timeout("t".into())),
            Err(TransportError::Timeout("t".into())),
            Ok(HttpResponse::new(200, r#"{"data":[{"id":"1"}]}"#)),
        ]);
        let d = dispatcher(transport.clone(), 3);

        let payload = d.dispatch(&spec(&d), &[]).await.unwrap();

        assert_eq!(payload.data().unwrap()[0]["id"], "1");
        assert_eq!(transport.calls(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn persistent_500_is_remote_service() {
        let transport = Scripted::new(
            (0..3)
                .map(|_| Ok(HttpResponse::new(500, r#"{"message":"boom"}"#)))
                .collect(),
        );
        let d = dispatcher(transport.clone(), 2);

        let err = d.dispatch(&spec(&d), &[]).await.unwrap_err();

        assert_eq!(err.kind(), Some(ErrorKind::RemoteService));
        assert_eq!(err.status(), Some(500));
        assert_eq!(transport.calls(), 3);
    }

    #[tokio::test]
    async fn client_errors_are_not_retried() {
        for status in [400u16, 401, 403, 404, 429, 503] {
            let transport = Scripted::new(vec![Ok(HttpResponse::new(status, ""))]);
            let d = dispatcher(transport.clone(), 3);

            let err = d.dispatch(&spec(&d), &[]).await.unwrap_err();

            assert_eq!(err.status(), Some(status));
            assert_eq!(transport.calls(), 1, "status {status}");
        }
    }

    #[tokio::test]
    async fn empty_success_is_no_content() {
        let transport = Scripted::new(vec![
            Ok(HttpResponse::new(204, "")),
            Ok(HttpResponse::new(200, "")),
        ]);
        let d = dispatcher(transport, 0);

        assert!(d.dispatch(&spec(&d), &[]).await.unwrap().is_no_content());
        assert!(d.dispatch(&spec(&d), &[]).await.unwrap().is_no_content());
    }

    #[tokio::test]
    async fn malformed_success_body_is_decode_error() {
        let transport = Scripted::new(vec![Ok(HttpResponse::new(200, "<html>"))]);
        let d = dispatcher(transport, 0);

        let err = d.dispatch(&spec(&d), &[]).await.unwrap_err();
        assert!(matches!(err, Error::Decode { .. }));
    }

    #[test]
    fn payload_decode() {
        #[derive(serde::Deserialize)]
        struct Users {
            data: Vec<serde_json::Value>,
        }

        let payload = Payload::Json(serde_json::json!({"data": [{"id": "1"}, {"id": "2"}]}));
        let users: Users = payload.decode().unwrap();
        assert_eq!(users.data.len(), 2);
        assert!(Payload::NoContent.decode::<Users>().is_err());
    }
}
