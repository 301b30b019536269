//! HTTP surface: unary analysis, ordered batches, and NDJSON streaming.
//!
//! Routes:
//! - `GET  /health`
//! - `GET  /info`
//! - `POST /analyze`                 one `{request_id, text, language}` object
//! - `POST /batch`                   JSON array, answered in the same order
//! - `POST /stream`                  NDJSON in, NDJSON out, one line per request, in order
//! - `GET  /languages`
//! - `POST /admin/reload-lexicon`
//! - `GET  /metrics`                 when a Prometheus recorder is installed

use std::any::Any;
use std::convert::Infallible;
use std::time::Duration;

use axum::{
    body::{Body, BodyDataStream},
    extract::State,
    http::{header, Request, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use futures::stream::{self, Stream, StreamExt};
use metrics::counter;
use serde::Serialize;
use tower_http::{catch_panic::CatchPanicLayer, cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info, info_span, warn, Span};

use crate::analyze::{AnalysisRequest, AnalysisResponse};
use crate::engine::{Engine, EngineError};
use crate::lexicon::ReloadError;
use crate::metrics::Metrics;

pub const NDJSON_CONTENT_TYPE: &str = "application/x-ndjson";

/// A single stream line larger than this is rejected.
pub const MAX_LINE_BYTES: usize = 1024 * 1024;

#[derive(Clone)]
pub struct AppState {
    pub engine: Engine,
    pub metrics: Option<Metrics>,
}

impl AppState {
    pub fn new(engine: Engine) -> Self {
        Self {
            engine,
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, metrics: Metrics) -> Self {
        self.metrics = Some(metrics);
        self
    }
}

pub fn router(state: AppState) -> Router {
    let metrics = state.metrics.clone();

    let app = Router::new()
        .route("/health", get(|| async { "OK" }))
        .route("/info", get(info_handler))
        .route("/analyze", post(analyze))
        .route("/batch", post(analyze_batch))
        .route("/stream", post(analyze_stream))
        .route("/languages", get(languages))
        .route("/admin/reload-lexicon", post(admin_reload_lexicon))
        .with_state(state);

    let app = match metrics {
        Some(m) => app.merge(m.router()),
        None => app,
    };

    with_http_layers(app).layer(CorsLayer::very_permissive())
}

/// Access log per request plus panic recovery into a JSON 500.
fn with_http_layers(app: Router) -> Router {
    app.layer(CatchPanicLayer::custom(panic_response)).layer(
        TraceLayer::new_for_http()
            .make_span_with(|req: &Request<Body>| {
                info_span!(
                    target: "sentiment",
                    "http",
                    method = %req.method(),
                    path = %req.uri().path()
                )
            })
            .on_response(|res: &Response, latency: Duration, _span: &Span| {
                let status = res.status().as_u16();
                let latency_ms = latency.as_secs_f64() * 1000.0;
                if res.status().is_server_error() {
                    error!(target: "sentiment", status, latency_ms, "request finished");
                } else if res.status().is_client_error() {
                    warn!(target: "sentiment", status, latency_ms, "request finished");
                } else {
                    info!(target: "sentiment", status, latency_ms, "request finished");
                }
            }),
    )
}

fn panic_response(payload: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    };
    error!(target: "sentiment", panic = %detail, "handler panicked");

    let body = ErrorBody {
        error: "internal server error".to_string(),
    };
    (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
}

/* ----------------------------
Errors
---------------------------- */

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Engine(#[from] EngineError),
    #[error(transparent)]
    Reload(#[from] ReloadError),
    #[error("line {line}: invalid request: {source}")]
    Decode {
        line: usize,
        #[source]
        source: serde_json::Error,
    },
    #[error("line {line}: exceeds {} bytes", MAX_LINE_BYTES)]
    LineTooLong { line: usize },
    #[error("request body failed: {0}")]
    Transport(#[from] axum::Error),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::Engine(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Reload(ReloadError::NoSource) => StatusCode::CONFLICT,
            ApiError::Reload(ReloadError::Lexicon(_)) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Decode { .. } | ApiError::LineTooLong { .. } | ApiError::Transport(_) => {
                StatusCode::BAD_REQUEST
            }
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: self.to_string(),
        };
        (self.status(), Json(body)).into_response()
    }
}

/* ----------------------------
Handlers
---------------------------- */

async fn analyze(
    State(state): State<AppState>,
    Json(req): Json<AnalysisRequest>,
) -> Result<Json<AnalysisResponse>, ApiError> {
    Ok(Json(state.engine.analyze(req).await?))
}

async fn analyze_batch(
    State(state): State<AppState>,
    Json(items): Json<Vec<AnalysisRequest>>,
) -> Result<Json<Vec<AnalysisResponse>>, ApiError> {
    info!(target: "sentiment", items = items.len(), "batch received");
    Ok(Json(state.engine.analyze_batch(items).await?))
}

/// Long-lived batch: requests are read line by line and answered as they finish,
/// strictly in arrival order. A line that fails to decode yields one error line
/// and ends the stream. If the client disconnects, the response stream is dropped
/// and any in-flight analyses with it.
async fn analyze_stream(State(state): State<AppState>, body: Body) -> Response {
    counter!("sentiment_streams_total").increment(1);
    info!(target: "sentiment", "batch stream started");

    let responses = Box::pin(state.engine.analyze_stream(decode_requests(body)));
    let lines = stream::unfold((responses, 0usize), |(mut responses, sent)| async move {
        match responses.next().await {
            Some(item) => Some((Ok::<_, Infallible>(encode_line(item)), (responses, sent + 1))),
            None => {
                info!(target: "sentiment", responses = sent, "batch stream completed");
                None
            }
        }
    });

    (
        [(header::CONTENT_TYPE, NDJSON_CONTENT_TYPE)],
        Body::from_stream(lines),
    )
        .into_response()
}

#[derive(Serialize)]
struct InfoOut {
    service: &'static str,
    version: &'static str,
    engine: &'static str,
    workers: usize,
    default_language: String,
}

async fn info_handler(State(state): State<AppState>) -> Json<InfoOut> {
    Json(InfoOut {
        service: "Sentiment Analysis API",
        version: env!("CARGO_PKG_VERSION"),
        engine: "axum",
        workers: state.engine.workers(),
        default_language: state.engine.lexicon().snapshot().default_language().to_string(),
    })
}

#[derive(Serialize)]
struct LanguagesOut {
    default: String,
    languages: Vec<String>,
}

async fn languages(State(state): State<AppState>) -> Json<LanguagesOut> {
    let store = state.engine.lexicon().snapshot();
    Json(LanguagesOut {
        default: store.default_language().to_string(),
        languages: store.languages().map(|l| l.to_string()).collect(),
    })
}

async fn admin_reload_lexicon(State(state): State<AppState>) -> Result<&'static str, ApiError> {
    state.engine.lexicon().reload()?;
    Ok("reloaded")
}

/* ----------------------------
NDJSON framing
---------------------------- */

struct LineReader {
    chunks: BodyDataStream,
    buf: Vec<u8>,
    line_no: usize,
    done: bool,
}

/// Turn a request body into decoded requests, one per non-blank line.
/// The final line may omit its trailing newline.
pub fn decode_requests(
    body: Body,
) -> impl Stream<Item = Result<AnalysisRequest, ApiError>> + Send + 'static {
    let reader = LineReader {
        chunks: body.into_data_stream(),
        buf: Vec::new(),
        line_no: 0,
        done: false,
    };

    stream::unfold(reader, |mut st| async move {
        loop {
            if st.done {
                return None;
            }

            if let Some(pos) = st.buf.iter().position(|b| *b == b'\n') {
                if pos > MAX_LINE_BYTES {
                    st.done = true;
                    let err = ApiError::LineTooLong {
                        line: st.line_no + 1,
                    };
                    return Some((Err(err), st));
                }
                let line: Vec<u8> = st.buf.drain(..=pos).collect();
                st.line_no += 1;
                match parse_line(&line, st.line_no) {
                    Some(item) => {
                        st.done = item.is_err();
                        return Some((item, st));
                    }
                    None => continue,
                }
            }

            if st.buf.len() > MAX_LINE_BYTES {
                st.done = true;
                let err = ApiError::LineTooLong {
                    line: st.line_no + 1,
                };
                return Some((Err(err), st));
            }

            match st.chunks.next().await {
                Some(Ok(bytes)) => st.buf.extend_from_slice(&bytes),
                Some(Err(e)) => {
                    st.done = true;
                    return Some((Err(ApiError::Transport(e)), st));
                }
                None => {
                    st.done = true;
                    let rest = std::mem::take(&mut st.buf);
                    st.line_no += 1;
                    return parse_line(&rest, st.line_no).map(|item| (item, st));
                }
            }
        }
    })
}

fn parse_line(raw: &[u8], line_no: usize) -> Option<Result<AnalysisRequest, ApiError>> {
    let trimmed = raw.trim_ascii();
    if trimmed.is_empty() {
        return None;
    }
    Some(
        serde_json::from_slice(trimmed).map_err(|source| ApiError::Decode {
            line: line_no,
            source,
        }),
    )
}

fn encode_line(item: Result<AnalysisResponse, ApiError>) -> String {
    let mut line = match item {
        Ok(resp) => serde_json::to_string(&resp).unwrap_or_else(|e| error_line(&e.to_string())),
        Err(e) => {
            warn!(target: "sentiment", error = %e, "stream item failed");
            error_line(&e.to_string())
        }
    };
    line.push('\n');
    line
}

fn error_line(msg: &str) -> String {
    serde_json::json!({ "error": msg }).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    use tower::ServiceExt as _;

    async fn decode_all<S: Into<String> + Send + 'static>(chunks: Vec<S>) -> Vec<Result<AnalysisRequest, ApiError>> {
        let body = Body::from_stream(stream::iter(
            chunks.into_iter().map(|c| Ok::<_, Infallible>(c.into())),
        ));
        decode_requests(body).collect().await
    }

    #[tokio::test]
    async fn lines_split_across_chunks() {
        let items = decode_all(vec![
            "{\"request_id\":\"a\",\"te",
            "xt\":\"good\"}\n\n{\"request_id\":\"b\",",
            "\"text\":\"bad\",\"language\":\"en\"}",
        ])
        .await;
        let ids: Vec<String> = items
            .into_iter()
            .map(|r| r.unwrap().request_id)
            .collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn decode_error_ends_stream() {
        let items = decode_all(vec![
            "{\"request_id\":\"a\",\"text\":\"x\"}\n",
            "not json\n",
            "{\"request_id\":\"c\",\"text\":\"y\"}\n",
        ])
        .await;
        assert_eq!(items.len(), 2);
        assert!(items[0].is_ok());
        assert!(matches!(items[1], Err(ApiError::Decode { line: 2, .. })));
    }

    #[tokio::test]
    async fn empty_body_yields_nothing() {
        assert!(decode_all(Vec::<String>::new()).await.is_empty());
        assert!(decode_all(vec!["\n  \n"]).await.is_empty());
    }

    #[tokio::test]
    async fn oversized_line_in_one_chunk_is_rejected() {
        let big = format!(
            "{{\"request_id\":\"big\",\"text\":\"{}\"}}\n{{\"request_id\":\"next\",\"text\":\"ok\"}}\n",
            "a".repeat(MAX_LINE_BYTES + 10)
        );
        let items = decode_all(vec![big]).await;
        assert_eq!(items.len(), 1);
        assert!(matches!(items[0], Err(ApiError::LineTooLong { line: 1 })));
    }

    #[tokio::test]
    async fn line_at_the_limit_is_accepted() {
        let prefix = "{\"request_id\":\"edge\",\"text\":\"";
        let suffix = "\"}";
        let fill = MAX_LINE_BYTES - prefix.len() - suffix.len();
        let line = format!("{prefix}{}{suffix}\n", "a".repeat(fill));
        let items = decode_all(vec![line]).await;
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].as_ref().unwrap().request_id, "edge");
    }

    #[tokio::test]
    async fn handler_panic_becomes_json_500() {
        async fn boom() -> &'static str {
            panic!("boom")
        }
        let app = with_http_layers(Router::new().route("/boom", get(boom)));
        let resp = app
            .oneshot(Request::get("/boom").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let bytes = axum::body::to_bytes(resp.into_body(), 1024).await.unwrap();
        let v: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(v["error"], "internal server error");
    }

    #[test]
    fn error_lines_are_json() {
        let line = encode_line(Err(ApiError::LineTooLong { line: 3 }));
        assert!(line.ends_with('\n'));
        let v: serde_json::Value = serde_json::from_str(line.trim()).unwrap();
        assert!(v["error"].as_str().unwrap().contains("line 3"));
    }
}
