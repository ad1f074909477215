use crate::api::responses::{
    CommandAcceptedResponse, ErrorCode, ErrorResponse, HealthStatus, HealthSuccessResponse,
    OverlaySuccessResponse, ResultsSuccessResponse, SessionSuccessResponse,
};
use crate::driver::EngineCommand;
use crate::engine::{DEFAULT_MATERIAL, SettingsUpdate};
use crate::report;
use crate::state::AppState;
use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use std::fmt;
use std::sync::{Arc, RwLock};
use std::time::SystemTime;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use tracing::{error, warn};

const INTERNAL_ERROR_MESSAGE: &str = "Internal server error";

type SharedState = Arc<RwLock<AppState>>;

#[derive(Debug)]
enum TimestampError {
    Format(time::error::Format),
}

impl fmt::Display for TimestampError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimestampError::Format(err) => write!(f, "timestamp format error: {err}"),
        }
    }
}

pub enum ApiResponse<T> {
    Success { status: StatusCode, body: T },
    Error { status: StatusCode, body: ErrorResponse },
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        match self {
            ApiResponse::Success { status, body } => (status, Json(body)).into_response(),
            ApiResponse::Error { status, body } => (status, Json(body)).into_response(),
        }
    }
}

pub enum ReportResponse {
    Success(String),
    Error {
        status: StatusCode,
        body: ErrorResponse,
    },
}

impl IntoResponse for ReportResponse {
    fn into_response(self) -> Response {
        match self {
            ReportResponse::Success(text) => (StatusCode::OK, text).into_response(),
            ReportResponse::Error { status, body } => (status, Json(body)).into_response(),
        }
    }
}

pub async fn get_health(State(state): State<SharedState>) -> impl IntoResponse {
    build_health_response(state, SystemTime::now())
}

pub async fn get_session(State(state): State<SharedState>) -> impl IntoResponse {
    build_session_response(state, SystemTime::now())
}

pub async fn get_overlay(State(state): State<SharedState>) -> impl IntoResponse {
    build_overlay_response(state, SystemTime::now())
}

pub async fn get_results(State(state): State<SharedState>) -> impl IntoResponse {
    build_results_response(state, SystemTime::now())
}

pub async fn get_report(State(state): State<SharedState>) -> impl IntoResponse {
    build_report_response(state, SystemTime::now())
}

pub async fn post_start(State(state): State<SharedState>) -> impl IntoResponse {
    build_command_response(state, EngineCommand::Start, SystemTime::now())
}

pub async fn post_weld(State(state): State<SharedState>) -> impl IntoResponse {
    build_command_response(state, EngineCommand::BeginWelding, SystemTime::now())
}

pub async fn post_pause(State(state): State<SharedState>) -> impl IntoResponse {
    build_command_response(state, EngineCommand::PauseWelding, SystemTime::now())
}

pub async fn post_stop(State(state): State<SharedState>) -> impl IntoResponse {
    build_command_response(state, EngineCommand::Stop, SystemTime::now())
}

pub async fn post_calibrate(State(state): State<SharedState>) -> impl IntoResponse {
    build_command_response(state, EngineCommand::Calibrate, SystemTime::now())
}

pub async fn put_settings(
    State(state): State<SharedState>,
    Json(update): Json<SettingsUpdate>,
) -> impl IntoResponse {
    build_command_response(
        state,
        EngineCommand::UpdateSettings(update),
        SystemTime::now(),
    )
}

fn format_timestamp(timestamp: SystemTime) -> Result<String, TimestampError> {
    let datetime = OffsetDateTime::from(timestamp);
    datetime.format(&Rfc3339).map_err(TimestampError::Format)
}

fn error_body(error_code: ErrorCode, message: &str, now: SystemTime) -> ErrorResponse {
    let timestamp = format_timestamp(now).unwrap_or_else(|err| {
        error!(error = %err, "Failed to format error timestamp");
        OffsetDateTime::now_utc()
            .format(&Rfc3339)
            .unwrap_or_else(|_| "1970-01-01T00:00:00Z".to_string())
    });
    ErrorResponse {
        error_code,
        error_message: message.to_string(),
        timestamp,
    }
}

fn internal_error<T>(endpoint: &str, message: &str) -> ApiResponse<T> {
    error!(endpoint, message, "Internal error while handling request");
    ApiResponse::Error {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        body: error_body(
            ErrorCode::InternalError,
            INTERNAL_ERROR_MESSAGE,
            SystemTime::now(),
        ),
    }
}

fn no_data<T>(message: &str, now: SystemTime) -> ApiResponse<T> {
    ApiResponse::Error {
        status: StatusCode::SERVICE_UNAVAILABLE,
        body: error_body(ErrorCode::NoData, message, now),
    }
}

fn engine_unavailable<T>(now: SystemTime) -> ApiResponse<T> {
    ApiResponse::Error {
        status: StatusCode::SERVICE_UNAVAILABLE,
        body: error_body(ErrorCode::EngineUnavailable, "Engine is not running", now),
    }
}

fn success<T>(
    status: StatusCode,
    now: SystemTime,
    endpoint: &str,
    body: impl FnOnce(String) -> T,
) -> ApiResponse<T> {
    match format_timestamp(now) {
        Ok(timestamp) => ApiResponse::Success {
            status,
            body: body(timestamp),
        },
        Err(_) => internal_error(endpoint, "timestamp formatting failure"),
    }
}

fn build_health_response(
    state: SharedState,
    now: SystemTime,
) -> ApiResponse<HealthSuccessResponse> {
    let status = match state.read() {
        Ok(guard) if guard.snapshot().is_some() => HealthStatus::Ok,
        Ok(_) => HealthStatus::Degraded,
        Err(_) => {
            return internal_error("/api/health", "state lock poisoned while reading snapshot");
        }
    };

    success(StatusCode::OK, now, "/api/health", |timestamp| {
        HealthSuccessResponse { status, timestamp }
    })
}

fn build_session_response(
    state: SharedState,
    now: SystemTime,
) -> ApiResponse<SessionSuccessResponse> {
    let snapshot = match state.read() {
        Ok(guard) => guard.snapshot().cloned(),
        Err(_) => {
            return internal_error("/api/session", "state lock poisoned while reading snapshot");
        }
    };

    match snapshot {
        Some(snapshot) => success(StatusCode::OK, now, "/api/session", |timestamp| {
            SessionSuccessResponse {
                snapshot,
                timestamp,
            }
        }),
        None => no_data("Engine has not ticked yet", now),
    }
}

fn build_overlay_response(
    state: SharedState,
    now: SystemTime,
) -> ApiResponse<OverlaySuccessResponse> {
    let overlay = match state.read() {
        Ok(guard) => guard.overlay().cloned(),
        Err(_) => {
            return internal_error("/api/overlay", "state lock poisoned while reading overlay");
        }
    };

    match overlay {
        Some(overlay) => success(StatusCode::OK, now, "/api/overlay", |timestamp| {
            OverlaySuccessResponse { overlay, timestamp }
        }),
        None => no_data("No overlay rendered yet", now),
    }
}

fn build_results_response(
    state: SharedState,
    now: SystemTime,
) -> ApiResponse<ResultsSuccessResponse> {
    let results = match state.read() {
        Ok(guard) => guard.results().cloned(),
        Err(_) => {
            return internal_error("/api/results", "state lock poisoned while reading results");
        }
    };

    match results {
        Some(results) => success(StatusCode::OK, now, "/api/results", |timestamp| {
            ResultsSuccessResponse { results, timestamp }
        }),
        None => no_data("No session results available", now),
    }
}

fn build_report_response(state: SharedState, now: SystemTime) -> ReportResponse {
    let (results, material) = match state.read() {
        Ok(guard) => (
            guard.results().cloned(),
            guard
                .snapshot()
                .map(|s| s.material.clone())
                .unwrap_or_else(|| DEFAULT_MATERIAL.to_string()),
        ),
        Err(_) => {
            error!(
                endpoint = "/api/report",
                "state lock poisoned while reading results"
            );
            return ReportResponse::Error {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                body: error_body(ErrorCode::InternalError, INTERNAL_ERROR_MESSAGE, now),
            };
        }
    };

    match results {
        Some(results) => ReportResponse::Success(report::render(
            &results,
            &material,
            OffsetDateTime::from(now),
        )),
        None => ReportResponse::Error {
            status: StatusCode::SERVICE_UNAVAILABLE,
            body: error_body(ErrorCode::NoData, "No session results available", now),
        },
    }
}

fn command_name(command: &EngineCommand) -> &'static str {
    match command {
        EngineCommand::Start => "start",
        EngineCommand::BeginWelding => "weld",
        EngineCommand::PauseWelding => "pause",
        EngineCommand::Stop => "stop",
        EngineCommand::Calibrate => "calibrate",
        EngineCommand::UpdateSettings(_) => "settings",
    }
}

fn build_command_response(
    state: SharedState,
    command: EngineCommand,
    now: SystemTime,
) -> ApiResponse<CommandAcceptedResponse> {
    let sender = match state.read() {
        Ok(guard) => guard.commands().cloned(),
        Err(_) => {
            return internal_error("command", "state lock poisoned while reading command sender");
        }
    };

    let name = command_name(&command);
    let Some(sender) = sender else {
        return engine_unavailable(now);
    };
    if let Err(err) = sender.send(command) {
        warn!(error = %err, command = name, "Failed to queue engine command");
        return engine_unavailable(now);
    }

    success(StatusCode::ACCEPTED, now, "command", |timestamp| {
        CommandAcceptedResponse {
            command: name,
            timestamp,
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::command_channel;
    use crate::engine::{Engine, EngineConfig};
    use crate::feedback::LogSink;
    use crate::pose::tilt::DeviceTiltSource;
    use crate::profile::ProcessKind;
    use crate::scoring::{SessionMetrics, score_session};
    use std::time::{Duration, UNIX_EPOCH};

    fn snapshot_state() -> SharedState {
        let engine = Engine::new(
            Box::new(DeviceTiltSource::new()),
            Box::new(LogSink),
            EngineConfig::default(),
        );
        let mut app_state = AppState::new();
        let _receiver = app_state.subscribe_snapshot();
        app_state
            .set_snapshot(engine.snapshot(0))
            .expect("set snapshot");
        Arc::new(RwLock::new(app_state))
    }

    fn poisoned_state() -> SharedState {
        let state = Arc::new(RwLock::new(AppState::new()));
        let state_for_thread = Arc::clone(&state);
        let _ = std::thread::spawn(move || {
            let _guard = state_for_thread.write().expect("lock for poison");
            panic!("poison lock");
        })
        .join();
        state
    }

    fn expect_error<T>(response: ApiResponse<T>) -> (StatusCode, ErrorResponse) {
        match response {
            ApiResponse::Error { status, body } => (status, body),
            ApiResponse::Success { status, .. } => {
                panic!("expected error response, got success: {status}")
            }
        }
    }

    #[test]
    fn health_is_degraded_before_first_tick() {
        let state = Arc::new(RwLock::new(AppState::new()));

        match build_health_response(state, UNIX_EPOCH) {
            ApiResponse::Success { status, body } => {
                assert_eq!(status, StatusCode::OK);
                assert_eq!(body.status, HealthStatus::Degraded);
                assert_eq!(body.timestamp, "1970-01-01T00:00:00Z");
            }
            ApiResponse::Error { status, .. } => panic!("unexpected error: {status}"),
        }
    }

    #[test]
    fn health_is_ok_once_snapshot_published() {
        match build_health_response(snapshot_state(), UNIX_EPOCH) {
            ApiResponse::Success { body, .. } => assert_eq!(body.status, HealthStatus::Ok),
            ApiResponse::Error { status, .. } => panic!("unexpected error: {status}"),
        }
    }

    #[test]
    fn health_returns_internal_error_when_lock_poisoned() {
        let (status, body) = expect_error(build_health_response(poisoned_state(), UNIX_EPOCH));

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body.error_code, ErrorCode::InternalError);
        assert_eq!(body.error_message, "Internal server error");
    }

    #[test]
    fn session_returns_snapshot() {
        let response = build_session_response(
            snapshot_state(),
            UNIX_EPOCH + Duration::from_secs(1),
        );

        match response {
            ApiResponse::Success { status, body } => {
                assert_eq!(status, StatusCode::OK);
                assert_eq!(body.snapshot.elapsed, "00:00");
                assert_eq!(body.timestamp, "1970-01-01T00:00:01Z");
            }
            ApiResponse::Error { status, .. } => panic!("unexpected error: {status}"),
        }
    }

    #[test]
    fn session_body_marks_unavailable_metrics_as_null() -> Result<(), Box<dyn std::error::Error>> {
        let response = build_session_response(snapshot_state(), UNIX_EPOCH);
        let ApiResponse::Success { body, .. } = response else {
            return Err("expected success".into());
        };

        let json = serde_json::to_value(&body)?;

        assert_eq!(json["phase"], "idle");
        assert_eq!(json["pose_status"], "searching");
        assert!(json["kinematics"]["stability"].is_null());
        assert!(json["angle_deg"].is_null());
        assert_eq!(json["timestamp"], "1970-01-01T00:00:00Z");
        Ok(())
    }

    #[test]
    fn results_return_no_data_when_missing() {
        let state = Arc::new(RwLock::new(AppState::new()));

        let (status, body) = expect_error(build_results_response(state, UNIX_EPOCH));

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body.error_code, ErrorCode::NoData);
    }

    #[test]
    fn results_return_latest_results() {
        let mut app_state = AppState::new();
        let _receiver = app_state.subscribe_results();
        let results = score_session(
            &SessionMetrics {
                angle_scores: vec![100.0],
                ..SessionMetrics::default()
            },
            ProcessKind::Tig.profile(),
            4000,
        );
        app_state.set_results(results.clone()).expect("set results");
        let state = Arc::new(RwLock::new(app_state));

        match build_results_response(state, UNIX_EPOCH) {
            ApiResponse::Success { body, .. } => assert_eq!(body.results, results),
            ApiResponse::Error { status, .. } => panic!("unexpected error: {status}"),
        }
    }

    #[test]
    fn report_is_plain_text() {
        let mut app_state = AppState::new();
        let _receiver = app_state.subscribe_results();
        let results = score_session(&SessionMetrics::default(), ProcessKind::Mig.profile(), 0);
        app_state.set_results(results).expect("set results");
        let state = Arc::new(RwLock::new(app_state));

        match build_report_response(state, UNIX_EPOCH) {
            ReportResponse::Success(text) => {
                assert!(text.contains("Final score: --"));
                assert!(text.contains("Material: steel"));
            }
            ReportResponse::Error { status, .. } => panic!("unexpected error: {status}"),
        }
    }

    #[test]
    fn report_returns_internal_error_when_lock_poisoned() {
        match build_report_response(poisoned_state(), UNIX_EPOCH) {
            ReportResponse::Error { status, body } => {
                assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
                assert_eq!(body.error_code, ErrorCode::InternalError);
            }
            ReportResponse::Success(_) => panic!("expected internal error"),
        }
    }

    #[test]
    fn command_is_queued_and_accepted() {
        let (sender, receiver) = command_channel();
        let mut app_state = AppState::new();
        app_state.set_commands(sender);
        let state = Arc::new(RwLock::new(app_state));

        match build_command_response(state, EngineCommand::BeginWelding, UNIX_EPOCH) {
            ApiResponse::Success { status, body } => {
                assert_eq!(status, StatusCode::ACCEPTED);
                assert_eq!(body.command, "weld");
            }
            ApiResponse::Error { status, .. } => panic!("unexpected error: {status}"),
        }
        assert_eq!(receiver.try_recv().ok(), Some(EngineCommand::BeginWelding));
    }

    #[test]
    fn command_without_engine_is_unavailable() {
        let state = Arc::new(RwLock::new(AppState::new()));

        let (status, body) =
            expect_error(build_command_response(state, EngineCommand::Stop, UNIX_EPOCH));

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body.error_code, ErrorCode::EngineUnavailable);
    }

    #[test]
    fn command_after_engine_exit_is_unavailable() {
        let (sender, receiver) = command_channel();
        drop(receiver);
        let mut app_state = AppState::new();
        app_state.set_commands(sender);
        let state = Arc::new(RwLock::new(app_state));

        let (status, _body) =
            expect_error(build_command_response(state, EngineCommand::Calibrate, UNIX_EPOCH));

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    }
}
