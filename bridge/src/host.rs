use std::{
    collections::HashMap,
    io::ErrorKind,
    net::SocketAddr,
    path::PathBuf,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Duration,
};

use anyhow::Context;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::Serialize;
use tokio::net::TcpListener;
use tracing::{info, warn};

use ventilator_common::{
    BridgeConfig, BridgeError, BridgeStatus, CapabilityKind, CapabilityValue,
};

use crate::{
    surface::{CapabilityRegistry, ControlSurface},
    transport::{HttpTransport, RetryingClient},
};

#[derive(Clone)]
struct AppState {
    surface: Arc<ControlSurface>,
    observed: Arc<ObservedState>,
    config: Arc<BridgeConfig>,
}

/// Last value each self-updating control reported. Only the refresh switch
/// pushes unsolicited updates today.
#[derive(Default)]
struct ObservedState {
    refresh_on: AtomicBool,
}

impl ObservedState {
    fn refresh_on(&self) -> bool {
        self.refresh_on.load(Ordering::Relaxed)
    }
}

impl CapabilityRegistry for ObservedState {
    fn update_observed_value(&self, kind: CapabilityKind, value: CapabilityValue) {
        if let (CapabilityKind::Refresh, CapabilityValue::Switch(on)) = (kind, value) {
            self.refresh_on.store(on, Ordering::Relaxed);
        }
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

#[derive(Debug, Serialize)]
struct SwitchBody {
    on: bool,
}

#[derive(Debug, Serialize)]
struct PercentBody {
    percent: u8,
}

#[derive(Debug, Serialize)]
struct MinutesBody {
    minutes: u8,
}

pub async fn run() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let mut config = load_config().await.unwrap_or_else(|err| {
        warn!("failed to load bridge config: {err:#}");
        BridgeConfig::default()
    });
    if let Ok(host) = std::env::var("VENTILATOR_HOST") {
        config.device.host = host;
    }
    config.sanitize();

    let transport = HttpTransport::new(Duration::from_millis(config.retry.attempt_timeout_ms))
        .context("failed to build http transport")?;
    let client = RetryingClient::new(Arc::new(transport), &config.retry);

    let observed = Arc::new(ObservedState::default());
    let registry: Arc<dyn CapabilityRegistry> = observed.clone();
    let surface = Arc::new(ControlSurface::new(config.device.clone(), client, registry));

    let config = Arc::new(config);
    let app_state = AppState {
        surface,
        observed,
        config: config.clone(),
    };

    let app = Router::new()
        .route("/api/status", get(handle_get_status))
        .route(
            "/api/active",
            get(handle_get_active).post(handle_set_active),
        )
        .route("/api/speed", get(handle_get_speed).post(handle_set_speed))
        .route(
            "/api/refresh",
            get(handle_get_refresh).post(handle_set_refresh),
        )
        .route("/api/timer", get(handle_get_timer))
        .route(
            "/api/timer/duration",
            get(handle_get_timer_duration).post(handle_set_timer_duration),
        )
        .with_state(app_state);

    let port = std::env::var("BRIDGE_HTTP_PORT")
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .unwrap_or(config.http_port);
    let addr: SocketAddr = format!("0.0.0.0:{port}").parse().unwrap();
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind bridge server at {addr}"))?;

    info!(
        "{} bridge listening on http://{addr}, device at {}",
        config.device.name, config.device.host
    );
    axum::serve(listener, app).await?;
    Ok(())
}

async fn load_config() -> anyhow::Result<BridgeConfig> {
    let path = std::env::var("VENTILATOR_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("./ventilator.json"));

    match tokio::fs::read(&path).await {
        Ok(raw) => Ok(serde_json::from_slice::<BridgeConfig>(&raw)?),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(BridgeConfig::default()),
        Err(err) => Err(err.into()),
    }
}

async fn handle_get_status(State(state): State<AppState>) -> impl IntoResponse {
    let status = BridgeStatus {
        name: state.config.device.name.clone(),
        device_host: state.config.device.host.clone(),
        profile: state.config.device.profile.as_str(),
        refresh_on: state.observed.refresh_on(),
        timer_duration_min: state.surface.get_timer_duration().await,
    };
    Json(status)
}

async fn handle_get_active(State(state): State<AppState>) -> impl IntoResponse {
    match state.surface.get_active().await {
        Ok(on) => Json(SwitchBody { on }).into_response(),
        Err(err) => device_error_response("active read", &err),
    }
}

async fn handle_set_active(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> impl IntoResponse {
    let Some(on) = params.get("value").and_then(|value| parse_switch(value)) else {
        return error_response(StatusCode::BAD_REQUEST, "Invalid value. Use 'on' or 'off'");
    };

    match state.surface.set_active(on).await {
        Ok(()) => Json(SwitchBody { on }).into_response(),
        Err(err) => device_error_response("active write", &err),
    }
}

async fn handle_get_speed(State(state): State<AppState>) -> impl IntoResponse {
    match state.surface.get_rotation_speed().await {
        Ok(percent) => Json(PercentBody { percent }).into_response(),
        Err(err) => device_error_response("speed read", &err),
    }
}

async fn handle_set_speed(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> impl IntoResponse {
    let Some(value) = params.get("value") else {
        return error_response(StatusCode::BAD_REQUEST, "Missing 'value' parameter");
    };
    let Ok(percent) = value.parse::<u8>() else {
        return error_response(StatusCode::BAD_REQUEST, "Invalid speed value (0-100)");
    };
    if percent > 100 {
        return error_response(StatusCode::BAD_REQUEST, "Invalid speed value (0-100)");
    }

    match state.surface.set_rotation_speed(percent).await {
        Ok(()) => Json(PercentBody { percent }).into_response(),
        Err(err) => device_error_response("speed write", &err),
    }
}

async fn handle_get_refresh(State(state): State<AppState>) -> impl IntoResponse {
    Json(SwitchBody {
        on: state.observed.refresh_on(),
    })
}

async fn handle_set_refresh(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> impl IntoResponse {
    let Some(on) = params.get("value").and_then(|value| parse_switch(value)) else {
        return error_response(StatusCode::BAD_REQUEST, "Invalid value. Use 'on' or 'off'");
    };

    match state.surface.set_refresh(on).await {
        Ok(()) => {
            state
                .observed
                .update_observed_value(CapabilityKind::Refresh, CapabilityValue::Switch(on));
            Json(SwitchBody { on }).into_response()
        }
        Err(err) => device_error_response("refresh write", &err),
    }
}

async fn handle_get_timer(State(state): State<AppState>) -> impl IntoResponse {
    // Fail-safe control: always 200, failures read as 0.
    Json(MinutesBody {
        minutes: state.surface.get_timer().await,
    })
}

async fn handle_get_timer_duration(State(state): State<AppState>) -> impl IntoResponse {
    Json(MinutesBody {
        minutes: state.surface.get_timer_duration().await,
    })
}

async fn handle_set_timer_duration(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> impl IntoResponse {
    let Some(minutes) = params.get("value").and_then(|value| value.parse::<u16>().ok()) else {
        return error_response(StatusCode::BAD_REQUEST, "Invalid duration value (1-100)");
    };

    let stored = state.surface.set_timer_duration(minutes).await;
    Json(MinutesBody { minutes: stored }).into_response()
}

fn parse_switch(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "on" | "true" | "1" => Some(true),
        "off" | "false" | "0" => Some(false),
        _ => None,
    }
}

fn device_error_response(operation: &str, err: &BridgeError) -> axum::response::Response {
    warn!("{operation} failed: {err}");
    error_response(StatusCode::BAD_GATEWAY, &err.to_string())
}

fn error_response(status: StatusCode, message: &str) -> axum::response::Response {
    (
        status,
        Json(ErrorBody {
            error: message.to_string(),
        }),
    )
        .into_response()
}
