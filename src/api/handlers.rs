use axum::{body::Bytes, extract::State, Json};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{json, Value};

use super::ApiError;
use crate::config::{settings::serial_port_override, SerialConfig, SerialConfigUpdate};
use crate::serial::{normalize_line_endings, SerialResult};
use crate::state::{AppState, LogEntry, LogKind};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProgramPayload {
    #[serde(default)]
    pub program: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadPositionPayload {
    pub slot: i64,
}

#[derive(Debug, Serialize)]
pub struct CommLogResponse {
    pub entries: Vec<LogEntry>,
}

fn parse_json<T: DeserializeOwned>(body: &[u8]) -> Result<T, ApiError> {
    serde_json::from_slice(body).map_err(|e| ApiError::Validation(format!("invalid payload: {}", e)))
}

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// Last saved program
pub async fn get_program(State(state): State<AppState>) -> Json<ProgramPayload> {
    Json(ProgramPayload {
        program: state.program.get().await,
    })
}

pub async fn save_program(State(state): State<AppState>, body: Bytes) -> Result<Json<Value>, ApiError> {
    let payload: ProgramPayload = parse_json(&body)?;
    let length = payload.program.chars().count();
    state.program.save(payload.program).await;
    state.comm_log.push(LogKind::Info, format!("Program saved ({} chars)", length));
    Ok(Json(json!({ "result": "saved" })))
}

/// Send the posted program, or the saved one when the body is empty.
pub async fn send_program(State(state): State<AppState>, body: Bytes) -> Result<Json<SerialResult>, ApiError> {
    let program = if body.iter().all(u8::is_ascii_whitespace) {
        state.program.get().await
    } else {
        parse_json::<ProgramPayload>(&body)?.program
    };

    if program.is_empty() {
        return Err(ApiError::Validation("no program provided".to_string()));
    }

    dispatch(&state, program, "failed to send program").await.map(Json)
}

pub async fn get_config(State(state): State<AppState>) -> Json<SerialConfig> {
    Json(state.config.get().await)
}

pub async fn update_config(State(state): State<AppState>, body: Bytes) -> Result<Json<Value>, ApiError> {
    let update: SerialConfigUpdate = parse_json(&body)?;

    let merged = state.config.update(&update).await.map_err(|e| {
        log::error!("Failed to update config: {}", e);
        ApiError::Validation(format!("failed to update config: {}", e))
    })?;

    state.comm_log.push(
        LogKind::Info,
        format!("Serial config updated: {} @ {} baud", merged.port_name, merged.baud_rate),
    );
    Ok(Json(json!({ "result": "config updated" })))
}

pub async fn system_os() -> Json<Value> {
    Json(json!({ "os": std::env::consts::OS }))
}

pub async fn serial_ports(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let transport = state.transport.clone();
    let ports = tokio::task::spawn_blocking(move || transport.list_ports())
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?
        .map_err(ApiError::Enumeration)?;

    Ok(Json(json!({ "ports": ports })))
}

/// Ask the controller for a stored position (`rd` on channel 00).
pub async fn read_position(State(state): State<AppState>, body: Bytes) -> Result<Json<SerialResult>, ApiError> {
    let payload: ReadPositionPayload = parse_json(&body)?;
    if payload.slot < 0 {
        return Err(ApiError::Validation("invalid slot".to_string()));
    }

    let command = format!("00 rd {}", payload.slot);
    dispatch(&state, command, "failed to read slot").await.map(Json)
}

pub async fn comm_log(State(state): State<AppState>) -> Json<CommLogResponse> {
    Json(CommLogResponse {
        entries: state.comm_log.history(),
    })
}

pub async fn clear_comm_log(State(state): State<AppState>) -> Json<Value> {
    state.comm_log.clear();
    Json(json!({ "result": "cleared" }))
}

/// Run one send on a blocking thread and record the exchange.
///
/// The outgoing program is logged before the port is touched.
async fn dispatch(state: &AppState, program: String, context: &'static str) -> Result<SerialResult, ApiError> {
    let config = state.config.get().await;
    let port_override = serial_port_override();
    let transport = state.transport.clone();

    state.comm_log.push(LogKind::Tx, normalize_line_endings(&program));
    let outcome = tokio::task::spawn_blocking(move || transport.send(&program, &config, port_override.as_deref()))
        .await
        .map_err(|e| {
            state.comm_log.push(LogKind::Error, format!("{}: {}", context, e));
            ApiError::Internal(e.to_string())
        })?;

    match outcome {
        Ok(result) => {
            log::debug!("{} accepted {} bytes", result.serial_port, result.serial_written);
            match &result.serial_reply {
                Some(reply) => state.comm_log.push(LogKind::Rx, reply.clone()),
                None => state.comm_log.push(LogKind::Warning, "No reply received"),
            }
            Ok(result)
        }
        Err(source) => {
            log::error!("{}: {}", context, source);
            state.comm_log.push(LogKind::Error, format!("{}: {}", context, source));
            Err(ApiError::Transport { context, source })
        }
    }
}
