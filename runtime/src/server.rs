use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::get,
    Json, Router,
};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use net::{ImageSender, OutcomeReport, StreamBus};
use pantilt::{Direction, OutcomeHandle, PanTiltDelta};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, info, warn};

#[derive(Clone)]
pub struct AppState {
    pub bus: Arc<StreamBus>,
    pub commands: mpsc::UnboundedSender<PanTiltDelta>,
    /// Present when tracking from browser frames.
    pub frames: Option<mpsc::Sender<Vec<u8>>>,
    pub outcomes: OutcomeHandle,
    pub images: Arc<ImageSender>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/ws", get(ws_handler))
        .route("/frames", get(frames_handler))
        .route("/outcome", get(last_outcome))
        .with_state(state)
}

async fn index() -> Html<&'static str> {
    Html(include_str!("console.html"))
}

async fn last_outcome(State(state): State<AppState>) -> Json<Option<OutcomeReport>> {
    Json(state.outcomes.latest().as_ref().map(OutcomeReport::from))
}

/// Messages a console sends to the camera.
#[derive(Debug, Deserialize, PartialEq)]
#[serde(tag = "type", content = "data", rename_all = "camelCase")]
pub enum ClientMessage {
    MovePanTilt {
        direction: Direction,
        units: f64,
    },
    Hello {
        message: String,
    },
    Settings {
        #[serde(rename = "transmitImagePeriodMs")]
        transmit_image_period_ms: u64,
    },
}

/// Act on one console message.
pub fn apply(message: ClientMessage, state: &AppState) {
    match message {
        ClientMessage::MovePanTilt { direction, units } => {
            debug!(%direction, units, "manual move requested");
            if state
                .commands
                .send(PanTiltDelta::along(direction, units))
                .is_err()
            {
                warn!("manual command dropped, no loop is listening");
            }
        }
        ClientMessage::Hello { message } => {
            info!(%message, "console said hello");
            state.bus.toast(format!("Hello {message}"));
        }
        ClientMessage::Settings {
            transmit_image_period_ms,
        } => {
            info!(transmit_image_period_ms, "image period changed");
            state
                .images
                .set_period(Duration::from_millis(transmit_image_period_ms));
        }
    }
}

async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_console(socket, state))
}

async fn handle_console(mut socket: WebSocket, state: AppState) {
    let mut events = state.bus.subscribe();
    loop {
        tokio::select! {
            evt = events.recv() => {
                match evt {
                    Ok(event) => {
                        let Ok(payload) = serde_json::to_string(&event) else { continue };
                        if socket.send(Message::Text(payload)).await.is_err() { break; }
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                    Err(broadcast::error::RecvError::Lagged(_)) => continue,
                }
            }
            msg = socket.recv() => {
                match msg {
                    Some(Ok(Message::Text(text))) => match serde_json::from_str::<ClientMessage>(&text) {
                        Ok(message) => apply(message, &state),
                        Err(e) => warn!(error = %e, "unrecognised console message"),
                    },
                    Some(Ok(Message::Close(_))) | None | Some(Err(_)) => break,
                    _ => {}
                }
            }
        }
    }
}

#[derive(Deserialize)]
struct EncodedFrame {
    base64: String,
}

async fn frames_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    match state.frames.clone() {
        Some(tx) => ws
            .on_upgrade(move |socket| handle_frames(socket, tx))
            .into_response(),
        None => (StatusCode::NOT_FOUND, "not tracking from browser frames").into_response(),
    }
}

async fn handle_frames(mut socket: WebSocket, tx: mpsc::Sender<Vec<u8>>) {
    while let Some(Ok(Message::Text(text))) = socket.recv().await {
        let Ok(frame) = serde_json::from_str::<EncodedFrame>(&text) else {
            continue;
        };
        match BASE64.decode(frame.base64) {
            Ok(bytes) => {
                if tx.send(bytes).await.is_err() {
                    break;
                }
            }
            Err(e) => warn!(error = %e, "frame is not base64"),
        }
    }
}
