use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use net::{ImageSender, OutcomeReport, StreamBus, StreamEvent};
use pantilt::{
    CommandQueue, Direction, FrameGeometry, LoggingDriver, Mechanism, PanTiltDelta,
    PanTiltSetting, Point, ProportionalStrategy, SharedMechanism, TrackingController,
    TrackingInput,
};
use runtime::server::{apply, router, AppState, ClientMessage};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

async fn controller() -> TrackingController {
    let mechanism = SharedMechanism::new(Mechanism::new(Arc::new(LoggingDriver)));
    mechanism.initialize().await.unwrap();
    TrackingController::new(
        Box::new(ProportionalStrategy::new("colour", 1.0, 5.0)),
        mechanism,
        FrameGeometry::new(640, 480),
    )
}

fn state(controller: &TrackingController) -> (AppState, CommandQueue) {
    let bus = Arc::new(StreamBus::default());
    let (commands, queue) = CommandQueue::channel();
    let state = AppState {
        images: Arc::new(ImageSender::new(bus.clone())),
        bus,
        commands,
        frames: None,
        outcomes: controller.outcome_handle(),
    };
    (state, queue)
}

async fn get(state: AppState, uri: &str) -> (StatusCode, Vec<u8>) {
    let res = router(state)
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = res.status();
    let body = to_bytes(res.into_body(), usize::MAX).await.unwrap();
    (status, body.to_vec())
}

#[tokio::test]
async fn root_serves_console() {
    let controller = controller().await;
    let (state, _queue) = state(&controller);
    let (status, body) = get(state, "/").await;
    assert_eq!(status, StatusCode::OK);
    assert!(String::from_utf8(body).unwrap().contains("movePanTilt"));
}

#[tokio::test]
async fn outcome_is_null_before_first_cycle() {
    let controller = controller().await;
    let (state, _queue) = state(&controller);
    let (status, body) = get(state, "/outcome").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, b"null");
}

#[tokio::test]
async fn outcome_reports_last_cycle() {
    let mut controller = controller().await;
    let (state, _queue) = state(&controller);
    controller
        .process(TrackingInput::detection(Some(Point::new(640, 240))))
        .await
        .unwrap();

    let (_, body) = get(state, "/outcome").await;
    let report: Option<OutcomeReport> = serde_json::from_slice(&body).unwrap();
    let report = report.unwrap();
    assert_eq!(report.prior, PanTiltSetting::CENTRE);
    assert_eq!(report.now, PanTiltSetting::new(55.0, 50.0));
    assert_eq!(report.target, Some(Point::new(640, 240)));
    assert!(report.moved);
}

#[tokio::test]
async fn move_message_queues_a_command() {
    let controller = controller().await;
    let (state, mut queue) = state(&controller);
    apply(
        ClientMessage::MovePanTilt {
            direction: Direction::Pan,
            units: -5.0,
        },
        &state,
    );
    assert_eq!(queue.latest(), Some(PanTiltDelta::new(-5.0, 0.0)));
}

#[tokio::test]
async fn settings_change_image_period() {
    let controller = controller().await;
    let (state, _queue) = state(&controller);
    apply(
        ClientMessage::Settings {
            transmit_image_period_ms: 250,
        },
        &state,
    );
    assert_eq!(state.images.period(), Duration::from_millis(250));
}

#[tokio::test]
async fn hello_is_acknowledged_with_a_toast() {
    let controller = controller().await;
    let (state, _queue) = state(&controller);
    let mut events = state.bus.subscribe();
    apply(
        ClientMessage::Hello {
            message: "console".into(),
        },
        &state,
    );
    assert_eq!(
        events.try_recv().unwrap(),
        StreamEvent::Toast {
            text: "Hello console".into()
        }
    );
}
