use net::{StreamBus, StreamEvent};
use pantilt::{
    FrameGeometry, LoggingDriver, ManualStrategy, Mechanism, PanTiltDelta, SharedMechanism,
    TelemetrySink, TrackingController, TrackingInput,
};
use std::sync::Arc;

#[tokio::test]
async fn broadcast_roundtrip() {
    let bus = StreamBus::new(4);
    let mut sub = bus.subscribe();
    bus.toast("hi");
    assert_eq!(sub.recv().await.unwrap(), StreamEvent::Toast { text: "hi".into() });
}

#[test]
fn sending_without_subscribers_is_fine() {
    let bus = StreamBus::default();
    bus.clear_screen();
}

#[test]
fn events_are_tagged_for_the_browser() {
    let json = serde_json::to_value(StreamEvent::ScreenLine { text: "Target (1, 2)".into() }).unwrap();
    assert_eq!(json["type"], "screenLine");
    assert_eq!(json["data"]["text"], "Target (1, 2)");
    let clear = serde_json::to_string(&StreamEvent::ScreenClear).unwrap();
    assert_eq!(clear, r#"{"type":"screenClear"}"#);
}

#[tokio::test]
async fn controller_output_reaches_subscribers() {
    let bus = Arc::new(StreamBus::new(16));
    let mut sub = bus.subscribe();
    let mech = SharedMechanism::new(Mechanism::new(Arc::new(LoggingDriver)));
    let mut controller =
        TrackingController::new(Box::new(ManualStrategy), mech, FrameGeometry::unknown())
            .with_sink(bus.clone() as Arc<dyn TelemetrySink>);
    controller
        .process(TrackingInput::command(PanTiltDelta::new(5.0, 0.0)))
        .await
        .unwrap();

    let mut lines = Vec::new();
    let report = loop {
        match sub.recv().await.unwrap() {
            StreamEvent::ScreenLine { text } => lines.push(text),
            StreamEvent::Outcome(report) => break report,
            other => panic!("unexpected event: {other:?}"),
        }
    };
    assert_eq!(lines.len(), 2);
    assert!(report.moved);
    assert_eq!(report.now.pan(), 55.0);
    assert_eq!(report.command, Some(PanTiltDelta::new(5.0, 0.0)));
}
