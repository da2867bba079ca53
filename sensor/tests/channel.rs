use image::{codecs::jpeg::JpegEncoder, RgbImage};
use pantilt::{CaptureSource, FrameGeometry};
use sensor::ChannelCapture;

fn jpeg(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::new(width, height);
    let mut buf = Vec::new();
    JpegEncoder::new(&mut buf).encode_image(&img).unwrap();
    buf
}

#[tokio::test]
async fn decodes_pushed_frames() {
    let (tx, mut capture) = ChannelCapture::channel(4, FrameGeometry::new(64, 48));
    tx.send(jpeg(64, 48)).await.unwrap();
    let frame = capture.next_frame().await.unwrap().unwrap();
    assert_eq!(frame.geometry, FrameGeometry::new(64, 48));
}

#[tokio::test]
async fn rescales_to_session_geometry() {
    let (tx, mut capture) = ChannelCapture::channel(4, FrameGeometry::new(64, 48));
    tx.send(jpeg(128, 96)).await.unwrap();
    let frame = capture.next_frame().await.unwrap().unwrap();
    assert_eq!(frame.geometry, FrameGeometry::new(64, 48));
}

#[tokio::test]
async fn skips_garbage_and_ends_when_senders_drop() {
    let (tx, mut capture) = ChannelCapture::channel(4, FrameGeometry::new(16, 16));
    tx.send(vec![1, 2, 3]).await.unwrap();
    tx.send(jpeg(16, 16)).await.unwrap();
    drop(tx);
    assert!(capture.next_frame().await.unwrap().is_some());
    assert!(capture.next_frame().await.unwrap().is_none());
}
