use vision::FaceDetector;

#[test]
fn garbage_model_is_rejected() {
    assert!(FaceDetector::from_bytes(vec![0u8; 3]).is_err());
}

#[test]
fn missing_model_file_is_rejected() {
    let err = FaceDetector::from_file("/no/such/seeta_fd_frontal_v1.0.bin")
        .err()
        .unwrap();
    assert!(err.to_string().contains("seeta_fd_frontal"));
}
