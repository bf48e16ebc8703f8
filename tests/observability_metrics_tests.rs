use npx_acquire::observability::AcquisitionMetrics;
use std::sync::Arc;

#[test]
fn test_metrics_creation() {
    let metrics = AcquisitionMetrics::new();
    assert_eq!(metrics.frames_emitted(), 0);
    assert_eq!(metrics.packets_read(), 0);
    assert_eq!(metrics.buffer_capacity(), 0.0);
}

#[test]
fn test_metrics_increment() {
    let metrics = Arc::new(AcquisitionMetrics::new());

    metrics.record_packets_read(3);
    metrics.record_frame_emitted();
    metrics.record_overrun();
    metrics.record_capacity(0.42);

    let snapshot = metrics.snapshot();
    assert_eq!(snapshot.packets_read, 3);
    assert_eq!(snapshot.frames_emitted, 1);
    assert_eq!(snapshot.overruns, 1);
    assert_eq!(snapshot.capacity_polls, 1);
    assert_eq!(snapshot.buffer_capacity, 0.42);
}

#[tokio::test]
async fn test_metrics_cycle_latency_tracking() {
    let metrics = AcquisitionMetrics::new();

    let start = metrics.start_cycle();
    tokio::time::sleep(tokio::time::Duration::from_millis(10)).await;
    metrics.finish_cycle(start);

    assert!(metrics.avg_cycle_us() >= 10_000); // At least 10ms in microseconds
}
