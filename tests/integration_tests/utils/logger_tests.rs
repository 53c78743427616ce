use restdsl::logger::{AUDIT_TARGET, METRICS_TARGET, configure_logging};

#[test]
fn writes_app_audit_and_metrics_files() {
    let dir = tempfile::tempdir().unwrap();
    configure_logging(Some(dir.path()), Some("info"), Some(2)).unwrap();
    log::info!("app line");
    log::info!(target: AUDIT_TARGET, "DELETE 1?limit=100&");
    log::info!(target: METRICS_TARGET, "{{\"kind\":\"timing\"}}");

    let read = |name: &str| std::fs::read_to_string(dir.path().join(name)).unwrap();
    assert!(read("app.log").contains("app line"));
    assert!(read("audit.log").contains("DELETE 1?limit=100&"));
    assert!(!read("app.log").contains("DELETE 1?limit=100&"));
    assert!(read("metrics.log").contains("\"kind\":\"timing\""));
}
