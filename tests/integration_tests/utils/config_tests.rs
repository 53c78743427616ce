use restdsl::DaoConfig;

#[test]
fn explicit_file_wins() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("restdsl.toml");
    std::fs::write(&path, "allow_group_by = true\ndefault_limit = 5\n").unwrap();
    let cfg = DaoConfig::load(Some(&path)).unwrap();
    assert!(cfg.allow_group_by);
    assert_eq!(cfg.default_limit, Some(5));
}

#[test]
fn unreadable_config_is_a_general_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.toml");
    std::fs::write(&path, "default_limit = \"many\"").unwrap();
    let err = DaoConfig::load(Some(&path)).unwrap_err();
    assert_eq!(err.kind(), restdsl::ErrorKind::GeneralError);
}
