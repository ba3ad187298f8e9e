use burn_progress::{install_console_logger, install_file_logger};

#[test]
fn file_logger_is_installed_once() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("experiment.log");

    assert!(install_file_logger(&file));
    assert!(!install_file_logger(&file));
    assert!(!install_console_logger());

    log::info!(target: "burn_progress::tests", "installed");
    let content = std::fs::read_to_string(&file).unwrap();
    assert!(content.contains("installed"), "{content}");
}
