//! Tests for debug logging functionality
//!
//! Runs the paths that emit `log::debug!`/`log::warn!` with a debug-level
//! logger installed, so a formatting problem in a log call surfaces here.

mod common;

use common::{ScriptedGateway, rate_limited};
use groq_engineer::{AutomodeController, Session, SessionOptions, parse_instructions};
use std::sync::Arc;

fn init_logging() {
    let _ = env_logger::builder()
        .is_test(true)
        .filter_level(log::LevelFilter::Debug)
        .try_init();
}

#[tokio::test]
async fn test_turn_logging_with_debug_enabled() {
    init_logging();

    let dir = tempfile::tempdir().unwrap();
    let gateway = Arc::new(ScriptedGateway::new(vec![
        Ok("<read_file path=\"missing.txt\"/>".to_string()),
        rate_limited(),
    ]));
    let mut session = Session::new(gateway, SessionOptions::new().with_work_dir(dir.path()));

    // Failed instruction (warn) then a rolled-back turn (debug)
    let outcome = session.chat("read it", &mut |_| {}).await.unwrap();
    assert!(!outcome.reports[0].is_ok());
    assert!(session.chat("again", &mut |_| {}).await.is_err());

    session.save_chat().unwrap();
    session.reset();
    assert!(session.transcript().is_empty());
}

#[tokio::test]
async fn test_automode_logging_with_debug_enabled() {
    init_logging();

    let dir = tempfile::tempdir().unwrap();
    let gateway = Arc::new(ScriptedGateway::repeating("AUTOMODE_COMPLETE"));
    let mut session = Session::new(gateway, SessionOptions::new().with_work_dir(dir.path()));
    let mut controller = AutomodeController::new();

    let summary = controller.run(&mut session, "goal", 3, &mut |_| {}).await;
    assert_eq!(summary.round_trips, 1);
}

#[test]
fn test_malformed_tag_logging() {
    init_logging();

    let parsed = parse_instructions("<read_file path=\"\"/> then <list_files dir=\"src\"/>");
    assert_eq!(parsed.len(), 1);
}
