#![cfg(unix)]

mod common;

use chesslab_client::{LocalEngineError, SyncError, UciEngine};
use chesslab_domain::{EngineMode, EvalStatus, NodeId, START_FEN};
use common::MockServer;
use std::os::unix::fs::PermissionsExt as _;
use std::path::PathBuf;
use std::sync::OnceLock;
use std::time::Duration;

const ANALYSING_ENGINE: &str = r#"#!/bin/sh
while read -r cmd rest; do
  case "$cmd" in
    uci) echo "id name fake"; echo "uciok" ;;
    isready) echo "readyok" ;;
    go)
      echo "info depth 12 multipv 1 score cp 33 nodes 100 pv e2e4 e7e5"
      echo "info depth 12 multipv 2 score mate 2 nodes 100 pv d2d4"
      echo "bestmove e2e4 ponder e7e5"
      ;;
    quit) exit 0 ;;
  esac
done
"#;

const SILENT_ENGINE: &str = r#"#!/bin/sh
while read -r cmd rest; do
  case "$cmd" in
    uci) echo "uciok" ;;
    isready) echo "readyok" ;;
    quit) exit 0 ;;
  esac
done
"#;

const CRASHING_ENGINE: &str = r#"#!/bin/sh
while read -r cmd rest; do
  case "$cmd" in
    uci) echo "uciok" ;;
    isready) echo "readyok" ;;
    go) echo "info depth 1 multipv 1 score cp 5 pv e2e4"; exit 1 ;;
  esac
done
"#;

struct Engines {
    _dir: tempfile::TempDir,
    analysing: PathBuf,
    silent: PathBuf,
    crashing: PathBuf,
}

// Written once, before any test spawns a process, so no script is still
// open for writing when it gets executed.
fn engines() -> &'static Engines {
    static ENGINES: OnceLock<Engines> = OnceLock::new();
    ENGINES.get_or_init(|| {
        let dir = tempfile::tempdir().unwrap();
        let write = |name: &str, body: &str| {
            let path = dir.path().join(name);
            std::fs::write(&path, body).unwrap();
            std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
            path
        };
        let analysing = write("analysing.sh", ANALYSING_ENGINE);
        let silent = write("silent.sh", SILENT_ENGINE);
        let crashing = write("crashing.sh", CRASHING_ENGINE);
        Engines {
            _dir: dir,
            analysing,
            silent,
            crashing,
        }
    })
}

#[tokio::test]
async fn engine_reports_every_ranked_line() {
    let engine = UciEngine::new(&engines().analysing);

    let entries = engine.analyse(START_FEN, 12, 3).await.unwrap();

    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].multipv, 1);
    assert_eq!(entries[0].score_cp, Some(33));
    assert_eq!(entries[0].pv_uci.as_deref(), Some("e2e4 e7e5"));
    assert_eq!(entries[1].multipv, 2);
    assert_eq!(entries[1].score_mate, Some(2));
    assert_eq!(entries[1].bestmove_uci.as_deref(), Some("d2d4"));
}

#[tokio::test]
async fn silent_engine_times_out() {
    let engine = UciEngine::new(&engines().silent).with_timeout(Duration::from_millis(300));

    let err = engine.analyse(START_FEN, 12, 3).await.unwrap_err();
    assert!(matches!(err, LocalEngineError::Timeout(_)), "{err:?}");
}

#[tokio::test]
async fn engine_exiting_before_bestmove_is_an_error() {
    let engine = UciEngine::new(&engines().crashing);

    let err = engine.analyse(START_FEN, 12, 3).await.unwrap_err();
    assert!(
        matches!(err, LocalEngineError::Closed("bestmove")),
        "{err:?}"
    );
}

#[tokio::test]
async fn client_mode_analyses_locally_and_submits_result() {
    let server = MockServer::start().await;
    let engine = UciEngine::new(&engines().analysing);
    let core = server.core_with_engine(EngineMode::Client, Some(engine));
    core.load_openings().await.unwrap();

    core.request_server_evaluation(NodeId(100)).await.unwrap();

    let state = core.snapshot();
    assert_eq!(state.eval_status(NodeId(100)), EvalStatus::Available);
    let ranks: Vec<u32> = state
        .evaluations
        .get(NodeId(100))
        .iter()
        .map(|entry| entry.multipv)
        .collect();
    assert_eq!(ranks, vec![1, 2]);

    let submissions = server.state.submissions.lock().unwrap().clone();
    assert_eq!(submissions.len(), 1);
    assert_eq!(submissions[0]["node_id"], 100);
    assert_eq!(submissions[0]["engine_mode"], "client");
    assert_eq!(submissions[0]["evals"].as_array().map(Vec::len), Some(2));
    assert_eq!(submissions[0]["evals"][0]["pv_uci"], "e2e4 e7e5");
    assert_eq!(submissions[0]["evals"][1]["score_mate"], 2);
}

#[tokio::test]
async fn failed_local_analysis_clears_pending_without_submitting() {
    let server = MockServer::start().await;
    let engine = UciEngine::new(&engines().silent).with_timeout(Duration::from_millis(300));
    let core = server.core_with_engine(EngineMode::Client, Some(engine));
    core.load_openings().await.unwrap();

    let err = core.request_server_evaluation(NodeId(100)).await.unwrap_err();
    assert!(
        matches!(err, SyncError::LocalEngine(LocalEngineError::Timeout(_))),
        "{err:?}"
    );

    let state = core.snapshot();
    assert_eq!(state.eval_status(NodeId(100)), EvalStatus::Unrequested);
    assert!(state.last_error.is_some());
    assert!(server.state.submissions.lock().unwrap().is_empty());
}
