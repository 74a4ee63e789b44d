use anyhow::Context as _;
use chesslab_client::{ClientConfig, SyncEvent};
use chesslab_domain::{StudyState, board_model, eval_list, settings_rows, tree_rows};
use tokio::sync::broadcast::error::RecvError;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let config = ClientConfig::from_env();
    for (label, value) in settings_rows(&config.settings) {
        tracing::info!(setting = label, value = %value, "engine setting");
    }

    let core = chesslab_client::connect(&config).context("invalid CHESSLAB_API_URL")?;
    let mut events = core.subscribe();

    core.ensure_live_connection()
        .await
        .context("failed to open live channel")?;
    core.load_openings()
        .await
        .context("failed to load openings")?;

    if let Some(node_id) = core.snapshot().cursor.node_id
        && let Err(err) = core.request_server_evaluation(node_id).await
    {
        tracing::warn!(error = %err, node_id = node_id.0, "evaluation request failed");
    }
    log_state(&core.snapshot());

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            event = events.recv() => match event {
                Ok(SyncEvent::StateChanged { rev }) => {
                    tracing::debug!(rev, "state changed");
                    log_evaluations(&core.snapshot());
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::debug!(skipped, "state events lagged");
                }
                Err(RecvError::Closed) => break,
            },
        }
    }

    core.release_live_connection()
        .await
        .context("failed to release live channel")?;
    Ok(())
}

fn log_state(state: &StudyState) {
    for opening in tree_rows(state) {
        tracing::info!(
            opening = %opening.name,
            side = %opening.side,
            selected = opening.selected,
            lines = opening.lines.len(),
            "opening"
        );
        for line in opening.lines.iter().filter(|line| line.selected) {
            let moves: Vec<&str> = line.nodes.iter().map(|node| node.san.as_str()).collect();
            tracing::info!(line = %line.title, moves = %moves.join(" "), "selected line");
        }
    }

    let board = board_model(state);
    tracing::info!(
        fen = %board.fen,
        start = board.is_start_position,
        arrows = board.arrows.len(),
        "board"
    );
    log_evaluations(state);
}

fn log_evaluations(state: &StudyState) {
    let list = eval_list(state);
    let Some(node_id) = list.node_id else {
        return;
    };
    tracing::info!(node_id = node_id.0, status = ?list.status, live = state.live.as_str(), "evaluations");
    for row in list.rows {
        tracing::info!(rank = row.rank, depth = row.depth, score = %row.score_label, pv = %row.pv, "line");
    }
}
