pub use chesslab_api::{
    EngineMode, EvalEntry, EvalOutcome, Line, LineId, Node, NodeId, Opening, OpeningId,
};

mod actions;
pub use actions::Action;
mod effects;
pub use effects::Effect;

mod cursor;
pub use cursor::{CursorEvent, SelectionCursor, next_cursor};
mod evaluations;
pub use evaluations::{EvalStatus, EvaluationTable, normalize_snapshot};
mod settings;
pub use settings::{
    DEFAULT_ENGINE_DEPTH, DEFAULT_ENGINE_MULTIPV, EngineSettings, default_engine_mode,
    parse_engine_mode, parse_positive,
};

mod board;
pub use board::{
    BoardModel, MoveArrow, START_FEN, Square, arrow_for_entry, board_model, parse_uci_squares,
};
mod views;
pub use views::{
    EvalGraphModel, EvalGraphPoint, EvalListModel, EvalRowModel, GRAPH_SCORE_MAX,
    GRAPH_SCORE_MIN, LineRowModel, NodeRowModel, OpeningRowModel, SCORE_DISPLAY_LIMIT,
    clamp_display_score, eval_graph, eval_list, settings_rows, tree_rows,
};

mod state;
pub use state::*;

mod reducer;
