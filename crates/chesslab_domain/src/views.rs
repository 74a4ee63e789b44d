use crate::{EngineSettings, EvalStatus, LineId, NodeId, OpeningId, StudyState};

pub const SCORE_DISPLAY_LIMIT: i32 = 1000;
pub const GRAPH_SCORE_MIN: i32 = -500;
pub const GRAPH_SCORE_MAX: i32 = 500;

/// Display value of a centipawn score; a missing score shows as zero.
pub fn clamp_display_score(score_cp: Option<i32>) -> i32 {
    score_cp
        .unwrap_or(0)
        .clamp(-SCORE_DISPLAY_LIMIT, SCORE_DISPLAY_LIMIT)
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct EvalRowModel {
    pub rank: u32,
    pub depth: u32,
    pub pv: String,
    pub display_score: i32,
    pub score_label: String,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct EvalListModel {
    pub node_id: Option<NodeId>,
    pub status: Option<EvalStatus>,
    pub rows: Vec<EvalRowModel>,
}

pub fn eval_list(state: &StudyState) -> EvalListModel {
    let node_id = state.cursor.node_id;
    let rows = state
        .selected_evaluations()
        .iter()
        .map(|entry| {
            let display_score = clamp_display_score(entry.score_cp);
            let score_label = match entry.score_mate {
                Some(mate) => format!("#{mate}"),
                None => display_score.to_string(),
            };
            EvalRowModel {
                rank: entry.multipv,
                depth: entry.depth,
                pv: entry.pv_uci.clone().unwrap_or_default(),
                display_score,
                score_label,
            }
        })
        .collect();

    EvalListModel {
        node_id,
        status: node_id.map(|id| state.eval_status(id)),
        rows,
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct EvalGraphPoint {
    pub ply: u32,
    pub score: i32,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct EvalGraphModel {
    pub points: Vec<EvalGraphPoint>,
    pub min_score: i32,
    pub max_score: i32,
}

/// One point per node of the selected line, scored by its rank 1 entry.
pub fn eval_graph(state: &StudyState) -> EvalGraphModel {
    let points = state
        .selected_line_nodes()
        .iter()
        .map(|node| EvalGraphPoint {
            ply: node.ply,
            score: state
                .evaluations
                .top(node.id)
                .and_then(|entry| entry.score_cp)
                .unwrap_or(0),
        })
        .collect();

    EvalGraphModel {
        points,
        min_score: GRAPH_SCORE_MIN,
        max_score: GRAPH_SCORE_MAX,
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct NodeRowModel {
    pub id: NodeId,
    pub san: String,
    pub ply: u32,
    pub selected: bool,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct LineRowModel {
    pub id: LineId,
    pub title: String,
    pub is_main: bool,
    pub selected: bool,
    pub nodes: Vec<NodeRowModel>,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct OpeningRowModel {
    pub id: OpeningId,
    pub name: String,
    pub side: String,
    pub selected: bool,
    pub lines: Vec<LineRowModel>,
}

pub fn tree_rows(state: &StudyState) -> Vec<OpeningRowModel> {
    let cursor = state.cursor;
    state
        .openings
        .iter()
        .map(|opening| OpeningRowModel {
            id: opening.id,
            name: opening.name.clone(),
            side: opening.side.clone(),
            selected: cursor.opening_id == Some(opening.id),
            lines: state
                .lines_for(opening.id)
                .iter()
                .map(|line| LineRowModel {
                    id: line.id,
                    title: line.title.clone(),
                    is_main: line.is_main,
                    selected: cursor.line_id == Some(line.id),
                    nodes: state
                        .nodes_for(line.id)
                        .iter()
                        .map(|node| NodeRowModel {
                            id: node.id,
                            san: node.san.clone(),
                            ply: node.ply,
                            selected: cursor.line_id == Some(line.id)
                                && cursor.node_id == Some(node.id),
                        })
                        .collect(),
                })
                .collect(),
        })
        .collect()
}

pub fn settings_rows(settings: &EngineSettings) -> [(&'static str, String); 3] {
    [
        ("Mode", settings.mode.as_str().to_owned()),
        ("Depth", settings.depth.to_string()),
        ("MultiPV", settings.multipv.to_string()),
    ]
}
