use crate::{
    EngineSettings, EvalEntry, EvalStatus, EvaluationTable, Line, LineId, Node, NodeId, Opening,
    OpeningId, SelectionCursor,
};
use std::collections::HashMap;

/// Counter bumped by every user-initiated selection. Fetch results that
/// carry an older value still fill caches but no longer move the cursor.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct SelectionGeneration(pub(crate) u64);

impl SelectionGeneration {
    pub(crate) fn next(self) -> Self {
        Self(self.0.saturating_add(1))
    }
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum LiveStatus {
    #[default]
    Disconnected,
    Connecting,
    Connected,
}

impl LiveStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct StudyState {
    pub openings: Vec<Opening>,
    pub lines: HashMap<OpeningId, Vec<Line>>,
    pub nodes: HashMap<LineId, Vec<Node>>,
    pub cursor: SelectionCursor,
    pub evaluations: EvaluationTable,
    pub settings: EngineSettings,
    pub live: LiveStatus,
    pub last_error: Option<String>,
    pub(crate) generation: SelectionGeneration,
}

impl StudyState {
    pub fn new(settings: EngineSettings) -> Self {
        Self {
            settings,
            ..Self::default()
        }
    }

    pub fn opening(&self, opening_id: OpeningId) -> Option<&Opening> {
        self.openings.iter().find(|o| o.id == opening_id)
    }

    pub fn lines_for(&self, opening_id: OpeningId) -> &[Line] {
        self.lines
            .get(&opening_id)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn nodes_for(&self, line_id: LineId) -> &[Node] {
        self.nodes
            .get(&line_id)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn node(&self, node_id: NodeId) -> Option<&Node> {
        self.nodes
            .values()
            .flat_map(|nodes| nodes.iter())
            .find(|n| n.id == node_id)
    }

    pub fn selected_line_nodes(&self) -> &[Node] {
        match self.cursor.line_id {
            Some(line_id) => self.nodes_for(line_id),
            None => &[],
        }
    }

    /// The selected node, resolved within the selected line.
    pub fn selected_node(&self) -> Option<&Node> {
        let node_id = self.cursor.node_id?;
        self.selected_line_nodes().iter().find(|n| n.id == node_id)
    }

    pub fn selected_evaluations(&self) -> &[EvalEntry] {
        match self.cursor.node_id {
            Some(node_id) => self.evaluations.get(node_id),
            None => &[],
        }
    }

    pub fn eval_status(&self, node_id: NodeId) -> EvalStatus {
        self.evaluations.status(node_id)
    }
}
