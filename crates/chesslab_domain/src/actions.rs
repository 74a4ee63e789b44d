use crate::{
    EvalEntry, EvalOutcome, Line, LineId, Node, NodeId, Opening, OpeningId, SelectionGeneration,
};

#[derive(Clone, Debug)]
pub enum Action {
    LoadOpenings,
    OpeningsLoaded {
        openings: Vec<Opening>,
    },

    SelectOpening {
        opening_id: OpeningId,
    },
    LinesLoaded {
        opening_id: OpeningId,
        generation: SelectionGeneration,
        lines: Vec<Line>,
    },
    LinesRefreshed {
        opening_id: OpeningId,
        lines: Vec<Line>,
    },

    SelectLine {
        line_id: LineId,
    },
    NodesLoaded {
        line_id: LineId,
        generation: SelectionGeneration,
        nodes: Vec<Node>,
    },

    SelectNode {
        node_id: NodeId,
    },

    OpeningCreated {
        opening: Opening,
    },
    LineCreated {
        line: Line,
    },
    NodeAdded {
        node: Node,
    },
    PgnImported {
        opening_id: OpeningId,
        line_id: LineId,
    },

    RequestEvaluation {
        node_id: NodeId,
    },
    EvaluationPulled {
        node_id: NodeId,
        outcome: EvalOutcome,
    },
    EvaluationReceived {
        node_id: NodeId,
        entries: Vec<EvalEntry>,
    },
    SubmitEvaluation {
        node_id: NodeId,
        entries: Vec<EvalEntry>,
    },
    EvaluationRequestFailed {
        node_id: NodeId,
        message: String,
    },

    EnsureLiveConnection,
    LiveConnected,
    LiveDisconnected {
        message: Option<String>,
    },
    ReleaseLiveConnection,

    RemoteFailed {
        message: String,
    },
}
