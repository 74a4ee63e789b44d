use crate::{
    Action, EngineMode, EngineSettings, EvalEntry, LineId, NodeId, OpeningId, SelectionGeneration,
};

#[derive(Clone, Debug)]
pub enum Effect {
    FetchOpenings,
    FetchLines {
        opening_id: OpeningId,
        generation: SelectionGeneration,
    },
    RefreshLines {
        opening_id: OpeningId,
    },
    FetchNodes {
        line_id: LineId,
        generation: SelectionGeneration,
    },

    RequestEvaluation {
        node_id: NodeId,
        settings: EngineSettings,
    },
    AnalyzeLocally {
        node_id: NodeId,
        fen: String,
        depth: u32,
        multipv: u32,
    },
    SubmitEvaluation {
        node_id: NodeId,
        engine_mode: EngineMode,
        entries: Vec<EvalEntry>,
    },

    OpenLiveConnection,
    CloseLiveConnection,
}

impl Effect {
    /// Bookkeeping action to apply when running this effect fails.
    pub fn failure_action(&self, message: String) -> Option<Action> {
        match self {
            Effect::RequestEvaluation { node_id, .. } | Effect::AnalyzeLocally { node_id, .. } => {
                Some(Action::EvaluationRequestFailed {
                    node_id: *node_id,
                    message,
                })
            }
            Effect::OpenLiveConnection => Some(Action::LiveDisconnected {
                message: Some(message),
            }),
            Effect::CloseLiveConnection => None,
            Effect::FetchOpenings
            | Effect::FetchLines { .. }
            | Effect::RefreshLines { .. }
            | Effect::FetchNodes { .. }
            | Effect::SubmitEvaluation { .. } => Some(Action::RemoteFailed { message }),
        }
    }
}
