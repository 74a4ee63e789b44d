use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OpeningId(pub u64);

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LineId(pub u64);

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub u64);

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Opening {
    pub id: OpeningId,
    pub name: String,
    pub side: String,
    #[serde(default)]
    pub tags: Option<String>,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Line {
    pub id: LineId,
    pub opening_id: OpeningId,
    pub title: String,
    #[serde(default)]
    pub is_main: bool,
}

/// One move of a line. `ply` orders the nodes of a line; `fen` is the
/// position after the move.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    pub line_id: LineId,
    #[serde(default)]
    pub parent_id: Option<NodeId>,
    pub san: String,
    pub ply: u32,
    pub fen: String,
    #[serde(default)]
    pub comment: Option<String>,
}

/// One ranked engine line for a position. `multipv` is the 1-based rank.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct EvalEntry {
    pub depth: u32,
    pub multipv: u32,
    #[serde(default)]
    pub pv_uci: Option<String>,
    #[serde(default)]
    pub score_cp: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score_mate: Option<i32>,
    #[serde(default)]
    pub bestmove_uci: Option<String>,
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineMode {
    #[default]
    Client,
    Server,
    Auto,
}

impl EngineMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Client => "client",
            Self::Server => "server",
            Self::Auto => "auto",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if raw.eq_ignore_ascii_case("client") {
            return Some(Self::Client);
        }
        if raw.eq_ignore_ascii_case("server") {
            return Some(Self::Server);
        }
        if raw.eq_ignore_ascii_case("auto") {
            return Some(Self::Auto);
        }
        None
    }
}

/// Query parameters of `GET /eval`.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct EvalQuery {
    pub node_id: NodeId,
    pub depth: u32,
    pub multipv: u32,
    pub mode: EngineMode,
}

/// Body of `GET /eval`. Older sources answer with a bare list; newer ones
/// wrap it and may report that a server-side analysis was queued instead.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EvalReply {
    Entries(Vec<EvalEntry>),
    Envelope(EvalEnvelope),
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EvalEnvelope {
    #[serde(default)]
    pub pending: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evals: Option<Vec<EvalEntry>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum EvalOutcome {
    Ready(Vec<EvalEntry>),
    Pending,
}

/// Why an envelope could not be turned into an outcome.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum EvalReplyError {
    /// The source answered with an `error` message.
    Rejected(String),
    /// Neither `pending` nor `evals` was present.
    MissingEvals,
}

impl EvalReply {
    pub fn into_outcome(self) -> Result<EvalOutcome, EvalReplyError> {
        let envelope = match self {
            EvalReply::Entries(entries) => return Ok(EvalOutcome::Ready(entries)),
            EvalReply::Envelope(envelope) => envelope,
        };
        if let Some(message) = envelope.error {
            return Err(EvalReplyError::Rejected(message));
        }
        if envelope.pending {
            return Ok(EvalOutcome::Pending);
        }
        envelope
            .evals
            .map(EvalOutcome::Ready)
            .ok_or(EvalReplyError::MissingEvals)
    }
}

/// Body of `POST /eval`.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct SubmitEvalRequest {
    pub node_id: NodeId,
    pub engine_mode: EngineMode,
    pub evals: Vec<EvalEntry>,
}

#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct SubmitEvalAck {
    #[serde(default)]
    pub saved: bool,
    #[serde(default)]
    pub evals: Vec<EvalEntry>,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct CreateOpeningRequest {
    pub name: String,
    pub side: String,
    #[serde(default)]
    pub tags: Option<String>,
    #[serde(default = "default_create_main_line")]
    pub create_main_line: bool,
}

fn default_create_main_line() -> bool {
    true
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct CreateLineRequest {
    pub title: String,
    #[serde(default)]
    pub is_main: bool,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct AddNodeRequest {
    #[serde(default)]
    pub parent_id: Option<NodeId>,
    pub san: String,
    #[serde(default)]
    pub comment: Option<String>,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct ImportPgnRequest {
    pub opening_id: OpeningId,
    pub pgn: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct ImportPgnResult {
    pub line_id: LineId,
    pub ply_count: u32,
}

/// Messages pushed on the live channel, one JSON object per text frame.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LiveMessage {
    EvalUpdate {
        node_id: NodeId,
        evals: Vec<EvalEntry>,
    },
    #[serde(other)]
    Unknown,
}
