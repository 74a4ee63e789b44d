use crate::live::LiveChannel;
use crate::remote::{RemoteError, RemoteSource};
use crate::uci::{LocalEngineError, UciEngine};
use chesslab_api::{
    AddNodeRequest, CreateLineRequest, CreateOpeningRequest, EvalQuery, ImportPgnRequest,
    ImportPgnResult, LiveMessage, SubmitEvalRequest,
};
use chesslab_domain::{
    Action, Effect, EngineSettings, EvalEntry, Line, LineId, Node, NodeId, Opening, OpeningId,
    StudyState,
};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error(transparent)]
    Remote(#[from] RemoteError),

    #[error(transparent)]
    LocalEngine(#[from] LocalEngineError),
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SyncEvent {
    StateChanged { rev: u64 },
}

#[derive(Clone, Debug)]
pub struct SyncOptions {
    pub settings: EngineSettings,
    pub live_url: String,
    pub local_engine: Option<UciEngine>,
}

struct CoreState {
    study: StudyState,
    rev: u64,
}

struct Inner<R> {
    remote: R,
    state: Mutex<CoreState>,
    events: broadcast::Sender<SyncEvent>,
    live_url: String,
    local_engine: Option<UciEngine>,
    live_task: Mutex<Option<JoinHandle<()>>>,
}

impl<R> Inner<R> {
    fn apply(&self, action: Action) -> Vec<Effect> {
        let (effects, rev) = {
            let mut state = lock(&self.state);
            let effects = state.study.apply(action);
            state.rev = state.rev.saturating_add(1);
            (effects, state.rev)
        };
        let _ = self.events.send(SyncEvent::StateChanged { rev });
        effects
    }
}

impl<R> Drop for Inner<R> {
    fn drop(&mut self) {
        if let Some(task) = lock(&self.live_task).take() {
            task.abort();
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Owns the study state, runs actions through the reducer and executes the
/// resulting effects against the remote source and the live channel.
pub struct SyncCore<R> {
    inner: Arc<Inner<R>>,
}

impl<R> Clone for SyncCore<R> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<R: RemoteSource> SyncCore<R> {
    pub fn new(remote: R, options: SyncOptions) -> Self {
        let (events, _) = broadcast::channel::<SyncEvent>(256);
        Self {
            inner: Arc::new(Inner {
                remote,
                state: Mutex::new(CoreState {
                    study: StudyState::new(options.settings),
                    rev: 0,
                }),
                events,
                live_url: options.live_url,
                local_engine: options.local_engine,
                live_task: Mutex::new(None),
            }),
        }
    }

    pub fn snapshot(&self) -> StudyState {
        lock(&self.inner.state).study.clone()
    }

    pub fn current_rev(&self) -> u64 {
        lock(&self.inner.state).rev
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SyncEvent> {
        self.inner.events.subscribe()
    }

    pub async fn load_openings(&self) -> Result<(), SyncError> {
        self.process_action_queue(Action::LoadOpenings).await
    }

    pub async fn select_opening(&self, opening_id: OpeningId) -> Result<(), SyncError> {
        self.process_action_queue(Action::SelectOpening { opening_id })
            .await
    }

    pub async fn select_line(&self, line_id: LineId) -> Result<(), SyncError> {
        self.process_action_queue(Action::SelectLine { line_id }).await
    }

    pub fn select_node(&self, node_id: NodeId) {
        self.inner.apply(Action::SelectNode { node_id });
    }

    pub async fn ensure_live_connection(&self) -> Result<(), SyncError> {
        self.process_action_queue(Action::EnsureLiveConnection)
            .await
    }

    pub async fn release_live_connection(&self) -> Result<(), SyncError> {
        self.process_action_queue(Action::ReleaseLiveConnection)
            .await
    }

    /// Single merge point for evaluation snapshots from either channel.
    pub fn apply_evaluation_update(&self, node_id: NodeId, entries: Vec<EvalEntry>) {
        self.inner
            .apply(Action::EvaluationReceived { node_id, entries });
    }

    pub async fn request_server_evaluation(&self, node_id: NodeId) -> Result<(), SyncError> {
        self.process_action_queue(Action::RequestEvaluation { node_id })
            .await
    }

    /// Applies a locally computed snapshot and publishes it to the remote
    /// source so other observers receive it on the live channel.
    pub async fn submit_evaluation(
        &self,
        node_id: NodeId,
        entries: Vec<EvalEntry>,
    ) -> Result<(), SyncError> {
        self.process_action_queue(Action::SubmitEvaluation { node_id, entries })
            .await
    }

    pub async fn create_opening(&self, request: CreateOpeningRequest) -> Result<Opening, SyncError> {
        let opening = self.inner.remote.create_opening(&request).await?;
        self.inner.apply(Action::OpeningCreated {
            opening: opening.clone(),
        });
        Ok(opening)
    }

    pub async fn create_line(
        &self,
        opening_id: OpeningId,
        request: CreateLineRequest,
    ) -> Result<Line, SyncError> {
        let line = self.inner.remote.create_line(opening_id, &request).await?;
        self.inner
            .apply(Action::LineCreated { line: line.clone() });
        Ok(line)
    }

    pub async fn add_node(&self, line_id: LineId, request: AddNodeRequest) -> Result<Node, SyncError> {
        let node = self.inner.remote.add_node(line_id, &request).await?;
        self.inner.apply(Action::NodeAdded { node: node.clone() });
        Ok(node)
    }

    pub async fn import_pgn(&self, request: ImportPgnRequest) -> Result<ImportPgnResult, SyncError> {
        let result = self.inner.remote.import_pgn(&request).await?;
        self.process_action_queue(Action::PgnImported {
            opening_id: request.opening_id,
            line_id: result.line_id,
        })
        .await?;
        Ok(result)
    }

    pub async fn export_pgn(&self, line_id: LineId) -> Result<String, SyncError> {
        Ok(self.inner.remote.export_pgn(line_id).await?)
    }

    async fn process_action_queue(&self, initial: Action) -> Result<(), SyncError> {
        let mut actions = VecDeque::from([initial]);

        while let Some(action) = actions.pop_front() {
            let effects = self.inner.apply(action);
            for effect in effects {
                match self.run_effect(&effect).await {
                    Ok(followups) => actions.extend(followups),
                    Err(err) => {
                        tracing::error!(error = %err, effect = effect_name(&effect), "effect failed");
                        if let Some(action) = effect.failure_action(err.to_string()) {
                            self.inner.apply(action);
                        }
                        return Err(err);
                    }
                }
            }
        }
        Ok(())
    }

    async fn run_effect(&self, effect: &Effect) -> Result<Vec<Action>, SyncError> {
        let remote = &self.inner.remote;
        match effect {
            Effect::FetchOpenings => {
                let openings = remote.list_openings().await?;
                tracing::debug!(count = openings.len(), "openings loaded");
                Ok(vec![Action::OpeningsLoaded { openings }])
            }
            Effect::FetchLines {
                opening_id,
                generation,
            } => {
                let lines = remote.list_lines(*opening_id).await?;
                tracing::debug!(opening_id = opening_id.0, count = lines.len(), "lines loaded");
                Ok(vec![Action::LinesLoaded {
                    opening_id: *opening_id,
                    generation: *generation,
                    lines,
                }])
            }
            Effect::RefreshLines { opening_id } => {
                let lines = remote.list_lines(*opening_id).await?;
                Ok(vec![Action::LinesRefreshed {
                    opening_id: *opening_id,
                    lines,
                }])
            }
            Effect::FetchNodes {
                line_id,
                generation,
            } => {
                let nodes = remote.list_nodes(*line_id).await?;
                tracing::debug!(line_id = line_id.0, count = nodes.len(), "nodes loaded");
                Ok(vec![Action::NodesLoaded {
                    line_id: *line_id,
                    generation: *generation,
                    nodes,
                }])
            }
            Effect::RequestEvaluation { node_id, settings } => {
                let outcome = remote
                    .request_evaluation(EvalQuery {
                        node_id: *node_id,
                        depth: settings.depth,
                        multipv: settings.multipv,
                        mode: settings.mode,
                    })
                    .await?;
                Ok(vec![Action::EvaluationPulled {
                    node_id: *node_id,
                    outcome,
                }])
            }
            Effect::AnalyzeLocally {
                node_id,
                fen,
                depth,
                multipv,
            } => {
                let Some(engine) = &self.inner.local_engine else {
                    tracing::debug!(node_id = node_id.0, "no local engine configured");
                    return Ok(vec![Action::EvaluationReceived {
                        node_id: *node_id,
                        entries: Vec::new(),
                    }]);
                };
                let entries = engine.analyse(fen, *depth, *multipv).await?;
                tracing::info!(node_id = node_id.0, lines = entries.len(), "local analysis finished");
                Ok(vec![Action::SubmitEvaluation {
                    node_id: *node_id,
                    entries,
                }])
            }
            Effect::SubmitEvaluation {
                node_id,
                engine_mode,
                entries,
            } => {
                let ack = remote
                    .submit_evaluation(&SubmitEvalRequest {
                        node_id: *node_id,
                        engine_mode: *engine_mode,
                        evals: entries.clone(),
                    })
                    .await?;
                tracing::debug!(node_id = node_id.0, saved = ack.saved, "evaluation submitted");
                Ok(Vec::new())
            }
            Effect::OpenLiveConnection => {
                self.open_live_connection();
                Ok(Vec::new())
            }
            Effect::CloseLiveConnection => {
                if let Some(task) = lock(&self.inner.live_task).take() {
                    task.abort();
                    tracing::info!("live channel released");
                }
                Ok(Vec::new())
            }
        }
    }

    /// The reducer only asks for a connection from `Disconnected`, so any
    /// task still in the slot has already reported its disconnect.
    fn open_live_connection(&self) {
        let url = self.inner.live_url.clone();
        let inner = Arc::downgrade(&self.inner);
        let mut slot = lock(&self.inner.live_task);
        if let Some(previous) = slot.replace(tokio::spawn(run_live_channel(url, inner))) {
            previous.abort();
        }
    }
}

fn effect_name(effect: &Effect) -> &'static str {
    match effect {
        Effect::FetchOpenings => "fetch_openings",
        Effect::FetchLines { .. } => "fetch_lines",
        Effect::RefreshLines { .. } => "refresh_lines",
        Effect::FetchNodes { .. } => "fetch_nodes",
        Effect::RequestEvaluation { .. } => "request_evaluation",
        Effect::AnalyzeLocally { .. } => "analyze_locally",
        Effect::SubmitEvaluation { .. } => "submit_evaluation",
        Effect::OpenLiveConnection => "open_live_connection",
        Effect::CloseLiveConnection => "close_live_connection",
    }
}

/// Applies an action pushed by the live channel. Returns false once the
/// core has been dropped.
fn apply_pushed<R>(inner: &Weak<Inner<R>>, action: Action) -> bool {
    let Some(inner) = inner.upgrade() else {
        return false;
    };
    let effects = inner.apply(action);
    if !effects.is_empty() {
        tracing::warn!(count = effects.len(), "live channel action produced effects; ignoring");
    }
    true
}

async fn run_live_channel<R>(url: String, inner: Weak<Inner<R>>) {
    let mut channel = match LiveChannel::connect(&url).await {
        Ok(channel) => channel,
        Err(err) => {
            tracing::warn!(error = %err, "live channel unavailable");
            apply_pushed(
                &inner,
                Action::LiveDisconnected {
                    message: Some(err.to_string()),
                },
            );
            return;
        }
    };

    tracing::info!(url = %url, "live channel connected");
    if !apply_pushed(&inner, Action::LiveConnected) {
        return;
    }

    let reason = loop {
        match channel.next_message().await {
            Some(Ok(LiveMessage::EvalUpdate { node_id, evals })) => {
                tracing::debug!(node_id = node_id.0, lines = evals.len(), "eval_update received");
                let action = Action::EvaluationReceived {
                    node_id,
                    entries: evals,
                };
                if !apply_pushed(&inner, action) {
                    return;
                }
            }
            Some(Ok(LiveMessage::Unknown)) => {}
            Some(Err(err)) => break Some(err.to_string()),
            None => break None,
        }
    };

    tracing::info!(reason = ?reason, "live channel closed");
    apply_pushed(&inner, Action::LiveDisconnected { message: reason });
}
