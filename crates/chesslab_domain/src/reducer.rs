use crate::cursor::{CursorEvent, next_cursor};
use crate::{Action, Effect, EngineMode, EvalOutcome, LiveStatus, Node, StudyState};

impl StudyState {
    pub fn apply(&mut self, action: Action) -> Vec<Effect> {
        match action {
            Action::LoadOpenings => vec![Effect::FetchOpenings],
            Action::OpeningsLoaded { openings } => {
                self.openings = openings;
                match self.openings.first().map(|opening| opening.id) {
                    Some(opening_id) => self.apply(Action::SelectOpening { opening_id }),
                    None => Vec::new(),
                }
            }

            Action::SelectOpening { opening_id } => {
                self.generation = self.generation.next();
                vec![Effect::FetchLines {
                    opening_id,
                    generation: self.generation,
                }]
            }
            Action::LinesLoaded {
                opening_id,
                generation,
                lines,
            } => {
                let first_line = lines.first().map(|line| line.id);
                self.lines.insert(opening_id, lines);
                if generation != self.generation {
                    return Vec::new();
                }

                self.cursor = next_cursor(
                    self.cursor,
                    CursorEvent::OpeningChosen {
                        opening_id,
                        first_line,
                    },
                );
                match first_line {
                    Some(line_id) => vec![Effect::FetchNodes {
                        line_id,
                        generation,
                    }],
                    None => Vec::new(),
                }
            }
            Action::LinesRefreshed { opening_id, lines } => {
                self.lines.insert(opening_id, lines);
                Vec::new()
            }

            Action::SelectLine { line_id } => {
                self.generation = self.generation.next();
                vec![Effect::FetchNodes {
                    line_id,
                    generation: self.generation,
                }]
            }
            Action::NodesLoaded {
                line_id,
                generation,
                mut nodes,
            } => {
                nodes.sort_by_key(|node| node.ply);
                let last_node = nodes.last().map(|node| node.id);
                self.nodes.insert(line_id, nodes);
                if generation != self.generation {
                    return Vec::new();
                }

                self.cursor = next_cursor(self.cursor, CursorEvent::LineChosen {
                    line_id,
                    last_node,
                });
                Vec::new()
            }

            Action::SelectNode { node_id } => {
                self.generation = self.generation.next();
                self.cursor = next_cursor(self.cursor, CursorEvent::NodeChosen { node_id });
                Vec::new()
            }

            Action::OpeningCreated { opening } => {
                match self.openings.iter_mut().find(|o| o.id == opening.id) {
                    Some(existing) => *existing = opening,
                    None => self.openings.push(opening),
                }
                Vec::new()
            }
            Action::LineCreated { line } => {
                if let Some(lines) = self.lines.get_mut(&line.opening_id)
                    && !lines.iter().any(|l| l.id == line.id)
                {
                    lines.push(line);
                }
                Vec::new()
            }
            Action::NodeAdded { node } => {
                if let Some(nodes) = self.nodes.get_mut(&node.line_id)
                    && !nodes.iter().any(|n| n.id == node.id)
                {
                    insert_by_ply(nodes, node);
                }
                Vec::new()
            }
            Action::PgnImported { opening_id, .. } => vec![Effect::RefreshLines { opening_id }],

            Action::RequestEvaluation { node_id } => {
                self.evaluations.mark_pending(node_id);
                vec![Effect::RequestEvaluation {
                    node_id,
                    settings: self.settings,
                }]
            }
            Action::EvaluationPulled { node_id, outcome } => match outcome {
                EvalOutcome::Pending => {
                    self.evaluations.mark_pending(node_id);
                    Vec::new()
                }
                EvalOutcome::Ready(entries)
                    if entries.is_empty() && self.settings.mode == EngineMode::Client =>
                {
                    let Some(fen) = self.node(node_id).map(|node| node.fen.clone()) else {
                        return self.apply(Action::EvaluationReceived { node_id, entries });
                    };
                    self.evaluations.mark_pending(node_id);
                    vec![Effect::AnalyzeLocally {
                        node_id,
                        fen,
                        depth: self.settings.depth,
                        multipv: self.settings.multipv,
                    }]
                }
                EvalOutcome::Ready(entries) => {
                    self.apply(Action::EvaluationReceived { node_id, entries })
                }
            },
            Action::EvaluationReceived { node_id, entries } => {
                self.evaluations.apply_snapshot(node_id, entries);
                Vec::new()
            }
            Action::SubmitEvaluation { node_id, entries } => {
                self.evaluations.apply_snapshot(node_id, entries);
                vec![Effect::SubmitEvaluation {
                    node_id,
                    engine_mode: self.settings.mode,
                    entries: self.evaluations.get(node_id).to_vec(),
                }]
            }
            Action::EvaluationRequestFailed { node_id, message } => {
                self.evaluations.clear_pending(node_id);
                self.last_error = Some(message);
                Vec::new()
            }

            Action::EnsureLiveConnection => {
                if self.live != LiveStatus::Disconnected {
                    return Vec::new();
                }
                self.live = LiveStatus::Connecting;
                vec![Effect::OpenLiveConnection]
            }
            Action::LiveConnected => {
                self.live = LiveStatus::Connected;
                Vec::new()
            }
            Action::LiveDisconnected { message } => {
                self.live = LiveStatus::Disconnected;
                if message.is_some() {
                    self.last_error = message;
                }
                Vec::new()
            }
            Action::ReleaseLiveConnection => {
                self.live = LiveStatus::Disconnected;
                vec![Effect::CloseLiveConnection]
            }

            Action::RemoteFailed { message } => {
                self.last_error = Some(message);
                Vec::new()
            }
        }
    }
}

fn insert_by_ply(nodes: &mut Vec<Node>, node: Node) {
    let index = nodes.partition_point(|existing| existing.ply <= node.ply);
    nodes.insert(index, node);
}
