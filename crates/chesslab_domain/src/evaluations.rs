use crate::{EvalEntry, NodeId};
use std::collections::{HashMap, HashSet};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum EvalStatus {
    Unrequested,
    Pending,
    Available,
}

/// Latest ranked evaluation snapshot per node. Every write replaces the
/// node's whole snapshot, whichever channel it came from.
#[derive(Clone, Debug, Default)]
pub struct EvaluationTable {
    entries: HashMap<NodeId, Vec<EvalEntry>>,
    pending: HashSet<NodeId>,
}

impl EvaluationTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn apply_snapshot(&mut self, node_id: NodeId, entries: Vec<EvalEntry>) {
        self.pending.remove(&node_id);
        self.entries.insert(node_id, normalize_snapshot(entries));
    }

    pub fn mark_pending(&mut self, node_id: NodeId) {
        self.pending.insert(node_id);
    }

    pub fn clear_pending(&mut self, node_id: NodeId) {
        self.pending.remove(&node_id);
    }

    pub fn status(&self, node_id: NodeId) -> EvalStatus {
        if self.pending.contains(&node_id) {
            return EvalStatus::Pending;
        }
        if self.entries.contains_key(&node_id) {
            return EvalStatus::Available;
        }
        EvalStatus::Unrequested
    }

    pub fn get(&self, node_id: NodeId) -> &[EvalEntry] {
        self.entries
            .get(&node_id)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// The rank 1 entry, if the node has one.
    pub fn top(&self, node_id: NodeId) -> Option<&EvalEntry> {
        self.get(node_id).first().filter(|entry| entry.multipv == 1)
    }
}

/// Orders a snapshot by ascending rank. Sorted input is returned as is; a
/// duplicated rank keeps the entry received last.
pub fn normalize_snapshot(mut entries: Vec<EvalEntry>) -> Vec<EvalEntry> {
    let sorted_unique = entries.windows(2).all(|w| w[0].multipv < w[1].multipv);
    if sorted_unique {
        return entries;
    }

    entries.sort_by_key(|entry| entry.multipv);
    let mut out: Vec<EvalEntry> = Vec::with_capacity(entries.len());
    for entry in entries {
        match out.last_mut() {
            Some(last) if last.multipv == entry.multipv => *last = entry,
            _ => out.push(entry),
        }
    }
    out
}
