use crate::{LineId, NodeId, OpeningId};

/// Selection across the three tree levels. Choosing a level resets
/// everything below it.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct SelectionCursor {
    pub opening_id: Option<OpeningId>,
    pub line_id: Option<LineId>,
    pub node_id: Option<NodeId>,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CursorEvent {
    /// An opening's lines resolved; `first_line` is the first of them.
    OpeningChosen {
        opening_id: OpeningId,
        first_line: Option<LineId>,
    },
    /// A line's nodes resolved; `last_node` is the terminal position.
    LineChosen {
        line_id: LineId,
        last_node: Option<NodeId>,
    },
    NodeChosen {
        node_id: NodeId,
    },
}

pub fn next_cursor(cursor: SelectionCursor, event: CursorEvent) -> SelectionCursor {
    match event {
        CursorEvent::OpeningChosen {
            opening_id,
            first_line,
        } => SelectionCursor {
            opening_id: Some(opening_id),
            line_id: first_line,
            node_id: None,
        },
        CursorEvent::LineChosen { line_id, last_node } => SelectionCursor {
            line_id: Some(line_id),
            node_id: last_node,
            ..cursor
        },
        CursorEvent::NodeChosen { node_id } => SelectionCursor {
            node_id: Some(node_id),
            ..cursor
        },
    }
}
