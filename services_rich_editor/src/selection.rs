//! Selection tracking
//!
//! The host owns the live selection (a browser range, a terminal cursor, a
//! test fixture). [`SelectionTracker`] adapts whatever the host reports into
//! stable document addresses and writes carets back after insertions.

use document_model::{Document, ObjectId, ObjectLocation, Position, TextRange};
use serde::{Deserialize, Serialize};

/// One end of a host selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HostPoint {
    /// A caret slot in a text block
    Text(Position),
    /// Inside the rendered region of an embedded object
    Object(ObjectId),
}

/// The raw selection as the host reports it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostRange {
    pub anchor: HostPoint,
    pub focus: HostPoint,
}

impl HostRange {
    pub fn caret(at: Position) -> Self {
        Self {
            anchor: HostPoint::Text(at),
            focus: HostPoint::Text(at),
        }
    }

    pub fn text(anchor: Position, focus: Position) -> Self {
        Self {
            anchor: HostPoint::Text(anchor),
            focus: HostPoint::Text(focus),
        }
    }

    pub fn object(id: ObjectId) -> Self {
        Self {
            anchor: HostPoint::Object(id),
            focus: HostPoint::Object(id),
        }
    }
}

/// Host-level selection primitive
pub trait SelectionHost {
    /// Current selection; `None` when nothing is focused
    fn read(&self) -> Option<HostRange>;

    /// Replaces the selection
    fn write(&mut self, range: HostRange);

    /// Drops the selection entirely
    fn clear(&mut self);

    fn set_caret(&mut self, at: Position) {
        self.write(HostRange::caret(at));
    }
}

/// In-memory selection host for headless use
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeadlessSelection {
    current: Option<HostRange>,
}

impl HeadlessSelection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_caret(at: Position) -> Self {
        Self {
            current: Some(HostRange::caret(at)),
        }
    }

    pub fn select_text(&mut self, anchor: Position, focus: Position) {
        self.write(HostRange::text(anchor, focus));
    }

    /// Simulates a click on an object's rendered region
    pub fn click_object(&mut self, id: ObjectId) {
        self.write(HostRange::object(id));
    }
}

impl SelectionHost for HeadlessSelection {
    fn read(&self) -> Option<HostRange> {
        self.current
    }

    fn write(&mut self, range: HostRange) {
        self.current = Some(range);
    }

    fn clear(&mut self) {
        self.current = None;
    }
}

/// Resolved selection in document terms
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SelectionState {
    None,
    Text(TextRange),
    Object(ObjectId),
}

impl SelectionState {
    pub fn as_text(&self) -> Option<TextRange> {
        match self {
            SelectionState::Text(range) => Some(*range),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<ObjectId> {
        match self {
            SelectionState::Object(id) => Some(*id),
            _ => None,
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, SelectionState::None)
    }
}

/// What a caret should be placed after. A position lands on itself,
/// clamped to its block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentRef {
    Object(ObjectId),
    Position(Position),
}

/// Adapter between the host selection and document addresses
#[derive(Debug, Clone, Default)]
pub struct SelectionTracker<H: SelectionHost> {
    host: H,
}

impl<H: SelectionHost> SelectionTracker<H> {
    pub fn new(host: H) -> Self {
        Self { host }
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    /// Resolves the host selection against `document`. Pure read.
    ///
    /// An anchor inside an object yields that object. Stale text offsets are
    /// clamped to their block; an anchor in a block that no longer exists
    /// yields `None`.
    pub fn resolve(&self, document: &Document) -> SelectionState {
        let Some(raw) = self.host.read() else {
            return SelectionState::None;
        };

        let anchor = match raw.anchor {
            HostPoint::Object(id) => {
                return match document.locate_object(id) {
                    Some(_) => SelectionState::Object(id),
                    None => SelectionState::None,
                };
            }
            HostPoint::Text(pos) => match document.clamp_position(pos) {
                Some(pos) => pos,
                None => return SelectionState::None,
            },
        };

        let focus = match raw.focus {
            HostPoint::Text(pos) => document.clamp_position(pos),
            HostPoint::Object(id) => object_edge(document, id, anchor),
        }
        .unwrap_or(anchor);

        SelectionState::Text(TextRange::new(anchor, focus))
    }

    /// Moves the caret to just after `content` and returns where it landed.
    pub fn collapse_after(&mut self, document: &Document, content: ContentRef) -> Option<Position> {
        let at = match content {
            ContentRef::Object(id) => document.position_after(id)?,
            ContentRef::Position(pos) => document.clamp_position(pos)?,
        };
        self.host.set_caret(at);
        Some(at)
    }

    /// Places a caret without resolving anything
    pub fn set_caret(&mut self, at: Position) {
        self.host.set_caret(at);
    }

    pub fn select_range(&mut self, range: TextRange) {
        self.host.write(HostRange::text(range.start(), range.end()));
    }

    pub fn select_object(&mut self, id: ObjectId) {
        self.host.write(HostRange::object(id));
    }

    pub fn clear(&mut self) {
        self.host.clear();
    }
}

/// The text slot on the far side of an object, as seen from `anchor`
fn object_edge(document: &Document, id: ObjectId, anchor: Position) -> Option<Position> {
    match document.locate_object(id)? {
        ObjectLocation::Inline(pos) if pos >= anchor => Some(Position::new(pos.block, pos.offset + 1)),
        ObjectLocation::Inline(pos) => Some(pos),
        ObjectLocation::Block(ix) if ix > anchor.block => document.position_after(id),
        ObjectLocation::Block(ix) => {
            let before = ix.checked_sub(1)?;
            document
                .text_block(before)
                .map(|text| Position::new(before, text.len()))
        }
    }
}
