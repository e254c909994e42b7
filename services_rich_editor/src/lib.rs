//! # Rich Text Editor Service
//!
//! Editing surface for formatted documents with embedded images and
//! tables, persisted as a single snapshot.
//!
//! ## Philosophy
//!
//! - **Host-agnostic**: The selection comes from a [`SelectionHost`]; the
//!   session never assumes a particular UI toolkit
//! - **Atomic edits**: A failed operation leaves the document as it was
//! - **Save on change**: Every successful mutation writes the snapshot
//! - **Testable**: Runs headless against in-memory or failing stores
//!
//! ## Non-Goals
//!
//! This is NOT:
//! - A collaborative or multi-document editor
//! - A layout or rendering engine
//! - A PDF or print pipeline; [`ExportView`] is where one would start
//!
//! ## Design
//!
//! - [`selection`]: host selection adapter and the resolved [`SelectionState`]
//! - [`objects`]: image/table insertion, the single selected object, deletion
//! - [`commands`]: formatting commands over a text range
//! - [`image`]: picker data to [`document_model::Image`], plus the decode queue
//! - [`history`]: bounded undo/redo
//! - [`session`]: [`EditorSession`], which wires the above to persistence

pub mod commands;
pub mod error;
pub mod history;
pub mod image;
pub mod objects;
pub mod selection;
pub mod session;
pub mod snapshot;

pub use commands::{execute, CommandError, CommandKind, CommandOutcome};
pub use error::{EditorError, EditorResult};
pub use history::{History, HistoryEntry};
pub use image::{decode_image, DecodeQueue, DecodeTicket, ImageFormat, PendingDecode};
pub use objects::{table_dimensions, ObjectManager, SelectionChange};
pub use selection::{
    ContentRef, HeadlessSelection, HostPoint, HostRange, SelectionHost, SelectionState,
    SelectionTracker,
};
pub use session::{EditorSession, ExportView, KeyOutcome, Lifecycle, Notice};
pub use snapshot::SessionSnapshot;
