//! # Document Model
//!
//! The rich-text document tree the editor operates on, independent of any
//! rendering surface.
//!
//! ## Philosophy
//!
//! - **Model, not markup**: The document is typed data; HTML is a projection
//! - **Explicit addressing**: Every edit names its target with a [`Position`]
//!   or [`TextRange`], never an ambient caret
//! - **Never empty**: A document always holds at least one block
//! - **Atomic objects**: Images and tables are units with stable identifiers
//!
//! ## Design
//!
//! - [`Document`]: ordered blocks plus the structural edit operations
//! - [`TextBlock`] / [`Inline`]: styled runs and inline objects
//! - [`EmbeddedObject`]: images (inline) and tables (block-level)
//! - [`markup`]: plain-text and HTML projections
//! - [`DocumentValue`]: versioned JSON form used for persistence

pub mod block;
pub mod document;
pub mod markup;
pub mod object;
pub mod position;
pub mod style;
pub mod value;

pub use block::{
    Alignment, Block, BlockFormat, BlockKind, Inline, TextBlock, TextRun, MAX_INDENT,
};
pub use document::{Document, ModelError, ModelResult, ObjectLocation};
pub use object::{EmbeddedObject, Image, ObjectContent, ObjectId, ObjectKind, Table, TableCell};
pub use position::{Position, TextRange};
pub use style::{
    font_size_to_scale, nearest_by_distance, Color, FontSize, InlineFlag, InlineStyle,
    StyleError, FONT_SIZE_SCALE,
};
pub use value::{DocumentValue, ValueError};

/// Placeholder unit used when an inline object is flattened into text.
pub const OBJECT_REPLACEMENT: char = '\u{FFFC}';
