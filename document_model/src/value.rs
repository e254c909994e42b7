//! Versioned JSON form of a document, used as the persisted `content`

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::block::Block;
use crate::document::Document;

const DEFAULT_SCHEMA: &str = "richtext";
const DEFAULT_VERSION: u32 = 1;

fn default_schema() -> String {
    DEFAULT_SCHEMA.to_string()
}

fn default_version() -> u32 {
    DEFAULT_VERSION
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValueError {
    #[error("Malformed document: {0}")]
    Malformed(String),

    #[error("Unknown document schema: {0}")]
    UnknownSchema(String),

    #[error("Unsupported document version: {0}")]
    UnsupportedVersion(u32),
}

/// A versioned wrapper around the block sequence
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DocumentValue {
    #[serde(default = "default_schema")]
    pub schema: String,
    #[serde(default = "default_version")]
    pub version: u32,
    pub blocks: Vec<Block>,
}

impl DocumentValue {
    pub const CURRENT_VERSION: u32 = DEFAULT_VERSION;

    pub fn from_document(document: &Document) -> Self {
        Self {
            schema: default_schema(),
            version: default_version(),
            blocks: document.blocks().to_vec(),
        }
    }

    pub fn into_document(self) -> Document {
        Document::from_blocks(self.blocks)
    }

    pub fn to_json(&self) -> Result<String, ValueError> {
        serde_json::to_string(self).map_err(|e| ValueError::Malformed(e.to_string()))
    }

    pub fn from_json(json: &str) -> Result<Self, ValueError> {
        let value: Self =
            serde_json::from_str(json).map_err(|e| ValueError::Malformed(e.to_string()))?;
        if value.schema != DEFAULT_SCHEMA {
            return Err(ValueError::UnknownSchema(value.schema));
        }
        if value.version != Self::CURRENT_VERSION {
            return Err(ValueError::UnsupportedVersion(value.version));
        }
        Ok(value)
    }
}

impl Document {
    /// Serializes the document to its persisted string form.
    pub fn to_content(&self) -> Result<String, ValueError> {
        DocumentValue::from_document(self).to_json()
    }

    /// Parses the persisted string form.
    pub fn from_content(content: &str) -> Result<Self, ValueError> {
        DocumentValue::from_json(content).map(DocumentValue::into_document)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::BlockKind;
    use crate::object::{EmbeddedObject, Image, Table};
    use crate::position::{Position, TextRange};
    use crate::style::Color;

    fn rich_document() -> Document {
        let mut doc = Document::from_plain_text("Title\nbody text");
        doc.update_format(TextRange::collapsed(Position::zero()), |format| {
            format.kind = BlockKind::Heading { level: 1 }
        })
        .unwrap();
        doc.update_style(
            TextRange::new(Position::new(1, 0), Position::new(1, 4)),
            |style| {
                style.bold = true;
                style.highlight = Color::parse("#ff0");
            },
        )
        .unwrap();
        doc.insert_inline_object(
            Position::new(1, 4),
            EmbeddedObject::image(Image {
                source: "data:image/png;base64,AA==".into(),
                mime: "image/png".into(),
                display_width: 300,
                display_height: 150,
            }),
        )
        .unwrap();
        doc.insert_block_object(Position::new(1, 2), EmbeddedObject::table(Table::new(2, 3)))
            .unwrap();
        doc
    }

    #[test]
    fn test_content_roundtrip() {
        let doc = rich_document();
        let content = doc.to_content().unwrap();
        let restored = Document::from_content(&content).unwrap();
        assert_eq!(restored, doc);
    }

    #[test]
    fn test_malformed_content() {
        assert!(matches!(
            Document::from_content("{ not json"),
            Err(ValueError::Malformed(_))
        ));
    }

    #[test]
    fn test_unsupported_version() {
        let json = r#"{"schema":"richtext","version":99,"blocks":[]}"#;
        assert_eq!(
            Document::from_content(json),
            Err(ValueError::UnsupportedVersion(99))
        );
    }

    #[test]
    fn test_unknown_schema() {
        let json = r#"{"schema":"slate","version":1,"blocks":[]}"#;
        assert_eq!(
            Document::from_content(json),
            Err(ValueError::UnknownSchema("slate".into()))
        );
    }

    #[test]
    fn test_missing_schema_defaults() {
        let json = r#"{"blocks":[]}"#;
        let doc = Document::from_content(json).unwrap();
        assert!(doc.is_empty());
    }
}
