//! Session snapshot for deterministic parity testing

use document_model::TextRange;
use serde::{Deserialize, Serialize};

use crate::session::Lifecycle;

/// Observable session state, free of generated object ids so that two
/// sessions driven by the same inputs compare equal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub lifecycle: Lifecycle,
    pub title: String,
    pub author: String,
    pub markup: String,
    pub selection: Option<TextRange>,
    pub object_selected: bool,
    pub object_count: usize,
    pub undo_depth: usize,
    pub redo_depth: usize,
    pub pending_decodes: usize,
}

impl SessionSnapshot {
    /// Compute a deterministic hash of the snapshot state
    #[cfg(test)]
    pub fn hash(&self) -> u64 {
        use sha2::{Digest, Sha256};

        let mut hasher = Sha256::new();
        hasher.update([self.lifecycle as u8]);
        hasher.update(self.title.as_bytes());
        hasher.update([0]);
        hasher.update(self.author.as_bytes());
        hasher.update([0]);
        hasher.update(self.markup.as_bytes());

        if let Some(range) = self.selection {
            for pos in [range.start(), range.end()] {
                hasher.update(pos.block.to_le_bytes());
                hasher.update(pos.offset.to_le_bytes());
            }
        }
        hasher.update([self.object_selected as u8]);
        hasher.update(self.object_count.to_le_bytes());
        hasher.update(self.undo_depth.to_le_bytes());
        hasher.update(self.redo_depth.to_le_bytes());
        hasher.update(self.pending_decodes.to_le_bytes());

        let result = hasher.finalize();
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(&result[..8]);
        u64::from_le_bytes(bytes)
    }
}
