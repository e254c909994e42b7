//! Editor session
//!
//! Ties the document, the host selection, embedded objects, formatting
//! commands and persistence into one editing surface. Every successful
//! mutation records an undo entry and saves the snapshot; failures leave
//! the document untouched and queue a [`Notice`] when the user has to be
//! told.

use std::fmt;

use document_model::{
    markup, Block, BlockKind, Document, EmbeddedObject, InlineStyle, ObjectId, Position,
    TextBlock, TextRange,
};
use input_types::{InputEvent, KeyCode, KeyEvent};
use serde::{Deserialize, Serialize};
use services_logger::{LogEntry, LogLevel, SessionLog};
use services_settings::persistence::{
    load_overrides_safe, serialize_overrides, SettingsOverridesData,
};
use services_settings::{
    create_default_registry, keys, EditorConfig, InsertionAnchor, SettingValue,
    SettingsRegistry, Theme,
};
use services_storage::{KeyValueStore, PersistenceStore, Snapshot};

use crate::commands::{self, CommandKind, CommandOutcome};
use crate::error::{EditorError, EditorResult};
use crate::history::{History, HistoryEntry};
use crate::image::{decode_image, DecodeQueue, DecodeTicket, PendingDecode};
use crate::objects::{table_dimensions, ObjectManager, SelectionChange};
use crate::selection::{ContentRef, SelectionHost, SelectionState, SelectionTracker};
use crate::snapshot::SessionSnapshot;

/// Where the session is in its load/edit/save cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Lifecycle {
    Uninitialized,
    Loaded,
    Dirty,
    Saved,
    Reset,
}

impl Lifecycle {
    pub fn as_str(&self) -> &'static str {
        match self {
            Lifecycle::Uninitialized => "uninitialized",
            Lifecycle::Loaded => "loaded",
            Lifecycle::Dirty => "dirty",
            Lifecycle::Saved => "saved",
            Lifecycle::Reset => "reset",
        }
    }
}

impl fmt::Display for Lifecycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A message the user must acknowledge
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub message: String,
}

impl Notice {
    fn from_error(err: &EditorError) -> Self {
        Self {
            message: err.user_message(),
        }
    }
}

/// What a key event did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyOutcome {
    /// Left to the host's default behavior
    Ignored,
    Handled,
    ObjectDeleted(ObjectId),
}

/// Printable projection of the session
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportView {
    pub title: String,
    pub author: String,
    pub markup: String,
}

/// One open document bound to a store and a selection host
pub struct EditorSession<S: KeyValueStore, H: SelectionHost> {
    document: Document,
    title: String,
    author: String,
    persistence: PersistenceStore<S>,
    selection: SelectionTracker<H>,
    objects: ObjectManager,
    decodes: DecodeQueue,
    history: History,
    /// Style for the next typed text at a collapsed caret
    typing_style: Option<(Position, InlineStyle)>,
    lifecycle: Lifecycle,
    settings: SettingsRegistry,
    config: EditorConfig,
    notices: Vec<Notice>,
    log: SessionLog,
}

impl<S: KeyValueStore, H: SelectionHost> EditorSession<S, H> {
    /// Opens a session with default settings plus any persisted overrides.
    pub fn open(store: S, host: H) -> Self {
        Self::open_with_settings(store, host, create_default_registry())
    }

    /// Opens a session and loads the saved document.
    ///
    /// Never fails: unreadable data falls back to an empty document and a
    /// notice.
    pub fn open_with_settings(store: S, host: H, mut settings: SettingsRegistry) -> Self {
        let settings_key = EditorConfig::from_registry(&settings).settings_key;
        let stored = store.get(&settings_key);
        let rejected = match &stored {
            Ok(Some(bytes)) => settings.import_overrides(load_overrides_safe(bytes).to_overrides()),
            _ => Vec::new(),
        };

        let mut config = EditorConfig::from_registry(&settings);
        // Overrides cannot relocate themselves
        config.settings_key = settings_key;

        let mut log = SessionLog::new(config.log_capacity);
        if let Err(err) = &stored {
            log.record(
                LogEntry::new(LogLevel::Warn, "settings unavailable")
                    .with_source("settings")
                    .with_field("error", err),
            );
        }
        for key in rejected {
            log.record(
                LogEntry::new(LogLevel::Warn, "setting override rejected")
                    .with_source("settings")
                    .with_field("key", key.as_str()),
            );
        }

        let mut session = Self {
            document: Document::new(),
            title: String::new(),
            author: String::new(),
            persistence: PersistenceStore::with_key(store, config.document_key.clone()),
            selection: SelectionTracker::new(host),
            objects: ObjectManager::new(),
            decodes: DecodeQueue::new(),
            history: History::new(config.undo_limit),
            typing_style: None,
            lifecycle: Lifecycle::Uninitialized,
            settings,
            config,
            notices: Vec::new(),
            log,
        };
        session.load();
        session
    }

    fn load(&mut self) {
        let loaded = self
            .persistence
            .load()
            .map_err(EditorError::from)
            .and_then(|snapshot| match snapshot {
                Some(snapshot) => Document::from_content(&snapshot.content)
                    .map(|document| Some((snapshot, document)))
                    .map_err(EditorError::from),
                None => Ok(None),
            });

        match loaded {
            Ok(Some((snapshot, document))) => {
                self.document = document;
                self.title = snapshot.title;
                self.author = snapshot.author;
                self.log.record(
                    LogEntry::new(LogLevel::Info, "document loaded")
                        .with_source("persistence")
                        .with_field("blocks", self.document.block_count())
                        .with_field("objects", self.document.objects().len()),
                );
            }
            Ok(None) => {
                self.log.record(
                    LogEntry::new(LogLevel::Debug, "no saved document").with_source("persistence"),
                );
            }
            Err(err) => {
                self.document = Document::new();
                self.title.clear();
                self.author.clear();
                self.log.record(
                    LogEntry::new(LogLevel::Warn, "saved document unreadable")
                        .with_source("persistence")
                        .with_field("error", &err),
                );
                if matches!(err, EditorError::Corrupt(_)) {
                    self.notices.push(Notice::from_error(&err));
                }
            }
        }
        self.transition(Lifecycle::Loaded);
    }

    fn transition(&mut self, next: Lifecycle) {
        if self.lifecycle == next {
            return;
        }
        self.log.record(
            LogEntry::new(LogLevel::Debug, "lifecycle")
                .with_source("session")
                .with_field("from", self.lifecycle)
                .with_field("to", next),
        );
        self.lifecycle = next;
    }

    /// Writes the snapshot. A failed write is logged and the session stays
    /// dirty so a later save can retry.
    pub fn save(&mut self) -> bool {
        let content = match self.document.to_content() {
            Ok(content) => content,
            Err(err) => {
                self.log.record(
                    LogEntry::new(LogLevel::Error, "document serialization failed")
                        .with_source("persistence")
                        .with_field("error", err),
                );
                return false;
            }
        };

        let snapshot = Snapshot::new(self.title.clone(), self.author.clone(), content);
        match self.persistence.save(&snapshot) {
            Ok(()) => {
                self.log.record(
                    LogEntry::new(LogLevel::Debug, "saved")
                        .with_source("persistence")
                        .with_field("key", self.persistence.key()),
                );
                self.transition(Lifecycle::Saved);
                true
            }
            Err(err) => {
                self.log.record(
                    LogEntry::new(LogLevel::Error, "save failed")
                        .with_source("persistence")
                        .with_field("error", err),
                );
                false
            }
        }
    }

    fn checkpoint(&self) -> HistoryEntry {
        HistoryEntry {
            document: self.document.clone(),
            caret: self
                .selection
                .resolve(&self.document)
                .as_text()
                .map(|range| range.start()),
        }
    }

    fn commit(&mut self, before: HistoryEntry) {
        self.history.record(before);
        self.objects.reconcile(&self.document);
        self.typing_style = None;
        self.transition(Lifecycle::Dirty);
        self.save();
    }

    /// Swaps in an edited document and places the caret
    fn replace_document(&mut self, working: Document, removed: &[EmbeddedObject], caret: Position) {
        let before = self.checkpoint();
        self.document = working;
        self.objects.forget_removed(removed);
        self.selection.set_caret(caret);
        self.commit(before);
    }

    /// Logs a user-facing failure and queues its notice
    fn reject(&mut self, source: &str, err: EditorError) -> EditorError {
        self.log.record(
            LogEntry::new(LogLevel::Warn, "operation rejected")
                .with_source(source)
                .with_field("error", &err),
        );
        self.notices.push(Notice::from_error(&err));
        err
    }

    fn log_selection(&mut self, change: SelectionChange) {
        if let Some(previous) = change.deselected {
            self.log.record(
                LogEntry::new(LogLevel::Debug, "object deselected")
                    .with_source("objects")
                    .with_field("id", previous),
            );
        }
        self.log.record(
            LogEntry::new(LogLevel::Debug, "object selected")
                .with_source("objects")
                .with_field("id", change.selected),
        );
    }

    /// Resolves the host selection, bringing the object selection in line
    /// with what the host reports.
    pub fn selection(&mut self) -> SelectionState {
        let state = self.selection.resolve(&self.document);
        match state {
            SelectionState::Object(id) if !self.objects.is_selected(id) => {
                if let Ok(change) = self.objects.select(&self.document, id) {
                    self.log_selection(change);
                }
            }
            SelectionState::Object(_) => {}
            SelectionState::Text(_) | SelectionState::None => {
                if let Some(previous) = self.objects.clear_selection() {
                    self.log.record(
                        LogEntry::new(LogLevel::Debug, "object deselected")
                            .with_source("objects")
                            .with_field("id", previous),
                    );
                }
            }
        }
        state
    }

    /// Where inserted content goes: the text selection, or the slot after a
    /// selected object.
    fn insertion_range(&mut self) -> Option<TextRange> {
        match self.selection() {
            SelectionState::Text(range) => Some(range),
            SelectionState::Object(id) => self.document.position_after(id).map(TextRange::collapsed),
            SelectionState::None => None,
        }
    }

    fn typing_style_for(&self, range: TextRange) -> InlineStyle {
        if let Some((at, style)) = &self.typing_style {
            if range.is_collapsed() && *at == range.start() {
                return style.clone();
            }
        }
        let start = range.start();
        let probe = if range.is_collapsed() {
            start
        } else {
            Position::new(start.block, start.offset + 1)
        };
        let mut style = self.document.style_at(probe);
        // Typed text never extends a link
        style.link = None;
        style
    }

    // ---- Formatting ----

    /// Applies a formatting command to the current text selection.
    pub fn apply(&mut self, command: &CommandKind) -> EditorResult<()> {
        let range = match self.selection() {
            SelectionState::Text(range) => range,
            _ => return Err(self.reject("commands", EditorError::NoSelection)),
        };

        let typing = self.typing_style_for(range);
        let mut working = self.document.clone();
        match commands::execute(command, &mut working, range, &typing) {
            Ok(CommandOutcome::Applied) => {
                let before = self.checkpoint();
                self.document = working;
                self.log.record(
                    LogEntry::new(LogLevel::Debug, "command applied")
                        .with_source("commands")
                        .with_field("command", command.name()),
                );
                self.commit(before);
                Ok(())
            }
            Ok(CommandOutcome::TypingStyle(style)) => {
                self.typing_style = Some((range.start(), style));
                self.log.record(
                    LogEntry::new(LogLevel::Debug, "typing style set")
                        .with_source("commands")
                        .with_field("command", command.name()),
                );
                self.transition(Lifecycle::Dirty);
                self.save();
                Ok(())
            }
            Err(err) => Err(self.reject("commands", err)),
        }
    }

    /// Parses and applies a toolbar intent such as `("fontSize", "20px")`.
    pub fn apply_intent(&mut self, action: &str, value: Option<&str>) -> EditorResult<()> {
        match CommandKind::parse(action, value) {
            Ok(command) => self.apply(&command),
            Err(err) => Err(self.reject("commands", EditorError::InvalidValue(err.to_string()))),
        }
    }

    // ---- Text editing ----

    /// Replaces the text selection with `text`.
    pub fn insert_text(&mut self, text: &str) -> EditorResult<Position> {
        let range = self
            .selection()
            .as_text()
            .ok_or(EditorError::NoSelection)?;
        let style = self.typing_style_for(range);

        let mut working = self.document.clone();
        let removed = working.delete_range(range)?;
        let caret = working.insert_text(range.start(), text, style)?;
        self.replace_document(working, &removed, caret);
        Ok(caret)
    }

    fn delete_text(&mut self, range: TextRange) -> EditorResult<()> {
        let mut working = self.document.clone();
        let removed = working.delete_range(range)?;
        self.replace_document(working, &removed, range.start());
        Ok(())
    }

    fn split_at(&mut self, range: TextRange) -> EditorResult<()> {
        let mut working = self.document.clone();
        let removed = working.delete_range(range)?;
        let caret = working.split_block(range.start())?;
        self.replace_document(working, &removed, caret);
        Ok(())
    }

    /// Turns a list item back into a paragraph
    fn leave_list(&mut self, at: Position) -> EditorResult<bool> {
        let in_list = self
            .document
            .text_block(at.block)
            .is_some_and(|text| matches!(text.format.kind, BlockKind::ListItem { .. }));
        if !in_list {
            return Ok(false);
        }
        let mut working = self.document.clone();
        working.update_format(TextRange::collapsed(at), |format| {
            format.kind = BlockKind::Paragraph
        })?;
        self.replace_document(working, &[], at);
        Ok(true)
    }

    fn edited(&mut self, result: EditorResult<()>) -> KeyOutcome {
        match result {
            Ok(()) => KeyOutcome::Handled,
            Err(err) => {
                self.log.record(
                    LogEntry::new(LogLevel::Warn, "edit failed")
                        .with_source("session")
                        .with_field("error", err),
                );
                KeyOutcome::Ignored
            }
        }
    }

    fn select_adjacent(&mut self, id: ObjectId) -> KeyOutcome {
        match self.select_object(id) {
            Ok(()) => KeyOutcome::Handled,
            Err(_) => KeyOutcome::Ignored,
        }
    }

    fn backspace(&mut self, range: TextRange) -> KeyOutcome {
        if !range.is_collapsed() {
            let result = self.delete_text(range);
            return self.edited(result);
        }

        let at = range.start();
        if at.offset > 0 {
            let result = self.delete_text(TextRange::new(Position::new(at.block, at.offset - 1), at));
            return self.edited(result);
        }
        match self.leave_list(at) {
            Ok(true) => return KeyOutcome::Handled,
            Ok(false) => {}
            Err(err) => return self.edited(Err(err)),
        }

        let Some(previous) = at.block.checked_sub(1) else {
            return KeyOutcome::Ignored;
        };
        match self.document.block(previous) {
            Some(Block::Text(text)) => {
                let end = Position::new(previous, text.len());
                let result = self.delete_text(TextRange::new(end, at));
                self.edited(result)
            }
            // Backing into a table selects it rather than deleting it
            Some(Block::Object(object)) => {
                let id = object.id;
                self.select_adjacent(id)
            }
            None => KeyOutcome::Ignored,
        }
    }

    fn delete_forward(&mut self, range: TextRange) -> KeyOutcome {
        if !range.is_collapsed() {
            let result = self.delete_text(range);
            return self.edited(result);
        }

        let at = range.start();
        let len = self.document.text_block(at.block).map_or(0, TextBlock::len);
        if at.offset < len {
            let result = self.delete_text(TextRange::new(at, Position::new(at.block, at.offset + 1)));
            return self.edited(result);
        }
        match self.document.block(at.block + 1) {
            Some(Block::Text(_)) => {
                let result = self.delete_text(TextRange::new(at, Position::new(at.block + 1, 0)));
                self.edited(result)
            }
            Some(Block::Object(object)) => {
                let id = object.id;
                self.select_adjacent(id)
            }
            None => KeyOutcome::Ignored,
        }
    }

    // ---- Input ----

    pub fn handle_input(&mut self, event: &InputEvent) -> KeyOutcome {
        match event {
            InputEvent::Key(key) => self.handle_key(key),
            InputEvent::Text(text) => match self.insert_text(text) {
                Ok(_) => KeyOutcome::Handled,
                Err(_) => KeyOutcome::Ignored,
            },
        }
    }

    /// Routes a key event. A selected object takes Delete and Backspace
    /// before any text handling sees them.
    pub fn handle_key(&mut self, event: &KeyEvent) -> KeyOutcome {
        if !event.is_actionable() {
            return KeyOutcome::Ignored;
        }
        if let Some(outcome) = self.handle_shortcut(event) {
            return outcome;
        }

        match self.selection() {
            SelectionState::Object(id) => self.handle_object_key(id, event),
            SelectionState::Text(range) => self.handle_text_key(range, event),
            SelectionState::None => KeyOutcome::Ignored,
        }
    }

    fn handle_shortcut(&mut self, event: &KeyEvent) -> Option<KeyOutcome> {
        let modifiers = event.modifiers;
        if !modifiers.is_command() {
            return None;
        }

        let command = if event.is_shortcut('b') {
            CommandKind::Bold
        } else if event.is_shortcut('i') {
            CommandKind::Italic
        } else if event.is_shortcut('u') {
            CommandKind::Underline
        } else if event.is_shortcut('z') {
            let changed = if modifiers.is_shift() {
                self.redo()
            } else {
                self.undo()
            };
            return Some(handled_if(changed));
        } else if event.is_shortcut('y') {
            return Some(handled_if(self.redo()));
        } else {
            return Some(KeyOutcome::Ignored);
        };

        Some(handled_if(self.apply(&command).is_ok()))
    }

    fn handle_object_key(&mut self, id: ObjectId, event: &KeyEvent) -> KeyOutcome {
        match event.code {
            KeyCode::Delete | KeyCode::Backspace => match self.delete_object(id) {
                Ok(()) => KeyOutcome::ObjectDeleted(id),
                Err(_) => KeyOutcome::Ignored,
            },
            KeyCode::Escape => handled_if(self.deselect_object(id)),
            _ => KeyOutcome::Ignored,
        }
    }

    fn handle_text_key(&mut self, range: TextRange, event: &KeyEvent) -> KeyOutcome {
        if let Some(ch) = event.typed_char() {
            let mut buf = [0u8; 4];
            return handled_if(self.insert_text(ch.encode_utf8(&mut buf)).is_ok());
        }
        match event.code {
            KeyCode::Backspace => self.backspace(range),
            KeyCode::Delete => self.delete_forward(range),
            KeyCode::Enter => {
                let result = self.split_at(range);
                self.edited(result)
            }
            KeyCode::Tab => {
                let command = if event.modifiers.is_shift() {
                    CommandKind::Outdent
                } else {
                    CommandKind::Indent
                };
                handled_if(self.apply(&command).is_ok())
            }
            _ => KeyOutcome::Ignored,
        }
    }

    // ---- Embedded objects ----

    /// Inserts an empty `rows` x `cols` table at the insertion point.
    pub fn insert_table(&mut self, rows: i64, cols: i64) -> EditorResult<ObjectId> {
        let (rows, cols) = match table_dimensions(rows, cols, self.config.max_table_dimension) {
            Ok(dims) => dims,
            Err(err) => return Err(self.reject("objects", err)),
        };
        let Some(range) = self.insertion_range() else {
            return Err(self.reject("objects", EditorError::NoSelection));
        };

        let before = self.checkpoint();
        let id = match self.objects.insert_table(&mut self.document, range, rows, cols) {
            Ok((id, _)) => id,
            Err(err) => return Err(self.reject("objects", err)),
        };
        self.selection
            .collapse_after(&self.document, ContentRef::Object(id));
        self.log.record(
            LogEntry::new(LogLevel::Info, "table inserted")
                .with_source("objects")
                .with_field("id", id)
                .with_field("rows", rows)
                .with_field("cols", cols),
        );
        self.commit(before);
        Ok(id)
    }

    /// Starts inserting an image from picker data. Returns `None` without
    /// touching anything when there is no data.
    ///
    /// Under the `request` anchor policy the current selection is captured
    /// now; under `completion` the selection at decode completion is used.
    pub fn begin_image_insert(&mut self, data: &[u8]) -> Option<DecodeTicket> {
        if data.is_empty() {
            self.log.record(
                LogEntry::new(LogLevel::Debug, "image insert without data").with_source("objects"),
            );
            return None;
        }

        let anchor = match self.config.insertion_anchor {
            InsertionAnchor::Request => self.insertion_range(),
            InsertionAnchor::Completion => None,
        };
        let ticket = self.decodes.enqueue(data.to_vec(), anchor);
        self.log.record(
            LogEntry::new(LogLevel::Debug, "image decode queued")
                .with_source("objects")
                .with_field("ticket", ticket.id())
                .with_field("bytes", data.len()),
        );
        Some(ticket)
    }

    /// Finishes one queued decode. Undecodable data is dropped silently.
    pub fn complete_image_decode(&mut self, ticket: DecodeTicket) -> Option<ObjectId> {
        let pending = self.decodes.take(ticket)?;
        self.finish_decode(pending)
    }

    /// Finishes every queued decode in request order
    pub fn complete_pending_decodes(&mut self) -> Vec<ObjectId> {
        self.decodes
            .take_all()
            .into_iter()
            .filter_map(|pending| self.finish_decode(pending))
            .collect()
    }

    pub fn pending_decodes(&self) -> usize {
        self.decodes.len()
    }

    fn finish_decode(&mut self, pending: PendingDecode) -> Option<ObjectId> {
        let ticket = pending.ticket.id();
        let image = match decode_image(&pending.data, self.config.image_width, self.config.image_height)
        {
            Ok(image) => image,
            Err(err) => {
                self.log.record(
                    LogEntry::new(LogLevel::Warn, "image decode failed")
                        .with_source("objects")
                        .with_field("ticket", ticket)
                        .with_field("error", err),
                );
                return None;
            }
        };

        // A captured anchor that no longer exists falls back to the live selection
        let captured = pending
            .anchor
            .filter(|range| self.document.validate_range(*range).is_ok());
        let Some(range) = captured.or_else(|| self.insertion_range()) else {
            self.log.record(
                LogEntry::new(LogLevel::Warn, "no insertion point for image")
                    .with_source("objects")
                    .with_field("ticket", ticket),
            );
            return None;
        };

        let (width, height) = (image.display_width, image.display_height);
        let before = self.checkpoint();
        match self.objects.insert_image(&mut self.document, range, image) {
            Ok((id, _)) => {
                self.selection
                    .collapse_after(&self.document, ContentRef::Object(id));
                self.log.record(
                    LogEntry::new(LogLevel::Info, "image inserted")
                        .with_source("objects")
                        .with_field("id", id)
                        .with_field("ticket", ticket)
                        .with_field("width", width)
                        .with_field("height", height),
                );
                self.commit(before);
                Some(id)
            }
            Err(err) => {
                self.log.record(
                    LogEntry::new(LogLevel::Warn, "image insert failed")
                        .with_source("objects")
                        .with_field("error", err),
                );
                None
            }
        }
    }

    /// Selects an object, deselecting any other.
    pub fn select_object(&mut self, id: ObjectId) -> EditorResult<()> {
        let change = match self.objects.select(&self.document, id) {
            Ok(change) => change,
            Err(err) => return Err(self.reject("objects", err)),
        };
        self.selection.select_object(id);
        self.log_selection(change);
        Ok(())
    }

    /// Deselects `id` and collapses the caret just after it. Returns
    /// `false` when `id` was not selected.
    pub fn deselect_object(&mut self, id: ObjectId) -> bool {
        if !self.objects.deselect(id) {
            return false;
        }
        self.selection
            .collapse_after(&self.document, ContentRef::Object(id));
        self.log.record(
            LogEntry::new(LogLevel::Debug, "object deselected")
                .with_source("objects")
                .with_field("id", id),
        );
        true
    }

    /// Removes an object; the caret lands where it was.
    pub fn delete_object(&mut self, id: ObjectId) -> EditorResult<()> {
        let before = self.checkpoint();
        let (removed, caret) = match self.objects.delete(&mut self.document, id) {
            Ok(result) => result,
            Err(err) => return Err(self.reject("objects", err)),
        };
        self.selection.set_caret(caret);
        self.log.record(
            LogEntry::new(LogLevel::Info, "object deleted")
                .with_source("objects")
                .with_field("id", id)
                .with_field("kind", removed.kind()),
        );
        self.commit(before);
        Ok(())
    }

    pub fn resize_image(&mut self, id: ObjectId, width: u32, height: u32) -> EditorResult<()> {
        let before = self.checkpoint();
        if let Err(err) = self
            .objects
            .resize_image(&mut self.document, id, width, height)
        {
            return Err(self.reject("objects", err));
        }
        self.commit(before);
        Ok(())
    }

    pub fn set_cell_text(
        &mut self,
        table: ObjectId,
        row: usize,
        col: usize,
        text: &str,
    ) -> EditorResult<()> {
        let mut working = self.document.clone();
        if let Err(err) = working.set_cell_text(table, row, col, text) {
            return Err(self.reject("objects", err.into()));
        }
        let before = self.checkpoint();
        self.document = working;
        self.commit(before);
        Ok(())
    }

    pub fn selected_object(&self) -> Option<ObjectId> {
        self.objects.selected()
    }

    /// The object whose delete control is visible, if any
    pub fn delete_affordance(&self) -> Option<ObjectId> {
        self.objects.delete_affordance()
    }

    // ---- History ----

    pub fn undo(&mut self) -> bool {
        let current = self.checkpoint();
        match self.history.undo(current) {
            Some(entry) => {
                self.restore(entry, "undo");
                true
            }
            None => false,
        }
    }

    pub fn redo(&mut self) -> bool {
        let current = self.checkpoint();
        match self.history.redo(current) {
            Some(entry) => {
                self.restore(entry, "redo");
                true
            }
            None => false,
        }
    }

    fn restore(&mut self, entry: HistoryEntry, action: &str) {
        self.document = entry.document;
        self.objects.reconcile(&self.document);
        self.typing_style = None;
        let landed = entry.caret.and_then(|caret| {
            self.selection
                .collapse_after(&self.document, ContentRef::Position(caret))
        });
        if landed.is_none() {
            self.selection.clear();
        }
        self.log.record(LogEntry::new(LogLevel::Debug, action).with_source("history"));
        self.transition(Lifecycle::Dirty);
        self.save();
    }

    pub fn undo_depth(&self) -> usize {
        self.history.undo_depth()
    }

    pub fn redo_depth(&self) -> usize {
        self.history.redo_depth()
    }

    // ---- Search ----

    /// Selects the next match after the selection, wrapping at the end.
    pub fn find_next(&mut self, query: &str) -> Option<TextRange> {
        let from = match self.selection() {
            SelectionState::Text(range) => range.end(),
            SelectionState::Object(id) => self
                .document
                .position_after(id)
                .unwrap_or_else(Position::zero),
            SelectionState::None => Position::zero(),
        };
        let found = self.document.find_from(query, from);
        match found {
            Some(range) => self.selection.select_range(range),
            None => self.log.record(
                LogEntry::new(LogLevel::Debug, "no match")
                    .with_source("search")
                    .with_field("query", query),
            ),
        }
        found
    }

    /// Replaces every occurrence of `query`. Returns the number replaced.
    pub fn replace_all(&mut self, query: &str, replacement: &str) -> usize {
        let mut working = self.document.clone();
        let count = working.replace_all(query, replacement);
        if count == 0 {
            return 0;
        }

        let before = self.checkpoint();
        self.document = working;
        if let Some(caret) = before.caret {
            self.selection
                .collapse_after(&self.document, ContentRef::Position(caret));
        }
        self.log.record(
            LogEntry::new(LogLevel::Info, "replaced")
                .with_source("search")
                .with_field("count", count),
        );
        self.commit(before);
        count
    }

    // ---- Metadata ----

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
        self.transition(Lifecycle::Dirty);
        self.save();
    }

    pub fn set_author(&mut self, author: impl Into<String>) {
        self.author = author.into();
        self.transition(Lifecycle::Dirty);
        self.save();
    }

    /// Clears the stored snapshot and starts over with an empty document.
    pub fn reset(&mut self) {
        self.transition(Lifecycle::Reset);
        if let Err(err) = self.persistence.clear() {
            self.log.record(
                LogEntry::new(LogLevel::Warn, "could not clear saved document")
                    .with_source("persistence")
                    .with_field("error", err),
            );
        }

        self.document = Document::new();
        self.title.clear();
        self.author.clear();
        self.objects.clear_selection();
        self.decodes.clear();
        self.history.clear();
        self.typing_style = None;
        self.selection.set_caret(Position::zero());
        self.log
            .record(LogEntry::new(LogLevel::Info, "document reset").with_source("session"));
        self.transition(Lifecycle::Loaded);
    }

    // ---- Settings ----

    /// Overrides a setting and persists the override set.
    ///
    /// Storage keys and the undo limit take effect from the next open.
    pub fn update_setting(&mut self, key: &str, value: SettingValue) -> EditorResult<()> {
        if let Err(err) = self.settings.set_override(key, value) {
            return Err(self.reject("settings", EditorError::InvalidValue(err.to_string())));
        }

        let mut config = EditorConfig::from_registry(&self.settings);
        config.settings_key = self.config.settings_key.clone();
        config.document_key = self.config.document_key.clone();
        config.undo_limit = self.config.undo_limit;
        config.log_capacity = self.config.log_capacity;
        self.config = config;
        self.persist_settings();
        Ok(())
    }

    /// Switches between light and dark and remembers the choice.
    pub fn toggle_theme(&mut self) -> Theme {
        let theme = self.config.theme.toggled();
        let value = SettingValue::String(theme.as_str().to_string());
        if self.update_setting(keys::UI_THEME, value).is_err() {
            return self.config.theme;
        }
        theme
    }

    fn persist_settings(&mut self) {
        let data = SettingsOverridesData::from_overrides(&self.settings.export_overrides());
        let bytes = match serialize_overrides(&data) {
            Ok(bytes) => bytes,
            Err(err) => {
                self.log.record(
                    LogEntry::new(LogLevel::Error, "settings serialization failed")
                        .with_source("settings")
                        .with_field("error", err),
                );
                return;
            }
        };

        let key = self.config.settings_key.clone();
        match self.persistence.store_mut().set(&key, &bytes) {
            Ok(()) => self.log.record(
                LogEntry::new(LogLevel::Debug, "settings saved")
                    .with_source("settings")
                    .with_field("overrides", data.overrides.len()),
            ),
            Err(err) => self.log.record(
                LogEntry::new(LogLevel::Warn, "settings not saved")
                    .with_source("settings")
                    .with_field("error", err),
            ),
        }
    }

    pub fn theme(&self) -> Theme {
        self.config.theme
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn settings(&self) -> &SettingsRegistry {
        &self.settings
    }

    // ---- Views ----

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn author(&self) -> &str {
        &self.author
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    pub fn word_count(&self) -> usize {
        self.document.word_count()
    }

    pub fn markup_view(&self) -> String {
        markup::to_markup(&self.document)
    }

    pub fn plain_text_view(&self) -> String {
        markup::to_plain_text(&self.document)
    }

    /// Title, author and rendered body for printing or export
    pub fn exportable_view(&self) -> ExportView {
        ExportView {
            title: self.title.clone(),
            author: self.author.clone(),
            markup: self.markup_view(),
        }
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            lifecycle: self.lifecycle,
            title: self.title.clone(),
            author: self.author.clone(),
            markup: self.markup_view(),
            selection: self.selection.resolve(&self.document).as_text(),
            object_selected: self.objects.selected().is_some(),
            object_count: self.document.objects().len(),
            undo_depth: self.history.undo_depth(),
            redo_depth: self.history.redo_depth(),
            pending_decodes: self.decodes.len(),
        }
    }

    // ---- Host access ----

    pub fn host(&self) -> &H {
        self.selection.host()
    }

    pub fn host_mut(&mut self) -> &mut H {
        self.selection.host_mut()
    }

    pub fn store(&self) -> &S {
        self.persistence.store()
    }

    pub fn store_mut(&mut self) -> &mut S {
        self.persistence.store_mut()
    }

    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }

    pub fn drain_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    pub fn log(&self) -> &SessionLog {
        &self.log
    }
}

fn handled_if(changed: bool) -> KeyOutcome {
    if changed {
        KeyOutcome::Handled
    } else {
        KeyOutcome::Ignored
    }
}
