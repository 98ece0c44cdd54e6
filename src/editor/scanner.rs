//! Discovery and per-element state of editable text fields

use crate::error::Result;
use crate::types::{char_len, Match};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

use super::highlight::Decoration;

/// Host-assigned handle of a document element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ElementId(pub u64);

impl std::fmt::Display for ElementId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ElementKind {
    TextInput,
    EmailInput,
    SearchInput,
    UrlInput,
    PasswordInput,
    TextArea,
    ContentEditable,
    /// Embedded editor widget (role=textbox, Quill, Draft.js and the like)
    RichEditor,
    Other,
}

impl ElementKind {
    fn is_editable_text(&self, check_passwords: bool) -> bool {
        match self {
            ElementKind::TextInput
            | ElementKind::EmailInput
            | ElementKind::SearchInput
            | ElementKind::UrlInput
            | ElementKind::TextArea
            | ElementKind::ContentEditable
            | ElementKind::RichEditor => true,
            ElementKind::PasswordInput => check_passwords,
            ElementKind::Other => false,
        }
    }
}

/// What the host reports about a candidate element
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementInfo {
    pub id: ElementId,
    pub kind: ElementKind,
    pub visible: bool,
    pub disabled: bool,
    pub read_only: bool,
    pub width: f32,
    pub height: f32,
}

/// The document the editor session works against
///
/// Implementations wrap a real document (browser bridge, GUI toolkit) or a
/// fake in tests. Methods are synchronous and must not block for long.
pub trait DocumentHost: Send + Sync {
    /// Candidate elements under `root`, or in the whole document for `None`
    fn candidates(&self, root: Option<ElementId>) -> Vec<ElementInfo>;

    fn is_attached(&self, id: ElementId) -> bool;

    /// Current text of the element; `None` once detached
    fn read_text(&self, id: ElementId) -> Option<String>;

    /// Replace the element's text and put the cursor at char offset `cursor`
    fn write_text(&self, id: ElementId, text: &str, cursor: usize) -> Result<()>;

    /// Fire the element's native input notification so page scripts see the edit
    ///
    /// Listeners may run synchronously and call back into the session.
    fn dispatch_input_event(&self, id: ElementId);

    /// Show `decorations` on the element, replacing any shown before
    fn paint(&self, id: ElementId, decorations: &[Decoration]);
}

/// Document change notifications consumed by the session's watch loop
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentEvent {
    /// A subtree was inserted under this element
    Inserted(ElementId),
    Removed(ElementId),
    Input(ElementId),
}

/// Result of recording an input event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputOutcome {
    /// Text too short to check; decorations should go
    Cleared,
    Unchanged,
    /// New text awaiting a check
    Changed,
}

/// Per-element check state
///
/// `matches` always describe `last_text`: recording different text drops
/// them until a check for exactly that text is accepted.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ElementState {
    pub last_text: String,
    /// Text the current matches were computed for
    pub checked_text: Option<String>,
    pub matches: Vec<Match>,
}

impl ElementState {
    pub fn record_input(&mut self, text: &str, min_chars: usize) -> InputOutcome {
        if char_len(text) < min_chars {
            self.last_text = text.to_string();
            self.invalidate();
            return InputOutcome::Cleared;
        }

        if text == self.last_text {
            return InputOutcome::Unchanged;
        }

        self.last_text = text.to_string();
        self.invalidate();
        InputOutcome::Changed
    }

    /// Adopt `matches` if `text` is still current; stale results are dropped
    pub fn accept_result(&mut self, text: &str, matches: Vec<Match>) -> bool {
        if text != self.last_text {
            return false;
        }
        self.checked_text = Some(text.to_string());
        self.matches = matches;
        true
    }

    /// Record text written by an applied suggestion along with its matches
    pub fn adopt_edit(&mut self, text: &str, matches: Vec<Match>) {
        self.last_text = text.to_string();
        self.checked_text = Some(text.to_string());
        self.matches = matches;
    }

    fn invalidate(&mut self) {
        self.checked_text = None;
        self.matches.clear();
    }
}

/// Validity thresholds for candidate elements
#[derive(Debug, Clone, PartialEq)]
pub struct ScanOptions {
    pub min_width: f32,
    pub min_height: f32,
    pub check_passwords: bool,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            min_width: 50.0,
            min_height: 20.0,
            check_passwords: false,
        }
    }
}

/// Tracks the editable elements of a document
#[derive(Debug, Default)]
pub struct TextScanner {
    options: ScanOptions,
    states: HashMap<ElementId, ElementState>,
}

impl TextScanner {
    pub fn new(options: ScanOptions) -> Self {
        Self {
            options,
            states: HashMap::new(),
        }
    }

    pub fn is_valid(&self, info: &ElementInfo) -> bool {
        info.visible
            && !info.disabled
            && !info.read_only
            && info.width > self.options.min_width
            && info.height > self.options.min_height
            && info.kind.is_editable_text(self.options.check_passwords)
    }

    /// Start tracking valid elements under `root` that are not tracked yet
    pub fn scan(&mut self, host: &dyn DocumentHost, root: Option<ElementId>) -> Vec<ElementId> {
        let mut added = Vec::new();
        for info in host.candidates(root) {
            if self.states.contains_key(&info.id) || !self.is_valid(&info) {
                continue;
            }
            self.states.insert(info.id, ElementState::default());
            added.push(info.id);
        }

        if !added.is_empty() {
            debug!("Tracking {} new text fields", added.len());
        }
        added
    }

    /// Forget elements that left the document
    pub fn prune(&mut self, host: &dyn DocumentHost) -> Vec<ElementId> {
        let detached: Vec<ElementId> = self
            .states
            .keys()
            .filter(|id| !host.is_attached(**id))
            .copied()
            .collect();
        for id in &detached {
            self.states.remove(id);
        }
        detached
    }

    pub fn forget(&mut self, id: ElementId) -> bool {
        self.states.remove(&id).is_some()
    }

    pub fn reset(&mut self) {
        self.states.clear();
    }

    pub fn is_tracked(&self, id: ElementId) -> bool {
        self.states.contains_key(&id)
    }

    pub fn tracked(&self) -> Vec<ElementId> {
        let mut ids: Vec<ElementId> = self.states.keys().copied().collect();
        ids.sort();
        ids
    }

    pub fn state(&self, id: ElementId) -> Option<&ElementState> {
        self.states.get(&id)
    }

    pub fn state_mut(&mut self, id: ElementId) -> Option<&mut ElementState> {
        self.states.get_mut(&id)
    }
}
