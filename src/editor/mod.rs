//! Editor side of WriteRight
//!
//! Everything that runs next to the document being edited: field discovery,
//! input debouncing, decorations and in-place suggestion edits. The document
//! itself is reached through [`DocumentHost`].

pub mod debounce;
pub mod highlight;
pub mod scanner;
pub mod session;

pub use debounce::Debouncer;
pub use highlight::{
    plan_suggestion, AppliedEdit, Decoration, HighlightRenderer, PlannedEdit, SuggestionPopup,
};
pub use scanner::{
    DocumentEvent, DocumentHost, ElementId, ElementInfo, ElementKind, ElementState, InputOutcome,
    ScanOptions, TextScanner,
};
pub use session::{BackgroundClient, EditorSession};
