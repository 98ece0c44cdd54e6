//! Decorations, suggestion popups and in-place edits

use super::scanner::{DocumentHost, ElementId, ElementState};
use crate::error::{Result, WriteRightError};
use crate::settings::Settings;
use crate::types::{char_len, splice_chars, IssueCategory, Match, Preview, Severity};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

/// Underline over one match; `index` is the click target into the match list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Decoration {
    pub index: usize,
    pub offset: usize,
    pub length: usize,
    pub color: String,
    pub severity: Severity,
    pub category: IssueCategory,
    pub tooltip: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuggestionPopup {
    pub index: usize,
    pub title: String,
    pub message: String,
    pub replacements: Vec<String>,
    pub preview: Option<Preview>,
}

/// Outcome of applying a replacement
#[derive(Debug, Clone, PartialEq)]
pub struct AppliedEdit {
    pub text: String,
    /// Char offset just past the inserted replacement
    pub cursor: usize,
    pub applied: Match,
}

#[derive(Debug, Clone)]
pub struct HighlightRenderer {
    error_color: String,
    suggestion_color: String,
    show_tooltip: bool,
    max_suggestions: usize,
    shown: HashMap<ElementId, Vec<Decoration>>,
}

impl HighlightRenderer {
    pub fn new(settings: &Settings, max_suggestions: usize) -> Self {
        Self {
            error_color: settings.error_color.clone(),
            suggestion_color: settings.suggestion_color.clone(),
            show_tooltip: settings.show_tooltip,
            max_suggestions,
            shown: HashMap::new(),
        }
    }

    fn color_for(&self, severity: Severity) -> &str {
        match severity {
            Severity::Error => &self.error_color,
            Severity::Warning | Severity::Info => &self.suggestion_color,
        }
    }

    /// Replace the element's decorations with one per match
    pub fn render(&mut self, host: &dyn DocumentHost, id: ElementId, matches: &[Match]) {
        let decorations: Vec<Decoration> = matches
            .iter()
            .enumerate()
            .map(|(index, m)| Decoration {
                index,
                offset: m.offset,
                length: m.length,
                color: self.color_for(m.severity).to_string(),
                severity: m.severity,
                category: m.category,
                tooltip: self.show_tooltip.then(|| m.message.clone()),
            })
            .collect();

        host.paint(id, &decorations);
        if decorations.is_empty() {
            self.shown.remove(&id);
        } else {
            self.shown.insert(id, decorations);
        }
    }

    pub fn clear(&mut self, host: &dyn DocumentHost, id: ElementId) {
        if self.shown.remove(&id).is_some() {
            host.paint(id, &[]);
        }
    }

    pub fn clear_all(&mut self, host: &dyn DocumentHost) {
        for (id, _) in self.shown.drain() {
            host.paint(id, &[]);
        }
    }

    pub fn decorations(&self, id: ElementId) -> &[Decoration] {
        self.shown.get(&id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn popup(&self, state: &ElementState, index: usize) -> Option<SuggestionPopup> {
        let m = state.matches.get(index)?;
        let title = if m.rule.category.name.is_empty() {
            title_case(m.category.as_str())
        } else {
            m.rule.category.name.clone()
        };

        Some(SuggestionPopup {
            index,
            title,
            message: m.message.clone(),
            replacements: m
                .replacements
                .iter()
                .take(self.max_suggestions)
                .map(|r| r.value.clone())
                .collect(),
            preview: m.preview.clone(),
        })
    }

    /// Drop match `index` without editing the text
    pub fn ignore(
        &mut self,
        host: &dyn DocumentHost,
        id: ElementId,
        state: &mut ElementState,
        index: usize,
    ) -> Option<Match> {
        if index >= state.matches.len() {
            return None;
        }
        let removed = state.matches.remove(index);
        self.render(host, id, &state.matches);
        Some(removed)
    }
}

/// Text and matches after splicing a suggestion, not yet written anywhere
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedEdit {
    pub edit: AppliedEdit,
    /// Matches left over, shifted to the new text
    pub remaining: Vec<Match>,
}

/// Splice `replacement` over match `index` of `current`
///
/// Fails if `current` is not the text the matches were computed for.
/// Matches after the edit are shifted; ones overlapping the replaced span
/// are dropped. Touches neither the host nor `state`.
pub fn plan_suggestion(
    state: &ElementState,
    id: ElementId,
    current: &str,
    index: usize,
    replacement: &str,
) -> Result<PlannedEdit> {
    let target = state
        .matches
        .get(index)
        .cloned()
        .ok_or_else(|| WriteRightError::InvalidInput(format!("no suggestion {} on {}", index, id)))?;

    if state.checked_text.as_deref() != Some(current) {
        return Err(WriteRightError::InvalidInput(
            "text changed since it was checked".to_string(),
        ));
    }

    let text = splice_chars(current, target.offset, target.length, replacement);
    let inserted = char_len(replacement);
    let cursor = target.offset + inserted;

    let shift = inserted as isize - target.length as isize;
    let remaining: Vec<Match> = state
        .matches
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != index)
        .filter_map(|(_, m)| {
            if m.end() <= target.offset {
                Some(m.clone())
            } else if m.offset >= target.end() {
                let mut moved = m.clone();
                moved.offset = (m.offset as isize + shift) as usize;
                Some(moved)
            } else {
                None
            }
        })
        .collect();

    debug!("Planned suggestion on {}: {:?}", id, replacement);
    Ok(PlannedEdit {
        edit: AppliedEdit {
            text,
            cursor,
            applied: target,
        },
        remaining,
    })
}

fn title_case(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editor::scanner::ElementInfo;
    use crate::services::FallbackMatcher;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingHost {
        text: Mutex<String>,
        cursor: Mutex<Option<usize>>,
        painted: Mutex<Vec<usize>>,
        inputs: Mutex<usize>,
    }

    impl DocumentHost for RecordingHost {
        fn candidates(&self, _root: Option<ElementId>) -> Vec<ElementInfo> {
            vec![]
        }

        fn is_attached(&self, _id: ElementId) -> bool {
            true
        }

        fn read_text(&self, _id: ElementId) -> Option<String> {
            Some(self.text.lock().unwrap().clone())
        }

        fn write_text(&self, _id: ElementId, text: &str, cursor: usize) -> Result<()> {
            *self.text.lock().unwrap() = text.to_string();
            *self.cursor.lock().unwrap() = Some(cursor);
            Ok(())
        }

        fn dispatch_input_event(&self, _id: ElementId) {
            *self.inputs.lock().unwrap() += 1;
        }

        fn paint(&self, _id: ElementId, decorations: &[Decoration]) {
            self.painted.lock().unwrap().push(decorations.len());
        }
    }

    const ID: ElementId = ElementId(1);

    fn checked(host: &RecordingHost, text: &str) -> ElementState {
        *host.text.lock().unwrap() = text.to_string();
        let mut state = ElementState::default();
        state.record_input(text, 3);
        state.accept_result(text, FallbackMatcher::default().find(text));
        state
    }

    #[test]
    fn test_render_replaces_decorations() {
        let host = RecordingHost::default();
        let state = checked(&host, "teh cat and teh dog");
        let mut renderer = HighlightRenderer::new(&Settings::default(), 5);

        renderer.render(&host, ID, &state.matches);
        renderer.render(&host, ID, &state.matches);
        assert_eq!(renderer.decorations(ID).len(), 2);
        assert_eq!(renderer.decorations(ID)[0].color, "#ff4444");
        assert_eq!(*host.painted.lock().unwrap(), vec![2, 2]);

        renderer.clear(&host, ID);
        assert!(renderer.decorations(ID).is_empty());
        assert_eq!(host.painted.lock().unwrap().last(), Some(&0));
    }

    #[test]
    fn test_plan_suggestion_reoffsets() {
        let host = RecordingHost::default();
        let state = checked(&host, "teh recieve teh");

        let planned = plan_suggestion(&state, ID, "teh recieve teh", 0, "the one").unwrap();

        assert_eq!(planned.edit.text, "the one recieve teh");
        assert_eq!(planned.edit.cursor, 7);
        assert_eq!(planned.edit.applied.offset, 0);

        let offsets: Vec<usize> = planned.remaining.iter().map(|m| m.offset).collect();
        assert_eq!(offsets, vec![8, 16]);

        // Nothing is written until the caller commits the plan
        assert_eq!(state.matches.len(), 3);
        assert_eq!(*host.text.lock().unwrap(), "teh recieve teh");
        assert_eq!(*host.cursor.lock().unwrap(), None);
        assert_eq!(*host.inputs.lock().unwrap(), 0);
    }

    #[test]
    fn test_plan_suggestion_drops_overlapping_matches() {
        let host = RecordingHost::default();
        let mut state = checked(&host, "abcdef");
        let mut wide = FallbackMatcher::default().find("teh").remove(0);
        wide.offset = 0;
        wide.length = 4;
        let mut inner = wide.clone();
        inner.offset = 2;
        inner.length = 2;
        let mut tail = wide.clone();
        tail.offset = 5;
        tail.length = 1;
        state.matches = vec![wide, inner, tail];

        let planned = plan_suggestion(&state, ID, "abcdef", 0, "X").unwrap();
        assert_eq!(planned.edit.text, "Xef");
        let offsets: Vec<usize> = planned.remaining.iter().map(|m| m.offset).collect();
        assert_eq!(offsets, vec![2]);
    }

    #[test]
    fn test_plan_suggestion_rejects_stale_text() {
        let host = RecordingHost::default();
        let state = checked(&host, "I teh best");

        let err = plan_suggestion(&state, ID, "I teh best!", 0, "the").unwrap_err();
        assert!(matches!(err, WriteRightError::InvalidInput(_)));

        let err = plan_suggestion(&state, ID, "I teh best", 4, "the").unwrap_err();
        assert!(matches!(err, WriteRightError::InvalidInput(_)));
    }

    #[test]
    fn test_ignore_and_popup() {
        let host = RecordingHost::default();
        let mut state = checked(&host, "Teh cat, your welcome");
        let mut renderer = HighlightRenderer::new(&Settings::default(), 5);

        let popup = renderer.popup(&state, 1).unwrap();
        assert_eq!(popup.title, "grammar");
        assert_eq!(popup.replacements, vec!["you're welcome"]);
        assert!(renderer.popup(&state, 5).is_none());

        let ignored = renderer.ignore(&host, ID, &mut state, 0).unwrap();
        assert_eq!(ignored.offset, 0);
        assert_eq!(state.matches.len(), 1);
        assert_eq!(renderer.decorations(ID).len(), 1);
        assert!(renderer.ignore(&host, ID, &mut state, 3).is_none());
    }

    #[test]
    fn test_title_case() {
        assert_eq!(title_case("spelling"), "Spelling");
        assert_eq!(title_case(""), "");
    }
}
