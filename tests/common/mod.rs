//! Common test utilities and helpers

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use writeright_core::{
    editor::{Decoration, ElementInfo, ElementKind, InputOutcome},
    error::{Result, WriteRightError},
    storage::DocumentStore,
    types::{Rule, RuleCategory},
    BackgroundService, CheckRequest, DocumentHost, EditorSession, ElementId, GrammarBackend, Match,
    MemoryStore, MessageRouter, WriteRightConfig,
};

/// Backend that flags every "teh" as a typo and records what it was asked
#[derive(Default)]
pub struct CountingBackend {
    requests: Mutex<Vec<CheckRequest>>,
    failing: AtomicBool,
}

impl CountingBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Backend that always fails, as if the API were unreachable
    pub fn unreachable() -> Arc<Self> {
        let backend = Self::default();
        backend.failing.store(true, Ordering::SeqCst);
        Arc::new(backend)
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn texts(&self) -> Vec<String> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .map(|r| r.text.clone())
            .collect()
    }

    pub fn last_request(&self) -> Option<CheckRequest> {
        self.requests.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl GrammarBackend for CountingBackend {
    async fn check(&self, request: &CheckRequest) -> Result<Vec<Match>> {
        self.requests.lock().unwrap().push(request.clone());
        if self.failing.load(Ordering::SeqCst) {
            return Err(WriteRightError::UpstreamUnavailable(
                "connection refused".to_string(),
            ));
        }
        Ok(typos(&request.text, "teh", "the"))
    }
}

/// Spelling matches for every occurrence of `word`, offsets in chars
pub fn typos(text: &str, word: &str, fix: &str) -> Vec<Match> {
    text.match_indices(word)
        .map(|(byte, _)| Match {
            offset: text[..byte].chars().count(),
            length: word.chars().count(),
            message: "Possible spelling mistake found.".to_string(),
            short_message: "Spelling mistake".to_string(),
            replacements: vec![fix.into()],
            rule: Rule {
                id: "MORFOLOGIK_RULE_EN_US".to_string(),
                description: "Possible spelling mistake".to_string(),
                category: RuleCategory {
                    id: "TYPOS".to_string(),
                    name: "Possible Typo".to_string(),
                },
            },
            severity: Default::default(),
            category: Default::default(),
            confidence: 0.0,
            preview: None,
        })
        .collect()
}

pub fn service_with(
    config: WriteRightConfig,
    backend: Arc<CountingBackend>,
) -> Arc<BackgroundService> {
    Arc::new(BackgroundService::new(
        config,
        backend,
        Arc::new(MemoryStore::new()),
        Arc::new(MemoryStore::new()),
    ))
}

pub fn service(backend: Arc<CountingBackend>) -> Arc<BackgroundService> {
    service_with(WriteRightConfig::default(), backend)
}

pub fn router(backend: Arc<CountingBackend>) -> MessageRouter {
    MessageRouter::new(service(backend))
}

struct FakeElement {
    info: ElementInfo,
    text: String,
    decorations: Vec<Decoration>,
}

/// In-memory document of text fields
#[derive(Default)]
pub struct FakeHost {
    elements: Mutex<BTreeMap<ElementId, FakeElement>>,
    input_events: AtomicUsize,
    listener: Mutex<Option<EditorSession>>,
    echoed: Mutex<Vec<Option<InputOutcome>>>,
}

impl FakeHost {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn add(&self, id: u64, kind: ElementKind, text: &str) -> ElementId {
        let id = ElementId(id);
        let info = ElementInfo {
            id,
            kind,
            visible: true,
            disabled: false,
            read_only: false,
            width: 400.0,
            height: 80.0,
        };
        self.elements.lock().unwrap().insert(
            id,
            FakeElement {
                info,
                text: text.to_string(),
                decorations: Vec::new(),
            },
        );
        id
    }

    pub fn add_textarea(&self, id: u64, text: &str) -> ElementId {
        self.add(id, ElementKind::TextArea, text)
    }

    /// Simulate the user typing: replaces the element's text
    pub fn type_text(&self, id: ElementId, text: &str) {
        if let Some(element) = self.elements.lock().unwrap().get_mut(&id) {
            element.text = text.to_string();
        }
    }

    pub fn remove(&self, id: ElementId) {
        self.elements.lock().unwrap().remove(&id);
    }

    pub fn text(&self, id: ElementId) -> String {
        self.read_text(id).unwrap_or_default()
    }

    pub fn decorations(&self, id: ElementId) -> Vec<Decoration> {
        self.elements
            .lock()
            .unwrap()
            .get(&id)
            .map(|e| e.decorations.clone())
            .unwrap_or_default()
    }

    pub fn input_events(&self) -> usize {
        self.input_events.load(Ordering::SeqCst)
    }

    /// Forward dispatched input events to `session` synchronously, the way
    /// a page listener would
    pub fn listen(&self, session: &EditorSession) {
        *self.listener.lock().unwrap() = Some(session.clone());
    }

    /// What the listening session made of each forwarded event
    pub fn echoed(&self) -> Vec<Option<InputOutcome>> {
        self.echoed.lock().unwrap().clone()
    }
}

impl DocumentHost for FakeHost {
    fn candidates(&self, root: Option<ElementId>) -> Vec<ElementInfo> {
        self.elements
            .lock()
            .unwrap()
            .values()
            .filter(|e| root.map_or(true, |r| r == e.info.id))
            .map(|e| e.info.clone())
            .collect()
    }

    fn is_attached(&self, id: ElementId) -> bool {
        self.elements.lock().unwrap().contains_key(&id)
    }

    fn read_text(&self, id: ElementId) -> Option<String> {
        self.elements.lock().unwrap().get(&id).map(|e| e.text.clone())
    }

    fn write_text(&self, id: ElementId, text: &str, _cursor: usize) -> Result<()> {
        let mut elements = self.elements.lock().unwrap();
        let element = elements
            .get_mut(&id)
            .ok_or_else(|| WriteRightError::InvalidInput(format!("no element {}", id)))?;
        element.text = text.to_string();
        Ok(())
    }

    fn dispatch_input_event(&self, id: ElementId) {
        self.input_events.fetch_add(1, Ordering::SeqCst);
        let listener = self.listener.lock().unwrap().clone();
        if let Some(session) = listener {
            let outcome = session.handle_input(id);
            self.echoed.lock().unwrap().push(outcome);
        }
    }

    fn paint(&self, id: ElementId, decorations: &[Decoration]) {
        if let Some(element) = self.elements.lock().unwrap().get_mut(&id) {
            element.decorations = decorations.to_vec();
        }
    }
}

/// Store that always fails, for degraded-path tests
pub fn broken_store() -> Arc<dyn DocumentStore> {
    Arc::new(MemoryStore::failing())
}
