//! Content-side orchestration for one document
//!
//! An `EditorSession` tracks the document's text fields, debounces input,
//! asks the background for checks and keeps decorations in sync with the
//! latest results.

use super::debounce::Debouncer;
use super::highlight::{
    plan_suggestion, AppliedEdit, HighlightRenderer, PlannedEdit, SuggestionPopup,
};
use super::scanner::{
    DocumentEvent, DocumentHost, ElementId, InputOutcome, ScanOptions, TextScanner,
};
use crate::config::EditorConfig;
use crate::error::{Result, WriteRightError};
use crate::settings::{Settings, StatsDelta};
use crate::types::{CheckOutcome, Match, OptionOverrides};
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// The editor side's view of the background service
#[async_trait]
pub trait BackgroundClient: Send + Sync {
    async fn check_grammar(&self, text: String, overrides: OptionOverrides)
        -> Result<CheckOutcome>;

    async fn update_stats(&self, delta: StatsDelta) -> Result<()>;

    async fn settings(&self) -> Result<Settings>;
}

struct Inner {
    host: Arc<dyn DocumentHost>,
    client: Arc<dyn BackgroundClient>,
    settings: Settings,
    config: EditorConfig,
    scanner: Mutex<TextScanner>,
    renderer: Mutex<HighlightRenderer>,
    debouncer: Debouncer<ElementId>,
    active: AtomicBool,
}

impl Inner {
    fn scanner(&self) -> MutexGuard<'_, TextScanner> {
        self.scanner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn renderer(&self) -> MutexGuard<'_, HighlightRenderer> {
        self.renderer
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Check `text` for `id` and adopt the result if the text is still current
    async fn run_check(&self, id: ElementId, text: String) -> Result<Vec<Match>> {
        let outcome = self
            .client
            .check_grammar(text.clone(), OptionOverrides::default())
            .await?;

        let matches: Vec<Match> = outcome
            .result
            .matches
            .iter()
            .filter(|m| !m.replacements.is_empty())
            .cloned()
            .collect();

        let mut scanner = self.scanner();
        let Some(state) = scanner.state_mut(id) else {
            return Ok(Vec::new());
        };
        if !state.accept_result(&text, matches.clone()) {
            debug!("Discarding result for superseded text on {}", id);
            return Ok(Vec::new());
        }
        if self.active.load(Ordering::SeqCst) {
            self.renderer().render(self.host.as_ref(), id, &state.matches);
        }
        Ok(matches)
    }
}

/// Editor session for one document
#[derive(Clone)]
pub struct EditorSession {
    inner: Arc<Inner>,
}

impl EditorSession {
    /// `site` is the document's host name, matched against `excludedSites`
    pub fn new(
        host: Arc<dyn DocumentHost>,
        client: Arc<dyn BackgroundClient>,
        settings: Settings,
        config: EditorConfig,
        site: Option<&str>,
    ) -> Self {
        let excluded = site.is_some_and(|s| settings.is_site_excluded(s));
        if excluded {
            info!("Site {:?} is excluded, session inactive", site);
        }

        let scanner = TextScanner::new(ScanOptions {
            min_width: config.min_width,
            min_height: config.min_height,
            check_passwords: settings.check_passwords,
        });
        let renderer = HighlightRenderer::new(&settings, config.max_popup_suggestions);
        let active = settings.enabled && !excluded;

        Self {
            inner: Arc::new(Inner {
                host,
                client,
                settings,
                config,
                scanner: Mutex::new(scanner),
                renderer: Mutex::new(renderer),
                debouncer: Debouncer::new(),
                active: AtomicBool::new(active),
            }),
        }
    }

    /// Fetch settings from the background, then build the session
    pub async fn connect(
        host: Arc<dyn DocumentHost>,
        client: Arc<dyn BackgroundClient>,
        config: EditorConfig,
        site: Option<&str>,
    ) -> Self {
        let settings = match client.settings().await {
            Ok(settings) => settings,
            Err(e) => {
                warn!("Could not load settings, using defaults: {}", e);
                Settings::default()
            }
        };
        Self::new(host, client, settings, config, site)
    }

    pub fn is_active(&self) -> bool {
        self.inner.active.load(Ordering::SeqCst)
    }

    /// Pause or resume; pausing drops pending checks and decorations
    pub fn set_active(&self, active: bool) {
        self.inner.active.store(active, Ordering::SeqCst);
        if !active {
            self.inner.debouncer.cancel_all();
            self.inner.renderer().clear_all(self.inner.host.as_ref());
        }
    }

    pub fn scan(&self, root: Option<ElementId>) -> Vec<ElementId> {
        self.inner.scanner().scan(self.inner.host.as_ref(), root)
    }

    pub fn tracked(&self) -> Vec<ElementId> {
        self.inner.scanner().tracked()
    }

    pub fn matches(&self, id: ElementId) -> Vec<Match> {
        self.inner
            .scanner()
            .state(id)
            .map(|s| s.matches.clone())
            .unwrap_or_default()
    }

    pub fn pending_checks(&self) -> usize {
        self.inner.debouncer.pending_count()
    }

    /// React to an input event on `id`
    ///
    /// Returns `None` when the session is inactive or the element untracked.
    pub fn handle_input(&self, id: ElementId) -> Option<InputOutcome> {
        let inner = &self.inner;
        if !self.is_active() {
            return None;
        }
        let text = inner.host.read_text(id)?;

        let outcome = inner
            .scanner()
            .state_mut(id)?
            .record_input(&text, inner.config.min_text_chars);

        match outcome {
            InputOutcome::Unchanged => {}
            InputOutcome::Cleared => {
                inner.debouncer.cancel(&id);
                inner.renderer().clear(inner.host.as_ref(), id);
            }
            InputOutcome::Changed => {
                inner.renderer().clear(inner.host.as_ref(), id);
                let delay = inner.settings.debounce_delay(
                    inner.config.realtime_debounce_ms,
                    inner.config.delayed_debounce_ms,
                );
                if let Some(delay) = delay {
                    self.schedule_check(id, text, delay);
                }
            }
        }
        Some(outcome)
    }

    fn schedule_check(&self, id: ElementId, text: String, delay: Duration) {
        let weak: Weak<Inner> = Arc::downgrade(&self.inner);
        self.inner.debouncer.schedule(id, delay, move || async move {
            let Some(inner) = weak.upgrade() else { return };
            if let Err(e) = inner.run_check(id, text).await {
                debug!("Check for {} failed: {}", id, e);
            }
        });
    }

    /// Check `id` right away, bypassing the debounce delay
    pub async fn check_now(&self, id: ElementId) -> Result<Vec<Match>> {
        let inner = &self.inner;
        inner.debouncer.cancel(&id);

        let text = inner
            .host
            .read_text(id)
            .ok_or_else(|| WriteRightError::InvalidInput(format!("element {} is detached", id)))?;

        let outcome = {
            let mut scanner = inner.scanner();
            let state = scanner.state_mut(id).ok_or_else(|| {
                WriteRightError::InvalidInput(format!("element {} is not tracked", id))
            })?;
            state.record_input(&text, inner.config.min_text_chars)
        };

        if outcome == InputOutcome::Cleared {
            inner.renderer().clear(inner.host.as_ref(), id);
            return Ok(Vec::new());
        }
        inner.run_check(id, text).await
    }

    pub fn popup(&self, id: ElementId, index: usize) -> Option<SuggestionPopup> {
        let scanner = self.inner.scanner();
        let state = scanner.state(id)?;
        self.inner.renderer().popup(state, index)
    }

    /// Apply `replacement` (or the best one) for match `index` on `id`
    pub async fn apply_suggestion(
        &self,
        id: ElementId,
        index: usize,
        replacement: Option<&str>,
    ) -> Result<AppliedEdit> {
        let inner = &self.inner;
        let not_tracked =
            || WriteRightError::InvalidInput(format!("element {} is not tracked", id));

        let current = inner
            .host
            .read_text(id)
            .ok_or_else(|| WriteRightError::InvalidInput(format!("element {} is detached", id)))?;

        // No guard may be held across host calls; input listeners re-enter the session
        let planned = {
            let scanner = inner.scanner();
            let state = scanner.state(id).ok_or_else(not_tracked)?;

            let chosen = match replacement {
                Some(r) => r.to_string(),
                None => state
                    .matches
                    .get(index)
                    .and_then(|m| m.best_replacement())
                    .map(str::to_string)
                    .ok_or_else(|| {
                        WriteRightError::InvalidInput(format!("no suggestion {} on {}", index, id))
                    })?,
            };
            plan_suggestion(state, id, &current, index, &chosen)?
        };
        let PlannedEdit { edit, remaining } = planned;

        inner.host.write_text(id, &edit.text, edit.cursor)?;

        let matches = {
            let mut scanner = inner.scanner();
            let state = scanner.state_mut(id).ok_or_else(not_tracked)?;
            state.adopt_edit(&edit.text, remaining);
            state.matches.clone()
        };
        inner.renderer().render(inner.host.as_ref(), id, &matches);

        inner.host.dispatch_input_event(id);
        debug!("Applied suggestion on {}: {:?}", id, edit.applied.rule.id);

        if let Err(e) = inner.client.update_stats(StatsDelta::accepted()).await {
            warn!("Failed to record accepted suggestion: {}", e);
        }
        Ok(edit)
    }

    pub fn ignore(&self, id: ElementId, index: usize) -> Option<Match> {
        let inner = &self.inner;
        let mut scanner = inner.scanner();
        let state = scanner.state_mut(id)?;
        inner
            .renderer()
            .ignore(inner.host.as_ref(), id, state, index)
    }

    /// Stop tracking `id` and drop anything pending for it
    pub fn forget(&self, id: ElementId) {
        let inner = &self.inner;
        inner.debouncer.cancel(&id);
        inner.renderer().clear(inner.host.as_ref(), id);
        inner.scanner().forget(id);
    }

    fn prune(&self) {
        let detached = self.inner.scanner().prune(self.inner.host.as_ref());
        for id in detached {
            self.inner.debouncer.cancel(&id);
            self.inner.renderer().clear(self.inner.host.as_ref(), id);
        }
    }

    /// Drop all tracked elements, pending checks and decorations
    pub fn reset(&self) {
        let inner = &self.inner;
        inner.debouncer.cancel_all();
        inner.renderer().clear_all(inner.host.as_ref());
        inner.scanner().reset();
    }

    /// Follow document events and rescan periodically until cancelled
    ///
    /// Runs an initial scan first. The session is reset when the loop ends.
    pub async fn watch(&self, mut events: mpsc::Receiver<DocumentEvent>, cancel: CancellationToken) {
        self.scan(None);

        let mut rescan = tokio::time::interval(self.inner.config.rescan_interval());
        rescan.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        rescan.tick().await;

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                event = events.recv() => match event {
                    Some(DocumentEvent::Inserted(root)) => {
                        self.scan(Some(root));
                    }
                    Some(DocumentEvent::Removed(id)) => self.forget(id),
                    Some(DocumentEvent::Input(id)) => {
                        self.handle_input(id);
                    }
                    None => break,
                },
                _ = rescan.tick() => {
                    if self.is_active() {
                        self.prune();
                        self.scan(None);
                    }
                }
            }
        }

        debug!("Editor session watch loop finished");
        self.reset();
    }
}
