//! Search orchestration: keystrokes in, at most one well-timed
//! classification request out, and a small state machine for the view.
//!
//! Two independent timers drive the orchestrator:
//! - a debounce on typing, which keeps `is_typing` set until the user has
//!   paused for the debounce window;
//! - a trailing throttle on the request text, which bounds how often the
//!   classifier is called while the user types.
//!
//! All state changes go through `SearchOrchestrator::dispatch`, which is
//! only ever called from the owner's task, so actions never interleave.
//! Timer and request actions are crate-internal; callers drive the
//! orchestrator through its input methods.

pub mod request;

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::error::RequestError;
use crate::models::Intent;
use crate::service::{IntentHandler, Services};
use crate::timer::Coalescer;
use request::{Completion, DEFAULT_REQUEST_TIMEOUT, RequestController};

/// Default trailing throttle applied to request text updates.
pub const DEFAULT_THROTTLE: Duration = Duration::from_millis(250);

/// Default time `is_typing` stays set after the last keystroke.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(350);

/// Timing knobs for the orchestrator.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SearchSettings {
    pub throttle: Duration,
    pub debounce: Duration,
    pub request_timeout: Duration,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            throttle: DEFAULT_THROTTLE,
            debounce: DEFAULT_DEBOUNCE,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

/// State exposed to the view. Mutated only by the orchestrator.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SearchState {
    pub request_text: String,
    pub is_typing: bool,
    /// Set while exactly one classification request is outstanding.
    pub is_contacting: bool,
    pub response: Option<Intent>,
    pub search_visible: bool,
}

impl SearchState {
    /// Whether the busy indicator should animate.
    pub fn is_busy(&self) -> bool {
        self.is_typing || self.is_contacting
    }
}

/// Actions accepted by [`SearchOrchestrator::dispatch`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SearchAction {
    /// New request text (delivered by the throttle).
    SetRequest(String),
    StartTyping,
    /// Delivered by the typing debounce.
    StopTyping,
    /// Sends the current request text to the classifier.
    SendRequest,
    /// Terminal event of the outstanding request. `None` clears the response.
    ReceiveResponse(Option<Intent>),
    SetSearchVisible(bool),
}

/// Drives [`SearchState`] from user input, timers and request completions.
pub struct SearchOrchestrator {
    state: SearchState,
    request_throttle: Coalescer<String>,
    typing_debounce: Coalescer<()>,
    requests: RequestController,
    intent_handler: Option<Arc<dyn IntentHandler>>,
}

impl SearchOrchestrator {
    /// Creates an orchestrator using the shared service handles.
    pub fn new(services: &Services, settings: SearchSettings) -> Self {
        Self {
            state: SearchState::default(),
            request_throttle: Coalescer::throttle(settings.throttle),
            typing_debounce: Coalescer::debounce(settings.debounce),
            requests: RequestController::new(
                services.classifier.clone(),
                settings.request_timeout,
            ),
            intent_handler: services.intent_handler.clone(),
        }
    }

    /// Read-only snapshot for the view.
    pub fn state(&self) -> &SearchState {
        &self.state
    }

    /// Handles an edit of the search input: marks typing immediately and
    /// routes the text through the throttle.
    pub fn input_changed(&mut self, text: impl Into<String>) {
        self.dispatch(SearchAction::StartTyping);
        self.request_throttle.call(text.into());
    }

    /// Shows the search input.
    pub fn show(&mut self) {
        self.dispatch(SearchAction::SetSearchVisible(true));
    }

    /// Escape: always clears the shown response, and hides search if it is
    /// visible.
    pub fn escape(&mut self) {
        if self.state.search_visible {
            self.dispatch(SearchAction::SetSearchVisible(false));
        } else {
            self.requests.cancel();
            self.dispatch(SearchAction::ReceiveResponse(None));
        }
    }

    /// Enter: runs the intent handler for the shown response, if any.
    pub fn confirm(&self) {
        let Some(intent) = self.state.response.as_ref() else {
            return;
        };
        match self.intent_handler.as_ref() {
            Some(handler) => {
                info!(kind = ?intent.kind, "Handling confirmed intent");
                handler.handle_intent(intent);
            }
            None => warn!(
                reason = %RequestError::ServiceUnavailable("intent handler"),
                "Dropping confirmed intent"
            ),
        }
    }

    /// Applies one action. Actions are applied one at a time, in order.
    pub(crate) fn dispatch(&mut self, action: SearchAction) {
        debug!(?action, "Applying search action");
        match action {
            SearchAction::SetRequest(text) => {
                if text == self.state.request_text {
                    return;
                }
                self.state.request_text = text;
                if self.state.request_text.is_empty() {
                    // Nothing to classify; drop what the old text asked for.
                    self.requests.cancel();
                    self.state.is_contacting = false;
                    return;
                }
                self.dispatch(SearchAction::SendRequest);
            }
            SearchAction::StartTyping => {
                self.state.is_typing = true;
                self.typing_debounce.call(());
            }
            SearchAction::StopTyping => {
                self.state.is_typing = false;
            }
            SearchAction::SendRequest => {
                if self.requests.issue(&self.state.request_text).is_ok() {
                    self.state.is_contacting = true;
                }
            }
            SearchAction::ReceiveResponse(intent) => {
                self.state.is_contacting = self.requests.is_busy();
                self.state.response = intent;
            }
            SearchAction::SetSearchVisible(visible) => {
                self.state.search_visible = visible;
                if !visible {
                    self.teardown();
                }
            }
        }
    }

    /// Cancels timers and the outstanding request, and clears the input and
    /// the shown response. No timer or request event fires afterwards.
    fn teardown(&mut self) {
        self.request_throttle.cancel();
        self.typing_debounce.cancel();
        self.requests.cancel();
        self.state.request_text.clear();
        self.state.is_typing = false;
        self.state.is_contacting = false;
        self.state.response = None;
    }

    /// Tears everything down for good. Later requests are dropped.
    pub fn dispose(&mut self) {
        self.teardown();
        self.requests.dispose();
        info!("Search orchestrator disposed");
    }

    /// Waits for the next timer or request event, applies it and returns
    /// the action that was applied.
    ///
    /// Cancel-safe, so it can sit in a `tokio::select!` next to input and
    /// feed events. Never resolves while nothing is pending.
    pub async fn next_event(&mut self) -> SearchAction {
        let action = tokio::select! {
            text = self.request_throttle.fired() => SearchAction::SetRequest(text),
            () = self.typing_debounce.fired() => SearchAction::StopTyping,
            completion = self.requests.completion() => Self::response_for(completion),
        };
        self.dispatch(action.clone());
        action
    }

    fn response_for(completion: Completion) -> SearchAction {
        SearchAction::ReceiveResponse(completion.into_intent())
    }

    /// Whether any timer or request is still pending.
    pub fn is_idle(&self) -> bool {
        !self.request_throttle.is_pending()
            && !self.typing_debounce.is_pending()
            && !self.requests.is_busy()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{IntentKind, IntentParameters};

    fn orchestrator() -> SearchOrchestrator {
        SearchOrchestrator::new(&Services::new(), SearchSettings::default())
    }

    #[test]
    fn busy_is_typing_or_contacting() {
        let mut state = SearchState::default();
        assert!(!state.is_busy());
        state.is_typing = true;
        assert!(state.is_busy());
        state.is_typing = false;
        state.is_contacting = true;
        assert!(state.is_busy());
    }

    #[tokio::test]
    async fn send_without_classifier_leaves_state_untouched() {
        let mut search = orchestrator();
        search.dispatch(SearchAction::SetRequest("eurusd".into()));

        assert_eq!(search.state().request_text, "eurusd");
        assert!(!search.state().is_contacting);
    }

    #[tokio::test]
    async fn hiding_clears_response() {
        let mut search = orchestrator();
        search.show();
        search.dispatch(SearchAction::ReceiveResponse(Some(Intent::new(
            IntentKind::TradeInfo,
            IntentParameters::default(),
        ))));
        assert!(search.state().response.is_some());

        search.escape();
        assert!(!search.state().search_visible);
        assert!(search.state().response.is_none());
        assert!(search.is_idle());
    }

    #[tokio::test]
    async fn escape_while_hidden_still_clears_response() {
        let mut search = orchestrator();
        search.dispatch(SearchAction::ReceiveResponse(Some(Intent::new(
            IntentKind::TradeInfo,
            IntentParameters::default(),
        ))));

        search.escape();
        assert!(search.state().response.is_none());
        assert!(!search.state().search_visible);
    }
}
