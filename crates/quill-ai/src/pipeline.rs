use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc, Weak,
};
use std::time::Duration;

use parking_lot::Mutex;
use quill_core::{Language, Position};
use quill_editor::{ChangeEvent, EditKind, EditorSession, SessionObserver};
use quill_scheduler::Debouncer;

use crate::{CompletionClient, GhostOverlay, OverlayHandle};

/// Correlates an in-flight backend call with the state that issued it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestId(u64);

/// Immutable snapshot captured at the moment a fetch is issued.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuggestionRequest {
    pub id: RequestId,
    pub document_version: u64,
    pub cursor_offset: usize,
    pub language: Language,
}

/// Ghost text currently on screen. Exists only inside
/// [`PipelineState::Showing`], which makes "at most one" structural.
#[derive(Debug)]
struct ActiveSuggestion {
    text: String,
    anchor: Position,
    handle: OverlayHandle,
}

/// The pipeline's whole lifecycle as a tagged variant; there is no
/// combination of flags that can disagree with itself.
enum PipelineState {
    Idle,
    Pending,
    Requesting { request: SuggestionRequest },
    Showing { suggestion: ActiveSuggestion },
}

impl PipelineState {
    fn current_request(&self) -> Option<RequestId> {
        match self {
            PipelineState::Requesting { request } => Some(request.id),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SuggestionConfig {
    /// Quiet period after the last typed insertion before a fetch is issued.
    pub debounce_delay: Duration,
}

impl Default for SuggestionConfig {
    fn default() -> Self {
        Self {
            debounce_delay: Duration::from_millis(300),
        }
    }
}

struct PipelineInner {
    session: Arc<EditorSession>,
    client: Arc<dyn CompletionClient>,
    overlay: Arc<dyn GhostOverlay>,
    debouncer: Debouncer,
    state: Mutex<PipelineState>,
    next_request_id: AtomicU64,
}

/// The inline suggestion pipeline: debounces typing into a single backend
/// fetch, overlays the result as ghost text at the cursor captured at request
/// time, and resolves races between pending results, edits, and cursor
/// movement by compare-and-discard on the captured document version.
///
/// Methods must be called from within a tokio runtime; the debounce timer,
/// the backend call, and the post-accept formatting pass run as spawned
/// tasks.
#[derive(Clone)]
pub struct SuggestionPipeline {
    inner: Arc<PipelineInner>,
}

impl SuggestionPipeline {
    pub fn new(
        session: Arc<EditorSession>,
        client: Arc<dyn CompletionClient>,
        overlay: Arc<dyn GhostOverlay>,
        config: SuggestionConfig,
    ) -> Self {
        Self {
            inner: Arc::new(PipelineInner {
                session,
                client,
                overlay,
                debouncer: Debouncer::new(config.debounce_delay),
                state: Mutex::new(PipelineState::Idle),
                next_request_id: AtomicU64::new(1),
            }),
        }
    }

    /// Construct the pipeline and subscribe it to the session's change and
    /// cursor events in one step.
    ///
    /// The subscription holds the pipeline weakly: the session outliving its
    /// pipeline must not keep the pipeline alive, and once every
    /// [`SuggestionPipeline`] handle is dropped the observer goes inert.
    pub fn attach(
        session: Arc<EditorSession>,
        client: Arc<dyn CompletionClient>,
        overlay: Arc<dyn GhostOverlay>,
        config: SuggestionConfig,
    ) -> Self {
        let pipeline = Self::new(session, client, overlay, config);
        pipeline.inner.session.subscribe(Arc::new(PipelineObserver {
            inner: Arc::downgrade(&pipeline.inner),
        }));
        pipeline
    }

    pub fn is_showing_suggestion(&self) -> bool {
        matches!(*self.inner.state.lock(), PipelineState::Showing { .. })
    }

    /// Entry point for document mutations (wired automatically by `attach`).
    ///
    /// A typed insertion re-arms the debounce timer; anything else only
    /// invalidates whatever is pending, in flight, or showing.
    pub fn on_edit(&self, kind: EditKind) {
        self.invalidate();
        if kind == EditKind::TypedInsertion {
            *self.inner.state.lock() = PipelineState::Pending;
            let inner = Arc::clone(&self.inner);
            self.inner
                .debouncer
                .schedule(move || async move { request_suggestion(inner).await });
        }
    }

    /// Cursor-only movement: cancels the pending timer and tears down any
    /// ghost text, but never schedules a fetch.
    pub fn on_cursor_move(&self) {
        self.invalidate();
    }

    /// Commit the active suggestion at the cursor.
    ///
    /// Returns `false` (a no-op) when nothing is showing, in which case the
    /// host must let the key event fall through to the editor widget's
    /// default handling. On `true` the event must be suppressed.
    ///
    /// Effects, in order: the text is inserted as a programmatic edit, the
    /// ghost decoration is cleared, and a detached formatting pass is
    /// spawned. A formatting failure is logged and never rolls back the
    /// insertion.
    pub fn accept(&self) -> bool {
        let suggestion = {
            let mut state = self.inner.state.lock();
            match std::mem::replace(&mut *state, PipelineState::Idle) {
                PipelineState::Showing { suggestion } => suggestion,
                other => {
                    *state = other;
                    return false;
                }
            }
        };

        debug_assert_eq!(
            self.inner.session.cursor(),
            suggestion.anchor,
            "a moved cursor must have torn the suggestion down already",
        );
        tracing::debug!(
            anchor = ?suggestion.anchor,
            handle = ?suggestion.handle,
            "accepting suggestion"
        );

        // The Replacement event this fires re-enters `on_edit`, which finds
        // the state already Idle.
        self.inner.session.insert_programmatic(&suggestion.text);
        self.inner.overlay.clear();

        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move { format_after_accept(inner).await });
        true
    }

    fn invalidate(&self) {
        self.inner.debouncer.cancel();
        let was_showing = {
            let mut state = self.inner.state.lock();
            let showing = matches!(*state, PipelineState::Showing { .. });
            *state = PipelineState::Idle;
            showing
        };
        if was_showing {
            self.inner.overlay.clear();
        }
    }
}

/// Session subscription registered by [`SuggestionPipeline::attach`]. Holds
/// the pipeline weakly so the session-to-pipeline edge never forms a
/// reference cycle with the pipeline's own `Arc<EditorSession>`.
struct PipelineObserver {
    inner: Weak<PipelineInner>,
}

impl PipelineObserver {
    fn pipeline(&self) -> Option<SuggestionPipeline> {
        self.inner
            .upgrade()
            .map(|inner| SuggestionPipeline { inner })
    }
}

impl SessionObserver for PipelineObserver {
    fn document_changed(&self, event: &ChangeEvent) {
        if let Some(pipeline) = self.pipeline() {
            pipeline.on_edit(event.kind);
        }
    }

    fn cursor_moved(&self, _cursor: Position) {
        if let Some(pipeline) = self.pipeline() {
            pipeline.on_cursor_move();
        }
    }
}

/// The debounce timer fired: issue at most one backend call for the snapshot
/// under the cursor.
async fn request_suggestion(inner: Arc<PipelineInner>) {
    let request = {
        let mut state = inner.state.lock();
        if !matches!(*state, PipelineState::Pending) {
            // Superseded between the timer firing and us getting the lock.
            return;
        }
        // Suggestions are only offered at the end of a line; mid-line the
        // fetch is a deliberate no-op.
        if !inner.session.cursor_at_line_end() {
            tracing::debug!("skipping suggestion: cursor is mid-line");
            *state = PipelineState::Idle;
            return;
        }
        let request = SuggestionRequest {
            id: RequestId(inner.next_request_id.fetch_add(1, Ordering::Relaxed)),
            document_version: inner.session.version(),
            cursor_offset: inner.session.cursor_offset(),
            language: inner.session.language(),
        };
        *state = PipelineState::Requesting {
            request: request.clone(),
        };
        request
    };

    let document = inner.session.text();
    tracing::debug!(
        id = ?request.id,
        offset = request.cursor_offset,
        language = %request.language,
        "requesting completion"
    );
    let result = inner
        .client
        .completion(&document, request.cursor_offset, request.language)
        .await;

    let mut state = inner.state.lock();
    if state.current_request() != Some(request.id) {
        // A newer request, an edit, or a cursor move got here first.
        tracing::debug!(id = ?request.id, "discarding superseded completion result");
        return;
    }

    let text = match result {
        Ok(text) => text,
        Err(err) => {
            tracing::warn!(id = ?request.id, error = %err, "completion request failed");
            *state = PipelineState::Idle;
            return;
        }
    };

    if inner.session.version() != request.document_version {
        tracing::debug!(id = ?request.id, "discarding stale completion result");
        *state = PipelineState::Idle;
        return;
    }
    if text.is_empty() {
        *state = PipelineState::Idle;
        return;
    }

    // Version unchanged and no cursor-only move since (that would have moved
    // the state to Idle), so the cursor still sits where the request captured
    // it.
    let anchor = inner.session.cursor();
    match inner.overlay.show(&text, anchor) {
        Some(handle) => {
            tracing::debug!(id = ?request.id, ?anchor, "showing suggestion");
            *state = PipelineState::Showing {
                suggestion: ActiveSuggestion {
                    text,
                    anchor,
                    handle,
                },
            };
        }
        None => {
            // "Clear before show" is this pipeline's invariant; a refused
            // show means the overlay disagrees about what is on screen.
            tracing::warn!(id = ?request.id, "overlay still occupied; dropping suggestion");
            *state = PipelineState::Idle;
        }
    }
}

/// Fire-and-forget formatting pass after an acceptance. Failure is captured
/// here and goes no further; the accepted text stays committed either way.
async fn format_after_accept(inner: Arc<PipelineInner>) {
    let version = inner.session.version();
    let document = inner.session.text();
    let language = inner.session.language();

    match inner.client.format(&document, language).await {
        Ok(outcome) => {
            if inner.session.version() == version {
                inner.session.replace_all(&outcome.formatted_code);
            } else {
                tracing::debug!("dropping format result: document changed while formatting");
            }
        }
        Err(err) => {
            tracing::warn!(error = %err, "post-accept formatting failed");
        }
    }
}
