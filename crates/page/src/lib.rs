//! Page-level orchestration of fragment swaps, form dispatch and in-place navigation.
//!
//! Invariants:
//! - A `Page` is single-threaded. It only changes in response to a trigger call,
//!   `handle_event`, or `advance_to`, and each of those runs to completion.
//! - Every in-flight request has exactly one entry in `pending`, keyed by its `RequestId`.
//!   The entry is removed when the matching `CoreEvent` arrives; events with no entry are
//!   ignored.
//! - There is one `LoadingIndicator` per page; every navigation that started it holds a
//!   `LoadingTicket` until it completes.
//! - After every swap, completed request and timer turn, nodes detached from the document
//!   are released. A `NodeId` held across such a turn for a detached node goes stale.
//! - No trigger path returns an error. Failures end in `SwapOutcome`, a counter, a
//!   diagnostic, or the notifier.
use std::collections::HashMap;
use std::sync::mpsc;
use std::time::Duration;

use bus::{CoreCommand, CoreEvent};
use core_types::{RequestId, SwapMode, TimerId};
use html::{Dom, NodeId, document_title, parse_document};
use net::{NetError, PendingRequest};
use url::Url;

pub mod config;
mod dispatch;
pub mod history;
pub mod host;
pub mod links;
pub mod loading;
mod nav;
pub mod notify;
pub mod swap;
pub mod theme;
pub mod timers;
pub mod trigger;

pub use config::{ConfigError, GENERIC_ERROR, RuntimeConfig, Settings};
pub use dispatch::resolve_form;
pub use history::{History, HistoryEntry};
pub use host::{LogHost, PageHost};
pub use loading::{IndicatorPhase, LoadingIndicator, LoadingTicket};
pub use notify::{NotificationEntry, Notifier, Severity};
pub use swap::SwapOutcome;
pub use theme::{MemoryStorage, Storage, ThemePreference};
pub use timers::{PageTimer, Scheduler};
pub use trigger::{Suppress, TriggerEvent};

const BLANK_DOCUMENT: &str = "<html><head><title></title></head><body></body></html>";

/// What to do when a partial-swap request fails at the transport level.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Bare form submit: drop it silently.
    Discard,
    /// Explicit action: log it.
    Log,
}

/// Observable failures that are reported but not shown to the user.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Diagnostic {
    FormNotResolved { path: String },
    InvalidUrl { path: String, reason: String },
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SwapStats {
    /// Partial-swap transport failures dropped under `FailurePolicy::Discard`.
    pub discarded: usize,
    /// Partial-swap transport failures logged under `FailurePolicy::Log`.
    pub logged: usize,
    /// Swaps whose target id did not resolve.
    pub target_missing: usize,
}

#[derive(Debug)]
struct PartialSwap {
    target_id: String,
    mode: SwapMode,
    on_error: FailurePolicy,
}

#[derive(Debug)]
struct Navigation {
    url: Url,
    push_history: bool,
    grace_timer: Option<TimerId>,
    ticket: Option<LoadingTicket>,
}

#[derive(Debug)]
enum PendingOp {
    Swap(PartialSwap),
    Navigate(Navigation),
}

pub struct Page {
    location: Url,
    dom: Dom,
    config: RuntimeConfig,
    host: Box<dyn PageHost>,
    cmd_tx: mpsc::Sender<CoreCommand>,

    scheduler: Scheduler,
    loading: LoadingIndicator,
    notifier: Notifier,
    history: History,

    pending: HashMap<RequestId, PendingOp>,
    next_request_id: RequestId,
    diagnostics: Vec<Diagnostic>,
    stats: SwapStats,
}

impl Page {
    /// A blank page at `location`.
    pub fn new(
        location: Url,
        config: RuntimeConfig,
        cmd_tx: mpsc::Sender<CoreCommand>,
        host: Box<dyn PageHost>,
    ) -> Self {
        Self::with_document(location, BLANK_DOCUMENT, config, cmd_tx, host)
    }

    pub fn with_document(
        location: Url,
        html: &str,
        config: RuntimeConfig,
        cmd_tx: mpsc::Sender<CoreCommand>,
        host: Box<dyn PageHost>,
    ) -> Self {
        let loading = LoadingIndicator::new(config.indicator_grace(), config.indicator_fade());
        Self {
            location,
            dom: parse_document(html),
            config,
            host,
            cmd_tx,
            scheduler: Scheduler::new(),
            loading,
            notifier: Notifier::new(),
            history: History::new(),
            pending: HashMap::new(),
            next_request_id: 0,
            diagnostics: Vec::new(),
            stats: SwapStats::default(),
        }
    }

    // -- Accessors ---
    pub fn dom(&self) -> &Dom {
        &self.dom
    }

    pub fn dom_mut(&mut self) -> &mut Dom {
        &mut self.dom
    }

    pub fn title(&self) -> String {
        document_title(&self.dom)
    }

    pub fn location(&self) -> &Url {
        &self.location
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn loading(&self) -> &LoadingIndicator {
        &self.loading
    }

    pub fn notifier(&self) -> &Notifier {
        &self.notifier
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn stats(&self) -> SwapStats {
        self.stats
    }

    pub fn pending_requests(&self) -> usize {
        self.pending.len()
    }

    pub fn now(&self) -> Duration {
        self.scheduler.now()
    }

    pub fn next_deadline(&self) -> Option<Duration> {
        self.scheduler.next_deadline()
    }

    /// No request in flight and the loading indicator fully torn down.
    pub fn is_idle(&self) -> bool {
        self.pending.is_empty() && self.loading.phase() == IndicatorPhase::Idle
    }

    // -- Swap ---
    /// Merge `html` into the element with id `target_id`. Never fails outward.
    pub fn swap(&mut self, target_id: &str, mode: SwapMode, html: &str) -> SwapOutcome {
        let outcome = self.splice_and_replay(target_id, mode, html);
        self.tidy();
        outcome
    }

    fn splice_and_replay(&mut self, target_id: &str, mode: SwapMode, html: &str) -> SwapOutcome {
        if mode == SwapMode::None {
            return SwapOutcome::Skipped;
        }
        let Some(target) = self.dom.get_element_by_id(target_id) else {
            log::debug!("swap target #{target_id} not found; ignoring");
            self.stats.target_missing += 1;
            return SwapOutcome::TargetMissing;
        };
        let scripts = match swap::splice(&mut self.dom, target, mode, html) {
            Ok(scripts) => scripts,
            Err(err) => {
                log::debug!("swap into #{target_id} failed: {err}");
                return SwapOutcome::Failed(err);
            }
        };
        match swap::replay_scripts(&mut self.dom, self.host.as_mut(), &self.location, &scripts) {
            Ok(scripts) => SwapOutcome::Applied { scripts },
            Err(err) => {
                log::debug!("script replay after swap into #{target_id} failed: {err}");
                SwapOutcome::Failed(err)
            }
        }
    }

    // -- Notifications ---
    pub fn toast(&mut self, message: &str, class: Option<&str>) {
        self.notifier.toast(
            &mut self.dom,
            &mut self.scheduler,
            self.host.as_mut(),
            &self.config,
            message,
            class,
        );
    }

    pub fn error(&mut self, message: &str) {
        self.notifier
            .error(&mut self.dom, self.host.as_mut(), &self.config, message);
    }

    pub fn dismiss_error(&mut self) {
        self.notifier.dismiss_error(&mut self.dom);
        self.tidy();
    }

    // -- Theme ---
    pub fn set_theme(
        &mut self,
        storage: &mut dyn Storage,
        pref: ThemePreference,
        prefers_dark: bool,
    ) {
        if let Err(err) = theme::set_theme(storage, &mut self.dom, pref, prefers_dark) {
            log::debug!("theme not applied: {err}");
        }
    }

    pub fn apply_stored_theme(&mut self, storage: &dyn Storage, prefers_dark: bool) {
        let pref = theme::load_theme(storage);
        if let Err(err) = theme::apply_theme(&mut self.dom, pref, prefers_dark) {
            log::debug!("theme not applied: {err}");
        }
    }

    // -- Inbound clicks ---
    /// Route a click on `node`. Returns whether the page handled it.
    pub fn click(&mut self, node: NodeId, event: &mut TriggerEvent) -> bool {
        if let Some(toast) = self.notifier.toast_for_close_button(&self.dom, node) {
            self.notifier
                .close_toast(&mut self.dom, &mut self.scheduler, &self.config, toast);
            return true;
        }
        if self.notifier.is_reload_button(&self.dom, node) {
            self.reload();
            return true;
        }
        if self.config.smooth_nav
            && let Some(url) = links::smooth_nav_target(&self.dom, node, &self.location)
        {
            let Suppress = self.navigate(url.as_str(), Some(event));
            return true;
        }
        false
    }

    // -- Events & timers ---
    pub fn handle_event(&mut self, event: CoreEvent) {
        let request_id = event.request_id();
        let Some(op) = self.pending.remove(&request_id) else {
            log::trace!("no pending operation for request {request_id}");
            return;
        };
        let result = match event {
            CoreEvent::FetchDone { result, .. } => Ok(result),
            CoreEvent::FetchFailed { error, .. } => Err(error),
        };
        match op {
            PendingOp::Swap(partial) => self.finish_partial(partial, result),
            PendingOp::Navigate(nav) => self.finish_navigation(nav, result),
        }
        self.tidy();
    }

    pub fn advance_by(&mut self, delta: Duration) {
        let target = self.scheduler.now() + delta;
        self.advance_to(target);
    }

    /// Fire every timer due at or before `now`, one callback turn each.
    pub fn advance_to(&mut self, now: Duration) {
        while let Some((id, timer)) = self.scheduler.pop_due(now) {
            log::trace!("timer {id} fired: {timer:?}");
            self.fire(timer);
        }
        self.scheduler.settle(now);
        self.tidy();
    }

    fn fire(&mut self, timer: PageTimer) {
        match timer {
            PageTimer::NavGrace { request_id } => self.on_nav_grace(request_id),
            PageTimer::IndicatorGrace => self.loading.on_grace_elapsed(&mut self.dom),
            PageTimer::IndicatorFadeDone { overlay } => {
                self.loading.on_fade_done(&mut self.dom, overlay)
            }
            PageTimer::ToastReveal { toast } => self.notifier.on_reveal(&mut self.dom, toast),
            PageTimer::ToastDismiss { toast } => {
                self.notifier
                    .close_toast(&mut self.dom, &mut self.scheduler, &self.config, toast)
            }
            PageTimer::ToastRemove { toast } => self.notifier.on_remove(&mut self.dom, toast),
        }
    }

    // -- Internal helpers ---
    /// Restore page chrome a mutation took out of the body, drop notifier entries for
    /// messages that left the document, then free whatever is still detached.
    fn tidy(&mut self) {
        self.loading.reattach(&mut self.dom);
        self.notifier.forget_detached(&self.dom);
        let freed = self.dom.sweep_detached();
        if freed > 0 {
            log::trace!("released {freed} detached nodes");
        }
    }

    fn resolve(&self, path: &str) -> Result<Url, url::ParseError> {
        self.location.join(path.trim())
    }

    fn allocate_request_id(&mut self) -> RequestId {
        self.next_request_id += 1;
        self.next_request_id
    }

    /// Queue `request` on the bus. If the network runtime is gone the request fails on the
    /// spot, through the same completion path as any transport error.
    fn send_request(&mut self, request_id: RequestId, request: PendingRequest, op: PendingOp) {
        let url = request.url.clone();
        self.pending.insert(request_id, op);
        let sent = self.cmd_tx.send(CoreCommand::Fetch {
            request_id,
            request,
        });
        if sent.is_err() {
            self.handle_event(CoreEvent::FetchFailed {
                request_id,
                error: NetError::Transport {
                    url,
                    message: "network runtime unavailable".to_string(),
                },
            });
        }
    }
}
