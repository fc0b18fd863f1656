//! Deterministic drivers for `page` tests: a page wired to a captured command channel, a
//! host that records instead of executing, and helpers to answer fetches and move the clock.
use std::cell::{Ref, RefCell};
use std::rc::Rc;
use std::sync::mpsc::{self, Receiver};
use std::time::Duration;

use bus::{CoreCommand, CoreEvent};
use core_types::RequestId;
use html::{NodeId, inner_html};
use net::{FetchResult, NetError, PendingRequest};
use page::{Page, PageHost, RuntimeConfig, TriggerEvent};
use url::Url;

pub const ORIGIN: &str = "http://app.test/";

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HostCall {
    Inline(String),
    External(String),
    Alert(String),
}

/// A `PageHost` that writes every call into a shared log.
#[derive(Clone, Debug, Default)]
pub struct RecordingHost {
    calls: Rc<RefCell<Vec<HostCall>>>,
}

impl RecordingHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Ref<'_, Vec<HostCall>> {
        self.calls.borrow()
    }

    /// Inline script bodies, in execution order.
    pub fn executed(&self) -> Vec<String> {
        self.calls
            .borrow()
            .iter()
            .filter_map(|c| match c {
                HostCall::Inline(code) => Some(code.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn loaded(&self) -> Vec<String> {
        self.calls
            .borrow()
            .iter()
            .filter_map(|c| match c {
                HostCall::External(src) => Some(src.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn alerts(&self) -> Vec<String> {
        self.calls
            .borrow()
            .iter()
            .filter_map(|c| match c {
                HostCall::Alert(message) => Some(message.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn clear(&self) {
        self.calls.borrow_mut().clear();
    }
}

impl PageHost for RecordingHost {
    fn run_inline(&mut self, code: &str) {
        self.calls.borrow_mut().push(HostCall::Inline(code.to_string()));
    }

    fn load_external(&mut self, src: &str) {
        self.calls.borrow_mut().push(HostCall::External(src.to_string()));
    }

    fn alert(&mut self, message: &str) {
        self.calls.borrow_mut().push(HostCall::Alert(message.to_string()));
    }
}

pub struct Harness {
    pub page: Page,
    pub host: RecordingHost,
    cmd_rx: Option<Receiver<CoreCommand>>,
}

impl Harness {
    pub fn new(html: &str) -> Self {
        Self::with_config(html, RuntimeConfig::default())
    }

    pub fn with_config(html: &str, config: RuntimeConfig) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let host = RecordingHost::new();
        let location = Url::parse(ORIGIN).expect("static origin parses");
        let page = Page::with_document(location, html, config, cmd_tx, Box::new(host.clone()));
        Self {
            page,
            host,
            cmd_rx: Some(cmd_rx),
        }
    }

    /// Drop the command receiver so every later send fails.
    pub fn disconnect_network(&mut self) {
        self.cmd_rx = None;
    }

    pub fn take_fetch(&mut self) -> Option<(RequestId, PendingRequest)> {
        let rx = self.cmd_rx.as_ref()?;
        loop {
            match rx.try_recv().ok()? {
                CoreCommand::Fetch {
                    request_id,
                    request,
                } => return Some((request_id, request)),
                CoreCommand::Shutdown => continue,
            }
        }
    }

    pub fn expect_fetch(&mut self) -> (RequestId, PendingRequest) {
        self.take_fetch().expect("page should have sent a fetch")
    }

    pub fn respond(&mut self, request_id: RequestId, status: u16, body: &str) {
        self.page.handle_event(CoreEvent::FetchDone {
            request_id,
            result: FetchResult {
                requested_url: String::new(),
                url: String::new(),
                status,
                content_type: Some("text/html; charset=utf-8".to_string()),
                body: body.to_string(),
                duration_ms: 0,
            },
        });
    }

    pub fn respond_ok(&mut self, request_id: RequestId, body: &str) {
        self.respond(request_id, 200, body);
    }

    pub fn fail(&mut self, request_id: RequestId, message: &str) {
        self.page.handle_event(CoreEvent::FetchFailed {
            request_id,
            error: NetError::Transport {
                url: String::new(),
                message: message.to_string(),
            },
        });
    }

    pub fn advance_ms(&mut self, ms: u64) {
        self.page.advance_by(Duration::from_millis(ms));
    }

    pub fn id(&self, id: &str) -> NodeId {
        self.page
            .dom()
            .get_element_by_id(id)
            .unwrap_or_else(|| panic!("no element #{id}"))
    }

    pub fn inner_html(&self, id: &str) -> String {
        inner_html(self.page.dom(), self.id(id))
    }

    pub fn body_html(&self) -> String {
        let dom = self.page.dom();
        dom.body().map(|b| inner_html(dom, b)).unwrap_or_default()
    }

    pub fn event_on(&self, id: &str) -> TriggerEvent {
        TriggerEvent::new(self.id(id))
    }
}
