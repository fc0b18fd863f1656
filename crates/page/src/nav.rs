use core_types::RequestId;
use html::{
    Dom, DomResult, Element, collect_scripts, document_title, extract_head_metadata, is_html,
    parse_document,
};
use net::{FetchResult, NetError, PendingRequest};
use url::Url;

use crate::timers::PageTimer;
use crate::{HistoryEntry, Navigation, Page, PendingOp, Suppress, TriggerEvent, swap};

#[derive(Debug, thiserror::Error)]
enum NavFailure {
    #[error("HTTP {0}")]
    Status(u16),
    #[error(transparent)]
    Transport(NetError),
    #[error("invalid URL: {0}")]
    InvalidUrl(url::ParseError),
    #[error("could not apply document: {0}")]
    Apply(html::DomError),
}

impl Page {
    // -- Navigation Methods ---
    /// Fetch `href` and replace this document's title and body with the response.
    pub fn navigate(&mut self, href: &str, event: Option<&mut TriggerEvent>) -> Suppress {
        if let Some(event) = event {
            event.prevent_default();
        }
        match self.resolve(href) {
            Ok(url) => self.start_navigation(url, true),
            Err(err) => self.navigation_failed(href, NavFailure::InvalidUrl(err)),
        }
        Suppress
    }

    /// Refetch the current location; history is left alone.
    pub fn reload(&mut self) {
        let url = self.location.clone();
        self.start_navigation(url, false);
    }

    pub fn back(&mut self) -> bool {
        let Some(url) = self.history.back().map(|e| e.url.clone()) else {
            return false;
        };
        self.load_history_entry(&url);
        true
    }

    pub fn forward(&mut self) -> bool {
        let Some(url) = self.history.forward().map(|e| e.url.clone()) else {
            return false;
        };
        self.load_history_entry(&url);
        true
    }

    // -- Internal Helpers ---
    fn load_history_entry(&mut self, url: &str) {
        match Url::parse(url) {
            Ok(url) => self.start_navigation(url, false),
            Err(err) => self.navigation_failed(url, NavFailure::InvalidUrl(err)),
        }
    }

    fn start_navigation(&mut self, url: Url, push_history: bool) {
        let request_id = self.allocate_request_id();
        log::debug!("navigation {request_id}: GET {url}");
        let grace_timer = self
            .scheduler
            .schedule(self.config.nav_grace(), PageTimer::NavGrace { request_id });
        let op = PendingOp::Navigate(Navigation {
            url: url.clone(),
            push_history,
            grace_timer: Some(grace_timer),
            ticket: None,
        });
        self.send_request(request_id, PendingRequest::get(url.as_str()), op);
    }

    pub(crate) fn on_nav_grace(&mut self, request_id: RequestId) {
        let Some(PendingOp::Navigate(nav)) = self.pending.get_mut(&request_id) else {
            return;
        };
        nav.grace_timer = None;
        if nav.ticket.is_none() {
            nav.ticket = Some(self.loading.start(&mut self.scheduler));
        }
    }

    pub(crate) fn finish_navigation(
        &mut self,
        mut nav: Navigation,
        result: Result<FetchResult, NetError>,
    ) {
        if let Some(timer) = nav.grace_timer.take() {
            self.scheduler.cancel(timer);
        }
        if let Some(ticket) = nav.ticket.take() {
            self.loading.stop(ticket, &mut self.dom, &mut self.scheduler);
        }

        let response = match result {
            Ok(response) if response.is_ok() => response,
            Ok(response) => {
                return self.navigation_failed(nav.url.as_str(), NavFailure::Status(response.status));
            }
            Err(err) => return self.navigation_failed(nav.url.as_str(), NavFailure::Transport(err)),
        };
        if !is_html(&response.content_type) {
            log::debug!(
                "{} is {:?}; parsing it as HTML anyway",
                response.url,
                response.content_type
            );
        }

        let incoming = parse_document(&response.body);
        if let Err(err) = self.apply_document(&incoming, &nav.url) {
            return self.navigation_failed(nav.url.as_str(), NavFailure::Apply(err));
        }

        let title = document_title(&incoming);
        if nav.push_history {
            self.history.push(HistoryEntry {
                title: title.clone(),
                url: nav.url.to_string(),
            });
        }
        self.location = nav.url;
        log::info!("navigated to {} ({title:?})", self.location);
    }

    /// Title and body come from `incoming`; scripts from its head and body replay in
    /// document order, with relative `src` resolved against the incoming `<base href>` if any.
    fn apply_document(&mut self, incoming: &Dom, url: &Url) -> DomResult<()> {
        set_title(&mut self.dom, &document_title(incoming))?;

        let body = match self.dom.body() {
            Some(body) => body,
            None => {
                let html = self
                    .dom
                    .document_element()
                    .ok_or(html::DomError::NoBody)?;
                let body = self.dom.create_element(Element::new("body"));
                self.dom.append_child(html, body)?;
                body
            }
        };
        self.dom.clear_children(body)?;
        if let Some(source_body) = incoming.body() {
            for node in self.dom.import_children(incoming, source_body) {
                self.dom.append_child(body, node)?;
            }
        }
        let scripts = match incoming.document_element() {
            Some(root) => collect_scripts(incoming, root),
            None => Vec::new(),
        };
        let base = extract_head_metadata(incoming)
            .base_href
            .and_then(|href| url.join(&href).ok())
            .unwrap_or_else(|| url.clone());
        swap::replay_scripts(&mut self.dom, self.host.as_mut(), &base, &scripts)?;
        Ok(())
    }

    fn navigation_failed(&mut self, href: &str, failure: NavFailure) {
        log::warn!("navigation to {href} failed: {failure}");
        let message = self.config.generic_error.clone();
        self.error(&message);
    }
}

fn set_title(dom: &mut Dom, title: &str) -> DomResult<()> {
    let existing = dom.head().and_then(|head| dom.find_first(head, "title"));
    let node = match existing.or_else(|| dom.find_first(dom.root(), "title")) {
        Some(node) => node,
        None => {
            let Some(head) = dom.head() else {
                return Ok(());
            };
            let node = dom.create_element(Element::new("title"));
            dom.append_child(head, node)?;
            node
        }
    };
    dom.set_text_content(node, title)
}
