//! Toasts and the singleton error banner.
use html::{Dom, DomError, DomResult, Element, NodeId};

use crate::config::RuntimeConfig;
use crate::host::PageHost;
use crate::timers::{PageTimer, Scheduler};

pub const MESSAGES_ID: &str = "__messages__";
pub const ERROR_BANNER_ID: &str = "__error_toast__";
pub const ERROR_TEXT_ID: &str = "__error_text__";
pub const DEFAULT_TOAST_CLASS: &str = "bg-blue-600 text-white";

const CONTAINER_CLASSES: &str =
    "fixed top-4 right-4 z-[9999] flex flex-col gap-2 pointer-events-none";
const TOAST_CLASSES: &str =
    "px-4 py-3 rounded-lg shadow-xl transition-all duration-300 pointer-events-auto min-w-[300px] border";
const TOAST_HIDDEN: [&str; 2] = ["translate-x-10", "opacity-0"];
const BANNER_STYLE: &str = "display:flex;align-items:center;gap:10px;padding:12px 16px;margin:8px;border-radius:12px;min-width:340px;max-width:340px;background:#fee2e2;color:#991b1b;border:1px solid #fecaca;border-left:4px solid #dc2626;font-weight:600;pointer-events:auto";

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Severity {
    /// A toast with its style classes.
    Info(String),
    Error,
}

/// A message currently in the document.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NotificationEntry {
    pub text: String,
    pub severity: Severity,
    pub container: NodeId,
    /// The toast or banner element itself.
    pub node: NodeId,
    pub(crate) close_button: Option<NodeId>,
    pub(crate) closing: bool,
}

#[derive(Debug, Default)]
pub struct Notifier {
    entries: Vec<NotificationEntry>,
    error_invocations: usize,
    alerts: usize,
}

fn element(dom: &mut Dom, tag: &str, class: Option<&str>) -> NodeId {
    let mut el = Element::new(tag);
    if let Some(class) = class {
        el.set_attr("class", class);
    }
    dom.create_element(el)
}

fn ensure_container(dom: &mut Dom) -> DomResult<NodeId> {
    if let Some(existing) = dom.get_element_by_id(MESSAGES_ID) {
        return Ok(existing);
    }
    let body = dom.body().ok_or(DomError::NoBody)?;
    let container = element(dom, "div", Some(CONTAINER_CLASSES));
    dom.set_attr(container, "id", MESSAGES_ID)?;
    dom.append_child(body, container)?;
    Ok(container)
}

impl Notifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[NotificationEntry] {
        &self.entries
    }

    pub fn toasts(&self) -> impl Iterator<Item = &NotificationEntry> {
        self.entries
            .iter()
            .filter(|e| matches!(e.severity, Severity::Info(_)))
    }

    /// How many times `error` has been called.
    pub fn error_invocations(&self) -> usize {
        self.error_invocations
    }

    /// How many messages fell back to `PageHost::alert`.
    pub fn alert_fallbacks(&self) -> usize {
        self.alerts
    }

    // -- Toasts ---
    pub fn toast(
        &mut self,
        dom: &mut Dom,
        scheduler: &mut Scheduler,
        host: &mut dyn PageHost,
        config: &RuntimeConfig,
        message: &str,
        class: Option<&str>,
    ) {
        let class = class
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .unwrap_or(DEFAULT_TOAST_CLASS);
        match build_toast(dom, message, class) {
            Ok((container, toast, close_button)) => {
                scheduler.schedule(config.toast_reveal(), PageTimer::ToastReveal { toast });
                scheduler.schedule(config.toast_dismiss(), PageTimer::ToastDismiss { toast });
                self.entries.push(NotificationEntry {
                    text: message.to_string(),
                    severity: Severity::Info(class.to_string()),
                    container,
                    node: toast,
                    close_button: Some(close_button),
                    closing: false,
                });
            }
            Err(err) => {
                log::debug!("toast not built ({err}); falling back to alert");
                self.alerts += 1;
                host.alert(message);
            }
        }
    }

    /// Start hiding `toast`; it leaves the document after the fade. Repeat calls are no-ops.
    pub fn close_toast(
        &mut self,
        dom: &mut Dom,
        scheduler: &mut Scheduler,
        config: &RuntimeConfig,
        toast: NodeId,
    ) {
        let Some(entry) = self.entries.iter_mut().find(|e| e.node == toast) else {
            return;
        };
        if entry.closing {
            return;
        }
        entry.closing = true;
        if let Err(err) = dom.add_classes(toast, &TOAST_HIDDEN) {
            log::trace!("toast hide: {err}");
        }
        scheduler.schedule(config.toast_fade(), PageTimer::ToastRemove { toast });
    }

    pub(crate) fn on_reveal(&mut self, dom: &mut Dom, toast: NodeId) {
        let open = self
            .entries
            .iter()
            .any(|e| e.node == toast && !e.closing);
        if open {
            if let Err(err) = dom.remove_classes(toast, &TOAST_HIDDEN) {
                log::trace!("toast reveal: {err}");
            }
        }
    }

    pub(crate) fn on_remove(&mut self, dom: &mut Dom, toast: NodeId) {
        dom.remove(toast);
        self.entries.retain(|e| e.node != toast);
    }

    /// The toast whose close button is (or contains) `node`.
    pub(crate) fn toast_for_close_button(&self, dom: &Dom, node: NodeId) -> Option<NodeId> {
        let button = dom.closest(node, "button")?;
        self.entries
            .iter()
            .find(|e| e.close_button == Some(button))
            .map(|e| e.node)
    }

    // -- Error banner ---
    pub fn error(
        &mut self,
        dom: &mut Dom,
        host: &mut dyn PageHost,
        config: &RuntimeConfig,
        message: &str,
    ) {
        self.error_invocations += 1;
        let text = if message.trim().is_empty() {
            config.generic_error.as_str()
        } else {
            message
        };
        match show_banner(dom, text) {
            Ok((container, banner)) => {
                if let Some(entry) = self.entries.iter_mut().find(|e| e.node == banner) {
                    entry.text = text.to_string();
                } else {
                    self.entries.push(NotificationEntry {
                        text: text.to_string(),
                        severity: Severity::Error,
                        container,
                        node: banner,
                        close_button: None,
                        closing: false,
                    });
                }
            }
            Err(err) => {
                log::debug!("error banner not built ({err}); falling back to alert");
                self.alerts += 1;
                host.alert(text);
            }
        }
    }

    pub fn dismiss_error(&mut self, dom: &mut Dom) {
        if let Some(banner) = dom.get_element_by_id(ERROR_BANNER_ID) {
            dom.remove(banner);
        }
        self.entries.retain(|e| e.severity != Severity::Error);
    }

    pub(crate) fn is_reload_button(&self, dom: &Dom, node: NodeId) -> bool {
        dom.closest(node, "button")
            .and_then(|b| dom.parent(b))
            .is_some_and(|p| dom.attr(p, "id") == Some(ERROR_BANNER_ID))
    }

    /// Drop entries whose nodes were swept away by a body replacement.
    pub(crate) fn forget_detached(&mut self, dom: &Dom) {
        self.entries.retain(|e| dom.is_connected(e.node));
    }
}

fn build_toast(dom: &mut Dom, message: &str, class: &str) -> DomResult<(NodeId, NodeId, NodeId)> {
    let container = ensure_container(dom)?;
    let classes = format!("{TOAST_CLASSES} {} {class}", TOAST_HIDDEN.join(" "));
    let toast = element(dom, "div", Some(&classes));
    let row = element(dom, "div", Some("flex items-center gap-3"));
    let span = element(dom, "span", Some("flex-1 font-semibold"));
    let button = element(dom, "button", Some("opacity-70 hover:opacity-100"));
    // Message text is inserted as text, never parsed as markup.
    dom.set_text_content(span, message)?;
    dom.set_text_content(button, "\u{00D7}")?;
    dom.append_child(row, span)?;
    dom.append_child(row, button)?;
    dom.append_child(toast, row)?;
    dom.append_child(container, toast)?;
    Ok((container, toast, button))
}

fn show_banner(dom: &mut Dom, text: &str) -> DomResult<(NodeId, NodeId)> {
    let container = ensure_container(dom)?;
    let banner = match dom.get_element_by_id(ERROR_BANNER_ID) {
        Some(existing) => existing,
        None => {
            let banner = element(dom, "div", None);
            dom.set_attr(banner, "id", ERROR_BANNER_ID)?;
            dom.set_attr(banner, "role", "alert")?;
            dom.set_attr(banner, "style", BANNER_STYLE)?;
            let dot = element(dom, "span", None);
            dom.set_attr(
                dot,
                "style",
                "width:10px;height:10px;border-radius:9999px;background:#dc2626",
            )?;
            let span = element(dom, "span", None);
            dom.set_attr(span, "id", ERROR_TEXT_ID)?;
            let button = element(dom, "button", None);
            dom.set_text_content(button, "Reload")?;
            dom.append_child(banner, dot)?;
            dom.append_child(banner, span)?;
            dom.append_child(banner, button)?;
            dom.append_child(container, banner)?;
            banner
        }
    };
    if let Some(span) = dom.get_element_by_id(ERROR_TEXT_ID) {
        dom.set_text_content(span, text)?;
    }
    let container = dom.parent(banner).unwrap_or(container);
    Ok((container, banner))
}
