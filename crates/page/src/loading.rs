//! Reference-counted, debounced loading overlay.
//!
//! Invariants:
//! - `overlay` is `Some` only while `active > 0` and the grace period has elapsed.
//! - `active == 0` implies no pending grace timer and no visible overlay; overlays that are
//!   fading out live in `fading` until their removal timer fires.
use std::time::Duration;

use core_types::TimerId;
use html::{Dom, Element, NodeId};

use crate::timers::{PageTimer, Scheduler};

const OVERLAY_CLASSES: &str =
    "fixed inset-0 z-50 flex items-center justify-center transition-opacity opacity-100";
const BADGE_CLASSES: &str = "absolute top-3 left-3 flex items-center gap-2 rounded-full px-3 py-1 text-white shadow-lg ring-1 ring-white/30";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IndicatorPhase {
    Idle,
    /// Counting, grace timer pending.
    Armed,
    Visible,
    /// Count is back to zero; the last overlay is being faded out.
    Fading,
}

/// Proof of one outstanding `start`. Hand it back to `LoadingIndicator::stop`.
#[derive(Debug, PartialEq, Eq)]
#[must_use = "a ticket that is never stopped keeps the overlay up"]
pub struct LoadingTicket {
    _private: (),
}

#[derive(Debug)]
pub struct LoadingIndicator {
    active: usize,
    timer: Option<TimerId>,
    overlay: Option<NodeId>,
    fading: Vec<NodeId>,
    grace: Duration,
    fade: Duration,
    shown: usize,
}

impl LoadingIndicator {
    pub fn new(grace: Duration, fade: Duration) -> Self {
        Self {
            active: 0,
            timer: None,
            overlay: None,
            fading: Vec::new(),
            grace,
            fade,
            shown: 0,
        }
    }

    pub fn start(&mut self, scheduler: &mut Scheduler) -> LoadingTicket {
        self.active += 1;
        if self.overlay.is_none() && self.timer.is_none() {
            self.timer = Some(scheduler.schedule(self.grace, PageTimer::IndicatorGrace));
        }
        LoadingTicket { _private: () }
    }

    pub fn stop(&mut self, _ticket: LoadingTicket, dom: &mut Dom, scheduler: &mut Scheduler) {
        self.active = self.active.saturating_sub(1);
        if self.active != 0 {
            return;
        }
        if let Some(timer) = self.timer.take() {
            scheduler.cancel(timer);
        }
        if let Some(overlay) = self.overlay.take() {
            let faded = dom
                .remove_classes(overlay, &["opacity-100"])
                .and_then(|_| dom.add_classes(overlay, &["opacity-0"]));
            if let Err(err) = faded {
                log::trace!("overlay fade: {err}");
            }
            scheduler.schedule(self.fade, PageTimer::IndicatorFadeDone { overlay });
            self.fading.push(overlay);
        }
    }

    pub(crate) fn on_grace_elapsed(&mut self, dom: &mut Dom) {
        self.timer = None;
        if self.active == 0 || self.overlay.is_some() {
            return;
        }
        match build_overlay(dom) {
            Some(overlay) => {
                self.overlay = Some(overlay);
                self.shown += 1;
            }
            None => log::debug!("no body to attach the loading overlay to"),
        }
    }

    /// Put the visible overlay back at the end of the body after a body replacement or a
    /// swap took it out of the document.
    pub(crate) fn reattach(&self, dom: &mut Dom) {
        let Some(overlay) = self.overlay else {
            return;
        };
        if dom.is_connected(overlay) {
            return;
        }
        let Some(body) = dom.body() else {
            log::debug!("no body to reattach the loading overlay to");
            return;
        };
        if let Err(err) = dom.append_child(body, overlay) {
            log::debug!("loading overlay not reattached: {err}");
        }
    }

    pub(crate) fn on_fade_done(&mut self, dom: &mut Dom, overlay: NodeId) {
        self.fading.retain(|&n| n != overlay);
        dom.remove(overlay);
    }

    pub fn phase(&self) -> IndicatorPhase {
        if self.overlay.is_some() {
            IndicatorPhase::Visible
        } else if self.timer.is_some() {
            IndicatorPhase::Armed
        } else if !self.fading.is_empty() {
            IndicatorPhase::Fading
        } else {
            IndicatorPhase::Idle
        }
    }

    pub fn active_count(&self) -> usize {
        self.active
    }

    pub fn overlay(&self) -> Option<NodeId> {
        self.overlay
    }

    pub fn has_pending_timer(&self) -> bool {
        self.timer.is_some()
    }

    /// How many overlays have ever been shown.
    pub fn shown_count(&self) -> usize {
        self.shown
    }
}

fn element(dom: &mut Dom, tag: &str, class: &str) -> NodeId {
    let mut el = Element::new(tag);
    el.set_attr("class", class);
    dom.create_element(el)
}

fn build_overlay(dom: &mut Dom) -> Option<NodeId> {
    let body = dom.body()?;
    let overlay = element(dom, "div", OVERLAY_CLASSES);
    let badge = element(dom, "div", BADGE_CLASSES);
    let dot = element(dom, "span", "inline-block h-2.5 w-2.5 rounded-full bg-white/95 animate-pulse");
    let label = element(dom, "span", "font-semibold tracking-wide");
    let sub = element(dom, "span", "ml-1 text-white/85 text-xs");
    let label_text = dom.create_text("Loading\u{2026}");
    let sub_text = dom.create_text("Please wait");

    let built = dom
        .set_attr(overlay, "aria-busy", "true")
        .and_then(|_| dom.append_child(label, label_text))
        .and_then(|_| dom.append_child(sub, sub_text))
        .and_then(|_| dom.append_child(badge, dot))
        .and_then(|_| dom.append_child(badge, label))
        .and_then(|_| dom.append_child(badge, sub))
        .and_then(|_| dom.append_child(overlay, badge))
        .and_then(|_| dom.append_child(body, overlay));
    match built {
        Ok(()) => Some(overlay),
        Err(err) => {
            log::debug!("loading overlay not built: {err}");
            None
        }
    }
}
