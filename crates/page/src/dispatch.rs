use core_types::{PayloadKind, SwapMode};
use html::{Dom, NodeId, form_entries, form_owner, urlencode_pairs};
use net::{FetchResult, NetError, PendingRequest};

use crate::{Diagnostic, FailurePolicy, Page, PartialSwap, PendingOp, Suppress, TriggerEvent};

/// Find the form a trigger event acts on. Rules, first match wins:
/// 1. the event target is a `<form>`;
/// 2. the closest `<form>` ancestor of the target;
/// 3. the submitter's associated form (`form="id"` owner, else its enclosing form).
pub fn resolve_form(dom: &Dom, event: &TriggerEvent) -> Option<NodeId> {
    let from_target = event.target.and_then(|target| {
        if dom.is_element_named(target, "form") {
            Some(target)
        } else {
            dom.closest(target, "form")
        }
    });
    from_target.or_else(|| event.submitter.and_then(|s| form_owner(dom, s)))
}

impl Page {
    /// Serialize the event's form and POST it to `path`; the response body is swapped into
    /// `target_id`. Transport failures are discarded.
    pub fn submit_form(
        &mut self,
        path: &str,
        mode: SwapMode,
        target_id: &str,
        event: &mut TriggerEvent,
    ) -> Suppress {
        event.cancel();
        let Some(form) = resolve_form(&self.dom, event) else {
            log::debug!("submit to {path}: no form resolved; nothing sent");
            return Suppress;
        };
        let url = match self.resolve(path) {
            Ok(url) => url,
            Err(err) => {
                log::debug!("submit to {path}: {err}; nothing sent");
                return Suppress;
            }
        };
        let body = urlencode_pairs(&form_entries(&self.dom, form));
        self.start_partial(
            PendingRequest::post_form(url.as_str(), body),
            target_id,
            mode,
            FailurePolicy::Discard,
        );
        Suppress
    }

    /// POST to `path`, with the associated form as payload for `PayloadKind::Form` or with
    /// no body for `PayloadKind::Empty`. A missing form is recorded as a diagnostic.
    pub fn dispatch(
        &mut self,
        kind: PayloadKind,
        path: &str,
        mode: SwapMode,
        target_id: &str,
        event: &mut TriggerEvent,
    ) -> Suppress {
        event.cancel();
        let url = match self.resolve(path) {
            Ok(url) => url,
            Err(err) => {
                log::error!("dispatch to {path}: {err}");
                self.diagnostics.push(Diagnostic::InvalidUrl {
                    path: path.to_string(),
                    reason: err.to_string(),
                });
                return Suppress;
            }
        };
        let request = match kind {
            PayloadKind::Form => {
                let Some(form) = resolve_form(&self.dom, event) else {
                    log::error!("dispatch to {path}: could not find form element");
                    self.diagnostics.push(Diagnostic::FormNotResolved {
                        path: path.to_string(),
                    });
                    return Suppress;
                };
                let body = urlencode_pairs(&form_entries(&self.dom, form));
                PendingRequest::post_form(url.as_str(), body)
            }
            PayloadKind::Empty => PendingRequest::post_empty(url.as_str()),
        };
        self.start_partial(request, target_id, mode, FailurePolicy::Log);
        Suppress
    }

    fn start_partial(
        &mut self,
        request: PendingRequest,
        target_id: &str,
        mode: SwapMode,
        on_error: FailurePolicy,
    ) {
        let request_id = self.allocate_request_id();
        log::debug!(
            "request {request_id}: {} {} -> #{target_id} ({mode})",
            request.method.as_str(),
            request.url
        );
        let op = PendingOp::Swap(PartialSwap {
            target_id: target_id.to_string(),
            mode,
            on_error,
        });
        self.send_request(request_id, request, op);
    }

    /// Any HTTP status swaps the body in; only transport failures take the policy branch.
    pub(crate) fn finish_partial(
        &mut self,
        partial: PartialSwap,
        result: Result<FetchResult, NetError>,
    ) {
        match (result, partial.on_error) {
            (Ok(response), _) => {
                if !response.is_ok() {
                    log::debug!(
                        "{} answered {}; swapping the body in anyway",
                        response.url,
                        response.status
                    );
                }
                let outcome = self.swap(&partial.target_id, partial.mode, &response.body);
                log::trace!("swap into #{}: {outcome:?}", partial.target_id);
            }
            (Err(err), FailurePolicy::Discard) => {
                log::debug!("discarding failed submit: {err}");
                self.stats.discarded += 1;
            }
            (Err(err), FailurePolicy::Log) => {
                log::error!("dispatch fetch error: {err}");
                self.stats.logged += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use html::parse_document;

    fn dom() -> Dom {
        parse_document(
            "<form id=f><input name=a value=1><button id=inside>go</button></form>\
             <div id=loose><span id=deep>x</span></div>\
             <button id=outside form=f>ext</button>\
             <form id=g><button id=g-btn>g</button></form>",
        )
    }

    fn id(dom: &Dom, v: &str) -> NodeId {
        dom.get_element_by_id(v).expect(v)
    }

    #[test]
    fn target_form_wins() {
        let dom = dom();
        let f = id(&dom, "f");
        let event = TriggerEvent::new(f).with_submitter(id(&dom, "g-btn"));
        assert_eq!(resolve_form(&dom, &event), Some(f));
    }

    #[test]
    fn closest_form_of_target() {
        let dom = dom();
        let event = TriggerEvent::new(id(&dom, "inside"));
        assert_eq!(resolve_form(&dom, &event), Some(id(&dom, "f")));
    }

    #[test]
    fn falls_back_to_submitter_association() {
        let dom = dom();
        let event = TriggerEvent::new(id(&dom, "deep")).with_submitter(id(&dom, "outside"));
        assert_eq!(resolve_form(&dom, &event), Some(id(&dom, "f")));
    }

    #[test]
    fn nothing_resolves_without_form() {
        let dom = dom();
        assert_eq!(resolve_form(&dom, &TriggerEvent::new(id(&dom, "deep"))), None);
        assert_eq!(resolve_form(&dom, &TriggerEvent::default()), None);
    }
}
