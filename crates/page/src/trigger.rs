use html::NodeId;

/// The DOM event a trigger operation was invoked from.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TriggerEvent {
    pub target: Option<NodeId>,
    /// The submit button of a submit event, if any.
    pub submitter: Option<NodeId>,
    default_prevented: bool,
    propagation_stopped: bool,
}

impl TriggerEvent {
    pub fn new(target: NodeId) -> Self {
        Self {
            target: Some(target),
            ..Self::default()
        }
    }

    pub fn with_submitter(mut self, submitter: NodeId) -> Self {
        self.submitter = Some(submitter);
        self
    }

    pub fn prevent_default(&mut self) {
        self.default_prevented = true;
    }

    /// Also covers immediate propagation; there is only one listener per trigger here.
    pub fn stop_propagation(&mut self) {
        self.propagation_stopped = true;
    }

    pub fn default_prevented(&self) -> bool {
        self.default_prevented
    }

    pub fn propagation_stopped(&self) -> bool {
        self.propagation_stopped
    }

    pub(crate) fn cancel(&mut self) {
        self.prevent_default();
        self.stop_propagation();
    }
}

/// Returned by every trigger operation: the caller must not run the native default action.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[must_use]
pub struct Suppress;
