use core_types::RequestId;
use net::{FetchResult, NetError, PendingRequest};
use std::sync::mpsc::{self, Receiver, Sender};

#[derive(Debug)]
pub enum CoreCommand {
    // Page -> network
    Fetch {
        request_id: RequestId,
        request: PendingRequest,
    },
    Shutdown,
}

#[derive(Debug)]
pub enum CoreEvent {
    // Network -> page
    FetchDone {
        request_id: RequestId,
        result: FetchResult,
    },
    FetchFailed {
        request_id: RequestId,
        error: NetError,
    },
}

impl CoreEvent {
    pub fn request_id(&self) -> RequestId {
        match self {
            CoreEvent::FetchDone { request_id, .. } | CoreEvent::FetchFailed { request_id, .. } => {
                *request_id
            }
        }
    }

    pub fn from_result(request_id: RequestId, result: Result<FetchResult, NetError>) -> Self {
        match result {
            Ok(result) => CoreEvent::FetchDone { request_id, result },
            Err(error) => CoreEvent::FetchFailed { request_id, error },
        }
    }
}

pub struct Bus {
    pub cmd_tx: Sender<CoreCommand>,
    pub evt_rx: Receiver<CoreEvent>,
    pub evt_tx: Sender<CoreEvent>, // shareable for runtimes
}

impl Bus {
    /// A fresh bus plus the command receiver a runtime should own.
    pub fn new() -> (Self, Receiver<CoreCommand>) {
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (evt_tx, evt_rx) = mpsc::channel();
        (
            Self {
                cmd_tx,
                evt_rx,
                evt_tx,
            },
            cmd_rx,
        )
    }
}
