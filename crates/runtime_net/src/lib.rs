// crates/runtime_net/src/lib.rs
use std::sync::{Arc, mpsc::{Receiver, Sender}};
use std::thread::{self, JoinHandle};

use bus::{CoreCommand, CoreEvent};
use net::{Transport, fetch};

/// Service `Fetch` commands until `Shutdown` or until every command sender is gone.
///
/// Each fetch runs on its own worker thread; completions come back on `evt_tx` in
/// arrival order, not submission order.
pub fn start_net_runtime(
    cmd_rx: Receiver<CoreCommand>,
    evt_tx: Sender<CoreEvent>,
    transport: Arc<dyn Transport>,
) -> JoinHandle<()> {
    thread::spawn(move || {
        while let Ok(cmd) = cmd_rx.recv() {
            match cmd {
                CoreCommand::Fetch {
                    request_id,
                    request,
                } => {
                    log::debug!(
                        "net: {} {} (request {request_id})",
                        request.method.as_str(),
                        request.url
                    );
                    let evt_tx = evt_tx.clone();
                    fetch(
                        request_id,
                        request,
                        transport.clone(),
                        Arc::new(move |request_id, result| {
                            // The page may already be gone; nothing to report to then.
                            let _ = evt_tx.send(CoreEvent::from_result(request_id, result));
                        }),
                    );
                }
                CoreCommand::Shutdown => break,
            }
        }
        log::debug!("net runtime stopped");
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use bus::Bus;
    use net::{FetchResult, NetError, PendingRequest};
    use std::time::Duration;

    struct Echo;

    impl Transport for Echo {
        fn execute(&self, request: &PendingRequest) -> Result<FetchResult, NetError> {
            if request.url.ends_with("/down") {
                return Err(NetError::Transport {
                    url: request.url.clone(),
                    message: "refused".to_string(),
                });
            }
            Ok(FetchResult {
                requested_url: request.url.clone(),
                url: request.url.clone(),
                status: 200,
                content_type: Some("text/html".to_string()),
                body: request.body.clone().unwrap_or_default(),
                duration_ms: 0,
            })
        }
    }

    #[test]
    fn fetch_commands_become_events() {
        let (bus, cmd_rx) = Bus::new();
        let handle = start_net_runtime(cmd_rx, bus.evt_tx.clone(), Arc::new(Echo));

        bus.cmd_tx
            .send(CoreCommand::Fetch {
                request_id: 1,
                request: PendingRequest::post_form("http://h/save", "a=1".to_string()),
            })
            .unwrap();
        bus.cmd_tx
            .send(CoreCommand::Fetch {
                request_id: 2,
                request: PendingRequest::get("http://h/down"),
            })
            .unwrap();

        let mut events: Vec<CoreEvent> = (0..2)
            .map(|_| bus.evt_rx.recv_timeout(Duration::from_secs(5)).unwrap())
            .collect();
        events.sort_by_key(CoreEvent::request_id);

        match &events[0] {
            CoreEvent::FetchDone { request_id, result } => {
                assert_eq!(*request_id, 1);
                assert_eq!(result.body, "a=1");
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(matches!(
            events[1],
            CoreEvent::FetchFailed { request_id: 2, .. }
        ));

        bus.cmd_tx.send(CoreCommand::Shutdown).unwrap();
        handle.join().unwrap();
    }
}
