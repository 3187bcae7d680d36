use std::io;
use std::sync::{mpsc as std_mpsc, Arc};
use std::thread;

use tabscope_core::{BrowserEvent, Request, Response, CLEANUP_ALARM};
use tabscope_logging::{ts_debug, ts_info, ts_warn};
use tokio::sync::mpsc;
use tokio::task::{JoinError, JoinSet};
use tokio::time::{Instant, MissedTickBehavior};

use crate::coordinator::Coordinator;

pub type Reply = Box<dyn FnOnce(Response) + Send>;

enum Envelope {
    Event(BrowserEvent),
    Request { request: Request, reply: Reply },
}

/// Owns the coordinator thread and its single-threaded runtime.
///
/// Every event and request becomes its own task, so handlers interleave only
/// where they await. The cleanup alarm fires every `cleanup_interval`.
pub struct CoordinatorHandle {
    tx: mpsc::UnboundedSender<Envelope>,
    worker: thread::JoinHandle<()>,
}

impl CoordinatorHandle {
    pub fn spawn(coordinator: Coordinator) -> io::Result<Self> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        let (tx, rx) = mpsc::unbounded_channel();
        let worker = thread::Builder::new()
            .name("tabscope-coordinator".to_string())
            .spawn(move || {
                runtime.block_on(serve(Arc::new(coordinator), rx));
                ts_info!("[coordinator] stopped");
            })?;
        Ok(Self { tx, worker })
    }

    pub fn dispatch_event(&self, event: BrowserEvent) {
        if self.tx.send(Envelope::Event(event)).is_err() {
            ts_warn!("[coordinator] event dropped, coordinator is gone");
        }
    }

    /// Queues `request`; `reply` runs on the coordinator thread.
    pub fn request(&self, request: Request, reply: impl FnOnce(Response) + Send + 'static) {
        let envelope = Envelope::Request {
            request,
            reply: Box::new(reply),
        };
        if self.tx.send(envelope).is_err() {
            ts_warn!("[coordinator] request dropped, coordinator is gone");
        }
    }

    /// Blocks the calling thread until the reply arrives.
    pub fn call(&self, request: Request) -> Option<Response> {
        let (reply_tx, reply_rx) = std_mpsc::channel();
        self.request(request, move |response| {
            let _ = reply_tx.send(response);
        });
        reply_rx.recv().ok()
    }

    /// Closes the mailbox and waits for queued handlers to finish. Running
    /// crawls are dropped with the runtime.
    pub fn shutdown(self) {
        let Self { tx, worker } = self;
        drop(tx);
        if worker.join().is_err() {
            ts_warn!("[coordinator] thread panicked");
        }
    }
}

async fn serve(coordinator: Arc<Coordinator>, mut rx: mpsc::UnboundedReceiver<Envelope>) {
    let period = coordinator.settings().cleanup_interval;
    let mut alarm = tokio::time::interval_at(Instant::now() + period, period);
    alarm.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut handlers = JoinSet::new();

    loop {
        let envelope = tokio::select! {
            envelope = rx.recv() => match envelope {
                Some(envelope) => envelope,
                None => break,
            },
            Some(finished) = handlers.join_next() => {
                report(finished);
                continue;
            }
            _ = alarm.tick() => Envelope::Event(BrowserEvent::AlarmFired {
                name: CLEANUP_ALARM.to_string(),
            }),
        };
        let coordinator = coordinator.clone();
        handlers.spawn(async move {
            match envelope {
                Envelope::Event(event) => coordinator.handle_event(event).await,
                Envelope::Request { request, reply } => {
                    let action = request.action();
                    let response = coordinator.handle_request(request).await;
                    ts_debug!("[msg] {} answered", action);
                    reply(response);
                }
            }
        });
    }

    // Let handlers that were already queued finish before the runtime goes away.
    while let Some(finished) = handlers.join_next().await {
        report(finished);
    }
}

fn report(finished: Result<(), JoinError>) {
    if let Err(err) = finished {
        ts_warn!("[coordinator] handler failed: {}", err);
    }
}
