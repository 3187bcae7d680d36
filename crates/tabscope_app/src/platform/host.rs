//! Line-oriented JSON bridge between the browser extension and the coordinator.
//!
//! Inbound, one envelope per line: `{"event": ...}` or `{"id": n, "request": ...}`.
//! Outbound, one message per line: `{"id": n, "response": ...}` and
//! `{"badge": {"tabId": ..., "text": ..., "color": ...}}`.

use std::io::{self, BufRead, Write};
use std::sync::{Arc, Mutex, PoisonError};

use serde::{Deserialize, Serialize};
use tabscope_core::{Badge, BrowserEvent, Request, Response, TabId};
use tabscope_engine::{BadgeSink, CoordinatorHandle, TabRegistry};
use tabscope_logging::{ts_debug, ts_error, ts_warn};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HostError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("cannot encode message: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("malformed envelope on line {line}: {source}")]
    Malformed {
        line: usize,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Inbound {
    Request { id: u64, request: Request },
    Event { event: BrowserEvent },
}

#[derive(Serialize)]
#[serde(untagged)]
enum Outbound<'a> {
    Reply { id: u64, response: &'a Response },
    Badge { badge: BadgeUpdate<'a> },
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct BadgeUpdate<'a> {
    tab_id: TabId,
    text: &'a str,
    color: &'static str,
}

/// Shared, line-buffered writer for everything sent back to the extension.
#[derive(Clone)]
pub struct HostOutput {
    writer: Arc<Mutex<Box<dyn Write + Send>>>,
}

impl HostOutput {
    pub fn new(writer: Box<dyn Write + Send>) -> Self {
        Self {
            writer: Arc::new(Mutex::new(writer)),
        }
    }

    pub fn reply(&self, id: u64, response: &Response) {
        self.send(&Outbound::Reply { id, response });
    }

    pub fn badge(&self, tab_id: TabId, badge: &Badge) {
        self.send(&Outbound::Badge {
            badge: BadgeUpdate {
                tab_id,
                text: &badge.text,
                color: badge.color.hex(),
            },
        });
    }

    pub fn badge_sink(&self) -> BadgeSink {
        let output = self.clone();
        Box::new(move |tab_id, badge| output.badge(tab_id, badge))
    }

    fn send(&self, message: &Outbound<'_>) {
        let mut writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        if let Err(err) = write_line(writer.as_mut(), message) {
            ts_error!("[host] failed to write reply: {}", err);
        }
    }
}

fn write_line(writer: &mut dyn Write, message: &Outbound<'_>) -> Result<(), HostError> {
    serde_json::to_writer(&mut *writer, message)?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
}

fn parse_line(line_no: usize, line: &str) -> Result<Inbound, HostError> {
    serde_json::from_str(line).map_err(|source| HostError::Malformed {
        line: line_no,
        source,
    })
}

pub struct Host {
    handle: CoordinatorHandle,
    tabs: Arc<TabRegistry>,
    output: HostOutput,
}

impl Host {
    pub fn new(handle: CoordinatorHandle, tabs: Arc<TabRegistry>, output: HostOutput) -> Self {
        Self {
            handle,
            tabs,
            output,
        }
    }

    /// Forwards envelopes until `input` is exhausted. Malformed lines are
    /// logged and skipped. Returns the number of envelopes forwarded.
    pub fn serve(&self, input: impl BufRead) -> Result<usize, HostError> {
        let mut forwarded = 0;
        for (index, line) in input.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            match parse_line(index + 1, &line) {
                Ok(Inbound::Event { event }) => {
                    // The registry must see tab events before any handler asks it.
                    self.tabs.observe(&event);
                    self.handle.dispatch_event(event);
                }
                Ok(Inbound::Request { id, request }) => {
                    ts_debug!("[host] request {} {}", id, request.action());
                    self.tabs.observe_request(&request);
                    let output = self.output.clone();
                    self.handle
                        .request(request, move |response| output.reply(id, &response));
                }
                Err(err) => {
                    ts_warn!("[host] {}", err);
                    continue;
                }
            }
            forwarded += 1;
        }
        Ok(forwarded)
    }

    pub fn shutdown(self) {
        self.handle.shutdown();
    }
}
