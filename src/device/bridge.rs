use std::collections::HashMap;
use std::process::Stdio;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{ChildStdin, ChildStdout, Command};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, trace, warn};

use crate::{
    device::{
        error::DeviceError,
        identity::IdentityFact,
        surface::{AlertRequest, DisplaySurface, StatusSource, TextInputRequest},
    },
    ui::{document::PanelDocument, events::UiEvent},
};

const BOOKING_PATH: &str = "Bookings/Current/Id";
const CALL_PATH: &str = "Call";
const CONFERENCE_PATH: &str = "Conference/Call";

/// How to start the bridge helper, e.g. `node xapi-bridge.js`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BridgeConfig {
    pub command: String,
    #[serde(default)]
    pub args: Vec<String>,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            command: "node".to_string(),
            args: vec!["xapi-bridge.js".to_string()],
        }
    }
}

/// Command written to the bridge's stdin (one JSON line, with an `id`).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "cmd", rename_all = "snake_case")]
pub enum BridgeCommand {
    PanelSave {
        panel_id: String,
        xml: String,
    },
    WidgetSetValue {
        widget_id: String,
        value: String,
    },
    TextInputDisplay {
        feedback_id: String,
        input_type: String,
        placeholder: String,
        text: String,
        title: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        input_text: Option<String>,
    },
    AlertDisplay {
        title: String,
        text: String,
        duration: u32,
    },
    PanelClose,
    StatusGet {
        path: String,
    },
}

impl BridgeCommand {
    pub fn name(&self) -> &'static str {
        match self {
            BridgeCommand::PanelSave { .. } => "panel_save",
            BridgeCommand::WidgetSetValue { .. } => "widget_set_value",
            BridgeCommand::TextInputDisplay { .. } => "text_input_display",
            BridgeCommand::AlertDisplay { .. } => "alert_display",
            BridgeCommand::PanelClose => "panel_close",
            BridgeCommand::StatusGet { .. } => "status_get",
        }
    }
}

#[derive(Debug, Serialize)]
struct BridgeRequest<'a> {
    id: u64,
    #[serde(flatten)]
    command: &'a BridgeCommand,
}

/// Reply to a request, matched by `id`.
#[derive(Debug, Clone, Deserialize)]
pub struct BridgeResponse {
    #[serde(default)]
    pub id: Option<u64>,
    pub ok: bool,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub data: Option<Value>,
    #[serde(default)]
    pub ready: Option<bool>,
}

/// A line read from the bridge: either an unsolicited UI event or a reply.
#[derive(Debug)]
pub enum BridgeMessage {
    Event(UiEvent),
    Response(BridgeResponse),
}

pub fn parse_bridge_line(line: &str) -> Result<BridgeMessage, DeviceError> {
    let value: Value = serde_json::from_str(line).map_err(|e| DeviceError::JsonParse {
        context: "bridge output".into(),
        source: e,
    })?;

    if value.get("event").is_some() {
        let event = serde_json::from_value(value).map_err(|e| DeviceError::JsonParse {
            context: "bridge event".into(),
            source: e,
        })?;
        return Ok(BridgeMessage::Event(event));
    }

    let response = serde_json::from_value(value).map_err(|e| DeviceError::JsonParse {
        context: "bridge response".into(),
        source: e,
    })?;
    Ok(BridgeMessage::Response(response))
}

/// Waiters for replies, keyed by request id. `None` once the bridge output
/// has closed; no reply can arrive after that.
type PendingMap = Arc<Mutex<Option<HashMap<u64, oneshot::Sender<BridgeResponse>>>>>;

/// A device connection through a long-lived helper process.
///
/// The helper speaks NDJSON over stdio. Requests carry an `id` and a `cmd`;
/// replies are `{"id", "ok", "data", "error"}`; UI events arrive unsolicited
/// as `{"event": "panel_opened" | "widget_action" | "text_submitted", ...}`.
/// The first line must be `{"ok": true, "ready": true}`.
///
/// Display commands are queued without waiting for their reply. Status reads
/// wait for the matching reply, with no timeout.
pub struct DeviceBridge {
    outgoing: mpsc::UnboundedSender<String>,
    pending: PendingMap,
    next_id: AtomicU64,
    panel_id: String,
}

impl DeviceBridge {
    /// Spawn the helper, wait for its ready line, and start the I/O tasks.
    /// Returns the bridge and the stream of UI events it reads.
    pub async fn launch(
        config: &BridgeConfig,
        panel_id: &str,
    ) -> Result<(Self, mpsc::UnboundedReceiver<UiEvent>), DeviceError> {
        let mut child = Command::new(&config.command)
            .args(&config.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| DeviceError::Spawn {
                command: config.command.clone(),
                source: e,
            })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| DeviceError::Io("Failed to capture bridge stdin".into()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| DeviceError::Io("Failed to capture bridge stdout".into()))?;

        let mut reader = BufReader::new(stdout).lines();

        let ready_line = reader
            .next_line()
            .await
            .map_err(|e| DeviceError::Io(format!("Failed to read ready signal: {}", e)))?
            .ok_or(DeviceError::Closed)?;

        let ready: BridgeResponse =
            serde_json::from_str(ready_line.trim()).map_err(|e| DeviceError::JsonParse {
                context: "bridge ready signal".into(),
                source: e,
            })?;
        if !ready.ok || ready.ready != Some(true) {
            return Err(DeviceError::Protocol {
                command: "launch".into(),
                error: ready
                    .error
                    .unwrap_or_else(|| "Did not receive ready signal from bridge".into()),
            });
        }
        info!(command = %config.command, "device bridge ready");

        if let Some(stderr) = child.stderr.take() {
            tokio::spawn(async move {
                let mut lines = BufReader::new(stderr).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    warn!("[bridge] {}", line.trim());
                }
            });
        }

        tokio::spawn(async move {
            match child.wait().await {
                Ok(status) => info!("device bridge exited with {}", status),
                Err(e) => warn!("device bridge wait failed: {}", e),
            }
        });

        let (out_tx, out_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let pending: PendingMap = Arc::new(Mutex::new(Some(HashMap::new())));

        tokio::spawn(write_loop(stdin, out_rx));
        tokio::spawn(read_loop(reader, event_tx, Arc::clone(&pending)));

        let bridge = DeviceBridge {
            outgoing: out_tx,
            pending,
            next_id: AtomicU64::new(1),
            panel_id: panel_id.to_string(),
        };
        Ok((bridge, event_rx))
    }

    fn encode(&self, command: &BridgeCommand) -> Result<(u64, String), DeviceError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let json = serde_json::to_string(&BridgeRequest { id, command }).map_err(|e| {
            DeviceError::JsonSerialize {
                context: command.name().into(),
                source: e,
            }
        })?;
        Ok((id, json))
    }

    /// Queue a command without waiting for the device to answer.
    fn send(&self, command: &BridgeCommand) -> Result<(), DeviceError> {
        let (id, json) = self.encode(command)?;
        trace!(id, cmd = command.name(), "queue");
        self.outgoing.send(json).map_err(|_| DeviceError::Closed)
    }

    /// Send a command and wait for its reply.
    async fn request(&self, command: &BridgeCommand) -> Result<BridgeResponse, DeviceError> {
        let (id, json) = self.encode(command)?;
        let (tx, rx) = oneshot::channel();
        match self.pending.lock() {
            Ok(mut pending) => match pending.as_mut() {
                Some(waiters) => {
                    waiters.insert(id, tx);
                }
                None => return Err(DeviceError::Closed),
            },
            Err(e) => return Err(DeviceError::Io(format!("pending map poisoned: {}", e))),
        }

        if self.outgoing.send(json).is_err() {
            self.forget(id);
            return Err(DeviceError::Closed);
        }
        let response = rx.await.map_err(|_| DeviceError::Closed)?;

        if !response.ok {
            return Err(DeviceError::Protocol {
                command: command.name().into(),
                error: response.error.unwrap_or_else(|| "Unknown error".into()),
            });
        }
        Ok(response)
    }

    fn forget(&self, id: u64) {
        if let Ok(mut pending) = self.pending.lock() {
            if let Some(waiters) = pending.as_mut() {
                waiters.remove(&id);
            }
        }
    }

    /// Status reads still waiting for a reply.
    pub fn pending_requests(&self) -> usize {
        self.pending
            .lock()
            .ok()
            .and_then(|pending| pending.as_ref().map(HashMap::len))
            .unwrap_or(0)
    }

    /// Read one status value.
    pub async fn status_get(&self, path: &str) -> Result<Value, DeviceError> {
        let response = self
            .request(&BridgeCommand::StatusGet {
                path: path.to_string(),
            })
            .await?;
        Ok(response.data.unwrap_or(Value::Null))
    }
}

async fn write_loop(mut stdin: ChildStdin, mut outgoing: mpsc::UnboundedReceiver<String>) {
    while let Some(line) = outgoing.recv().await {
        if let Err(e) = stdin.write_all(format!("{}\n", line).as_bytes()).await {
            warn!("Failed to write to bridge: {}", e);
            break;
        }
        if let Err(e) = stdin.flush().await {
            warn!("Failed to flush bridge stdin: {}", e);
            break;
        }
    }
}

async fn read_loop(
    mut lines: tokio::io::Lines<BufReader<ChildStdout>>,
    events: mpsc::UnboundedSender<UiEvent>,
    pending: PendingMap,
) {
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                warn!("Failed to read from bridge: {}", e);
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }

        match parse_bridge_line(line.trim()) {
            Ok(BridgeMessage::Event(event)) => {
                debug!(?event, "device event");
                if events.send(event).is_err() {
                    break;
                }
            }
            Ok(BridgeMessage::Response(response)) => route_response(&pending, response),
            Err(e) => warn!("Ignoring bridge output: {}", e),
        }
    }

    // Wake every waiter with a closed channel and refuse new ones.
    if let Ok(mut pending) = pending.lock() {
        *pending = None;
    }
    info!("device bridge output closed");
}

fn route_response(pending: &PendingMap, response: BridgeResponse) {
    let waiter = response
        .id
        .and_then(|id| {
            pending
                .lock()
                .ok()
                .and_then(|mut p| p.as_mut().and_then(|waiters| waiters.remove(&id)))
        });

    match waiter {
        Some(tx) => {
            let _ = tx.send(response);
        }
        None if !response.ok => warn!(
            id = ?response.id,
            "device rejected command: {}",
            response.error.as_deref().unwrap_or("unknown error")
        ),
        None => {}
    }
}

// ============================================================================
// Collaborator implementations
// ============================================================================

impl DisplaySurface for DeviceBridge {
    fn save_panel(&self, document: &PanelDocument) -> Result<(), DeviceError> {
        self.send(&BridgeCommand::PanelSave {
            panel_id: document.panel_id.clone(),
            xml: document.to_xml(),
        })
    }

    fn set_widget_value(&self, widget_id: &str, value: &str) -> Result<(), DeviceError> {
        self.send(&BridgeCommand::WidgetSetValue {
            widget_id: widget_id.to_string(),
            value: value.to_string(),
        })
    }

    fn prompt_text_input(&self, request: &TextInputRequest) -> Result<(), DeviceError> {
        self.send(&BridgeCommand::TextInputDisplay {
            feedback_id: request.feedback_id.clone(),
            input_type: request.input_type.as_str().to_string(),
            placeholder: request.placeholder.clone(),
            text: request.text.clone(),
            title: request.title.clone(),
            input_text: request.input_text.clone(),
        })
    }

    fn show_alert(&self, alert: &AlertRequest) -> Result<(), DeviceError> {
        self.send(&BridgeCommand::AlertDisplay {
            title: alert.title.clone(),
            text: alert.text.clone(),
            duration: alert.duration_secs,
        })
    }

    fn close_panel(&self) -> Result<(), DeviceError> {
        debug!(panel = %self.panel_id, "closing panel");
        self.send(&BridgeCommand::PanelClose)
    }
}

#[async_trait]
impl StatusSource for DeviceBridge {
    async fn identity_fact(&self, fact: IdentityFact) -> Result<String, DeviceError> {
        let value = self.status_get(fact.status_path()).await?;
        status_text(fact.status_path(), value)
    }

    async fn booking_id(&self) -> Result<Option<String>, DeviceError> {
        let value = self.status_get(BOOKING_PATH).await?;
        booking_from_status(value)
    }

    async fn active_call(&self) -> Result<Option<Value>, DeviceError> {
        let value = self.status_get(CALL_PATH).await?;
        first_call(value)
    }

    async fn active_conference(&self) -> Result<Option<Value>, DeviceError> {
        let value = self.status_get(CONFERENCE_PATH).await?;
        conference_participants(value)
    }
}

// ============================================================================
// Status value shaping
// ============================================================================

/// Scalar status as text. Numbers are stringified.
pub fn status_text(path: &str, value: Value) -> Result<String, DeviceError> {
    match value {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(DeviceError::UnexpectedValue {
            path: path.to_string(),
            detail: format!("expected text, got {}", other),
        }),
    }
}

/// Empty booking id means no booking.
pub fn booking_from_status(value: Value) -> Result<Option<String>, DeviceError> {
    match value {
        Value::Null => Ok(None),
        other => {
            let id = status_text(BOOKING_PATH, other)?;
            Ok(if id.is_empty() { None } else { Some(id) })
        }
    }
}

/// First entry of the call list, if any.
pub fn first_call(value: Value) -> Result<Option<Value>, DeviceError> {
    match value {
        Value::Null => Ok(None),
        Value::Array(calls) => Ok(calls.into_iter().next()),
        other => Err(DeviceError::UnexpectedValue {
            path: CALL_PATH.to_string(),
            detail: format!("expected a list, got {}", other),
        }),
    }
}

/// The whole conference list, or `None` when it is empty.
pub fn conference_participants(value: Value) -> Result<Option<Value>, DeviceError> {
    match value {
        Value::Null => Ok(None),
        Value::Array(list) if list.is_empty() => Ok(None),
        Value::Array(list) => Ok(Some(Value::Array(list))),
        other => Err(DeviceError::UnexpectedValue {
            path: CONFERENCE_PATH.to_string(),
            detail: format!("expected a list, got {}", other),
        }),
    }
}
