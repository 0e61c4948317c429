use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::Value;

use report_issue_panel::{
    device::{
        error::DeviceError,
        identity::{IdentityFact, SharedIdentification},
        surface::{AlertRequest, DisplaySurface, StatusSource, TextInputRequest},
    },
    form::schema::{FormDefinition, StartScreen, stock_fields},
    router::router::EventRouter,
    submit::assembler::{SubmissionSettings, Submitter},
    trace::logger::TraceLogger,
    transport::http::{Transport, TransportError},
    ui::document::PanelDocument,
};

// ============================================================================
// Recording display
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum DisplayCall {
    SavePanel(PanelDocument),
    SetValue { widget_id: String, value: String },
    Prompt(TextInputRequest),
    Alert(AlertRequest),
    ClosePanel,
}

#[derive(Debug, Default)]
pub struct RecordingDisplay {
    calls: Mutex<Vec<DisplayCall>>,
}

impl RecordingDisplay {
    pub fn calls(&self) -> Vec<DisplayCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn clear(&self) {
        self.calls.lock().unwrap().clear();
    }

    pub fn documents(&self) -> Vec<PanelDocument> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                DisplayCall::SavePanel(doc) => Some(doc),
                _ => None,
            })
            .collect()
    }

    pub fn last_document(&self) -> Option<PanelDocument> {
        self.documents().pop()
    }

    pub fn alerts(&self) -> Vec<AlertRequest> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                DisplayCall::Alert(alert) => Some(alert),
                _ => None,
            })
            .collect()
    }

    pub fn prompts(&self) -> Vec<TextInputRequest> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                DisplayCall::Prompt(p) => Some(p),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: DisplayCall) -> Result<(), DeviceError> {
        self.calls.lock().unwrap().push(call);
        Ok(())
    }
}

impl DisplaySurface for RecordingDisplay {
    fn save_panel(&self, document: &PanelDocument) -> Result<(), DeviceError> {
        self.record(DisplayCall::SavePanel(document.clone()))
    }

    fn set_widget_value(&self, widget_id: &str, value: &str) -> Result<(), DeviceError> {
        self.record(DisplayCall::SetValue {
            widget_id: widget_id.to_string(),
            value: value.to_string(),
        })
    }

    fn prompt_text_input(&self, request: &TextInputRequest) -> Result<(), DeviceError> {
        self.record(DisplayCall::Prompt(request.clone()))
    }

    fn show_alert(&self, alert: &AlertRequest) -> Result<(), DeviceError> {
        self.record(DisplayCall::Alert(alert.clone()))
    }

    fn close_panel(&self) -> Result<(), DeviceError> {
        self.record(DisplayCall::ClosePanel)
    }
}

// ============================================================================
// Canned device status
// ============================================================================

pub struct FakeStatus {
    pub facts: HashMap<IdentityFact, String>,
    pub booking_id: Result<Option<String>, String>,
    pub call: Result<Option<Value>, String>,
    pub conference: Result<Option<Value>, String>,
    /// Identity lookups never resolve
    pub hang_identity: bool,
}

impl FakeStatus {
    /// A device with every fact known and nothing going on.
    pub fn idle() -> Self {
        let mut facts = HashMap::new();
        facts.insert(IdentityFact::Software, "RoomOS 11.1".to_string());
        facts.insert(IdentityFact::SerialNumber, "FOC1234ABCD".to_string());
        facts.insert(IdentityFact::ProductId, "Cisco Room Kit".to_string());
        facts.insert(IdentityFact::DeviceId, "dev-42".to_string());
        facts.insert(IdentityFact::ContactNumber, "room42@example.com".to_string());
        Self {
            facts,
            booking_id: Ok(None),
            call: Ok(None),
            conference: Ok(None),
            hang_identity: false,
        }
    }

    /// A device in a booked call with a conference running.
    pub fn in_call() -> Self {
        Self {
            booking_id: Ok(Some("booking-7".to_string())),
            call: Ok(Some(serde_json::json!({ "id": "3", "RemoteNumber": "meet@example.com" }))),
            conference: Ok(Some(serde_json::json!([{ "id": "3", "Participants": 4 }]))),
            ..Self::idle()
        }
    }

    /// Every lookup fails.
    pub fn broken() -> Self {
        Self {
            facts: HashMap::new(),
            booking_id: Err("Bookings not available".into()),
            call: Err("no status".into()),
            conference: Err("no status".into()),
            hang_identity: false,
        }
    }
}

fn fake_error(path: &str, msg: &str) -> DeviceError {
    DeviceError::Protocol {
        command: format!("status_get {}", path),
        error: msg.to_string(),
    }
}

#[async_trait]
impl StatusSource for FakeStatus {
    async fn identity_fact(&self, fact: IdentityFact) -> Result<String, DeviceError> {
        if self.hang_identity {
            std::future::pending::<()>().await;
        }
        self.facts
            .get(&fact)
            .cloned()
            .ok_or_else(|| fake_error(fact.status_path(), "not found"))
    }

    async fn booking_id(&self) -> Result<Option<String>, DeviceError> {
        self.booking_id.clone().map_err(|e| fake_error("Bookings", &e))
    }

    async fn active_call(&self) -> Result<Option<Value>, DeviceError> {
        self.call.clone().map_err(|e| fake_error("Call", &e))
    }

    async fn active_conference(&self) -> Result<Option<Value>, DeviceError> {
        self.conference.clone().map_err(|e| fake_error("Conference", &e))
    }
}

// ============================================================================
// Canned transport
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct Posted {
    pub url: String,
    pub body: Value,
    pub allow_insecure: bool,
}

pub struct FakeTransport {
    pub response: Result<String, TransportError>,
    posted: Mutex<Vec<Posted>>,
}

impl FakeTransport {
    pub fn answering(body: &str) -> Self {
        Self {
            response: Ok(body.to_string()),
            posted: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(error: TransportError) -> Self {
        Self {
            response: Err(error),
            posted: Mutex::new(Vec::new()),
        }
    }

    pub fn posted(&self) -> Vec<Posted> {
        self.posted.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for FakeTransport {
    async fn post_json(
        &self,
        url: &str,
        body: String,
        allow_insecure: bool,
    ) -> Result<String, TransportError> {
        self.posted.lock().unwrap().push(Posted {
            url: url.to_string(),
            body: serde_json::from_str(&body).expect("payload is JSON"),
            allow_insecure,
        });
        self.response.clone()
    }
}

// ============================================================================
// Builders
// ============================================================================

pub const SERVICE_URL: &str = "https://hooks.example.com/report";

pub fn stock_form() -> FormDefinition {
    FormDefinition::new("Report Issue", "feedback", StartScreen::default(), stock_fields())
        .expect("stock form is valid")
}

pub fn settings(show_alert: bool) -> SubmissionSettings {
    SubmissionSettings {
        service_url: SERVICE_URL.to_string(),
        allow_insecure_https: false,
        show_alert,
        waiting_text: "Sending Feedback".to_string(),
    }
}

pub struct Harness {
    pub router: EventRouter,
    pub display: Arc<RecordingDisplay>,
    pub transport: Arc<FakeTransport>,
    pub identification: SharedIdentification,
}

pub fn harness(form: FormDefinition, status: FakeStatus, transport: FakeTransport) -> Harness {
    harness_with(form, status, transport, settings(true))
}

pub fn harness_with(
    form: FormDefinition,
    status: FakeStatus,
    transport: FakeTransport,
    settings: SubmissionSettings,
) -> Harness {
    let display = Arc::new(RecordingDisplay::default());
    let transport = Arc::new(transport);
    let identification = SharedIdentification::new();

    let submitter = Arc::new(Submitter::new(
        display.clone(),
        Arc::new(status),
        transport.clone(),
        identification.clone(),
        settings,
    ));
    let router = EventRouter::new(form, display.clone(), submitter, TraceLogger::disabled());

    Harness {
        router,
        display,
        transport,
        identification,
    }
}
