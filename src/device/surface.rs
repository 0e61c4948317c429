use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

use crate::{
    device::{error::DeviceError, identity::IdentityFact},
    form::schema::InputType,
    ui::document::PanelDocument,
};

// ============================================================================
// Collaborator interfaces the form engine talks through
// ============================================================================

/// Parameters of a device text input prompt.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextInputRequest {
    /// Echoed back as `feedback_id` in the resulting `TextSubmitted` event
    pub feedback_id: String,
    pub input_type: InputType,
    pub placeholder: String,
    pub text: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_text: Option<String>,
}

/// A notice shown over the device UI. `duration_secs == 0` stays until dismissed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AlertRequest {
    pub title: String,
    pub text: String,
    pub duration_secs: u32,
}

/// The remote on-screen UI. Every command is fire-and-forget: an `Ok` means
/// the command was queued, not that the device applied it.
pub trait DisplaySurface: Send + Sync {
    /// Replace any document previously saved under the same panel id.
    fn save_panel(&self, document: &PanelDocument) -> Result<(), DeviceError>;

    fn set_widget_value(&self, widget_id: &str, value: &str) -> Result<(), DeviceError>;

    fn prompt_text_input(&self, request: &TextInputRequest) -> Result<(), DeviceError>;

    fn show_alert(&self, alert: &AlertRequest) -> Result<(), DeviceError>;

    fn close_panel(&self) -> Result<(), DeviceError>;
}

/// Read-only device status. All lookups are best-effort.
#[async_trait]
pub trait StatusSource: Send + Sync {
    async fn identity_fact(&self, fact: IdentityFact) -> Result<String, DeviceError>;

    /// `None` when no booking is active.
    async fn booking_id(&self) -> Result<Option<String>, DeviceError>;

    /// Summary of the first active call, if any.
    async fn active_call(&self) -> Result<Option<Value>, DeviceError>;

    /// Participants of the active conference, if any.
    async fn active_conference(&self) -> Result<Option<Value>, DeviceError>;
}
