use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::{
    device::{
        identity::SharedIdentification,
        surface::{AlertRequest, DisplaySurface, StatusSource},
    },
    form::session::SessionState,
    submit::payload::{ContextBlocks, SubmissionPayload},
    transport::http::Transport,
};

const SENDING_TITLE: &str = "Sending";
const SUCCESS_TITLE: &str = "Success";
const SUCCESS_TEXT: &str = "Feedback sent, please wait for an agent to process";
const ERROR_TITLE: &str = "Error";

const LONG_NOTICE_SECS: u32 = 10;
const SHORT_NOTICE_SECS: u32 = 3;
const UNTIL_DISMISSED: u32 = 0;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionSettings {
    pub service_url: String,
    pub allow_insecure_https: bool,
    /// Show success and error notices; otherwise only the sending notice
    pub show_alert: bool,
    pub waiting_text: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SubmissionOutcome {
    /// 2xx from the service. `response` is `None` for an empty or non-JSON body.
    Delivered { response: Option<Value> },
    /// Transport or serialization failure; `detail` is what the user was shown
    Failed { detail: String },
}

/// Builds the payload from session + device context and posts it.
pub struct Submitter {
    display: Arc<dyn DisplaySurface>,
    status: Arc<dyn StatusSource>,
    transport: Arc<dyn Transport>,
    identification: SharedIdentification,
    settings: SubmissionSettings,
}

impl Submitter {
    pub fn new(
        display: Arc<dyn DisplaySurface>,
        status: Arc<dyn StatusSource>,
        transport: Arc<dyn Transport>,
        identification: SharedIdentification,
        settings: SubmissionSettings,
    ) -> Self {
        Self {
            display,
            status,
            transport,
            identification,
            settings,
        }
    }

    pub fn settings(&self) -> &SubmissionSettings {
        &self.settings
    }

    /// Send the report built from `session`. Never returns an error: every
    /// failure ends up as a notice and a `Failed` outcome.
    pub async fn submit(&self, session: SessionState) -> SubmissionOutcome {
        self.notify(Notice::Sending(&self.settings.waiting_text));

        let context = self.fetch_context().await;
        let payload =
            SubmissionPayload::assemble(&session, self.identification.snapshot(), context);

        let body = match payload.to_json() {
            Ok(body) => body,
            Err(e) => {
                let detail = format!("Could not serialize report: {}", e);
                self.notify(Notice::Error(&detail));
                return SubmissionOutcome::Failed { detail };
            }
        };
        info!(url = %self.settings.service_url, "posting report: {}", body);

        match self
            .transport
            .post_json(&self.settings.service_url, body, self.settings.allow_insecure_https)
            .await
        {
            Ok(response_body) => {
                // A body that fails to parse still counts as delivered.
                let response = parse_response(&response_body);
                self.notify(Notice::Success);
                SubmissionOutcome::Delivered { response }
            }
            Err(e) => {
                let detail = e.detail();
                self.notify(Notice::Error(&detail));
                SubmissionOutcome::Failed { detail }
            }
        }
    }

    /// Booking, call and conference, fetched one after another. A failed or
    /// empty lookup leaves its block null.
    pub async fn fetch_context(&self) -> ContextBlocks {
        let booking_id = match self.status.booking_id().await {
            Ok(id) => id.filter(|id| !id.is_empty()),
            Err(e) => {
                warn!("Could not get booking id: {}", e);
                None
            }
        };
        debug!(?booking_id, "current booking");

        let call_details = match self.status.active_call().await {
            Ok(call) => call,
            Err(e) => {
                warn!("Could not get call details: {}", e);
                None
            }
        };
        debug!(
            call_id = ?call_details.as_ref().and_then(|c| c.get("id")),
            "current call"
        );

        let conference_details = match self.status.active_conference().await {
            Ok(conference) => conference,
            Err(e) => {
                warn!("Could not get conference details: {}", e);
                None
            }
        };

        ContextBlocks {
            booking_id,
            call_details,
            conference_details,
        }
    }

    fn notify(&self, notice: Notice<'_>) {
        let (title, text, duration_secs, always) = match notice {
            Notice::Sending(text) => {
                info!("{}: {}", SENDING_TITLE, text);
                let duration = if self.settings.show_alert {
                    UNTIL_DISMISSED
                } else {
                    LONG_NOTICE_SECS
                };
                (SENDING_TITLE, text, duration, true)
            }
            Notice::Success => {
                info!("{}: {}", SUCCESS_TITLE, SUCCESS_TEXT);
                (SUCCESS_TITLE, SUCCESS_TEXT, LONG_NOTICE_SECS, false)
            }
            Notice::Error(detail) => {
                error!("{}: {}", ERROR_TITLE, detail);
                (ERROR_TITLE, detail, SHORT_NOTICE_SECS, false)
            }
        };

        if !always && !self.settings.show_alert {
            return;
        }

        let alert = AlertRequest {
            title: title.to_string(),
            text: text.to_string(),
            duration_secs,
        };
        if let Err(e) = self.display.show_alert(&alert) {
            warn!("Failed to show '{}' notice: {}", title, e);
        }
    }
}

/// Notices shown during a submission. The sending notice is always shown;
/// the others only when alerts are enabled.
enum Notice<'a> {
    Sending(&'a str),
    Success,
    Error(&'a str),
}

fn parse_response(body: &str) -> Option<Value> {
    if body.trim().is_empty() {
        return None;
    }
    match serde_json::from_str(body) {
        Ok(value) => Some(value),
        Err(e) => {
            warn!("Service response is not JSON ({}); reporting success anyway", e);
            None
        }
    }
}
