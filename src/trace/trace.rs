use serde::Serialize;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::{form::session::SessionState, ui::events::UiEvent, ui::renderer::RenderOutput};

/// One line of the form trace: an event and what the router did with it.
#[derive(Debug, Serialize)]
pub struct TraceEvent {
    pub timestamp_ms: u128,
    pub step: u64,

    pub event: UiEvent,
    pub dispatch: String,

    pub session_keys: Vec<String>,

    pub render_mode: Option<String>,
    pub document_fingerprint: Option<String>,
    pub rows: Option<usize>,
}

impl TraceEvent {
    pub fn now(step: u64, event: &UiEvent) -> Self {
        Self {
            timestamp_ms: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_millis())
                .unwrap_or_default(),
            step,
            event: event.clone(),
            dispatch: String::new(),
            session_keys: vec![],
            render_mode: None,
            document_fingerprint: None,
            rows: None,
        }
    }

    pub fn with_dispatch(mut self, dispatch: impl ToString) -> Self {
        self.dispatch = dispatch.to_string();
        self
    }

    pub fn with_session(mut self, session: &SessionState) -> Self {
        self.session_keys = session.keys();
        self
    }

    pub fn with_render(mut self, output: &RenderOutput) -> Self {
        self.render_mode = Some(format!("{:?}", output.mode));
        self.document_fingerprint = Some(output.document.fingerprint());
        self.rows = Some(output.document.rows.len());
        self
    }
}
