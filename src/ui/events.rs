use serde::{Deserialize, Serialize};

/// The only widget action type the form reacts to.
pub const CLICKED: &str = "clicked";

/// Events emitted by the display surface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum UiEvent {
    /// A panel button on the device was tapped
    PanelOpened { panel_id: String },

    /// A widget inside a panel was pressed, released, clicked, ...
    WidgetAction {
        widget_id: String,
        #[serde(rename = "type")]
        action_type: String,
    },

    /// The user answered a text input prompt
    TextSubmitted { feedback_id: String, text: String },
}

impl UiEvent {
    pub fn panel_opened(panel_id: &str) -> Self {
        UiEvent::PanelOpened {
            panel_id: panel_id.to_string(),
        }
    }

    pub fn clicked(widget_id: &str) -> Self {
        UiEvent::WidgetAction {
            widget_id: widget_id.to_string(),
            action_type: CLICKED.to_string(),
        }
    }

    pub fn text_submitted(feedback_id: &str, text: &str) -> Self {
        UiEvent::TextSubmitted {
            feedback_id: feedback_id.to_string(),
            text: text.to_string(),
        }
    }
}
