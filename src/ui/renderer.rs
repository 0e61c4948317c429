use serde::Serialize;
use tracing::{debug, warn};

use crate::{
    device::surface::DisplaySurface,
    form::{
        resolver::{field_eligible, missing_dependencies},
        schema::{FieldSpec, FormDefinition, START_PROMPT_ID, StartScreen, WidgetVariant, label_for},
        session::SessionState,
    },
    ui::document::{PanelDocument, Widget, WidgetType},
};

const START_PROMPT_OPTIONS: &str = "size=3;fontSize=normal;align=left";
const START_OPTION_OPTIONS: &str = "size=4";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RenderMode {
    /// Category selection
    Start,
    /// Every currently eligible field
    Form,
}

/// Out-of-band widget value pushed after the document is saved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Activation {
    pub widget_id: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderOutput {
    pub mode: RenderMode,
    pub document: PanelDocument,
    pub activations: Vec<Activation>,
}

pub fn render(form: &FormDefinition, session: &SessionState, mode: RenderMode) -> RenderOutput {
    match mode {
        RenderMode::Start => render_start(form),
        RenderMode::Form => render_form(form, session),
    }
}

/// One prompt row, then one button row per category.
pub fn render_start(form: &FormDefinition) -> RenderOutput {
    let mut document = PanelDocument::new(&form.panel_id, &form.name);

    document.push_row(vec![Widget {
        id: START_PROMPT_ID.to_string(),
        name: form.start.prompt.clone(),
        widget_type: WidgetType::Text,
        options: START_PROMPT_OPTIONS.to_string(),
    }]);

    for (i, option) in form.start.options.iter().enumerate() {
        document.push_row(vec![Widget {
            id: StartScreen::option_id(i),
            name: option.clone(),
            widget_type: WidgetType::Button,
            options: START_OPTION_OPTIONS.to_string(),
        }]);
    }

    RenderOutput {
        mode: RenderMode::Start,
        document,
        activations: Vec::new(),
    }
}

/// One row per eligible field, in declaration order. Pure: the session is
/// only read.
pub fn render_form(form: &FormDefinition, session: &SessionState) -> RenderOutput {
    let mut document = PanelDocument::new(&form.panel_id, &form.name);
    let mut activations = Vec::new();

    for field in form.schema.fields() {
        if !field_eligible(&form.schema, session, field) {
            debug!(
                field = %field.key,
                missing = ?missing_dependencies(&form.schema, session, &field.key),
                "field not eligible"
            );
            continue;
        }

        if let Some(value) = &field.fixed_value {
            activations.push(Activation {
                widget_id: field.key.clone(),
                value: value.clone(),
            });
        }

        document.push_row(field_widgets(field, session.get(&field.key)));
    }

    RenderOutput {
        mode: RenderMode::Form,
        document,
        activations,
    }
}

fn field_widgets(field: &FieldSpec, value: Option<&str>) -> Vec<Widget> {
    field
        .widgets
        .iter()
        .filter_map(|variant| match variant {
            WidgetVariant::Button(button) => Some(Widget {
                id: field.key.clone(),
                name: label_for(button, value.is_some()).to_string(),
                widget_type: WidgetType::Button,
                options: button.options.clone(),
            }),
            WidgetVariant::Text(text) => {
                let name = match value {
                    Some(v) if text.prefix.is_empty() => v.to_string(),
                    Some(v) => format!("{} {}", text.prefix, v),
                    None if field.show_placeholder => field.placeholder.clone(),
                    None => return None,
                };
                Some(Widget {
                    id: field.text_widget_id(),
                    name,
                    widget_type: WidgetType::Text,
                    options: text.options.clone(),
                })
            }
        })
        .collect()
}

/// Send a render to the display: document first, then activations. Errors
/// are logged and dropped.
pub fn push(display: &dyn DisplaySurface, output: &RenderOutput) {
    if let Err(e) = display.save_panel(&output.document) {
        warn!("Failed to save panel '{}': {}", output.document.panel_id, e);
    }

    for activation in &output.activations {
        debug!(widget = %activation.widget_id, value = %activation.value, "setting widget value");
        if let Err(e) = display.set_widget_value(&activation.widget_id, &activation.value) {
            warn!("Failed to set value of '{}': {}", activation.widget_id, e);
        }
    }
}
