use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::form::error::FormError;

// ============================================================================
// Field schema: static description of every form field
// ============================================================================

/// What clicking a field's button does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldAction {
    /// Go back to the category selection screen
    #[serde(alias = "options")]
    OptionSelect,
    /// Ask the device for a text input prompt
    #[serde(alias = "text_input")]
    OpenTextInput,
    /// Close the panel and send the collected report
    Submit,
}

/// Keyboard layout requested for a text prompt. Names match the device API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum InputType {
    #[default]
    SingleLine,
    Numeric,
    Password,
    #[serde(rename = "PIN")]
    Pin,
}

impl InputType {
    pub fn as_str(&self) -> &'static str {
        match self {
            InputType::SingleLine => "SingleLine",
            InputType::Numeric => "Numeric",
            InputType::Password => "Password",
            InputType::Pin => "PIN",
        }
    }
}

/// A button carries one label before the field has a value and optionally a
/// different one after.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ButtonWidget {
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label_with_value: Option<String>,
    #[serde(default = "default_button_options")]
    pub options: String,
}

/// A read-only line showing the collected value (or the placeholder).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextWidget {
    #[serde(default)]
    pub prefix: String,
    #[serde(default = "default_text_options")]
    pub options: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WidgetVariant {
    Text(TextWidget),
    Button(ButtonWidget),
}

impl WidgetVariant {
    fn kind_name(&self) -> &'static str {
        match self {
            WidgetVariant::Text(_) => "text",
            WidgetVariant::Button(_) => "button",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSpec {
    pub key: String,

    /// Keys that must hold a value before this field renders
    #[serde(default)]
    pub requires: Vec<String>,

    /// Rendered in declaration order within the field's row
    #[serde(default)]
    pub widgets: Vec<WidgetVariant>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<FieldAction>,

    #[serde(default)]
    pub placeholder: String,

    #[serde(default)]
    pub prompt_text: String,

    #[serde(default)]
    pub input_type: InputType,

    #[serde(default)]
    pub show_placeholder: bool,

    #[serde(default = "default_true")]
    pub visible: bool,

    /// When false the placeholder is the value and the user is never prompted
    #[serde(default = "default_true")]
    pub modifiable: bool,

    /// Treated as set for dependency purposes and pushed as the widget value
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fixed_value: Option<String>,

    /// Accepted from config, not enforced
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub regex: Option<String>,
}

impl FieldSpec {
    pub fn button(&self) -> Option<&ButtonWidget> {
        self.widgets.iter().find_map(|w| match w {
            WidgetVariant::Button(b) => Some(b),
            _ => None,
        })
    }

    pub fn text(&self) -> Option<&TextWidget> {
        self.widgets.iter().find_map(|w| match w {
            WidgetVariant::Text(t) => Some(t),
            _ => None,
        })
    }

    pub fn text_widget_id(&self) -> String {
        format!("{}-text", self.key)
    }
}

/// Label shown on a field's button for the given value state.
///
/// Buttons declared with a single label show it in both states.
pub fn label_for(button: &ButtonWidget, has_value: bool) -> &str {
    match (&button.label_with_value, has_value) {
        (Some(after), true) => after,
        _ => &button.label,
    }
}

// ============================================================================
// Validated schema
// ============================================================================

/// Ordered, validated set of fields. Declaration order is render order.
#[derive(Debug, Clone)]
pub struct FormSchema {
    fields: Vec<FieldSpec>,
    index: HashMap<String, usize>,
}

impl FormSchema {
    /// Validate keys, dependencies, and widget declarations.
    pub fn new(fields: Vec<FieldSpec>) -> Result<Self, FormError> {
        let mut index = HashMap::new();
        for (i, field) in fields.iter().enumerate() {
            if RESERVED_KEYS.contains(&field.key.as_str()) {
                return Err(FormError::ReservedKey(field.key.clone()));
            }
            if index.insert(field.key.clone(), i).is_some() {
                return Err(FormError::DuplicateField(field.key.clone()));
            }
        }

        for field in &fields {
            let mut seen = HashSet::new();
            for widget in &field.widgets {
                if !seen.insert(widget.kind_name()) {
                    return Err(FormError::DuplicateWidget {
                        field: field.key.clone(),
                        widget: widget.kind_name(),
                    });
                }
            }

            if let Some(button) = field.button() {
                if button.label.trim().is_empty() {
                    return Err(FormError::MissingLabel(field.key.clone()));
                }
            }

            for dep in &field.requires {
                if !index.contains_key(dep) {
                    return Err(FormError::UnknownDependency {
                        field: field.key.clone(),
                        requires: dep.clone(),
                    });
                }
            }
        }

        let schema = FormSchema { fields, index };
        schema.check_acyclic()?;
        Ok(schema)
    }

    pub fn get(&self, key: &str) -> Option<&FieldSpec> {
        self.index.get(key).map(|&i| &self.fields[i])
    }

    pub fn contains(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    fn check_acyclic(&self) -> Result<(), FormError> {
        #[derive(Clone, Copy, PartialEq)]
        enum Mark {
            Unvisited,
            InProgress,
            Done,
        }

        fn visit(
            schema: &FormSchema,
            i: usize,
            marks: &mut [Mark],
            path: &mut Vec<String>,
        ) -> Result<(), FormError> {
            match marks[i] {
                Mark::Done => return Ok(()),
                Mark::InProgress => {
                    let key = &schema.fields[i].key;
                    let start = path.iter().position(|k| k == key).unwrap_or(0);
                    let mut cycle = path[start..].to_vec();
                    cycle.push(key.clone());
                    return Err(FormError::DependencyCycle(cycle));
                }
                Mark::Unvisited => {}
            }

            marks[i] = Mark::InProgress;
            path.push(schema.fields[i].key.clone());
            for dep in &schema.fields[i].requires {
                if let Some(&j) = schema.index.get(dep) {
                    visit(schema, j, marks, path)?;
                }
            }
            path.pop();
            marks[i] = Mark::Done;
            Ok(())
        }

        let mut marks = vec![Mark::Unvisited; self.fields.len()];
        let mut path = Vec::new();
        for i in 0..self.fields.len() {
            visit(self, i, &mut marks, &mut path)?;
        }
        Ok(())
    }
}

// ============================================================================
// Start screen (category selection)
// ============================================================================

pub const OPTION_ID_PREFIX: &str = "option";
pub const START_PROMPT_ID: &str = "category-text";
pub const CATEGORY_KEY: &str = "category";

/// Top-level report keys filled from device context. Session values share
/// the same JSON object, so no field may use them.
pub const RESERVED_KEYS: [&str; 4] = [
    "identification",
    "bookingId",
    "callDetails",
    "conferenceDetails",
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StartScreen {
    #[serde(default = "default_start_prompt")]
    pub prompt: String,

    #[serde(default = "default_start_options")]
    pub options: Vec<String>,
}

impl Default for StartScreen {
    fn default() -> Self {
        Self {
            prompt: default_start_prompt(),
            options: default_start_options(),
        }
    }
}

impl StartScreen {
    /// Widget id for the option at `index`.
    pub fn option_id(index: usize) -> String {
        format!("{}{}", OPTION_ID_PREFIX, index)
    }

    /// Parse `option<i>` back into an index. Does not bounds-check.
    pub fn parse_option_id(widget_id: &str) -> Option<usize> {
        let digits = widget_id.strip_prefix(OPTION_ID_PREFIX)?;
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        digits.parse().ok()
    }

    pub fn option(&self, index: usize) -> Option<&str> {
        self.options.get(index).map(String::as_str)
    }
}

/// Everything the form engine needs, validated.
#[derive(Debug, Clone)]
pub struct FormDefinition {
    /// Display name, used as panel name and prompt title
    pub name: String,
    pub panel_id: String,
    pub start: StartScreen,
    pub schema: FormSchema,
}

impl FormDefinition {
    pub fn new(
        name: &str,
        panel_id: &str,
        start: StartScreen,
        fields: Vec<FieldSpec>,
    ) -> Result<Self, FormError> {
        if start.options.is_empty() {
            return Err(FormError::NoStartOptions);
        }
        Ok(Self {
            name: name.to_string(),
            panel_id: panel_id.to_string(),
            start,
            schema: FormSchema::new(fields)?,
        })
    }
}

// ============================================================================
// Stock form
// ============================================================================

/// The stock "Report Issue" fields: category, name, submit.
pub fn stock_fields() -> Vec<FieldSpec> {
    vec![
        FieldSpec {
            key: CATEGORY_KEY.to_string(),
            requires: vec![],
            widgets: vec![
                WidgetVariant::Text(TextWidget {
                    prefix: String::new(),
                    options: default_text_options(),
                }),
                WidgetVariant::Button(ButtonWidget {
                    label: "Select Category".into(),
                    label_with_value: Some("Change Category".into()),
                    options: default_button_options(),
                }),
            ],
            action: Some(FieldAction::OptionSelect),
            placeholder: "eg. Please select category".into(),
            prompt_text: "Please enter the problem description".into(),
            input_type: InputType::SingleLine,
            show_placeholder: true,
            visible: true,
            modifiable: true,
            fixed_value: None,
            regex: None,
        },
        FieldSpec {
            key: "name".to_string(),
            requires: vec![CATEGORY_KEY.to_string()],
            widgets: vec![
                WidgetVariant::Text(TextWidget {
                    prefix: "Name:".into(),
                    options: default_text_options(),
                }),
                WidgetVariant::Button(ButtonWidget {
                    label: "Enter Name".into(),
                    label_with_value: Some("Change Name".into()),
                    options: default_button_options(),
                }),
            ],
            action: Some(FieldAction::OpenTextInput),
            placeholder: "eg. John Smith (optional)".into(),
            prompt_text: "Please enter your name".into(),
            input_type: InputType::SingleLine,
            show_placeholder: true,
            visible: true,
            modifiable: true,
            fixed_value: None,
            regex: None,
        },
        FieldSpec {
            key: "submit".to_string(),
            requires: vec![CATEGORY_KEY.to_string()],
            widgets: vec![WidgetVariant::Button(ButtonWidget {
                label: "Submit Issue".into(),
                label_with_value: None,
                options: default_button_options(),
            })],
            action: Some(FieldAction::Submit),
            placeholder: String::new(),
            prompt_text: String::new(),
            input_type: InputType::SingleLine,
            show_placeholder: false,
            visible: true,
            modifiable: true,
            fixed_value: Some("active".into()),
            regex: None,
        },
    ]
}

// Serde default helpers
fn default_true() -> bool { true }
fn default_button_options() -> String { "size=2".to_string() }
fn default_text_options() -> String { "size=2;fontSize=normal;align=left".to_string() }
fn default_start_prompt() -> String { "Please select a category below:".to_string() }

fn default_start_options() -> Vec<String> {
    vec![
        "Technical Issue with Incoming Audio/Video".to_string(),
        "Technical Issue with Outgoing Audio/Video".to_string(),
        "Can't connect to my meeting".to_string(),
        "Request for a technician".to_string(),
        "Issue with sharing content".to_string(),
    ]
}
