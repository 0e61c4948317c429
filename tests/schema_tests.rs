use report_issue_panel::form::{
    error::FormError,
    schema::{
        ButtonWidget, FieldAction, FieldSpec, FormDefinition, FormSchema, InputType, StartScreen,
        TextWidget, WidgetVariant, label_for, stock_fields,
    },
};

// =========================================================================
// Helpers
// =========================================================================

fn field(key: &str, requires: &[&str]) -> FieldSpec {
    FieldSpec {
        key: key.to_string(),
        requires: requires.iter().map(|s| s.to_string()).collect(),
        widgets: vec![WidgetVariant::Button(ButtonWidget {
            label: format!("Set {}", key),
            label_with_value: None,
            options: "size=2".into(),
        })],
        action: Some(FieldAction::OpenTextInput),
        placeholder: String::new(),
        prompt_text: String::new(),
        input_type: InputType::SingleLine,
        show_placeholder: false,
        visible: true,
        modifiable: true,
        fixed_value: None,
        regex: None,
    }
}

// =========================================================================
// Schema validation
// =========================================================================

#[test]
fn stock_schema_is_valid_and_ordered() {
    let schema = FormSchema::new(stock_fields()).expect("stock fields validate");
    let keys: Vec<&str> = schema.fields().iter().map(|f| f.key.as_str()).collect();
    assert_eq!(keys, vec!["category", "name", "submit"]);
    assert!(schema.contains("name"));
    assert!(schema.get("missing").is_none());
}

#[test]
fn duplicate_keys_are_rejected() {
    let err = FormSchema::new(vec![field("a", &[]), field("a", &[])]).unwrap_err();
    assert!(matches!(err, FormError::DuplicateField(ref k) if k == "a"), "{}", err);
}

#[test]
fn context_keys_cannot_be_field_keys() {
    for key in ["bookingId", "identification", "callDetails", "conferenceDetails"] {
        let err = FormSchema::new(vec![field("category", &[]), field(key, &["category"])])
            .unwrap_err();
        assert!(
            matches!(err, FormError::ReservedKey(ref k) if k == key),
            "{} gave {}",
            key,
            err
        );
    }
}

#[test]
fn unknown_dependency_is_rejected() {
    let err = FormSchema::new(vec![field("a", &["ghost"])]).unwrap_err();
    match err {
        FormError::UnknownDependency { field, requires } => {
            assert_eq!(field, "a");
            assert_eq!(requires, "ghost");
        }
        other => panic!("Expected UnknownDependency, got {:?}", other),
    }
}

#[test]
fn dependency_cycle_is_rejected_with_path() {
    let err = FormSchema::new(vec![
        field("a", &["c"]),
        field("b", &["a"]),
        field("c", &["b"]),
    ])
    .unwrap_err();

    match err {
        FormError::DependencyCycle(path) => {
            assert_eq!(path.first(), path.last(), "Cycle path closes on itself");
            assert_eq!(path.len(), 4, "a -> c -> b -> a");
        }
        other => panic!("Expected DependencyCycle, got {:?}", other),
    }
}

#[test]
fn self_dependency_is_a_cycle() {
    let err = FormSchema::new(vec![field("a", &["a"])]).unwrap_err();
    assert!(matches!(err, FormError::DependencyCycle(_)));
    assert_eq!(err.to_string(), "Dependency cycle: a -> a");
}

#[test]
fn diamond_dependencies_are_not_a_cycle() {
    let schema = FormSchema::new(vec![
        field("root", &[]),
        field("left", &["root"]),
        field("right", &["root"]),
        field("leaf", &["left", "right"]),
    ]);
    assert!(schema.is_ok());
}

#[test]
fn duplicate_widget_variant_is_rejected() {
    let mut f = field("a", &[]);
    f.widgets.push(WidgetVariant::Button(ButtonWidget {
        label: "Again".into(),
        label_with_value: None,
        options: "size=2".into(),
    }));
    let err = FormSchema::new(vec![f]).unwrap_err();
    assert!(matches!(err, FormError::DuplicateWidget { widget: "button", .. }));
}

#[test]
fn blank_button_label_is_rejected() {
    let mut f = field("a", &[]);
    f.widgets = vec![WidgetVariant::Button(ButtonWidget {
        label: "  ".into(),
        label_with_value: None,
        options: "size=2".into(),
    })];
    let err = FormSchema::new(vec![f]).unwrap_err();
    assert!(matches!(err, FormError::MissingLabel(_)));
}

#[test]
fn form_definition_needs_start_options() {
    let start = StartScreen {
        prompt: "Pick one".into(),
        options: vec![],
    };
    let err = FormDefinition::new("Report Issue", "feedback", start, stock_fields()).unwrap_err();
    assert!(matches!(err, FormError::NoStartOptions));
}

// =========================================================================
// Labels and option ids
// =========================================================================

#[test]
fn label_switches_once_a_value_exists() {
    let button = ButtonWidget {
        label: "Enter Name".into(),
        label_with_value: Some("Change Name".into()),
        options: "size=2".into(),
    };
    assert_eq!(label_for(&button, false), "Enter Name");
    assert_eq!(label_for(&button, true), "Change Name");
}

#[test]
fn single_label_is_used_in_both_states() {
    let button = ButtonWidget {
        label: "Submit Issue".into(),
        label_with_value: None,
        options: "size=2".into(),
    };
    assert_eq!(label_for(&button, false), "Submit Issue");
    assert_eq!(label_for(&button, true), "Submit Issue");
}

#[test]
fn option_ids_round_trip_including_two_digits() {
    assert_eq!(StartScreen::option_id(2), "option2");
    assert_eq!(StartScreen::parse_option_id("option2"), Some(2));
    assert_eq!(StartScreen::parse_option_id("option12"), Some(12));
}

#[test]
fn malformed_option_ids_do_not_parse() {
    assert_eq!(StartScreen::parse_option_id("option"), None);
    assert_eq!(StartScreen::parse_option_id("optionX"), None);
    assert_eq!(StartScreen::parse_option_id("option-1"), None);
    assert_eq!(StartScreen::parse_option_id("category"), None);
}

#[test]
fn stock_start_screen_has_five_categories() {
    let start = StartScreen::default();
    assert_eq!(start.options.len(), 5);
    assert_eq!(start.option(2), Some("Can't connect to my meeting"));
    assert_eq!(start.option(5), None);
}

// =========================================================================
// YAML shape
// =========================================================================

#[test]
fn field_spec_deserializes_from_yaml() {
    let yaml = r#"
key: room
requires: [category]
widgets:
  - type: text
    prefix: "Room:"
  - type: button
    label: Enter Room
    label_with_value: Change Room
action: text_input
placeholder: eg. 4B
input_type: Numeric
show_placeholder: true
"#;
    let spec: FieldSpec = serde_yaml::from_str(yaml).expect("valid field yaml");
    assert_eq!(spec.requires, vec!["category"]);
    assert_eq!(spec.action, Some(FieldAction::OpenTextInput));
    assert_eq!(spec.input_type, InputType::Numeric);
    assert!(spec.visible, "visible defaults to true");
    assert!(spec.modifiable, "modifiable defaults to true");
    assert_eq!(
        spec.text(),
        Some(&TextWidget {
            prefix: "Room:".into(),
            options: "size=2;fontSize=normal;align=left".into(),
        })
    );
    assert_eq!(spec.button().map(|b| b.options.as_str()), Some("size=2"));
}

#[test]
fn action_accepts_both_spellings() {
    let a: FieldAction = serde_yaml::from_str("options").unwrap();
    let b: FieldAction = serde_yaml::from_str("option_select").unwrap();
    assert_eq!(a, b);
    let pin: InputType = serde_yaml::from_str("PIN").unwrap();
    assert_eq!(pin.as_str(), "PIN");
}
