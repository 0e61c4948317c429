mod common;

use report_issue_panel::form::{
    resolver::{eligible_fields, is_eligible, missing_dependencies},
    schema::{ButtonWidget, FieldAction, FieldSpec, FormSchema, InputType, WidgetVariant, stock_fields},
    session::SessionState,
};

use crate::common::fakes::*;

fn keys(schema: &FormSchema, session: &SessionState) -> Vec<String> {
    eligible_fields(schema, session)
        .iter()
        .map(|f| f.key.clone())
        .collect()
}

fn plain(key: &str, requires: &[&str]) -> FieldSpec {
    FieldSpec {
        key: key.to_string(),
        requires: requires.iter().map(|s| s.to_string()).collect(),
        widgets: vec![WidgetVariant::Button(ButtonWidget {
            label: key.to_uppercase(),
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
// Stock form
// =========================================================================

#[test]
fn only_category_is_eligible_before_a_selection() {
    let form = stock_form();
    let session = SessionState::start(&form.schema);

    assert_eq!(keys(&form.schema, &session), vec!["category"]);
    assert!(!is_eligible(&form.schema, &session, "submit"));
    assert_eq!(
        missing_dependencies(&form.schema, &session, "name"),
        vec!["category"]
    );
}

#[test]
fn every_field_is_eligible_once_category_is_set() {
    let form = stock_form();
    let mut session = SessionState::start(&form.schema);
    session.record(form.schema.get("category").unwrap(), "Issue with sharing content");

    assert_eq!(keys(&form.schema, &session), vec!["category", "name", "submit"]);
    assert!(missing_dependencies(&form.schema, &session, "name").is_empty());
}

#[test]
fn unknown_keys_are_never_eligible() {
    let form = stock_form();
    let session = SessionState::start(&form.schema);
    assert!(!is_eligible(&form.schema, &session, "nope"));
    assert!(missing_dependencies(&form.schema, &session, "nope").is_empty());
}

// =========================================================================
// Visibility, widgets and fixed values
// =========================================================================

#[test]
fn hidden_fields_are_skipped_but_still_satisfy_dependencies() {
    let mut hidden = plain("hidden", &[]);
    hidden.visible = false;
    let schema = FormSchema::new(vec![hidden.clone(), plain("after", &["hidden"])]).unwrap();

    let mut session = SessionState::new();
    assert!(keys(&schema, &session).is_empty());

    session.record(&hidden, "set elsewhere");
    assert_eq!(keys(&schema, &session), vec!["after"]);
}

#[test]
fn fields_without_widgets_are_not_eligible() {
    let mut bare = plain("bare", &[]);
    bare.widgets.clear();
    let schema = FormSchema::new(vec![bare]).unwrap();

    assert!(keys(&schema, &SessionState::new()).is_empty());
}

#[test]
fn fixed_value_counts_as_a_met_dependency() {
    let mut gate = plain("gate", &[]);
    gate.fixed_value = Some("on".into());
    let schema = FormSchema::new(vec![gate, plain("behind", &["gate"])]).unwrap();
    let session = SessionState::new();

    assert_eq!(keys(&schema, &session), vec!["gate", "behind"]);
    assert!(!session.has("gate"), "fixed values are not stored");
}

#[test]
fn seeded_non_modifiable_field_unlocks_dependents() {
    let mut locked = plain("site", &[]);
    locked.modifiable = false;
    locked.placeholder = "HQ".into();
    let schema = FormSchema::new(vec![locked, plain("floor", &["site"])]).unwrap();

    let session = SessionState::start(&schema);
    assert_eq!(session.get("site"), Some("HQ"));
    assert_eq!(keys(&schema, &session), vec!["site", "floor"]);
}

#[test]
fn eligibility_follows_declaration_order() {
    let mut fields = stock_fields();
    fields.reverse();
    let schema = FormSchema::new(fields).unwrap();
    let mut session = SessionState::new();
    session.record(schema.get("category").unwrap(), "Request for a technician");

    assert_eq!(keys(&schema, &session), vec!["submit", "name", "category"]);
}

// =========================================================================
// Session
// =========================================================================

#[test]
fn reset_clears_values_and_reseeds_defaults() {
    let mut locked = plain("site", &[]);
    locked.modifiable = false;
    locked.placeholder = "HQ".into();
    let free = plain("note", &[]);
    let schema = FormSchema::new(vec![locked.clone(), free.clone()]).unwrap();

    let mut session = SessionState::start(&schema);
    assert!(session.record(&free, "hello"));
    assert!(!session.record(&locked, "Branch"));
    assert_eq!(session.get("site"), Some("HQ"));

    session.reset(&schema);
    assert_eq!(session.keys(), vec!["site".to_string()]);
}
