use crate::form::{
    schema::{FieldSpec, FormSchema},
    session::SessionState,
};

/// Whether a single dependency is satisfied. Fields with a fixed value count
/// as set without any user input.
pub fn dependency_met(schema: &FormSchema, session: &SessionState, key: &str) -> bool {
    session.has(key)
        || schema
            .get(key)
            .is_some_and(|field| field.fixed_value.is_some())
}

pub fn field_eligible(schema: &FormSchema, session: &SessionState, field: &FieldSpec) -> bool {
    field.visible
        && !field.widgets.is_empty()
        && field
            .requires
            .iter()
            .all(|dep| dependency_met(schema, session, dep))
}

/// Unknown keys are never eligible.
pub fn is_eligible(schema: &FormSchema, session: &SessionState, key: &str) -> bool {
    schema
        .get(key)
        .is_some_and(|field| field_eligible(schema, session, field))
}

/// Eligible fields in declaration order.
pub fn eligible_fields<'a>(schema: &'a FormSchema, session: &SessionState) -> Vec<&'a FieldSpec> {
    schema
        .fields()
        .iter()
        .filter(|field| field_eligible(schema, session, field))
        .collect()
}

/// Dependencies of `key` that still block it, for logging.
pub fn missing_dependencies<'a>(
    schema: &'a FormSchema,
    session: &SessionState,
    key: &str,
) -> Vec<&'a str> {
    schema
        .get(key)
        .map(|field| {
            field
                .requires
                .iter()
                .filter(|dep| !dependency_met(schema, session, dep))
                .map(String::as_str)
                .collect()
        })
        .unwrap_or_default()
}
