use std::collections::BTreeMap;

use crate::form::schema::{FieldSpec, FormSchema};

/// Values collected during one run of the form, keyed by field key.
///
/// A key is present only if the user supplied it or the field is
/// non-modifiable, in which case `seed_defaults` stored its placeholder.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionState {
    values: BTreeMap<String, String>,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// A fresh session with non-modifiable fields already seeded.
    pub fn start(schema: &FormSchema) -> Self {
        let mut session = Self::new();
        session.seed_defaults(schema);
        session
    }

    /// Drop everything collected so far and start over.
    pub fn reset(&mut self, schema: &FormSchema) {
        self.values.clear();
        self.seed_defaults(schema);
    }

    fn seed_defaults(&mut self, schema: &FormSchema) {
        for field in schema.fields().iter().filter(|f| !f.modifiable) {
            self.values.insert(field.key.clone(), field.placeholder.clone());
        }
    }

    /// Store a user-supplied value. Non-modifiable fields keep their seed.
    pub fn record(&mut self, field: &FieldSpec, value: &str) -> bool {
        if !field.modifiable {
            return false;
        }
        self.values.insert(field.key.clone(), value.to_string());
        true
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn has(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn keys(&self) -> Vec<String> {
        self.values.keys().cloned().collect()
    }

    pub fn values(&self) -> &BTreeMap<String, String> {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
