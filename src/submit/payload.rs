use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;
use tracing::warn;

use crate::{
    device::identity::IdentificationContext,
    form::{schema::RESERVED_KEYS, session::SessionState},
};

/// Late-bound context read right before sending. Each block is independent.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ContextBlocks {
    #[serde(rename = "bookingId")]
    pub booking_id: Option<String>,
    #[serde(rename = "callDetails")]
    pub call_details: Option<Value>,
    #[serde(rename = "conferenceDetails")]
    pub conference_details: Option<Value>,
}

/// The flat JSON object posted to the service:
///
/// ```json
/// {
///   "category": "Can't connect to my meeting",
///   "name": "John Smith",
///   "identification": { "software": "...", "SerialNumber": "..." },
///   "bookingId": null,
///   "callDetails": { ... },
///   "conferenceDetails": null
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubmissionPayload {
    #[serde(flatten)]
    pub inputs: BTreeMap<String, String>,
    pub identification: IdentificationContext,
    #[serde(flatten)]
    pub context: ContextBlocks,
}

impl SubmissionPayload {
    pub fn assemble(
        session: &SessionState,
        identification: IdentificationContext,
        context: ContextBlocks,
    ) -> Self {
        let inputs = session
            .values()
            .iter()
            .filter(|(key, _)| {
                let reserved = RESERVED_KEYS.contains(&key.as_str());
                if reserved {
                    warn!("Dropping session value '{}': key is reserved for device context", key);
                }
                !reserved
            })
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();

        Self {
            inputs,
            identification,
            context,
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
