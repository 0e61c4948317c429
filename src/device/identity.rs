use std::sync::{Arc, Mutex};

use serde::Serialize;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::device::surface::StatusSource;

/// One device fact collected for the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IdentityFact {
    Software,
    SerialNumber,
    ProductId,
    DeviceId,
    ContactNumber,
}

impl IdentityFact {
    pub const ALL: [IdentityFact; 5] = [
        IdentityFact::Software,
        IdentityFact::SerialNumber,
        IdentityFact::ProductId,
        IdentityFact::DeviceId,
        IdentityFact::ContactNumber,
    ];

    /// Device status path the value is read from.
    pub fn status_path(&self) -> &'static str {
        match self {
            IdentityFact::Software => "SystemUnit/Software/DisplayName",
            IdentityFact::SerialNumber => "SystemUnit/Hardware/Module/SerialNumber",
            IdentityFact::ProductId => "SystemUnit/ProductId",
            IdentityFact::DeviceId => "Webex/DeveloperId",
            IdentityFact::ContactNumber => "UserInterface/ContactInfo/ContactMethod/1/Number",
        }
    }
}

/// Snapshot of device facts. Any slot may still be empty when read.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IdentificationContext {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub software: Option<String>,
    #[serde(rename = "SerialNumber", skip_serializing_if = "Option::is_none")]
    pub serial_number: Option<String>,
    #[serde(rename = "ProductId", skip_serializing_if = "Option::is_none")]
    pub product_id: Option<String>,
    #[serde(rename = "deviceId", skip_serializing_if = "Option::is_none")]
    pub device_id: Option<String>,
    #[serde(rename = "contactNumber", skip_serializing_if = "Option::is_none")]
    pub contact_number: Option<String>,
}

impl IdentificationContext {
    pub fn set(&mut self, fact: IdentityFact, value: String) {
        let slot = match fact {
            IdentityFact::Software => &mut self.software,
            IdentityFact::SerialNumber => &mut self.serial_number,
            IdentityFact::ProductId => &mut self.product_id,
            IdentityFact::DeviceId => &mut self.device_id,
            IdentityFact::ContactNumber => &mut self.contact_number,
        };
        *slot = Some(value);
    }

    pub fn get(&self, fact: IdentityFact) -> Option<&str> {
        match fact {
            IdentityFact::Software => self.software.as_deref(),
            IdentityFact::SerialNumber => self.serial_number.as_deref(),
            IdentityFact::ProductId => self.product_id.as_deref(),
            IdentityFact::DeviceId => self.device_id.as_deref(),
            IdentityFact::ContactNumber => self.contact_number.as_deref(),
        }
    }
}

/// Identification slots filled in the background and read at submit time.
#[derive(Debug, Clone, Default)]
pub struct SharedIdentification {
    inner: Arc<Mutex<IdentificationContext>>,
}

impl SharedIdentification {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, fact: IdentityFact, value: String) {
        match self.inner.lock() {
            Ok(mut ctx) => ctx.set(fact, value),
            Err(e) => warn!("identification lock poisoned: {}", e),
        }
    }

    /// Whatever has resolved so far.
    pub fn snapshot(&self) -> IdentificationContext {
        match self.inner.lock() {
            Ok(ctx) => ctx.clone(),
            Err(e) => {
                warn!("identification lock poisoned: {}", e);
                IdentificationContext::default()
            }
        }
    }
}

/// Start one background lookup per fact. Nothing waits on them; failures are
/// logged and leave the slot empty.
pub fn spawn_identity_lookups(
    status: Arc<dyn StatusSource>,
    identification: &SharedIdentification,
) -> Vec<JoinHandle<()>> {
    IdentityFact::ALL
        .iter()
        .map(|&fact| {
            let status = Arc::clone(&status);
            let identification = identification.clone();
            tokio::spawn(async move {
                match status.identity_fact(fact).await {
                    Ok(value) => {
                        debug!(?fact, %value, "identity fact resolved");
                        identification.set(fact, value);
                    }
                    Err(e) => warn!("Could not get {}: {}", fact.status_path(), e),
                }
            })
        })
        .collect()
}
