//! Existence probes for tenants and databases

use tracing::{debug, warn};

use crate::config::ProbeFailurePolicy;
use crate::remote::{AdminApi, AdminResult, ApiStatus};

/// Answers "does this resource exist?" with a plain bool.
///
/// A probe that gets no usable answer (transport failure, auth failure,
/// 5xx) is resolved by the [`ProbeFailurePolicy`] instead of an error.
pub struct ExistenceChecker<'a> {
    api: &'a dyn AdminApi,
    policy: ProbeFailurePolicy,
}

impl<'a> ExistenceChecker<'a> {
    pub fn new(api: &'a dyn AdminApi, policy: ProbeFailurePolicy) -> Self {
        Self { api, policy }
    }

    pub fn tenant_exists(&self, tenant: &str) -> bool {
        let label = format!("tenant '{}'", tenant);
        self.interpret(&label, self.api.get_tenant(tenant))
    }

    pub fn database_exists(&self, tenant: &str, database: &str) -> bool {
        let label = format!("database '{}/{}'", tenant, database);
        self.interpret(&label, self.api.get_database(tenant, database))
    }

    fn interpret(&self, label: &str, result: AdminResult) -> bool {
        let fallback = self.policy == ProbeFailurePolicy::AssumePresent;
        match result {
            Ok(ApiStatus::Found) => {
                debug!("{} exists", label);
                true
            }
            Ok(ApiStatus::NotFound) => {
                debug!("{} not found", label);
                false
            }
            Ok(ApiStatus::Rejected { status, message }) => {
                warn!(
                    "Could not check {} (HTTP {}: {}), assuming {}",
                    label,
                    status,
                    message,
                    presence(fallback)
                );
                fallback
            }
            Ok(other) => {
                warn!("Unexpected probe answer for {}: {:?}", label, other);
                fallback
            }
            Err(e) => {
                warn!("Could not check {} ({}), assuming {}", label, e, presence(fallback));
                fallback
            }
        }
    }
}

fn presence(present: bool) -> &'static str {
    if present {
        "present"
    } else {
        "absent"
    }
}
