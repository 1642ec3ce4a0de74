//! Tenant and database provisioning
//!
//! Best effort: every step runs, every failure is logged and recorded in the
//! [`ProvisioningReport`], none is returned as an error. Client construction
//! proceeds regardless.

mod checker;

pub use checker::ExistenceChecker;

use serde::Serialize;
use tracing::{info, warn};

use crate::config::{ClientConfig, ClientKind, ProbeFailurePolicy};
use crate::remote::{AdminApi, AdminResult, ApiStatus};

/// Result of ensuring a single resource
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "reason", rename_all = "snake_case")]
pub enum ProvisioningOutcome {
    AlreadyExisted,
    Created,
    CreationFailed(String),
    SkippedNonRemote,
    SkippedDisabled,
}

impl ProvisioningOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::CreationFailed(_))
    }
}

impl std::fmt::Display for ProvisioningOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AlreadyExisted => f.write_str("already existed"),
            Self::Created => f.write_str("created"),
            Self::CreationFailed(reason) => write!(f, "creation failed: {}", reason),
            Self::SkippedNonRemote => f.write_str("skipped (not a remote-http client)"),
            Self::SkippedDisabled => f.write_str("skipped (auto-provisioning disabled)"),
        }
    }
}

/// Steps of the remote-http construction path.
///
/// There is no failure state: a failed step still moves forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProvisioningState {
    Unresolved,
    ConfigResolved,
    TenantChecked,
    TenantEnsured,
    DatabaseChecked,
    DatabaseEnsured,
    ClientReady,
}

/// What provisioning did for one client construction
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProvisioningReport {
    pub tenant: String,
    pub database: String,
    pub tenant_outcome: ProvisioningOutcome,
    pub database_outcome: ProvisioningOutcome,
    /// States visited, in order
    pub states: Vec<ProvisioningState>,
}

impl ProvisioningReport {
    fn start(config: &ClientConfig, outcome: ProvisioningOutcome) -> Self {
        Self {
            tenant: config.tenant.clone(),
            database: config.database.clone(),
            tenant_outcome: outcome.clone(),
            database_outcome: outcome,
            states: vec![ProvisioningState::ConfigResolved],
        }
    }

    /// Report for a configuration provisioning does not apply to
    pub fn skipped(config: &ClientConfig) -> Self {
        let outcome = if config.kind != ClientKind::Http {
            ProvisioningOutcome::SkippedNonRemote
        } else {
            ProvisioningOutcome::SkippedDisabled
        };
        Self::start(config, outcome)
    }

    /// Report where both steps failed for the same reason
    pub fn failed(config: &ClientConfig, reason: impl Into<String>) -> Self {
        let mut report = Self::start(config, ProvisioningOutcome::CreationFailed(reason.into()));
        report.states.extend([
            ProvisioningState::TenantChecked,
            ProvisioningState::TenantEnsured,
            ProvisioningState::DatabaseChecked,
            ProvisioningState::DatabaseEnsured,
        ]);
        report
    }

    pub(crate) fn advance(&mut self, state: ProvisioningState) {
        self.states.push(state);
    }

    /// Last state reached
    pub fn state(&self) -> ProvisioningState {
        self.states
            .last()
            .copied()
            .unwrap_or(ProvisioningState::Unresolved)
    }

    pub fn has_failures(&self) -> bool {
        self.tenant_outcome.is_failure() || self.database_outcome.is_failure()
    }
}

/// Ensures the configured tenant and database exist on the server
pub struct Provisioner<'a> {
    api: &'a dyn AdminApi,
    checker: ExistenceChecker<'a>,
}

impl<'a> Provisioner<'a> {
    pub fn new(api: &'a dyn AdminApi, policy: ProbeFailurePolicy) -> Self {
        Self {
            api,
            checker: ExistenceChecker::new(api, policy),
        }
    }

    pub fn ensure_tenant(&self, tenant: &str) -> ProvisioningOutcome {
        let exists = self.checker.tenant_exists(tenant);
        self.create_unless(exists, &format!("tenant '{}'", tenant), || {
            self.api.create_tenant(tenant)
        })
    }

    pub fn ensure_database(&self, tenant: &str, database: &str) -> ProvisioningOutcome {
        let exists = self.checker.database_exists(tenant, database);
        self.create_unless(exists, &format!("database '{}/{}'", tenant, database), || {
            self.api.create_database(tenant, database)
        })
    }

    /// Tenant first, then database. Only the remote-http kind with
    /// provisioning enabled issues any request.
    pub fn provision(&self, config: &ClientConfig) -> ProvisioningReport {
        if !config.provisioning_applies() {
            return ProvisioningReport::skipped(config);
        }

        let mut report = ProvisioningReport::start(config, ProvisioningOutcome::SkippedDisabled);

        let tenant_exists = self.checker.tenant_exists(&config.tenant);
        report.advance(ProvisioningState::TenantChecked);
        report.tenant_outcome = self.create_unless(
            tenant_exists,
            &format!("tenant '{}'", config.tenant),
            || self.api.create_tenant(&config.tenant),
        );
        report.advance(ProvisioningState::TenantEnsured);

        let database_exists = self
            .checker
            .database_exists(&config.tenant, &config.database);
        report.advance(ProvisioningState::DatabaseChecked);
        report.database_outcome = self.create_unless(
            database_exists,
            &format!("database '{}/{}'", config.tenant, config.database),
            || self.api.create_database(&config.tenant, &config.database),
        );
        report.advance(ProvisioningState::DatabaseEnsured);

        if report.has_failures() {
            warn!(
                "Auto-provisioning did not fully succeed; continuing with existing server state"
            );
        }
        report
    }

    /// Single read probe of the database with the current credentials.
    /// No fallback policy: anything but a found answer is `false`.
    pub fn verify_access(&self, tenant: &str, database: &str) -> bool {
        match self.api.get_database(tenant, database) {
            Ok(ApiStatus::Found) => true,
            Ok(status) => {
                info!("Database '{}/{}' not accessible: {:?}", tenant, database, status);
                false
            }
            Err(e) => {
                info!("Database '{}/{}' not reachable: {}", tenant, database, e);
                false
            }
        }
    }

    fn create_unless(
        &self,
        exists: bool,
        label: &str,
        create: impl FnOnce() -> AdminResult,
    ) -> ProvisioningOutcome {
        if exists {
            return ProvisioningOutcome::AlreadyExisted;
        }

        match create() {
            Ok(ApiStatus::Created) => {
                info!("Created {}", label);
                ProvisioningOutcome::Created
            }
            Ok(ApiStatus::AlreadyExists) | Ok(ApiStatus::Found) => {
                info!("{} already exists", label);
                ProvisioningOutcome::AlreadyExisted
            }
            Ok(ApiStatus::NotFound) => {
                let reason = "server answered 404".to_string();
                warn!("Failed to create {}: {}", label, reason);
                ProvisioningOutcome::CreationFailed(reason)
            }
            Ok(ApiStatus::Rejected { status, message }) => {
                let reason = format!("HTTP {}: {}", status, message);
                warn!("Failed to create {}: {}", label, reason);
                ProvisioningOutcome::CreationFailed(reason)
            }
            Err(e) => {
                warn!("Failed to create {}: {}", label, e);
                ProvisioningOutcome::CreationFailed(e.to_string())
            }
        }
    }
}
