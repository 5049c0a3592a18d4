//! # Plant Configuration
//!
//! A plant is described by one YAML document:
//!
//! ```yaml
//! supervisor: sup-1
//! operator_tiers: { op-1: 3 }
//! vessel_requirements: { V1: 3 }
//! role_grants: { mgr-1: [MANAGER], qc-1: [QC_TECH] }
//! telemetry: { min_update_interval_secs: 1200 }
//! audit: { log_path: ./audit.jsonl }
//! ```
//!
//! Everything except `supervisor` is optional. Without `audit.log_path` the
//! audit trail is kept in memory.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use lotgate_access::{AccessRegistry, EmergencyHaltSwitch, RoleRegistry, TierRegistry};
use lotgate_audit::{AuditError, AuditSink, InMemoryAuditLog, JsonlAuditLog};
use lotgate_core::{PrincipalId, Role, Tier, VesselId};

use crate::clock::Clock;
use crate::lifecycle::BatchLifecycle;
use crate::throttle::{TelemetryThrottle, DEFAULT_MIN_UPDATE_INTERVAL_SECS};

/// Errors loading a plant configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("cannot read {path}: {source}")]
    Io {
        /// The configuration path.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },

    /// The document is not valid YAML for a plant.
    #[error("invalid plant configuration: {0}")]
    Parse(#[from] serde_yaml::Error),

    /// The document parsed but a value is unacceptable.
    #[error("invalid plant configuration: {0}")]
    Invalid(String),

    /// The configured audit log could not be opened.
    #[error("cannot open audit log: {0}")]
    Audit(#[from] AuditError),
}

/// Telemetry settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TelemetryConfig {
    /// Minimum seconds between accepted in-spec updates.
    #[serde(default = "default_min_interval")]
    pub min_update_interval_secs: u64,
}

fn default_min_interval() -> u64 {
    DEFAULT_MIN_UPDATE_INTERVAL_SECS
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            min_update_interval_secs: DEFAULT_MIN_UPDATE_INTERVAL_SECS,
        }
    }
}

/// Audit settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AuditConfig {
    /// JSON-lines log file. Relative paths resolve against the
    /// configuration file's directory.
    #[serde(default)]
    pub log_path: Option<PathBuf>,
}

/// A plant: supervisor, registries, and engine settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PlantConfig {
    /// The single supervisor.
    pub supervisor: PrincipalId,
    /// Operator competency tiers.
    #[serde(default)]
    pub operator_tiers: BTreeMap<PrincipalId, Tier>,
    /// Vessel minimum tiers.
    #[serde(default)]
    pub vessel_requirements: BTreeMap<VesselId, Tier>,
    /// Role grants.
    #[serde(default)]
    pub role_grants: BTreeMap<PrincipalId, Vec<Role>>,
    /// Telemetry settings.
    #[serde(default)]
    pub telemetry: TelemetryConfig,
    /// Audit settings.
    #[serde(default)]
    pub audit: AuditConfig,
}

impl PlantConfig {
    /// Parse and validate a YAML document.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a file. A relative `audit.log_path` is resolved against
    /// the file's directory.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let yaml = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config = Self::from_yaml_str(&yaml)?;
        if let (Some(log_path), Some(dir)) = (config.audit.log_path.as_mut(), path.parent()) {
            if log_path.is_relative() {
                *log_path = dir.join(&*log_path);
            }
        }
        tracing::debug!(path = %path.display(), "plant configuration loaded");
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.telemetry.min_update_interval_secs == 0 {
            return Err(ConfigError::Invalid(
                "telemetry.min_update_interval_secs must be at least 1".into(),
            ));
        }
        if let Some((principal, _)) = self.role_grants.iter().find(|(_, roles)| roles.is_empty()) {
            return Err(ConfigError::Invalid(format!(
                "role_grants.{principal} lists no roles"
            )));
        }
        Ok(())
    }

    /// Build the access registry.
    pub fn registry(&self) -> AccessRegistry {
        let mut tiers = TierRegistry::new();
        for (principal, tier) in &self.operator_tiers {
            tiers.set_tier(principal.clone(), *tier);
        }
        for (vessel, tier) in &self.vessel_requirements {
            tiers.set_vessel_requirement(vessel.clone(), *tier);
        }
        let mut roles = RoleRegistry::new();
        for (principal, granted) in &self.role_grants {
            for role in granted {
                roles.grant(principal.clone(), *role);
            }
        }
        AccessRegistry::with_tables(self.supervisor.clone(), tiers, roles)
    }

    /// The telemetry throttle.
    pub fn throttle(&self) -> TelemetryThrottle {
        TelemetryThrottle::new(self.telemetry.min_update_interval_secs)
    }

    /// Open the configured audit sink.
    pub fn audit_sink(&self) -> Result<Arc<dyn AuditSink>, ConfigError> {
        match &self.audit.log_path {
            Some(path) => Ok(Arc::new(JsonlAuditLog::open(path)?)),
            None => Ok(Arc::new(InMemoryAuditLog::new())),
        }
    }

    /// Assemble an engine for this plant.
    pub fn build_engine(&self, clock: Arc<dyn Clock>) -> Result<BatchLifecycle, ConfigError> {
        Ok(BatchLifecycle::new(
            Arc::new(self.registry()),
            Arc::new(EmergencyHaltSwitch::new()),
            self.audit_sink()?,
            self.throttle(),
            clock,
        ))
    }
}
