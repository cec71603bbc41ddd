//! # Status
//!
//! Status types surfaced on every kind. Conditions are the only channel
//! through which reconciliation outcomes reach users.

use super::pki::{PkiCaType, PrivateKeyType};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    pub r#type: String,
    pub status: String,
    #[serde(default)]
    pub last_transition_time: Option<String>,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl Condition {
    #[must_use]
    pub fn is_true(&self) -> bool {
        self.status == "True"
    }
}

/// Where the reconciliation pass stopped
#[derive(Debug, Clone, Copy, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
pub enum ReconcilePhase {
    Unvalidated,
    Prepared,
    Synced,
    Deleting,
}

impl ReconcilePhase {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ReconcilePhase::Unvalidated => "Unvalidated",
            ReconcilePhase::Prepared => "Prepared",
            ReconcilePhase::Synced => "Synced",
            ReconcilePhase::Deleting => "Deleting",
        }
    }
}

/// Status shared by every kind
#[derive(Debug, Clone, Default, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct VaultObjectStatus {
    #[serde(default)]
    pub conditions: Vec<Condition>,
    #[serde(default)]
    pub phase: Option<ReconcilePhase>,
    #[serde(default)]
    pub observed_generation: Option<i64>,
    #[serde(default)]
    pub last_reconcile_time: Option<String>,
    /// Earliest time the next pass does real work unless the spec changes
    #[serde(default)]
    pub next_reconcile_time: Option<String>,
    /// RandomSecret only: when the generated value was last written
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_vault_secret_update: Option<String>,
}

impl VaultObjectStatus {
    #[must_use]
    pub fn condition(&self, condition_type: &str) -> Option<&Condition> {
        self.conditions.iter().find(|c| c.r#type == condition_type)
    }

    /// Insert or replace a condition, keeping `lastTransitionTime` when the status did not flip
    pub fn set_condition(&mut self, mut condition: Condition) {
        match self
            .conditions
            .iter_mut()
            .find(|c| c.r#type == condition.r#type)
        {
            Some(existing) => {
                if existing.status == condition.status {
                    condition
                        .last_transition_time
                        .clone_from(&existing.last_transition_time);
                }
                *existing = condition;
            }
            None => self.conditions.push(condition),
        }
    }

    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.condition("Ready").is_some_and(Condition::is_true)
    }
}

/// Certificate authority progress
///
/// `Generated` and `Exported` are both "key material exists"; they differ
/// only in whether the private key was exported into a companion secret.
/// Later states carry the export flag forward so no combination of
/// generated/exported/signed can be expressed that the lifecycle cannot reach.
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(into = "CaStateRecord", from = "CaStateRecord")]
pub enum CaState {
    #[default]
    NotGenerated,
    Generated,
    Exported,
    AwaitingSignature {
        exported: bool,
    },
    Signed {
        exported: bool,
    },
}

impl CaState {
    #[must_use]
    pub fn is_generated(self) -> bool {
        !matches!(self, CaState::NotGenerated)
    }

    #[must_use]
    pub fn is_exported(self) -> bool {
        matches!(
            self,
            CaState::Exported
                | CaState::AwaitingSignature { exported: true }
                | CaState::Signed { exported: true }
        )
    }

    #[must_use]
    pub fn is_signed(self) -> bool {
        matches!(self, CaState::Signed { .. })
    }

    /// State right after generation
    #[must_use]
    pub fn generated(exported: bool) -> Self {
        if exported {
            CaState::Exported
        } else {
            CaState::Generated
        }
    }

    #[must_use]
    pub fn awaiting_signature(self) -> Self {
        CaState::AwaitingSignature {
            exported: self.is_exported(),
        }
    }

    #[must_use]
    pub fn signed(self) -> Self {
        CaState::Signed {
            exported: self.is_exported(),
        }
    }

    #[must_use]
    pub fn phase(self) -> CaPhase {
        CaStateRecord::from(self).phase
    }
}

/// Flat phase name of a [`CaState`]
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
pub enum CaPhase {
    #[default]
    NotGenerated,
    Generated,
    Exported,
    AwaitingSignature,
    Signed,
}

impl CaPhase {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            CaPhase::NotGenerated => "NotGenerated",
            CaPhase::Generated => "Generated",
            CaPhase::Exported => "Exported",
            CaPhase::AwaitingSignature => "AwaitingSignature",
            CaPhase::Signed => "Signed",
        }
    }
}

/// Wire form of [`CaState`], a structural schema the API server accepts
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CaStateRecord {
    #[serde(default)]
    pub phase: CaPhase,
    #[serde(default)]
    pub exported: bool,
}

impl From<CaState> for CaStateRecord {
    fn from(state: CaState) -> Self {
        let phase = match state {
            CaState::NotGenerated => CaPhase::NotGenerated,
            CaState::Generated => CaPhase::Generated,
            CaState::Exported => CaPhase::Exported,
            CaState::AwaitingSignature { .. } => CaPhase::AwaitingSignature,
            CaState::Signed { .. } => CaPhase::Signed,
        };
        Self {
            phase,
            exported: state.is_exported(),
        }
    }
}

impl From<CaStateRecord> for CaState {
    fn from(record: CaStateRecord) -> Self {
        match record.phase {
            CaPhase::NotGenerated => CaState::NotGenerated,
            CaPhase::Generated | CaPhase::Exported => {
                CaState::generated(record.exported || record.phase == CaPhase::Exported)
            }
            CaPhase::AwaitingSignature => CaState::AwaitingSignature {
                exported: record.exported,
            },
            CaPhase::Signed => CaState::Signed {
                exported: record.exported,
            },
        }
    }
}

/// Status of a `PkiSecretEngineConfig`
#[derive(Debug, Clone, Default, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PkiSecretEngineConfigStatus {
    #[serde(flatten)]
    pub common: VaultObjectStatus,
    #[serde(default)]
    #[schemars(with = "CaStateRecord")]
    pub ca_state: CaState,
    /// CA type recorded at generation, used to reject later changes
    #[serde(default)]
    pub observed_type: Option<PkiCaType>,
    /// Private key mode recorded at generation, used to reject later changes
    #[serde(default)]
    pub observed_private_key_type: Option<PrivateKeyType>,
}
