//! PKI certificate authority payloads and validation
//!
//! The multi-step CA lifecycle lives in `controller::pki`; this module only
//! describes what gets sent to Vault at each step.

use super::{put_csv, put_str, InternalValues, VaultObject};
use crate::crd::{
    KubeAuthConfiguration, PkiCaType, PkiSecretEngineConfig, PkiSecretEngineConfigSpec, VaultConnection,
    VaultObjectStatus,
};
use crate::crd::CaState;
use crate::validation::{require_non_empty, validate_optional_duration, ValidationError};
use crate::vault::Payload;
use async_trait::async_trait;
use vault_paths::builder::VaultPath;
use vault_paths::errors::PathBuilderError;
use vault_paths::operations::PkiOperation;

fn subject_fields(spec: &PkiSecretEngineConfigSpec, payload: &mut Payload) {
    payload.insert("common_name".to_string(), spec.common_name.clone().into());
    put_csv(payload, "alt_names", &spec.alt_names);
    put_csv(payload, "ip_sans", &spec.ip_sans);
    put_csv(payload, "uri_sans", &spec.uri_sans);
    put_csv(payload, "other_sans", &spec.other_sans);
    put_str(payload, "ttl", spec.ttl.as_deref());
    put_str(payload, "format", spec.format.as_deref());
    payload.insert("exclude_cn_from_sans".to_string(), spec.exclude_cn_from_sans.into());
    if let Some(max_path_length) = spec.max_path_length {
        payload.insert("max_path_length".to_string(), max_path_length.into());
    }
    put_csv(payload, "permitted_dns_domains", &spec.permitted_dns_domains);
    put_str(payload, "ou", spec.ou.as_deref());
    put_str(payload, "organization", spec.organization.as_deref());
    put_str(payload, "country", spec.country.as_deref());
    put_str(payload, "locality", spec.locality.as_deref());
    put_str(payload, "province", spec.province.as_deref());
    put_str(payload, "street_address", spec.street_address.as_deref());
    put_str(payload, "postal_code", spec.postal_code.as_deref());
}

/// Body for `<path>/<type>/generate/<mode>`
#[must_use]
pub fn generate_payload(spec: &PkiSecretEngineConfigSpec) -> Payload {
    let mut payload = Payload::new();
    subject_fields(spec, &mut payload);
    put_str(&mut payload, "private_key_format", spec.private_key_format.as_deref());
    put_str(&mut payload, "key_type", spec.key_type.as_deref());
    if let Some(key_bits) = spec.key_bits {
        payload.insert("key_bits".to_string(), key_bits.into());
    }
    payload
}

/// Body sent to the signing CA's `root/sign-intermediate`
#[must_use]
pub fn sign_intermediate_payload(spec: &PkiSecretEngineConfigSpec, csr: &str) -> Payload {
    let mut payload = Payload::new();
    payload.insert("csr".to_string(), csr.into());
    subject_fields(spec, &mut payload);
    payload.insert("use_csr_values".to_string(), false.into());
    payload
}

/// Body for `<path>/config/urls`, `None` when no URL is declared
#[must_use]
pub fn urls_payload(spec: &PkiSecretEngineConfigSpec) -> Option<Payload> {
    if spec.issuing_certificates.is_empty()
        && spec.crl_distribution_points.is_empty()
        && spec.ocsp_servers.is_empty()
    {
        return None;
    }
    let mut payload = Payload::new();
    payload.insert("issuing_certificates".to_string(), spec.issuing_certificates.clone().into());
    payload.insert(
        "crl_distribution_points".to_string(),
        spec.crl_distribution_points.clone().into(),
    );
    payload.insert("ocsp_servers".to_string(), spec.ocsp_servers.clone().into());
    Some(payload)
}

impl PkiSecretEngineConfig {
    #[must_use]
    pub fn ca_state(&self) -> CaState {
        self.status
            .as_ref()
            .map(|status| status.ca_state)
            .unwrap_or_default()
    }

    /// Reject changes to fields fixed at generation time
    ///
    /// # Errors
    ///
    /// [`ValidationError::Immutable`] for a changed `type` or `privateKeyType`.
    pub fn check_immutable_fields(&self) -> Result<(), ValidationError> {
        let Some(status) = &self.status else {
            return Ok(());
        };
        if let Some(observed) = status.observed_type {
            if observed != self.spec.ca_type {
                return Err(ValidationError::Immutable {
                    field: "spec.type".to_string(),
                    was: format!("{observed:?}").to_lowercase(),
                    now: format!("{:?}", self.spec.ca_type).to_lowercase(),
                });
            }
        }
        if let Some(observed) = status.observed_private_key_type {
            if observed != self.spec.private_key_type {
                return Err(ValidationError::Immutable {
                    field: "spec.privateKeyType".to_string(),
                    was: format!("{observed:?}").to_lowercase(),
                    now: format!("{:?}", self.spec.private_key_type).to_lowercase(),
                });
            }
        }
        Ok(())
    }

    fn check_signing_config(&self) -> Result<(), ValidationError> {
        let internal = self.spec.internal_sign.is_some();
        let external = self.spec.external_sign_secret.is_some();
        match self.spec.ca_type {
            PkiCaType::Root if internal || external => Err(ValidationError::invalid(
                "spec.type",
                "a root CA is self-signed and cannot set internalSign or externalSignSecret",
            )),
            PkiCaType::Intermediate if internal == external => Err(ValidationError::invalid(
                "spec.type",
                "an intermediate CA needs exactly one of internalSign or externalSignSecret",
            )),
            _ => Ok(()),
        }
    }
}

#[async_trait]
impl VaultObject for PkiSecretEngineConfig {
    fn connection(&self) -> Option<&VaultConnection> {
        self.spec.connection.as_ref()
    }

    fn authentication(&self) -> &KubeAuthConfiguration {
        &self.spec.authentication
    }

    /// The mount path itself
    fn vault_path(&self) -> Result<String, PathBuilderError> {
        VaultPath::new().segment(self.spec.path.as_str()).build()
    }

    fn payload(&self, _internal: &InternalValues) -> Payload {
        generate_payload(&self.spec)
    }

    fn status(&self) -> Option<&VaultObjectStatus> {
        self.status.as_ref().map(|status| &status.common)
    }

    fn delete_path(&self) -> String {
        PkiOperation::DeleteRoot.path(&self.path())
    }

    fn is_valid(&self) -> Result<(), ValidationError> {
        self.vault_path()?;
        require_non_empty("spec.commonName", &self.spec.common_name)?;
        validate_optional_duration("spec.ttl", self.spec.ttl.as_deref())?;
        self.check_signing_config()?;
        self.check_immutable_fields()
    }
}
