//! Path shapes for the Vault endpoints the operator talks to

use crate::clean::join;

/// Listing of enabled auth methods (used to resolve mount accessors)
pub const SYS_AUTH: &str = "sys/auth";

/// Certificate authority type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CaType {
    Root,
    Intermediate,
}

impl CaType {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            CaType::Root => "root",
            CaType::Intermediate => "intermediate",
        }
    }
}

/// Private key handling requested at generation time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyMode {
    /// Key never leaves Vault
    Internal,
    /// Key is returned once in the generate response
    Exported,
}

impl KeyMode {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            KeyMode::Internal => "internal",
            KeyMode::Exported => "exported",
        }
    }
}

/// Operations on a PKI secrets engine mount
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PkiOperation {
    /// `<mount>/<type>/generate/<mode>`
    Generate(CaType, KeyMode),
    /// `<mount>/root/sign-intermediate`, issued against the signing CA's mount
    SignIntermediate,
    /// `<mount>/intermediate/set-signed`
    SetSigned,
    /// `<mount>/config/urls`
    ConfigUrls,
    /// `<mount>/root`, removes CA material
    DeleteRoot,
}

impl PkiOperation {
    #[must_use]
    pub fn path(self, mount: &str) -> String {
        match self {
            PkiOperation::Generate(ca_type, mode) => {
                join(&[mount, ca_type.as_str(), "generate", mode.as_str()])
            }
            PkiOperation::SignIntermediate => join(&[mount, "root", "sign-intermediate"]),
            PkiOperation::SetSigned => join(&[mount, "intermediate", "set-signed"]),
            PkiOperation::ConfigUrls => join(&[mount, "config", "urls"]),
            PkiOperation::DeleteRoot => join(&[mount, "root"]),
        }
    }
}

/// Which `sys/` table a mount lives in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MountKind {
    Secret,
    Auth,
}

impl MountKind {
    /// Listing of every mount of this kind, keyed by `<path>/`
    #[must_use]
    pub fn table(self) -> &'static str {
        match self {
            MountKind::Secret => "sys/mounts",
            MountKind::Auth => "sys/auth",
        }
    }

    /// `sys/mounts/<path>/<name>` or `sys/auth/<path>/<name>`
    #[must_use]
    pub fn mount_path(self, path: &str, name: &str) -> String {
        join(&[self.table(), path, name])
    }

    /// Key of a mount in the [`MountKind::table`] listing
    #[must_use]
    pub fn table_key(path: &str, name: &str) -> String {
        format!("{}/", join(&[path, name]))
    }

    /// Tunable configuration of an existing mount
    #[must_use]
    pub fn tune_path(self, path: &str, name: &str) -> String {
        join(&[self.table(), path, name, "tune"])
    }
}

/// Kubernetes auth login endpoint for a given auth mount
#[must_use]
pub fn auth_login(mount: &str) -> String {
    join(&["auth", mount, "login"])
}

/// Password generation from a named password policy
#[must_use]
pub fn password_policy_generate(policy: &str) -> String {
    join(&["sys/policies/password", policy, "generate"])
}

/// Location of a key/value secret. Version 2 engines insert `data/` after the mount.
#[must_use]
pub fn kv_path(mount: &str, name: &str, kv_v2: bool) -> String {
    if kv_v2 {
        join(&[mount, "data", name])
    } else {
        join(&[mount, name])
    }
}

/// Metadata of a version 2 key/value secret. Deleting it removes every version.
#[must_use]
pub fn kv_metadata_path(mount: &str, name: &str) -> String {
    join(&[mount, "metadata", name])
}
