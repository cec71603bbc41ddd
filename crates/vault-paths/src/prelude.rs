//! # Prelude
//!
//! Re-exports commonly used types. Import with `use vault_paths::prelude::*;`.

pub use crate::builder::VaultPath;
pub use crate::clean::{cleanse, effective_name, join};
pub use crate::errors::PathBuilderError;
pub use crate::operations::{CaType, KeyMode, MountKind, PkiOperation};
