//! # PKI
//!
//! Certificate authority lifecycle for `PkiSecretEngineConfig`:
//!
//! ```text
//! NotGenerated -> Generated/Exported -> Signed                     (root)
//! NotGenerated -> Generated/Exported -> AwaitingSignature -> Signed (intermediate)
//! ```
//!
//! Each transition is persisted in `status.caState` so an interrupted pass
//! resumes where it stopped.

mod export;
mod lifecycle;

pub use export::{export_secret, export_secret_name, EXPORT_FIELDS};
pub use lifecycle::{reconcile_pki, CaProgress, PkiPass};
