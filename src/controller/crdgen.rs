//! # CRD Generator
//!
//! Prints the CustomResourceDefinitions for every kind the operator manages as
//! one multi-document YAML stream.
//!
//! ```bash
//! cargo run --bin crdgen > config/crd/all.yaml
//! cargo run --bin crdgen -- --kind PkiSecretEngineConfig | kubectl apply -f -
//! ```

use anyhow::{bail, Context, Result};
use clap::Parser;
use k8s_openapi::apiextensions_apiserver::pkg::apis::apiextensions::v1::CustomResourceDefinition;
use kube::core::CustomResourceExt;
use vault_config_operator::crd::{
    AuthEngineMount, DatabaseSecretEngineConfig, LdapAuthEngineConfig, PkiSecretEngineConfig,
    Policy, RandomSecret, SecretEngineMount,
};

#[derive(Debug, Parser)]
#[command(name = "crdgen", about = "Print the operator's CRDs as YAML")]
struct Args {
    /// Only print the CRD for this kind (repeatable)
    #[arg(long = "kind")]
    kinds: Vec<String>,
}

fn all_crds() -> Vec<CustomResourceDefinition> {
    vec![
        Policy::crd(),
        SecretEngineMount::crd(),
        AuthEngineMount::crd(),
        DatabaseSecretEngineConfig::crd(),
        LdapAuthEngineConfig::crd(),
        RandomSecret::crd(),
        PkiSecretEngineConfig::crd(),
    ]
}

fn main() -> Result<()> {
    let args = Args::parse();
    let crds: Vec<_> = all_crds()
        .into_iter()
        .filter(|crd| args.kinds.is_empty() || args.kinds.contains(&crd.spec.names.kind))
        .collect();
    if crds.is_empty() {
        bail!("no CRD matches kinds {:?}", args.kinds);
    }

    println!("# This file is auto-generated by crdgen");
    println!("# DO NOT EDIT THIS FILE MANUALLY");
    for crd in &crds {
        let yaml = serde_yaml::to_string(crd)
            .with_context(|| format!("failed to serialize CRD {}", crd.spec.names.kind))?;
        println!("---");
        print!("{yaml}");
    }
    Ok(())
}
