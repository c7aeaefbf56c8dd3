//! # CRD Generator
//!
//! Prints the `SecretStore` and `ClusterSecretStore` CustomResourceDefinitions
//! as a multi-document YAML stream.
//!
//! ```bash
//! cargo run --bin crdgen > config/crd/secretstores.yaml
//! ```

use kube::core::CustomResourceExt;
use secret_store_controller::crd::{ClusterSecretStore, SecretStore};

fn main() {
    let crds = [SecretStore::crd(), ClusterSecretStore::crd()];

    println!("# This file is auto-generated by crdgen");
    println!("# DO NOT EDIT THIS FILE MANUALLY");
    for crd in &crds {
        match serde_yaml::to_string(crd) {
            Ok(yaml) => {
                println!("---");
                print!("{yaml}");
            }
            Err(e) => {
                eprintln!("Failed to serialize CRD to YAML: {e}");
                std::process::exit(1);
            }
        }
    }
}
