//! Zeebe Kubernetes operator.
//!
//! Turns `Zeebe` custom resources into a startup ConfigMap, a headless
//! Service and a broker StatefulSet, all owned by the resource so deleting
//! it cleans up after itself.

pub mod config;
pub mod constants;
pub mod controller;
pub mod crds;
pub mod error;
pub mod identity;
pub mod metrics;
pub mod normalize;
pub mod ownership;
pub mod reconciler;
pub mod resources;
pub mod store;
pub mod telemetry;

#[cfg(any(test, feature = "testkit"))]
pub mod testkit;

pub use crds::Zeebe;
pub use error::{OperatorError, Result, ValidationError};
pub use reconciler::{ReconcileReport, Reconciler};

/// The Zeebe CRD manifest as YAML.
pub fn crd_yaml() -> std::result::Result<String, serde_yaml::Error> {
    use kube::CustomResourceExt;
    serde_yaml::to_string(&Zeebe::crd())
}
