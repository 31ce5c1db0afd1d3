//! Access to the cluster state the reconciler reads and writes.
//!
//! [`ClusterStore`] is the only way a reconciliation pass touches the outside
//! world. [`KubeStore`] talks to the API server; tests use the in-memory
//! store from the `testkit` feature.

use std::fmt::Debug;

use async_trait::async_trait;
use k8s_openapi::api::apps::v1::StatefulSet;
use k8s_openapi::api::core::v1::{ConfigMap, Service};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use k8s_openapi::NamespaceResourceScope;
use kube::api::{Api, Patch, PatchParams};
use kube::{Client, Resource, ResourceExt};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info};

use crate::crds::{Zeebe, ZeebeStatus};
use crate::error::Result;

/// One object derived from a Zeebe resource.
#[derive(Clone, Debug, PartialEq)]
pub enum DerivedObject {
    ConfigMap(ConfigMap),
    Service(Service),
    StatefulSet(StatefulSet),
}

impl DerivedObject {
    pub fn kind(&self) -> &'static str {
        match self {
            DerivedObject::ConfigMap(_) => "ConfigMap",
            DerivedObject::Service(_) => "Service",
            DerivedObject::StatefulSet(_) => "StatefulSet",
        }
    }

    pub fn metadata(&self) -> &ObjectMeta {
        match self {
            DerivedObject::ConfigMap(o) => &o.metadata,
            DerivedObject::Service(o) => &o.metadata,
            DerivedObject::StatefulSet(o) => &o.metadata,
        }
    }

    /// `metadata.name`, `None` for an object that was never named.
    pub fn name(&self) -> Option<&str> {
        self.metadata().name.as_deref()
    }

    /// Name for logs and reports. Planned objects always carry a name.
    pub fn name_any(&self) -> String {
        match self {
            DerivedObject::ConfigMap(o) => o.name_any(),
            DerivedObject::Service(o) => o.name_any(),
            DerivedObject::StatefulSet(o) => o.name_any(),
        }
    }

    pub fn namespace(&self) -> Option<&str> {
        self.metadata().namespace.as_deref()
    }
}

/// What applying one object did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ApplyOutcome {
    Created,
    Updated,
    Unchanged,
}

impl ApplyOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApplyOutcome::Created => "created",
            ApplyOutcome::Updated => "updated",
            ApplyOutcome::Unchanged => "unchanged",
        }
    }
}

#[async_trait]
pub trait ClusterStore: Send + Sync {
    /// Current Zeebe resource, `None` once it has been deleted.
    async fn get_cluster(&self, namespace: &str, name: &str) -> Result<Option<Zeebe>>;

    /// Create the object or bring the live object in line with it.
    async fn apply(&self, object: &DerivedObject) -> Result<ApplyOutcome>;

    /// Ready replicas of a StatefulSet, `None` if it does not exist yet.
    async fn ready_replicas(&self, namespace: &str, name: &str) -> Result<Option<i32>>;

    /// Replace the status subresource of a Zeebe resource.
    async fn patch_status(&self, namespace: &str, name: &str, status: &ZeebeStatus) -> Result<()>;
}

/// [`ClusterStore`] backed by the Kubernetes API.
#[derive(Clone)]
pub struct KubeStore {
    client: Client,
    field_manager: String,
}

impl KubeStore {
    pub fn new(client: Client, field_manager: impl Into<String>) -> Self {
        Self {
            client,
            field_manager: field_manager.into(),
        }
    }

    /// Server-side apply, which also creates missing objects. The lookup
    /// beforehand only tells a create from an update.
    async fn apply_typed<K>(&self, object: &K) -> Result<ApplyOutcome>
    where
        K: Resource<Scope = NamespaceResourceScope>
            + Clone
            + Debug
            + Serialize
            + DeserializeOwned
            + Send
            + Sync,
        <K as Resource>::DynamicType: Default,
    {
        let name = object.name_any();
        let namespace = object.namespace().unwrap_or_else(|| "default".into());
        let kind = K::kind(&Default::default()).to_string();
        let api: Api<K> = Api::namespaced(self.client.clone(), &namespace);

        let before = api.get_opt(&name).await?.and_then(|o| o.resource_version());
        let applied = api
            .patch(&name, &apply_params(&self.field_manager), &Patch::Apply(object))
            .await?;

        let outcome = apply_outcome(before.as_deref(), applied.resource_version().as_deref());
        match outcome {
            ApplyOutcome::Unchanged => debug!(kind = %kind, name = %name, "Unchanged"),
            _ => info!(
                kind = %kind,
                name = %name,
                namespace = %namespace,
                outcome = outcome.as_str(),
                "Applied"
            ),
        }
        Ok(outcome)
    }
}

/// Every write goes through the same field manager and takes ownership of
/// conflicting fields.
fn apply_params(field_manager: &str) -> PatchParams {
    PatchParams::apply(field_manager).force()
}

/// Classify an apply from the `resourceVersion` seen before it and the one it
/// returned.
fn apply_outcome(before: Option<&str>, after: Option<&str>) -> ApplyOutcome {
    match before {
        None => ApplyOutcome::Created,
        Some(b) if Some(b) == after => ApplyOutcome::Unchanged,
        Some(_) => ApplyOutcome::Updated,
    }
}

#[async_trait]
impl ClusterStore for KubeStore {
    async fn get_cluster(&self, namespace: &str, name: &str) -> Result<Option<Zeebe>> {
        let api: Api<Zeebe> = Api::namespaced(self.client.clone(), namespace);
        Ok(api.get_opt(name).await?)
    }

    async fn apply(&self, object: &DerivedObject) -> Result<ApplyOutcome> {
        match object {
            DerivedObject::ConfigMap(o) => self.apply_typed(o).await,
            DerivedObject::Service(o) => self.apply_typed(o).await,
            DerivedObject::StatefulSet(o) => self.apply_typed(o).await,
        }
    }

    async fn ready_replicas(&self, namespace: &str, name: &str) -> Result<Option<i32>> {
        let api: Api<StatefulSet> = Api::namespaced(self.client.clone(), namespace);
        let sts = api.get_opt(name).await?;
        Ok(sts.map(|s| s.status.and_then(|st| st.ready_replicas).unwrap_or(0)))
    }

    async fn patch_status(&self, namespace: &str, name: &str, status: &ZeebeStatus) -> Result<()> {
        let api: Api<Zeebe> = Api::namespaced(self.client.clone(), namespace);
        let patch = serde_json::json!({ "status": serde_json::to_value(status)? });
        api.patch_status(name, &PatchParams::default(), &Patch::Merge(&patch))
            .await?;
        debug!(name = %name, namespace = %namespace, "Status updated");
        Ok(())
    }
}
