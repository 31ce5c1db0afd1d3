//! In-memory [`ClusterStore`].
//!
//! Behaves like a tiny API server: it assigns uids and resource versions,
//! reports `Unchanged` when an applied object matches what is stored, and
//! garbage-collects owned objects when their owner is deleted.

use std::collections::{BTreeMap, BTreeSet};

use async_trait::async_trait;
use k8s_openapi::api::apps::v1::StatefulSet;
use k8s_openapi::api::core::v1::{ConfigMap, Service};
use parking_lot::Mutex;

use crate::crds::{Zeebe, ZeebeStatus};
use crate::error::{OperatorError, Result};
use crate::store::{ApplyOutcome, ClusterStore, DerivedObject};

/// Store call that can be made to fail.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum FailPoint {
    GetCluster,
    /// Applying objects of the given kind.
    Apply(&'static str),
    ReadyReplicas,
    PatchStatus,
}

/// A recorded write, in call order.
#[derive(Clone, Debug, PartialEq)]
pub enum Write {
    Apply {
        kind: &'static str,
        name: String,
        outcome: ApplyOutcome,
    },
    Status {
        name: String,
        status: ZeebeStatus,
    },
}

type ObjectKey = (&'static str, String, String);

struct Entry {
    object: DerivedObject,
    resource_version: u64,
}

#[derive(Default)]
struct Inner {
    clusters: BTreeMap<(String, String), Zeebe>,
    objects: BTreeMap<ObjectKey, Entry>,
    ready: BTreeMap<(String, String), i32>,
    failures: BTreeSet<FailPoint>,
    writes: Vec<Write>,
    next_uid: u64,
    next_version: u64,
}

#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a Zeebe resource the way the API server would.
    ///
    /// New resources get a uid and generation 1. Re-inserting an existing
    /// resource keeps its uid and status and bumps the generation.
    pub fn insert_cluster(&self, mut cluster: Zeebe) -> Zeebe {
        let mut inner = self.inner.lock();
        let key = cluster_key(&cluster);

        match inner.clusters.get(&key) {
            Some(existing) => {
                cluster.metadata.uid = existing.metadata.uid.clone();
                cluster.metadata.generation = existing.metadata.generation.map(|g| g + 1);
                cluster.status = existing.status.clone();
            }
            None => {
                inner.next_uid += 1;
                cluster.metadata.uid = Some(format!("uid-{}", inner.next_uid));
                cluster.metadata.generation = Some(1);
            }
        }

        inner.clusters.insert(key, cluster.clone());
        cluster
    }

    /// Delete a Zeebe resource and collect everything it controls.
    ///
    /// Returns the number of collected objects.
    pub fn delete_cluster(&self, namespace: &str, name: &str) -> usize {
        let mut inner = self.inner.lock();
        let Some(cluster) = inner.clusters.remove(&(namespace.into(), name.into())) else {
            return 0;
        };
        let Some(uid) = cluster.metadata.uid else {
            return 0;
        };

        let before = inner.objects.len();
        inner.objects.retain(|_, entry| {
            !entry
                .object
                .metadata()
                .owner_references
                .iter()
                .flatten()
                .any(|r| r.uid == uid)
        });
        before - inner.objects.len()
    }

    pub fn set_ready_replicas(&self, namespace: &str, name: &str, ready: i32) {
        self.inner
            .lock()
            .ready
            .insert((namespace.into(), name.into()), ready);
    }

    /// Make every call through `point` fail until [`clear_failures`](Self::clear_failures).
    pub fn fail(&self, point: FailPoint) {
        self.inner.lock().failures.insert(point);
    }

    pub fn clear_failures(&self) {
        self.inner.lock().failures.clear();
    }

    pub fn writes(&self) -> Vec<Write> {
        self.inner.lock().writes.clone()
    }

    pub fn clear_writes(&self) {
        self.inner.lock().writes.clear();
    }

    pub fn object_count(&self) -> usize {
        self.inner.lock().objects.len()
    }

    pub fn object(&self, kind: &'static str, namespace: &str, name: &str) -> Option<DerivedObject> {
        self.inner
            .lock()
            .objects
            .get(&(kind, namespace.into(), name.into()))
            .map(|e| e.object.clone())
    }

    pub fn resource_version(&self, kind: &'static str, namespace: &str, name: &str) -> Option<u64> {
        self.inner
            .lock()
            .objects
            .get(&(kind, namespace.into(), name.into()))
            .map(|e| e.resource_version)
    }

    pub fn config_map(&self, namespace: &str, name: &str) -> Option<ConfigMap> {
        match self.object("ConfigMap", namespace, name)? {
            DerivedObject::ConfigMap(cm) => Some(cm),
            _ => None,
        }
    }

    pub fn service(&self, namespace: &str, name: &str) -> Option<Service> {
        match self.object("Service", namespace, name)? {
            DerivedObject::Service(svc) => Some(svc),
            _ => None,
        }
    }

    pub fn stateful_set(&self, namespace: &str, name: &str) -> Option<StatefulSet> {
        match self.object("StatefulSet", namespace, name)? {
            DerivedObject::StatefulSet(sts) => Some(sts),
            _ => None,
        }
    }

    pub fn cluster(&self, namespace: &str, name: &str) -> Option<Zeebe> {
        self.inner
            .lock()
            .clusters
            .get(&(namespace.into(), name.into()))
            .cloned()
    }

    pub fn status(&self, namespace: &str, name: &str) -> Option<ZeebeStatus> {
        self.cluster(namespace, name)?.status
    }

    fn check(&self, point: FailPoint) -> Result<()> {
        if self.inner.lock().failures.contains(&point) {
            Err(OperatorError::Store(format!("injected failure at {point:?}")))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl ClusterStore for MemoryStore {
    async fn get_cluster(&self, namespace: &str, name: &str) -> Result<Option<Zeebe>> {
        self.check(FailPoint::GetCluster)?;
        Ok(self.cluster(namespace, name))
    }

    async fn apply(&self, object: &DerivedObject) -> Result<ApplyOutcome> {
        self.check(FailPoint::Apply(object.kind()))?;

        let mut inner = self.inner.lock();
        let key = (
            object.kind(),
            object.namespace().unwrap_or("default").to_string(),
            object.name_any(),
        );

        let outcome = match inner.objects.get(&key) {
            Some(entry) if entry.object == *object => ApplyOutcome::Unchanged,
            Some(_) => ApplyOutcome::Updated,
            None => ApplyOutcome::Created,
        };

        if outcome != ApplyOutcome::Unchanged {
            inner.next_version += 1;
            let resource_version = inner.next_version;
            inner.objects.insert(
                key,
                Entry {
                    object: object.clone(),
                    resource_version,
                },
            );
        }

        inner.writes.push(Write::Apply {
            kind: object.kind(),
            name: object.name_any(),
            outcome,
        });
        Ok(outcome)
    }

    async fn ready_replicas(&self, namespace: &str, name: &str) -> Result<Option<i32>> {
        self.check(FailPoint::ReadyReplicas)?;

        let inner = self.inner.lock();
        let key = ("StatefulSet", namespace.to_string(), name.to_string());
        if !inner.objects.contains_key(&key) {
            return Ok(None);
        }
        Ok(Some(
            inner
                .ready
                .get(&(namespace.into(), name.into()))
                .copied()
                .unwrap_or(0),
        ))
    }

    async fn patch_status(&self, namespace: &str, name: &str, status: &ZeebeStatus) -> Result<()> {
        self.check(FailPoint::PatchStatus)?;

        let mut inner = self.inner.lock();
        let Some(cluster) = inner.clusters.get_mut(&(namespace.into(), name.into())) else {
            return Err(OperatorError::Kube(kube::Error::Api(
                kube::core::ErrorResponse {
                    status: "Failure".into(),
                    message: format!("zeebes \"{name}\" not found"),
                    reason: "NotFound".into(),
                    code: 404,
                },
            )));
        };
        cluster.status = Some(status.clone());

        inner.writes.push(Write::Status {
            name: name.into(),
            status: status.clone(),
        });
        Ok(())
    }
}

fn cluster_key(cluster: &Zeebe) -> (String, String) {
    (
        cluster.metadata.namespace.clone().unwrap_or_else(|| "default".into()),
        cluster.metadata.name.clone().unwrap_or_default(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testkit::fixtures::zeebe;
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::{ObjectMeta, OwnerReference};

    fn owned_config_map(name: &str, owner_uid: &str) -> DerivedObject {
        DerivedObject::ConfigMap(ConfigMap {
            metadata: ObjectMeta {
                name: Some(name.into()),
                namespace: Some("ns".into()),
                owner_references: Some(vec![OwnerReference {
                    uid: owner_uid.into(),
                    ..Default::default()
                }]),
                ..Default::default()
            },
            ..Default::default()
        })
    }

    #[test]
    fn test_insert_assigns_uid_and_generation() {
        let store = MemoryStore::new();
        let first = store.insert_cluster(zeebe("a", "ns"));
        assert_eq!(first.metadata.uid.as_deref(), Some("uid-1"));
        assert_eq!(first.metadata.generation, Some(1));

        let again = store.insert_cluster(zeebe("a", "ns"));
        assert_eq!(again.metadata.uid.as_deref(), Some("uid-1"));
        assert_eq!(again.metadata.generation, Some(2));
    }

    #[tokio::test]
    async fn test_apply_outcomes() {
        let store = MemoryStore::new();
        let cm = owned_config_map("cm", "uid-1");

        assert_eq!(store.apply(&cm).await.unwrap(), ApplyOutcome::Created);
        assert_eq!(store.apply(&cm).await.unwrap(), ApplyOutcome::Unchanged);
        assert_eq!(store.resource_version("ConfigMap", "ns", "cm"), Some(1));

        let changed = owned_config_map("cm", "uid-2");
        assert_eq!(store.apply(&changed).await.unwrap(), ApplyOutcome::Updated);
        assert_eq!(store.resource_version("ConfigMap", "ns", "cm"), Some(2));
        assert_eq!(store.writes().len(), 3);
    }

    #[tokio::test]
    async fn test_delete_collects_owned_objects() {
        let store = MemoryStore::new();
        let owner = store.insert_cluster(zeebe("a", "ns"));
        let uid = owner.metadata.uid.unwrap();

        store.apply(&owned_config_map("mine", &uid)).await.unwrap();
        store.apply(&owned_config_map("other", "uid-99")).await.unwrap();

        assert_eq!(store.delete_cluster("ns", "a"), 1);
        assert!(store.config_map("ns", "mine").is_none());
        assert!(store.config_map("ns", "other").is_some());
    }

    #[tokio::test]
    async fn test_failure_injection() {
        let store = MemoryStore::new();
        store.fail(FailPoint::Apply("ConfigMap"));

        let err = store.apply(&owned_config_map("cm", "u")).await.unwrap_err();
        assert!(matches!(err, OperatorError::Store(_)));
        assert_eq!(store.object_count(), 0);

        store.clear_failures();
        assert!(store.apply(&owned_config_map("cm", "u")).await.is_ok());
    }
}
