//! Derived Kubernetes objects of a Zeebe cluster.
//!
//! Planning is pure: the same identity and spec always yield the same three
//! objects, which is what makes re-applying them idempotent.

pub mod configmap_builder;
pub mod pod_builder;
pub mod pvc_builder;
pub mod service_builder;
pub mod statefulset_builder;

use std::collections::BTreeMap;

use k8s_openapi::api::apps::v1::StatefulSet;
use k8s_openapi::api::core::v1::{ConfigMap, Service};

use crate::constants::{labels, values};
use crate::identity::ClusterIdentity;
use crate::normalize::NormalizedSpec;
use crate::store::DerivedObject;

/// The full set of objects one Zeebe resource owns.
#[derive(Clone, Debug, PartialEq)]
pub struct ClusterPlan {
    pub config_map: ConfigMap,
    pub service: Service,
    pub stateful_set: StatefulSet,
}

impl ClusterPlan {
    /// Objects in apply order. The StatefulSet goes last so its pods find the
    /// ConfigMap and Service already present.
    pub fn objects(&self) -> Vec<DerivedObject> {
        vec![
            DerivedObject::ConfigMap(self.config_map.clone()),
            DerivedObject::Service(self.service.clone()),
            DerivedObject::StatefulSet(self.stateful_set.clone()),
        ]
    }
}

/// Labels carried by every derived object. Also used as the pod selector.
pub fn cluster_labels(cluster: &str) -> BTreeMap<String, String> {
    BTreeMap::from([
        (labels::NAME.into(), values::APP_NAME.into()),
        (labels::INSTANCE.into(), cluster.into()),
        (labels::COMPONENT.into(), values::COMPONENT_BROKER.into()),
        (labels::MANAGED_BY.into(), values::MANAGED_BY.into()),
        (labels::APP.into(), cluster.into()),
    ])
}

/// Compute the derived objects of a cluster.
pub fn plan(identity: &ClusterIdentity, spec: &NormalizedSpec) -> ClusterPlan {
    let labels = cluster_labels(&identity.cluster);

    ClusterPlan {
        config_map: configmap_builder::build_startup_configmap(identity, labels.clone()),
        service: service_builder::build_headless_service(identity, labels.clone()),
        stateful_set: statefulset_builder::build_broker_statefulset(identity, spec, labels),
    }
}
