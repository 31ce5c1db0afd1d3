use std::collections::BTreeMap;

use k8s_openapi::api::apps::v1::{StatefulSet, StatefulSetSpec};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{LabelSelector, ObjectMeta};

use super::pod_builder::build_broker_pod_template;
use super::pvc_builder::build_data_claim_template;
use crate::identity::ClusterIdentity;
use crate::normalize::NormalizedSpec;

/// Build the broker StatefulSet.
pub fn build_broker_statefulset(
    identity: &ClusterIdentity,
    spec: &NormalizedSpec,
    labels: BTreeMap<String, String>,
) -> StatefulSet {
    StatefulSet {
        metadata: ObjectMeta {
            name: Some(identity.workload_name().to_string()),
            namespace: Some(identity.namespace.clone()),
            labels: Some(labels.clone()),
            ..Default::default()
        },
        spec: Some(StatefulSetSpec {
            service_name: identity.endpoint_name().to_string(),
            replicas: Some(spec.replicas as i32),
            selector: LabelSelector {
                match_labels: Some(labels.clone()),
                ..Default::default()
            },
            template: build_broker_pod_template(identity, spec, labels),
            volume_claim_templates: Some(vec![build_data_claim_template()]),
            ..Default::default()
        }),
        ..Default::default()
    }
}
