use std::collections::BTreeMap;

use k8s_openapi::api::core::v1::ConfigMap;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;

use crate::constants::broker;
use crate::identity::ClusterIdentity;

/// Build the ConfigMap holding the broker bootstrap script.
///
/// The script derives the numeric node id from the pod ordinal and execs the
/// broker. It is mounted into every pod at `/usr/local/bin/startup.sh`.
pub fn build_startup_configmap(
    identity: &ClusterIdentity,
    labels: BTreeMap<String, String>,
) -> ConfigMap {
    let data = BTreeMap::from([(
        broker::STARTUP_SCRIPT_KEY.to_string(),
        broker::STARTUP_SCRIPT.to_string(),
    )]);

    ConfigMap {
        metadata: ObjectMeta {
            name: Some(identity.configmap_name()),
            namespace: Some(identity.namespace.clone()),
            labels: Some(labels),
            ..Default::default()
        },
        data: Some(data),
        ..Default::default()
    }
}
