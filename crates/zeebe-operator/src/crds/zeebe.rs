use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::common::{BackendSpec, Condition};

/// Desired state of a Zeebe cluster.
#[derive(CustomResource, Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[kube(
    group = "camunda-cloud.io.camunda",
    version = "v1",
    kind = "Zeebe",
    namespaced,
    status = "ZeebeStatus",
    shortname = "zb",
    printcolumn = r#"{"name":"Ready","type":"integer","jsonPath":".status.readyReplicas"}"#,
    printcolumn = r#"{"name":"Desired","type":"integer","jsonPath":".status.replicas"}"#,
    printcolumn = r#"{"name":"Phase","type":"string","jsonPath":".status.phase"}"#,
    printcolumn = r#"{"name":"Age","type":"date","jsonPath":".metadata.creationTimestamp"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct ZeebeSpec {
    /// Broker configuration.
    #[serde(default)]
    pub broker: BrokerSpec,

    /// Gateway configuration.
    #[serde(default)]
    pub gateway: GatewaySpec,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct BrokerSpec {
    #[serde(default)]
    pub partitions: PartitionsSpec,

    #[serde(default)]
    pub backend: BackendSpec,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PartitionsSpec {
    /// How many partitions the cluster should have.
    #[serde(default)]
    #[schemars(range(min = 1, max = 127))]
    pub count: Option<i32>,

    /// How often a partition should be replicated.
    #[serde(default)]
    #[schemars(range(min = 1, max = 127))]
    pub replication: Option<i32>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct GatewaySpec {
    /// Run the gateway as its own workload. Unset means an embedded gateway.
    #[serde(default)]
    pub standalone: Option<bool>,

    /// Only used by a standalone gateway.
    #[serde(default)]
    pub backend: BackendSpec,
}

/// Observed state of a Zeebe cluster.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ZeebeStatus {
    /// Pending, Running or Invalid.
    #[serde(default)]
    pub phase: Option<String>,

    /// Desired broker replicas of the last applied spec.
    #[serde(default)]
    pub replicas: i32,

    /// Ready broker replicas as reported by the StatefulSet.
    #[serde(default)]
    pub ready_replicas: i32,

    /// Last observed generation.
    #[serde(default)]
    pub observed_generation: Option<i64>,

    /// Status conditions.
    #[serde(default)]
    pub conditions: Vec<Condition>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use kube::CustomResourceExt;

    #[test]
    fn test_crd_generates_valid_schema() {
        let crd = Zeebe::crd();
        let yaml = serde_yaml::to_string(&crd).expect("CRD should serialize to YAML");
        assert!(yaml.contains("Zeebe"));
        assert!(yaml.contains("camunda-cloud.io.camunda"));
        assert!(yaml.contains("zeebes"));
        assert_eq!(crd.spec.versions[0].name, "v1");
        assert!(crd.spec.versions[0]
            .subresources
            .as_ref()
            .and_then(|s| s.status.as_ref())
            .is_some());
    }

    #[test]
    fn test_spec_leaves_required_fields_unresolved() {
        let spec: ZeebeSpec = serde_json::from_str("{}").unwrap();
        assert!(spec.broker.partitions.count.is_none());
        assert!(spec.broker.partitions.replication.is_none());
        assert!(spec.broker.backend.replicas.is_none());
        assert!(spec.gateway.standalone.is_none());
    }

    #[test]
    fn test_spec_parses_camel_case() {
        let spec: ZeebeSpec = serde_json::from_str(
            r#"{
                "broker": {
                    "partitions": {"count": 3, "replication": 2},
                    "backend": {"imageName": "camunda/zeebe", "imageTag": "8.1.0", "replicas": 3}
                },
                "gateway": {"standalone": true}
            }"#,
        )
        .unwrap();
        assert_eq!(spec.broker.partitions.count, Some(3));
        assert_eq!(spec.broker.partitions.replication, Some(2));
        assert_eq!(spec.broker.backend.image_tag, "8.1.0");
        assert_eq!(spec.gateway.standalone, Some(true));
    }
}
