use k8s_openapi::api::core::v1::{EnvVar, ResourceRequirements};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Container image, resources, environment and scale of one Zeebe component.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct BackendSpec {
    /// Repository and name of the container image.
    #[serde(default)]
    pub image_name: String,

    /// Tag of the container image.
    #[serde(default)]
    pub image_tag: String,

    /// Resource requests and limits, copied onto the container as given.
    #[serde(default)]
    pub resources: Option<ResourceRequirements>,

    /// Variables set here take precedence over those derived by the operator.
    #[serde(default)]
    pub override_env: Vec<EnvVar>,

    /// Number of replicas of the component.
    #[serde(default)]
    #[schemars(range(min = 1, max = 127))]
    pub replicas: Option<i32>,
}

/// Kubernetes-style condition for status reporting.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    /// Condition type ("Ready", "Valid").
    #[serde(rename = "type")]
    pub type_: String,

    /// Status: "True", "False", or "Unknown".
    pub status: String,

    /// Machine-readable reason.
    #[serde(default)]
    pub reason: Option<String>,

    /// Human-readable message.
    #[serde(default)]
    pub message: Option<String>,

    /// Last transition time (RFC 3339).
    #[serde(default)]
    pub last_transition_time: Option<String>,
}
