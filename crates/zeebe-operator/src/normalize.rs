//! Resolves the optional fields of a [`ZeebeSpec`] once, up front.
//!
//! Everything downstream of [`normalize`] works on plain values; an invalid
//! spec never reaches the planner.

use std::collections::BTreeSet;

use k8s_openapi::api::core::v1::{EnvVar, ResourceRequirements};

use crate::constants::broker::MAX_SCALE;
use crate::crds::ZeebeSpec;
use crate::error::ValidationError;

/// A fully resolved Zeebe spec.
#[derive(Clone, Debug, PartialEq)]
pub struct NormalizedSpec {
    pub partitions: u32,
    pub replication: u32,
    pub replicas: u32,
    pub standalone_gateway: bool,
    pub image_name: String,
    pub image_tag: String,
    pub resources: Option<ResourceRequirements>,
    pub override_env: Vec<EnvVar>,
}

impl NormalizedSpec {
    /// The broker embeds the gateway unless a standalone gateway was requested.
    pub fn gateway_enabled(&self) -> bool {
        !self.standalone_gateway
    }

    /// `<imageName>:<imageTag>`
    pub fn image(&self) -> String {
        format!("{}:{}", self.image_name, self.image_tag)
    }
}

/// Validate the spec and resolve its defaults.
pub fn normalize(spec: &ZeebeSpec) -> Result<NormalizedSpec, ValidationError> {
    let backend = &spec.broker.backend;

    let partitions = positive("broker.partitions.count", spec.broker.partitions.count)?;
    let replication = positive(
        "broker.partitions.replication",
        spec.broker.partitions.replication,
    )?;
    let replicas = positive("broker.backend.replicas", backend.replicas)?;

    non_empty("broker.backend.imageName", &backend.image_name)?;
    non_empty("broker.backend.imageTag", &backend.image_tag)?;

    let mut seen = BTreeSet::new();
    for env in &backend.override_env {
        non_empty("broker.backend.overrideEnv.name", &env.name)?;
        if !seen.insert(env.name.as_str()) {
            return Err(ValidationError::DuplicateEnv(env.name.clone()));
        }
        if env.value.is_some() && env.value_from.is_some() {
            return Err(ValidationError::ConflictingEnvSource(env.name.clone()));
        }
    }

    Ok(NormalizedSpec {
        partitions,
        replication,
        replicas,
        standalone_gateway: spec.gateway.standalone.unwrap_or(false),
        image_name: backend.image_name.clone(),
        image_tag: backend.image_tag.clone(),
        resources: backend.resources.clone(),
        override_env: backend.override_env.clone(),
    })
}

/// Present and within `1..=MAX_SCALE`.
fn positive(field: &'static str, value: Option<i32>) -> Result<u32, ValidationError> {
    match value {
        None => Err(ValidationError::Missing(field)),
        Some(v) if v <= 0 => Err(ValidationError::NotPositive {
            field,
            value: v.into(),
        }),
        Some(v) if v > MAX_SCALE => Err(ValidationError::TooLarge {
            field,
            value: v.into(),
            max: MAX_SCALE.into(),
        }),
        Some(v) => Ok(v as u32),
    }
}

fn non_empty(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        Err(ValidationError::Empty(field))
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use k8s_openapi::api::core::v1::{EnvVarSource, SecretKeySelector};

    fn valid_spec() -> ZeebeSpec {
        serde_json::from_str(
            r#"{
                "broker": {
                    "partitions": {"count": 3, "replication": 3},
                    "backend": {"imageName": "example/engine", "imageTag": "8.1.0", "replicas": 3}
                }
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn test_normalize_valid_spec() {
        let normalized = normalize(&valid_spec()).unwrap();
        assert_eq!(normalized.partitions, 3);
        assert_eq!(normalized.replication, 3);
        assert_eq!(normalized.replicas, 3);
        assert_eq!(normalized.image(), "example/engine:8.1.0");
    }

    #[test]
    fn test_standalone_defaults_to_embedded_gateway() {
        let normalized = normalize(&valid_spec()).unwrap();
        assert!(!normalized.standalone_gateway);
        assert!(normalized.gateway_enabled());

        let mut spec = valid_spec();
        spec.gateway.standalone = Some(true);
        assert!(!normalize(&spec).unwrap().gateway_enabled());

        spec.gateway.standalone = Some(false);
        assert!(normalize(&spec).unwrap().gateway_enabled());
    }

    #[test]
    fn test_missing_partition_count() {
        let mut spec = valid_spec();
        spec.broker.partitions.count = None;
        assert_eq!(
            normalize(&spec),
            Err(ValidationError::Missing("broker.partitions.count"))
        );
    }

    #[test]
    fn test_non_positive_values_rejected() {
        for value in [0, -1, i32::MIN] {
            let mut spec = valid_spec();
            spec.broker.partitions.count = Some(value);
            assert!(matches!(
                normalize(&spec),
                Err(ValidationError::NotPositive {
                    field: "broker.partitions.count",
                    ..
                })
            ));

            let mut spec = valid_spec();
            spec.broker.partitions.replication = Some(value);
            assert!(matches!(
                normalize(&spec),
                Err(ValidationError::NotPositive {
                    field: "broker.partitions.replication",
                    ..
                })
            ));

            let mut spec = valid_spec();
            spec.broker.backend.replicas = Some(value);
            assert!(matches!(
                normalize(&spec),
                Err(ValidationError::NotPositive {
                    field: "broker.backend.replicas",
                    ..
                })
            ));
        }
    }

    #[test]
    fn test_scale_upper_bound() {
        let mut spec = valid_spec();
        spec.broker.backend.replicas = Some(127);
        spec.broker.partitions.count = Some(127);
        spec.broker.partitions.replication = Some(127);
        let normalized = normalize(&spec).unwrap();
        assert_eq!(normalized.replicas, 127);
        assert_eq!(normalized.partitions, 127);

        for (value, field) in [(128, "broker.backend.replicas"), (i32::MAX, "broker.backend.replicas")] {
            let mut spec = valid_spec();
            spec.broker.backend.replicas = Some(value);
            assert_eq!(
                normalize(&spec),
                Err(ValidationError::TooLarge {
                    field,
                    value: value.into(),
                    max: 127
                })
            );
        }

        let mut spec = valid_spec();
        spec.broker.partitions.count = Some(128);
        assert!(matches!(
            normalize(&spec),
            Err(ValidationError::TooLarge {
                field: "broker.partitions.count",
                ..
            })
        ));

        let mut spec = valid_spec();
        spec.broker.partitions.replication = Some(128);
        assert!(matches!(
            normalize(&spec),
            Err(ValidationError::TooLarge {
                field: "broker.partitions.replication",
                ..
            })
        ));
    }

    #[test]
    fn test_missing_replicas() {
        let mut spec = valid_spec();
        spec.broker.backend.replicas = None;
        assert_eq!(
            normalize(&spec),
            Err(ValidationError::Missing("broker.backend.replicas"))
        );
    }

    #[test]
    fn test_empty_image_rejected() {
        let mut spec = valid_spec();
        spec.broker.backend.image_name = String::new();
        assert_eq!(
            normalize(&spec),
            Err(ValidationError::Empty("broker.backend.imageName"))
        );

        let mut spec = valid_spec();
        spec.broker.backend.image_tag = "  ".into();
        assert_eq!(
            normalize(&spec),
            Err(ValidationError::Empty("broker.backend.imageTag"))
        );
    }

    #[test]
    fn test_duplicate_override_rejected() {
        let mut spec = valid_spec();
        spec.broker.backend.override_env = vec![
            EnvVar {
                name: "JAVA_OPTS".into(),
                value: Some("-Xmx1g".into()),
                ..Default::default()
            },
            EnvVar {
                name: "JAVA_OPTS".into(),
                value: Some("-Xmx2g".into()),
                ..Default::default()
            },
        ];
        assert_eq!(
            normalize(&spec),
            Err(ValidationError::DuplicateEnv("JAVA_OPTS".into()))
        );
    }

    #[test]
    fn test_value_and_value_from_rejected() {
        let mut spec = valid_spec();
        spec.broker.backend.override_env = vec![EnvVar {
            name: "TOKEN".into(),
            value: Some("plain".into()),
            value_from: Some(EnvVarSource {
                secret_key_ref: Some(SecretKeySelector {
                    name: Some("creds".into()),
                    key: "token".into(),
                    ..Default::default()
                }),
                ..Default::default()
            }),
        }];
        assert_eq!(
            normalize(&spec),
            Err(ValidationError::ConflictingEnvSource("TOKEN".into()))
        );
    }

    #[test]
    fn test_resources_and_overrides_pass_through() {
        let backend: crate::crds::BackendSpec = serde_json::from_str(
            r#"{
                "imageName": "example/engine",
                "imageTag": "8.1.0",
                "replicas": 1,
                "resources": {"limits": {"ephemeral-storage": "1Gi", "memory": "2Gi"}},
                "overrideEnv": [
                    {"name": "A", "value": "1"},
                    {"name": "B", "valueFrom": {"fieldRef": {"fieldPath": "status.podIP"}}}
                ]
            }"#,
        )
        .unwrap();
        let mut spec = valid_spec();
        spec.broker.backend = backend.clone();

        let normalized = normalize(&spec).unwrap();
        assert_eq!(normalized.resources, backend.resources);
        assert_eq!(normalized.override_env, backend.override_env);
    }
}
