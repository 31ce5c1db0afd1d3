use std::collections::BTreeMap;

use k8s_openapi::api::core::v1::{
    ConfigMapVolumeSource, Container, ContainerPort, EnvVar, EnvVarSource, HTTPGetAction,
    ObjectFieldSelector, PodSpec, PodTemplateSpec, Probe, Volume, VolumeMount,
};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;

use crate::constants::{broker, env, ports};
use crate::identity::{self, ClusterIdentity};
use crate::normalize::NormalizedSpec;

/// Build the pod template shared by every broker replica.
pub fn build_broker_pod_template(
    identity: &ClusterIdentity,
    spec: &NormalizedSpec,
    labels: BTreeMap<String, String>,
) -> PodTemplateSpec {
    let container = Container {
        name: broker::CONTAINER_NAME.into(),
        image: Some(spec.image()),
        image_pull_policy: Some(broker::IMAGE_PULL_POLICY.into()),
        ports: Some(vec![
            container_port(ports::HTTP_NAME, ports::HTTP),
            container_port(ports::COMMAND_NAME, ports::COMMAND),
            container_port(ports::INTERNAL_NAME, ports::INTERNAL),
        ]),
        env: Some(broker_env(identity, spec)),
        resources: spec.resources.clone(),
        readiness_probe: Some(Probe {
            http_get: Some(HTTPGetAction {
                path: Some(broker::READINESS_PATH.into()),
                port: IntOrString::Int(ports::HTTP),
                ..Default::default()
            }),
            period_seconds: Some(broker::READINESS_PERIOD_SECS),
            timeout_seconds: Some(broker::READINESS_TIMEOUT_SECS),
            success_threshold: Some(broker::READINESS_SUCCESS_THRESHOLD),
            ..Default::default()
        }),
        volume_mounts: Some(vec![
            VolumeMount {
                name: broker::CONFIG_VOLUME.into(),
                mount_path: broker::STARTUP_SCRIPT_PATH.into(),
                sub_path: Some(broker::STARTUP_SCRIPT_KEY.into()),
                ..Default::default()
            },
            VolumeMount {
                name: broker::DATA_VOLUME.into(),
                mount_path: broker::DATA_PATH.into(),
                ..Default::default()
            },
        ]),
        ..Default::default()
    };

    PodTemplateSpec {
        metadata: Some(ObjectMeta {
            labels: Some(labels),
            ..Default::default()
        }),
        spec: Some(PodSpec {
            containers: vec![container],
            volumes: Some(vec![Volume {
                name: broker::CONFIG_VOLUME.into(),
                config_map: Some(ConfigMapVolumeSource {
                    name: Some(identity.configmap_name()),
                    default_mode: Some(broker::STARTUP_SCRIPT_MODE),
                    ..Default::default()
                }),
                ..Default::default()
            }]),
            ..Default::default()
        }),
    }
}

/// Environment of the broker container: the derived variables in their fixed
/// order, with user overrides merged on top.
///
/// An override replaces a derived variable of the same name in place, so
/// later `$(VAR)` references keep resolving. Other overrides are appended in
/// declaration order. Overrides are copied as written, `valueFrom` included.
pub fn broker_env(identity: &ClusterIdentity, spec: &NormalizedSpec) -> Vec<EnvVar> {
    let peers = identity::peer_addresses(
        identity.workload_name(),
        identity.endpoint_name(),
        &identity.namespace,
        spec.replicas,
        ports::INTERNAL,
    );

    let mut vars = vec![
        plain(env::GATEWAY_ENABLE, spec.gateway_enabled().to_string()),
        plain(env::PARTITIONS_COUNT, spec.partitions.to_string()),
        plain(env::REPLICATION_FACTOR, spec.replication.to_string()),
        // Replaced at startup from the pod ordinal.
        plain(env::NODE_ID, "0"),
        plain(env::CLUSTER_SIZE, spec.replicas.to_string()),
        field(env::POD_NAME, "metadata.name"),
        plain(env::SERVICE_NAME, identity.endpoint_name()),
        field(env::POD_NAMESPACE, "metadata.namespace"),
        plain(env::ADVERTISED_HOST, identity::advertised_host_template()),
        plain(env::CLUSTER_NAME, identity::cluster_name_template()),
        plain(env::GATEWAY_CLUSTER_HOST, format!("$({})", env::ADVERTISED_HOST)),
        plain(
            env::INITIAL_CONTACT_POINTS,
            identity::initial_contact_points(&peers),
        ),
        plain(env::LOG_SERVICE_NAME, broker::LOG_SERVICE_NAME),
        plain(env::LOG_SERVICE_VERSION, spec.image_tag.clone()),
    ];

    for var in spec.override_env.iter().cloned() {
        match vars.iter_mut().find(|v| v.name == var.name) {
            Some(existing) => *existing = var,
            None => vars.push(var),
        }
    }

    vars
}

fn plain(name: &str, value: impl Into<String>) -> EnvVar {
    EnvVar {
        name: name.into(),
        value: Some(value.into()),
        ..Default::default()
    }
}

fn field(name: &str, path: &str) -> EnvVar {
    EnvVar {
        name: name.into(),
        value_from: Some(EnvVarSource {
            field_ref: Some(ObjectFieldSelector {
                api_version: Some("v1".into()),
                field_path: path.into(),
            }),
            ..Default::default()
        }),
        ..Default::default()
    }
}

fn container_port(name: &str, port: i32) -> ContainerPort {
    ContainerPort {
        name: Some(name.into()),
        container_port: port,
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use k8s_openapi::api::core::v1::{
        ConfigMapKeySelector, ResourceRequirements, SecretKeySelector,
    };
    use k8s_openapi::apimachinery::pkg::api::resource::Quantity;

    fn test_spec() -> NormalizedSpec {
        NormalizedSpec {
            partitions: 3,
            replication: 3,
            replicas: 3,
            standalone_gateway: false,
            image_name: "example/engine".into(),
            image_tag: "8.1.0".into(),
            resources: None,
            override_env: vec![],
        }
    }

    fn value_of<'a>(vars: &'a [EnvVar], name: &str) -> Option<&'a str> {
        vars.iter()
            .find(|v| v.name == name)
            .and_then(|v| v.value.as_deref())
    }

    #[test]
    fn test_derived_env_order() {
        let vars = broker_env(&ClusterIdentity::new("zeebe", "ns"), &test_spec());
        let names: Vec<_> = vars.iter().map(|v| v.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "ZEEBE_BROKER_GATEWAY_ENABLE",
                "ZEEBE_BROKER_CLUSTER_PARTITIONSCOUNT",
                "ZEEBE_BROKER_CLUSTER_REPLICATIONFACTOR",
                "ZEEBE_BROKER_CLUSTER_NODEID",
                "ZEEBE_BROKER_CLUSTER_CLUSTERSIZE",
                "K8S_NAME",
                "K8S_SERVICE_NAME",
                "K8S_NAMESPACE",
                "ZEEBE_BROKER_NETWORK_ADVERTISEDHOST",
                "ZEEBE_BROKER_CLUSTER_CLUSTERNAME",
                "ZEEBE_BROKER_GATEWAY_CLUSTER_HOST",
                "ZEEBE_BROKER_CLUSTER_INITIALCONTACTPOINTS",
                "ZEEBE_LOG_STACKDRIVER_SERVICENAME",
                "ZEEBE_LOG_STACKDRIVER_SERVICEVERSION",
            ]
        );
    }

    #[test]
    fn test_derived_env_values() {
        let vars = broker_env(&ClusterIdentity::new("zeebe", "ns"), &test_spec());
        assert_eq!(value_of(&vars, "ZEEBE_BROKER_GATEWAY_ENABLE"), Some("true"));
        assert_eq!(value_of(&vars, "ZEEBE_BROKER_CLUSTER_PARTITIONSCOUNT"), Some("3"));
        assert_eq!(value_of(&vars, "ZEEBE_BROKER_CLUSTER_NODEID"), Some("0"));
        assert_eq!(value_of(&vars, "ZEEBE_BROKER_CLUSTER_CLUSTERSIZE"), Some("3"));
        assert_eq!(value_of(&vars, "K8S_SERVICE_NAME"), Some("zeebe"));
        assert_eq!(
            value_of(&vars, "ZEEBE_BROKER_GATEWAY_CLUSTER_HOST"),
            Some("$(ZEEBE_BROKER_NETWORK_ADVERTISEDHOST)")
        );
        assert_eq!(
            value_of(&vars, "ZEEBE_LOG_STACKDRIVER_SERVICEVERSION"),
            Some("8.1.0")
        );

        let pod_name = vars.iter().find(|v| v.name == "K8S_NAME").unwrap();
        assert!(pod_name.value.is_none());
        let field_ref = pod_name.value_from.as_ref().unwrap().field_ref.as_ref().unwrap();
        assert_eq!(field_ref.field_path, "metadata.name");
        assert_eq!(field_ref.api_version.as_deref(), Some("v1"));
    }

    #[test]
    fn test_gateway_flag_follows_standalone() {
        let mut spec = test_spec();
        spec.standalone_gateway = true;
        let vars = broker_env(&ClusterIdentity::new("zeebe", "ns"), &spec);
        assert_eq!(value_of(&vars, "ZEEBE_BROKER_GATEWAY_ENABLE"), Some("false"));
    }

    #[test]
    fn test_override_replaces_in_place() {
        let mut spec = test_spec();
        spec.override_env = vec![
            EnvVar {
                name: "JAVA_TOOL_OPTIONS".into(),
                value: Some("-Xmx1g".into()),
                ..Default::default()
            },
            EnvVar {
                name: "ZEEBE_BROKER_CLUSTER_PARTITIONSCOUNT".into(),
                value: Some("8".into()),
                ..Default::default()
            },
        ];
        let vars = broker_env(&ClusterIdentity::new("zeebe", "ns"), &spec);

        assert_eq!(vars.len(), 15);
        assert_eq!(vars[1].name, "ZEEBE_BROKER_CLUSTER_PARTITIONSCOUNT");
        assert_eq!(vars[1].value.as_deref(), Some("8"));
        assert_eq!(vars[14].name, "JAVA_TOOL_OPTIONS");
        assert_eq!(
            vars.iter()
                .filter(|v| v.name == "ZEEBE_BROKER_CLUSTER_PARTITIONSCOUNT")
                .count(),
            1
        );
    }

    fn secret_ref(name: &str, key: &str) -> Option<EnvVarSource> {
        Some(EnvVarSource {
            secret_key_ref: Some(SecretKeySelector {
                name: Some(name.into()),
                key: key.into(),
                ..Default::default()
            }),
            ..Default::default()
        })
    }

    #[test]
    fn test_override_references() {
        let mut spec = test_spec();
        spec.override_env = vec![
            EnvVar {
                name: "TOKEN".into(),
                value_from: secret_ref("creds", "token"),
                ..Default::default()
            },
            EnvVar {
                name: "MODE".into(),
                value_from: Some(EnvVarSource {
                    config_map_key_ref: Some(ConfigMapKeySelector {
                        name: Some("settings".into()),
                        key: "mode".into(),
                        optional: Some(true),
                    }),
                    ..Default::default()
                }),
                ..Default::default()
            },
            EnvVar {
                name: "POD_IP".into(),
                value_from: Some(EnvVarSource {
                    field_ref: Some(ObjectFieldSelector {
                        api_version: None,
                        field_path: "status.podIP".into(),
                    }),
                    ..Default::default()
                }),
                ..Default::default()
            },
        ];
        let vars = broker_env(&ClusterIdentity::new("zeebe", "ns"), &spec);

        assert_eq!(&vars[14..], &spec.override_env[..]);
        let cm = vars[15].value_from.as_ref().unwrap().config_map_key_ref.as_ref().unwrap();
        assert_eq!(cm.optional, Some(true));
    }

    #[test]
    fn test_override_with_reference_replaces_derived_in_place() {
        let mut spec = test_spec();
        spec.override_env = vec![EnvVar {
            name: "ZEEBE_BROKER_CLUSTER_CLUSTERNAME".into(),
            value_from: secret_ref("cluster", "name"),
            ..Default::default()
        }];
        let vars = broker_env(&ClusterIdentity::new("zeebe", "ns"), &spec);

        assert_eq!(vars.len(), 14);
        assert_eq!(vars[9].name, "ZEEBE_BROKER_CLUSTER_CLUSTERNAME");
        assert!(vars[9].value.is_none());
        let secret = vars[9].value_from.as_ref().unwrap().secret_key_ref.as_ref().unwrap();
        assert_eq!(secret.name.as_deref(), Some("cluster"));
        assert_eq!(secret.key, "name");
    }

    #[test]
    fn test_pod_template_shape() {
        let mut spec = test_spec();
        spec.resources = Some(ResourceRequirements {
            requests: Some(BTreeMap::from([
                ("cpu".to_string(), Quantity("500m".into())),
                ("memory".to_string(), Quantity("1Gi".into())),
            ])),
            limits: Some(BTreeMap::from([
                ("memory".to_string(), Quantity("2Gi".into())),
                ("ephemeral-storage".to_string(), Quantity("4Gi".into())),
            ])),
            ..Default::default()
        });
        let template =
            build_broker_pod_template(&ClusterIdentity::new("zeebe", "ns"), &spec, BTreeMap::new());
        let pod = template.spec.unwrap();
        let container = &pod.containers[0];

        assert_eq!(container.name, "zeebe");
        assert_eq!(container.image.as_deref(), Some("example/engine:8.1.0"));
        assert_eq!(container.image_pull_policy.as_deref(), Some("Always"));

        let probe = container.readiness_probe.as_ref().unwrap();
        let http = probe.http_get.as_ref().unwrap();
        assert_eq!(http.path.as_deref(), Some("/ready"));
        assert_eq!(http.port, IntOrString::Int(9600));
        assert_eq!(probe.period_seconds, Some(10));
        assert_eq!(probe.timeout_seconds, Some(1));

        let resources = container.resources.as_ref().unwrap();
        let requests = resources.requests.as_ref().unwrap();
        assert_eq!(requests["cpu"].0, "500m");
        assert_eq!(requests["memory"].0, "1Gi");
        let limits = resources.limits.as_ref().unwrap();
        assert!(!limits.contains_key("cpu"));
        assert_eq!(limits["ephemeral-storage"].0, "4Gi");
        assert_eq!(container.resources, spec.resources);

        let mounts = container.volume_mounts.as_ref().unwrap();
        assert_eq!(mounts[0].mount_path, "/usr/local/bin/startup.sh");
        assert_eq!(mounts[0].sub_path.as_deref(), Some("startup.sh"));
        assert_eq!(mounts[1].mount_path, "/usr/local/zeebe/data");

        let volume = &pod.volumes.as_ref().unwrap()[0];
        let cm = volume.config_map.as_ref().unwrap();
        assert_eq!(cm.name.as_deref(), Some("zeebe-configmap"));
        assert_eq!(cm.default_mode, Some(0o744));
    }

    #[test]
    fn test_no_resources_when_unset() {
        let template = build_broker_pod_template(
            &ClusterIdentity::new("zeebe", "ns"),
            &test_spec(),
            BTreeMap::new(),
        );
        assert!(template.spec.unwrap().containers[0].resources.is_none());
    }
}
