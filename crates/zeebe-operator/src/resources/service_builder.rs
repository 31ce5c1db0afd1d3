use std::collections::BTreeMap;

use k8s_openapi::api::core::v1::{Service, ServicePort, ServiceSpec};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;

use crate::constants::ports;
use crate::identity::ClusterIdentity;

/// Build the headless Service fronting the broker StatefulSet.
///
/// A headless Service (clusterIP: None) lets each Pod get its own DNS record:
/// `{pod-name}.{service-name}.{namespace}.svc.cluster.local`. Not-ready
/// addresses are published so brokers can find each other before any of
/// them passes its readiness probe.
pub fn build_headless_service(
    identity: &ClusterIdentity,
    labels: BTreeMap<String, String>,
) -> Service {
    let ports = vec![
        service_port(ports::HTTP_NAME, ports::HTTP),
        service_port(ports::INTERNAL_NAME, ports::INTERNAL),
        service_port(ports::COMMAND_NAME, ports::COMMAND),
    ];

    Service {
        metadata: ObjectMeta {
            name: Some(identity.endpoint_name().to_string()),
            namespace: Some(identity.namespace.clone()),
            labels: Some(labels.clone()),
            ..Default::default()
        },
        spec: Some(ServiceSpec {
            type_: Some("ClusterIP".into()),
            cluster_ip: Some("None".into()),
            selector: Some(labels),
            ports: Some(ports),
            publish_not_ready_addresses: Some(true),
            ..Default::default()
        }),
        ..Default::default()
    }
}

fn service_port(name: &str, port: i32) -> ServicePort {
    ServicePort {
        name: Some(name.into()),
        port,
        protocol: Some("TCP".into()),
        target_port: Some(IntOrString::Int(port)),
        ..Default::default()
    }
}
