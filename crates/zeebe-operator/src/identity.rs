//! Per-replica network identity of the broker StatefulSet.

use crate::constants::{broker, env};

/// Names and namespace every derived object of one cluster is built from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClusterIdentity {
    /// Name of the Zeebe resource.
    pub cluster: String,
    pub namespace: String,
}

impl ClusterIdentity {
    pub fn new(cluster: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self {
            cluster: cluster.into(),
            namespace: namespace.into(),
        }
    }

    /// StatefulSet name.
    pub fn workload_name(&self) -> &str {
        &self.cluster
    }

    /// Headless Service name. Pods resolve as `<pod>.<endpoint>.<ns>.svc.cluster.local`.
    pub fn endpoint_name(&self) -> &str {
        &self.cluster
    }

    pub fn configmap_name(&self) -> String {
        format!("{}-{}", self.cluster, broker::CONFIGMAP_SUFFIX)
    }
}

/// Address of every broker replica, index order.
///
/// Format: `{workload}-{i}.{endpoint}.{namespace}.svc.cluster.local:{port}`
pub fn peer_addresses(
    workload: &str,
    endpoint: &str,
    namespace: &str,
    replicas: u32,
    port: i32,
) -> Vec<String> {
    (0..replicas)
        .map(|index| {
            format!(
                "{workload}-{index}.{endpoint}.{namespace}.{}:{port}",
                broker::CLUSTER_DOMAIN
            )
        })
        .collect()
}

/// Comma separated peer list used to seed cluster membership.
pub fn initial_contact_points(peers: &[String]) -> String {
    peers.join(",")
}

/// Advertised host, expanded by Kubernetes from the pod's own env.
pub fn advertised_host_template() -> String {
    format!(
        "$({}).$({}).$({}).{}",
        env::POD_NAME,
        env::SERVICE_NAME,
        env::POD_NAMESPACE,
        broker::CLUSTER_DOMAIN
    )
}

/// Cluster name, one cluster per namespace.
pub fn cluster_name_template() -> String {
    format!("$({})", env::POD_NAMESPACE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_peer_addresses_count_and_order() {
        for replicas in 1..=16u32 {
            let peers = peer_addresses("zeebe", "zeebe", "ns", replicas, 26502);
            assert_eq!(peers.len(), replicas as usize);
            for (i, peer) in peers.iter().enumerate() {
                assert_eq!(peer, &format!("zeebe-{i}.zeebe.ns.svc.cluster.local:26502"));
            }
        }
    }

    #[test]
    fn test_peer_addresses_zero_replicas() {
        assert!(peer_addresses("a", "b", "c", 0, 1).is_empty());
    }

    #[test]
    fn test_initial_contact_points() {
        let peers = peer_addresses("prod", "prod-svc", "default", 2, 26502);
        assert_eq!(
            initial_contact_points(&peers),
            "prod-0.prod-svc.default.svc.cluster.local:26502,\
             prod-1.prod-svc.default.svc.cluster.local:26502"
        );
    }

    #[test]
    fn test_identity_names() {
        let id = ClusterIdentity::new("zeebe", "ns");
        assert_eq!(id.workload_name(), "zeebe");
        assert_eq!(id.endpoint_name(), "zeebe");
        assert_eq!(id.configmap_name(), "zeebe-configmap");
    }

    #[test]
    fn test_templates() {
        assert_eq!(
            advertised_host_template(),
            "$(K8S_NAME).$(K8S_SERVICE_NAME).$(K8S_NAMESPACE).svc.cluster.local"
        );
        assert_eq!(cluster_name_template(), "$(K8S_NAMESPACE)");
    }
}
