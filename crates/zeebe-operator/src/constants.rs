/// Kubernetes label keys following the app.kubernetes.io convention.
pub mod labels {
    pub const NAME: &str = "app.kubernetes.io/name";
    pub const INSTANCE: &str = "app.kubernetes.io/instance";
    pub const COMPONENT: &str = "app.kubernetes.io/component";
    pub const MANAGED_BY: &str = "app.kubernetes.io/managed-by";

    /// Plain `app` label kept for tooling that predates the recommended labels.
    pub const APP: &str = "app";
}

/// Label values.
pub mod values {
    pub const APP_NAME: &str = "zeebe-cluster";
    pub const MANAGED_BY: &str = "zeebe-operator";
    pub const COMPONENT_BROKER: &str = "broker";
}

/// Broker ports. These are part of the operational contract of the
/// derived Service and StatefulSet.
pub mod ports {
    pub const HTTP: i32 = 9600;
    pub const INTERNAL: i32 = 26502;
    pub const COMMAND: i32 = 26501;

    pub const HTTP_NAME: &str = "http";
    pub const INTERNAL_NAME: &str = "internal";
    pub const COMMAND_NAME: &str = "command";
}

/// Fixed shape of the broker workload.
pub mod broker {
    /// Upper bound for partition count, replication factor and replicas.
    /// Matches the CRD schema maximum.
    pub const MAX_SCALE: i32 = 127;

    pub const CONTAINER_NAME: &str = "zeebe";
    pub const IMAGE_PULL_POLICY: &str = "Always";

    pub const CONFIGMAP_SUFFIX: &str = "configmap";
    pub const STARTUP_SCRIPT_KEY: &str = "startup.sh";
    pub const STARTUP_SCRIPT_PATH: &str = "/usr/local/bin/startup.sh";
    /// rwxr--r--
    pub const STARTUP_SCRIPT_MODE: i32 = 0o744;
    pub const STARTUP_SCRIPT: &str = "#!/usr/bin/env bash\n\
        set -eux -o pipefail\n\
        export ZEEBE_BROKER_CLUSTER_NODEID=$(echo $K8S_NAME | tr -d \"[:alpha:]-\")\n\
        exec /usr/local/zeebe/bin/broker";

    pub const CONFIG_VOLUME: &str = "config";
    pub const DATA_VOLUME: &str = "data";
    pub const DATA_PATH: &str = "/usr/local/zeebe/data";
    pub const STORAGE_CLASS: &str = "ssd";
    /// 128 MiB, expressed in bytes.
    pub const STORAGE_REQUEST: &str = "134217728";
    pub const ACCESS_MODE: &str = "ReadWriteOnce";

    pub const READINESS_PATH: &str = "/ready";
    pub const READINESS_PERIOD_SECS: i32 = 10;
    pub const READINESS_TIMEOUT_SECS: i32 = 1;
    pub const READINESS_SUCCESS_THRESHOLD: i32 = 1;

    pub const CLUSTER_DOMAIN: &str = "svc.cluster.local";
    pub const LOG_SERVICE_NAME: &str = "zeebe";
}

/// Environment variable names injected into every broker.
pub mod env {
    pub const GATEWAY_ENABLE: &str = "ZEEBE_BROKER_GATEWAY_ENABLE";
    pub const PARTITIONS_COUNT: &str = "ZEEBE_BROKER_CLUSTER_PARTITIONSCOUNT";
    pub const REPLICATION_FACTOR: &str = "ZEEBE_BROKER_CLUSTER_REPLICATIONFACTOR";
    pub const NODE_ID: &str = "ZEEBE_BROKER_CLUSTER_NODEID";
    pub const CLUSTER_SIZE: &str = "ZEEBE_BROKER_CLUSTER_CLUSTERSIZE";
    pub const POD_NAME: &str = "K8S_NAME";
    pub const SERVICE_NAME: &str = "K8S_SERVICE_NAME";
    pub const POD_NAMESPACE: &str = "K8S_NAMESPACE";
    pub const ADVERTISED_HOST: &str = "ZEEBE_BROKER_NETWORK_ADVERTISEDHOST";
    pub const CLUSTER_NAME: &str = "ZEEBE_BROKER_CLUSTER_CLUSTERNAME";
    pub const GATEWAY_CLUSTER_HOST: &str = "ZEEBE_BROKER_GATEWAY_CLUSTER_HOST";
    pub const INITIAL_CONTACT_POINTS: &str = "ZEEBE_BROKER_CLUSTER_INITIALCONTACTPOINTS";
    pub const LOG_SERVICE_NAME: &str = "ZEEBE_LOG_STACKDRIVER_SERVICENAME";
    pub const LOG_SERVICE_VERSION: &str = "ZEEBE_LOG_STACKDRIVER_SERVICEVERSION";
}

/// Status phases and condition vocabulary.
pub mod status {
    pub const PHASE_PENDING: &str = "Pending";
    pub const PHASE_RUNNING: &str = "Running";
    pub const PHASE_INVALID: &str = "Invalid";

    pub const CONDITION_READY: &str = "Ready";
    pub const CONDITION_VALID: &str = "Valid";
}

/// Operator defaults.
pub mod defaults {
    pub const FIELD_MANAGER: &str = "zeebe-operator";
    pub const LOG_LEVEL: &str = "info";
    pub const METRICS_ADDR: &str = "0.0.0.0:8080";

    /// Requeue intervals in seconds.
    pub const REQUEUE_SECS: u64 = 300;
    pub const ERROR_REQUEUE_SECS: u64 = 15;
    pub const CONCURRENCY: u16 = 4;
}
