//! Builders for `Zeebe` resources.

use k8s_openapi::api::core::v1::EnvVar;

use crate::crds::{Zeebe, ZeebeSpec};

/// A valid three broker cluster running `example/engine:8.1.0`.
pub fn zeebe(name: &str, namespace: &str) -> Zeebe {
    ZeebeBuilder::new(name, namespace).build()
}

/// A resource carrying an arbitrary, possibly invalid, spec.
pub fn zeebe_with_spec(name: &str, namespace: &str, spec: ZeebeSpec) -> Zeebe {
    let mut z = Zeebe::new(name, spec);
    z.metadata.namespace = Some(namespace.into());
    z
}

/// Fluent builder over a valid default spec.
pub struct ZeebeBuilder {
    name: String,
    namespace: String,
    spec: ZeebeSpec,
}

impl ZeebeBuilder {
    pub fn new(name: &str, namespace: &str) -> Self {
        let mut spec = ZeebeSpec::default();
        spec.broker.partitions.count = Some(3);
        spec.broker.partitions.replication = Some(3);
        spec.broker.backend.image_name = "example/engine".into();
        spec.broker.backend.image_tag = "8.1.0".into();
        spec.broker.backend.replicas = Some(3);

        Self {
            name: name.into(),
            namespace: namespace.into(),
            spec,
        }
    }

    pub fn partitions(mut self, count: i32, replication: i32) -> Self {
        self.spec.broker.partitions.count = Some(count);
        self.spec.broker.partitions.replication = Some(replication);
        self
    }

    pub fn replicas(mut self, replicas: i32) -> Self {
        self.spec.broker.backend.replicas = Some(replicas);
        self
    }

    pub fn image(mut self, name: &str, tag: &str) -> Self {
        self.spec.broker.backend.image_name = name.into();
        self.spec.broker.backend.image_tag = tag.into();
        self
    }

    pub fn standalone_gateway(mut self, standalone: bool) -> Self {
        self.spec.gateway.standalone = Some(standalone);
        self
    }

    pub fn env(self, name: &str, value: &str) -> Self {
        self.env_var(EnvVar {
            name: name.into(),
            value: Some(value.into()),
            ..Default::default()
        })
    }

    pub fn env_var(mut self, var: EnvVar) -> Self {
        self.spec.broker.backend.override_env.push(var);
        self
    }

    pub fn build(self) -> Zeebe {
        zeebe_with_spec(&self.name, &self.namespace, self.spec)
    }
}
