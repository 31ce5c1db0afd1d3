//! One reconciliation pass for one Zeebe resource.
//!
//! A pass fetches the resource, plans its derived objects, applies them in
//! order and reports status. It keeps no state between passes.

use std::future::Future;

use chrono::Utc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::constants::status as vocab;
use crate::crds::{Condition, Zeebe, ZeebeStatus};
use crate::error::{OperatorError, Result, ValidationError};
use crate::identity::ClusterIdentity;
use crate::normalize::{normalize, NormalizedSpec};
use crate::ownership;
use crate::resources;
use crate::store::{ApplyOutcome, ClusterStore};

/// Result of a successful pass.
#[derive(Clone, Debug, PartialEq)]
pub enum ReconcileReport {
    /// The Zeebe resource no longer exists; nothing to do.
    Gone,
    Applied {
        outcomes: Vec<AppliedObject>,
        status: ZeebeStatus,
    },
}

#[derive(Clone, Debug, PartialEq)]
pub struct AppliedObject {
    pub kind: &'static str,
    pub name: String,
    pub outcome: ApplyOutcome,
}

impl ReconcileReport {
    /// True when the pass wrote nothing but status.
    pub fn is_noop(&self) -> bool {
        match self {
            ReconcileReport::Gone => true,
            ReconcileReport::Applied { outcomes, .. } => outcomes
                .iter()
                .all(|o| o.outcome == ApplyOutcome::Unchanged),
        }
    }
}

pub struct Reconciler<S> {
    store: S,
}

impl<S: ClusterStore> Reconciler<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Run one pass for `namespace/name`.
    pub async fn reconcile(
        &self,
        namespace: &str,
        name: &str,
        cancel: &CancellationToken,
    ) -> Result<ReconcileReport> {
        let Some(cluster) = guarded(cancel, self.store.get_cluster(namespace, name)).await? else {
            debug!(name = %name, namespace = %namespace, "Zeebe resource gone");
            return Ok(ReconcileReport::Gone);
        };

        let spec = match normalize(&cluster.spec) {
            Ok(spec) => spec,
            Err(e) => {
                warn!(name = %name, namespace = %namespace, field = e.field(), "Invalid spec: {e}");
                self.report_invalid(&cluster, &e, cancel).await;
                return Err(e.into());
            }
        };

        let identity = ClusterIdentity::new(name, namespace);
        let plan = ownership::bind(resources::plan(&identity, &spec), &cluster)?;

        info!(
            name = %name,
            namespace = %namespace,
            replicas = spec.replicas,
            partitions = spec.partitions,
            "Reconciling Zeebe cluster"
        );

        let mut outcomes = Vec::new();
        for object in plan.objects() {
            let outcome = guarded(cancel, self.store.apply(&object)).await?;
            outcomes.push(AppliedObject {
                kind: object.kind(),
                name: object.name_any(),
                outcome,
            });
        }

        let ready = guarded(
            cancel,
            self.store
                .ready_replicas(namespace, identity.workload_name()),
        )
        .await?
        .unwrap_or(0);

        let status = running_status(&cluster, &spec, ready);
        guarded(cancel, self.store.patch_status(namespace, name, &status)).await?;

        Ok(ReconcileReport::Applied { outcomes, status })
    }

    /// Record the validation failure on the resource. A failure to do so is
    /// logged and otherwise ignored.
    async fn report_invalid(
        &self,
        cluster: &Zeebe,
        error: &ValidationError,
        cancel: &CancellationToken,
    ) {
        let name = cluster.metadata.name.as_deref().unwrap_or_default();
        let namespace = cluster.metadata.namespace.as_deref().unwrap_or("default");
        let status = invalid_status(cluster, error);

        if let Err(e) = guarded(cancel, self.store.patch_status(namespace, name, &status)).await {
            warn!(name = %name, namespace = %namespace, "Failed to record invalid spec: {e}");
        }
    }
}

/// Race `fut` against cancellation. Cancellation wins ties.
async fn guarded<T>(
    cancel: &CancellationToken,
    fut: impl Future<Output = Result<T>>,
) -> Result<T> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(OperatorError::Cancelled),
        res = fut => res,
    }
}

fn running_status(cluster: &Zeebe, spec: &NormalizedSpec, ready: i32) -> ZeebeStatus {
    let desired = spec.replicas as i32;
    let all_ready = ready >= desired;
    let previous = previous_conditions(cluster);

    let ready_condition = if all_ready {
        make_condition(
            vocab::CONDITION_READY,
            "True",
            "AllBrokersReady",
            &format!("{ready}/{desired} brokers ready"),
        )
    } else {
        make_condition(
            vocab::CONDITION_READY,
            "False",
            "BrokersNotReady",
            &format!("{ready}/{desired} brokers ready"),
        )
    };

    ZeebeStatus {
        phase: Some(if all_ready {
            vocab::PHASE_RUNNING.into()
        } else {
            vocab::PHASE_PENDING.into()
        }),
        replicas: desired,
        ready_replicas: ready,
        observed_generation: cluster.metadata.generation,
        conditions: vec![
            carry_transition(
                make_condition(vocab::CONDITION_VALID, "True", "SpecValid", "Spec accepted"),
                previous,
            ),
            carry_transition(ready_condition, previous),
        ],
    }
}

fn invalid_status(cluster: &Zeebe, error: &ValidationError) -> ZeebeStatus {
    let previous = previous_conditions(cluster);
    let prior = cluster.status.clone().unwrap_or_default();

    ZeebeStatus {
        phase: Some(vocab::PHASE_INVALID.into()),
        replicas: prior.replicas,
        ready_replicas: prior.ready_replicas,
        observed_generation: cluster.metadata.generation,
        conditions: vec![carry_transition(
            make_condition(vocab::CONDITION_VALID, "False", "InvalidSpec", &error.to_string()),
            previous,
        )],
    }
}

fn previous_conditions(cluster: &Zeebe) -> &[Condition] {
    cluster
        .status
        .as_ref()
        .map(|s| s.conditions.as_slice())
        .unwrap_or_default()
}

/// Keep the previous transition time while the condition status is unchanged.
fn carry_transition(mut condition: Condition, previous: &[Condition]) -> Condition {
    if let Some(prev) = previous
        .iter()
        .find(|p| p.type_ == condition.type_ && p.status == condition.status)
    {
        condition.last_transition_time = prev.last_transition_time.clone();
    }
    condition
}

fn make_condition(type_: &str, status: &str, reason: &str, message: &str) -> Condition {
    Condition {
        type_: type_.into(),
        status: status.into(),
        reason: Some(reason.into()),
        message: Some(message.into()),
        last_transition_time: Some(Utc::now().to_rfc3339()),
    }
}
