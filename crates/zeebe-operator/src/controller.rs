//! Watch loop driving [`Reconciler`] passes.

use std::sync::Arc;
use std::time::Instant;

use futures::StreamExt;
use k8s_openapi::api::apps::v1::StatefulSet;
use k8s_openapi::api::core::v1::{ConfigMap, Service};
use kube::api::Api;
use kube::runtime::controller::{self, Action, Controller};
use kube::runtime::watcher;
use kube::{Client, ResourceExt};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::OperatorConfig;
use crate::crds::Zeebe;
use crate::error::OperatorError;
use crate::metrics::Metrics;
use crate::reconciler::{ReconcileReport, Reconciler};
use crate::store::{ClusterStore, KubeStore};

/// Shared state handed to every pass.
pub struct Context<S> {
    pub reconciler: Reconciler<S>,
    pub config: OperatorConfig,
    pub metrics: Metrics,
    pub cancel: CancellationToken,
}

/// Run the Zeebe controller until `cancel` fires.
pub async fn run(
    client: Client,
    config: OperatorConfig,
    metrics: Metrics,
    cancel: CancellationToken,
) {
    let (zeebes, config_maps, services, stateful_sets) = match &config.namespace {
        Some(ns) => (
            Api::<Zeebe>::namespaced(client.clone(), ns),
            Api::<ConfigMap>::namespaced(client.clone(), ns),
            Api::<Service>::namespaced(client.clone(), ns),
            Api::<StatefulSet>::namespaced(client.clone(), ns),
        ),
        None => (
            Api::<Zeebe>::all(client.clone()),
            Api::<ConfigMap>::all(client.clone()),
            Api::<Service>::all(client.clone()),
            Api::<StatefulSet>::all(client.clone()),
        ),
    };

    let store = KubeStore::new(client, config.field_manager.clone());
    let concurrency = config.concurrency;
    let ctx = Arc::new(Context {
        reconciler: Reconciler::new(store),
        config,
        metrics: metrics.clone(),
        cancel: cancel.clone(),
    });

    info!(
        namespace = ctx.config.namespace.as_deref().unwrap_or("*"),
        concurrency, "Starting Zeebe controller"
    );
    metrics.set_ready(true);

    Controller::new(zeebes, watcher::Config::default())
        .owns(config_maps, watcher::Config::default())
        .owns(services, watcher::Config::default())
        .owns(stateful_sets, watcher::Config::default())
        .with_config(controller::Config::default().concurrency(concurrency))
        .graceful_shutdown_on(cancel.cancelled_owned())
        .run(reconcile, error_policy, ctx)
        .for_each(|res| async move {
            match res {
                Ok((obj, _action)) => debug!(name = %obj.name, "Reconciled"),
                Err(e) => warn!("Zeebe reconciliation error: {e}"),
            }
        })
        .await;

    metrics.set_ready(false);
    info!("Zeebe controller stopped");
}

/// One pass, timed and counted.
pub async fn reconcile<S: ClusterStore>(
    zeebe: Arc<Zeebe>,
    ctx: Arc<Context<S>>,
) -> Result<Action, OperatorError> {
    let name = zeebe.name_any();
    let namespace = zeebe.namespace().unwrap_or_else(|| "default".into());
    let started = Instant::now();

    let result = ctx
        .reconciler
        .reconcile(&namespace, &name, &ctx.cancel)
        .await;
    let elapsed = started.elapsed().as_secs_f64();

    match result {
        Ok(ReconcileReport::Gone) => {
            ctx.metrics.record_reconciliation("success", elapsed);
            Ok(Action::await_change())
        }
        Ok(report) => {
            ctx.metrics.record_reconciliation("success", elapsed);
            if !report.is_noop() {
                info!(name = %name, namespace = %namespace, "Zeebe cluster reconciled");
            }
            Ok(Action::requeue(ctx.config.requeue()))
        }
        Err(e) => {
            ctx.metrics.record_reconciliation(e.kind(), elapsed);
            Err(e)
        }
    }
}

/// Retry transient failures; wait for a spec change otherwise.
pub fn error_policy<S>(zeebe: Arc<Zeebe>, error: &OperatorError, ctx: Arc<Context<S>>) -> Action {
    let name = zeebe.name_any();
    if error.is_retryable() {
        warn!(name = %name, kind = error.kind(), "Reconciliation failed, retrying: {error}");
        Action::requeue(ctx.config.error_requeue())
    } else {
        warn!(name = %name, kind = error.kind(), "Reconciliation failed: {error}");
        Action::await_change()
    }
}
