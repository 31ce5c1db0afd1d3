//! Marks every derived object as controlled by its Zeebe resource, so the
//! garbage collector removes them when the Zeebe resource goes away.

use k8s_openapi::apimachinery::pkg::apis::meta::v1::{ObjectMeta, OwnerReference};
use kube::Resource;

use crate::crds::Zeebe;
use crate::error::{OperatorError, Result};
use crate::resources::ClusterPlan;

/// Controller owner reference pointing at `owner`.
///
/// Fails when the owner has not been persisted yet (no uid).
pub fn owner_reference(owner: &Zeebe) -> Result<OwnerReference> {
    let mut owner_ref = owner.controller_owner_ref(&()).ok_or_else(|| {
        OperatorError::Registration(format!(
            "Zeebe {} has no name or uid",
            owner.meta().name.as_deref().unwrap_or("<unnamed>")
        ))
    })?;
    owner_ref.block_owner_deletion = Some(true);
    Ok(owner_ref)
}

/// Attach the owner reference to every object of the plan.
pub fn bind(mut plan: ClusterPlan, owner: &Zeebe) -> Result<ClusterPlan> {
    let owner_ref = owner_reference(owner)?;

    set_owner(&mut plan.config_map.metadata, &owner_ref);
    set_owner(&mut plan.service.metadata, &owner_ref);
    set_owner(&mut plan.stateful_set.metadata, &owner_ref);

    Ok(plan)
}

/// Replace any existing reference to the same owner, keep the others.
fn set_owner(meta: &mut ObjectMeta, owner_ref: &OwnerReference) {
    let refs = meta.owner_references.get_or_insert_with(Vec::new);
    refs.retain(|r| r.uid != owner_ref.uid);
    refs.push(owner_ref.clone());
}
