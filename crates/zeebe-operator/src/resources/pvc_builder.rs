use std::collections::BTreeMap;

use k8s_openapi::api::core::v1::{
    PersistentVolumeClaim, PersistentVolumeClaimSpec as K8sPvcSpec, ResourceRequirements,
};
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;

use crate::constants::broker;

/// Build the `data` volume claim template of the broker StatefulSet.
///
/// Every replica gets its own 128 MiB claim on the `ssd` storage class.
pub fn build_data_claim_template() -> PersistentVolumeClaim {
    PersistentVolumeClaim {
        metadata: ObjectMeta {
            name: Some(broker::DATA_VOLUME.into()),
            ..Default::default()
        },
        spec: Some(K8sPvcSpec {
            storage_class_name: Some(broker::STORAGE_CLASS.into()),
            access_modes: Some(vec![broker::ACCESS_MODE.into()]),
            resources: Some(ResourceRequirements {
                requests: Some(BTreeMap::from([(
                    "storage".into(),
                    Quantity(broker::STORAGE_REQUEST.into()),
                )])),
                ..Default::default()
            }),
            ..Default::default()
        }),
        ..Default::default()
    }
}
