//! VM details projections and the batch details query.

use serde::Deserialize;
use uuid::Uuid;

use super::CloudService;
use crate::cancellation::CancellationToken;
use crate::client::{CloudClient, VmInstance};
use crate::context::DeployedApp;
use crate::error::DriverError;
use crate::resource::CloudProviderResource;
use crate::results::{VmDetailsData, VmDetailsNetworkInterface, VmDetailsProperty};

/// Number of network interfaces the provider reports per instance.
const INTERFACE_COUNT: u32 = 2;

/// Builds the full details projection for one VM.
#[must_use]
pub fn extract_vm_details(instance: Option<&VmInstance>, app_name: Option<&str>) -> VmDetailsData {
    VmDetailsData {
        vm_instance_data: extract_vm_instance_data(instance),
        vm_network_data: extract_vm_instance_network_data(),
        app_name: app_name.map(str::to_owned),
    }
}

/// Builds the instance display rows for one VM.
#[must_use]
pub fn extract_vm_instance_data(instance: Option<&VmInstance>) -> Vec<VmDetailsProperty> {
    let name = instance.map_or("dummy", |vm| vm.name.as_str());
    vec![
        VmDetailsProperty::new("Cloud Size", "not so big"),
        VmDetailsProperty::new("Instance Name", name),
        VmDetailsProperty::hidden("Hidden stuff", "something not for UI"),
    ]
}

/// Builds the per-NIC records for one VM.
///
/// The provider reports a fixed pair of interfaces with deterministic
/// private addresses; interface 0 is the primary.
#[must_use]
pub fn extract_vm_instance_network_data() -> Vec<VmDetailsNetworkInterface> {
    (0..INTERFACE_COUNT)
        .map(|index| VmDetailsNetworkInterface {
            interface_id: index,
            network_id: index,
            is_primary: index == 0,
            is_predefined: false,
            network_data: vec![
                VmDetailsProperty::new("Device Index", index.to_string()),
                VmDetailsProperty::new("MAC Address", Uuid::new_v4().to_string()),
                VmDetailsProperty::new("Speed", "1KB"),
            ],
            private_ip_address: format!("10.0.0.{index}"),
            public_ip_address: format!("8.8.8.{index}"),
        })
        .collect()
}

#[derive(Deserialize)]
struct VmDetailsBatch {
    items: Vec<VmDetailsRequestItem>,
}

#[derive(Deserialize)]
struct VmDetailsRequestItem {
    #[serde(rename = "deployedAppJson")]
    deployed_app: DeployedApp,
}

impl<C: CloudClient> CloudService<'_, C> {
    /// Answers a batch of VM details requests.
    ///
    /// Cancellation is checked at the top of every iteration; when it fires,
    /// results already accumulated are returned rather than discarded.
    ///
    /// # Errors
    ///
    /// Returns [`DriverError::Malformed`] when the batch body does not parse
    /// and [`DriverError::Provider`] when an instance lookup fails.
    pub fn get_vm_details(
        &self,
        resource: &CloudProviderResource,
        cancellation: &CancellationToken,
        requests_json: &str,
    ) -> Result<Vec<VmDetailsData>, DriverError> {
        let batch: VmDetailsBatch = serde_json::from_str(requests_json)
            .map_err(|err| DriverError::malformed("vm details batch", &err))?;

        let mut results = Vec::with_capacity(batch.items.len());
        for item in &batch.items {
            if cancellation.is_cancelled() {
                break;
            }

            let app = &item.deployed_app;
            let instance =
                self.client()
                    .get_instance(resource, &app.name, &app.vmdetails.uid, &app.address)?;
            results.push(extract_vm_details(Some(&instance), Some(&app.name)));
        }

        Ok(results)
    }
}
