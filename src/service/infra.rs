//! Sandbox infrastructure preparation and cleanup.

use super::CloudService;
use crate::actions::{CleanupNetworkAction, CreateKeysAction, PrepareCloudInfraAction,
    PrepareSubnetAction};
use crate::cancellation::CancellationToken;
use crate::client::CloudClient;
use crate::error::DriverError;
use crate::resource::CloudProviderResource;
use crate::results::{ActionResult, CleanupNetworkResult, CreateKeysResult,
    PrepareCloudInfraResult, PrepareSubnetResult};

impl<C: CloudClient> CloudService<'_, C> {
    /// Runs the sandbox preparation pipeline: network allocation, SSH key
    /// provisioning, then per-subnet preparation.
    ///
    /// Each stage's provider failure is captured as a failed result for that
    /// stage only; stages already completed keep their results. Cancellation
    /// is checked before and after each stage and aborts the remainder.
    ///
    /// # Errors
    ///
    /// Returns [`DriverError::Cancelled`] when cancellation fires between
    /// stages.
    pub fn prepare_sandbox_infra(
        &self,
        resource: &CloudProviderResource,
        infra_action: &PrepareCloudInfraAction,
        create_keys_action: &CreateKeysAction,
        subnet_actions: &[&PrepareSubnetAction],
        cancellation: &CancellationToken,
    ) -> Result<Vec<ActionResult>, DriverError> {
        let mut results = Vec::new();

        cancellation.checkpoint()?;

        let cidr = &infra_action.action_params.cidr;
        tracing::info!(cidr, "received sandbox CIDR from host");
        match self.client().prepare_infra(resource, cidr) {
            Ok(()) => results.push(ActionResult::PrepareCloudInfra(PrepareCloudInfraResult::ok(
                &infra_action.action_id,
            ))),
            Err(err) => {
                tracing::error!(error = %err, "sandbox network allocation failed");
                results.push(ActionResult::PrepareCloudInfra(
                    PrepareCloudInfraResult::failure(&infra_action.action_id, err.to_string()),
                ));
            }
        }

        cancellation.checkpoint()?;

        match self.client().get_or_create_ssh_key() {
            Ok(access_key) => results.push(ActionResult::CreateKeys(CreateKeysResult::ok(
                &create_keys_action.action_id,
                access_key,
            ))),
            Err(err) => {
                tracing::error!(error = %err, "sandbox key provisioning failed");
                results.push(ActionResult::CreateKeys(CreateKeysResult::failure(
                    &create_keys_action.action_id,
                    err.to_string(),
                )));
            }
        }

        cancellation.checkpoint()?;

        for action in subnet_actions {
            match self.client().prepare_subnet(&action.action_params) {
                Ok(subnet_id) => results.push(ActionResult::PrepareSubnet(
                    PrepareSubnetResult::ok(&action.action_id, subnet_id),
                )),
                Err(err) => {
                    tracing::error!(error = %err, "subnet preparation failed");
                    results.push(ActionResult::PrepareSubnet(PrepareSubnetResult::failure(
                        &action.action_id,
                        err.to_string(),
                    )));
                }
            }
        }

        cancellation.checkpoint()?;

        Ok(results)
    }

    /// Acknowledges a cleanup-network action.
    ///
    /// No provider teardown is invoked in this version; the acknowledgement
    /// is a known gap kept until the provider exposes a deprovisioning call.
    #[must_use]
    pub fn cleanup_sandbox_infra(
        &self,
        _resource: &CloudProviderResource,
        action: &CleanupNetworkAction,
    ) -> ActionResult {
        ActionResult::CleanupNetwork(CleanupNetworkResult {
            action_id: action.action_id.clone(),
            success: true,
            error_message: String::new(),
        })
    }
}
