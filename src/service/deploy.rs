//! Deployment routines for the Angel and Man variants.
//!
//! Cancellation is checked once at the top of each deployment; a cancelled
//! deploy triggers a provider rollback and reports a failed result without
//! ever reaching instance creation. Provider failures during creation are a
//! local-recovery boundary: they become failed deploy results instead of
//! aborting the command.

use std::collections::BTreeMap;

use uuid::Uuid;

use super::{CANCELLED_MESSAGE, CloudService, details::extract_vm_details};
use crate::actions::{ConnectSubnetAction, DeployAppAction};
use crate::cancellation::CancellationToken;
use crate::client::{AngelInstanceRequest, CloudClient, ManInstanceRequest};
use crate::context::ResourceCommandContext;
use crate::deployment::{AngelDeployment, ManDeployment};
use crate::error::DriverError;
use crate::resource::CloudProviderResource;
use crate::results::{ActionResult, Attribute, ConnectToSubnetResult, DeployAppResult};
use crate::session::HostSession;

/// Derives a collision-resistant VM name from the requested app name.
fn unique_vm_name(app_name: &str) -> String {
    let suffix: String = Uuid::new_v4().simple().to_string().chars().take(6).collect();
    format!("{app_name}__{suffix}")
}

/// Credentials resolved for a deployment.
struct DeployCredentials {
    user: String,
    decrypted_password: String,
    rotated_password: String,
}

impl<'a, C: CloudClient> CloudService<'a, C> {
    fn resolve_credentials(
        &self,
        session: &impl HostSession,
        resource: &CloudProviderResource,
        action: &DeployAppAction,
    ) -> Result<DeployCredentials, DriverError> {
        let user = action.action_params.app_resource.attribute("User");
        let encrypted = action.action_params.app_resource.attribute("Password");
        let decrypted_password = session.decrypt_password(&encrypted)?;
        let rotated_password =
            self.client()
                .create_new_password(resource, &user, &decrypted_password)?;
        Ok(DeployCredentials {
            user,
            decrypted_password,
            rotated_password,
        })
    }

    fn deployed_app_metadata(
        context: &ResourceCommandContext,
        credentials: &DeployCredentials,
    ) -> (Vec<Attribute>, BTreeMap<String, String>) {
        // The password override lets the host surface the decrypted value on
        // the deployed app.
        let attributes = vec![Attribute::new(
            "Password",
            format!("{}_decrypted", credentials.decrypted_password),
        )];
        let mut additional_data = BTreeMap::new();
        additional_data.insert(
            String::from("Reservation Id"),
            context.reservation.reservation_id.clone(),
        );
        additional_data.insert(String::from("CreatedBy"), String::from(module_path!()));
        (attributes, additional_data)
    }

    /// Deploys an Angel instance and attaches the requested subnets.
    ///
    /// Returns one deploy result plus one connect-subnet result per
    /// requested subnet, all echoing their originating action identifiers.
    ///
    /// # Errors
    ///
    /// Returns [`DriverError::Session`] when password decryption fails and
    /// [`DriverError::Provider`] when credential rotation or network
    /// preparation fails. Instance-creation failures are reported as a
    /// failed deploy result, not as an error.
    pub fn deploy_angel(
        &self,
        context: &ResourceCommandContext,
        session: &impl HostSession,
        resource: &CloudProviderResource,
        action: &DeployAppAction,
        model: &AngelDeployment,
        subnets: &[&ConnectSubnetAction],
        cancellation: &CancellationToken,
    ) -> Result<Vec<ActionResult>, DriverError> {
        if cancellation.is_cancelled() {
            self.client().rollback();
            return Ok(vec![ActionResult::DeployApp(DeployAppResult::failure(
                &action.action_id,
                CANCELLED_MESSAGE,
            ))]);
        }

        let vm_name = unique_vm_name(&action.action_params.app_name);
        let credentials = self.resolve_credentials(session, resource, action)?;
        let network = self.client().prepare_instance_network(subnets)?;

        let request = AngelInstanceRequest {
            user: credentials.user.clone(),
            password: credentials.rotated_password.clone(),
            name: vm_name.clone(),
            wing_count: model.wing_count,
            flight_speed: model.flight_speed.clone(),
            cloud_size: model.cloud.cloud_size.clone(),
            cloud_image_id: model.cloud.cloud_image_id.clone(),
            network: network.clone(),
        };

        let instance = match self.client().create_angel_instance(resource, &request) {
            Ok(instance) => instance,
            Err(err) => {
                return Ok(vec![ActionResult::DeployApp(DeployAppResult::failure(
                    &action.action_id,
                    err.to_string(),
                ))]);
            }
        };

        let (attributes, additional_data) = Self::deployed_app_metadata(context, &credentials);
        let mut results = vec![ActionResult::DeployApp(DeployAppResult {
            action_id: action.action_id.clone(),
            success: true,
            error_message: String::new(),
            vm_uuid: instance.id.clone(),
            vm_name,
            deployed_app_address: instance.private_ip.clone(),
            deployed_app_attributes: attributes,
            deployed_app_additional_data: additional_data,
            vm_details_data: Some(extract_vm_details(Some(&instance), None)),
        })];

        for subnet in subnets {
            let interface = network
                .get(&subnet.action_params.subnet_id)
                .cloned()
                .unwrap_or_default();
            results.push(ActionResult::ConnectToSubnet(ConnectToSubnetResult {
                action_id: subnet.action_id.clone(),
                success: true,
                error_message: String::new(),
                interface,
            }));
        }

        Ok(results)
    }

    /// Deploys a Man instance.
    ///
    /// # Errors
    ///
    /// Returns [`DriverError::Session`] when password decryption fails and
    /// [`DriverError::Provider`] when credential rotation fails.
    /// Instance-creation failures are reported as a failed deploy result,
    /// not as an error.
    pub fn deploy_man(
        &self,
        context: &ResourceCommandContext,
        session: &impl HostSession,
        resource: &CloudProviderResource,
        action: &DeployAppAction,
        model: &ManDeployment,
        cancellation: &CancellationToken,
    ) -> Result<Vec<ActionResult>, DriverError> {
        if cancellation.is_cancelled() {
            self.client().rollback();
            return Ok(vec![ActionResult::DeployApp(DeployAppResult::failure(
                &action.action_id,
                CANCELLED_MESSAGE,
            ))]);
        }

        let vm_name = unique_vm_name(&action.action_params.app_name);
        let credentials = self.resolve_credentials(session, resource, action)?;

        let request = ManInstanceRequest {
            user: credentials.user.clone(),
            password: credentials.rotated_password.clone(),
            name: vm_name.clone(),
            weight: model.weight,
            height: model.height,
            cloud_size: model.cloud.cloud_size.clone(),
            cloud_image_id: model.cloud.cloud_image_id.clone(),
        };

        let instance = match self.client().create_man_instance(resource, &request) {
            Ok(instance) => instance,
            Err(err) => {
                return Ok(vec![ActionResult::DeployApp(DeployAppResult::failure(
                    &action.action_id,
                    err.to_string(),
                ))]);
            }
        };

        let (attributes, additional_data) = Self::deployed_app_metadata(context, &credentials);
        Ok(vec![ActionResult::DeployApp(DeployAppResult {
            action_id: action.action_id.clone(),
            success: true,
            error_message: String::new(),
            vm_uuid: instance.id.clone(),
            vm_name,
            deployed_app_address: instance.private_ip.clone(),
            deployed_app_attributes: attributes,
            deployed_app_additional_data: additional_data,
            vm_details_data: Some(extract_vm_details(Some(&instance), None)),
        })])
    }
}
