//! Driver facade exposed to the orchestration host.
//!
//! Each command rebuilds the per-call resource view from the supplied
//! context, parses the request body into typed actions, dispatches to the
//! service wrapper, and serializes the result batch back into the host's
//! response envelope. Commands run inside a named tracing span and log
//! their payloads in canonical JSON form.

use crate::actions::{
    connect_subnet_actions, parse_driver_request, prepare_subnet_actions, single_cleanup_network,
    single_create_keys, single_deploy_app, single_prepare_infra,
};
use crate::cancellation::CancellationToken;
use crate::client::CloudClient;
use crate::context::{RemoteCommandContext, ResourceCommandContext};
use crate::deployment::{
    ANGEL_DEPLOYMENT_PATH, DeploymentModel, DeploymentRegistry, MAN_DEPLOYMENT_PATH,
};
use crate::error::DriverError;
use crate::resource::{AutoloadDetails, CloudProviderResource};
use crate::results::{canonical_json, to_driver_response_json};
use crate::service::{CloudService, PUBLIC_IP_ATTRIBUTE};
use crate::session::HostSession;
use crate::telemetry::log_value;

/// Heavenly Cloud driver.
///
/// Stateless between invocations: the only state carried is the injected
/// capabilities and the deployment-path registry populated by
/// [`initialize`](Self::initialize).
#[derive(Clone, Debug)]
pub struct HeavenlyCloudDriver<C, S> {
    client: C,
    session: S,
    registry: DeploymentRegistry,
}

impl<C: CloudClient, S: HostSession> HeavenlyCloudDriver<C, S> {
    /// Creates a driver over the given provider client and host session.
    ///
    /// Call [`initialize`](Self::initialize) before dispatching deploys.
    #[must_use]
    pub fn new(client: C, session: S) -> Self {
        Self {
            client,
            session,
            registry: DeploymentRegistry::new(),
        }
    }

    /// Registers the supported deployment-model schemas. Idempotent.
    pub fn initialize(&mut self) {
        self.registry.register_angel(ANGEL_DEPLOYMENT_PATH);
        self.registry.register_man(MAN_DEPLOYMENT_PATH);
    }

    const fn service(&self) -> CloudService<'_, C> {
        CloudService::new(&self.client)
    }

    /// Discovers the cloud-provider resource and returns its inventory
    /// descriptor.
    ///
    /// # Errors
    ///
    /// Returns [`DriverError::Validation`] for forbidden discovery input and
    /// [`DriverError::Connection`] when the connectivity probe fails.
    pub fn get_inventory(
        &self,
        context: &ResourceCommandContext,
    ) -> Result<AutoloadDetails, DriverError> {
        let _span = tracing::info_span!("get_inventory").entered();
        log_value("get_inventory_context", context);

        let mut resource = CloudProviderResource::from_context(&context.resource);
        resource.validate_discovery()?;

        self.client
            .can_connect(&resource.user, &resource.password, &resource.address)
            .map_err(|err| DriverError::Connection(err.to_string()))?;

        if resource.cloud_color.is_none() {
            resource.set_cloud_color(self.client.preferred_cloud_color());
        }

        Ok(resource.autoload_details())
    }

    /// Deploys one app, dispatching on the action's deployment path.
    ///
    /// Returns the serialized result batch: the deploy result plus, for the
    /// Angel variant, one result per requested subnet attachment.
    ///
    /// # Errors
    ///
    /// Returns [`DriverError::Lookup`] unless exactly one deploy action is
    /// present, [`DriverError::UnsupportedConfiguration`] for an
    /// unregistered deployment path, and [`DriverError::Malformed`] for an
    /// unparseable request.
    pub fn deploy(
        &self,
        context: &ResourceCommandContext,
        request: &str,
        cancellation: &CancellationToken,
    ) -> Result<String, DriverError> {
        let _span = tracing::info_span!("deploy").entered();
        log_value("deploy_request", &request);
        log_value("deploy_context", context);

        let resource = CloudProviderResource::from_context(&context.resource);
        let actions = parse_driver_request(request)?;
        let deploy_action = single_deploy_app(&actions)?;
        let subnets = connect_subnet_actions(&actions);

        let selection = &deploy_action.action_params.deployment;
        let model = self
            .registry
            .resolve(&selection.deployment_path, &selection.custom_model)?;
        tracing::info!(deployment_path = %selection.deployment_path, "dispatching deployment");

        let results = match &model {
            DeploymentModel::Angel(angel) => self.service().deploy_angel(
                context,
                &self.session,
                &resource,
                deploy_action,
                angel,
                &subnets,
                cancellation,
            )?,
            DeploymentModel::Man(man) => self.service().deploy_man(
                context,
                &self.session,
                &resource,
                deploy_action,
                man,
                cancellation,
            )?,
        };

        log_value("deploy_results", &results);
        to_driver_response_json(&results)
    }

    /// Powers the deployed app's VM on.
    ///
    /// # Errors
    ///
    /// Returns [`DriverError::Malformed`] for a bad deployed-app descriptor
    /// and [`DriverError::Provider`] when the provider refuses.
    pub fn power_on(&self, context: &RemoteCommandContext) -> Result<(), DriverError> {
        let _span = tracing::info_span!("power_on").entered();
        log_value("power_on_context", context);

        let resource = CloudProviderResource::from_context(&context.resource);
        let app = context.endpoint()?.deployed_app()?;
        self.service().power_on(&resource, &app.vmdetails.uid)
    }

    /// Powers the deployed app's VM off.
    ///
    /// # Errors
    ///
    /// Returns [`DriverError::Malformed`] for a bad deployed-app descriptor
    /// and [`DriverError::Provider`] when the provider refuses.
    pub fn power_off(&self, context: &RemoteCommandContext) -> Result<(), DriverError> {
        let _span = tracing::info_span!("power_off").entered();
        log_value("power_off_context", context);

        let resource = CloudProviderResource::from_context(&context.resource);
        let app = context.endpoint()?.deployed_app()?;
        self.service().power_off(&resource, &app.vmdetails.uid)
    }

    /// Power-cycle is not implemented for this provider.
    ///
    /// # Errors
    ///
    /// Never fails; present so the host sees the full command surface.
    pub fn power_cycle(
        &self,
        _context: &RemoteCommandContext,
        _delay_seconds: u64,
    ) -> Result<(), DriverError> {
        Ok(())
    }

    /// Deletes the deployed app's VM.
    ///
    /// # Errors
    ///
    /// Returns [`DriverError::Malformed`] for a bad deployed-app descriptor
    /// and [`DriverError::Provider`] when deletion fails.
    pub fn delete_instance(&self, context: &RemoteCommandContext) -> Result<(), DriverError> {
        let _span = tracing::info_span!("delete_instance").entered();
        log_value("delete_instance_context", context);

        let resource = CloudProviderResource::from_context(&context.resource);
        let app = context.endpoint()?.deployed_app()?;
        self.service().delete_instance(&resource, &app.vmdetails.uid)
    }

    /// Answers a batch of VM details requests with canonical JSON.
    ///
    /// When cancellation fires mid-batch the results accumulated so far are
    /// returned.
    ///
    /// # Errors
    ///
    /// Returns [`DriverError::Malformed`] for an unparseable batch and
    /// [`DriverError::Provider`] when an instance lookup fails.
    pub fn get_vm_details(
        &self,
        context: &ResourceCommandContext,
        requests: &str,
        cancellation: &CancellationToken,
    ) -> Result<String, DriverError> {
        let _span = tracing::info_span!("get_vm_details").entered();
        log_value("get_vm_details_context", context);
        log_value("get_vm_details_requests", &requests);

        let resource = CloudProviderResource::from_context(&context.resource);
        let results = self
            .service()
            .get_vm_details(&resource, cancellation, requests)?;
        canonical_json(&results)
    }

    /// Refreshes the deployed app's address from the provider.
    ///
    /// # Errors
    ///
    /// Returns [`DriverError::Malformed`] for a bad deployed-app descriptor,
    /// [`DriverError::Provider`] when the provider query fails, and
    /// [`DriverError::Session`] when a host update is rejected.
    pub fn remote_refresh_ip(
        &self,
        context: &RemoteCommandContext,
        _cancellation: &CancellationToken,
    ) -> Result<(), DriverError> {
        let _span = tracing::info_span!("remote_refresh_ip").entered();
        log_value("remote_refresh_ip_context", context);

        let resource = CloudProviderResource::from_context(&context.resource);
        let endpoint = context.endpoint()?;
        let app = endpoint.deployed_app()?;
        let public_ip = app.attribute(PUBLIC_IP_ATTRIBUTE);

        self.service().remote_refresh_ip(
            &resource,
            &self.session,
            &endpoint.fullname,
            &app.vmdetails.uid,
            &endpoint.address,
            public_ip,
        )
    }

    /// Prepares the sandbox network, SSH keys, and subnets.
    ///
    /// # Errors
    ///
    /// Returns [`DriverError::Lookup`] unless exactly one infra action and
    /// exactly one create-keys action are present, and
    /// [`DriverError::Cancelled`] when cancellation fires between stages.
    pub fn prepare_sandbox_infra(
        &self,
        context: &ResourceCommandContext,
        request: &str,
        cancellation: &CancellationToken,
    ) -> Result<String, DriverError> {
        let _span = tracing::info_span!("prepare_sandbox_infra").entered();
        log_value("prepare_sandbox_infra_request", &request);
        log_value("prepare_sandbox_infra_context", context);

        let resource = CloudProviderResource::from_context(&context.resource);
        let actions = parse_driver_request(request)?;
        let infra_action = single_prepare_infra(&actions)?;
        let create_keys_action = single_create_keys(&actions)?;
        let subnet_actions = prepare_subnet_actions(&actions);

        let results = self.service().prepare_sandbox_infra(
            &resource,
            infra_action,
            create_keys_action,
            &subnet_actions,
            cancellation,
        )?;

        log_value("prepare_sandbox_infra_results", &results);
        to_driver_response_json(&results)
    }

    /// Acknowledges sandbox teardown.
    ///
    /// # Errors
    ///
    /// Returns [`DriverError::Lookup`] unless exactly one cleanup action is
    /// present and [`DriverError::Malformed`] for an unparseable request.
    pub fn cleanup_sandbox_infra(
        &self,
        context: &ResourceCommandContext,
        request: &str,
    ) -> Result<String, DriverError> {
        let _span = tracing::info_span!("cleanup_sandbox_infra").entered();
        log_value("cleanup_sandbox_infra_request", &request);
        log_value("cleanup_sandbox_infra_context", context);

        let resource = CloudProviderResource::from_context(&context.resource);
        let actions = parse_driver_request(request)?;
        let cleanup_action = single_cleanup_network(&actions)?;

        let result = self.service().cleanup_sandbox_infra(&resource, cleanup_action);
        to_driver_response_json(&[result])
    }

    /// Security-group management is not implemented for this provider.
    ///
    /// # Errors
    ///
    /// Never fails; present so the host sees the full command surface.
    pub fn set_app_security_groups(
        &self,
        _context: &ResourceCommandContext,
        _request: &str,
    ) -> Result<(), DriverError> {
        Ok(())
    }

    /// Lifecycle hook invoked when the host discards the driver. No-op.
    pub const fn cleanup(&self) {}
}
