//! Provider-SDK capability and the reference Heavenly Cloud client.
//!
//! The driver never talks to a concrete SDK directly: every provider call
//! goes through [`CloudClient`], injected at construction. [`HeavenlyCloud`]
//! is the deterministic reference implementation standing in for the real
//! provider; tests substitute their own fakes.

use std::collections::BTreeMap;

use rand::Rng;
use thiserror::Error;
use uuid::Uuid;

use crate::actions::{ConnectSubnetAction, PrepareSubnetParams};
use crate::resource::CloudProviderResource;

/// Errors raised by provider clients.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum ClientError {
    /// Raised when the provider endpoint cannot be reached.
    #[error("could not reach the Heavenly Cloud endpoint at '{address}'")]
    Unreachable {
        /// Endpoint address the probe targeted.
        address: String,
    },
    /// Raised when the provider rejects an operation.
    #[error("{operation} failed: {message}")]
    Rejected {
        /// Operation the provider rejected.
        operation: &'static str,
        /// Message returned by the provider.
        message: String,
    },
}

/// Opaque handle for a provisioned virtual machine.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct VmInstance {
    /// Provider identifier.
    pub id: String,
    /// Name the instance was created under.
    pub name: String,
    /// Private address assigned by the provider.
    pub private_ip: String,
}

/// Network-attachment metadata keyed by subnet identifier.
pub type NetworkAttachments = BTreeMap<String, String>;

/// Parameters for creating an Angel instance.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AngelInstanceRequest {
    /// API user deploying the instance.
    pub user: String,
    /// Rotated credential for the instance.
    pub password: String,
    /// Collision-resistant VM name.
    pub name: String,
    /// Number of wings to provision.
    pub wing_count: u32,
    /// Flight speed class.
    pub flight_speed: String,
    /// Size class of the backing cloud.
    pub cloud_size: String,
    /// Boot image.
    pub cloud_image_id: String,
    /// Subnet attachments prepared for the instance.
    pub network: NetworkAttachments,
}

/// Parameters for creating a Man instance.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ManInstanceRequest {
    /// API user deploying the instance.
    pub user: String,
    /// Rotated credential for the instance.
    pub password: String,
    /// Collision-resistant VM name.
    pub name: String,
    /// Body weight in kilograms.
    pub weight: u32,
    /// Body height in centimetres.
    pub height: u32,
    /// Size class of the backing cloud.
    pub cloud_size: String,
    /// Boot image.
    pub cloud_image_id: String,
}

/// Synchronous provider-SDK capability consumed by the driver.
///
/// All calls block until the provider answers; cancellation is observed only
/// between calls.
pub trait CloudClient {
    /// Probes connectivity with the given credentials.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Unreachable`] when the endpoint rejects the
    /// probe.
    fn can_connect(&self, user: &str, password: &str, address: &str) -> Result<(), ClientError>;

    /// Returns the provider's preferred cloud color.
    fn preferred_cloud_color(&self) -> String;

    /// Mints a rotated credential for a new instance.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] when the provider refuses to rotate.
    fn create_new_password(
        &self,
        resource: &CloudProviderResource,
        user: &str,
        password: &str,
    ) -> Result<String, ClientError>;

    /// Translates subnet-attachment actions into provider networking
    /// metadata.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] when the provider cannot prepare the network.
    fn prepare_instance_network(
        &self,
        subnets: &[&ConnectSubnetAction],
    ) -> Result<NetworkAttachments, ClientError>;

    /// Creates an Angel instance.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] when instance creation fails.
    fn create_angel_instance(
        &self,
        resource: &CloudProviderResource,
        request: &AngelInstanceRequest,
    ) -> Result<VmInstance, ClientError>;

    /// Creates a Man instance.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] when instance creation fails.
    fn create_man_instance(
        &self,
        resource: &CloudProviderResource,
        request: &ManInstanceRequest,
    ) -> Result<VmInstance, ClientError>;

    /// Fetches an instance by identity.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] when the lookup fails.
    fn get_instance(
        &self,
        resource: &CloudProviderResource,
        name: &str,
        uid: &str,
        address: &str,
    ) -> Result<VmInstance, ClientError>;

    /// Powers an instance on.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] when the provider refuses.
    fn power_on(&self, resource: &CloudProviderResource, vm_id: &str) -> Result<(), ClientError>;

    /// Powers an instance off.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] when the provider refuses.
    fn power_off(&self, resource: &CloudProviderResource, vm_id: &str) -> Result<(), ClientError>;

    /// Deletes an instance.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] when deletion fails.
    fn delete_instance(
        &self,
        resource: &CloudProviderResource,
        vm_id: &str,
    ) -> Result<(), ClientError>;

    /// Queries the current private address of an instance.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] when the query fails.
    fn refresh_ip(
        &self,
        resource: &CloudProviderResource,
        resource_fullname: &str,
        vm_id: &str,
    ) -> Result<String, ClientError>;

    /// Allocates the sandbox-wide network from a CIDR.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] when allocation fails.
    fn prepare_infra(
        &self,
        resource: &CloudProviderResource,
        cidr: &str,
    ) -> Result<(), ClientError>;

    /// Creates or fetches the sandbox SSH key pair.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] when key provisioning fails.
    fn get_or_create_ssh_key(&self) -> Result<String, ClientError>;

    /// Prepares one subnet inside the sandbox network.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] when subnet preparation fails.
    fn prepare_subnet(&self, params: &PrepareSubnetParams) -> Result<String, ClientError>;

    /// Rolls back resources created so far by the current operation.
    fn rollback(&self);
}

/// Deterministic reference client standing in for the Heavenly Cloud SDK.
#[derive(Clone, Copy, Debug, Default)]
pub struct HeavenlyCloud;

impl HeavenlyCloud {
    /// Creates the reference client.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl CloudClient for HeavenlyCloud {
    fn can_connect(&self, user: &str, password: &str, address: &str) -> Result<(), ClientError> {
        if user.is_empty() || password.is_empty() {
            return Err(ClientError::Unreachable {
                address: address.to_owned(),
            });
        }
        Ok(())
    }

    fn preferred_cloud_color(&self) -> String {
        String::from("pearl white")
    }

    fn create_new_password(
        &self,
        _resource: &CloudProviderResource,
        _user: &str,
        _password: &str,
    ) -> Result<String, ClientError> {
        Ok(Uuid::new_v4().simple().to_string())
    }

    fn prepare_instance_network(
        &self,
        subnets: &[&ConnectSubnetAction],
    ) -> Result<NetworkAttachments, ClientError> {
        Ok(subnets
            .iter()
            .enumerate()
            .map(|(index, subnet)| {
                (
                    subnet.action_params.subnet_id.clone(),
                    format!("nic-{index}"),
                )
            })
            .collect())
    }

    fn create_angel_instance(
        &self,
        _resource: &CloudProviderResource,
        request: &AngelInstanceRequest,
    ) -> Result<VmInstance, ClientError> {
        if request.wing_count == 0 {
            return Err(ClientError::Rejected {
                operation: "create_angel_instance",
                message: String::from("an angel needs at least one wing"),
            });
        }
        Ok(Self::mint_instance(&request.name))
    }

    fn create_man_instance(
        &self,
        _resource: &CloudProviderResource,
        request: &ManInstanceRequest,
    ) -> Result<VmInstance, ClientError> {
        Ok(Self::mint_instance(&request.name))
    }

    fn get_instance(
        &self,
        _resource: &CloudProviderResource,
        name: &str,
        uid: &str,
        address: &str,
    ) -> Result<VmInstance, ClientError> {
        Ok(VmInstance {
            id: uid.to_owned(),
            name: name.to_owned(),
            private_ip: address.to_owned(),
        })
    }

    fn power_on(&self, _resource: &CloudProviderResource, _vm_id: &str) -> Result<(), ClientError> {
        Ok(())
    }

    fn power_off(
        &self,
        _resource: &CloudProviderResource,
        _vm_id: &str,
    ) -> Result<(), ClientError> {
        Ok(())
    }

    fn delete_instance(
        &self,
        _resource: &CloudProviderResource,
        _vm_id: &str,
    ) -> Result<(), ClientError> {
        Ok(())
    }

    fn refresh_ip(
        &self,
        _resource: &CloudProviderResource,
        _resource_fullname: &str,
        _vm_id: &str,
    ) -> Result<String, ClientError> {
        Ok(format!("10.0.0.{}", rand::thread_rng().gen_range(2..=253)))
    }

    fn prepare_infra(
        &self,
        _resource: &CloudProviderResource,
        cidr: &str,
    ) -> Result<(), ClientError> {
        if cidr.contains('/') {
            return Ok(());
        }
        Err(ClientError::Rejected {
            operation: "prepare_infra",
            message: format!("'{cidr}' is not a CIDR range"),
        })
    }

    fn get_or_create_ssh_key(&self) -> Result<String, ClientError> {
        Ok(format!("ssh-rsa {}", Uuid::new_v4().simple()))
    }

    fn prepare_subnet(&self, params: &PrepareSubnetParams) -> Result<String, ClientError> {
        if params.cidr.contains('/') {
            return Ok(format!("subnet-{}", Uuid::new_v4().simple()));
        }
        Err(ClientError::Rejected {
            operation: "prepare_subnet",
            message: format!("'{}' is not a CIDR range", params.cidr),
        })
    }

    fn rollback(&self) {}
}

impl HeavenlyCloud {
    fn mint_instance(name: &str) -> VmInstance {
        VmInstance {
            id: Uuid::new_v4().to_string(),
            name: name.to_owned(),
            private_ip: format!("10.0.0.{}", rand::thread_rng().gen_range(2..=253)),
        }
    }
}
