//! Test support utilities shared across unit and integration tests.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use crate::actions::{ConnectSubnetAction, PrepareSubnetParams};
use crate::cancellation::CancellationToken;
use crate::client::{
    AngelInstanceRequest, ClientError, CloudClient, ManInstanceRequest, NetworkAttachments,
    VmInstance,
};
use crate::resource::CloudProviderResource;
use crate::session::{HostSession, SessionError};

/// Recording provider client with scriptable failures.
///
/// Every call is appended to a shared log so tests can assert which provider
/// operations ran and in what order. Individual operations can be scripted
/// to fail, and the client can cancel a token after a given number of
/// instance lookups to exercise mid-batch cancellation.
#[derive(Clone, Debug, Default)]
pub struct RecordingClient {
    calls: Rc<RefCell<Vec<String>>>,
    fail_operations: Rc<RefCell<Vec<&'static str>>>,
    refresh_ip_value: Rc<RefCell<String>>,
    cancel_after_lookups: Rc<RefCell<Option<(usize, CancellationToken)>>>,
    lookups: Rc<RefCell<usize>>,
}

impl RecordingClient {
    /// Creates a client that succeeds on every operation.
    #[must_use]
    pub fn new() -> Self {
        let client = Self::default();
        *client.refresh_ip_value.borrow_mut() = String::from("10.0.0.2");
        client
    }

    /// Scripts the named operation to fail with a provider rejection.
    pub fn fail_operation(&self, operation: &'static str) {
        self.fail_operations.borrow_mut().push(operation);
    }

    /// Sets the address returned by `refresh_ip`.
    pub fn set_refresh_ip(&self, address: impl Into<String>) {
        *self.refresh_ip_value.borrow_mut() = address.into();
    }

    /// Cancels the given token once `count` instance lookups have completed.
    pub fn cancel_after_lookups(&self, count: usize, token: &CancellationToken) {
        *self.cancel_after_lookups.borrow_mut() = Some((count, token.clone()));
    }

    /// Returns a snapshot of all provider calls recorded so far.
    #[must_use]
    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }

    fn record(&self, operation: &'static str) -> Result<(), ClientError> {
        self.calls.borrow_mut().push(operation.to_owned());
        if self.fail_operations.borrow().contains(&operation) {
            return Err(ClientError::Rejected {
                operation,
                message: format!("{operation} exploded"),
            });
        }
        Ok(())
    }
}

impl CloudClient for RecordingClient {
    fn can_connect(&self, _user: &str, _password: &str, address: &str) -> Result<(), ClientError> {
        self.record("can_connect")
            .map_err(|_| ClientError::Unreachable {
                address: address.to_owned(),
            })
    }

    fn preferred_cloud_color(&self) -> String {
        self.calls
            .borrow_mut()
            .push(String::from("preferred_cloud_color"));
        String::from("pearl white")
    }

    fn create_new_password(
        &self,
        _resource: &CloudProviderResource,
        _user: &str,
        _password: &str,
    ) -> Result<String, ClientError> {
        self.record("create_new_password")?;
        Ok(String::from("rotated"))
    }

    fn prepare_instance_network(
        &self,
        subnets: &[&ConnectSubnetAction],
    ) -> Result<NetworkAttachments, ClientError> {
        self.record("prepare_instance_network")?;
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
        self.record("create_angel_instance")?;
        Ok(VmInstance {
            id: String::from("vm-angel-1"),
            name: request.name.clone(),
            private_ip: String::from("10.0.0.7"),
        })
    }

    fn create_man_instance(
        &self,
        _resource: &CloudProviderResource,
        request: &ManInstanceRequest,
    ) -> Result<VmInstance, ClientError> {
        self.record("create_man_instance")?;
        Ok(VmInstance {
            id: String::from("vm-man-1"),
            name: request.name.clone(),
            private_ip: String::from("10.0.0.8"),
        })
    }

    fn get_instance(
        &self,
        _resource: &CloudProviderResource,
        name: &str,
        uid: &str,
        address: &str,
    ) -> Result<VmInstance, ClientError> {
        self.record("get_instance")?;
        let completed = {
            let mut lookups = self.lookups.borrow_mut();
            *lookups += 1;
            *lookups
        };
        if let Some((count, token)) = self.cancel_after_lookups.borrow().as_ref()
            && completed >= *count
        {
            token.cancel();
        }
        Ok(VmInstance {
            id: uid.to_owned(),
            name: name.to_owned(),
            private_ip: address.to_owned(),
        })
    }

    fn power_on(&self, _resource: &CloudProviderResource, _vm_id: &str) -> Result<(), ClientError> {
        self.record("power_on")
    }

    fn power_off(
        &self,
        _resource: &CloudProviderResource,
        _vm_id: &str,
    ) -> Result<(), ClientError> {
        self.record("power_off")
    }

    fn delete_instance(
        &self,
        _resource: &CloudProviderResource,
        _vm_id: &str,
    ) -> Result<(), ClientError> {
        self.record("delete_instance")
    }

    fn refresh_ip(
        &self,
        _resource: &CloudProviderResource,
        _resource_fullname: &str,
        _vm_id: &str,
    ) -> Result<String, ClientError> {
        self.record("refresh_ip")?;
        Ok(self.refresh_ip_value.borrow().clone())
    }

    fn prepare_infra(
        &self,
        _resource: &CloudProviderResource,
        _cidr: &str,
    ) -> Result<(), ClientError> {
        self.record("prepare_infra")
    }

    fn get_or_create_ssh_key(&self) -> Result<String, ClientError> {
        self.record("get_or_create_ssh_key")?;
        Ok(String::from("ssh-rsa sandbox-key"))
    }

    fn prepare_subnet(&self, params: &PrepareSubnetParams) -> Result<String, ClientError> {
        self.record("prepare_subnet")?;
        Ok(format!("subnet-for-{}", params.cidr))
    }

    fn rollback(&self) {
        self.calls.borrow_mut().push(String::from("rollback"));
    }
}

/// Recording host session.
///
/// Decryption strips an `enc:` prefix; address and attribute updates are
/// captured for assertions.
#[derive(Clone, Debug, Default)]
pub struct RecordingSession {
    address_updates: Rc<RefCell<Vec<(String, String)>>>,
    attribute_updates: Rc<RefCell<Vec<(String, String, String)>>>,
}

impl RecordingSession {
    /// Creates an empty session.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Address updates received so far, as (fullname, address) pairs.
    #[must_use]
    pub fn address_updates(&self) -> Vec<(String, String)> {
        self.address_updates.borrow().clone()
    }

    /// Attribute updates received so far, as (fullname, attribute, value)
    /// triples.
    #[must_use]
    pub fn attribute_updates(&self) -> Vec<(String, String, String)> {
        self.attribute_updates.borrow().clone()
    }
}

impl HostSession for RecordingSession {
    fn decrypt_password(&self, encrypted: &str) -> Result<String, SessionError> {
        Ok(encrypted
            .strip_prefix("enc:")
            .unwrap_or(encrypted)
            .to_owned())
    }

    fn update_resource_address(&self, fullname: &str, address: &str) -> Result<(), SessionError> {
        self.address_updates
            .borrow_mut()
            .push((fullname.to_owned(), address.to_owned()));
        Ok(())
    }

    fn set_attribute_value(
        &self,
        fullname: &str,
        attribute: &str,
        value: &str,
    ) -> Result<(), SessionError> {
        self.attribute_updates.borrow_mut().push((
            fullname.to_owned(),
            attribute.to_owned(),
            value.to_owned(),
        ));
        Ok(())
    }
}

/// Builds a resource view suitable for tests.
#[must_use]
pub fn test_resource() -> CloudProviderResource {
    CloudProviderResource {
        name: String::from("heaven"),
        region: String::from("east"),
        user: String::from("gabriel"),
        password: String::from("s3cret"),
        address: String::from("clouds.example"),
        cloud_color: None,
    }
}

/// Builds a resource command context matching [`test_resource`].
#[must_use]
pub fn test_context() -> crate::context::ResourceCommandContext {
    let mut attributes = BTreeMap::new();
    attributes.insert(String::from("Region"), String::from("east"));
    attributes.insert(String::from("User"), String::from("gabriel"));
    attributes.insert(String::from("Password"), String::from("s3cret"));
    crate::context::ResourceCommandContext {
        resource: crate::context::ContextResource {
            name: String::from("heaven"),
            address: String::from("clouds.example"),
            attributes,
        },
        reservation: crate::context::ReservationContext {
            reservation_id: String::from("res-1234"),
        },
    }
}
