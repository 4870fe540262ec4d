//! Service wrapper translating platform actions into provider calls.
//!
//! Each function maps one platform action family onto the injected
//! [`CloudClient`], converts the outcome into platform result records, and
//! applies the per-action error-capture policy: provider failures inside a
//! recovery boundary become failed results, everything else propagates.

mod deploy;
mod details;
mod infra;
#[cfg(test)]
mod tests;

pub use details::{extract_vm_details, extract_vm_instance_data, extract_vm_instance_network_data};

use rand::Rng;

use crate::client::CloudClient;
use crate::error::DriverError;
use crate::resource::CloudProviderResource;
use crate::session::HostSession;

/// Error message reported on results short-circuited by cancellation.
pub const CANCELLED_MESSAGE: &str = "Operation canceled";

/// Attribute under which the deployed app's public IP is recorded.
pub const PUBLIC_IP_ATTRIBUTE: &str = "Public IP";

/// Stateless translation layer over an injected provider client.
#[derive(Clone, Copy, Debug)]
pub struct CloudService<'a, C> {
    client: &'a C,
}

impl<'a, C: CloudClient> CloudService<'a, C> {
    /// Creates a service borrowing the given client.
    #[must_use]
    pub const fn new(client: &'a C) -> Self {
        Self { client }
    }

    pub(crate) const fn client(&self) -> &'a C {
        self.client
    }

    /// Powers a VM on. Direct pass-through.
    ///
    /// # Errors
    ///
    /// Returns [`DriverError::Provider`] when the provider refuses.
    pub fn power_on(
        &self,
        resource: &CloudProviderResource,
        vm_id: &str,
    ) -> Result<(), DriverError> {
        self.client.power_on(resource, vm_id)?;
        Ok(())
    }

    /// Powers a VM off. Direct pass-through.
    ///
    /// # Errors
    ///
    /// Returns [`DriverError::Provider`] when the provider refuses.
    pub fn power_off(
        &self,
        resource: &CloudProviderResource,
        vm_id: &str,
    ) -> Result<(), DriverError> {
        self.client.power_off(resource, vm_id)?;
        Ok(())
    }

    /// Deletes a VM. Direct pass-through.
    ///
    /// # Errors
    ///
    /// Returns [`DriverError::Provider`] when deletion fails.
    pub fn delete_instance(
        &self,
        resource: &CloudProviderResource,
        vm_id: &str,
    ) -> Result<(), DriverError> {
        self.client.delete_instance(resource, vm_id)?;
        Ok(())
    }

    /// Refreshes the deployed app's address from the provider.
    ///
    /// When the live address differs from the recorded private IP, the host
    /// session receives an address update. When no public IP was previously
    /// recorded, a placeholder one is assigned through the session.
    ///
    /// # Errors
    ///
    /// Returns [`DriverError::Provider`] when the provider query fails and
    /// [`DriverError::Session`] when a host update is rejected.
    pub fn remote_refresh_ip(
        &self,
        resource: &CloudProviderResource,
        session: &impl HostSession,
        resource_fullname: &str,
        vm_id: &str,
        private_ip: &str,
        public_ip: Option<&str>,
    ) -> Result<(), DriverError> {
        let current_ip = self.client.refresh_ip(resource, resource_fullname, vm_id)?;

        if private_ip != current_ip {
            session.update_resource_address(resource_fullname, &current_ip)?;
        }

        if public_ip.is_none() {
            let placeholder = format!("1.1.1.{}", rand::thread_rng().gen_range(1..=253));
            session.set_attribute_value(resource_fullname, PUBLIC_IP_ATTRIBUTE, &placeholder)?;
        }

        Ok(())
    }
}
