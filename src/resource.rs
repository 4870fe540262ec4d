//! Per-call view of the cloud-provider resource.
//!
//! The resource is rebuilt from the supplied context at the start of every
//! command and discarded when the command returns; no state survives between
//! invocations.

use serde::Serialize;

use crate::context::ContextResource;
use crate::error::DriverError;

/// Attribute names the host configures on the cloud-provider resource.
const REGION_ATTRIBUTE: &str = "Region";
const USER_ATTRIBUTE: &str = "User";
const PASSWORD_ATTRIBUTE: &str = "Password";
const CLOUD_COLOR_ATTRIBUTE: &str = "Cloud Color";

/// Connection and configuration attributes of the Heavenly Cloud resource.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct CloudProviderResource {
    /// Display name of the resource.
    pub name: String,
    /// Provider region the resource points at.
    pub region: String,
    /// API user.
    pub user: String,
    /// API password as stored by the host.
    pub password: String,
    /// Provider endpoint address.
    pub address: String,
    /// Preferred cloud color, when the operator configured one.
    pub cloud_color: Option<String>,
}

impl CloudProviderResource {
    /// Builds the per-call resource view from the host context.
    #[must_use]
    pub fn from_context(resource: &ContextResource) -> Self {
        let color = resource.attribute(CLOUD_COLOR_ATTRIBUTE);
        Self {
            name: resource.name.clone(),
            region: resource.attribute(REGION_ATTRIBUTE),
            user: resource.attribute(USER_ATTRIBUTE),
            password: resource.attribute(PASSWORD_ATTRIBUTE),
            address: resource.address.clone(),
            cloud_color: (!color.is_empty()).then_some(color),
        }
    }

    /// Applies the discovery-time domain checks.
    ///
    /// # Errors
    ///
    /// Returns [`DriverError::Validation`] for the forbidden name `evil` or
    /// the forbidden region `sun`.
    pub fn validate_discovery(&self) -> Result<(), DriverError> {
        if self.name == "evil" {
            return Err(DriverError::Validation(String::from(
                "evil cannot use heaven",
            )));
        }
        if self.region == "sun" {
            return Err(DriverError::Validation(String::from(
                "invalid region, cannot deploy instances on the sun",
            )));
        }
        Ok(())
    }

    /// Builds the inventory descriptor returned by discovery.
    #[must_use]
    pub fn autoload_details(&self) -> AutoloadDetails {
        let mut attributes = vec![
            AutoloadAttribute::root(REGION_ATTRIBUTE, &self.region),
            AutoloadAttribute::root(USER_ATTRIBUTE, &self.user),
        ];
        if let Some(color) = &self.cloud_color {
            attributes.push(AutoloadAttribute::root(CLOUD_COLOR_ATTRIBUTE, color));
        }
        AutoloadDetails {
            attributes,
            resources: Vec::new(),
        }
    }

    /// Records the preferred cloud color discovered from the provider.
    pub fn set_cloud_color(&mut self, color: impl Into<String>) {
        self.cloud_color = Some(color.into());
    }
}

/// Structured inventory descriptor returned by `get_inventory`.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct AutoloadDetails {
    /// Attributes discovered on the root resource.
    pub attributes: Vec<AutoloadAttribute>,
    /// Child resources discovered under the root. The Heavenly Cloud
    /// resource has none.
    pub resources: Vec<AutoloadResource>,
}

/// One discovered attribute.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct AutoloadAttribute {
    /// Address of the owning resource relative to the root (empty for the
    /// root itself).
    pub relative_address: String,
    /// Attribute name.
    pub attribute_name: String,
    /// Attribute value.
    pub attribute_value: String,
}

impl AutoloadAttribute {
    /// Builds an attribute attached to the root resource.
    #[must_use]
    pub fn root(name: &str, value: &str) -> Self {
        Self {
            relative_address: String::new(),
            attribute_name: name.to_owned(),
            attribute_value: value.to_owned(),
        }
    }
}

/// One discovered child resource.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct AutoloadResource {
    /// Model name of the child resource.
    pub model: String,
    /// Display name of the child resource.
    pub name: String,
    /// Address of the child relative to the root.
    pub relative_address: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn context_resource(name: &str, region: &str) -> ContextResource {
        let mut attributes = BTreeMap::new();
        attributes.insert(String::from("Region"), region.to_owned());
        attributes.insert(String::from("User"), String::from("gabriel"));
        attributes.insert(String::from("Password"), String::from("s3cret"));
        ContextResource {
            name: name.to_owned(),
            address: String::from("clouds.example"),
            attributes,
        }
    }

    #[test]
    fn builds_resource_from_context_attributes() {
        let resource = CloudProviderResource::from_context(&context_resource("heaven", "east"));
        assert_eq!(resource.region, "east");
        assert_eq!(resource.user, "gabriel");
        assert_eq!(resource.cloud_color, None);
    }

    #[test]
    fn rejects_forbidden_name_and_region() {
        let evil = CloudProviderResource::from_context(&context_resource("evil", "east"));
        assert!(matches!(
            evil.validate_discovery(),
            Err(DriverError::Validation(_))
        ));

        let sun = CloudProviderResource::from_context(&context_resource("heaven", "sun"));
        assert!(matches!(
            sun.validate_discovery(),
            Err(DriverError::Validation(_))
        ));
    }

    #[test]
    fn autoload_details_include_discovered_color() {
        let mut resource = CloudProviderResource::from_context(&context_resource("heaven", "east"));
        resource.set_cloud_color("pearl");
        let details = resource.autoload_details();
        assert!(
            details
                .attributes
                .iter()
                .any(|attribute| attribute.attribute_name == "Cloud Color"
                    && attribute.attribute_value == "pearl")
        );
        assert!(details.resources.is_empty());
    }
}
