//! Host-supplied command contexts.
//!
//! The orchestration host passes one of these structures with every command.
//! Nothing here is persisted by the driver; any "deployed app" state lives in
//! the host platform and arrives as JSON on each call.

use serde::{Deserialize, Serialize};

use crate::error::DriverError;

/// Resource description embedded in every command context.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct ContextResource {
    /// Display name of the cloud-provider resource.
    pub name: String,
    /// Address configured on the resource (provider endpoint).
    pub address: String,
    /// Attribute bag configured on the resource by the host operator.
    #[serde(default)]
    pub attributes: std::collections::BTreeMap<String, String>,
}

impl ContextResource {
    /// Returns the named attribute, or an empty string when absent.
    #[must_use]
    pub fn attribute(&self, name: &str) -> String {
        self.attributes.get(name).cloned().unwrap_or_default()
    }
}

/// Reservation (sandbox) metadata for the command.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct ReservationContext {
    /// Identifier of the sandbox this command runs in.
    pub reservation_id: String,
}

/// Context for commands executed against the cloud-provider resource itself.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct ResourceCommandContext {
    /// The cloud-provider resource the command targets.
    pub resource: ContextResource,
    /// Sandbox metadata.
    pub reservation: ReservationContext,
}

/// Context for commands executed against an already-deployed app.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct RemoteCommandContext {
    /// The cloud-provider resource the command targets.
    pub resource: ContextResource,
    /// Sandbox metadata.
    pub reservation: ReservationContext,
    /// Deployed apps this remote command addresses. Lifecycle commands act
    /// on the first endpoint only.
    #[serde(default)]
    pub remote_endpoints: Vec<RemoteEndpoint>,
}

impl RemoteCommandContext {
    /// Returns the single deployed-app endpoint this command addresses.
    ///
    /// # Errors
    ///
    /// Returns [`DriverError::Malformed`] when the host supplied no remote
    /// endpoints.
    pub fn endpoint(&self) -> Result<&RemoteEndpoint, DriverError> {
        self.remote_endpoints.first().ok_or_else(|| {
            DriverError::Malformed(String::from("remote command context has no endpoints"))
        })
    }
}

/// One deployed app addressed by a remote command.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct RemoteEndpoint {
    /// Full path of the deployed app in the host inventory.
    pub fullname: String,
    /// Address currently recorded for the deployed app (its private IP).
    pub address: String,
    /// Host-serialized deployed-app descriptor.
    pub deployed_app_json: String,
}

impl RemoteEndpoint {
    /// Parses the embedded deployed-app descriptor.
    ///
    /// # Errors
    ///
    /// Returns [`DriverError::Malformed`] when the embedded JSON does not
    /// match the descriptor shape.
    pub fn deployed_app(&self) -> Result<DeployedApp, DriverError> {
        serde_json::from_str(&self.deployed_app_json)
            .map_err(|err| DriverError::malformed("deployed app descriptor", &err))
    }
}

/// Deployed-app descriptor carried inside a remote endpoint.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct DeployedApp {
    /// Name of the deployed app.
    #[serde(default)]
    pub name: String,
    /// Address currently recorded for the deployed app.
    #[serde(default)]
    pub address: String,
    /// Attributes recorded on the deployed app.
    #[serde(default)]
    pub attributes: Vec<DeployedAppAttribute>,
    /// Provider VM identity.
    pub vmdetails: VmIdentity,
}

impl DeployedApp {
    /// Returns the value of the named attribute, when recorded.
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|attribute| attribute.name == name)
            .map(|attribute| attribute.value.as_str())
    }
}

/// Name/value attribute pair on a deployed app.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct DeployedAppAttribute {
    /// Attribute name.
    pub name: String,
    /// Attribute value.
    pub value: String,
}

/// Provider VM identity recorded on a deployed app.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct VmIdentity {
    /// Unique identifier assigned by the provider at deploy time.
    pub uid: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn endpoint_with(json: &str) -> RemoteEndpoint {
        RemoteEndpoint {
            fullname: String::from("Sandbox/app1"),
            address: String::from("10.0.0.5"),
            deployed_app_json: json.to_owned(),
        }
    }

    #[test]
    fn deployed_app_parses_uid_and_attributes() {
        let endpoint = endpoint_with(
            r#"{"name":"app1","attributes":[{"name":"Public IP","value":"1.1.1.9"}],"vmdetails":{"uid":"vm-42"}}"#,
        );
        let app = endpoint.deployed_app().expect("descriptor should parse");
        assert_eq!(app.vmdetails.uid, "vm-42");
        assert_eq!(app.attribute("Public IP"), Some("1.1.1.9"));
        assert_eq!(app.attribute("missing"), None);
    }

    #[test]
    fn malformed_descriptor_is_reported() {
        let endpoint = endpoint_with("{not json");
        assert!(matches!(
            endpoint.deployed_app(),
            Err(DriverError::Malformed(_))
        ));
    }

    #[test]
    fn context_without_endpoints_is_rejected() {
        let context = RemoteCommandContext::default();
        assert!(matches!(context.endpoint(), Err(DriverError::Malformed(_))));
    }
}
