//! Platform result records and response serialization.
//!
//! Every action produces at least one result carrying the originating
//! `actionId`, so the host can correlate batch responses. Responses and
//! logged payloads use a canonical JSON form: sorted keys, compact
//! separators.

use serde::Serialize;

use crate::error::DriverError;

/// Tagged union of every result the driver can return.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum ActionResult {
    /// Result of a deploy-app action.
    DeployApp(DeployAppResult),
    /// Result of a connect-subnet action.
    ConnectToSubnet(ConnectToSubnetResult),
    /// Result of a prepare-cloud-infra action.
    PrepareCloudInfra(PrepareCloudInfraResult),
    /// Result of a create-keys action.
    CreateKeys(CreateKeysResult),
    /// Result of a prepare-subnet action.
    PrepareSubnet(PrepareSubnetResult),
    /// Result of a cleanup-network action.
    CleanupNetwork(CleanupNetworkResult),
}

impl ActionResult {
    /// Identifier of the action this result answers.
    #[must_use]
    pub fn action_id(&self) -> &str {
        match self {
            Self::DeployApp(result) => &result.action_id,
            Self::ConnectToSubnet(result) => &result.action_id,
            Self::PrepareCloudInfra(result) => &result.action_id,
            Self::CreateKeys(result) => &result.action_id,
            Self::PrepareSubnet(result) => &result.action_id,
            Self::CleanupNetwork(result) => &result.action_id,
        }
    }

    /// Whether the action succeeded.
    #[must_use]
    pub const fn succeeded(&self) -> bool {
        match self {
            Self::DeployApp(result) => result.success,
            Self::ConnectToSubnet(result) => result.success,
            Self::PrepareCloudInfra(result) => result.success,
            Self::CreateKeys(result) => result.success,
            Self::PrepareSubnet(result) => result.success,
            Self::CleanupNetwork(result) => result.success,
        }
    }
}

/// Attribute override recorded on the deployed app.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Attribute {
    /// Attribute name.
    pub attribute_name: String,
    /// Attribute value.
    pub attribute_value: String,
}

impl Attribute {
    /// Builds an attribute override.
    #[must_use]
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            attribute_name: name.into(),
            attribute_value: value.into(),
        }
    }
}

/// Result of a deploy-app action.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeployAppResult {
    /// Identifier of the deploy action.
    pub action_id: String,
    /// Whether the deployment succeeded.
    pub success: bool,
    /// Failure description; empty on success.
    pub error_message: String,
    /// Provider identifier of the created VM.
    pub vm_uuid: String,
    /// Collision-resistant name given to the VM.
    pub vm_name: String,
    /// Address recorded on the deployed app (the VM private IP).
    pub deployed_app_address: String,
    /// Attribute overrides applied to the deployed app.
    pub deployed_app_attributes: Vec<Attribute>,
    /// Free-form additional data attached to the deployed app.
    pub deployed_app_additional_data: std::collections::BTreeMap<String, String>,
    /// Details projection of the created VM.
    pub vm_details_data: Option<VmDetailsData>,
}

impl DeployAppResult {
    /// Builds a failed deploy result carrying the provider message.
    #[must_use]
    pub fn failure(action_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            action_id: action_id.into(),
            success: false,
            error_message: message.into(),
            vm_uuid: String::new(),
            vm_name: String::new(),
            deployed_app_address: String::new(),
            deployed_app_attributes: Vec::new(),
            deployed_app_additional_data: std::collections::BTreeMap::new(),
            vm_details_data: None,
        }
    }
}

/// Result of a connect-subnet action.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectToSubnetResult {
    /// Identifier of the connect action.
    pub action_id: String,
    /// Whether the attachment succeeded.
    pub success: bool,
    /// Failure description; empty on success.
    pub error_message: String,
    /// Interface metadata the attachment produced.
    pub interface: String,
}

/// Result of a prepare-cloud-infra action.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PrepareCloudInfraResult {
    /// Identifier of the infra action.
    pub action_id: String,
    /// Whether the allocation succeeded.
    pub success: bool,
    /// Failure description; empty on success.
    pub error_message: String,
}

impl PrepareCloudInfraResult {
    /// Builds a successful infra result.
    #[must_use]
    pub fn ok(action_id: impl Into<String>) -> Self {
        Self {
            action_id: action_id.into(),
            success: true,
            error_message: String::new(),
        }
    }

    /// Builds a failed infra result.
    #[must_use]
    pub fn failure(action_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            action_id: action_id.into(),
            success: false,
            error_message: message.into(),
        }
    }
}

/// Result of a create-keys action.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateKeysResult {
    /// Identifier of the create-keys action.
    pub action_id: String,
    /// Whether key provisioning succeeded.
    pub success: bool,
    /// Failure description; empty on success.
    pub error_message: String,
    /// Sandbox SSH access key; empty on failure.
    pub access_key: String,
}

impl CreateKeysResult {
    /// Builds a successful create-keys result.
    #[must_use]
    pub fn ok(action_id: impl Into<String>, access_key: impl Into<String>) -> Self {
        Self {
            action_id: action_id.into(),
            success: true,
            error_message: String::new(),
            access_key: access_key.into(),
        }
    }

    /// Builds a failed create-keys result.
    #[must_use]
    pub fn failure(action_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            action_id: action_id.into(),
            success: false,
            error_message: message.into(),
            access_key: String::new(),
        }
    }
}

/// Result of a prepare-subnet action.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PrepareSubnetResult {
    /// Identifier of the prepare-subnet action.
    pub action_id: String,
    /// Whether subnet preparation succeeded.
    pub success: bool,
    /// Failure description; empty on success.
    pub error_message: String,
    /// Provider identifier of the prepared subnet; empty on failure.
    pub subnet_id: String,
}

impl PrepareSubnetResult {
    /// Builds a successful prepare-subnet result.
    #[must_use]
    pub fn ok(action_id: impl Into<String>, subnet_id: impl Into<String>) -> Self {
        Self {
            action_id: action_id.into(),
            success: true,
            error_message: String::new(),
            subnet_id: subnet_id.into(),
        }
    }

    /// Builds a failed prepare-subnet result.
    #[must_use]
    pub fn failure(action_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            action_id: action_id.into(),
            success: false,
            error_message: message.into(),
            subnet_id: String::new(),
        }
    }
}

/// Result of a cleanup-network action.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CleanupNetworkResult {
    /// Identifier of the cleanup action.
    pub action_id: String,
    /// Whether the acknowledgement succeeded.
    pub success: bool,
    /// Failure description; empty on success.
    pub error_message: String,
}

/// Details projection of one VM, rebuilt on every query.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VmDetailsData {
    /// Key/value rows describing the instance.
    pub vm_instance_data: Vec<VmDetailsProperty>,
    /// Per-NIC records.
    pub vm_network_data: Vec<VmDetailsNetworkInterface>,
    /// App name the projection belongs to, for batch queries.
    pub app_name: Option<String>,
}

/// One display row of a VM details projection.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VmDetailsProperty {
    /// Row key.
    pub key: String,
    /// Row value.
    pub value: String,
    /// Whether the row is hidden from the host UI.
    pub hidden: bool,
}

impl VmDetailsProperty {
    /// Builds a visible row.
    #[must_use]
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            hidden: false,
        }
    }

    /// Builds a hidden row.
    #[must_use]
    pub fn hidden(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            hidden: true,
        }
    }
}

/// One network interface of a VM details projection.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VmDetailsNetworkInterface {
    /// Index of the interface on the instance.
    pub interface_id: u32,
    /// Identifier of the network the interface belongs to.
    pub network_id: u32,
    /// Whether this is the primary interface.
    pub is_primary: bool,
    /// Whether the network existed before the reservation.
    pub is_predefined: bool,
    /// Key/value rows describing the interface.
    pub network_data: Vec<VmDetailsProperty>,
    /// Private address of the interface.
    pub private_ip_address: String,
    /// Public address of the interface.
    pub public_ip_address: String,
}

#[derive(Serialize)]
struct DriverResponseEnvelope<'a> {
    #[serde(rename = "driverResponse")]
    driver_response: DriverResponseBody<'a>,
}

#[derive(Serialize)]
struct DriverResponseBody<'a> {
    #[serde(rename = "actionResults")]
    action_results: &'a [ActionResult],
}

/// Serializes a result batch into the host's response envelope using the
/// canonical JSON form.
///
/// # Errors
///
/// Returns [`DriverError::Malformed`] when serialization fails.
pub fn to_driver_response_json(results: &[ActionResult]) -> Result<String, DriverError> {
    canonical_json(&DriverResponseEnvelope {
        driver_response: DriverResponseBody {
            action_results: results,
        },
    })
}

/// Serializes a value into canonical JSON: object keys sorted, compact
/// separators.
///
/// # Errors
///
/// Returns [`DriverError::Malformed`] when the value cannot be represented
/// as JSON.
pub fn canonical_json<T: Serialize>(value: &T) -> Result<String, DriverError> {
    // Round-tripping through Value sorts object keys; Display is compact.
    serde_json::to_value(value)
        .map(|json| json.to_string())
        .map_err(|err| DriverError::malformed("canonical serialization", &err))
}
