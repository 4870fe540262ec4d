//! Platform actions and driver-request parsing.
//!
//! The host sends each command a JSON body of the form
//! `{"driverRequest": {"actions": [...]}}` where every action is tagged by a
//! `type` field. Actions are immutable inputs for one command invocation.

use serde::{Deserialize, Serialize};

use crate::error::DriverError;

/// Tagged union of every action the host can request.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum Action {
    /// Deploy one app into the sandbox.
    #[serde(rename = "deployApp")]
    DeployApp(DeployAppAction),
    /// Attach the deployed app to a sandbox subnet.
    #[serde(rename = "connectSubnet")]
    ConnectSubnet(ConnectSubnetAction),
    /// Allocate the sandbox-wide network from a CIDR.
    #[serde(rename = "prepareCloudInfra")]
    PrepareCloudInfra(PrepareCloudInfraAction),
    /// Provision the sandbox SSH key pair.
    #[serde(rename = "createKeys")]
    CreateKeys(CreateKeysAction),
    /// Prepare one subnet inside the sandbox network.
    #[serde(rename = "prepareSubnet")]
    PrepareSubnet(PrepareSubnetAction),
    /// Tear down the sandbox network.
    #[serde(rename = "cleanupNetwork")]
    CleanupNetwork(CleanupNetworkAction),
}

/// Deploy-app request unit.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeployAppAction {
    /// Identifier echoed on every result produced for this action.
    pub action_id: String,
    /// Deployment parameters.
    pub action_params: DeployAppParams,
}

/// Parameters of a deploy-app action.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeployAppParams {
    /// Requested app name; the driver derives a collision-resistant VM name
    /// from it.
    pub app_name: String,
    /// Deployment variant selection.
    pub deployment: DeploymentSelection,
    /// App resource credentials and attributes.
    pub app_resource: AppResource,
}

/// Deployment selection on a deploy-app action.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentSelection {
    /// Path string choosing which deployment variant applies.
    pub deployment_path: String,
    /// Variant-specific model payload, resolved through the registry.
    pub custom_model: serde_json::Value,
}

/// Credentials and attributes of the app being deployed.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct AppResource {
    /// Attribute bag; `User` and `Password` are consulted at deploy time.
    #[serde(default)]
    pub attributes: std::collections::BTreeMap<String, String>,
}

impl AppResource {
    /// Returns the named attribute, or an empty string when absent.
    #[must_use]
    pub fn attribute(&self, name: &str) -> String {
        self.attributes.get(name).cloned().unwrap_or_default()
    }
}

/// Connect-subnet request unit.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectSubnetAction {
    /// Identifier echoed on the corresponding result.
    pub action_id: String,
    /// Subnet attachment parameters.
    pub action_params: ConnectSubnetParams,
}

/// Parameters of a connect-subnet action.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectSubnetParams {
    /// Identifier of the subnet to attach to.
    pub subnet_id: String,
}

/// Prepare-cloud-infra request unit.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PrepareCloudInfraAction {
    /// Identifier echoed on the corresponding result.
    pub action_id: String,
    /// Network allocation parameters.
    pub action_params: PrepareCloudInfraParams,
}

/// Parameters of a prepare-cloud-infra action.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PrepareCloudInfraParams {
    /// Sandbox-wide address range.
    pub cidr: String,
}

/// Create-keys request unit.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateKeysAction {
    /// Identifier echoed on the corresponding result.
    pub action_id: String,
}

/// Prepare-subnet request unit.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PrepareSubnetAction {
    /// Identifier echoed on the corresponding result.
    pub action_id: String,
    /// Subnet parameters.
    pub action_params: PrepareSubnetParams,
}

/// Parameters of a prepare-subnet action.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PrepareSubnetParams {
    /// Address range of the subnet.
    pub cidr: String,
    /// Whether the subnet is reachable from outside the sandbox.
    #[serde(default)]
    pub is_public: bool,
    /// Additional subnet service attributes.
    #[serde(default)]
    pub subnet_service_attributes: std::collections::BTreeMap<String, String>,
}

/// Cleanup-network request unit.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CleanupNetworkAction {
    /// Identifier echoed on the corresponding result.
    pub action_id: String,
}

#[derive(Deserialize)]
struct DriverRequestEnvelope {
    #[serde(rename = "driverRequest")]
    driver_request: DriverRequestBody,
}

#[derive(Deserialize)]
struct DriverRequestBody {
    actions: Vec<Action>,
}

/// Parses a host request body into its action list.
///
/// # Errors
///
/// Returns [`DriverError::Malformed`] when the body is not a well-formed
/// driver request.
pub fn parse_driver_request(request: &str) -> Result<Vec<Action>, DriverError> {
    let envelope: DriverRequestEnvelope = serde_json::from_str(request)
        .map_err(|err| DriverError::malformed("driver request", &err))?;
    Ok(envelope.driver_request.actions)
}

/// Extracts exactly one action of a kind from a parsed batch.
///
/// # Errors
///
/// Returns [`DriverError::Lookup`] when zero or multiple actions match.
pub fn single<'a, T>(
    actions: &'a [Action],
    kind: &'static str,
    pick: impl Fn(&'a Action) -> Option<&'a T>,
) -> Result<&'a T, DriverError> {
    let mut matches = actions.iter().filter_map(&pick);
    let Some(found) = matches.next() else {
        return Err(DriverError::Lookup { kind, count: 0 });
    };
    if matches.next().is_some() {
        let count = actions.iter().filter_map(pick).count();
        return Err(DriverError::Lookup { kind, count });
    }
    Ok(found)
}

/// Extracts the single deploy-app action from a batch.
///
/// # Errors
///
/// Returns [`DriverError::Lookup`] when zero or multiple deploy actions are
/// present.
pub fn single_deploy_app(actions: &[Action]) -> Result<&DeployAppAction, DriverError> {
    single(actions, "deployApp", |action| match action {
        Action::DeployApp(deploy) => Some(deploy),
        _ => None,
    })
}

/// Extracts the single prepare-cloud-infra action from a batch.
///
/// # Errors
///
/// Returns [`DriverError::Lookup`] when zero or multiple matches are present.
pub fn single_prepare_infra(actions: &[Action]) -> Result<&PrepareCloudInfraAction, DriverError> {
    single(actions, "prepareCloudInfra", |action| match action {
        Action::PrepareCloudInfra(infra) => Some(infra),
        _ => None,
    })
}

/// Extracts the single create-keys action from a batch.
///
/// # Errors
///
/// Returns [`DriverError::Lookup`] when zero or multiple matches are present.
pub fn single_create_keys(actions: &[Action]) -> Result<&CreateKeysAction, DriverError> {
    single(actions, "createKeys", |action| match action {
        Action::CreateKeys(keys) => Some(keys),
        _ => None,
    })
}

/// Extracts the single cleanup-network action from a batch.
///
/// # Errors
///
/// Returns [`DriverError::Lookup`] when zero or multiple matches are present.
pub fn single_cleanup_network(actions: &[Action]) -> Result<&CleanupNetworkAction, DriverError> {
    single(actions, "cleanupNetwork", |action| match action {
        Action::CleanupNetwork(cleanup) => Some(cleanup),
        _ => None,
    })
}

/// Collects every connect-subnet action from a batch, preserving order.
#[must_use]
pub fn connect_subnet_actions(actions: &[Action]) -> Vec<&ConnectSubnetAction> {
    actions
        .iter()
        .filter_map(|action| match action {
            Action::ConnectSubnet(subnet) => Some(subnet),
            _ => None,
        })
        .collect()
}

/// Collects every prepare-subnet action from a batch, preserving order.
#[must_use]
pub fn prepare_subnet_actions(actions: &[Action]) -> Vec<&PrepareSubnetAction> {
    actions
        .iter()
        .filter_map(|action| match action {
            Action::PrepareSubnet(subnet) => Some(subnet),
            _ => None,
        })
        .collect()
}
