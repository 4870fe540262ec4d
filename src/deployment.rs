//! Deployment models and the path registry used to resolve them.
//!
//! A deploy action carries a `deploymentPath` selector plus a custom-model
//! JSON payload. `initialize` registers the supported paths; resolution turns
//! the payload into a closed [`DeploymentModel`] variant so the dispatcher
//! can match exhaustively instead of sniffing types.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::DriverError;

/// Deployment path selecting the Angel deployment variant.
pub const ANGEL_DEPLOYMENT_PATH: &str = "HeavenlyCloud.AngelDeployment";
/// Deployment path selecting the Man deployment variant.
pub const MAN_DEPLOYMENT_PATH: &str = "HeavenlyCloud.ManDeployment";

/// Parameters shared by every deployment variant.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CloudProfile {
    /// Size class of the cloud backing the instance.
    pub cloud_size: String,
    /// Image the instance boots from.
    pub cloud_image_id: String,
}

/// Angel-specific deployment parameters.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AngelDeployment {
    /// Number of wings to provision.
    pub wing_count: u32,
    /// Flight speed class requested for the instance.
    pub flight_speed: String,
    /// Shared cloud parameters.
    #[serde(flatten)]
    pub cloud: CloudProfile,
}

/// Man-specific deployment parameters.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ManDeployment {
    /// Body weight in kilograms.
    pub weight: u32,
    /// Body height in centimetres.
    pub height: u32,
    /// Shared cloud parameters.
    #[serde(flatten)]
    pub cloud: CloudProfile,
}

/// Closed union of supported deployment variants.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum DeploymentModel {
    /// Angel deployment.
    Angel(AngelDeployment),
    /// Man deployment.
    Man(ManDeployment),
}

/// Kinds a deployment path can register as.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum DeploymentKind {
    Angel,
    Man,
}

/// Registry mapping deployment paths to model schemas.
///
/// Populated by the driver's `initialize`; registration is idempotent.
#[derive(Clone, Debug, Default)]
pub struct DeploymentRegistry {
    paths: BTreeMap<String, DeploymentKind>,
}

impl DeploymentRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the Angel deployment schema under the given path.
    pub fn register_angel(&mut self, path: impl Into<String>) {
        self.paths.insert(path.into(), DeploymentKind::Angel);
    }

    /// Registers the Man deployment schema under the given path.
    pub fn register_man(&mut self, path: impl Into<String>) {
        self.paths.insert(path.into(), DeploymentKind::Man);
    }

    /// Resolves a deployment path and custom-model payload into a typed
    /// model.
    ///
    /// # Errors
    ///
    /// Returns [`DriverError::UnsupportedConfiguration`] for an unregistered
    /// path and [`DriverError::Malformed`] when the payload does not match
    /// the registered schema.
    pub fn resolve(
        &self,
        path: &str,
        custom_model: &serde_json::Value,
    ) -> Result<DeploymentModel, DriverError> {
        let kind = self.paths.get(path).copied().ok_or_else(|| {
            DriverError::UnsupportedConfiguration {
                path: path.to_owned(),
            }
        })?;
        match kind {
            DeploymentKind::Angel => serde_json::from_value(custom_model.clone())
                .map(DeploymentModel::Angel)
                .map_err(|err| DriverError::malformed("angel deployment model", &err)),
            DeploymentKind::Man => serde_json::from_value(custom_model.clone())
                .map(DeploymentModel::Man)
                .map_err(|err| DriverError::malformed("man deployment model", &err)),
        }
    }
}
