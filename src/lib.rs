//! Heavenly Cloud driver for the orchestration platform.
//!
//! The crate exposes a thin adapter between platform-defined actions
//! (deploy, power management, sandbox networking, teardown) and the
//! Heavenly Cloud provider SDK, modelled as the injectable [`CloudClient`]
//! capability. The [`HeavenlyCloudDriver`] facade parses host requests,
//! dispatches to the stateless [`service::CloudService`] wrapper, and
//! serializes result batches back into the host's response envelope.

pub mod actions;
pub mod cancellation;
pub mod client;
pub mod context;
pub mod deployment;
pub mod driver;
pub mod error;
pub mod resource;
pub mod results;
pub mod service;
pub mod session;
pub mod telemetry;
pub mod test_support;

pub use actions::Action;
pub use cancellation::CancellationToken;
pub use client::{ClientError, CloudClient, HeavenlyCloud, VmInstance};
pub use context::{RemoteCommandContext, ResourceCommandContext};
pub use deployment::{DeploymentModel, DeploymentRegistry};
pub use driver::HeavenlyCloudDriver;
pub use error::DriverError;
pub use resource::{AutoloadDetails, CloudProviderResource};
pub use results::{ActionResult, VmDetailsData};
pub use session::{HostSession, PlaintextSession, SessionError};
