//! Finding simulator devices and the applications installed on them.
//!
//! Device enumeration lives in [`device`]; [`ApplicationLocator`] takes a
//! device and pairs its data containers with installed bundles.

pub mod device;
mod error;
mod locator;
mod manifest;

pub use device::DeviceDescriptor;
pub use error::DeviceError;
pub use locator::{ApplicationDescriptor, ApplicationLocator, Discovery, UnresolvedContainer};
pub use manifest::BundleManifest;
