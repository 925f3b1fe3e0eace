//! netdeploy Core - Device types and the deployment registry
//!
//! This crate provides the foundational types for netdeploy:
//! - Device types and their canonical listing order
//! - Flat descriptors and recursive tree nodes returned to callers
//! - The device registry that keeps a single rooted uplink tree

pub mod device;
pub mod registry;

pub use device::{DeviceDescriptor, DeviceNode, DeviceType, ParseDeviceTypeError};
pub use registry::{DeviceRegistry, ErrorClass, RegistryError, MAX_TREE_DEPTH};
