//! Device registry for a single network deployment
//!
//! Devices are keyed by MAC address and connected to the uplink they name at
//! registration time. The first device registered becomes the root, and every
//! later device must name an uplink that is already registered, so the
//! deployment is always one rooted tree without cycles.
//!
//! Any device type may act as uplink for any other type.
//!
//! The tree is at most [`MAX_TREE_DEPTH`] levels deep. Tree views are built
//! and serialized one stack frame per level, so an unbounded chain would run
//! a caller out of stack.

use std::collections::{BTreeSet, HashMap};
use thiserror::Error;
use tracing::debug;

use crate::device::{DeviceDescriptor, DeviceNode, DeviceType};

/// Maximum number of levels in the deployment tree, root included
pub const MAX_TREE_DEPTH: usize = 256;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Device with '{0}' MAC address already exists")]
    DuplicateDevice(String),
    #[error("Root device already exists, uplink MAC address is required")]
    RootAlreadyExists,
    #[error("Uplink device with '{0}' MAC address does not exist")]
    UplinkNotFound(String),
    #[error(
        "Uplink device with '{0}' MAC address is at the maximum tree depth of {max}",
        max = MAX_TREE_DEPTH
    )]
    DepthLimitExceeded(String),
    #[error("Device with '{0}' MAC address cannot be found")]
    DeviceNotFound(String),
    #[error("Network deployment does not contain any devices")]
    EmptyRegistry,
}

/// Broad failure category of a [`RegistryError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// A business rule rejected the request
    Conflict,
    /// The named device does not exist
    Reference,
    /// The registry holds no devices
    Emptiness,
}

impl RegistryError {
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::DuplicateDevice(_) | Self::RootAlreadyExists | Self::DepthLimitExceeded(_) => {
                ErrorClass::Conflict
            }
            Self::UplinkNotFound(_) | Self::DeviceNotFound(_) => ErrorClass::Reference,
            Self::EmptyRegistry => ErrorClass::Emptiness,
        }
    }
}

/// Stored state for one device
#[derive(Debug, Clone)]
struct DeviceRecord {
    device_type: DeviceType,
    /// Level in the tree; the root is level 1
    depth: usize,
    /// MAC addresses of direct downlinks
    children: BTreeSet<String>,
}

impl DeviceRecord {
    fn new(device_type: DeviceType, depth: usize) -> Self {
        Self {
            device_type,
            depth,
            children: BTreeSet::new(),
        }
    }
}

/// In-memory registry of the devices in one deployment
#[derive(Debug, Clone, Default)]
pub struct DeviceRegistry {
    /// All records indexed by MAC address
    devices: HashMap<String, DeviceRecord>,
    /// First registered device
    root: Option<String>,
}

impl DeviceRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a device, optionally connected to an existing uplink.
    ///
    /// Only the first device may omit the uplink, and the uplink must sit
    /// above [`MAX_TREE_DEPTH`]. On error the registry is left untouched.
    pub fn register(
        &mut self,
        device_type: DeviceType,
        mac_address: &str,
        uplink_mac_address: Option<&str>,
    ) -> Result<(), RegistryError> {
        if self.devices.contains_key(mac_address) {
            return Err(RegistryError::DuplicateDevice(mac_address.to_string()));
        }

        let depth = match uplink_mac_address {
            None if !self.devices.is_empty() => return Err(RegistryError::RootAlreadyExists),
            None => 1,
            Some(uplink) => {
                let parent = self
                    .devices
                    .get(uplink)
                    .ok_or_else(|| RegistryError::UplinkNotFound(uplink.to_string()))?;
                if parent.depth >= MAX_TREE_DEPTH {
                    return Err(RegistryError::DepthLimitExceeded(uplink.to_string()));
                }
                parent.depth + 1
            }
        };

        match uplink_mac_address {
            Some(uplink) => {
                if let Some(parent) = self.devices.get_mut(uplink) {
                    parent.children.insert(mac_address.to_string());
                }
            }
            None => self.root = Some(mac_address.to_string()),
        }
        self.devices
            .insert(mac_address.to_string(), DeviceRecord::new(device_type, depth));

        debug!(
            mac = %mac_address,
            device_type = %device_type,
            uplink = ?uplink_mac_address,
            "Registered device"
        );
        Ok(())
    }

    /// All devices ordered by device type, then MAC address
    pub fn find_all(&self) -> Vec<DeviceDescriptor> {
        let mut all: Vec<DeviceDescriptor> = self
            .devices
            .iter()
            .map(|(mac, record)| DeviceDescriptor::new(mac.clone(), record.device_type))
            .collect();
        all.sort();
        all
    }

    /// Get a single device
    pub fn get(&self, mac_address: &str) -> Result<DeviceDescriptor, RegistryError> {
        self.devices
            .get(mac_address)
            .map(|record| DeviceDescriptor::new(mac_address, record.device_type))
            .ok_or_else(|| RegistryError::DeviceNotFound(mac_address.to_string()))
    }

    /// The whole deployment, starting at the root device
    pub fn device_tree(&self) -> Result<DeviceNode, RegistryError> {
        let root = self.root.as_deref().ok_or(RegistryError::EmptyRegistry)?;
        self.device_subtree(root)
    }

    /// The device with the given MAC address and everything below it
    pub fn device_subtree(&self, mac_address: &str) -> Result<DeviceNode, RegistryError> {
        let record = self
            .devices
            .get(mac_address)
            .ok_or_else(|| RegistryError::DeviceNotFound(mac_address.to_string()))?;
        Ok(self.build_node(mac_address, record))
    }

    // Children always refer to registered records, a child is only ever
    // linked below a device registered before it, and no record sits deeper
    // than MAX_TREE_DEPTH, so the recursion ends within that many frames.
    fn build_node(&self, mac_address: &str, record: &DeviceRecord) -> DeviceNode {
        let downlink_devices = record
            .children
            .iter()
            .filter_map(|child| {
                self.devices
                    .get(child)
                    .map(|child_record| self.build_node(child, child_record))
            })
            .collect();

        DeviceNode {
            mac_address: mac_address.to_string(),
            device_type: record.device_type,
            downlink_devices,
        }
    }

    /// MAC address of the device's uplink, `None` for the root
    pub fn uplink_of(&self, mac_address: &str) -> Result<Option<&str>, RegistryError> {
        if !self.devices.contains_key(mac_address) {
            return Err(RegistryError::DeviceNotFound(mac_address.to_string()));
        }
        Ok(self
            .devices
            .iter()
            .find(|(_, record)| record.children.contains(mac_address))
            .map(|(mac, _)| mac.as_str()))
    }

    /// MAC address of the root device
    pub fn root(&self) -> Option<&str> {
        self.root.as_deref()
    }

    pub fn contains(&self, mac_address: &str) -> bool {
        self.devices.contains_key(mac_address)
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    /// Remove every device
    pub fn reset(&mut self) {
        self.devices.clear();
        self.root = None;
    }
}
