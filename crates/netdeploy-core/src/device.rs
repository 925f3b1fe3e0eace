//! Device types and the views handed out by the registry

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::str::FromStr;
use thiserror::Error;

/// Kind of networking device in a deployment
///
/// Listings are ordered Gateway, Switch, Access Point. The order comes from
/// [`DeviceType::rank`], not from the declaration order below.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeviceType {
    Gateway,
    Switch,
    AccessPoint,
}

impl DeviceType {
    /// All device types in listing order
    pub const ALL: [DeviceType; 3] = [Self::Gateway, Self::Switch, Self::AccessPoint];

    /// Position of this type in the canonical listing order
    pub const fn rank(self) -> u8 {
        match self {
            Self::Gateway => 0,
            Self::Switch => 1,
            Self::AccessPoint => 2,
        }
    }

    /// Wire name ("GATEWAY", "SWITCH", "ACCESS_POINT")
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Gateway => "GATEWAY",
            Self::Switch => "SWITCH",
            Self::AccessPoint => "ACCESS_POINT",
        }
    }
}

impl Ord for DeviceType {
    fn cmp(&self, other: &Self) -> Ordering {
        self.rank().cmp(&other.rank())
    }
}

impl PartialOrd for DeviceType {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl std::fmt::Display for DeviceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unknown device type: '{0}'")]
pub struct ParseDeviceTypeError(pub String);

impl FromStr for DeviceType {
    type Err = ParseDeviceTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| ParseDeviceTypeError(s.to_string()))
    }
}

/// Flat view of a single registered device
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceDescriptor {
    pub mac_address: String,
    pub device_type: DeviceType,
}

impl DeviceDescriptor {
    pub fn new(mac_address: impl Into<String>, device_type: DeviceType) -> Self {
        Self {
            mac_address: mac_address.into(),
            device_type,
        }
    }
}

// Listing order: device type rank first, then MAC address.
impl Ord for DeviceDescriptor {
    fn cmp(&self, other: &Self) -> Ordering {
        self.device_type
            .cmp(&other.device_type)
            .then_with(|| self.mac_address.cmp(&other.mac_address))
    }
}

impl PartialOrd for DeviceDescriptor {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// A device together with every device below it in the uplink tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceNode {
    pub mac_address: String,
    pub device_type: DeviceType,
    /// Direct downlinks, each carrying its own subtree
    pub downlink_devices: Vec<DeviceNode>,
}

impl DeviceNode {
    /// Node with no downlink devices
    pub fn leaf(mac_address: impl Into<String>, device_type: DeviceType) -> Self {
        Self {
            mac_address: mac_address.into(),
            device_type,
            downlink_devices: Vec::new(),
        }
    }

    /// Flat descriptor of this node alone
    pub fn descriptor(&self) -> DeviceDescriptor {
        DeviceDescriptor::new(self.mac_address.clone(), self.device_type)
    }

    /// Number of devices in this subtree, including this one
    pub fn device_count(&self) -> usize {
        1 + self
            .downlink_devices
            .iter()
            .map(DeviceNode::device_count)
            .sum::<usize>()
    }

    /// Number of levels in this subtree; a leaf has depth 1
    pub fn depth(&self) -> usize {
        1 + self
            .downlink_devices
            .iter()
            .map(DeviceNode::depth)
            .max()
            .unwrap_or(0)
    }

    /// Find a node anywhere in this subtree
    pub fn find(&self, mac_address: &str) -> Option<&DeviceNode> {
        if self.mac_address == mac_address {
            return Some(self);
        }
        self.downlink_devices
            .iter()
            .find_map(|child| child.find(mac_address))
    }

    /// MAC addresses of the whole subtree in pre-order
    pub fn mac_addresses(&self) -> Vec<&str> {
        let mut out = Vec::with_capacity(self.downlink_devices.len() + 1);
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            out.push(node.mac_address.as_str());
            stack.extend(node.downlink_devices.iter().rev());
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_type_rank_order() {
        assert!(DeviceType::Gateway < DeviceType::Switch);
        assert!(DeviceType::Switch < DeviceType::AccessPoint);
        assert!(DeviceType::Gateway < DeviceType::AccessPoint);

        let mut types = vec![DeviceType::AccessPoint, DeviceType::Gateway, DeviceType::Switch];
        types.sort();
        assert_eq!(types, DeviceType::ALL.to_vec());
    }

    #[test]
    fn test_device_type_wire_names() {
        assert_eq!(
            serde_json::to_string(&DeviceType::AccessPoint).unwrap(),
            "\"ACCESS_POINT\""
        );
        let parsed: DeviceType = serde_json::from_str("\"GATEWAY\"").unwrap();
        assert_eq!(parsed, DeviceType::Gateway);
        assert!(serde_json::from_str::<DeviceType>("\"ROUTER\"").is_err());
    }

    #[test]
    fn test_device_type_from_str() {
        assert_eq!("SWITCH".parse::<DeviceType>(), Ok(DeviceType::Switch));
        assert_eq!(
            "switch".parse::<DeviceType>(),
            Err(ParseDeviceTypeError("switch".to_string()))
        );
        for t in DeviceType::ALL {
            assert_eq!(t.to_string().parse::<DeviceType>(), Ok(t));
        }
    }

    #[test]
    fn test_descriptor_order_type_then_mac() {
        let mut devices = vec![
            DeviceDescriptor::new("CC:00:00:00:00:00", DeviceType::AccessPoint),
            DeviceDescriptor::new("BB:00:00:00:00:00", DeviceType::Gateway),
            DeviceDescriptor::new("AA:00:00:00:00:00", DeviceType::AccessPoint),
            DeviceDescriptor::new("DD:00:00:00:00:00", DeviceType::Switch),
        ];
        devices.sort();
        let macs: Vec<_> = devices.iter().map(|d| d.mac_address.as_str()).collect();
        assert_eq!(
            macs,
            [
                "BB:00:00:00:00:00",
                "DD:00:00:00:00:00",
                "AA:00:00:00:00:00",
                "CC:00:00:00:00:00",
            ]
        );
    }

    #[test]
    fn test_descriptor_json_shape() {
        let d = DeviceDescriptor::new("AA:BB:CC:DD:EE:FF", DeviceType::Switch);
        let json = serde_json::to_value(&d).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"macAddress": "AA:BB:CC:DD:EE:FF", "deviceType": "SWITCH"})
        );
    }

    #[test]
    fn test_node_json_shape() {
        let mut root = DeviceNode::leaf("AA:AA:AA:AA:AA:AA", DeviceType::Gateway);
        root.downlink_devices
            .push(DeviceNode::leaf("BB:BB:BB:BB:BB:BB", DeviceType::Switch));
        let json = serde_json::to_value(&root).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "macAddress": "AA:AA:AA:AA:AA:AA",
                "deviceType": "GATEWAY",
                "downlinkDevices": [
                    {
                        "macAddress": "BB:BB:BB:BB:BB:BB",
                        "deviceType": "SWITCH",
                        "downlinkDevices": []
                    }
                ]
            })
        );
    }

    #[test]
    fn test_node_walks() {
        let mut switch = DeviceNode::leaf("BB", DeviceType::Switch);
        switch.downlink_devices.push(DeviceNode::leaf("CC", DeviceType::AccessPoint));
        let mut root = DeviceNode::leaf("AA", DeviceType::Gateway);
        root.downlink_devices.push(switch);
        root.downlink_devices.push(DeviceNode::leaf("DD", DeviceType::AccessPoint));

        assert_eq!(root.device_count(), 4);
        assert_eq!(root.depth(), 3);
        assert_eq!(root.mac_addresses(), ["AA", "BB", "CC", "DD"]);
        assert_eq!(root.find("CC").map(|n| n.device_type), Some(DeviceType::AccessPoint));
        assert!(root.find("EE").is_none());
        assert_eq!(root.descriptor(), DeviceDescriptor::new("AA", DeviceType::Gateway));
    }
}
