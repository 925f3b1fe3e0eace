//! Application state management

use anyhow::{Context, Result};
use netdeploy_core::{DeviceDescriptor, DeviceNode, DeviceRegistry, DeviceType, RegistryError};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;

use crate::config::Config;
use crate::validate::validate_mac;

/// Shared application state
pub struct AppState {
    /// Device registry; writers hold the lock for the whole check-and-insert
    registry: RwLock<DeviceRegistry>,
    /// Configuration
    pub config: Config,
}

impl AppState {
    /// Create new application state, registering the configured seed devices
    pub fn new(config: Config) -> Result<Arc<Self>> {
        let mut registry = DeviceRegistry::new();

        for (index, seed) in config.devices.iter().enumerate() {
            validate_mac(&seed.mac_address)
                .and_then(|()| seed.uplink.as_deref().map_or(Ok(()), validate_mac))
                .with_context(|| {
                    format!("Invalid seed device #{} ({})", index + 1, seed.mac_address)
                })?;

            registry
                .register(seed.device_type, &seed.mac_address, seed.uplink.as_deref())
                .with_context(|| {
                    format!("Failed to register seed device #{} ({})", index + 1, seed.mac_address)
                })?;

            info!(
                mac = %seed.mac_address,
                device_type = %seed.device_type,
                uplink = ?seed.uplink,
                "Registered seed device"
            );
        }

        Ok(Arc::new(Self {
            registry: RwLock::new(registry),
            config,
        }))
    }

    /// Register a device
    pub async fn register(
        &self,
        device_type: DeviceType,
        mac_address: &str,
        uplink_mac_address: Option<&str>,
    ) -> Result<(), RegistryError> {
        self.registry
            .write()
            .await
            .register(device_type, mac_address, uplink_mac_address)
    }

    /// Get all devices in listing order
    pub async fn devices(&self) -> Vec<DeviceDescriptor> {
        self.registry.read().await.find_all()
    }

    /// Get device by MAC address
    pub async fn get_device(&self, mac_address: &str) -> Result<DeviceDescriptor, RegistryError> {
        self.registry.read().await.get(mac_address)
    }

    /// Get the whole deployment tree
    pub async fn device_tree(&self) -> Result<DeviceNode, RegistryError> {
        self.registry.read().await.device_tree()
    }

    /// Get the subtree below a device
    pub async fn device_subtree(&self, mac_address: &str) -> Result<DeviceNode, RegistryError> {
        self.registry.read().await.device_subtree(mac_address)
    }

    pub async fn device_count(&self) -> usize {
        self.registry.read().await.len()
    }

    /// Root device, if any
    pub async fn root(&self) -> Option<String> {
        self.registry.read().await.root().map(str::to_string)
    }

    /// Drop every registered device
    #[cfg(test)]
    pub async fn reset(&self) {
        self.registry.write().await.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DeviceSeedConfig;

    const ROOT: &str = "AA:AA:AA:AA:AA:AA";

    fn seed(mac: &str, device_type: DeviceType, uplink: Option<&str>) -> DeviceSeedConfig {
        DeviceSeedConfig {
            mac_address: mac.to_string(),
            device_type,
            uplink: uplink.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn test_seed_devices_registered_in_order() {
        let config = Config {
            devices: vec![
                seed(ROOT, DeviceType::Gateway, None),
                seed("BB:BB:BB:BB:BB:BB", DeviceType::Switch, Some(ROOT)),
            ],
            ..Config::default()
        };
        let state = AppState::new(config).unwrap();
        assert_eq!(state.device_count().await, 2);
        assert_eq!(state.root().await.as_deref(), Some(ROOT));
    }

    #[test]
    fn test_seed_with_unknown_uplink_fails() {
        let config = Config {
            devices: vec![seed(ROOT, DeviceType::Gateway, Some("BB:BB:BB:BB:BB:BB"))],
            ..Config::default()
        };
        let err = AppState::new(config).err().unwrap();
        assert!(err.to_string().contains("seed device #1"));
    }

    #[test]
    fn test_seed_with_malformed_mac_fails() {
        let config = Config {
            devices: vec![seed("gateway-1", DeviceType::Gateway, None)],
            ..Config::default()
        };
        let err = AppState::new(config).err().unwrap();
        assert!(format!("{:#}", err).contains("Invalid MAC address: 'gateway-1'"));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_duplicate_registration() {
        let state = AppState::new(Config::default()).unwrap();
        state.register(DeviceType::Gateway, ROOT, None).await.unwrap();

        let handles: Vec<_> = (0..32)
            .map(|i| {
                let state = state.clone();
                let device_type = if i % 2 == 0 {
                    DeviceType::Switch
                } else {
                    DeviceType::AccessPoint
                };
                tokio::spawn(async move {
                    state
                        .register(device_type, "BB:BB:BB:BB:BB:BB", Some(ROOT))
                        .await
                })
            })
            .collect();

        let mut accepted = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(()) => accepted += 1,
                Err(e) => assert_eq!(
                    e,
                    RegistryError::DuplicateDevice("BB:BB:BB:BB:BB:BB".to_string())
                ),
            }
        }
        assert_eq!(accepted, 1);
        assert_eq!(state.device_count().await, 2);
        assert_eq!(state.device_tree().await.unwrap().device_count(), 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_root_registration() {
        let state = AppState::new(Config::default()).unwrap();

        let handles: Vec<_> = (0..16)
            .map(|i| {
                let state = state.clone();
                tokio::spawn(async move {
                    let mac = format!("00:00:00:00:00:{:02X}", i);
                    state.register(DeviceType::Gateway, &mac, None).await
                })
            })
            .collect();

        let mut accepted = 0;
        for handle in handles {
            if handle.await.unwrap().is_ok() {
                accepted += 1;
            }
        }
        assert_eq!(accepted, 1);
        assert_eq!(state.device_count().await, 1);
    }

    #[tokio::test]
    async fn test_reset_clears_state() {
        let state = AppState::new(Config {
            devices: vec![seed(ROOT, DeviceType::Gateway, None)],
            ..Config::default()
        })
        .unwrap();

        state.reset().await;
        assert_eq!(state.device_count().await, 0);
        assert_eq!(state.device_tree().await, Err(RegistryError::EmptyRegistry));
        assert!(state.devices().await.is_empty());
    }
}
