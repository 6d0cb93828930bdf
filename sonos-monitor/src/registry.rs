//! Monitored devices indexed by service identity.
//!
//! The registry is the only state shared between the dispatch loop and
//! whatever tracks devices coming and going. One lock guards the whole index,
//! so a lookup sees a registration either fully applied or not at all.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::error::CorrelationError;
use crate::event::Event;
use crate::types::{Device, DeviceId, ServiceIdentity};

/// Thread-safe index from [`ServiceIdentity`] to [`Device`].
#[derive(Debug, Default)]
pub struct DeviceRegistry {
    devices: RwLock<HashMap<ServiceIdentity, Arc<Device>>>,
}

impl DeviceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a device under its service identity.
    ///
    /// A second device on the same identity replaces the first; the replaced
    /// record is returned.
    pub fn register(&self, device: Device) -> Option<Arc<Device>> {
        let device = Arc::new(device);
        let previous = self
            .devices
            .write()
            .insert(device.service.clone(), device.clone());

        match &previous {
            Some(old) if old.id != device.id => warn!(
                service = %device.service,
                replaced = %old.id,
                device = %device.id,
                "Service identity collision, replacing registered device"
            ),
            Some(_) => debug!(service = %device.service, device = %device.id, "Device re-registered"),
            None => info!(service = %device.service, room = %device.room_name, "Device registered"),
        }

        previous
    }

    /// Remove the device registered under `service`.
    pub fn unregister(&self, service: &ServiceIdentity) -> Option<Arc<Device>> {
        let removed = self.devices.write().remove(service);
        if let Some(device) = &removed {
            info!(service = %service, room = %device.room_name, "Device unregistered");
        }
        removed
    }

    /// Remove every entry belonging to the device `id`.
    pub fn unregister_device(&self, id: &DeviceId) -> Vec<Arc<Device>> {
        let mut devices = self.devices.write();
        let services: Vec<ServiceIdentity> = devices
            .iter()
            .filter(|(_, device)| &device.id == id)
            .map(|(service, _)| service.clone())
            .collect();

        services
            .iter()
            .filter_map(|service| devices.remove(service))
            .collect()
    }

    pub fn resolve(&self, service: &ServiceIdentity) -> Option<Arc<Device>> {
        self.devices.read().get(service).cloned()
    }

    /// Snapshot of all registered devices.
    pub fn devices(&self) -> Vec<Arc<Device>> {
        self.devices.read().values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.devices.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.read().is_empty()
    }
}

/// Maps decoded events to the device that produced them.
#[derive(Debug, Clone)]
pub struct Correlator {
    registry: Arc<DeviceRegistry>,
}

impl Correlator {
    pub fn new(registry: Arc<DeviceRegistry>) -> Self {
        Self { registry }
    }

    /// Resolve the event's source.
    ///
    /// Fails with [`CorrelationError::DeviceUnresolved`] when the device went
    /// away between emitting the event and the event being dispatched.
    pub fn correlate(&self, event: &Event) -> Result<Arc<Device>, CorrelationError> {
        let service = event.source();
        self.registry
            .resolve(service)
            .ok_or_else(|| CorrelationError::DeviceUnresolved {
                service: service.clone(),
            })
    }

    pub fn registry(&self) -> &Arc<DeviceRegistry> {
        &self.registry
    }
}
