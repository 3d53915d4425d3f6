use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex};

use palette::Srgb;
use tracing::info;

use crate::light_api::{Brightness, LightState, LightType, Status, ALL_TYPES};
use crate::service::{LightService, TransportError};

struct DeviceState {
    supported: BTreeSet<LightType>,
    low_persistence: bool,
    // The last state successfully applied to each light.
    applied: BTreeMap<LightType, LightState>,
}

/// A light service without hardware behind it. It honours the full service
/// contract and remembers what it was asked to do, clones share one device.
#[derive(Clone)]
pub struct DummyLight {
    device: Arc<Mutex<DeviceState>>,
}

impl DummyLight {
    pub fn new(supported: impl IntoIterator<Item = LightType>, low_persistence: bool) -> DummyLight {
        let state = DeviceState {
            supported: supported.into_iter().collect(),
            low_persistence,
            applied: BTreeMap::new(),
        };
        return DummyLight {
            device: Arc::new(Mutex::new(state)),
        };
    }

    /// Every light type, low persistence included.
    pub fn full() -> DummyLight {
        return DummyLight::new(ALL_TYPES, true);
    }

    pub fn state_of(&self, light_type: LightType) -> Option<LightState> {
        let device = self.device.lock().ok()?;
        return device.applied.get(&light_type).copied();
    }
}

/// Splits 0xAARRGGBB into its color channels, alpha is ignored.
pub fn unpack_color(color: u32) -> Srgb<u8> {
    return Srgb::new(
        ((color >> 16) & 0xff) as u8,
        ((color >> 8) & 0xff) as u8,
        (color & 0xff) as u8,
    );
}

/// Perceived brightness of a packed color in 0..=255.
pub fn rgb_to_brightness(color: u32) -> u8 {
    let rgb = unpack_color(color);
    let weighted = 77 * rgb.red as u32 + 150 * rgb.green as u32 + 29 * rgb.blue as u32;
    return (weighted >> 8) as u8;
}

impl LightService for DummyLight {
    fn is_remote(&self) -> bool {
        return false;
    }

    fn get_supported_types(&mut self) -> Result<Vec<LightType>, TransportError> {
        let device = self.device.lock().map_err(|_| TransportError::Poisoned)?;
        return Ok(device.supported.iter().copied().collect());
    }

    fn set_light(&mut self, light_type: LightType, state: &LightState) -> Result<Status, TransportError> {
        let mut device = self.device.lock().map_err(|_| TransportError::Poisoned)?;
        if !device.supported.contains(&light_type) {
            return Ok(Status::LightNotSupported);
        }
        if state.brightness_mode == Brightness::LowPersistence && !device.low_persistence {
            return Ok(Status::BrightnessNotSupported);
        }
        if state.is_off() {
            info!("{} -> off", light_type);
        } else {
            info!(
                "{} -> brightness {} flash {:?} ({}ms on, {}ms off)",
                light_type,
                rgb_to_brightness(state.color),
                state.flash_mode,
                state.flash_on_ms,
                state.flash_off_ms,
            );
        }
        device.applied.insert(light_type, *state);
        return Ok(Status::Success);
    }
}
