use std::fmt;
use std::str::FromStr;

use anyhow::bail;
use serde::{Deserialize, Serialize};

/// The light domains a device can expose. This set is closed, services
/// may support any subset of it.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LightType {
    Backlight,
    Keyboard,
    Buttons,
    Battery,
    Notifications,
    Attention,
    Bluetooth,
    Wifi,
}

pub const ALL_TYPES: [LightType; 8] = [
    LightType::Backlight,
    LightType::Keyboard,
    LightType::Buttons,
    LightType::Battery,
    LightType::Notifications,
    LightType::Attention,
    LightType::Bluetooth,
    LightType::Wifi,
];

impl LightType {
    pub fn as_str(&self) -> &'static str {
        return match self {
            LightType::Backlight => "backlight",
            LightType::Keyboard => "keyboard",
            LightType::Buttons => "buttons",
            LightType::Battery => "battery",
            LightType::Notifications => "notifications",
            LightType::Attention => "attention",
            LightType::Bluetooth => "bluetooth",
            LightType::Wifi => "wifi",
        };
    }
}

impl fmt::Display for LightType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        return write!(f, "{}", self.as_str());
    }
}

impl FromStr for LightType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<LightType> {
        let lower = s.trim().to_ascii_lowercase();
        for light_type in ALL_TYPES {
            if light_type.as_str() == lower {
                return Ok(light_type);
            }
        }
        bail!("unknown light type '{}'", s);
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Flash {
    /// Keep the light steadily on.
    None,
    /// Blink with the `flash_on_ms`/`flash_off_ms` timing.
    Timed,
    /// Let the hardware pick the blink pattern.
    Hardware,
}

impl FromStr for Flash {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Flash> {
        return match s.trim().to_ascii_lowercase().as_str() {
            "none" => Ok(Flash::None),
            "timed" => Ok(Flash::Timed),
            "hardware" => Ok(Flash::Hardware),
            _ => bail!("unknown flash mode '{}'", s),
        };
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Brightness {
    /// Brightness follows the user setting.
    User,
    /// Brightness follows an ambient light sensor.
    Sensor,
    /// Short, bright pulses suited for strobing displays. Optional.
    LowPersistence,
}

impl FromStr for Brightness {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Brightness> {
        return match s.trim().to_ascii_lowercase().as_str() {
            "user" => Ok(Brightness::User),
            "sensor" => Ok(Brightness::Sensor),
            "low_persistence" | "low-persistence" => Ok(Brightness::LowPersistence),
            _ => bail!("unknown brightness mode '{}'", s),
        };
    }
}

/// Desired output of a single light.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LightState {
    /// Packed as 0xAARRGGBB.
    pub color: u32,
    pub flash_mode: Flash,
    pub flash_on_ms: i32,
    pub flash_off_ms: i32,
    pub brightness_mode: Brightness,
}

impl LightState {
    pub fn is_off(&self) -> bool {
        return self.color & 0x00ffffff == 0;
    }
}

/// Result of a `set_light` request.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Status {
    Success,
    LightNotSupported,
    BrightnessNotSupported,
    Unknown,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            Status::Success => "SUCCESS",
            Status::LightNotSupported => "LIGHT_NOT_SUPPORTED",
            Status::BrightnessNotSupported => "BRIGHTNESS_NOT_SUPPORTED",
            Status::Unknown => "UNKNOWN",
        };
        return write!(f, "{}", name);
    }
}

// The state vectors every conformance run drives lights through.

pub const WHITE: LightState = LightState {
    color: 0xFFFFFFFF,
    flash_mode: Flash::Timed,
    flash_on_ms: 100,
    flash_off_ms: 50,
    brightness_mode: Brightness::User,
};

pub const LOW_PERSISTENCE: LightState = LightState {
    color: 0xFF123456,
    flash_mode: Flash::Timed,
    flash_on_ms: 100,
    flash_off_ms: 50,
    brightness_mode: Brightness::LowPersistence,
};

pub const OFF: LightState = LightState {
    color: 0x00000000,
    flash_mode: Flash::None,
    flash_on_ms: 0,
    flash_off_ms: 0,
    brightness_mode: Brightness::User,
};
