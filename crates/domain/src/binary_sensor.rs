//! Binary sensor vocabulary shared by every integration.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, IntoStaticStr, VariantArray};

/// Entity-id domain for binary sensors.
pub const DOMAIN: &str = "binary_sensor";

/// Device class of a binary sensor.
///
/// Tells frontends how to phrase `on`/`off` (e.g. "open"/"closed" for a
/// door). The set is fixed; unknown strings are rejected.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    IntoStaticStr,
    VariantArray,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum BinarySensorDeviceClass {
    Battery,
    BatteryCharging,
    CarbonMonoxide,
    Cold,
    Connectivity,
    Door,
    GarageDoor,
    Gas,
    Heat,
    Light,
    Lock,
    Moisture,
    Motion,
    Moving,
    Occupancy,
    Opening,
    Plug,
    Power,
    Presence,
    Problem,
    Running,
    Safety,
    Smoke,
    Sound,
    Tamper,
    Update,
    Vibration,
    Window,
}

impl BinarySensorDeviceClass {
    /// The snake_case wire name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        self.into()
    }
}
