// Copyright (c) 2026 Unfolded Circle ApS, Markus Zehnder <markus.z@unfoldedcircle.com>
// SPDX-License-Identifier: MPL-2.0

//! Google device definitions and the device registry.
//!
//! A device definition is a row in [`DEVICE_TYPES`]: a name (echoed back by Google in
//! `customData.deviceType`), the Google device type, the accepted item shape and the device
//! family implementing traits, attributes and state. The registry order encodes specificity:
//! composite, group based devices come before simple single item devices.

use crate::client::Item;
use crate::google::{CustomData, DeviceInfo, DeviceName, SyncDevice, Trait};
use crate::startup::APP_VERSION;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

pub(crate) mod appliance;
pub(crate) mod climate;
pub(crate) mod fan;
pub(crate) mod light;
pub(crate) mod media;
pub(crate) mod open_close;
pub(crate) mod security;
pub(crate) mod sensor;
pub(crate) mod switch;

/// Repeatable member role of a security system.
pub const ROLE_ZONE: &str = "securitySystemZone";

/// Item shapes accepted by a device definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemShape {
    /// Any item type.
    Any,
    /// Group item with at least one member of a known role.
    Group,
    /// Item, or group item with a `groupType`, of one of the given types.
    Types(&'static [&'static str]),
    /// Group item with members of known roles, or a single item of one of the given types.
    GroupOrTypes(&'static [&'static str]),
}

/// Device implementation family. Several Google device types share the same family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Family {
    SpecialColorLight,
    Thermostat,
    ClimateSensor,
    SecuritySystem,
    Tv,
    Fan,
    Humidifier,
    Charger,
    Vacuum,
    DynamicModes,
    TemperatureSensor,
    Sensor,
    Camera,
    Lock,
    Scene,
    OpenClose,
    Valve,
    Speaker,
    StartStop,
    ColorLight,
    DimmableLight,
    OnOff,
}

impl Family {
    /// Member roles of composite devices.
    pub fn roles(&self) -> &'static [&'static str] {
        match self {
            Family::SpecialColorLight => light::ROLES,
            Family::Thermostat => climate::THERMOSTAT_ROLES,
            Family::ClimateSensor => climate::CLIMATE_SENSOR_ROLES,
            Family::SecuritySystem => security::ROLES,
            Family::Tv => media::TV_ROLES,
            Family::Fan => fan::FAN_ROLES,
            Family::Humidifier => fan::HUMIDIFIER_ROLES,
            Family::Charger => appliance::CHARGER_ROLES,
            Family::Vacuum => appliance::VACUUM_ROLES,
            Family::DynamicModes => appliance::MODES_ROLES,
            Family::OpenClose => open_close::ROLES,
            _ => &[],
        }
    }
}

#[derive(Debug)]
pub struct DeviceType {
    /// Definition name, used as `customData.deviceType`.
    pub name: &'static str,
    /// Google device type suffix, e.g. `SWITCH` for `action.devices.types.SWITCH`.
    pub google_type: &'static str,
    pub family: Family,
    pub shape: ItemShape,
    /// Additional `ga` metadata values this definition answers to.
    aliases: &'static [&'static str],
    /// Item tags of the legacy tag based configuration.
    legacy_tags: &'static [&'static str],
}

impl DeviceType {
    const fn new(
        name: &'static str,
        google_type: &'static str,
        family: Family,
        shape: ItemShape,
    ) -> Self {
        Self {
            name,
            google_type,
            family,
            shape,
            aliases: &[],
            legacy_tags: &[],
        }
    }

    const fn aliases(mut self, aliases: &'static [&'static str]) -> Self {
        self.aliases = aliases;
        self
    }

    const fn tags(mut self, tags: &'static [&'static str]) -> Self {
        self.legacy_tags = tags;
        self
    }

    /// Fully qualified Google device type.
    pub fn google_device_type(&self) -> String {
        format!("action.devices.types.{}", self.google_type)
    }

    pub fn matches_item_shape(&self, item: &Item) -> bool {
        match self.shape {
            ItemShape::Any => true,
            ItemShape::Group => item.is_group(),
            ItemShape::Types(types) => types.contains(&item.base_type()),
            ItemShape::GroupOrTypes(types) => {
                item.is_group() || types.contains(&item.base_type())
            }
        }
    }

    /// The `ga` metadata value names this definition.
    pub fn matches_metadata_value(&self, item: &Item) -> bool {
        item.ga_value()
            .map(|value| self.answers_to(value))
            .unwrap_or_default()
    }

    /// One of the item tags names this definition.
    pub fn matches_legacy_tag(&self, item: &Item) -> bool {
        item.tags.iter().any(|tag| {
            self.answers_to(tag)
                || self
                    .legacy_tags
                    .iter()
                    .any(|legacy| legacy.eq_ignore_ascii_case(tag))
        })
    }

    fn answers_to(&self, value: &str) -> bool {
        let value = normalize(value);
        normalize(self.name) == value || self.aliases.iter().any(|a| normalize(a) == value)
    }

    /// Structural preconditions of composite devices and family specific requirements.
    pub fn is_compatible(&self, item: &Item) -> bool {
        let members = self.members(item);
        let structure = match self.shape {
            ItemShape::Group => !members.is_empty(),
            ItemShape::GroupOrTypes(types) => {
                !members.is_empty() || types.contains(&item.base_type())
            }
            _ => true,
        };
        structure
            && match self.family {
                Family::Sensor => sensor::is_compatible(item),
                Family::DynamicModes => appliance::modes_is_compatible(&members),
                _ => true,
            }
    }

    /// Discover the members of a composite device.
    pub fn members<'a>(&self, item: &'a Item) -> Members<'a> {
        Members::discover(item, self.family.roles())
    }

    pub fn traits(&self, item: &Item) -> Vec<Trait> {
        let members = self.members(item);
        match self.family {
            Family::SpecialColorLight => light::special_color_traits(&members),
            Family::Thermostat => vec![Trait::TemperatureSetting],
            Family::ClimateSensor => climate::climate_sensor_traits(&members),
            Family::SecuritySystem => security::security_system_traits(&members),
            Family::Tv => media::tv_traits(&members),
            Family::Fan => fan::fan_traits(item, &members),
            Family::Humidifier => fan::humidifier_traits(&members),
            Family::Charger => vec![Trait::EnergyStorage],
            Family::Vacuum => appliance::vacuum_traits(&members),
            Family::DynamicModes => appliance::modes_traits(&members),
            Family::TemperatureSensor => vec![Trait::TemperatureControl],
            Family::Sensor => vec![Trait::SensorState],
            Family::Camera => vec![Trait::CameraStream],
            Family::Lock => vec![Trait::LockUnlock],
            Family::Scene => vec![Trait::Scene],
            Family::OpenClose => open_close::traits(item, &members),
            Family::Valve => vec![Trait::OpenClose],
            Family::Speaker => vec![Trait::Volume],
            Family::StartStop => vec![Trait::StartStop],
            Family::ColorLight => vec![Trait::OnOff, Trait::Brightness, Trait::ColorSetting],
            Family::DimmableLight => vec![Trait::OnOff, Trait::Brightness],
            Family::OnOff => vec![Trait::OnOff],
        }
    }

    pub fn attributes(&self, item: &Item) -> Map<String, Value> {
        let members = self.members(item);
        match self.family {
            Family::SpecialColorLight => light::special_color_attributes(item, &members),
            Family::Thermostat => climate::thermostat_attributes(item, &members),
            Family::ClimateSensor => climate::climate_sensor_attributes(item, &members),
            Family::SecuritySystem => security::security_system_attributes(item),
            Family::Tv => media::tv_attributes(item, &members),
            Family::Fan => fan::fan_attributes(item, &members),
            Family::Humidifier => fan::humidifier_attributes(item, &members),
            Family::Charger => appliance::charger_attributes(item, &members),
            Family::Vacuum => appliance::vacuum_attributes(&members),
            Family::DynamicModes => appliance::modes_attributes(item, &members),
            Family::TemperatureSensor => climate::temperature_sensor_attributes(item),
            Family::Sensor => sensor::sensor_attributes(item),
            Family::Camera => sensor::camera_attributes(item),
            Family::Scene => switch::scene_attributes(item),
            Family::OpenClose | Family::Valve => open_close::attributes(item, &members),
            Family::Speaker => media::speaker_attributes(item),
            Family::StartStop => switch::start_stop_attributes(),
            Family::ColorLight => light::color_attributes(item),
            Family::Lock | Family::DimmableLight | Family::OnOff => Map::new(),
        }
    }

    /// Current device state. A pure function of the item snapshot.
    pub fn state(&self, item: &Item) -> Map<String, Value> {
        let members = self.members(item);
        match self.family {
            Family::SpecialColorLight => light::special_color_state(item, &members),
            Family::Thermostat => climate::thermostat_state(item, &members),
            Family::ClimateSensor => climate::climate_sensor_state(item, &members),
            Family::SecuritySystem => security::security_system_state(item, &members),
            Family::Tv => media::tv_state(item, &members),
            Family::Fan => fan::fan_state(item, &members),
            Family::Humidifier => fan::humidifier_state(item, &members),
            Family::Charger => appliance::charger_state(item, &members),
            Family::Vacuum => appliance::vacuum_state(item, &members),
            Family::DynamicModes => appliance::modes_state(item, &members),
            Family::TemperatureSensor => climate::temperature_sensor_state(item),
            Family::Sensor => sensor::sensor_state(item),
            Family::Camera | Family::Scene => Map::new(),
            Family::Lock => security::lock_state(item),
            Family::OpenClose | Family::Valve => open_close::state(item, &members),
            Family::Speaker => media::speaker_state(item),
            Family::StartStop => switch::start_stop_state(item),
            Family::ColorLight => light::color_state(item),
            Family::DimmableLight => light::dimmable_state(item),
            Family::OnOff => switch::on_off_state(item),
        }
    }

    /// Full SYNC device description.
    pub fn metadata(&self, item: &Item) -> SyncDevice {
        let config = item.config();
        let name = config
            .str("name")
            .unwrap_or_else(|| item.display_name())
            .to_string();
        let mut nicknames = vec![name.clone()];
        for synonym in item.synonyms() {
            if !nicknames.contains(&synonym) {
                nicknames.push(synonym);
            }
        }

        SyncDevice {
            id: item.name.clone(),
            device_type: self.google_device_type(),
            traits: self
                .traits(item)
                .iter()
                .map(|t| t.google_name())
                .collect(),
            name: DeviceName {
                name,
                default_names: vec![item.name.clone()],
                nicknames,
            },
            will_report_state: false,
            room_hint: config.string("roomHint"),
            structure_hint: config.string("structureHint"),
            device_info: DeviceInfo {
                manufacturer: "openHAB".into(),
                model: format!("{}:{}", item.item_type, item.name),
                hw_version: APP_VERSION.into(),
                sw_version: APP_VERSION.into(),
            },
            attributes: self.attributes(item),
            custom_data: self.custom_data(item),
        }
    }

    fn custom_data(&self, item: &Item) -> CustomData {
        let config = item.config();
        CustomData {
            device_type: Some(self.name.into()),
            item_type: Some(item.base_type().into()),
            tfa_ack: config.bool("ackNeeded"),
            tfa_pin: config.string("pinNeeded"),
            check_state: config.bool("checkState"),
            wait_for_state_change: config.f64("waitForStateChange").filter(|v| *v > 0.0),
            inverted: config.bool("inverted"),
            pin_on_disarm_only: config.bool("pinOnDisarmOnly"),
            max_humidity: config.f64("maxHumidity").filter(|v| *v > 0.0),
            members: self.members(item).names(),
        }
    }
}

fn normalize(value: &str) -> String {
    value.trim().replace('_', "").to_ascii_lowercase()
}

/// Members of a composite device by role.
///
/// A member is an item of the group with a `ga` metadata value equal to a role name of the
/// device family, compared case-insensitively. The first member of a role wins, except for the
/// repeatable security system zone role.
#[derive(Debug, Default)]
pub struct Members<'a> {
    entries: Vec<(&'static str, &'a Item)>,
}

impl<'a> Members<'a> {
    pub fn discover(item: &'a Item, roles: &'static [&'static str]) -> Self {
        let mut entries: Vec<(&'static str, &'a Item)> = Vec::new();
        if roles.is_empty() {
            return Self { entries };
        }
        for member in &item.members {
            let Some(value) = member.ga_value() else {
                continue;
            };
            let Some(role) = roles.iter().find(|r| r.eq_ignore_ascii_case(value)) else {
                continue;
            };
            if *role == ROLE_ZONE || !entries.iter().any(|(r, _)| r == role) {
                entries.push((role, member));
            }
        }
        Self { entries }
    }

    pub fn get(&self, role: &str) -> Option<&'a Item> {
        self.entries
            .iter()
            .find(|(r, _)| *r == role)
            .map(|(_, item)| *item)
    }

    /// All members of a role in item order.
    pub fn all(&self, role: &str) -> Vec<&'a Item> {
        self.entries
            .iter()
            .filter(|(r, _)| *r == role)
            .map(|(_, item)| *item)
            .collect()
    }

    pub fn has(&self, role: &str) -> bool {
        self.get(role).is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Role to item name mapping for `customData`. Repeatable roles are not included.
    pub fn names(&self) -> BTreeMap<String, String> {
        self.entries
            .iter()
            .filter(|(role, _)| *role != ROLE_ZONE)
            .map(|(role, item)| (role.to_string(), item.name.clone()))
            .collect()
    }
}

const SWITCH: &[&str] = &["Switch"];
const OPEN_CLOSE_TYPES: &[&str] = &["Rollershutter", "Switch", "Contact"];
const SWITCH_CONTACT: &[&str] = &["Switch", "Contact"];
const NUMERIC: &[&str] = &["Dimmer", "Number"];
const FAN_TYPES: &[&str] = &["Switch", "Dimmer", "Number"];

use Family as F;
use ItemShape as S;

/// Device definitions in matching order.
pub static DEVICE_TYPES: &[DeviceType] = &[
    // composite devices
    DeviceType::new("SpecialColorLight", "LIGHT", F::SpecialColorLight, S::Group)
        .aliases(&["Light"]),
    DeviceType::new("Thermostat", "THERMOSTAT", F::Thermostat, S::Group).tags(&["Thermostat"]),
    DeviceType::new("ClimateSensor", "SENSOR", F::ClimateSensor, S::Group),
    DeviceType::new(
        "SecuritySystem",
        "SECURITYSYSTEM",
        F::SecuritySystem,
        S::GroupOrTypes(SWITCH),
    ),
    DeviceType::new("TV", "TV", F::Tv, S::Group).aliases(&["Television"]),
    DeviceType::new("Fan", "FAN", F::Fan, S::GroupOrTypes(FAN_TYPES)),
    DeviceType::new("AirPurifier", "AIRPURIFIER", F::Fan, S::GroupOrTypes(FAN_TYPES)),
    DeviceType::new("Hood", "HOOD", F::Fan, S::GroupOrTypes(FAN_TYPES)),
    DeviceType::new("Humidifier", "HUMIDIFIER", F::Humidifier, S::GroupOrTypes(NUMERIC)),
    DeviceType::new(
        "Dehumidifier",
        "DEHUMIDIFIER",
        F::Humidifier,
        S::GroupOrTypes(NUMERIC),
    ),
    DeviceType::new("Charger", "CHARGER", F::Charger, S::Group),
    DeviceType::new("Vacuum", "VACUUM", F::Vacuum, S::GroupOrTypes(SWITCH)),
    DeviceType::new("DynamicModesDevice", "SWITCH", F::DynamicModes, S::Group)
        .aliases(&["ModesDevice"]),
    // single item devices
    DeviceType::new(
        "TemperatureSensor",
        "SENSOR",
        F::TemperatureSensor,
        S::Types(&["Number"]),
    )
    .tags(&["CurrentTemperature"]),
    DeviceType::new("Sensor", "SENSOR", F::Sensor, S::Any),
    DeviceType::new("Camera", "CAMERA", F::Camera, S::Types(&["String"])),
    DeviceType::new("Lock", "LOCK", F::Lock, S::Types(SWITCH_CONTACT)),
    DeviceType::new("Scene", "SCENE", F::Scene, S::Types(SWITCH)),
    DeviceType::new(
        "Awning",
        "AWNING",
        F::OpenClose,
        S::GroupOrTypes(OPEN_CLOSE_TYPES),
    ),
    DeviceType::new(
        "Blinds",
        "BLINDS",
        F::OpenClose,
        S::GroupOrTypes(OPEN_CLOSE_TYPES),
    )
    .tags(&["Rollershutter"]),
    DeviceType::new(
        "Curtain",
        "CURTAIN",
        F::OpenClose,
        S::GroupOrTypes(OPEN_CLOSE_TYPES),
    ),
    DeviceType::new("Door", "DOOR", F::OpenClose, S::Types(OPEN_CLOSE_TYPES)),
    DeviceType::new("Garage", "GARAGE", F::OpenClose, S::Types(OPEN_CLOSE_TYPES)),
    DeviceType::new("Gate", "GATE", F::OpenClose, S::Types(OPEN_CLOSE_TYPES)),
    DeviceType::new(
        "Pergola",
        "PERGOLA",
        F::OpenClose,
        S::GroupOrTypes(OPEN_CLOSE_TYPES),
    ),
    DeviceType::new(
        "Shutter",
        "SHUTTER",
        F::OpenClose,
        S::GroupOrTypes(OPEN_CLOSE_TYPES),
    ),
    DeviceType::new(
        "Window",
        "WINDOW",
        F::OpenClose,
        S::GroupOrTypes(OPEN_CLOSE_TYPES),
    ),
    DeviceType::new("Valve", "VALVE", F::Valve, S::Types(SWITCH_CONTACT)),
    DeviceType::new("Speaker", "SPEAKER", F::Speaker, S::Types(NUMERIC)),
    DeviceType::new("Dishwasher", "DISHWASHER", F::StartStop, S::Types(SWITCH)),
    DeviceType::new("Dryer", "DRYER", F::StartStop, S::Types(SWITCH)),
    DeviceType::new("Washer", "WASHER", F::StartStop, S::Types(SWITCH)),
    DeviceType::new("Mower", "MOWER", F::StartStop, S::Types(SWITCH)),
    DeviceType::new("Sprinkler", "SPRINKLER", F::StartStop, S::Types(SWITCH)),
    DeviceType::new("ColorLight", "LIGHT", F::ColorLight, S::Types(&["Color"]))
        .aliases(&["Light"]),
    DeviceType::new(
        "DimmableLight",
        "LIGHT",
        F::DimmableLight,
        S::Types(&["Dimmer"]),
    )
    .aliases(&["Light"]),
    DeviceType::new("Light", "LIGHT", F::OnOff, S::Types(SWITCH)).tags(&["Lighting", "Lightbulb"]),
    DeviceType::new("Switch", "SWITCH", F::OnOff, S::Types(SWITCH)).tags(&["Switchable"]),
    DeviceType::new("Outlet", "OUTLET", F::OnOff, S::Types(SWITCH)),
    DeviceType::new("CoffeeMaker", "COFFEE_MAKER", F::OnOff, S::Types(SWITCH)),
    DeviceType::new("Kettle", "KETTLE", F::OnOff, S::Types(SWITCH)),
    DeviceType::new("Fireplace", "FIREPLACE", F::OnOff, S::Types(SWITCH)),
    DeviceType::new("Heater", "HEATER", F::OnOff, S::Types(SWITCH)),
    DeviceType::new("WaterHeater", "WATERHEATER", F::OnOff, S::Types(SWITCH)),
    DeviceType::new("Boiler", "BOILER", F::OnOff, S::Types(SWITCH)),
    DeviceType::new("Radiator", "RADIATOR", F::OnOff, S::Types(SWITCH)),
    DeviceType::new("AirFreshener", "AIRFRESHENER", F::OnOff, S::Types(SWITCH)),
    DeviceType::new("Blender", "BLENDER", F::OnOff, S::Types(SWITCH)),
    DeviceType::new("Microwave", "MICROWAVE", F::OnOff, S::Types(SWITCH)),
    DeviceType::new("Oven", "OVEN", F::OnOff, S::Types(SWITCH)),
];

/// Find the device definition of an item.
///
/// Items without `ga` metadata never match. The `ga` value is matched first, item tags of the
/// legacy configuration are only considered if no definition answers to the `ga` value.
pub fn find_device_type(item: &Item) -> Option<&'static DeviceType> {
    item.ga()?;
    let candidates = || {
        DEVICE_TYPES
            .iter()
            .filter(|d| d.matches_item_shape(item) && d.is_compatible(item))
    };
    candidates()
        .find(|d| d.matches_metadata_value(item))
        .or_else(|| candidates().find(|d| d.matches_legacy_tag(item)))
}

/// Lookup a device definition by its name as stored in `customData.deviceType`.
pub fn device_type_by_name(name: &str) -> Option<&'static DeviceType> {
    DEVICE_TYPES.iter().find(|d| d.name == name)
}

/// Item is switched on: `ON`, `OPEN` or a positive number.
pub(crate) fn is_on(item: &Item) -> bool {
    match item.state.as_str() {
        "ON" | "OPEN" => true,
        _ => item.number().map(|v| v > 0.0).unwrap_or_default(),
    }
}

/// Language of configured names and synonyms.
pub(crate) fn lang(item: &Item) -> &str {
    item.config().str("lang").unwrap_or("en")
}

/// Numeric member state as json number.
pub(crate) fn number_value(item: &Item) -> Option<Value> {
    item.number().map(crate::util::json::number)
}
