// Copyright (c) 2026 Unfolded Circle ApS, Markus Zehnder <markus.z@unfoldedcircle.com>
// SPDX-License-Identifier: MPL-2.0

//! Google `EXECUTE` commands.
//!
//! A command is matched by its name and the shape of its parameters, see [`COMMAND_TYPES`]. The
//! parameters are deserialized into a typed struct implementing [`CommandHandler`], which
//! translates the command into an item command for the hub.

use crate::client::Item;
use crate::devices::{DeviceType, Family, Members, device_type_by_name};
use crate::errors::{ErrorCode, ServiceError};
use crate::google::{Device, DeviceResult};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

mod arm_disarm;
mod camera;
pub mod executor;
mod fan;
mod light;
mod media;
mod onoff;
mod open_close;
mod thermostat;

pub use arm_disarm::ArmDisarm;
pub use camera::GetCameraStream;
pub use fan::{SetFanSpeed, SetHumidity, SetModes};
pub use light::{BrightnessAbsolute, ColorAbsolute, ColorAbsoluteTemperature};
pub use media::{
    AppSelect, MediaControl, Mute, NextInput, RelativeChannel, SelectChannel, SetInput,
    SetVolume, Transport, VolumeRelative,
};
pub use onoff::{ActivateScene, Charge, Dock, Locate, LockUnlock, OnOff, PauseUnpause, StartStop};
pub use open_close::{OpenClose, RotateAbsolute};
pub use thermostat::{
    ThermostatSetMode, ThermostatTemperatureSetRangeHigh, ThermostatTemperatureSetRangeLow,
    ThermostatTemperatureSetpoint,
};

/// Name prefix of Google commands.
pub const COMMAND_PREFIX: &str = "action.devices.commands.";

/// Translation of a Google command to a hub item command.
///
/// The executor calls the methods in this order: [`requires_item`](Self::requires_item),
/// [`item_name`](Self::item_name), [`convert_value`](Self::convert_value),
/// [`check_current_state`](Self::check_current_state) if requested by the device,
/// [`response_states`](Self::response_states) and, after the item command has been sent,
/// [`validate_update`](Self::validate_update).
pub trait CommandHandler {
    /// The item must be fetched from the hub to execute the command.
    fn requires_item(&self, _ctx: &Context) -> bool {
        false
    }

    /// Name of the item receiving the command. Defaults to the device id.
    fn item_name(&self, ctx: &Context) -> Result<String, ServiceError> {
        Ok(ctx.device.id.clone())
    }

    /// Item command value. `None` if no item command is sent.
    fn convert_value(&self, ctx: &Context) -> Result<Option<String>, ServiceError>;

    /// Device states reported back to Google.
    fn response_states(&self, ctx: &Context) -> Result<Map<String, Value>, ServiceError>;

    /// Error code if the device is already in the requested state.
    fn already_in_state(&self) -> ErrorCode {
        ErrorCode::AlreadyInState
    }

    /// Fails with the already-in-state error if the target value equals the current state.
    fn check_current_state(&self, target: &str, current: &str) -> Result<(), ServiceError> {
        if target == current {
            let code = self.already_in_state();
            Err(ServiceError::with_msg(
                code,
                format!("Device is already in the requested state: {current}"),
            ))
        } else {
            Ok(())
        }
    }

    /// The command may be executed without the configured PIN.
    fn bypass_pin(&self, _device: &Device) -> bool {
        false
    }

    /// The command supports the two-factor acknowledge challenge.
    fn supports_ack(&self) -> bool {
        false
    }

    /// The resulting device state has to be validated after sending the command.
    fn requires_update_validation(&self, _ctx: &Context) -> bool {
        false
    }

    /// Validate the freshly fetched item after sending the command.
    ///
    /// Returns a custom result, e.g. with `EXCEPTIONS` status, or `None` to report the
    /// current device state as success.
    fn validate_update(&self, _ctx: &Context) -> Result<Option<DeviceResult>, ServiceError> {
        Ok(None)
    }
}

/// Execution context of a command for a single device.
#[derive(Debug, Clone, Copy)]
pub struct Context<'a> {
    pub device: &'a Device,
    /// Device definition named in `customData.deviceType`.
    pub device_type: Option<&'static DeviceType>,
    /// The device item, if it was fetched.
    pub item: Option<&'a Item>,
}

impl<'a> Context<'a> {
    pub fn new(device: &'a Device, item: Option<&'a Item>) -> Self {
        Self {
            device,
            device_type: device_type_by_name(device.device_type()),
            item,
        }
    }

    pub fn family(&self) -> Option<Family> {
        self.device_type.map(|d| d.family)
    }

    /// The device is of one of the given device definitions.
    pub fn is_device_type(&self, names: &[&str]) -> bool {
        names.contains(&self.device.device_type())
    }

    pub fn inverted(&self) -> bool {
        self.device.custom_data.inverted
    }

    /// Effective item type of the device item.
    pub fn item_type(&self) -> &str {
        match self.item {
            Some(item) => item.base_type(),
            None => self.device.item_type(),
        }
    }

    /// The fetched device item.
    pub fn item(&self) -> Result<&'a Item, ServiceError> {
        self.item.ok_or_else(|| {
            ServiceError::with_msg(
                ErrorCode::DeviceNotReady,
                format!("Item {} has not been fetched", self.device.id),
            )
        })
    }

    fn members(&self) -> Option<Members<'a>> {
        match (self.item, self.device_type) {
            (Some(item), Some(device_type)) => Some(device_type.members(item)),
            _ => None,
        }
    }

    /// The device is a composite device with known members.
    pub fn has_members(&self) -> bool {
        match self.members() {
            Some(members) => !members.is_empty(),
            None => !self.device.custom_data.members.is_empty(),
        }
    }

    /// Item name of a member role. Fetched group members take precedence over `customData`.
    pub fn member(&self, role: &str) -> Option<String> {
        self.members()
            .and_then(|m| m.get(role).map(|i| i.name.clone()))
            .or_else(|| self.device.custom_data.members.get(role).cloned())
    }

    /// Fetched member item of a role.
    pub fn member_item(&self, role: &str) -> Option<&'a Item> {
        self.members().and_then(|m| m.get(role))
    }

    /// Item name of the first available member role, or the device id of a single item device.
    ///
    /// Fails with `notSupported` if the device has members but none of the given roles.
    pub fn member_or_device(&self, roles: &[&str]) -> Result<String, ServiceError> {
        if !self.has_members() {
            return Ok(self.device.id.clone());
        }
        self.required_member(roles)
    }

    /// Item name of the first available member role.
    pub fn required_member(&self, roles: &[&str]) -> Result<String, ServiceError> {
        roles
            .iter()
            .find_map(|role| self.member(role))
            .ok_or_else(|| {
                ServiceError::not_supported(format!(
                    "{}: missing member {}",
                    self.device.id,
                    roles.join(" / ")
                ))
            })
    }

    /// The fetched item or group member with the given name.
    pub fn target_item(&self, name: &str) -> Option<&'a Item> {
        let item = self.item?;
        if item.name == name {
            return Some(item);
        }
        item.members.iter().find(|m| m.name == name)
    }

    /// Current device state derived from the fetched item.
    pub fn device_state(&self) -> Map<String, Value> {
        match (self.item, self.device_type) {
            (Some(item), Some(device_type)) => device_type.state(item),
            _ => Map::new(),
        }
    }
}

/// A Google command with typed parameters.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    OnOff(OnOff),
    LockUnlock(LockUnlock),
    ArmDisarm(ArmDisarm),
    ActivateScene(ActivateScene),
    BrightnessAbsolute(BrightnessAbsolute),
    ColorAbsoluteTemperature(ColorAbsoluteTemperature),
    ColorAbsolute(ColorAbsolute),
    OpenClose(OpenClose),
    RotateAbsolute(RotateAbsolute),
    StartStop(StartStop),
    PauseUnpause(PauseUnpause),
    Dock(Dock),
    Locate(Locate),
    Charge(Charge),
    SetVolume(SetVolume),
    VolumeRelative(VolumeRelative),
    Mute(Mute),
    SetFanSpeed(SetFanSpeed),
    SetHumidity(SetHumidity),
    ThermostatTemperatureSetpoint(ThermostatTemperatureSetpoint),
    ThermostatTemperatureSetRangeHigh(ThermostatTemperatureSetRangeHigh),
    ThermostatTemperatureSetRangeLow(ThermostatTemperatureSetRangeLow),
    ThermostatSetMode(ThermostatSetMode),
    SetInput(SetInput),
    NextInput(NextInput),
    SelectChannel(SelectChannel),
    RelativeChannel(RelativeChannel),
    AppSelect(AppSelect),
    SetModes(SetModes),
    Media(MediaControl),
    GetCameraStream(GetCameraStream),
}

impl Command {
    /// Match a Google command name, with or without the `action.devices.commands.` prefix, and
    /// its parameters against the command registry.
    pub fn from_request(name: &str, params: &Value) -> Option<Command> {
        let name = name.strip_prefix(COMMAND_PREFIX).unwrap_or(name);
        COMMAND_TYPES
            .iter()
            .filter(|t| t.name == name)
            .find_map(|t| (t.parse)(params))
    }

    pub fn handler(&self) -> &dyn CommandHandler {
        match self {
            Command::OnOff(c) => c,
            Command::LockUnlock(c) => c,
            Command::ArmDisarm(c) => c,
            Command::ActivateScene(c) => c,
            Command::BrightnessAbsolute(c) => c,
            Command::ColorAbsoluteTemperature(c) => c,
            Command::ColorAbsolute(c) => c,
            Command::OpenClose(c) => c,
            Command::RotateAbsolute(c) => c,
            Command::StartStop(c) => c,
            Command::PauseUnpause(c) => c,
            Command::Dock(c) => c,
            Command::Locate(c) => c,
            Command::Charge(c) => c,
            Command::SetVolume(c) => c,
            Command::VolumeRelative(c) => c,
            Command::Mute(c) => c,
            Command::SetFanSpeed(c) => c,
            Command::SetHumidity(c) => c,
            Command::ThermostatTemperatureSetpoint(c) => c,
            Command::ThermostatTemperatureSetRangeHigh(c) => c,
            Command::ThermostatTemperatureSetRangeLow(c) => c,
            Command::ThermostatSetMode(c) => c,
            Command::SetInput(c) => c,
            Command::NextInput(c) => c,
            Command::SelectChannel(c) => c,
            Command::RelativeChannel(c) => c,
            Command::AppSelect(c) => c,
            Command::SetModes(c) => c,
            Command::Media(c) => c,
            Command::GetCameraStream(c) => c,
        }
    }
}

/// Registry entry: a Google command name with a parameter parser.
///
/// The parser returns `None` if the parameters don't have the shape of this command type.
pub struct CommandType {
    pub name: &'static str,
    parse: fn(&Value) -> Option<Command>,
}

fn params<T: DeserializeOwned>(params: &Value) -> Option<T> {
    serde_json::from_value(params.clone()).ok()
}

/// Command types in matching order.
pub static COMMAND_TYPES: &[CommandType] = &[
    CommandType {
        name: "OnOff",
        parse: |p| params(p).map(Command::OnOff),
    },
    CommandType {
        name: "LockUnlock",
        parse: |p| params(p).map(Command::LockUnlock),
    },
    CommandType {
        name: "ArmDisarm",
        parse: |p| params(p).map(Command::ArmDisarm),
    },
    CommandType {
        name: "ActivateScene",
        parse: |p| params(p).map(Command::ActivateScene),
    },
    CommandType {
        name: "BrightnessAbsolute",
        parse: |p| params(p).map(Command::BrightnessAbsolute),
    },
    CommandType {
        name: "ColorAbsolute",
        parse: |p| params(p).map(Command::ColorAbsoluteTemperature),
    },
    CommandType {
        name: "ColorAbsolute",
        parse: |p| {
            params::<ColorAbsolute>(p)
                .filter(ColorAbsolute::is_valid)
                .map(Command::ColorAbsolute)
        },
    },
    CommandType {
        name: "OpenClose",
        parse: |p| params(p).map(Command::OpenClose),
    },
    CommandType {
        name: "RotateAbsolute",
        parse: |p| {
            params::<RotateAbsolute>(p)
                .filter(RotateAbsolute::is_valid)
                .map(Command::RotateAbsolute)
        },
    },
    CommandType {
        name: "StartStop",
        parse: |p| params(p).map(Command::StartStop),
    },
    CommandType {
        name: "PauseUnpause",
        parse: |p| params(p).map(Command::PauseUnpause),
    },
    CommandType {
        name: "Dock",
        parse: |p| params(p).map(Command::Dock),
    },
    CommandType {
        name: "Locate",
        parse: |p| params(p).map(Command::Locate),
    },
    CommandType {
        name: "Charge",
        parse: |p| params(p).map(Command::Charge),
    },
    CommandType {
        name: "SetVolume",
        parse: |p| params(p).map(Command::SetVolume),
    },
    CommandType {
        name: "volumeRelative",
        parse: |p| params(p).map(Command::VolumeRelative),
    },
    CommandType {
        name: "mute",
        parse: |p| params(p).map(Command::Mute),
    },
    CommandType {
        name: "SetFanSpeed",
        parse: |p| {
            params::<SetFanSpeed>(p)
                .filter(SetFanSpeed::is_valid)
                .map(Command::SetFanSpeed)
        },
    },
    CommandType {
        name: "SetHumidity",
        parse: |p| params(p).map(Command::SetHumidity),
    },
    CommandType {
        name: "ThermostatTemperatureSetpoint",
        parse: |p| params(p).map(Command::ThermostatTemperatureSetpoint),
    },
    CommandType {
        name: "ThermostatTemperatureSetRange",
        parse: |p| params(p).map(Command::ThermostatTemperatureSetRangeHigh),
    },
    CommandType {
        name: "ThermostatTemperatureSetRange",
        parse: |p| params(p).map(Command::ThermostatTemperatureSetRangeLow),
    },
    CommandType {
        name: "ThermostatSetMode",
        parse: |p| params(p).map(Command::ThermostatSetMode),
    },
    CommandType {
        name: "SetInput",
        parse: |p| params(p).map(Command::SetInput),
    },
    CommandType {
        name: "NextInput",
        parse: |_| Some(Command::NextInput(NextInput { next: true })),
    },
    CommandType {
        name: "PreviousInput",
        parse: |_| Some(Command::NextInput(NextInput { next: false })),
    },
    CommandType {
        name: "selectChannel",
        parse: |p| {
            params::<SelectChannel>(p)
                .filter(SelectChannel::is_valid)
                .map(Command::SelectChannel)
        },
    },
    CommandType {
        name: "relativeChannel",
        parse: |p| params(p).map(Command::RelativeChannel),
    },
    CommandType {
        name: "appSelect",
        parse: |p| {
            params::<AppSelect>(p)
                .filter(AppSelect::is_valid)
                .map(Command::AppSelect)
        },
    },
    CommandType {
        name: "SetModes",
        parse: |p| {
            params::<SetModes>(p)
                .filter(SetModes::is_valid)
                .map(Command::SetModes)
        },
    },
    CommandType {
        name: "mediaNext",
        parse: |_| Some(Command::Media(MediaControl(Transport::Next))),
    },
    CommandType {
        name: "mediaPrevious",
        parse: |_| Some(Command::Media(MediaControl(Transport::Previous))),
    },
    CommandType {
        name: "mediaPause",
        parse: |_| Some(Command::Media(MediaControl(Transport::Pause))),
    },
    CommandType {
        name: "mediaResume",
        parse: |_| Some(Command::Media(MediaControl(Transport::Resume))),
    },
    CommandType {
        name: "GetCameraStream",
        parse: |p| params(p).map(Command::GetCameraStream),
    },
];

/// `ON` / `OFF` command value, swapped for inverted devices.
pub(crate) fn on_off_value(on: bool, inverted: bool) -> String {
    if on != inverted { "ON" } else { "OFF" }.to_string()
}

/// Response states with a single entry.
pub(crate) fn states(key: &str, value: impl Into<Value>) -> Map<String, Value> {
    let mut states = Map::new();
    states.insert(key.into(), value.into());
    states
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    pub(crate) fn device(value: Value) -> Device {
        serde_json::from_value(value).expect("invalid test device")
    }

    #[rstest]
    #[case("action.devices.commands.OnOff", json!({"on": true}))]
    #[case("OnOff", json!({"on": false}))]
    fn on_off_with_and_without_prefix(#[case] name: &str, #[case] params: Value) {
        assert!(matches!(
            Command::from_request(name, &params),
            Some(Command::OnOff(_))
        ));
    }

    #[rstest]
    #[case("OnOff", json!({}))]
    #[case("OnOff", json!({"on": "yes"}))]
    #[case("Unknown", json!({"on": true}))]
    #[case("ColorAbsolute", json!({"color": {}}))]
    #[case("SetFanSpeed", json!({}))]
    #[case("RotateAbsolute", json!({}))]
    #[case("selectChannel", json!({}))]
    #[case("SetModes", json!({"updateModeSettings": {}}))]
    fn invalid_commands_do_not_match(#[case] name: &str, #[case] params: Value) {
        assert_eq!(None, Command::from_request(name, &params));
    }

    #[test]
    fn color_temperature_matches_before_spectrum() {
        let command = Command::from_request(
            "action.devices.commands.ColorAbsolute",
            &json!({"color": {"temperature": 3000}}),
        );
        assert!(matches!(command, Some(Command::ColorAbsoluteTemperature(_))));

        let command = Command::from_request(
            "action.devices.commands.ColorAbsolute",
            &json!({"color": {"spectrumHSV": {"hue": 120, "saturation": 1, "value": 1}}}),
        );
        assert!(matches!(command, Some(Command::ColorAbsolute(_))));
    }

    #[test]
    fn set_range_matches_by_parameter_shape() {
        let name = "action.devices.commands.ThermostatTemperatureSetRange";
        assert!(matches!(
            Command::from_request(name, &json!({"thermostatTemperatureSetpointHigh": 24})),
            Some(Command::ThermostatTemperatureSetRangeHigh(_))
        ));
        assert!(matches!(
            Command::from_request(name, &json!({"thermostatTemperatureSetpointLow": 18})),
            Some(Command::ThermostatTemperatureSetRangeLow(_))
        ));
    }

    #[test]
    fn parameterless_commands() {
        for name in ["NextInput", "PreviousInput", "mediaNext", "mediaPause", "Dock"] {
            assert!(
                Command::from_request(name, &json!({})).is_some(),
                "{name} not matched"
            );
        }
    }

    #[test]
    fn command_names_are_registered() {
        let names: Vec<&str> = COMMAND_TYPES.iter().map(|t| t.name).collect();
        for name in ["ArmDisarm", "GetCameraStream", "SetHumidity", "Charge", "Locate"] {
            assert!(names.contains(&name), "{name} not registered");
        }
    }

    #[rstest]
    #[case(true, false, "ON")]
    #[case(false, false, "OFF")]
    #[case(true, true, "OFF")]
    #[case(false, true, "ON")]
    fn test_on_off_value(#[case] on: bool, #[case] inverted: bool, #[case] expected: &str) {
        assert_eq!(expected, on_off_value(on, inverted));
    }
}
