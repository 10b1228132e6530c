// Copyright (c) 2026 Unfolded Circle ApS, Markus Zehnder <markus.z@unfoldedcircle.com>
// SPDX-License-Identifier: MPL-2.0

//! Google Smart Home data structure definitions for JSON serialization & deserialization.
//!
//! See <https://developers.home.google.com/cloud-to-cloud/intents/sync> and the corresponding
//! `QUERY` and `EXECUTE` intents for further information.

use crate::errors::{ChallengeType, ErrorCode};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use serde_with::skip_serializing_none;
use std::collections::BTreeMap;
use strum::AsRefStr;

/// Device traits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display, AsRefStr)]
pub enum Trait {
    AppSelector,
    ArmDisarm,
    Brightness,
    CameraStream,
    Channel,
    ColorSetting,
    Dock,
    EnergyStorage,
    FanSpeed,
    HumiditySetting,
    InputSelector,
    Locate,
    LockUnlock,
    Modes,
    OnOff,
    OpenClose,
    Rotation,
    Scene,
    SensorState,
    StartStop,
    StatusReport,
    TemperatureControl,
    TemperatureSetting,
    TransportControl,
    Volume,
}

impl Trait {
    /// Fully qualified trait name, e.g. `action.devices.traits.OnOff`.
    pub fn google_name(&self) -> String {
        format!("action.devices.traits.{self}")
    }
}

/// A device as sent by Google in `QUERY` and `EXECUTE` requests.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Device {
    pub id: String,
    #[serde(default)]
    pub custom_data: CustomData,
}

impl Device {
    pub fn device_type(&self) -> &str {
        self.custom_data.device_type.as_deref().unwrap_or_default()
    }

    pub fn item_type(&self) -> &str {
        self.custom_data.item_type.as_deref().unwrap_or_default()
    }
}

/// Opaque device data provided in `SYNC` and echoed back by Google on every request.
#[skip_serializing_none]
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomData {
    /// Name of the matched device definition.
    pub device_type: Option<String>,
    /// Effective item type without dimension.
    pub item_type: Option<String>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub tfa_ack: bool,
    #[serde(default, deserialize_with = "opt_string_from_value")]
    pub tfa_pin: Option<String>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub check_state: bool,
    /// Seconds to wait before validating an executed command.
    pub wait_for_state_change: Option<f64>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub inverted: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub pin_on_disarm_only: bool,
    pub max_humidity: Option<f64>,
    /// Member item names of a composite device by role.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub members: BTreeMap<String, String>,
}

fn is_false(v: &bool) -> bool {
    !*v
}

fn opt_string_from_value<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(v)) => Some(v),
        Some(Value::Number(v)) => Some(v.to_string()),
        _ => None,
    })
}

/// Two-factor authentication data of an `EXECUTE` request.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Challenge {
    #[serde(default, deserialize_with = "opt_string_from_value")]
    pub pin: Option<String>,
    #[serde(default)]
    pub ack: bool,
}

/// Device entry of a `SYNC` response.
#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncDevice {
    pub id: String,
    #[serde(rename = "type")]
    pub device_type: String,
    pub traits: Vec<String>,
    pub name: DeviceName,
    pub will_report_state: bool,
    pub room_hint: Option<String>,
    pub structure_hint: Option<String>,
    pub device_info: DeviceInfo,
    pub attributes: Map<String, Value>,
    pub custom_data: CustomData,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceName {
    pub name: String,
    pub default_names: Vec<String>,
    pub nicknames: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceInfo {
    pub manufacturer: String,
    pub model: String,
    pub hw_version: String,
    pub sw_version: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Status {
    Success,
    Error,
    Exceptions,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ChallengeNeeded {
    #[serde(rename = "type")]
    pub challenge_type: ChallengeType,
}

/// Per device entry of an `EXECUTE` or `QUERY` response.
#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceResult {
    pub ids: Vec<String>,
    pub status: Status,
    pub states: Option<Map<String, Value>>,
    pub error_code: Option<ErrorCode>,
    pub challenge_needed: Option<ChallengeNeeded>,
    pub debug_string: Option<String>,
}

impl DeviceResult {
    pub fn success(id: impl Into<String>, states: Map<String, Value>) -> Self {
        Self::new(id, Status::Success, Some(states))
    }

    pub fn exceptions(id: impl Into<String>, states: Map<String, Value>) -> Self {
        Self::new(id, Status::Exceptions, Some(states))
    }

    pub fn error(id: impl Into<String>, error_code: ErrorCode) -> Self {
        Self {
            error_code: Some(error_code),
            ..Self::new(id, Status::Error, None)
        }
    }

    /// Two-factor authentication is required before the command can be executed.
    pub fn challenge(
        id: impl Into<String>,
        challenge_type: ChallengeType,
        states: Option<Map<String, Value>>,
    ) -> Self {
        Self {
            error_code: Some(ErrorCode::ChallengeNeeded),
            challenge_needed: Some(ChallengeNeeded { challenge_type }),
            ..Self::new(id, Status::Error, states)
        }
    }

    pub fn with_debug_string(mut self, debug: impl Into<String>) -> Self {
        self.debug_string = Some(debug.into());
        self
    }

    fn new(id: impl Into<String>, status: Status, states: Option<Map<String, Value>>) -> Self {
        Self {
            ids: vec![id.into()],
            status,
            states,
            error_code: None,
            challenge_needed: None,
            debug_string: None,
        }
    }
}
