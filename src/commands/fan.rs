// Copyright (c) 2026 Unfolded Circle ApS, Markus Zehnder <markus.z@unfoldedcircle.com>
// SPDX-License-Identifier: MPL-2.0

//! Fan speed, humidity and mode commands.

use crate::commands::{CommandHandler, Context, states};
use crate::devices::Family;
use crate::devices::appliance::ROLE_MODES_CURRENT_MODE;
use crate::devices::fan::{
    DEF_MAX_HUMIDITY, ROLE_FAN_MODE, ROLE_FAN_SPEED, ROLE_HUMIDIFIER_FAN_SPEED,
    ROLE_HUMIDIFIER_HUMIDITY, ROLE_HUMIDIFIER_MODE, speeds,
};
use crate::devices::media::find_entry;
use crate::errors::{ErrorCode, ServiceError};
use crate::util::json::{number, number_string};
use serde::Deserialize;
use serde_json::{Map, Value};

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetFanSpeed {
    #[serde(default)]
    pub fan_speed: Option<String>,
    #[serde(default)]
    pub fan_speed_percent: Option<f64>,
}

impl SetFanSpeed {
    pub fn is_valid(&self) -> bool {
        self.fan_speed.is_some() || self.fan_speed_percent.is_some()
    }

    fn percent(&self) -> Option<f64> {
        self.fan_speed_percent.map(|p| p.clamp(0.0, 100.0).round())
    }

    /// Hub value of a named speed from the `speeds` configuration.
    fn named_speed(&self, ctx: &Context, name: &str) -> Result<String, ServiceError> {
        let speeds = speeds(ctx.item()?);
        find_entry(&speeds, name)
            .map(|s| s.key.clone())
            .ok_or_else(|| ServiceError::not_supported(format!("Unknown fan speed {name}")))
    }
}

impl CommandHandler for SetFanSpeed {
    fn requires_item(&self, _ctx: &Context) -> bool {
        self.percent().is_none()
    }

    fn item_name(&self, ctx: &Context) -> Result<String, ServiceError> {
        match ctx.family() {
            Some(Family::Humidifier) => ctx.required_member(&[ROLE_HUMIDIFIER_FAN_SPEED]),
            _ => ctx.member_or_device(&[ROLE_FAN_SPEED]),
        }
    }

    fn convert_value(&self, ctx: &Context) -> Result<Option<String>, ServiceError> {
        if let Some(percent) = self.percent() {
            return Ok(Some(number_string(percent)));
        }
        match &self.fan_speed {
            Some(name) => self.named_speed(ctx, name).map(Some),
            None => Err(ServiceError::not_supported("Missing fan speed")),
        }
    }

    fn response_states(&self, ctx: &Context) -> Result<Map<String, Value>, ServiceError> {
        if let Some(percent) = self.percent() {
            return Ok(states("currentFanSpeedPercent", number(percent)));
        }
        match &self.fan_speed {
            Some(name) => Ok(states(
                "currentFanSpeedSetting",
                self.named_speed(ctx, name)?,
            )),
            None => Ok(Map::new()),
        }
    }

    fn already_in_state(&self) -> ErrorCode {
        match self.percent() {
            Some(p) if p >= 100.0 => ErrorCode::MaxSpeedReached,
            Some(p) if p <= 0.0 => ErrorCode::MinSpeedReached,
            _ => ErrorCode::AlreadyInState,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SetHumidity {
    pub humidity: f64,
}

impl SetHumidity {
    fn percent(&self) -> f64 {
        self.humidity.clamp(0.0, 100.0)
    }
}

impl CommandHandler for SetHumidity {
    fn item_name(&self, ctx: &Context) -> Result<String, ServiceError> {
        ctx.member_or_device(&[ROLE_HUMIDIFIER_HUMIDITY])
    }

    fn convert_value(&self, ctx: &Context) -> Result<Option<String>, ServiceError> {
        // scale to the hub range, e.g. 0..1 or 0..255 humidity items
        let max = ctx
            .device
            .custom_data
            .max_humidity
            .filter(|m| *m > 0.0)
            .unwrap_or(DEF_MAX_HUMIDITY);
        Ok(Some(number_string(self.percent() * max / 100.0)))
    }

    fn response_states(&self, _ctx: &Context) -> Result<Map<String, Value>, ServiceError> {
        Ok(states("humiditySetpointPercent", number(self.percent().round())))
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetModes {
    pub update_mode_settings: Map<String, Value>,
}

impl SetModes {
    pub fn is_valid(&self) -> bool {
        !self.update_mode_settings.is_empty()
    }

    fn setting(&self) -> Result<String, ServiceError> {
        match self.update_mode_settings.values().next() {
            Some(Value::String(setting)) => Ok(setting.clone()),
            Some(Value::Number(setting)) => Ok(setting.to_string()),
            _ => Err(ServiceError::not_supported("Missing mode setting")),
        }
    }
}

impl CommandHandler for SetModes {
    fn item_name(&self, ctx: &Context) -> Result<String, ServiceError> {
        let role = match ctx.family() {
            Some(Family::Fan) => ROLE_FAN_MODE,
            Some(Family::Humidifier) => ROLE_HUMIDIFIER_MODE,
            Some(Family::DynamicModes) => ROLE_MODES_CURRENT_MODE,
            _ => {
                return Err(ServiceError::not_supported(format!(
                    "{} has no modes",
                    ctx.device.id
                )));
            }
        };
        ctx.required_member(&[role])
    }

    fn convert_value(&self, _ctx: &Context) -> Result<Option<String>, ServiceError> {
        self.setting().map(Some)
    }

    fn response_states(&self, _ctx: &Context) -> Result<Map<String, Value>, ServiceError> {
        Ok(states(
            "currentModeSettings",
            Value::Object(self.update_mode_settings.clone()),
        ))
    }
}
