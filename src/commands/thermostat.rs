// Copyright (c) 2026 Unfolded Circle ApS, Markus Zehnder <markus.z@unfoldedcircle.com>
// SPDX-License-Identifier: MPL-2.0

//! Thermostat setpoint and mode commands.
//!
//! All thermostat commands need the thermostat item for the Fahrenheit and mode configuration.
//! The response states are the current thermostat state with the changed value applied.

use crate::commands::{CommandHandler, Context};
use crate::devices::climate::{
    ROLE_MODE, ROLE_SETPOINT, ROLE_SETPOINT_HIGH, ROLE_SETPOINT_LOW, ThermostatModes,
    use_fahrenheit,
};
use crate::errors::{ErrorCode, ServiceError};
use crate::util::json::{number, number_string};
use crate::util::temperature::fahrenheit_from_celsius;
use serde::Deserialize;
use serde_json::{Map, Value};

/// Hub value of a Celsius setpoint.
fn setpoint_value(ctx: &Context, celsius: f64) -> Result<Option<String>, ServiceError> {
    let value = if use_fahrenheit(ctx.item()?) {
        fahrenheit_from_celsius(celsius)
    } else {
        celsius
    };
    Ok(Some(number_string(value)))
}

fn setpoint_states(ctx: &Context, role: &str, celsius: f64) -> Map<String, Value> {
    let mut states = ctx.device_state();
    states.insert(role.into(), number(celsius));
    states
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThermostatTemperatureSetpoint {
    pub thermostat_temperature_setpoint: f64,
}

impl CommandHandler for ThermostatTemperatureSetpoint {
    fn requires_item(&self, _ctx: &Context) -> bool {
        true
    }

    fn item_name(&self, ctx: &Context) -> Result<String, ServiceError> {
        ctx.member_or_device(&[ROLE_SETPOINT])
    }

    fn convert_value(&self, ctx: &Context) -> Result<Option<String>, ServiceError> {
        setpoint_value(ctx, self.thermostat_temperature_setpoint)
    }

    fn response_states(&self, ctx: &Context) -> Result<Map<String, Value>, ServiceError> {
        Ok(setpoint_states(
            ctx,
            ROLE_SETPOINT,
            self.thermostat_temperature_setpoint,
        ))
    }

    fn already_in_state(&self) -> ErrorCode {
        ErrorCode::TargetAlreadyReached
    }
}

/// Upper setpoint of a `ThermostatTemperatureSetRange` command.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThermostatTemperatureSetRangeHigh {
    pub thermostat_temperature_setpoint_high: f64,
}

impl CommandHandler for ThermostatTemperatureSetRangeHigh {
    fn requires_item(&self, _ctx: &Context) -> bool {
        true
    }

    fn item_name(&self, ctx: &Context) -> Result<String, ServiceError> {
        ctx.required_member(&[ROLE_SETPOINT_HIGH])
    }

    fn convert_value(&self, ctx: &Context) -> Result<Option<String>, ServiceError> {
        setpoint_value(ctx, self.thermostat_temperature_setpoint_high)
    }

    fn response_states(&self, ctx: &Context) -> Result<Map<String, Value>, ServiceError> {
        Ok(setpoint_states(
            ctx,
            ROLE_SETPOINT_HIGH,
            self.thermostat_temperature_setpoint_high,
        ))
    }

    fn already_in_state(&self) -> ErrorCode {
        ErrorCode::TargetAlreadyReached
    }
}

/// Lower setpoint of a `ThermostatTemperatureSetRange` command.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThermostatTemperatureSetRangeLow {
    pub thermostat_temperature_setpoint_low: f64,
}

impl CommandHandler for ThermostatTemperatureSetRangeLow {
    fn requires_item(&self, _ctx: &Context) -> bool {
        true
    }

    fn item_name(&self, ctx: &Context) -> Result<String, ServiceError> {
        ctx.required_member(&[ROLE_SETPOINT_LOW])
    }

    fn convert_value(&self, ctx: &Context) -> Result<Option<String>, ServiceError> {
        setpoint_value(ctx, self.thermostat_temperature_setpoint_low)
    }

    fn response_states(&self, ctx: &Context) -> Result<Map<String, Value>, ServiceError> {
        Ok(setpoint_states(
            ctx,
            ROLE_SETPOINT_LOW,
            self.thermostat_temperature_setpoint_low,
        ))
    }

    fn already_in_state(&self) -> ErrorCode {
        ErrorCode::TargetAlreadyReached
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThermostatSetMode {
    pub thermostat_mode: String,
}

impl CommandHandler for ThermostatSetMode {
    fn requires_item(&self, _ctx: &Context) -> bool {
        true
    }

    fn item_name(&self, ctx: &Context) -> Result<String, ServiceError> {
        ctx.member_or_device(&[ROLE_MODE])
    }

    fn convert_value(&self, ctx: &Context) -> Result<Option<String>, ServiceError> {
        let modes = ThermostatModes::from_item(ctx.item()?);
        modes.to_hub(&self.thermostat_mode).map(Some)
    }

    fn response_states(&self, ctx: &Context) -> Result<Map<String, Value>, ServiceError> {
        let mut states = ctx.device_state();
        states.insert(
            "thermostatMode".into(),
            self.thermostat_mode.as_str().into(),
        );
        Ok(states)
    }

    fn already_in_state(&self) -> ErrorCode {
        match self.thermostat_mode.to_ascii_lowercase().as_str() {
            "off" => ErrorCode::InOffMode,
            "auto" => ErrorCode::InAutoMode,
            "eco" => ErrorCode::InEcoMode,
            "dry" => ErrorCode::InDryMode,
            "fan-only" => ErrorCode::InFanOnlyMode,
            "heat" => ErrorCode::InHeatMode,
            "cool" => ErrorCode::InCoolMode,
            "heatcool" => ErrorCode::InHeatOrCool,
            _ => ErrorCode::AlreadyInState,
        }
    }

    fn supports_ack(&self) -> bool {
        true
    }
}
