// Copyright (c) 2026 Unfolded Circle ApS, Markus Zehnder <markus.z@unfoldedcircle.com>
// SPDX-License-Identifier: MPL-2.0

//! Switch like commands: on / off, locks, scenes, start / stop and vacuum robots.

use crate::commands::{CommandHandler, Context, on_off_value, states};
use crate::devices::Family;
use crate::devices::appliance::{
    ROLE_CHARGER_CHARGING, ROLE_VACUUM_DOCK, ROLE_VACUUM_LOCATE, ROLE_VACUUM_PAUSE,
    ROLE_VACUUM_POWER,
};
use crate::devices::fan::{ROLE_FAN_POWER, ROLE_FAN_SPEED, ROLE_HUMIDIFIER_POWER};
use crate::devices::open_close::ROLE_OPEN_PERCENT;
use crate::devices::{appliance, light, media};
use crate::errors::{ErrorCode, ServiceError};
use serde::Deserialize;
use serde_json::{Map, Value};

/// Member roles switching a composite device on or off, in order of preference.
fn power_roles(family: Option<Family>) -> &'static [&'static str] {
    match family {
        Some(Family::SpecialColorLight) => &[light::ROLE_POWER, light::ROLE_BRIGHTNESS],
        Some(Family::Tv) => &[media::ROLE_POWER],
        Some(Family::Fan) => &[ROLE_FAN_POWER, ROLE_FAN_SPEED],
        Some(Family::Humidifier) => &[ROLE_HUMIDIFIER_POWER],
        Some(Family::DynamicModes) => &[appliance::ROLE_MODES_POWER],
        _ => &[],
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct OnOff {
    pub on: bool,
}

impl CommandHandler for OnOff {
    fn item_name(&self, ctx: &Context) -> Result<String, ServiceError> {
        let roles = power_roles(ctx.family());
        if roles.is_empty() {
            return Ok(ctx.device.id.clone());
        }
        ctx.member_or_device(roles)
    }

    fn convert_value(&self, ctx: &Context) -> Result<Option<String>, ServiceError> {
        Ok(Some(on_off_value(self.on, ctx.inverted())))
    }

    fn response_states(&self, _ctx: &Context) -> Result<Map<String, Value>, ServiceError> {
        Ok(states("on", self.on))
    }

    fn already_in_state(&self) -> ErrorCode {
        if self.on {
            ErrorCode::AlreadyOn
        } else {
            ErrorCode::AlreadyOff
        }
    }

    fn supports_ack(&self) -> bool {
        true
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LockUnlock {
    pub lock: bool,
}

impl CommandHandler for LockUnlock {
    fn convert_value(&self, ctx: &Context) -> Result<Option<String>, ServiceError> {
        if ctx.item_type() == "Contact" {
            return Err(ServiceError::not_supported("Contact locks are query only"));
        }
        Ok(Some(on_off_value(self.lock, ctx.inverted())))
    }

    fn response_states(&self, _ctx: &Context) -> Result<Map<String, Value>, ServiceError> {
        Ok(states("isLocked", self.lock))
    }

    fn already_in_state(&self) -> ErrorCode {
        if self.lock {
            ErrorCode::AlreadyLocked
        } else {
            ErrorCode::AlreadyUnlocked
        }
    }

    fn supports_ack(&self) -> bool {
        true
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ActivateScene {
    #[serde(default)]
    pub deactivate: bool,
}

impl CommandHandler for ActivateScene {
    fn convert_value(&self, _ctx: &Context) -> Result<Option<String>, ServiceError> {
        Ok(Some(on_off_value(!self.deactivate, false)))
    }

    fn response_states(&self, _ctx: &Context) -> Result<Map<String, Value>, ServiceError> {
        Ok(Map::new())
    }

    // scenes can always be triggered again
    fn check_current_state(&self, _target: &str, _current: &str) -> Result<(), ServiceError> {
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StartStop {
    pub start: bool,
}

impl StartStop {
    fn is_shutter(ctx: &Context) -> bool {
        ctx.family() == Some(Family::OpenClose)
    }
}

impl CommandHandler for StartStop {
    fn requires_item(&self, ctx: &Context) -> bool {
        // the member type of a composite shutter is unknown
        Self::is_shutter(ctx) && ctx.has_members()
    }

    fn item_name(&self, ctx: &Context) -> Result<String, ServiceError> {
        match ctx.family() {
            Some(Family::Vacuum) => ctx.member_or_device(&[ROLE_VACUUM_POWER]),
            Some(Family::OpenClose) => ctx.member_or_device(&[ROLE_OPEN_PERCENT]),
            _ => Ok(ctx.device.id.clone()),
        }
    }

    fn convert_value(&self, ctx: &Context) -> Result<Option<String>, ServiceError> {
        if Self::is_shutter(ctx) {
            let item_type = match ctx.member_item(ROLE_OPEN_PERCENT) {
                Some(member) => member.base_type(),
                None => ctx.item_type(),
            };
            if item_type != "Rollershutter" {
                return Err(ServiceError::not_supported(format!(
                    "StartStop is not supported for {item_type} items"
                )));
            }
            return Ok(Some(if self.start { "MOVE" } else { "STOP" }.into()));
        }
        Ok(Some(on_off_value(self.start, ctx.inverted())))
    }

    fn response_states(&self, _ctx: &Context) -> Result<Map<String, Value>, ServiceError> {
        let mut states = states("isRunning", self.start);
        states.insert("isPaused".into(), false.into());
        Ok(states)
    }

    fn already_in_state(&self) -> ErrorCode {
        if self.start {
            ErrorCode::AlreadyStarted
        } else {
            ErrorCode::AlreadyStopped
        }
    }

    fn supports_ack(&self) -> bool {
        true
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PauseUnpause {
    pub pause: bool,
}

impl CommandHandler for PauseUnpause {
    fn item_name(&self, ctx: &Context) -> Result<String, ServiceError> {
        ctx.required_member(&[ROLE_VACUUM_PAUSE])
    }

    fn convert_value(&self, _ctx: &Context) -> Result<Option<String>, ServiceError> {
        Ok(Some(on_off_value(self.pause, false)))
    }

    fn response_states(&self, _ctx: &Context) -> Result<Map<String, Value>, ServiceError> {
        Ok(states("isPaused", self.pause))
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Dock {}

impl CommandHandler for Dock {
    fn item_name(&self, ctx: &Context) -> Result<String, ServiceError> {
        ctx.required_member(&[ROLE_VACUUM_DOCK])
    }

    fn convert_value(&self, _ctx: &Context) -> Result<Option<String>, ServiceError> {
        Ok(Some("ON".into()))
    }

    fn response_states(&self, _ctx: &Context) -> Result<Map<String, Value>, ServiceError> {
        Ok(states("isDocked", true))
    }

    fn already_in_state(&self) -> ErrorCode {
        ErrorCode::AlreadyDocked
    }

    fn supports_ack(&self) -> bool {
        true
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Locate {
    #[serde(default)]
    pub silence: bool,
}

impl CommandHandler for Locate {
    fn item_name(&self, ctx: &Context) -> Result<String, ServiceError> {
        ctx.required_member(&[ROLE_VACUUM_LOCATE])
    }

    fn convert_value(&self, _ctx: &Context) -> Result<Option<String>, ServiceError> {
        Ok(Some("ON".into()))
    }

    fn response_states(&self, _ctx: &Context) -> Result<Map<String, Value>, ServiceError> {
        Ok(states("generatedAlert", !self.silence))
    }

    fn check_current_state(&self, _target: &str, _current: &str) -> Result<(), ServiceError> {
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Charge {
    pub charge: bool,
}

impl CommandHandler for Charge {
    fn item_name(&self, ctx: &Context) -> Result<String, ServiceError> {
        ctx.required_member(&[ROLE_CHARGER_CHARGING])
    }

    fn convert_value(&self, _ctx: &Context) -> Result<Option<String>, ServiceError> {
        Ok(Some(on_off_value(self.charge, false)))
    }

    fn response_states(&self, _ctx: &Context) -> Result<Map<String, Value>, ServiceError> {
        Ok(states("isCharging", self.charge))
    }
}
