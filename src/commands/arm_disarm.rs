// Copyright (c) 2026 Unfolded Circle ApS, Markus Zehnder <markus.z@unfoldedcircle.com>
// SPDX-License-Identifier: MPL-2.0

//! Security system `ArmDisarm` command.

use crate::commands::{CommandHandler, Context, on_off_value};
use crate::devices::Family;
use crate::devices::security::{ROLE_ARM_LEVEL, ROLE_ARMED, SecurityState};
use crate::errors::{ErrorCode, ServiceError};
use crate::google::{Device, DeviceResult};
use log::debug;
use serde::Deserialize;
use serde_json::{Map, Value};

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArmDisarm {
    pub arm: bool,
    #[serde(default)]
    pub arm_level: Option<String>,
    #[serde(default)]
    pub cancel: bool,
}

impl ArmDisarm {
    fn level(&self) -> Option<&str> {
        self.arm_level.as_deref().filter(|_| self.arm && !self.cancel)
    }
}

impl CommandHandler for ArmDisarm {
    fn item_name(&self, ctx: &Context) -> Result<String, ServiceError> {
        if self.level().is_some() {
            return ctx.required_member(&[ROLE_ARM_LEVEL]);
        }
        ctx.member_or_device(&[ROLE_ARMED])
    }

    fn convert_value(&self, ctx: &Context) -> Result<Option<String>, ServiceError> {
        if let Some(level) = self.level() {
            return Ok(Some(level.to_string()));
        }
        let arm = self.arm && !self.cancel;
        Ok(Some(on_off_value(arm, ctx.inverted())))
    }

    fn response_states(&self, _ctx: &Context) -> Result<Map<String, Value>, ServiceError> {
        let mut states = Map::new();
        match self.level() {
            Some(level) => {
                states.insert("isArmed".into(), true.into());
                states.insert("currentArmLevel".into(), level.into());
            }
            None => {
                states.insert("isArmed".into(), (self.arm && !self.cancel).into());
            }
        }
        Ok(states)
    }

    fn already_in_state(&self) -> ErrorCode {
        if self.level().is_some() {
            ErrorCode::AlreadyInState
        } else if self.arm && !self.cancel {
            ErrorCode::AlreadyArmed
        } else {
            ErrorCode::AlreadyDisarmed
        }
    }

    fn bypass_pin(&self, device: &Device) -> bool {
        device.custom_data.pin_on_disarm_only && self.arm && !self.cancel
    }

    fn supports_ack(&self) -> bool {
        true
    }

    fn requires_update_validation(&self, ctx: &Context) -> bool {
        ctx.family() == Some(Family::SecuritySystem)
    }

    fn validate_update(&self, ctx: &Context) -> Result<Option<DeviceResult>, ServiceError> {
        let item = ctx.item()?;
        let state = SecurityState::from_item(item);
        let arm = self.arm && !self.cancel;
        debug!("[{}] Validating security system state {state:?}", ctx.device.id);

        let wrong_level = self
            .level()
            .is_some_and(|level| state.arm_level.as_deref() != Some(level));
        if arm && (!state.is_armed || wrong_level) {
            if state.status_report.is_empty() {
                return Err(ServiceError::with_msg(
                    ErrorCode::ArmFailure,
                    format!("{} could not be armed", ctx.device.id),
                ));
            }
            let mut states = state.to_state();
            states.insert("online".into(), true.into());
            return Ok(Some(DeviceResult::exceptions(ctx.device.id.clone(), states)));
        }
        if !arm && state.is_armed {
            return Err(ServiceError::with_msg(
                ErrorCode::DisarmFailure,
                format!("{} could not be disarmed", ctx.device.id),
            ));
        }
        Ok(None)
    }
}
