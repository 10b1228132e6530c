// Copyright (c) 2026 Unfolded Circle ApS, Markus Zehnder <markus.z@unfoldedcircle.com>
// SPDX-License-Identifier: MPL-2.0

//! Open / close and slat rotation commands.

use crate::commands::{CommandHandler, Context, on_off_value};
use crate::devices::open_close::{
    ROLE_OPEN_PERCENT, ROLE_ROTATION_PERCENT, degrees_to_percent, percent_to_degrees,
    rotation_range,
};
use crate::errors::{ErrorCode, ServiceError};
use crate::util::json::{number, number_string};
use serde::Deserialize;
use serde_json::{Map, Value};

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenClose {
    pub open_percent: f64,
}

impl OpenClose {
    fn percent(&self) -> f64 {
        self.open_percent.clamp(0.0, 100.0).round()
    }
}

impl CommandHandler for OpenClose {
    fn requires_item(&self, ctx: &Context) -> bool {
        ctx.has_members()
    }

    fn item_name(&self, ctx: &Context) -> Result<String, ServiceError> {
        ctx.member_or_device(&[ROLE_OPEN_PERCENT])
    }

    fn convert_value(&self, ctx: &Context) -> Result<Option<String>, ServiceError> {
        let item_type = match ctx.member_item(ROLE_OPEN_PERCENT) {
            Some(member) => member.base_type(),
            None => ctx.item_type(),
        };
        let percent = self.percent();
        let inverted = ctx.inverted();

        let value = match item_type {
            "Rollershutter" => match (percent as u8, inverted) {
                (0, false) | (100, true) => "DOWN".to_string(),
                (100, false) | (0, true) => "UP".to_string(),
                // hub rollershutters are 0 when open
                (_, false) => number_string(100.0 - percent),
                (_, true) => number_string(percent),
            },
            "Switch" => on_off_value(percent > 0.0, inverted),
            "Dimmer" | "Number" if inverted => number_string(100.0 - percent),
            "Dimmer" | "Number" => number_string(percent),
            _ => {
                return Err(ServiceError::not_supported(format!(
                    "{} is a query only {item_type} item",
                    ctx.device.id
                )));
            }
        };
        Ok(Some(value))
    }

    fn response_states(&self, _ctx: &Context) -> Result<Map<String, Value>, ServiceError> {
        let mut states = Map::new();
        states.insert("openPercent".into(), number(self.percent()));
        Ok(states)
    }

    fn already_in_state(&self) -> ErrorCode {
        if self.percent() == 0.0 {
            ErrorCode::AlreadyClosed
        } else {
            ErrorCode::AlreadyOpen
        }
    }

    fn supports_ack(&self) -> bool {
        true
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RotateAbsolute {
    #[serde(default)]
    pub rotation_degrees: Option<f64>,
    #[serde(default)]
    pub rotation_percent: Option<f64>,
}

impl RotateAbsolute {
    pub fn is_valid(&self) -> bool {
        self.rotation_degrees.is_some() || self.rotation_percent.is_some()
    }

    /// Rotation in percent and degrees.
    fn rotation(&self, ctx: &Context) -> Result<(f64, f64), ServiceError> {
        let range = rotation_range(ctx.item()?);
        match (self.rotation_percent, self.rotation_degrees) {
            (Some(percent), _) => {
                let percent = percent.clamp(0.0, 100.0).round();
                Ok((percent, percent_to_degrees(percent, range)))
            }
            (None, Some(degrees)) => {
                let percent = degrees_to_percent(degrees, range);
                Ok((percent, percent_to_degrees(percent, range)))
            }
            (None, None) => Err(ServiceError::not_supported("Missing rotation value")),
        }
    }
}

impl CommandHandler for RotateAbsolute {
    fn requires_item(&self, _ctx: &Context) -> bool {
        true
    }

    fn item_name(&self, ctx: &Context) -> Result<String, ServiceError> {
        ctx.required_member(&[ROLE_ROTATION_PERCENT])
    }

    fn convert_value(&self, ctx: &Context) -> Result<Option<String>, ServiceError> {
        let (percent, _) = self.rotation(ctx)?;
        Ok(Some(number_string(percent)))
    }

    fn response_states(&self, ctx: &Context) -> Result<Map<String, Value>, ServiceError> {
        let (percent, degrees) = self.rotation(ctx)?;
        let mut states = Map::new();
        states.insert("rotationPercent".into(), number(percent));
        states.insert("rotationDegrees".into(), number(degrees));
        Ok(states)
    }
}
