// Copyright (c) 2026 Unfolded Circle ApS, Markus Zehnder <markus.z@unfoldedcircle.com>
// SPDX-License-Identifier: MPL-2.0

//! TV and speaker commands: volume, inputs, channels, applications and transport control.

use crate::client::Item;
use crate::commands::{CommandHandler, Context, on_off_value, states};
use crate::devices::media::{
    ROLE_APPLICATION, ROLE_CHANNEL, ROLE_INPUT, ROLE_MUTE, ROLE_TRANSPORT, ROLE_VOLUME,
    applications, channels, find_entry, inputs, volume_max_level,
};
use crate::errors::{ErrorCode, ServiceError};
use crate::util::json::{number, number_string};
use crate::util::parse::{ListEntry, parse_number};
use serde::Deserialize;
use serde_json::{Map, Value};
use strum::AsRefStr;

/// Item holding the volume: the volume member of a TV or the speaker item itself.
fn volume_item<'a>(ctx: &Context<'a>) -> Result<&'a Item, ServiceError> {
    if let Some(member) = ctx.member_item(ROLE_VOLUME) {
        return Ok(member);
    }
    if ctx.has_members() {
        return Err(ServiceError::not_supported(format!(
            "{}: missing member {ROLE_VOLUME}",
            ctx.device.id
        )));
    }
    ctx.item()
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetVolume {
    pub volume_level: f64,
}

impl SetVolume {
    fn level(&self) -> f64 {
        self.volume_level.max(0.0).round()
    }
}

impl CommandHandler for SetVolume {
    fn item_name(&self, ctx: &Context) -> Result<String, ServiceError> {
        ctx.member_or_device(&[ROLE_VOLUME])
    }

    fn convert_value(&self, _ctx: &Context) -> Result<Option<String>, ServiceError> {
        Ok(Some(number_string(self.level())))
    }

    fn response_states(&self, _ctx: &Context) -> Result<Map<String, Value>, ServiceError> {
        Ok(states("currentVolume", number(self.level())))
    }

    fn already_in_state(&self) -> ErrorCode {
        let level = self.level();
        if level <= 0.0 {
            ErrorCode::VolumeAlreadyMin
        } else if level >= 100.0 {
            ErrorCode::VolumeAlreadyMax
        } else {
            ErrorCode::AlreadyInState
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VolumeRelative {
    pub relative_steps: i64,
}

impl VolumeRelative {
    fn target_volume(&self, ctx: &Context) -> Result<f64, ServiceError> {
        let item = volume_item(ctx)?;
        let max = volume_max_level(ctx.item()?);
        let current = item.number().unwrap_or_default();

        if self.relative_steps > 0 && current >= max {
            return Err(ServiceError::code(ErrorCode::VolumeAlreadyMax));
        }
        if self.relative_steps < 0 && current <= 0.0 {
            return Err(ServiceError::code(ErrorCode::VolumeAlreadyMin));
        }
        Ok((current + self.relative_steps as f64).clamp(0.0, max))
    }
}

impl CommandHandler for VolumeRelative {
    fn requires_item(&self, _ctx: &Context) -> bool {
        true
    }

    fn item_name(&self, ctx: &Context) -> Result<String, ServiceError> {
        ctx.member_or_device(&[ROLE_VOLUME])
    }

    fn convert_value(&self, ctx: &Context) -> Result<Option<String>, ServiceError> {
        Ok(Some(number_string(self.target_volume(ctx)?)))
    }

    fn response_states(&self, ctx: &Context) -> Result<Map<String, Value>, ServiceError> {
        Ok(states("currentVolume", number(self.target_volume(ctx)?)))
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Mute {
    pub mute: bool,
}

impl CommandHandler for Mute {
    fn item_name(&self, ctx: &Context) -> Result<String, ServiceError> {
        ctx.required_member(&[ROLE_MUTE])
    }

    fn convert_value(&self, _ctx: &Context) -> Result<Option<String>, ServiceError> {
        Ok(Some(on_off_value(self.mute, false)))
    }

    fn response_states(&self, _ctx: &Context) -> Result<Map<String, Value>, ServiceError> {
        Ok(states("isMuted", self.mute))
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetInput {
    pub new_input: String,
}

impl SetInput {
    fn input(&self, ctx: &Context) -> Result<String, ServiceError> {
        let inputs = inputs(ctx.item()?);
        find_entry(&inputs, &self.new_input)
            .map(|e| e.key.clone())
            .ok_or_else(|| {
                ServiceError::not_supported(format!("Unknown input {}", self.new_input))
            })
    }
}

impl CommandHandler for SetInput {
    fn requires_item(&self, _ctx: &Context) -> bool {
        true
    }

    fn item_name(&self, ctx: &Context) -> Result<String, ServiceError> {
        ctx.required_member(&[ROLE_INPUT])
    }

    fn convert_value(&self, ctx: &Context) -> Result<Option<String>, ServiceError> {
        self.input(ctx).map(Some)
    }

    fn response_states(&self, ctx: &Context) -> Result<Map<String, Value>, ServiceError> {
        Ok(states("currentInput", self.input(ctx)?))
    }
}

/// Step through a list, wrapping around at both ends. Starts at the first entry if the current
/// key is unknown.
fn step<'a>(entries: &'a [ListEntry], current: &str, steps: i64) -> Option<&'a ListEntry> {
    if entries.is_empty() {
        return None;
    }
    let len = entries.len() as i64;
    let index = match entries.iter().position(|e| e.key == current) {
        Some(index) => (index as i64 + steps.rem_euclid(len)).rem_euclid(len),
        None => 0,
    };
    entries.get(index as usize)
}

/// `NextInput` and `PreviousInput`.
#[derive(Debug, Clone, PartialEq)]
pub struct NextInput {
    pub next: bool,
}

impl NextInput {
    fn input(&self, ctx: &Context) -> Result<String, ServiceError> {
        let inputs = inputs(ctx.item()?);
        let current = ctx
            .member_item(ROLE_INPUT)
            .map(|i| i.state.as_str())
            .unwrap_or_default();
        step(&inputs, current, if self.next { 1 } else { -1 })
            .map(|e| e.key.clone())
            .ok_or_else(|| ServiceError::not_supported("No inputs configured"))
    }
}

impl CommandHandler for NextInput {
    fn requires_item(&self, _ctx: &Context) -> bool {
        true
    }

    fn item_name(&self, ctx: &Context) -> Result<String, ServiceError> {
        ctx.required_member(&[ROLE_INPUT])
    }

    fn convert_value(&self, ctx: &Context) -> Result<Option<String>, ServiceError> {
        self.input(ctx).map(Some)
    }

    fn response_states(&self, ctx: &Context) -> Result<Map<String, Value>, ServiceError> {
        Ok(states("currentInput", self.input(ctx)?))
    }

    fn check_current_state(&self, _target: &str, _current: &str) -> Result<(), ServiceError> {
        Ok(())
    }
}

fn no_channel(channel: &str) -> ServiceError {
    ServiceError::with_msg(
        ErrorCode::NoAvailableChannel,
        format!("Channel {channel} is not available"),
    )
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectChannel {
    #[serde(default)]
    pub channel_code: Option<String>,
    #[serde(default)]
    pub channel_name: Option<String>,
    #[serde(default)]
    pub channel_number: Option<String>,
}

impl SelectChannel {
    pub fn is_valid(&self) -> bool {
        self.channel_code.is_some() || self.channel_name.is_some() || self.channel_number.is_some()
    }

    /// Channel number and name, if known.
    fn channel(&self, ctx: &Context) -> Result<(String, Option<String>), ServiceError> {
        let channels = match ctx.item {
            Some(item) => channels(item),
            None => Vec::new(),
        };
        if let Some(number) = &self.channel_number {
            let name = channels
                .iter()
                .find(|c| &c.key == number)
                .map(|c| c.first_value().to_string());
            return Ok((number.clone(), name));
        }
        let requested = self
            .channel_code
            .as_deref()
            .or(self.channel_name.as_deref())
            .unwrap_or_default();
        find_entry(&channels, requested)
            .map(|c| (c.key.clone(), Some(c.first_value().to_string())))
            .ok_or_else(|| no_channel(requested))
    }
}

impl CommandHandler for SelectChannel {
    fn requires_item(&self, _ctx: &Context) -> bool {
        // the channel map is only needed to resolve codes and names
        self.channel_number.is_none()
    }

    fn item_name(&self, ctx: &Context) -> Result<String, ServiceError> {
        ctx.required_member(&[ROLE_CHANNEL])
    }

    fn convert_value(&self, ctx: &Context) -> Result<Option<String>, ServiceError> {
        self.channel(ctx).map(|(number, _)| Some(number))
    }

    fn response_states(&self, ctx: &Context) -> Result<Map<String, Value>, ServiceError> {
        let (number, name) = self.channel(ctx)?;
        let mut states = states("channelNumber", number);
        if let Some(name) = name {
            states.insert("channelName".into(), name.into());
        }
        Ok(states)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelativeChannel {
    pub relative_channel_change: i64,
}

impl RelativeChannel {
    fn channel(&self, ctx: &Context) -> Result<String, ServiceError> {
        let channels = channels(ctx.item()?);
        let current = ctx
            .member_item(ROLE_CHANNEL)
            .map(|c| c.state.as_str())
            .unwrap_or_default();

        if channels.iter().any(|c| c.key == current) {
            return step(&channels, current, self.relative_channel_change)
                .map(|c| c.key.clone())
                .ok_or_else(|| no_channel(current));
        }
        // channel numbers are whole numbers, steps beyond the i64 range have no channel
        let number = parse_number(current)
            .filter(|n| n.fract() == 0.0 && n.abs() < i64::MAX as f64)
            .and_then(|n| (n as i64).checked_add(self.relative_channel_change))
            .ok_or_else(|| no_channel(current))?;
        if number < 1 {
            return Err(no_channel(&number.to_string()));
        }
        Ok(number.to_string())
    }
}

impl CommandHandler for RelativeChannel {
    fn requires_item(&self, _ctx: &Context) -> bool {
        true
    }

    fn item_name(&self, ctx: &Context) -> Result<String, ServiceError> {
        ctx.required_member(&[ROLE_CHANNEL])
    }

    fn convert_value(&self, ctx: &Context) -> Result<Option<String>, ServiceError> {
        self.channel(ctx).map(Some)
    }

    fn response_states(&self, ctx: &Context) -> Result<Map<String, Value>, ServiceError> {
        Ok(states("channelNumber", self.channel(ctx)?))
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppSelect {
    #[serde(default)]
    pub new_application: Option<String>,
    #[serde(default)]
    pub new_application_name: Option<String>,
}

impl AppSelect {
    pub fn is_valid(&self) -> bool {
        self.new_application.is_some() || self.new_application_name.is_some()
    }

    fn application(&self, ctx: &Context) -> Result<String, ServiceError> {
        let applications = applications(ctx.item()?);
        let requested = self
            .new_application
            .as_deref()
            .or(self.new_application_name.as_deref())
            .unwrap_or_default();
        find_entry(&applications, requested)
            .map(|a| a.key.clone())
            .ok_or_else(|| {
                ServiceError::with_msg(
                    ErrorCode::NoAvailableApp,
                    format!("Application {requested} is not available"),
                )
            })
    }
}

impl CommandHandler for AppSelect {
    fn requires_item(&self, _ctx: &Context) -> bool {
        true
    }

    fn item_name(&self, ctx: &Context) -> Result<String, ServiceError> {
        ctx.required_member(&[ROLE_APPLICATION])
    }

    fn convert_value(&self, ctx: &Context) -> Result<Option<String>, ServiceError> {
        self.application(ctx).map(Some)
    }

    fn response_states(&self, ctx: &Context) -> Result<Map<String, Value>, ServiceError> {
        Ok(states("currentApplication", self.application(ctx)?))
    }
}

/// Transport control command with its hub player value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, AsRefStr)]
#[strum(serialize_all = "UPPERCASE")]
pub enum Transport {
    Next,
    Previous,
    Pause,
    #[strum(serialize = "PLAY")]
    Resume,
}

/// `mediaNext`, `mediaPrevious`, `mediaPause` and `mediaResume`.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaControl(pub Transport);

impl CommandHandler for MediaControl {
    fn item_name(&self, ctx: &Context) -> Result<String, ServiceError> {
        ctx.required_member(&[ROLE_TRANSPORT])
    }

    fn convert_value(&self, _ctx: &Context) -> Result<Option<String>, ServiceError> {
        Ok(Some(self.0.as_ref().to_string()))
    }

    fn response_states(&self, _ctx: &Context) -> Result<Map<String, Value>, ServiceError> {
        Ok(Map::new())
    }

    fn check_current_state(&self, _target: &str, _current: &str) -> Result<(), ServiceError> {
        Ok(())
    }
}
