// Copyright (c) 2026 Unfolded Circle ApS, Markus Zehnder <markus.z@unfoldedcircle.com>
// SPDX-License-Identifier: MPL-2.0

//! Fans, air purifiers, hoods, humidifiers and dehumidifiers.
//!
//! Fan speeds are supported as a percentage and, if the `speeds` configuration is present, as
//! named speeds. The key of a named speed is the value sent to the hub.

use crate::client::Item;
use crate::devices::{Members, is_on, lang};
use crate::google::Trait;
use crate::util::json::number;
use crate::util::parse::{ListEntry, parse_list};
use serde_json::{Map, Value, json};

pub const ROLE_FAN_POWER: &str = "fanPower";
pub const ROLE_FAN_SPEED: &str = "fanSpeed";
pub const ROLE_FAN_MODE: &str = "fanMode";
pub const ROLE_FAN_FILTER_LIFE_TIME: &str = "fanFilterLifeTime";
pub const ROLE_FAN_PM25: &str = "fanPM25";

pub(super) const FAN_ROLES: &[&str] = &[
    ROLE_FAN_POWER,
    ROLE_FAN_SPEED,
    ROLE_FAN_MODE,
    ROLE_FAN_FILTER_LIFE_TIME,
    ROLE_FAN_PM25,
];

pub const ROLE_HUMIDIFIER_POWER: &str = "humidifierPower";
pub const ROLE_HUMIDIFIER_HUMIDITY: &str = "humidifierHumidity";
pub const ROLE_HUMIDIFIER_HUMIDITY_AMBIENT: &str = "humidifierHumidityAmbient";
pub const ROLE_HUMIDIFIER_FAN_SPEED: &str = "humidifierFanSpeed";
pub const ROLE_HUMIDIFIER_MODE: &str = "humidifierMode";

pub(super) const HUMIDIFIER_ROLES: &[&str] = &[
    ROLE_HUMIDIFIER_POWER,
    ROLE_HUMIDIFIER_HUMIDITY,
    ROLE_HUMIDIFIER_HUMIDITY_AMBIENT,
    ROLE_HUMIDIFIER_FAN_SPEED,
    ROLE_HUMIDIFIER_MODE,
];

/// Hub value of 100 % humidity if `maxHumidity` is not configured.
pub const DEF_MAX_HUMIDITY: f64 = 100.0;
const DEF_MODE_NAME: &str = "mode";

/// Named fan speeds from `speeds="0=off:zero,50=medium,100=high:full"`.
pub fn speeds(item: &Item) -> Vec<ListEntry> {
    item.config()
        .str("speeds")
        .map(parse_list)
        .unwrap_or_default()
}

/// Hub scale of 100 % relative humidity.
pub fn max_humidity(item: &Item) -> f64 {
    item.config()
        .f64("maxHumidity")
        .filter(|v| *v > 0.0)
        .unwrap_or(DEF_MAX_HUMIDITY)
}

/// Mode name with synonyms from `modeName="mode:Program"`. The first value is the mode name.
pub fn mode_name(item: &Item) -> ListEntry {
    item.config()
        .str("modeName")
        .map(|name| {
            let values: Vec<String> = name
                .split(':')
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(String::from)
                .collect();
            ListEntry {
                key: values.first().cloned().unwrap_or_else(|| DEF_MODE_NAME.into()),
                values,
            }
        })
        .unwrap_or_else(|| ListEntry {
            key: DEF_MODE_NAME.into(),
            values: vec![DEF_MODE_NAME.into()],
        })
}

/// `availableModes` attribute of the `Modes` trait with a single mode.
pub(super) fn available_modes(item: &Item, settings: &[ListEntry]) -> Value {
    let lang = lang(item);
    let mode = mode_name(item);
    let settings: Vec<Value> = settings
        .iter()
        .map(|s| {
            json!({
                "setting_name": s.key,
                "setting_values": [{ "setting_synonym": s.values, "lang": lang }]
            })
        })
        .collect();
    json!([{
        "name": mode.key,
        "name_values": [{ "name_synonym": mode.values, "lang": lang }],
        "settings": settings,
        "ordered": item.config().bool("ordered")
    }])
}

fn mode_settings(item: &Item) -> Vec<ListEntry> {
    item.config()
        .str("modeSettings")
        .map(parse_list)
        .unwrap_or_default()
}

fn fan_speed_attributes(item: &Item) -> Map<String, Value> {
    let mut attributes = Map::new();
    let speeds = speeds(item);
    if !speeds.is_empty() {
        let lang = lang(item);
        let speeds: Vec<Value> = speeds
            .iter()
            .map(|s| {
                json!({
                    "speed_name": s.key,
                    "speed_values": [{ "speed_synonym": s.values, "lang": lang }]
                })
            })
            .collect();
        attributes.insert(
            "availableFanSpeeds".into(),
            json!({ "speeds": speeds, "ordered": item.config().bool("ordered") }),
        );
    }
    attributes.insert("reversible".into(), false.into());
    attributes.insert("supportsFanSpeedPercent".into(), true.into());
    attributes
}

fn fan_speed_state(item: &Item, speed: &Item) -> Map<String, Value> {
    let mut state = Map::new();
    if let Some(percent) = speed.number() {
        state.insert("currentFanSpeedPercent".into(), number(percent));
    }
    if speed.has_state() && speeds(item).iter().any(|s| s.key == speed.state) {
        state.insert("currentFanSpeedSetting".into(), speed.state.as_str().into());
    }
    state
}

fn mode_state(item: &Item, mode: &Item) -> Map<String, Value> {
    let mut state = Map::new();
    if mode.has_state() {
        let mut settings = Map::new();
        settings.insert(mode_name(item).key, mode.state.as_str().into());
        state.insert("currentModeSettings".into(), Value::Object(settings));
    }
    state
}

fn is_single_speed_item(item: &Item, members: &Members) -> bool {
    members.is_empty() && matches!(item.base_type(), "Dimmer" | "Number")
}

pub(super) fn fan_traits(item: &Item, members: &Members) -> Vec<Trait> {
    if members.is_empty() {
        return if is_single_speed_item(item, members) {
            vec![Trait::OnOff, Trait::FanSpeed]
        } else {
            vec![Trait::OnOff]
        };
    }
    let mut traits = Vec::with_capacity(4);
    if members.has(ROLE_FAN_POWER) || members.has(ROLE_FAN_SPEED) {
        traits.push(Trait::OnOff);
    }
    if members.has(ROLE_FAN_SPEED) {
        traits.push(Trait::FanSpeed);
    }
    if members.has(ROLE_FAN_MODE) {
        traits.push(Trait::Modes);
    }
    if members.has(ROLE_FAN_FILTER_LIFE_TIME) || members.has(ROLE_FAN_PM25) {
        traits.push(Trait::SensorState);
    }
    traits
}

pub(super) fn fan_attributes(item: &Item, members: &Members) -> Map<String, Value> {
    let mut attributes = Map::new();
    if is_single_speed_item(item, members) || members.has(ROLE_FAN_SPEED) {
        attributes.extend(fan_speed_attributes(item));
    }
    if members.has(ROLE_FAN_MODE) {
        attributes.insert("availableModes".into(), available_modes(item, &mode_settings(item)));
    }
    let mut sensors = Vec::new();
    if members.has(ROLE_FAN_FILTER_LIFE_TIME) {
        sensors.push(json!({
            "name": "FilterLifeTime",
            "numericCapabilities": { "rawValueUnit": "PERCENTAGE" }
        }));
    }
    if members.has(ROLE_FAN_PM25) {
        sensors.push(json!({
            "name": "PM2.5",
            "numericCapabilities": { "rawValueUnit": "MICROGRAMS_PER_CUBIC_METER" }
        }));
    }
    if !sensors.is_empty() {
        attributes.insert("sensorStatesSupported".into(), sensors.into());
    }
    attributes
}

pub(super) fn fan_state(item: &Item, members: &Members) -> Map<String, Value> {
    let mut state = Map::new();
    if members.is_empty() {
        state.insert("on".into(), is_on(item).into());
        if is_single_speed_item(item, members) {
            state.extend(fan_speed_state(item, item));
        }
        return state;
    }

    let power = members.get(ROLE_FAN_POWER).or(members.get(ROLE_FAN_SPEED));
    if let Some(power) = power {
        state.insert("on".into(), is_on(power).into());
    }
    if let Some(speed) = members.get(ROLE_FAN_SPEED) {
        state.extend(fan_speed_state(item, speed));
    }
    if let Some(mode) = members.get(ROLE_FAN_MODE) {
        state.extend(mode_state(item, mode));
    }
    let mut sensors = Vec::new();
    for (role, name) in [(ROLE_FAN_FILTER_LIFE_TIME, "FilterLifeTime"), (ROLE_FAN_PM25, "PM2.5")] {
        if let Some(value) = members.get(role).and_then(Item::number) {
            sensors.push(json!({ "name": name, "rawValue": number(value) }));
        }
    }
    if !sensors.is_empty() {
        state.insert("currentSensorStateData".into(), sensors.into());
    }
    state
}

pub(super) fn humidifier_traits(members: &Members) -> Vec<Trait> {
    if members.is_empty() {
        return vec![Trait::HumiditySetting];
    }
    let mut traits = Vec::with_capacity(4);
    if members.has(ROLE_HUMIDIFIER_POWER) {
        traits.push(Trait::OnOff);
    }
    if members.has(ROLE_HUMIDIFIER_HUMIDITY) || members.has(ROLE_HUMIDIFIER_HUMIDITY_AMBIENT) {
        traits.push(Trait::HumiditySetting);
    }
    if members.has(ROLE_HUMIDIFIER_FAN_SPEED) {
        traits.push(Trait::FanSpeed);
    }
    if members.has(ROLE_HUMIDIFIER_MODE) {
        traits.push(Trait::Modes);
    }
    traits
}

pub(super) fn humidifier_attributes(item: &Item, members: &Members) -> Map<String, Value> {
    let mut attributes = Map::new();
    let setpoint = members.is_empty() || members.has(ROLE_HUMIDIFIER_HUMIDITY);
    if setpoint {
        let min = item
            .config()
            .f64("minHumidity")
            .unwrap_or_default()
            .clamp(0.0, 100.0);
        attributes.insert(
            "humiditySetpointRange".into(),
            json!({ "minPercent": number(min), "maxPercent": 100 }),
        );
    } else if members.has(ROLE_HUMIDIFIER_HUMIDITY_AMBIENT) {
        attributes.insert("queryOnlyHumiditySetting".into(), true.into());
    }
    if members.has(ROLE_HUMIDIFIER_FAN_SPEED) {
        attributes.extend(fan_speed_attributes(item));
    }
    if members.has(ROLE_HUMIDIFIER_MODE) {
        attributes.insert("availableModes".into(), available_modes(item, &mode_settings(item)));
    }
    attributes
}

/// Hub humidity value as percent of `maxHumidity`.
fn humidity_percent(value: f64, max: f64) -> Value {
    number((value * 100.0 / max).round().clamp(0.0, 100.0))
}

pub(super) fn humidifier_state(item: &Item, members: &Members) -> Map<String, Value> {
    let mut state = Map::new();
    let max = max_humidity(item);
    let setpoint = if members.is_empty() {
        Some(item)
    } else {
        members.get(ROLE_HUMIDIFIER_HUMIDITY)
    };
    if let Some(value) = setpoint.and_then(Item::number) {
        state.insert("humiditySetpointPercent".into(), humidity_percent(value, max));
    }
    if let Some(value) = members
        .get(ROLE_HUMIDIFIER_HUMIDITY_AMBIENT)
        .and_then(Item::number)
    {
        state.insert("humidityAmbientPercent".into(), number(value.round()));
    }
    if let Some(power) = members.get(ROLE_HUMIDIFIER_POWER) {
        state.insert("on".into(), is_on(power).into());
    }
    if let Some(speed) = members.get(ROLE_HUMIDIFIER_FAN_SPEED) {
        state.extend(fan_speed_state(item, speed));
    }
    if let Some(mode) = members.get(ROLE_HUMIDIFIER_MODE) {
        state.extend(mode_state(item, mode));
    }
    state
}
