// Copyright (c) 2026 Unfolded Circle ApS, Markus Zehnder <markus.z@unfoldedcircle.com>
// SPDX-License-Identifier: MPL-2.0

//! Thermostats and temperature / climate sensors.
//!
//! Google always expects Celsius. Items of devices with the `useFahrenheit` configuration or the
//! `Fahrenheit` tag hold Fahrenheit values which are converted in both directions.

use crate::client::Item;
use crate::devices::Members;
use crate::errors::ServiceError;
use crate::google::Trait;
use crate::util::json::number;
use crate::util::parse::{ListEntry, parse_list, parse_range};
use crate::util::temperature::celsius_from_fahrenheit;
use serde_json::{Map, Value, json};

pub const ROLE_MODE: &str = "thermostatMode";
pub const ROLE_SETPOINT: &str = "thermostatTemperatureSetpoint";
pub const ROLE_SETPOINT_HIGH: &str = "thermostatTemperatureSetpointHigh";
pub const ROLE_SETPOINT_LOW: &str = "thermostatTemperatureSetpointLow";
pub const ROLE_AMBIENT: &str = "thermostatTemperatureAmbient";
pub const ROLE_HUMIDITY_AMBIENT: &str = "thermostatHumidityAmbient";

pub(super) const THERMOSTAT_ROLES: &[&str] = &[
    ROLE_MODE,
    ROLE_SETPOINT,
    ROLE_SETPOINT_HIGH,
    ROLE_SETPOINT_LOW,
    ROLE_AMBIENT,
    ROLE_HUMIDITY_AMBIENT,
];

const ROLE_TEMPERATURE_AMBIENT: &str = "temperatureAmbient";
const ROLE_HUMIDITY: &str = "humidityAmbient";

pub(super) const CLIMATE_SENSOR_ROLES: &[&str] = &[ROLE_TEMPERATURE_AMBIENT, ROLE_HUMIDITY];

/// Canonical Google thermostat modes of the default identity mapping.
const DEFAULT_MODES: &[&str] = &["off", "heat", "cool", "on", "heatcool", "auto", "eco"];

/// Google mode reported for an unknown hub mode.
const FALLBACK_MODE: &str = "on";

/// Range reported for query-only temperature sensors.
const SENSOR_TEMPERATURE_RANGE: (f64, f64) = (-100.0, 100.0);

/// The device items hold Fahrenheit values.
pub fn use_fahrenheit(item: &Item) -> bool {
    item.config().bool("useFahrenheit") || item.has_tag("Fahrenheit")
}

/// Convert an item temperature to Celsius.
pub fn to_celsius(value: f64, fahrenheit: bool) -> f64 {
    if fahrenheit {
        celsius_from_fahrenheit(value)
    } else {
        value
    }
}

fn temperature_value(item: &Item, fahrenheit: bool) -> Option<Value> {
    item.number().map(|v| number(to_celsius(v, fahrenheit)))
}

/// Bidirectional mapping of Google thermostat modes to hub mode values.
///
/// Configured with `modes="off=OFF,heat=HEAT:comfort,..."`. Without configuration each Google mode
/// maps to itself.
#[derive(Debug, Clone, PartialEq)]
pub struct ThermostatModes(Vec<ListEntry>);

impl ThermostatModes {
    pub fn from_item(item: &Item) -> Self {
        let modes = item
            .config()
            .str("modes")
            .map(parse_list)
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| {
                DEFAULT_MODES
                    .iter()
                    .map(|m| ListEntry {
                        key: m.to_string(),
                        values: vec![m.to_string()],
                    })
                    .collect()
            });
        Self(modes)
    }

    /// Available Google modes.
    pub fn google_modes(&self) -> Vec<&str> {
        self.0.iter().map(|e| e.key.as_str()).collect()
    }

    /// Translate a hub mode to the first Google mode listing it, `on` if unknown.
    pub fn to_google<'a>(&'a self, hub_mode: &str) -> &'a str {
        let hub_mode = hub_mode.trim();
        self.0
            .iter()
            .find(|e| e.values.iter().any(|v| v.eq_ignore_ascii_case(hub_mode)))
            .map(|e| e.key.as_str())
            .unwrap_or(FALLBACK_MODE)
    }

    /// Translate a Google mode to its first hub mode value.
    pub fn to_hub(&self, google_mode: &str) -> Result<String, ServiceError> {
        self.0
            .iter()
            .find(|e| e.key.eq_ignore_ascii_case(google_mode))
            .map(|e| e.first_value().to_string())
            .ok_or_else(|| {
                ServiceError::not_supported(format!("Thermostat mode not supported: {google_mode}"))
            })
    }
}

pub(super) fn thermostat_attributes(item: &Item, members: &Members) -> Map<String, Value> {
    let config = item.config();
    let fahrenheit = use_fahrenheit(item);
    let mut attributes = Map::new();

    if members.has(ROLE_MODE) {
        let modes = ThermostatModes::from_item(item);
        attributes.insert(
            "availableThermostatModes".into(),
            modes.google_modes().into(),
        );
    }
    attributes.insert(
        "thermostatTemperatureUnit".into(),
        if fahrenheit { "F" } else { "C" }.into(),
    );
    if let Some((min, max)) = config.str("thermostatTemperatureRange").and_then(parse_range) {
        attributes.insert(
            "thermostatTemperatureRange".into(),
            json!({
                "minThresholdCelsius": number(to_celsius(min, fahrenheit)),
                "maxThresholdCelsius": number(to_celsius(max, fahrenheit)),
            }),
        );
    }
    if let Some(buffer) = config.f64("bufferRangeCelsius") {
        attributes.insert("bufferRangeCelsius".into(), number(buffer));
    }
    if !members.has(ROLE_MODE)
        && !members.has(ROLE_SETPOINT)
        && !members.has(ROLE_SETPOINT_HIGH)
        && !members.has(ROLE_SETPOINT_LOW)
    {
        attributes.insert("queryOnlyTemperatureSetting".into(), true.into());
    }
    attributes
}

pub(super) fn thermostat_state(item: &Item, members: &Members) -> Map<String, Value> {
    let fahrenheit = use_fahrenheit(item);
    let mut state = Map::new();

    if let Some(mode) = members.get(ROLE_MODE) {
        let modes = ThermostatModes::from_item(item);
        state.insert("thermostatMode".into(), modes.to_google(&mode.state).into());
    }
    for role in [ROLE_AMBIENT, ROLE_SETPOINT, ROLE_SETPOINT_HIGH, ROLE_SETPOINT_LOW] {
        if let Some(value) = members.get(role).and_then(|m| temperature_value(m, fahrenheit)) {
            state.insert(role.into(), value);
        }
    }
    if let Some(humidity) = members.get(ROLE_HUMIDITY_AMBIENT).and_then(Item::number) {
        state.insert("thermostatHumidityAmbient".into(), number(humidity));
    }
    state
}

fn temperature_control_attributes(item: &Item) -> Map<String, Value> {
    let mut attributes = Map::new();
    let (min, max) = SENSOR_TEMPERATURE_RANGE;
    attributes.insert("queryOnlyTemperatureControl".into(), true.into());
    attributes.insert(
        "temperatureUnitForUX".into(),
        if use_fahrenheit(item) { "F" } else { "C" }.into(),
    );
    attributes.insert(
        "temperatureRange".into(),
        json!({ "minThresholdCelsius": number(min), "maxThresholdCelsius": number(max) }),
    );
    attributes
}

pub(super) fn temperature_sensor_attributes(item: &Item) -> Map<String, Value> {
    temperature_control_attributes(item)
}

pub(super) fn temperature_sensor_state(item: &Item) -> Map<String, Value> {
    let mut state = Map::new();
    let value = temperature_value(item, use_fahrenheit(item)).unwrap_or_else(|| 0.into());
    state.insert("temperatureSetpointCelsius".into(), value.clone());
    state.insert("temperatureAmbientCelsius".into(), value);
    state
}

pub(super) fn climate_sensor_traits(members: &Members) -> Vec<Trait> {
    let mut traits = Vec::with_capacity(2);
    if members.has(ROLE_TEMPERATURE_AMBIENT) {
        traits.push(Trait::TemperatureControl);
    }
    if members.has(ROLE_HUMIDITY) {
        traits.push(Trait::HumiditySetting);
    }
    traits
}

pub(super) fn climate_sensor_attributes(item: &Item, members: &Members) -> Map<String, Value> {
    let mut attributes = Map::new();
    if members.has(ROLE_TEMPERATURE_AMBIENT) {
        attributes.extend(temperature_control_attributes(item));
    }
    if members.has(ROLE_HUMIDITY) {
        attributes.insert("queryOnlyHumiditySetting".into(), true.into());
    }
    attributes
}

pub(super) fn climate_sensor_state(item: &Item, members: &Members) -> Map<String, Value> {
    let mut state = Map::new();
    if let Some(value) = members
        .get(ROLE_TEMPERATURE_AMBIENT)
        .and_then(|m| temperature_value(m, use_fahrenheit(item)))
    {
        state.insert("temperatureSetpointCelsius".into(), value.clone());
        state.insert("temperatureAmbientCelsius".into(), value);
    }
    if let Some(humidity) = members.get(ROLE_HUMIDITY).and_then(Item::number) {
        state.insert("humidityAmbientPercent".into(), number(humidity.round()));
    }
    state
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::devices::find_device_type;
    use crate::devices::tests::{group, item, member};
    use rstest::rstest;

    fn thermostat(config: Value, members: Value) -> Item {
        group("Thermostat", "Thermostat", config, members)
    }

    #[rstest]
    #[case("heat", "heat")]
    #[case("HEAT", "heat")]
    #[case("eco", "eco")]
    #[case("unknown", "on")]
    fn default_modes_to_google(#[case] hub: &str, #[case] expected: &str) {
        let item = thermostat(json!({}), json!([]));
        assert_eq!(expected, ThermostatModes::from_item(&item).to_google(hub));
    }

    #[test]
    fn configured_modes() {
        let item = thermostat(
            json!({"modes": "off=OFF:WINDOW_OPEN,heat=COMFORT:BOOST,eco=ECO,on=ON"}),
            json!([]),
        );
        let modes = ThermostatModes::from_item(&item);
        assert_eq!(vec!["off", "heat", "eco", "on"], modes.google_modes());
        assert_eq!("off", modes.to_google("WINDOW_OPEN"));
        assert_eq!("heat", modes.to_google("BOOST"));
        assert_eq!("on", modes.to_google("MANUAL"));
        assert_eq!(Ok("COMFORT".to_string()), modes.to_hub("heat"));
        assert_eq!(
            Some(crate::errors::ErrorCode::NotSupported),
            modes.to_hub("cool").err().map(|e| e.error_code())
        );
    }

    #[test]
    fn thermostat_state_in_celsius() {
        let item = thermostat(
            json!({}),
            json!([
                member("Mode", "String", "thermostatMode", "heat"),
                member("Setpoint", "Number:Temperature", "thermostatTemperatureSetpoint", "21.5 °C"),
                member("Ambient", "Number", "thermostatTemperatureAmbient", "19"),
                member("Humidity", "Number", "thermostatHumidityAmbient", "45"),
            ]),
        );
        let device = find_device_type(&item).expect("no device type");
        assert_eq!(
            json!({
                "thermostatMode": "heat",
                "thermostatTemperatureSetpoint": 21.5,
                "thermostatTemperatureAmbient": 19,
                "thermostatHumidityAmbient": 45
            }),
            Value::Object(device.state(&item))
        );
    }

    #[test]
    fn thermostat_state_from_fahrenheit() {
        let item = thermostat(
            json!({"useFahrenheit": true}),
            json!([
                member("Setpoint", "Number", "thermostatTemperatureSetpoint", "68"),
                member("Ambient", "Number", "thermostatTemperatureAmbient", "70"),
            ]),
        );
        let device = find_device_type(&item).expect("no device type");
        let state = device.state(&item);
        assert_eq!(Some(&json!(20)), state.get("thermostatTemperatureSetpoint"));
        assert_eq!(Some(&json!(21.1)), state.get("thermostatTemperatureAmbient"));
    }

    #[test]
    fn thermostat_attributes() {
        let item = thermostat(
            json!({
                "useFahrenheit": true,
                "modes": "off=OFF,heat=HEAT",
                "thermostatTemperatureRange": "50,86",
                "bufferRangeCelsius": 2
            }),
            json!([member("Mode", "String", "thermostatMode", "OFF")]),
        );
        let device = find_device_type(&item).expect("no device type");
        assert_eq!(
            json!({
                "availableThermostatModes": ["off", "heat"],
                "thermostatTemperatureUnit": "F",
                "thermostatTemperatureRange": { "minThresholdCelsius": 10, "maxThresholdCelsius": 30 },
                "bufferRangeCelsius": 2
            }),
            Value::Object(device.attributes(&item))
        );
    }

    #[test]
    fn thermostat_without_setpoint_is_query_only() {
        let item = item(json!({
            "name": "Thermostat", "type": "Group", "tags": ["Fahrenheit"],
            "metadata": { "ga": { "value": "Thermostat" } },
            "members": [member("Ambient", "Number", "thermostatTemperatureAmbient", "70")]
        }));
        let device = find_device_type(&item).expect("no device type");
        assert_eq!(
            json!({"thermostatTemperatureUnit": "F", "queryOnlyTemperatureSetting": true}),
            Value::Object(device.attributes(&item))
        );
    }

    #[test]
    fn temperature_sensor() {
        let item = item(json!({
            "name": "Outside", "type": "Number:Temperature", "state": "-3.5 °C",
            "metadata": { "ga": { "value": "TemperatureSensor" } }
        }));
        let device = find_device_type(&item).expect("no device type");
        assert_eq!(vec![Trait::TemperatureControl], device.traits(&item));
        assert_eq!(
            json!({"temperatureSetpointCelsius": -3.5, "temperatureAmbientCelsius": -3.5}),
            Value::Object(device.state(&item))
        );
        assert_eq!(
            json!({
                "queryOnlyTemperatureControl": true,
                "temperatureUnitForUX": "C",
                "temperatureRange": { "minThresholdCelsius": -100, "maxThresholdCelsius": 100 }
            }),
            Value::Object(device.attributes(&item))
        );
    }

    #[test]
    fn climate_sensor() {
        let item = group(
            "Climate",
            "ClimateSensor",
            json!({}),
            json!([
                member("Temperature", "Number", "temperatureAmbient", "22.3"),
                member("Humidity", "Number", "humidityAmbient", "51.6"),
            ]),
        );
        let device = find_device_type(&item).expect("no device type");
        assert_eq!(
            vec![Trait::TemperatureControl, Trait::HumiditySetting],
            device.traits(&item)
        );
        assert_eq!(
            json!({
                "temperatureSetpointCelsius": 22.3,
                "temperatureAmbientCelsius": 22.3,
                "humidityAmbientPercent": 52
            }),
            Value::Object(device.state(&item))
        );
        assert_eq!(
            Some(&json!(true)),
            device.attributes(&item).get("queryOnlyHumiditySetting")
        );
    }
}
