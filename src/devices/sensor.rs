// Copyright (c) 2026 Unfolded Circle ApS, Markus Zehnder <markus.z@unfoldedcircle.com>
// SPDX-License-Identifier: MPL-2.0

//! Generic sensors and cameras.

use crate::client::Item;
use crate::util::json::number;
use crate::util::parse::{parse_list, parse_values};
use serde_json::{Map, Value, json};

const DEF_CAMERA_PROTOCOLS: &str = "hls,dash,smooth_stream,progressive_mp4";

/// A generic sensor needs a configured `sensorName`.
pub(super) fn is_compatible(item: &Item) -> bool {
    item.config().str("sensorName").is_some()
}

pub(super) fn sensor_attributes(item: &Item) -> Map<String, Value> {
    let config = item.config();
    let mut sensor = Map::new();
    sensor.insert("name".into(), config.str("sensorName").unwrap_or_default().into());

    // `states="good=0:10,moderate=50,poor=90"`: key is the Google state, values are hub states
    let states = config.str("states").map(parse_list).unwrap_or_default();
    if !states.is_empty() {
        let names: Vec<&str> = states.iter().map(|s| s.key.as_str()).collect();
        sensor.insert(
            "descriptiveCapabilities".into(),
            json!({ "availableStates": names }),
        );
    }
    if let Some(unit) = config.str("valueUnit") {
        sensor.insert(
            "numericCapabilities".into(),
            json!({ "rawValueUnit": unit }),
        );
    }

    let mut attributes = Map::new();
    attributes.insert(
        "sensorStatesSupported".into(),
        json!([Value::Object(sensor)]),
    );
    attributes
}

pub(super) fn sensor_state(item: &Item) -> Map<String, Value> {
    let config = item.config();
    let mut data = Map::new();
    data.insert("name".into(), config.str("sensorName").unwrap_or_default().into());

    let states = config.str("states").map(parse_list).unwrap_or_default();
    if let Some(current) = states
        .iter()
        .find(|s| s.values.iter().any(|v| v.eq_ignore_ascii_case(item.state.trim())))
    {
        data.insert("currentSensorState".into(), current.key.as_str().into());
    }
    if let Some(value) = item.number() {
        data.insert("rawValue".into(), number(value));
    }

    let mut state = Map::new();
    state.insert("currentSensorStateData".into(), json!([Value::Object(data)]));
    state
}

/// Supported stream protocols from the `protocols` configuration.
pub fn camera_protocols(item: &Item) -> Vec<String> {
    parse_values(item.config().str("protocols").unwrap_or(DEF_CAMERA_PROTOCOLS))
}

pub(super) fn camera_attributes(item: &Item) -> Map<String, Value> {
    let config = item.config();
    let mut attributes = Map::new();
    attributes.insert(
        "cameraStreamSupportedProtocols".into(),
        camera_protocols(item).into(),
    );
    attributes.insert(
        "cameraStreamNeedAuthToken".into(),
        config.contains("token").into(),
    );
    attributes.insert("cameraStreamNeedDrmEncryption".into(), false.into());
    attributes
}

#[cfg(test)]
mod tests {
    use crate::devices::find_device_type;
    use crate::devices::tests::item;
    use serde_json::{Value, json};

    fn sensor(state: &str, config: Value) -> crate::client::Item {
        item(json!({
            "name": "AirQuality", "type": "Number", "state": state,
            "metadata": { "ga": { "value": "Sensor", "config": config } }
        }))
    }

    #[test]
    fn sensor_requires_name() {
        assert!(find_device_type(&sensor("10", json!({}))).is_none());
    }

    #[test]
    fn sensor_with_states_and_unit() {
        let item = sensor(
            "50",
            json!({"sensorName": "AirQuality", "valueUnit": "AQI", "states": "healthy=10,moderate=50,unhealthy=100"}),
        );
        let device = find_device_type(&item).expect("no device type");
        assert_eq!("Sensor", device.name);
        assert_eq!(
            json!({
                "sensorStatesSupported": [{
                    "name": "AirQuality",
                    "descriptiveCapabilities": { "availableStates": ["healthy", "moderate", "unhealthy"] },
                    "numericCapabilities": { "rawValueUnit": "AQI" }
                }]
            }),
            Value::Object(device.attributes(&item))
        );
        assert_eq!(
            json!({
                "currentSensorStateData": [{
                    "name": "AirQuality",
                    "currentSensorState": "moderate",
                    "rawValue": 50
                }]
            }),
            Value::Object(device.state(&item))
        );
    }

    #[test]
    fn sensor_without_matching_state() {
        let item = sensor("42", json!({"sensorName": "FilterLifeTime"}));
        let device = find_device_type(&item).expect("no device type");
        assert_eq!(
            json!({"currentSensorStateData": [{ "name": "FilterLifeTime", "rawValue": 42 }]}),
            Value::Object(device.state(&item))
        );
    }

    #[test]
    fn camera_attributes() {
        let camera = item(json!({
            "name": "Cam", "type": "String", "state": "https://cam.local/stream.m3u8",
            "metadata": { "ga": { "value": "Camera", "config": { "protocols": "hls", "token": "secret" } } }
        }));
        let device = find_device_type(&camera).expect("no device type");
        assert_eq!(
            json!({
                "cameraStreamSupportedProtocols": ["hls"],
                "cameraStreamNeedAuthToken": true,
                "cameraStreamNeedDrmEncryption": false
            }),
            Value::Object(device.attributes(&camera))
        );

        let camera = item(json!({
            "name": "Cam", "type": "String",
            "metadata": { "ga": { "value": "Camera" } }
        }));
        let protocols = &device.attributes(&camera)["cameraStreamSupportedProtocols"];
        assert_eq!(
            &json!(["hls", "dash", "smooth_stream", "progressive_mp4"]),
            protocols
        );
    }
}
