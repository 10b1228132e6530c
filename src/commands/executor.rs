// Copyright (c) 2026 Unfolded Circle ApS, Markus Zehnder <markus.z@unfoldedcircle.com>
// SPDX-License-Identifier: MPL-2.0

//! Execution of a Google command on a batch of devices.
//!
//! Every device is processed independently and concurrently. A failing device never aborts the
//! batch: errors are reported as `ERROR` entry of that device.

use crate::client::{Item, ItemApi};
use crate::commands::{Command, CommandHandler, Context};
use crate::errors::{ChallengeType, ErrorCode, ServiceError};
use crate::google::{Challenge, Device, DeviceResult};
use crate::util::json::number_string;
use futures::future::join_all;
use log::{debug, info, warn};
use serde_json::{Map, Value};
use std::time::Duration;

/// Upper bound of the `waitForStateChange` delay.
const MAX_STATE_CHANGE_WAIT: Duration = Duration::from_secs(60);

/// Execute a Google command on all devices.
///
/// Returns one result per device. An unknown command or parameters not matching any command type
/// result in `notSupported` for every device.
pub async fn execute_command<A: ItemApi>(
    api: &A,
    name: &str,
    params: &Value,
    devices: &[Device],
    challenge: Option<&Challenge>,
) -> Vec<DeviceResult> {
    let Some(command) = Command::from_request(name, params) else {
        warn!("Unsupported command {name}: {params}");
        return devices
            .iter()
            .map(|d| {
                DeviceResult::error(d.id.clone(), ErrorCode::NotSupported)
                    .with_debug_string(format!("Unsupported command {name}"))
            })
            .collect();
    };

    let challenge = challenge.cloned().unwrap_or_default();
    join_all(
        devices
            .iter()
            .map(|device| execute_device(api, &command, device, &challenge)),
    )
    .await
}

async fn execute_device<A: ItemApi>(
    api: &A,
    command: &Command,
    device: &Device,
    challenge: &Challenge,
) -> DeviceResult {
    match try_execute(api, command.handler(), device, challenge).await {
        Ok(result) => result,
        Err(e) => {
            warn!("[{}] Command {command:?} failed: {e}", device.id);
            DeviceResult::error(device.id.clone(), e.error_code()).with_debug_string(e.to_string())
        }
    }
}

async fn try_execute<A: ItemApi>(
    api: &A,
    handler: &dyn CommandHandler,
    device: &Device,
    challenge: &Challenge,
) -> Result<DeviceResult, ServiceError> {
    let custom_data = &device.custom_data;

    let pin = custom_data
        .tfa_pin
        .as_deref()
        .filter(|_| !handler.bypass_pin(device));
    if let Some(pin) = pin {
        match challenge.pin.as_deref() {
            None => {
                return Ok(DeviceResult::challenge(
                    device.id.clone(),
                    ChallengeType::PinNeeded,
                    None,
                ));
            }
            Some(given) if given != pin => {
                return Ok(DeviceResult::challenge(
                    device.id.clone(),
                    ChallengeType::ChallengeFailedPinNeeded,
                    None,
                ));
            }
            Some(_) => {}
        }
    }

    let ack_needed = custom_data.tfa_ack && !challenge.ack && handler.supports_ack();
    let item = if handler.requires_item(&Context::new(device, None))
        || ack_needed
        || custom_data.check_state
    {
        Some(api.get_item(&device.id).await?)
    } else {
        debug!("[{}] Executing without fetching the item", device.id);
        None
    };
    let ctx = Context::new(device, item.as_ref());

    let item_name = handler.item_name(&ctx)?;
    let value = handler.convert_value(&ctx)?;

    if custom_data.check_state {
        if let (Some(value), Some(target)) = (value.as_deref(), ctx.target_item(&item_name)) {
            handler.check_current_state(value, &normalized_state(target))?;
        }
    }

    let mut states = handler.response_states(&ctx)?;
    if !states.is_empty() {
        states.insert("online".into(), true.into());
    }

    if ack_needed {
        return Ok(DeviceResult::challenge(
            device.id.clone(),
            ChallengeType::AckNeeded,
            Some(states),
        ));
    }

    if let Some(value) = value.as_deref() {
        info!("[{}] Sending command {value} to {item_name}", device.id);
        api.send_command(&item_name, value).await?;
    }

    if handler.requires_update_validation(&ctx) {
        return validate_update(api, handler, device).await;
    }

    Ok(DeviceResult::success(device.id.clone(), states))
}

/// Re-fetch the item after the configured delay and let the command validate the new state.
async fn validate_update<A: ItemApi>(
    api: &A,
    handler: &dyn CommandHandler,
    device: &Device,
) -> Result<DeviceResult, ServiceError> {
    if let Some(delay) = device
        .custom_data
        .wait_for_state_change
        .filter(|d| *d > 0.0)
    {
        let wait = match Duration::try_from_secs_f64(delay) {
            Ok(wait) if wait <= MAX_STATE_CHANGE_WAIT => wait,
            _ => {
                warn!(
                    "[{}] Invalid waitForStateChange {delay}, waiting {}s",
                    device.id,
                    MAX_STATE_CHANGE_WAIT.as_secs()
                );
                MAX_STATE_CHANGE_WAIT
            }
        };
        debug!("[{}] Waiting {}s for the state change", device.id, wait.as_secs_f64());
        tokio::time::sleep(wait).await;
    }

    let item = api.get_item(&device.id).await?;
    let ctx = Context::new(device, Some(&item));
    if let Some(result) = handler.validate_update(&ctx)? {
        return Ok(result);
    }

    let mut states = match ctx.device_type {
        Some(device_type) => device_type.state(&item),
        None => Map::new(),
    };
    states.insert("online".into(), true.into());
    Ok(DeviceResult::success(device.id.clone(), states))
}

/// Item state comparable with a command value.
///
/// Numeric states lose their unit suffix, rollershutter end positions become `UP` / `DOWN`.
fn normalized_state(item: &Item) -> String {
    match item.base_type() {
        "Rollershutter" => match item.state.as_str() {
            "0" => "UP".into(),
            "100" => "DOWN".into(),
            state => state.into(),
        },
        "Number" | "Dimmer" => item
            .number()
            .map(number_string)
            .unwrap_or_else(|| item.state.clone()),
        _ => item.state.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::mock::MockHub;
    use crate::commands::tests::device;
    use crate::devices::tests::{group, item, member};
    use crate::google::Status;
    use rstest::rstest;
    use serde_json::json;

    fn switch(name: &str, state: &str) -> Item {
        item(json!({
            "name": name, "type": "Switch", "state": state,
            "metadata": { "ga": { "value": "Switch" } }
        }))
    }

    fn switch_device(name: &str, custom_data: Value) -> Device {
        let mut custom = json!({ "deviceType": "Switch", "itemType": "Switch" });
        if let (Some(custom), Some(extra)) = (custom.as_object_mut(), custom_data.as_object()) {
            custom.extend(extra.clone());
        }
        device(json!({ "id": name, "customData": custom }))
    }

    fn error_code(result: &DeviceResult) -> Option<ErrorCode> {
        result.error_code
    }

    fn challenge_type(result: &DeviceResult) -> Option<ChallengeType> {
        result.challenge_needed.map(|c| c.challenge_type)
    }

    #[tokio::test]
    async fn on_off_without_fetch() {
        let hub = MockHub::new(vec![switch("Lamp", "OFF")]);
        let devices = vec![switch_device("Lamp", json!({}))];

        let results = execute_command(
            &hub,
            "action.devices.commands.OnOff",
            &json!({"on": true}),
            &devices,
            None,
        )
        .await;

        assert_eq!(1, results.len());
        assert_eq!(Status::Success, results[0].status);
        assert_eq!(
            Some(json!({"on": true, "online": true})),
            results[0].states.clone().map(Value::Object)
        );
        assert_eq!(vec![("Lamp".to_string(), "ON".to_string())], hub.sent());
        assert_eq!(0, hub.fetches.get());
    }

    #[tokio::test]
    async fn inverted_on_off() {
        let hub = MockHub::new(vec![switch("Valve", "ON")]);
        let devices = vec![switch_device("Valve", json!({"inverted": true}))];

        execute_command(&hub, "OnOff", &json!({"on": true}), &devices, None).await;

        assert_eq!(vec![("Valve".to_string(), "OFF".to_string())], hub.sent());
    }

    #[tokio::test]
    async fn unknown_command_is_not_supported_for_all_devices() {
        let hub = MockHub::new(vec![]);
        let devices = vec![
            switch_device("Lamp1", json!({})),
            switch_device("Lamp2", json!({})),
        ];

        let results =
            execute_command(&hub, "action.devices.commands.Fly", &json!({}), &devices, None).await;

        assert_eq!(2, results.len());
        for result in &results {
            assert_eq!(Status::Error, result.status);
            assert_eq!(Some(ErrorCode::NotSupported), error_code(result));
        }
        assert!(hub.sent().is_empty());
    }

    #[tokio::test]
    async fn pin_challenge() {
        let hub = MockHub::new(vec![switch("Door", "OFF")]);
        let devices = vec![switch_device("Door", json!({"tfaPin": "1234"}))];
        let params = json!({"on": true});

        let results = execute_command(&hub, "OnOff", &params, &devices, None).await;
        assert_eq!(Some(ErrorCode::ChallengeNeeded), error_code(&results[0]));
        assert_eq!(Some(ChallengeType::PinNeeded), challenge_type(&results[0]));

        let wrong = Challenge {
            pin: Some("0000".into()),
            ack: false,
        };
        let results = execute_command(&hub, "OnOff", &params, &devices, Some(&wrong)).await;
        assert_eq!(
            Some(ChallengeType::ChallengeFailedPinNeeded),
            challenge_type(&results[0])
        );
        assert!(hub.sent().is_empty());

        let correct = Challenge {
            pin: Some("1234".into()),
            ack: false,
        };
        let results = execute_command(&hub, "OnOff", &params, &devices, Some(&correct)).await;
        assert_eq!(Status::Success, results[0].status);
        assert_eq!(vec![("Door".to_string(), "ON".to_string())], hub.sent());
    }

    #[tokio::test]
    async fn numeric_pin_is_accepted() {
        let hub = MockHub::new(vec![switch("Door", "OFF")]);
        let devices = vec![switch_device("Door", json!({"tfaPin": 1234}))];
        let challenge: Challenge =
            serde_json::from_value(json!({"pin": 1234})).expect("invalid challenge");

        let results =
            execute_command(&hub, "OnOff", &json!({"on": true}), &devices, Some(&challenge)).await;
        assert_eq!(Status::Success, results[0].status);
    }

    #[tokio::test]
    async fn ack_challenge_carries_states() {
        let hub = MockHub::new(vec![switch("Heater", "OFF")]);
        let devices = vec![switch_device("Heater", json!({"tfaAck": true}))];
        let params = json!({"on": true});

        let results = execute_command(&hub, "OnOff", &params, &devices, None).await;
        assert_eq!(Some(ChallengeType::AckNeeded), challenge_type(&results[0]));
        assert_eq!(
            Some(json!({"on": true, "online": true})),
            results[0].states.clone().map(Value::Object)
        );
        assert_eq!(1, hub.fetches.get());
        assert!(hub.sent().is_empty());

        let ack = Challenge {
            pin: None,
            ack: true,
        };
        let results = execute_command(&hub, "OnOff", &params, &devices, Some(&ack)).await;
        assert_eq!(Status::Success, results[0].status);
        assert_eq!(1, hub.sent().len());
    }

    #[tokio::test]
    async fn ack_is_ignored_for_commands_without_ack_support() {
        let hub = MockHub::new(vec![]);
        let devices = vec![device(json!({
            "id": "Light",
            "customData": { "deviceType": "DimmableLight", "itemType": "Dimmer", "tfaAck": true }
        }))];

        let results =
            execute_command(&hub, "BrightnessAbsolute", &json!({"brightness": 30}), &devices, None)
                .await;
        assert_eq!(Status::Success, results[0].status);
        assert_eq!(0, hub.fetches.get());
        assert_eq!(vec![("Light".to_string(), "30".to_string())], hub.sent());
    }

    #[tokio::test]
    async fn check_state_reports_already_on() {
        let hub = MockHub::new(vec![switch("Lamp", "ON")]);
        let devices = vec![switch_device("Lamp", json!({"checkState": true}))];

        let results = execute_command(&hub, "OnOff", &json!({"on": true}), &devices, None).await;
        assert_eq!(Status::Error, results[0].status);
        assert_eq!(Some(ErrorCode::AlreadyOn), error_code(&results[0]));
        assert_eq!(1, hub.fetches.get());
        assert!(hub.sent().is_empty());

        let results = execute_command(&hub, "OnOff", &json!({"on": false}), &devices, None).await;
        assert_eq!(Status::Success, results[0].status);
    }

    #[tokio::test]
    async fn check_state_ignores_unit_suffix() {
        let hub = MockHub::new(vec![item(json!({
            "name": "Speaker", "type": "Number:Dimensionless", "state": "40 %",
            "metadata": { "ga": { "value": "Speaker" } }
        }))]);
        let devices = vec![device(json!({
            "id": "Speaker",
            "customData": { "deviceType": "Speaker", "itemType": "Number", "checkState": true }
        }))];

        let results =
            execute_command(&hub, "SetVolume", &json!({"volumeLevel": 40}), &devices, None).await;
        assert_eq!(Some(ErrorCode::AlreadyInState), error_code(&results[0]));
    }

    #[tokio::test]
    async fn check_state_of_rollershutter_end_position() {
        let hub = MockHub::new(vec![item(json!({
            "name": "Shutter", "type": "Rollershutter", "state": "0",
            "metadata": { "ga": { "value": "Shutter" } }
        }))]);
        let devices = vec![device(json!({
            "id": "Shutter",
            "customData": { "deviceType": "Shutter", "itemType": "Rollershutter", "checkState": true }
        }))];

        let results =
            execute_command(&hub, "OpenClose", &json!({"openPercent": 100}), &devices, None).await;
        assert_eq!(Some(ErrorCode::AlreadyOpen), error_code(&results[0]));

        let results =
            execute_command(&hub, "OpenClose", &json!({"openPercent": 0}), &devices, None).await;
        assert_eq!(Status::Success, results[0].status);
        assert_eq!(vec![("Shutter".to_string(), "DOWN".to_string())], hub.sent());
    }

    #[tokio::test]
    async fn missing_item_is_device_not_found() {
        let hub = MockHub::new(vec![]);
        let devices = vec![device(json!({
            "id": "Gone",
            "customData": { "deviceType": "ColorLight", "itemType": "Color" }
        }))];

        let results = execute_command(
            &hub,
            "ColorAbsolute",
            &json!({"color": {"temperature": 3000}}),
            &devices,
            None,
        )
        .await;
        assert_eq!(Some(ErrorCode::DeviceNotFound), error_code(&results[0]));
        assert!(results[0].debug_string.is_some());
    }

    #[tokio::test]
    async fn failing_device_does_not_abort_batch() {
        let hub = MockHub::new(vec![switch("Lamp1", "OFF"), switch("Lamp2", "OFF")])
            .with_failure("Lamp1", 500);
        let devices = vec![
            switch_device("Lamp1", json!({})),
            switch_device("Lamp2", json!({})),
        ];

        let results = execute_command(&hub, "OnOff", &json!({"on": true}), &devices, None).await;
        assert_eq!(2, results.len());
        let lamp1 = results.iter().find(|r| r.ids == ["Lamp1"]).expect("Lamp1");
        let lamp2 = results.iter().find(|r| r.ids == ["Lamp2"]).expect("Lamp2");
        assert_eq!(Some(ErrorCode::DeviceOffline), error_code(lamp1));
        assert_eq!(Status::Success, lamp2.status);
    }

    #[tokio::test]
    async fn color_absolute_on_switch_is_not_supported() {
        let hub = MockHub::new(vec![switch("Lamp", "OFF")]);
        let devices = vec![switch_device("Lamp", json!({}))];

        let results = execute_command(
            &hub,
            "ColorAbsolute",
            &json!({"color": {"spectrumRGB": 16711680}}),
            &devices,
            None,
        )
        .await;
        assert_eq!(Some(ErrorCode::NotSupported), error_code(&results[0]));
    }

    #[tokio::test]
    async fn set_humidity_scaled() {
        let hub = MockHub::new(vec![]);
        let devices = vec![device(json!({
            "id": "Humidifier",
            "customData": { "deviceType": "Humidifier", "itemType": "Number", "maxHumidity": 50 }
        }))];

        let results =
            execute_command(&hub, "SetHumidity", &json!({"humidity": 65}), &devices, None).await;
        assert_eq!(Status::Success, results[0].status);
        assert_eq!(
            vec![("Humidifier".to_string(), "32.5".to_string())],
            hub.sent()
        );
    }

    #[tokio::test]
    async fn thermostat_setpoint_in_fahrenheit() {
        let thermostat = group(
            "Thermostat",
            "Thermostat",
            json!({"useFahrenheit": true}),
            json!([
                member("Thermostat_Mode", "String", "thermostatMode", "heat"),
                member("Thermostat_Setpoint", "Number", "thermostatTemperatureSetpoint", "64"),
            ]),
        );
        let hub = MockHub::new(vec![thermostat]);
        let devices = vec![device(json!({
            "id": "Thermostat",
            "customData": { "deviceType": "Thermostat", "itemType": "Group" }
        }))];

        let results = execute_command(
            &hub,
            "ThermostatTemperatureSetpoint",
            &json!({"thermostatTemperatureSetpoint": 20}),
            &devices,
            None,
        )
        .await;
        assert_eq!(Status::Success, results[0].status);
        assert_eq!(
            vec![("Thermostat_Setpoint".to_string(), "68".to_string())],
            hub.sent()
        );
        let states = results[0].states.clone().expect("states");
        assert_eq!(Some(&json!(20)), states.get("thermostatTemperatureSetpoint"));
        assert_eq!(Some(&json!("heat")), states.get("thermostatMode"));
    }

    fn alarm() -> Item {
        group(
            "Alarm",
            "SecuritySystem",
            json!({}),
            json!([
                member("Alarm_Armed", "Switch", "securitySystemArmed", "OFF"),
                member("Alarm_Level", "String", "securitySystemArmLevel", "L1"),
                {
                    "name": "Alarm_Door", "type": "Contact", "state": "CLOSED",
                    "metadata": { "ga": { "value": "securitySystemZone", "config": { "zoneType": "OpenClose" } } }
                },
            ]),
        )
    }

    fn alarm_device() -> Device {
        device(json!({
            "id": "Alarm",
            "customData": {
                "deviceType": "SecuritySystem",
                "itemType": "Group",
                "tfaPin": "1234",
                "pinOnDisarmOnly": true,
                "members": { "securitySystemArmed": "Alarm_Armed", "securitySystemArmLevel": "Alarm_Level" }
            }
        }))
    }

    #[tokio::test]
    async fn arm_with_level_bypasses_pin_and_validates() {
        let hub = MockHub::new(vec![alarm()]).with_applied_commands();
        hub.after_command
            .borrow_mut()
            .push(("Alarm_Armed".into(), "ON".into()));
        let devices = vec![alarm_device()];

        let results = execute_command(
            &hub,
            "ArmDisarm",
            &json!({"arm": true, "armLevel": "L2"}),
            &devices,
            None,
        )
        .await;

        assert_eq!(Status::Success, results[0].status);
        assert_eq!(
            vec![("Alarm_Level".to_string(), "L2".to_string())],
            hub.sent()
        );
        let states = results[0].states.clone().expect("states");
        assert_eq!(Some(&json!(true)), states.get("isArmed"));
        assert_eq!(Some(&json!("L2")), states.get("currentArmLevel"));
        assert_eq!(Some(&json!(true)), states.get("online"));
        // only the validation fetch
        assert_eq!(1, hub.fetches.get());
    }

    #[tokio::test]
    async fn arm_blocked_by_open_zone_reports_exceptions() {
        let hub = MockHub::new(vec![alarm()]);
        hub.after_command
            .borrow_mut()
            .push(("Alarm_Door".into(), "OPEN".into()));
        let devices = vec![alarm_device()];

        let results =
            execute_command(&hub, "ArmDisarm", &json!({"arm": true}), &devices, None).await;

        assert_eq!(Status::Exceptions, results[0].status);
        let states = results[0].states.clone().expect("states");
        assert_eq!(Some(&json!(false)), states.get("isArmed"));
        assert_eq!(
            json!("deviceOpen"),
            states["currentStatusReport"][0]["statusCode"]
        );
    }

    async fn arm_waiting(wait_for_state_change: Option<f64>) -> (DeviceResult, Duration) {
        let hub = MockHub::new(vec![alarm()]).with_applied_commands();
        hub.after_command
            .borrow_mut()
            .push(("Alarm_Armed".into(), "ON".into()));
        let mut device = alarm_device();
        device.custom_data.wait_for_state_change = wait_for_state_change;
        let devices = vec![device];

        let start = tokio::time::Instant::now();
        let mut results = execute_command(
            &hub,
            "ArmDisarm",
            &json!({"arm": true, "armLevel": "L2"}),
            &devices,
            None,
        )
        .await;
        let elapsed = start.elapsed();

        assert_eq!(1, hub.fetches.get());
        (results.remove(0), elapsed)
    }

    #[rstest]
    #[case(Some(5.0), Duration::from_secs(5))]
    #[case(Some(0.25), Duration::from_millis(250))]
    #[case(None, Duration::ZERO)]
    #[case(Some(0.0), Duration::ZERO)]
    #[case(Some(-3.0), Duration::ZERO)]
    #[case(Some(f64::NAN), Duration::ZERO)]
    #[tokio::test(start_paused = true)]
    async fn validation_waits_for_state_change(
        #[case] wait_for_state_change: Option<f64>,
        #[case] expected: Duration,
    ) {
        let (result, elapsed) = arm_waiting(wait_for_state_change).await;
        assert_eq!(Status::Success, result.status);
        assert!(elapsed >= expected, "waited {elapsed:?}");
        assert!(elapsed < expected + Duration::from_millis(10), "waited {elapsed:?}");
    }

    #[rstest]
    #[case(1e20)]
    #[case(f64::INFINITY)]
    #[case(3600.0)]
    #[tokio::test(start_paused = true)]
    async fn excessive_state_change_wait_is_capped(#[case] wait_for_state_change: f64) {
        let (result, elapsed) = arm_waiting(Some(wait_for_state_change)).await;
        assert_eq!(Status::Success, result.status);
        assert!(elapsed >= MAX_STATE_CHANGE_WAIT, "waited {elapsed:?}");
        assert!(
            elapsed < MAX_STATE_CHANGE_WAIT + Duration::from_millis(10),
            "waited {elapsed:?}"
        );
    }

    #[tokio::test]
    async fn disarm_requires_pin() {
        let hub = MockHub::new(vec![alarm()]);
        let devices = vec![alarm_device()];

        let results =
            execute_command(&hub, "ArmDisarm", &json!({"arm": false}), &devices, None).await;
        assert_eq!(Some(ChallengeType::PinNeeded), challenge_type(&results[0]));
        assert!(hub.sent().is_empty());
    }

    #[test]
    fn normalized_states() {
        let shutter = item(json!({"name": "S", "type": "Rollershutter", "state": "100"}));
        assert_eq!("DOWN", normalized_state(&shutter));
        let shutter = item(json!({"name": "S", "type": "Rollershutter", "state": "40"}));
        assert_eq!("40", normalized_state(&shutter));
        let number = item(json!({"name": "N", "type": "Number:Temperature", "state": "21.0 °C"}));
        assert_eq!("21", normalized_state(&number));
        let text = item(json!({"name": "T", "type": "String", "state": "hdmi1"}));
        assert_eq!("hdmi1", normalized_state(&text));
    }
}
