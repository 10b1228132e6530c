// Copyright (c) 2022 Unfolded Circle ApS, Markus Zehnder <markus.z@unfoldedcircle.com>
// SPDX-License-Identifier: MPL-2.0

//! Google Smart Home intent handling on top of an [`ItemApi`]: `SYNC`, `QUERY` and `EXECUTE`.

use crate::client::{Item, ItemApi, attach_members};
use crate::commands::COMMAND_PREFIX;
use crate::commands::executor::execute_command;
use crate::devices::{DeviceType, device_type_by_name, find_device_type};
use crate::errors::{ErrorCode, ServiceError};
use crate::google::{Challenge, Device, DeviceResult, SyncDevice};
use futures::future::join_all;
use log::{debug, info, warn};
use serde_json::{Map, Value, json};

/// Google command splitting into one item command per setpoint.
const SET_RANGE: &str = "ThermostatTemperatureSetRange";

/// Map all items with a matching device definition to their `SYNC` description.
///
/// Items are expected to have their group members attached, see [`attach_members`].
pub fn synchronize_devices(items: &[Item]) -> Vec<SyncDevice> {
    items
        .iter()
        .filter_map(|item| {
            let device_type = find_device_type(item)?;
            debug!("[{}] Matched device type {}", item.name, device_type.name);
            Some(device_type.metadata(item))
        })
        .collect()
}

/// Fetch all items from the hub and build the `SYNC` device list.
pub async fn sync<A: ItemApi>(api: &A) -> Result<Vec<SyncDevice>, ServiceError> {
    let items = attach_members(api.get_items().await?);
    let devices = synchronize_devices(&items);
    info!(
        "Synchronized {} devices from {} items",
        devices.len(),
        items.len()
    );
    Ok(devices)
}

/// Fetch the current state of all devices. One result per device.
pub async fn query_devices<A: ItemApi>(api: &A, devices: &[Device]) -> Vec<DeviceResult> {
    join_all(devices.iter().map(|device| async move {
        match query_device(api, device).await {
            Ok(result) => result,
            Err(e) => {
                warn!("[{}] Query failed: {e}", device.id);
                DeviceResult::error(device.id.clone(), e.error_code())
                    .with_debug_string(e.to_string())
            }
        }
    }))
    .await
}

async fn query_device<A: ItemApi>(api: &A, device: &Device) -> Result<DeviceResult, ServiceError> {
    let item = api.get_item(&device.id).await?;
    let device_type = resolve_device_type(device, &item).ok_or_else(|| {
        ServiceError::not_supported(format!("{} is not a supported device", device.id))
    })?;

    if !item.is_group() && !item.has_state() {
        return Err(ServiceError::with_msg(
            ErrorCode::DeviceOffline,
            format!("{} has no state: {}", item.name, item.state),
        ));
    }

    let mut states = device_type.state(&item);
    states.insert("online".into(), true.into());
    Ok(DeviceResult::success(device.id.clone(), states))
}

/// Device definition of `customData`, or of the item itself for devices synced by an older
/// version.
fn resolve_device_type(device: &Device, item: &Item) -> Option<&'static DeviceType> {
    device_type_by_name(device.device_type()).or_else(|| find_device_type(item))
}

/// Split a Google command into the commands executed one after the other.
///
/// `ThermostatTemperatureSetRange` sets the high and the low setpoint member.
pub fn expand_execution(name: &str, params: &Value) -> Vec<(String, Value)> {
    let short_name = name.strip_prefix(COMMAND_PREFIX).unwrap_or(name);
    if short_name != SET_RANGE {
        return vec![(name.to_string(), params.clone())];
    }

    let mut commands = Vec::with_capacity(2);
    for key in [
        "thermostatTemperatureSetpointHigh",
        "thermostatTemperatureSetpointLow",
    ] {
        if let Some(value) = params.get(key) {
            commands.push((format!("{COMMAND_PREFIX}{SET_RANGE}"), json!({ key: value })));
        }
    }
    commands
}

/// Execute a Google command, including commands expanding to multiple item commands.
///
/// Results of an expanded command are merged per device: the first error wins, otherwise the
/// states are combined.
pub async fn execute<A: ItemApi>(
    api: &A,
    name: &str,
    params: &Value,
    devices: &[Device],
    challenge: Option<&Challenge>,
) -> Vec<DeviceResult> {
    let mut merged: Vec<DeviceResult> = Vec::new();
    for (name, params) in expand_execution(name, params) {
        for result in execute_command(api, &name, &params, devices, challenge).await {
            match merged.iter_mut().find(|r| r.ids == result.ids) {
                Some(existing) => merge_result(existing, result),
                None => merged.push(result),
            }
        }
    }
    merged
}

fn merge_result(existing: &mut DeviceResult, result: DeviceResult) {
    if existing.error_code.is_some() {
        return;
    }
    if result.error_code.is_some() {
        *existing = result;
        return;
    }
    existing.status = result.status;
    if let Some(states) = result.states {
        existing
            .states
            .get_or_insert_with(Map::new)
            .extend(states);
    }
}
