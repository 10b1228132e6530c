// Copyright (c) 2026 Unfolded Circle ApS, Markus Zehnder <markus.z@unfoldedcircle.com>
// SPDX-License-Identifier: MPL-2.0

//! Chargers, vacuum robots and dynamic modes devices.

use crate::client::Item;
use crate::devices::fan::{available_modes, mode_name};
use crate::devices::{Members, is_on};
use crate::google::Trait;
use crate::util::json::number;
use crate::util::parse::parse_list;
use serde_json::{Map, Value, json};

pub const ROLE_CHARGER_CHARGING: &str = "chargerCharging";
pub const ROLE_CHARGER_PLUGGED_IN: &str = "chargerPluggedIn";
pub const ROLE_CHARGER_CAPACITY_REMAINING: &str = "chargerCapacityRemaining";
pub const ROLE_CHARGER_CAPACITY_UNTIL_FULL: &str = "chargerCapacityUntilFull";

pub(super) const CHARGER_ROLES: &[&str] = &[
    ROLE_CHARGER_CHARGING,
    ROLE_CHARGER_PLUGGED_IN,
    ROLE_CHARGER_CAPACITY_REMAINING,
    ROLE_CHARGER_CAPACITY_UNTIL_FULL,
];

pub const ROLE_VACUUM_POWER: &str = "vacuumPower";
pub const ROLE_VACUUM_PAUSE: &str = "vacuumPause";
pub const ROLE_VACUUM_DOCK: &str = "vacuumDock";
pub const ROLE_VACUUM_LOCATE: &str = "vacuumLocate";
pub const ROLE_VACUUM_BATTERY: &str = "vacuumBattery";

pub(super) const VACUUM_ROLES: &[&str] = &[
    ROLE_VACUUM_POWER,
    ROLE_VACUUM_PAUSE,
    ROLE_VACUUM_DOCK,
    ROLE_VACUUM_LOCATE,
    ROLE_VACUUM_BATTERY,
];

pub const ROLE_MODES_CURRENT_MODE: &str = "modesCurrentMode";
pub const ROLE_MODES_SETTINGS: &str = "modesSettings";
pub const ROLE_MODES_POWER: &str = "modesPower";

pub(super) const MODES_ROLES: &[&str] =
    &[ROLE_MODES_CURRENT_MODE, ROLE_MODES_SETTINGS, ROLE_MODES_POWER];

const UNIT_PERCENTAGE: &str = "PERCENTAGE";

/// Google descriptive capacity of a battery level in percent.
pub fn descriptive_capacity(percent: f64) -> &'static str {
    match percent {
        p if p <= 10.0 => "CRITICALLY_LOW",
        p if p <= 40.0 => "LOW",
        p if p <= 75.0 => "MEDIUM",
        p if p < 100.0 => "HIGH",
        _ => "FULL",
    }
}

fn capacity(value: f64, unit: &str) -> Value {
    json!([{ "rawValue": number(value), "unit": unit }])
}

fn charger_unit<'a>(item: &'a Item) -> &'a str {
    item.config().str("unit").unwrap_or(UNIT_PERCENTAGE)
}

pub(super) fn charger_attributes(item: &Item, members: &Members) -> Map<String, Value> {
    let rechargeable = item.config().bool("isRechargeable");
    let mut attributes = Map::new();
    attributes.insert("isRechargeable".into(), rechargeable.into());
    attributes.insert(
        "queryOnlyEnergyStorage".into(),
        (!rechargeable || !members.has(ROLE_CHARGER_CHARGING)).into(),
    );
    let unit = charger_unit(item);
    if matches!(unit, "KILOMETERS" | "MILES") {
        attributes.insert("energyStorageDistanceUnitForUX".into(), unit.into());
    }
    attributes
}

pub(super) fn charger_state(item: &Item, members: &Members) -> Map<String, Value> {
    let unit = charger_unit(item);
    let mut state = Map::new();
    if let Some(remaining) = members
        .get(ROLE_CHARGER_CAPACITY_REMAINING)
        .and_then(Item::number)
    {
        if unit == UNIT_PERCENTAGE {
            state.insert(
                "descriptiveCapacityRemaining".into(),
                descriptive_capacity(remaining).into(),
            );
        }
        state.insert("capacityRemaining".into(), capacity(remaining, unit));
    }
    if let Some(until_full) = members
        .get(ROLE_CHARGER_CAPACITY_UNTIL_FULL)
        .and_then(Item::number)
    {
        state.insert("capacityUntilFull".into(), capacity(until_full, unit));
    }
    if let Some(charging) = members.get(ROLE_CHARGER_CHARGING) {
        state.insert("isCharging".into(), is_on(charging).into());
    }
    if let Some(plugged_in) = members.get(ROLE_CHARGER_PLUGGED_IN) {
        state.insert("isPluggedIn".into(), is_on(plugged_in).into());
    }
    state
}

pub(super) fn vacuum_traits(members: &Members) -> Vec<Trait> {
    if members.is_empty() {
        return vec![Trait::StartStop];
    }
    let mut traits = Vec::with_capacity(4);
    if members.has(ROLE_VACUUM_POWER) {
        traits.push(Trait::StartStop);
    }
    if members.has(ROLE_VACUUM_DOCK) {
        traits.push(Trait::Dock);
    }
    if members.has(ROLE_VACUUM_LOCATE) {
        traits.push(Trait::Locate);
    }
    if members.has(ROLE_VACUUM_BATTERY) {
        traits.push(Trait::EnergyStorage);
    }
    traits
}

pub(super) fn vacuum_attributes(members: &Members) -> Map<String, Value> {
    let mut attributes = Map::new();
    attributes.insert("pausable".into(), members.has(ROLE_VACUUM_PAUSE).into());
    if members.has(ROLE_VACUUM_BATTERY) {
        attributes.insert("isRechargeable".into(), true.into());
        attributes.insert("queryOnlyEnergyStorage".into(), true.into());
    }
    attributes
}

pub(super) fn vacuum_state(item: &Item, members: &Members) -> Map<String, Value> {
    let mut state = Map::new();
    let power = if members.is_empty() {
        Some(item)
    } else {
        members.get(ROLE_VACUUM_POWER)
    };
    if let Some(power) = power {
        state.insert("isRunning".into(), is_on(power).into());
        state.insert(
            "isPaused".into(),
            members.get(ROLE_VACUUM_PAUSE).is_some_and(is_on).into(),
        );
    }
    if let Some(dock) = members.get(ROLE_VACUUM_DOCK) {
        state.insert("isDocked".into(), is_on(dock).into());
    }
    if let Some(battery) = members.get(ROLE_VACUUM_BATTERY).and_then(Item::number) {
        state.insert(
            "descriptiveCapacityRemaining".into(),
            descriptive_capacity(battery).into(),
        );
        state.insert("capacityRemaining".into(), capacity(battery, UNIT_PERCENTAGE));
    }
    state
}

/// A dynamic modes device needs the current mode and the available settings.
pub(super) fn modes_is_compatible(members: &Members) -> bool {
    members.has(ROLE_MODES_CURRENT_MODE) && members.has(ROLE_MODES_SETTINGS)
}

pub(super) fn modes_traits(members: &Members) -> Vec<Trait> {
    if members.has(ROLE_MODES_POWER) {
        vec![Trait::OnOff, Trait::Modes]
    } else {
        vec![Trait::Modes]
    }
}

/// The settings list is the state of the `modesSettings` member, e.g. `1=Normal,2=Eco:Saving`.
pub(super) fn modes_attributes(item: &Item, members: &Members) -> Map<String, Value> {
    let settings = members
        .get(ROLE_MODES_SETTINGS)
        .filter(|s| s.has_state())
        .map(|s| parse_list(&s.state))
        .unwrap_or_default();
    let mut attributes = Map::new();
    attributes.insert("availableModes".into(), available_modes(item, &settings));
    attributes
}

pub(super) fn modes_state(item: &Item, members: &Members) -> Map<String, Value> {
    let mut state = Map::new();
    if let Some(power) = members.get(ROLE_MODES_POWER) {
        state.insert("on".into(), is_on(power).into());
    }
    if let Some(current) = members
        .get(ROLE_MODES_CURRENT_MODE)
        .filter(|c| c.has_state())
    {
        let mut settings = Map::new();
        settings.insert(mode_name(item).key, current.state.as_str().into());
        state.insert("currentModeSettings".into(), Value::Object(settings));
    }
    state
}
