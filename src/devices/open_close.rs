// Copyright (c) 2026 Unfolded Circle ApS, Markus Zehnder <markus.z@unfoldedcircle.com>
// SPDX-License-Identifier: MPL-2.0

//! Open / close devices: blinds, shutters, doors, windows and valves.
//!
//! A single item device is a `Rollershutter`, `Switch` or `Contact` item. Blinds like devices can
//! also be a group with an `openPercent` and a `rotationPercent` member, e.g. venetian blinds
//! with slat rotation.
//!
//! openHAB rollershutters report 0 for fully open and 100 for fully closed, which is the inverse
//! of Google's `openPercent`.

use crate::client::Item;
use crate::devices::Members;
use crate::google::Trait;
use crate::util::json::number;
use crate::util::parse::parse_range;
use serde_json::{Map, Value, json};

pub const ROLE_OPEN_PERCENT: &str = "openPercent";
pub const ROLE_ROTATION_PERCENT: &str = "rotationPercent";

pub(super) const ROLES: &[&str] = &[ROLE_OPEN_PERCENT, ROLE_ROTATION_PERCENT];

/// Default slat rotation range in degrees.
const DEF_ROTATION_RANGE: (f64, f64) = (0.0, 90.0);

/// Item state as Google `openPercent`, before applying the device inversion.
///
/// | item type     | state         | openPercent |
/// |---------------|---------------|-------------|
/// | Rollershutter | n             | 100 - n     |
/// | Rollershutter | UP / DOWN     | 100 / 0     |
/// | Switch        | ON / OFF      | 100 / 0     |
/// | Contact       | OPEN / CLOSED | 100 / 0     |
/// | Dimmer/Number | n             | n           |
pub fn open_percent(item_type: &str, state: &str) -> Option<f64> {
    match (item_type, state) {
        ("Rollershutter", "UP") | ("Switch", "ON") | ("Contact", "OPEN") => Some(100.0),
        ("Rollershutter", "DOWN") | ("Switch", "OFF") | ("Contact", "CLOSED") => Some(0.0),
        ("Rollershutter", _) => crate::util::parse::parse_number(state)
            .map(|v| 100.0 - v.clamp(0.0, 100.0)),
        ("Dimmer" | "Number", _) => {
            crate::util::parse::parse_number(state).map(|v| v.clamp(0.0, 100.0))
        }
        _ => None,
    }
}

/// Slat rotation range in degrees from `rotationDegreesRange`.
pub fn rotation_range(item: &Item) -> (f64, f64) {
    item.config()
        .str("rotationDegreesRange")
        .and_then(parse_range)
        .unwrap_or(DEF_ROTATION_RANGE)
}

/// Convert rotation degrees to percent. Degrees are clamped to the range.
pub fn degrees_to_percent(degrees: f64, (min, max): (f64, f64)) -> f64 {
    let degrees = degrees.clamp(min, max);
    ((degrees - min) / (max - min) * 100.0).round()
}

/// Convert rotation percent to degrees. Percent is clamped to 0..100.
pub fn percent_to_degrees(percent: f64, (min, max): (f64, f64)) -> f64 {
    let percent = percent.clamp(0.0, 100.0);
    (min + (max - min) * percent / 100.0).round()
}

pub(super) fn traits(item: &Item, members: &Members) -> Vec<Trait> {
    if members.is_empty() {
        return if item.base_type() == "Rollershutter" {
            vec![Trait::OpenClose, Trait::StartStop]
        } else {
            vec![Trait::OpenClose]
        };
    }

    let mut traits = Vec::with_capacity(3);
    if let Some(open) = members.get(ROLE_OPEN_PERCENT) {
        traits.push(Trait::OpenClose);
        if open.base_type() == "Rollershutter" {
            traits.push(Trait::StartStop);
        }
    }
    if members.has(ROLE_ROTATION_PERCENT) {
        traits.push(Trait::Rotation);
    }
    traits
}

pub(super) fn attributes(item: &Item, members: &Members) -> Map<String, Value> {
    let mut attributes = Map::new();
    let open_item = members.get(ROLE_OPEN_PERCENT).or(members.is_empty().then_some(item));

    if let Some(open_item) = open_item {
        match open_item.base_type() {
            "Switch" => {
                attributes.insert("discreteOnlyOpenClose".into(), true.into());
            }
            "Contact" => {
                attributes.insert("discreteOnlyOpenClose".into(), true.into());
                attributes.insert("queryOnlyOpenClose".into(), true.into());
            }
            "Rollershutter" => {
                attributes.insert("pausable".into(), false.into());
            }
            _ => {}
        }
    }

    if members.has(ROLE_ROTATION_PERCENT) {
        let (min, max) = rotation_range(item);
        attributes.insert("supportsDegrees".into(), true.into());
        attributes.insert("supportsPercent".into(), true.into());
        attributes.insert(
            "rotationDegreesRange".into(),
            json!({ "rotationDegreesMin": number(min), "rotationDegreesMax": number(max) }),
        );
        attributes.insert("supportsContinuousRotation".into(), false.into());
    }
    attributes
}

pub(super) fn state(item: &Item, members: &Members) -> Map<String, Value> {
    let mut state = Map::new();
    let inverted = item.config().bool("inverted");
    let open_item = members.get(ROLE_OPEN_PERCENT).or(members.is_empty().then_some(item));

    if let Some(open_item) = open_item {
        let percent = open_percent(open_item.base_type(), &open_item.state).unwrap_or_default();
        let percent = if inverted { 100.0 - percent } else { percent };
        state.insert("openPercent".into(), number(percent));
    }

    if let Some(rotation) = members.get(ROLE_ROTATION_PERCENT) {
        let percent = rotation.number().unwrap_or_default().clamp(0.0, 100.0);
        state.insert("rotationPercent".into(), number(percent));
        state.insert(
            "rotationDegrees".into(),
            number(percent_to_degrees(percent, rotation_range(item))),
        );
    }
    state
}
