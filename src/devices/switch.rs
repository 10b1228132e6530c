// Copyright (c) 2026 Unfolded Circle ApS, Markus Zehnder <markus.z@unfoldedcircle.com>
// SPDX-License-Identifier: MPL-2.0

//! Switch like devices: lights, outlets, appliances, scenes and start / stop switches.

use crate::client::Item;
use crate::devices::is_on;
use serde_json::{Map, Value};

pub(super) fn on_off_state(item: &Item) -> Map<String, Value> {
    let mut state = Map::new();
    state.insert("on".into(), (is_on(item) != item.config().bool("inverted")).into());
    state
}

pub(super) fn scene_attributes(item: &Item) -> Map<String, Value> {
    let mut attributes = Map::new();
    // reversible unless explicitly disabled
    let reversible = !matches!(
        item.config().string("sceneReversible").as_deref(),
        Some("false")
    );
    attributes.insert("sceneReversible".into(), reversible.into());
    attributes
}

pub(super) fn start_stop_attributes() -> Map<String, Value> {
    let mut attributes = Map::new();
    attributes.insert("pausable".into(), false.into());
    attributes
}

pub(super) fn start_stop_state(item: &Item) -> Map<String, Value> {
    let mut state = Map::new();
    let running = is_on(item) != item.config().bool("inverted");
    state.insert("isRunning".into(), running.into());
    state.insert("isPaused".into(), false.into());
    state
}
