// Copyright (c) 2026 Unfolded Circle ApS, Markus Zehnder <markus.z@unfoldedcircle.com>
// SPDX-License-Identifier: MPL-2.0

//! Media devices: TVs and speakers.

use crate::client::Item;
use crate::devices::{Members, is_on, lang, number_value};
use crate::google::Trait;
use crate::util::json::number;
use crate::util::parse::{ListEntry, parse_list, parse_values};
use serde_json::{Map, Value, json};

pub const ROLE_POWER: &str = "tvPower";
pub const ROLE_MUTE: &str = "tvMute";
pub const ROLE_VOLUME: &str = "tvVolume";
pub const ROLE_CHANNEL: &str = "tvChannel";
pub const ROLE_INPUT: &str = "tvInput";
pub const ROLE_APPLICATION: &str = "tvApplication";
pub const ROLE_TRANSPORT: &str = "tvTransport";

pub(super) const TV_ROLES: &[&str] = &[
    ROLE_POWER,
    ROLE_MUTE,
    ROLE_VOLUME,
    ROLE_CHANNEL,
    ROLE_INPUT,
    ROLE_APPLICATION,
    ROLE_TRANSPORT,
];

const DEF_VOLUME_MAX_LEVEL: f64 = 100.0;
const DEF_TRANSPORT_COMMANDS: &[&str] = &["NEXT", "PREVIOUS", "PAUSE", "RESUME"];

/// Channels from `channelMap="20=Channel name:synonym,..."`: key is the channel number.
pub fn channels(item: &Item) -> Vec<ListEntry> {
    item.config()
        .str("channelMap")
        .map(parse_list)
        .unwrap_or_default()
}

/// Inputs from `availableInputs="hdmi1=HDMI 1:TV,..."`: key is the hub input value.
pub fn inputs(item: &Item) -> Vec<ListEntry> {
    item.config()
        .str("availableInputs")
        .map(parse_list)
        .unwrap_or_default()
}

/// Applications from `availableApplications="key=name:synonym,..."`.
pub fn applications(item: &Item) -> Vec<ListEntry> {
    item.config()
        .str("availableApplications")
        .map(parse_list)
        .unwrap_or_default()
}

/// Find a list entry by key or by one of its names, case-insensitive.
pub fn find_entry<'a>(entries: &'a [ListEntry], value: &str) -> Option<&'a ListEntry> {
    let value = value.trim();
    entries
        .iter()
        .find(|e| e.key.eq_ignore_ascii_case(value))
        .or_else(|| {
            entries
                .iter()
                .find(|e| e.values.iter().any(|v| v.eq_ignore_ascii_case(value)))
        })
}

pub fn volume_max_level(item: &Item) -> f64 {
    item.config()
        .f64("volumeMaxLevel")
        .filter(|v| *v > 0.0)
        .unwrap_or(DEF_VOLUME_MAX_LEVEL)
}

fn volume_attributes(item: &Item, can_mute: bool) -> Map<String, Value> {
    let mut attributes = Map::new();
    attributes.insert("volumeCanMuteAndUnmute".into(), can_mute.into());
    attributes.insert("volumeMaxLevel".into(), number(volume_max_level(item)));
    if let Some(step) = item.config().f64("levelStepSize") {
        attributes.insert("levelStepSize".into(), number(step));
    }
    attributes
}

fn names_attribute(entries: &[ListEntry], key_field: &str, lang: &str) -> Vec<Value> {
    entries
        .iter()
        .map(|e| {
            let mut entry = Map::new();
            entry.insert(key_field.into(), e.key.as_str().into());
            entry.insert(
                "names".into(),
                json!([{ "name_synonym": e.values, "lang": lang }]),
            );
            Value::Object(entry)
        })
        .collect()
}

pub(super) fn tv_traits(members: &Members) -> Vec<Trait> {
    let mut traits = Vec::with_capacity(6);
    if members.has(ROLE_POWER) {
        traits.push(Trait::OnOff);
    }
    if members.has(ROLE_VOLUME) || members.has(ROLE_MUTE) {
        traits.push(Trait::Volume);
    }
    if members.has(ROLE_CHANNEL) {
        traits.push(Trait::Channel);
    }
    if members.has(ROLE_INPUT) {
        traits.push(Trait::InputSelector);
    }
    if members.has(ROLE_APPLICATION) {
        traits.push(Trait::AppSelector);
    }
    if members.has(ROLE_TRANSPORT) {
        traits.push(Trait::TransportControl);
    }
    traits
}

pub(super) fn tv_attributes(item: &Item, members: &Members) -> Map<String, Value> {
    let lang = lang(item);
    let mut attributes = Map::new();

    if members.has(ROLE_VOLUME) || members.has(ROLE_MUTE) {
        attributes.extend(volume_attributes(item, members.has(ROLE_MUTE)));
    }
    if members.has(ROLE_CHANNEL) {
        let channels: Vec<Value> = channels(item)
            .iter()
            .map(|c| json!({ "key": c.key, "names": c.values, "number": c.key }))
            .collect();
        attributes.insert("availableChannels".into(), channels.into());
    }
    if members.has(ROLE_INPUT) {
        attributes.insert(
            "availableInputs".into(),
            names_attribute(&inputs(item), "key", lang).into(),
        );
        attributes.insert("orderedInputs".into(), item.config().bool("orderedInputs").into());
    }
    if members.has(ROLE_APPLICATION) {
        attributes.insert(
            "availableApplications".into(),
            names_attribute(&applications(item), "key", lang).into(),
        );
    }
    if members.has(ROLE_TRANSPORT) {
        let commands = item
            .config()
            .str("transportControlSupportedCommands")
            .map(parse_values)
            .unwrap_or_else(|| DEF_TRANSPORT_COMMANDS.iter().map(|c| c.to_string()).collect());
        attributes.insert("transportControlSupportedCommands".into(), commands.into());
    }
    attributes
}

pub(super) fn tv_state(item: &Item, members: &Members) -> Map<String, Value> {
    let mut state = Map::new();
    if let Some(power) = members.get(ROLE_POWER) {
        state.insert("on".into(), is_on(power).into());
    }
    if let Some(volume) = members.get(ROLE_VOLUME).and_then(number_value) {
        state.insert("currentVolume".into(), volume);
    }
    if let Some(mute) = members.get(ROLE_MUTE) {
        state.insert("isMuted".into(), is_on(mute).into());
    }
    if let Some(channel) = members.get(ROLE_CHANNEL).filter(|c| c.has_state()) {
        state.insert("channelNumber".into(), channel.state.as_str().into());
        if let Some(entry) = channels(item).iter().find(|e| e.key == channel.state) {
            state.insert("channelName".into(), entry.first_value().into());
        }
    }
    if let Some(input) = members.get(ROLE_INPUT).filter(|i| i.has_state()) {
        state.insert("currentInput".into(), input.state.as_str().into());
    }
    if let Some(app) = members.get(ROLE_APPLICATION).filter(|a| a.has_state()) {
        state.insert("currentApplication".into(), app.state.as_str().into());
    }
    state
}

pub(super) fn speaker_attributes(item: &Item) -> Map<String, Value> {
    volume_attributes(item, false)
}

pub(super) fn speaker_state(item: &Item) -> Map<String, Value> {
    let mut state = Map::new();
    state.insert(
        "currentVolume".into(),
        number_value(item).unwrap_or_else(|| 0.into()),
    );
    state
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::devices::find_device_type;
    use crate::devices::tests::{group, item, member};

    fn tv() -> Item {
        group(
            "TV",
            "TV",
            json!({
                "channelMap": "20=Channel 1:First,30=Channel 2",
                "availableInputs": "hdmi1=HDMI 1:Playstation,tv=TV",
                "availableApplications": "netflix=Netflix",
                "volumeMaxLevel": 50
            }),
            json!([
                member("Power", "Switch", "tvPower", "ON"),
                member("Mute", "Switch", "tvMute", "OFF"),
                member("Volume", "Dimmer", "tvVolume", "12"),
                member("Channel", "Number", "tvChannel", "20"),
                member("Input", "String", "tvInput", "hdmi1"),
                member("App", "String", "tvApplication", "netflix"),
                member("Transport", "Player", "tvTransport", "PAUSE"),
            ]),
        )
    }

    #[test]
    fn tv_traits_and_state() {
        let item = tv();
        let device = find_device_type(&item).expect("no device type");
        assert_eq!(
            vec![
                Trait::OnOff,
                Trait::Volume,
                Trait::Channel,
                Trait::InputSelector,
                Trait::AppSelector,
                Trait::TransportControl
            ],
            device.traits(&item)
        );
        assert_eq!(
            json!({
                "on": true,
                "currentVolume": 12,
                "isMuted": false,
                "channelNumber": "20",
                "channelName": "Channel 1",
                "currentInput": "hdmi1",
                "currentApplication": "netflix"
            }),
            Value::Object(device.state(&item))
        );
    }

    #[test]
    fn tv_attributes() {
        let item = tv();
        let device = find_device_type(&item).expect("no device type");
        let attributes = device.attributes(&item);
        assert_eq!(Some(&json!(true)), attributes.get("volumeCanMuteAndUnmute"));
        assert_eq!(Some(&json!(50)), attributes.get("volumeMaxLevel"));
        assert_eq!(
            json!([
                { "key": "20", "names": ["Channel 1", "First"], "number": "20" },
                { "key": "30", "names": ["Channel 2"], "number": "30" }
            ]),
            attributes["availableChannels"]
        );
        assert_eq!(
            json!([
                { "key": "hdmi1", "names": [{ "name_synonym": ["HDMI 1", "Playstation"], "lang": "en" }] },
                { "key": "tv", "names": [{ "name_synonym": ["TV"], "lang": "en" }] }
            ]),
            attributes["availableInputs"]
        );
        assert_eq!(
            json!(["NEXT", "PREVIOUS", "PAUSE", "RESUME"]),
            attributes["transportControlSupportedCommands"]
        );
    }

    #[test]
    fn find_entry_by_key_or_name() {
        let entries = parse_list("20=Channel 1:First,30=Channel 2");
        assert_eq!(Some("20"), find_entry(&entries, "first").map(|e| e.key.as_str()));
        assert_eq!(Some("30"), find_entry(&entries, "30").map(|e| e.key.as_str()));
        assert_eq!(None, find_entry(&entries, "Channel 3"));
    }

    #[test]
    fn speaker() {
        let item = item(json!({
            "name": "Speaker", "type": "Dimmer", "state": "35",
            "metadata": { "ga": { "value": "Speaker" } }
        }));
        let device = find_device_type(&item).expect("no device type");
        assert_eq!(json!({"currentVolume": 35}), Value::Object(device.state(&item)));
        assert_eq!(
            json!({"volumeCanMuteAndUnmute": false, "volumeMaxLevel": 100}),
            Value::Object(device.attributes(&item))
        );
    }
}
