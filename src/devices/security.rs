// Copyright (c) 2026 Unfolded Circle ApS, Markus Zehnder <markus.z@unfoldedcircle.com>
// SPDX-License-Identifier: MPL-2.0

//! Security systems and locks.

use crate::client::Item;
use crate::devices::{Members, ROLE_ZONE, is_on, lang};
use crate::google::Trait;
use crate::util::parse::parse_list;
use serde_json::{Map, Value, json};

pub const ROLE_ARMED: &str = "securitySystemArmed";
pub const ROLE_ARM_LEVEL: &str = "securitySystemArmLevel";
pub const ROLE_TROUBLE: &str = "securitySystemTrouble";
pub const ROLE_TROUBLE_CODE: &str = "securitySystemTroubleCode";

pub(super) const ROLES: &[&str] = &[
    ROLE_ARMED,
    ROLE_ARM_LEVEL,
    ROLE_ZONE,
    ROLE_TROUBLE,
    ROLE_TROUBLE_CODE,
];

/// Status code of an active trouble without trouble code member.
const DEF_TROUBLE_CODE: &str = "unknownIssue";

/// Current security system state derived from an item snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct SecurityState {
    pub is_armed: bool,
    pub arm_level: Option<String>,
    pub status_report: Vec<Value>,
}

impl SecurityState {
    pub fn from_item(item: &Item) -> Self {
        let members = Members::discover(item, ROLES);
        let inverted = item.config().bool("inverted");

        let armed_item = if members.is_empty() {
            Some(item)
        } else {
            members.get(ROLE_ARMED)
        };
        let is_armed = armed_item.map(|i| is_on(i) != inverted).unwrap_or_default();
        let arm_level = members
            .get(ROLE_ARM_LEVEL)
            .filter(|l| l.has_state())
            .map(|l| l.state.clone());

        Self {
            is_armed,
            arm_level,
            status_report: status_report(item, &members),
        }
    }

    /// Google `ArmDisarm` state including the status report.
    pub fn to_state(&self) -> Map<String, Value> {
        let mut state = Map::new();
        state.insert("isArmed".into(), self.is_armed.into());
        if let Some(level) = &self.arm_level {
            state.insert("currentArmLevel".into(), level.as_str().into());
        }
        state.insert(
            "currentStatusReport".into(),
            Value::Array(self.status_report.clone()),
        );
        state
    }
}

/// One entry per active trouble and per active zone.
///
/// Zone status codes are derived from the zone's `zoneType` configuration. Troubles have priority
/// 0, zones priority 1.
fn status_report(item: &Item, members: &Members) -> Vec<Value> {
    let mut report = Vec::new();

    if members.get(ROLE_TROUBLE).is_some_and(is_on) {
        let code = members
            .get(ROLE_TROUBLE_CODE)
            .filter(|c| c.has_state())
            .map(|c| c.state.as_str())
            .unwrap_or(DEF_TROUBLE_CODE);
        report.push(json!({
            "blocking": false,
            "deviceTarget": item.name,
            "priority": 0,
            "statusCode": code,
        }));
    }

    for zone in members.all(ROLE_ZONE) {
        if !matches!(zone.state.as_str(), "ON" | "OPEN") {
            continue;
        }
        let config = zone.config();
        let status_code = match config.str("zoneType") {
            Some("OpenClose") => "deviceOpen",
            Some("Motion") => "motionDetected",
            _ => "notSupported",
        };
        report.push(json!({
            "blocking": config.bool("blocking"),
            "deviceTarget": zone.name,
            "priority": 1,
            "statusCode": status_code,
        }));
    }
    report
}

pub(super) fn security_system_traits(members: &Members) -> Vec<Trait> {
    if members.has(ROLE_TROUBLE) || members.has(ROLE_ZONE) {
        vec![Trait::ArmDisarm, Trait::StatusReport]
    } else {
        vec![Trait::ArmDisarm]
    }
}

pub(super) fn security_system_attributes(item: &Item) -> Map<String, Value> {
    let config = item.config();
    let mut attributes = Map::new();
    let levels = config.str("armLevels").map(parse_list).unwrap_or_default();
    if levels.is_empty() {
        return attributes;
    }
    let lang = lang(item);
    let levels: Vec<Value> = levels
        .iter()
        .map(|level| {
            json!({
                "level_name": level.key,
                "level_values": [{ "level_synonym": level.values, "lang": lang }]
            })
        })
        .collect();
    attributes.insert(
        "availableArmLevels".into(),
        json!({ "levels": levels, "ordered": config.bool("ordered") }),
    );
    attributes
}

pub(super) fn security_system_state(item: &Item, _members: &Members) -> Map<String, Value> {
    SecurityState::from_item(item).to_state()
}

pub(super) fn lock_state(item: &Item) -> Map<String, Value> {
    let locked = matches!(item.state.as_str(), "ON" | "CLOSED");
    let mut state = Map::new();
    state.insert(
        "isLocked".into(),
        (locked != item.config().bool("inverted")).into(),
    );
    state.insert("isJammed".into(), false.into());
    state
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::devices::find_device_type;
    use crate::devices::tests::{group, item, member};
    use rstest::rstest;

    fn zone(name: &str, state: &str, zone_type: &str, blocking: bool) -> Value {
        json!({
            "name": name, "type": "Contact", "state": state,
            "metadata": { "ga": {
                "value": "securitySystemZone",
                "config": { "zoneType": zone_type, "blocking": blocking }
            } }
        })
    }

    fn alarm(members: Value) -> Item {
        group(
            "Alarm",
            "SecuritySystem",
            json!({"armLevels": "L1=home:stay,L2=away", "ordered": true}),
            members,
        )
    }

    #[test]
    fn security_system_group() {
        let item = alarm(json!([
            member("Armed", "Switch", "securitySystemArmed", "ON"),
            member("Level", "String", "securitySystemArmLevel", "L2"),
            member("Trouble", "Switch", "securitySystemTrouble", "OFF"),
            zone("Door", "OPEN", "OpenClose", true),
            zone("Motion", "ON", "Motion", false),
            zone("Window", "CLOSED", "OpenClose", true),
        ]));
        let device = find_device_type(&item).expect("no device type");
        assert_eq!("SecuritySystem", device.name);
        assert_eq!(vec![Trait::ArmDisarm, Trait::StatusReport], device.traits(&item));
        assert_eq!(
            json!({
                "isArmed": true,
                "currentArmLevel": "L2",
                "currentStatusReport": [
                    { "blocking": true, "deviceTarget": "Door", "priority": 1, "statusCode": "deviceOpen" },
                    { "blocking": false, "deviceTarget": "Motion", "priority": 1, "statusCode": "motionDetected" }
                ]
            }),
            Value::Object(device.state(&item))
        );
        assert_eq!(
            json!({
                "availableArmLevels": {
                    "levels": [
                        { "level_name": "L1", "level_values": [{ "level_synonym": ["home", "stay"], "lang": "en" }] },
                        { "level_name": "L2", "level_values": [{ "level_synonym": ["away"], "lang": "en" }] }
                    ],
                    "ordered": true
                }
            }),
            Value::Object(device.attributes(&item))
        );
    }

    #[test]
    fn security_system_trouble() {
        let item = alarm(json!([
            member("Armed", "Switch", "securitySystemArmed", "OFF"),
            member("Trouble", "Switch", "securitySystemTrouble", "ON"),
            member("TroubleCode", "String", "securitySystemTroubleCode", "lowBattery"),
        ]));
        let state = SecurityState::from_item(&item);
        assert!(!state.is_armed);
        assert_eq!(None, state.arm_level);
        assert_eq!(
            vec![json!({
                "blocking": false,
                "deviceTarget": "Alarm",
                "priority": 0,
                "statusCode": "lowBattery"
            })],
            state.status_report
        );
    }

    #[rstest]
    #[case("ON", false, true)]
    #[case("ON", true, false)]
    #[case("OFF", true, true)]
    fn security_system_switch(#[case] state: &str, #[case] inverted: bool, #[case] armed: bool) {
        let item = item(json!({
            "name": "Alarm", "type": "Switch", "state": state,
            "metadata": { "ga": { "value": "SecuritySystem", "config": { "inverted": inverted } } }
        }));
        let device = find_device_type(&item).expect("no device type");
        assert_eq!(vec![Trait::ArmDisarm], device.traits(&item));
        assert_eq!(
            json!({"isArmed": armed, "currentStatusReport": []}),
            Value::Object(device.state(&item))
        );
    }

    #[rstest]
    #[case("Switch", "ON", false, true)]
    #[case("Switch", "OFF", false, false)]
    #[case("Contact", "CLOSED", false, true)]
    #[case("Contact", "OPEN", false, false)]
    #[case("Switch", "ON", true, false)]
    fn lock(#[case] item_type: &str, #[case] state: &str, #[case] inverted: bool, #[case] locked: bool) {
        let item = item(json!({
            "name": "Lock", "type": item_type, "state": state,
            "metadata": { "ga": { "value": "Lock", "config": { "inverted": inverted } } }
        }));
        let device = find_device_type(&item).expect("no device type");
        assert_eq!(
            json!({"isLocked": locked, "isJammed": false}),
            Value::Object(device.state(&item))
        );
    }
}
