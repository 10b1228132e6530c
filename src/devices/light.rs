// Copyright (c) 2026 Unfolded Circle ApS, Markus Zehnder <markus.z@unfoldedcircle.com>
// SPDX-License-Identifier: MPL-2.0

//! Light devices: dimmable, color and composite color lights.

use crate::client::Item;
use crate::devices::{Members, is_on};
use crate::google::Trait;
use crate::util::color::{
    Hsv, color_hsv_to_rgb, color_rgb_to_hsv, kelvin_to_rgb, mired_to_kelvin, rgb_to_kelvin,
};
use crate::util::json::number;
use crate::util::parse::parse_range;
use serde_json::{Map, Value, json};

pub const ROLE_POWER: &str = "lightPower";
pub const ROLE_BRIGHTNESS: &str = "lightBrightness";
pub const ROLE_COLOR: &str = "lightColor";
pub const ROLE_COLOR_TEMPERATURE: &str = "lightColorTemperature";

pub(super) const ROLES: &[&str] = &[
    ROLE_POWER,
    ROLE_BRIGHTNESS,
    ROLE_COLOR,
    ROLE_COLOR_TEMPERATURE,
];

/// Default color temperature range of composite lights in Kelvin.
const DEF_TEMPERATURE_RANGE: (f64, f64) = (2000.0, 9000.0);

/// Max hue / saturation deviation of a color to be reported as color temperature.
const WHITE_HUE_TOLERANCE: f64 = 5.0;
const WHITE_SATURATION_TOLERANCE: f64 = 0.05;

/// Unit of a color temperature item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorUnit {
    /// 0..100 % of the configured Kelvin range.
    Percent,
    Kelvin,
    Mired,
}

/// Color temperature conversion settings of a light.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorTemperature {
    pub min_k: f64,
    pub max_k: f64,
    pub unit: ColorUnit,
    /// Percent values: 0 % is the warmest instead of the coldest temperature.
    pub inverted: bool,
}

impl ColorTemperature {
    /// Settings of a composite light: the range defaults to 2000..9000 K.
    pub fn from_item(item: &Item) -> Self {
        let config = item.config();
        let (min_k, max_k) = configured_range(item).unwrap_or(DEF_TEMPERATURE_RANGE);
        let unit = match config.str("colorUnit").map(str::to_ascii_lowercase).as_deref() {
            Some("kelvin") => ColorUnit::Kelvin,
            Some("mired") => ColorUnit::Mired,
            _ => ColorUnit::Percent,
        };
        Self {
            min_k,
            max_k,
            unit,
            inverted: config.bool("colorTemperatureInverted"),
        }
    }

    /// Convert an item value to Kelvin.
    pub fn to_kelvin(&self, value: f64) -> f64 {
        match self.unit {
            ColorUnit::Kelvin => value,
            ColorUnit::Mired => mired_to_kelvin(value) as f64,
            ColorUnit::Percent => {
                let percent = value.clamp(0.0, 100.0);
                let percent = if self.inverted { 100.0 - percent } else { percent };
                (self.min_k + (self.max_k - self.min_k) * percent / 100.0).round()
            }
        }
    }

    /// Convert Kelvin to an item value.
    pub fn kelvin_to_value(&self, kelvin: f64) -> f64 {
        match self.unit {
            ColorUnit::Kelvin => kelvin.round(),
            ColorUnit::Mired => crate::util::color::kelvin_to_mired(kelvin) as f64,
            ColorUnit::Percent => {
                let kelvin = kelvin.clamp(self.min_k, self.max_k);
                let percent = ((kelvin - self.min_k) / (self.max_k - self.min_k) * 100.0).round();
                if self.inverted { 100.0 - percent } else { percent }
            }
        }
    }
}

/// Configured `colorTemperatureRange` in Kelvin.
pub fn configured_range(item: &Item) -> Option<(f64, f64)> {
    item.config()
        .str("colorTemperatureRange")
        .and_then(parse_range)
}

/// Parse an openHAB HSB state `hue,saturation%,brightness%` into a Google hsv color.
pub fn parse_hsb(state: &str) -> Option<Hsv> {
    let mut parts = state.split(',').map(|p| p.trim().parse::<f64>().ok());
    let hue = parts.next()??;
    let saturation = parts.next()??;
    let brightness = parts.next()??;
    if parts.next().is_some() {
        return None;
    }
    Some(Hsv::new(hue, saturation / 100.0, brightness / 100.0))
}

/// Format a Google hsv color as openHAB HSB command.
pub fn format_hsb(hsv: Hsv) -> String {
    let value = |v: f64| crate::util::json::number_string(crate::util::color::round(v, 2));
    format!(
        "{},{},{}",
        value(hsv.hue),
        value(hsv.saturation * 100.0),
        value(hsv.value * 100.0)
    )
}

/// Google hsv color of a Kelvin color temperature.
pub fn kelvin_to_hsv(kelvin: f64) -> Hsv {
    color_rgb_to_hsv(kelvin_to_rgb(kelvin))
}

/// Color temperature of a white color within the given range.
fn white_temperature(hsv: Hsv, (min_k, max_k): (f64, f64)) -> Option<u32> {
    let kelvin = rgb_to_kelvin(color_hsv_to_rgb(Hsv::new(hsv.hue, hsv.saturation, 1.0)));
    if (kelvin as f64) < min_k || kelvin as f64 > max_k {
        return None;
    }
    let white = kelvin_to_hsv(kelvin as f64);
    let hue_delta = (white.hue - hsv.hue).abs();
    let hue_delta = hue_delta.min(360.0 - hue_delta);
    if hue_delta <= WHITE_HUE_TOLERANCE
        && (white.saturation - hsv.saturation).abs() <= WHITE_SATURATION_TOLERANCE
    {
        Some(kelvin)
    } else {
        None
    }
}

fn spectrum_hsv(hsv: Hsv) -> Value {
    json!({
        "spectrumHSV": {
            "hue": number(hsv.hue),
            "saturation": number(hsv.saturation),
            "value": number(hsv.value)
        }
    })
}

fn temperature_range_attribute((min_k, max_k): (f64, f64)) -> Value {
    json!({
        "temperatureMinK": number(min_k),
        "temperatureMaxK": number(max_k)
    })
}

pub(super) fn dimmable_state(item: &Item) -> Map<String, Value> {
    let brightness = item.number().unwrap_or_default().round();
    let mut state = Map::new();
    state.insert("on".into(), (brightness > 0.0 || item.state == "ON").into());
    state.insert("brightness".into(), number(brightness));
    state
}

pub(super) fn color_attributes(item: &Item) -> Map<String, Value> {
    let mut attributes = Map::new();
    attributes.insert("colorModel".into(), "hsv".into());
    if let Some(range) = configured_range(item) {
        attributes.insert(
            "colorTemperatureRange".into(),
            temperature_range_attribute(range),
        );
    }
    attributes
}

pub(super) fn color_state(item: &Item) -> Map<String, Value> {
    let mut state = Map::new();
    let Some(hsv) = parse_hsb(&item.state) else {
        state.insert("on".into(), false.into());
        state.insert("brightness".into(), 0.into());
        return state;
    };
    state.insert("on".into(), (hsv.value > 0.0).into());
    state.insert("brightness".into(), number((hsv.value * 100.0).round()));

    let temperature = configured_range(item).and_then(|range| white_temperature(hsv, range));
    let color = match temperature {
        Some(kelvin) => json!({ "temperatureK": kelvin }),
        None => spectrum_hsv(hsv),
    };
    state.insert("color".into(), color);
    state
}

pub(super) fn special_color_traits(members: &Members) -> Vec<Trait> {
    let mut traits = Vec::with_capacity(3);
    if members.has(ROLE_POWER) || members.has(ROLE_BRIGHTNESS) {
        traits.push(Trait::OnOff);
    }
    if members.has(ROLE_BRIGHTNESS) {
        traits.push(Trait::Brightness);
    }
    if members.has(ROLE_COLOR) || members.has(ROLE_COLOR_TEMPERATURE) {
        traits.push(Trait::ColorSetting);
    }
    traits
}

pub(super) fn special_color_attributes(item: &Item, members: &Members) -> Map<String, Value> {
    let mut attributes = Map::new();
    if members.has(ROLE_COLOR) {
        attributes.insert("colorModel".into(), "hsv".into());
    }
    if members.has(ROLE_COLOR_TEMPERATURE) || configured_range(item).is_some() {
        let temperature = ColorTemperature::from_item(item);
        attributes.insert(
            "colorTemperatureRange".into(),
            temperature_range_attribute((temperature.min_k, temperature.max_k)),
        );
    }
    attributes
}

pub(super) fn special_color_state(item: &Item, members: &Members) -> Map<String, Value> {
    let mut state = Map::new();
    let brightness = members.get(ROLE_BRIGHTNESS).and_then(Item::number);
    let color = members.get(ROLE_COLOR).and_then(|c| parse_hsb(&c.state));

    let on = match members.get(ROLE_POWER) {
        Some(power) => is_on(power),
        None => brightness.map(|b| b > 0.0).unwrap_or_default(),
    };
    state.insert("on".into(), on.into());
    if let Some(brightness) = brightness {
        state.insert("brightness".into(), number(brightness.round()));
    }

    match (color, members.get(ROLE_COLOR_TEMPERATURE)) {
        (Some(hsv), _) if hsv.saturation > 0.0 => {
            state.insert("color".into(), spectrum_hsv(hsv));
        }
        (_, Some(temperature_item)) => {
            if let Some(value) = temperature_item.number() {
                let kelvin = ColorTemperature::from_item(item).to_kelvin(value);
                state.insert("color".into(), json!({ "temperatureK": number(kelvin) }));
            }
        }
        (Some(hsv), None) => {
            state.insert("color".into(), spectrum_hsv(hsv));
        }
        (None, None) => {}
    }
    state
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::devices::tests::{group, item, member};
    use crate::devices::find_device_type;
    use rstest::rstest;

    fn color_item(state: &str, config: Value) -> Item {
        item(json!({
            "name": "Bulb", "type": "Color", "state": state,
            "metadata": { "ga": { "value": "Light", "config": config } }
        }))
    }

    #[rstest]
    #[case("0", json!({"on": false, "brightness": 0}))]
    #[case("42", json!({"on": true, "brightness": 42}))]
    #[case("NULL", json!({"on": false, "brightness": 0}))]
    fn dimmable_light_state(#[case] state: &str, #[case] expected: Value) {
        let item = item(json!({"name": "Dimmer", "type": "Dimmer", "state": state}));
        assert_eq!(expected, Value::Object(dimmable_state(&item)));
    }

    #[test]
    fn color_light_reports_hsv() {
        let item = color_item("120,50,80", json!({}));
        assert_eq!(
            json!({
                "on": true,
                "brightness": 80,
                "color": { "spectrumHSV": { "hue": 120, "saturation": 0.5, "value": 0.8 } }
            }),
            Value::Object(color_state(&item))
        );
    }

    #[test]
    fn color_light_off() {
        let item = color_item("120,50,0", json!({}));
        let state = color_state(&item);
        assert_eq!(Some(&json!(false)), state.get("on"));
        assert_eq!(Some(&json!(0)), state.get("brightness"));
    }

    #[test]
    fn color_light_reports_white_as_temperature_with_range() {
        let hsv = kelvin_to_hsv(2700.0);
        let state = format!("{},{},100", hsv.hue, hsv.saturation * 100.0);

        let item = color_item(&state, json!({"colorTemperatureRange": "2000,6500"}));
        let state = color_state(&item);
        let kelvin = state["color"]["temperatureK"].as_f64().expect("no temperature");
        assert!((kelvin - 2700.0).abs() < 100.0, "unexpected temperature {kelvin}");

        // without range only hsv is reported
        let item = color_item(&format!("{},{},100", hsv.hue, hsv.saturation * 100.0), json!({}));
        assert!(color_state(&item)["color"].get("spectrumHSV").is_some());
    }

    #[test]
    fn color_light_reports_saturated_color_as_hsv_with_range() {
        let item = color_item("240,100,100", json!({"colorTemperatureRange": "2000,6500"}));
        assert!(color_state(&item)["color"].get("spectrumHSV").is_some());
    }

    #[test]
    fn color_light_attributes() {
        let item = color_item("0,0,0", json!({"colorTemperatureRange": "2000,6500"}));
        assert_eq!(
            json!({
                "colorModel": "hsv",
                "colorTemperatureRange": { "temperatureMinK": 2000, "temperatureMaxK": 6500 }
            }),
            Value::Object(color_attributes(&item))
        );
    }

    #[rstest]
    #[case("120,50,80", Some((120.0, 0.5, 0.8)))]
    #[case(" 0 , 0 , 100 ", Some((0.0, 0.0, 1.0)))]
    #[case("120,50", None)]
    #[case("ON", None)]
    #[case("1,2,3,4", None)]
    fn test_parse_hsb(#[case] state: &str, #[case] expected: Option<(f64, f64, f64)>) {
        assert_eq!(
            expected,
            parse_hsb(state).map(|hsv| (hsv.hue, hsv.saturation, hsv.value))
        );
    }

    #[test]
    fn test_format_hsb() {
        assert_eq!("120,50,80", format_hsb(Hsv::new(120.0, 0.5, 0.8)));
        assert_eq!("33.33,50,100", format_hsb(Hsv::new(33.333, 0.5, 1.0)));
    }

    #[rstest]
    #[case(ColorUnit::Percent, false, 0.0, 2000.0)]
    #[case(ColorUnit::Percent, false, 50.0, 5500.0)]
    #[case(ColorUnit::Percent, true, 0.0, 9000.0)]
    #[case(ColorUnit::Kelvin, false, 3000.0, 3000.0)]
    #[case(ColorUnit::Mired, false, 250.0, 4000.0)]
    fn color_temperature_to_kelvin(
        #[case] unit: ColorUnit,
        #[case] inverted: bool,
        #[case] value: f64,
        #[case] expected: f64,
    ) {
        let temperature = ColorTemperature {
            min_k: 2000.0,
            max_k: 9000.0,
            unit,
            inverted,
        };
        assert_eq!(expected, temperature.to_kelvin(value));
        assert_eq!(value, temperature.kelvin_to_value(expected));
    }

    fn special_light(members: Value, config: Value) -> Item {
        group("Light", "SpecialColorLight", config, members)
    }

    #[test]
    fn special_color_light_traits_and_state() {
        let item = special_light(
            json!([
                member("Power", "Switch", "lightPower", "ON"),
                member("Brightness", "Dimmer", "lightBrightness", "40"),
                member("Temperature", "Dimmer", "lightColorTemperature", "0"),
            ]),
            json!({"colorUnit": "percent", "colorTemperatureInverted": true}),
        );
        let device = find_device_type(&item).expect("no device type");
        assert_eq!("SpecialColorLight", device.name);
        assert_eq!(
            vec![Trait::OnOff, Trait::Brightness, Trait::ColorSetting],
            device.traits(&item)
        );
        assert_eq!(
            json!({"colorTemperatureRange": { "temperatureMinK": 2000, "temperatureMaxK": 9000 }}),
            Value::Object(device.attributes(&item))
        );
        assert_eq!(
            json!({"on": true, "brightness": 40, "color": { "temperatureK": 9000 }}),
            Value::Object(device.state(&item))
        );
    }

    #[test]
    fn special_color_light_prefers_saturated_color() {
        let item = special_light(
            json!([
                member("Brightness", "Dimmer", "lightBrightness", "0"),
                member("Color", "Color", "lightColor", "10,100,50"),
                member("Temperature", "Number", "lightColorTemperature", "3000"),
            ]),
            json!({"colorUnit": "kelvin"}),
        );
        let device = find_device_type(&item).expect("no device type");
        let state = device.state(&item);
        assert_eq!(Some(&json!(false)), state.get("on"));
        assert_eq!(
            json!({"spectrumHSV": { "hue": 10, "saturation": 1, "value": 0.5 }}),
            state["color"]
        );

        let item = special_light(
            json!([
                member("Color", "Color", "lightColor", "10,0,50"),
                member("Temperature", "Number", "lightColorTemperature", "3000"),
            ]),
            json!({"colorUnit": "kelvin"}),
        );
        assert_eq!(
            json!({"temperatureK": 3000}),
            device.state(&item)["color"]
        );
    }
}
