// Copyright (c) 2026 Unfolded Circle ApS, Markus Zehnder <markus.z@unfoldedcircle.com>
// SPDX-License-Identifier: MPL-2.0

//! Brightness and color commands.

use crate::commands::{CommandHandler, Context, states};
use crate::devices::Family;
use crate::devices::light::{
    ColorTemperature, ROLE_BRIGHTNESS, ROLE_COLOR, ROLE_COLOR_TEMPERATURE, format_hsb,
    kelvin_to_hsv, parse_hsb,
};
use crate::errors::ServiceError;
use crate::util::color::{Hsv, color_rgb_to_hsv, rgb_from_int};
use crate::util::json::{number, number_string};
use serde::Deserialize;
use serde_json::{Map, Value, json};

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BrightnessAbsolute {
    pub brightness: f64,
}

impl CommandHandler for BrightnessAbsolute {
    fn item_name(&self, ctx: &Context) -> Result<String, ServiceError> {
        ctx.member_or_device(&[ROLE_BRIGHTNESS])
    }

    fn convert_value(&self, _ctx: &Context) -> Result<Option<String>, ServiceError> {
        Ok(Some(number_string(self.brightness.round())))
    }

    fn response_states(&self, _ctx: &Context) -> Result<Map<String, Value>, ServiceError> {
        Ok(states("brightness", number(self.brightness.round())))
    }
}

fn ensure_color_light(ctx: &Context) -> Result<(), ServiceError> {
    match ctx.family() {
        Some(Family::ColorLight | Family::SpecialColorLight) => Ok(()),
        _ => Err(ServiceError::not_supported(format!(
            "{} is not a color light",
            ctx.device.id
        ))),
    }
}

/// Current brightness 0..1 of a color item, full brightness if unknown.
fn current_brightness(ctx: &Context, color_item: &str) -> f64 {
    ctx.target_item(color_item)
        .and_then(|i| parse_hsb(&i.state))
        .map(|hsv| hsv.value)
        .filter(|v| *v > 0.0)
        .unwrap_or(1.0)
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TemperatureColor {
    pub temperature: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ColorAbsoluteTemperature {
    pub color: TemperatureColor,
}

impl CommandHandler for ColorAbsoluteTemperature {
    fn requires_item(&self, _ctx: &Context) -> bool {
        true
    }

    fn item_name(&self, ctx: &Context) -> Result<String, ServiceError> {
        ensure_color_light(ctx)?;
        if ctx.family() == Some(Family::SpecialColorLight) {
            return ctx.required_member(&[ROLE_COLOR_TEMPERATURE, ROLE_COLOR]);
        }
        Ok(ctx.device.id.clone())
    }

    fn convert_value(&self, ctx: &Context) -> Result<Option<String>, ServiceError> {
        ensure_color_light(ctx)?;
        let kelvin = self.color.temperature;
        if ctx.family() == Some(Family::SpecialColorLight)
            && ctx.member(ROLE_COLOR_TEMPERATURE).is_some()
        {
            let temperature = ColorTemperature::from_item(ctx.item()?);
            return Ok(Some(number_string(temperature.kelvin_to_value(kelvin))));
        }

        let target = self.item_name(ctx)?;
        let mut hsv = kelvin_to_hsv(kelvin);
        hsv.value = current_brightness(ctx, &target);
        Ok(Some(format_hsb(hsv)))
    }

    fn response_states(&self, _ctx: &Context) -> Result<Map<String, Value>, ServiceError> {
        Ok(states(
            "color",
            json!({ "temperatureK": number(self.color.temperature) }),
        ))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct SpectrumHsv {
    pub hue: f64,
    pub saturation: f64,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SpectrumColor {
    #[serde(default, rename = "spectrumHSV")]
    pub spectrum_hsv: Option<SpectrumHsv>,
    #[serde(default, rename = "spectrumRGB")]
    pub spectrum_rgb: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ColorAbsolute {
    pub color: SpectrumColor,
}

impl ColorAbsolute {
    /// Either a hsv or a rgb color is required.
    pub fn is_valid(&self) -> bool {
        self.color.spectrum_hsv.is_some() || self.color.spectrum_rgb.is_some()
    }

    fn hsv(&self) -> Option<Hsv> {
        match (self.color.spectrum_hsv, self.color.spectrum_rgb) {
            (Some(c), _) => Some(Hsv::new(c.hue, c.saturation, c.value)),
            (None, Some(rgb)) => Some(color_rgb_to_hsv(rgb_from_int(rgb))),
            (None, None) => None,
        }
    }
}

impl CommandHandler for ColorAbsolute {
    fn item_name(&self, ctx: &Context) -> Result<String, ServiceError> {
        ensure_color_light(ctx)?;
        if ctx.family() == Some(Family::SpecialColorLight) {
            return ctx.required_member(&[ROLE_COLOR]);
        }
        Ok(ctx.device.id.clone())
    }

    fn convert_value(&self, ctx: &Context) -> Result<Option<String>, ServiceError> {
        ensure_color_light(ctx)?;
        let hsv = self
            .hsv()
            .ok_or_else(|| ServiceError::not_supported("Missing color value"))?;
        Ok(Some(format_hsb(hsv)))
    }

    fn response_states(&self, _ctx: &Context) -> Result<Map<String, Value>, ServiceError> {
        let mut color = Map::new();
        if let Some(hsv) = self.color.spectrum_hsv {
            color.insert(
                "spectrumHsv".into(),
                json!({ "hue": hsv.hue, "saturation": hsv.saturation, "value": hsv.value }),
            );
        }
        if let Some(rgb) = self.color.spectrum_rgb {
            color.insert("spectrumRgb".into(), rgb.into());
        }
        Ok(states("color", color))
    }
}
