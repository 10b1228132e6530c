// Copyright (c) 2022 Unfolded Circle ApS, Markus Zehnder <markus.z@unfoldedcircle.com>
// SPDX-License-Identifier: MPL-2.0

//! Color util methods.
//!
//! HSV helpers converted from https://github.com/python/cpython/blob/3.12/Lib/colorsys.py
//! Color temperature approximation from Tanner Helland's
//! [blackbody algorithm](https://tannerhelland.com/2012/09/18/convert-temperature-rgb-algorithm-code.html).

use derive_more::Constructor;

/// RGB color with components in the range 0..255.
#[derive(Constructor, Debug, Clone, Copy, PartialEq)]
pub struct Rgb {
    pub r: f64,
    pub g: f64,
    pub b: f64,
}

/// HSV color as used by Google's `spectrumHsv`.
///
/// - hue: 0..360
/// - saturation: 0..1
/// - value: 0..1
#[derive(Constructor, Debug, Clone, Copy, PartialEq)]
pub struct Hsv {
    pub hue: f64,
    pub saturation: f64,
    pub value: f64,
}

/// Lowest color temperature in Kelvin used by the RGB approximation.
pub const MIN_KELVIN: f64 = 1000.0;
/// Highest color temperature in Kelvin used by the RGB approximation.
pub const MAX_KELVIN: f64 = 40000.0;

/// Approximate the RGB color of a black body radiator with the given temperature in Kelvin.
pub fn kelvin_to_rgb(kelvin: f64) -> Rgb {
    let temp = kelvin / 100.0;
    let r = if temp <= 66.0 {
        255.0
    } else {
        329.698727446 * (temp - 60.0).powf(-0.1332047592)
    };
    let g = if temp <= 66.0 {
        99.4708025861 * temp.ln() - 161.1195681661
    } else {
        288.1221695283 * (temp - 60.0).powf(-0.0755148492)
    };
    let b = if temp >= 66.0 {
        255.0
    } else if temp <= 19.0 {
        0.0
    } else {
        138.5177312231 * (temp - 10.0).ln() - 305.0447927307
    };

    Rgb::new(
        r.clamp(0.0, 255.0),
        g.clamp(0.0, 255.0),
        b.clamp(0.0, 255.0),
    )
}

/// Estimate the color temperature in Kelvin of an RGB color.
///
/// Binary search over [`kelvin_to_rgb`] comparing the blue / red ratio.
pub fn rgb_to_kelvin(rgb: Rgb) -> u32 {
    const EPSILON: f64 = 0.4;

    if rgb.r <= 0.0 {
        return MAX_KELVIN as u32;
    }
    let target = rgb.b / rgb.r;
    let mut min = MIN_KELVIN;
    let mut max = MAX_KELVIN;
    let mut temperature = (max + min) / 2.0;
    while max - min > EPSILON {
        temperature = (max + min) / 2.0;
        let test = kelvin_to_rgb(temperature);
        if test.b / test.r >= target {
            max = temperature;
        } else {
            min = temperature;
        }
    }

    temperature.round() as u32
}

/// Convert a color temperature from Kelvin to Mired.
pub fn kelvin_to_mired(kelvin: f64) -> u32 {
    if kelvin <= 0.0 {
        return 0;
    }
    (1_000_000.0 / kelvin).round() as u32
}

/// Convert a color temperature from Mired to Kelvin.
pub fn mired_to_kelvin(mired: f64) -> u32 {
    if mired <= 0.0 {
        return 0;
    }
    (1_000_000.0 / mired).round() as u32
}

/// Convert an rgb color to its Google hsv representation.
pub fn color_rgb_to_hsv(rgb: Rgb) -> Hsv {
    let (h, s, v) = rgb_to_hsv(rgb.r / 255.0, rgb.g / 255.0, rgb.b / 255.0);
    Hsv::new(round(h * 360., 3), round(s, 5), round(v, 5))
}

/// Convert a Google hsv color to rgb with components 0..255.
pub fn color_hsv_to_rgb(hsv: Hsv) -> Rgb {
    let (r, g, b) = hsv_to_rgb(
        (hsv.hue / 360.0).rem_euclid(1.0),
        hsv.saturation,
        hsv.value,
    );
    Rgb::new(r * 255.0, g * 255.0, b * 255.0)
}

/// Convert a 24 bit integer color (`0xRRGGBB`) to rgb.
pub fn rgb_from_int(color: u32) -> Rgb {
    Rgb::new(
        ((color >> 16) & 0xff) as f64,
        ((color >> 8) & 0xff) as f64,
        (color & 0xff) as f64,
    )
}

// HSV: Hue, Saturation, Value
// H: position in the spectrum
// S: color saturation ("purity")
// V: color brightness

pub fn rgb_to_hsv(r: f64, g: f64, b: f64) -> (f64, f64, f64) {
    let maxc = r.max(g).max(b);
    let minc = r.min(g).min(b);
    let rangec = maxc - minc;
    let v = maxc;

    if minc == maxc {
        return (0.0, 0.0, v);
    }
    let s = rangec / maxc;
    let rc = (maxc - r) / rangec;
    let gc = (maxc - g) / rangec;
    let bc = (maxc - b) / rangec;
    let h = if r == maxc {
        bc - gc
    } else if g == maxc {
        2.0 + rc - bc
    } else {
        4.0 + gc - rc
    };

    // Python's modulo takes the sign of the divisor, Rust's `%` the sign of the dividend
    (((h / 6.0).rem_euclid(1.0)), s, v)
}

pub fn hsv_to_rgb(h: f64, s: f64, v: f64) -> (f64, f64, f64) {
    if s == 0.0 {
        return (v, v, v);
    }
    let i = (h * 6.0).floor();
    let f = h * 6.0 - i;
    let p = v * (1.0 - s);
    let q = v * (1.0 - s * f);
    let t = v * (1.0 - s * (1.0 - f));
    match (i as i64).rem_euclid(6) {
        0 => (v, t, p),
        1 => (q, v, p),
        2 => (p, v, t),
        3 => (p, q, v),
        4 => (t, p, v),
        _ => (v, p, q),
    }
}

pub fn round(x: f64, decimals: u32) -> f64 {
    let y = 10i32.pow(decimals) as f64;
    (x * y).round() / y
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case((0., 0., 0.), 0., 0., 0.)]
    #[case((0., 0., 1.), 255., 255., 255.)]
    #[case((240., 1., 1.), 0., 0., 255.)]
    #[case((120., 1., 1.), 0., 255., 0.)]
    #[case((0., 1., 1.), 255., 0., 0.)]
    fn test_color_rgb_to_hsv(
        #[case] expected: (f64, f64, f64),
        #[case] r: f64,
        #[case] g: f64,
        #[case] b: f64,
    ) {
        let hsv = color_rgb_to_hsv(Rgb::new(r, g, b));
        assert_eq!(expected, (hsv.hue, hsv.saturation, hsv.value));
    }

    #[rstest]
    #[case((255., 0., 0.), 0., 1., 1.)]
    #[case((0., 255., 0.), 120., 1., 1.)]
    #[case((0., 0., 255.), 240., 1., 1.)]
    #[case((255., 255., 255.), 42., 0., 1.)]
    #[case((0., 0., 0.), 42., 1., 0.)]
    fn test_color_hsv_to_rgb(
        #[case] expected: (f64, f64, f64),
        #[case] hue: f64,
        #[case] saturation: f64,
        #[case] value: f64,
    ) {
        let rgb = color_hsv_to_rgb(Hsv::new(hue, saturation, value));
        assert_eq!(expected, (rgb.r.round(), rgb.g.round(), rgb.b.round()));
    }

    #[test]
    fn kelvin_to_rgb_warm_white_has_full_red() {
        let rgb = kelvin_to_rgb(2700.0);
        assert_eq!(255.0, rgb.r);
        assert!(rgb.g > 150.0 && rgb.g < 175.0, "unexpected green {}", rgb.g);
        assert!(rgb.b > 70.0 && rgb.b < 95.0, "unexpected blue {}", rgb.b);
    }

    #[test]
    fn kelvin_to_rgb_cold_white_has_full_blue() {
        let rgb = kelvin_to_rgb(9000.0);
        assert_eq!(255.0, rgb.b);
        assert!(rgb.r < 255.0);
    }

    #[test]
    fn kelvin_to_rgb_candle_light_has_no_blue() {
        assert_eq!(0.0, kelvin_to_rgb(1500.0).b);
    }

    #[rstest]
    #[case(2000.0)]
    #[case(2700.0)]
    #[case(4000.0)]
    #[case(5500.0)]
    fn rgb_to_kelvin_reverses_kelvin_to_rgb(#[case] kelvin: f64) {
        let result = rgb_to_kelvin(kelvin_to_rgb(kelvin)) as f64;
        assert!(
            (result - kelvin).abs() <= 50.0,
            "{kelvin}K converted back to {result}K"
        );
    }

    #[rstest]
    #[case(2000.0, 500)]
    #[case(4000.0, 250)]
    #[case(6500.0, 154)]
    #[case(0.0, 0)]
    fn test_kelvin_to_mired(#[case] kelvin: f64, #[case] expected: u32) {
        assert_eq!(expected, kelvin_to_mired(kelvin));
    }

    #[rstest]
    #[case(500.0, 2000)]
    #[case(154.0, 6494)]
    fn test_mired_to_kelvin(#[case] mired: f64, #[case] expected: u32) {
        assert_eq!(expected, mired_to_kelvin(mired));
    }

    #[test]
    fn rgb_from_int_splits_components() {
        assert_eq!(Rgb::new(255., 128., 1.), rgb_from_int(0xff8001));
    }
}
