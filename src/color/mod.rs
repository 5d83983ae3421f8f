//! sRGB hex and OKLCH conversion.
//!
//! Both directions go through CIE XYZ (D65) and OKLab:
//!
//! ```text
//! hex → sRGB bytes → linear RGB → XYZ → LMS → ∛ → OKLab → OKLCH
//! ```
//!
//! Parsing never fails loudly. Malformed hex yields [`FALLBACK_OKLCH`] and
//! malformed OKLCH yields [`FALLBACK_HEX`].
//!
//! # Example
//!
//! ```
//! use tablesync::color::{hex_to_oklch, oklch_to_hex};
//!
//! let oklch = hex_to_oklch("#3366CC");
//! assert!(oklch.starts_with("oklch(0.5"));
//! assert_eq!(oklch_to_hex(&oklch), "#3366cc");
//! assert_eq!(hex_to_oklch("#nope"), "oklch(0 0 0)");
//! ```

use std::fmt;

/// Returned by [`hex_to_oklch`] for unparseable input.
pub const FALLBACK_OKLCH: &str = "oklch(0 0 0)";

/// Returned by [`oklch_to_hex`] for unparseable input.
pub const FALLBACK_HEX: &str = "#000000";

/// Chroma below this is treated as grey and given hue 0.
const ACHROMATIC: f64 = 1e-6;

type Matrix = [[f64; 3]; 3];

const LINEAR_SRGB_TO_XYZ: Matrix = [
    [0.412_456_4, 0.357_576_1, 0.180_437_5],
    [0.212_672_9, 0.715_152_2, 0.072_175_0],
    [0.019_333_9, 0.119_192_0, 0.950_304_1],
];

const XYZ_TO_LINEAR_SRGB: Matrix = [
    [3.240_454_2, -1.537_138_5, -0.498_531_4],
    [-0.969_266_0, 1.876_010_8, 0.041_556_0],
    [0.055_643_4, -0.204_025_9, 1.057_225_2],
];

const XYZ_TO_LMS: Matrix = [
    [0.818_933_010_1, 0.361_866_742_4, -0.128_859_713_7],
    [0.032_984_543_6, 0.929_311_871_5, 0.036_145_638_7],
    [0.048_200_301_8, 0.264_366_269_1, 0.633_851_707_0],
];

const LMS_TO_XYZ: Matrix = [
    [1.227_013_851_1, -0.557_799_980_7, 0.281_256_149_0],
    [-0.040_580_178_4, 1.112_256_869_6, -0.071_676_678_7],
    [-0.076_381_284_5, -0.421_481_978_4, 1.586_163_220_4],
];

const LMS_TO_OKLAB: Matrix = [
    [0.210_454_255_3, 0.793_617_785_0, -0.004_072_046_8],
    [1.977_998_495_1, -2.428_592_205_0, 0.450_593_709_9],
    [0.025_904_037_1, 0.782_771_766_2, -0.808_675_766_0],
];

const OKLAB_TO_LMS: Matrix = [
    [1.0, 0.396_337_777_4, 0.215_803_757_3],
    [1.0, -0.105_561_345_8, -0.063_854_172_8],
    [1.0, -0.089_484_177_5, -1.291_485_548_0],
];

fn mul(m: &Matrix, v: [f64; 3]) -> [f64; 3] {
    [
        m[0][0] * v[0] + m[0][1] * v[1] + m[0][2] * v[2],
        m[1][0] * v[0] + m[1][1] * v[1] + m[1][2] * v[2],
        m[2][0] * v[0] + m[2][1] * v[1] + m[2][2] * v[2],
    ]
}

fn gamma_decode(c: f64) -> f64 {
    if c <= 0.040_45 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

fn gamma_encode(c: f64) -> f64 {
    if c <= 0.003_130_8 {
        c * 12.92
    } else {
        1.055 * c.powf(1.0 / 2.4) - 0.055
    }
}

/// An 8-bit sRGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    #[must_use]
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parses `#rrggbb` or `#rgb`, with or without the `#`.
    #[must_use]
    pub fn parse_hex(hex: &str) -> Option<Self> {
        let digits = hex.trim();
        let digits = digits.strip_prefix('#').unwrap_or(digits);
        if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }
        let channel = |s: &str| u8::from_str_radix(s, 16).ok();
        match digits.len() {
            6 => Some(Self::new(
                channel(&digits[0..2])?,
                channel(&digits[2..4])?,
                channel(&digits[4..6])?,
            )),
            3 => {
                let short = |i: usize| channel(&digits[i..=i]).map(|v| v * 17);
                Some(Self::new(short(0)?, short(1)?, short(2)?))
            }
            _ => None,
        }
    }

    /// Lowercase `#rrggbb`.
    #[must_use]
    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    #[must_use]
    pub fn to_oklch(self) -> Oklch {
        let linear = [self.r, self.g, self.b].map(|c| gamma_decode(f64::from(c) / 255.0));
        let xyz = mul(&LINEAR_SRGB_TO_XYZ, linear);
        let lms = mul(&XYZ_TO_LMS, xyz).map(f64::cbrt);
        let [l, a, b] = mul(&LMS_TO_OKLAB, lms);

        let c = a.hypot(b);
        let h = if c < ACHROMATIC {
            0.0
        } else {
            b.atan2(a).to_degrees().rem_euclid(360.0)
        };
        Oklch { l, c, h }
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// A color in OKLCH: lightness `l` in `[0, 1]`, chroma `c >= 0`, hue `h` in
/// degrees `[0, 360)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Oklch {
    pub l: f64,
    pub c: f64,
    pub h: f64,
}

impl Oklch {
    #[must_use]
    pub fn new(l: f64, c: f64, h: f64) -> Self {
        Self {
            l: l.clamp(0.0, 1.0),
            c: c.max(0.0),
            h: h.rem_euclid(360.0),
        }
    }

    /// Parses CSS-style `oklch(L C H)`.
    ///
    /// Lightness may be a fraction or a percentage. Components may be
    /// separated by spaces or commas, an alpha after `/` is ignored and
    /// `none` reads as zero.
    #[must_use]
    pub fn parse(input: &str) -> Option<Self> {
        let body = input
            .trim()
            .strip_prefix("oklch(")?
            .strip_suffix(')')?;
        let body = body.split('/').next()?;
        let parts: Vec<&str> = body
            .split(|c: char| c.is_whitespace() || c == ',')
            .filter(|p| !p.is_empty())
            .collect();
        let [l, c, h] = parts.as_slice() else {
            return None;
        };

        let number = |s: &str| -> Option<f64> {
            if s.eq_ignore_ascii_case("none") {
                return Some(0.0);
            }
            s.parse::<f64>().ok().filter(|v| v.is_finite())
        };
        let l = match l.strip_suffix('%') {
            Some(percent) => number(percent)? / 100.0,
            None => number(l)?,
        };
        let c = number(c)?;
        let h = number(h.trim_end_matches("deg"))?;
        Some(Self::new(l, c, h))
    }

    /// Converts to sRGB, clamping out-of-gamut channels.
    #[must_use]
    pub fn to_rgb(self) -> Rgb {
        let hue = self.h.to_radians();
        let lab = [self.l, self.c * hue.cos(), self.c * hue.sin()];
        let lms = mul(&OKLAB_TO_LMS, lab).map(|v| v * v * v);
        let xyz = mul(&LMS_TO_XYZ, lms);
        let [r, g, b] = mul(&XYZ_TO_LINEAR_SRGB, xyz).map(|c| {
            let encoded = gamma_encode(c.max(0.0));
            // In range after the clamp, so the cast cannot truncate.
            (encoded * 255.0).round().clamp(0.0, 255.0) as u8
        });
        Rgb::new(r, g, b)
    }

    #[must_use]
    pub fn to_hex(self) -> String {
        self.to_rgb().to_hex()
    }
}

impl fmt::Display for Oklch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "oklch({:.4} {:.4} {:.2})", self.l, self.c, self.h)
    }
}

/// Converts `#rrggbb` (or `#rgb`) to `oklch(L C H)`.
#[must_use]
pub fn hex_to_oklch(hex: &str) -> String {
    Rgb::parse_hex(hex).map_or_else(
        || {
            tracing::debug!(hex = %hex, "invalid hex color, using fallback");
            FALLBACK_OKLCH.to_string()
        },
        |rgb| rgb.to_oklch().to_string(),
    )
}

/// Converts `oklch(L C H)` to lowercase `#rrggbb`.
#[must_use]
pub fn oklch_to_hex(oklch: &str) -> String {
    Oklch::parse(oklch).map_or_else(
        || {
            tracing::debug!(oklch = %oklch, "invalid oklch color, using fallback");
            FALLBACK_HEX.to_string()
        },
        Oklch::to_hex,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn close(a: Rgb, b: Rgb) -> bool {
        a.r.abs_diff(b.r) <= 1 && a.g.abs_diff(b.g) <= 1 && a.b.abs_diff(b.b) <= 1
    }

    #[test]
    fn reference_color_round_trips() {
        let back = Rgb::parse_hex(&oklch_to_hex(&hex_to_oklch("#3366CC"))).unwrap();
        assert!(close(back, Rgb::new(0x33, 0x66, 0xcc)), "{back}");
    }

    #[test]
    fn known_values() {
        assert_eq!(hex_to_oklch("#000000"), "oklch(0.0000 0.0000 0.00)");
        let white = Rgb::new(255, 255, 255).to_oklch();
        assert!((white.l - 1.0).abs() < 1e-3, "{white}");
        assert!(white.c < 1e-3, "{white}");
        let red = Rgb::new(255, 0, 0).to_oklch();
        assert!((red.l - 0.628).abs() < 1e-3, "{red}");
        assert!((red.c - 0.2577).abs() < 1e-3, "{red}");
        assert!((red.h - 29.23).abs() < 0.2, "{red}");
    }

    #[test]
    fn shorthand_hex() {
        assert_eq!(Rgb::parse_hex("#36c"), Some(Rgb::new(0x33, 0x66, 0xcc)));
        assert_eq!(Rgb::parse_hex("3366cc"), Some(Rgb::new(0x33, 0x66, 0xcc)));
    }

    #[test]
    fn invalid_input_falls_back() {
        for bad in ["", "#12345", "#gggggg", "#1234567", "#+1+2+3"] {
            assert_eq!(hex_to_oklch(bad), FALLBACK_OKLCH, "{bad}");
        }
        for bad in ["", "oklch(0.5 0.1)", "rgb(1 2 3)", "oklch(a b c)", "oklch(0.5 0.1 20"] {
            assert_eq!(oklch_to_hex(bad), FALLBACK_HEX, "{bad}");
        }
    }

    #[test]
    fn css_variants_parse() {
        let a = Oklch::parse("oklch(62.8% 0.2577 29.23deg / 0.5)").unwrap();
        let b = Oklch::parse("oklch(0.628, 0.2577, 29.23)").unwrap();
        assert!((a.l - b.l).abs() < 1e-9);
        assert_eq!(Oklch::parse("oklch(0.5 none 120)").map(|c| c.c), Some(0.0));
    }

    #[test]
    fn out_of_range_components_clamp() {
        let color = Oklch::new(1.5, -0.2, 400.0);
        assert_eq!((color.l, color.c), (1.0, 0.0));
        assert!((color.h - 40.0).abs() < 1e-9);
        assert_eq!(Oklch::new(0.9, 0.4, 145.0).to_hex().len(), 7);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(512))]

        #[test]
        fn any_hex_round_trips_within_one(r in any::<u8>(), g in any::<u8>(), b in any::<u8>()) {
            let rgb = Rgb::new(r, g, b);
            let back = Rgb::parse_hex(&oklch_to_hex(&hex_to_oklch(&rgb.to_hex()))).unwrap();
            prop_assert!(close(back, rgb), "{} -> {}", rgb, back);
        }

        #[test]
        fn hue_is_normalized(r in any::<u8>(), g in any::<u8>(), b in any::<u8>()) {
            let oklch = Rgb::new(r, g, b).to_oklch();
            prop_assert!((0.0..360.0).contains(&oklch.h));
            prop_assert!(oklch.c >= 0.0);
        }
    }
}
