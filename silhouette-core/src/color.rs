//! HSLA colors for shapes

use peniko::Color;
use serde::{Deserialize, Serialize};

/// Hue in degrees `[0, 360)`, saturation/lightness/alpha in `[0, 1]`
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Hsla {
    pub hue: f64,
    pub saturation: f64,
    pub lightness: f64,
    #[serde(default = "default_alpha")]
    pub alpha: f64,
}

fn default_alpha() -> f64 {
    1.0
}

impl Default for Hsla {
    fn default() -> Self {
        Self::new(0.0, 0.0, 0.0, 1.0)
    }
}

impl Hsla {
    /// Create a color, wrapping hue and clamping the other channels
    pub fn new(hue: f64, saturation: f64, lightness: f64, alpha: f64) -> Self {
        Self {
            hue: wrap_hue(hue),
            saturation: clamp_unit(saturation),
            lightness: clamp_unit(lightness),
            alpha: clamp_unit(alpha),
        }
    }

    /// Opaque color
    pub fn hsl(hue: f64, saturation: f64, lightness: f64) -> Self {
        Self::new(hue, saturation, lightness, 1.0)
    }

    /// Same color with a different alpha
    pub fn with_alpha(self, alpha: f64) -> Self {
        Self {
            alpha: clamp_unit(alpha),
            ..self
        }
    }

    /// Re-apply the channel ranges after direct field writes
    pub fn normalized(self) -> Self {
        Self::new(self.hue, self.saturation, self.lightness, self.alpha)
    }

    /// Weighted average of colors, channel by channel. Alpha of the result
    /// is 1. Returns `None` when the total weight is zero.
    pub fn weighted_average(colors: impl IntoIterator<Item = (Hsla, f64)>) -> Option<Hsla> {
        let mut sum = [0.0f64; 3];
        let mut total = 0.0;
        for (color, weight) in colors {
            sum[0] += color.hue * weight;
            sum[1] += color.saturation * weight;
            sum[2] += color.lightness * weight;
            total += weight;
        }
        if total <= 0.0 {
            return None;
        }
        Some(Hsla::hsl(sum[0] / total, sum[1] / total, sum[2] / total))
    }

    /// Convert to 8-bit sRGB with alpha
    pub fn to_rgba8(&self) -> [u8; 4] {
        let (r, g, b) = hsl_to_rgb(self.hue, self.saturation, self.lightness);
        [
            to_byte(r),
            to_byte(g),
            to_byte(b),
            to_byte(self.alpha),
        ]
    }

    /// Convert to a peniko color
    pub fn to_peniko(&self) -> Color {
        let [r, g, b, a] = self.to_rgba8();
        Color::from_rgba8(r, g, b, a)
    }

    /// CSS-style `hsla(h,s%,l%,a)` string with integer channels
    pub fn to_css(&self) -> String {
        format!(
            "hsla({},{}%,{}%,{})",
            self.hue as i32,
            (self.saturation * 100.0) as i32,
            (self.lightness * 100.0) as i32,
            self.alpha
        )
    }
}

fn wrap_hue(hue: f64) -> f64 {
    if !hue.is_finite() {
        return 0.0;
    }
    let wrapped = hue.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360 for tiny negative inputs
    if wrapped >= 360.0 {
        0.0
    } else {
        wrapped
    }
}

fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

fn to_byte(value: f64) -> u8 {
    (value * 255.0).round().clamp(0.0, 255.0) as u8
}

fn hsl_to_rgb(hue: f64, saturation: f64, lightness: f64) -> (f64, f64, f64) {
    let chroma = (1.0 - (2.0 * lightness - 1.0).abs()) * saturation;
    let sector = hue / 60.0;
    let x = chroma * (1.0 - (sector % 2.0 - 1.0).abs());
    let (r, g, b) = match sector as u32 {
        0 => (chroma, x, 0.0),
        1 => (x, chroma, 0.0),
        2 => (0.0, chroma, x),
        3 => (0.0, x, chroma),
        4 => (x, 0.0, chroma),
        _ => (chroma, 0.0, x),
    };
    let m = lightness - chroma / 2.0;
    (r + m, g + m, b + m)
}
