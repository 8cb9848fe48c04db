//! Linear color scale for choropleth fills.

use crate::error::{CrimeMapError, CrimeMapResult};
use serde::{Serialize, Serializer};
use std::fmt;

pub const DEFAULT_LOW: &str = "#ffedea";
pub const DEFAULT_HIGH: &str = "#ff5233";
pub const DEFAULT_NO_DATA: &str = "#eeeeee";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    /// Parses `#rrggbb` (the leading `#` is optional).
    pub fn from_hex(hex: &str) -> CrimeMapResult<Self> {
        let digits = hex.trim_start_matches('#');
        if digits.len() != 6 || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(CrimeMapError::InvalidColor(hex.to_string()));
        }
        let channel = |i: usize| {
            u8::from_str_radix(&digits[i..i + 2], 16)
                .map_err(|_| CrimeMapError::InvalidColor(hex.to_string()))
        };
        Ok(Rgb(channel(0)?, channel(2)?, channel(4)?))
    }

    fn channels(self) -> [f64; 3] {
        [self.0 as f64, self.1 as f64, self.2 as f64]
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.0, self.1, self.2)
    }
}

impl Serialize for Rgb {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Maps region totals onto a low..high color ramp.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorScale {
    low: Rgb,
    high: Rgb,
    no_data: Rgb,
}

impl ColorScale {
    /// Builds a scale, rejecting a `no_data` color that sits on the ramp.
    pub fn new(low: Rgb, high: Rgb, no_data: Rgb) -> CrimeMapResult<Self> {
        let scale = ColorScale { low, high, no_data };
        if scale.on_scale(no_data) {
            return Err(CrimeMapError::NeutralOnScale(no_data.to_string()));
        }
        Ok(scale)
    }

    pub fn from_hex(low: &str, high: &str, no_data: &str) -> CrimeMapResult<Self> {
        Self::new(Rgb::from_hex(low)?, Rgb::from_hex(high)?, Rgb::from_hex(no_data)?)
    }

    pub fn low(&self) -> Rgb {
        self.low
    }

    pub fn high(&self) -> Rgb {
        self.high
    }

    pub fn no_data(&self) -> Rgb {
        self.no_data
    }

    /// Color for `total` over the domain `[0, domain_max]`.
    ///
    /// Totals are clamped into the domain; an empty domain maps everything
    /// to the low color.
    pub fn intensity_of(&self, total: u64, domain_max: u64) -> Rgb {
        if domain_max == 0 {
            return self.low;
        }
        let t = total.min(domain_max) as f64 / domain_max as f64;
        self.interpolate(t)
    }

    /// Fill for a region; regions without a summary get the no-data color.
    pub fn fill(&self, total: Option<u64>, domain_max: u64) -> Rgb {
        match total {
            Some(total) => self.intensity_of(total, domain_max),
            None => self.no_data,
        }
    }

    fn interpolate(&self, t: f64) -> Rgb {
        let [lr, lg, lb] = self.low.channels();
        let [hr, hg, hb] = self.high.channels();
        let mix = |a: f64, b: f64| (a + (b - a) * t).round().clamp(0.0, 255.0) as u8;
        Rgb(mix(lr, hr), mix(lg, hg), mix(lb, hb))
    }

    /// Whether `color` is within rounding distance of some point on the ramp.
    fn on_scale(&self, color: Rgb) -> bool {
        let low = self.low.channels();
        let high = self.high.channels();
        let c = color.channels();
        let dir = [high[0] - low[0], high[1] - low[1], high[2] - low[2]];
        let len2: f64 = dir.iter().map(|d| d * d).sum();
        let t = if len2 == 0.0 {
            0.0
        } else {
            let dot: f64 = (0..3).map(|i| (c[i] - low[i]) * dir[i]).sum();
            (dot / len2).clamp(0.0, 1.0)
        };
        let nearest = self.interpolate(t).channels();
        (0..3).all(|i| (nearest[i] - c[i]).abs() <= 1.0)
    }
}

impl Default for ColorScale {
    fn default() -> Self {
        ColorScale {
            low: Rgb(0xff, 0xed, 0xea),
            high: Rgb(0xff, 0x52, 0x33),
            no_data: Rgb(0xee, 0xee, 0xee),
        }
    }
}
