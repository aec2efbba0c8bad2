//! Color handling: hex parsing, HSL conversions, gradient stop lists and
//! the palette modes that turn a projected point into a final color.
//!
//! Gradients use the compact `"#RRGGBB@t,..."` notation. Stops without an
//! explicit position are distributed evenly, the list is sorted by position
//! and endpoint stops at 0 and 1 are synthesized when missing, so a parsed
//! gradient always covers the whole `[0, 1]` interval. Interpolation mixes
//! in HSL space, which blends hues noticeably smoother than raw RGB.

use crate::noise::clamp01;

pub const DEFAULT_COLOR: Rgb = Rgb {
    r: 0x00,
    g: 0xC8,
    b: 0xFF,
};

/// An 8-bit RGB color.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    /// Parses `#RGB` or `#RRGGBB` (leading `#` optional). Invalid input
    /// falls back to black rather than failing.
    pub fn from_hex(text: &str) -> Self {
        let trimmed = text.trim().trim_start_matches('#');
        let expanded: String = if trimmed.len() == 3 {
            trimmed.chars().flat_map(|c| [c, c]).collect()
        } else {
            trimmed.to_string()
        };
        match u32::from_str_radix(&expanded, 16) {
            Ok(v) if expanded.len() == 6 => Self {
                r: ((v >> 16) & 255) as u8,
                g: ((v >> 8) & 255) as u8,
                b: (v & 255) as u8,
            },
            _ => Self { r: 0, g: 0, b: 0 },
        }
    }

    pub fn to_hex(self) -> String {
        format!("#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }

    /// Hue/saturation/lightness, each in `[0, 1]`.
    pub fn to_hsl(self) -> (f64, f64, f64) {
        let rf = self.r as f64 / 255.0;
        let gf = self.g as f64 / 255.0;
        let bf = self.b as f64 / 255.0;
        let max = rf.max(gf).max(bf);
        let min = rf.min(gf).min(bf);
        let l = (max + min) / 2.0;
        if max == min {
            return (0.0, 0.0, l);
        }
        let d = max - min;
        let s = if l > 0.5 {
            d / (2.0 - max - min)
        } else {
            d / (max + min)
        };
        let h = if max == rf {
            (gf - bf) / d + if gf < bf { 6.0 } else { 0.0 }
        } else if max == gf {
            (bf - rf) / d + 2.0
        } else {
            (rf - gf) / d + 4.0
        };
        (h / 6.0, s, l)
    }

    pub fn from_hsl(h: f64, s: f64, l: f64) -> Self {
        fn hue(p: f64, q: f64, mut t: f64) -> f64 {
            if t < 0.0 {
                t += 1.0;
            }
            if t > 1.0 {
                t -= 1.0;
            }
            if t < 1.0 / 6.0 {
                return p + (q - p) * 6.0 * t;
            }
            if t < 0.5 {
                return q;
            }
            if t < 2.0 / 3.0 {
                return p + (q - p) * (2.0 / 3.0 - t) * 6.0;
            }
            p
        }

        if s == 0.0 {
            let v = (l * 255.0).round() as u8;
            return Self { r: v, g: v, b: v };
        }
        let q = if l < 0.5 { l * (1.0 + s) } else { l + s - l * s };
        let p = 2.0 * l - q;
        Self {
            r: (hue(p, q, h + 1.0 / 3.0) * 255.0).round() as u8,
            g: (hue(p, q, h) * 255.0).round() as u8,
            b: (hue(p, q, h - 1.0 / 3.0) * 255.0).round() as u8,
        }
    }

    /// Mixes toward `other` by `t` in HSL space.
    pub fn mix_hsl(self, other: Self, t: f64) -> Self {
        let (h1, s1, l1) = self.to_hsl();
        let (h2, s2, l2) = other.to_hsl();
        Self::from_hsl(
            h1 * (1.0 - t) + h2 * t,
            s1 * (1.0 - t) + s2 * t,
            l1 * (1.0 - t) + l2 * t,
        )
    }
}

/// One gradient control point.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GradientStop {
    pub color: Rgb,
    pub position: f64,
}

/// An ordered stop list covering `[0, 1]` inclusive.
#[derive(Clone, Debug, PartialEq)]
pub struct Gradient {
    stops: Vec<GradientStop>,
}

impl Gradient {
    /// Parses the `"#RRGGBB@t,..."` notation.
    ///
    /// Stops may omit `@t`; those are spread evenly over `[0, 1]` in the
    /// order they appear. An empty/blank input yields the default
    /// cyan-to-white ramp.
    pub fn parse(text: &str) -> Self {
        let parts: Vec<&str> = text
            .split(',')
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .collect();
        if parts.is_empty() {
            return Self {
                stops: vec![
                    GradientStop {
                        color: DEFAULT_COLOR,
                        position: 0.0,
                    },
                    GradientStop {
                        color: Rgb {
                            r: 255,
                            g: 255,
                            b: 255,
                        },
                        position: 1.0,
                    },
                ],
            };
        }

        let mut raw: Vec<(Rgb, Option<f64>)> = Vec::with_capacity(parts.len());
        for part in parts {
            match part.split_once('@') {
                Some((color, pos)) => {
                    raw.push((Rgb::from_hex(color), pos.trim().parse::<f64>().ok()));
                }
                None => raw.push((Rgb::from_hex(part), None)),
            }
        }

        // Spread unpositioned stops evenly across the unit interval.
        let unspecified = raw.iter().filter(|(_, p)| p.is_none()).count();
        if unspecified > 0 {
            let denom = (unspecified - 1).max(1) as f64;
            let mut index = 0usize;
            for entry in &mut raw {
                if entry.1.is_none() {
                    entry.1 = Some(index as f64 / denom);
                    index += 1;
                }
            }
        }

        let mut stops: Vec<GradientStop> = raw
            .into_iter()
            .map(|(color, position)| GradientStop {
                color,
                position: clamp01(position.unwrap_or(0.0)),
            })
            .collect();
        stops.sort_by(|a, b| a.position.total_cmp(&b.position));
        if stops[0].position > 0.0 {
            stops.insert(
                0,
                GradientStop {
                    color: stops[0].color,
                    position: 0.0,
                },
            );
        }
        if stops[stops.len() - 1].position < 1.0 {
            stops.push(GradientStop {
                color: stops[stops.len() - 1].color,
                position: 1.0,
            });
        }
        Self { stops }
    }

    /// Serializes back to the compact notation, positions to 3 decimals.
    pub fn format(&self) -> String {
        self.stops
            .iter()
            .map(|stop| format!("{}@{:.3}", stop.color.to_hex(), stop.position))
            .collect::<Vec<_>>()
            .join(",")
    }

    pub fn stops(&self) -> &[GradientStop] {
        &self.stops
    }

    /// Samples the ramp at `t` (clamped), mixing adjacent stops in HSL.
    pub fn sample(&self, t: f64) -> Rgb {
        let t = clamp01(t);
        for pair in self.stops.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            if a.position <= t && t <= b.position {
                let local = (t - a.position) / (b.position - a.position).max(1e-6);
                return a.color.mix_hsl(b.color, local);
            }
        }
        self.stops[self.stops.len() - 1].color
    }
}

impl Default for Gradient {
    fn default() -> Self {
        Self::parse("")
    }
}

/// Depth-based alpha attenuation.
///
/// `strength` 0 disables the fade; at 1 a far point fades fully out. The
/// atan remap compresses the unbounded positive depth axis into `[0, 1)`.
pub fn depth_fade(depth: f64, strength: f64) -> f64 {
    if strength <= 0.0 {
        return 1.0;
    }
    let t = clamp01(depth.max(0.0).atan() / std::f64::consts::FRAC_PI_2);
    (1.0 - strength) + strength * (1.0 - t)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_parse_and_format_round_trip() {
        let c = Rgb::from_hex("#00C8FF");
        assert_eq!(c, DEFAULT_COLOR);
        assert_eq!(c.to_hex(), "#00C8FF");
        // Short form expands per channel.
        assert_eq!(Rgb::from_hex("#F0A"), Rgb::from_hex("#FF00AA"));
        // Garbage degrades to black instead of failing.
        assert_eq!(Rgb::from_hex("not-a-color"), Rgb { r: 0, g: 0, b: 0 });
    }

    #[test]
    fn hsl_round_trip_is_close() {
        for hex in ["#FF0000", "#00FF00", "#0000FF", "#123456", "#C0FFEE"] {
            let c = Rgb::from_hex(hex);
            let (h, s, l) = c.to_hsl();
            let back = Rgb::from_hsl(h, s, l);
            assert!((c.r as i32 - back.r as i32).abs() <= 1, "{hex}");
            assert!((c.g as i32 - back.g as i32).abs() <= 1, "{hex}");
            assert!((c.b as i32 - back.b as i32).abs() <= 1, "{hex}");
        }
    }

    #[test]
    fn gradient_parse_covers_unit_interval() {
        let g = Gradient::parse("#000000@0.25,#FFFFFF@0.75");
        let stops = g.stops();
        assert_eq!(stops.first().unwrap().position, 0.0);
        assert_eq!(stops.last().unwrap().position, 1.0);
        assert_eq!(stops.len(), 4);
    }

    #[test]
    fn unpositioned_stops_are_distributed_evenly() {
        let g = Gradient::parse("#000000,#808080,#FFFFFF");
        let positions: Vec<f64> = g.stops().iter().map(|s| s.position).collect();
        assert_eq!(positions, vec![0.0, 0.5, 1.0]);
    }

    #[test]
    fn parse_format_round_trip_is_equivalent() {
        let source = "#00C8FF@0.000,#FF0000@0.500,#FFFFFF@1.000";
        let first = Gradient::parse(source);
        let second = Gradient::parse(&first.format());
        assert_eq!(first, second);
    }

    #[test]
    fn sample_hits_stops_exactly_and_blends_between() {
        let g = Gradient::parse("#000000@0,#FFFFFF@1");
        assert_eq!(g.sample(0.0), Rgb { r: 0, g: 0, b: 0 });
        assert_eq!(
            g.sample(1.0),
            Rgb {
                r: 255,
                g: 255,
                b: 255
            }
        );
        let mid = g.sample(0.5);
        assert!(mid.r > 100 && mid.r < 155);
        // Out-of-range samples clamp.
        assert_eq!(g.sample(2.0), g.sample(1.0));
        assert_eq!(g.sample(-1.0), g.sample(0.0));
    }

    #[test]
    fn depth_fade_decreases_with_depth_and_respects_strength() {
        assert_eq!(depth_fade(10.0, 0.0), 1.0);
        let near = depth_fade(0.5, 1.0);
        let far = depth_fade(10.0, 1.0);
        assert!(near > far);
        assert!((0.0..=1.0).contains(&near));
        assert!((0.0..=1.0).contains(&far));
    }
}
