//! Inferno colormap and value-to-color scaling.

/// Anchor colors sampled evenly from matplotlib's `inferno`.
const INFERNO: [(u8, u8, u8); 9] = [
    (0, 0, 4),
    (31, 12, 72),
    (85, 15, 109),
    (136, 34, 106),
    (186, 54, 85),
    (227, 89, 51),
    (249, 140, 10),
    (249, 201, 50),
    (252, 255, 164),
];

/// Color for values that cannot be mapped (nulls)
pub const MISSING_COLOR: (u8, u8, u8) = (160, 160, 160);

/// Sample the colormap at `t` in `[0, 1]`; values outside are clamped.
pub fn inferno(t: f64) -> (u8, u8, u8) {
    if t.is_nan() {
        return MISSING_COLOR;
    }
    let t = t.clamp(0.0, 1.0);
    let pos = t * (INFERNO.len() - 1) as f64;
    let lower = (pos.floor() as usize).min(INFERNO.len() - 2);
    let frac = pos - lower as f64;

    let (r0, g0, b0) = INFERNO[lower];
    let (r1, g1, b1) = INFERNO[lower + 1];
    let lerp = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * frac).round() as u8;
    (lerp(r0, r1), lerp(g0, g1), lerp(b0, b1))
}

/// Linear value range mapped onto the colormap.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorScale {
    pub min: f64,
    pub max: f64,
}

impl ColorScale {
    /// Range spanning the finite values; a degenerate range is widened.
    pub fn from_values(values: &[f64]) -> Self {
        let (min, max) = values
            .iter()
            .filter(|v| v.is_finite())
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
                (lo.min(v), hi.max(v))
            });
        if !min.is_finite() {
            return Self { min: 0.0, max: 1.0 };
        }
        Self::new(min, max)
    }

    pub fn new(min: f64, max: f64) -> Self {
        if max > min {
            Self { min, max }
        } else {
            Self {
                min: min - 0.5,
                max: max + 0.5,
            }
        }
    }

    /// Position of `value` in `[0, 1]`, clamped to the range. NaN stays NaN.
    pub fn normalize(&self, value: f64) -> f64 {
        ((value - self.min) / (self.max - self.min)).clamp(0.0, 1.0)
    }

    pub fn color(&self, value: f64) -> (u8, u8, u8) {
        inferno(self.normalize(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoints_match_anchors() {
        assert_eq!(inferno(0.0), (0, 0, 4));
        assert_eq!(inferno(1.0), (252, 255, 164));
        assert_eq!(inferno(0.5), (186, 54, 85));
    }

    #[test]
    fn out_of_range_is_clamped() {
        assert_eq!(inferno(-3.0), inferno(0.0));
        assert_eq!(inferno(7.0), inferno(1.0));
        assert_eq!(inferno(f64::NAN), MISSING_COLOR);
    }

    #[test]
    fn scale_clamps_to_fixed_range() {
        let scale = ColorScale::new(0.0, 5.0);

        assert_eq!(scale.normalize(2.5), 0.5);
        assert_eq!(scale.normalize(-1.0), 0.0);
        assert_eq!(scale.normalize(10.0), 1.0);
        assert_eq!(scale.color(10.0), inferno(1.0));
    }

    #[test]
    fn scale_from_values_ignores_nan_and_widens_constant() {
        let scale = ColorScale::from_values(&[3.0, f64::NAN, -1.0]);
        assert_eq!(scale, ColorScale { min: -1.0, max: 3.0 });

        let flat = ColorScale::from_values(&[2.0, 2.0]);
        assert_eq!(flat, ColorScale { min: 1.5, max: 2.5 });

        let empty = ColorScale::from_values(&[]);
        assert_eq!(empty, ColorScale { min: 0.0, max: 1.0 });
    }
}
