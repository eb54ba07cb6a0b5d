//! Viridis colour map.

use image::Rgb;

/// (position, colour) stops sampled from matplotlib's viridis.
const VIRIDIS: [(f32, [u8; 3]); 10] = [
    (0.0, [68, 1, 84]),
    (0.125, [72, 40, 120]),
    (0.25, [62, 73, 137]),
    (0.375, [49, 104, 142]),
    (0.5, [38, 130, 142]),
    (0.625, [31, 158, 137]),
    (0.75, [53, 183, 121]),
    (0.875, [110, 206, 88]),
    (0.9375, [181, 222, 43]),
    (1.0, [253, 231, 37]),
];

/// Colour at the bottom of the scale.
pub const VIRIDIS_MIN: Rgb<u8> = Rgb(VIRIDIS[0].1);
/// Colour at the top of the scale.
pub const VIRIDIS_MAX: Rgb<u8> = Rgb(VIRIDIS[VIRIDIS.len() - 1].1);

/// Samples viridis at `t`, clamped to `[0, 1]`. NaN maps to the bottom.
pub fn viridis(t: f32) -> Rgb<u8> {
    if t.is_nan() || t <= 0.0 {
        return VIRIDIS_MIN;
    }
    if t >= 1.0 {
        return VIRIDIS_MAX;
    }
    for pair in VIRIDIS.windows(2) {
        let (t0, c0) = pair[0];
        let (t1, c1) = pair[1];
        if t <= t1 {
            let f = (t - t0) / (t1 - t0);
            let mix = |a: u8, b: u8| (a as f32 + (b as f32 - a as f32) * f).round() as u8;
            return Rgb([mix(c0[0], c1[0]), mix(c0[1], c1[1]), mix(c0[2], c1[2])]);
        }
    }
    VIRIDIS_MAX
}
