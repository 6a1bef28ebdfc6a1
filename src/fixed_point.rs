//! Fixed-point quantization for on-disk coordinates and distances.
//!
//! The index format (section 6) stores distances as `u16` with a step of
//! 0.01 Angstrom, saturating at 655.35 A, and coordinates as `i16` with the
//! same step. Quantizing on write and reinflating on read keeps records
//! fixed-width without carrying `f64` precision the search doesn't need.

/// Quantization step, in Angstrom, shared by distances and coordinates.
pub const STEP: f64 = 0.01;

/// Largest representable distance before saturation (`u16::MAX * STEP`).
pub const MAX_DISTANCE: f64 = u16::MAX as f64 * STEP;

/// Quantizes a non-negative distance to its fixed-point `u16` encoding,
/// saturating at `MAX_DISTANCE` rather than wrapping.
#[must_use]
pub fn quantize_distance(d: f64) -> u16 {
    let scaled = (d / STEP).round();
    if scaled <= 0.0 {
        0
    } else if scaled >= f64::from(u16::MAX) {
        u16::MAX
    } else {
        scaled as u16
    }
}

/// Reinflates a fixed-point distance back to Angstrom.
#[must_use]
pub fn dequantize_distance(d: u16) -> f64 {
    f64::from(d) * STEP
}

/// Quantizes a signed coordinate to its fixed-point `i16` encoding,
/// saturating rather than wrapping on overflow.
#[must_use]
pub fn quantize_coord(x: f64) -> i16 {
    let scaled = (x / STEP).round();
    if scaled <= f64::from(i16::MIN) {
        i16::MIN
    } else if scaled >= f64::from(i16::MAX) {
        i16::MAX
    } else {
        scaled as i16
    }
}

/// Reinflates a fixed-point coordinate back to Angstrom.
#[must_use]
pub fn dequantize_coord(x: i16) -> f64 {
    f64::from(x) * STEP
}

/// Quantizes a 3D point coordinate-wise.
#[must_use]
pub fn quantize_vec3(v: [f64; 3]) -> [i16; 3] {
    [
        quantize_coord(v[0]),
        quantize_coord(v[1]),
        quantize_coord(v[2]),
    ]
}

/// Reinflates a fixed-point 3D point coordinate-wise.
#[must_use]
pub fn dequantize_vec3(v: [i16; 3]) -> [f64; 3] {
    [
        dequantize_coord(v[0]),
        dequantize_coord(v[1]),
        dequantize_coord(v[2]),
    ]
}
