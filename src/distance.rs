//! Monocular distance estimation from a known physical reference size.

/// Average human height in meters.
pub const REAL_PERSON_HEIGHT: f64 = 1.7;

/// Average car width in meters.
pub const REAL_CAR_WIDTH: f64 = 2.0;

/// Average bus width in meters.
pub const REAL_BUS_WIDTH: f64 = 2.5;

/// Camera focal length in pixels.
pub const FOCAL_LENGTH: f64 = 700.0;

/// Estimate the distance to an object of `real_size` meters that spans
/// `pixel_size` pixels in the image.
///
/// Returns `None` for degenerate boxes (`pixel_size <= 0`).
pub fn estimate_distance(pixel_size: f64, real_size: f64, focal_length: f64) -> Option<f64> {
    if pixel_size > 0.0 {
        Some(real_size * focal_length / pixel_size)
    } else {
        None
    }
}

/// Reference width for a vehicle class, matched case-insensitively.
///
/// Classes without a reference width are not tracked as vehicles.
pub fn reference_width(class_name: &str) -> Option<f64> {
    if class_name.eq_ignore_ascii_case("car") {
        Some(REAL_CAR_WIDTH)
    } else if class_name.eq_ignore_ascii_case("bus") {
        Some(REAL_BUS_WIDTH)
    } else {
        None
    }
}
