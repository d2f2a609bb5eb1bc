//! Parameter types for image operations.
//!
//! These structs describe *what* to do, not *how* to do it. They are the
//! interface between the geometry planner (which decides the crop and output
//! size) and the [`backend`](super::backend) (which does the actual pixel
//! work). This separation allows swapping backends (e.g. for testing with a
//! mock) without changing planning logic.
//!
//! ## Types
//!
//! - [`Dimensions`]: Width and height of a raster in pixels.
//! - [`Quality`]: Lossy encoding quality as a fraction in `(0, 1]`, default `1.0`.
//! - [`AspectRatio`]: Exact `width:height` ratio with non-zero terms.
//! - [`Constraints`]: Everything a field demands of its attached images.
//! - [`Rect`] / [`CropPlan`]: The sampled source region and the output size.

use serde::Serialize;

/// Width and height of a raster surface, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn fits_within(self, max_width: u32, max_height: u32) -> bool {
        self.width <= max_width && self.height <= max_height
    }
}

impl std::fmt::Display for Dimensions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Quality setting for lossy image encoding, as a fraction in `(0, 1]`.
///
/// Backends that take a percentage use [`Quality::percent`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quality(f32);

impl Quality {
    /// Lowest accepted quality; anything below is clamped up to it.
    pub const MIN: f32 = 0.01;

    pub fn new(value: f32) -> Self {
        Self(value.clamp(Self::MIN, 1.0))
    }

    /// Interpret a user-supplied quality setting.
    ///
    /// Values above 1 are percentages (`85` → `0.85`). Returns `None` for
    /// values that are not positive or exceed 100%.
    pub fn from_setting(raw: f64) -> Option<Self> {
        let fraction = if raw > 1.0 { raw / 100.0 } else { raw };
        if !fraction.is_finite() || fraction <= 0.0 || fraction > 1.0 {
            return None;
        }
        Some(Self::new(fraction as f32))
    }

    pub fn value(self) -> f32 {
        self.0
    }

    /// Quality as an integer percentage in `1..=100`.
    pub fn percent(self) -> u8 {
        (self.0 * 100.0).round().clamp(1.0, 100.0) as u8
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(1.0)
    }
}

/// Target aspect ratio as `width:height`.
///
/// Both terms are non-zero. Equality against a raster is exact rational
/// equality (cross-multiplication), never a float tolerance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AspectRatio {
    width: u32,
    height: u32,
}

impl AspectRatio {
    /// Returns `None` when either term is zero, which means "no ratio constraint".
    pub fn new(width: u32, height: u32) -> Option<Self> {
        (width > 0 && height > 0).then_some(Self { width, height })
    }

    pub fn width(self) -> u32 {
        self.width
    }

    pub fn height(self) -> u32 {
        self.height
    }

    pub fn as_f64(self) -> f64 {
        self.width as f64 / self.height as f64
    }

    /// `true` when `dims` has exactly this ratio.
    pub fn matches(self, dims: Dimensions) -> bool {
        dims.width as u64 * self.height as u64 == dims.height as u64 * self.width as u64
    }

    /// `true` when `dims` is strictly wider than this ratio.
    pub fn is_narrower_than(self, dims: Dimensions) -> bool {
        dims.width as u64 * self.height as u64 > dims.height as u64 * self.width as u64
    }
}

impl std::fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.width, self.height)
    }
}

/// Geometric and encoding constraints for one field.
///
/// Resolved once when the field is initialized and shared read-only by every
/// transform for that field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Constraints {
    pub max_width: u32,
    pub max_height: u32,
    pub ratio: Option<AspectRatio>,
    pub quality: Quality,
    pub disable_resize: bool,
}

impl Constraints {
    pub const DEFAULT_MAX_WIDTH: u32 = 1024;
    pub const DEFAULT_MAX_HEIGHT: u32 = 1024;

    pub fn new(max_width: u32, max_height: u32) -> Self {
        Self {
            max_width,
            max_height,
            ..Self::default()
        }
    }

    pub fn with_ratio(mut self, ratio: Option<AspectRatio>) -> Self {
        self.ratio = ratio;
        self
    }

    pub fn with_quality(mut self, quality: Quality) -> Self {
        self.quality = quality;
        self
    }
}

impl Default for Constraints {
    fn default() -> Self {
        Self {
            max_width: Self::DEFAULT_MAX_WIDTH,
            max_height: Self::DEFAULT_MAX_HEIGHT,
            ratio: None,
            quality: Quality::default(),
            disable_resize: false,
        }
    }
}

/// An axis-aligned rectangle in source pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub fn full(dims: Dimensions) -> Self {
        Self {
            x: 0,
            y: 0,
            width: dims.width,
            height: dims.height,
        }
    }

    pub fn dimensions(self) -> Dimensions {
        Dimensions::new(self.width, self.height)
    }

    /// Shift the rectangle by an offset (used when planning inside a sub-region).
    pub fn offset(self, dx: u32, dy: u32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
            ..self
        }
    }
}

/// Where to sample the source and how large the output is.
///
/// `source_rect` is drawn scaled into an output surface of `output` size in
/// one crop-then-scale pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CropPlan {
    pub source: Dimensions,
    pub source_rect: Rect,
    pub output: Dimensions,
}

impl CropPlan {
    /// A plan that leaves the source untouched.
    pub fn noop(source: Dimensions) -> Self {
        Self {
            source,
            source_rect: Rect::full(source),
            output: source,
        }
    }

    /// `true` when neither a crop nor a resize is needed, so callers can skip
    /// re-encoding entirely.
    pub fn is_noop(&self) -> bool {
        self.source_rect == Rect::full(self.source) && self.output == self.source
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quality_clamps_to_valid_range() {
        assert_eq!(Quality::new(0.0).value(), Quality::MIN);
        assert_eq!(Quality::new(0.5).value(), 0.5);
        assert_eq!(Quality::new(1.5).value(), 1.0);
    }

    #[test]
    fn quality_default_is_lossless_intent() {
        assert_eq!(Quality::default().value(), 1.0);
        assert_eq!(Quality::default().percent(), 100);
    }

    #[test]
    fn quality_setting_above_one_is_percent() {
        assert_eq!(Quality::from_setting(85.0).map(Quality::percent), Some(85));
        assert_eq!(Quality::from_setting(0.7).map(Quality::percent), Some(70));
        assert_eq!(Quality::from_setting(1.0).map(Quality::percent), Some(100));
    }

    #[test]
    fn quality_setting_rejects_out_of_range() {
        assert!(Quality::from_setting(0.0).is_none());
        assert!(Quality::from_setting(-3.0).is_none());
        assert!(Quality::from_setting(250.0).is_none());
        assert!(Quality::from_setting(f64::NAN).is_none());
    }

    #[test]
    fn aspect_ratio_zero_term_means_unconstrained() {
        assert!(AspectRatio::new(0, 1).is_none());
        assert!(AspectRatio::new(4, 0).is_none());
        assert!(AspectRatio::new(4, 3).is_some());
    }

    #[test]
    fn aspect_ratio_exact_match() {
        let r = AspectRatio::new(16, 9).unwrap();
        assert!(r.matches(Dimensions::new(1920, 1080)));
        assert!(!r.matches(Dimensions::new(1920, 1081)));
        assert!(r.is_narrower_than(Dimensions::new(2000, 1080)));
        assert!(!r.is_narrower_than(Dimensions::new(1000, 1080)));
    }

    #[test]
    fn noop_plan_detection() {
        let dims = Dimensions::new(101, 50);
        assert!(CropPlan::noop(dims).is_noop());

        // Off-by-one crop flush with the origin is still a crop
        let cropped = CropPlan {
            source: dims,
            source_rect: Rect {
                x: 0,
                y: 0,
                width: 100,
                height: 50,
            },
            output: Dimensions::new(100, 50),
        };
        assert!(!cropped.is_noop());
    }
}
