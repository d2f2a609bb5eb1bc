//! Pure calculation functions for crop and output geometry.
//!
//! All functions here are pure and testable without any I/O or images.

use super::params::{AspectRatio, Constraints, CropPlan, Dimensions, Rect};

/// Plan the crop rectangle and output size for a source of `source` dimensions.
///
/// 1. If the field has a target ratio and the source ratio differs (exact
///    rational comparison), the too-long dimension is cut down to match and
///    the crop is centered.
/// 2. If the (possibly cropped) region exceeds the bounds, it is scaled down
///    uniformly so the more-overflowing side lands exactly on its bound.
/// 3. If neither applies the plan is a no-op and callers skip re-encoding.
///
/// The output never exceeds the bounds and never exceeds the source: this
/// only ever downsizes.
///
/// # Examples
/// ```
/// # use superfile::imaging::{Constraints, Dimensions, plan_crop};
/// // 200x100 with no ratio into 50x50 bounds → 50x25
/// let plan = plan_crop(Dimensions::new(200, 100), &Constraints::new(50, 50));
/// assert_eq!(plan.output, Dimensions::new(50, 25));
/// ```
pub fn plan_crop(source: Dimensions, constraints: &Constraints) -> CropPlan {
    let crop = match constraints.ratio {
        Some(ratio) if !ratio.matches(source) => center_crop(source, ratio),
        _ => Rect::full(source),
    };

    let cropped = crop.dimensions();
    let needs_resize = !cropped.fits_within(constraints.max_width, constraints.max_height);

    if crop == Rect::full(source) && !needs_resize {
        return CropPlan::noop(source);
    }

    let output = match constraints.ratio {
        _ if !needs_resize => cropped,
        Some(ratio) => fit_ratio(cropped, ratio, constraints.max_width, constraints.max_height),
        None => fit_within(cropped, constraints.max_width, constraints.max_height),
    };

    CropPlan {
        source,
        source_rect: crop,
        output,
    }
}

/// Largest centered region of `source` with exactly (up to rounding) `ratio`.
fn center_crop(source: Dimensions, ratio: AspectRatio) -> Rect {
    if ratio.is_narrower_than(source) {
        // Too wide: keep the height, cut the width
        let width = (source.height as f64 * ratio.as_f64()).round() as u32;
        let width = width.max(1).min(source.width);
        Rect {
            x: (source.width - width) / 2,
            y: 0,
            width,
            height: source.height,
        }
    } else {
        // Too tall: keep the width, cut the height
        let height = (source.width as f64 / ratio.as_f64()).round() as u32;
        let height = height.max(1).min(source.height);
        Rect {
            x: 0,
            y: (source.height - height) / 2,
            width: source.width,
            height,
        }
    }
}

/// Scale `dims` down uniformly so it fits `max_width` x `max_height`.
///
/// The side that overflows more lands exactly on its bound; the other is
/// rounded to the nearest pixel. Never returns a zero dimension.
pub fn fit_within(dims: Dimensions, max_width: u32, max_height: u32) -> Dimensions {
    let (w, h) = (dims.width as u64, dims.height as u64);
    let (max_w, max_h) = (max_width as u64, max_height as u64);

    if w <= max_w && h <= max_h {
        return dims;
    }

    // max_w / w <= max_h / h  ⇔  width is the binding side
    if max_w * h <= max_h * w {
        let height = ((h * max_w) as f64 / w as f64).round() as u32;
        Dimensions::new(max_width, height.max(1).min(max_height))
    } else {
        let width = ((w * max_h) as f64 / h as f64).round() as u32;
        Dimensions::new(width.max(1).min(max_width), max_height)
    }
}

/// Like [`fit_within`] for a region that already has `ratio`, except the
/// non-binding side is derived from the exact ratio rather than from the
/// rounded crop, so crop rounding does not accumulate into the output.
fn fit_ratio(cropped: Dimensions, ratio: AspectRatio, max_width: u32, max_height: u32) -> Dimensions {
    let (w, h) = (cropped.width as u64, cropped.height as u64);
    if max_width as u64 * h <= max_height as u64 * w {
        let height = (max_width as f64 / ratio.as_f64()).round() as u32;
        Dimensions::new(max_width, height.max(1).min(max_height).min(cropped.height))
    } else {
        let width = (max_height as f64 * ratio.as_f64()).round() as u32;
        Dimensions::new(width.max(1).min(max_width).min(cropped.width), max_height)
    }
}

/// Centered sub-region of `frame` scaled by `factor` on both axes.
///
/// Used to "zoom" into a live capture frame before planning. Factors outside
/// `(0, 1]` are clamped.
pub fn zoom_region(frame: Dimensions, factor: f64) -> Rect {
    let factor = factor.clamp(f64::MIN_POSITIVE, 1.0);
    let width = ((frame.width as f64 * factor).round() as u32).max(1).min(frame.width);
    let height = ((frame.height as f64 * factor).round() as u32).max(1).min(frame.height);
    Rect {
        x: (frame.width - width) / 2,
        y: (frame.height - height) / 2,
        width,
        height,
    }
}
