//! Image processing: geometry planning plus pixel work on the `image` crate.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Plan** | [`plan_crop`] (pure) |
//! | **Decode** | `image::load_from_memory_with_format` |
//! | **Crop + scale** | `crop_imm` + Lanczos3 `resize_exact` |
//! | **Encode** | same format as the input, JPEG/AVIF at the field quality |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for crop and output geometry (unit testable)
//! - **Parameters**: Data structures describing constraints and plans
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]
//! - **Operations**: [`TransformEngine`], combining calculations + backend

pub mod backend;
mod calculations;
pub mod operations;
mod params;
pub mod rust_backend;

pub use backend::{BackendError, ImageBackend};
pub use calculations::{fit_within, plan_crop, zoom_region};
pub use operations::{Normalized, TransformEngine};
pub use params::{AspectRatio, Constraints, CropPlan, Dimensions, Quality, Rect};
pub use rust_backend::RustBackend;
