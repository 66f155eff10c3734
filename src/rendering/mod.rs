//! Rendering pipeline: text measurement, layout, paint and rasterization

pub mod avatar;
pub mod fonts;
pub mod layout;
pub mod paint;
pub mod raster;
pub mod text;

pub use fonts::FontBook;
pub use layout::{derive_layout, derive_layout_with, CaptureHandle, LayoutOptions, LayoutPlan, LayoutTree, PreviewFrame};
pub use raster::{render_png, render_preview_png};
pub use text::{Estimated, TextMeasure};

/// An encoded PNG and its pixel size
#[derive(Debug, Clone)]
pub struct Screenshot {
    pub width: u32,
    pub height: u32,
    pub png_data: Vec<u8>,
}

impl Screenshot {
    pub fn empty(width: u32, height: u32) -> Self {
        Self { width, height, png_data: Vec::new() }
    }

    pub fn is_empty(&self) -> bool {
        self.png_data.is_empty()
    }
}
