//! Hookframe
//!
//! Turns a short piece of text (a "hook") into a PNG sized for a social
//! platform. Font sizes, paddings and chrome scale with the canvas and with
//! how much text there is, so a five-word hook and a 500-character thought
//! both fill the frame without clipping.
//!
//! # Pipeline
//!
//! - **Settings**: one `PostSettings` value, updated by shallow merges
//! - **Formatter**: content to segments (lists, thread leader, highlights)
//! - **Scaling**: canvas-relative sizes from a content complexity score
//! - **Layout**: a visual tree at true export pixels; the preview is the
//!   same tree under one uniform scale
//! - **Export**: single-flight rasterization to PNG on a worker thread
//!
//! # Example
//!
//! ```no_run
//! use hookframe::{DisplayMetrics, Platform, SettingsPatch, Studio, StudioConfig};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut studio = Studio::new(StudioConfig::default())?;
//! studio.update_settings(SettingsPatch::content("Most people think they need more time."));
//! studio.mount_preview(DisplayMetrics::default());
//! let out = studio.export_for_platform(Platform::Instagram).await?;
//! println!("wrote {}", out.path.display());
//! # Ok(())
//! # }
//! ```

use std::path::PathBuf;
use std::time::Duration;

use log::warn;

pub mod error;
pub use error::{Error, Result};

pub mod export;
pub mod format;
pub mod platform;
pub mod rendering;
pub mod scaling;
pub mod settings;
pub mod studio;
pub mod style;

pub use export::{export_filename, DirectoryDownloader, Downloader, ExportOutcome, ExportStatus, Exporter};
pub use format::{format_content, Highlight, Segment};
pub use platform::{DisplayMetrics, Platform, PlatformDimensions};
pub use rendering::{derive_layout, derive_layout_with, CaptureHandle, LayoutOptions, LayoutPlan, LayoutTree, PreviewFrame, Screenshot};
pub use scaling::{compute_layout, ContentMetrics, LayoutMetrics};
pub use settings::{PostFormat, PostSettings, SettingsPatch};
pub use studio::Studio;

/// Session configuration
///
/// Defaults export at 2× into the working directory and look for fonts in
/// `./fonts` and the usual system font folders.
///
/// # Examples
///
/// ```
/// let cfg = hookframe::StudioConfig::default();
/// assert_eq!(cfg.pixel_ratio, 2.0);
/// assert!(cfg.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct StudioConfig {
    /// Device pixels per canvas pixel in exported PNGs
    pub pixel_ratio: f32,
    /// Directory exports are written into
    pub output_dir: PathBuf,
    pub filename_prefix: String,
    /// Directories searched, in order, for TTF files
    pub font_dirs: Vec<PathBuf>,
    /// Let landscape platforms grow or shrink their height to the content
    pub dynamic_height: bool,
    pub success_dismiss_ms: u64,
    pub error_dismiss_ms: u64,
    /// Derived plans kept in memory (0 disables the cache)
    pub layout_cache_capacity: usize,
}

impl Default for StudioConfig {
    fn default() -> Self {
        Self {
            pixel_ratio: 2.0,
            output_dir: PathBuf::from("."),
            filename_prefix: "hookframe".to_string(),
            font_dirs: vec![
                PathBuf::from("./fonts"),
                PathBuf::from("/usr/share/fonts/truetype/dejavu"),
                PathBuf::from("/usr/share/fonts/TTF"),
                PathBuf::from("/Library/Fonts"),
            ],
            dynamic_height: false,
            success_dismiss_ms: 2000,
            error_dismiss_ms: 4000,
            layout_cache_capacity: 32,
        }
    }
}

impl StudioConfig {
    /// Defaults overridden by `HOOKFRAME_*` environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`StudioConfig::from_env`] with an explicit variable source.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = Self::default();
        if let Some(raw) = lookup("HOOKFRAME_PIXEL_RATIO") {
            match raw.trim().parse::<f32>() {
                Ok(r) if r.is_finite() && r > 0.0 => cfg.pixel_ratio = r,
                _ => warn!("ignoring HOOKFRAME_PIXEL_RATIO={:?}", raw),
            }
        }
        if let Some(dir) = lookup("HOOKFRAME_OUTPUT_DIR").filter(|d| !d.trim().is_empty()) {
            cfg.output_dir = PathBuf::from(dir);
        }
        if let Some(dir) = lookup("HOOKFRAME_FONT_DIR").filter(|d| !d.trim().is_empty()) {
            cfg.font_dirs.insert(0, PathBuf::from(dir));
        }
        if let Some(raw) = lookup("HOOKFRAME_DYNAMIC_HEIGHT") {
            match raw.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => cfg.dynamic_height = true,
                "0" | "false" | "no" | "off" => cfg.dynamic_height = false,
                _ => warn!("ignoring HOOKFRAME_DYNAMIC_HEIGHT={:?}", raw),
            }
        }
        cfg
    }

    pub fn validate(&self) -> Result<()> {
        if !self.pixel_ratio.is_finite() || self.pixel_ratio <= 0.0 {
            return Err(Error::ConfigError(format!(
                "pixel_ratio must be a positive number, got {}",
                self.pixel_ratio
            )));
        }
        if self.filename_prefix.contains(['/', '\\']) {
            return Err(Error::ConfigError("filename_prefix must not contain path separators".into()));
        }
        Ok(())
    }

    pub fn success_dismiss(&self) -> Duration {
        Duration::from_millis(self.success_dismiss_ms)
    }

    pub fn error_dismiss(&self) -> Duration {
        Duration::from_millis(self.error_dismiss_ms)
    }
}
