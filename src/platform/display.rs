/// On-screen preview surface and the uniform scale used to display a canvas
use super::Platform;
use serde::{Deserialize, Serialize};

/// The preview container the host UI gives us
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DisplayMetrics {
    /// Width of the preview column in CSS pixels
    pub container_width: f32,
    /// Device pixel ratio of the screen showing the preview
    pub dpr: f32,
}

impl Default for DisplayMetrics {
    fn default() -> Self {
        Self {
            container_width: 560.0,
            dpr: 1.0,
        }
    }
}

/// Maximum on-screen box a platform's preview may occupy
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DisplayBox {
    pub max_width: f32,
    pub max_height: f32,
}

impl DisplayBox {
    /// Story previews are capped at 250px wide, squares at 420px, and the
    /// landscape presets fill the column up to 320px tall.
    pub fn for_platform(platform: Platform, metrics: DisplayMetrics) -> Self {
        let column = metrics.container_width.max(1.0);
        match platform {
            Platform::InstagramStory => DisplayBox {
                max_width: column.min(250.0),
                max_height: 550.0,
            },
            Platform::Instagram => DisplayBox {
                max_width: column.min(420.0),
                max_height: 420.0,
            },
            _ => DisplayBox {
                max_width: column,
                max_height: 320.0,
            },
        }
    }

    /// Uniform factor that fits `dims` inside this box. Never enlarges.
    pub fn scale_for(&self, width: f32, height: f32) -> f32 {
        let sx = self.max_width / width.max(1.0);
        let sy = self.max_height / height.max(1.0);
        sx.min(sy).min(1.0)
    }
}

/// Display scale for a `width`×`height` canvas of `platform` in the given
/// container. Pass the canvas actually built, which differs from the preset
/// when dynamic height is on.
pub fn display_scale(width: f32, height: f32, platform: Platform, metrics: DisplayMetrics) -> f32 {
    DisplayBox::for_platform(platform, metrics).scale_for(width, height)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn story_preview_is_width_capped() {
        let dims = Platform::InstagramStory.dimensions();
        let s = display_scale(dims.width as f32, dims.height as f32, Platform::InstagramStory, DisplayMetrics::default());
        assert!((dims.height as f32 * s) <= 550.0 + 0.01);
        assert!((dims.width as f32 * s) <= 250.0 + 0.01);
    }

    #[test]
    fn landscape_preview_is_height_capped() {
        let dims = Platform::Facebook.dimensions();
        let metrics = DisplayMetrics {
            container_width: 2000.0,
            dpr: 2.0,
        };
        let s = display_scale(dims.width as f32, dims.height as f32, Platform::Facebook, metrics);
        assert!((dims.height as f32 * s - 320.0).abs() < 0.01);
    }

    #[test]
    fn tall_landscape_canvas_is_fitted_by_height() {
        let s = display_scale(1200.0, 1440.0, Platform::Twitter, DisplayMetrics::default());
        assert!((1440.0 * s - 320.0).abs() < 0.01);
        assert!(1200.0 * s <= 560.0);
    }

    #[test]
    fn scale_never_enlarges() {
        let b = DisplayBox {
            max_width: 5000.0,
            max_height: 5000.0,
        };
        assert_eq!(b.scale_for(100.0, 100.0), 1.0);
    }
}
