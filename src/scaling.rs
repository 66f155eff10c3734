//! Scaling engine: canvas size + content metrics to concrete geometry
//!
//! Every size is a fraction of canvas width, reduced by a step function of
//! the content complexity score. The step function is non-increasing, so
//! longer content never gets a larger main font. Header chrome (name,
//! avatar) and the CTA button are derived from canvas width only and stay
//! put while the hook text is edited.

use serde::Serialize;

use crate::platform::PlatformDimensions;
use crate::settings::{CtaSize, PostFormat, PostSettings};

pub const MAIN_LINE_HEIGHT: f32 = 1.35;
pub const SUBTITLE_LINE_HEIGHT: f32 = 1.4;
pub const POINTER_LINE_HEIGHT: f32 = 1.3;
pub const NAME_LINE_HEIGHT: f32 = 1.25;
pub const HANDLE_LINE_HEIGHT: f32 = 1.3;

/// Absolute floor for any computed size, in canvas pixels
pub const MIN_SIZE_PX: f32 = 4.0;

/// Lower bound of the main font, as a fraction of canvas width
pub const MAIN_MIN_PCT: f32 = 0.018;

const SUBTITLE_RATIO: f32 = 0.54;
const POINTER_RATIO: f32 = 0.44;
const HANDLE_RATIO: f32 = 0.38;

const SUBTITLE_MIN_PCT: f32 = 0.012;
const POINTER_MIN_PCT: f32 = 0.011;
const HANDLE_MIN_PCT: f32 = 0.010;
const NAME_MIN_PCT: f32 = 0.014;

/// Share of the font size an average glyph advances, used for line estimates
const ESTIMATE_ADVANCE: f32 = 0.55;

/// Coarse canvas shape class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Regime {
    Landscape,
    Square,
    Portrait,
}

impl Regime {
    pub fn classify(width: u32, height: u32) -> Self {
        let aspect = width as f32 / height.max(1) as f32;
        if aspect > 1.5 {
            Regime::Landscape
        } else if aspect < 0.7 {
            Regime::Portrait
        } else {
            Regime::Square
        }
    }

    fn profile(self) -> &'static RegimeProfile {
        match self {
            Regime::Landscape => &LANDSCAPE,
            Regime::Square => &SQUARE,
            Regime::Portrait => &PORTRAIT,
        }
    }
}

/// Per-regime constants. Tiers are `(score_below, multiplier)` pairs with
/// strictly decreasing multipliers; `floor` applies past the last tier.
struct RegimeProfile {
    base_pct: f32,
    max_pct: f32,
    tiers: &'static [(u32, f32)],
    floor: f32,
    name_pct: f32,
    avatar_pct: f32,
    cta_pct: f32,
    pad_x_pct: f32,
    pad_y_pct: f32,
}

const LANDSCAPE: RegimeProfile = RegimeProfile {
    base_pct: 0.052,
    max_pct: 0.052,
    tiers: &[(80, 1.0), (120, 0.86), (180, 0.74), (250, 0.64), (350, 0.56), (450, 0.5), (600, 0.45)],
    floor: 0.42,
    name_pct: 0.024,
    avatar_pct: 0.06,
    cta_pct: 0.045,
    pad_x_pct: 0.06,
    pad_y_pct: 0.08,
};

const SQUARE: RegimeProfile = RegimeProfile {
    base_pct: 0.065,
    max_pct: 0.065,
    tiers: &[
        (80, 1.0),
        (120, 0.86),
        (180, 0.77),
        (250, 0.68),
        (350, 0.6),
        (450, 0.53),
        (600, 0.48),
        (750, 0.45),
    ],
    floor: 0.43,
    name_pct: 0.03,
    avatar_pct: 0.075,
    cta_pct: 0.06,
    pad_x_pct: 0.07,
    pad_y_pct: 0.08,
};

const PORTRAIT: RegimeProfile = RegimeProfile {
    base_pct: 0.065,
    max_pct: 0.065,
    tiers: &[(100, 1.0), (150, 0.86), (220, 0.74), (300, 0.64), (400, 0.56), (500, 0.5), (650, 0.46)],
    floor: 0.42,
    name_pct: 0.036,
    avatar_pct: 0.09,
    cta_pct: 0.07,
    pad_x_pct: 0.07,
    pad_y_pct: 0.06,
};

/// Counts the scaling heuristic is driven by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct ContentMetrics {
    pub char_count: usize,
    pub word_count: usize,
    pub line_break_count: usize,
}

impl ContentMetrics {
    pub fn measure(text: &str) -> Self {
        ContentMetrics {
            char_count: text.chars().count(),
            word_count: text.split_whitespace().count(),
            line_break_count: text.matches('\n').count(),
        }
    }

    /// `chars + 2*words + 10*line_breaks`
    pub fn complexity_score(&self) -> u32 {
        let score = self.char_count + 2 * self.word_count + 10 * self.line_break_count;
        score.min(u32::MAX as usize) as u32
    }
}

/// Step multiplier for a score within a regime
pub fn complexity_multiplier(regime: Regime, score: u32) -> f32 {
    let profile = regime.profile();
    profile
        .tiers
        .iter()
        .find(|(below, _)| score < *below)
        .map(|(_, m)| *m)
        .unwrap_or(profile.floor)
}

/// Multiplier reserving vertical room for dense or header-bearing formats
pub fn format_penalty(format: PostFormat) -> f32 {
    match format {
        PostFormat::ListDrop | PostFormat::LongThought | PostFormat::CreatorCard => 0.9,
        _ => 1.0,
    }
}

/// Shrink applied to long creator names so they stay on one line
pub fn name_length_factor(name: &str) -> f32 {
    match name.chars().count() {
        n if n > 25 => 0.7,
        n if n > 20 => 0.8,
        n if n > 15 => 0.9,
        _ => 1.0,
    }
}

/// Which optional blocks surround the body, and the inputs that size them
#[derive(Debug, Clone, PartialEq)]
pub struct Chrome {
    pub has_header: bool,
    pub creator_name: String,
    pub has_subtitle: bool,
    pub has_pointer: bool,
    pub has_cta: bool,
    pub cta_size: CtaSize,
    /// Grow or shrink the canvas height to fit the content
    pub dynamic_height: bool,
}

impl Chrome {
    pub fn from_settings(settings: &PostSettings, dynamic_height: bool) -> Self {
        Chrome {
            has_header: settings.shows_header(),
            creator_name: settings.creator_name.clone(),
            has_subtitle: !settings.subtitle.is_empty(),
            has_pointer: settings.show_comment_pointer && !settings.comment_pointer_text.is_empty(),
            has_cta: settings.show_cta_button,
            cta_size: settings.cta_size,
            dynamic_height: dynamic_height && settings.platform.allows_dynamic_height(),
        }
    }

    pub fn has_footer(&self) -> bool {
        self.has_pointer || self.has_cta
    }
}

impl Default for Chrome {
    fn default() -> Self {
        Chrome {
            has_header: false,
            creator_name: String::new(),
            has_subtitle: false,
            has_pointer: false,
            has_cta: false,
            cta_size: CtaSize::Md,
            dynamic_height: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FontSizes {
    pub main: f32,
    pub subtitle: f32,
    pub pointer: f32,
    pub name: f32,
    pub handle: f32,
    pub avatar_initial: f32,
    pub thread_glyph: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Paddings {
    pub x: f32,
    pub y: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Gaps {
    /// Below the profile header
    pub header: f32,
    /// Between avatar and name column
    pub header_inner: f32,
    /// Between name and verified badge
    pub badge: f32,
    /// Above the subtitle
    pub subtitle: f32,
    /// Above each footer element
    pub footer: f32,
    /// Between list items
    pub list_item: f32,
    /// Between a list marker and its text
    pub marker: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ElementSizes {
    pub avatar: f32,
    pub cta: f32,
    pub badge: f32,
}

/// Full geometric parameter set for one canvas
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LayoutMetrics {
    pub regime: Regime,
    pub complexity_score: u32,
    pub canvas_width: u32,
    pub canvas_height: u32,
    pub font_sizes: FontSizes,
    pub paddings: Paddings,
    pub gaps: Gaps,
    pub element_sizes: ElementSizes,
}

fn floor(value: f32, min: f32) -> f32 {
    let v = if value.is_finite() { value } else { min };
    v.max(min).max(MIN_SIZE_PX)
}

/// Main font size before any chrome is considered
pub fn main_font_size(width: u32, regime: Regime, score: u32, format: PostFormat) -> f32 {
    let w = width as f32;
    let profile = regime.profile();
    let raw = profile.base_pct * w * complexity_multiplier(regime, score) * format_penalty(format);
    floor(raw.clamp(MAIN_MIN_PCT * w, profile.max_pct * w), MAIN_MIN_PCT * w)
}

/// Inclusive `[min, max]` bounds of the main font for a canvas, in pixels
pub fn main_font_bounds(width: u32, height: u32) -> (f32, f32) {
    let w = width as f32;
    let profile = Regime::classify(width, height).profile();
    ((MAIN_MIN_PCT * w).max(MIN_SIZE_PX), profile.max_pct * w)
}

/// Compute every size for a canvas of `dims` holding `content`.
pub fn compute_layout(
    dims: &PlatformDimensions,
    content: &ContentMetrics,
    format: PostFormat,
    chrome: &Chrome,
) -> LayoutMetrics {
    let width = dims.width.max(1);
    let w = width as f32;
    let regime = Regime::classify(width, dims.height);
    let profile = regime.profile();
    let score = content.complexity_score();

    let main = main_font_size(width, regime, score, format);
    let subtitle = floor(main * SUBTITLE_RATIO, SUBTITLE_MIN_PCT * w);
    let pointer = floor(main * POINTER_RATIO, POINTER_MIN_PCT * w);
    let handle = floor(main * HANDLE_RATIO, HANDLE_MIN_PCT * w);
    let name = floor(
        profile.name_pct * w * name_length_factor(&chrome.creator_name),
        NAME_MIN_PCT * w * name_length_factor(&chrome.creator_name),
    );

    let avatar = floor(profile.avatar_pct * w, MIN_SIZE_PX);
    let cta = floor(profile.cta_pct * w * chrome.cta_size.multiplier(), MIN_SIZE_PX);
    let badge = floor(name * 1.3, MIN_SIZE_PX);

    let height = if chrome.dynamic_height {
        dynamic_canvas_height(width, main, profile.pad_x_pct * w, content, chrome)
    } else {
        dims.height.max(1)
    };

    LayoutMetrics {
        regime,
        complexity_score: score,
        canvas_width: width,
        canvas_height: height,
        font_sizes: FontSizes {
            main,
            subtitle,
            pointer,
            name,
            handle,
            avatar_initial: floor(avatar * 0.45, MIN_SIZE_PX),
            thread_glyph: floor(main * 0.8, MIN_SIZE_PX),
        },
        paddings: Paddings {
            x: profile.pad_x_pct * w,
            y: profile.pad_y_pct * height as f32,
        },
        gaps: Gaps {
            header: 0.025 * w,
            header_inner: avatar * 0.25,
            badge: name * 0.3,
            subtitle: main * 0.45,
            footer: 0.02 * w,
            list_item: main * 0.3,
            marker: main * 0.4,
        },
        element_sizes: ElementSizes { avatar, cta, badge },
    }
}

/// Canvas height for the dynamic-height variant, clamped to `[0.55w, 1.2w]`.
fn dynamic_canvas_height(width: u32, main: f32, pad_x: f32, content: &ContentMetrics, chrome: &Chrome) -> u32 {
    let w = width as f32;
    let content_w = (w - 2.0 * pad_x).max(1.0);
    let chars_per_line = (content_w / (main * ESTIMATE_ADVANCE)).max(1.0);
    let wrapped = (content.char_count as f32 / chars_per_line).ceil();
    let lines = (wrapped + content.line_break_count as f32).max(1.0);

    let mut height = lines * main * MAIN_LINE_HEIGHT + 0.12 * w;
    if chrome.has_header {
        height += 0.12 * w;
    }
    if chrome.has_subtitle {
        height += 0.08 * w;
    }
    if chrome.has_footer() {
        height += 0.1 * w;
    }
    height.clamp(0.55 * w, 1.2 * w).round() as u32
}

/// Convenience wrapper deriving everything from settings.
pub fn compute_for_settings(settings: &PostSettings, dynamic_height: bool) -> LayoutMetrics {
    compute_layout(
        &settings.platform.dimensions(),
        &ContentMetrics::measure(&settings.content),
        settings.format,
        &Chrome::from_settings(settings, dynamic_height),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::Platform;

    fn layout(content: &str, platform: Platform, format: PostFormat) -> LayoutMetrics {
        compute_layout(
            &platform.dimensions(),
            &ContentMetrics::measure(content),
            format,
            &Chrome::default(),
        )
    }

    #[test]
    fn complexity_weights_lines_and_words() {
        let m = ContentMetrics::measure("ab cd\nef");
        assert_eq!(m.char_count, 8);
        assert_eq!(m.word_count, 3);
        assert_eq!(m.line_break_count, 1);
        assert_eq!(m.complexity_score(), 8 + 6 + 10);
    }

    #[test]
    fn empty_content_scores_zero() {
        assert_eq!(ContentMetrics::measure("").complexity_score(), 0);
    }

    #[test]
    fn regimes_follow_aspect_ratio() {
        assert_eq!(Regime::classify(1200, 630), Regime::Landscape);
        assert_eq!(Regime::classify(1200, 675), Regime::Landscape);
        assert_eq!(Regime::classify(1080, 1080), Regime::Square);
        assert_eq!(Regime::classify(1080, 1920), Regime::Portrait);
        assert_eq!(Regime::classify(0, 0), Regime::Square);
    }

    #[test]
    fn multipliers_strictly_decrease() {
        for regime in [Regime::Landscape, Regime::Square, Regime::Portrait] {
            let p = regime.profile();
            let mut prev = f32::INFINITY;
            for (_, m) in p.tiers {
                assert!(*m < prev);
                prev = *m;
            }
            assert!(p.floor < prev);
            assert!((0.4..=0.45).contains(&p.floor));
        }
    }

    #[test]
    fn main_font_is_non_increasing_in_score() {
        for platform in Platform::ALL {
            for format in PostFormat::ALL {
                let dims = platform.dimensions();
                let regime = Regime::classify(dims.width, dims.height);
                let mut prev = f32::INFINITY;
                for score in 0..900 {
                    let size = main_font_size(dims.width, regime, score, format);
                    assert!(size <= prev, "{} {} grew at score {}", platform, format, score);
                    prev = size;
                }
            }
        }
    }

    #[test]
    fn short_square_hook_gets_top_tier() {
        let content = "Most people think they need more time. They don't.";
        let m = layout(content, Platform::Instagram, PostFormat::HookOnly);
        assert_eq!(m.regime, Regime::Square);
        assert_eq!(complexity_multiplier(Regime::Square, m.complexity_score), 1.0);
        assert!((m.font_sizes.main - 0.065 * 1080.0).abs() < 1e-3);
        let longer = layout(&content.repeat(4), Platform::Instagram, PostFormat::HookOnly);
        assert!(m.font_sizes.main > longer.font_sizes.main);
    }

    #[test]
    fn dense_formats_are_penalised() {
        let plain = layout("Ten short words", Platform::Facebook, PostFormat::HookOnly);
        let list = layout("Ten short words", Platform::Facebook, PostFormat::ListDrop);
        assert!((list.font_sizes.main / plain.font_sizes.main - 0.9).abs() < 1e-4);
    }

    #[test]
    fn dependent_sizes_track_main() {
        let m = layout("Hello there", Platform::Twitter, PostFormat::HookOnly);
        let f = m.font_sizes;
        assert!((f.subtitle / f.main - SUBTITLE_RATIO).abs() < 1e-4);
        assert!((f.pointer / f.main - POINTER_RATIO).abs() < 1e-4);
        assert!((f.handle / f.main - HANDLE_RATIO).abs() < 1e-4);
    }

    #[test]
    fn name_shrinks_for_long_names() {
        assert_eq!(name_length_factor("Short"), 1.0);
        assert_eq!(name_length_factor("Sixteen chars!!!"), 0.9);
        assert_eq!(name_length_factor("Twenty-one characters"), 0.8);
        assert_eq!(name_length_factor("A Very Long Display Name Indeed"), 0.7);
    }

    #[test]
    fn cta_follows_size_multiplier() {
        let dims = Platform::Instagram.dimensions();
        let sizes: Vec<f32> = [CtaSize::Sm, CtaSize::Md, CtaSize::Lg]
            .into_iter()
            .map(|cta_size| {
                let chrome = Chrome {
                    has_cta: true,
                    cta_size,
                    ..Chrome::default()
                };
                compute_layout(&dims, &ContentMetrics::default(), PostFormat::HookOnly, &chrome)
                    .element_sizes
                    .cta
            })
            .collect();
        assert!((sizes[1] / sizes[0] - 1.1 / 0.8).abs() < 1e-4);
        assert!((sizes[2] / sizes[0] - 1.4 / 0.8).abs() < 1e-4);
    }

    #[test]
    fn degenerate_inputs_stay_positive() {
        let word = "x".repeat(5000);
        let m = layout(&word, Platform::Linkedin, PostFormat::LongThought);
        let f = m.font_sizes;
        for v in [f.main, f.subtitle, f.pointer, f.name, f.handle, f.avatar_initial, f.thread_glyph] {
            assert!(v > 0.0 && v.is_finite());
        }
        let (min, _) = main_font_bounds(1200, 627);
        assert!(f.main >= min);
    }

    #[test]
    fn dynamic_height_is_clamped() {
        let dims = Platform::Facebook.dimensions();
        let chrome = Chrome {
            dynamic_height: true,
            ..Chrome::default()
        };
        let tiny = compute_layout(&dims, &ContentMetrics::measure("Hi"), PostFormat::HookOnly, &chrome);
        assert_eq!(tiny.canvas_height, (0.55 * 1200.0_f32).round() as u32);
        let huge = compute_layout(&dims, &ContentMetrics::measure(&"word ".repeat(1500)), PostFormat::HookOnly, &chrome);
        assert_eq!(huge.canvas_height, (1.2 * 1200.0_f32).round() as u32);
    }

    #[test]
    fn dynamic_height_is_ignored_for_story_and_square() {
        let mut s = PostSettings::default();
        s.platform = Platform::InstagramStory;
        s.content = "Hello".into();
        assert_eq!(compute_for_settings(&s, true).canvas_height, 1920);
        s.platform = Platform::Instagram;
        assert_eq!(compute_for_settings(&s, true).canvas_height, 1080);
    }
}
