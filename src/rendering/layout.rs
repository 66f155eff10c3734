/// Layout renderer: settings to a visual tree in export-pixel units
///
/// The tree is always built at the platform's canonical canvas size. The
/// on-screen preview is the same tree under one uniform scale, and exports
/// read the unscaled tree through a `CaptureHandle`, so what is shown and
/// what is written differ only by that factor.
use std::sync::Arc;

use serde::Serialize;

use crate::format::{apply_highlight, format_content, Highlight, Segment, TextRun};
use crate::platform::{display::display_scale, DisplayMetrics, Platform};
use crate::rendering::text::{truncate_to_width, wrap_runs, Estimated, PlacedFragment, TextMeasure, TextStyle, WrappedLine};
use crate::scaling::{
    compute_for_settings, main_font_bounds, LayoutMetrics, HANDLE_LINE_HEIGHT, MAIN_LINE_HEIGHT,
    NAME_LINE_HEIGHT, POINTER_LINE_HEIGHT, SUBTITLE_LINE_HEIGHT,
};
use crate::settings::{BackgroundType, PostFormat, PostSettings};
use crate::style::{opacity, Color, FontFamily, FontWeight};

/// Corner rounding of the on-screen preview, in display pixels
pub const PREVIEW_CORNER_RADIUS: f32 = 8.0;

/// Fallback highlight when the configured color does not parse
const DEFAULT_HIGHLIGHT: Color = Color::rgb(0xfa, 0xcc, 0x15);

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Rect { x, y, width, height }
    }

    pub fn scaled(&self, k: f32) -> Rect {
        Rect::new(self.x * k, self.y * k, self.width * k, self.height * k)
    }

    pub fn translated(&self, dx: f32, dy: f32) -> Rect {
        Rect::new(self.x + dx, self.y + dy, self.width, self.height)
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    pub fn approx_eq(&self, other: &Rect, eps: f32) -> bool {
        (self.x - other.x).abs() <= eps
            && (self.y - other.y).abs() <= eps
            && (self.width - other.width).abs() <= eps
            && (self.height - other.height).abs() <= eps
    }
}

/// Canvas background paint
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Fill {
    Solid { color: Color },
    LinearGradient { from: Color, to: Color, angle: f32 },
}

/// What a node is, for tests, tooling and paint ordering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ElementType {
    Background,
    Avatar,
    Name,
    VerifiedBadge,
    Handle,
    Body,
    ListMarker,
    ThreadGlyph,
    Placeholder,
    Subtitle,
    Pointer,
    CtaButton,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum NodeContent {
    Background { fill: Fill },
    Text {
        text: String,
        size: f32,
        weight: FontWeight,
        italic: bool,
        color: Color,
    },
    Avatar {
        /// Raw avatar setting; empty draws the initial placeholder
        source: String,
        initial: String,
        initial_size: f32,
    },
    VerifiedBadge,
    ThreadGlyph { color: Color },
    CtaButton { fill: Color, arrow: Color, arrow_size: f32 },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LayoutNode {
    pub rect: Rect,
    pub elem_type: ElementType,
    pub content: NodeContent,
    pub opacity: f32,
}

impl LayoutNode {
    fn scaled(&self, k: f32) -> LayoutNode {
        let content = match &self.content {
            NodeContent::Text {
                text,
                size,
                weight,
                italic,
                color,
            } => NodeContent::Text {
                text: text.clone(),
                size: size * k,
                weight: *weight,
                italic: *italic,
                color: *color,
            },
            NodeContent::Avatar {
                source,
                initial,
                initial_size,
            } => NodeContent::Avatar {
                source: source.clone(),
                initial: initial.clone(),
                initial_size: initial_size * k,
            },
            NodeContent::CtaButton { fill, arrow, arrow_size } => NodeContent::CtaButton {
                fill: *fill,
                arrow: *arrow,
                arrow_size: arrow_size * k,
            },
            other => other.clone(),
        };
        LayoutNode {
            rect: self.rect.scaled(k),
            elem_type: self.elem_type,
            content,
            opacity: self.opacity,
        }
    }

    pub fn text(&self) -> Option<&str> {
        match &self.content {
            NodeContent::Text { text, .. } => Some(text),
            _ => None,
        }
    }
}

/// The visual tree for one canvas
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LayoutTree {
    pub width: f32,
    pub height: f32,
    /// Uniform factor relative to export pixels (1.0 for export)
    pub scale: f32,
    pub family: FontFamily,
    pub nodes: Vec<LayoutNode>,
}

impl LayoutTree {
    /// The same tree under a uniform scale
    pub fn scaled(&self, k: f32) -> LayoutTree {
        LayoutTree {
            width: self.width * k,
            height: self.height * k,
            scale: self.scale * k,
            family: self.family,
            nodes: self.nodes.iter().map(|n| n.scaled(k)).collect(),
        }
    }

    /// Node rectangles in canvas-width units
    pub fn normalized_rects(&self) -> Vec<Rect> {
        let w = self.width.max(f32::EPSILON);
        self.nodes.iter().map(|n| n.rect.scaled(1.0 / w)).collect()
    }

    pub fn nodes_of(&self, elem_type: ElementType) -> impl Iterator<Item = &LayoutNode> {
        self.nodes.iter().filter(move |n| n.elem_type == elem_type)
    }

    pub fn first(&self, elem_type: ElementType) -> Option<&LayoutNode> {
        self.nodes_of(elem_type).next()
    }

    /// Text of all nodes of one type, joined line by line
    pub fn text_of(&self, elem_type: ElementType) -> String {
        self.nodes_of(elem_type).filter_map(LayoutNode::text).collect::<Vec<_>>().join("")
    }

    /// Geometric equality up to `eps` in canvas-width units
    pub fn same_geometry(&self, other: &LayoutTree, eps: f32) -> bool {
        let a = self.normalized_rects();
        let b = other.normalized_rects();
        a.len() == b.len() && a.iter().zip(&b).all(|(x, y)| x.approx_eq(y, eps))
    }
}

/// Layout knobs that are not part of the post itself
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LayoutOptions {
    pub dynamic_height: bool,
}

/// Everything derived from one settings value
#[derive(Debug, Clone, Serialize)]
pub struct LayoutPlan {
    pub platform: Platform,
    pub format: PostFormat,
    pub segments: Vec<Segment>,
    pub metrics: LayoutMetrics,
    /// Main size actually used after the overflow guard
    pub body_font_size: f32,
    pub tree: LayoutTree,
}

/// Scaled copy of a plan's tree for on-screen display
#[derive(Debug, Clone)]
pub struct PreviewFrame {
    pub tree: LayoutTree,
    pub display_scale: f32,
    pub dpr: f32,
    /// Display-only rounding; never applied to exports
    pub corner_radius: f32,
}

/// Handle to the unscaled tree an export reads from
#[derive(Debug, Clone)]
pub struct CaptureHandle {
    tree: Arc<LayoutTree>,
    pub platform: Platform,
    pub format: PostFormat,
}

impl CaptureHandle {
    pub fn tree(&self) -> &LayoutTree {
        &self.tree
    }
}

impl LayoutPlan {
    pub fn preview(&self, display: DisplayMetrics) -> PreviewFrame {
        let s = display_scale(self.tree.width, self.tree.height, self.platform, display);
        PreviewFrame {
            tree: self.tree.scaled(s),
            display_scale: s,
            dpr: display.dpr,
            corner_radius: PREVIEW_CORNER_RADIUS,
        }
    }

    pub fn capture_handle(&self) -> CaptureHandle {
        CaptureHandle {
            tree: Arc::new(self.tree.clone()),
            platform: self.platform,
            format: self.format,
        }
    }

    pub fn canvas_size(&self) -> (u32, u32) {
        (self.metrics.canvas_width, self.metrics.canvas_height)
    }
}

/// Derive the full layout for `settings` with the advance-table measure.
/// Pure and total, and identical on every machine.
pub fn derive_layout(settings: &PostSettings, options: &LayoutOptions) -> LayoutPlan {
    derive_layout_with(settings, options, &Estimated)
}

/// Derive the full layout, measuring text with `measure`.
pub fn derive_layout_with(settings: &PostSettings, options: &LayoutOptions, measure: &dyn TextMeasure) -> LayoutPlan {
    let highlight = Highlight::new(
        settings.highlight_text.clone(),
        Color::parse_or(&settings.highlight_color, DEFAULT_HIGHLIGHT),
    );
    let segments = format_content(&settings.content, settings.format, &highlight);
    let metrics = compute_for_settings(settings, options.dynamic_height);
    let (tree, body_font_size) = build_tree(settings, &metrics, &segments, &highlight, measure);
    LayoutPlan {
        platform: settings.platform,
        format: settings.format,
        segments,
        metrics,
        body_font_size,
        tree,
    }
}

fn background_fill(settings: &PostSettings) -> Fill {
    match settings.background_type {
        BackgroundType::Solid => Fill::Solid {
            color: Color::parse_or(&settings.background_color, Color::BLACK),
        },
        BackgroundType::Gradient => {
            let g = settings.gradient_preset.gradient();
            Fill::LinearGradient {
                from: g.from,
                to: g.to,
                angle: g.angle,
            }
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn push_lines(
    nodes: &mut Vec<LayoutNode>,
    lines: &[WrappedLine],
    left: f32,
    top: f32,
    line_height: f32,
    style: TextStyle,
    italic: bool,
    color: Color,
    opacity: f32,
    elem_type: ElementType,
) -> f32 {
    for (i, line) in lines.iter().enumerate() {
        let y = top + i as f32 * line_height;
        for frag in line.fragments.iter().filter(|f| !f.text.trim().is_empty()) {
            nodes.push(LayoutNode {
                rect: Rect::new(left + frag.x, y, frag.width, line_height),
                elem_type,
                content: NodeContent::Text {
                    text: frag.text.clone(),
                    size: style.size,
                    weight: style.weight,
                    italic,
                    color: frag.highlight.unwrap_or(color),
                },
                opacity,
            });
        }
    }
    lines.len() as f32 * line_height
}

/// Lay the body segments out from y = 0 at main size `size`.
#[allow(clippy::too_many_arguments)]
fn layout_body(
    segments: &[Segment],
    metrics: &LayoutMetrics,
    family: FontFamily,
    size: f32,
    left: f32,
    width: f32,
    color: Color,
    measure: &dyn TextMeasure,
) -> (Vec<LayoutNode>, f32) {
    let k = size / metrics.font_sizes.main.max(f32::EPSILON);
    let line_h = size * MAIN_LINE_HEIGHT;
    let bold = TextStyle {
        size,
        family,
        weight: FontWeight::Bold,
    };
    let mut nodes = Vec::new();
    let mut y = 0.0;

    for (i, segment) in segments.iter().enumerate() {
        if i > 0 {
            y += metrics.gaps.list_item * k;
        }
        match segment {
            Segment::Plain { runs } => {
                let lines = wrap_runs(runs, width, bold, measure);
                y += push_lines(&mut nodes, &lines, left, y, line_h, bold, false, color, 1.0, ElementType::Body);
            }
            Segment::ListItem { number, runs } => {
                let marker_style = TextStyle {
                    weight: FontWeight::Medium,
                    ..bold
                };
                let marker = format!("{}.", number);
                let marker_w = measure.width(&marker, marker_style);
                let text_left = left + marker_w + metrics.gaps.marker * k;
                let lines = wrap_runs(runs, (left + width - text_left).max(size), bold, measure);
                let marker_line = [WrappedLine {
                    fragments: vec![PlacedFragment {
                        text: marker,
                        x: 0.0,
                        width: marker_w,
                        highlight: None,
                    }],
                    width: marker_w,
                }];
                push_lines(
                    &mut nodes,
                    &marker_line,
                    left,
                    y,
                    line_h,
                    marker_style,
                    false,
                    color,
                    opacity::LIST_MARKER,
                    ElementType::ListMarker,
                );
                let h = push_lines(&mut nodes, &lines, text_left, y, line_h, bold, false, color, 1.0, ElementType::Body);
                y += h.max(line_h);
            }
            Segment::ThreadLeader { runs } => {
                let glyph = metrics.font_sizes.thread_glyph * k;
                nodes.push(LayoutNode {
                    rect: Rect::new(left - glyph * 1.2, y + (line_h - glyph) / 2.0, glyph, glyph),
                    elem_type: ElementType::ThreadGlyph,
                    content: NodeContent::ThreadGlyph { color },
                    opacity: opacity::THREAD_GLYPH,
                });
                let lines = wrap_runs(runs, width, bold, measure);
                y += push_lines(&mut nodes, &lines, left, y, line_h, bold, false, color, 1.0, ElementType::Body);
            }
            Segment::Placeholder { text } => {
                let style = TextStyle {
                    weight: FontWeight::Regular,
                    ..bold
                };
                let lines = wrap_runs(&[TextRun::plain(text.as_str())], width, style, measure);
                y += push_lines(
                    &mut nodes,
                    &lines,
                    left,
                    y,
                    line_h,
                    style,
                    true,
                    color,
                    opacity::PLACEHOLDER,
                    ElementType::Placeholder,
                );
            }
        }
    }
    (nodes, y)
}

fn build_tree(
    settings: &PostSettings,
    metrics: &LayoutMetrics,
    segments: &[Segment],
    highlight: &Highlight,
    measure: &dyn TextMeasure,
) -> (LayoutTree, f32) {
    let w = metrics.canvas_width as f32;
    let h = metrics.canvas_height as f32;
    let family = settings.font_family;
    let fonts = metrics.font_sizes;
    let gaps = metrics.gaps;
    let left = metrics.paddings.x;
    let content_w = (w - 2.0 * metrics.paddings.x).max(1.0);
    let text_color = Color::parse_or(&settings.text_color, Color::WHITE);
    let highlight_color = highlight.color;

    let mut nodes = vec![LayoutNode {
        rect: Rect::new(0.0, 0.0, w, h),
        elem_type: ElementType::Background,
        content: NodeContent::Background {
            fill: background_fill(settings),
        },
        opacity: 1.0,
    }];

    let mut top = metrics.paddings.y;
    let mut bottom = h - metrics.paddings.y;

    if settings.shows_header() {
        top += layout_header(&mut nodes, settings, metrics, left, top, content_w, text_color, measure) + gaps.header;
    }

    if settings.show_cta_button {
        let c = metrics.element_sizes.cta;
        nodes.push(LayoutNode {
            rect: Rect::new((w - c) / 2.0, bottom - c, c, c),
            elem_type: ElementType::CtaButton,
            content: NodeContent::CtaButton {
                fill: highlight_color,
                arrow: Color::BLACK,
                arrow_size: c * 0.5,
            },
            opacity: 1.0,
        });
        bottom -= c + gaps.footer;
    }

    if settings.show_comment_pointer && !settings.comment_pointer_text.is_empty() {
        let style = TextStyle {
            size: fonts.pointer,
            family,
            weight: FontWeight::Medium,
        };
        let lines = wrap_runs(&[TextRun::plain(settings.comment_pointer_text.as_str())], content_w, style, measure);
        let line_h = fonts.pointer * POINTER_LINE_HEIGHT;
        let block_h = lines.len() as f32 * line_h;
        push_lines(
            &mut nodes,
            &lines,
            left,
            bottom - block_h,
            line_h,
            style,
            false,
            text_color,
            opacity::POINTER,
            ElementType::Pointer,
        );
        bottom -= block_h + gaps.footer;
    }

    if !settings.subtitle.is_empty() {
        let style = TextStyle {
            size: fonts.subtitle,
            family,
            weight: FontWeight::Regular,
        };
        let lines = wrap_runs(&apply_highlight(&settings.subtitle, highlight), content_w, style, measure);
        let line_h = fonts.subtitle * SUBTITLE_LINE_HEIGHT;
        let block_h = lines.len() as f32 * line_h;
        push_lines(
            &mut nodes,
            &lines,
            left,
            bottom - block_h,
            line_h,
            style,
            false,
            text_color,
            opacity::SUBTITLE,
            ElementType::Subtitle,
        );
        bottom -= block_h + gaps.subtitle;
    }

    // Body: centered in what is left, shrunk in 8% steps if it would overflow.
    let region_h = (bottom - top).max(0.0);
    let (min_main, _) = main_font_bounds(metrics.canvas_width, metrics.canvas_height);
    let mut size = fonts.main;
    let (mut body, mut body_h) = layout_body(segments, metrics, family, size, left, content_w, text_color, measure);
    while body_h > region_h && size > min_main {
        size = (size * 0.92).max(min_main);
        (body, body_h) = layout_body(segments, metrics, family, size, left, content_w, text_color, measure);
    }
    let body_top = top + ((region_h - body_h) / 2.0).max(0.0);
    nodes.extend(body.into_iter().map(|mut n| {
        n.rect = n.rect.translated(0.0, body_top);
        n
    }));

    (
        LayoutTree {
            width: w,
            height: h,
            scale: 1.0,
            family,
            nodes,
        },
        size,
    )
}

/// Avatar, name, badge and handle. Returns the header height.
#[allow(clippy::too_many_arguments)]
fn layout_header(
    nodes: &mut Vec<LayoutNode>,
    settings: &PostSettings,
    metrics: &LayoutMetrics,
    left: f32,
    top: f32,
    width: f32,
    color: Color,
    measure: &dyn TextMeasure,
) -> f32 {
    let fonts = metrics.font_sizes;
    let gaps = metrics.gaps;
    let avatar = metrics.element_sizes.avatar;
    let badge = metrics.element_sizes.badge;
    let family = settings.font_family;

    let name_style = TextStyle {
        size: fonts.name,
        family,
        weight: FontWeight::Semibold,
    };
    let handle_style = TextStyle {
        size: fonts.handle,
        family,
        weight: FontWeight::Regular,
    };
    let name_h = fonts.name * NAME_LINE_HEIGHT;
    let handle_h = fonts.handle * HANDLE_LINE_HEIGHT;
    // Name above the avatar midline, handle below it. The name's position
    // does not depend on the handle size.
    let header_h = avatar.max(2.0 * name_h.max(handle_h));
    let mid = top + header_h / 2.0;

    nodes.push(LayoutNode {
        rect: Rect::new(left, top + (header_h - avatar) / 2.0, avatar, avatar),
        elem_type: ElementType::Avatar,
        content: NodeContent::Avatar {
            source: settings.creator_avatar.clone(),
            initial: settings.avatar_initial(),
            initial_size: fonts.avatar_initial,
        },
        opacity: 1.0,
    });

    let col_x = left + avatar + gaps.header_inner;
    let col_w = (width - avatar - gaps.header_inner).max(1.0);
    let reserve = if settings.show_verified_badge { badge + gaps.badge } else { 0.0 };

    let name = truncate_to_width(settings.display_name(), (col_w - reserve).max(1.0), name_style, measure);
    let name_w = measure.width(&name, name_style);
    nodes.push(LayoutNode {
        rect: Rect::new(col_x, mid - name_h, name_w, name_h),
        elem_type: ElementType::Name,
        content: NodeContent::Text {
            text: name,
            size: fonts.name,
            weight: FontWeight::Semibold,
            italic: false,
            color,
        },
        opacity: 1.0,
    });

    if settings.show_verified_badge {
        nodes.push(LayoutNode {
            rect: Rect::new(col_x + name_w + gaps.badge, mid - (name_h + badge) / 2.0, badge, badge),
            elem_type: ElementType::VerifiedBadge,
            content: NodeContent::VerifiedBadge,
            opacity: 1.0,
        });
    }

    let handle = truncate_to_width(&settings.display_handle(), col_w, handle_style, measure);
    nodes.push(LayoutNode {
        rect: Rect::new(col_x, mid, measure.width(&handle, handle_style), handle_h),
        elem_type: ElementType::Handle,
        content: NodeContent::Text {
            text: handle,
            size: fonts.handle,
            weight: FontWeight::Regular,
            italic: false,
            color,
        },
        opacity: opacity::HANDLE,
    });

    header_h
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::SettingsPatch;

    fn settings(content: &str, format: PostFormat, platform: Platform) -> PostSettings {
        let mut s = PostSettings::default();
        s.merge(SettingsPatch {
            content: Some(content.into()),
            format: Some(format),
            platform: Some(platform),
            ..Default::default()
        });
        s
    }

    #[test]
    fn tree_is_built_at_export_pixels() {
        let plan = derive_layout(&settings("Hello", PostFormat::HookOnly, Platform::Instagram), &LayoutOptions::default());
        assert_eq!(plan.tree.width, 1080.0);
        assert_eq!(plan.tree.height, 1080.0);
        assert_eq!(plan.tree.scale, 1.0);
        assert_eq!(plan.tree.nodes[0].elem_type, ElementType::Background);
    }

    #[test]
    fn empty_content_renders_placeholder() {
        let plan = derive_layout(&settings("", PostFormat::HookOnly, Platform::Facebook), &LayoutOptions::default());
        let p = plan.tree.first(ElementType::Placeholder).expect("placeholder");
        assert_eq!(p.opacity, opacity::PLACEHOLDER);
        assert!(matches!(p.content, NodeContent::Text { italic: true, .. }));
        assert!(plan.tree.first(ElementType::Body).is_none());
    }

    #[test]
    fn header_only_for_creator_card_with_identity() {
        let mut s = settings("Hook", PostFormat::CreatorCard, Platform::Facebook);
        let plan = derive_layout(&s, &LayoutOptions::default());
        assert!(plan.tree.first(ElementType::Avatar).is_none());

        s.creator_name = "ada".into();
        let plan = derive_layout(&s, &LayoutOptions::default());
        let avatar = plan.tree.first(ElementType::Avatar).unwrap();
        match &avatar.content {
            NodeContent::Avatar { initial, .. } => assert_eq!(initial, "A"),
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(plan.tree.text_of(ElementType::Handle), "@handle");
        assert!(plan.tree.first(ElementType::VerifiedBadge).is_some());
    }

    #[test]
    fn footer_stacks_pointer_above_cta() {
        let mut s = settings("Hook", PostFormat::HookComments, Platform::InstagramStory);
        s.show_comment_pointer = true;
        s.show_cta_button = true;
        let plan = derive_layout(&s, &LayoutOptions::default());
        let cta = plan.tree.first(ElementType::CtaButton).unwrap();
        let pointer = plan.tree.first(ElementType::Pointer).unwrap();
        assert!(pointer.rect.bottom() <= cta.rect.y);
        assert!((cta.rect.x + cta.rect.width / 2.0 - plan.tree.width / 2.0).abs() < 1e-3);
        assert!(cta.rect.bottom() <= plan.tree.height);
    }

    #[test]
    fn subtitle_sits_below_body() {
        let mut s = settings("Big hook", PostFormat::HookOnly, Platform::Instagram);
        s.subtitle = "small print".into();
        let plan = derive_layout(&s, &LayoutOptions::default());
        let body = plan.tree.first(ElementType::Body).unwrap();
        let sub = plan.tree.first(ElementType::Subtitle).unwrap();
        assert!(sub.rect.y >= body.rect.bottom());
        assert_eq!(sub.opacity, opacity::SUBTITLE);
    }

    #[test]
    fn list_items_get_markers() {
        let plan = derive_layout(&settings("1) First\n2) Second", PostFormat::ListDrop, Platform::Instagram), &LayoutOptions::default());
        let markers: Vec<&str> = plan.tree.nodes_of(ElementType::ListMarker).filter_map(LayoutNode::text).collect();
        assert_eq!(markers, vec!["1.", "2."]);
        let body: Vec<&str> = plan.tree.nodes_of(ElementType::Body).filter_map(LayoutNode::text).collect();
        assert_eq!(body, vec!["First", "Second"]);
        let m = plan.tree.first(ElementType::ListMarker).unwrap();
        let t = plan.tree.first(ElementType::Body).unwrap();
        assert!(t.rect.x > m.rect.right());
    }

    #[test]
    fn thread_glyph_sits_left_of_text() {
        let plan = derive_layout(&settings("A story", PostFormat::ThreadStarter, Platform::Twitter), &LayoutOptions::default());
        let glyph = plan.tree.first(ElementType::ThreadGlyph).unwrap();
        let body = plan.tree.first(ElementType::Body).unwrap();
        assert!(glyph.rect.right() <= body.rect.x);
        assert!((glyph.rect.width - plan.body_font_size * 0.8).abs() < 1e-3);
        assert_eq!(plan.tree.text_of(ElementType::Body), "A story");
    }

    #[test]
    fn highlight_colors_body_and_subtitle() {
        let mut s = settings("Stop waiting", PostFormat::HookOnly, Platform::Facebook);
        s.subtitle = "waiting costs".into();
        s.highlight_text = "WAITING".into();
        s.highlight_color = "#22D3EE".into();
        let plan = derive_layout(&s, &LayoutOptions::default());
        let cyan = Color::rgb(0x22, 0xd3, 0xee);
        let colored: Vec<&str> = plan
            .tree
            .nodes
            .iter()
            .filter(|n| matches!(n.content, NodeContent::Text { color, .. } if color == cyan))
            .filter_map(LayoutNode::text)
            .collect();
        assert_eq!(colored, vec!["waiting", "waiting"]);
    }

    #[test]
    fn overflowing_body_is_shrunk_to_fit() {
        let long = "Every sentence adds weight to the card. ".repeat(40);
        let plan = derive_layout(&settings(&long, PostFormat::LongThought, Platform::Facebook), &LayoutOptions::default());
        assert!(plan.body_font_size <= plan.metrics.font_sizes.main);
        let (min, _) = main_font_bounds(1200, 630);
        assert!(plan.body_font_size >= min);
    }

    #[test]
    fn preview_is_a_uniform_miniature() {
        let s = settings("Preview equals export", PostFormat::HookOnly, Platform::Facebook);
        let plan = derive_layout(&s, &LayoutOptions::default());
        let frame = plan.preview(DisplayMetrics::default());
        assert!(frame.display_scale < 1.0);
        assert!(frame.tree.same_geometry(&plan.tree, 1e-4));
        let back = frame.tree.scaled(1.0 / frame.display_scale);
        for (a, b) in back.nodes.iter().zip(&plan.tree.nodes) {
            assert!(a.rect.approx_eq(&b.rect, 1e-2));
        }
    }

    #[test]
    fn capture_handle_reads_unscaled_tree() {
        let plan = derive_layout(&settings("Hi", PostFormat::HookOnly, Platform::Instagram), &LayoutOptions::default());
        let handle = plan.capture_handle();
        assert_eq!(handle.tree().scale, 1.0);
        assert_eq!(handle.tree(), &plan.tree);
    }
}
