/// Flattening of a layout tree into an ordered list of draw operations
///
/// Node opacity is folded into each command's color here, so the
/// rasterizer only ever sees straight colors with alpha.
use serde::Serialize;

use crate::rendering::layout::{Fill, LayoutTree, NodeContent, Rect};
use crate::rendering::text::text_width;
use crate::style::{Color, FontFamily, FontWeight};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "kebab-case")]
pub enum PaintCommand {
    FillRect {
        rect: Rect,
        color: Color,
    },
    LinearGradient {
        rect: Rect,
        from: Color,
        to: Color,
        angle: f32,
    },
    FillCircle {
        cx: f32,
        cy: f32,
        radius: f32,
        color: Color,
    },
    Text {
        /// Line box; glyphs are vertically centered in it
        rect: Rect,
        text: String,
        size: f32,
        family: FontFamily,
        weight: FontWeight,
        italic: bool,
        color: Color,
    },
    /// Circular-cropped avatar image
    Image {
        rect: Rect,
        source: String,
        opacity: f32,
    },
    VerifiedBadge {
        rect: Rect,
        opacity: f32,
    },
    ThreadGlyph {
        rect: Rect,
        color: Color,
    },
    ArrowDown {
        cx: f32,
        cy: f32,
        size: f32,
        color: Color,
    },
}

/// Draw operations for `tree`, back to front.
pub fn paint_tree(tree: &LayoutTree) -> Vec<PaintCommand> {
    let mut cmds = Vec::with_capacity(tree.nodes.len() + 4);
    for node in &tree.nodes {
        let r = node.rect;
        let alpha = node.opacity;
        match &node.content {
            NodeContent::Background { fill } => match *fill {
                Fill::Solid { color } => cmds.push(PaintCommand::FillRect {
                    rect: r,
                    color: color.with_opacity(alpha),
                }),
                Fill::LinearGradient { from, to, angle } => cmds.push(PaintCommand::LinearGradient {
                    rect: r,
                    from: from.with_opacity(alpha),
                    to: to.with_opacity(alpha),
                    angle,
                }),
            },
            NodeContent::Text {
                text,
                size,
                weight,
                italic,
                color,
            } => cmds.push(PaintCommand::Text {
                rect: r,
                text: text.clone(),
                size: *size,
                family: tree.family,
                weight: *weight,
                italic: *italic,
                color: color.with_opacity(alpha),
            }),
            NodeContent::Avatar {
                source,
                initial,
                initial_size,
            } => {
                if source.trim().is_empty() {
                    cmds.push(PaintCommand::FillCircle {
                        cx: r.x + r.width / 2.0,
                        cy: r.y + r.height / 2.0,
                        radius: r.width.min(r.height) / 2.0,
                        color: Color::AVATAR_PLACEHOLDER.with_opacity(alpha),
                    });
                    let w = text_width(initial, *initial_size, tree.family, FontWeight::Semibold);
                    let line_h = initial_size * 1.2;
                    cmds.push(PaintCommand::Text {
                        rect: Rect::new(
                            r.x + (r.width - w) / 2.0,
                            r.y + (r.height - line_h) / 2.0,
                            w,
                            line_h,
                        ),
                        text: initial.clone(),
                        size: *initial_size,
                        family: tree.family,
                        weight: FontWeight::Semibold,
                        italic: false,
                        color: Color::WHITE.with_opacity(alpha),
                    });
                } else {
                    cmds.push(PaintCommand::Image {
                        rect: r,
                        source: source.clone(),
                        opacity: alpha,
                    });
                }
            }
            NodeContent::VerifiedBadge => cmds.push(PaintCommand::VerifiedBadge { rect: r, opacity: alpha }),
            NodeContent::ThreadGlyph { color } => cmds.push(PaintCommand::ThreadGlyph {
                rect: r,
                color: color.with_opacity(alpha),
            }),
            NodeContent::CtaButton { fill, arrow, arrow_size } => {
                let (cx, cy) = (r.x + r.width / 2.0, r.y + r.height / 2.0);
                cmds.push(PaintCommand::FillCircle {
                    cx,
                    cy,
                    radius: r.width.min(r.height) / 2.0,
                    color: fill.with_opacity(alpha),
                });
                cmds.push(PaintCommand::ArrowDown {
                    cx,
                    cy,
                    size: *arrow_size,
                    color: arrow.with_opacity(alpha),
                });
            }
        }
    }
    cmds
}
