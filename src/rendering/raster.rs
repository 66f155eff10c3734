/// Software rasterizer: paint commands to PNG bytes
///
/// All geometry is anti-aliased by analytic coverage. Text is drawn with
/// rusttype at the fragment positions computed by the layout. A layout
/// measured with the same `FontBook` fits exactly; one measured with the
/// advance table is condensed to its box where the real face runs wider.
use std::io::Cursor;

use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
use log::{debug, trace};
use rusttype::{point, Font, Scale};

use crate::rendering::avatar::{load_square, AvatarSource};
use crate::rendering::fonts::{run_width, FontBook};
use crate::rendering::layout::{LayoutTree, PreviewFrame, Rect};
use crate::rendering::paint::{paint_tree, PaintCommand};
use crate::rendering::Screenshot;
use crate::style::Color;
use crate::{Error, Result};

/// Horizontal shear applied to italic glyphs
const ITALIC_SHEAR: f32 = 0.2;

/// Blend `color` over the pixel at (x, y) with partial `coverage`.
fn blend(img: &mut RgbaImage, x: i64, y: i64, color: Color, coverage: f32) {
    if x < 0 || y < 0 || x >= img.width() as i64 || y >= img.height() as i64 {
        return;
    }
    let a = (color.a as f32 / 255.0) * coverage.clamp(0.0, 1.0);
    if a <= 0.0 {
        return;
    }
    let dst = img.get_pixel_mut(x as u32, y as u32);
    let da = dst.0[3] as f32 / 255.0;
    let out_a = a + da * (1.0 - a);
    if out_a <= 0.0 {
        return;
    }
    let mix = |s: u8, d: u8| ((s as f32 * a + d as f32 * da * (1.0 - a)) / out_a).round() as u8;
    dst.0 = [
        mix(color.r, dst.0[0]),
        mix(color.g, dst.0[1]),
        mix(color.b, dst.0[2]),
        (out_a * 255.0).round() as u8,
    ];
}

fn overlap(a0: f32, a1: f32, b0: f32, b1: f32) -> f32 {
    (a1.min(b1) - a0.max(b0)).max(0.0)
}

fn pixel_span(from: f32, to: f32, limit: u32) -> std::ops::Range<i64> {
    let lo = from.floor().max(0.0) as i64;
    let hi = (to.ceil() as i64).min(limit as i64);
    lo..hi.max(lo)
}

fn fill_rect(img: &mut RgbaImage, r: Rect, color: Color) {
    for y in pixel_span(r.y, r.bottom(), img.height()) {
        let cy = overlap(y as f32, y as f32 + 1.0, r.y, r.bottom());
        for x in pixel_span(r.x, r.right(), img.width()) {
            let cx = overlap(x as f32, x as f32 + 1.0, r.x, r.right());
            blend(img, x, y, color, cx * cy);
        }
    }
}

fn lerp_color(from: Color, to: Color, t: f32) -> Color {
    let t = t.clamp(0.0, 1.0);
    let l = |a: u8, b: u8| (a as f32 + (b as f32 - a as f32) * t).round() as u8;
    Color {
        r: l(from.r, to.r),
        g: l(from.g, to.g),
        b: l(from.b, to.b),
        a: l(from.a, to.a),
    }
}

/// CSS `linear-gradient(<angle>deg, from, to)` over `r`
fn fill_linear_gradient(img: &mut RgbaImage, r: Rect, from: Color, to: Color, angle: f32) {
    let rad = angle.to_radians();
    let (dx, dy) = (rad.sin(), -rad.cos());
    let length = (r.width * dx).abs() + (r.height * dy).abs();
    let (cx, cy) = (r.x + r.width / 2.0, r.y + r.height / 2.0);
    for y in pixel_span(r.y, r.bottom(), img.height()) {
        for x in pixel_span(r.x, r.right(), img.width()) {
            let px = x as f32 + 0.5 - cx;
            let py = y as f32 + 0.5 - cy;
            let t = (px * dx + py * dy) / length.max(f32::EPSILON) + 0.5;
            blend(img, x, y, lerp_color(from, to, t), 1.0);
        }
    }
}

fn fill_circle(img: &mut RgbaImage, cx: f32, cy: f32, radius: f32, color: Color) {
    for y in pixel_span(cy - radius - 1.0, cy + radius + 1.0, img.height()) {
        for x in pixel_span(cx - radius - 1.0, cx + radius + 1.0, img.width()) {
            let d = ((x as f32 + 0.5 - cx).powi(2) + (y as f32 + 0.5 - cy).powi(2)).sqrt();
            blend(img, x, y, color, radius - d + 0.5);
        }
    }
}

fn segment_distance(p: (f32, f32), a: (f32, f32), b: (f32, f32)) -> f32 {
    let (vx, vy) = (b.0 - a.0, b.1 - a.1);
    let len2 = vx * vx + vy * vy;
    let t = if len2 > 0.0 {
        (((p.0 - a.0) * vx + (p.1 - a.1) * vy) / len2).clamp(0.0, 1.0)
    } else {
        0.0
    };
    let (qx, qy) = (a.0 + vx * t, a.1 + vy * t);
    ((p.0 - qx).powi(2) + (p.1 - qy).powi(2)).sqrt()
}

/// Round-capped stroke through `points`
fn stroke_polyline(img: &mut RgbaImage, points: &[(f32, f32)], width: f32, color: Color) {
    if points.len() < 2 {
        return;
    }
    let half = width / 2.0;
    let min_x = points.iter().map(|p| p.0).fold(f32::INFINITY, f32::min) - half - 1.0;
    let max_x = points.iter().map(|p| p.0).fold(f32::NEG_INFINITY, f32::max) + half + 1.0;
    let min_y = points.iter().map(|p| p.1).fold(f32::INFINITY, f32::min) - half - 1.0;
    let max_y = points.iter().map(|p| p.1).fold(f32::NEG_INFINITY, f32::max) + half + 1.0;
    for y in pixel_span(min_y, max_y, img.height()) {
        for x in pixel_span(min_x, max_x, img.width()) {
            let p = (x as f32 + 0.5, y as f32 + 0.5);
            let d = points
                .windows(2)
                .map(|w| segment_distance(p, w[0], w[1]))
                .fold(f32::INFINITY, f32::min);
            blend(img, x, y, color, half - d + 0.5);
        }
    }
}

fn stroke_ring(img: &mut RgbaImage, cx: f32, cy: f32, radius: f32, width: f32, color: Color) {
    let half = width / 2.0;
    let outer = radius + half + 1.0;
    for y in pixel_span(cy - outer, cy + outer, img.height()) {
        for x in pixel_span(cx - outer, cx + outer, img.width()) {
            let d = ((x as f32 + 0.5 - cx).powi(2) + (y as f32 + 0.5 - cy).powi(2)).sqrt();
            blend(img, x, y, color, half - (d - radius).abs() + 0.5);
        }
    }
}

/// Scalloped blue disc with a white check
fn draw_verified_badge(img: &mut RgbaImage, r: Rect, opacity: f32) {
    let blue = Color::VERIFIED_BLUE.with_opacity(opacity);
    let (cx, cy) = (r.x + r.width / 2.0, r.y + r.height / 2.0);
    let size = r.width.min(r.height);
    let core = size * 0.40;
    let bump = size * 0.12;
    fill_circle(img, cx, cy, core, blue);
    for i in 0..8 {
        let a = i as f32 * std::f32::consts::FRAC_PI_4;
        fill_circle(img, cx + a.cos() * (core - bump * 0.4), cy + a.sin() * (core - bump * 0.4), bump, blue);
    }
    let check = [
        (cx - size * 0.18, cy + size * 0.01),
        (cx - size * 0.05, cy + size * 0.14),
        (cx + size * 0.19, cy - size * 0.12),
    ];
    stroke_polyline(img, &check, (size * 0.08).max(1.0), Color::WHITE.with_opacity(opacity));
}

/// Thread connector: a ring with a short tail below it
fn draw_thread_glyph(img: &mut RgbaImage, r: Rect, color: Color) {
    let size = r.width.min(r.height);
    let stroke = (size * 0.1).max(1.0);
    let cx = r.x + r.width / 2.0;
    let ring_r = size * 0.22;
    let ring_cy = r.y + ring_r + stroke;
    stroke_ring(img, cx, ring_cy, ring_r, stroke, color);
    stroke_polyline(img, &[(cx, ring_cy + ring_r + stroke), (cx, r.bottom() - stroke)], stroke, color);
}

fn draw_arrow_down(img: &mut RgbaImage, cx: f32, cy: f32, size: f32, color: Color) {
    let stroke = (size * 0.14).max(1.0);
    let top = cy - size * 0.4;
    let tip = cy + size * 0.4;
    stroke_polyline(img, &[(cx, top), (cx, tip)], stroke, color);
    stroke_polyline(
        img,
        &[(cx - size * 0.32, tip - size * 0.32), (cx, tip), (cx + size * 0.32, tip - size * 0.32)],
        stroke,
        color,
    );
}

/// Draw `text` starting at `r.x`, vertically centered in `r`.
fn draw_text(img: &mut RgbaImage, font: &Font<'static>, r: Rect, text: &str, size: f32, italic: bool, color: Color) {
    let mut scale = Scale::uniform(size);
    let natural = run_width(font, scale, text);
    // Summed word advances can differ from one kerned run by rounding.
    if natural > r.width + 0.5 && natural > 0.0 {
        scale.x = size * (r.width / natural);
    }
    let v = font.v_metrics(scale);
    let baseline = r.y + (r.height - (v.ascent - v.descent)) / 2.0 + v.ascent;

    for glyph in font.layout(text, scale, point(r.x, baseline)) {
        let Some(bb) = glyph.pixel_bounding_box() else {
            continue;
        };
        glyph.draw(|gx, gy, coverage| {
            let py = gy as i32 + bb.min.y;
            let shear = if italic { (baseline - py as f32) * ITALIC_SHEAR } else { 0.0 };
            let px = gx as f32 + bb.min.x as f32 + shear;
            let x0 = px.floor();
            let frac = px - x0;
            blend(img, x0 as i64, py as i64, color, coverage * (1.0 - frac));
            if frac > 0.0 {
                blend(img, x0 as i64 + 1, py as i64, color, coverage * frac);
            }
        });
    }
}

/// Composite a circular avatar into `r`.
fn draw_avatar(img: &mut RgbaImage, r: Rect, source: &str, opacity: f32) -> Result<()> {
    let side = r.width.min(r.height).round().max(1.0) as u32;
    let Some(photo) = load_square(&AvatarSource::parse(source)?, side)? else {
        return Ok(());
    };
    let radius = side as f32 / 2.0;
    for (ox, oy, p) in photo.enumerate_pixels() {
        let d = ((ox as f32 + 0.5 - radius).powi(2) + (oy as f32 + 0.5 - radius).powi(2)).sqrt();
        let coverage = (radius - d + 0.5).clamp(0.0, 1.0);
        let color = Color {
            r: p.0[0],
            g: p.0[1],
            b: p.0[2],
            a: p.0[3],
        }
        .with_opacity(opacity);
        blend(img, r.x.round() as i64 + ox as i64, r.y.round() as i64 + oy as i64, color, coverage);
    }
    Ok(())
}

/// Execute paint commands against a fresh transparent canvas.
pub fn rasterize(commands: &[PaintCommand], width: u32, height: u32, fonts: &FontBook) -> Result<RgbaImage> {
    if width == 0 || height == 0 {
        return Err(Error::RasterizationError(format!("empty canvas {}x{}", width, height)));
    }
    let mut img = RgbaImage::from_pixel(width, height, Rgba([0, 0, 0, 0]));
    for cmd in commands {
        trace!("paint {:?}", cmd);
        match cmd {
            PaintCommand::FillRect { rect, color } => fill_rect(&mut img, *rect, *color),
            PaintCommand::LinearGradient { rect, from, to, angle } => {
                fill_linear_gradient(&mut img, *rect, *from, *to, *angle)
            }
            PaintCommand::FillCircle { cx, cy, radius, color } => fill_circle(&mut img, *cx, *cy, *radius, *color),
            PaintCommand::Text {
                rect,
                text,
                size,
                family,
                weight,
                italic,
                color,
            } => {
                let font = fonts.face(*family, *weight).map_or_else(|| fonts.resolve(*family, *weight), Ok)?;
                draw_text(&mut img, &font, *rect, text, *size, *italic, *color);
            }
            PaintCommand::Image { rect, source, opacity } => draw_avatar(&mut img, *rect, source, *opacity)?,
            PaintCommand::VerifiedBadge { rect, opacity } => draw_verified_badge(&mut img, *rect, *opacity),
            PaintCommand::ThreadGlyph { rect, color } => draw_thread_glyph(&mut img, *rect, *color),
            PaintCommand::ArrowDown { cx, cy, size, color } => draw_arrow_down(&mut img, *cx, *cy, *size, *color),
        }
    }
    Ok(img)
}

fn encode_png(img: RgbaImage) -> Result<Screenshot> {
    let (width, height) = img.dimensions();
    let mut out = Cursor::new(Vec::new());
    DynamicImage::ImageRgba8(img).write_to(&mut out, ImageFormat::Png)?;
    Ok(Screenshot {
        width,
        height,
        png_data: out.into_inner(),
    })
}

/// Render an unscaled layout tree at `pixel_ratio` device pixels per unit.
pub fn render_png(tree: &LayoutTree, pixel_ratio: f32, fonts: &FontBook) -> Result<Screenshot> {
    if !pixel_ratio.is_finite() || pixel_ratio <= 0.0 {
        return Err(Error::RasterizationError(format!("invalid pixel ratio {}", pixel_ratio)));
    }
    let scaled = tree.scaled(pixel_ratio);
    let width = scaled.width.round() as u32;
    let height = scaled.height.round() as u32;
    debug!("rasterizing {}x{} ({} nodes)", width, height, scaled.nodes.len());
    let img = rasterize(&paint_tree(&scaled), width, height, fonts)?;
    encode_png(img)
}

/// Render a preview frame at its screen's pixel ratio with rounded corners.
pub fn render_preview_png(frame: &PreviewFrame, fonts: &FontBook) -> Result<Screenshot> {
    let dpr = if frame.dpr.is_finite() && frame.dpr > 0.0 { frame.dpr } else { 1.0 };
    let scaled = frame.tree.scaled(dpr);
    let width = scaled.width.round().max(1.0) as u32;
    let height = scaled.height.round().max(1.0) as u32;
    let mut img = rasterize(&paint_tree(&scaled), width, height, fonts)?;

    let r = frame.corner_radius * dpr;
    let corners = [(r, r), (width as f32 - r, r), (r, height as f32 - r), (width as f32 - r, height as f32 - r)];
    for (x, y, p) in img.enumerate_pixels_mut() {
        let (fx, fy) = (x as f32 + 0.5, y as f32 + 0.5);
        let in_corner_x = fx < r || fx > width as f32 - r;
        let in_corner_y = fy < r || fy > height as f32 - r;
        if !(in_corner_x && in_corner_y) {
            continue;
        }
        let d = corners
            .iter()
            .map(|(cx, cy)| ((fx - cx).powi(2) + (fy - cy).powi(2)).sqrt())
            .fold(f32::INFINITY, f32::min);
        let keep = (r - d + 0.5).clamp(0.0, 1.0);
        p.0[3] = (p.0[3] as f32 * keep).round() as u8;
    }
    encode_png(img)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::{FontFamily, FontWeight};

    fn canvas(w: u32, h: u32) -> RgbaImage {
        RgbaImage::from_pixel(w, h, Rgba([0, 0, 0, 0]))
    }

    #[test]
    fn solid_rect_fills_exact_pixels() {
        let mut img = canvas(10, 10);
        fill_rect(&mut img, Rect::new(2.0, 2.0, 4.0, 4.0), Color::rgb(255, 0, 0));
        assert_eq!(img.get_pixel(3, 3).0, [255, 0, 0, 255]);
        assert_eq!(img.get_pixel(7, 7).0[3], 0);
    }

    #[test]
    fn half_covered_pixel_is_half_transparent() {
        let mut img = canvas(4, 4);
        fill_rect(&mut img, Rect::new(0.5, 0.0, 1.0, 1.0), Color::WHITE);
        let a = img.get_pixel(0, 0).0[3];
        assert!((120..=135).contains(&a), "alpha {}", a);
    }

    #[test]
    fn gradient_runs_from_top_left_to_bottom_right() {
        let mut img = canvas(20, 20);
        let from = Color::rgb(0, 0, 0);
        let to = Color::rgb(255, 255, 255);
        fill_linear_gradient(&mut img, Rect::new(0.0, 0.0, 20.0, 20.0), from, to, 135.0);
        let tl = img.get_pixel(0, 0).0[0];
        let br = img.get_pixel(19, 19).0[0];
        let tr = img.get_pixel(19, 0).0[0];
        assert!(tl < 20 && br > 235, "tl {} br {}", tl, br);
        assert!((100..=155).contains(&tr));
    }

    #[test]
    fn circle_is_round() {
        let mut img = canvas(21, 21);
        fill_circle(&mut img, 10.5, 10.5, 8.0, Color::WHITE);
        assert_eq!(img.get_pixel(10, 10).0[3], 255);
        assert_eq!(img.get_pixel(0, 0).0[3], 0);
        assert_eq!(img.get_pixel(10, 3).0[3], 255);
    }

    #[test]
    fn opacity_blends_with_background() {
        let mut img = canvas(2, 2);
        fill_rect(&mut img, Rect::new(0.0, 0.0, 2.0, 2.0), Color::BLACK);
        fill_rect(&mut img, Rect::new(0.0, 0.0, 2.0, 2.0), Color::WHITE.with_opacity(0.5));
        let p = img.get_pixel(0, 0).0;
        assert_eq!(p[3], 255);
        assert!((126..=129).contains(&p[0]));
    }

    #[test]
    fn shapes_without_text_need_no_fonts() {
        let fonts = FontBook::new(Vec::new());
        let cmds = vec![
            PaintCommand::FillRect {
                rect: Rect::new(0.0, 0.0, 40.0, 40.0),
                color: Color::BLACK,
            },
            PaintCommand::VerifiedBadge {
                rect: Rect::new(5.0, 5.0, 20.0, 20.0),
                opacity: 1.0,
            },
            PaintCommand::ArrowDown {
                cx: 20.0,
                cy: 20.0,
                size: 10.0,
                color: Color::WHITE,
            },
        ];
        let img = rasterize(&cmds, 40, 40, &fonts).unwrap();
        assert_eq!(img.get_pixel(15, 10).0[2], Color::VERIFIED_BLUE.b);
    }

    #[test]
    fn text_without_fonts_is_font_unavailable() {
        let fonts = FontBook::new(Vec::new());
        let cmds = vec![PaintCommand::Text {
            rect: Rect::new(0.0, 0.0, 40.0, 20.0),
            text: "hi".into(),
            size: 16.0,
            family: FontFamily::DmSans,
            weight: FontWeight::Bold,
            italic: false,
            color: Color::WHITE,
        }];
        assert!(matches!(rasterize(&cmds, 40, 20, &fonts), Err(Error::FontUnavailable(_))));
    }

    #[test]
    fn zero_sized_canvas_is_rejected() {
        let fonts = FontBook::new(Vec::new());
        assert!(matches!(rasterize(&[], 0, 10, &fonts), Err(Error::RasterizationError(_))));
    }
}
