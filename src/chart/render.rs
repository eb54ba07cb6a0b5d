//! Rasterises a [`ChartLayout`] into an `RgbImage`.

use ab_glyph::FontVec;
use image::{GrayImage, Luma, Rgb, RgbImage};
use imageproc::drawing::{
    draw_filled_rect_mut, draw_hollow_rect_mut, draw_line_segment_mut, draw_text_mut, text_size,
};
use imageproc::geometric_transformations::{rotate_about_center, Interpolation};
use imageproc::rect::Rect;

use super::ChartLayout;

const BACKGROUND_COLOR: Rgb<u8> = Rgb([255, 255, 255]);
const AXIS_COLOR: Rgb<u8> = Rgb([0, 0, 0]);
const GRID_COLOR: Rgb<u8> = Rgb([176, 176, 176]);
const VALUE_LABEL_COLOR: Rgb<u8> = Rgb([34, 34, 34]);
const TICK_LENGTH: f32 = 5.0;
const DASH_ON: u32 = 6;
const DASH_OFF: u32 = 4;

#[derive(Clone, Copy)]
enum HAlign {
    Center,
    Right,
}

#[derive(Clone, Copy)]
enum VAlign {
    Top,
    Middle,
    Bottom,
}

struct TextSpec<'a> {
    text: &'a str,
    size: f32,
    color: Rgb<u8>,
    anchor: (f32, f32),
    h_align: HAlign,
    v_align: VAlign,
    /// Counter-clockwise, degrees.
    rotation_deg: f32,
    bold: bool,
}

/// Draws `layout`. Text is only drawn when a `font` is supplied.
pub fn render(layout: &ChartLayout, font: Option<&FontVec>) -> RgbImage {
    let mut img = RgbImage::from_pixel(layout.width, layout.height, BACKGROUND_COLOR);
    let plot = layout.plot;

    for line in &layout.gridlines {
        draw_dashed_hline(
            &mut img,
            plot.left,
            plot.right,
            line.y,
            GRID_COLOR,
            layout.style.grid_alpha,
        );
    }

    for bar in &layout.bars {
        let width = (bar.right - bar.left).round().max(1.0) as u32;
        let height = (bar.bottom - bar.top).round();
        if height < 1.0 {
            continue;
        }
        let rect = Rect::at(bar.left.round() as i32, bar.top.round() as i32)
            .of_size(width, height as u32);
        draw_filled_rect_mut(&mut img, rect, bar.color);
    }

    let frame = Rect::at(plot.left as i32, plot.top as i32).of_size(
        plot.width().max(1.0) as u32 + 1,
        plot.height().max(1.0) as u32 + 1,
    );
    draw_hollow_rect_mut(&mut img, frame, AXIS_COLOR);
    for line in &layout.gridlines {
        draw_line_segment_mut(
            &mut img,
            (plot.left - TICK_LENGTH, line.y),
            (plot.left, line.y),
            AXIS_COLOR,
        );
    }
    for bar in &layout.bars {
        let x = bar.center_x();
        draw_line_segment_mut(
            &mut img,
            (x, plot.bottom),
            (x, plot.bottom + TICK_LENGTH),
            AXIS_COLOR,
        );
    }

    if let Some(font) = font {
        draw_text(&mut img, font, layout);
    }
    img
}

fn draw_text(img: &mut RgbImage, font: &FontVec, layout: &ChartLayout) {
    let style = &layout.style;
    let plot = layout.plot;
    let unit = layout.height as f32 / 600.0;

    draw_label(
        img,
        font,
        &TextSpec {
            text: &style.title,
            size: 22.0 * unit,
            color: AXIS_COLOR,
            anchor: (layout.width as f32 / 2.0, plot.top / 2.0),
            h_align: HAlign::Center,
            v_align: VAlign::Middle,
            rotation_deg: 0.0,
            bold: false,
        },
    );
    draw_label(
        img,
        font,
        &TextSpec {
            text: &style.x_label,
            size: 17.0 * unit,
            color: AXIS_COLOR,
            anchor: ((plot.left + plot.right) / 2.0, layout.height as f32 * 0.96),
            h_align: HAlign::Center,
            v_align: VAlign::Bottom,
            rotation_deg: 0.0,
            bold: false,
        },
    );
    draw_label(
        img,
        font,
        &TextSpec {
            text: &style.y_label,
            size: 17.0 * unit,
            color: AXIS_COLOR,
            anchor: (layout.width as f32 * 0.025, (plot.top + plot.bottom) / 2.0),
            h_align: HAlign::Center,
            v_align: VAlign::Middle,
            rotation_deg: 90.0,
            bold: false,
        },
    );

    for line in &layout.gridlines {
        draw_label(
            img,
            font,
            &TextSpec {
                text: &line.label,
                size: 14.0 * unit,
                color: AXIS_COLOR,
                anchor: (plot.left - TICK_LENGTH - 3.0, line.y),
                h_align: HAlign::Right,
                v_align: VAlign::Middle,
                rotation_deg: 0.0,
                bold: false,
            },
        );
    }

    for bar in &layout.bars {
        draw_label(
            img,
            font,
            &TextSpec {
                text: &bar.label,
                size: 14.0 * unit,
                color: VALUE_LABEL_COLOR,
                anchor: bar.label_anchor,
                h_align: HAlign::Center,
                v_align: VAlign::Bottom,
                rotation_deg: 0.0,
                bold: true,
            },
        );
        draw_label(
            img,
            font,
            &TextSpec {
                text: &bar.class,
                size: 14.0 * unit,
                color: AXIS_COLOR,
                anchor: bar.tick_anchor,
                h_align: HAlign::Right,
                v_align: VAlign::Top,
                rotation_deg: style.tick_rotation_deg,
                bold: false,
            },
        );
    }
}

/// Draws text so that its aligned anchor point lands on `spec.anchor`,
/// rotating around that point.
fn draw_label(img: &mut RgbImage, font: &FontVec, spec: &TextSpec<'_>) {
    if spec.text.is_empty() || spec.size <= 0.0 {
        return;
    }
    let (w, h) = text_size(spec.size, font, spec.text);
    let w = w + u32::from(spec.bold);
    if w == 0 || h == 0 {
        return;
    }
    let (wf, hf) = (w as f32, h as f32);
    let side = wf.hypot(hf).ceil() as u32 + 4;

    let mut mask = GrayImage::new(side, side);
    let x0 = ((side - w) / 2) as i32;
    let y0 = ((side - h) / 2) as i32;
    draw_text_mut(&mut mask, Luma([255]), x0, y0, spec.size, font, spec.text);
    if spec.bold {
        draw_text_mut(&mut mask, Luma([255]), x0 + 1, y0, spec.size, font, spec.text);
    }

    let theta = spec.rotation_deg.to_radians();
    if theta != 0.0 {
        // rotate_about_center turns clockwise on screen
        mask = rotate_about_center(&mask, -theta, Interpolation::Bilinear, Luma([0]));
    }

    let dx = match spec.h_align {
        HAlign::Center => 0.0,
        HAlign::Right => wf / 2.0,
    };
    let dy = match spec.v_align {
        VAlign::Top => -hf / 2.0,
        VAlign::Middle => 0.0,
        VAlign::Bottom => hf / 2.0,
    };
    let (sin, cos) = theta.sin_cos();
    let rx = dx * cos + dy * sin;
    let ry = -dx * sin + dy * cos;
    let center = (spec.anchor.0 - rx, spec.anchor.1 - ry);
    let origin_x = (center.0 - side as f32 / 2.0).round() as i64;
    let origin_y = (center.1 - side as f32 / 2.0).round() as i64;

    for (mx, my, coverage) in mask.enumerate_pixels() {
        let alpha = coverage.0[0] as f32 / 255.0;
        if alpha <= 0.0 {
            continue;
        }
        blend(img, origin_x + mx as i64, origin_y + my as i64, spec.color, alpha);
    }
}

fn draw_dashed_hline(img: &mut RgbImage, x0: f32, x1: f32, y: f32, color: Rgb<u8>, alpha: f32) {
    let row = y.round() as i64;
    let start = x0.round() as i64;
    let end = x1.round() as i64;
    let period = (DASH_ON + DASH_OFF) as i64;
    for x in start..=end {
        if (x - start) % period < DASH_ON as i64 {
            blend(img, x, row, color, alpha);
        }
    }
}

fn blend(img: &mut RgbImage, x: i64, y: i64, color: Rgb<u8>, alpha: f32) {
    if x < 0 || y < 0 || x >= img.width() as i64 || y >= img.height() as i64 {
        return;
    }
    let alpha = alpha.clamp(0.0, 1.0);
    let px = img.get_pixel_mut(x as u32, y as u32);
    for (dst, src) in px.0.iter_mut().zip(color.0) {
        *dst = (*dst as f32 * (1.0 - alpha) + src as f32 * alpha).round() as u8;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::{ChartStyle, VIRIDIS_MAX};
    use crate::scores::ScoreTable;

    fn baseline_layout() -> ChartLayout {
        ChartLayout::compute(&ScoreTable::mission_baseline(), &ChartStyle::default())
            .expect("layout")
    }

    #[test]
    fn renders_requested_size() {
        let img = render(&baseline_layout(), None);
        assert_eq!(img.dimensions(), (1000, 600));
    }

    #[test]
    fn tallest_bar_is_filled_with_top_colour() {
        let layout = baseline_layout();
        let img = render(&layout, None);
        let best = layout
            .bars
            .iter()
            .max_by(|a, b| a.score.total_cmp(&b.score))
            .expect("bar");
        let x = best.center_x().round() as u32;
        let y = ((best.top + best.bottom) / 2.0).round() as u32;
        assert_eq!(*img.get_pixel(x, y), VIRIDIS_MAX);
    }

    #[test]
    fn gridlines_are_faint_and_dashed() {
        let layout = baseline_layout();
        let img = render(&layout, None);
        // sample left of the first bar
        let line = layout
            .gridlines
            .iter()
            .find(|g| (g.value - 0.8).abs() < 1e-6)
            .expect("0.8 gridline");
        let y = line.y.round() as u32;
        let start = layout.plot.left.round() as u32;
        let on = *img.get_pixel(start + 2, y);
        let off = *img.get_pixel(start + DASH_ON + 1, y);
        assert_eq!(on, Rgb([223, 223, 223]));
        assert_eq!(off, BACKGROUND_COLOR);
    }

    #[test]
    fn zero_score_draws_no_bar() {
        let table = ScoreTable::from_parallel(&["a", "b"], &[0.0, 0.4]).expect("table");
        let layout = ChartLayout::compute(&table, &ChartStyle::default()).expect("layout");
        let img = render(&layout, None);
        let bar = &layout.bars[0];
        let x = bar.center_x().round() as u32;
        let y = (layout.plot.bottom - 10.0).round() as u32;
        assert_eq!(*img.get_pixel(x, y), BACKGROUND_COLOR);
    }

    fn has_ink(img: &RgbImage, xs: (f32, f32), ys: (f32, f32)) -> bool {
        let x0 = xs.0.max(0.0).round() as u32;
        let x1 = (xs.1.round() as u32).min(img.width() - 1);
        let y0 = ys.0.max(0.0).round() as u32;
        let y1 = (ys.1.round() as u32).min(img.height() - 1);
        (y0..=y1).any(|y| (x0..=x1).any(|x| img.get_pixel(x, y).0.iter().all(|&c| c < 100)))
    }

    #[test]
    fn draws_labels_when_a_font_is_available() {
        let Some(font) = crate::chart::load_font(None).expect("font lookup") else {
            return;
        };
        let layout = baseline_layout();
        let img = render(&layout, Some(&font));

        let best = layout
            .bars
            .iter()
            .max_by(|a, b| a.score.total_cmp(&b.score))
            .expect("bar");
        let (ax, ay) = best.label_anchor;
        assert!(
            has_ink(&img, (ax - 12.0, ax + 12.0), (ay - 16.0, ay)),
            "no value label above {}",
            best.class
        );
        // the label stays above the bar top
        let top = best.top.ceil() + 1.0;
        for y in top as u32..(top + 8.0) as u32 {
            for x in (ax - 12.0) as u32..=(ax + 12.0) as u32 {
                assert_eq!(*img.get_pixel(x, y), VIRIDIS_MAX, "ink inside bar at ({x}, {y})");
            }
        }

        // class names hang below the axis, ending at the tick
        let (tx, ty) = layout.bars[0].tick_anchor;
        assert!(has_ink(&img, (tx - 60.0, tx + 2.0), (ty, ty + 40.0)));

        let title_y = layout.plot.top / 2.0;
        let mid = layout.width as f32 / 2.0;
        assert!(has_ink(&img, (mid - 100.0, mid + 100.0), (title_y - 12.0, title_y + 12.0)));
    }

    #[test]
    fn blend_ignores_out_of_bounds() {
        let mut img = RgbImage::from_pixel(4, 4, BACKGROUND_COLOR);
        blend(&mut img, -1, 2, AXIS_COLOR, 1.0);
        blend(&mut img, 4, 0, AXIS_COLOR, 1.0);
        blend(&mut img, 1, 1, AXIS_COLOR, 0.5);
        assert_eq!(*img.get_pixel(1, 1), Rgb([128, 128, 128]));
        assert_eq!(*img.get_pixel(0, 2), BACKGROUND_COLOR);
    }
}
