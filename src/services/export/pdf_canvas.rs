//! Plotters backend that writes PDF content operators, so report cards are
//! drawn by the same chart code as the SVG endpoint.

use std::convert::Infallible;
use std::f64::consts::PI;

use lopdf::content::Operation;
use lopdf::Object;
use plotters_backend::text_anchor::{HPos, VPos};
use plotters_backend::{
    BackendColor, BackendCoord, BackendStyle, BackendTextStyle, DrawingBackend, DrawingErrorKind,
};

/// Resource name of the Helvetica font in every page's resources.
pub const FONT_RESOURCE: &[u8] = b"F1";

const CIRCLE_SEGMENTS: usize = 24;

type DrawResult = Result<(), DrawingErrorKind<Infallible>>;

/// Draws a `size` pixel canvas whose top-left corner sits at `origin` in page
/// space (y up). One pixel maps to `scale` points.
pub struct PdfCanvas<'a> {
    ops: &'a mut Vec<Operation>,
    size: (u32, u32),
    origin: (f64, f64),
    scale: f64,
}

impl<'a> PdfCanvas<'a> {
    pub fn new(ops: &'a mut Vec<Operation>, size: (u32, u32), origin: (f64, f64), scale: f64) -> Self {
        Self { ops, size, origin, scale }
    }

    fn at(&self, (x, y): BackendCoord) -> (f64, f64) {
        (
            self.origin.0 + x as f64 * self.scale,
            self.origin.1 - y as f64 * self.scale,
        )
    }

    fn set_stroke<S: BackendStyle>(&mut self, style: &S) {
        self.ops.push(color_op("RG", style.color()));
        let width = style.stroke_width().max(1) as f64 * self.scale;
        self.ops.push(Operation::new("w", vec![real(width)]));
    }

    /// Adds the subpath and returns how many vertices it has.
    fn trace(&mut self, points: impl IntoIterator<Item = BackendCoord>) -> usize {
        let mut count = 0;
        for point in points {
            let (x, y) = self.at(point);
            let operator = if count == 0 { "m" } else { "l" };
            self.ops.push(Operation::new(operator, vec![real(x), real(y)]));
            count += 1;
        }
        count
    }

    fn paint(&mut self, vertices: usize, min_vertices: usize, operator: &str) {
        let operator = if vertices < min_vertices { "n" } else { operator };
        self.ops.push(Operation::new(operator, vec![]));
    }
}

impl DrawingBackend for PdfCanvas<'_> {
    type ErrorType = Infallible;

    fn get_size(&self) -> (u32, u32) {
        self.size
    }

    fn ensure_prepared(&mut self) -> DrawResult {
        Ok(())
    }

    fn present(&mut self) -> DrawResult {
        Ok(())
    }

    fn draw_pixel(&mut self, point: BackendCoord, color: BackendColor) -> DrawResult {
        self.draw_rect(point, (point.0 + 1, point.1 + 1), &color, true)
    }

    fn draw_line<S: BackendStyle>(&mut self, from: BackendCoord, to: BackendCoord, style: &S) -> DrawResult {
        if is_invisible(style.color()) {
            return Ok(());
        }
        self.set_stroke(style);
        let vertices = self.trace([from, to]);
        self.paint(vertices, 2, "S");
        Ok(())
    }

    fn draw_rect<S: BackendStyle>(
        &mut self,
        upper_left: BackendCoord,
        bottom_right: BackendCoord,
        style: &S,
        fill: bool,
    ) -> DrawResult {
        if is_invisible(style.color()) {
            return Ok(());
        }
        let (x, y) = self.at((upper_left.0, bottom_right.1));
        let width = (bottom_right.0 - upper_left.0) as f64 * self.scale;
        let height = (bottom_right.1 - upper_left.1) as f64 * self.scale;
        if fill {
            self.ops.push(color_op("rg", style.color()));
        } else {
            self.set_stroke(style);
        }
        self.ops
            .push(Operation::new("re", vec![real(x), real(y), real(width), real(height)]));
        self.ops.push(Operation::new(if fill { "f" } else { "S" }, vec![]));
        Ok(())
    }

    fn draw_path<S: BackendStyle, I: IntoIterator<Item = BackendCoord>>(&mut self, path: I, style: &S) -> DrawResult {
        if is_invisible(style.color()) {
            return Ok(());
        }
        self.set_stroke(style);
        let vertices = self.trace(path);
        self.paint(vertices, 2, "S");
        Ok(())
    }

    fn fill_polygon<S: BackendStyle, I: IntoIterator<Item = BackendCoord>>(&mut self, vert: I, style: &S) -> DrawResult {
        if is_invisible(style.color()) {
            return Ok(());
        }
        self.ops.push(color_op("rg", style.color()));
        let vertices = self.trace(vert);
        self.paint(vertices, 3, "f");
        Ok(())
    }

    fn draw_circle<S: BackendStyle>(&mut self, center: BackendCoord, radius: u32, style: &S, fill: bool) -> DrawResult {
        if is_invisible(style.color()) {
            return Ok(());
        }
        let ring = (0..CIRCLE_SEGMENTS).map(|i| {
            let angle = 2.0 * PI * i as f64 / CIRCLE_SEGMENTS as f64;
            (
                center.0 + (radius as f64 * angle.cos()).round() as i32,
                center.1 + (radius as f64 * angle.sin()).round() as i32,
            )
        });
        if fill {
            self.ops.push(color_op("rg", style.color()));
        } else {
            self.set_stroke(style);
        }
        let vertices = self.trace(ring);
        self.paint(vertices, 3, if fill { "f" } else { "s" });
        Ok(())
    }

    fn draw_text<TStyle: BackendTextStyle>(&mut self, text: &str, style: &TStyle, pos: BackendCoord) -> DrawResult {
        if text.is_empty() || is_invisible(style.color()) {
            return Ok(());
        }
        let size = style.size() * self.scale;
        let width = text_width(text, size);
        let (x, y) = self.at(pos);
        let anchor = style.anchor();
        let x = match anchor.h_pos {
            HPos::Left => x,
            HPos::Center => x - width / 2.0,
            HPos::Right => x - width,
        };
        // Baseline from the anchor, using Helvetica's ascent.
        let y = match anchor.v_pos {
            VPos::Top => y - size * 0.75,
            VPos::Center => y - size * 0.35,
            VPos::Bottom => y,
        };
        self.ops.push(color_op("rg", style.color()));
        self.ops.extend(text_ops(x, y, size, text));
        Ok(())
    }

    fn estimate_text_size<TStyle: BackendTextStyle>(
        &self,
        text: &str,
        style: &TStyle,
    ) -> Result<(u32, u32), DrawingErrorKind<Infallible>> {
        let size = style.size();
        Ok((text_width(text, size).ceil() as u32, size.ceil() as u32))
    }
}

fn is_invisible(color: BackendColor) -> bool {
    color.alpha <= 0.0
}

pub fn real(value: f64) -> Object {
    Object::Real(value as _)
}

/// `rg` (fill) or `RG` (stroke) colour operator.
pub fn color_op(operator: &str, color: BackendColor) -> Operation {
    let (r, g, b) = color.rgb;
    Operation::new(
        operator,
        vec![
            real(r as f64 / 255.0),
            real(g as f64 / 255.0),
            real(b as f64 / 255.0),
        ],
    )
}

/// A text object drawing `content` with its baseline starting at `(x, y)`.
pub fn text_ops(x: f64, y: f64, size: f64, content: &str) -> [Operation; 5] {
    [
        Operation::new("BT", vec![]),
        Operation::new("Tf", vec![Object::Name(FONT_RESOURCE.to_vec()), real(size)]),
        Operation::new("Td", vec![real(x), real(y)]),
        Operation::new("Tj", vec![Object::string_literal(win_ansi(content))]),
        Operation::new("ET", vec![]),
    ]
}

/// Rough Helvetica advance width, used where text is placed without font
/// metrics.
pub fn text_width(content: &str, size: f64) -> f64 {
    content.chars().count() as f64 * size * 0.52
}

/// WinAnsi bytes for `raw`. Characters outside Latin-1 become `?`.
pub fn win_ansi(raw: &str) -> Vec<u8> {
    raw.chars()
        .map(|c| match c {
            ' '..='~' | '\u{a0}'..='\u{ff}' => c as u8,
            _ => b'?',
        })
        .collect()
}
