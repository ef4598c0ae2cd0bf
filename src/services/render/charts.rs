use std::ops::Range;
use std::str::FromStr;

use plotters::coord::Shift;
use plotters::element::Pie;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use serde::Serialize;
use smallvec::SmallVec;

use crate::error::AppError;
use crate::models::ChartPoint;

/// Card size in backend pixels; the PDF export scales it to the page.
pub const CARD_WIDTH: u32 = 500;
pub const CARD_HEIGHT: u32 = 320;

const FONT: &str = "sans-serif";
const PIE_RADIUS: f64 = 90.0;

pub const TEXT: RGBColor = RGBColor(0x1e, 0x29, 0x3b);
pub const MUTED: RGBColor = RGBColor(0x64, 0x74, 0x8b);
pub const GRID: RGBColor = RGBColor(0xe2, 0xe8, 0xf0);
pub const BORDER: RGBColor = RGBColor(0xcb, 0xd5, 0xe1);

/// Series colours, assigned in order.
pub const PALETTE: [RGBColor; 6] = [
    RGBColor(0x8b, 0x5c, 0xf6),
    RGBColor(0x06, 0xb6, 0xd4),
    RGBColor(0x64, 0x74, 0x8b),
    RGBColor(0x10, 0xb9, 0x81),
    RGBColor(0xf5, 0x9e, 0x0b),
    RGBColor(0xef, 0x44, 0x44),
];

pub fn palette(index: usize) -> RGBColor {
    PALETTE[index % PALETTE.len()]
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartKind {
    Bar,
    Line,
    Pie,
}

impl ChartKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ChartKind::Bar => "bar",
            ChartKind::Line => "line",
            ChartKind::Pie => "pie",
        }
    }
}

impl FromStr for ChartKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim_end_matches(".svg") {
            "bar" => Ok(ChartKind::Bar),
            "line" => Ok(ChartKind::Line),
            "pie" => Ok(ChartKind::Pie),
            other => Err(AppError::NotFound(format!("unknown chart {:?}", other))),
        }
    }
}

/// What a chart card shows. Drawn on demand onto any plotters backend.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSpec {
    pub kind: ChartKind,
    pub title: String,
    pub description: String,
    pub series: SmallVec<[String; 3]>,
    pub points: Vec<ChartPoint>,
}

impl ChartSpec {
    /// Renders the card as a standalone SVG document.
    pub fn to_svg(&self) -> Result<String, AppError> {
        let mut svg = String::new();
        {
            let root = SVGBackend::with_string(&mut svg, (CARD_WIDTH, CARD_HEIGHT)).into_drawing_area();
            self.render(&root)?;
            root.present().map_err(draw_failure)?;
        }
        Ok(svg)
    }

    /// Draws the whole card (title, description, plot) onto `root`.
    pub fn render<DB: DrawingBackend>(&self, root: &DrawingArea<DB, Shift>) -> Result<(), AppError> {
        root.fill(&WHITE).map_err(draw_failure)?;
        root.draw(&Text::new(
            self.title.as_str(),
            (16, 12),
            (FONT, 15).into_font().color(&TEXT),
        ))
        .map_err(draw_failure)?;
        root.draw(&Text::new(
            self.description.as_str(),
            (16, 32),
            (FONT, 10).into_font().color(&MUTED),
        ))
        .map_err(draw_failure)?;

        let body = root.margin(50, 8, 8, 16);
        match self.kind {
            ChartKind::Bar | ChartKind::Line => self.render_cartesian(&body),
            ChartKind::Pie => self.render_pie(&body),
        }
    }

    fn render_cartesian<DB: DrawingBackend>(&self, area: &DrawingArea<DB, Shift>) -> Result<(), AppError> {
        let count = self.points.len().max(1);
        let y_range = value_range(
            self.points
                .iter()
                .flat_map(|point| self.series.iter().map(move |column| point.value(column))),
        );
        let labels: Vec<String> = self.points.iter().map(|p| truncate_label(&p.label, 10)).collect();

        let mut chart = ChartBuilder::on(area)
            .x_label_area_size(24)
            .y_label_area_size(44)
            .build_cartesian_2d(-0.5f64..(count as f64 - 0.5), y_range)
            .map_err(draw_failure)?;

        // Bars and line points sit on integer x; other ticks stay blank.
        let x_formatter = |x: &f64| {
            let slot = x.round();
            if (x - slot).abs() > 1e-6 || slot < 0.0 {
                return String::new();
            }
            labels.get(slot as usize).cloned().unwrap_or_default()
        };
        let y_formatter = |y: &f64| format_tick(*y);

        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_labels(count)
            .y_labels(5)
            .light_line_style(&GRID)
            .bold_line_style(&GRID)
            .axis_style(&BORDER)
            .label_style((FONT, 9).into_font().color(&MUTED))
            .x_label_formatter(&x_formatter)
            .y_label_formatter(&y_formatter)
            .draw()
            .map_err(draw_failure)?;

        let width = 0.8 / self.series.len().max(1) as f64;
        for (s_idx, column) in self.series.iter().enumerate() {
            let color = palette(s_idx);
            let label = truncate_label(column, 16);
            match self.kind {
                ChartKind::Line => {
                    let line = self
                        .points
                        .iter()
                        .enumerate()
                        .map(|(p_idx, point)| (p_idx as f64, point.value(column)));
                    chart
                        .draw_series(LineSeries::new(line, color.stroke_width(2)).point_size(3))
                        .map_err(draw_failure)?
                        .label(label)
                        .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 12, y)], color.stroke_width(2)));
                }
                _ => {
                    let bars = self.points.iter().enumerate().map(|(p_idx, point)| {
                        let left = p_idx as f64 - 0.4 + width * s_idx as f64;
                        Rectangle::new([(left, 0.0), (left + width, point.value(column))], color.filled())
                    });
                    chart
                        .draw_series(bars)
                        .map_err(draw_failure)?
                        .label(label)
                        .legend(move |(x, y)| Rectangle::new([(x, y - 4), (x + 8, y + 4)], color.filled()));
                }
            }
        }

        if !self.series.is_empty() {
            chart
                .configure_series_labels()
                .position(SeriesLabelPosition::UpperRight)
                .background_style(&WHITE.mix(0.85))
                .border_style(&BORDER)
                .label_font((FONT, 9).into_font().color(&TEXT))
                .draw()
                .map_err(draw_failure)?;
        }
        Ok(())
    }

    fn render_pie<DB: DrawingBackend>(&self, area: &DrawingArea<DB, Shift>) -> Result<(), AppError> {
        let Some(column) = self.series.first() else {
            return Ok(());
        };
        let (width, height) = area.dim_in_pixel();
        let center = (width as i32 / 2, height as i32 / 2);

        let mut sizes = Vec::new();
        let mut colors = Vec::new();
        let mut labels = Vec::new();
        for (idx, point) in self.points.iter().enumerate() {
            let value = point.value(column);
            if value > 0.0 {
                sizes.push(value);
                colors.push(palette(idx));
                labels.push(truncate_label(&point.label, 12));
            }
        }

        if sizes.is_empty() {
            let style = (FONT, 11)
                .into_font()
                .color(&MUTED)
                .pos(Pos::new(HPos::Center, VPos::Center));
            area.draw(&Text::new("No positive values", center, style))
                .map_err(draw_failure)?;
            return Ok(());
        }

        let radius = PIE_RADIUS;
        let mut pie = Pie::new(&center, &radius, &sizes, &colors, &labels);
        pie.start_angle(-90.0);
        pie.label_style((FONT, 10).into_font().color(&TEXT));
        pie.percentages((FONT, 9).into_font().color(&WHITE));
        area.draw(&pie).map_err(draw_failure)?;
        Ok(())
    }
}

/// Always includes zero; a flat series gets a unit range. Headroom keeps the
/// tallest value off the plot edge.
fn value_range(values: impl Iterator<Item = f64>) -> Range<f64> {
    let (mut min, mut max) = values.fold((0.0f64, 0.0f64), |(lo, hi), v| (lo.min(v), hi.max(v)));
    if (max - min).abs() < f64::EPSILON {
        max = min + 1.0;
    }
    let pad = (max - min) * 0.05;
    if min < 0.0 {
        min -= pad;
    }
    min..max + pad
}

pub(crate) fn draw_failure<E>(err: DrawingAreaErrorKind<E>) -> AppError
where
    E: std::error::Error + Send + Sync,
{
    AppError::Internal(format!("chart drawing failed: {}", err))
}

/// Compact axis/value label: integers without decimals, otherwise up to two.
pub fn format_tick(value: f64) -> String {
    if value.fract().abs() < 1e-9 {
        format!("{:.0}", value)
    } else {
        let s = format!("{:.2}", value);
        s.trim_end_matches('0').trim_end_matches('.').to_string()
    }
}

/// Shortens `content` to `max_chars`, marking the cut with "..".
pub fn truncate_label(content: &str, max_chars: usize) -> String {
    if content.chars().count() <= max_chars {
        return content.to_string();
    }
    let kept: String = content.chars().take(max_chars.saturating_sub(2)).collect();
    format!("{}..", kept)
}
