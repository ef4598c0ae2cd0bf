//! Multi-page PDF report: a title block, the summary statistics and the
//! chart cards, drawn by the same plotters code as the SVG charts.

use chrono::{DateTime, Utc};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};
use plotters::prelude::{Color, IntoDrawingArea, RGBColor};

use super::pdf_canvas::{color_op, real, text_ops, win_ansi, PdfCanvas, FONT_RESOURCE};
use crate::error::AppError;
use crate::services::render::charts::{draw_failure, BORDER, CARD_HEIGHT, CARD_WIDTH, MUTED, TEXT};
use crate::services::render::{ChartSpec, Dashboard};

// A4 in points.
pub const PAGE_WIDTH: f64 = 595.28;
pub const PAGE_HEIGHT: f64 = 841.89;
const MARGIN: f64 = 40.0;
const CARD_GAP: f64 = 16.0;
const TITLE_SIZE: f64 = 20.0;
const META_SIZE: f64 = 10.0;
const BODY_SIZE: f64 = 11.0;

/// Where a block lands: page index and distance from the page top.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub page: usize,
    pub top: f64,
}

/// Stacks blocks of the given heights top to bottom, starting a new page
/// whenever the remaining space is too small.
pub fn paginate(heights: &[f64], first_top: f64) -> Vec<Placement> {
    let bottom = PAGE_HEIGHT - MARGIN;
    let mut page = 0;
    let mut cursor = first_top;
    heights
        .iter()
        .map(|&height| {
            if cursor + height > bottom && cursor > MARGIN {
                page += 1;
                cursor = MARGIN;
            }
            let placement = Placement { page, top: cursor };
            cursor += height + CARD_GAP;
            placement
        })
        .collect()
}

/// Renders the report for `dashboard`.
pub fn to_pdf(dashboard: &Dashboard, generated_at: DateTime<Utc>) -> Result<Vec<u8>, AppError> {
    let start = std::time::Instant::now();
    let mut pages: Vec<Vec<Operation>> = vec![Vec::new()];

    let mut cursor = MARGIN + TITLE_SIZE;
    line(&mut pages[0], cursor, TITLE_SIZE, "Data Analysis Report", TEXT);
    cursor += 8.0;
    let meta = [
        format!("File: {}", dashboard.file_name),
        format!("Rows analyzed: {}", dashboard.row_count),
        format!("Generated: {}", generated_at.format("%Y-%m-%d %H:%M UTC")),
    ];
    for text in &meta {
        cursor += META_SIZE + 4.0;
        line(&mut pages[0], cursor, META_SIZE, text, MUTED);
    }

    if !dashboard.stat_cards.is_empty() {
        cursor += 24.0;
        line(&mut pages[0], cursor, 12.0, "Summary Statistics", TEXT);
        for card in &dashboard.stat_cards {
            cursor += BODY_SIZE + 3.0;
            let text = format!("{}: average {} (range {})", card.column, card.average, card.range);
            line(&mut pages[0], cursor, BODY_SIZE, &text, TEXT);
        }
    }
    cursor += 20.0;

    let scale = (PAGE_WIDTH - 2.0 * MARGIN) / CARD_WIDTH as f64;
    let charts: Vec<&ChartSpec> = dashboard.charts().collect();
    let heights = vec![CARD_HEIGHT as f64 * scale; charts.len()];

    for (chart, placement) in charts.into_iter().zip(paginate(&heights, cursor)) {
        while pages.len() <= placement.page {
            pages.push(Vec::new());
        }
        draw_card(&mut pages[placement.page], chart, placement.top, scale)?;
    }

    let page_count = pages.len();
    let bytes = assemble(pages, &dashboard.file_name, generated_at)
        .map_err(|e| AppError::ExportFailure(format!("Failed to assemble PDF: {}", e)))?;
    tracing::info!(
        "Rendered PDF report for {}: {} pages, {} bytes in {:?}",
        dashboard.file_name,
        page_count,
        bytes.len(),
        start.elapsed()
    );
    Ok(bytes)
}

fn draw_card(ops: &mut Vec<Operation>, chart: &ChartSpec, top: f64, scale: f64) -> Result<(), AppError> {
    {
        let canvas = PdfCanvas::new(ops, (CARD_WIDTH, CARD_HEIGHT), (MARGIN, PAGE_HEIGHT - top), scale);
        let root = canvas.into_drawing_area();
        chart.render(&root)?;
        root.present().map_err(draw_failure)?;
    }

    // Card outline.
    let (width, height) = (CARD_WIDTH as f64 * scale, CARD_HEIGHT as f64 * scale);
    ops.push(color_op("RG", BORDER.to_backend_color()));
    ops.push(Operation::new("w", vec![real(0.8)]));
    ops.push(Operation::new(
        "re",
        vec![real(MARGIN), real(PAGE_HEIGHT - top - height), real(width), real(height)],
    ));
    ops.push(Operation::new("S", vec![]));
    Ok(())
}

/// Left-aligned text with its baseline `top` points below the page top.
fn line(ops: &mut Vec<Operation>, top: f64, size: f64, content: &str, color: RGBColor) {
    ops.push(color_op("rg", color.to_backend_color()));
    ops.extend(text_ops(MARGIN, PAGE_HEIGHT - top, size, content));
}

fn assemble(pages: Vec<Vec<Operation>>, file_name: &str, generated_at: DateTime<Utc>) -> lopdf::Result<Vec<u8>> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "Encoding" => "WinAnsiEncoding",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { FONT_RESOURCE => font_id },
    });

    let mut kids: Vec<Object> = Vec::with_capacity(pages.len());
    for operations in pages {
        let content = Content { operations }.encode()?;
        let content_id = doc.add_object(Stream::new(dictionary! {}, content));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
            "Resources" => resources_id,
            "MediaBox" => vec![real(0.0), real(0.0), real(PAGE_WIDTH), real(PAGE_HEIGHT)],
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    let info_id = doc.add_object(dictionary! {
        "Title" => Object::string_literal(win_ansi(&format!("{} analysis", file_name))),
        "Producer" => Object::string_literal("DataVision"),
        "CreationDate" => Object::string_literal(format!("D:{}Z", generated_at.format("%Y%m%d%H%M%S"))),
    });
    doc.trailer.set("Root", catalog_id);
    doc.trailer.set("Info", info_id);

    let mut out = Vec::new();
    doc.save_to(&mut out)?;
    Ok(out)
}
