//! All PDF drawing: style presets, drawing primitives, and the per-page
//! renderers the archetype recipes point at.
//!
//! Coordinates are PDF points with the origin at the bottom-left, converted to
//! millimetres at the printpdf boundary.

use crate::spec::ProductSpec;
use crate::store::Store;
use anyhow::{Context, Result};
use printpdf::path::PaintMode;
use printpdf::{
    BuiltinFont, Color, IndirectFontRef, Line, Mm, PdfDocument, PdfLayerReference, Point, Rect,
    Rgb,
};
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

/// A4 and US Letter in PDF points.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageSize {
    A4,
    UsLetter,
}

impl PageSize {
    pub fn dimensions(self) -> (f64, f64) {
        match self {
            PageSize::A4 => (595.28, 841.89),
            PageSize::UsLetter => (612.0, 792.0),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderStyle {
    Line,
    Bar,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionStyle {
    Underline,
    Pill,
    BarLeft,
}

#[derive(Debug, Clone)]
pub struct Style {
    pub margin: f64,
    pub title_size: f64,
    pub header_size: f64,
    pub body_size: f64,
    pub footer_size: f64,
    pub primary: &'static str,
    pub secondary: &'static str,
    pub grid: &'static str,
    pub header_fill: &'static str,
    pub header_style: HeaderStyle,
    pub section_style: SectionStyle,
}

/// Theme presets; unknown themes fall back to blue_minimal.
pub fn style_for_theme(theme: &str) -> Style {
    let base = Style {
        margin: 54.0,
        title_size: 24.0,
        header_size: 10.0,
        body_size: 10.0,
        footer_size: 8.0,
        primary: "#1F4E79",
        secondary: "#6B7280",
        grid: "#D1D5DB",
        header_fill: "#F3F6FA",
        header_style: HeaderStyle::Line,
        section_style: SectionStyle::Underline,
    };
    match theme {
        "charcoal_mono" => Style {
            primary: "#111827",
            header_fill: "#F4F4F5",
            header_style: HeaderStyle::Bar,
            section_style: SectionStyle::BarLeft,
            ..base
        },
        "warm_neutral" => Style {
            primary: "#7C4A2D",
            grid: "#D9D3CC",
            header_fill: "#F7F2EE",
            header_style: HeaderStyle::Bar,
            section_style: SectionStyle::Pill,
            ..base
        },
        _ => base,
    }
}

fn hex_rgb(value: &str) -> (f32, f32, f32) {
    let hex = value.trim_start_matches('#');
    if hex.len() != 6 {
        return (0.0, 0.0, 0.0);
    }
    let channel = |range: std::ops::Range<usize>| {
        u8::from_str_radix(&hex[range], 16).unwrap_or(0) as f32 / 255.0
    };
    (channel(0..2), channel(2..4), channel(4..6))
}

// Page geometry stays in f64 points; printpdf's Mm wraps f32, so the cast
// happens here at the boundary.
fn mm(pt: f64) -> Mm {
    Mm((pt * 25.4 / 72.0) as f32)
}

/// Approximate Helvetica advance width in points. printpdf exposes no metrics
/// for builtin fonts, so header fitting and word wrap use this table.
fn char_width_em(c: char) -> f64 {
    match c {
        'i' | 'j' | 'l' | '!' | '|' | '\'' | '.' | ',' | ':' | ';' => 0.28,
        'f' | 't' | 'r' | 'I' | '(' | ')' | '[' | ']' | '-' | '/' => 0.36,
        ' ' => 0.28,
        'm' | 'w' | 'M' | 'W' | '@' => 0.89,
        'A'..='Z' | '&' | '%' => 0.68,
        '0'..='9' => 0.56,
        _ => 0.52,
    }
}

pub fn text_width(text: &str, font_size: f64) -> f64 {
    text.chars().map(char_width_em).sum::<f64>() * font_size
}

/// Shrink the font until the text fits, bottoming out at 7pt.
fn fit_font(text: &str, base_size: f64, max_width: f64) -> f64 {
    let mut size = base_size;
    while size > 7.0 {
        if text_width(text, size) <= max_width {
            return size;
        }
        size -= 0.5;
    }
    7.0
}

/// Word-level wrap; a single over-long word gets its own line.
fn wrap_words(text: &str, font_size: f64, max_width: f64) -> Vec<String> {
    let words: Vec<&str> = text.split_whitespace().collect();
    if words.is_empty() {
        return vec![String::new()];
    }
    let mut lines = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    for word in words {
        let mut test = current.clone();
        test.push(word);
        if text_width(&test.join(" "), font_size) <= max_width {
            current.push(word);
        } else if current.is_empty() {
            lines.push(word.to_string());
        } else {
            lines.push(current.join(" "));
            current = vec![word];
        }
    }
    if !current.is_empty() {
        lines.push(current.join(" "));
    }
    lines
}

/// One page worth of drawing state.
struct Canvas<'a> {
    layer: PdfLayerReference,
    font: &'a IndirectFontRef,
    style: &'a Style,
    pw: f64,
    ph: f64,
    page_no: usize,
}

impl Canvas<'_> {
    fn set_fill(&self, hex: &str) {
        let (r, g, b) = hex_rgb(hex);
        self.layer.set_fill_color(Color::Rgb(Rgb::new(r, g, b, None)));
    }

    fn set_fill_rgb(&self, r: f32, g: f32, b: f32) {
        self.layer.set_fill_color(Color::Rgb(Rgb::new(r, g, b, None)));
    }

    fn set_stroke(&self, hex: &str) {
        let (r, g, b) = hex_rgb(hex);
        self.layer.set_outline_color(Color::Rgb(Rgb::new(r, g, b, None)));
    }

    fn set_stroke_rgb(&self, r: f32, g: f32, b: f32) {
        self.layer.set_outline_color(Color::Rgb(Rgb::new(r, g, b, None)));
    }

    fn set_line_width(&self, width: f64) {
        self.layer.set_outline_thickness(width as f32);
    }

    fn text(&self, text: &str, size: f64, x: f64, y: f64) {
        self.layer.use_text(text, size as f32, mm(x), mm(y), self.font);
    }

    fn text_centered(&self, text: &str, size: f64, cx: f64, y: f64) {
        self.text(text, size, cx - text_width(text, size) / 2.0, y);
    }

    fn text_right(&self, text: &str, size: f64, rx: f64, y: f64) {
        self.text(text, size, rx - text_width(text, size), y);
    }

    fn line(&self, x1: f64, y1: f64, x2: f64, y2: f64) {
        self.layer.add_line(Line {
            points: vec![
                (Point::new(mm(x1), mm(y1)), false),
                (Point::new(mm(x2), mm(y2)), false),
            ],
            is_closed: false,
        });
    }

    fn rect(&self, x: f64, y: f64, w: f64, h: f64, mode: PaintMode) {
        self.layer
            .add_rect(Rect::new(mm(x), mm(y), mm(x + w), mm(y + h)).with_mode(mode));
    }

    fn footer(&self, disclaimer: &str) {
        let style = self.style;
        self.set_fill(style.secondary);
        self.text_centered(
            disclaimer,
            style.footer_size,
            self.pw / 2.0,
            style.margin * 0.45,
        );
    }

    fn header(&self, title: &str) {
        let style = self.style;
        let margin = style.margin;
        let page_label = format!("Page {}", self.page_no);
        match style.header_style {
            HeaderStyle::Bar => {
                let bar_h = 44.0;
                self.set_fill(style.primary);
                self.rect(0.0, self.ph - bar_h, self.pw, bar_h, PaintMode::Fill);
                self.set_fill_rgb(1.0, 1.0, 1.0);
                self.text(title, style.header_size, margin, self.ph - bar_h + 14.0);
                self.text_right(
                    &page_label,
                    style.header_size - 1.0,
                    self.pw - margin,
                    self.ph - bar_h + 14.0,
                );
            }
            HeaderStyle::Line => {
                self.set_stroke(style.grid);
                self.set_line_width(1.0);
                let y_line = self.ph - margin + 10.0;
                self.line(margin, y_line, self.pw - margin, y_line);
                self.set_fill(style.primary);
                self.text(title, style.header_size, margin, self.ph - margin + 18.0);
                self.set_fill(style.secondary);
                self.text_right(
                    &page_label,
                    style.header_size - 1.0,
                    self.pw - margin,
                    self.ph - margin + 18.0,
                );
            }
        }
    }

    fn section_title(&self, x: f64, y: f64, text: &str) {
        let style = self.style;
        let size = style.header_size + 4.0;
        match style.section_style {
            SectionStyle::Pill => {
                let pad_x = 10.0;
                let w = f64::max(90.0, text_width(text, size) + 2.0 * pad_x);
                self.set_fill(style.header_fill);
                self.rect(x, y - 18.0, w, 24.0, PaintMode::Fill);
                self.set_fill(style.primary);
                self.text(text, size, x + pad_x, y - 12.0);
            }
            SectionStyle::BarLeft => {
                self.set_fill(style.primary);
                self.rect(x, y - 18.0, 6.0, 22.0, PaintMode::Fill);
                self.text(text, size, x + 12.0, y - 12.0);
            }
            SectionStyle::Underline => {
                self.set_fill(style.primary);
                self.text(text, size, x, y);
                self.set_stroke(style.grid);
                self.set_line_width(1.0);
                self.line(x, y - 10.0, x + 280.0, y - 10.0);
            }
        }
    }

    fn card(&self, x: f64, y: f64, w: f64, h: f64) {
        self.set_stroke(self.style.grid);
        self.set_fill_rgb(1.0, 1.0, 1.0);
        self.set_line_width(1.0);
        self.rect(x, y, w, h, PaintMode::FillStroke);
    }

    fn card_title(&self, x: f64, y: f64, text: &str) {
        self.set_fill(self.style.primary);
        self.text(text, self.style.body_size + 1.0, x, y);
    }

    fn card_bullets(&self, x: f64, y: f64, w: f64, lines: &[String], max_lines: usize) {
        let style = self.style;
        self.set_fill(style.secondary);
        let usable_w = f64::max(10.0, w);
        let mut wrapped = Vec::new();
        for raw in lines {
            let raw = raw.trim();
            if raw.is_empty() {
                continue;
            }
            wrapped.extend(wrap_words(&format!("- {}", raw), style.body_size, usable_w));
        }
        let mut yy = y;
        for line in wrapped.iter().take(max_lines) {
            self.text(line, style.body_size, x, yy);
            yy -= 14.0;
        }
    }

    /// Weighted-column table: outer frame, header band, grid, fitted headers.
    fn table(&self, x: f64, y_top: f64, w: f64, h: f64, headers: &[&str], weights: &[f64], rows: usize) {
        let style = self.style;
        let total: f64 = weights.iter().sum::<f64>().max(1e-6);
        let col_w: Vec<f64> = weights.iter().map(|vw| w * vw / total).collect();

        let header_h = f64::max(24.0, h * 0.09);
        let row_h = (h - header_h) / rows.max(1) as f64;

        self.set_stroke(style.grid);
        self.set_line_width(1.2);
        self.rect(x, y_top - h, w, h, PaintMode::Stroke);

        self.set_fill(style.header_fill);
        self.rect(x, y_top - header_h, w, header_h, PaintMode::Fill);

        self.set_stroke_rgb(0.88, 0.90, 0.92);
        self.set_line_width(1.0);
        let mut cx = x;
        for (i, cw) in col_w.iter().enumerate() {
            if i > 0 {
                self.line(cx, y_top, cx, y_top - h);
            }
            cx += cw;
        }
        self.line(x, y_top - header_h, x + w, y_top - header_h);
        for r in 1..=rows {
            let yy = y_top - header_h - r as f64 * row_h;
            self.line(x, yy, x + w, yy);
        }

        self.set_fill(style.primary);
        let mut cx = x;
        for (label, cw) in headers.iter().zip(&col_w) {
            let size = fit_font(label, style.body_size, cw - 12.0);
            let ty = (y_top - header_h) + (header_h - size) / 2.0 - 1.0;
            self.text_centered(label, size, cx + cw / 2.0, ty);
            cx += cw;
        }
    }

    /// Titled box with ruled writing lines.
    fn lined_box(&self, x: f64, y_top: f64, w: f64, h: f64, title: &str) {
        let style = self.style;
        self.set_stroke(style.grid);
        self.set_line_width(1.0);
        self.rect(x, y_top - h, w, h, PaintMode::Stroke);

        self.set_fill(style.primary);
        self.text(title, style.body_size + 1.0, x + 12.0, y_top - 18.0);

        self.set_stroke_rgb(0.88, 0.90, 0.92);
        let mut yy = y_top - 34.0;
        while yy > y_top - h + 18.0 {
            self.line(x + 12.0, yy, x + w - 12.0, yy);
            yy -= 18.0;
        }
    }
}

/// Body region shared by most pages: below the section title, above the footer.
fn body_frame(c: &Canvas<'_>) -> (f64, f64, f64) {
    let margin = c.style.margin;
    let top = c.ph - margin - 60.0;
    let h = c.ph - 2.0 * margin - 130.0;
    let w = c.pw - 2.0 * margin;
    (top, h, w)
}

fn page_cover(c: &Canvas<'_>, spec: &ProductSpec, disclaimer: &str) {
    let style = c.style;
    let margin = style.margin;

    let band_h = 70.0;
    c.set_fill(style.primary);
    c.rect(0.0, c.ph - band_h, c.pw, band_h, PaintMode::Fill);

    let max_w = c.pw - 2.0 * margin;
    let title_size = fit_font(&spec.title, style.title_size, max_w);
    c.set_fill_rgb(1.0, 1.0, 1.0);
    c.text_centered(&spec.title, title_size, c.pw / 2.0, c.ph - 48.0);

    c.set_fill(style.secondary);
    let subtitle = format!(
        "{} • {} pages • A4 + US Letter",
        spec.copy.cover_subtitle, spec.layout.page_count
    );
    c.text_centered(&subtitle, style.body_size + 1.0, c.pw / 2.0, c.ph - band_h - 18.0);

    let gap = 18.0;
    let card_w = (c.pw - 2.0 * margin - gap) / 2.0;
    let card_h = 170.0;
    let card_y = c.ph - band_h - 60.0 - card_h;
    let lx = margin;
    let rx = margin + card_w + gap;

    c.card(lx, card_y, card_w, card_h);
    c.card_title(lx + 14.0, card_y + card_h - 26.0, "Included");
    c.card_bullets(lx + 14.0, card_y + card_h - 50.0, card_w - 28.0, &spec.copy.included_lines, 8);

    c.card(rx, card_y, card_w, card_h);
    c.card_title(rx + 14.0, card_y + card_h - 26.0, "Quick Start");
    c.card_bullets(rx + 14.0, card_y + card_h - 50.0, card_w - 28.0, &spec.copy.howto_lines, 8);

    let how_h = 150.0;
    let how_top = margin + how_h + 24.0;
    c.card(margin, how_top - how_h, c.pw - 2.0 * margin, how_h);
    c.card_title(margin + 14.0, how_top - 24.0, "How to use");
    c.set_fill(style.secondary);
    let mut yy = how_top - 48.0;
    for line in spec.copy.howto_lines.iter().take(6) {
        for wline in wrap_words(&format!("- {}", line), style.body_size, c.pw - 2.0 * margin - 28.0) {
            c.text(&wline, style.body_size, margin + 14.0, yy);
            yy -= 14.0;
        }
    }

    c.footer(disclaimer);
}

fn page_quick_start(c: &Canvas<'_>, spec: &ProductSpec, disclaimer: &str) {
    let margin = c.style.margin;
    c.header(&spec.title);
    c.section_title(margin, c.ph - margin - 18.0, "Quick Start");

    let top = c.ph - margin - 60.0;
    let h = c.ph - 2.0 * margin - 120.0;
    let gap = 18.0;
    let left_w = (c.pw - 2.0 * margin - gap) * 0.58;
    let right_w = (c.pw - 2.0 * margin - gap) - left_w;

    c.lined_box(margin, top, left_w, h, "Checklist");
    c.lined_box(margin + left_w + gap, top, right_w, h, "Notes");
    c.footer(disclaimer);
}

fn page_notes_summary(c: &Canvas<'_>, spec: &ProductSpec, disclaimer: &str) {
    let margin = c.style.margin;
    c.header(&spec.title);
    c.section_title(margin, c.ph - margin - 18.0, "Notes & Summary");

    let top = c.ph - margin - 60.0;
    let h = c.ph - 2.0 * margin - 120.0;
    let w = c.pw - 2.0 * margin;
    let gap = 18.0;
    let left_w = w * 0.62;
    let right_w = w - left_w - gap;
    let rx = margin + left_w + gap;

    c.lined_box(margin, top, left_w, h, "Notes");
    c.lined_box(rx, top, right_w, h * 0.32, "Highlights");
    c.lined_box(rx, top - h * 0.32 - gap, right_w, h * 0.34 - gap, "Next Steps");
    c.lined_box(rx, top - h * 0.66 - 2.0 * gap, right_w, h * 0.34 - gap, "Reminders");
    c.footer(disclaimer);
}

fn page_priority_matrix(c: &Canvas<'_>, spec: &ProductSpec, disclaimer: &str) {
    let margin = c.style.margin;
    c.header(&spec.title);
    c.section_title(margin, c.ph - margin - 18.0, "Priority Matrix");

    let (top, h, w) = body_frame(c);
    let gap = 16.0;
    let box_w = (w - gap) / 2.0;
    let box_h = (h - gap) / 2.0;

    c.lined_box(margin, top, box_w, box_h, "Urgent + Important");
    c.lined_box(margin + box_w + gap, top, box_w, box_h, "Not Urgent + Important");
    c.lined_box(margin, top - box_h - gap, box_w, box_h, "Urgent + Not Important");
    c.lined_box(margin + box_w + gap, top - box_h - gap, box_w, box_h, "Not Urgent + Not Important");
    c.footer(disclaimer);
}

/// Shared shape for the "big left box, two stacked right boxes" pages.
fn split_boxes_page(
    c: &Canvas<'_>,
    spec: &ProductSpec,
    disclaimer: &str,
    section: &str,
    left_title: &str,
    left_ratio: f64,
    top_right_title: &str,
    bottom_right_title: &str,
) {
    let margin = c.style.margin;
    c.header(&spec.title);
    c.section_title(margin, c.ph - margin - 18.0, section);

    let (top, h, w) = body_frame(c);
    let gap = 16.0;
    let left = w * left_ratio;
    let right = w - left - gap;
    let rx = margin + left + gap;

    c.lined_box(margin, top, left, h, left_title);
    c.lined_box(rx, top, right, h * 0.48, top_right_title);
    c.lined_box(rx, top - h * 0.48 - gap, right, h * 0.52 - gap, bottom_right_title);
    c.footer(disclaimer);
}

/// Shared shape for the "two stacked full-width boxes" pages.
fn stacked_boxes_page(
    c: &Canvas<'_>,
    spec: &ProductSpec,
    disclaimer: &str,
    section: &str,
    top_title: &str,
    bottom_title: &str,
) {
    let margin = c.style.margin;
    c.header(&spec.title);
    c.section_title(margin, c.ph - margin - 18.0, section);

    let (top, h, w) = body_frame(c);
    c.lined_box(margin, top, w, h * 0.55, top_title);
    c.lined_box(margin, top - h * 0.55 - 18.0, w, h * 0.45 - 18.0, bottom_title);
    c.footer(disclaimer);
}

struct TableDef {
    section: &'static str,
    headers: &'static [&'static str],
    weights: &'static [f64],
    rows: usize,
}

/// Layouts for every straight-table page id.
fn table_def(page_id: &str) -> Option<TableDef> {
    let def = |section: &'static str,
               headers: &'static [&'static str],
               weights: &'static [f64],
               rows: usize| TableDef { section, headers, weights, rows };
    match page_id {
        "cashflow_monthly" => Some(def(
            "Monthly Cash Flow",
            &["Month", "Income", "Fixed", "Variable", "Net", "Notes"],
            &[1.4, 1.2, 1.2, 1.2, 1.0, 2.0],
            14,
        )),
        "cashflow_weekly" => Some(def(
            "Weekly Forecast",
            &["Week", "Planned In", "Planned Out", "Actual In", "Actual Out", "Net"],
            &[1.2, 1.2, 1.2, 1.2, 1.2, 1.0],
            10,
        )),
        "bills_calendar" => Some(def(
            "Bills Calendar",
            &["Week", "Bills to Pay", "Amount", "Paid?", "Notes"],
            &[1.0, 3.0, 1.2, 1.0, 2.2],
            10,
        )),
        "bills_due_table" => Some(def(
            "Bills Due",
            &["Due Date", "Bill", "Amount", "Paid", "Method", "Notes"],
            &[1.3, 2.2, 1.2, 0.8, 1.3, 2.2],
            16,
        )),
        "payment_log" => Some(def(
            "Payment Log",
            &["Date", "Account", "Amount", "Method", "Balance", "Notes"],
            &[1.2, 2.2, 1.1, 1.4, 1.1, 2.0],
            16,
        )),
        "category_budget" => Some(def(
            "Category Budget",
            &["Category", "Budget", "Spent", "Remaining", "Notes"],
            &[2.2, 1.2, 1.2, 1.2, 2.4],
            14,
        )),
        "expense_log" => Some(def(
            "Expense Log",
            &["Date", "Category", "Description", "Amount", "Payment", "Notes"],
            &[1.2, 1.7, 2.6, 1.0, 1.3, 2.0],
            18,
        )),
        "sinking_funds" => Some(def(
            "Sinking Funds",
            &["Fund", "Target", "Current", "Monthly Add", "Due", "Notes"],
            &[2.0, 1.1, 1.1, 1.1, 1.1, 2.6],
            14,
        )),
        "debt_list" => Some(def(
            "Debt List",
            &["Debt", "Balance", "APR", "Min Pay", "Due", "Notes"],
            &[2.2, 1.2, 1.0, 1.1, 1.0, 2.5],
            14,
        )),
        "avalanche_tracker" => Some(def(
            "Avalanche Tracker",
            &["Order", "Debt", "APR", "Payment", "New Balance", "Notes"],
            &[0.9, 2.0, 1.0, 1.1, 1.2, 2.8],
            14,
        )),
        "snowball_tracker" => Some(def(
            "Snowball Tracker",
            &["Order", "Debt", "Balance", "Payment", "Paid Off?", "Notes"],
            &[0.9, 2.2, 1.2, 1.2, 1.0, 2.5],
            14,
        )),
        "annual_overview" => Some(def(
            "Annual Overview",
            &["Month", "Income", "Expenses", "Net", "Top Category", "Notes"],
            &[1.2, 1.2, 1.2, 1.0, 1.6, 2.2],
            12,
        )),
        "monthly_overview" => Some(def(
            "Monthly Overview",
            &["Week", "Main Focus", "Budget Note", "Appointments", "Must Pay", "Review"],
            &[1.0, 2.2, 1.6, 1.6, 1.4, 1.8],
            6,
        )),
        "income_summary" => Some(def(
            "Income Summary",
            &["Source", "Planned", "Actual", "Difference", "Frequency", "Notes"],
            &[2.2, 1.1, 1.1, 1.1, 1.4, 2.5],
            14,
        )),
        "expense_summary" => Some(def(
            "Expense Summary",
            &["Category", "Planned", "Actual", "Difference", "Action", "Notes"],
            &[2.0, 1.1, 1.1, 1.1, 1.6, 2.4],
            14,
        )),
        "savings_goal_tracker" => Some(def(
            "Savings Goal Tracker",
            &["Goal", "Target", "Start", "Current", "Next Deposit", "Notes"],
            &[2.2, 1.2, 1.0, 1.2, 1.4, 2.6],
            12,
        )),
        "no_spend_calendar" => Some(def(
            "No-Spend Calendar",
            &["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"],
            &[1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0],
            6,
        )),
        "challenge_tracker" => Some(def(
            "Challenge Tracker",
            &["Day", "Challenge", "Done?", "Reward", "Notes"],
            &[0.9, 2.8, 0.9, 1.2, 2.2],
            20,
        )),
        "inbox_capture" => Some(def(
            "Inbox Capture",
            &["Captured Thought / Task", "Context", "Quick Tag", "Next?"],
            &[3.8, 1.6, 1.2, 1.0],
            18,
        )),
        "clarify_next_action" => Some(def(
            "Clarify Next Action",
            &["Item", "Next Action", "Priority", "When", "Done?"],
            &[1.8, 3.2, 1.1, 1.2, 0.9],
            16,
        )),
        "time_block" => Some(def(
            "Time Block Plan",
            &["Block", "Goal", "Start", "End", "Notes"],
            &[1.0, 2.8, 1.0, 1.0, 2.2],
            14,
        )),
        "habit_grid" => Some(def(
            "Habit Grid (30 Days)",
            &["Habit", "1-5", "6-10", "11-15", "16-20", "21-25", "26-30"],
            &[2.2, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0],
            10,
        )),
        "focus_blocks" => Some(def(
            "Focus Blocks",
            &["Block", "What I'll Do", "Start", "End", "Energy", "Notes"],
            &[0.9, 2.8, 1.0, 1.0, 1.0, 2.3],
            12,
        )),
        "deep_work_log" => Some(def(
            "Deep Work Log",
            &["Date", "Task", "Minutes", "What Helped", "What Blocked"],
            &[1.2, 2.6, 1.0, 2.0, 2.2],
            16,
        )),
        "distraction_log" => Some(def(
            "Distraction Log",
            &["Time", "Trigger", "What I Did", "Return Plan", "Notes"],
            &[1.0, 1.6, 2.4, 1.8, 2.2],
            16,
        )),
        "morning_routine" => Some(def(
            "Morning Routine",
            &["Step", "Cue", "Action", "Time", "Done?", "Notes"],
            &[0.9, 1.4, 2.6, 1.0, 0.9, 2.2],
            14,
        )),
        "evening_routine" => Some(def(
            "Evening Routine",
            &["Step", "Trigger", "Action", "Prep", "Done?", "Notes"],
            &[0.9, 1.4, 2.6, 1.0, 0.9, 2.2],
            14,
        )),
        "weekly_routine" => Some(def(
            "Weekly Routine",
            &["Day", "Anchor Habit", "Priority", "Focus Block", "Notes"],
            &[1.0, 2.2, 1.4, 2.0, 2.4],
            7,
        )),
        "gratitude_log" => Some(def(
            "Gratitude Log",
            &["Date", "1", "2", "3", "Why it mattered"],
            &[1.1, 1.0, 1.0, 1.0, 3.8],
            14,
        )),
        "daily_priorities" => Some(def(
            "Daily Priorities",
            &["Day", "One Priority", "Support Tasks", "Time Block", "Done?"],
            &[1.0, 2.6, 2.6, 1.6, 0.8],
            7,
        )),
        "next_week_plan" => Some(def(
            "Next Week Plan",
            &["Focus", "Carryover", "Start/Stop", "Schedule", "Notes"],
            &[1.8, 2.2, 2.2, 1.6, 2.2],
            12,
        )),
        "task_backlog" => Some(def(
            "Task Backlog",
            &["Task", "Owner", "Priority", "Estimate", "Status", "Notes"],
            &[3.0, 1.2, 1.0, 1.0, 1.2, 2.6],
            16,
        )),
        "kanban_board" => Some(def(
            "Kanban Board",
            &["Backlog", "Doing", "Blocked", "Done"],
            &[1.0, 1.0, 1.0, 1.0],
            10,
        )),
        "milestones" => Some(def(
            "Milestones",
            &["Milestone", "Owner", "Target Date", "Status", "Next Step", "Notes"],
            &[2.6, 1.2, 1.3, 1.1, 2.0, 2.4],
            12,
        )),
        _ => None,
    }
}

fn table_page(c: &Canvas<'_>, spec: &ProductSpec, disclaimer: &str, def: &TableDef) {
    let margin = c.style.margin;
    c.header(&spec.title);
    c.section_title(margin, c.ph - margin - 18.0, def.section);
    let (top, h, w) = body_frame(c);
    c.table(margin, top, w, h, def.headers, def.weights, def.rows);
    c.footer(disclaimer);
}

fn render_page(c: &Canvas<'_>, spec: &ProductSpec, disclaimer: &str, page_id: &str) {
    if let Some(def) = table_def(page_id) {
        table_page(c, spec, disclaimer, &def);
        return;
    }
    match page_id {
        "cover" => page_cover(c, spec, disclaimer),
        "quick_start" => page_quick_start(c, spec, disclaimer),
        "priority_matrix" => page_priority_matrix(c, spec, disclaimer),
        "progress_meter" => split_boxes_page(
            c, spec, disclaimer,
            "Progress Meter", "Milestones", 0.55, "This Month", "Motivation Notes",
        ),
        "break_plan" => split_boxes_page(
            c, spec, disclaimer,
            "Break Plan", "Break Ideas", 0.55, "Reset Checklist", "After Break",
        ),
        "weekly_goals" => split_boxes_page(
            c, spec, disclaimer,
            "Weekly Goals", "Top 3 Outcomes", 0.6, "Must Do", "Nice To Have",
        ),
        "project_overview" => split_boxes_page(
            c, spec, disclaimer,
            "Project Overview", "Goal / Definition of Done", 0.62, "Milestone", "Risks",
        ),
        "mood_checkin" => stacked_boxes_page(
            c, spec, disclaimer,
            "Mood Check-in", "How I feel (notes)", "What I'll do next (small step)",
        ),
        "wins_lessons" => stacked_boxes_page(
            c, spec, disclaimer,
            "Wins & Lessons", "Wins (what worked)", "Lessons (what to change)",
        ),
        "meeting_notes" => stacked_boxes_page(
            c, spec, disclaimer,
            "Meeting Notes", "Notes", "Decisions & Actions",
        ),
        // Unknown page ids render as a generic notes page rather than failing
        // the whole product.
        _ => page_notes_summary(c, spec, disclaimer),
    }
}

/// Render the spec's recipe at the given page size.
pub fn render_pdf(
    spec: &ProductSpec,
    size: PageSize,
    output_path: &Path,
    disclaimer: &str,
) -> Result<()> {
    let style = style_for_theme(&spec.theme);
    let (pw, ph) = size.dimensions();

    let (doc, first_page, first_layer) =
        PdfDocument::new(&spec.title, mm(pw), mm(ph), "Page 1");
    let font = doc
        .add_builtin_font(BuiltinFont::Helvetica)
        .context("Failed to register builtin font")?;

    for (index, page_id) in spec.recipe.iter().enumerate() {
        let layer = if index == 0 {
            doc.get_page(first_page).get_layer(first_layer)
        } else {
            let (page, layer) = doc.add_page(mm(pw), mm(ph), format!("Page {}", index + 1));
            doc.get_page(page).get_layer(layer)
        };
        let canvas = Canvas {
            layer,
            font: &font,
            style: &style,
            pw,
            ph,
            page_no: index + 1,
        };
        render_page(&canvas, spec, disclaimer, page_id);
    }

    let file = File::create(output_path)
        .with_context(|| format!("Failed to create {}", output_path.display()))?;
    doc.save(&mut BufWriter::new(file))
        .with_context(|| format!("Failed to save {}", output_path.display()))?;
    Ok(())
}

/// Render both page sizes into the product directory.
pub fn render_pdfs(
    spec: &ProductSpec,
    store: &Store,
    disclaimer: &str,
) -> Result<(PathBuf, PathBuf)> {
    let a4_path = store.artifact_path(&spec.slug, "pdf_a4")?;
    let us_path = store.artifact_path(&spec.slug, "pdf_usletter")?;
    render_pdf(spec, PageSize::A4, &a4_path, disclaimer)?;
    render_pdf(spec, PageSize::UsLetter, &us_path, disclaimer)?;
    Ok((a4_path, us_path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::build_spec;
    use tempfile::TempDir;

    #[test]
    fn page_sizes_are_standard() {
        assert_eq!(PageSize::A4.dimensions(), (595.28, 841.89));
        assert_eq!(PageSize::UsLetter.dimensions(), (612.0, 792.0));
    }

    #[test]
    fn point_to_millimetre_conversion() {
        // 72pt is one inch; A4 width lands on 210mm.
        assert!((mm(72.0).0 - 25.4).abs() < 1e-4);
        assert!((mm(595.28).0 - 210.0).abs() < 0.05);
    }

    #[test]
    fn hex_parsing() {
        let (r, g, b) = hex_rgb("#FFFFFF");
        assert!((r - 1.0).abs() < 1e-9 && (g - 1.0).abs() < 1e-9 && (b - 1.0).abs() < 1e-9);
        assert_eq!(hex_rgb("nonsense"), (0.0, 0.0, 0.0));
    }

    #[test]
    fn fit_font_shrinks_but_never_below_floor() {
        let wide = "W".repeat(200);
        assert_eq!(fit_font(&wide, 24.0, 100.0), 7.0);
        assert_eq!(fit_font("Hi", 12.0, 500.0), 12.0);
    }

    #[test]
    fn wrap_words_respects_width() {
        let lines = wrap_words("one two three four five six seven", 10.0, 80.0);
        assert!(lines.len() > 1);
        for line in &lines {
            assert!(text_width(line, 10.0) <= 80.0 || !line.contains(' '));
        }
    }

    #[test]
    fn every_recipe_page_has_a_renderer() {
        // Table pages must resolve; box/special pages are handled by name.
        let special = [
            "cover",
            "quick_start",
            "notes_summary",
            "priority_matrix",
            "progress_meter",
            "break_plan",
            "weekly_goals",
            "project_overview",
            "mood_checkin",
            "wins_lessons",
            "meeting_notes",
        ];
        for archetype in &crate::archetypes::ARCHETYPES {
            for page in archetype.recipe {
                assert!(
                    table_def(page).is_some() || special.contains(page),
                    "no renderer for {page}"
                );
            }
        }
    }

    #[test]
    fn rendered_pdf_has_pdf_magic() {
        let dir = TempDir::new().unwrap();
        let spec = build_spec("ADHD", "Focus Planner", "focus-planner", 0);
        let path = dir.path().join("a4.pdf");
        render_pdf(&spec, PageSize::A4, &path, "Test disclaimer").unwrap();
        let bytes = std::fs::read(&path).unwrap();
        assert!(bytes.starts_with(b"%PDF"), "missing PDF header");
        assert!(bytes.len() > 1_000);
    }

    #[test]
    fn themes_map_to_distinct_styles() {
        let blue = style_for_theme("blue_minimal");
        let charcoal = style_for_theme("charcoal_mono");
        let warm = style_for_theme("warm_neutral");
        assert_eq!(blue.header_style, HeaderStyle::Line);
        assert_eq!(charcoal.section_style, SectionStyle::BarLeft);
        assert_eq!(warm.section_style, SectionStyle::Pill);
        assert_eq!(style_for_theme("unknown").primary, blue.primary);
    }
}
