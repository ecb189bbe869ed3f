//! Per-report marker presentation.

#[cfg(test)]
#[path = "marker_test.rs"]
mod marker_test;

use std::fmt;
use std::sync::Arc;

use frames::PriceReport;

use crate::catalog::category_color;
use crate::util::format::{format_price, relative_time};
use crate::util::i18n::Locale;

pub const ABNORMAL_COLOR: &str = "#dc2626";
pub const ABNORMAL_GLYPH: char = '!';
pub const MARKER_SIZE_PX: u32 = 16;

/// Called with the clicked report.
pub type SelectHandler = Arc<dyn Fn(&PriceReport) + Send + Sync>;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MarkerStyle {
    pub color: &'static str,
    pub glyph: Option<char>,
    pub size_px: u32,
}

impl MarkerStyle {
    #[must_use]
    pub fn for_report(report: &PriceReport) -> Self {
        if report.is_abnormal {
            Self { color: ABNORMAL_COLOR, glyph: Some(ABNORMAL_GLYPH), size_px: MARKER_SIZE_PX }
        } else {
            Self { color: category_color(report.category), glyph: None, size_px: MARKER_SIZE_PX }
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Popup {
    pub title: String,
    pub price: String,
    pub city: String,
    pub when: String,
}

impl Popup {
    #[must_use]
    pub fn for_report(report: &PriceReport, locale: Locale, now_ms: i64) -> Self {
        Self {
            title: report.product_name.clone(),
            price: format_price(report.price),
            city: report.city.clone(),
            when: relative_time(locale, now_ms, report.timestamp),
        }
    }

    /// One-line rendering: `Tomate (1kg) · 150 DZD · Alger · il y a 2 h`.
    #[must_use]
    pub fn summary(&self) -> String {
        format!("{} · {} · {} · {}", self.title, self.price, self.city, self.when)
    }
}

#[derive(Clone)]
pub struct Marker {
    report: Arc<PriceReport>,
    pub style: MarkerStyle,
    pub popup: Popup,
    on_select: Option<SelectHandler>,
}

impl Marker {
    #[must_use]
    pub fn new(report: Arc<PriceReport>, locale: Locale, now_ms: i64, on_select: Option<SelectHandler>) -> Self {
        let style = MarkerStyle::for_report(&report);
        let popup = Popup::for_report(&report, locale, now_ms);
        Self { report, style, popup, on_select }
    }

    #[must_use]
    pub fn report(&self) -> &PriceReport {
        &self.report
    }

    #[must_use]
    pub fn report_id(&self) -> &str {
        &self.report.id
    }

    #[must_use]
    pub fn position(&self) -> (f64, f64) {
        (self.report.latitude, self.report.longitude)
    }

    /// Fire the selection callback, if one is attached.
    pub fn click(&self) {
        if let Some(handler) = &self.on_select {
            handler(&self.report);
        }
    }
}

impl fmt::Debug for Marker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Marker")
            .field("report_id", &self.report.id)
            .field("style", &self.style)
            .field("popup", &self.popup)
            .field("selectable", &self.on_select.is_some())
            .finish()
    }
}
