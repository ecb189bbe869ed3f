//! Plain-text rendering for command output.

#[cfg(test)]
#[path = "output_test.rs"]
mod output_test;

use client::catalog::{Product, category_label};
use client::map::Cluster;
use client::state::reports::ReportStats;
use client::util::format::{format_price, relative_time};
use client::util::i18n::{Locale, translate};
use frames::{ChatMessage, PriceReport};

/// `seed-1  Tomate (1kg)  150 DZD  Alger/Kouba  Alimentation  il y a 2 h  +12/-1  [Anormal]`
pub(crate) fn report_line(report: &PriceReport, locale: Locale, now_ms: i64) -> String {
    let place = match &report.commune {
        Some(commune) => format!("{}/{commune}", report.city),
        None => report.city.clone(),
    };
    let mut line = format!(
        "{}  {}  {}  {}  {}  {}  +{}/-{}",
        report.id,
        report.product_name,
        format_price(report.price),
        place,
        category_label(report.category),
        relative_time(locale, now_ms, report.timestamp),
        report.upvotes,
        report.downvotes,
    );
    if report.is_abnormal {
        line.push_str(&format!("  [{}]", translate(locale, "reports.abnormal")));
    }
    directional(locale, line)
}

/// Prefix a right-to-left mark for RTL locales so bidi terminals align the line.
fn directional(locale: Locale, line: String) -> String {
    if locale.is_rtl() { format!("\u{200F}{line}") } else { line }
}

/// `  p-tomate  Tomate (1kg)  120 DZD / kg`
pub(crate) fn product_line(product: &Product, locale: Locale) -> String {
    directional(
        locale,
        format!("  {}  {}  {} / {}", product.id, product.name, format_price(product.average_price), product.unit),
    )
}

pub(crate) fn print_reports(reports: &[&PriceReport], locale: Locale, now_ms: i64) {
    println!("{} ({})", translate(locale, "reports.title"), reports.len());
    if reports.is_empty() {
        println!("{}", translate(locale, "reports.empty"));
    }
    for report in reports {
        println!("{}", report_line(report, locale, now_ms));
    }
}

pub(crate) fn stats_lines(stats: &ReportStats, locale: Locale) -> Vec<String> {
    vec![
        format!("{}: {}", translate(locale, "stats.totalReports"), stats.total),
        format!("{}: {}", translate(locale, "stats.cities"), stats.cities),
        format!("{}: {}", translate(locale, "stats.products"), stats.products),
        format!("{}: {}", translate(locale, "stats.abnormalPrices"), stats.abnormal),
    ]
}

pub(crate) fn chat_line(message: &ChatMessage, locale: Locale, now_ms: i64) -> String {
    let line = format!(
        "[{}] {} ({}): {}",
        message.id,
        message.user_name,
        relative_time(locale, now_ms, message.timestamp),
        message.message
    );
    directional(locale, line)
}

/// Badge clusters print count, tier class and badge size; lone markers print their report id.
pub(crate) fn cluster_line(cluster: &Cluster) -> String {
    let position = format!("{:.4},{:.4}", cluster.latitude, cluster.longitude);
    match &cluster.badge {
        Some(badge) => format!(
            "{position}  cluster {} {} {}px font {}px  abnormal {}",
            badge.count,
            badge.tier.class_name(),
            badge.diameter_px,
            badge.font_px,
            cluster.abnormal
        ),
        None => format!(
            "{position}  marker {}{}",
            cluster.report_ids.first().map_or("", String::as_str),
            if cluster.abnormal > 0 { " !" } else { "" }
        ),
    }
}
