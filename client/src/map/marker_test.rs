use std::sync::Mutex;

use frames::{Category, Origin};

use super::*;

const NOW: i64 = 1_700_000_000_000;

fn report(abnormal: bool) -> PriceReport {
    PriceReport {
        id: "r1".to_owned(),
        product_name: "Huile (5L)".to_owned(),
        price: 1_250,
        category: Category::Fuel,
        city: "Annaba".to_owned(),
        commune: None,
        latitude: 36.9,
        longitude: 7.76,
        reporter_id: "user-1".to_owned(),
        reporter_name: None,
        timestamp: NOW - 2 * 3_600_000,
        upvotes: 0,
        downvotes: 0,
        is_abnormal: abnormal,
        origin: Origin::Confirmed,
    }
}

#[test]
fn abnormal_reports_are_flagged_red() {
    let style = MarkerStyle::for_report(&report(true));
    assert_eq!(style.color, "#dc2626");
    assert_eq!(style.glyph, Some('!'));
    assert_eq!(style.size_px, 16);
}

#[test]
fn normal_reports_use_category_color() {
    let style = MarkerStyle::for_report(&report(false));
    assert_eq!(style.color, category_color(Category::Fuel));
    assert_eq!(style.glyph, None);
}

#[test]
fn popup_formats_price_and_relative_time() {
    let popup = Popup::for_report(&report(false), Locale::Fr, NOW);
    assert_eq!(popup.price, "1 250 DZD");
    assert_eq!(popup.when, "il y a 2 h");
    assert_eq!(popup.summary(), "Huile (5L) · 1 250 DZD · Annaba · il y a 2 h");
}

#[test]
fn click_reports_selection() {
    let selected = Arc::new(Mutex::new(None::<String>));
    let sink = Arc::clone(&selected);
    let handler: SelectHandler = Arc::new(move |r: &PriceReport| {
        *sink.lock().expect("lock") = Some(r.id.clone());
    });
    let marker = Marker::new(Arc::new(report(false)), Locale::En, NOW, Some(handler));
    marker.click();
    assert_eq!(selected.lock().expect("lock").as_deref(), Some("r1"));
    assert_eq!(marker.position(), (36.9, 7.76));
}

#[test]
fn click_without_handler_is_noop() {
    let marker = Marker::new(Arc::new(report(false)), Locale::En, NOW, None);
    marker.click();
    assert_eq!(marker.report_id(), "r1");
}
