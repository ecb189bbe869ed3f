use std::sync::Arc;

use frames::{Category, Origin, PriceReport};

use super::*;
use crate::util::i18n::Locale;

fn marker(id: &str, latitude: f64, longitude: f64, abnormal: bool) -> Marker {
    let report = PriceReport {
        id: id.to_owned(),
        product_name: "Pain (baguette)".to_owned(),
        price: 15,
        category: Category::Food,
        city: "Alger".to_owned(),
        commune: None,
        latitude,
        longitude,
        reporter_id: "anonymous".to_owned(),
        reporter_name: None,
        timestamp: 0,
        upvotes: 0,
        downvotes: 0,
        is_abnormal: abnormal,
        origin: Origin::Confirmed,
    };
    Marker::new(Arc::new(report), Locale::En, 0, None)
}

#[test]
fn projection_of_origin_is_world_center() {
    let p = project(0.0, 0.0, 0);
    assert!((p.x - 128.0).abs() < 1e-9);
    assert!((p.y - 128.0).abs() < 1e-9);
    assert!((world_size(5) - 8_192.0).abs() < f64::EPSILON);
}

#[test]
fn unproject_inverts_project() {
    let p = project(36.7538, 3.0588, 12);
    let (lat, lon) = unproject(p, 12);
    assert!((lat - 36.7538).abs() < 1e-9);
    assert!((lon - 3.0588).abs() < 1e-9);
}

#[test]
fn extreme_latitudes_are_clamped() {
    let top = project(90.0, 0.0, 3);
    assert!(top.y.is_finite());
    assert!(top.y.abs() < 1e-6);
}

#[test]
fn badge_tiers_at_boundaries() {
    assert_eq!(BadgeTier::for_count(50), BadgeTier::Small);
    assert_eq!(BadgeTier::for_count(51), BadgeTier::Medium);
    assert_eq!(BadgeTier::for_count(100), BadgeTier::Medium);
    assert_eq!(BadgeTier::for_count(101), BadgeTier::Large);

    let small = ClusterBadge::for_count(2);
    assert_eq!((small.diameter_px, small.font_px), (40, 16));
    let medium = ClusterBadge::for_count(75);
    assert_eq!((medium.diameter_px, medium.font_px), (50, 16));
    let large = ClusterBadge::for_count(500);
    assert_eq!((large.diameter_px, large.font_px), (60, 18));
    assert_eq!(large.tier.class_name(), "marker-cluster-large");
}

#[test]
fn nearby_cities_merge_at_country_zoom_and_split_when_zoomed_in() {
    let markers = vec![marker("alger", 36.7538, 3.0588, false), marker("oran", 35.6971, -0.6308, true)];
    let config = ClusterConfig::default();

    let country = cluster_markers(&markers, 5, &config);
    assert_eq!(country.len(), 1);
    assert_eq!(country[0].count(), 2);
    assert_eq!(country[0].abnormal, 1);
    assert_eq!(country[0].badge.map(|b| b.tier), Some(BadgeTier::Small));

    let regional = cluster_markers(&markers, 8, &config);
    assert_eq!(regional.len(), 2);
    assert!(regional.iter().all(|c| c.badge.is_none()));
}

#[test]
fn distant_markers_stay_apart() {
    let markers = vec![marker("alger", 36.7538, 3.0588, false), marker("tam", 22.785, 5.5228, false)];
    let clusters = cluster_markers(&markers, 5, &ClusterConfig::default());
    assert_eq!(clusters.len(), 2);
}

#[test]
fn clustering_disabled_at_threshold_zoom() {
    let markers: Vec<Marker> = (0..5).map(|i| marker(&format!("m{i}"), 36.75, 3.06, false)).collect();
    let config = ClusterConfig::default();
    assert_eq!(cluster_markers(&markers, 15, &config).len(), 1);
    assert_eq!(cluster_markers(&markers, 16, &config).len(), 5);
}

#[test]
fn large_stack_gets_large_badge_at_mean_position() {
    let mut markers: Vec<Marker> = (0..150).map(|i| marker(&format!("m{i}"), 36.0, 3.0, false)).collect();
    markers.push(marker("east", 36.0, 3.1, false));
    markers.push(marker("west", 36.0, 2.9, false));
    let clusters = cluster_markers(&markers, 5, &ClusterConfig::default());
    assert_eq!(clusters.len(), 1);
    assert_eq!(clusters[0].count(), 152);
    assert_eq!(clusters[0].badge.map(|b| b.tier), Some(BadgeTier::Large));
    assert!((clusters[0].longitude - 3.0).abs() < 1e-6);
    assert!((clusters[0].latitude - 36.0).abs() < 1e-6);
}

#[test]
fn empty_input_yields_no_clusters() {
    assert!(cluster_markers(&[], 5, &ClusterConfig::default()).is_empty());
}
