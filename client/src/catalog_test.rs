use super::*;

#[test]
fn abnormal_thresholds_around_reference() {
    assert!(is_abnormal_price(126, 100));
    assert!(!is_abnormal_price(125, 100));
    assert!(!is_abnormal_price(124, 100));
    assert!(is_abnormal_price(74, 100));
    assert!(!is_abnormal_price(75, 100));
    assert!(!is_abnormal_price(76, 100));
}

#[test]
fn unknown_product_is_its_own_reference() {
    assert_eq!(reference_price("Truffes (1kg)", 90_000), 90_000);
    assert!(!classify("Truffes (1kg)", 90_000));
}

#[test]
fn known_product_uses_catalog_average() {
    assert_eq!(reference_price("Tomate (1kg)", 500), 120);
    assert!(classify("Tomate (1kg)", 151));
    assert!(!classify("Tomate (1kg)", 150));
}

#[test]
fn find_city_ignores_case() {
    assert_eq!(find_city("oran").map(|c| c.name), Some("Oran"));
    assert_eq!(find_city("SÉTIF").map(|c| c.name), Some("Sétif"));
    assert!(find_city("Paris").is_none());
}

#[test]
fn every_category_has_a_product_and_a_color() {
    for category in Category::ALL {
        assert!(!products_in(category).is_empty(), "no product for {category}");
        assert!(category_color(category).starts_with('#'));
        assert!(!category_label(category).is_empty());
    }
}

#[test]
fn product_ids_are_unique() {
    let mut ids: Vec<&str> = PRODUCTS.iter().map(|p| p.id).collect();
    ids.sort_unstable();
    ids.dedup();
    assert_eq!(ids.len(), PRODUCTS.len());
}

#[test]
fn seed_reports_are_tagged_and_classified() {
    let now = 1_700_000_000_000;
    let seeds = seed_reports(now);
    assert_eq!(seeds.len(), SEED_ROWS.len());
    assert!(seeds.iter().all(|r| r.origin == Origin::Seed));
    assert!(seeds.iter().all(|r| r.timestamp < now));

    let huile = seeds.iter().find(|r| r.product_name == "Huile (5L)").expect("huile seed");
    assert!(huile.is_abnormal);
    let pain = seeds.iter().find(|r| r.product_name == "Pain (baguette)").expect("pain seed");
    assert!(!pain.is_abnormal);
}
