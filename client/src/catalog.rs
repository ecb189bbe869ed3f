//! Static reference tables: category presentation, products with their
//! average prices, and the cities a report can be filed against.
//!
//! The product averages are the reference used to flag abnormal prices.
//! The seed reports give the dashboard something to show before the first
//! backend fetch completes.

#[cfg(test)]
#[path = "catalog_test.rs"]
mod catalog_test;

use frames::{Category, Origin, PriceReport};

/// Ratio above the reference price past which a report is flagged.
pub const ABNORMAL_HIGH_RATIO: f64 = 1.25;
/// Ratio below the reference price past which a report is flagged.
pub const ABNORMAL_LOW_RATIO: f64 = 0.75;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Product {
    pub id: &'static str,
    pub name: &'static str,
    pub category: Category,
    /// Integer DZD.
    pub average_price: i64,
    pub unit: &'static str,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct City {
    pub name: &'static str,
    pub latitude: f64,
    pub longitude: f64,
    pub communes: &'static [&'static str],
}

#[must_use]
pub fn category_label(category: Category) -> &'static str {
    match category {
        Category::Food => "Alimentation",
        Category::Beverages => "Boissons",
        Category::Household => "Ménage",
        Category::Electronics => "Électronique",
        Category::Clothing => "Vêtements",
        Category::Health => "Santé",
        Category::Fuel => "Carburant",
        Category::Construction => "Construction",
        Category::Agriculture => "Agriculture",
        Category::Services => "Services",
    }
}

/// Marker and badge color for a category.
#[must_use]
pub fn category_color(category: Category) -> &'static str {
    match category {
        Category::Food => "#22c55e",
        Category::Beverages => "#3b82f6",
        Category::Household => "#a855f7",
        Category::Electronics => "#6366f1",
        Category::Clothing => "#ec4899",
        Category::Health => "#14b8a6",
        Category::Fuel => "#f97316",
        Category::Construction => "#78716c",
        Category::Agriculture => "#84cc16",
        Category::Services => "#eab308",
    }
}

macro_rules! product {
    ($id:literal, $name:literal, $cat:ident, $avg:literal, $unit:literal) => {
        Product { id: $id, name: $name, category: Category::$cat, average_price: $avg, unit: $unit }
    };
}

pub const PRODUCTS: &[Product] = &[
    product!("p-pain", "Pain (baguette)", Food, 15, "pièce"),
    product!("p-lait", "Lait (1L)", Food, 25, "sachet"),
    product!("p-tomate", "Tomate (1kg)", Food, 120, "kg"),
    product!("p-pdt", "Pomme de terre (1kg)", Food, 80, "kg"),
    product!("p-oignon", "Oignon (1kg)", Food, 70, "kg"),
    product!("p-huile", "Huile (5L)", Food, 650, "bidon"),
    product!("p-sucre", "Sucre (1kg)", Food, 95, "kg"),
    product!("p-semoule", "Semoule (10kg)", Food, 1000, "sac"),
    product!("p-poulet", "Poulet (1kg)", Food, 420, "kg"),
    product!("p-viande", "Viande bovine (1kg)", Food, 2400, "kg"),
    product!("p-oeufs", "Œufs (30)", Food, 550, "plateau"),
    product!("p-cafe", "Café (250g)", Food, 300, "paquet"),
    product!("p-eau", "Eau minérale (1.5L)", Beverages, 40, "bouteille"),
    product!("p-jus", "Jus (1L)", Beverages, 150, "bouteille"),
    product!("p-soda", "Soda (2L)", Beverages, 170, "bouteille"),
    product!("p-lessive", "Lessive (1kg)", Household, 350, "paquet"),
    product!("p-vaisselle", "Liquide vaisselle (1L)", Household, 200, "bouteille"),
    product!("p-smartphone", "Smartphone (entrée de gamme)", Electronics, 25_000, "pièce"),
    product!("p-ampoule", "Ampoule LED", Electronics, 250, "pièce"),
    product!("p-tshirt", "T-shirt", Clothing, 1200, "pièce"),
    product!("p-baskets", "Chaussures de sport", Clothing, 6500, "paire"),
    product!("p-paracetamol", "Paracétamol (boîte)", Health, 150, "boîte"),
    product!("p-essence", "Essence (1L)", Fuel, 45, "litre"),
    product!("p-gasoil", "Gasoil (1L)", Fuel, 29, "litre"),
    product!("p-butane", "Bouteille de gaz butane", Fuel, 225, "bouteille"),
    product!("p-ciment", "Ciment (50kg)", Construction, 1100, "sac"),
    product!("p-brique", "Brique", Construction, 25, "pièce"),
    product!("p-engrais", "Engrais (50kg)", Agriculture, 4500, "sac"),
    product!("p-coiffeur", "Coupe de cheveux", Services, 400, "prestation"),
    product!("p-taxi", "Course taxi urbain", Services, 200, "course"),
];

pub const CITIES: &[City] = &[
    City { name: "Alger", latitude: 36.7538, longitude: 3.0588, communes: &["Bab El Oued", "Hussein Dey", "Kouba", "Bir Mourad Raïs", "El Harrach"] },
    City { name: "Oran", latitude: 35.6971, longitude: -0.6308, communes: &["Es Senia", "Bir El Djir", "Arzew"] },
    City { name: "Constantine", latitude: 36.365, longitude: 6.6147, communes: &["El Khroub", "Aïn Smara", "Hamma Bouziane"] },
    City { name: "Annaba", latitude: 36.9, longitude: 7.7667, communes: &["El Bouni", "El Hadjar"] },
    City { name: "Blida", latitude: 36.47, longitude: 2.8277, communes: &["Boufarik", "Ouled Yaïch"] },
    City { name: "Sétif", latitude: 36.19, longitude: 5.41, communes: &["El Eulma", "Aïn Arnat"] },
    City { name: "Batna", latitude: 35.5559, longitude: 6.1741, communes: &["Barika", "Tazoult"] },
    City { name: "Tlemcen", latitude: 34.8828, longitude: -1.3167, communes: &["Mansourah", "Maghnia"] },
    City { name: "Béjaïa", latitude: 36.7509, longitude: 5.0567, communes: &["Akbou", "Amizour"] },
    City { name: "Tizi Ouzou", latitude: 36.7169, longitude: 4.0497, communes: &["Azazga", "Draâ Ben Khedda"] },
    City { name: "Biskra", latitude: 34.8504, longitude: 5.7281, communes: &["Tolga", "Sidi Okba"] },
    City { name: "Djelfa", latitude: 34.6704, longitude: 3.2504, communes: &["Aïn Oussera", "Messaad"] },
    City { name: "Ouargla", latitude: 31.9539, longitude: 5.3249, communes: &["Hassi Messaoud", "Rouissat"] },
    City { name: "Ghardaïa", latitude: 32.4909, longitude: 3.6735, communes: &["Metlili", "Berriane"] },
    City { name: "Béchar", latitude: 31.6238, longitude: -2.2162, communes: &["Kenadsa", "Abadla"] },
    City { name: "Tamanrasset", latitude: 22.785, longitude: 5.5228, communes: &["Abalessa", "In Amguel"] },
];

/// Exact-name product lookup.
#[must_use]
pub fn find_product(name: &str) -> Option<&'static Product> {
    PRODUCTS.iter().find(|p| p.name == name)
}

/// Case-insensitive city lookup.
#[must_use]
pub fn find_city(name: &str) -> Option<&'static City> {
    let wanted = name.trim().to_lowercase();
    CITIES.iter().find(|c| c.name.to_lowercase() == wanted)
}

#[must_use]
pub fn products_in(category: Category) -> Vec<&'static Product> {
    PRODUCTS.iter().filter(|p| p.category == category).collect()
}

/// Reference price for classification: the catalog average when the product
/// is known, otherwise the submitted price itself.
#[must_use]
pub fn reference_price(product_name: &str, price: i64) -> i64 {
    find_product(product_name).map_or(price, |p| p.average_price)
}

#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn is_abnormal_price(price: i64, reference: i64) -> bool {
    let price = price as f64;
    let reference = reference as f64;
    price > reference * ABNORMAL_HIGH_RATIO || price < reference * ABNORMAL_LOW_RATIO
}

/// Classify a submitted price against the catalog.
#[must_use]
pub fn classify(product_name: &str, price: i64) -> bool {
    is_abnormal_price(price, reference_price(product_name, price))
}

struct SeedRow {
    product: &'static str,
    price: i64,
    city: &'static str,
    commune: Option<&'static str>,
    reporter: &'static str,
    hours_ago: i64,
    upvotes: u32,
    downvotes: u32,
}

const SEED_ROWS: &[SeedRow] = &[
    SeedRow { product: "Tomate (1kg)", price: 150, city: "Alger", commune: Some("Kouba"), reporter: "Ahmed B.", hours_ago: 2, upvotes: 12, downvotes: 1 },
    SeedRow { product: "Tomate (1kg)", price: 100, city: "Oran", commune: None, reporter: "Karim L.", hours_ago: 1, upvotes: 8, downvotes: 0 },
    SeedRow { product: "Lait (1L)", price: 25, city: "Constantine", commune: Some("El Khroub"), reporter: "Fatima Z.", hours_ago: 5, upvotes: 20, downvotes: 2 },
    SeedRow { product: "Huile (5L)", price: 900, city: "Annaba", commune: None, reporter: "Yacine M.", hours_ago: 3, upvotes: 4, downvotes: 6 },
    SeedRow { product: "Pomme de terre (1kg)", price: 75, city: "Blida", commune: Some("Boufarik"), reporter: "Samira K.", hours_ago: 8, upvotes: 6, downvotes: 0 },
    SeedRow { product: "Poulet (1kg)", price: 450, city: "Sétif", commune: Some("El Eulma"), reporter: "Nadir H.", hours_ago: 12, upvotes: 9, downvotes: 1 },
    SeedRow { product: "Essence (1L)", price: 45, city: "Batna", commune: None, reporter: "Amine R.", hours_ago: 24, upvotes: 15, downvotes: 0 },
    SeedRow { product: "Sucre (1kg)", price: 140, city: "Tlemcen", commune: Some("Maghnia"), reporter: "Lamia D.", hours_ago: 6, upvotes: 3, downvotes: 5 },
    SeedRow { product: "Semoule (10kg)", price: 1050, city: "Béjaïa", commune: Some("Akbou"), reporter: "Sofiane T.", hours_ago: 30, upvotes: 7, downvotes: 1 },
    SeedRow { product: "Viande bovine (1kg)", price: 2600, city: "Tizi Ouzou", commune: None, reporter: "Meriem A.", hours_ago: 4, upvotes: 11, downvotes: 2 },
    SeedRow { product: "Œufs (30)", price: 380, city: "Biskra", commune: Some("Tolga"), reporter: "Walid S.", hours_ago: 10, upvotes: 2, downvotes: 3 },
    SeedRow { product: "Bouteille de gaz butane", price: 225, city: "Djelfa", commune: None, reporter: "Hocine B.", hours_ago: 48, upvotes: 13, downvotes: 0 },
    SeedRow { product: "Eau minérale (1.5L)", price: 60, city: "Ouargla", commune: Some("Hassi Messaoud"), reporter: "Imane G.", hours_ago: 7, upvotes: 5, downvotes: 1 },
    SeedRow { product: "Ciment (50kg)", price: 1150, city: "Ghardaïa", commune: None, reporter: "Rachid O.", hours_ago: 72, upvotes: 4, downvotes: 0 },
    SeedRow { product: "Paracétamol (boîte)", price: 150, city: "Béchar", commune: None, reporter: "Nassima F.", hours_ago: 20, upvotes: 6, downvotes: 0 },
    SeedRow { product: "Eau minérale (1.5L)", price: 80, city: "Tamanrasset", commune: None, reporter: "Moussa I.", hours_ago: 15, upvotes: 9, downvotes: 2 },
    SeedRow { product: "Pain (baguette)", price: 15, city: "Alger", commune: Some("Bab El Oued"), reporter: "Sarah N.", hours_ago: 1, upvotes: 18, downvotes: 0 },
    SeedRow { product: "Course taxi urbain", price: 250, city: "Oran", commune: Some("Bir El Djir"), reporter: "Mehdi C.", hours_ago: 9, upvotes: 3, downvotes: 1 },
];

/// Bundled reports shown before the first fetch, timestamped relative to `now_ms`.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn seed_reports(now_ms: i64) -> Vec<PriceReport> {
    SEED_ROWS
        .iter()
        .enumerate()
        .filter_map(|(i, row)| {
            let city = find_city(row.city)?;
            // Spread same-city seeds so they do not stack on one pixel.
            let offset = ((i % 5) as f64 - 2.0) * 0.01;
            Some(PriceReport {
                id: format!("seed-{}", i + 1),
                product_name: row.product.to_owned(),
                price: row.price,
                category: find_product(row.product).map_or(Category::Food, |p| p.category),
                city: city.name.to_owned(),
                commune: row.commune.map(str::to_owned),
                latitude: city.latitude + offset,
                longitude: city.longitude - offset,
                reporter_id: format!("user-{}", i + 1),
                reporter_name: Some(row.reporter.to_owned()),
                timestamp: now_ms - row.hours_ago * 3_600_000,
                upvotes: row.upvotes,
                downvotes: row.downvotes,
                is_abnormal: classify(row.product, row.price),
                origin: Origin::Seed,
            })
        })
        .collect()
}
