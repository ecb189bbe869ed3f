//! Price report entities and their REST wire shapes.

#[cfg(test)]
#[path = "report_test.rs"]
mod report_test;

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::timestamp::{WireTimestamp, format_rfc3339};
use crate::{WireError, id_string, non_empty};

/// Fixed product category enumeration.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Food,
    Beverages,
    Household,
    Electronics,
    Clothing,
    Health,
    Fuel,
    Construction,
    Agriculture,
    Services,
}

impl Category {
    pub const ALL: [Self; 10] = [
        Self::Food,
        Self::Beverages,
        Self::Household,
        Self::Electronics,
        Self::Clothing,
        Self::Health,
        Self::Fuel,
        Self::Construction,
        Self::Agriculture,
        Self::Services,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Food => "food",
            Self::Beverages => "beverages",
            Self::Household => "household",
            Self::Electronics => "electronics",
            Self::Clothing => "clothing",
            Self::Health => "health",
            Self::Fuel => "fuel",
            Self::Construction => "construction",
            Self::Agriculture => "agriculture",
            Self::Services => "services",
        }
    }

    /// Parse a wire category, case-insensitively.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        let lowered = raw.trim().to_ascii_lowercase();
        Self::ALL.into_iter().find(|c| c.as_str() == lowered)
    }

    /// Parse a wire category, falling back to [`Category::Food`].
    #[must_use]
    pub fn parse_lossy(raw: &str) -> Self {
        Self::parse(raw).unwrap_or(Self::Food)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether a report has been acknowledged by the backend.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Origin {
    /// Bundled reference data shown before the first backend fetch.
    Seed,
    /// Synthesized locally after a backend failure; never confirmed.
    Local,
    /// Received from the backend.
    #[default]
    Confirmed,
}

/// A single observed price.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PriceReport {
    pub id: String,
    pub product_name: String,
    /// Integer DZD.
    pub price: i64,
    pub category: Category,
    pub city: String,
    pub commune: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    pub reporter_id: String,
    pub reporter_name: Option<String>,
    /// Milliseconds since the Unix epoch.
    pub timestamp: i64,
    pub upvotes: u32,
    pub downvotes: u32,
    /// Set once when the report is drafted; never recomputed.
    pub is_abnormal: bool,
    pub origin: Origin,
}

impl PriceReport {
    /// Materialize a draft under the given identity with zeroed counters.
    #[must_use]
    pub fn from_draft(draft: ReportDraft, id: String, origin: Origin) -> Self {
        Self {
            id,
            product_name: draft.product_name,
            price: draft.price,
            category: draft.category,
            city: draft.city,
            commune: draft.commune,
            latitude: draft.latitude,
            longitude: draft.longitude,
            reporter_id: draft.reporter_id,
            reporter_name: draft.reporter_name,
            timestamp: draft.timestamp,
            upvotes: 0,
            downvotes: 0,
            is_abnormal: draft.is_abnormal,
            origin,
        }
    }
}

/// A report before the backend has assigned it an identity.
#[derive(Clone, Debug, PartialEq)]
pub struct ReportDraft {
    pub product_name: String,
    pub price: i64,
    pub category: Category,
    pub city: String,
    pub commune: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    pub reporter_id: String,
    pub reporter_name: Option<String>,
    pub timestamp: i64,
    pub is_abnormal: bool,
}

/// Vote direction for `POST /api/reports/:id/vote`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoteDirection {
    Up,
    Down,
}

impl VoteDirection {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Up => "up",
            Self::Down => "down",
        }
    }

    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "up" => Some(Self::Up),
            "down" => Some(Self::Down),
            _ => None,
        }
    }
}

/// Authoritative counters returned by the vote endpoint.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
pub struct VoteCounts {
    pub upvotes: u32,
    pub downvotes: u32,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct WireDraft<'a> {
    product_name: &'a str,
    price: i64,
    category: Category,
    city: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    commune: Option<&'a str>,
    latitude: f64,
    longitude: f64,
    reporter_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    reporter_name: Option<&'a str>,
    timestamp: String,
    is_abnormal: bool,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireReport {
    #[serde(default)]
    id: Option<Value>,
    #[serde(default, alias = "product_name")]
    product_name: Option<String>,
    #[serde(default)]
    price: Option<f64>,
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    city: Option<String>,
    #[serde(default)]
    commune: Option<String>,
    #[serde(default)]
    latitude: Option<f64>,
    #[serde(default)]
    longitude: Option<f64>,
    #[serde(default, alias = "reporter_id")]
    reporter_id: Option<Value>,
    #[serde(default, alias = "reporter_name")]
    reporter_name: Option<String>,
    #[serde(default)]
    timestamp: Option<WireTimestamp>,
    #[serde(default)]
    upvotes: Option<u32>,
    #[serde(default)]
    downvotes: Option<u32>,
    #[serde(default, alias = "is_abnormal")]
    is_abnormal: Option<bool>,
}

/// Serialize a draft as the `POST /api/reports` body.
#[must_use]
pub fn encode_draft(draft: &ReportDraft) -> Value {
    let wire = WireDraft {
        product_name: &draft.product_name,
        price: draft.price,
        category: draft.category,
        city: &draft.city,
        commune: draft.commune.as_deref(),
        latitude: draft.latitude,
        longitude: draft.longitude,
        reporter_id: &draft.reporter_id,
        reporter_name: draft.reporter_name.as_deref(),
        timestamp: format_rfc3339(draft.timestamp),
        is_abnormal: draft.is_abnormal,
    };
    serde_json::to_value(wire).unwrap_or(Value::Null)
}

/// Normalize one backend report into a [`PriceReport`] tagged `Confirmed`.
///
/// Required: `id`, `productName`, `price`, `latitude`, `longitude`.
/// Everything else has a documented default.
///
/// # Errors
///
/// Returns [`WireError::MissingField`] for absent required fields and
/// [`WireError::Decode`] for structurally invalid payloads.
#[allow(clippy::cast_possible_truncation)]
pub fn parse_report(value: &Value, received_at_ms: i64) -> Result<PriceReport, WireError> {
    let wire: WireReport = serde_json::from_value(value.clone())?;
    let id = wire.id.as_ref().and_then(id_string).ok_or(WireError::MissingField("id"))?;
    let product_name = non_empty(wire.product_name).ok_or(WireError::MissingField("productName"))?;
    let price = wire.price.ok_or(WireError::MissingField("price"))?.round() as i64;
    let latitude = wire.latitude.ok_or(WireError::MissingField("latitude"))?;
    let longitude = wire.longitude.ok_or(WireError::MissingField("longitude"))?;
    let timestamp = match wire.timestamp {
        Some(ts) => ts.into_millis()?,
        None => received_at_ms,
    };

    Ok(PriceReport {
        id,
        product_name,
        price,
        category: wire
            .category
            .as_deref()
            .map_or(Category::Food, Category::parse_lossy),
        city: non_empty(wire.city).unwrap_or_default(),
        commune: non_empty(wire.commune),
        latitude,
        longitude,
        reporter_id: wire
            .reporter_id
            .as_ref()
            .and_then(id_string)
            .unwrap_or_else(|| "anonymous".to_owned()),
        reporter_name: non_empty(wire.reporter_name),
        timestamp,
        upvotes: wire.upvotes.unwrap_or(0),
        downvotes: wire.downvotes.unwrap_or(0),
        is_abnormal: wire.is_abnormal.unwrap_or(false),
        origin: Origin::Confirmed,
    })
}

/// Normalize a `{ reports: [...] }` list body, skipping malformed entries.
///
/// A bare JSON array is accepted as well.
#[must_use]
pub fn parse_report_list(body: &Value, received_at_ms: i64) -> Vec<PriceReport> {
    let rows = match body {
        Value::Array(rows) => Some(rows),
        other => other.get("reports").and_then(Value::as_array),
    };
    rows.map(|rows| {
        rows.iter()
            .filter_map(|row| parse_report(row, received_at_ms).ok())
            .collect()
    })
    .unwrap_or_default()
}

/// Body of `POST /api/reports/:id/vote`.
#[must_use]
pub fn vote_body(direction: VoteDirection) -> Value {
    serde_json::json!({ "voteType": direction.as_str() })
}

/// Normalize the vote endpoint response.
///
/// # Errors
///
/// Returns [`WireError::Decode`] if either counter is missing.
pub fn parse_vote_counts(body: &Value) -> Result<VoteCounts, WireError> {
    Ok(serde_json::from_value(body.clone())?)
}
