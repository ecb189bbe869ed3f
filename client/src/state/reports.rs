//! Report store: the client-side cache of price reports.
//!
//! DESIGN
//! ======
//! The store starts from the bundled seed set and merges backend results in
//! by id, last writer wins. Writes go to the backend first; when that fails,
//! create and vote fall back to a local result so the user never waits on an
//! unreachable server. Locally synthesized reports are tagged
//! `Origin::Local` and reconcile only through later fetches.
//!
//! Classification (`is_abnormal`) happens once, in `build_draft`, and is
//! carried unchanged from then on.

#[cfg(test)]
#[path = "reports_test.rs"]
mod reports_test;

use std::collections::{BTreeMap, HashMap, HashSet};

use frames::{Category, Origin, PriceReport, ReportDraft, User, VoteCounts, VoteDirection};
use rand::Rng;
use tracing::{debug, info, warn};

use crate::catalog;
use crate::net::api::{ApiError, ReportFilters, ReportsBackend};

/// Half-width of the coordinate jitter applied to new reports, in degrees.
pub const JITTER_DEGREES: f64 = 0.025;
pub const ALERT_LIMIT: usize = 10;
pub const ANONYMOUS_REPORTER_ID: &str = "anonymous";
pub const ANONYMOUS_REPORTER_NAME: &str = "Anonyme";

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum DraftError {
    #[error("product name is required")]
    MissingProduct,
    #[error("price must be positive, got {0}")]
    InvalidPrice(i64),
    #[error("unknown city: {0}")]
    UnknownCity(String),
}

/// User-entered fields for a new report.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DraftInput {
    pub product_name: String,
    pub price: i64,
    pub city: String,
    pub commune: Option<String>,
    pub reporter_name: Option<String>,
}

/// Build a classified, jittered draft from user input.
///
/// # Errors
///
/// Returns [`DraftError`] for an empty product, a non-positive price or a city
/// that is not in the catalog.
pub fn build_draft(input: &DraftInput, user: Option<&User>, now_ms: i64) -> Result<ReportDraft, DraftError> {
    let mut rng = rand::rng();
    let jitter = (
        rng.random_range(-JITTER_DEGREES..=JITTER_DEGREES),
        rng.random_range(-JITTER_DEGREES..=JITTER_DEGREES),
    );
    build_draft_with_jitter(input, user, now_ms, jitter)
}

/// [`build_draft`] with a caller-chosen `(lat, lon)` offset.
///
/// # Errors
///
/// See [`build_draft`].
pub fn build_draft_with_jitter(
    input: &DraftInput,
    user: Option<&User>,
    now_ms: i64,
    jitter: (f64, f64),
) -> Result<ReportDraft, DraftError> {
    let product_name = input.product_name.trim();
    if product_name.is_empty() {
        return Err(DraftError::MissingProduct);
    }
    if input.price <= 0 {
        return Err(DraftError::InvalidPrice(input.price));
    }
    let city = catalog::find_city(&input.city).ok_or_else(|| DraftError::UnknownCity(input.city.clone()))?;

    let reporter_name = non_blank(input.reporter_name.as_deref())
        .or_else(|| user.map(|u| u.name.clone()).filter(|n| !n.is_empty()))
        .unwrap_or_else(|| ANONYMOUS_REPORTER_NAME.to_owned());

    Ok(ReportDraft {
        product_name: product_name.to_owned(),
        price: input.price,
        category: catalog::find_product(product_name).map_or(Category::Food, |p| p.category),
        city: city.name.to_owned(),
        commune: non_blank(input.commune.as_deref()),
        latitude: city.latitude + jitter.0.clamp(-JITTER_DEGREES, JITTER_DEGREES),
        longitude: city.longitude + jitter.1.clamp(-JITTER_DEGREES, JITTER_DEGREES),
        reporter_id: user.map_or_else(|| ANONYMOUS_REPORTER_ID.to_owned(), |u| u.id.clone()),
        reporter_name: Some(reporter_name),
        timestamp: now_ms,
        is_abnormal: catalog::classify(product_name, input.price),
    })
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value.map(str::trim).filter(|v| !v.is_empty()).map(str::to_owned)
}

/// Keyed union by id. Incoming entries replace existing ones and come first;
/// existing entries the backend did not return are kept after them.
#[must_use]
pub fn merge_reports(existing: Vec<PriceReport>, incoming: Vec<PriceReport>) -> Vec<PriceReport> {
    let mut index: HashMap<String, usize> = HashMap::with_capacity(existing.len() + incoming.len());
    let mut merged: Vec<PriceReport> = Vec::with_capacity(existing.len() + incoming.len());
    for report in incoming {
        match index.get(&report.id) {
            Some(&slot) => merged[slot] = report,
            None => {
                index.insert(report.id.clone(), merged.len());
                merged.push(report);
            }
        }
    }
    for report in existing {
        if !index.contains_key(&report.id) {
            index.insert(report.id.clone(), merged.len());
            merged.push(report);
        }
    }
    merged
}

/// Reports in `category`, or all of them when `category` is `None`.
pub fn filter_by_category(reports: &[PriceReport], category: Option<Category>) -> impl Iterator<Item = &PriceReport> {
    reports.iter().filter(move |r| category.is_none_or(|c| r.category == c))
}

/// How a vote was recorded.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VoteOutcome {
    /// Counters replaced with the backend's authoritative values.
    Confirmed(VoteCounts),
    /// Backend unreachable; counters incremented locally.
    Local(VoteCounts),
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ReportStats {
    pub total: usize,
    pub cities: usize,
    pub products: usize,
    pub abnormal: usize,
}

#[derive(Clone, Debug, Default)]
pub struct ReportStore {
    reports: Vec<PriceReport>,
    dismissed: HashSet<String>,
    loading: bool,
    last_error: Option<String>,
}

impl ReportStore {
    #[must_use]
    pub fn new(seed: Vec<PriceReport>) -> Self {
        Self { reports: merge_reports(Vec::new(), seed), ..Self::default() }
    }

    #[must_use]
    pub fn reports(&self) -> &[PriceReport] {
        &self.reports
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&PriceReport> {
        self.reports.iter().find(|r| r.id == id)
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    #[must_use]
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn merge(&mut self, incoming: Vec<PriceReport>) {
        self.reports = merge_reports(std::mem::take(&mut self.reports), incoming);
    }

    /// Fetch from the backend and merge. On failure the current set is kept
    /// and the error message retained in [`ReportStore::last_error`].
    ///
    /// # Errors
    ///
    /// Returns the backend error after recording it.
    pub async fn fetch(&mut self, backend: &dyn ReportsBackend, filters: &ReportFilters) -> Result<usize, ApiError> {
        self.loading = true;
        let result = backend.list_reports(filters).await;
        self.loading = false;
        match result {
            Ok(incoming) => {
                let count = incoming.len();
                self.merge(incoming);
                self.last_error = None;
                info!(count, total = self.reports.len(), "reports fetched");
                Ok(count)
            }
            Err(e) => {
                warn!(error = %e, "report fetch failed; keeping current reports");
                self.last_error = Some(e.to_string());
                Err(e)
            }
        }
    }

    /// Submit a draft and prepend the result. Falls back to a local report
    /// with id `price-<ms>` if the backend refuses or is unreachable.
    pub async fn create(&mut self, backend: &dyn ReportsBackend, draft: ReportDraft, now_ms: i64) -> PriceReport {
        let report = match backend.create_report(&draft).await {
            Ok(report) => report,
            Err(e) => {
                warn!(error = %e, "report create failed; keeping it locally");
                let id = self.local_id(now_ms);
                PriceReport::from_draft(draft, id, Origin::Local)
            }
        };
        self.reports.retain(|r| r.id != report.id);
        self.reports.insert(0, report.clone());
        report
    }

    /// `price-<ms>`, bumped forward past any id already in the store.
    fn local_id(&self, now_ms: i64) -> String {
        let mut ms = now_ms;
        loop {
            let id = format!("price-{ms}");
            if self.get(&id).is_none() {
                return id;
            }
            ms += 1;
        }
    }

    /// Record a vote. Unknown ids change nothing and return `None`.
    pub async fn vote(
        &mut self,
        backend: &dyn ReportsBackend,
        id: &str,
        direction: VoteDirection,
    ) -> Option<VoteOutcome> {
        let Some(current) = self.get(id).map(|r| VoteCounts { upvotes: r.upvotes, downvotes: r.downvotes }) else {
            debug!(id, "vote for unknown report ignored");
            return None;
        };
        let outcome = match backend.vote(id, direction).await {
            Ok(counts) => VoteOutcome::Confirmed(counts),
            Err(e) => {
                warn!(error = %e, id, "vote failed; counting it locally");
                let mut counts = current;
                match direction {
                    VoteDirection::Up => counts.upvotes = counts.upvotes.saturating_add(1),
                    VoteDirection::Down => counts.downvotes = counts.downvotes.saturating_add(1),
                }
                VoteOutcome::Local(counts)
            }
        };
        let (VoteOutcome::Confirmed(counts) | VoteOutcome::Local(counts)) = outcome;
        if let Some(report) = self.reports.iter_mut().find(|r| r.id == id) {
            report.upvotes = counts.upvotes;
            report.downvotes = counts.downvotes;
        }
        Some(outcome)
    }

    /// Delete a report. Reports the backend never saw are removed locally.
    ///
    /// # Errors
    ///
    /// Returns the backend error and keeps the report.
    pub async fn delete(&mut self, backend: &dyn ReportsBackend, id: &str) -> Result<bool, ApiError> {
        let Some(origin) = self.get(id).map(|r| r.origin) else {
            return Ok(false);
        };
        if origin == Origin::Confirmed {
            backend.delete_report(id).await?;
        } else {
            debug!(id, ?origin, "removing unsynced report locally");
        }
        self.reports.retain(|r| r.id != id);
        self.dismissed.remove(id);
        Ok(true)
    }

    #[must_use]
    pub fn filtered(&self, category: Option<Category>) -> Vec<&PriceReport> {
        filter_by_category(&self.reports, category).collect()
    }

    /// Case-insensitive substring match on product or city. Blank terms match everything.
    #[must_use]
    pub fn search(&self, term: &str) -> Vec<&PriceReport> {
        let needle = term.trim().to_lowercase();
        self.reports
            .iter()
            .filter(|r| {
                needle.is_empty()
                    || r.product_name.to_lowercase().contains(&needle)
                    || r.city.to_lowercase().contains(&needle)
            })
            .collect()
    }

    #[must_use]
    pub fn category_counts(&self) -> BTreeMap<Category, usize> {
        let mut counts = BTreeMap::new();
        for report in &self.reports {
            *counts.entry(report.category).or_insert(0) += 1;
        }
        counts
    }

    /// First [`ALERT_LIMIT`] abnormal reports that have not been dismissed.
    #[must_use]
    pub fn alerts(&self) -> Vec<&PriceReport> {
        self.reports
            .iter()
            .filter(|r| r.is_abnormal && !self.dismissed.contains(&r.id))
            .take(ALERT_LIMIT)
            .collect()
    }

    /// Hide an alert. Returns `false` for ids that are not abnormal reports.
    pub fn dismiss_alert(&mut self, id: &str) -> bool {
        if self.get(id).is_some_and(|r| r.is_abnormal) {
            self.dismissed.insert(id.to_owned())
        } else {
            false
        }
    }

    #[must_use]
    pub fn stats(&self) -> ReportStats {
        let cities: HashSet<&str> = self.reports.iter().map(|r| r.city.as_str()).collect();
        let products: HashSet<&str> = self.reports.iter().map(|r| r.product_name.as_str()).collect();
        ReportStats {
            total: self.reports.len(),
            cities: cities.len(),
            products: products.len(),
            abnormal: self.reports.iter().filter(|r| r.is_abnormal).count(),
        }
    }
}
