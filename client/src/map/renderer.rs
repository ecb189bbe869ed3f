//! Batched marker rendering over a `MapBackend`.
//!
//! DESIGN
//! ======
//! The renderer owns one mounted map plus its clustering overlay, acquired
//! and released together through `MountedMap`. Status moves
//! `Loading -> Ready` on a successful `initialize` and `Loading -> Error` on
//! any failure; `retry` is the only way out of `Error`.
//!
//! A redraw clears the overlay and hands back a `RedrawJob` that adds
//! markers in fixed-size batches. Every redraw bumps a generation counter,
//! and a job whose generation is no longer current stops without touching
//! the overlay. `redraw_all` drives a job to completion, yielding to the
//! runtime between batches.
//!
//! ERROR HANDLING
//! ==============
//! Initialization errors are logged and recorded as `MapStatus::Error`.
//! Clear and add failures during a redraw are logged and dropped; the status
//! does not change.

#[cfg(test)]
#[path = "renderer_test.rs"]
mod renderer_test;

use std::sync::Arc;

use frames::{Category, PriceReport};
use tracing::{debug, info, warn};

use super::marker::{Marker, SelectHandler};
use super::{MapBackend, MapError, MapId, MapSettings, OverlayId, STYLESHEETS};
use crate::state::reports::filter_by_category;
use crate::util::format::now_ms;
use crate::util::i18n::Locale;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum MapStatus {
    #[default]
    Loading,
    Ready,
    Error,
}

/// A map and its overlay, owned as one unit.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MountedMap {
    pub map: MapId,
    pub overlay: OverlayId,
}

impl MountedMap {
    /// Create the map, attach tiles and the clustering overlay.
    ///
    /// A map created before a later step fails is disposed before returning.
    ///
    /// # Errors
    ///
    /// Returns the first backend error encountered.
    pub fn acquire<B: MapBackend>(backend: &mut B, settings: &MapSettings) -> Result<Self, MapError> {
        let map = backend.create_map(&settings.container, &settings.view)?;
        let attached = backend
            .add_tile_layer(map, &settings.tiles)
            .and_then(|()| backend.create_overlay(map, &settings.cluster));
        match attached {
            Ok(overlay) => Ok(Self { map, overlay }),
            Err(e) => {
                if let Err(dispose) = backend.dispose_map(map) {
                    warn!(error = %dispose, "failed to dispose partially created map");
                }
                Err(e)
            }
        }
    }

    /// Clear markers, drop the overlay and dispose the map. Best effort.
    pub fn release<B: MapBackend>(self, backend: &mut B) {
        if let Err(e) = backend.clear_markers(self.overlay) {
            debug!(error = %e, "clear markers during release failed");
        }
        if let Err(e) = backend.remove_overlay(self.map, self.overlay) {
            debug!(error = %e, "remove overlay during release failed");
        }
        if let Err(e) = backend.dispose_map(self.map) {
            warn!(error = %e, "dispose map failed");
        }
    }
}

/// Result of one batch step.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BatchProgress {
    /// More batches remain.
    Pending,
    Complete,
    /// A newer redraw or a teardown took over.
    Superseded,
    /// The backend rejected a batch; the job is abandoned.
    Failed,
    /// The renderer was not ready, so nothing was scheduled.
    Skipped,
}

/// An in-flight redraw.
#[derive(Debug)]
pub struct RedrawJob {
    generation: u64,
    overlay: OverlayId,
    reports: Vec<Arc<PriceReport>>,
    cursor: usize,
    locale: Locale,
    now_ms: i64,
}

impl RedrawJob {
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.reports.len()
    }

    /// Markers added so far.
    #[must_use]
    pub fn added(&self) -> usize {
        self.cursor
    }
}

/// Number of reports a redraw with `category` would display.
#[must_use]
pub fn displayed_count(reports: &[PriceReport], category: Option<Category>) -> usize {
    filter_by_category(reports, category).count()
}

pub struct MarkerRenderer<B: MapBackend> {
    backend: B,
    settings: MapSettings,
    mounted: Option<MountedMap>,
    status: MapStatus,
    last_error: Option<MapError>,
    generation: u64,
    on_select: Option<SelectHandler>,
    locale: Locale,
}

impl<B: MapBackend> MarkerRenderer<B> {
    #[must_use]
    pub fn new(backend: B, settings: MapSettings) -> Self {
        Self {
            backend,
            settings,
            mounted: None,
            status: MapStatus::Loading,
            last_error: None,
            generation: 0,
            on_select: None,
            locale: Locale::default(),
        }
    }

    #[must_use]
    pub fn status(&self) -> MapStatus {
        self.status
    }

    #[must_use]
    pub fn last_error(&self) -> Option<&MapError> {
        self.last_error.as_ref()
    }

    #[must_use]
    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    #[must_use]
    pub fn overlay(&self) -> Option<OverlayId> {
        self.mounted.map(|m| m.overlay)
    }

    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Handler attached to markers created by later redraws.
    pub fn set_on_select(&mut self, handler: SelectHandler) {
        self.on_select = Some(handler);
    }

    pub fn set_locale(&mut self, locale: Locale) {
        self.locale = locale;
    }

    /// Mount the map. No-op when one is already mounted.
    pub fn initialize(&mut self) -> MapStatus {
        // a failed mount stays failed until `retry`
        if self.mounted.is_some() || self.status == MapStatus::Error {
            return self.status;
        }
        match self.mount() {
            Ok(mounted) => {
                info!(map = ?mounted.map, overlay = ?mounted.overlay, "map initialized");
                self.mounted = Some(mounted);
                self.status = MapStatus::Ready;
                self.last_error = None;
            }
            Err(e) => {
                warn!(error = %e, container = %self.settings.container, "map initialization failed");
                self.status = MapStatus::Error;
                self.last_error = Some(e);
            }
        }
        self.status
    }

    fn mount(&mut self) -> Result<MountedMap, MapError> {
        for sheet in &STYLESHEETS {
            if !self.backend.has_stylesheet(sheet.id) {
                self.backend.insert_stylesheet(sheet)?;
            }
        }
        MountedMap::acquire(&mut self.backend, &self.settings)
    }

    /// Release the mounted map. Safe to call any number of times.
    pub fn teardown(&mut self) {
        self.generation += 1;
        if let Some(mounted) = self.mounted.take() {
            mounted.release(&mut self.backend);
            self.status = MapStatus::Loading;
            debug!("map torn down");
        }
    }

    pub fn retry(&mut self) -> MapStatus {
        self.teardown();
        self.status = MapStatus::Loading;
        self.last_error = None;
        self.initialize()
    }

    /// Clear the overlay and start a redraw of the filtered reports.
    ///
    /// Returns `None` unless the renderer is `Ready`.
    pub fn redraw(&mut self, reports: &[PriceReport], category: Option<Category>) -> Option<RedrawJob> {
        self.redraw_at(reports, category, now_ms())
    }

    /// [`redraw`](Self::redraw) with an explicit clock for popup timestamps.
    pub fn redraw_at(
        &mut self,
        reports: &[PriceReport],
        category: Option<Category>,
        now_ms: i64,
    ) -> Option<RedrawJob> {
        if self.status != MapStatus::Ready {
            return None;
        }
        let mounted = self.mounted?;
        self.generation += 1;
        if let Err(e) = self.backend.clear_markers(mounted.overlay) {
            warn!(error = %e, "clear markers failed; redraw dropped");
            return None;
        }
        let reports: Vec<Arc<PriceReport>> =
            filter_by_category(reports, category).cloned().map(Arc::new).collect();
        debug!(generation = self.generation, count = reports.len(), "redraw scheduled");
        Some(RedrawJob {
            generation: self.generation,
            overlay: mounted.overlay,
            reports,
            cursor: 0,
            locale: self.locale,
            now_ms,
        })
    }

    /// Add the next batch of markers for `job`.
    pub fn run_batch(&mut self, job: &mut RedrawJob) -> BatchProgress {
        let same_overlay = self.mounted.map(|m| m.overlay) == Some(job.overlay);
        if job.generation != self.generation || !same_overlay || self.status != MapStatus::Ready {
            debug!(generation = job.generation, current = self.generation, "redraw superseded");
            return BatchProgress::Superseded;
        }
        if job.cursor >= job.reports.len() {
            return BatchProgress::Complete;
        }

        let end = (job.cursor + self.settings.batch_size.max(1)).min(job.reports.len());
        let markers: Vec<Marker> = job.reports[job.cursor..end]
            .iter()
            .map(|report| Marker::new(Arc::clone(report), job.locale, job.now_ms, self.on_select.clone()))
            .collect();
        if let Err(e) = self.backend.add_markers(job.overlay, markers) {
            warn!(error = %e, generation = job.generation, "marker batch failed");
            return BatchProgress::Failed;
        }
        job.cursor = end;
        if end == job.reports.len() {
            BatchProgress::Complete
        } else {
            BatchProgress::Pending
        }
    }

    /// Redraw and run every batch, yielding between them.
    pub async fn redraw_all(&mut self, reports: &[PriceReport], category: Option<Category>) -> BatchProgress {
        let Some(mut job) = self.redraw(reports, category) else {
            return BatchProgress::Skipped;
        };
        loop {
            match self.run_batch(&mut job) {
                BatchProgress::Pending => tokio::task::yield_now().await,
                done => return done,
            }
        }
    }

    /// Markers currently on the overlay.
    #[must_use]
    pub fn rendered_marker_count(&self) -> usize {
        self.mounted.map_or(0, |m| self.backend.marker_count(m.overlay))
    }
}

impl<B: MapBackend> Drop for MarkerRenderer<B> {
    fn drop(&mut self) {
        self.teardown();
    }
}
