//! In-memory `MapBackend`.
//!
//! Models the parts of a hosted map library the renderer relies on: named
//! containers that can host one map each, a document-level stylesheet set,
//! tile layers, and clustering overlays holding markers. Failures can be
//! injected per operation to exercise the renderer's error paths.

#[cfg(test)]
#[path = "headless_test.rs"]
mod headless_test;

use std::collections::{HashMap, HashSet};

use super::cluster::{Cluster, cluster_markers};
use super::marker::Marker;
use super::{
    ClusterConfig, DEFAULT_CONTAINER, MapBackend, MapError, MapId, OverlayId, Stylesheet, TileLayer, Viewpoint,
};

/// Backend operations that can be made to fail once.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HeadlessOp {
    InsertStylesheet,
    CreateMap,
    AddTileLayer,
    CreateOverlay,
    AddMarkers,
    ClearMarkers,
}

#[derive(Debug)]
struct MapInstance {
    container: String,
    view: Viewpoint,
    tile_layers: Vec<TileLayer>,
}

#[derive(Debug)]
struct Overlay {
    map: MapId,
    config: ClusterConfig,
    markers: Vec<Marker>,
}

#[derive(Debug, Default)]
pub struct HeadlessMap {
    containers: HashSet<String>,
    stylesheets: Vec<Stylesheet>,
    maps: HashMap<MapId, MapInstance>,
    overlays: HashMap<OverlayId, Overlay>,
    next_id: u64,
    maps_created: usize,
    failures: HashSet<HeadlessOp>,
}

impl HeadlessMap {
    /// A document holding the default `price-map` container.
    #[must_use]
    pub fn new() -> Self {
        Self::with_containers([DEFAULT_CONTAINER])
    }

    /// A document with the given container ids.
    #[must_use]
    pub fn with_containers<I, S>(containers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self { containers: containers.into_iter().map(Into::into).collect(), ..Self::default() }
    }

    /// Make the next call of `op` fail with [`MapError::Backend`].
    pub fn fail_next(&mut self, op: HeadlessOp) {
        self.failures.insert(op);
    }

    fn check(&mut self, op: HeadlessOp) -> Result<(), MapError> {
        if self.failures.remove(&op) {
            return Err(MapError::Backend(format!("injected failure: {op:?}")));
        }
        Ok(())
    }

    fn allocate(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    #[must_use]
    pub fn stylesheet_ids(&self) -> Vec<&'static str> {
        self.stylesheets.iter().map(|s| s.id).collect()
    }

    #[must_use]
    pub fn live_maps(&self) -> usize {
        self.maps.len()
    }

    #[must_use]
    pub fn live_overlays(&self) -> usize {
        self.overlays.len()
    }

    /// Total maps ever constructed, including disposed ones.
    #[must_use]
    pub fn maps_created(&self) -> usize {
        self.maps_created
    }

    #[must_use]
    pub fn view(&self, map: MapId) -> Option<Viewpoint> {
        self.maps.get(&map).map(|m| m.view)
    }

    #[must_use]
    pub fn tile_layers(&self, map: MapId) -> &[TileLayer] {
        self.maps.get(&map).map_or(&[], |m| m.tile_layers.as_slice())
    }

    #[must_use]
    pub fn markers(&self, overlay: OverlayId) -> &[Marker] {
        self.overlays.get(&overlay).map_or(&[], |o| o.markers.as_slice())
    }

    /// Clusters as the overlay would draw them at `zoom`.
    #[must_use]
    pub fn clusters(&self, overlay: OverlayId, zoom: u8) -> Vec<Cluster> {
        self.overlays
            .get(&overlay)
            .map(|o| cluster_markers(&o.markers, zoom, &o.config))
            .unwrap_or_default()
    }

    /// Simulate a click on the marker for `report_id`. Returns whether one was found.
    pub fn click(&self, overlay: OverlayId, report_id: &str) -> bool {
        match self.markers(overlay).iter().find(|m| m.report_id() == report_id) {
            Some(marker) => {
                marker.click();
                true
            }
            None => false,
        }
    }
}

impl MapBackend for HeadlessMap {
    fn has_stylesheet(&self, id: &str) -> bool {
        self.stylesheets.iter().any(|s| s.id == id)
    }

    fn insert_stylesheet(&mut self, sheet: &Stylesheet) -> Result<(), MapError> {
        self.check(HeadlessOp::InsertStylesheet)?;
        if !self.has_stylesheet(sheet.id) {
            self.stylesheets.push(*sheet);
        }
        Ok(())
    }

    fn create_map(&mut self, container: &str, view: &Viewpoint) -> Result<MapId, MapError> {
        self.check(HeadlessOp::CreateMap)?;
        if !self.containers.contains(container) {
            return Err(MapError::ContainerNotFound(container.to_owned()));
        }
        if self.maps.values().any(|m| m.container == container) {
            return Err(MapError::ContainerBusy(container.to_owned()));
        }
        let id = MapId(self.allocate());
        self.maps.insert(id, MapInstance { container: container.to_owned(), view: *view, tile_layers: Vec::new() });
        self.maps_created += 1;
        Ok(id)
    }

    fn add_tile_layer(&mut self, map: MapId, layer: &TileLayer) -> Result<(), MapError> {
        self.check(HeadlessOp::AddTileLayer)?;
        let instance = self.maps.get_mut(&map).ok_or(MapError::UnknownMap(map))?;
        instance.tile_layers.push(layer.clone());
        Ok(())
    }

    fn create_overlay(&mut self, map: MapId, config: &ClusterConfig) -> Result<OverlayId, MapError> {
        self.check(HeadlessOp::CreateOverlay)?;
        if !self.maps.contains_key(&map) {
            return Err(MapError::UnknownMap(map));
        }
        let id = OverlayId(self.allocate());
        self.overlays.insert(id, Overlay { map, config: *config, markers: Vec::new() });
        Ok(id)
    }

    fn add_markers(&mut self, overlay: OverlayId, markers: Vec<Marker>) -> Result<(), MapError> {
        self.check(HeadlessOp::AddMarkers)?;
        let target = self.overlays.get_mut(&overlay).ok_or(MapError::UnknownOverlay(overlay))?;
        target.markers.extend(markers);
        Ok(())
    }

    fn clear_markers(&mut self, overlay: OverlayId) -> Result<(), MapError> {
        self.check(HeadlessOp::ClearMarkers)?;
        let target = self.overlays.get_mut(&overlay).ok_or(MapError::UnknownOverlay(overlay))?;
        target.markers.clear();
        Ok(())
    }

    fn marker_count(&self, overlay: OverlayId) -> usize {
        self.markers(overlay).len()
    }

    fn remove_overlay(&mut self, map: MapId, overlay: OverlayId) -> Result<(), MapError> {
        match self.overlays.get(&overlay) {
            Some(o) if o.map == map => {
                self.overlays.remove(&overlay);
                Ok(())
            }
            _ => Err(MapError::UnknownOverlay(overlay)),
        }
    }

    fn dispose_map(&mut self, map: MapId) -> Result<(), MapError> {
        if self.maps.remove(&map).is_none() {
            return Err(MapError::UnknownMap(map));
        }
        self.overlays.retain(|_, o| o.map != map);
        Ok(())
    }
}
