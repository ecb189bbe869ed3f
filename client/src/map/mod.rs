//! Geo-marker rendering.
//!
//! SYSTEM CONTEXT
//! ==============
//! `MarkerRenderer` drives any `MapBackend` (the hosted map library seam):
//! it installs stylesheets, mounts one map plus one clustering overlay, and
//! redraws report markers in batches. `HeadlessMap` is the in-memory backend
//! used by the CLI and by tests; it clusters for real via `cluster`.

pub mod cluster;
pub mod headless;
pub mod marker;
pub mod renderer;

pub use cluster::{BadgeTier, Cluster, ClusterBadge};
pub use headless::HeadlessMap;
pub use marker::{Marker, MarkerStyle, Popup, SelectHandler};
pub use renderer::{BatchProgress, MapStatus, MarkerRenderer, RedrawJob};

#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum MapError {
    #[error("map container not found: {0}")]
    ContainerNotFound(String),
    #[error("map container already initialized: {0}")]
    ContainerBusy(String),
    #[error("unknown map handle {0:?}")]
    UnknownMap(MapId),
    #[error("unknown overlay handle {0:?}")]
    UnknownOverlay(OverlayId),
    #[error("map backend failure: {0}")]
    Backend(String),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MapId(pub u64);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct OverlayId(pub u64);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Stylesheet {
    pub id: &'static str,
    pub href: &'static str,
}

pub const STYLESHEETS: [Stylesheet; 3] = [
    Stylesheet { id: "leaflet-css", href: "https://unpkg.com/leaflet@1.9.4/dist/leaflet.css" },
    Stylesheet { id: "markercluster-css", href: "https://unpkg.com/leaflet.markercluster@1.5.3/dist/MarkerCluster.css" },
    Stylesheet {
        id: "markercluster-default-css",
        href: "https://unpkg.com/leaflet.markercluster@1.5.3/dist/MarkerCluster.Default.css",
    },
];

/// Initial map center and zoom.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewpoint {
    pub latitude: f64,
    pub longitude: f64,
    pub zoom: u8,
}

impl Default for Viewpoint {
    /// Algeria, whole-country zoom.
    fn default() -> Self {
        Self { latitude: 28.0339, longitude: 1.6596, zoom: 5 }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TileLayer {
    pub url_template: String,
    pub attribution: String,
    pub max_zoom: u8,
}

impl Default for TileLayer {
    fn default() -> Self {
        Self {
            url_template: "https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png".to_owned(),
            attribution: "&copy; OpenStreetMap contributors".to_owned(),
            max_zoom: 18,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ClusterConfig {
    pub max_cluster_radius_px: f64,
    /// At this zoom and above every marker is shown on its own.
    pub disable_clustering_at_zoom: u8,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self { max_cluster_radius_px: 120.0, disable_clustering_at_zoom: 16 }
    }
}

/// Everything needed to mount a map.
#[derive(Clone, Debug, PartialEq)]
pub struct MapSettings {
    pub container: String,
    pub view: Viewpoint,
    pub tiles: TileLayer,
    pub cluster: ClusterConfig,
    pub batch_size: usize,
}

pub const DEFAULT_CONTAINER: &str = "price-map";
pub const DEFAULT_BATCH_SIZE: usize = 10_000;

impl Default for MapSettings {
    fn default() -> Self {
        Self {
            container: DEFAULT_CONTAINER.to_owned(),
            view: Viewpoint::default(),
            tiles: TileLayer::default(),
            cluster: ClusterConfig::default(),
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }
}

/// The surface a map library exposes to the renderer.
///
/// Handles are opaque ids so the renderer never holds references into the
/// backend; disposing a map invalidates its overlays.
pub trait MapBackend {
    fn has_stylesheet(&self, id: &str) -> bool;
    fn insert_stylesheet(&mut self, sheet: &Stylesheet) -> Result<(), MapError>;
    fn create_map(&mut self, container: &str, view: &Viewpoint) -> Result<MapId, MapError>;
    fn add_tile_layer(&mut self, map: MapId, layer: &TileLayer) -> Result<(), MapError>;
    fn create_overlay(&mut self, map: MapId, config: &ClusterConfig) -> Result<OverlayId, MapError>;
    fn add_markers(&mut self, overlay: OverlayId, markers: Vec<Marker>) -> Result<(), MapError>;
    fn clear_markers(&mut self, overlay: OverlayId) -> Result<(), MapError>;
    fn marker_count(&self, overlay: OverlayId) -> usize;
    fn remove_overlay(&mut self, map: MapId, overlay: OverlayId) -> Result<(), MapError>;
    fn dispose_map(&mut self, map: MapId) -> Result<(), MapError>;
}
