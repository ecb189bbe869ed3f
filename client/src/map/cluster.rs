//! Greedy grid clustering in Web Mercator pixel space.
//!
//! Markers are projected to pixels at the requested zoom (world size
//! `256 * 2^zoom`). Each marker joins the nearest cluster whose seed point is
//! within the max radius, found by scanning the 3x3 block of grid cells of
//! side `radius` around it; otherwise it seeds a new cluster. Cluster
//! positions are the mean of their members.

#[cfg(test)]
#[path = "cluster_test.rs"]
mod cluster_test;

use std::collections::HashMap;
use std::f64::consts::PI;

use super::ClusterConfig;
use super::marker::Marker;

pub const TILE_SIZE: f64 = 256.0;
const MAX_LATITUDE: f64 = 85.051_128_78;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PixelPoint {
    pub x: f64,
    pub y: f64,
}

impl PixelPoint {
    #[must_use]
    pub fn distance(self, other: Self) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

#[must_use]
pub fn world_size(zoom: u8) -> f64 {
    TILE_SIZE * 2_f64.powi(i32::from(zoom))
}

/// Latitude/longitude to world pixels. Latitudes are clamped to the Mercator limit.
#[must_use]
pub fn project(latitude: f64, longitude: f64, zoom: u8) -> PixelPoint {
    let size = world_size(zoom);
    let lat = latitude.clamp(-MAX_LATITUDE, MAX_LATITUDE).to_radians();
    PixelPoint {
        x: (longitude + 180.0) / 360.0 * size,
        y: (1.0 - (lat.tan() + 1.0 / lat.cos()).ln() / PI) / 2.0 * size,
    }
}

#[must_use]
pub fn unproject(point: PixelPoint, zoom: u8) -> (f64, f64) {
    let size = world_size(zoom);
    let longitude = point.x / size * 360.0 - 180.0;
    let n = PI - 2.0 * PI * point.y / size;
    (n.sinh().atan().to_degrees(), longitude)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BadgeTier {
    Small,
    Medium,
    Large,
}

impl BadgeTier {
    #[must_use]
    pub fn for_count(count: usize) -> Self {
        match count {
            0..=50 => Self::Small,
            51..=100 => Self::Medium,
            _ => Self::Large,
        }
    }

    #[must_use]
    pub fn diameter_px(self) -> u32 {
        match self {
            Self::Small => 40,
            Self::Medium => 50,
            Self::Large => 60,
        }
    }

    #[must_use]
    pub fn font_px(self) -> u32 {
        match self {
            Self::Small | Self::Medium => 16,
            Self::Large => 18,
        }
    }

    #[must_use]
    pub fn class_name(self) -> &'static str {
        match self {
            Self::Small => "marker-cluster-small",
            Self::Medium => "marker-cluster-medium",
            Self::Large => "marker-cluster-large",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ClusterBadge {
    pub tier: BadgeTier,
    pub count: usize,
    pub diameter_px: u32,
    pub font_px: u32,
}

impl ClusterBadge {
    #[must_use]
    pub fn for_count(count: usize) -> Self {
        let tier = BadgeTier::for_count(count);
        Self { tier, count, diameter_px: tier.diameter_px(), font_px: tier.font_px() }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Cluster {
    pub latitude: f64,
    pub longitude: f64,
    pub report_ids: Vec<String>,
    pub abnormal: usize,
    /// `None` for a lone marker, which renders as itself.
    pub badge: Option<ClusterBadge>,
}

impl Cluster {
    #[must_use]
    pub fn count(&self) -> usize {
        self.report_ids.len()
    }
}

struct Accumulator {
    seed: PixelPoint,
    sum_x: f64,
    sum_y: f64,
    report_ids: Vec<String>,
    abnormal: usize,
}

impl Accumulator {
    fn new(seed: PixelPoint) -> Self {
        Self { seed, sum_x: 0.0, sum_y: 0.0, report_ids: Vec::new(), abnormal: 0 }
    }

    fn push(&mut self, marker: &Marker, point: PixelPoint) {
        self.sum_x += point.x;
        self.sum_y += point.y;
        self.report_ids.push(marker.report_id().to_owned());
        if marker.report().is_abnormal {
            self.abnormal += 1;
        }
    }

    #[allow(clippy::cast_precision_loss)]
    fn finish(self, zoom: u8) -> Cluster {
        let n = self.report_ids.len().max(1) as f64;
        let (latitude, longitude) = unproject(PixelPoint { x: self.sum_x / n, y: self.sum_y / n }, zoom);
        let count = self.report_ids.len();
        Cluster {
            latitude,
            longitude,
            report_ids: self.report_ids,
            abnormal: self.abnormal,
            badge: (count > 1).then(|| ClusterBadge::for_count(count)),
        }
    }
}

#[allow(clippy::cast_possible_truncation)]
fn cell_of(point: PixelPoint, side: f64) -> (i64, i64) {
    ((point.x / side).floor() as i64, (point.y / side).floor() as i64)
}

/// Cluster `markers` as seen at `zoom`. Output is in cluster-creation order.
#[must_use]
pub fn cluster_markers(markers: &[Marker], zoom: u8, config: &ClusterConfig) -> Vec<Cluster> {
    let clustering = zoom < config.disable_clustering_at_zoom;
    let radius = config.max_cluster_radius_px.max(1.0);
    let mut grid: HashMap<(i64, i64), Vec<usize>> = HashMap::new();
    let mut clusters: Vec<Accumulator> = Vec::new();

    for marker in markers {
        let (lat, lon) = marker.position();
        let point = project(lat, lon, zoom);

        let nearest = if clustering { nearest_within(&grid, &clusters, point, radius) } else { None };
        let slot = match nearest {
            Some(slot) => slot,
            None => {
                if clustering {
                    grid.entry(cell_of(point, radius)).or_default().push(clusters.len());
                }
                clusters.push(Accumulator::new(point));
                clusters.len() - 1
            }
        };
        clusters[slot].push(marker, point);
    }

    clusters.into_iter().map(|c| c.finish(zoom)).collect()
}

fn nearest_within(
    grid: &HashMap<(i64, i64), Vec<usize>>,
    clusters: &[Accumulator],
    point: PixelPoint,
    radius: f64,
) -> Option<usize> {
    let (cx, cy) = cell_of(point, radius);
    let mut best: Option<(usize, f64)> = None;
    for dx in -1..=1 {
        for dy in -1..=1 {
            let Some(candidates) = grid.get(&(cx + dx, cy + dy)) else {
                continue;
            };
            for &slot in candidates {
                let d = clusters[slot].seed.distance(point);
                if d <= radius && best.is_none_or(|(_, bd)| d < bd) {
                    best = Some((slot, d));
                }
            }
        }
    }
    best.map(|(slot, _)| slot)
}
