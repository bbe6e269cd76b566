use std::f64::consts::FRAC_PI_4;

use crate::geo::Ring;

/// Spherical Mercator projection fitted to a viewport.
///
/// `fit_size` mirrors the usual charting-library behavior: a uniform scale
/// chosen so the given geometry fills the viewport in its tighter dimension,
/// centered in the other. Latitudes are clamped away from the poles, where
/// Mercator diverges.
#[derive(Debug, Clone, Copy)]
pub struct Mercator {
    scale: f64,
    translate: [f64; 2],
}

const MAX_LATITUDE: f64 = 85.0;

impl Mercator {
    /// Fit the projection so `rings` fills a `width` x `height` viewport.
    /// Returns `None` when the rings carry no finite coordinates.
    pub fn fit_size(width: f64, height: f64, rings: &[Ring]) -> Option<Self> {
        let mut min = [f64::INFINITY, f64::INFINITY];
        let mut max = [f64::NEG_INFINITY, f64::NEG_INFINITY];

        for point in rings.iter().flatten() {
            let Some([x, y]) = raw_mercator(point[0], point[1]) else {
                continue;
            };
            min[0] = min[0].min(x);
            min[1] = min[1].min(y);
            max[0] = max[0].max(x);
            max[1] = max[1].max(y);
        }

        if !min[0].is_finite() || !max[0].is_finite() {
            return None;
        }

        let span_x = (max[0] - min[0]).max(f64::EPSILON);
        let span_y = (max[1] - min[1]).max(f64::EPSILON);
        let scale = (width / span_x).min(height / span_y);

        let translate = [
            (width - scale * (min[0] + max[0])) / 2.0,
            (height - scale * (min[1] + max[1])) / 2.0,
        ];

        Some(Self { scale, translate })
    }

    /// Project (longitude, latitude) degrees into viewport coordinates,
    /// y growing downwards. `None` for non-finite input.
    pub fn project(&self, longitude: f64, latitude: f64) -> Option<[f64; 2]> {
        let [x, y] = raw_mercator(longitude, latitude)?;
        Some([
            self.scale * x + self.translate[0],
            self.scale * y + self.translate[1],
        ])
    }

    /// Project a whole ring, dropping non-finite points.
    pub fn project_ring(&self, ring: &Ring) -> Vec<[f64; 2]> {
        ring.iter()
            .filter_map(|p| self.project(p[0], p[1]))
            .collect()
    }
}

/// Unit-scale Mercator: x in radians, y inverted so north is up-screen.
fn raw_mercator(longitude: f64, latitude: f64) -> Option<[f64; 2]> {
    if !longitude.is_finite() || !latitude.is_finite() {
        return None;
    }
    let lambda = longitude.to_radians();
    let phi = latitude.clamp(-MAX_LATITUDE, MAX_LATITUDE).to_radians();
    Some([lambda, -(FRAC_PI_4 + phi / 2.0).tan().ln()])
}
