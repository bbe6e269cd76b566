use std::collections::{BTreeMap, HashMap, HashSet};

use serde::Deserialize;
use thiserror::Error;
use tracing::info;

use crate::geo::Ring;

#[derive(Debug, Error)]
pub enum TopologyError {
    #[error("failed to parse topology JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("topology has no object named '{0}'")]
    MissingObject(String),

    #[error("arc index {0} out of range ({1} arcs)")]
    ArcOutOfRange(i64, usize),
}

/// Quantization transform: integer deltas scale+translate back to degrees.
#[derive(Debug, Clone, Deserialize)]
struct Transform {
    scale: [f64; 2],
    translate: [f64; 2],
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type")]
enum Geometry {
    GeometryCollection { geometries: Vec<Geometry> },
    Polygon { arcs: Vec<Vec<i64>> },
    MultiPolygon { arcs: Vec<Vec<Vec<i64>>> },
}

/// A TopoJSON topology, as published for the ONS GB region boundaries.
///
/// Only the subset this application draws is supported: polygonal objects
/// with optionally quantized (delta-encoded) arcs. Decoding reverses the
/// quantization, stitches arcs back into rings, and exposes the arcs shared
/// between neighbouring regions as interior border lines.
#[derive(Debug, Deserialize)]
pub struct Topology {
    #[serde(default)]
    transform: Option<Transform>,
    arcs: Vec<Vec<[f64; 2]>>,
    objects: HashMap<String, Geometry>,
}

impl Topology {
    pub fn from_slice(bytes: &[u8]) -> Result<Self, TopologyError> {
        let topo: Topology = serde_json::from_slice(bytes)?;
        info!(
            arcs = topo.arcs.len(),
            objects = topo.objects.len(),
            "topology parsed"
        );
        Ok(topo)
    }

    /// Names of the objects in this topology.
    pub fn object_names(&self) -> impl Iterator<Item = &str> {
        self.objects.keys().map(String::as_str)
    }

    /// All polygon rings of the named object, in (lon, lat) degrees.
    /// Outer and inner rings are not distinguished; each is one closed ring.
    pub fn object_rings(&self, name: &str) -> Result<Vec<Ring>, TopologyError> {
        let geometry = self
            .objects
            .get(name)
            .ok_or_else(|| TopologyError::MissingObject(name.to_string()))?;

        let mut rings = Vec::new();
        self.collect_rings(geometry, &mut rings)?;
        Ok(rings)
    }

    /// Border lines between adjacent regions: every arc referenced by two
    /// or more distinct geometries, decoded as a standalone polyline.
    pub fn interior_borders(&self) -> Result<Vec<Ring>, TopologyError> {
        let mut usage: BTreeMap<usize, u32> = BTreeMap::new();

        for geometry in self.objects.values() {
            for leaf in leaf_geometries(geometry) {
                // count each arc once per geometry, however many rings use it
                let distinct: HashSet<usize> = referenced_arcs(leaf)
                    .into_iter()
                    .map(arc_offset)
                    .collect::<Result<_, _>>()
                    .map_err(|i| TopologyError::ArcOutOfRange(i, self.arcs.len()))?;
                for arc in distinct {
                    *usage.entry(arc).or_insert(0) += 1;
                }
            }
        }

        let mut borders = Vec::new();
        for (arc, count) in usage {
            if count >= 2 {
                borders.push(self.decode_arc(arc)?);
            }
        }
        Ok(borders)
    }

    fn collect_rings(&self, geometry: &Geometry, out: &mut Vec<Ring>) -> Result<(), TopologyError> {
        match geometry {
            Geometry::GeometryCollection { geometries } => {
                for g in geometries {
                    self.collect_rings(g, out)?;
                }
            }
            Geometry::Polygon { arcs } => {
                for ring in arcs {
                    out.push(self.stitch_ring(ring)?);
                }
            }
            Geometry::MultiPolygon { arcs } => {
                for polygon in arcs {
                    for ring in polygon {
                        out.push(self.stitch_ring(ring)?);
                    }
                }
            }
        }
        Ok(())
    }

    /// Join a ring's arcs into one coordinate sequence. A negative index
    /// `~i` means arc `i` traversed backwards; each arc after the first
    /// starts on the previous arc's endpoint, which is dropped.
    fn stitch_ring(&self, arc_indexes: &[i64]) -> Result<Ring, TopologyError> {
        let mut ring: Ring = Vec::new();

        for &signed in arc_indexes {
            let reversed = signed < 0;
            let offset = arc_offset(signed)
                .map_err(|i| TopologyError::ArcOutOfRange(i, self.arcs.len()))?;
            let mut points = self.decode_arc(offset)?;
            if reversed {
                points.reverse();
            }
            let skip = usize::from(!ring.is_empty());
            ring.extend(points.into_iter().skip(skip));
        }

        Ok(ring)
    }

    /// Decode one arc to absolute (lon, lat) coordinates.
    fn decode_arc(&self, index: usize) -> Result<Ring, TopologyError> {
        let arc = self
            .arcs
            .get(index)
            .ok_or(TopologyError::ArcOutOfRange(index as i64, self.arcs.len()))?;

        match &self.transform {
            Some(t) => {
                let mut x = 0.0;
                let mut y = 0.0;
                Ok(arc
                    .iter()
                    .map(|&[dx, dy]| {
                        x += dx;
                        y += dy;
                        [x * t.scale[0] + t.translate[0], y * t.scale[1] + t.translate[1]]
                    })
                    .collect())
            }
            None => Ok(arc.clone()),
        }
    }
}

/// Flatten nested collections down to the polygon geometries.
fn leaf_geometries(geometry: &Geometry) -> Vec<&Geometry> {
    match geometry {
        Geometry::GeometryCollection { geometries } => {
            geometries.iter().flat_map(leaf_geometries).collect()
        }
        other => vec![other],
    }
}

/// Every signed arc index referenced by one leaf geometry.
fn referenced_arcs(geometry: &Geometry) -> Vec<i64> {
    match geometry {
        Geometry::GeometryCollection { geometries } => {
            geometries.iter().flat_map(referenced_arcs).collect()
        }
        Geometry::Polygon { arcs } => arcs.iter().flatten().copied().collect(),
        Geometry::MultiPolygon { arcs } => {
            arcs.iter().flatten().flatten().copied().collect()
        }
    }
}

/// Resolve a signed arc index (`~i` encodes a reversed traversal of `i`)
/// to the arc array offset.
fn arc_offset(signed: i64) -> Result<usize, i64> {
    let offset = if signed < 0 { !signed } else { signed };
    usize::try_from(offset).map_err(|_| signed)
}

#[cfg(test)]
mod tests {
    use super::*;

    // Two unit squares sharing one vertical edge (arc 1), quantized onto a
    // half-degree grid anchored at (10, 20). Arc layout, in unit terms:
    //   0: left square's open boundary  (1,1) -> (0,1) -> (0,0) -> (1,0)
    //   1: shared edge                  (1,0) -> (1,1)
    //   2: right square's open boundary (1,0) -> (2,0) -> (2,1) -> (1,1)
    // Left ring is [1, 0]; right ring is [2, ~1] so the shared edge is
    // walked backwards.
    const TWO_SQUARES: &str = r#"{
        "type": "Topology",
        "transform": {"scale": [0.5, 0.5], "translate": [10.0, 20.0]},
        "arcs": [
            [[2, 2], [-2, 0], [0, -2], [2, 0]],
            [[2, 0], [0, 2]],
            [[2, 0], [2, 0], [0, 2], [-2, 0]]
        ],
        "objects": {
            "regions": {
                "type": "GeometryCollection",
                "geometries": [
                    {"type": "Polygon", "arcs": [[1, 0]]},
                    {"type": "Polygon", "arcs": [[2, -2]]}
                ]
            }
        }
    }"#;

    #[test]
    fn decodes_quantized_arcs_into_degrees() {
        let topo = Topology::from_slice(TWO_SQUARES.as_bytes()).unwrap();
        let rings = topo.object_rings("regions").unwrap();
        assert_eq!(rings.len(), 2);

        // left ring: arc 1 then arc 0, junction point deduplicated
        let left = &rings[0];
        assert_eq!(
            left,
            &vec![
                [11.0, 20.0],
                [11.0, 21.0],
                [10.0, 21.0],
                [10.0, 20.0],
                [11.0, 20.0],
            ]
        );
    }

    #[test]
    fn negative_arc_index_reverses_traversal() {
        let topo = Topology::from_slice(TWO_SQUARES.as_bytes()).unwrap();
        let rings = topo.object_rings("regions").unwrap();

        // right ring uses -2 (= ~1): the shared edge walked backwards
        let right = &rings[1];
        assert_eq!(
            right,
            &vec![
                [11.0, 20.0],
                [12.0, 20.0],
                [12.0, 21.0],
                [11.0, 21.0],
                [11.0, 20.0],
            ]
        );
    }

    #[test]
    fn shared_arc_becomes_an_interior_border() {
        let topo = Topology::from_slice(TWO_SQUARES.as_bytes()).unwrap();
        let borders = topo.interior_borders().unwrap();

        // only arc 1 is referenced by both polygons
        assert_eq!(borders.len(), 1);
        assert_eq!(borders[0], vec![[11.0, 20.0], [11.0, 21.0]]);
    }

    #[test]
    fn unquantized_arcs_pass_through_unchanged() {
        let raw = r#"{
            "type": "Topology",
            "arcs": [[[0.0, 0.0], [1.5, 2.5]]],
            "objects": {
                "line": {"type": "Polygon", "arcs": [[0]]}
            }
        }"#;
        let topo = Topology::from_slice(raw.as_bytes()).unwrap();
        let rings = topo.object_rings("line").unwrap();
        assert_eq!(rings[0], vec![[0.0, 0.0], [1.5, 2.5]]);
    }

    #[test]
    fn missing_object_is_a_typed_error() {
        let topo = Topology::from_slice(TWO_SQUARES.as_bytes()).unwrap();
        let err = topo.object_rings("nope").unwrap_err();
        assert!(matches!(err, TopologyError::MissingObject(name) if name == "nope"));
    }

    #[test]
    fn arc_index_out_of_range_is_a_typed_error() {
        let raw = r#"{
            "type": "Topology",
            "arcs": [[[0.0, 0.0], [1.0, 1.0]]],
            "objects": {
                "bad": {"type": "Polygon", "arcs": [[7]]}
            }
        }"#;
        let topo = Topology::from_slice(raw.as_bytes()).unwrap();
        let err = topo.object_rings("bad").unwrap_err();
        assert!(matches!(err, TopologyError::ArcOutOfRange(7, 1)));
    }
}
