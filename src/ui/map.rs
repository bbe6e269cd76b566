use imgui::{Condition, Ui};
use tracing::warn;

use crate::core::CollisionRecord;
use crate::geo::{Mercator, Topology, TopologyError};

/// Logical map viewport the projection is fitted to once per topology load.
/// Drawing scales this uniformly into whatever size the window has.
const MAP_WIDTH: f64 = 700.0;
const MAP_HEIGHT: f64 = 670.0;

const REGION_FILL: [f32; 4] = [0.73, 0.80, 0.90, 1.0];
const BORDER_COLOR: [f32; 4] = [1.0, 1.0, 1.0, 1.0];
const POINT_COLOR: [f32; 4] = [0.98, 0.12, 0.12, 0.4];
const POINT_RADIUS: f32 = 1.3;

/// Map window: GB region polygons, interior borders, and the collision
/// points of the currently displayed year.
pub struct MapWindow {
    regions: Vec<Vec<[f32; 2]>>,
    borders: Vec<Vec<[f32; 2]>>,
    projection: Option<Mercator>,
    points: Vec<[f32; 2]>,
}

impl MapWindow {
    pub fn new() -> Self {
        Self {
            regions: Vec::new(),
            borders: Vec::new(),
            projection: None,
            points: Vec::new(),
        }
    }

    /// Fit a projection to the named topology object and pre-project its
    /// rings into the logical viewport.
    pub fn set_topology(&mut self, topology: &Topology, object: &str) -> Result<(), TopologyError> {
        let rings = topology.object_rings(object)?;
        let Some(projection) = Mercator::fit_size(MAP_WIDTH, MAP_HEIGHT, &rings) else {
            warn!(object, "topology object has no projectable coordinates");
            self.regions.clear();
            self.borders.clear();
            self.projection = None;
            return Ok(());
        };

        self.regions = rings
            .iter()
            .map(|ring| to_screen(projection.project_ring(ring)))
            .collect();
        self.borders = topology
            .interior_borders()?
            .iter()
            .map(|line| to_screen(projection.project_ring(line)))
            .collect();
        self.projection = Some(projection);
        self.points.clear();
        Ok(())
    }

    /// Re-project the point layer for a newly displayed year. Records
    /// without both coordinates are left off the map.
    pub fn update_points<'a>(&mut self, records: impl Iterator<Item = &'a CollisionRecord>) {
        self.points.clear();
        let Some(projection) = self.projection else {
            return;
        };
        for record in records {
            if let Some((lon, lat)) = record.position() {
                if let Some(p) = projection.project(lon, lat) {
                    self.points.push([p[0] as f32, p[1] as f32]);
                }
            }
        }
    }

    pub fn render(&self, ui: &Ui, is_open: &mut bool, labels: Option<(i32, u32)>) {
        ui.window("Map")
            .size([720.0, 700.0], Condition::FirstUseEver)
            .position([10.0, 30.0], Condition::FirstUseEver)
            .opened(is_open)
            .build(|| {
                if let Some((year, total)) = labels {
                    ui.text(format!("Year: {}", year));
                    ui.text(format!("Fatalities: {}", total));
                } else {
                    ui.text("Year: -");
                    ui.text("Fatalities: -");
                }

                if self.regions.is_empty() {
                    ui.text_disabled("Load GB boundaries to draw the map (File menu)");
                    return;
                }

                let avail = ui.content_region_avail();
                let origin = ui.cursor_screen_pos();
                let scale = (avail[0] / MAP_WIDTH as f32)
                    .min(avail[1] / MAP_HEIGHT as f32)
                    .max(0.01);

                let place = |p: &[f32; 2]| [origin[0] + p[0] * scale, origin[1] + p[1] * scale];
                let draw_list = ui.get_window_draw_list();

                for ring in &self.regions {
                    if ring.len() < 3 {
                        continue;
                    }
                    let points: Vec<[f32; 2]> = ring.iter().map(&place).collect();
                    draw_list
                        .add_polyline(points, REGION_FILL)
                        .filled(true)
                        .build();
                }

                for line in &self.borders {
                    for pair in line.windows(2) {
                        draw_list
                            .add_line(place(&pair[0]), place(&pair[1]), BORDER_COLOR)
                            .thickness(0.5)
                            .build();
                    }
                }

                for point in &self.points {
                    draw_list
                        .add_circle(place(point), POINT_RADIUS * scale.max(1.0), POINT_COLOR)
                        .filled(true)
                        .num_segments(8)
                        .build();
                }

                ui.dummy([avail[0], avail[1]]);
            });
    }
}

impl Default for MapWindow {
    fn default() -> Self {
        Self::new()
    }
}

fn to_screen(projected: Vec<[f64; 2]>) -> Vec<[f32; 2]> {
    projected
        .into_iter()
        .map(|p| [p[0] as f32, p[1] as f32])
        .collect()
}
