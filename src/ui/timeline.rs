use imgui::{Condition, StyleColor, Ui};

/// Line chart of fatal collisions per year, with a marker on the currently
/// displayed year.
pub struct YearTimelineWindow {
    series: Vec<(i32, u32)>,
    max_count: u32,
}

const LINE_COLOR: [f32; 4] = [0.73, 0.73, 0.73, 1.0];
const MARKER_COLOR: [f32; 4] = [0.98, 0.12, 0.12, 1.0];
const MARKER_RADIUS: f32 = 4.0;
const AXIS_TEXT: [f32; 4] = [0.6, 0.6, 0.6, 0.9];
const PLOT_HEIGHT: f32 = 220.0;

impl YearTimelineWindow {
    pub fn new() -> Self {
        Self {
            series: Vec::new(),
            max_count: 0,
        }
    }

    pub fn set_series(&mut self, series: Vec<(i32, u32)>) {
        self.max_count = series.iter().map(|&(_, c)| c).max().unwrap_or(0);
        self.series = series;
    }

    pub fn render(&self, ui: &Ui, is_open: &mut bool, current_year: Option<i32>) {
        ui.window("Collisions by Year")
            .size([520.0, 300.0], Condition::FirstUseEver)
            .position([740.0, 30.0], Condition::FirstUseEver)
            .opened(is_open)
            .build(|| {
                if self.series.is_empty() {
                    ui.text("No data");
                    return;
                }

                let size = [ui.content_region_avail()[0], PLOT_HEIGHT];
                let draw_list = ui.get_window_draw_list();
                let cursor_pos = ui.cursor_screen_pos();
                let pos_min = cursor_pos;
                let pos_max = [cursor_pos[0] + size[0], cursor_pos[1] + size[1]];

                draw_list
                    .add_rect(pos_min, pos_max, ui.style_color(StyleColor::FrameBg))
                    .filled(true)
                    .build();

                let first_year = self.series[0].0;
                let last_year = self.series[self.series.len() - 1].0;
                let x_of = |year: i32| self.year_to_x(year, first_year, last_year, pos_min, pos_max);
                let y_of = |count: u32| self.count_to_y(count, pos_min, pos_max);

                for pair in self.series.windows(2) {
                    draw_list
                        .add_line(
                            [x_of(pair[0].0), y_of(pair[0].1)],
                            [x_of(pair[1].0), y_of(pair[1].1)],
                            LINE_COLOR,
                        )
                        .thickness(1.5)
                        .build();
                }

                if let Some(year) = current_year {
                    if let Some(&(_, count)) = self.series.iter().find(|&&(y, _)| y == year) {
                        draw_list
                            .add_circle([x_of(year), y_of(count)], MARKER_RADIUS, MARKER_COLOR)
                            .filled(true)
                            .num_segments(12)
                            .build();
                    }
                }

                // axis extents only; a full tick generator would be noise here
                draw_list.add_text(
                    [pos_min[0] + 4.0, pos_max[1] - 16.0],
                    AXIS_TEXT,
                    format!("{}", first_year),
                );
                if last_year != first_year {
                    draw_list.add_text(
                        [pos_max[0] - 38.0, pos_max[1] - 16.0],
                        AXIS_TEXT,
                        format!("{}", last_year),
                    );
                }
                draw_list.add_text(
                    [pos_min[0] + 4.0, pos_min[1] + 2.0],
                    AXIS_TEXT,
                    format!("{}", self.max_count),
                );

                ui.dummy(size);
                ui.text_disabled("Fatalities per year");
            });
    }

    fn year_to_x(
        &self,
        year: i32,
        first: i32,
        last: i32,
        pos_min: [f32; 2],
        pos_max: [f32; 2],
    ) -> f32 {
        // a single-year series has no x-extent; center its marker
        if last == first {
            return (pos_min[0] + pos_max[0]) / 2.0;
        }
        let span = (last - first) as f32;
        let normalized = (year - first) as f32 / span;
        pos_min[0] + normalized.clamp(0.0, 1.0) * (pos_max[0] - pos_min[0])
    }

    fn count_to_y(&self, count: u32, pos_min: [f32; 2], pos_max: [f32; 2]) -> f32 {
        let max = self.max_count.max(1) as f32;
        let normalized = (count as f32 / max).clamp(0.0, 1.0);
        pos_max[1] - normalized * (pos_max[1] - pos_min[1])
    }
}

impl Default for YearTimelineWindow {
    fn default() -> Self {
        Self::new()
    }
}
