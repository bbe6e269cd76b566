use imgui::{Condition, StyleColor, Ui};

use crate::core::YearAggregate;

const BAR_COLOR: [f32; 4] = [0.96, 0.27, 0.27, 0.5];
const AXIS_TEXT: [f32; 4] = [0.6, 0.6, 0.6, 0.9];
const TICK_HOURS: [u32; 7] = [0, 4, 8, 12, 16, 20, 23];
const BAR_PADDING: f32 = 0.1;
const PLOT_HEIGHT: f32 = 220.0;

/// Hourly distribution of the currently displayed year, as 24 bars. The
/// y-axis rescales to each year's own maximum so quiet years still read.
pub struct HourHistogramWindow;

impl HourHistogramWindow {
    pub fn new() -> Self {
        Self
    }

    pub fn render(&self, ui: &Ui, is_open: &mut bool, aggregate: Option<&YearAggregate>) {
        ui.window("Hourly Distribution")
            .size([520.0, 300.0], Condition::FirstUseEver)
            .position([740.0, 340.0], Condition::FirstUseEver)
            .opened(is_open)
            .build(|| {
                let Some(aggregate) = aggregate else {
                    ui.text("No data");
                    return;
                };

                let size = [ui.content_region_avail()[0], PLOT_HEIGHT];
                let draw_list = ui.get_window_draw_list();
                let cursor_pos = ui.cursor_screen_pos();
                let pos_min = cursor_pos;
                let pos_max = [cursor_pos[0] + size[0], cursor_pos[1] + size[1]];

                draw_list
                    .add_rect(pos_min, pos_max, ui.style_color(StyleColor::FrameBg))
                    .filled(true)
                    .build();

                let max = aggregate.max_hour_count().max(1) as f32;
                let band = (pos_max[0] - pos_min[0]) / 24.0;
                let pad = band * BAR_PADDING;

                for (hour, &count) in aggregate.hour_counts.iter().enumerate() {
                    let x0 = pos_min[0] + hour as f32 * band + pad;
                    let x1 = pos_min[0] + (hour + 1) as f32 * band - pad;
                    let height = (count as f32 / max) * (pos_max[1] - pos_min[1]);
                    draw_list
                        .add_rect([x0, pos_max[1] - height], [x1, pos_max[1]], BAR_COLOR)
                        .filled(true)
                        .build();
                }

                for hour in TICK_HOURS {
                    let x = pos_min[0] + (hour as f32 + 0.5) * band;
                    draw_list.add_text(
                        [x - 5.0, pos_max[1] - 16.0],
                        AXIS_TEXT,
                        format!("{}", hour),
                    );
                }
                draw_list.add_text(
                    [pos_min[0] + 4.0, pos_min[1] + 2.0],
                    AXIS_TEXT,
                    format!("{}", aggregate.max_hour_count().max(1)),
                );

                ui.dummy(size);
                ui.text_disabled("Fatalities by hour of day");
            });
    }
}

impl Default for HourHistogramWindow {
    fn default() -> Self {
        Self::new()
    }
}
