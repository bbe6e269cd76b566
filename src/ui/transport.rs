use imgui::Ui;

/// Actions raised by the transport controls, consumed in the main loop.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransportAction {
    None,
    TogglePlayPause,
    StepBack,
    StepForward,
    Scrub(usize),
}

/// Play/pause, step, and year-scrub controls.
///
/// The slider's displayed value belongs to this widget; the controller
/// pushes programmatic changes here through the view model's scrub sync,
/// while user drags raise `Scrub` without being echoed back.
pub struct TransportControls {
    displayed_index: usize,
    year_count: usize,
    is_playing: bool,
}

impl TransportControls {
    pub fn new() -> Self {
        Self {
            displayed_index: 0,
            year_count: 0,
            is_playing: false,
        }
    }

    pub fn set_year_count(&mut self, count: usize) {
        self.year_count = count;
        self.displayed_index = self.displayed_index.min(count.saturating_sub(1));
    }

    pub fn set_playing(&mut self, playing: bool) {
        self.is_playing = playing;
    }

    /// Follow a programmatic index change (auto-advance).
    pub fn set_displayed_index(&mut self, index: usize) {
        self.displayed_index = index.min(self.year_count.saturating_sub(1));
    }

    pub fn render(&mut self, ui: &Ui, year_label: Option<i32>) -> TransportAction {
        if self.year_count == 0 {
            ui.text_disabled("Load collision data to enable playback");
            return TransportAction::None;
        }

        let mut action = TransportAction::None;

        if ui.small_button("|<") {
            action = TransportAction::StepBack;
        }
        ui.same_line();

        let play_label = if self.is_playing { "||" } else { ">" };
        if ui.small_button(play_label) {
            action = TransportAction::TogglePlayPause;
        }
        ui.same_line();

        if ui.small_button(">|") {
            action = TransportAction::StepForward;
        }
        ui.same_line();

        let max_index = (self.year_count - 1) as i32;
        let mut slider_value = self.displayed_index as i32;
        ui.set_next_item_width(ui.content_region_avail()[0] - 60.0);
        if ui
            .slider_config("##year-scrub", 0, max_index)
            .display_format("%d")
            .build(&mut slider_value)
        {
            self.displayed_index = slider_value.clamp(0, max_index) as usize;
            action = TransportAction::Scrub(self.displayed_index);
        }

        ui.same_line();
        match year_label {
            Some(year) => ui.text(format!("{}", year)),
            None => ui.text_disabled("-"),
        }

        action
    }
}

impl Default for TransportControls {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{CollisionRecord, DatasetIndex};
    use crate::playback::{PlaybackController, TICK_DELAY};
    use crate::ui::ViewModel;
    use std::time::Instant;

    #[test]
    fn displayed_index_clamps_to_year_count() {
        let mut transport = TransportControls::new();
        transport.set_year_count(3);
        transport.set_displayed_index(10);
        assert_eq!(transport.displayed_index, 2);

        transport.set_year_count(0);
        transport.set_displayed_index(5);
        assert_eq!(transport.displayed_index, 0);
    }

    fn year_record(year: i32) -> CollisionRecord {
        CollisionRecord {
            year: Some(year),
            date: None,
            time: None,
            longitude: None,
            latitude: None,
        }
    }

    /// Drain any pending programmatic index change into the widget, the
    /// way the frame loop does after polling playback.
    fn frame_sync(view: &mut ViewModel, transport: &mut TransportControls) {
        if let Some(index) = view.take_scrub_sync() {
            transport.set_displayed_index(index);
        }
    }

    #[test]
    fn user_scrub_survives_the_next_frame_sync() {
        let index = DatasetIndex::build((2014..2020).map(year_record).collect());
        let mut ctrl = PlaybackController::new(index, TICK_DELAY);
        let mut view = ViewModel::default();
        let mut transport = TransportControls::new();
        transport.set_year_count(6);

        ctrl.start(Instant::now(), &mut view);
        frame_sync(&mut view, &mut transport);
        assert_eq!(transport.displayed_index, 0);

        // user drags the slider to index 5; the widget already shows 5
        transport.set_displayed_index(5);
        ctrl.scrub(5, &mut view);

        // the next frame's sync must not snap the display back
        frame_sync(&mut view, &mut transport);
        assert_eq!(ctrl.current_index(), 5);
        assert_eq!(transport.displayed_index, 5);
    }

    #[test]
    fn auto_advance_still_moves_the_display() {
        let index = DatasetIndex::build((2018..2021).map(year_record).collect());
        let mut ctrl = PlaybackController::new(index, TICK_DELAY);
        let mut view = ViewModel::default();
        let mut transport = TransportControls::new();
        transport.set_year_count(3);

        let t0 = Instant::now();
        ctrl.start(t0, &mut view);
        frame_sync(&mut view, &mut transport);

        ctrl.update(t0 + TICK_DELAY, &mut view);
        frame_sync(&mut view, &mut transport);
        assert_eq!(transport.displayed_index, 1);
    }
}
