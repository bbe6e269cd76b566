use crate::core::YearAggregate;
use crate::playback::RenderSink;

/// What the windows draw for the current year. This is the render target
/// the playback controller is wired to: every index change lands here, and
/// the map/chart windows read it each frame.
#[derive(Default)]
pub struct ViewModel {
    current: Option<(i32, YearAggregate)>,
    scrub_sync: Option<usize>,
    year_dirty: bool,
}

impl ViewModel {
    pub fn current_year(&self) -> Option<i32> {
        self.current.as_ref().map(|(year, _)| *year)
    }

    pub fn aggregate(&self) -> Option<&YearAggregate> {
        self.current.as_ref().map(|(_, agg)| agg)
    }

    /// Pending programmatic index change for the scrub control, consumed
    /// once. User-originated changes never land here, so draining this
    /// each frame cannot overwrite a value the user just set.
    pub fn take_scrub_sync(&mut self) -> Option<usize> {
        self.scrub_sync.take()
    }

    /// True once after each displayed-year change, so per-year work (map
    /// point projection) runs only when needed.
    pub fn take_year_dirty(&mut self) -> bool {
        std::mem::take(&mut self.year_dirty)
    }
}

impl RenderSink for ViewModel {
    fn render_year(&mut self, year: i32, aggregate: &YearAggregate) {
        self.current = Some((year, aggregate.clone()));
        self.year_dirty = true;
    }

    fn sync_scrub(&mut self, index: usize) {
        self.scrub_sync = Some(index);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_marks_the_year_dirty_once() {
        let mut view = ViewModel::default();
        let agg = YearAggregate {
            year: 2019,
            total: 3,
            hour_counts: [0; 24],
        };

        view.render_year(2019, &agg);
        assert_eq!(view.current_year(), Some(2019));
        assert!(view.take_year_dirty());
        assert!(!view.take_year_dirty());
    }

    #[test]
    fn scrub_sync_is_consumed_once() {
        let mut view = ViewModel::default();
        view.sync_scrub(4);
        assert_eq!(view.take_scrub_sync(), Some(4));
        assert_eq!(view.take_scrub_sync(), None);
        assert_eq!(view.current_year(), None);
        assert!(!view.take_year_dirty());
    }
}
