pub mod dialogs;
pub mod hours;
pub mod map;
pub mod timeline;
pub mod transport;
pub mod view;

pub use dialogs::FileDialogs;
pub use hours::HourHistogramWindow;
pub use map::MapWindow;
pub use timeline::YearTimelineWindow;
pub use transport::{TransportAction, TransportControls};
pub use view::ViewModel;
