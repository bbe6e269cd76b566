use rfd::FileDialog;
use std::path::PathBuf;

/// File dialog helper for Collision-Viz
pub struct FileDialogs;

impl FileDialogs {
    /// Open a file dialog for selecting a collision CSV file
    pub fn open_collision_file() -> Option<PathBuf> {
        FileDialog::new()
            .add_filter("CSV Files", &["csv"])
            .add_filter("All Files", &["*"])
            .set_title("Open Collision Data")
            .pick_file()
    }

    /// Open a file dialog for selecting a boundaries TopoJSON file
    pub fn open_boundaries_file() -> Option<PathBuf> {
        FileDialog::new()
            .add_filter("TopoJSON Files", &["json", "topojson"])
            .add_filter("All Files", &["*"])
            .set_title("Open GB Boundaries")
            .pick_file()
    }
}
