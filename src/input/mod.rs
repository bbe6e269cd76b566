pub mod csv;

pub use csv::load_csv;
