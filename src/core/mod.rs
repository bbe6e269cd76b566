pub mod index;
pub mod record;

pub use index::{DatasetIndex, YearAggregate};
pub use record::CollisionRecord;
