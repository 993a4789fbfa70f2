//! Row-to-page stages: probing files, enriching rows, assembling pages.

pub mod enrich;
pub mod geo;
pub mod page;
pub mod probe;

pub use probe::{FsProbe, MediaProbe};
