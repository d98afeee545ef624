//! Candidate discovery: pass one of the pipeline.
//!
//! Enumeration is split by origin. [`local`] walks configured filesystem
//! roots, [`remote`] pages through remote drive folders, and [`year`]
//! applies the optional creation-year filter to the merged candidate list.

pub mod local;
pub mod remote;
pub mod year;

pub use local::LocalScanner;
pub use remote::enumerate_drive;
pub use year::YearFilter;
