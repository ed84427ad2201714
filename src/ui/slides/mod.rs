//! The five slides of the deck

pub mod offer;
pub mod possibilities;
pub mod problem;
pub mod roi;
pub mod solution;

pub use roi::RoiPanel;
pub use solution::DemoPanel;
