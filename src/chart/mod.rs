//! Font-independent chart geometry.
//!
//! The layouts here are pure functions of the aggregated counts. [`crate::elements`] turns them
//! into `genpdf` elements.

pub mod bar;
pub mod legend;
pub mod pie;

pub use bar::{Bar, BarChartLayout, BarRect};
pub use legend::{wrap_label, LegendCursor, LegendEntry, LegendLayout, LegendWindow};
pub use pie::{PieLayout, Slice};
