//! Chart query core - natural-language chart queries over smart-home sensors
//!
//! Turns phrases like "power usage vs cost last 7 days, stacked" into a
//! structured query: resolved entity ids, a relative time-range preset,
//! chart type, aggregation and stacking/comparison flags. Entity names are
//! resolved with weighted fuzzy matching; everything else comes from
//! ordered pattern tables.

pub mod axes;
pub mod config;
pub mod error;
pub mod extractors;
pub mod matcher;
pub mod parser;
pub mod range;
pub mod similarity;
pub mod statistics;
pub mod types;

pub use axes::*;
pub use config::*;
pub use error::{QueryError, Result};
pub use extractors::*;
pub use matcher::*;
pub use parser::*;
pub use range::*;
pub use similarity::*;
pub use statistics::*;
pub use types::*;

// Python bindings
#[cfg(feature = "extension-module")]
pub mod py;

#[cfg(feature = "extension-module")]
use pyo3::prelude::*;

#[cfg(feature = "extension-module")]
#[pymodule]
fn chart_query_core(m: &Bound<'_, PyModule>) -> PyResult<()> {
    use py::*;
    m.add_class::<PyQueryParser>()?;
    m.add_function(wrap_pyfunction!(py_preset_to_date_range, m)?)?;
    m.add_function(wrap_pyfunction!(py_assign_axes, m)?)?;
    m.add_function(wrap_pyfunction!(py_default_statistics_type, m)?)?;
    m.add_function(wrap_pyfunction!(py_default_grouping_period, m)?)?;
    Ok(())
}
