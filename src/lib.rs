pub mod ball_tree;
pub mod dataset;
pub mod errors;
pub mod grids;
pub mod labels;
pub mod locator;
pub mod metric;
#[cfg(feature = "python")]
mod python;
pub mod units;

pub use dataset::{DataArray, Dataset, LabeledArray, Variable};
pub use errors::{ConfigurationError, LocatorError, Result};
pub use grids::{CurvilinearGrid, Grid2D, NearestCell};
pub use labels::{Label, Labels, SelectMethod, SelectOptions};
pub use locator::{
    locate_nearest_cell, locate_nearest_labels, sel_nearest_latlon, select_labels, NearestLabels,
    NearestOptions, NearestSelection,
};
pub use metric::Metric;

#[cfg(feature = "python")]
use pyo3::prelude::*;

/// A Python module implemented in Rust.
#[cfg(feature = "python")]
#[pymodule(gil_used = false)]
fn nearest_latlon<'py>(m: &Bound<'py, PyModule>) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(python::sel_nearest_latlon, m)?)?;
    m.add_class::<python::NearestPointIndex>()?;

    Ok(())
}

#[cfg(feature = "python")]
pyo3_stub_gen::define_stub_info_gatherer!(stub_info);
