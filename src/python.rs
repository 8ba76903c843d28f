use std::{collections::HashMap, ffi::CString};

use ndarray::{Array2, CowArray};
use numpy::{PyArray2, PyArrayMethods, PyReadonlyArray2};
use pyo3::{
    exceptions::{PyUserWarning, PyValueError},
    prelude::*,
    types::PyDict,
};
use pyo3_stub_gen::derive::{gen_stub_pyclass, gen_stub_pyfunction, gen_stub_pymethods};

use crate::{
    dataset::{CoordGrid, LabeledArray},
    errors::{convert_locator_error, ConfigurationError, ContainerError, LocatorError, Result},
    grids::{CurvilinearGrid, Grid2D},
    locator::{self, NearestOptions},
    metric::Metric,
    units::UnitWarning,
};

/// An xarray Dataset or DataArray seen through the `LabeledArray` trait.
struct XarrayObject<'py> {
    obj: Bound<'py, PyAny>,
}

fn backend_error(err: PyErr) -> LocatorError {
    ContainerError::Backend(err.to_string()).into()
}

impl<'py> XarrayObject<'py> {
    fn contains(&self, mapping: &str, name: &str) -> bool {
        self.obj
            .getattr(mapping)
            .and_then(|m| m.contains(name))
            .unwrap_or(false)
    }
}

// `.values` also loads lazily backed (dask) coordinates
fn read_float64(variable: &Bound<'_, PyAny>) -> PyResult<Array2<f64>> {
    let values = variable
        .getattr("values")?
        .call_method1("astype", ("float64",))?;
    let array = values.downcast::<PyArray2<f64>>()?.readonly();
    Ok(array.as_array().to_owned())
}

impl<'py> LabeledArray for XarrayObject<'py> {
    type Label = Bound<'py, PyAny>;
    type SelectOptions = Option<Bound<'py, PyDict>>;
    type Selection = Bound<'py, PyAny>;

    fn has_index(&self, name: &str) -> bool {
        self.contains("indexes", name)
    }

    fn has_coord(&self, name: &str) -> bool {
        self.contains("coords", name)
    }

    fn coord_grid(&self, name: &str) -> Result<CoordGrid<'_>> {
        let variable = self.obj.get_item(name).map_err(backend_error)?;
        let dims: Vec<String> = variable
            .getattr("dims")
            .and_then(|dims| dims.extract())
            .map_err(backend_error)?;
        let dims: [String; 2] =
            dims.try_into()
                .map_err(|dims: Vec<String>| ConfigurationError::NotTwoDimensional {
                    name: name.to_string(),
                    ndim: dims.len(),
                })?;
        let values = read_float64(&variable).map_err(backend_error)?;
        Ok(CoordGrid {
            dims,
            values: CowArray::from(values),
        })
    }

    fn label_at(&self, dim: &str, position: usize) -> Result<Self::Label> {
        self.obj
            .get_item(dim)
            .and_then(|labels| labels.getattr("data"))
            .and_then(|data| data.get_item(position))
            .map_err(backend_error)
    }

    fn sel(
        &self,
        indexers: Vec<(String, Self::Label)>,
        options: &Self::SelectOptions,
    ) -> Result<Self::Selection> {
        let py = self.obj.py();
        let indexers_dict = PyDict::new(py);
        for (dim, label) in indexers {
            indexers_dict.set_item(dim, label).map_err(backend_error)?;
        }
        self.obj
            .call_method("sel", (indexers_dict,), options.as_ref())
            .map_err(backend_error)
    }
}

fn emit_warnings(py: Python<'_>, warnings: &[UnitWarning]) -> PyResult<()> {
    let category = py.get_type::<PyUserWarning>();
    for warning in warnings {
        let message =
            CString::new(warning.to_string()).map_err(|e| PyValueError::new_err(e.to_string()))?;
        PyErr::warn(py, category.as_any(), &message, 1)?;
    }
    Ok(())
}

fn parse_metric(metric: &str) -> PyResult<Metric> {
    metric
        .parse::<Metric>()
        .map_err(|e| convert_locator_error(e.into()))
}

/// Select the grid point of an xarray object nearest to a lat/lon target.
///
/// Parameters
/// ----------
/// xrobj : xarray.Dataset or xarray.DataArray
///     Object with 2-D latitude and longitude coordinates on two index dimensions
/// indexers_equivalent : dict
///     Target as ``{lat_name: value, lon_name: value}``
/// metric : str
///     ``"haversine"`` (degrees in, great-circle distance) or a raw metric
///     such as ``"euclidean"``
/// balltree_leaf_size : int
///     Leaf size of the ball tree; affects speed only
/// spatial_x_dim, spatial_y_dim : str
///     Index dimensions spanning the grid
/// spatial_lat_name, spatial_lon_name : str
///     Names of the latitude and longitude coordinates
/// **selkwargs
///     Forwarded to ``xrobj.sel``
///
/// Returns
/// -------
/// xarray.Dataset or xarray.DataArray
///     The selection at the nearest grid point
///
/// Raises
/// ------
/// ValueError
///     If the arguments do not fit the object
#[gen_stub_pyfunction]
#[pyfunction]
#[pyo3(signature = (
    xrobj,
    indexers_equivalent,
    metric = "haversine",
    balltree_leaf_size = 40,
    spatial_x_dim = "x",
    spatial_y_dim = "y",
    spatial_lat_name = "lat",
    spatial_lon_name = "lon",
    **selkwargs
))]
#[allow(clippy::too_many_arguments)]
pub fn sel_nearest_latlon<'py>(
    py: Python<'py>,
    xrobj: Bound<'py, PyAny>,
    indexers_equivalent: HashMap<String, f64>,
    metric: &str,
    balltree_leaf_size: usize,
    spatial_x_dim: &str,
    spatial_y_dim: &str,
    spatial_lat_name: &str,
    spatial_lon_name: &str,
    selkwargs: Option<Bound<'py, PyDict>>,
) -> PyResult<Bound<'py, PyAny>> {
    let options = NearestOptions {
        metric: parse_metric(metric)?,
        leaf_size: balltree_leaf_size,
        x_dim: spatial_x_dim.to_string(),
        y_dim: spatial_y_dim.to_string(),
        lat_name: spatial_lat_name.to_string(),
        lon_name: spatial_lon_name.to_string(),
        select: selkwargs,
    };
    let source = XarrayObject { obj: xrobj };

    let found = locator::locate_nearest_labels(&source, &indexers_equivalent, &options)
        .map_err(convert_locator_error)?;
    emit_warnings(py, &found.cell.warnings)?;
    locator::select_labels(&source, &found, &options).map_err(convert_locator_error)
}

/// A reusable nearest-point index over 2-D latitude and longitude arrays.
///
/// Builds the ball tree once so that many targets can be looked up against
/// the same grid.
#[gen_stub_pyclass]
#[pyclass(module = "nearest_latlon.nearest_latlon")]
pub struct NearestPointIndex {
    grid: CurvilinearGrid,
}

#[gen_stub_pymethods]
#[pymethods]
impl NearestPointIndex {
    /// Build an index from latitude and longitude arrays of equal shape.
    ///
    /// Raises
    /// ------
    /// ValueError
    ///     If the shapes differ, the grid is empty or the metric is unknown
    #[new]
    #[pyo3(signature = (lat, lon, metric = "haversine", leaf_size = 40))]
    fn new(
        lat: PyReadonlyArray2<'_, f64>,
        lon: PyReadonlyArray2<'_, f64>,
        metric: &str,
        leaf_size: usize,
    ) -> PyResult<Self> {
        let grid = CurvilinearGrid::new(lat.as_array(), lon.as_array(), parse_metric(metric)?, leaf_size)
            .map_err(convert_locator_error)?;
        Ok(Self { grid })
    }

    /// Shape ``(I, J)`` of the indexed grid.
    #[getter]
    fn shape(&self) -> (usize, usize) {
        (self.grid.nx(), self.grid.ny())
    }

    /// Name of the distance metric.
    #[getter]
    fn metric(&self) -> String {
        self.grid.metric().as_str().to_string()
    }

    /// Find the grid cell nearest to ``(lat, lon)``.
    ///
    /// Returns
    /// -------
    /// tuple
    ///     ``(i, j, distance)``; the distance is in radians for haversine
    fn query(&self, py: Python<'_>, lat: f64, lon: f64) -> PyResult<(usize, usize, f64)> {
        let cell = self
            .grid
            .nearest(lat, lon)
            .map_err(convert_locator_error)?;
        emit_warnings(py, &cell.warnings)?;
        Ok((cell.i, cell.j, cell.distance))
    }
}
