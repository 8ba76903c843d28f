//! Nearest grid point selection on labeled containers.
//!
//! [`sel_nearest_latlon`] validates the request against the container, builds
//! a fresh [`CurvilinearGrid`] from its latitude and longitude fields, finds
//! the cell closest to the target and selects that cell by its index labels.
//! Nothing is cached between calls; keep a [`CurvilinearGrid`] yourself to
//! answer many queries against the same grid.

use std::borrow::Borrow;

use ndarray::ArrayView2;
use tracing::debug;

use crate::{
    dataset::LabeledArray,
    errors::{ConfigurationError, Result},
    grids::{CurvilinearGrid, NearestCell},
    labels::SelectOptions,
    metric::Metric,
};

pub const DEFAULT_LEAF_SIZE: usize = 40;

/// Per-call settings of the nearest-point search.
#[derive(Clone, Debug, PartialEq)]
pub struct NearestOptions<S = SelectOptions> {
    pub metric: Metric,
    /// Ball tree leaf size; changes speed, never the result.
    pub leaf_size: usize,
    pub x_dim: String,
    pub y_dim: String,
    pub lat_name: String,
    pub lon_name: String,
    /// Forwarded as-is to the container's label selection.
    pub select: S,
}

impl<S: Default> Default for NearestOptions<S> {
    fn default() -> Self {
        Self {
            metric: Metric::Haversine,
            leaf_size: DEFAULT_LEAF_SIZE,
            x_dim: "x".to_string(),
            y_dim: "y".to_string(),
            lat_name: "lat".to_string(),
            lon_name: "lon".to_string(),
            select: S::default(),
        }
    }
}

impl<S> NearestOptions<S> {
    pub fn with_metric(mut self, metric: Metric) -> Self {
        self.metric = metric;
        self
    }

    pub fn with_leaf_size(mut self, leaf_size: usize) -> Self {
        self.leaf_size = leaf_size;
        self
    }

    pub fn with_dims(mut self, x_dim: &str, y_dim: &str) -> Self {
        self.x_dim = x_dim.to_string();
        self.y_dim = y_dim.to_string();
        self
    }

    pub fn with_fields(mut self, lat_name: &str, lon_name: &str) -> Self {
        self.lat_name = lat_name.to_string();
        self.lon_name = lon_name.to_string();
        self
    }

    pub fn with_select<T>(self, select: T) -> NearestOptions<T> {
        NearestOptions {
            metric: self.metric,
            leaf_size: self.leaf_size,
            x_dim: self.x_dim,
            y_dim: self.y_dim,
            lat_name: self.lat_name,
            lon_name: self.lon_name,
            select,
        }
    }
}

/// The selected cell together with how it was found.
#[derive(Clone, Debug)]
pub struct NearestSelection<T, L> {
    pub selection: T,
    pub cell: NearestCell,
    pub x_label: L,
    pub y_label: L,
}

/// Nearest cell of a bare pair of latitude/longitude arrays.
pub fn locate_nearest_cell(
    lat: ArrayView2<f64>,
    lon: ArrayView2<f64>,
    target: [f64; 2],
    metric: Metric,
    leaf_size: usize,
) -> Result<NearestCell> {
    CurvilinearGrid::new(lat, lon, metric, leaf_size)?.nearest(target[0], target[1])
}

/// The nearest cell of a container and its labels, before selection.
#[derive(Clone, Debug)]
pub struct NearestLabels<L> {
    pub cell: NearestCell,
    pub x_label: L,
    pub y_label: L,
}

/// Select the cell of `source` whose (lat, lon) is nearest to `target`.
///
/// `target` maps the latitude and longitude field names to values; with the
/// haversine metric these, and the grid, are in degrees.
pub fn sel_nearest_latlon<C, K, V>(
    source: &C,
    target: impl IntoIterator<Item = (K, V)>,
    options: &NearestOptions<C::SelectOptions>,
) -> Result<NearestSelection<C::Selection, C::Label>>
where
    C: LabeledArray,
    K: AsRef<str>,
    V: Borrow<f64>,
{
    let found = locate_nearest_labels(source, target, options)?;
    let selection = select_labels(source, &found, options)?;
    Ok(NearestSelection {
        selection,
        cell: found.cell,
        x_label: found.x_label,
        y_label: found.y_label,
    })
}

/// Selects the cell found by [`locate_nearest_labels`].
pub fn select_labels<C: LabeledArray>(
    source: &C,
    found: &NearestLabels<C::Label>,
    options: &NearestOptions<C::SelectOptions>,
) -> Result<C::Selection> {
    source.sel(
        vec![
            (options.x_dim.clone(), found.x_label.clone()),
            (options.y_dim.clone(), found.y_label.clone()),
        ],
        &options.select,
    )
}

/// Validates the request and finds the nearest cell and its index labels,
/// without selecting anything.
pub fn locate_nearest_labels<C, K, V>(
    source: &C,
    target: impl IntoIterator<Item = (K, V)>,
    options: &NearestOptions<C::SelectOptions>,
) -> Result<NearestLabels<C::Label>>
where
    C: LabeledArray,
    K: AsRef<str>,
    V: Borrow<f64>,
{
    let target = validate(source, target, options)?;

    let lat = source.coord_grid(&options.lat_name)?;
    let lon = source.coord_grid(&options.lon_name)?;
    if lat.values.shape() != lon.values.shape() {
        return Err(ConfigurationError::ShapeMismatch {
            lat: lat.values.shape().to_vec(),
            lon: lon.values.shape().to_vec(),
        }
        .into());
    }
    if lat.dims != lon.dims {
        return Err(ConfigurationError::DimensionOrderMismatch {
            lat_name: options.lat_name.clone(),
            lat: lat.dims.to_vec(),
            lon_name: options.lon_name.clone(),
            lon: lon.dims.to_vec(),
        }
        .into());
    }
    let x_first = match (lat.dims[0].as_str(), lat.dims[1].as_str()) {
        (a, b) if a == options.x_dim && b == options.y_dim => true,
        (a, b) if a == options.y_dim && b == options.x_dim => false,
        _ => {
            return Err(ConfigurationError::DimensionMismatch {
                name: options.lat_name.clone(),
                dims: lat.dims.to_vec(),
                x_dim: options.x_dim.clone(),
                y_dim: options.y_dim.clone(),
            }
            .into())
        }
    };

    let cell = locate_nearest_cell(
        lat.values.view(),
        lon.values.view(),
        target,
        options.metric,
        options.leaf_size,
    )?;
    let (x_position, y_position) = if x_first {
        (cell.i, cell.j)
    } else {
        (cell.j, cell.i)
    };

    let x_label = source.label_at(&options.x_dim, x_position)?;
    let y_label = source.label_at(&options.y_dim, y_position)?;
    debug!(
        x_dim = %options.x_dim,
        x_position,
        y_dim = %options.y_dim,
        y_position,
        ?x_label,
        ?y_label,
        "nearest cell labels"
    );
    Ok(NearestLabels {
        cell,
        x_label,
        y_label,
    })
}

/// Checks the request before any array is touched. Returns `[lat, lon]`.
fn validate<C, K, V>(
    source: &C,
    target: impl IntoIterator<Item = (K, V)>,
    options: &NearestOptions<C::SelectOptions>,
) -> Result<[f64; 2]>
where
    C: LabeledArray,
    K: AsRef<str>,
    V: Borrow<f64>,
{
    let mut lat = None;
    let mut lon = None;
    for (name, value) in target {
        let name = name.as_ref();
        if name == options.lat_name {
            lat = Some(*value.borrow());
        } else if name == options.lon_name {
            lon = Some(*value.borrow());
        } else {
            return Err(ConfigurationError::UnknownTargetKey {
                name: name.to_string(),
                lat: options.lat_name.clone(),
                lon: options.lon_name.clone(),
            }
            .into());
        }
    }

    for field in [&options.lat_name, &options.lon_name] {
        if source.has_index(field) {
            return Err(ConfigurationError::FieldIsIndex(field.clone()).into());
        }
    }
    for dim in [&options.x_dim, &options.y_dim] {
        if !source.has_index(dim) {
            return Err(ConfigurationError::MissingIndexDimension(dim.clone()).into());
        }
    }
    for field in [&options.lat_name, &options.lon_name] {
        if !source.has_coord(field) {
            return Err(ConfigurationError::MissingCoordinate(field.clone()).into());
        }
    }

    match (lat, lon) {
        (Some(lat), Some(lon)) => Ok([lat, lon]),
        (None, _) => Err(ConfigurationError::MissingTargetKey(options.lat_name.clone()).into()),
        (_, None) => Err(ConfigurationError::MissingTargetKey(options.lon_name.clone()).into()),
    }
}
