use thiserror::Error;

pub type Result<T> = std::result::Result<T, LocatorError>;

#[derive(Debug, Error)]
pub enum LocatorError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
    #[error(transparent)]
    Index(#[from] IndexError),
    #[error(transparent)]
    Container(#[from] ContainerError),
}

/// Caller-side mistakes, detected before any index is built.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigurationError {
    #[error("{name} is not one of spatial_lat_name or spatial_lon_name: [{lat}, {lon}]")]
    UnknownTargetKey {
        name: String,
        lat: String,
        lon: String,
    },
    #[error("target is missing a value for {0}")]
    MissingTargetKey(String),
    #[error("{0} cannot be used, since it is an index level. Use .sel() for this dimension.")]
    FieldIsIndex(String),
    #[error("{0} is not an index coordinate. Set it as an index or update the spatial dimension argument.")]
    MissingIndexDimension(String),
    #[error("{0} is not a coordinate. Update the spatial lat/lon name argument.")]
    MissingCoordinate(String),
    #[error("coordinate {name} must be 2-dimensional, found {ndim} dimension(s)")]
    NotTwoDimensional { name: String, ndim: usize },
    #[error("coordinate {name} is defined on {dims:?}, which does not cover both {x_dim} and {y_dim}")]
    DimensionMismatch {
        name: String,
        dims: Vec<String>,
        x_dim: String,
        y_dim: String,
    },
    #[error("latitude shape {lat:?} does not match longitude shape {lon:?}")]
    ShapeMismatch { lat: Vec<usize>, lon: Vec<usize> },
    #[error("coordinates {lat_name} {lat:?} and {lon_name} {lon:?} are not defined on the same dimensions")]
    DimensionOrderMismatch {
        lat_name: String,
        lat: Vec<String>,
        lon_name: String,
        lon: Vec<String>,
    },
    #[error("unsupported metric: {0}")]
    UnknownMetric(String),
    #[error("unsupported selection method: {0}")]
    UnknownSelectMethod(String),
}

/// Failures of the spatial index itself.
#[derive(Debug, Error, PartialEq)]
pub enum IndexError {
    #[error("cannot build a spatial index over an empty point set")]
    EmptyPointSet,
    #[error("leaf_size must be at least 1")]
    InvalidLeafSize,
    #[error("point {index} has a non-finite coordinate ({lat}, {lon})")]
    NonFiniteCoordinate { index: usize, lat: f64, lon: f64 },
    #[error("query point ({lat}, {lon}) is not finite")]
    NonFiniteQuery { lat: f64, lon: f64 },
    #[error("minkowski power must be finite and at least 1, got {0}")]
    InvalidMinkowskiPower(f64),
}

/// Failures raised by the labeled container.
#[derive(Debug, Error, PartialEq)]
pub enum ContainerError {
    #[error("no dimension named {0}")]
    UnknownDimension(String),
    #[error("no label {label} along dimension {dim}")]
    LabelNotFound { dim: String, label: String },
    #[error("position {position} is out of range for dimension {dim} of length {len}")]
    PositionOutOfRange {
        dim: String,
        position: usize,
        len: usize,
    },
    #[error("variable {name} has shape {shape:?}, expected {expected:?} from its dimensions")]
    IncompatibleShape {
        name: String,
        shape: Vec<usize>,
        expected: Vec<usize>,
    },
    #[error("variable has {ndim} dimension(s) but {dims:?} were named")]
    DimensionCount { dims: Vec<String>, ndim: usize },
    #[error("{0}")]
    Backend(String),
}

#[cfg(feature = "python")]
pub fn convert_locator_error(error: LocatorError) -> pyo3::PyErr {
    use pyo3::exceptions::{PyKeyError, PyValueError};

    match error {
        LocatorError::Container(ContainerError::LabelNotFound { .. }) => {
            PyKeyError::new_err(error.to_string())
        }
        _ => PyValueError::new_err(error.to_string()),
    }
}
