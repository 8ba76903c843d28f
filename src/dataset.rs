use std::{collections::BTreeMap, fmt};

use delegate::delegate;
use ndarray::{Array, ArrayD, Axis, CowArray, Dimension, Ix2};
use num_traits::ToPrimitive;

use crate::{
    errors::{ConfigurationError, ContainerError, Result},
    labels::{Label, Labels, SelectOptions},
};

/// A 2-D coordinate field together with the names of its two dimensions.
pub struct CoordGrid<'a> {
    pub dims: [String; 2],
    pub values: CowArray<'a, f64, Ix2>,
}

/// The capabilities the nearest-point search needs from a labeled
/// multi-dimensional container.
///
/// `Label`, `SelectOptions` and `Selection` are left to the container so that
/// foreign containers (an xarray object behind Python, for instance) can keep
/// their own label and option types.
pub trait LabeledArray {
    type Label: Clone + fmt::Debug;
    type SelectOptions: Default;
    type Selection;

    /// Whether `name` is an index dimension that supports label selection.
    fn has_index(&self, name: &str) -> bool;

    /// Whether `name` is a coordinate field (index or auxiliary).
    fn has_coord(&self, name: &str) -> bool;

    fn coord_grid(&self, name: &str) -> Result<CoordGrid<'_>>;

    /// The label of index dimension `dim` at `position`.
    fn label_at(&self, dim: &str, position: usize) -> Result<Self::Label>;

    fn sel(
        &self,
        indexers: Vec<(String, Self::Label)>,
        options: &Self::SelectOptions,
    ) -> Result<Self::Selection>;
}

/// An array of `f64` values with named dimensions.
#[derive(Clone, Debug, PartialEq)]
pub struct Variable {
    dims: Vec<String>,
    data: ArrayD<f64>,
}

impl Variable {
    /// Wrap `data`, converting its elements to `f64`. Values that cannot be
    /// represented become NaN.
    pub fn new<T, D>(dims: &[&str], data: Array<T, D>) -> Result<Self>
    where
        T: ToPrimitive + Clone,
        D: Dimension,
    {
        if dims.len() != data.ndim() {
            return Err(ContainerError::DimensionCount {
                dims: dims.iter().map(|d| d.to_string()).collect(),
                ndim: data.ndim(),
            }
            .into());
        }
        Ok(Self {
            dims: dims.iter().map(|d| d.to_string()).collect(),
            data: data.mapv(|v| v.to_f64().unwrap_or(f64::NAN)).into_dyn(),
        })
    }

    pub fn dims(&self) -> &[String] {
        &self.dims
    }

    pub fn data(&self) -> &ArrayD<f64> {
        &self.data
    }

    pub fn ndim(&self) -> usize {
        self.data.ndim()
    }

    pub fn shape(&self) -> &[usize] {
        self.data.shape()
    }

    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// The only value of a single-element variable.
    pub fn item(&self) -> Option<f64> {
        match self.data.len() {
            1 => self.data.iter().next().copied(),
            _ => None,
        }
    }

    fn axis_of(&self, dim: &str) -> Option<usize> {
        self.dims.iter().position(|d| d == dim)
    }

    fn take(&self, dim: &str, position: usize) -> Variable {
        match self.axis_of(dim) {
            Some(axis) => {
                let mut dims = self.dims.clone();
                dims.remove(axis);
                Variable {
                    dims,
                    data: self.data.index_axis(Axis(axis), position).to_owned(),
                }
            }
            None => self.clone(),
        }
    }
}

/// An in-memory labeled dataset: dimensions, index labels, auxiliary
/// coordinates and data variables sharing those dimensions.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Dataset {
    dims: BTreeMap<String, usize>,
    indexes: BTreeMap<String, Labels>,
    coords: BTreeMap<String, Variable>,
    data_vars: BTreeMap<String, Variable>,
    /// Labels of index dimensions that were selected away.
    scalar_labels: BTreeMap<String, Label>,
}

impl Dataset {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_index(mut self, dim: &str, labels: impl Into<Labels>) -> Result<Self> {
        self.set_index(dim, labels)?;
        Ok(self)
    }

    pub fn with_coord(mut self, name: &str, variable: Variable) -> Result<Self> {
        self.register_dims(name, &variable)?;
        self.coords.insert(name.to_string(), variable);
        Ok(self)
    }

    pub fn with_data_var(mut self, name: &str, variable: Variable) -> Result<Self> {
        self.register_dims(name, &variable)?;
        self.data_vars.insert(name.to_string(), variable);
        Ok(self)
    }

    /// Make `dim` an index dimension labeled by `labels`.
    pub fn set_index(&mut self, dim: &str, labels: impl Into<Labels>) -> Result<()> {
        let labels = labels.into();
        match self.dims.get(dim) {
            Some(&len) if len != labels.len() => {
                return Err(ContainerError::IncompatibleShape {
                    name: dim.to_string(),
                    shape: vec![labels.len()],
                    expected: vec![len],
                }
                .into())
            }
            _ => {}
        }
        self.dims.insert(dim.to_string(), labels.len());
        self.scalar_labels.remove(dim);
        self.indexes.insert(dim.to_string(), labels);
        Ok(())
    }

    fn register_dims(&mut self, name: &str, variable: &Variable) -> Result<()> {
        let expected: Vec<usize> = variable
            .dims()
            .iter()
            .zip(variable.shape())
            .map(|(dim, &len)| self.dims.get(dim).copied().unwrap_or(len))
            .collect();
        if expected != variable.shape() {
            return Err(ContainerError::IncompatibleShape {
                name: name.to_string(),
                shape: variable.shape().to_vec(),
                expected,
            }
            .into());
        }
        for (dim, &len) in variable.dims().iter().zip(variable.shape()) {
            self.dims.insert(dim.clone(), len);
        }
        Ok(())
    }

    pub fn dims(&self) -> &BTreeMap<String, usize> {
        &self.dims
    }

    pub fn dim_size(&self, dim: &str) -> Option<usize> {
        self.dims.get(dim).copied()
    }

    pub fn index(&self, dim: &str) -> Option<&Labels> {
        self.indexes.get(dim)
    }

    pub fn coord(&self, name: &str) -> Option<&Variable> {
        self.coords.get(name)
    }

    pub fn data_var(&self, name: &str) -> Option<&Variable> {
        self.data_vars.get(name)
    }

    /// Coordinate or data variable named `name`.
    pub fn get(&self, name: &str) -> Option<&Variable> {
        self.coords.get(name).or_else(|| self.data_vars.get(name))
    }

    /// The label an index dimension was reduced to by a selection.
    pub fn label(&self, dim: &str) -> Option<&Label> {
        self.scalar_labels.get(dim)
    }

    /// Select by label along one or more dimensions.
    ///
    /// Indexers in `options.extra_indexers` are applied together with
    /// `indexers`. A dimension without an index is selected positionally by
    /// an integer label.
    pub fn sel<S>(
        &self,
        indexers: impl IntoIterator<Item = (S, Label)>,
        options: &SelectOptions,
    ) -> Result<Dataset>
    where
        S: Into<String>,
    {
        let indexers: Vec<(String, Label)> = indexers
            .into_iter()
            .map(|(dim, label)| (dim.into(), label))
            .chain(options.extra_indexers.iter().cloned())
            .collect();

        let mut positions = Vec::with_capacity(indexers.len());
        for (dim, label) in indexers {
            let position = match (self.indexes.get(&dim), &label) {
                (Some(labels), _) => labels.position(&label, options.method, options.tolerance),
                (None, Label::Int(position)) if self.dims.contains_key(&dim) => {
                    usize::try_from(*position).ok()
                }
                (None, _) => return Err(ContainerError::UnknownDimension(dim).into()),
            };
            let position = position.ok_or_else(|| ContainerError::LabelNotFound {
                dim: dim.clone(),
                label: label.to_string(),
            })?;
            positions.push((dim, position));
        }

        let mut selected = self.isel(&positions)?;
        if options.drop {
            for (dim, _) in &positions {
                selected.scalar_labels.remove(dim);
            }
        }
        Ok(selected)
    }

    /// Select by position along one or more dimensions, dropping them.
    pub fn isel<S: AsRef<str>>(&self, positions: &[(S, usize)]) -> Result<Dataset> {
        let mut selected = self.clone();
        for (dim, position) in positions {
            let dim = dim.as_ref();
            let len = selected
                .dims
                .remove(dim)
                .ok_or_else(|| ContainerError::UnknownDimension(dim.to_string()))?;
            if *position >= len {
                return Err(ContainerError::PositionOutOfRange {
                    dim: dim.to_string(),
                    position: *position,
                    len,
                }
                .into());
            }
            if let Some(labels) = selected.indexes.remove(dim) {
                if let Some(label) = labels.get(*position) {
                    selected.scalar_labels.insert(dim.to_string(), label);
                }
            }
            for variable in selected.coords.values_mut().chain(selected.data_vars.values_mut()) {
                *variable = variable.take(dim, *position);
            }
        }
        Ok(selected)
    }
}

impl LabeledArray for Dataset {
    type Label = Label;
    type SelectOptions = SelectOptions;
    type Selection = Dataset;

    fn has_index(&self, name: &str) -> bool {
        self.indexes.contains_key(name)
    }

    fn has_coord(&self, name: &str) -> bool {
        self.coords.contains_key(name) || self.indexes.contains_key(name)
    }

    fn coord_grid(&self, name: &str) -> Result<CoordGrid<'_>> {
        let variable = self
            .coords
            .get(name)
            .ok_or_else(|| ConfigurationError::MissingCoordinate(name.to_string()))?;
        let not_2d = || ConfigurationError::NotTwoDimensional {
            name: name.to_string(),
            ndim: variable.ndim(),
        };
        let values = variable
            .data
            .view()
            .into_dimensionality::<Ix2>()
            .map_err(|_| not_2d())?;
        let [x, y] = variable.dims() else {
            return Err(not_2d().into());
        };
        Ok(CoordGrid {
            dims: [x.clone(), y.clone()],
            values: CowArray::from(values),
        })
    }

    fn label_at(&self, dim: &str, position: usize) -> Result<Label> {
        let labels = self
            .indexes
            .get(dim)
            .ok_or_else(|| ConfigurationError::MissingIndexDimension(dim.to_string()))?;
        labels.get(position).ok_or_else(|| {
            ContainerError::PositionOutOfRange {
                dim: dim.to_string(),
                position,
                len: labels.len(),
            }
            .into()
        })
    }

    fn sel(&self, indexers: Vec<(String, Label)>, options: &SelectOptions) -> Result<Dataset> {
        Dataset::sel(self, indexers, options)
    }
}

/// A single named variable with the coordinates that describe it.
#[derive(Clone, Debug, PartialEq)]
pub struct DataArray {
    name: String,
    dataset: Dataset,
}

impl DataArray {
    pub fn new(name: &str, variable: Variable) -> Result<Self> {
        Ok(Self {
            name: name.to_string(),
            dataset: Dataset::new().with_data_var(name, variable)?,
        })
    }

    pub fn with_index(mut self, dim: &str, labels: impl Into<Labels>) -> Result<Self> {
        self.dataset.set_index(dim, labels)?;
        Ok(self)
    }

    pub fn with_coord(self, name: &str, variable: Variable) -> Result<Self> {
        Ok(Self {
            dataset: self.dataset.with_coord(name, variable)?,
            ..self
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn variable(&self) -> &Variable {
        // the wrapped dataset always holds the named variable
        &self.dataset.data_vars[&self.name]
    }

    pub fn item(&self) -> Option<f64> {
        self.variable().item()
    }

    pub fn into_dataset(self) -> Dataset {
        self.dataset
    }

    delegate! {
        to self.dataset {
            pub fn dims(&self) -> &BTreeMap<String, usize>;
            pub fn dim_size(&self, dim: &str) -> Option<usize>;
            pub fn index(&self, dim: &str) -> Option<&Labels>;
            pub fn coord(&self, name: &str) -> Option<&Variable>;
            pub fn label(&self, dim: &str) -> Option<&Label>;
        }
    }

    pub fn sel<S>(
        &self,
        indexers: impl IntoIterator<Item = (S, Label)>,
        options: &SelectOptions,
    ) -> Result<DataArray>
    where
        S: Into<String>,
    {
        Ok(Self {
            name: self.name.clone(),
            dataset: self.dataset.sel(indexers, options)?,
        })
    }
}

impl LabeledArray for DataArray {
    type Label = Label;
    type SelectOptions = SelectOptions;
    type Selection = DataArray;

    delegate! {
        to self.dataset {
            fn has_index(&self, name: &str) -> bool;
            fn has_coord(&self, name: &str) -> bool;
            fn coord_grid(&self, name: &str) -> Result<CoordGrid<'_>>;
            fn label_at(&self, dim: &str, position: usize) -> Result<Label>;
        }
    }

    fn sel(&self, indexers: Vec<(String, Label)>, options: &SelectOptions) -> Result<DataArray> {
        DataArray::sel(self, indexers, options)
    }
}
