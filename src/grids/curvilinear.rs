use ndarray::{Array2, ArrayView2};
use tracing::debug;

use crate::{
    ball_tree::BallTree,
    errors::{ConfigurationError, Result},
    grids::grid::Grid2D,
    metric::Metric,
    units::{self, UnitWarning},
};

/// The grid cell closest to a target point.
#[derive(Clone, Debug, PartialEq)]
pub struct NearestCell {
    /// Position along the first grid axis.
    pub i: usize,
    /// Position along the second grid axis.
    pub j: usize,
    /// Row-major index, `i * J + j`.
    pub flat_index: usize,
    /// Metric distance to the target; radians of arc for haversine.
    pub distance: f64,
    pub warnings: Vec<UnitWarning>,
}

/// A curvilinear grid: one latitude and one longitude per cell of an
/// `I × J` index grid, with a ball tree built over the cells.
///
/// Building the tree is the expensive part, so a grid can be kept around to
/// answer many queries.
pub struct CurvilinearGrid {
    lat: Array2<f64>,
    lon: Array2<f64>,
    tree: BallTree,
    grid_max: [Option<f64>; 2],
}

impl CurvilinearGrid {
    pub fn new(
        lat: ArrayView2<f64>,
        lon: ArrayView2<f64>,
        metric: Metric,
        leaf_size: usize,
    ) -> Result<Self> {
        if lat.shape() != lon.shape() {
            return Err(ConfigurationError::ShapeMismatch {
                lat: lat.shape().to_vec(),
                lon: lon.shape().to_vec(),
            }
            .into());
        }

        // Logical iteration order is row-major whatever the memory layout,
        // which is what `flat_index / J, flat_index % J` relies on.
        // Pairs are (lat, lon): haversine is not symmetric in its arguments.
        let points: Vec<[f64; 2]> = lat
            .iter()
            .zip(lon.iter())
            .map(|(&la, &lo)| match metric {
                Metric::Haversine => [la.to_radians(), lo.to_radians()],
                _ => [la, lo],
            })
            .collect();

        let grid_max = if metric.is_haversine() {
            [units::nan_max(lat.iter()), units::nan_max(lon.iter())]
        } else {
            [None, None]
        };

        let tree = BallTree::new(points, leaf_size, metric)?;
        Ok(Self {
            lat: lat.to_owned(),
            lon: lon.to_owned(),
            tree,
            grid_max,
        })
    }

    pub fn metric(&self) -> Metric {
        self.tree.metric()
    }

    pub fn leaf_size(&self) -> usize {
        self.tree.leaf_size()
    }

    /// The grid cell closest to (`lat`, `lon`).
    ///
    /// With the haversine metric the target is taken to be in degrees and any
    /// value that looks like radians is reported in `warnings`.
    pub fn nearest(&self, lat: f64, lon: f64) -> Result<NearestCell> {
        let metric = self.metric();
        let (warnings, query) = match metric {
            Metric::Haversine => (
                units::check_degrees(self.grid_max, [lat, lon]),
                [lat.to_radians(), lon.to_radians()],
            ),
            _ => (Vec::new(), [lat, lon]),
        };

        let neighbor = self.tree.query_nearest(&query)?;
        let columns = self.lat.ncols();
        let cell = NearestCell {
            i: neighbor.index / columns,
            j: neighbor.index % columns,
            flat_index: neighbor.index,
            distance: neighbor.distance,
            warnings,
        };
        debug!(
            target_lat = lat,
            target_lon = lon,
            i = cell.i,
            j = cell.j,
            distance = cell.distance,
            "nearest grid cell"
        );
        Ok(cell)
    }
}

impl Grid2D for CurvilinearGrid {
    fn nx(&self) -> usize {
        self.lat.nrows()
    }

    fn ny(&self) -> usize {
        self.lat.ncols()
    }

    fn get_coordinates_2d(&self, grid_x: usize, grid_y: usize) -> Option<(f64, f64)> {
        Some((*self.lat.get((grid_x, grid_y))?, *self.lon.get((grid_x, grid_y))?))
    }

    /// Any error of [`CurvilinearGrid::nearest`], such as a non-finite
    /// target, is reported as `None`; call `nearest` to see it.
    fn find_point_xy(&self, lat: f64, lon: f64) -> Option<(usize, usize)> {
        let cell = self.nearest(lat, lon).ok()?;
        Some((cell.i, cell.j))
    }
}
