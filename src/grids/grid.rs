pub trait Grid2D {
    /// Number of cells along the x dimension, the first grid axis.
    fn nx(&self) -> usize;
    /// Number of cells along the y dimension, the second grid axis.
    fn ny(&self) -> usize;
    /// Get lat, lon coordinates for a given grid point, `None` outside the grid
    fn get_coordinates_2d(&self, grid_x: usize, grid_y: usize) -> Option<(f64, f64)>;
    /// Find nearest gridpoint index for (lat, lon)
    fn find_point_xy(&self, lat: f64, lon: f64) -> Option<(usize, usize)>;

    /// Row-major flat index of the nearest grid point, `x * ny + y`.
    fn find_point(&self, lat: f64, lon: f64) -> Option<usize> {
        let (x, y) = self.find_point_xy(lat, lon)?;
        Some(x * self.ny() + y)
    }
}
