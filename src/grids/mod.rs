pub mod curvilinear;
pub mod grid;

pub use curvilinear::{CurvilinearGrid, NearestCell};
pub use grid::Grid2D;
