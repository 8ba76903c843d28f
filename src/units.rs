use std::{f64::consts::TAU, fmt};

use tracing::warn;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CoordinateKind {
    Latitude,
    Longitude,
}

impl CoordinateKind {
    fn as_str(&self) -> &str {
        match self {
            CoordinateKind::Latitude => "latitude",
            CoordinateKind::Longitude => "longitude",
        }
    }
}

/// Where the suspicious value came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ValueOrigin {
    Grid,
    Target,
}

/// Advisory notice that a value fed to the haversine path looks like it is
/// already in radians. The values are still treated as degrees.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct UnitWarning {
    pub origin: ValueOrigin,
    pub kind: CoordinateKind,
    pub value: f64,
}

impl fmt::Display for UnitWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.origin {
            ValueOrigin::Grid => write!(
                f,
                "The max {}: {} <= 2*pi, they are assumed to be in DEGREES.",
                self.kind.as_str(),
                self.value
            ),
            ValueOrigin::Target => write!(
                f,
                "The target {}: {} <= 2*pi, they are assumed to be in DEGREES.",
                self.kind.as_str(),
                self.value
            ),
        }
    }
}

/// Largest value ignoring NaN; `None` when nothing is comparable.
pub fn nan_max<'a>(values: impl IntoIterator<Item = &'a f64>) -> Option<f64> {
    values
        .into_iter()
        .copied()
        .filter(|v| !v.is_nan())
        .reduce(f64::max)
}

/// Flags values that are not larger than 2π and logs each flag.
pub fn check_degrees(grid_max: [Option<f64>; 2], target: [f64; 2]) -> Vec<UnitWarning> {
    let kinds = [CoordinateKind::Latitude, CoordinateKind::Longitude];
    let grid = kinds
        .iter()
        .zip(grid_max)
        .filter_map(|(&kind, max)| max.map(|value| (ValueOrigin::Grid, kind, value)));
    let target = kinds
        .iter()
        .zip(target)
        .map(|(&kind, value)| (ValueOrigin::Target, kind, value));

    grid.chain(target)
        .filter(|(_, _, value)| *value <= TAU)
        .map(|(origin, kind, value)| {
            let warning = UnitWarning {
                origin,
                kind,
                value,
            };
            warn!("{}", warning);
            warning
        })
        .collect()
}
