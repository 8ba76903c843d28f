use std::{fmt, str::FromStr};

use crate::errors::ConfigurationError;

/// Distance metric used to build and query the spatial index.
///
/// `Haversine` expects `(lat, lon)` pairs in radians and returns the central
/// angle between them. Every other metric works on the raw coordinate values.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum Metric {
    #[default]
    Haversine,
    Euclidean,
    Manhattan,
    Chebyshev,
    Minkowski(f64),
}

impl Metric {
    pub fn as_str(&self) -> &str {
        match self {
            Metric::Haversine => "haversine",
            Metric::Euclidean => "euclidean",
            Metric::Manhattan => "manhattan",
            Metric::Chebyshev => "chebyshev",
            Metric::Minkowski(_) => "minkowski",
        }
    }

    pub fn is_haversine(&self) -> bool {
        matches!(self, Metric::Haversine)
    }

    /// Distance between two `[lat, lon]` points.
    pub fn distance(&self, a: &[f64; 2], b: &[f64; 2]) -> f64 {
        match self {
            Metric::Haversine => haversine(a, b),
            Metric::Euclidean => ((a[0] - b[0]).powi(2) + (a[1] - b[1]).powi(2)).sqrt(),
            Metric::Manhattan => (a[0] - b[0]).abs() + (a[1] - b[1]).abs(),
            Metric::Chebyshev => (a[0] - b[0]).abs().max((a[1] - b[1]).abs()),
            Metric::Minkowski(p) => {
                ((a[0] - b[0]).abs().powf(*p) + (a[1] - b[1]).abs().powf(*p)).powf(1.0 / p)
            }
        }
    }
}

// Order matters: the first coordinate is the latitude.
fn haversine(a: &[f64; 2], b: &[f64; 2]) -> f64 {
    let sin_dlat = ((b[0] - a[0]) * 0.5).sin();
    let sin_dlon = ((b[1] - a[1]) * 0.5).sin();
    let h = sin_dlat * sin_dlat + a[0].cos() * b[0].cos() * sin_dlon * sin_dlon;
    2.0 * h.clamp(0.0, 1.0).sqrt().asin()
}

impl FromStr for Metric {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "haversine" => Ok(Metric::Haversine),
            "euclidean" => Ok(Metric::Euclidean),
            "manhattan" | "cityblock" | "l1" => Ok(Metric::Manhattan),
            "chebyshev" | "infinity" => Ok(Metric::Chebyshev),
            "minkowski" => Ok(Metric::Minkowski(2.0)),
            _ => Err(ConfigurationError::UnknownMetric(s.to_string())),
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Metric::Minkowski(p) => write!(f, "minkowski(p={})", p),
            _ => f.write_str(self.as_str()),
        }
    }
}
