use std::{fmt, str::FromStr};

use crate::errors::ConfigurationError;

/// A single coordinate label, as used for exact-match selection.
#[derive(Clone, Debug, PartialEq)]
pub enum Label {
    Int(i64),
    Float(f64),
    Text(String),
}

impl Label {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Label::Int(v) => Some(*v as f64),
            Label::Float(v) => Some(*v),
            Label::Text(_) => None,
        }
    }
}

impl From<i64> for Label {
    fn from(value: i64) -> Self {
        Label::Int(value)
    }
}

impl From<i32> for Label {
    fn from(value: i32) -> Self {
        Label::Int(value.into())
    }
}

impl From<f64> for Label {
    fn from(value: f64) -> Self {
        Label::Float(value)
    }
}

impl From<&str> for Label {
    fn from(value: &str) -> Self {
        Label::Text(value.to_string())
    }
}

impl From<String> for Label {
    fn from(value: String) -> Self {
        Label::Text(value)
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Label::Int(v) => write!(f, "{}", v),
            Label::Float(v) => write!(f, "{}", v),
            Label::Text(v) => write!(f, "{:?}", v),
        }
    }
}

/// The label array of an index dimension.
#[derive(Clone, Debug, PartialEq)]
pub enum Labels {
    Int(Vec<i64>),
    Float(Vec<f64>),
    Text(Vec<String>),
}

impl Labels {
    pub fn len(&self) -> usize {
        match self {
            Labels::Int(v) => v.len(),
            Labels::Float(v) => v.len(),
            Labels::Text(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, position: usize) -> Option<Label> {
        match self {
            Labels::Int(v) => v.get(position).copied().map(Label::Int),
            Labels::Float(v) => v.get(position).copied().map(Label::Float),
            Labels::Text(v) => v.get(position).cloned().map(Label::Text),
        }
    }

    fn numeric(&self) -> Option<Vec<f64>> {
        match self {
            Labels::Int(v) => Some(v.iter().map(|&x| x as f64).collect()),
            Labels::Float(v) => Some(v.clone()),
            Labels::Text(_) => None,
        }
    }

    /// Position of `label` according to `method`.
    ///
    /// Inexact methods only apply to numeric labels; the first position wins
    /// when several labels qualify equally.
    pub fn position(&self, label: &Label, method: SelectMethod, tolerance: Option<f64>) -> Option<usize> {
        if let (Labels::Text(values), Label::Text(wanted)) = (self, label) {
            return values.iter().position(|v| v == wanted);
        }
        let values = self.numeric()?;
        let wanted = label.as_f64()?;

        let candidate = match method {
            SelectMethod::Exact => return values.iter().position(|&v| v == wanted),
            SelectMethod::Nearest => argbest(&values, |v| Some((v - wanted).abs())),
            SelectMethod::Pad => argbest(&values, |v| (v <= wanted).then_some(wanted - v)),
            SelectMethod::Backfill => argbest(&values, |v| (v >= wanted).then_some(v - wanted)),
        }?;
        match tolerance {
            Some(tolerance) if (values[candidate] - wanted).abs() > tolerance => None,
            _ => Some(candidate),
        }
    }
}

fn argbest(values: &[f64], gap: impl Fn(f64) -> Option<f64>) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, &v) in values.iter().enumerate() {
        if let Some(g) = gap(v) {
            if best.map_or(true, |(_, b)| g < b) {
                best = Some((i, g));
            }
        }
    }
    best.map(|(i, _)| i)
}

impl From<Vec<i64>> for Labels {
    fn from(value: Vec<i64>) -> Self {
        Labels::Int(value)
    }
}

impl From<Vec<f64>> for Labels {
    fn from(value: Vec<f64>) -> Self {
        Labels::Float(value)
    }
}

impl From<Vec<String>> for Labels {
    fn from(value: Vec<String>) -> Self {
        Labels::Text(value)
    }
}

/// How labels are matched during selection.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SelectMethod {
    #[default]
    Exact,
    Nearest,
    /// Largest label not above the requested value.
    Pad,
    /// Smallest label not below the requested value.
    Backfill,
}

impl FromStr for SelectMethod {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "exact" => Ok(SelectMethod::Exact),
            "nearest" => Ok(SelectMethod::Nearest),
            "pad" | "ffill" => Ok(SelectMethod::Pad),
            "backfill" | "bfill" => Ok(SelectMethod::Backfill),
            _ => Err(ConfigurationError::UnknownSelectMethod(s.to_string())),
        }
    }
}

/// Options forwarded untouched to the label-based selection.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SelectOptions {
    pub method: SelectMethod,
    pub tolerance: Option<f64>,
    /// Drop the selected index labels instead of keeping them as scalar coordinates.
    pub drop: bool,
    /// Selections on further dimensions, applied together with the spatial ones.
    pub extra_indexers: Vec<(String, Label)>,
}

impl SelectOptions {
    pub fn with_method(mut self, method: SelectMethod) -> Self {
        self.method = method;
        self
    }

    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = Some(tolerance);
        self
    }

    pub fn with_drop(mut self, drop: bool) -> Self {
        self.drop = drop;
        self
    }

    pub fn with_indexer(mut self, dim: impl Into<String>, label: impl Into<Label>) -> Self {
        self.extra_indexers.push((dim.into(), label.into()));
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_position() {
        let labels = Labels::from(vec![10i64, 20, 30]);
        assert_eq!(labels.position(&Label::Int(20), SelectMethod::Exact, None), Some(1));
        assert_eq!(labels.position(&Label::Float(30.0), SelectMethod::Exact, None), Some(2));
        assert_eq!(labels.position(&Label::Int(25), SelectMethod::Exact, None), None);
        assert_eq!(labels.position(&Label::from("20"), SelectMethod::Exact, None), None);

        let names = Labels::from(vec!["a".to_string(), "b".to_string()]);
        assert_eq!(names.position(&Label::from("b"), SelectMethod::Nearest, None), Some(1));
    }

    #[test]
    fn test_inexact_methods() {
        let labels = Labels::from(vec![0.0f64, 1.0, 2.0, 3.0]);
        let wanted = Label::Float(1.7);
        assert_eq!(labels.position(&wanted, SelectMethod::Nearest, None), Some(2));
        assert_eq!(labels.position(&wanted, SelectMethod::Pad, None), Some(1));
        assert_eq!(labels.position(&wanted, SelectMethod::Backfill, None), Some(2));
        assert_eq!(labels.position(&wanted, SelectMethod::Nearest, Some(0.1)), None);
        assert_eq!(labels.position(&Label::Float(-1.0), SelectMethod::Pad, None), None);
    }

    #[test]
    fn test_method_names() {
        assert_eq!("ffill".parse::<SelectMethod>(), Ok(SelectMethod::Pad));
        assert_eq!("bfill".parse::<SelectMethod>(), Ok(SelectMethod::Backfill));
        assert!("linear".parse::<SelectMethod>().is_err());
    }
}
