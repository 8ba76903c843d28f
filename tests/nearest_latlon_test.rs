use approx::assert_relative_eq;
use nearest_latlon::{
    sel_nearest_latlon, units::ValueOrigin, ConfigurationError, DataArray, Dataset, Label,
    LocatorError, Metric, NearestOptions, SelectOptions, Variable,
};
use ndarray::{arr2, Array2, Array3};

type TestResult = Result<(), Box<dyn std::error::Error>>;

fn custom_dataset() -> nearest_latlon::Result<Dataset> {
    let lats = arr2(&[[10, 10, 10], [20, 20, 20], [30, 30, 30]]);
    let lons = arr2(&[[100, 110, 120], [100, 110, 120], [100, 110, 120]]);
    let data = Array2::from_shape_fn((3, 3), |(i, j)| i * 3 + j);
    Dataset::new()
        .with_data_var("var", Variable::new(&["x", "y"], data)?)?
        .with_coord("lat", Variable::new(&["x", "y"], lats)?)?
        .with_coord("lon", Variable::new(&["x", "y"], lons)?)?
        .with_index("x", vec![0i64, 1, 2])?
        .with_index("y", vec![0i64, 1, 2])
}

fn custom_dataarray() -> nearest_latlon::Result<DataArray> {
    let lats = arr2(&[[10, 10, 10], [20, 20, 20], [30, 30, 30]]);
    let lons = arr2(&[[100, 110, 120], [100, 110, 120], [100, 110, 120]]);
    let data = Array2::from_shape_fn((3, 3), |(i, j)| i * 3 + j);
    DataArray::new("var", Variable::new(&["x", "y"], data)?)?
        .with_coord("lat", Variable::new(&["x", "y"], lats)?)?
        .with_coord("lon", Variable::new(&["x", "y"], lons)?)?
        .with_index("x", vec![0i64, 1, 2])?
        .with_index("y", vec![0i64, 1, 2])
}

/// A curvilinear grid resembling a rotated-pole model domain over Belgium.
fn model_coords(nx: usize, ny: usize) -> (Array2<f64>, Array2<f64>) {
    let lat = Array2::from_shape_fn((nx, ny), |(i, j)| {
        49.0 + 0.025 * j as f64 + 0.004 * i as f64 - 0.00002 * (i * i) as f64
    });
    let lon = Array2::from_shape_fn((nx, ny), |(i, j)| {
        2.0 + 0.04 * i as f64 - 0.006 * j as f64 + 0.00003 * (i * j) as f64
    });
    (lat, lon)
}

fn model_domain(nx: usize, ny: usize) -> nearest_latlon::Result<Dataset> {
    let (lat, lon) = model_coords(nx, ny);
    let temperature = Array3::from_shape_fn((2, nx, ny), |(t, i, j)| {
        280.0 + t as f64 + 0.01 * i as f64 - 0.02 * j as f64
    });
    Dataset::new()
        .with_coord("lat", Variable::new(&["x", "y"], lat)?)?
        .with_coord("lon", Variable::new(&["x", "y"], lon)?)?
        .with_data_var("t2m", Variable::new(&["time", "x", "y"], temperature)?)?
        .with_index("x", (0..nx as i64).map(|i| i * 2500).collect::<Vec<_>>())?
        .with_index("y", (0..ny as i64).map(|j| j * 2500).collect::<Vec<_>>())?
        .with_index("time", vec![0.0f64, 3600.0])
}

#[test]
fn test_sel_nearest_latlon_dataset() -> TestResult {
    let ds = custom_dataset()?;
    let result = sel_nearest_latlon(&ds, [("lat", 21.0), ("lon", 111.0)], &NearestOptions::default())?;
    let selected = result.selection;

    assert_relative_eq!(selected.get("lat").and_then(Variable::item).unwrap(), 20.0);
    assert_relative_eq!(selected.get("lon").and_then(Variable::item).unwrap(), 110.0);
    assert_eq!(selected.get("var").and_then(Variable::item), Some(4.0));
    Ok(())
}

#[test]
fn test_sel_nearest_latlon_dataarray() -> TestResult {
    let da = custom_dataarray()?;
    let result = sel_nearest_latlon(&da, [("lat", 29.0), ("lon", 119.0)], &NearestOptions::default())?;
    let selected = result.selection;

    assert_relative_eq!(selected.coord("lat").and_then(Variable::item).unwrap(), 30.0);
    assert_relative_eq!(selected.coord("lon").and_then(Variable::item).unwrap(), 120.0);
    assert_eq!(selected.item(), Some(8.0));
    Ok(())
}

#[test]
fn test_exact_grid_point_is_returned() -> TestResult {
    let ds = model_domain(60, 45)?;
    let (lat, lon) = model_coords(60, 45);

    for (i, j) in [(0, 0), (59, 44), (31, 7), (12, 40)] {
        let target = [("lat", lat[[i, j]]), ("lon", lon[[i, j]])];
        let result = sel_nearest_latlon(&ds, target, &NearestOptions::default())?;
        assert_eq!(result.x_label, Label::Int(i as i64 * 2500));
        assert_eq!(result.y_label, Label::Int(j as i64 * 2500));
        assert_eq!(result.cell.distance, 0.0);
    }
    Ok(())
}

#[test]
fn test_selection_is_a_single_cell() -> TestResult {
    let ds = model_domain(30, 30)?;
    let result = sel_nearest_latlon(&ds, [("lat", 49.3), ("lon", 2.5)], &NearestOptions::default())?;
    let selected = result.selection;

    assert_eq!(selected.dim_size("x"), None);
    assert_eq!(selected.dim_size("y"), None);
    assert_eq!(selected.get("lat").map(Variable::size), Some(1));
    assert_eq!(selected.get("lon").map(Variable::size), Some(1));
    // untouched dimensions survive
    assert_eq!(selected.get("t2m").map(Variable::shape), Some(&[2][..]));
    Ok(())
}

#[test]
fn test_selected_cell_minimizes_the_metric() -> TestResult {
    let ds = model_domain(50, 40)?;
    let (lat, lon) = model_coords(50, 40);
    let targets = [[49.2, 2.3], [49.9, 3.1], [48.0, 0.0], [49.55, 2.71]];

    for metric in [Metric::Haversine, Metric::Euclidean, Metric::Chebyshev] {
        let convert = |a: f64, b: f64| match metric {
            Metric::Haversine => [a.to_radians(), b.to_radians()],
            _ => [a, b],
        };
        for target in targets {
            let options = NearestOptions::default().with_metric(metric).with_leaf_size(7);
            let result = sel_nearest_latlon(&ds, [("lat", target[0]), ("lon", target[1])], &options)?;
            let selected = result.selection;
            let t = convert(target[0], target[1]);
            let chosen = convert(
                selected.get("lat").and_then(Variable::item).unwrap(),
                selected.get("lon").and_then(Variable::item).unwrap(),
            );
            let best = metric.distance(&t, &chosen);
            for (&a, &b) in lat.iter().zip(lon.iter()) {
                assert!(best <= metric.distance(&t, &convert(a, b)) + 1e-12);
            }
        }
    }
    Ok(())
}

#[test]
fn test_repeated_calls_give_identical_results() -> TestResult {
    let ds = model_domain(20, 20)?;
    let before = ds.clone();
    let options = NearestOptions::default();
    let first = sel_nearest_latlon(&ds, [("lat", 49.21), ("lon", 2.33)], &options)?;
    let second = sel_nearest_latlon(&ds, [("lat", 49.21), ("lon", 2.33)], &options)?;

    assert_eq!(first.selection, second.selection);
    assert_eq!(first.cell, second.cell);
    assert_eq!(ds, before);
    Ok(())
}

#[test]
fn test_metric_switch() -> TestResult {
    // at 60°N a degree of longitude is half as long as a degree of latitude
    let lat = arr2(&[[60.0, 60.0], [61.2, 70.0]]);
    let lon = arr2(&[[11.8, 30.0], [10.0, 30.0]]);
    let ds = Dataset::new()
        .with_coord("lat", Variable::new(&["x", "y"], lat)?)?
        .with_coord("lon", Variable::new(&["x", "y"], lon)?)?
        .with_index("x", vec![0i64, 1])?
        .with_index("y", vec![0i64, 1])?;
    let target = [("lat", 60.0), ("lon", 10.0)];

    let haversine = sel_nearest_latlon(&ds, target, &NearestOptions::default())?;
    assert_eq!((haversine.cell.i, haversine.cell.j), (0, 0));

    let euclidean = sel_nearest_latlon(
        &ds,
        target,
        &NearestOptions::default().with_metric(Metric::Euclidean),
    )?;
    assert_eq!((euclidean.cell.i, euclidean.cell.j), (1, 0));
    assert_relative_eq!(euclidean.cell.distance, 1.2, epsilon = 1e-12);
    Ok(())
}

#[test]
fn test_raw_metrics_never_warn() -> TestResult {
    let ds = custom_dataset()?;
    let target = [("lat", 29.0), ("lon", 1.0)];

    let haversine = sel_nearest_latlon(&ds, target, &NearestOptions::default())?;
    assert_eq!(haversine.cell.warnings.len(), 1);

    for metric in [Metric::Euclidean, Metric::Manhattan, Metric::Minkowski(3.0)] {
        let result = sel_nearest_latlon(&ds, target, &NearestOptions::default().with_metric(metric))?;
        assert!(result.cell.warnings.is_empty());
        assert_eq!(result.selection.get("var").and_then(Variable::item), Some(6.0));
    }
    Ok(())
}

#[test]
fn test_radian_like_values_warn_but_succeed() -> TestResult {
    let ds = custom_dataset()?;
    // far west of the grid the great circle bends poleward
    let result = sel_nearest_latlon(&ds, [("lat", 29.0), ("lon", 1.0)], &NearestOptions::default())?;
    assert_eq!(result.selection.get("var").and_then(Variable::item), Some(6.0));
    assert_eq!(result.cell.warnings.len(), 1);
    assert_eq!(result.cell.warnings[0].origin, ValueOrigin::Target);
    Ok(())
}

#[test]
fn test_selection_options_are_forwarded() -> TestResult {
    let ds = model_domain(10, 10)?;
    let options = NearestOptions::<SelectOptions>::default()
        .with_select(SelectOptions::default().with_indexer("time", 3600.0).with_drop(true));
    let result = sel_nearest_latlon(&ds, [("lat", 49.1), ("lon", 2.2)], &options)?;
    let selected = result.selection;

    assert_eq!(selected.get("t2m").map(Variable::size), Some(1));
    assert_eq!(selected.dim_size("time"), None);
    assert_eq!(selected.label("x"), None);
    assert_eq!(selected.label("time"), None);
    Ok(())
}

#[test]
fn test_custom_names() -> TestResult {
    let lat = arr2(&[[50.0, 50.0], [51.0, 51.0]]);
    let lon = arr2(&[[4.0, 5.0], [4.0, 5.0]]);
    let ds = Dataset::new()
        .with_coord("latitude", Variable::new(&["rlat", "rlon"], lat)?)?
        .with_coord("longitude", Variable::new(&["rlat", "rlon"], lon)?)?
        .with_index("rlat", vec!["south".to_string(), "north".to_string()])?
        .with_index("rlon", vec![-0.5f64, 0.5])?;
    let options = NearestOptions::default()
        .with_dims("rlat", "rlon")
        .with_fields("latitude", "longitude");

    let result = sel_nearest_latlon(&ds, [("latitude", 50.9), ("longitude", 4.9)], &options)?;
    assert_eq!(result.x_label, Label::from("north"));
    assert_eq!(result.y_label, Label::Float(0.5));

    let err = sel_nearest_latlon(&ds, [("lat", 50.9), ("longitude", 4.9)], &options).unwrap_err();
    assert!(matches!(
        err,
        LocatorError::Configuration(ConfigurationError::UnknownTargetKey { .. })
    ));
    Ok(())
}

#[test]
fn test_spatial_field_that_is_an_index_is_rejected() -> TestResult {
    let ds = custom_dataset()?;
    let options = NearestOptions::default().with_fields("x", "lon");
    let err = sel_nearest_latlon(&ds, [("x", 1.0), ("lon", 110.0)], &options).unwrap_err();
    assert!(err.to_string().contains("x cannot be used"));
    Ok(())
}
