use cost_forecaster::forecaster::smoothing::HoltWintersForecaster;
use cost_forecaster::{ForecastService, ForecasterConfig};
use meridian_types::{DataPoint, Dimension, Period, TimeSeries};

fn generate_seasonal_data(count: usize) -> Vec<f64> {
    (0..count)
        .map(|i| {
            let base = 50.0;
            let trend = i as f64 * 0.1;
            let seasonal = ((i as f64 * 2.0 * std::f64::consts::PI) / 7.0).sin() * 10.0;
            base + trend + seasonal
        })
        .collect()
}

fn series_from(values: &[f64]) -> TimeSeries {
    let origin = chrono::DateTime::parse_from_rfc3339("2024-03-01T00:00:00Z")
        .unwrap()
        .with_timezone(&chrono::Utc);
    let mut series = TimeSeries::new("test");
    for (i, &v) in values.iter().enumerate() {
        series.add_point(DataPoint::new(
            Period::from_timestamp(origin + chrono::Duration::hours(i as i64)),
            v,
        ));
    }
    series
}

#[test]
fn test_confidence_bands_widen_day_1_to_day_30() {
    let config = ForecasterConfig {
        min_history: 14,
        horizon: 30,
        seasonal_period: Some(7),
        alpha: 0.3,
        beta: 0.1,
        gamma: 0.1,
        confidence_z: 1.96,
        model_version: "it-1".to_string(),
    };
    let service = ForecastService::new(config);
    let dim = Dimension::service("123", "EC2");

    let series = service
        .run(&dim, &series_from(&generate_seasonal_data(90)))
        .unwrap();

    let day1 = series.width_at(0).unwrap();
    let day30 = series.width_at(29).unwrap();
    assert!(
        day30 > day1,
        "interval must widen with horizon: {} vs {}",
        day1,
        day30
    );
}

#[test]
fn test_full_replacement_semantics() {
    let service = ForecastService::new(ForecasterConfig {
        min_history: 14,
        horizon: 10,
        seasonal_period: None,
        alpha: 0.3,
        beta: 0.1,
        gamma: 0.1,
        confidence_z: 1.96,
        model_version: "it-1".to_string(),
    });
    let dim = Dimension::account("acct");

    let flat: Vec<f64> = vec![100.0; 30];
    let rising: Vec<f64> = (0..30).map(|i| 100.0 + i as f64 * 5.0).collect();

    service.run(&dim, &series_from(&flat)).unwrap();
    let replaced = service.run(&dim, &series_from(&rising)).unwrap();

    // The latest series reflects only the new history, no partial update
    assert_eq!(service.store().latest(&dim).unwrap(), replaced);
    assert!(replaced.point_estimates[9] > 200.0);

    // The superseded run is still retained for backtesting
    assert_eq!(service.store().history(&dim).len(), 2);
}

#[test]
fn test_model_is_deterministic_for_identical_input() {
    let data = generate_seasonal_data(60);

    let run = || {
        let mut forecaster = HoltWintersForecaster::new(0.3, 0.1, 0.1, Some(7));
        forecaster.train(&data).unwrap();
        forecaster.forecast_with_intervals(30, 1.96).unwrap()
    };

    let a = run();
    let b = run();
    assert_eq!(a.point_forecast, b.point_forecast);
    assert_eq!(a.lower_bound, b.lower_bound);
    assert_eq!(a.upper_bound, b.upper_bound);
}
