pub mod forecast;

pub use forecast::{AccuracyMetrics, ForecastSeries};
