pub mod forecast_service;
pub mod store;

pub use forecast_service::ForecastService;
pub use store::ForecastStore;
