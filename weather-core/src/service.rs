use crate::{
    Config,
    geolocation::{GeolocationResolver, LocationError, PositionSource},
    http::{ApiError, HttpClient},
    model::{City, Coordinates, Weather},
    service::openweather::OpenWeatherService,
};
use async_trait::async_trait;
use std::{fmt::Debug, sync::Arc};

pub mod openweather;

/// Everything the host needs besides the saved-city storage.
#[async_trait]
pub trait WeatherService: Send + Sync + Debug {
    async fn get_weather_by_coords(&self, lat: f64, lon: f64) -> Result<Weather, ApiError>;

    /// Cities are always looked up by coordinates, never by id.
    async fn get_weather_by_city(&self, city: &City) -> Result<Weather, ApiError> {
        self.get_weather_by_coords(city.lat(), city.lon()).await
    }

    /// Up to five matches in upstream order. A blank query matches nothing.
    async fn search_city(&self, query: &str) -> Result<Vec<City>, ApiError>;

    async fn get_current_location(&self) -> Result<Coordinates, LocationError>;
}

/// Construct the OpenWeather-backed service from config.
///
/// `position` is the device capability; `None` makes location requests fail as unsupported.
pub fn service_from_config(
    config: &Config,
    position: Option<Arc<dyn PositionSource>>,
) -> anyhow::Result<OpenWeatherService> {
    let http = HttpClient::new(config.api_config()?)?;
    let geolocation = GeolocationResolver::new(position)
        .with_options(config.geolocation.position_options())
        .with_deadline(config.geolocation.deadline());

    Ok(OpenWeatherService::new(http, geolocation))
}
