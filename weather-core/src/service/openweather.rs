use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

use crate::{
    geolocation::{GeolocationResolver, LocationError},
    http::{ApiError, HttpClient},
    mapper::{map_city, map_weather},
    model::{City, Coordinates, Weather},
};

use super::WeatherService;

pub const WEATHER_PATH: &str = "/data/2.5/weather";
pub const CITY_SEARCH_PATH: &str = "/geo/1.0/direct";
pub const CITY_SEARCH_LIMIT: u8 = 5;

#[derive(Debug, Serialize)]
struct WeatherQuery {
    lat: f64,
    lon: f64,
    units: &'static str,
}

#[derive(Debug, Serialize)]
struct CitySearchQuery<'a> {
    q: &'a str,
    limit: u8,
}

#[derive(Debug, Clone)]
pub struct OpenWeatherService {
    http: HttpClient,
    geolocation: GeolocationResolver,
}

impl OpenWeatherService {
    pub fn new(http: HttpClient, geolocation: GeolocationResolver) -> Self {
        Self { http, geolocation }
    }

    pub fn http(&self) -> &HttpClient {
        &self.http
    }
}

#[async_trait]
impl WeatherService for OpenWeatherService {
    async fn get_weather_by_coords(&self, lat: f64, lon: f64) -> Result<Weather, ApiError> {
        let query = WeatherQuery {
            lat,
            lon,
            units: "metric",
        };
        let body = self.http.get(WEATHER_PATH, &query).await?;

        Ok(map_weather(&body))
    }

    async fn search_city(&self, query: &str) -> Result<Vec<City>, ApiError> {
        if query.trim().is_empty() {
            return Ok(Vec::new());
        }

        let query = CitySearchQuery {
            q: query,
            limit: CITY_SEARCH_LIMIT,
        };
        let body = self.http.get(CITY_SEARCH_PATH, &query).await?;

        let cities: Vec<City> = match body {
            Value::Array(items) => items.iter().map(map_city).collect(),
            _ => Vec::new(),
        };

        tracing::debug!(query = query.q, count = cities.len(), "city search finished");
        Ok(cities)
    }

    async fn get_current_location(&self) -> Result<Coordinates, LocationError> {
        self.geolocation.get_current_location().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geolocation::{PositionSource, StaticPositionSource};
    use crate::http::ApiConfig;
    use serde_json::json;
    use std::sync::Arc;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn service_for(server: &MockServer) -> OpenWeatherService {
        let http = HttpClient::new(ApiConfig {
            base_url: server.uri(),
            api_key: "KEY".to_string(),
        })
        .unwrap();

        OpenWeatherService::new(http, GeolocationResolver::unsupported())
    }

    fn weather_body() -> Value {
        json!({
            "coord": { "lon": 30.52, "lat": 50.45 },
            "weather": [{ "description": "clear sky", "icon": "01d" }],
            "main": { "temp": 20, "feels_like": 19.5, "pressure": 1015, "humidity": 50 },
            "visibility": 10000,
            "wind": { "speed": 3.1, "deg": 180 },
            "sys": { "country": "UA" },
            "name": "Kyiv"
        })
    }

    #[tokio::test]
    async fn weather_by_coords_requests_metric_units() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path(WEATHER_PATH))
            .and(query_param("lat", "50.45"))
            .and(query_param("lon", "30.52"))
            .and(query_param("units", "metric"))
            .and(query_param("appid", "KEY"))
            .respond_with(ResponseTemplate::new(200).set_body_json(weather_body()))
            .expect(1)
            .mount(&server)
            .await;

        let weather = service_for(&server).get_weather_by_coords(50.45, 30.52).await.unwrap();

        assert_eq!(weather.city_id, "50.45-30.52");
        assert_eq!(weather.city_name, "Kyiv");
        assert_eq!(weather.dew_point, 10.0);
        assert_eq!(weather.visibility, 10.0);
        assert_eq!(weather.description, "clear sky");
    }

    #[tokio::test]
    async fn weather_by_city_uses_coordinates() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path(WEATHER_PATH))
            .and(query_param("lat", "50.45"))
            .and(query_param("lon", "30.52"))
            .respond_with(ResponseTemplate::new(200).set_body_json(weather_body()))
            .expect(1)
            .mount(&server)
            .await;

        let city = City::new("Kyiv", "UA", 50.45, 30.52);
        let weather = service_for(&server).get_weather_by_city(&city).await.unwrap();

        assert_eq!(weather.city_id, city.id());
    }

    #[tokio::test]
    async fn server_error_propagates_unchanged() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path(WEATHER_PATH))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let err = service_for(&server).get_weather_by_coords(1.0, 2.0).await.unwrap_err();

        assert!(matches!(err, ApiError::Server));
        assert_eq!(err.to_string(), "Server error. Please try again later.");
    }

    #[tokio::test]
    async fn search_city_maps_results_in_order() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path(CITY_SEARCH_PATH))
            .and(query_param("q", "Springfield"))
            .and(query_param("limit", "5"))
            .and(query_param("appid", "KEY"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                { "name": "Springfield", "country": "US", "lat": 39.7990, "lon": -89.6440 },
                { "name": "Springfield", "country": "US", "lat": 37.2090, "lon": -93.2923 },
                { "name": "Springfield" }
            ])))
            .expect(1)
            .mount(&server)
            .await;

        let cities = service_for(&server).search_city("Springfield").await.unwrap();
        let ids: Vec<_> = cities.iter().map(City::id).collect();

        assert_eq!(ids, ["39.799--89.644", "37.209--93.2923", "0-0"]);
        assert_eq!(cities[2].country(), "");
    }

    #[tokio::test]
    async fn search_city_without_results_is_empty() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path(CITY_SEARCH_PATH))
            .and(query_param("q", "Nowhere"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path(CITY_SEARCH_PATH))
            .and(query_param("q", "Odd"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "list": [] })))
            .mount(&server)
            .await;

        let service = service_for(&server);

        assert!(service.search_city("Nowhere").await.unwrap().is_empty());
        assert!(service.search_city("Odd").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn blank_search_sends_no_request() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(400))
            .expect(0)
            .mount(&server)
            .await;

        let service = service_for(&server);

        assert!(service.search_city("").await.unwrap().is_empty());
        assert!(service.search_city("   ").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn current_location_delegates_to_resolver() {
        let server = MockServer::start().await;
        let here = Coordinates {
            lat: 1.5,
            lon: -2.5,
        };
        let source: Arc<dyn PositionSource> = Arc::new(StaticPositionSource::new(here));

        let located = OpenWeatherService::new(
            service_for(&server).http().clone(),
            GeolocationResolver::new(Some(source)),
        );

        assert_eq!(located.get_current_location().await, Ok(here));
        assert_eq!(
            service_for(&server).get_current_location().await,
            Err(LocationError::NotSupported)
        );
    }
}
