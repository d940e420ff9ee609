//! Data layer for the weather widget.
//!
//! This crate defines:
//! - Configuration & credentials handling
//! - An HTTP client that injects the API key and normalizes failures
//! - Total mappers from upstream payloads to `Weather` and `City`
//! - Persistence of the saved-city list
//! - Geolocation with a bounded wait
//! - The service operations a host calls
//!
//! It is used by `weather-widget-cli`, but can also be embedded in other hosts.

pub mod config;
pub mod geolocation;
pub mod http;
pub mod mapper;
pub mod model;
pub mod service;
pub mod storage;

pub use config::Config;
pub use geolocation::{GeolocationResolver, LocationError, PositionSource};
pub use http::{ApiConfig, ApiError, HttpClient};
pub use model::{City, Coordinates, StoredConfig, Weather};
pub use service::{WeatherService, openweather::OpenWeatherService, service_from_config};
pub use storage::{CityStorage, FileStore, KeyValueStore, MemoryStore, StorageError};
