//! Total mappers from upstream OpenWeather payloads to [`Weather`] and [`City`].
//!
//! Upstream shape is not guaranteed, so every field is decoded through an
//! optional schema: a missing, `null` or wrongly-typed field becomes its
//! default and the mapping itself never fails.

use serde::de::{DeserializeOwned, Deserializer};
use serde::Deserialize;
use serde_json::Value;

use crate::model::{City, Weather, coordinate_id};

/// Decode a field if it has the expected type, otherwise treat it as absent.
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| serde_json::from_value(v).ok()))
}

/// Decode an object against its schema. Anything but an object, arrays
/// included, yields the all-default value.
fn decode<T: DeserializeOwned + Default>(value: &Value) -> T {
    if !value.is_object() {
        return T::default();
    }

    T::deserialize(value).unwrap_or_default()
}

fn decode_nested<T: DeserializeOwned + Default>(value: Option<&Value>) -> T {
    value.map(decode).unwrap_or_default()
}

#[derive(Debug, Default, Deserialize)]
struct RawCoord {
    #[serde(default, deserialize_with = "lenient")]
    lat: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    lon: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
struct RawSys {
    #[serde(default, deserialize_with = "lenient")]
    country: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct RawMain {
    #[serde(default, deserialize_with = "lenient")]
    temp: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    feels_like: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    humidity: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    pressure: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
struct RawCondition {
    #[serde(default, deserialize_with = "lenient")]
    description: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    icon: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct RawWind {
    #[serde(default, deserialize_with = "lenient")]
    speed: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    deg: Option<f64>,
}

/// `GET /data/2.5/weather` body.
#[derive(Debug, Default, Deserialize)]
struct RawWeather {
    #[serde(default)]
    coord: Option<Value>,
    #[serde(default, deserialize_with = "lenient")]
    name: Option<String>,
    #[serde(default)]
    sys: Option<Value>,
    #[serde(default)]
    main: Option<Value>,
    #[serde(default, deserialize_with = "lenient")]
    weather: Option<Vec<Value>>,
    #[serde(default)]
    wind: Option<Value>,
    #[serde(default, deserialize_with = "lenient")]
    visibility: Option<f64>,
}

/// One element of the `GET /geo/1.0/direct` array.
#[derive(Debug, Default, Deserialize)]
struct RawCity {
    #[serde(default, deserialize_with = "lenient")]
    name: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    country: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    lat: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    lon: Option<f64>,
}

pub fn map_weather(raw: &Value) -> Weather {
    let raw: RawWeather = decode(raw);

    let coord: RawCoord = decode_nested(raw.coord.as_ref());
    let main: RawMain = decode_nested(raw.main.as_ref());
    let wind: RawWind = decode_nested(raw.wind.as_ref());
    let sys: RawSys = decode_nested(raw.sys.as_ref());
    let condition: RawCondition = raw
        .weather
        .as_deref()
        .and_then(<[Value]>::first)
        .map(decode)
        .unwrap_or_default();

    let temp = main.temp.unwrap_or_default();
    let humidity = main.humidity.unwrap_or_default();

    Weather {
        city_id: coordinate_id(coord.lat.unwrap_or_default(), coord.lon.unwrap_or_default()),
        city_name: raw.name.unwrap_or_default(),
        country: sys.country.unwrap_or_default(),
        temp,
        feels_like: main.feels_like.unwrap_or_default(),
        description: condition.description.unwrap_or_default(),
        humidity,
        pressure: main.pressure.unwrap_or_default(),
        wind_speed: wind.speed.unwrap_or_default(),
        wind_deg: wind.deg.unwrap_or_default(),
        dew_point: temp - ((100.0 - humidity) / 5.0),
        visibility: raw.visibility.unwrap_or_default() / 1000.0,
        icon: condition.icon.unwrap_or_default(),
    }
}

pub fn map_city(raw: &Value) -> City {
    let raw: RawCity = decode(raw);

    City::new(
        raw.name.unwrap_or_default(),
        raw.country.unwrap_or_default(),
        raw.lat.unwrap_or_default(),
        raw.lon.unwrap_or_default(),
    )
}
