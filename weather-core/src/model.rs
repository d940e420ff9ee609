use serde::{Deserialize, Serialize};

/// Identity shared by [`City::id`] and [`Weather::city_id`]: `"<lat>-<lon>"`.
///
/// Two places with the same coordinates always collapse to the same id,
/// whatever their display names are.
pub fn coordinate_id(lat: f64, lon: f64) -> String {
    format!("{}-{}", format_coordinate(lat), format_coordinate(lon))
}

// Shortest round-trip form, so `10.0` renders as `10`. Negative zero renders as `0`.
fn format_coordinate(value: f64) -> String {
    if value == 0.0 {
        "0".to_string()
    } else {
        value.to_string()
    }
}

/// A place the user can select and save.
///
/// The id is derived from the coordinates and cannot be set on its own;
/// deserializing a city re-derives it and ignores any stored id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "CityRecord")]
pub struct City {
    id: String,
    name: String,
    country: String,
    lat: f64,
    lon: f64,
}

impl City {
    pub fn new(name: impl Into<String>, country: impl Into<String>, lat: f64, lon: f64) -> Self {
        Self {
            id: coordinate_id(lat, lon),
            name: name.into(),
            country: country.into(),
            lat,
            lon,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn country(&self) -> &str {
        &self.country
    }

    pub fn lat(&self) -> f64 {
        self.lat
    }

    pub fn lon(&self) -> f64 {
        self.lon
    }

    pub fn coordinates(&self) -> Coordinates {
        Coordinates {
            lat: self.lat,
            lon: self.lon,
        }
    }
}

impl std::fmt::Display for City {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.country.is_empty() {
            write!(f, "{} ({}, {})", self.name, self.lat, self.lon)
        } else {
            write!(f, "{}, {} ({}, {})", self.name, self.country, self.lat, self.lon)
        }
    }
}

/// On-disk shape of a city. `id` may be present but is never trusted.
#[derive(Debug, Deserialize)]
struct CityRecord {
    #[serde(default)]
    name: String,
    #[serde(default)]
    country: String,
    lat: f64,
    lon: f64,
}

impl From<CityRecord> for City {
    fn from(record: CityRecord) -> Self {
        City::new(record.name, record.country, record.lat, record.lon)
    }
}

/// Snapshot of current conditions for one location, in metric units.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Weather {
    pub city_id: String,
    pub city_name: String,
    pub country: String,
    pub temp: f64,
    pub feels_like: f64,
    pub description: String,
    pub humidity: f64,
    pub pressure: f64,
    pub wind_speed: f64,
    pub wind_deg: f64,
    /// Lawrence approximation: `temp - (100 - humidity) / 5`.
    pub dew_point: f64,
    /// Kilometers.
    pub visibility: f64,
    pub icon: String,
}

/// The single persisted record: the user's saved cities in display order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoredConfig {
    pub cities: Vec<City>,
}

/// A settled device position in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coordinate_id_uses_shortest_form() {
        assert_eq!(coordinate_id(51.5074, -0.1278), "51.5074--0.1278");
        assert_eq!(coordinate_id(10.0, 20.0), "10-20");
        assert_eq!(coordinate_id(-0.0, 0.0), "0-0");
    }

    #[test]
    fn same_coordinates_share_an_id() {
        let a = City::new("Kyiv", "UA", 50.45, 30.52);
        let b = City::new("Kiev", "", 50.45, 30.52);
        let c = City::new("Kyiv", "UA", 50.45, 30.53);

        assert_eq!(a.id(), b.id());
        assert_ne!(a.id(), c.id());
    }

    #[test]
    fn deserialized_city_rederives_id() {
        let json = r#"{"id":"forged","name":"Paris","country":"FR","lat":48.85,"lon":2.35}"#;
        let city: City = serde_json::from_str(json).unwrap();

        assert_eq!(city.id(), "48.85-2.35");
        assert_eq!(city.name(), "Paris");
    }

    #[test]
    fn city_serializes_with_id() {
        let city = City::new("Oslo", "NO", 59.91, 10.75);
        let value = serde_json::to_value(&city).unwrap();

        assert_eq!(value["id"], "59.91-10.75");
        assert_eq!(value["country"], "NO");
    }

    #[test]
    fn weather_serializes_camel_case() {
        let weather = Weather {
            city_id: "1-2".into(),
            city_name: "X".into(),
            country: String::new(),
            temp: 1.0,
            feels_like: 0.5,
            description: String::new(),
            humidity: 50.0,
            pressure: 1000.0,
            wind_speed: 3.0,
            wind_deg: 90.0,
            dew_point: -9.0,
            visibility: 10.0,
            icon: "01d".into(),
        };
        let value = serde_json::to_value(&weather).unwrap();

        assert_eq!(value["cityId"], "1-2");
        assert_eq!(value["feelsLike"], 0.5);
        assert_eq!(value["dewPoint"], -9.0);
    }
}
