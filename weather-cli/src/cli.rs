use anyhow::{Context, bail};
use clap::{Args, Parser, Subcommand};
use inquire::{Password, Select, Text};
use weather_widget_core::{
    City, CityStorage, Config, Coordinates, FileStore, KeyValueStore, OpenWeatherService,
    Weather, WeatherService, service_from_config,
};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weather-widget", version, about = "Weather widget data layer")]
pub struct Cli {
    /// Print results as JSON instead of text.
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store the API key (and optionally base URL) in the config file.
    Configure,

    /// Show weather for coordinates, or for the current location.
    Weather(CoordsArgs),

    /// Search cities by name.
    Search {
        query: String,
    },

    /// Print the current device location.
    Locate,

    /// Manage the saved city list.
    #[command(subcommand)]
    Cities(CitiesCommand),
}

#[derive(Debug, Args)]
pub struct CoordsArgs {
    #[arg(long, requires = "lon", allow_hyphen_values = true)]
    pub lat: Option<f64>,

    #[arg(long, requires = "lat", allow_hyphen_values = true)]
    pub lon: Option<f64>,
}

#[derive(Debug, Subcommand)]
pub enum CitiesCommand {
    /// List saved cities.
    List,

    /// Search for a city and save the chosen match.
    Add {
        query: String,
    },

    /// Remove a saved city by id (`<lat>-<lon>`).
    Remove {
        #[arg(allow_hyphen_values = true)]
        id: String,
    },

    /// Forget every saved city.
    Clear,

    /// Show weather for every saved city.
    Weather,
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match &self.command {
            Command::Configure => configure()?,
            Command::Weather(args) => {
                let service = load_service()?;
                let coordinates = match (args.lat, args.lon) {
                    (Some(lat), Some(lon)) => Coordinates { lat, lon },
                    _ => service.get_current_location().await?,
                };
                let weather = service
                    .get_weather_by_coords(coordinates.lat, coordinates.lon)
                    .await?;
                self.print_weather(&weather)?;
            }
            Command::Search { query } => {
                let cities = load_service()?.search_city(query).await?;
                self.print_cities(&cities)?;
            }
            Command::Locate => {
                let coordinates = load_service()?.get_current_location().await?;
                if self.json {
                    println!("{}", serde_json::to_string_pretty(&coordinates)?);
                } else {
                    println!("{}, {}", coordinates.lat, coordinates.lon);
                }
            }
            Command::Cities(command) => {
                let storage = CityStorage::new(FileStore::open_default()?);
                self.run_cities(command, &storage).await?;
            }
        }

        Ok(())
    }

    async fn run_cities<S: KeyValueStore>(
        &self,
        command: &CitiesCommand,
        storage: &CityStorage<S>,
    ) -> anyhow::Result<()> {
        match command {
            CitiesCommand::List => self.print_cities(&storage.cities())?,
            CitiesCommand::Add { query } => {
                let mut matches = load_service()?.search_city(query).await?;
                let city = match matches.len() {
                    0 => bail!("No cities found for '{query}'."),
                    1 => matches.remove(0),
                    _ => Select::new("Select a city:", matches)
                        .prompt()
                        .context("City selection cancelled")?,
                };

                if storage.add_city(city.clone())? {
                    println!("Saved {city}");
                } else {
                    println!("{city} is already saved");
                }
            }
            CitiesCommand::Remove { id } => {
                if !storage.remove_city(id)? {
                    bail!("No saved city with id '{id}'.");
                }
                println!("Removed {id}");
            }
            CitiesCommand::Clear => {
                storage.clear()?;
                println!("Saved cities cleared");
            }
            CitiesCommand::Weather => {
                let cities = storage.cities();
                if cities.is_empty() {
                    println!("No saved cities. Add one with `weather-widget cities add <name>`.");
                    return Ok(());
                }

                let service = load_service()?;
                for city in &cities {
                    match service.get_weather_by_city(city).await {
                        Ok(weather) => self.print_weather(&weather)?,
                        Err(err) => eprintln!("{}: {err}", city.name()),
                    }
                }
            }
        }

        Ok(())
    }

    fn print_weather(&self, weather: &Weather) -> anyhow::Result<()> {
        if self.json {
            println!("{}", serde_json::to_string_pretty(weather)?);
            return Ok(());
        }

        let place = if weather.country.is_empty() {
            weather.city_name.clone()
        } else {
            format!("{}, {}", weather.city_name, weather.country)
        };

        println!("{place}");
        println!(
            "  {:.1}°C (feels like {:.1}°C), {}",
            weather.temp, weather.feels_like, weather.description
        );
        println!("  Humidity {}%  Dew point {:.1}°C", weather.humidity, weather.dew_point);
        println!(
            "  Wind {} m/s at {}°  Pressure {} hPa",
            weather.wind_speed, weather.wind_deg, weather.pressure
        );
        println!("  Visibility {:.1} km", weather.visibility);
        Ok(())
    }

    fn print_cities(&self, cities: &[City]) -> anyhow::Result<()> {
        if self.json {
            println!("{}", serde_json::to_string_pretty(cities)?);
            return Ok(());
        }

        if cities.is_empty() {
            println!("No cities.");
        }
        for city in cities {
            println!("{:<24} {city}", city.id());
        }
        Ok(())
    }
}

/// Config file values with environment overrides applied.
fn load_service() -> anyhow::Result<OpenWeatherService> {
    let config = Config::load()?.with_env();
    service_from_config(&config, config.position_source())
}

fn configure() -> anyhow::Result<()> {
    let mut config = Config::load()?;

    let api_key = Password::new("OpenWeather API key:")
        .without_confirmation()
        .prompt()
        .context("Configuration cancelled")?;
    let base_url = Text::new("API base URL:")
        .with_default(&config.api.base_url)
        .prompt()
        .context("Configuration cancelled")?;

    config.set_api_key(api_key.trim().to_string());
    config.api.base_url = base_url.trim().to_string();
    config.api_config()?;
    config.save()?;

    println!("Saved configuration to {}", Config::config_file_path()?.display());
    Ok(())
}
