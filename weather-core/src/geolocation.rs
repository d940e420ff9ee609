//! Single-shot acquisition of the device position.
//!
//! The device capability is a [`PositionSource`]; `None` means the host has
//! no such capability. A request is bounded twice: by the device-level
//! [`PositionOptions::timeout`] and by an outer deadline that drops the device
//! request if it never answers.

use std::{fmt::Debug, sync::Arc, time::Duration};

use async_trait::async_trait;

use crate::model::Coordinates;

pub const DEFAULT_DEVICE_TIMEOUT: Duration = Duration::from_secs(8);
pub const DEFAULT_MAXIMUM_AGE: Duration = Duration::from_secs(300);
pub const DEFAULT_DEADLINE: Duration = Duration::from_secs(10);

/// Options handed to the device for a single position query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PositionOptions {
    pub timeout: Duration,
    /// Oldest cached position the device may answer with.
    pub maximum_age: Duration,
    pub enable_high_accuracy: bool,
}

impl Default for PositionOptions {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_DEVICE_TIMEOUT,
            maximum_age: DEFAULT_MAXIMUM_AGE,
            enable_high_accuracy: false,
        }
    }
}

/// Failure codes a device reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PositionErrorCode {
    PermissionDenied,
    PositionUnavailable,
    Timeout,
    Unknown,
}

#[async_trait]
pub trait PositionSource: Send + Sync + Debug {
    async fn current_position(
        &self,
        options: &PositionOptions,
    ) -> Result<Coordinates, PositionErrorCode>;
}

/// A position fixed in configuration.
#[derive(Debug, Clone, Copy)]
pub struct StaticPositionSource {
    coordinates: Coordinates,
}

impl StaticPositionSource {
    pub fn new(coordinates: Coordinates) -> Self {
        Self { coordinates }
    }
}

#[async_trait]
impl PositionSource for StaticPositionSource {
    async fn current_position(
        &self,
        _options: &PositionOptions,
    ) -> Result<Coordinates, PositionErrorCode> {
        Ok(self.coordinates)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum LocationError {
    #[error("Geolocation is not supported by this device")]
    NotSupported,

    #[error(
        "Failed to get location. Location permission denied. Please enable location access in your device settings."
    )]
    PermissionDenied,

    #[error(
        "Failed to get location. Location information unavailable. Please check your device settings."
    )]
    PositionUnavailable,

    /// The device gave up within its own timeout.
    #[error("Failed to get location. Location request timed out. Please try again.")]
    Timeout,

    /// The device never answered before the outer deadline.
    #[error("Location request timed out. Please try again or add city manually.")]
    DeadlineExceeded,

    #[error("Failed to get location. An unknown error occurred.")]
    Unknown,
}

impl LocationError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, LocationError::Timeout | LocationError::DeadlineExceeded)
    }
}

impl From<PositionErrorCode> for LocationError {
    fn from(code: PositionErrorCode) -> Self {
        match code {
            PositionErrorCode::PermissionDenied => LocationError::PermissionDenied,
            PositionErrorCode::PositionUnavailable => LocationError::PositionUnavailable,
            PositionErrorCode::Timeout => LocationError::Timeout,
            PositionErrorCode::Unknown => LocationError::Unknown,
        }
    }
}

#[derive(Debug, Clone)]
pub struct GeolocationResolver {
    source: Option<Arc<dyn PositionSource>>,
    options: PositionOptions,
    deadline: Duration,
}

impl GeolocationResolver {
    pub fn new(source: Option<Arc<dyn PositionSource>>) -> Self {
        Self {
            source,
            options: PositionOptions::default(),
            deadline: DEFAULT_DEADLINE,
        }
    }

    /// Resolver for a host without any position capability.
    pub fn unsupported() -> Self {
        Self::new(None)
    }

    pub fn with_options(mut self, options: PositionOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = deadline;
        self
    }

    pub fn is_supported(&self) -> bool {
        self.source.is_some()
    }

    pub async fn get_current_location(&self) -> Result<Coordinates, LocationError> {
        let Some(source) = &self.source else {
            tracing::warn!("geolocation requested but not supported");
            return Err(LocationError::NotSupported);
        };

        // Dropping the device future on timeout cancels it; the timer is dropped with it.
        let request = source.current_position(&self.options);
        let outcome = tokio::time::timeout(self.deadline, request).await;

        match outcome {
            Ok(Ok(coordinates)) => {
                tracing::debug!(lat = coordinates.lat, lon = coordinates.lon, "position acquired");
                Ok(coordinates)
            }
            Ok(Err(code)) => {
                tracing::warn!(?code, "device failed to provide a position");
                Err(code.into())
            }
            Err(_) => {
                tracing::warn!(deadline = ?self.deadline, "position request exceeded deadline");
                Err(LocationError::DeadlineExceeded)
            }
        }
    }
}
