//! One-shot positioning

use super::Availability;
use crate::config::LOCATION_TIMEOUT;
use crate::database::Location;
use crate::error::LocationError;
use std::future::Future;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PositionOptions {
    pub enable_high_accuracy: bool,
    pub timeout: Duration,
}

impl Default for PositionOptions {
    fn default() -> Self {
        Self {
            enable_high_accuracy: true,
            timeout: LOCATION_TIMEOUT,
        }
    }
}

pub trait Geolocator: Send + Sync {
    fn availability(&self) -> Availability;

    fn current_position(
        &self,
        options: &PositionOptions,
    ) -> impl Future<Output = Result<Location, LocationError>> + Send;
}
