use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::{Validate, ValidationError};

fn default_adults() -> u8 {
    1
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum CabinClass {
    Economy,
    PremiumEconomy,
    Business,
    First,
}

/// Search criteria forwarded to the fare engine.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
#[validate(schema(function = "validate_travel_dates"))]
pub struct SearchFlightsDto {
    /// IATA code of the departure airport, e.g. `LHR`
    #[validate(length(equal = 3))]
    pub origin: String,
    /// IATA code of the arrival airport, e.g. `JFK`
    #[validate(length(equal = 3))]
    pub destination: String,
    pub departure_date: NaiveDate,
    pub return_date: Option<NaiveDate>,
    #[serde(default = "default_adults")]
    #[validate(range(min = 1, max = 9))]
    pub adults: u8,
    pub cabin: Option<CabinClass>,
}

fn validate_travel_dates(dto: &SearchFlightsDto) -> Result<(), ValidationError> {
    if dto.origin.eq_ignore_ascii_case(&dto.destination) {
        return Err(ValidationError::new("origin_equals_destination"));
    }
    if let Some(return_date) = dto.return_date
        && return_date < dto.departure_date
    {
        return Err(ValidationError::new("return_before_departure"));
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Flight {
    pub id: String,
    pub carrier: String,
    pub flight_number: String,
    pub origin: String,
    pub destination: String,
    pub departure: DateTime<Utc>,
    pub arrival: DateTime<Utc>,
    pub price: f64,
    pub currency: String,
}
