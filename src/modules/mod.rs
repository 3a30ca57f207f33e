pub mod flights;
pub mod status;

pub use self::flights::model::{Flight, SearchFlightsDto};
