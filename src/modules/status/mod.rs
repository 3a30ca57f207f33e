pub mod controller;
pub mod model;
pub mod router;

pub use router::init_status_router;
