pub mod coerce;
pub mod config;
pub mod entity;
pub mod error;
pub mod observation;
pub mod record;

pub use config::Config;
pub use entity::*;
pub use error::*;
pub use observation::*;
pub use record::*;
