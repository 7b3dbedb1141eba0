// Service exports
pub mod imagery;
pub mod seismic;
pub mod weather;

pub use imagery::{ImageryClient, ImageryError};
pub use seismic::{SeismicClient, SeismicError};
pub use weather::{WeatherClient, WeatherError};
