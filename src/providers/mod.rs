pub mod cwa;
pub mod error;
pub mod moenv;
pub mod openweather;
