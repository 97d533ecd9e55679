pub mod location;
pub mod weather;
