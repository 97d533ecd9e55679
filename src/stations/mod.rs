pub mod cache;
pub mod locate;
