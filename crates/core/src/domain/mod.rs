pub mod business;
pub mod cache;
pub mod delivery;
pub mod location;
pub mod request;
