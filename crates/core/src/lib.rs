pub mod config;
pub mod domain;
pub mod errors;
pub mod selection;

pub use domain::business::Business;
pub use domain::cache::CacheEntry;
pub use domain::delivery::{DeliveryPayload, DeliveryStatus, ResponseDispatcher};
pub use domain::location::{LocationKey, ResolvedLocation};
pub use domain::request::FindRequest;
pub use errors::{ApplicationError, DeliveryError, DirectoryError, InterfaceError};
