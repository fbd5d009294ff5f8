//! Tap Finder - location-keyed suggestion lookup
//!
//! Given a location, the finder returns one randomly chosen business:
//! 1. **Normalize** the location (fallback to the configured default when blank)
//! 2. **Cache** (`happytaps-db`) - use the stored snapshot while it is fresh
//! 3. **Refresh** (`happytaps-directory`) - otherwise search the directory, at most one
//!    in-flight search per location key, and write the result back
//! 4. **Select** a business uniformly at random and deliver exactly one payload
//!
//! # Failure policy
//!
//! - Cache store down or slow: logged, treated as a miss (fail open)
//! - Directory has no matches: `not_found` payload, nothing cached
//! - Directory down, slow or malformed: `error` payload, nothing cached
//!
//! # Key Types
//!
//! - `TapFinder` - the orchestrator
//! - `FinderSettings` - timeouts, freshness window and key policy
//! - `FindOutcome` - the resolved result before delivery

mod flight;
pub mod finder;
pub mod outcome;
pub mod settings;

pub use finder::{Delivery, TapFinder};
pub use outcome::{FindOutcome, SnapshotSource};
pub use settings::FinderSettings;
