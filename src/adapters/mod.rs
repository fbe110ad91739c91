// Adapters layer: concrete implementations of the domain ports for external systems.

pub mod cache;
pub mod oep;

pub use cache::CachedSource;
pub use oep::OepClient;
