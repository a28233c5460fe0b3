//! Location-resolution port.

use crate::domain::search::LocationCode;

/// Resolves free-text place names to airport/metro codes.
///
/// Zero matches means the name is unknown; more than one means the user must
/// disambiguate before a search can run.
pub trait LocationResolver: Send + Sync {
    fn resolve(&self, name: &str) -> Vec<LocationCode>;
}
