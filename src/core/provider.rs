use crate::error::GroundedError;

/// Used for obtaining implementations of a functionality by their IDs.
pub trait ProviderFactory<T> {
    /// Obtain the provider registered under `id`.
    fn get_provider(&self, id: &str) -> Result<T, GroundedError>;
}
