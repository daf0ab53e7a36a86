use crate::error::Error;
use crate::models::user::RegistrySnapshot;

/// Durable backing for the user registry.
///
/// `save` is called synchronously after every mutation and must either
/// persist the whole snapshot or fail; a partial write is not acceptable.
pub trait RegistryStore: Send + Sync {
    /// Returns an empty snapshot when nothing has been stored yet.
    fn load(&self) -> Result<RegistrySnapshot, Error>;
    fn save(&self, snapshot: &RegistrySnapshot) -> Result<(), Error>;
}
