use super::domain::BookingId;
use super::wizard::BookingWizard;

/// Storage for live wizard sessions. `modify` must apply the closure atomically.
pub trait SessionRepository: Send + Sync {
    fn insert(&self, wizard: BookingWizard) -> Result<(), RepositoryError>;
    fn fetch(&self, id: &BookingId) -> Result<Option<BookingWizard>, RepositoryError>;
    fn modify<T, F>(&self, id: &BookingId, apply: F) -> Result<T, RepositoryError>
    where
        F: FnOnce(&mut BookingWizard) -> T;
    /// Drop an abandoned session.
    fn remove(&self, id: &BookingId) -> Result<(), RepositoryError>;
}

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("booking session already exists")]
    Conflict,
    #[error("booking session not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}
