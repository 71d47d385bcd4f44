use thiserror::Error;

pub type Result<T> = std::result::Result<T, CurationError>;

#[derive(Debug, Error)]
pub enum CurationError {
    /// Rejected pagination inputs. Raised only while configuring an engine.
    #[error("invalid pagination configuration: {0}")]
    InvalidConfiguration(String),

    #[error("item {0} is already in the list")]
    DuplicateItem(String),

    #[error("item {0} is not in the list")]
    ItemNotFound(String),

    #[error("index {index} is out of range for a list of {len} items")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("a save is already in flight for this list")]
    SaveInProgress,

    /// Local edits have not been saved; loading would overwrite them.
    #[error("the list has unsaved changes")]
    UnsavedChanges,

    /// The persistence collaborator failed. Local state is left as it was.
    #[error("failed to persist ranked list: {0:#}")]
    PersistenceFailure(#[source] anyhow::Error),

    /// A wire-form ranking that breaks the 1..N contract.
    #[error("invalid ranking: {0}")]
    InvalidRanking(String),
}
