use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Process not found: {0}")]
    ProcessNotFound(String),

    #[error("Failed to open process: {0}")]
    ProcessOpenFailed(String),

    #[error("Failed to read process memory at address {address:#x}: {message}")]
    MemoryReadFailed { address: u64, message: String },

    #[error("Tried to cache an object at invalid address {0:#x}")]
    InvalidAddress(u64),

    #[error("Entity with path ({path}) and id ({id}) reached classification without a type")]
    UnclassifiedEntity { path: String, id: u32 },

    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Check if this error is a "file not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::Io(e) if e.kind() == std::io::ErrorKind::NotFound)
    }

    /// Whether this error is a broken programming contract rather than bad remote data
    pub fn is_contract_violation(&self) -> bool {
        matches!(
            self,
            Error::InvalidAddress(_) | Error::UnclassifiedEntity { .. }
        )
    }
}
