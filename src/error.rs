use thiserror::Error;

/// Failure of a storage adapter. Never reaches callers of the fail-soft
/// gateway; adapters and the fallback combinator use it to decide routing.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("network error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("api returned {status} for {path}")]
    Status { status: u16, path: String },

    #[error("could not decode response from {path}: {message}")]
    Decode { path: String, message: String },

    #[error("key-value store error: {0}")]
    Store(String),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

impl StorageError {
    /// Transport failures and server-side errors send the fallback
    /// combinator to local storage; client errors do not.
    pub fn is_unavailable(&self) -> bool {
        match self {
            StorageError::Transport(_) => true,
            StorageError::Status { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

/// Form validation failure. The message is the notification shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Please enter a food name")]
    MissingFoodName,
    #[error("Please enter a valid calorie count")]
    InvalidCalories,
    #[error("Please enter the store where you purchased the food")]
    MissingStore,
    #[error("Please select a health rating")]
    MissingHealthRating,
    #[error("Please select a meal type")]
    MissingMealType,
    #[error("Please enter a valid {0} amount")]
    InvalidMacro(&'static str),
    #[error("Please enter a valid water amount")]
    InvalidWaterAmount,
    #[error("Please enter a valid container name and size.")]
    InvalidContainer,
    #[error("Quick-add item is not available")]
    UnknownQuickAdd,
    #[error("Please enter a positive {0} goal")]
    InvalidGoal(&'static str),
}

pub type StorageResult<T> = Result<T, StorageError>;
