use thiserror::Error;

#[derive(Error, Debug)]
pub enum MycoError {
    #[error("No .myco/ directory found. Run `myco init` first.")]
    NotInitialized,

    #[error("Grow has no id; refusing to produce an update.")]
    MissingGrowId,

    #[error("Cannot store a {grow_type}-type grow. Only Agar and LC cultures can be stored.")]
    StoreNotAllowed { grow_type: String },

    #[error("Invalid cost {0}: cost must be a finite, non-negative number.")]
    InvalidCost(f64),

    #[error("Grow \"{0}\" not found. Run `myco list --dataset all` to see grow IDs.")]
    GrowNotFound(String),

    #[error(
        "Ambiguous identifier \"{id}\" matches {count} grows: {ids}. Use more characters to disambiguate."
    )]
    AmbiguousId {
        id: String,
        count: usize,
        ids: String,
    },

    #[error("Strain \"{0}\" not found. Run `myco strain list` to see known strains.")]
    StrainNotFound(String),

    #[error("Strain \"{0}\" already exists.")]
    StrainAlreadyExists(String),

    #[error("Supply \"{0}\" not found. Run `myco supply list` to see the catalogue.")]
    SupplyNotFound(String),

    #[error("Supply \"{0}\" already exists.")]
    SupplyAlreadyExists(String),

    #[error(
        "Timed out waiting for lock on {0}. If no other myco process is running, delete the lock file manually."
    )]
    LockTimeout(String),

    #[error("Validation failed: {0}")]
    ValidationError(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

pub type Result<T> = std::result::Result<T, MycoError>;
