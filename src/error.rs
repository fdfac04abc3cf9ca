use hecs::Entity;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SimError {
    #[error("entity {0:?} cannot take the player role: it is not a player")]
    NotAPlayer(Entity),

    #[error("entity not found: {0:?}")]
    NoSuchEntity(Entity),

    #[error("cell ({row}, {col}) is outside the zone")]
    OutOfBounds { row: i32, col: i32 },

    #[error("cell ({row}, {col}) is already occupied")]
    Occupied { row: i32, col: i32 },

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("config parse error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, SimError>;
