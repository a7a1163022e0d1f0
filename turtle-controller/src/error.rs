use thiserror::Error;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error("turtle-controller: Uninitialized : {}", message)]
    Uninitialized { message: String },
    #[error("turtle-controller: Connection error : {}", message)]
    Connection { message: String },
    #[error(
        "turtle-controller: Type mismatch on topic={} (registered = {}, requested = {})",
        topic,
        registered,
        requested
    )]
    TypeMismatch {
        topic: String,
        registered: &'static str,
        requested: &'static str,
    },
    #[error("turtle-controller: Other: {:?}", .0)]
    Other(#[from] anyhow::Error),
}
