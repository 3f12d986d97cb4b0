use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("transport error{}: {message}", match .status { Some(s) => format!(" (status {s})"), None => String::new() })]
    Transport {
        /// HTTP status code, when the request got far enough to receive one.
        status: Option<u16>,
        message: String,
    },

    #[error("GraphQL error: {0}")]
    GraphQl(String),

    #[error("repository registration conflict could not be resolved")]
    RegistrationConflictUnresolved,

    #[error("failed to create repository registration (status {status})")]
    RegistrationCreateFailed { status: u16 },

    #[error("failed to create scan job: {0}")]
    JobCreateFailed(String),

    #[error("scan job reported unexpected status: {0}")]
    JobStartUnexpectedStatus(String),

    /// A recognized outcome rather than a hard failure: the poll deadline
    /// elapsed before the discovered-resource set stabilized.
    #[error("scan did not converge before the deadline")]
    PollTimeout,

    #[error("invalid repository spec: {0}")]
    InvalidSpec(String),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl Error {
    /// HTTP status carried by a transport failure, if any.
    pub fn transport_status(&self) -> Option<u16> {
        match self {
            Error::Transport { status, .. } => *status,
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
