//! Application use cases / business logic

pub mod auto_reply;
pub mod clients;
pub mod content;
pub mod oauth;
pub mod reports;
pub mod scheduler;

#[cfg(test)]
pub(crate) mod fakes;

pub use auto_reply::{AutoReplyOutcome, AutoReplyService};
pub use clients::ClientService;
pub use content::ContentService;
pub use oauth::{CallbackOutcome, OAuthFlow};
pub use reports::Reports;
pub use scheduler::{DynScheduler, Scheduler, SchedulerConfig, TickReport};

use crate::ports::{GenerateError, OAuthError, StoreError};

/// Errors surfaced by the use cases
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("Validation failed: {}", .0.join(", "))]
    Validation(Vec<String>),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Generate(#[from] GenerateError),
    #[error(transparent)]
    OAuth(#[from] OAuthError),
}

impl ServiceError {
    pub fn invalid(message: impl Into<String>) -> Self {
        ServiceError::Validation(vec![message.into()])
    }
}
