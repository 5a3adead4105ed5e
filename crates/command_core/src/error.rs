use shared::error::{ErrorCode, ErrorPayload};
use thiserror::Error;
use when_clause::WhenClauseError;

#[derive(Debug, Error)]
pub enum CommandError {
    #[error("command not found: {0}. Make sure the declaration has been registered")]
    CommandNotFound(String),
    #[error("command {0} is not declared")]
    CommandNotDeclared(String),
    #[error("runtime is not registered for command {0}")]
    RuntimeNotRegistered(String),
    #[error("cannot execute a command without a runtime: {0}")]
    NoRuntime(String),
    #[error("no such command: {0}")]
    UnknownCommand(String),
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("command {name} has an unusable enabled condition: {source}")]
    MalformedExpression {
        name: String,
        #[source]
        source: WhenClauseError,
    },
    #[error("command {name} failed: {source}")]
    Execution {
        name: String,
        #[source]
        source: anyhow::Error,
    },
}

impl CommandError {
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::CommandNotFound(_) | Self::CommandNotDeclared(_) | Self::UnknownCommand(_) => {
                ErrorCode::NotFound
            }
            Self::RuntimeNotRegistered(_) | Self::NoRuntime(_) => ErrorCode::Unavailable,
            Self::InvalidArgument(_) | Self::MalformedExpression { .. } => ErrorCode::Validation,
            Self::Execution { .. } => ErrorCode::Internal,
        }
    }

    pub fn payload(&self) -> ErrorPayload {
        ErrorPayload::new(self.code(), self.to_string())
    }
}
