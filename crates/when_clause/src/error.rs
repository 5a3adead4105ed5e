use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WhenClauseError {
    #[error("malformed when-clause {source_text:?} at offset {position}: {message}")]
    Malformed {
        source_text: String,
        position: usize,
        message: String,
    },
    #[error("when-clause {source_text:?} references unknown context key {key:?}")]
    UnknownContextKey { key: String, source_text: String },
}

impl WhenClauseError {
    pub(crate) fn malformed(source: &str, position: usize, message: impl Into<String>) -> Self {
        Self::Malformed {
            source_text: source.to_string(),
            position,
            message: message.into(),
        }
    }

    pub fn source_text(&self) -> &str {
        match self {
            Self::Malformed { source_text, .. } | Self::UnknownContextKey { source_text, .. } => {
                source_text
            }
        }
    }
}
