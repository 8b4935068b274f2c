//! Worker failure classification.
//!
//! Recoverable failures may be attempted again within the worker's attempt budget;
//! unrecoverable ones drop the job immediately.

use std::fmt::{Display, Formatter, Result as FmtResult};

#[derive(Debug)]
pub struct TaskError {
    source: anyhow::Error,
    recoverable: bool,
}

impl TaskError {
    pub fn recoverable(source: anyhow::Error) -> Self {
        Self {
            source,
            recoverable: true,
        }
    }

    pub fn unrecoverable(source: anyhow::Error) -> Self {
        Self {
            source,
            recoverable: false,
        }
    }

    pub fn is_recoverable(&self) -> bool {
        self.recoverable
    }
}

impl Display for TaskError {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.source)
    }
}

impl std::error::Error for TaskError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source.source()
    }
}

/// Tag a result's error as recoverable or not.
pub trait TaskResultExt<T> {
    fn recoverable(self) -> Result<T, TaskError>;
    fn unrecoverable(self) -> Result<T, TaskError>;
}

impl<T, E> TaskResultExt<T> for Result<T, E>
where
    E: Into<anyhow::Error>,
{
    fn recoverable(self) -> Result<T, TaskError> {
        self.map_err(|e| TaskError::recoverable(e.into()))
    }

    fn unrecoverable(self) -> Result<T, TaskError> {
        self.map_err(|e| TaskError::unrecoverable(e.into()))
    }
}
