//! Error taxonomy shared by every role in the group.
//!
//! Nothing here is retried: every variant is fatal for the process that
//! observes it.

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ClusterError>;

#[derive(Error, Debug)]
pub enum ClusterError {
    /// Runtime, topology or argument problem detected before any work starts.
    #[error("Startup failure: {0}")]
    Startup(String),

    /// The input corpus could not be opened or read.
    #[error("Input file {path:?} could not be read")]
    Input {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A frame or payload did not have the expected shape.
    #[error("Protocol violation on {endpoint}: {reason}")]
    Protocol { endpoint: String, reason: String },

    /// The underlying byte stream failed mid-transfer.
    #[error("Channel {endpoint} failed")]
    Transport {
        endpoint: String,
        #[source]
        source: std::io::Error,
    },

    /// A reader, worker or chunk task panicked or was cancelled.
    #[error("Task failure: {0}")]
    Task(String),

    /// Writing the ordered output failed.
    #[error("Output could not be written")]
    Output(#[from] std::io::Error),
}

impl ClusterError {
    pub fn protocol(endpoint: &str, reason: impl Into<String>) -> Self {
        Self::Protocol {
            endpoint: endpoint.to_string(),
            reason: reason.into(),
        }
    }

    pub fn transport(endpoint: &str, source: std::io::Error) -> Self {
        Self::Transport {
            endpoint: endpoint.to_string(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn not_found() -> std::io::Error {
        std::io::Error::new(std::io::ErrorKind::NotFound, "no such file")
    }

    fn diagnostic(error: ClusterError) -> String {
        format!("{:#}", anyhow::Error::from(error))
    }

    #[test]
    fn test_diagnostic_names_each_cause_once() {
        let errors = [
            ClusterError::Input {
                path: PathBuf::from("/tmp/missing.txt"),
                source: not_found(),
            },
            ClusterError::transport("dispatcher->horror", not_found()),
            ClusterError::Output(not_found()),
        ];

        for error in errors {
            let line = diagnostic(error);
            assert_eq!(line.matches("no such file").count(), 1, "{}", line);
            assert!(!line.contains('\n'));
        }
    }

    #[test]
    fn test_diagnostic_keeps_context() {
        let line = diagnostic(ClusterError::Input {
            path: PathBuf::from("/tmp/missing.txt"),
            source: not_found(),
        });

        assert_eq!(line, "Input file \"/tmp/missing.txt\" could not be read: no such file");
    }
}
