use thiserror::Error;

/// Errors reported to the producer side.
///
/// Link failures never show up here, the link worker retries them itself.
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    Config(String),

    /// The device derives its pulse period from `clock / frequency`.
    #[error("Invalid laser frequency: {0} Hz")]
    InvalidFrequency(u32),

    #[error("Failed to spawn link worker: {0}")]
    ThreadSpawn(std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::Error;

    #[test]
    fn test_error_display() {
        let err = Error::InvalidFrequency(0);
        assert_eq!(format!("{}", err), "Invalid laser frequency: 0 Hz");

        let err = Error::Config("slotCount must be at least 2".to_string());
        assert!(format!("{}", err).contains("slotCount"));
    }

    #[test]
    fn test_from_io_error() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        match Error::from(io) {
            Error::Io(e) => assert_eq!(e.kind(), std::io::ErrorKind::NotFound),
            other => panic!("Expected Io variant, got {:?}", other),
        }
    }
}
