use thiserror::Error;

#[derive(Debug, Error)]
pub enum EmulatorError {
    #[error("malformed Intel HEX record at line {line}: {reason}")]
    MalformedHexRecord { line: usize, reason: String },

    #[error("could not open program file {path}: {source}")]
    FileOpenFailure {
        path: String,
        #[source]
        source: std::io::Error,
    },
}
