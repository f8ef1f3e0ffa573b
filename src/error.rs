use thiserror::Error;

/// Errors from decoding a FAT12 image or serving browse commands.
///
/// Decode-time failures (`Io`, `CorruptImage`, `BadCluster`) fail the load
/// and leave the volume unstarted. Query-time failures are local to one
/// command; the shell reports them and keeps running.
#[derive(Error, Debug)]
pub enum FatBrowseError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("corrupt image: {0}")]
    CorruptImage(String),

    #[error("bad cluster in chain starting at cluster {0}")]
    BadCluster(u16),

    #[error("directory not found: {0}")]
    DirectoryNotFound(String),

    #[error("file not found: {0}")]
    FileNotFound(String),

    #[error("unexpected command: {0}")]
    InvalidCommand(String),

    #[error("unexpected option: {0}")]
    UnexpectedOption(char),

    #[error("need an argument: {0}")]
    MissingArgument(String),
}
