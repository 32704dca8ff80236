use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HelioError {
    #[error("Texture '{label}' is {width}x{height}, over the device limit of {max}")]
    TextureTooLarge {
        label: String,
        width: u32,
        height: u32,
        max: u32,
    },

    #[error("'{label}' expects {expected} bytes per upload, got {actual}")]
    UploadSizeMismatch {
        label: String,
        expected: usize,
        actual: usize,
    },
}

pub type Result<T> = std::result::Result<T, HelioError>;
