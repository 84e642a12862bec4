use thiserror::Error;

#[derive(Error, Debug)]
pub enum BarcodeError {
    /// The file could not be opened or decoded; not the same as "no barcode"
    #[error("Failed to decode image: {0}")]
    Decode(#[from] image::ImageError),

    #[error("Image has no pixels ({width}x{height})")]
    EmptyImage { width: u32, height: u32 },

    #[error("Structuring element {width}x{height} must be between 1x1 and 511x511")]
    InvalidKernel { width: u32, height: u32 },
}

pub type Result<T> = std::result::Result<T, BarcodeError>;
