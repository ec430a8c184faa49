// Library exports shared by the crop-grid and paste-faces binaries
pub mod cli;
pub mod config_file;
pub mod cropper;
pub mod image_processing;
pub mod json_output;
pub mod label;
pub mod manifest;
pub mod paster;
pub mod utils;

// Re-export commonly used types
pub use cli::{CropArgs, PasteArgs, TileFormat};
pub use cropper::{CropConfig, CropResult, GridCropper};
pub use json_output::JsonMessage;
pub use label::{LabelLine, NormalizedBox};
pub use manifest::{DatasetManifestRow, TileManifestRow};
pub use paster::{FacePaster, PasteConfig, PasteSummary, SkipReason};
