use std::path::PathBuf;

use common::ErrorLocation;
use thiserror::Error;

/// Failure to load the baseline document a page starts from.
#[derive(Debug, Error)]
pub enum PageError {
    #[error("Page Source Error: {path}: {source} {location}")]
    Source {
        location: ErrorLocation,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
