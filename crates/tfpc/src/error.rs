use std::io;

/// Errors produced while reading, writing or fetching TFPC blobs.
#[derive(thiserror::Error, Debug)]
pub enum TfpcError {
    #[error("bad TFPC magic {found:?}")]
    BadMagic { found: [u8; 4] },

    #[error("unsupported TFPC version {found} (supported: {supported})")]
    UnsupportedVersion { found: u32, supported: u32 },

    #[error("truncated TFPC: need {needed} bytes, have {available}")]
    Truncated { needed: usize, available: usize },

    #[error("TFPC header total {total} != layer count sum {sum}")]
    CountMismatch { total: u32, sum: u64 },

    #[error("{layer} layer: {detail}")]
    LayerShape { layer: &'static str, detail: String },

    #[error("{count} particles do not fit a TFPC u32 count")]
    TooManyParticles { count: usize },

    #[error(transparent)]
    Io(#[from] io::Error),

    #[cfg(feature = "remote")]
    #[error("TFPC fetch failed: {0}")]
    Http(#[from] reqwest::Error),

    #[cfg(feature = "remote")]
    #[error("TFPC fetch from {url} returned HTTP {status}")]
    HttpStatus { url: String, status: u16 },
}

impl TfpcError {
    /// True for the header checks (magic/version) that make a blob unreadable
    /// regardless of its length.
    pub fn is_format_error(&self) -> bool {
        matches!(
            self,
            TfpcError::BadMagic { .. } | TfpcError::UnsupportedVersion { .. }
        )
    }

    /// True when the failure came from fetching rather than parsing.
    pub fn is_transport_error(&self) -> bool {
        #[cfg(feature = "remote")]
        {
            matches!(self, TfpcError::Http(_) | TfpcError::HttpStatus { .. })
        }

        #[cfg(not(feature = "remote"))]
        {
            false
        }
    }
}

pub type Result<T> = std::result::Result<T, TfpcError>;
