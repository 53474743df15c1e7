use crate::codec::{decode_tfpc, encode_tfpc, DecodedTfpc};
use crate::error::Result;
use crate::model::LayeredParticleData;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Fast path: prefer mmap; fall back to a single read.
#[cfg(feature = "mmap")]
pub fn read_file<P: AsRef<Path>>(path: P) -> Result<DecodedTfpc> {
    let file = File::open(path)?;
    let map = unsafe { memmap2::MmapOptions::new().map(&file)? };
    decode_tfpc(&map)
}

#[cfg(not(feature = "mmap"))]
pub fn read_file<P: AsRef<Path>>(path: P) -> Result<DecodedTfpc> {
    let bytes = std::fs::read(path)?;
    decode_tfpc(&bytes)
}

/// Encode `data` and write it to `path`, returning the number of bytes written.
pub fn write_file<P: AsRef<Path>>(path: P, data: &LayeredParticleData) -> Result<usize> {
    let bytes = encode_tfpc(data)?;

    let mut file = File::create(path)?;
    file.write_all(&bytes)?;
    file.flush()?;

    Ok(bytes.len())
}

/// Fetch and decode a baked asset.
///
/// Transport failures and non-2xx responses are returned to the caller as-is;
/// retrying is the caller's decision.
#[cfg(feature = "remote")]
pub async fn load_tfpc(url: &str) -> Result<DecodedTfpc> {
    let response = reqwest::get(url).await?;

    let status = response.status();
    if !status.is_success() {
        return Err(crate::error::TfpcError::HttpStatus {
            url: url.to_owned(),
            status: status.as_u16(),
        });
    }

    let bytes = response.bytes().await?;
    log::debug!("fetched {} bytes from {}", bytes.len(), url);

    decode_tfpc(&bytes)
}
