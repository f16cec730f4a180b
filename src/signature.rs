// Input format check: h5ad files are HDF5 containers.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::error::PaiError;

/// HDF5 superblock signature that every h5ad file starts with.
pub const H5AD_SIGNATURE: [u8; 8] = [0x89, 0x48, 0x44, 0x46, 0x0d, 0x0a, 0x1a, 0x0a];

/// Check that the file at `path` starts with [`H5AD_SIGNATURE`].
pub fn validate_signature(path: &Path) -> Result<(), PaiError> {
    let file = File::open(path)?;
    let mut header = Vec::with_capacity(H5AD_SIGNATURE.len());
    file.take(H5AD_SIGNATURE.len() as u64)
        .read_to_end(&mut header)?;

    if header == H5AD_SIGNATURE {
        Ok(())
    } else {
        Err(PaiError::FormatMismatch {
            path: path.to_path_buf(),
            found: hex::encode(&header),
        })
    }
}
