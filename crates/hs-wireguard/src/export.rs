//! Peer config export
//!
//! Client configs contain the peer's private key, so files are written
//! `0600` into a `0700` directory and never logged.

use std::path::{Path, PathBuf};

use qrcode::render::unicode::Dense1x2;
use qrcode::QrCode;

use hs_core::fsutil;
use hs_core::{HsError, Result};

/// Permissions for any file containing key material
pub const SECRET_FILE_MODE: u32 = 0o600;

/// Permissions for directories holding such files
pub const SECRET_DIR_MODE: u32 = 0o700;

/// Path of the exported config for `peer` on `iface`
pub fn client_config_path(output_dir: &Path, iface: &str, peer: &str) -> PathBuf {
    output_dir.join(format!("{}-{}.conf", iface, peer))
}

/// Atomically write a file holding key material, creating its directory
pub fn write_secret_file(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fsutil::ensure_dir(parent, SECRET_DIR_MODE).map_err(|e| HsError::io(parent, e))?;
    }
    fsutil::atomic_write(path, contents.as_bytes(), SECRET_FILE_MODE)
        .map_err(|e| HsError::io(path, e))?;
    tracing::info!("Wrote {:?}", path);
    Ok(())
}

/// Export a client config, returning where it was written
pub fn write_client_config(output_dir: &Path, iface: &str, peer: &str, contents: &str) -> Result<PathBuf> {
    let path = client_config_path(output_dir, iface, peer);
    write_secret_file(&path, contents)?;
    Ok(path)
}

/// Render `contents` as a QR code drawn with Unicode half blocks
pub fn render_qr(contents: &str) -> Result<String> {
    let code = QrCode::new(contents.as_bytes())
        .map_err(|e| HsError::Serialization(format!("QR encoding failed: {}", e)))?;
    Ok(code
        .render::<Dense1x2>()
        .dark_color(Dense1x2::Light)
        .light_color(Dense1x2::Dark)
        .quiet_zone(true)
        .build())
}
