// BLOB version prefix helpers. [version: u8][wincode payload].

/// Version 1: records, analysis, stats and decode stats as first published.
pub(super) const BLOB_VERSION: u8 = 1;

pub(super) fn with_version_prefix(version: u8, payload: Vec<u8>) -> Vec<u8> {
    let mut out = Vec::with_capacity(1 + payload.len());
    out.push(version);
    out.extend_from_slice(&payload);
    out
}

pub(super) fn blob_version(bytes: &[u8]) -> u8 {
    if bytes.is_empty() { 0 } else { bytes[0] }
}

/// Payload after the version byte. Outputs are never defaulted, so an unknown version is an error.
pub(super) fn blob_payload<'a>(bytes: &'a [u8], column: &str) -> anyhow::Result<&'a [u8]> {
    let version = blob_version(bytes);
    anyhow::ensure!(
        version == BLOB_VERSION,
        "{} blob has unsupported version {}",
        column,
        version
    );
    Ok(&bytes[1..])
}
