//! Reversible, fingerprint-keyed obfuscation for values at rest.
//!
//! Layout before base64: `tag (4 bytes) || plaintext XOR keystream`.
//! The tag binds the payload to the fingerprint and the plaintext so that
//! values written under another fingerprint, or not written by us at all,
//! are rejected instead of decoding to garbage.

use crate::{DeviceFingerprint, StorageError, StorageResult};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use sha2::{Digest, Sha256};

const TAG_LEN: usize = 4;
const TAG_DOMAIN: &[u8] = b"finwatch-credential-tag";

fn xor_in_place(data: &mut [u8], key: &[u8; 32]) {
    for (byte, k) in data.iter_mut().zip(key.iter().cycle()) {
        *byte ^= k;
    }
}

fn tag(fingerprint: &DeviceFingerprint, plaintext: &[u8]) -> [u8; TAG_LEN] {
    let digest = Sha256::new()
        .chain_update(TAG_DOMAIN)
        .chain_update(fingerprint.key())
        .chain_update(plaintext)
        .finalize();

    let mut tag = [0u8; TAG_LEN];
    tag.copy_from_slice(&digest[..TAG_LEN]);
    tag
}

/// Obfuscate `plaintext` for storage under `fingerprint`.
pub(crate) fn conceal(fingerprint: &DeviceFingerprint, plaintext: &str) -> String {
    let mut body = plaintext.as_bytes().to_vec();
    xor_in_place(&mut body, fingerprint.key());

    let mut payload = Vec::with_capacity(TAG_LEN + body.len());
    payload.extend_from_slice(&tag(fingerprint, plaintext.as_bytes()));
    payload.extend_from_slice(&body);

    BASE64.encode(payload)
}

/// Reverse [`conceal`]. Fails on anything `conceal` did not produce under
/// the same fingerprint.
pub(crate) fn reveal(fingerprint: &DeviceFingerprint, stored: &str) -> StorageResult<String> {
    let payload = BASE64
        .decode(stored.trim())
        .map_err(|e| StorageError::Encoding(format!("invalid base64: {}", e)))?;

    if payload.len() < TAG_LEN {
        return Err(StorageError::Encoding("payload too short".to_string()));
    }

    let (stored_tag, body) = payload.split_at(TAG_LEN);
    let mut plaintext = body.to_vec();
    xor_in_place(&mut plaintext, fingerprint.key());

    if tag(fingerprint, &plaintext) != stored_tag {
        return Err(StorageError::Encoding(
            "tag mismatch (foreign or corrupt entry)".to_string(),
        ));
    }

    String::from_utf8(plaintext)
        .map_err(|e| StorageError::Encoding(format!("invalid utf-8: {}", e)))
}
