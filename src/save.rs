//! The save container decoder.
//!
//! Consumes a save file's bytes, validates the magic, reverses the
//! whole-file obfuscation, and locates the grub counter by its fixed byte
//! signature. Pure and deterministic: the same input always yields the same
//! result or the same error, and nothing is retried internally.

use std::path::Path;

use crate::constants::{SAVE_COUNTER_SIGNATURE, SAVE_MAGIC, SAVE_OBFUSCATION_KEY};
use crate::error::GrubCounterError;
use crate::signature;

/// Reads a save file from disk and decodes its grub counter.
///
/// This is a convenience wrapper around [`decode_bytes`] for the common
/// single-file case; directory-mode scanning of every `*.save` file belongs
/// to the CLI collaborator, not here.
pub fn decode_file(path: impl AsRef<Path>) -> Result<u32, GrubCounterError> {
    let raw = std::fs::read(path)?;
    decode_bytes(&raw)
}

/// Decodes the grub counter out of a save file's raw (obfuscated) bytes.
pub fn decode_bytes(raw: &[u8]) -> Result<u32, GrubCounterError> {
    if !raw.starts_with(&SAVE_MAGIC) {
        return Err(GrubCounterError::NotASave);
    }

    let decoded: Vec<u8> = raw.iter().map(|b| b ^ SAVE_OBFUSCATION_KEY).collect();

    // Files containing the signature more than once are not expected to
    // occur in practice; if they do, the first occurrence wins.
    let signature_offset = signature::find_first(&decoded, &SAVE_COUNTER_SIGNATURE)
        .ok_or(GrubCounterError::CounterNotFound)?;

    let value_offset = signature_offset + SAVE_COUNTER_SIGNATURE.len();
    let value_bytes = decoded
        .get(value_offset..value_offset + 4)
        .ok_or(GrubCounterError::CounterNotFound)?;

    Ok(u32::from_le_bytes(value_bytes.try_into().unwrap()))
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Builds a synthetic raw (pre-decode) save buffer: `AA DE AF 64` magic,
    /// filler, the counter signature (stored pre-XOR so that after decoding
    /// it becomes `SAVE_COUNTER_SIGNATURE`), and a little-endian u32 value.
    fn build_raw_save(filler_before: &[u8], value: u32, filler_after: &[u8]) -> Vec<u8> {
        let mut raw = SAVE_MAGIC.to_vec();
        raw.extend(filler_before.iter().map(|b| b ^ SAVE_OBFUSCATION_KEY));
        raw.extend(
            SAVE_COUNTER_SIGNATURE
                .iter()
                .map(|b| b ^ SAVE_OBFUSCATION_KEY),
        );
        raw.extend(value.to_le_bytes().iter().map(|b| b ^ SAVE_OBFUSCATION_KEY));
        raw.extend(filler_after.iter().map(|b| b ^ SAVE_OBFUSCATION_KEY));
        raw
    }

    #[test]
    fn reads_large_unsigned_value_verbatim() {
        // The decoder does not range-check the value, it reads whatever four
        // bytes follow the signature.
        let raw = build_raw_save(b"filler", 0xFFFF_3CB1, b"more filler");
        assert_eq!(decode_bytes(&raw).unwrap(), 0xFFFF_3CB1);
    }

    #[test]
    fn reads_small_value() {
        let raw = build_raw_save(b"", 50_000, b"");
        assert_eq!(decode_bytes(&raw).unwrap(), 50_000);
    }

    #[test]
    fn rejects_bad_magic() {
        let mut raw = build_raw_save(b"", 50_000, b"");
        raw[0] = 0x00;
        assert!(matches!(decode_bytes(&raw), Err(GrubCounterError::NotASave)));
    }

    #[test]
    fn rejects_buffer_lacking_counter_signature() {
        let raw = SAVE_MAGIC
            .iter()
            .copied()
            .chain((0..64).map(|_| 0x00u8))
            .collect::<Vec<_>>();
        assert!(matches!(
            decode_bytes(&raw),
            Err(GrubCounterError::CounterNotFound)
        ));
    }

    #[test]
    fn first_occurrence_wins_when_signature_repeats() {
        let mut raw = build_raw_save(b"", 111, b"");
        let second = build_raw_save(b"", 222, b"");
        raw.extend_from_slice(&second[SAVE_MAGIC.len()..]);
        assert_eq!(decode_bytes(&raw).unwrap(), 111);
    }

    #[test]
    fn decode_is_idempotent_and_side_effect_free() {
        let raw = build_raw_save(b"abc", 777, b"xyz");
        assert_eq!(decode_bytes(&raw).unwrap(), decode_bytes(&raw).unwrap());
    }

    #[test]
    fn decode_file_reads_from_disk() {
        let raw = build_raw_save(b"", 999, b"");
        let dir = std::env::temp_dir();
        let path = dir.join(format!("grub-counter-test-{:x}.save", std::process::id()));
        std::fs::write(&path, &raw).unwrap();
        let result = decode_file(&path);
        let _ = std::fs::remove_file(&path);
        assert_eq!(result.unwrap(), 999);
    }

    #[test]
    fn decode_file_missing_path_is_io_error() {
        let result = decode_file("/nonexistent/path/that/should/not/exist.save");
        assert!(matches!(result, Err(GrubCounterError::Io(_))));
    }
}
