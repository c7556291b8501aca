//! Study-scoped pseudonymous identifiers.
//!
//! A hashed ID is derived from a global UUID (child, family account or
//! demographic snapshot), the study UUID and the study's salt. The same
//! entity gets the same short ID everywhere within one study and an
//! unrelated ID in every other study, so hashed IDs may be published while
//! global IDs may not.

use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::fields::FieldSource;

/// Number of characters kept when a study does not say otherwise.
pub const DEFAULT_HASH_DIGITS: usize = 6;

const BASE32_ALPHABET: &[u8; 32] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ234567";

/// Hash `id1` and `id2` under `salt`, keeping the first `length` characters.
///
/// The three UUIDs are XORed byte-wise, the 16-byte result is SHA-256 hashed,
/// and the digest is Base32 encoded (RFC 4648, padded). Visually ambiguous
/// characters are then replaced: `1→a`, `0→b`, `I→c`, `O→d`.
///
/// Because XOR commutes, swapping `id1` and `id2` yields the same ID. Callers
/// keep the namespaces apart by always passing the entity UUID first and the
/// study UUID second.
pub fn hash_id(id1: Uuid, id2: Uuid, salt: Uuid, length: usize) -> String {
  let mut mixed = [0u8; 16];
  for (i, byte) in mixed.iter_mut().enumerate() {
    *byte = id1.as_bytes()[i] ^ id2.as_bytes()[i] ^ salt.as_bytes()[i];
  }

  let digest = Sha256::digest(mixed);
  base32_encode(&digest)
    .chars()
    .map(|c| match c {
      '1' => 'a',
      '0' => 'b',
      'I' => 'c',
      'O' => 'd',
      other => other,
    })
    .take(length)
    .collect()
}

/// Padded RFC 4648 Base32.
fn base32_encode(bytes: &[u8]) -> String {
  let mut out = String::with_capacity(bytes.len().div_ceil(5) * 8);

  for chunk in bytes.chunks(5) {
    let mut block = [0u8; 5];
    block[..chunk.len()].copy_from_slice(chunk);
    let bits = block.iter().fold(0u64, |acc, b| (acc << 8) | u64::from(*b));

    let symbols = match chunk.len() {
      1 => 2,
      2 => 4,
      3 => 5,
      4 => 7,
      _ => 8,
    };

    for i in 0..8 {
      if i < symbols {
        let index = ((bits >> (35 - i * 5)) & 0x1f) as usize;
        out.push(BASE32_ALPHABET[index] as char);
      } else {
        out.push('=');
      }
    }
  }

  out
}

// ─── Namespaced helpers ──────────────────────────────────────────────────────

/// The study half of every hashed ID: `(study uuid, salt, digit count)`.
fn study_key(src: &dyn FieldSource) -> Option<(Uuid, Uuid, usize)> {
  let study = src.uuid("study__uuid")?;
  let salt = src.uuid("study__salt")?;
  let digits = src
    .integer("study__hash_digits")
    .and_then(|d| usize::try_from(d).ok())
    .unwrap_or(DEFAULT_HASH_DIGITS);
  Some((study, salt, digits))
}

/// Study-scoped ID for the child who produced a response.
pub fn child_hashed_id(src: &dyn FieldSource) -> Option<String> {
  let child = src.uuid("child__uuid")?;
  let (study, salt, digits) = study_key(src)?;
  Some(hash_id(child, study, salt, digits))
}

/// Study-scoped ID for the family account that owns the child.
pub fn participant_hashed_id(src: &dyn FieldSource) -> Option<String> {
  let account = src.uuid("child__user__uuid")?;
  let (study, salt, digits) = study_key(src)?;
  Some(hash_id(account, study, salt, digits))
}

/// Study-scoped ID for the demographic snapshot pinned by a response.
pub fn demographic_hashed_id(src: &dyn FieldSource) -> Option<String> {
  let snapshot = src.uuid("demographic_snapshot__uuid")?;
  let (study, salt, digits) = study_key(src)?;
  Some(hash_id(snapshot, study, salt, digits))
}
