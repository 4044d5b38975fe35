//! TSID Generator
//!
//! Generates Time-Sorted IDs as Crockford Base32 strings. Used for resource
//! handles, event IDs and execution IDs.

use std::sync::atomic::{AtomicU16, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

/// Crockford Base32 alphabet (excludes I, L, O, U)
const ALPHABET: &[u8] = b"0123456789ABCDEFGHJKMNPQRSTVWXYZ";

/// Encoded TSIDs are always this many characters.
pub const TSID_LEN: usize = 13;

static COUNTER: AtomicU16 = AtomicU16::new(0);

/// TSID Generator for creating unique, time-sorted identifiers
pub struct TsidGenerator;

impl TsidGenerator {
    /// Generate a new TSID as a Crockford Base32 string
    /// Example output: "0HZXEQ5Y8JY5Z"
    ///
    /// TSID structure (64 bits):
    /// - 42 bits: timestamp (milliseconds since epoch)
    /// - 10 bits: random component
    /// - 12 bits: counter (4096 unique IDs per millisecond)
    pub fn generate() -> String {
        let now = epoch_millis();
        let counter = COUNTER.fetch_add(1, Ordering::SeqCst) as u64;
        let random: u64 = mix_u16(now, counter) as u64 & 0x3FF;

        let tsid = ((now & 0x3FF_FFFF_FFFF) << 22) | (random << 12) | (counter & 0xFFF);
        encode_crockford(tsid)
    }
}

/// Clock before the epoch collapses to 0 rather than panicking.
fn epoch_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

fn encode_crockford(mut value: u64) -> String {
    let mut result = [b'0'; TSID_LEN];

    for slot in result.iter_mut().rev() {
        *slot = ALPHABET[(value & 0x1F) as usize];
        value >>= 5;
    }

    result.iter().map(|&b| b as char).collect()
}

fn mix_u16(now: u64, counter: u64) -> u16 {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.subsec_nanos() as u64)
        .unwrap_or(now);
    ((nanos ^ counter.wrapping_mul(0x5851_F42D_4C95_7F2D)) & 0xFFFF) as u16
}
