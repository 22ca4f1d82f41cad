//! Probabilistic skip filter over already-tried candidates
//!
//! A Bloom filter remembers every candidate that has been tested and rejected,
//! so a resumed run never pays the subprocess cost for the same candidate
//! twice. Bits are stored in atomic words: `insert` is a `fetch_or` per
//! derived position and `contains` reads without a lock. Set bits are
//! monotone, so a racing reader can at worst miss a fresh bit and trigger one
//! spurious verification.

use crate::error::FilterError;
use log::warn;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};

/// Magic number identifying a skip filter file
pub const FILTER_MAGIC: u32 = 0xBF10_F17E;

/// On-disk format version
pub const FILTER_VERSION: u16 = 1;

/// Smallest permitted bit-vector size
pub const MIN_FILTER_BITS: u64 = 8;

/// Largest permitted bit-vector size (4 GiB of bits)
pub const MAX_FILTER_BITS: u64 = 4 * 1024 * 1024 * 1024 * 8;

/// Largest permitted hash count
pub const MAX_FILTER_HASHES: u32 = 20;

/// 64-bit FNV-1a over a byte slice
pub fn fnv1a64(bytes: &[u8]) -> u64 {
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for &byte in bytes {
        hash ^= u64::from(byte);
        hash = hash.wrapping_mul(0x0000_0100_0000_01b3);
    }
    hash
}

struct FilterCore {
    bits: Vec<AtomicU64>,
    num_bits: u64,
    num_hashes: u32,
    estimated_items: u64,
    target_fp_rate: f64,
}

/// Bloom filter over candidate strings with a fixed on-disk layout
///
/// The filter is either *valid* (carrying a bit vector) or *invalid*; every
/// operation on an invalid filter degrades safely (`contains` is always
/// false, `insert` is a no-op, `save` fails).
pub struct SkipFilter {
    core: Option<FilterCore>,
}

impl SkipFilter {
    /// Create a filter sized for `estimated_items` entries at the target
    /// false-positive rate. Invalid parameters produce a degenerate but safe
    /// 8-bit filter.
    pub fn with_params(estimated_items: u64, target_fp_rate: f64) -> Self {
        if estimated_items == 0 || target_fp_rate <= 0.0 || target_fp_rate >= 1.0 {
            warn!("skip filter: invalid parameters, using minimal default");
            return Self::from_geometry(MIN_FILTER_BITS, 1, estimated_items, target_fp_rate);
        }

        let n = estimated_items as f64;
        let ln2 = std::f64::consts::LN_2;
        let m_exact = -(n * target_fp_rate.ln()) / (ln2 * ln2);
        let k_exact = (m_exact / n) * ln2;

        let num_bits = (m_exact.ceil() as u64).clamp(MIN_FILTER_BITS, MAX_FILTER_BITS);
        let num_hashes = (k_exact.ceil() as u32).clamp(1, MAX_FILTER_HASHES);

        Self::from_geometry(num_bits, num_hashes, estimated_items, target_fp_rate)
    }

    /// A filter in the invalid state
    pub fn invalid() -> Self {
        SkipFilter { core: None }
    }

    /// Bit count the sizing formula would request for these parameters,
    /// before any allocation happens. Used for the memory-cap check.
    pub fn required_bits(estimated_items: u64, target_fp_rate: f64) -> u64 {
        if estimated_items == 0 || target_fp_rate <= 0.0 || target_fp_rate >= 1.0 {
            return MIN_FILTER_BITS;
        }
        let ln2 = std::f64::consts::LN_2;
        let m_exact = -(estimated_items as f64 * target_fp_rate.ln()) / (ln2 * ln2);
        (m_exact.ceil() as u64).max(MIN_FILTER_BITS)
    }

    fn from_geometry(
        num_bits: u64,
        num_hashes: u32,
        estimated_items: u64,
        target_fp_rate: f64,
    ) -> Self {
        let num_words = num_bits.div_ceil(64) as usize;
        let mut bits = Vec::with_capacity(num_words);
        bits.resize_with(num_words, || AtomicU64::new(0));
        SkipFilter {
            core: Some(FilterCore {
                bits,
                num_bits,
                num_hashes,
                estimated_items,
                target_fp_rate,
            }),
        }
    }

    pub fn is_valid(&self) -> bool {
        self.core.is_some()
    }

    pub fn num_bits(&self) -> u64 {
        self.core.as_ref().map_or(0, |c| c.num_bits)
    }

    pub fn num_hashes(&self) -> u32 {
        self.core.as_ref().map_or(0, |c| c.num_hashes)
    }

    /// Record an item. No-op on an invalid filter.
    pub fn insert(&self, item: &[u8]) {
        let Some(core) = &self.core else { return };
        let (h1, h2) = hash_pair(item);
        for i in 0..core.num_hashes {
            let pos = bit_position(h1, h2, i, core.num_bits);
            let mask = 1u64 << (pos % 64);
            core.bits[(pos / 64) as usize].fetch_or(mask, Ordering::Relaxed);
        }
    }

    /// Whether the item was probably recorded before. Always false on an
    /// invalid filter.
    pub fn contains(&self, item: &[u8]) -> bool {
        let Some(core) = &self.core else { return false };
        let (h1, h2) = hash_pair(item);
        for i in 0..core.num_hashes {
            let pos = bit_position(h1, h2, i, core.num_bits);
            let mask = 1u64 << (pos % 64);
            if core.bits[(pos / 64) as usize].load(Ordering::Relaxed) & mask == 0 {
                return false;
            }
        }
        true
    }

    /// Persist the filter, truncating any previous file.
    ///
    /// Layout (little-endian, packed): magic u32, version u16, bit count u64,
    /// hash count u32, estimated items u64, target rate f64, then
    /// `ceil(bits/8)` payload bytes, LSB-first within each byte.
    pub fn save(&self, path: &Path) -> Result<(), FilterError> {
        let core = self.core.as_ref().ok_or(FilterError::Invalid)?;

        let file = File::create(path)?;
        let mut out = BufWriter::new(file);
        out.write_all(&FILTER_MAGIC.to_le_bytes())?;
        out.write_all(&FILTER_VERSION.to_le_bytes())?;
        out.write_all(&core.num_bits.to_le_bytes())?;
        out.write_all(&core.num_hashes.to_le_bytes())?;
        out.write_all(&core.estimated_items.to_le_bytes())?;
        out.write_all(&core.target_fp_rate.to_le_bytes())?;

        let mut remaining = core.num_bits.div_ceil(8) as usize;
        for word in &core.bits {
            let bytes = word.load(Ordering::Relaxed).to_le_bytes();
            let take = remaining.min(8);
            out.write_all(&bytes[..take])?;
            remaining -= take;
            if remaining == 0 {
                break;
            }
        }
        out.flush()?;
        Ok(())
    }

    /// Load a filter from disk, validating the header and payload size.
    pub fn load(path: &Path) -> Result<Self, FilterError> {
        let file = File::open(path)?;
        let mut input = BufReader::new(file);

        let magic = read_u32(&mut input)?;
        if magic != FILTER_MAGIC {
            return Err(FilterError::BadMagic(magic));
        }
        let version = read_u16(&mut input)?;
        if version != FILTER_VERSION {
            return Err(FilterError::UnsupportedVersion(version));
        }

        let num_bits = read_u64(&mut input)?;
        let num_hashes = read_u32(&mut input)?;
        let estimated_items = read_u64(&mut input)?;
        let target_fp_rate = f64::from_le_bytes(read_array(&mut input)?);

        if num_bits < MIN_FILTER_BITS
            || num_bits > MAX_FILTER_BITS
            || num_hashes < 1
            || num_hashes > MAX_FILTER_HASHES
        {
            return Err(FilterError::InvalidParameters {
                bits: num_bits,
                hashes: num_hashes,
            });
        }

        let num_words = num_bits.div_ceil(64) as usize;
        let mut bits = Vec::with_capacity(num_words);
        let mut remaining = num_bits.div_ceil(8);
        while remaining > 0 {
            let take = remaining.min(8) as usize;
            let mut buf = [0u8; 8];
            input.read_exact(&mut buf[..take])?;
            bits.push(AtomicU64::new(u64::from_le_bytes(buf)));
            remaining -= take as u64;
        }

        let mut probe = [0u8; 1];
        if input.read(&mut probe)? != 0 {
            return Err(FilterError::TrailingData);
        }

        Ok(SkipFilter {
            core: Some(FilterCore {
                bits,
                num_bits,
                num_hashes,
                estimated_items,
                target_fp_rate,
            }),
        })
    }
}

fn hash_pair(item: &[u8]) -> (u64, u64) {
    let h1 = fnv1a64(item);
    let h2 = fnv1a64(&h1.to_le_bytes());
    (h1, h2)
}

#[inline]
fn bit_position(h1: u64, h2: u64, i: u32, num_bits: u64) -> u64 {
    h1.wrapping_add(u64::from(i).wrapping_mul(h2)) % num_bits
}

fn read_array<const N: usize, R: Read>(input: &mut R) -> Result<[u8; N], FilterError> {
    let mut buf = [0u8; N];
    input.read_exact(&mut buf)?;
    Ok(buf)
}

fn read_u16<R: Read>(input: &mut R) -> Result<u16, FilterError> {
    Ok(u16::from_le_bytes(read_array(input)?))
}

fn read_u32<R: Read>(input: &mut R) -> Result<u32, FilterError> {
    Ok(u32::from_le_bytes(read_array(input)?))
}

fn read_u64<R: Read>(input: &mut R) -> Result<u64, FilterError> {
    Ok(u64::from_le_bytes(read_array(input)?))
}
