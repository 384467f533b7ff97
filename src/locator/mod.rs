//! The live memory locator: a full-scan signature search with a locality
//! classifier and tiebreaking selector, backed by a cached fast path.

mod cache;

use std::cmp::Reverse;

use crate::constants::{
    LIVE_NODE_SIGNATURE, LIVE_NODE_VALUE_OFFSET, LOCALITY_RADIUS, LOCALITY_WORD_OFFSETS,
    SCAN_CHUNK_SIZE,
};
use crate::error::GrubCounterError;
use crate::primitives::Address32;
use crate::process::{MemoryRegion, PlatformProcess, ProcessHandle};
use crate::signature;

use self::cache::LocatorCache;

/// A candidate live-node header found during a scan: its address, the three
/// pointer-sized words immediately preceding it, and its value DWORD.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct CandidateNode {
    address: Address32,
    preceding_words: [u32; 3],
    value: u32,
}

/// How many of a candidate's three preceding words point within
/// [`LOCALITY_RADIUS`] bytes of its own address; ranges over `0..=3`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct LocalityScore(u8);

impl LocalityScore {
    pub fn value(self) -> u8 {
        self.0
    }
}

/// A snapshot of one candidate handed to the scan's optional observability
/// callback, bundling everything a verbose diagnostic dump would want.
#[derive(Clone, Copy, Debug)]
pub struct CandidateReport {
    pub address: Address32,
    pub score: LocalityScore,
    pub value: u32,
    pub preceding_words: [u32; 3],
}

impl CandidateReport {
    fn new(node: &CandidateNode, score: LocalityScore) -> Self {
        Self {
            address: node.address,
            score,
            value: node.value,
            preceding_words: node.preceding_words,
        }
    }
}

/// Owns the attached process handle and the cached-address state machine
/// for the lifetime of a single locator session.
pub struct GrubCounterLocator {
    process: ProcessHandle,
    cache: LocatorCache,
}

impl GrubCounterLocator {
    /// Attaches to the named process. See [`ProcessHandle::attach`] for the
    /// failure modes.
    pub fn attach(process_name: &str) -> Result<Self, GrubCounterError> {
        Ok(Self {
            process: ProcessHandle::attach(process_name)?,
            cache: LocatorCache::new(),
        })
    }

    /// Polls the current grub count: a fast validated read if the cache is
    /// Warm, a full rescan otherwise.
    pub fn poll(&mut self) -> Result<u32, GrubCounterError> {
        self.poll_with_observer(None)
    }

    /// The last known `(address, value)` pair, without forcing a read.
    ///
    /// `None` while the cache is Cold (before the first successful [`poll`](Self::poll),
    /// or right after one invalidates it). Lets a polling collaborator check
    /// the current value -- to decide whether it changed since the last
    /// write to a text file, say -- without paying for a read it doesn't need.
    pub fn current(&self) -> Option<(Address32, u32)> {
        self.cache.current()
    }

    /// As [`GrubCounterLocator::poll`], but invoked once per candidate
    /// encountered during any full scan this poll triggers. Never called at
    /// all on a cache hit. Purely diagnostic: it never changes selection.
    pub fn poll_with_observer(
        &mut self,
        observe: Option<&mut dyn FnMut(&CandidateReport)>,
    ) -> Result<u32, GrubCounterError> {
        if let Some((address, last_value)) = self.cache.current() {
            if last_value == 0 {
                // A dead node reading zero is indistinguishable from the
                // live one at zero; always re-validate from scratch.
                self.cache.invalidate();
            } else {
                match self.process.read_u32(address.add(LIVE_NODE_VALUE_OFFSET)) {
                    Ok(v) => {
                        if let Some(value) = self.cache.observe(v) {
                            return Ok(value);
                        }
                    }
                    Err(_) => self.cache.invalidate(),
                }
            }
        }

        let (address, value) = full_scan(&self.process, observe)?;
        self.cache.set(address, value);
        Ok(value)
    }
}

/// Runs a full scan over every readable region of `process`, returning the
/// winning candidate's address and value.
fn full_scan<P: PlatformProcess>(
    process: &P,
    mut observe: Option<&mut dyn FnMut(&CandidateReport)>,
) -> Result<(Address32, u32), GrubCounterError> {
    let regions = process.enumerate_regions().map_err(|err| {
        log::warn!("region enumeration failed: {err}");
        err
    })?;

    let mut candidates = Vec::new();
    for region in &regions {
        if !region.is_readable() {
            continue;
        }
        scan_region(process, region, &mut candidates, observe.as_deref_mut());
    }

    log::debug!("full scan examined {} region(s), {} candidate(s)", regions.len(), candidates.len());

    select(&candidates)
        .map(|node| (node.address, node.value))
        .ok_or(GrubCounterError::CounterNotFound)
}

/// Reads one region in overlapping chunks and collects every candidate node
/// found in it. Chunking bounds peak memory on large regions; the overlap
/// (signature length minus one byte) guarantees a signature straddling a
/// chunk boundary is still found exactly once.
fn scan_region<P: PlatformProcess>(
    process: &P,
    region: &MemoryRegion,
    candidates: &mut Vec<(CandidateNode, LocalityScore)>,
    mut observe: Option<&mut dyn FnMut(&CandidateReport)>,
) {
    let size = region.size();
    if size == 0 {
        return;
    }

    let overlap = (LIVE_NODE_SIGNATURE.len() - 1) as u32;
    let stride = SCAN_CHUNK_SIZE as u32 - overlap;
    let mut offset: u32 = 0;

    loop {
        if offset >= size {
            break;
        }
        let remaining = size - offset;
        let chunk_len = remaining.min(SCAN_CHUNK_SIZE as u32);
        let chunk_base = region.base().add(offset);

        let mut buffer = vec![0u8; chunk_len as usize];
        if process.read(chunk_base, &mut buffer).is_err() {
            log::trace!("read failed at {chunk_base}, abandoning region at {}", region.base());
            return;
        }

        // `stride` already leaves a gap of exactly `overlap` bytes between
        // this chunk's base and the previous chunk's end, and the previous
        // chunk could report a match starting no later than
        // `chunk_len - LIVE_NODE_SIGNATURE.len()`. So this chunk's first
        // reportable start (local offset 0) picks up exactly where the
        // previous one left off: no duplicate, no gap, nothing to skip.
        for local in signature::find_all(&buffer, &LIVE_NODE_SIGNATURE) {
            let address = chunk_base.add(local as u32);
            log::debug!("candidate node signature matched at {address}");
            if let Some((candidate, score)) = build_candidate(process, address) {
                if let Some(callback) = observe.as_deref_mut() {
                    callback(&CandidateReport::new(&candidate, score));
                }
                candidates.push((candidate, score));
            }
        }

        if chunk_len < SCAN_CHUNK_SIZE as u32 {
            break;
        }
        offset += stride;
    }
}

/// Reads the value and the three preceding locality words for a matched
/// node address, classifying it. Returns `None` only if the value DWORD
/// itself can't be read -- a candidate with unreadable preceding words is
/// still scored, treating unreadable preceding words as zero.
fn build_candidate<P: PlatformProcess>(
    process: &P,
    address: Address32,
) -> Option<(CandidateNode, LocalityScore)> {
    let mut value_buf = [0u8; 4];
    if process
        .read(address.add(LIVE_NODE_VALUE_OFFSET), &mut value_buf)
        .is_err()
    {
        log::trace!("value read failed for candidate at {address}, discarding");
        return None;
    }
    let value = u32::from_le_bytes(value_buf);

    let mut preceding_words = [0u32; 3];
    for (slot, &rel_offset) in preceding_words.iter_mut().zip(LOCALITY_WORD_OFFSETS.iter()) {
        let mut word_buf = [0u8; 4];
        *slot = match process.read(address - rel_offset, &mut word_buf) {
            Ok(()) => u32::from_le_bytes(word_buf),
            Err(_) => 0,
        };
    }

    let score = locality_score(address, &preceding_words);
    let candidate = CandidateNode {
        address,
        preceding_words,
        value,
    };
    Some((candidate, score))
}

fn locality_score(address: Address32, preceding_words: &[u32; 3]) -> LocalityScore {
    let count = preceding_words
        .iter()
        .filter(|&&word| address.abs_diff(Address32::new(word)) <= LOCALITY_RADIUS)
        .count();
    LocalityScore(count as u8)
}

/// Picks the winning candidate: survivors are the score-3 candidates, or if
/// none scored 3, the highest-scoring group present. Among survivors, the
/// largest value DWORD wins; ties break to the lowest address.
fn select(scored: &[(CandidateNode, LocalityScore)]) -> Option<&CandidateNode> {
    let has_perfect_locality = scored.iter().any(|(_, score)| score.value() == 3);
    let threshold = if has_perfect_locality {
        3
    } else {
        scored.iter().map(|(_, score)| score.value()).max()?
    };

    scored
        .iter()
        .filter(|(_, score)| score.value() == threshold)
        .map(|(node, _)| node)
        .max_by_key(|node| (node.value, Reverse(node.address.value())))
}
