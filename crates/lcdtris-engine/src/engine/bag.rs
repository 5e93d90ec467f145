use std::{collections::VecDeque, fmt::Write as _};

use rand::{
    Rng, SeedableRng as _,
    distr::{Distribution, StandardUniform},
    seq::SliceRandom,
};
use rand_pcg::Pcg32;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::PieceKind;

/// Queue of upcoming pieces fed by the 7-bag randomizer.
///
/// # 7-Bag System
///
/// 1. A "bag" containing all 7 piece kinds is shuffled (Fisher–Yates)
/// 2. The shuffled bag is appended to the queue
/// 3. Pieces are drawn from the front of the queue
/// 4. Whenever fewer than 7 pieces remain, another shuffled bag is appended
///
/// Every aligned run of 7 draws therefore contains each kind exactly once,
/// no kind waits more than 12 draws, and a kind repeats at most twice in a
/// row (across a bag boundary).
///
/// # Example
///
/// ```
/// use lcdtris_engine::PieceBag;
///
/// let mut bag = PieceBag::new();
///
/// let first = bag.next();
/// let upcoming: Vec<_> = bag.peek().take(5).collect();
/// assert_eq!(upcoming.len(), 5);
/// ```
#[derive(Debug, Clone)]
pub struct PieceBag {
    rng: Pcg32,
    queue: VecDeque<PieceKind>,
}

impl Default for PieceBag {
    fn default() -> Self {
        Self::new()
    }
}

/// Seed for deterministic piece generation.
///
/// This is a 128-bit (16-byte) seed used to initialize the random number
/// generator for piece generation. Using the same seed will produce the same
/// sequence of pieces.
///
/// Serialized as a 32-character hex string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PieceSeed([u8; 16]);

impl PieceSeed {
    #[must_use]
    pub const fn from_bytes(bytes: [u8; 16]) -> Self {
        Self(bytes)
    }

    /// Parses a seed from 32 hex characters.
    pub fn from_hex(hex_str: &str) -> Result<Self, String> {
        if hex_str.len() != 32 {
            return Err(format!(
                "invalid hex: expected 32 characters, got {}",
                hex_str.len()
            ));
        }
        let num = u128::from_str_radix(hex_str, 16)
            .map_err(|e| format!("invalid hex: {hex_str} ({e})"))?;
        Ok(Self(num.to_be_bytes()))
    }

    #[must_use]
    pub fn to_hex(self) -> String {
        let num = u128::from_be_bytes(self.0);
        let mut hex_str = String::with_capacity(2 * self.0.len());
        _ = write!(&mut hex_str, "{num:032x}");
        hex_str
    }
}

impl std::str::FromStr for PieceSeed {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl Serialize for PieceSeed {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for PieceSeed {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let hex_str = String::deserialize(deserializer)?;
        Self::from_hex(&hex_str).map_err(serde::de::Error::custom)
    }
}

/// Allows generating random `PieceSeed` values using the standard random distribution.
impl Distribution<PieceSeed> for StandardUniform {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> PieceSeed {
        let mut seed = [0; 16];
        rng.fill(&mut seed);
        PieceSeed(seed)
    }
}

impl PieceBag {
    /// Creates a bag with a random seed, already holding one shuffled set.
    #[must_use]
    pub fn new() -> Self {
        Self::with_seed(rand::rng().random())
    }

    /// Like [`Self::new`], but with a specific seed for deterministic piece generation.
    #[must_use]
    pub fn with_seed(seed: PieceSeed) -> Self {
        let mut this = Self {
            rng: Pcg32::from_seed(seed.0),
            queue: VecDeque::with_capacity(PieceKind::LEN * 2),
        };
        this.fill();
        this
    }

    /// Rebuilds a bag whose queue starts with `queue` (as saved), topped up
    /// with fresh shuffled sets until at least 7 pieces are waiting.
    #[must_use]
    pub fn from_queue(seed: PieceSeed, queue: impl IntoIterator<Item = PieceKind>) -> Self {
        let mut this = Self {
            rng: Pcg32::from_seed(seed.0),
            queue: queue.into_iter().collect(),
        };
        this.fill();
        this
    }

    /// Appends one uniformly shuffled permutation of all 7 kinds.
    pub fn refill(&mut self) {
        let mut new_bag = PieceKind::ALL;
        new_bag.shuffle(&mut self.rng);
        self.queue.extend(new_bag);
    }

    fn fill(&mut self) {
        while self.queue.len() < PieceKind::LEN {
            self.refill();
        }
    }

    /// Draws the next piece, refilling first if fewer than 7 remain.
    ///
    /// # Panics
    ///
    /// Panics if the queue is empty (cannot happen after a refill).
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> PieceKind {
        self.fill();
        let kind = self
            .queue
            .pop_front()
            .expect("Piece bag should never be empty");
        self.fill();
        kind
    }

    /// Returns an iterator over the upcoming pieces, in draw order.
    ///
    /// The iterator always yields at least 7 pieces.
    pub fn peek(&self) -> impl Iterator<Item = PieceKind> + '_ {
        self.queue.iter().copied()
    }

    /// Number of pieces waiting in the queue.
    #[must_use]
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    fn seed(byte: u8) -> PieceSeed {
        PieceSeed([byte; 16])
    }

    #[test]
    fn test_aligned_windows_contain_every_kind() {
        let mut bag = PieceBag::with_seed(seed(7));
        for _ in 0..50 {
            let window: HashSet<_> = (0..PieceKind::LEN).map(|_| bag.next()).collect();
            assert_eq!(window.len(), PieceKind::LEN);
        }
    }

    #[test]
    fn test_queue_never_drops_below_seven() {
        let mut bag = PieceBag::with_seed(seed(1));
        for _ in 0..100 {
            assert!(bag.len() >= PieceKind::LEN);
            bag.next();
        }
    }

    #[test]
    fn test_refill_appends_permutation() {
        let mut bag = PieceBag::with_seed(seed(3));
        let before = bag.len();
        bag.refill();
        assert_eq!(bag.len(), before + PieceKind::LEN);
        let appended: HashSet<_> = bag.peek().skip(before).collect();
        assert_eq!(appended.len(), PieceKind::LEN);
    }

    #[test]
    fn test_from_queue_keeps_saved_order() {
        let saved = [PieceKind::S, PieceKind::S, PieceKind::Z];
        let mut bag = PieceBag::from_queue(seed(9), saved);
        assert!(bag.len() >= PieceKind::LEN);
        assert_eq!(bag.next(), PieceKind::S);
        assert_eq!(bag.next(), PieceKind::S);
        assert_eq!(bag.next(), PieceKind::Z);
    }

    #[test]
    fn test_deterministic_piece_generation() {
        let mut bag1 = PieceBag::with_seed(seed(0x42));
        let mut bag2 = PieceBag::with_seed(seed(0x42));
        for _ in 0..20 {
            assert_eq!(bag1.next(), bag2.next());
        }
    }

    #[test]
    fn test_seed_hex_roundtrip() {
        let seed = PieceSeed([
            0x01, 0x23, 0x45, 0x67, 0x89, 0xAB, 0xCD, 0xEF, 0xFE, 0xDC, 0xBA, 0x98, 0x76, 0x54,
            0x32, 0x10,
        ]);
        let serialized = serde_json::to_string(&seed).unwrap();
        assert_eq!(serialized, "\"0123456789abcdeffedcba9876543210\"");
        let deserialized: PieceSeed = serde_json::from_str(&serialized).unwrap();
        assert_eq!(deserialized, seed);
    }

    #[test]
    fn test_seed_parse_errors() {
        assert!(PieceSeed::from_hex("").is_err());
        assert!(PieceSeed::from_hex("0123456789abcdef0123456789abcde").is_err());
        let err = PieceSeed::from_hex("ghijklmnopqrstuvwxyzghijklmnopqr").unwrap_err();
        assert!(err.contains("invalid hex"));
    }
}
