//! Faster (but not DoS-resistant) hashmaps for word and id lookups
use farmhash;
use hash_hasher::HashBuildHasher;
use std::collections::{HashMap, HashSet};
use std::hash::{Hash, Hasher, BuildHasherDefault};

/// Act like a farmhash
///
/// But since farmhash isn't a streaming hash we only compute the last bytes
/// so it's not really fulfilling the Hasher trait. Word keys are written as one
/// slice followed by a 0xff terminator, so we fold each write into the state.
pub struct FarmHashLie (u64);

impl Default for FarmHashLie {
    #[inline]
    fn default() -> FarmHashLie { FarmHashLie(0) }
}

impl Hasher for FarmHashLie {
    #[inline]
    fn finish(&self) -> u64 {
        self.0
    }
    #[inline]
    fn write(&mut self, bytes: &[u8]) {
        self.0 = self.0.rotate_left(5) ^ farmhash::hash64(bytes);
    }
}

pub type Farm = BuildHasherDefault<FarmHashLie>;
/// Word strings to ids
pub type FarmMap<X, Y> = HashMap<X, Y, Farm>;
pub type FarmSet<X> = HashSet<X, Farm>;

pub fn new_farm<X: Hash+Eq, Y>() -> FarmMap<X, Y> {
    Default::default()
}

/// Vocabulary ids are already well spread, so they are used as their own hash.
pub type PlainMap<X, Y> = HashMap<X, Y, HashBuildHasher>;
pub type PlainSet<X> = HashSet<X, HashBuildHasher>;
