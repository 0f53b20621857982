use std::collections::BTreeSet;

use rand::Rng;

use crate::error::GenError;
use crate::error::Result;

pub const ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
pub const PLAYER_ID_LEN: usize = 3;

/// Number of distinct ids the alphabet and length can express.
pub fn id_space() -> usize {
    ALPHABET.len().pow(PLAYER_ID_LEN as u32)
}

/// Draws `count` unique fixed-length ids by rejection sampling and returns
/// them sorted lexicographically.
///
/// Expected draws stay close to `count` while `count` is far below
/// [`id_space`]; callers must not request counts near the theoretical
/// maximum.
pub fn generate_player_ids<R: Rng>(rng: &mut R, count: usize) -> Result<Vec<String>> {
    let space = id_space();
    if count > space {
        return Err(GenError::Capacity {
            requested: count,
            space,
        });
    }

    let mut ids: BTreeSet<String> = BTreeSet::new();
    while ids.len() < count {
        let id: String = (0..PLAYER_ID_LEN)
            .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
            .collect();
        ids.insert(id);
    }

    Ok(ids.into_iter().collect())
}
