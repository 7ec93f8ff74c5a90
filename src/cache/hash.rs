//! Key Hashing Module
//!
//! FNV-1a accumulation followed by an avalanche finalizer. The hash is
//! unseeded: the same key always maps to the same bucket, which also means
//! it offers no protection against adversarially chosen keys.

#[cfg(target_pointer_width = "64")]
mod imp {
    const FNV_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
    const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

    pub fn hash(key: &[u8]) -> usize {
        let mut h = FNV_OFFSET_BASIS;
        for &byte in key {
            h ^= u64::from(byte);
            h = h.wrapping_mul(FNV_PRIME);
        }

        // SplitMix64 finalizer
        h ^= h >> 30;
        h = h.wrapping_mul(0xbf58_476d_1ce4_e5b9);
        h ^= h >> 27;
        h = h.wrapping_mul(0x94d0_49bb_1331_11eb);
        h ^= h >> 31;
        h as usize
    }
}

#[cfg(not(target_pointer_width = "64"))]
mod imp {
    const FNV_OFFSET_BASIS: u32 = 0x811c_9dc5;
    const FNV_PRIME: u32 = 0x0100_0193;

    pub fn hash(key: &[u8]) -> usize {
        let mut h = FNV_OFFSET_BASIS;
        for &byte in key {
            h ^= u32::from(byte);
            h = h.wrapping_mul(FNV_PRIME);
        }

        // Murmur3 fmix32
        h ^= h >> 16;
        h = h.wrapping_mul(0x85eb_ca6b);
        h ^= h >> 13;
        h = h.wrapping_mul(0xc2b2_ae35);
        h ^= h >> 16;
        h as usize
    }
}

// == Hash Key ==
/// Hashes a key to a platform-width value.
#[inline]
pub fn hash_key(key: &[u8]) -> usize {
    imp::hash(key)
}

// == Bucket Index ==
/// Maps a key to a bucket in `0..bucket_count`.
///
/// `bucket_count` must be non-zero; the cache rejects zero at construction.
#[inline]
pub fn bucket_index(key: &[u8], bucket_count: usize) -> usize {
    hash_key(key) % bucket_count
}
