//! Content fingerprints for compressed artifact names.
//!
//! Uses MD5 purely as a content digest: the fingerprint distinguishes
//! versions of a file in its name and is not a security boundary.
//!
//! # Usage
//!
//! ```ignore
//! let fp = fingerprint(b"body {}"); // -> "fcdce6b6"
//! ```

use md5::{Digest, Md5};

/// Length of the hex fingerprint embedded in artifact names.
pub const FINGERPRINT_LEN: usize = 8;

/// Compute the first 8 lowercase hex chars of the MD5 digest of `content`.
#[inline]
pub fn fingerprint<T: AsRef<[u8]> + ?Sized>(content: &T) -> String {
    let digest = Md5::digest(content.as_ref());
    // 4 bytes -> 8 hex chars
    hex::encode(&digest[..FINGERPRINT_LEN / 2])
}
