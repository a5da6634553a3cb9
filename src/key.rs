use std::fmt;

/// The maximum number of key bytes stored per slot.
///
/// Longer inputs are silently truncated; see [`Key::new`].
pub const MAX_KEY_LEN: usize = 32;

/// A fixed-capacity key buffer.
///
/// Keys are bounded strings: at most [`MAX_KEY_LEN`] bytes are stored, and
/// an embedded NUL byte terminates the key early. The unused tail of the
/// buffer is always zeroed, so whole-buffer equality is equivalent to
/// bounded string comparison.
///
/// # Examples
///
/// ```
/// use openhash::Key;
///
/// let key = Key::new("bob");
/// assert_eq!(key.as_bytes(), b"bob");
/// assert_eq!(key, Key::new(b"bob"));
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Key {
    bytes: [u8; MAX_KEY_LEN],
}

impl Key {
    /// Creates a key from the given bytes.
    ///
    /// Copies the input up to the first NUL byte or [`MAX_KEY_LEN`] bytes,
    /// whichever comes first. Anything beyond that is silently dropped.
    pub fn new(key: impl AsRef<[u8]>) -> Key {
        let mut bytes = [0; MAX_KEY_LEN];

        for (dst, &src) in bytes.iter_mut().zip(key.as_ref()) {
            if src == 0 {
                break;
            }

            *dst = src;
        }

        Key { bytes }
    }

    /// Returns the stored key bytes, up to the first NUL.
    pub fn as_bytes(&self) -> &[u8] {
        let len = self
            .bytes
            .iter()
            .position(|&b| b == 0)
            .unwrap_or(MAX_KEY_LEN);

        &self.bytes[..len]
    }

    /// Returns the number of stored key bytes.
    pub fn len(&self) -> usize {
        self.as_bytes().len()
    }

    /// Returns `true` if no key bytes are stored.
    pub fn is_empty(&self) -> bool {
        self.bytes[0] == 0
    }

    /// A key with no stored bytes, used for empty and tombstoned slots.
    pub(crate) fn unset() -> Key {
        Key {
            bytes: [0; MAX_KEY_LEN],
        }
    }

    /// Zeroes the entire buffer.
    pub(crate) fn clear(&mut self) {
        self.bytes = [0; MAX_KEY_LEN];
    }
}

impl From<&str> for Key {
    fn from(key: &str) -> Key {
        Key::new(key)
    }
}

impl From<&[u8]> for Key {
    fn from(key: &[u8]) -> Key {
        Key::new(key)
    }
}

impl AsRef<[u8]> for Key {
    fn as_ref(&self) -> &[u8] {
        self.as_bytes()
    }
}

impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", String::from_utf8_lossy(self.as_bytes()))
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", String::from_utf8_lossy(self.as_bytes()))
    }
}
