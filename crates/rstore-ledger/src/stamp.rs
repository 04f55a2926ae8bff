//! Sources of version stamps.
//!
//! Stamps are injected into ledgers rather than drawn from a global so tests
//! can supply deterministic values.

/// Generates the opaque stamp shared by all paths one operation touches.
///
/// Stamps must be filesystem- and URL-safe and unique with high probability
/// per call.
pub trait StampSource: Send + Sync {
    fn next_stamp(&self) -> String;
}

/// Number of random bytes per stamp (hex-encoded to twice as many chars).
const STAMP_BYTES: usize = 16;

/// Random hex stamps from the thread-local CSPRNG.
#[derive(Clone, Copy, Debug, Default)]
pub struct RandomStamp;

impl StampSource for RandomStamp {
    fn next_stamp(&self) -> String {
        let mut bytes = [0u8; STAMP_BYTES];
        rand::Rng::fill(&mut rand::thread_rng(), &mut bytes);
        hex::encode(bytes)
    }
}

/// Always returns the same stamp.
#[derive(Clone, Debug)]
pub struct FixedStamp(pub String);

impl FixedStamp {
    pub fn new(stamp: impl Into<String>) -> Self {
        Self(stamp.into())
    }
}

impl StampSource for FixedStamp {
    fn next_stamp(&self) -> String {
        self.0.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn random_stamps_are_url_safe_and_distinct() {
        let a = RandomStamp.next_stamp();
        let b = RandomStamp.next_stamp();
        assert_eq!(a.len(), STAMP_BYTES * 2);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a, b);
    }

    #[test]
    fn fixed_stamp_repeats() {
        let source = FixedStamp::new("abcd1234");
        assert_eq!(source.next_stamp(), "abcd1234");
        assert_eq!(source.next_stamp(), "abcd1234");
    }
}
