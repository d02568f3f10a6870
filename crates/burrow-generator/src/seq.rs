use crate::error::Error;
use crate::Generator;
use burrow_core::ShortCode;
use std::sync::atomic::{AtomicU64, Ordering};

/// Longest prefix that still leaves room for a full `u64` counter.
pub const MAX_PREFIX_LENGTH: usize = ShortCode::MAX_LEN - 20;

/// A short code generator using a sequential counter.
///
/// Produces codes like "bw000000", "bw000001", etc. Codes are unique within
/// a single instance; separate instances must use distinct prefixes.
#[derive(Debug)]
pub struct SeqGenerator {
    counter: AtomicU64,
    prefix: String,
}

impl SeqGenerator {
    pub fn with_prefix(prefix: impl Into<String>) -> Result<Self, Error> {
        Self::with_offset(prefix, 0)
    }

    /// Creates a generator whose first code uses `offset` as its counter.
    ///
    /// The prefix may hold at most [`MAX_PREFIX_LENGTH`] characters from
    /// `[a-zA-Z0-9_-]`.
    pub fn with_offset(prefix: impl Into<String>, offset: u64) -> Result<Self, Error> {
        let prefix = prefix.into();
        if prefix.len() > MAX_PREFIX_LENGTH
            || !prefix
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(Error::InvalidPrefix(prefix));
        }

        Ok(Self {
            counter: AtomicU64::new(offset),
            prefix,
        })
    }
}

impl Generator for SeqGenerator {
    type Output = ShortCode;

    fn generate(&self) -> ShortCode {
        let count = self.counter.fetch_add(1, Ordering::SeqCst);
        ShortCode::new_unchecked(format!("{}{:06}", self.prefix, count))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn produces_sequential_codes() {
        let generator = SeqGenerator::with_prefix("bw").unwrap();

        assert_eq!(generator.generate().as_str(), "bw000000");
        assert_eq!(generator.generate().as_str(), "bw000001");
        assert_eq!(generator.generate().as_str(), "bw000002");
    }

    #[test]
    fn starts_from_offset() {
        let generator = SeqGenerator::with_offset("bw", 1000).unwrap();

        assert_eq!(generator.generate().as_str(), "bw001000");
        assert_eq!(generator.generate().as_str(), "bw001001");
    }

    #[test]
    fn concurrent_generation_never_repeats() {
        let generator = Arc::new(SeqGenerator::with_prefix("c").unwrap());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let generator = Arc::clone(&generator);
                std::thread::spawn(move || {
                    (0..250)
                        .map(|_| generator.generate().as_str().to_owned())
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        let mut all: Vec<String> = handles
            .into_iter()
            .flat_map(|h| h.join().unwrap())
            .collect();
        all.sort();
        all.dedup();
        assert_eq!(all.len(), 1000);
    }

    #[test]
    fn rejects_prefix_that_cannot_form_a_code() {
        assert_eq!(
            SeqGenerator::with_prefix("a/b").unwrap_err(),
            Error::InvalidPrefix("a/b".to_string())
        );
        assert!(SeqGenerator::with_prefix("x".repeat(MAX_PREFIX_LENGTH + 1)).is_err());
    }

    #[test]
    fn longest_prefix_still_yields_valid_codes_at_counter_limit() {
        let prefix = "p".repeat(MAX_PREFIX_LENGTH);
        let generator = SeqGenerator::with_offset(prefix, u64::MAX).unwrap();

        let code = generator.generate();
        assert!(ShortCode::new(code.as_str()).is_ok());
    }

    #[test]
    fn empty_prefix_is_allowed() {
        let generator = SeqGenerator::with_prefix("").unwrap();
        assert_eq!(generator.generate().as_str(), "000000");
    }
}
