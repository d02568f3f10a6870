use crate::error::Error;
use crate::Generator;
use burrow_core::ShortCode;
use rand::Rng;

const ALPHABET: &[u8; 62] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

pub const DEFAULT_LENGTH: usize = 8;
pub const MIN_LENGTH: usize = 6;
pub const MAX_LENGTH: usize = 32;

/// Random fixed-length codes drawn uniformly from `[a-zA-Z0-9]`.
#[derive(Debug, Clone, Copy)]
pub struct Base62Generator {
    length: usize,
}

impl Base62Generator {
    pub fn new() -> Self {
        Self {
            length: DEFAULT_LENGTH,
        }
    }

    pub fn with_length(length: usize) -> Result<Self, Error> {
        if !(MIN_LENGTH..=MAX_LENGTH).contains(&length) {
            return Err(Error::InvalidLength {
                length,
                min: MIN_LENGTH,
                max: MAX_LENGTH,
            });
        }
        Ok(Self { length })
    }

    pub fn length(&self) -> usize {
        self.length
    }
}

impl Default for Base62Generator {
    fn default() -> Self {
        Self::new()
    }
}

impl Generator for Base62Generator {
    type Output = ShortCode;

    fn generate(&self) -> ShortCode {
        let mut rng = rand::rng();
        let code: String = (0..self.length)
            .map(|_| ALPHABET[rng.random_range(0..ALPHABET.len())] as char)
            .collect();
        ShortCode::new_unchecked(code)
    }
}
