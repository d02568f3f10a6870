use crate::error::Error;
use crate::Generator;
use burrow_core::ShortCode;

/// Always produces the same code. Lets tests force a known short code.
#[derive(Debug, Clone)]
pub struct FixedGenerator {
    code: ShortCode,
}

impl FixedGenerator {
    pub fn new(code: impl Into<String>) -> Result<Self, Error> {
        let code = ShortCode::new(code).map_err(|e| Error::InvalidCode(e.to_string()))?;
        Ok(Self { code })
    }
}

impl Generator for FixedGenerator {
    type Output = ShortCode;

    fn generate(&self) -> ShortCode {
        self.code.clone()
    }
}
