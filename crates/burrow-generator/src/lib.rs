pub mod error;
pub mod fixed;
pub mod random;
pub mod seq;

pub use error::Error;
pub use fixed::FixedGenerator;
pub use random::Base62Generator;
pub use seq::SeqGenerator;

use burrow_core::ShortCode;

/// Trait for generating short codes.
///
/// Implementations are pure generators that don't interact with storage.
/// No uniqueness guarantee is made; collision handling belongs to the
/// storage backend.
pub trait Generator: Send + Sync + 'static {
    type Output: Into<ShortCode>;

    fn generate(&self) -> Self::Output;
}

impl<G: Generator + ?Sized> Generator for Box<G> {
    type Output = G::Output;

    fn generate(&self) -> Self::Output {
        (**self).generate()
    }
}
