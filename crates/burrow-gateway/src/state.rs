use std::sync::Arc;

use burrow_core::ShortCode;
use burrow_generator::Generator;
use burrow_shortener::ShortenerService;

/// Generator type the gateway is wired with, picked at startup.
pub type DynGenerator = Box<dyn Generator<Output = ShortCode>>;

#[derive(Clone)]
pub struct AppState {
    shortener: Arc<ShortenerService<DynGenerator>>,
}

impl AppState {
    pub fn new(shortener: Arc<ShortenerService<DynGenerator>>) -> Self {
        Self { shortener }
    }

    pub fn shortener(&self) -> &ShortenerService<DynGenerator> {
        &self.shortener
    }
}
