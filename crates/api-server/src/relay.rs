use common::Provider;
use common::config::InferenceParams;
use std::sync::Arc;

/// Everything a chat request needs, shared read-only across requests.
pub struct ChatRelay<P> {
    pub provider: Arc<P>,
    pub params:   Arc<InferenceParams>,
}

impl<P: Provider> ChatRelay<P> {
    pub fn new(provider: P, params: InferenceParams) -> Self {
        Self {
            provider: Arc::new(provider),
            params:   Arc::new(params),
        }
    }
}

impl<P> Clone for ChatRelay<P> {
    fn clone(&self) -> Self {
        Self {
            provider: self.provider.clone(),
            params:   self.params.clone(),
        }
    }
}
