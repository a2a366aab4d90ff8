use std::sync::Arc;

use application::{Dispatcher, IdentityVerifier, MessageStore};
use config::ChatConfig;

#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Arc<Dispatcher>,
    pub verifier: Arc<dyn IdentityVerifier>,
    pub store: Arc<dyn MessageStore>,
    pub chat: ChatConfig,
}

impl AppState {
    pub fn new(
        dispatcher: Arc<Dispatcher>,
        verifier: Arc<dyn IdentityVerifier>,
        store: Arc<dyn MessageStore>,
        chat: ChatConfig,
    ) -> Self {
        Self {
            dispatcher,
            verifier,
            store,
            chat,
        }
    }
}
