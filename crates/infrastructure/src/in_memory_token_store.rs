use async_trait::async_trait;
use orbit_application::TokenStore;
use orbit_core::AccessToken;
use tokio::sync::RwLock;

/// Process-local holder of the session bearer token.
#[derive(Default)]
pub struct InMemoryTokenStore {
    token: RwLock<Option<AccessToken>>,
}

impl InMemoryTokenStore {
    /// Creates an empty token store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TokenStore for InMemoryTokenStore {
    async fn token(&self) -> Option<AccessToken> {
        self.token.read().await.clone()
    }

    async fn store(&self, token: AccessToken) {
        *self.token.write().await = Some(token);
    }

    async fn clear(&self) {
        self.token.write().await.take();
    }
}
