use std::sync::Arc;

use crate::auth::TokenKeys;
use crate::store::Store;

/// Shared by every handler through axum's `State`.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub tokens: Arc<TokenKeys>,
    pub bcrypt_cost: u32,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>, tokens: TokenKeys, bcrypt_cost: u32) -> Self {
        Self {
            store,
            tokens: Arc::new(tokens),
            bcrypt_cost,
        }
    }
}
