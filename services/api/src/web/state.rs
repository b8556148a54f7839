//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use crate::config::Config;
use learnmatrix_core::ports::{FileStorageService, StoreService};
use std::sync::Arc;

//=========================================================================================
// AppState (Shared Across All Requests)
//=========================================================================================

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn StoreService>,
    pub files: Arc<dyn FileStorageService>,
    pub config: Arc<Config>,
}
