use std::sync::Arc;

use crate::settlement::BookingFinalizer;
use crate::store::SettlementStore;

/// Shared per-process dependencies, constructed once at startup.
#[derive(Clone)]
pub struct AppState {
    pub finalizer: Arc<BookingFinalizer>,
    pub store: Arc<dyn SettlementStore>,
}

impl AppState {
    pub fn new(finalizer: BookingFinalizer, store: Arc<dyn SettlementStore>) -> Self {
        Self {
            finalizer: Arc::new(finalizer),
            store,
        }
    }
}
