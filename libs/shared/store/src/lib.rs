pub mod memory;
pub mod notify;
pub mod traits;

use std::sync::Arc;

pub use memory::MemoryStore;
pub use notify::LogNotifier;
pub use traits::*;

/// Collaborator bundle handed to every cell router.
#[derive(Clone)]
pub struct AppState {
    pub directory: Arc<dyn Directory>,
    pub appointments: Arc<dyn AppointmentStore>,
    pub waitlist: Arc<dyn WaitlistStore>,
    pub notifier: Arc<dyn Notifier>,
}

impl AppState {
    /// Fully in-memory state, used by tests and local development.
    pub fn in_memory() -> (Self, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let state = Self {
            directory: store.clone(),
            appointments: store.clone(),
            waitlist: store.clone(),
            notifier: Arc::new(LogNotifier),
        };
        (state, store)
    }
}
