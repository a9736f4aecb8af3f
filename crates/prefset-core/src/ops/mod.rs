pub mod filter;
pub mod overlay;
pub mod store;

pub use filter::{FilterPredicate, PreferenceFilter};
pub use overlay::{AllPreferences, PreferenceOverlay};
pub use store::{MemoryStore, PreferenceStore};
