pub mod definition;
pub mod record;
pub mod scope;
pub mod value;

pub use definition::PreferenceDefinition;
pub use record::{OwnerRef, PreferenceRecord, RecordKey};
pub use scope::{EntityRef, Scope};
pub use value::{PrefValue, ValueType};
