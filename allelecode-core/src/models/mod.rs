pub mod code;
pub mod founder;
pub mod profile;

// re-export for cleaner imports
pub use self::code::NomenclatureCode;
pub use self::founder::FounderRecord;
pub use self::profile::{AlleleCall, AlleleProfile};
