pub mod builder;
pub mod profile;
pub mod types;

pub use builder::BeltModelBuilder;
pub use profile::{build_tooth_void_profile, signed_area};
pub use types::*;
