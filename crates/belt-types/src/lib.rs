pub mod error;
pub mod print_settings;
pub mod profile;
pub mod spec;

pub use error::*;
pub use print_settings::*;
pub use profile::*;
pub use spec::*;
