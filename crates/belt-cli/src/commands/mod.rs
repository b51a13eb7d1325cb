pub mod generate;
pub mod info;
pub mod print_settings;
