pub mod config;

pub use config::{get_owner, load_config, load_config_from, save_config, Config};
