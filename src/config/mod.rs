//! Configuration: types, default paths, XML loading and validation.

pub mod paths;
pub mod types;
mod validate;
pub mod xml;

pub use paths::{
    CONFIG_ENV_VAR, ConfigLocation, ConfigOrigin, default_config_path, default_log_path,
    path_has_symlink_ancestor, resolve_config_path,
};
pub use types::{Config, LogLevel, Verbosity};
pub use xml::{create_template_config, load_config_from_xml_path};

/// Defaults for the `<infos>` section.
pub const TARGET_FILENAME_MAX_LENGTH_DEFAULT: usize = 20;
pub const SOURCE_FILENAME_MAX_LENGTH_DEFAULT: usize = 40;
