//! Platform-specific helpers.
//! Hides OS differences (Unix/Windows) behind a uniform API so the engines
//! stay platform-agnostic.

mod temp;
#[cfg(unix)]
mod unix;
#[cfg(not(unix))]
mod windows;

#[cfg(unix)]
pub use unix::{
    free_space_bytes, open_log_file_secure, set_dir_mode_0700, set_file_mode_0600,
    write_config_secure_new_0600,
};

#[cfg(not(unix))]
pub use windows::{
    free_space_bytes, open_log_file_secure, set_dir_mode_0700, set_file_mode_0600,
    write_config_secure_new_0600,
};
