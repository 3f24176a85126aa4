//! Filesystem operations used by the commit engine.

mod atomic;
mod copy;
mod helpers;
mod io_copy;
mod space;
mod util;

pub use copy::safe_copy_and_rename;
pub use helpers::{io_error_with_help, io_error_with_help_io};
pub use space::{
    CATALOG_MARGIN, ensure_space_for_commit, format_bytes, has_room_for, required_space,
};
