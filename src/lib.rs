//! Read-only inspectors that recover the grub count from `monkeyisland103.exe`
//! and from its save files.
//!
//! Two entry points cover the whole crate:
//! - [`save::decode_file`] / [`save::decode_bytes`] for the save-file
//!   decoder.
//! - [`locator::GrubCounterLocator`] for the live memory locator.
//!
//! Neither ever writes to the save file or to the target process; see each
//! module's docs for the specific OS privileges and engine assumptions they
//! rely on.

pub mod constants;
pub mod error;
pub mod locator;
pub mod primitives;
pub mod process;
pub mod save;
pub mod signature;

pub use error::GrubCounterError;
pub use locator::GrubCounterLocator;
pub use primitives::Address32;
