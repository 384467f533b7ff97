//! Primitive types shared across the save decoder and the live locator.

mod address;

pub use self::address::Address32;
