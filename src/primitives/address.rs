use std::fmt;

use bytemuck::{Pod, Zeroable};

/// A 32-bit address in the target process's address space.
///
/// The target is always a 32-bit process (see the `ProcessHandle` invariant
/// in [`crate::process`]), so there is exactly one address width in this
/// crate, unlike the 16/32/64-bit family a general-purpose memory-reading
/// library would need.
#[derive(Copy, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct Address32(u32);

impl Address32 {
    /// The null pointer pointing to address 0.
    pub const NULL: Self = Self(0);

    /// Creates a new address from the given value.
    #[inline]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Returns the underlying address as an integer.
    #[inline]
    pub const fn value(self) -> u32 {
        self.0
    }

    /// Checks whether the address is null.
    #[inline]
    pub const fn is_null(self) -> bool {
        self.0 == 0
    }

    /// Offsets the address by the given number of bytes, wrapping on overflow.
    ///
    /// Wrapping rather than panicking matters here: candidate addresses near
    /// the top of the 32-bit space are exactly the kind of unlikely-but-real
    /// input the locality filter has to score without crashing.
    #[inline]
    pub const fn add(self, bytes: u32) -> Self {
        Self(self.0.wrapping_add(bytes))
    }

    /// Offsets the address by the given signed number of bytes, wrapping on
    /// overflow.
    #[inline]
    pub const fn add_signed(self, bytes: i32) -> Self {
        Self(self.0.wrapping_add_signed(bytes))
    }

    /// The unsigned distance between two addresses.
    #[inline]
    pub const fn abs_diff(self, other: Self) -> u32 {
        self.0.abs_diff(other.0)
    }
}

impl fmt::Debug for Address32 {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Pointer::fmt(self, f)
    }
}

impl fmt::Display for Address32 {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Pointer::fmt(self, f)
    }
}

impl fmt::Pointer for Address32 {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:08x}", self.0)
    }
}

impl From<u32> for Address32 {
    #[inline]
    fn from(addr: u32) -> Self {
        Self(addr)
    }
}

impl From<Address32> for u32 {
    #[inline]
    fn from(addr: Address32) -> Self {
        addr.0
    }
}

impl std::ops::Add<u32> for Address32 {
    type Output = Self;

    #[inline]
    fn add(self, bytes: u32) -> Self {
        self.add(bytes)
    }
}

impl std::ops::Sub<u32> for Address32 {
    type Output = Self;

    #[inline]
    fn sub(self, bytes: u32) -> Self {
        self.add_signed(-(bytes as i32))
    }
}

// SAFETY: The type is transparent over a `u32`, which is `Pod`.
unsafe impl Pod for Address32 {}
// SAFETY: The type is transparent over a `u32`, which is `Zeroable`.
unsafe impl Zeroable for Address32 {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_as_lower_hex_pointer() {
        assert_eq!(format!("{}", Address32::new(0x1234)), "0x00001234");
        assert_eq!(format!("{:?}", Address32::new(0xdead_beef)), "0xdeadbeef");
    }

    #[test]
    fn add_wraps_instead_of_panicking() {
        let addr = Address32::new(u32::MAX);
        assert_eq!(addr.add(1), Address32::NULL);
    }

    #[test]
    fn sub_wraps_instead_of_panicking() {
        let addr = Address32::NULL;
        assert_eq!(addr - 1, Address32::new(u32::MAX));
    }

    #[test]
    fn abs_diff_is_symmetric() {
        let a = Address32::new(100);
        let b = Address32::new(40);
        assert_eq!(a.abs_diff(b), 60);
        assert_eq!(b.abs_diff(a), 60);
    }
}
