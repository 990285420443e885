//! Per-platform ways of asking "where is my stack?".
//!
//! Which backend gets used is decided at build time, see [`Family::current`]
//! and [`NativeQuery`].

use std::fmt;

use crate::bounds::StackBounds;
use crate::fatal::AttrFailure;

pub mod pthread;

#[cfg(unix)]
pub mod posix;

#[cfg(any(all(target_os = "linux", target_env = "gnu"), target_os = "android", target_os = "solaris"))]
pub mod gnu;

#[cfg(target_os = "illumos")]
pub mod illumos;

#[cfg(target_vendor = "apple")]
pub mod darwin;

#[cfg(windows)]
pub mod windows;


/// Something that can report the calling thread's stack.
pub trait StackQuery {
    /// `Ok(None)` means this platform has no way of telling us.
    fn acquire(&self) -> Result<Option<StackBounds>, AttrFailure>;
}

impl<Q: StackQuery + ?Sized> StackQuery for &Q {
    fn acquire(&self) -> Result<Option<StackBounds>, AttrFailure> {
        (**self).acquire()
    }
}

/// For targets with no thread library to ask at all.
#[derive(Debug, Clone, Copy, Default)]
pub struct Unsupported;

impl StackQuery for Unsupported {
    fn acquire(&self) -> Result<Option<StackBounds>, AttrFailure> {
        Ok(None)
    }
}


/// Which thread library this was built for. Only used to say so in logs,
/// the backend itself is picked by [`NativeQuery`].
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Family {
    Glibc,
    Bionic,
    /// Oracle Solaris. It has `pthread_getattr_np`, illumos doesn't.
    Solaris,
    Illumos,
    Darwin,
    Windows,
    Unknown,
}

impl Family {
    pub const fn current() -> Self {
        if cfg!(all(target_os = "linux", target_env = "gnu")) {
            Family::Glibc
        } else if cfg!(target_os = "android") {
            Family::Bionic
        } else if cfg!(target_os = "solaris") {
            Family::Solaris
        } else if cfg!(target_os = "illumos") {
            Family::Illumos
        } else if cfg!(target_vendor = "apple") {
            Family::Darwin
        } else if cfg!(windows) {
            Family::Windows
        } else {
            Family::Unknown
        }
    }
    
    pub const fn name(self) -> &'static str {
        match self {
            Family::Glibc => "glibc",
            Family::Bionic => "bionic",
            Family::Solaris => "solaris",
            Family::Illumos => "illumos",
            Family::Darwin => "darwin",
            Family::Windows => "windows",
            Family::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Family {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}


#[cfg(any(all(target_os = "linux", target_env = "gnu"), target_os = "android", target_os = "solaris"))]
pub type NativeQuery = pthread::Pthread<gnu::GetattrNp>;

#[cfg(target_os = "illumos")]
pub type NativeQuery = pthread::Pthread<illumos::AttrGetNp>;

#[cfg(target_vendor = "apple")]
pub type NativeQuery = darwin::DarwinQuery;

#[cfg(windows)]
pub type NativeQuery = windows::WindowsQuery;

#[cfg(all(
    unix,
    not(any(all(target_os = "linux", target_env = "gnu"), target_os = "android", target_os = "solaris")),
    not(target_os = "illumos"),
    not(target_vendor = "apple"),
))]
pub type NativeQuery = pthread::Pthread<posix::NoExtension>;

#[cfg(not(any(unix, windows)))]
pub type NativeQuery = Unsupported;

pub fn native() -> NativeQuery {
    NativeQuery::default()
}
