//! Plain POSIX attribute calls every pthread backend shares.

use std::ptr;

use super::pthread::AttrApi;

/// SAFETY: `attr` must be valid for writes
pub(super) unsafe fn attr_init(attr: *mut libc::pthread_attr_t) -> i32 {
    // SAFETY: guaranteed by caller
    unsafe { libc::pthread_attr_init(attr) }
}

pub(super) fn attr_getstack(attr: &libc::pthread_attr_t) -> Result<(usize, usize), i32> {
    let mut stackaddr: *mut libc::c_void = ptr::null_mut();
    let mut stacksize: libc::size_t = 0;
    
    // SAFETY: `attr` was initialized, the out params are writable
    let rv = unsafe { libc::pthread_attr_getstack(attr, &raw mut stackaddr, &raw mut stacksize) };
    if rv != 0 { return Err(rv) }
    
    Ok((stackaddr as usize, stacksize as usize))
}

pub(super) fn attr_destroy(attr: &mut libc::pthread_attr_t) -> i32 {
    // SAFETY: `attr` was initialized and is destroyed exactly once
    unsafe { libc::pthread_attr_destroy(attr) }
}


/// A libc with no way to get at a running thread's attributes (musl, the BSDs, ...).
///
/// Still initializes and destroys an attribute object, so every unix goes
/// through the same calls.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoExtension;

impl AttrApi for NoExtension {
    type Attr = libc::pthread_attr_t;
    
    const EXTENSION: Option<&'static str> = None;
    
    unsafe fn init(&self, attr: *mut Self::Attr) -> i32 {
        // SAFETY: guaranteed by caller
        unsafe { attr_init(attr) }
    }
    
    fn fill_current(&self, _attr: &mut Self::Attr) -> i32 {
        libc::ENOSYS
    }
    
    fn get_stack(&self, attr: &Self::Attr) -> Result<(usize, usize), i32> {
        attr_getstack(attr)
    }
    
    fn destroy(&self, attr: &mut Self::Attr) -> i32 {
        attr_destroy(attr)
    }
}
