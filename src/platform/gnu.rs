//! glibc, bionic and Oracle Solaris: `pthread_getattr_np`.

use super::posix::{attr_destroy, attr_getstack, attr_init};
use super::pthread::AttrApi;

#[cfg(any(target_os = "linux", target_os = "android"))]
use libc::pthread_getattr_np;

// not in the libc crate for solarish targets
#[cfg(target_os = "solaris")]
unsafe extern "C" {
    fn pthread_getattr_np(thread: libc::pthread_t, attr: *mut libc::pthread_attr_t) -> libc::c_int;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct GetattrNp;

impl AttrApi for GetattrNp {
    type Attr = libc::pthread_attr_t;
    
    const EXTENSION: Option<&'static str> = Some("pthread_getattr_np");
    
    unsafe fn init(&self, attr: *mut Self::Attr) -> i32 {
        // SAFETY: guaranteed by caller
        unsafe { attr_init(attr) }
    }
    
    fn fill_current(&self, attr: &mut Self::Attr) -> i32 {
        // SAFETY: `attr` was initialized, and we only ever ask about ourselves
        unsafe { pthread_getattr_np(libc::pthread_self(), attr) }
    }
    
    fn get_stack(&self, attr: &Self::Attr) -> Result<(usize, usize), i32> {
        attr_getstack(attr)
    }
    
    fn destroy(&self, attr: &mut Self::Attr) -> i32 {
        attr_destroy(attr)
    }
}
