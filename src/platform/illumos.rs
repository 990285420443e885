//! illumos spells it `pthread_attr_get_np`.

use super::posix::{attr_destroy, attr_getstack, attr_init};
use super::pthread::AttrApi;

unsafe extern "C" {
    fn pthread_attr_get_np(thread: libc::pthread_t, attr: *mut libc::pthread_attr_t) -> libc::c_int;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct AttrGetNp;

impl AttrApi for AttrGetNp {
    type Attr = libc::pthread_attr_t;
    
    const EXTENSION: Option<&'static str> = Some("pthread_attr_get_np");
    
    unsafe fn init(&self, attr: *mut Self::Attr) -> i32 {
        // SAFETY: guaranteed by caller
        unsafe { attr_init(attr) }
    }
    
    fn fill_current(&self, attr: &mut Self::Attr) -> i32 {
        // SAFETY: `attr` was initialized
        unsafe { pthread_attr_get_np(libc::pthread_self(), attr) }
    }
    
    fn get_stack(&self, attr: &Self::Attr) -> Result<(usize, usize), i32> {
        attr_getstack(attr)
    }
    
    fn destroy(&self, attr: &mut Self::Attr) -> i32 {
        attr_destroy(attr)
    }
}
