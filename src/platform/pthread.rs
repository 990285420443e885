//! The `pthread_attr_t` dance shared by every libc that can hand out the
//! attributes of a running thread:
//!
//! 1. `pthread_attr_init`
//! 2. the libc's "attributes of thread X" extension
//! 3. `pthread_attr_getstack`, which gives the *low* address and the size
//! 4. `pthread_attr_destroy`, on every path out
//!
//! Any failure in 1-3 is an [`AttrFailure`].

use std::mem::MaybeUninit;

use crate::bounds::StackBounds;
use crate::fatal::{AttrFailure, FailureCause};
use super::StackQuery;

/// The raw calls, so the sequence can be driven without a real libc.
///
/// Return values follow pthread conventions: `0` on success, an error code otherwise.
pub trait AttrApi {
    type Attr;
    
    /// name of the "attributes of the current thread" call, `None` if this libc doesn't have one
    const EXTENSION: Option<&'static str>;
    
    /// SAFETY: `attr` must be valid for writes
    unsafe fn init(&self, attr: *mut Self::Attr) -> i32;
    
    /// Only called when [`Self::EXTENSION`] is `Some`.
    fn fill_current(&self, attr: &mut Self::Attr) -> i32;
    
    fn get_stack(&self, attr: &Self::Attr) -> Result<(usize, usize), i32>;
    
    fn destroy(&self, attr: &mut Self::Attr) -> i32;
}

impl<A: AttrApi + ?Sized> AttrApi for &A {
    type Attr = A::Attr;
    
    const EXTENSION: Option<&'static str> = A::EXTENSION;
    
    unsafe fn init(&self, attr: *mut Self::Attr) -> i32 {
        // SAFETY: forwarded
        unsafe { (**self).init(attr) }
    }
    
    fn fill_current(&self, attr: &mut Self::Attr) -> i32 {
        (**self).fill_current(attr)
    }
    
    fn get_stack(&self, attr: &Self::Attr) -> Result<(usize, usize), i32> {
        (**self).get_stack(attr)
    }
    
    fn destroy(&self, attr: &mut Self::Attr) -> i32 {
        (**self).destroy(attr)
    }
}


/// Destroys the attributes when dropped.
struct AttrGuard<'a, A: AttrApi> {
    api: &'a A,
    attr: &'a mut A::Attr,
}

impl<A: AttrApi> Drop for AttrGuard<'_, A> {
    fn drop(&mut self) {
        let rv = self.api.destroy(self.attr);
        if rv != 0 {
            warn!("pthread_attr_destroy returned {rv}");
        }
    }
}


#[derive(Debug, Clone, Copy, Default)]
pub struct Pthread<A>(pub A);

impl<A: AttrApi> StackQuery for Pthread<A> {
    fn acquire(&self) -> Result<Option<StackBounds>, AttrFailure> {
        let api = &self.0;
        let mut attr = MaybeUninit::<A::Attr>::uninit();
        
        // NOTE: always init, even where the extension is supposed to do it. glibc
        // before 2.32 didn't in every case.
        
        // SAFETY: `attr` is writable
        let rv = unsafe { api.init(attr.as_mut_ptr()) };
        if rv != 0 {
            return Err(AttrFailure::os("pthread_attr_init", rv))
        }
        
        // SAFETY: init succeeded. `attr` stays put until the guard is gone.
        let mut guard = AttrGuard { api, attr: unsafe { attr.assume_init_mut() } };
        
        let Some(extension) = A::EXTENSION else {
            return Ok(None)
        };
        
        let rv = api.fill_current(&mut *guard.attr);
        if rv != 0 {
            return Err(AttrFailure::os(extension, rv))
        }
        
        let (addr, size) = api.get_stack(&*guard.attr)
            .map_err(|rv| AttrFailure::os("pthread_attr_getstack", rv))?;
        
        match StackBounds::from_base_size(addr, size) {
            Some(bounds) => Ok(Some(bounds)),
            None => Err(AttrFailure { op: "pthread_attr_getstack", cause: FailureCause::Overflow { addr, size } }),
        }
    }
}
