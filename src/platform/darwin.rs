use crate::bounds::StackBounds;
use crate::fatal::{AttrFailure, FailureCause};
use super::StackQuery;

/// macOS & friends hand out the *high* end and the size directly, no attribute object needed.
#[derive(Debug, Clone, Copy, Default)]
pub struct DarwinQuery;

impl StackQuery for DarwinQuery {
    fn acquire(&self) -> Result<Option<StackBounds>, AttrFailure> {
        // SAFETY: both only read the calling thread's own descriptor
        let (high, size) = unsafe {
            let this = libc::pthread_self();
            (libc::pthread_get_stackaddr_np(this) as usize, libc::pthread_get_stacksize_np(this) as usize)
        };
        
        match high.checked_sub(size) {
            Some(low) => Ok(Some(StackBounds { low, high })),
            None => Err(AttrFailure { op: "pthread_get_stacksize_np", cause: FailureCause::Overflow { addr: high, size } }),
        }
    }
}
