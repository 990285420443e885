use std::sync::atomic::{AtomicUsize, Ordering};

use crate::annotate::RaceAnnotations;
use crate::bounds::StackBounds;

/// The two words of a thread descriptor that hold its stack bounds.
///
/// Written once by the thread the bounds describe, read later by whichever
/// thread ends up reusing the descriptor.
#[repr(C)]
#[derive(Debug, Default)]
pub struct StackBoundsSlot {
    low: AtomicUsize,
    high: AtomicUsize,
}

impl StackBoundsSlot {
    pub const fn new() -> Self {
        Self {
            low: AtomicUsize::new(0),
            high: AtomicUsize::new(0),
        }
    }
    
    pub fn addr(&self) -> *const () {
        self as *const Self as *const ()
    }
    
    /// Store `bounds`, bracketed by exactly one acquire/release annotation pair.
    pub fn publish(&self, bounds: StackBounds, annotations: &impl RaceAnnotations) {
        let addr = self.addr();
        annotations.acquire(addr);
        self.low.store(bounds.low, Ordering::Relaxed);
        // store(Release) on the second word → a load(Acquire) of `high` sees `low` too
        self.high.store(bounds.high, Ordering::Release);
        annotations.release(addr);
    }
    
    pub fn load(&self) -> StackBounds {
        let high = self.high.load(Ordering::Acquire);
        let low = self.low.load(Ordering::Relaxed);
        StackBounds { low, high }
    }
    
    pub fn get_mut(&mut self) -> StackBounds {
        StackBounds { low: *self.low.get_mut(), high: *self.high.get_mut() }
    }
}

impl From<StackBounds> for StackBoundsSlot {
    fn from(bounds: StackBounds) -> Self {
        Self {
            low: AtomicUsize::new(bounds.low),
            high: AtomicUsize::new(bounds.high),
        }
    }
}
