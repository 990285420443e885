//! Happens-before annotations for data-race detectors.
//!
//! The descriptor memory the bounds are written into gets recycled between
//! tasks through the runtime's own bookkeeping, which a race detector can't
//! see. Bracketing the store with an acquire/release pair on the slot address
//! tells it the write is ordered with whoever reads the slot next.

pub trait RaceAnnotations {
    fn acquire(&self, addr: *const ());
    fn release(&self, addr: *const ());
}

impl<A: RaceAnnotations + ?Sized> RaceAnnotations for &A {
    fn acquire(&self, addr: *const ()) {
        (**self).acquire(addr)
    }
    
    fn release(&self, addr: *const ()) {
        (**self).release(addr)
    }
}


/// Only logs. The atomic stores in [`StackBoundsSlot::publish`] still carry
/// the release ordering.
///
/// [`StackBoundsSlot::publish`]: crate::StackBoundsSlot::publish
#[derive(Debug, Clone, Copy, Default)]
pub struct NoAnnotations;

impl RaceAnnotations for NoAnnotations {
    fn acquire(&self, addr: *const ()) {
        trace!("race annotation: acquire {addr:016x?}");
    }
    
    fn release(&self, addr: *const ()) {
        trace!("race annotation: release {addr:016x?}");
    }
}


#[cfg(feature = "tsan")]
unsafe extern "C" {
    fn __tsan_acquire(addr: *mut core::ffi::c_void);
    fn __tsan_release(addr: *mut core::ffi::c_void);
}

/// Forwards to the ThreadSanitizer runtime. Needs `-Zsanitizer=thread`,
/// otherwise the hooks won't link.
#[cfg(feature = "tsan")]
#[derive(Debug, Clone, Copy, Default)]
pub struct TsanAnnotations;

#[cfg(feature = "tsan")]
impl RaceAnnotations for TsanAnnotations {
    fn acquire(&self, addr: *const ()) {
        // SAFETY: tsan only uses the address as a sync-object key
        unsafe { __tsan_acquire(addr as *mut _) }
    }
    
    fn release(&self, addr: *const ()) {
        // SAFETY: see above
        unsafe { __tsan_release(addr as *mut _) }
    }
}


#[cfg(feature = "tsan")]
pub type NativeAnnotations = TsanAnnotations;
#[cfg(not(feature = "tsan"))]
pub type NativeAnnotations = NoAnnotations;
