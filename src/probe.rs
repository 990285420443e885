use crate::annotate::{NativeAnnotations, RaceAnnotations};
use crate::bounds::StackBounds;
use crate::fatal::{AbortOnFatal, FatalHandler};
use crate::platform::{self, Family, NativeQuery, StackQuery};
use crate::slot::StackBoundsSlot;

/// Finds the calling thread's OS stack and publishes it into a descriptor slot.
///
/// Each call queries the OS again, nothing is cached. The outcome is either
/// real bounds, [`StackBounds::UNKNOWN`] when the platform can't tell, or a
/// call into the [`FatalHandler`] when a platform that should be able to tell
/// fails to.
pub struct StackBoundProbe<Q = NativeQuery, F = AbortOnFatal, A = NativeAnnotations> {
    query: Q,
    fatal: F,
    annotations: A,
}

impl StackBoundProbe {
    /// The build-time backend, aborting on failure.
    pub fn native() -> Self {
        Self::new(platform::native(), AbortOnFatal, NativeAnnotations::default())
    }
}

impl<Q: StackQuery, F: FatalHandler, A: RaceAnnotations> StackBoundProbe<Q, F, A> {
    pub const fn new(query: Q, fatal: F, annotations: A) -> Self {
        Self { query, fatal, annotations }
    }
    
    /// Must run on the thread whose stack is wanted.
    pub fn probe(&self, slot: &StackBoundsSlot) {
        let bounds = match self.query.acquire() {
            Ok(Some(bounds)) => {
                debug!("thread {:?} stack {bounds}", std::thread::current().id());
                bounds
            }
            Ok(None) => {
                debug!("no stack bounds query on {}, publishing unknown", Family::current());
                StackBounds::UNKNOWN
            }
            Err(failure) => self.fatal.fatal(&failure),
        };
        
        slot.publish(bounds, &self.annotations);
    }
    
    pub fn query(&self) -> &Q {
        &self.query
    }
    
    pub fn current(&self) -> StackBounds {
        let slot = StackBoundsSlot::new();
        self.probe(&slot);
        slot.load()
    }
}

/// [`StackBoundProbe::native`] into `slot`.
pub fn get_stack_bound(slot: &StackBoundsSlot) {
    StackBoundProbe::native().probe(slot)
}
