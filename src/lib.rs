#![deny(unsafe_op_in_unsafe_fn)]

//! Finding the OS-allocated stack of the calling thread, for threads the
//! runtime didn't create itself.

#[macro_use]
extern crate log;

// the value and where it gets written
pub mod bounds;
pub mod slot;
pub mod annotate;

// asking the OS
pub mod platform;
pub mod fatal;
pub mod probe;

// runtime side
pub mod descriptor;
pub mod logging;

#[cfg(test)]
mod testing;

pub use annotate::{NativeAnnotations, NoAnnotations, RaceAnnotations};
pub use bounds::{stack_pointer, StackBounds};
pub use descriptor::{ForeignThreads, ThreadDescriptor};
pub use fatal::{AbortOnFatal, AttrFailure, FailureCause, FatalHandler};
pub use platform::{Family, NativeQuery, StackQuery};
pub use probe::{get_stack_bound, StackBoundProbe};
pub use slot::StackBoundsSlot;
