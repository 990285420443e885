use std::fmt;

/// The half-open interval `[low, high)` covering a thread's OS-allocated stack.
///
/// `(0, 0)` is the sentinel for "the OS gave us nothing"; every other value is
/// an authoritative bound.
#[repr(C)]
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct StackBounds {
    pub low: usize,
    pub high: usize,
}

impl StackBounds {
    /// bounds could not be determined
    pub const UNKNOWN: StackBounds = StackBounds { low: 0, high: 0 };
    
    /// `addr` is the *low* end of the region, as `pthread_attr_getstack` reports it.
    /// Returns `None` if the region would wrap around the address space.
    pub const fn from_base_size(addr: usize, size: usize) -> Option<Self> {
        match addr.checked_add(size) {
            Some(high) => Some(Self { low: addr, high }),
            None => None,
        }
    }
    
    /// From a low and a high limit. Returns `None` if they're the wrong way round.
    pub const fn from_limits(low: usize, high: usize) -> Option<Self> {
        if low <= high { Some(Self { low, high }) } else { None }
    }
    
    pub const fn is_unknown(&self) -> bool {
        self.low == 0 && self.high == 0
    }
    
    pub const fn size(&self) -> usize {
        self.high - self.low
    }
    
    pub const fn contains(&self, addr: usize) -> bool {
        self.low <= addr && addr < self.high
    }
    
    pub fn as_option(self) -> Option<Self> {
        (!self.is_unknown()).then_some(self)
    }
}

impl fmt::Debug for StackBounds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_unknown() {
            return f.write_str("StackBounds(unknown)")
        }
        write!(f, "StackBounds({:#x}..{:#x})", self.low, self.high)
    }
}

impl fmt::Display for StackBounds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:#x}, {:#x})", self.low, self.high)
    }
}

/// Returns an address inside the caller's current stack frame.
#[inline(never)]
pub fn stack_pointer() -> usize {
    let marker = 0u8;
    std::hint::black_box(&raw const marker) as usize
}
