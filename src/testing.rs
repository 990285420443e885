//! Stand-ins for the collaborators around the probe.

use std::cell::{Cell, RefCell};
use std::ptr;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::annotate::RaceAnnotations;
use crate::bounds::{stack_pointer, StackBounds};
use crate::fatal::{AttrFailure, FatalHandler};
use crate::platform::StackQuery;
use crate::platform::pthread::AttrApi;
use crate::slot::StackBoundsSlot;


#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    /// slot address, and what the slot held when the hook ran
    Acquire(usize, StackBounds),
    Release(usize, StackBounds),
}

/// Records every hook along with the slot contents at that moment.
#[derive(Default)]
pub struct Recorder(RefCell<Vec<Event>>);

impl Recorder {
    pub fn events(&self) -> Vec<Event> {
        self.0.borrow().clone()
    }
    
    pub fn acquires(&self) -> usize {
        self.0.borrow().iter().filter(|e| matches!(e, Event::Acquire(..))).count()
    }
    
    pub fn releases(&self) -> usize {
        self.0.borrow().iter().filter(|e| matches!(e, Event::Release(..))).count()
    }
}

fn peek(addr: *const ()) -> StackBounds {
    // SAFETY: the hooks are only ever handed the address of a live slot
    unsafe { &*addr.cast::<StackBoundsSlot>() }.load()
}

impl RaceAnnotations for Recorder {
    fn acquire(&self, addr: *const ()) {
        self.0.borrow_mut().push(Event::Acquire(addr as usize, peek(addr)));
    }
    
    fn release(&self, addr: *const ()) {
        self.0.borrow_mut().push(Event::Release(addr as usize, peek(addr)));
    }
}


/// Panics with the diagnostic instead of aborting, so tests can watch.
#[derive(Debug, Clone, Copy, Default)]
pub struct PanicOnFatal;

impl FatalHandler for PanicOnFatal {
    fn fatal(&self, failure: &AttrFailure) -> ! {
        panic!("fatal error: {failure}")
    }
}


#[derive(Debug)]
pub struct FakeAttrCtx {
    stack: Option<(usize, usize)>,
}

/// A scripted libc. `EXT` picks whether it has the getattr extension.
pub struct FakeAttr<const EXT: bool> {
    pub stack: (usize, usize),
    pub fail_init: Option<i32>,
    pub fail_fill: Option<i32>,
    pub fail_get_stack: Option<i32>,
    pub fail_destroy: Option<i32>,
    pub calls: RefCell<Vec<&'static str>>,
    pub live: Cell<isize>,
}

impl<const EXT: bool> FakeAttr<EXT> {
    pub fn with_stack(addr: usize, size: usize) -> Self {
        Self {
            stack: (addr, size),
            fail_init: None,
            fail_fill: None,
            fail_get_stack: None,
            fail_destroy: None,
            calls: RefCell::new(Vec::new()),
            live: Cell::new(0),
        }
    }
    
    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.borrow().clone()
    }
    
    /// initialized minus destroyed attribute objects
    pub fn live(&self) -> isize {
        self.live.get()
    }
}

impl<const EXT: bool> AttrApi for FakeAttr<EXT> {
    type Attr = FakeAttrCtx;
    
    const EXTENSION: Option<&'static str> = if EXT { Some("fake_getattr_np") } else { None };
    
    unsafe fn init(&self, attr: *mut Self::Attr) -> i32 {
        self.calls.borrow_mut().push("init");
        if let Some(rv) = self.fail_init { return rv }
        // SAFETY: guaranteed by caller
        unsafe { ptr::write(attr, FakeAttrCtx { stack: None }) };
        self.live.set(self.live.get() + 1);
        0
    }
    
    fn fill_current(&self, attr: &mut Self::Attr) -> i32 {
        self.calls.borrow_mut().push("fill_current");
        if let Some(rv) = self.fail_fill { return rv }
        attr.stack = Some(self.stack);
        0
    }
    
    fn get_stack(&self, attr: &Self::Attr) -> Result<(usize, usize), i32> {
        self.calls.borrow_mut().push("get_stack");
        if let Some(rv) = self.fail_get_stack { return Err(rv) }
        Ok(attr.stack.expect("get_stack before fill_current"))
    }
    
    fn destroy(&self, _attr: &mut Self::Attr) -> i32 {
        self.calls.borrow_mut().push("destroy");
        self.live.set(self.live.get() - 1);
        self.fail_destroy.unwrap_or(0)
    }
}


/// Reports a 64KiB window around the caller's frame and counts how often it was asked.
#[derive(Default)]
pub struct CountingQuery(pub AtomicUsize);

impl StackQuery for CountingQuery {
    fn acquire(&self) -> Result<Option<StackBounds>, AttrFailure> {
        self.0.fetch_add(1, Ordering::Relaxed);
        let sp = stack_pointer();
        Ok(Some(StackBounds { low: sp - 0x8000, high: sp + 0x8000 }))
    }
}
