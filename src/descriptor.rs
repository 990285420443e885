use std::cell::RefCell;
use std::sync::atomic::{fence, AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use thread_local::ThreadLocal;

use crate::annotate::{NativeAnnotations, RaceAnnotations};
use crate::bounds::StackBounds;
use crate::fatal::{AbortOnFatal, FatalHandler};
use crate::platform::{NativeQuery, StackQuery};
use crate::probe::StackBoundProbe;
use crate::slot::StackBoundsSlot;

/// Never reused, unlike `ThreadId`s handed out by `thread_local`. 0 means "nobody".
static NEXT_TOKEN: AtomicU64 = AtomicU64::new(1);

/// Lives as long as the OS thread. Vacates every descriptor the thread still owns when it goes.
struct ThreadExit {
    token: u64,
    owned: RefCell<Vec<Weak<ThreadDescriptor>>>,
}

impl ThreadExit {
    fn remember(&self, descriptor: &Arc<ThreadDescriptor>) {
        let mut owned = self.owned.borrow_mut();
        owned.retain(|w| w.strong_count() > 0);
        if !owned.iter().any(|w| w.as_ptr() == Arc::as_ptr(descriptor)) {
            owned.push(Arc::downgrade(descriptor));
        }
    }
}

impl Drop for ThreadExit {
    fn drop(&mut self) {
        for descriptor in self.owned.get_mut().drain(..).filter_map(|w| w.upgrade()) {
            descriptor.vacate(self.token);
        }
    }
}

thread_local! {
    static THREAD_EXIT: ThreadExit = ThreadExit {
        token: NEXT_TOKEN.fetch_add(1, Ordering::Relaxed),
        owned: RefCell::new(Vec::new()),
    };
}

/// `None` once the thread is tearing down its thread locals.
fn current_token() -> Option<u64> {
    THREAD_EXIT.try_with(|exit| exit.token).ok()
}


/// Per-thread state kept for a thread that called in from outside the runtime.
///
/// `owner` works like a seqlock around `stack`: it's zeroed before the slot is
/// rewritten and set to the owning thread's token (Release) only once the
/// bounds are published.
#[derive(Debug, Default)]
pub struct ThreadDescriptor {
    stack: StackBoundsSlot,
    owner: AtomicU64,
}

impl ThreadDescriptor {
    pub fn stack(&self) -> &StackBoundsSlot {
        &self.stack
    }
    
    pub fn is_probed(&self) -> bool {
        self.owner.load(Ordering::Acquire) != 0
    }
    
    /// The published bounds, if a live thread owns this descriptor and isn't midway through rewriting it.
    pub fn bounds(&self) -> Option<StackBounds> {
        let before = self.owner.load(Ordering::Acquire);
        if before == 0 { return None }
        let bounds = self.stack.load();
        fence(Ordering::Acquire);
        (self.owner.load(Ordering::Relaxed) == before).then_some(bounds)
    }
    
    fn owned_by(&self, token: u64) -> bool {
        // only the owning thread ever stores its own token
        self.owner.load(Ordering::Relaxed) == token
    }
    
    fn claim<Q: StackQuery, F: FatalHandler, A: RaceAnnotations>(&self, token: u64, probe: &StackBoundProbe<Q, F, A>) {
        self.owner.store(0, Ordering::Relaxed);
        fence(Ordering::Release);
        probe.probe(&self.stack);
        self.owner.store(token, Ordering::Release);
    }
    
    /// Only succeeds if `token` still owns it, a recycled descriptor already claimed by a new thread is left alone.
    fn vacate(&self, token: u64) -> bool {
        self.owner.compare_exchange(token, 0, Ordering::Release, Ordering::Relaxed).is_ok()
    }
}


/// Descriptors for every foreign thread currently inside the runtime.
///
/// The first [`enter`](Self::enter) on a thread probes its stack, later ones
/// just read back what was published. A descriptor is given up when its thread
/// exits or calls [`leave`](Self::leave); `thread_local` recycles the storage
/// for the next thread, which then probes afresh.
pub struct ForeignThreads<Q = NativeQuery, F = AbortOnFatal, A = NativeAnnotations> {
    probe: StackBoundProbe<Q, F, A>,
    descriptors: ThreadLocal<Arc<ThreadDescriptor>>,
}

impl ForeignThreads {
    pub fn new() -> Self {
        Self::with_probe(StackBoundProbe::native())
    }
}

impl Default for ForeignThreads {
    fn default() -> Self {
        Self::new()
    }
}

impl<Q: StackQuery, F: FatalHandler, A: RaceAnnotations> ForeignThreads<Q, F, A> {
    pub fn with_probe(probe: StackBoundProbe<Q, F, A>) -> Self {
        Self { probe, descriptors: ThreadLocal::new() }
    }
    
    pub fn enter(&self) -> StackBounds {
        let Some(token) = current_token() else {
            // thread locals are going away, nothing to hang a descriptor on
            return self.probe.current()
        };
        
        let descriptor = self.descriptors.get_or(Default::default);
        
        if !descriptor.owned_by(token) {
            descriptor.claim(token, &self.probe);
            let _ = THREAD_EXIT.try_with(|exit| exit.remember(descriptor));
            if descriptor.stack.load().is_unknown() {
                info!("thread {:?} entered, stack bounds unknown", std::thread::current().id());
            }
        }
        
        descriptor.stack.load()
    }
    
    /// Give up the calling thread's descriptor. The next `enter` probes again.
    pub fn leave(&self) {
        if let (Some(token), Some(descriptor)) = (current_token(), self.descriptors.get()) {
            descriptor.vacate(token);
        }
    }
    
    /// `None` if the calling thread hasn't entered (or has left).
    pub fn bounds(&self) -> Option<StackBounds> {
        let token = current_token()?;
        let descriptor = self.descriptors.get()?;
        descriptor.owned_by(token).then(|| descriptor.stack.load())
    }
    
    /// Bounds of every thread currently entered, in no particular order.
    pub fn snapshot(&self) -> Vec<StackBounds> {
        self.descriptors.iter()
            .filter_map(|d| d.bounds())
            .collect()
    }
}


#[cfg(test)]
mod tests {
    use std::sync::{mpsc, Barrier};
    use std::thread;
    
    use super::*;
    use crate::stack_pointer;
    use crate::NoAnnotations;
    use crate::fatal::AttrFailure;
    use crate::testing::{CountingQuery, PanicOnFatal};
    
    type Counted = ForeignThreads<CountingQuery, PanicOnFatal, NoAnnotations>;
    
    fn counted() -> &'static Counted {
        Box::leak(Box::new(ForeignThreads::with_probe(
            StackBoundProbe::new(CountingQuery::default(), PanicOnFatal, NoAnnotations)
        )))
    }
    
    impl<F: FatalHandler, A: RaceAnnotations> ForeignThreads<CountingQuery, F, A> {
        fn probe_count(&self) -> usize {
            self.probe.query().0.load(Ordering::Relaxed)
        }
    }
    
    #[test]
    fn probes_once_per_thread() {
        const T: usize = 8;
        const R: usize = 100;
        
        let threads = counted();
        let ready: &'static Barrier = Box::leak(Box::new(Barrier::new(T + 1)));
        let done: &'static Barrier = Box::leak(Box::new(Barrier::new(T + 1)));
        
        let handles = (0..T).map(|_|
            thread::spawn(move || {
                let before = threads.bounds();
                let first = threads.enter();
                let again = (0..R).all(|_| threads.enter() == first);
                let after = threads.bounds();
                let sp = stack_pointer();
                
                // everyone stays alive until the snapshot is taken
                ready.wait();
                done.wait();
                
                assert_eq!(before, None);
                assert!(again);
                assert_eq!(after, Some(first));
                assert!(first.contains(sp), "{first:?} doesn't contain {sp:#x}");
                first
            })
        ).collect::<Vec<_>>();
        
        ready.wait();
        let mut snapshot = threads.snapshot();
        done.wait();
        
        let mut entered = handles.into_iter().map(|h| h.join().unwrap()).collect::<Vec<_>>();
        
        assert_eq!(threads.probe_count(), T);
        
        entered.sort_by_key(|b| b.low);
        snapshot.sort_by_key(|b| b.low);
        assert_eq!(snapshot, entered);
        
        // every thread has exited
        assert!(threads.snapshot().is_empty());
    }
    
    #[test]
    fn recycled_descriptor_is_probed_again() {
        let threads = counted();
        
        thread::Builder::new()
            .stack_size(256 << 10)
            .spawn(move || { threads.enter(); })
            .unwrap()
            .join()
            .unwrap();
        
        assert!(threads.snapshot().is_empty());
        
        let (b, sp) = thread::Builder::new()
            .stack_size(4 << 20)
            .spawn(move || (threads.enter(), stack_pointer()))
            .unwrap()
            .join()
            .unwrap();
        
        assert!(b.contains(sp), "{b:?} doesn't contain {sp:#x}");
        assert_eq!(threads.probe_count(), 2);
    }
    
    #[cfg(any(all(target_os = "linux", target_env = "gnu"), target_os = "android", target_vendor = "apple", windows))]
    #[test]
    fn recycled_descriptor_native() {
        let threads: &'static ForeignThreads = Box::leak(Box::new(ForeignThreads::new()));
        
        thread::Builder::new()
            .stack_size(256 << 10)
            .spawn(move || { threads.enter(); })
            .unwrap()
            .join()
            .unwrap();
        
        let (b, sp) = thread::Builder::new()
            .stack_size(4 << 20)
            .spawn(move || (threads.enter(), stack_pointer()))
            .unwrap()
            .join()
            .unwrap();
        
        assert!(b.contains(sp), "{b:?} doesn't contain {sp:#x}");
    }
    
    #[test]
    fn leave_then_enter_probes_again() {
        let threads = counted();
        
        thread::spawn(move || {
            let first = threads.enter();
            threads.leave();
            assert_eq!(threads.bounds(), None);
            assert!(threads.snapshot().is_empty());
            
            assert_eq!(threads.enter().size(), first.size());
            assert!(threads.bounds().is_some());
        }).join().unwrap();
        
        assert_eq!(threads.probe_count(), 2);
    }
    
    /// Parks inside `acquire` until let go.
    struct GatedQuery {
        reached: Barrier,
        resume: Barrier,
    }
    
    impl StackQuery for GatedQuery {
        fn acquire(&self) -> Result<Option<StackBounds>, AttrFailure> {
            self.reached.wait();
            self.resume.wait();
            let sp = stack_pointer();
            Ok(Some(StackBounds { low: sp - 0x8000, high: sp + 0x8000 }))
        }
    }
    
    #[test]
    fn snapshot_skips_unfinished_probe() {
        let threads = Box::leak(Box::new(ForeignThreads::with_probe(StackBoundProbe::new(
            GatedQuery { reached: Barrier::new(2), resume: Barrier::new(2) },
            PanicOnFatal,
            NoAnnotations,
        ))));
        let threads: &'static ForeignThreads<GatedQuery, PanicOnFatal, NoAnnotations> = threads;
        let hold: &'static Barrier = Box::leak(Box::new(Barrier::new(2)));
        let (tx, rx) = mpsc::channel();
        
        let handle = thread::spawn(move || {
            let b = threads.enter();
            tx.send(b).unwrap();
            hold.wait();
        });
        
        threads.probe.query().reached.wait();
        let during = threads.snapshot();
        threads.probe.query().resume.wait();
        
        let b = rx.recv().unwrap();
        let after = threads.snapshot();
        hold.wait();
        handle.join().unwrap();
        
        // nothing at all rather than (0, 0) for a thread whose bounds are on the way
        assert!(during.is_empty(), "{during:?}");
        assert_eq!(after, vec![b]);
        assert!(!b.is_unknown());
    }
    
    #[test]
    fn native_enter() {
        let threads = ForeignThreads::new();
        assert_eq!(threads.bounds(), None);
        let b = threads.enter();
        assert_eq!(threads.bounds(), Some(b));
        assert_eq!(threads.snapshot(), vec![b]);
        threads.leave();
        assert_eq!(threads.bounds(), None);
    }
}
