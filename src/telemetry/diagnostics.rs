//! Process-scoped publish/subscribe registry of named diagnostic sources.
//!
//! The registry is constructed once at startup and handed to whoever needs
//! it; there is no ambient singleton. Sources publish named events carrying
//! an untyped payload, so publishers and observers stay decoupled from each
//! other's concrete types.

use std::any::Any;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Untyped event payload. Observers that care about a payload downcast it to
/// the shapes they know; everything else ignores it.
pub type Payload = dyn Any + Send + Sync;

/// Receives events published on a diagnostic source.
pub trait EventObserver: Send + Sync {
    fn on_event(&self, name: &str, payload: &Payload);
}

/// Notified for every source in the registry, existing and future.
pub trait SourceObserver: Send + Sync {
    fn on_source(&self, source: &Arc<DiagnosticSource>);
}

type EventFilter = Box<dyn Fn(&str) -> bool + Send + Sync>;

/// Detaches an observer when closed or dropped. Closing twice is a no-op.
pub struct Subscription {
    closed: AtomicBool,
    detach: Box<dyn Fn() + Send + Sync>,
}

impl Subscription {
    fn new(detach: impl Fn() + Send + Sync + 'static) -> Self {
        Self {
            closed: AtomicBool::new(false),
            detach: Box::new(detach),
        }
    }

    pub fn close(&self) {
        if !self.closed.swap(true, Ordering::SeqCst) {
            (self.detach)();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.close();
    }
}

struct EventSubscription {
    id: u64,
    filter: Option<EventFilter>,
    observer: Arc<dyn EventObserver>,
}

/// A named stream of diagnostic events.
pub struct DiagnosticSource {
    name: String,
    next_id: AtomicU64,
    subscriptions: RwLock<Vec<EventSubscription>>,
}

impl DiagnosticSource {
    fn new(name: &str) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            next_id: AtomicU64::new(0),
            subscriptions: RwLock::new(Vec::new()),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Attach an observer, optionally filtered by event name. The observer
    /// stays attached until the returned subscription is closed or dropped.
    pub fn subscribe(
        self: &Arc<Self>,
        filter: Option<EventFilter>,
        observer: Arc<dyn EventObserver>,
    ) -> Subscription {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        write_lock(&self.subscriptions).push(EventSubscription {
            id,
            filter,
            observer,
        });

        let source = Arc::downgrade(self);
        Subscription::new(move || {
            if let Some(source) = source.upgrade() {
                write_lock(&source.subscriptions).retain(|s| s.id != id);
            }
        })
    }

    /// Publish an event to every subscriber whose filter accepts its name.
    /// Delivery happens outside the subscription lock, so an observer may
    /// subscribe or unsubscribe from within its own callback.
    pub fn emit(&self, name: &str, payload: &Payload) {
        let accepted: Vec<Arc<dyn EventObserver>> = read_lock(&self.subscriptions)
            .iter()
            .filter(|s| s.filter.as_ref().map_or(true, |f| f(name)))
            .map(|s| Arc::clone(&s.observer))
            .collect();

        for observer in accepted {
            observer.on_event(name, payload);
        }
    }

    /// Whether anyone is listening; publishers can use this to skip building
    /// payloads nobody will see.
    pub fn is_enabled(&self) -> bool {
        !read_lock(&self.subscriptions).is_empty()
    }
}

struct RegistryInner {
    sources: Vec<Arc<DiagnosticSource>>,
    observers: Vec<(u64, Arc<dyn SourceObserver>)>,
}

/// The registry of diagnostic sources for one process.
pub struct DiagnosticRegistry {
    inner: RwLock<RegistryInner>,
    next_id: AtomicU64,
}

impl DiagnosticRegistry {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            inner: RwLock::new(RegistryInner {
                sources: Vec::new(),
                observers: Vec::new(),
            }),
            next_id: AtomicU64::new(0),
        })
    }

    /// Look up the source with the given name, creating it on first use.
    /// Source observers are told about a newly created source after the
    /// registry lock is released.
    pub fn source(&self, name: &str) -> Arc<DiagnosticSource> {
        let (source, observers) = {
            let mut inner = write_lock(&self.inner);
            if let Some(existing) = inner.sources.iter().find(|s| s.name() == name) {
                return Arc::clone(existing);
            }
            let source = DiagnosticSource::new(name);
            inner.sources.push(Arc::clone(&source));
            let observers: Vec<_> = inner
                .observers
                .iter()
                .map(|(_, o)| Arc::clone(o))
                .collect();
            (source, observers)
        };

        for observer in observers {
            observer.on_source(&source);
        }
        source
    }

    /// Attach an observer that is notified of every source, replaying the
    /// sources that already exist.
    pub fn observe_sources(self: &Arc<Self>, observer: Arc<dyn SourceObserver>) -> Subscription {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let existing = {
            let mut inner = write_lock(&self.inner);
            inner.observers.push((id, Arc::clone(&observer)));
            inner.sources.clone()
        };

        for source in &existing {
            observer.on_source(source);
        }

        let registry = Arc::downgrade(self);
        Subscription::new(move || {
            if let Some(registry) = registry.upgrade() {
                write_lock(&registry.inner).observers.retain(|(i, _)| *i != id);
            }
        })
    }
}

// Lock poisoning only happens if an observer panicked mid-delivery; the
// subscription lists stay structurally valid, so recover the guard.
fn read_lock<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(|e| e.into_inner())
}

fn write_lock<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(|e| e.into_inner())
}
