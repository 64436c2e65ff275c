//! Background garbage collection.
//!
//! Deleting a document only tombstones its metadata. The collector purges the
//! postings, numeric entries and tags of tombstoned documents and then
//! reclaims their metadata slots. It runs periodically on a named background
//! thread, or synchronously through
//! [`IndexSpec::collect_garbage`](crate::index::IndexSpec::collect_garbage).

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Weak};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{RecvTimeoutError, Sender, bounded};
use parking_lot::RwLock;
use serde::Serialize;
use tracing::{debug, trace, warn};

use crate::document::DocId;
use crate::error::Result;
use crate::index::IndexState;

const GC_RUNNING: u8 = 0;
const GC_FREED: u8 = 1;

/// What one collection cycle removed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct GcReport {
    /// (term, document) records removed from the term dictionary.
    pub records_removed: usize,
    pub numeric_removed: usize,
    pub tags_removed: usize,
    /// Tombstoned metadata slots reclaimed.
    pub docs_reclaimed: usize,
}

impl GcReport {
    pub fn is_empty(&self) -> bool {
        *self == GcReport::default()
    }
}

/// Run one collection cycle over `state`.
pub fn collect(state: &mut IndexState) -> GcReport {
    if state.docs.num_deleted() == 0 {
        return GcReport::default();
    }

    let deleted = state.docs.deleted_bitmap();
    let is_deleted = |id: DocId| deleted.get(id as usize).unwrap_or(false);

    let records_removed = state.terms.purge(is_deleted);
    let numeric_removed = state
        .numeric
        .values_mut()
        .map(|index| index.purge(is_deleted))
        .sum();
    let tags_removed = state
        .tags
        .values_mut()
        .map(|index| index.purge(is_deleted))
        .sum();
    let docs_reclaimed = state.docs.reclaim_deleted();
    state.refresh_term_stats();

    GcReport {
        records_removed,
        numeric_removed,
        tags_removed,
        docs_reclaimed,
    }
}

/// Handle to a periodic collector thread.
///
/// The thread holds only a weak reference to the index state. Marking the
/// handle freed makes the thread exit without touching the state again.
#[derive(Debug)]
pub struct GarbageCollector {
    lifecycle: Arc<AtomicU8>,
    stop_sender: Sender<()>,
    handle: Option<JoinHandle<()>>,
}

impl GarbageCollector {
    /// Start collecting `hz` times per second.
    pub fn start(name: &str, index: Weak<RwLock<IndexState>>, hz: u32) -> Result<Self> {
        let lifecycle = Arc::new(AtomicU8::new(GC_RUNNING));
        let (stop_sender, stop_receiver) = bounded::<()>(1);
        let interval = Duration::from_secs_f64(1.0 / hz.max(1) as f64);

        let thread_lifecycle = Arc::clone(&lifecycle);
        let index_name = name.to_string();
        let handle = thread::Builder::new()
            .name(format!("gc-{name}"))
            .spawn(move || {
                loop {
                    match stop_receiver.recv_timeout(interval) {
                        Err(RecvTimeoutError::Timeout) => {}
                        Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                    }
                    if thread_lifecycle.load(Ordering::Acquire) == GC_FREED {
                        break;
                    }
                    let Some(index) = index.upgrade() else {
                        break;
                    };
                    if index.read().docs.num_deleted() == 0 {
                        continue;
                    }

                    let mut state = index.write();
                    // the index may have been dropped while we waited for the lock
                    if thread_lifecycle.load(Ordering::Acquire) == GC_FREED {
                        break;
                    }
                    let report = collect(&mut state);
                    if !report.is_empty() {
                        debug!(index = %index_name, ?report, "garbage collection cycle");
                    }
                }
                trace!(index = %index_name, "garbage collector stopped");
            })?;

        debug!(index = name, hz, "started garbage collector");
        Ok(GarbageCollector {
            lifecycle,
            stop_sender,
            handle: Some(handle),
        })
    }

    /// Mark the collected index as freed; the thread exits at its next check.
    pub fn mark_freed(&self) {
        self.lifecycle.store(GC_FREED, Ordering::Release);
    }

    pub fn is_freed(&self) -> bool {
        self.lifecycle.load(Ordering::Acquire) == GC_FREED
    }

    /// Mark freed, wake the thread and wait for it to exit.
    pub fn stop(&mut self) {
        self.mark_freed();
        let _ = self.stop_sender.try_send(());
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!("garbage collector thread panicked");
            }
        }
    }
}

impl Drop for GarbageCollector {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::IndexOptions;
    use crate::document::{Document, DocumentFlags};
    use crate::index::indexer::analyze_document;
    use crate::schema::FieldTypes;

    fn state_with_docs() -> IndexState {
        let mut state = IndexState::new("idx", &IndexOptions::new());
        let id = state.schema.create_field("title").unwrap();
        let text_id = state.schema.create_text_id().unwrap();
        let field = state.schema.field_by_id_mut(id).unwrap();
        field.types = FieldTypes::FULLTEXT | FieldTypes::TAG;
        field.text_id = Some(text_id);

        for (key, text) in [("a", "red"), ("b", "red blue")] {
            let mut doc = Document::new(key, 1.0, None);
            doc.add_field_string("title", text, FieldTypes::empty());
            analyze_document(&state, &doc).unwrap().commit(&mut state);
        }
        state
    }

    #[test]
    fn test_collect_without_deletes() {
        let mut state = state_with_docs();
        assert!(collect(&mut state).is_empty());
    }

    #[test]
    fn test_collect_purges_deleted() {
        let mut state = state_with_docs();
        assert!(state.docs.delete(b"b"));

        let report = collect(&mut state);

        assert_eq!(report.records_removed, 2);
        assert_eq!(report.tags_removed, 1);
        assert_eq!(report.docs_reclaimed, 1);
        assert!(state.terms.postings("blue").is_none());
        assert_eq!(state.terms.postings("red").unwrap().doc_freq(), 1);
        assert_eq!(state.stats.num_terms, 1);
        assert_eq!(state.docs.get(2), None);
        assert!(!state.docs.get(1).unwrap().flags.contains(DocumentFlags::DELETED));
    }

    #[test]
    fn test_background_collector_stops() {
        let state = Arc::new(RwLock::new(state_with_docs()));
        let mut gc = GarbageCollector::start("idx", Arc::downgrade(&state), 100).unwrap();

        state.write().docs.delete(b"a");
        for _ in 0..200 {
            if state.read().docs.num_deleted() == 0 {
                break;
            }
            thread::sleep(Duration::from_millis(5));
        }
        assert_eq!(state.read().docs.num_deleted(), 0);

        gc.stop();
        assert!(gc.is_freed());
    }
}
