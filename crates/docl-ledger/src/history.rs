use tracing::warn;

use crate::error::LedgerResult;
use crate::records::KeyModification;

/// Forward-only iterator over the revisions of one key, oldest first.
///
/// Iterators may hold ledger resources and must be closed exactly once.
/// Once closed, `next` returns `None`.
pub trait HistoryIterator: Iterator<Item = LedgerResult<KeyModification>> + Send {
    fn close(&mut self) -> LedgerResult<()>;

    fn is_closed(&self) -> bool;
}

/// History iterator over a consistent snapshot taken when it was opened.
pub struct SnapshotHistory {
    entries: std::vec::IntoIter<KeyModification>,
    closed: bool,
}

impl SnapshotHistory {
    pub fn new(entries: Vec<KeyModification>) -> Self {
        Self {
            entries: entries.into_iter(),
            closed: false,
        }
    }
}

impl Iterator for SnapshotHistory {
    type Item = LedgerResult<KeyModification>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.closed {
            return None;
        }
        self.entries.next().map(Ok)
    }
}

impl HistoryIterator for SnapshotHistory {
    fn close(&mut self) -> LedgerResult<()> {
        self.closed = true;
        self.entries = Vec::new().into_iter();
        Ok(())
    }

    fn is_closed(&self) -> bool {
        self.closed
    }
}

/// Scoped ownership of a [`HistoryIterator`].
///
/// Call [`HistoryGuard::close`] on the success path to observe close
/// errors. If the guard is dropped first (early return, `?`, panic) the
/// iterator is closed on drop and any close error is logged.
pub struct HistoryGuard {
    inner: Option<Box<dyn HistoryIterator>>,
    key: String,
}

impl HistoryGuard {
    pub fn new(key: impl Into<String>, iter: Box<dyn HistoryIterator>) -> Self {
        Self {
            inner: Some(iter),
            key: key.into(),
        }
    }

    /// Close the underlying iterator and release the guard.
    pub fn close(mut self) -> LedgerResult<()> {
        match self.inner.take() {
            Some(mut iter) if !iter.is_closed() => iter.close(),
            _ => Ok(()),
        }
    }
}

impl Iterator for HistoryGuard {
    type Item = LedgerResult<KeyModification>;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.as_mut()?.next()
    }
}

impl Drop for HistoryGuard {
    fn drop(&mut self) {
        if let Some(mut iter) = self.inner.take() {
            if iter.is_closed() {
                return;
            }
            if let Err(e) = iter.close() {
                warn!(key = %self.key, error = %e, "failed to close history iterator on drop");
            }
        }
    }
}
