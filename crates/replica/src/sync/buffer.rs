use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::Mutex;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample<V> {
    pub sequence: u32,
    pub timestamp_ms: i64,
    pub value: V,
}

impl<V> Sample<V> {
    pub fn new(sequence: u32, timestamp_ms: i64, value: V) -> Self {
        Self {
            sequence,
            timestamp_ms,
            value,
        }
    }
}

/// Bounded history of one channel, oldest first. Overflow evicts the oldest sample.
#[derive(Debug, Clone)]
pub struct ChannelBuffer<V> {
    samples: VecDeque<Sample<V>>,
    capacity: usize,
}

impl<V> ChannelBuffer<V> {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            samples: VecDeque::with_capacity(capacity + 1),
            capacity,
        }
    }

    /// Appends in arrival order and returns the evicted sample, if any.
    pub fn push(&mut self, sample: Sample<V>) -> Option<Sample<V>> {
        self.samples.push_back(sample);
        if self.samples.len() > self.capacity {
            self.samples.pop_front()
        } else {
            None
        }
    }

    pub fn get(&self, index: usize) -> Option<&Sample<V>> {
        self.samples.get(index)
    }

    pub fn newest(&self) -> Option<&Sample<V>> {
        self.samples.back()
    }

    pub fn oldest(&self) -> Option<&Sample<V>> {
        self.samples.front()
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &Sample<V>> + ExactSizeIterator {
        self.samples.iter()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }
}

/// Handle for a buffer written by the receive path and read by the render path.
#[derive(Debug)]
pub struct SharedChannelBuffer<V> {
    inner: Arc<Mutex<ChannelBuffer<V>>>,
}

impl<V> Clone for SharedChannelBuffer<V> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<V> SharedChannelBuffer<V> {
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Arc::new(Mutex::new(ChannelBuffer::new(capacity))),
        }
    }

    pub fn push(&self, sample: Sample<V>) -> Option<Sample<V>> {
        self.inner.lock().push(sample)
    }

    /// Runs `f` against the buffer while holding the lock.
    pub fn read<R>(&self, f: impl FnOnce(&ChannelBuffer<V>) -> R) -> R {
        let guard = self.inner.lock();
        f(&*guard)
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }

    pub fn clear(&self) {
        self.inner.lock().clear();
    }
}

impl<V: Clone> SharedChannelBuffer<V> {
    pub fn snapshot(&self) -> ChannelBuffer<V> {
        self.inner.lock().clone()
    }
}
