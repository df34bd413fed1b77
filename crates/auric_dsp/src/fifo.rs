//! Lock-Free Single-Producer / Single-Consumer Block FIFO
//!
//! Fixed-capacity ring of pre-sized sample blocks carrying audio from the
//! real-time thread to the visualization thread. Implemented directly as
//! an index-based circular buffer with acquire/release ordering on the
//! head/tail counters.
//!
//! # Real-time Safety
//!
//! `push` never blocks and never allocates: slots are cloned from a
//! template up front, and a push into a full queue drops the incoming
//! block and reports `false`. Back-pressure is absorbed by data loss,
//! never by stalling the audio callback.
//!
//! # Correctness
//!
//! There are no locks; correctness relies on the SPSC invariant, which the
//! split producer/consumer handles uphold by construction: each handle is
//! individually owned, not clonable, and only ever touches the slots its
//! side of the head/tail protocol reserves for it.

use std::cell::UnsafeCell;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Number of slots in each queue
pub const FIFO_CAPACITY: usize = 30;

struct FifoShared<T> {
    slots: Vec<UnsafeCell<T>>,
    /// Next slot index the consumer will read; slot = head % capacity
    head: AtomicUsize,
    /// Next slot index the producer will write
    tail: AtomicUsize,
}

// The head/tail protocol guarantees a slot is referenced by at most one
// side at a time.
unsafe impl<T: Send> Send for FifoShared<T> {}
unsafe impl<T: Send> Sync for FifoShared<T> {}

/// Write half of a FIFO; owned by exactly one thread
pub struct FifoProducer<T> {
    shared: Arc<FifoShared<T>>,
}

/// Read half of a FIFO; owned by exactly one thread
pub struct FifoConsumer<T> {
    shared: Arc<FifoShared<T>>,
}

/// Create a FIFO of [`FIFO_CAPACITY`] slots, each cloned from `template`
/// so that pushes never have to allocate.
pub fn fifo<T: Clone>(template: &T) -> (FifoProducer<T>, FifoConsumer<T>) {
    fifo_with_capacity(FIFO_CAPACITY, template)
}

pub fn fifo_with_capacity<T: Clone>(
    capacity: usize,
    template: &T,
) -> (FifoProducer<T>, FifoConsumer<T>) {
    assert!(capacity > 0, "fifo capacity must be non-zero");
    let shared = Arc::new(FifoShared {
        slots: (0..capacity)
            .map(|_| UnsafeCell::new(template.clone()))
            .collect(),
        head: AtomicUsize::new(0),
        tail: AtomicUsize::new(0),
    });
    (
        FifoProducer {
            shared: Arc::clone(&shared),
        },
        FifoConsumer { shared },
    )
}

impl<T: Clone> FifoProducer<T> {
    /// Copy `value` into the next free slot.
    ///
    /// Returns `false` (dropping the value) when the queue is full.
    pub fn push(&mut self, value: &T) -> bool {
        let tail = self.shared.tail.load(Ordering::Relaxed);
        let head = self.shared.head.load(Ordering::Acquire);
        let capacity = self.shared.slots.len();
        if tail.wrapping_sub(head) >= capacity {
            return false;
        }

        // SPSC: this slot lies outside head..tail, so only the producer can
        // be touching it right now
        unsafe {
            (*self.shared.slots[tail % capacity].get()).clone_from(value);
        }
        self.shared.tail.store(tail.wrapping_add(1), Ordering::Release);
        true
    }

    /// Number of blocks the consumer has not yet pulled
    pub fn pending(&self) -> usize {
        self.shared
            .tail
            .load(Ordering::Relaxed)
            .wrapping_sub(self.shared.head.load(Ordering::Acquire))
    }

    pub fn capacity(&self) -> usize {
        self.shared.slots.len()
    }
}

impl<T: Clone> FifoConsumer<T> {
    /// Copy the oldest pending block into `out`.
    ///
    /// Returns `false` without blocking when the queue is empty. Ownership
    /// of the data transfers by copy, so the producer can never alias a
    /// block the consumer is reading.
    pub fn pop(&mut self, out: &mut T) -> bool {
        let head = self.shared.head.load(Ordering::Relaxed);
        let tail = self.shared.tail.load(Ordering::Acquire);
        if head == tail {
            return false;
        }

        let capacity = self.shared.slots.len();
        // SPSC: the slot at head is published (head < tail) and the
        // producer will not reuse it until head advances
        unsafe {
            out.clone_from(&*self.shared.slots[head % capacity].get());
        }
        self.shared.head.store(head.wrapping_add(1), Ordering::Release);
        true
    }

    /// Number of complete blocks available for reading
    pub fn available(&self) -> usize {
        self.shared
            .tail
            .load(Ordering::Acquire)
            .wrapping_sub(self.shared.head.load(Ordering::Relaxed))
    }

    pub fn is_empty(&self) -> bool {
        self.available() == 0
    }
}

/// Per-channel accumulator feeding a block FIFO.
///
/// Collects samples one at a time; each time `block_size` samples have
/// accumulated, the completed block is enqueued (or silently dropped if
/// the queue is full) and accumulation restarts.
pub struct SingleChannelSampleFifo {
    producer: FifoProducer<Vec<f32>>,
    block: Vec<f32>,
    fill: usize,
}

impl SingleChannelSampleFifo {
    /// Create the accumulator and the consumer handle for the
    /// visualization side.
    pub fn new(block_size: usize) -> (Self, FifoConsumer<Vec<f32>>) {
        assert!(block_size > 0, "block size must be non-zero");
        let template = vec![0.0f32; block_size];
        let (producer, consumer) = fifo(&template);
        (
            Self {
                producer,
                block: template,
                fill: 0,
            },
            consumer,
        )
    }

    #[inline]
    pub fn push_sample(&mut self, sample: f32) {
        self.block[self.fill] = sample;
        self.fill += 1;
        if self.fill == self.block.len() {
            // Full queue: the block is dropped, the audio thread moves on
            self.producer.push(&self.block);
            self.fill = 0;
        }
    }

    #[inline]
    pub fn push_block(&mut self, samples: &[f32]) {
        for &sample in samples {
            self.push_sample(sample);
        }
    }

    pub fn block_size(&self) -> usize {
        self.block.len()
    }
}
