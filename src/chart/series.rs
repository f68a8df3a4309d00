//! Fixed-capacity sample window
//!
//! A [`Series`] holds the most recent `capacity` samples of one named sensor
//! stream, oldest first. Updates shift the window left by the batch size and
//! append the batch at the tail, so the buffer length never changes.

/// Default number of samples kept per series
pub const DEFAULT_CAPACITY: usize = 1000;

/// A named, fixed-length numeric window
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    name: String,
    buffer: Vec<f64>,
}

impl Series {
    /// Create a series of `capacity` zero samples
    pub fn new(name: impl Into<String>, capacity: usize) -> Self {
        Self {
            name: name.into(),
            buffer: vec![0.0; capacity],
        }
    }

    /// Create a series with the default capacity
    pub fn with_default_capacity(name: impl Into<String>) -> Self {
        Self::new(name, DEFAULT_CAPACITY)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Samples, oldest first
    pub fn values(&self) -> &[f64] {
        &self.buffer
    }

    pub fn capacity(&self) -> usize {
        self.buffer.len()
    }

    /// Most recent sample
    pub fn latest(&self) -> Option<f64> {
        self.buffer.last().copied()
    }

    /// Apply a batch of new samples.
    ///
    /// The oldest `batch.len()` samples are discarded, the rest move to the
    /// front, and the batch fills the tail in arrival order. A batch longer
    /// than the capacity keeps only its newest `capacity` samples.
    ///
    /// Returns the number of samples written.
    pub fn push_batch(&mut self, batch: &[f64]) -> usize {
        let capacity = self.buffer.len();
        let batch = if batch.len() > capacity {
            &batch[batch.len() - capacity..]
        } else {
            batch
        };

        let k = batch.len();
        if k == 0 {
            return 0;
        }

        self.buffer.copy_within(k.., 0);
        self.buffer[capacity - k..].copy_from_slice(batch);
        k
    }

    /// Reset every sample to zero
    pub fn clear(&mut self) {
        self.buffer.fill(0.0);
    }
}
