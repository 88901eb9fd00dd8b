use rand::rngs::StdRng;
use rand::seq::index;
use rand::SeedableRng;

/// A board position encoded as oracle features, labelled with the final
/// outcome of the game it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct LabeledPosition {
    pub features: Vec<f32>,
    pub target: f32,
}

/// Fixed-capacity ring buffer of labelled positions from past games.
pub struct ReplayBuffer {
    buffer: Vec<LabeledPosition>,
    capacity: usize,
    position: usize,
    rng: StdRng,
}

impl ReplayBuffer {
    pub fn new(capacity: usize) -> Self {
        Self::with_rng(capacity, StdRng::from_os_rng())
    }

    pub fn with_seed(capacity: usize, seed: u64) -> Self {
        Self::with_rng(capacity, StdRng::seed_from_u64(seed))
    }

    fn with_rng(capacity: usize, rng: StdRng) -> Self {
        assert!(capacity > 0, "replay buffer capacity must be > 0");
        ReplayBuffer {
            buffer: Vec::with_capacity(capacity),
            capacity,
            position: 0,
            rng,
        }
    }

    /// Add a position. Overwrites the oldest when full.
    pub fn push(&mut self, sample: LabeledPosition) {
        if self.buffer.len() < self.capacity {
            self.buffer.push(sample);
        } else {
            self.buffer[self.position] = sample;
        }
        self.position = (self.position + 1) % self.capacity;
    }

    /// Sample a random batch without replacement.
    pub fn sample(&mut self, batch_size: usize) -> Vec<LabeledPosition> {
        assert!(batch_size <= self.buffer.len(), "Not enough positions to sample");
        let indices = index::sample(&mut self.rng, self.buffer.len(), batch_size);
        indices.iter().map(|i| self.buffer[i].clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn position(target: f32) -> LabeledPosition {
        LabeledPosition {
            features: vec![0.5; 9],
            target,
        }
    }

    #[test]
    fn test_push_and_len() {
        let mut buf = ReplayBuffer::new(10);
        assert!(buf.is_empty());

        buf.push(position(1.0));
        assert_eq!(buf.len(), 1);

        for _ in 0..9 {
            buf.push(position(0.0));
        }
        assert_eq!(buf.len(), 10);
    }

    #[test]
    fn test_ring_buffer_overwrites_oldest() {
        let mut buf = ReplayBuffer::with_seed(3, 1);
        for t in [0.0, 0.0, 0.0, 1.0, 1.0, 1.0] {
            buf.push(position(t));
        }
        assert_eq!(buf.len(), 3);
        let batch = buf.sample(3);
        assert!(batch.iter().all(|p| p.target == 1.0));
    }

    #[test]
    fn test_sample() {
        let mut buf = ReplayBuffer::with_seed(100, 42);
        for _ in 0..50 {
            buf.push(position(0.5));
        }
        assert_eq!(buf.sample(10).len(), 10);
    }

    #[test]
    #[should_panic(expected = "Not enough positions")]
    fn test_sample_too_many() {
        let mut buf = ReplayBuffer::new(10);
        buf.push(position(0.5));
        buf.sample(5);
    }
}
