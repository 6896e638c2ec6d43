//! Simulated response latency
//!
//! The generator suspends through a `Latency` strategy so tests never wait
//! on the wall clock.

use async_trait::async_trait;
use rand::Rng;
use std::time::Duration;

/// Strategy deciding how long a generation pretends to take
#[async_trait]
pub trait Latency: Send + Sync {
    /// Duration of the next simulated call
    fn next_delay(&self) -> Duration;

    async fn wait(&self) {
        let delay = self.next_delay();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }
}

#[async_trait]
impl<L: Latency + ?Sized> Latency for Box<L> {
    fn next_delay(&self) -> Duration {
        (**self).next_delay()
    }
}

/// Uniformly random delay within an inclusive range
#[derive(Debug, Clone, Copy)]
pub struct RandomLatency {
    min: Duration,
    max: Duration,
}

impl RandomLatency {
    pub const DEFAULT_MIN: Duration = Duration::from_millis(1000);
    pub const DEFAULT_MAX: Duration = Duration::from_millis(3000);

    /// Bounds given in the wrong order are swapped
    pub fn new(min: Duration, max: Duration) -> Self {
        if min <= max {
            Self { min, max }
        } else {
            Self { min: max, max: min }
        }
    }

    pub fn min(&self) -> Duration {
        self.min
    }

    pub fn max(&self) -> Duration {
        self.max
    }
}

impl Default for RandomLatency {
    fn default() -> Self {
        Self::new(Self::DEFAULT_MIN, Self::DEFAULT_MAX)
    }
}

#[async_trait]
impl Latency for RandomLatency {
    fn next_delay(&self) -> Duration {
        if self.min == self.max {
            return self.min;
        }
        rand::thread_rng().gen_range(self.min..=self.max)
    }
}

/// Constant delay
#[derive(Debug, Clone, Copy)]
pub struct FixedLatency(pub Duration);

#[async_trait]
impl Latency for FixedLatency {
    fn next_delay(&self) -> Duration {
        self.0
    }
}

/// Returns immediately
#[derive(Debug, Clone, Copy, Default)]
pub struct NoLatency;

#[async_trait]
impl Latency for NoLatency {
    fn next_delay(&self) -> Duration {
        Duration::ZERO
    }
}
