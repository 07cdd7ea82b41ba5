/// Free-running microsecond counter.
pub trait Monotonic {
    fn now_us(&self) -> u64;
}

impl<T: Monotonic + ?Sized> Monotonic for &T {
    fn now_us(&self) -> u64 {
        (**self).now_us()
    }
}

#[cfg(feature = "rp2040")]
impl Monotonic for rp_pico::hal::Timer {
    fn now_us(&self) -> u64 {
        self.get_counter().ticks()
    }
}

/// Measures how long a pipeline stage took.
pub struct Stopwatch {
    start_us: u64,
}

impl Stopwatch {
    pub fn start<T: Monotonic>(clock: &T) -> Stopwatch {
        Stopwatch {
            start_us: clock.now_us(),
        }
    }

    /// Whole milliseconds since `start`
    pub fn elapsed_ms<T: Monotonic>(&self, clock: &T) -> u64 {
        clock.now_us().saturating_sub(self.start_us) / 1000
    }
}
