use std::fmt::Debug;
use std::fmt::Error;
use std::fmt::Formatter;
use std::time::Duration;
use std::time::Instant;

#[derive(Clone, Copy, Debug)]
pub struct GtTimer {
    instant: Instant,
}

#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct GtDuration {
    duration: Duration,
}

impl GtTimer {
    pub fn now() -> Self {
        Self { instant: Instant::now() }
    }

    pub fn elapsed(&self) -> GtDuration {
        GtDuration { duration: self.instant.elapsed() }
    }
}

impl GtDuration {
    pub fn to_millis_string(&self) -> String {
        const MICRO_PER_MILLI: u128 = 1_000;
        format!(
            "{}.{:03} ms",
            self.duration.as_micros() / MICRO_PER_MILLI,
            self.duration.as_micros() % MICRO_PER_MILLI
        )
    }

    pub fn to_seconds_string(&self) -> String {
        format!("{}.{:06} s", self.duration.as_secs(), self.duration.subsec_micros())
    }
}

impl Debug for GtDuration {
    fn fmt(&self, f: &mut Formatter) -> Result<(), Error> {
        write!(f, "{:?}", self.duration)
    }
}
