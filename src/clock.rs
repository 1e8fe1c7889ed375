use chrono::{DateTime, FixedOffset, Utc};

/// Source of "now" in the ledger's civil timezone.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<FixedOffset>;
}

#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    offset: FixedOffset,
}

impl SystemClock {
    pub fn new(offset: FixedOffset) -> Self {
        Self { offset }
    }
}

impl Clock for SystemClock {
    fn now(&self) -> DateTime<FixedOffset> {
        Utc::now().with_timezone(&self.offset)
    }
}

/// Clock pinned to a single instant.
#[cfg(test)]
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<FixedOffset>);

#[cfg(test)]
impl Clock for FixedClock {
    fn now(&self) -> DateTime<FixedOffset> {
        self.0
    }
}

#[cfg(test)]
pub fn ist() -> FixedOffset {
    FixedOffset::east_opt(330 * 60).unwrap()
}

/// Builds an IST timestamp for tests.
#[cfg(test)]
pub fn ist_at(y: i32, m: u32, d: u32, hh: u32, mm: u32, ss: u32) -> DateTime<FixedOffset> {
    use chrono::TimeZone;
    ist().with_ymd_and_hms(y, m, d, hh, mm, ss).unwrap()
}
