use crate::traits::EepromPosition;

/// Largest payload a single bus transaction may carry, not counting the two
/// address bytes.
pub const WIRE_BUFFER_LEN: usize = 32;

/// Probe limit used by [`ReadyPolicy::default`].
///
/// A write cycle takes about 5ms; at 400kHz a probe costs roughly 25µs, so
/// this leaves ample headroom while still catching a missing device.
pub const DEFAULT_MAX_PROBES: u32 = 1_000;

/// How long to keep polling a device that is still committing a write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub struct ReadyPolicy {
    /// Give up after this many unacknowledged probes. `None` polls forever.
    pub max_probes: Option<u32>,
    /// Pause between probes. Only honoured by the async driver; the blocking
    /// driver spins.
    pub poll_interval_us: u32,
}

impl ReadyPolicy {
    pub const fn bounded(max_probes: u32) -> Self {
        Self {
            max_probes: Some(max_probes),
            poll_interval_us: 0,
        }
    }

    /// Poll until the device answers, however long that takes.
    pub const fn unbounded() -> Self {
        Self {
            max_probes: None,
            poll_interval_us: 0,
        }
    }

    pub const fn with_poll_interval_us(mut self, poll_interval_us: u32) -> Self {
        self.poll_interval_us = poll_interval_us;
        self
    }

    /// Whether `probes` failed probes exhaust the policy.
    pub fn exhausted(&self, probes: u32) -> bool {
        matches!(self.max_probes, Some(max) if probes >= max)
    }
}

impl Default for ReadyPolicy {
    fn default() -> Self {
        Self::bounded(DEFAULT_MAX_PROBES).with_poll_interval_us(100)
    }
}

/// Immutable description of one EEPROM on the bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub struct EepromConfig {
    address: u8,
    page_size: u16,
    max_transfer: usize,
    ready_policy: ReadyPolicy,
}

impl EepromConfig {
    /// `address` is the 7-bit bus address (0x50 for an AT24 with its
    /// address pins low), not the 8-bit form with the R/W bit included; it is
    /// passed to the bus unchanged. `page_size` is the device's write page in
    /// bytes (a power of two, e.g. 32 for an AT24C32).
    ///
    /// A zero page size is treated as one byte per page.
    pub fn new(address: u8, page_size: u16) -> Self {
        Self {
            address,
            page_size: page_size.max(1),
            max_transfer: WIRE_BUFFER_LEN,
            ready_policy: ReadyPolicy::default(),
        }
    }

    pub fn with_ready_policy(mut self, ready_policy: ReadyPolicy) -> Self {
        self.ready_policy = ready_policy;
        self
    }

    /// Lowers the per-transaction payload limit for buses with smaller
    /// buffers. Clamped to `1..=WIRE_BUFFER_LEN`.
    pub fn with_max_transfer(mut self, max_transfer: usize) -> Self {
        self.max_transfer = max_transfer.clamp(1, WIRE_BUFFER_LEN);
        self
    }

    pub fn address(&self) -> u8 {
        self.address
    }

    pub fn page_size(&self) -> u16 {
        self.page_size
    }

    pub fn max_transfer(&self) -> usize {
        self.max_transfer
    }

    pub fn ready_policy(&self) -> &ReadyPolicy {
        &self.ready_policy
    }

    /// How many of `remaining` bytes starting at `position` fit in one
    /// transaction without crossing a page boundary.
    pub fn find_maximum_in_page(&self, position: EepromPosition, remaining: usize) -> usize {
        let page_size = usize::from(self.page_size);
        let offset = usize::from(position) % page_size;
        let chunk = page_size.min(offset + remaining) - offset;

        // the bus buffer caps a transaction regardless of page size
        chunk.min(self.max_transfer)
    }
}
