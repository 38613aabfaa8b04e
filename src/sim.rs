//! Simulated AT24 EEPROM for unit tests.
//!
//! Models the address pointer, page wrap-around on writes, the busy window
//! after a committed write (the device NACKs everything until it has
//! refused `write_cycle_probes` transactions) and keeps a log of every
//! transaction it saw.
use core::future::Future;
use core::pin::pin;
use core::task::{Context, Poll, Waker};

use std::collections::VecDeque;

use embedded_hal::i2c::{ErrorKind, ErrorType, NoAcknowledgeSource, Operation};

use crate::traits::{AsyncWire, Status, Wire};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transaction {
    Write { bytes: Vec<u8>, acked: bool },
    Read { len: usize, acked: bool },
}

#[derive(Debug)]
pub struct SimulatedAt24 {
    address: u8,
    page_size: usize,
    memory: Vec<u8>,
    pointer: usize,
    busy: u32,
    write_cycle_probes: u32,
    fail_reads: bool,
    nack_data_write: Option<usize>,
    log: Vec<Transaction>,
}

impl SimulatedAt24 {
    pub fn new(address: u8, capacity: usize, page_size: usize) -> Self {
        Self {
            address,
            page_size,
            memory: vec![0xff; capacity],
            pointer: 0,
            busy: 0,
            write_cycle_probes: 0,
            fail_reads: false,
            nack_data_write: None,
            log: Vec::new(),
        }
    }

    /// 4KiB with 32 byte pages.
    pub fn at24c32(address: u8) -> Self {
        Self::new(address, 4096, 32)
    }

    /// Number of NACKed transactions after every committed write.
    pub fn with_write_cycle(mut self, probes: u32) -> Self {
        self.write_cycle_probes = probes;
        self
    }

    pub fn set_busy(&mut self, probes: u32) {
        self.busy = probes;
    }

    pub fn set_fail_reads(&mut self, fail: bool) {
        self.fail_reads = fail;
    }

    /// Accept `accepted` more data-carrying writes, then refuse the next
    /// one's data bytes. Fires once.
    pub fn nack_data_write_after(&mut self, accepted: usize) {
        self.nack_data_write = Some(accepted);
    }

    pub fn memory(&self) -> &[u8] {
        &self.memory
    }

    pub fn memory_mut(&mut self) -> &mut [u8] {
        &mut self.memory
    }

    pub fn log(&self) -> &[Transaction] {
        &self.log
    }

    pub fn clear_log(&mut self) {
        self.log.clear();
    }

    /// Zero-length writes, i.e. readiness probes.
    pub fn probes(&self) -> usize {
        self.log
            .iter()
            .filter(|t| matches!(t, Transaction::Write { bytes, .. } if bytes.is_empty()))
            .count()
    }

    /// Acknowledged writes that carried data past the two address bytes.
    pub fn data_writes(&self) -> Vec<Vec<u8>> {
        self.log
            .iter()
            .filter_map(|t| match t {
                Transaction::Write { bytes, acked: true } if bytes.len() > 2 => {
                    Some(bytes[2..].to_vec())
                }
                _ => None,
            })
            .collect()
    }

    /// Start positions of the acknowledged data writes.
    pub fn data_write_positions(&self) -> Vec<usize> {
        self.log
            .iter()
            .filter_map(|t| match t {
                Transaction::Write { bytes, acked: true } if bytes.len() > 2 => {
                    Some(usize::from(u16::from_be_bytes([bytes[0], bytes[1]])))
                }
                _ => None,
            })
            .collect()
    }

    /// Every write that carried data, acknowledged or not, as
    /// `(position, length, acked)`.
    pub fn attempted_data_writes(&self) -> Vec<(usize, usize, bool)> {
        self.log
            .iter()
            .filter_map(|t| match t {
                Transaction::Write { bytes, acked } if bytes.len() > 2 => Some((
                    usize::from(u16::from_be_bytes([bytes[0], bytes[1]])),
                    bytes.len() - 2,
                    *acked,
                )),
                _ => None,
            })
            .collect()
    }

    fn refuse(&mut self) -> bool {
        if self.busy > 0 {
            self.busy -= 1;
            return true;
        }
        false
    }

    fn refuse_data(&mut self) -> bool {
        match self.nack_data_write {
            Some(0) => {
                self.nack_data_write = None;
                true
            }
            Some(n) => {
                self.nack_data_write = Some(n - 1);
                false
            }
            None => false,
        }
    }

    fn handle_write(&mut self, bytes: &[u8]) -> Result<(), ErrorKind> {
        let refused = self.refuse();
        let data_refused = !refused && bytes.len() > 2 && self.refuse_data();
        self.log.push(Transaction::Write {
            bytes: bytes.to_vec(),
            acked: !refused && !data_refused,
        });
        if refused {
            return Err(ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address));
        }
        if data_refused {
            return Err(ErrorKind::NoAcknowledge(NoAcknowledgeSource::Data));
        }
        if bytes.len() >= 2 {
            let position = usize::from(u16::from_be_bytes([bytes[0], bytes[1]]));
            self.pointer = position % self.memory.len();
        }
        if bytes.len() > 2 {
            // writes wrap inside the current page like the real part
            let page_start = self.pointer - self.pointer % self.page_size;
            let mut offset = self.pointer % self.page_size;
            for &byte in &bytes[2..] {
                self.memory[page_start + offset] = byte;
                offset = (offset + 1) % self.page_size;
            }
            self.pointer = page_start + offset;
            self.busy = self.write_cycle_probes;
        }
        Ok(())
    }

    fn handle_read(&mut self, buf: &mut [u8]) -> Result<(), ErrorKind> {
        let refused = self.refuse() || self.fail_reads;
        self.log.push(Transaction::Read {
            len: buf.len(),
            acked: !refused,
        });
        if refused {
            return Err(ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address));
        }
        for byte in buf.iter_mut() {
            *byte = self.memory[self.pointer];
            self.pointer = (self.pointer + 1) % self.memory.len();
        }
        Ok(())
    }
}

impl ErrorType for SimulatedAt24 {
    type Error = ErrorKind;
}

impl embedded_hal::i2c::I2c for SimulatedAt24 {
    fn transaction(
        &mut self,
        address: u8,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Self::Error> {
        if address != self.address {
            return Err(ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address));
        }
        for operation in operations.iter_mut() {
            match operation {
                Operation::Write(bytes) => self.handle_write(bytes)?,
                Operation::Read(buf) => self.handle_read(buf)?,
            }
        }
        Ok(())
    }
}

impl embedded_hal_async::i2c::I2c for SimulatedAt24 {
    async fn transaction(
        &mut self,
        address: u8,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Self::Error> {
        embedded_hal::i2c::I2c::transaction(self, address, operations)
    }
}

/// [`Wire`] whose requests deliver at most `max_per_request` bytes, like a
/// bus driver with a small receive FIFO. Writes always succeed.
#[derive(Debug)]
pub struct ShortReadWire {
    memory: Vec<u8>,
    pointer: usize,
    max_per_request: usize,
    tx: Vec<u8>,
    rx: VecDeque<u8>,
    requests: Vec<(usize, u8)>,
}

impl ShortReadWire {
    pub fn new(memory: Vec<u8>, max_per_request: usize) -> Self {
        Self {
            memory,
            pointer: 0,
            max_per_request,
            tx: Vec::new(),
            rx: VecDeque::new(),
            requests: Vec::new(),
        }
    }

    /// `(address pointer, requested length)` of every request.
    pub fn requests(&self) -> &[(usize, u8)] {
        &self.requests
    }

    fn end(&mut self) -> Status {
        if self.tx.len() >= 2 {
            let position = usize::from(u16::from_be_bytes([self.tx[0], self.tx[1]]));
            self.pointer = position % self.memory.len();
        }
        Status::Ack
    }

    fn request(&mut self, len: u8) -> u8 {
        self.requests.push((self.pointer, len));
        self.rx.clear();
        let count = usize::from(len).min(self.max_per_request);
        for _ in 0..count {
            self.rx.push_back(self.memory[self.pointer]);
            self.pointer = (self.pointer + 1) % self.memory.len();
        }
        count as u8
    }
}

impl Wire for ShortReadWire {
    fn begin_transmission(&mut self, _address: u8) {
        self.tx.clear();
    }

    fn write(&mut self, byte: u8) -> usize {
        self.tx.push(byte);
        1
    }

    fn end_transmission(&mut self) -> Status {
        self.end()
    }

    fn request_from(&mut self, _address: u8, len: u8, _stop: bool) -> u8 {
        self.request(len)
    }

    fn available(&self) -> usize {
        self.rx.len()
    }

    fn read(&mut self) -> Option<u8> {
        self.rx.pop_front()
    }
}

impl AsyncWire for ShortReadWire {
    fn begin_transmission(&mut self, _address: u8) {
        self.tx.clear();
    }

    fn write(&mut self, byte: u8) -> usize {
        self.tx.push(byte);
        1
    }

    async fn end_transmission(&mut self) -> Status {
        self.end()
    }

    async fn request_from(&mut self, _address: u8, len: u8, _stop: bool) -> u8 {
        self.request(len)
    }

    fn available(&self) -> usize {
        self.rx.len()
    }

    fn read(&mut self) -> Option<u8> {
        self.rx.pop_front()
    }
}

/// Delay that returns immediately and counts how often it was asked to wait.
#[derive(Debug, Default)]
pub struct CountingDelay {
    pub calls: u32,
}

impl embedded_hal_async::delay::DelayNs for CountingDelay {
    async fn delay_ns(&mut self, _ns: u32) {
        self.calls += 1;
    }
}

/// Drives a future that never actually waits.
pub fn block_on<F: Future>(future: F) -> F::Output {
    let mut future = pin!(future);
    let mut cx = Context::from_waker(Waker::noop());
    loop {
        if let Poll::Ready(output) = future.as_mut().poll(&mut cx) {
            return output;
        }
    }
}
