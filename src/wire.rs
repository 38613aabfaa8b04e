//! Adapters from embedded-hal I2C buses to the [`Wire`] transaction model.
//!
//! embedded-hal reads always finish with a stop condition, so the `stop`
//! argument of `request_from` has no effect here.
use core::fmt::Debug;

use embedded_hal::i2c::{Error as _, ErrorKind, NoAcknowledgeSource};
use heapless::Vec;

use crate::config::WIRE_BUFFER_LEN;
use crate::traits::{AsyncWire, Status, Wire};

/// Payload plus the two address bytes.
const TX_CAPACITY: usize = WIRE_BUFFER_LEN + 2;

impl From<ErrorKind> for Status {
    fn from(kind: ErrorKind) -> Self {
        match kind {
            ErrorKind::NoAcknowledge(NoAcknowledgeSource::Data) => Status::DataNack,
            ErrorKind::NoAcknowledge(_) => Status::AddressNack,
            _ => Status::Other,
        }
    }
}

/// Transmit queue and receive buffer shared by both adapters.
struct Buffers {
    address: u8,
    tx: Vec<u8, TX_CAPACITY>,
    overflow: bool,
    rx: [u8; WIRE_BUFFER_LEN],
    rx_len: usize,
    rx_pos: usize,
}

impl Buffers {
    const fn new() -> Self {
        Self {
            address: 0,
            tx: Vec::new(),
            overflow: false,
            rx: [0; WIRE_BUFFER_LEN],
            rx_len: 0,
            rx_pos: 0,
        }
    }

    fn begin(&mut self, address: u8) {
        self.address = address;
        self.tx.clear();
        self.overflow = false;
    }

    fn push(&mut self, byte: u8) -> usize {
        match self.tx.push(byte) {
            Ok(()) => 1,
            Err(_) => {
                self.overflow = true;
                0
            }
        }
    }

    /// Clears the receive side and returns the slice a request of `len`
    /// bytes should land in.
    fn prepare_rx(&mut self, len: u8) -> &mut [u8] {
        self.rx_len = 0;
        self.rx_pos = 0;
        let len = usize::from(len).min(WIRE_BUFFER_LEN);
        &mut self.rx[..len]
    }

    fn received(&mut self, len: usize) -> u8 {
        self.rx_len = len;
        len as u8
    }

    fn available(&self) -> usize {
        self.rx_len - self.rx_pos
    }

    fn read(&mut self) -> Option<u8> {
        if self.rx_pos >= self.rx_len {
            return None;
        }
        let byte = self.rx[self.rx_pos];
        self.rx_pos += 1;
        Some(byte)
    }
}

/// [`Wire`] over a blocking `embedded_hal::i2c::I2c` bus.
pub struct I2cWire<I2C> {
    i2c: I2C,
    buffers: Buffers,
}

impl<I2C> Debug for I2cWire<I2C> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "I2cWire")
    }
}

impl<I2C> I2cWire<I2C> {
    pub const fn new(i2c: I2C) -> Self {
        Self {
            i2c,
            buffers: Buffers::new(),
        }
    }

    pub fn inner(&self) -> &I2C {
        &self.i2c
    }

    pub fn inner_mut(&mut self) -> &mut I2C {
        &mut self.i2c
    }

    pub fn release(self) -> I2C {
        self.i2c
    }
}

impl<I2C> Wire for I2cWire<I2C>
where
    I2C: embedded_hal::i2c::I2c,
{
    fn begin_transmission(&mut self, address: u8) {
        self.buffers.begin(address);
    }

    fn write(&mut self, byte: u8) -> usize {
        self.buffers.push(byte)
    }

    fn end_transmission(&mut self) -> Status {
        if self.buffers.overflow {
            return Status::DataTooLong;
        }
        match self.i2c.write(self.buffers.address, &self.buffers.tx) {
            Ok(()) => Status::Ack,
            Err(e) => Status::from(e.kind()),
        }
    }

    fn request_from(&mut self, address: u8, len: u8, _stop: bool) -> u8 {
        let buf = self.buffers.prepare_rx(len);
        let len = buf.len();
        match self.i2c.read(address, buf) {
            Ok(()) => self.buffers.received(len),
            Err(e) => {
                warn!("i2c read from {=u8:#x} failed: {}", address, Status::from(e.kind()));
                0
            }
        }
    }

    fn available(&self) -> usize {
        self.buffers.available()
    }

    fn read(&mut self) -> Option<u8> {
        self.buffers.read()
    }
}

/// [`AsyncWire`] over an `embedded_hal_async::i2c::I2c` bus.
pub struct AsyncI2cWire<I2C> {
    i2c: I2C,
    buffers: Buffers,
}

impl<I2C> Debug for AsyncI2cWire<I2C> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("AsyncI2cWire").finish()
    }
}

impl<I2C> AsyncI2cWire<I2C> {
    pub const fn new(i2c: I2C) -> Self {
        Self {
            i2c,
            buffers: Buffers::new(),
        }
    }

    pub fn inner(&self) -> &I2C {
        &self.i2c
    }

    pub fn inner_mut(&mut self) -> &mut I2C {
        &mut self.i2c
    }

    pub fn release(self) -> I2C {
        self.i2c
    }
}

impl<I2C> AsyncWire for AsyncI2cWire<I2C>
where
    I2C: embedded_hal_async::i2c::I2c,
{
    fn begin_transmission(&mut self, address: u8) {
        self.buffers.begin(address);
    }

    fn write(&mut self, byte: u8) -> usize {
        self.buffers.push(byte)
    }

    async fn end_transmission(&mut self) -> Status {
        if self.buffers.overflow {
            return Status::DataTooLong;
        }
        match self.i2c.write(self.buffers.address, &self.buffers.tx).await {
            Ok(()) => Status::Ack,
            Err(e) => Status::from(e.kind()),
        }
    }

    async fn request_from(&mut self, address: u8, len: u8, _stop: bool) -> u8 {
        let buf = self.buffers.prepare_rx(len);
        let len = buf.len();
        match self.i2c.read(address, buf).await {
            Ok(()) => self.buffers.received(len),
            Err(e) => {
                warn!("i2c read from {=u8:#x} failed: {}", address, Status::from(e.kind()));
                0
            }
        }
    }

    fn available(&self) -> usize {
        self.buffers.available()
    }

    fn read(&mut self) -> Option<u8> {
        self.buffers.read()
    }
}
