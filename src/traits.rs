/// Byte offset into the linear address space of an EEPROM.
///
/// Sent to the device as two address bytes, high byte first.
pub type EepromPosition = u16;

/// Result of ending a bus transaction.
///
/// The discriminants are the classic two-wire status codes: zero means the
/// device acknowledged, anything else means it did not.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
#[repr(u8)]
pub enum Status {
    Ack = 0,
    /// More bytes were queued than the transmit buffer holds.
    DataTooLong = 1,
    /// The device did not acknowledge its address.
    AddressNack = 2,
    /// The device did not acknowledge a data byte.
    DataNack = 3,
    Other = 4,
    Timeout = 5,
}

impl Status {
    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn from_code(code: u8) -> Self {
        match code {
            0 => Status::Ack,
            1 => Status::DataTooLong,
            2 => Status::AddressNack,
            3 => Status::DataNack,
            5 => Status::Timeout,
            _ => Status::Other,
        }
    }

    pub fn is_ack(self) -> bool {
        self == Status::Ack
    }
}

/// Raw two-wire transaction primitive.
///
/// Outgoing bytes are queued between [`Wire::begin_transmission`] and
/// [`Wire::end_transmission`]; the bus is only touched when the transaction
/// ends. Incoming bytes are fetched by [`Wire::request_from`] and drained
/// with [`Wire::read`].
pub trait Wire {
    /// Starts queueing a transaction addressed to the 7-bit `address`.
    fn begin_transmission(&mut self, address: u8);

    /// Queues one byte. Returns the number of bytes queued, which is zero
    /// when the transmit buffer is full. A short write is reported again as
    /// [`Status::DataTooLong`] by [`Wire::end_transmission`].
    fn write(&mut self, byte: u8) -> usize;

    /// Sends the queued transaction.
    fn end_transmission(&mut self) -> Status;

    /// Reads up to `len` bytes from `address`, returning how many arrived.
    fn request_from(&mut self, address: u8, len: u8, stop: bool) -> u8;

    /// Bytes received by the last request and not yet read.
    fn available(&self) -> usize;

    fn read(&mut self) -> Option<u8>;
}

/// Async flavour of [`Wire`]. Only the operations that touch the bus are
/// `async`.
#[allow(async_fn_in_trait)]
pub trait AsyncWire {
    fn begin_transmission(&mut self, address: u8);

    fn write(&mut self, byte: u8) -> usize;

    async fn end_transmission(&mut self) -> Status;

    async fn request_from(&mut self, address: u8, len: u8, stop: bool) -> u8;

    fn available(&self) -> usize;

    fn read(&mut self) -> Option<u8>;
}

/// Typed access to byte-addressable non-volatile storage.
pub trait Eeprom {
    type Error;

    /// Reads the byte at `position` once the device is idle.
    fn read8(&mut self, position: EepromPosition) -> Result<u8, Self::Error>;

    /// Writes `value` at `position` unless the cell already holds it.
    fn write8(&mut self, position: EepromPosition, value: u8) -> Result<(), Self::Error>;

    /// Reads a big-endian `u16` from `position` and `position + 1`.
    fn read16(&mut self, position: EepromPosition) -> Result<u16, Self::Error>;

    /// Writes a big-endian `u16`, skipped entirely if already stored.
    fn write16(&mut self, position: EepromPosition, value: u16) -> Result<(), Self::Error>;

    /// Reads a big-endian `u32` from four consecutive positions.
    fn read32(&mut self, position: EepromPosition) -> Result<u32, Self::Error>;

    /// Writes a big-endian `u32`, skipped entirely if already stored.
    fn write32(&mut self, position: EepromPosition, value: u32) -> Result<(), Self::Error>;

    /// Fills `destination` with the bytes starting at `position`.
    fn read_into_buffer(
        &mut self,
        destination: &mut [u8],
        position: EepromPosition,
    ) -> Result<(), Self::Error>;

    /// Stores `source` starting at `position`. Always commits, without a
    /// read-before-write comparison.
    fn write_buffer_to_device(
        &mut self,
        position: EepromPosition,
        source: &[u8],
    ) -> Result<(), Self::Error>;
}

#[allow(async_fn_in_trait)]
pub trait AsyncEeprom {
    type Error;

    async fn read8(&mut self, position: EepromPosition) -> Result<u8, Self::Error>;

    async fn write8(&mut self, position: EepromPosition, value: u8) -> Result<(), Self::Error>;

    async fn read16(&mut self, position: EepromPosition) -> Result<u16, Self::Error>;

    async fn write16(&mut self, position: EepromPosition, value: u16) -> Result<(), Self::Error>;

    async fn read32(&mut self, position: EepromPosition) -> Result<u32, Self::Error>;

    async fn write32(&mut self, position: EepromPosition, value: u32) -> Result<(), Self::Error>;

    async fn read_into_buffer(
        &mut self,
        destination: &mut [u8],
        position: EepromPosition,
    ) -> Result<(), Self::Error>;

    async fn write_buffer_to_device(
        &mut self,
        position: EepromPosition,
        source: &[u8],
    ) -> Result<(), Self::Error>;
}
