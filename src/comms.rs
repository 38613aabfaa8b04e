/// Refer to datasheet:
/// https://ww1.microchip.com/downloads/en/DeviceDoc/AT24C32D-AT24C64D-I2C-Compatible-Two-Wire-Serial-EEPROM-32-Kbit-64-Kbit-20006108A.pdf
use crate::config::EepromConfig;
use crate::error::Error;
use crate::traits::{Eeprom, EepromPosition, Wire};
use core::fmt::Debug;

pub struct EepromI2c<W> {
    wire: W,
    config: EepromConfig,
}
impl<W> Debug for EepromI2c<W> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "EepromI2c({:#x})", self.config.address())
    }
}

impl<W> Eeprom for EepromI2c<W>
where
    W: Wire,
{
    type Error = Error;

    fn read8(&mut self, position: EepromPosition) -> Result<u8, Error> {
        self.wait_for_ready()?;
        self.read_byte(position)
    }

    /// Skips the bus entirely when the cell already holds `value`.
    fn write8(&mut self, position: EepromPosition, value: u8) -> Result<(), Error> {
        if self.read8(position)? == value {
            debug!("skip write8 at {=u16}: unchanged", position);
            return Ok(());
        }
        self.write_byte(position, value)
    }

    fn read16(&mut self, position: EepromPosition) -> Result<u16, Error> {
        self.read_be(position).map(u16::from_be_bytes)
    }

    fn write16(&mut self, position: EepromPosition, value: u16) -> Result<(), Error> {
        if self.read16(position)? == value {
            debug!("skip write16 at {=u16}: unchanged", position);
            return Ok(());
        }
        self.write_be(position, value.to_be_bytes())
    }

    fn read32(&mut self, position: EepromPosition) -> Result<u32, Error> {
        self.read_be(position).map(u32::from_be_bytes)
    }

    fn write32(&mut self, position: EepromPosition, value: u32) -> Result<(), Error> {
        if self.read32(position)? == value {
            debug!("skip write32 at {=u16}: unchanged", position);
            return Ok(());
        }
        self.write_be(position, value.to_be_bytes())
    }

    /// Sequential read (datasheet 9.3), split so no request crosses a page
    /// or exceeds the bus buffer.
    fn read_into_buffer(
        &mut self,
        destination: &mut [u8],
        position: EepromPosition,
    ) -> Result<(), Error> {
        let mut offset = 0;
        while offset < destination.len() {
            self.wait_for_ready()?;
            let current = position.wrapping_add(offset as u16);
            let chunk = self
                .config
                .find_maximum_in_page(current, destination.len() - offset);
            trace!("read {=usize} bytes at {=u16}", chunk, current);

            self.set_address_pointer(current)?;
            self.wire
                .request_from(self.config.address(), chunk as u8, true);

            let start = offset;
            while offset - start < chunk && self.wire.available() > 0 {
                match self.wire.read() {
                    Some(byte) => {
                        destination[offset] = byte;
                        offset += 1;
                    }
                    None => break,
                }
            }
            if offset == start {
                return Err(Error::NoData);
            }
        }
        Ok(())
    }

    /// Page write (datasheet 8.2). The device wraps inside the page if the
    /// data runs past its end, so every transaction stays within one page.
    fn write_buffer_to_device(
        &mut self,
        position: EepromPosition,
        source: &[u8],
    ) -> Result<(), Error> {
        let mut offset = 0;
        while offset < source.len() {
            self.wait_for_ready()?;
            let current = position.wrapping_add(offset as u16);
            let chunk = self
                .config
                .find_maximum_in_page(current, source.len() - offset);
            trace!("write {=usize} bytes at {=u16}", chunk, current);

            self.wire.begin_transmission(self.config.address());
            self.write_address(current);
            for &byte in &source[offset..offset + chunk] {
                // a full buffer comes back as DataTooLong below
                self.wire.write(byte);
            }
            self.end_transmission()?;
            offset += chunk;
        }
        Ok(())
    }
}

impl<W> EepromI2c<W>
where
    W: Wire,
{
    pub fn new(wire: W, address: u8, page_size: u16) -> Self {
        Self::with_config(wire, EepromConfig::new(address, page_size))
    }

    pub fn with_config(wire: W, config: EepromConfig) -> Self {
        Self { wire, config }
    }

    /// Like [`EepromI2c::with_config`], but also waits for the device to
    /// acknowledge once.
    pub fn init(wire: W, config: EepromConfig) -> Result<Self, Error> {
        let mut this = Self::with_config(wire, config);
        this.wait_for_ready()?;
        debug!("EEPROM ready: {}", this.config);
        Ok(this)
    }

    pub fn config(&self) -> &EepromConfig {
        &self.config
    }

    pub fn wire(&self) -> &W {
        &self.wire
    }

    pub fn wire_mut(&mut self) -> &mut W {
        &mut self.wire
    }

    pub fn release(self) -> W {
        self.wire
    }

    /// Random read (datasheet 9.2): a dummy write loads the address pointer,
    /// then one byte is clocked out.
    ///
    /// Does not wait for a pending write to finish; use [`Eeprom::read8`]
    /// unless the device is known to be idle.
    pub fn read_byte(&mut self, position: EepromPosition) -> Result<u8, Error> {
        self.set_address_pointer(position)?;
        self.wire.request_from(self.config.address(), 1, true);
        if self.wire.available() == 0 {
            return Err(Error::NoData);
        }
        self.wire.read().ok_or(Error::NoData)
    }

    /// Acknowledge polling (datasheet 8.3). While the device is committing a
    /// write it ignores its address, so an empty transaction is repeated
    /// until it is acknowledged or the ready policy runs out.
    pub fn wait_for_ready(&mut self) -> Result<(), Error> {
        self.poll_ready(0)
    }

    /// Probe loop behind [`EepromI2c::wait_for_ready`], counting on from
    /// `probes`. The count saturates, so an unbounded wait never overflows.
    fn poll_ready(&mut self, mut probes: u32) -> Result<(), Error> {
        let address = self.config.address();
        loop {
            self.wire.begin_transmission(address);
            probes = probes.saturating_add(1);
            if self.wire.end_transmission().is_ack() {
                if probes > 1 {
                    trace!("ready after {=u32} probes", probes);
                }
                return Ok(());
            }
            if self.config.ready_policy().exhausted(probes) {
                warn!(
                    "EEPROM {=u8:#x} not ready after {=u32} probes",
                    address,
                    probes
                );
                return Err(Error::NotReady { probes });
            }
        }
    }

    /// Byte write (datasheet 8.1). Waits first since the previous write may
    /// still be committing.
    fn write_byte(&mut self, position: EepromPosition, value: u8) -> Result<(), Error> {
        self.wait_for_ready()?;
        self.wire.begin_transmission(self.config.address());
        self.write_address(position);
        self.wire.write(value);
        self.end_transmission()
    }

    /// Waits once, then reads `N` consecutive bytes without further polling.
    fn read_be<const N: usize>(&mut self, position: EepromPosition) -> Result<[u8; N], Error> {
        self.wait_for_ready()?;
        let mut bytes = [0u8; N];
        for (i, byte) in bytes.iter_mut().enumerate() {
            *byte = self.read_byte(position.wrapping_add(i as u16))?;
        }
        Ok(bytes)
    }

    fn write_be<const N: usize>(
        &mut self,
        position: EepromPosition,
        bytes: [u8; N],
    ) -> Result<(), Error> {
        for (i, byte) in bytes.into_iter().enumerate() {
            self.write_byte(position.wrapping_add(i as u16), byte)?;
        }
        Ok(())
    }

    fn set_address_pointer(&mut self, position: EepromPosition) -> Result<(), Error> {
        self.wire.begin_transmission(self.config.address());
        self.write_address(position);
        self.end_transmission()
    }

    fn write_address(&mut self, position: EepromPosition) {
        for byte in position.to_be_bytes() {
            self.wire.write(byte);
        }
    }

    fn end_transmission(&mut self) -> Result<(), Error> {
        match self.wire.end_transmission() {
            status if status.is_ack() => Ok(()),
            status => Err(Error::Transmission(status)),
        }
    }
}
