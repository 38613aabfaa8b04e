use core::fmt::Debug;

/// Refer to datasheet:
/// https://ww1.microchip.com/downloads/en/DeviceDoc/AT24C32D-AT24C64D-I2C-Compatible-Two-Wire-Serial-EEPROM-32-Kbit-64-Kbit-20006108A.pdf
use crate::config::EepromConfig;
use crate::error::Error;
use crate::traits::{AsyncEeprom, AsyncWire, EepromPosition};
use embedded_hal_async::delay::DelayNs;

pub struct AsyncEepromI2c<W, D> {
    wire: W,
    config: EepromConfig,
    delay: D,
}

impl<W, D> Debug for AsyncEepromI2c<W, D> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("AsyncEepromI2c")
            .field("address", &self.config.address())
            .finish()
    }
}

impl<W, D> AsyncEeprom for AsyncEepromI2c<W, D>
where
    W: AsyncWire,
    D: DelayNs,
{
    type Error = Error;

    async fn read8(&mut self, position: EepromPosition) -> Result<u8, Error> {
        self.wait_for_ready().await?;
        self.read_byte(position).await
    }

    async fn write8(&mut self, position: EepromPosition, value: u8) -> Result<(), Error> {
        if self.read8(position).await? == value {
            debug!("skip write8 at {=u16}: unchanged", position);
            return Ok(());
        }
        self.write_byte(position, value).await
    }

    async fn read16(&mut self, position: EepromPosition) -> Result<u16, Error> {
        self.read_be(position).await.map(u16::from_be_bytes)
    }

    async fn write16(&mut self, position: EepromPosition, value: u16) -> Result<(), Error> {
        if self.read16(position).await? == value {
            debug!("skip write16 at {=u16}: unchanged", position);
            return Ok(());
        }
        self.write_be(position, value.to_be_bytes()).await
    }

    async fn read32(&mut self, position: EepromPosition) -> Result<u32, Error> {
        self.read_be(position).await.map(u32::from_be_bytes)
    }

    async fn write32(&mut self, position: EepromPosition, value: u32) -> Result<(), Error> {
        if self.read32(position).await? == value {
            debug!("skip write32 at {=u16}: unchanged", position);
            return Ok(());
        }
        self.write_be(position, value.to_be_bytes()).await
    }

    async fn read_into_buffer(
        &mut self,
        destination: &mut [u8],
        position: EepromPosition,
    ) -> Result<(), Error> {
        let mut offset = 0;
        while offset < destination.len() {
            self.wait_for_ready().await?;
            let current = position.wrapping_add(offset as u16);
            let chunk = self
                .config
                .find_maximum_in_page(current, destination.len() - offset);
            trace!("read {=usize} bytes at {=u16}", chunk, current);

            self.set_address_pointer(current).await?;
            self.wire
                .request_from(self.config.address(), chunk as u8, true)
                .await;

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

    async fn write_buffer_to_device(
        &mut self,
        position: EepromPosition,
        source: &[u8],
    ) -> Result<(), Error> {
        let mut offset = 0;
        while offset < source.len() {
            self.wait_for_ready().await?;
            let current = position.wrapping_add(offset as u16);
            let chunk = self
                .config
                .find_maximum_in_page(current, source.len() - offset);
            trace!("write {=usize} bytes at {=u16}", chunk, current);

            self.wire.begin_transmission(self.config.address());
            self.write_address(current);
            for &byte in &source[offset..offset + chunk] {
                self.wire.write(byte);
            }
            self.end_transmission().await?;
            offset += chunk;
        }
        Ok(())
    }
}

impl<W, D> AsyncEepromI2c<W, D>
where
    W: AsyncWire,
    D: DelayNs,
{
    pub fn new(wire: W, delay: D, address: u8, page_size: u16) -> Self {
        Self::with_config(wire, delay, EepromConfig::new(address, page_size))
    }

    pub fn with_config(wire: W, delay: D, config: EepromConfig) -> Self {
        Self {
            wire,
            config,
            delay,
        }
    }

    pub async fn init(wire: W, delay: D, config: EepromConfig) -> Result<Self, Error> {
        let mut this = Self::with_config(wire, delay, config);
        this.wait_for_ready().await?;
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

    pub fn release(self) -> (W, D) {
        (self.wire, self.delay)
    }

    pub async fn read_byte(&mut self, position: EepromPosition) -> Result<u8, Error> {
        self.set_address_pointer(position).await?;
        self.wire.request_from(self.config.address(), 1, true).await;
        if self.wire.available() == 0 {
            return Err(Error::NoData);
        }
        self.wire.read().ok_or(Error::NoData)
    }

    /// Acknowledge polling, sleeping `poll_interval_us` between refused
    /// probes so other tasks get to run while the write commits.
    pub async fn wait_for_ready(&mut self) -> Result<(), Error> {
        self.poll_ready(0).await
    }

    async fn poll_ready(&mut self, mut probes: u32) -> Result<(), Error> {
        let address = self.config.address();
        let policy = *self.config.ready_policy();
        loop {
            self.wire.begin_transmission(address);
            probes = probes.saturating_add(1);
            if self.wire.end_transmission().await.is_ack() {
                if probes > 1 {
                    trace!("ready after {=u32} probes", probes);
                }
                return Ok(());
            }
            if policy.exhausted(probes) {
                warn!(
                    "EEPROM {=u8:#x} not ready after {=u32} probes",
                    address,
                    probes
                );
                return Err(Error::NotReady { probes });
            }
            if policy.poll_interval_us > 0 {
                self.delay.delay_us(policy.poll_interval_us).await;
            }
        }
    }

    async fn write_byte(&mut self, position: EepromPosition, value: u8) -> Result<(), Error> {
        self.wait_for_ready().await?;
        self.wire.begin_transmission(self.config.address());
        self.write_address(position);
        self.wire.write(value);
        self.end_transmission().await
    }

    async fn read_be<const N: usize>(
        &mut self,
        position: EepromPosition,
    ) -> Result<[u8; N], Error> {
        self.wait_for_ready().await?;
        let mut bytes = [0u8; N];
        for (i, byte) in bytes.iter_mut().enumerate() {
            *byte = self.read_byte(position.wrapping_add(i as u16)).await?;
        }
        Ok(bytes)
    }

    async fn write_be<const N: usize>(
        &mut self,
        position: EepromPosition,
        bytes: [u8; N],
    ) -> Result<(), Error> {
        for (i, byte) in bytes.into_iter().enumerate() {
            self.write_byte(position.wrapping_add(i as u16), byte).await?;
        }
        Ok(())
    }

    async fn set_address_pointer(&mut self, position: EepromPosition) -> Result<(), Error> {
        self.wire.begin_transmission(self.config.address());
        self.write_address(position);
        self.end_transmission().await
    }

    fn write_address(&mut self, position: EepromPosition) {
        for byte in position.to_be_bytes() {
            self.wire.write(byte);
        }
    }

    async fn end_transmission(&mut self) -> Result<(), Error> {
        match self.wire.end_transmission().await {
            status if status.is_ack() => Ok(()),
            status => Err(Error::Transmission(status)),
        }
    }
}
