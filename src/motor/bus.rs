//! Trait abstraction for I2C bus operations to enable testing

use rppal::i2c::I2c;

use crate::error::{DriveError, Result};

/// Trait for I2C bus I/O operations
pub trait I2cBus {
    /// Select the 7-bit slave address for following transfers
    fn set_address(&mut self, address: u16) -> Result<()>;

    /// Write all bytes to the selected slave
    fn write(&mut self, data: &[u8]) -> Result<()>;

    /// Fill `buffer` from the selected slave
    fn read(&mut self, buffer: &mut [u8]) -> Result<()>;
}

/// Wrapper around rppal's I2C bus that implements I2cBus
pub struct RppalBus {
    i2c: I2c,
}

impl RppalBus {
    /// Open a numbered I2C bus (`/dev/i2c-N`)
    pub fn open(bus: u8) -> Result<Self> {
        let i2c = I2c::with_bus(bus)
            .map_err(|e| DriveError::I2c(format!("Failed to open bus {}: {}", bus, e)))?;
        Ok(Self { i2c })
    }
}

impl I2cBus for RppalBus {
    fn set_address(&mut self, address: u16) -> Result<()> {
        self.i2c
            .set_slave_address(address)
            .map_err(|e| DriveError::I2c(format!("Failed to select {:#04X}: {}", address, e)))
    }

    fn write(&mut self, data: &[u8]) -> Result<()> {
        let written = self
            .i2c
            .write(data)
            .map_err(|e| DriveError::I2c(format!("Failed to write: {}", e)))?;
        if written != data.len() {
            return Err(DriveError::I2c(format!(
                "Short write: {} of {} bytes",
                written,
                data.len()
            )));
        }
        Ok(())
    }

    fn read(&mut self, buffer: &mut [u8]) -> Result<()> {
        let read = self
            .i2c
            .read(buffer)
            .map_err(|e| DriveError::I2c(format!("Failed to read: {}", e)))?;
        if read != buffer.len() {
            return Err(DriveError::I2c(format!(
                "Short read: {} of {} bytes",
                read,
                buffer.len()
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
pub mod mocks {
    use super::*;
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    /// Mock I2C bus with boards that echo commands
    ///
    /// A read returns `[last command, reply, 0, 0]` where the reply comes
    /// from the board's canned replies (0 when unset). Addresses without a
    /// board fail like a missing ACK.
    #[derive(Clone, Default)]
    pub struct MockBus {
        pub address: Arc<Mutex<u16>>,
        pub written_data: Arc<Mutex<Vec<(u16, Vec<u8>)>>>,
        pub boards: Arc<Mutex<HashMap<u16, HashMap<u8, u8>>>>,
        pub echo_override: Arc<Mutex<Option<u8>>>,
    }

    impl MockBus {
        pub fn new() -> Self {
            Self::default()
        }

        /// Attach a board answering `id` to the ID command (0x99)
        pub fn with_board(self, address: u16, id: u8) -> Self {
            self.set_reply(address, 0x99, id);
            self
        }

        pub fn set_reply(&self, address: u16, command: u8, value: u8) {
            self.boards
                .lock()
                .unwrap()
                .entry(address)
                .or_default()
                .insert(command, value);
        }

        /// Make every read echo this byte instead of the command
        pub fn set_echo_override(&self, byte: u8) {
            *self.echo_override.lock().unwrap() = Some(byte);
        }

        pub fn get_written_data(&self) -> Vec<(u16, Vec<u8>)> {
            self.written_data.lock().unwrap().clone()
        }

        /// Writes of more than one byte, i.e. commands rather than read requests
        pub fn get_commands(&self) -> Vec<Vec<u8>> {
            self.get_written_data()
                .into_iter()
                .map(|(_, data)| data)
                .filter(|data| data.len() > 1)
                .collect()
        }

        pub fn clear(&self) {
            self.written_data.lock().unwrap().clear();
        }
    }

    impl I2cBus for MockBus {
        fn set_address(&mut self, address: u16) -> Result<()> {
            *self.address.lock().unwrap() = address;
            Ok(())
        }

        fn write(&mut self, data: &[u8]) -> Result<()> {
            let address = *self.address.lock().unwrap();
            if !self.boards.lock().unwrap().contains_key(&address) {
                return Err(DriveError::I2c("Mock write error: no ACK".to_string()));
            }
            self.written_data
                .lock()
                .unwrap()
                .push((address, data.to_vec()));
            Ok(())
        }

        fn read(&mut self, buffer: &mut [u8]) -> Result<()> {
            let address = *self.address.lock().unwrap();
            let boards = self.boards.lock().unwrap();
            let replies = boards
                .get(&address)
                .ok_or_else(|| DriveError::I2c("Mock read error: no ACK".to_string()))?;

            let command = self
                .written_data
                .lock()
                .unwrap()
                .iter()
                .rev()
                .find(|(a, _)| *a == address)
                .map(|(_, data)| data[0])
                .unwrap_or(0);

            buffer.fill(0);
            buffer[0] = self.echo_override.lock().unwrap().unwrap_or(command);
            if buffer.len() > 1 {
                buffer[1] = replies.get(&command).copied().unwrap_or(0);
            }
            Ok(())
        }
    }
}
