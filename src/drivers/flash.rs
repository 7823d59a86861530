//! Page-granular programming of the application region.
//!
//! Pages are erased lazily: an erase frontier walks up from address 0 and a
//! page is erased the first time a write reaches it, never again in the same
//! session. Writes may be any even size; they are split at page boundaries
//! and each touched page is committed as a whole.

use ufmt::derive::uDebug;

use crate::config::DeviceProfile;
use crate::hal::{FlashMemory, Fuse, ERASED_WORD};

#[derive(Debug, uDebug, Clone, Copy, PartialEq, Eq)]
pub enum FlashError {
    /// Range leaves program memory, or for writes, the application region
    AddressOutOfRange,
    /// Zero or odd byte count
    InvalidSize,
}

pub struct FlashProgrammer<F> {
    flash: F,
    device: DeviceProfile,
}

impl<F: FlashMemory> FlashProgrammer<F> {
    pub fn new(flash: F, device: DeviceProfile) -> Self {
        Self { flash, device }
    }

    pub fn device(&self) -> &DeviceProfile {
        &self.device
    }

    pub fn flash(&self) -> &F {
        &self.flash
    }

    pub fn into_inner(self) -> F {
        self.flash
    }

    /// Fill `out` with program memory starting at `address`, low byte of each
    /// word first. `address` is left just past the last word read.
    pub fn read(&mut self, address: &mut u32, out: &mut [u8]) -> Result<(), FlashError> {
        check_size(out.len())?;
        let end = address
            .checked_add(out.len() as u32)
            .ok_or(FlashError::AddressOutOfRange)?;
        if end > self.device.flash_size() {
            return Err(FlashError::AddressOutOfRange);
        }

        for pair in out.chunks_exact_mut(2) {
            pair.copy_from_slice(&self.flash.read_word(*address).to_le_bytes());
            *address += 2;
        }
        Ok(())
    }

    /// Program `data` at `address`, erasing pages up to the one being written
    /// if the frontier has not passed them yet. `address` is left just past
    /// the last word written.
    pub fn write(
        &mut self,
        address: &mut u32,
        erase_frontier: &mut u32,
        data: &[u8],
    ) -> Result<(), FlashError> {
        check_size(data.len())?;
        let end = address
            .checked_add(data.len() as u32)
            .ok_or(FlashError::AddressOutOfRange)?;
        if end > self.device.application_end() {
            return Err(FlashError::AddressOutOfRange);
        }

        let mut words = data.chunks_exact(2);
        while *address < end {
            let page = self.device.page_base(*address);
            let page_end = end.min(page + self.device.page_size);

            self.erase_through(page, erase_frontier);

            while *address < page_end {
                if let Some(pair) = words.next() {
                    self.flash
                        .fill_page_buffer(*address, u16::from_le_bytes([pair[0], pair[1]]));
                }
                *address += 2;
            }

            self.flash.write_page(page);
            self.flash.enable_rww_section();
        }
        Ok(())
    }

    fn erase_through(&mut self, page: u32, erase_frontier: &mut u32) {
        let limit = self.device.application_end();
        while *erase_frontier <= page && *erase_frontier < limit {
            self.flash.erase_page(*erase_frontier);
            *erase_frontier += self.device.page_size;
        }
    }

    pub fn read_fuse(&mut self, fuse: Fuse) -> u8 {
        self.flash.read_fuse(fuse)
    }

    /// An erased reset vector means there is nothing to start.
    pub fn application_present(&mut self) -> bool {
        self.flash.enable_rww_section();
        self.flash.read_word(0) != ERASED_WORD
    }
}

fn check_size(len: usize) -> Result<(), FlashError> {
    if len == 0 || len % 2 != 0 {
        return Err(FlashError::InvalidSize);
    }
    Ok(())
}
