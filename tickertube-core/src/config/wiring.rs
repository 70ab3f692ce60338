//! Tube wiring table
//!
//! Maps every (tube, cathode index) pair to the shift-register output that
//! drives it. The table is built and validated once at setup; after that it
//! is only read, so the encoder never has to range-check an entry.
//!
//! ```text
//! let mut wiring = WiringTable::new(6)?;
//! let tube = wiring.add_tube(NixieType::In12a)?;
//! wiring.connect(tube, 2, 0, 0)?;   // '0' on register 0, bit 0
//! ```

use heapless::Vec;

use crate::tube::{NixieType, MAX_CATHODES};

/// Maximum number of tubes in one display
pub const MAX_TUBES: usize = 8;

/// Maximum number of 8-bit shift registers in the chain
pub const MAX_SHIFT_REGISTERS: usize = 8;

/// Wiring validation errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum WiringError {
    /// More than [`MAX_TUBES`] tubes
    TooManyTubes,
    /// Tube index was never added
    UnknownTube,
    /// Cathode index not below [`MAX_CATHODES`]
    CathodeOutOfRange,
    /// Register index not below the chain length
    RegisterOutOfRange,
    /// Bit index above 7
    BitOutOfRange,
    /// Chain longer than [`MAX_SHIFT_REGISTERS`]
    TooManyRegisters,
}

/// One shift-register output
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CathodeWire {
    /// Register index in the chain
    pub register: u8,
    /// Output bit within the register (0 = QA)
    pub bit: u8,
}

/// Wiring of a single tube
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TubeWiring {
    /// Tube variant, selects the symbol table
    pub tube_type: NixieType,
    /// Output for each cathode slot; `None` means not connected
    pub cathodes: [Option<CathodeWire>; MAX_CATHODES],
}

/// Validated wiring of the whole display
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct WiringTable {
    shift_registers: u8,
    tubes: Vec<TubeWiring, MAX_TUBES>,
}

impl WiringTable {
    /// Start an empty table for a chain of `shift_registers` registers
    pub fn new(shift_registers: usize) -> Result<Self, WiringError> {
        if shift_registers > MAX_SHIFT_REGISTERS {
            return Err(WiringError::TooManyRegisters);
        }
        Ok(Self {
            shift_registers: shift_registers as u8,
            tubes: Vec::new(),
        })
    }

    /// Wire `tubes` tubes of one variant to consecutive outputs
    ///
    /// Tube `t`, cathode `c` of the digits 0-9 drives output number
    /// `t * 10 + (c - 2)` counted from register 0 bit 0.
    pub fn sequential(
        tube_type: NixieType,
        tubes: usize,
        shift_registers: usize,
    ) -> Result<Self, WiringError> {
        let mut table = Self::new(shift_registers)?;
        for _ in 0..tubes {
            let tube = table.add_tube(tube_type)?;
            for cathode in 2..12u8 {
                let output = tube * 10 + (cathode as usize - 2);
                table.connect(tube, cathode, (output / 8) as u8, (output % 8) as u8)?;
            }
        }
        Ok(table)
    }

    /// Append a tube with no cathodes connected; returns its index
    pub fn add_tube(&mut self, tube_type: NixieType) -> Result<usize, WiringError> {
        self.tubes
            .push(TubeWiring {
                tube_type,
                cathodes: [None; MAX_CATHODES],
            })
            .map_err(|_| WiringError::TooManyTubes)?;
        Ok(self.tubes.len() - 1)
    }

    /// Connect a cathode of `tube` to a register output
    pub fn connect(
        &mut self,
        tube: usize,
        cathode: u8,
        register: u8,
        bit: u8,
    ) -> Result<(), WiringError> {
        if cathode as usize >= MAX_CATHODES {
            return Err(WiringError::CathodeOutOfRange);
        }
        if register >= self.shift_registers {
            return Err(WiringError::RegisterOutOfRange);
        }
        if bit > 7 {
            return Err(WiringError::BitOutOfRange);
        }
        let wiring = self.tubes.get_mut(tube).ok_or(WiringError::UnknownTube)?;
        wiring.cathodes[cathode as usize] = Some(CathodeWire { register, bit });
        Ok(())
    }

    /// Number of registers in the chain
    pub fn shift_registers(&self) -> usize {
        self.shift_registers as usize
    }

    /// Number of tubes
    pub fn tube_count(&self) -> usize {
        self.tubes.len()
    }

    /// Wiring of every tube, in display order
    pub fn tubes(&self) -> &[TubeWiring] {
        &self.tubes
    }

    /// Output driving `cathode` of `tube`, if connected
    pub fn wire(&self, tube: usize, cathode: u8) -> Option<CathodeWire> {
        self.tubes
            .get(tube)
            .and_then(|t| t.cathodes.get(cathode as usize).copied().flatten())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connect_and_lookup() {
        let mut table = WiringTable::new(2).unwrap();
        let tube = table.add_tube(NixieType::In12b).unwrap();
        table.connect(tube, 12, 1, 7).unwrap();

        assert_eq!(table.tube_count(), 1);
        assert_eq!(table.wire(0, 12), Some(CathodeWire { register: 1, bit: 7 }));
        assert_eq!(table.wire(0, 2), None);
        assert_eq!(table.wire(1, 2), None);
        assert_eq!(table.tubes()[0].tube_type, NixieType::In12b);
    }

    #[test]
    fn test_rejects_out_of_range_entries() {
        let mut table = WiringTable::new(2).unwrap();
        let tube = table.add_tube(NixieType::In12a).unwrap();

        assert_eq!(table.connect(tube, 13, 0, 0), Err(WiringError::CathodeOutOfRange));
        assert_eq!(table.connect(tube, 2, 2, 0), Err(WiringError::RegisterOutOfRange));
        assert_eq!(table.connect(tube, 2, 0, 8), Err(WiringError::BitOutOfRange));
        assert_eq!(table.connect(3, 2, 0, 0), Err(WiringError::UnknownTube));
    }

    #[test]
    fn test_limits() {
        assert_eq!(
            WiringTable::new(MAX_SHIFT_REGISTERS + 1),
            Err(WiringError::TooManyRegisters)
        );

        let mut table = WiringTable::new(1).unwrap();
        for _ in 0..MAX_TUBES {
            table.add_tube(NixieType::In12a).unwrap();
        }
        assert_eq!(table.add_tube(NixieType::In12a), Err(WiringError::TooManyTubes));
    }

    #[test]
    fn test_sequential_layout() {
        let table = WiringTable::sequential(NixieType::In12a, 4, 6).unwrap();
        assert_eq!(table.tube_count(), 4);
        assert_eq!(table.shift_registers(), 6);

        // Tube 0: '0' (cathode 2) is output 0
        assert_eq!(table.wire(0, 2), Some(CathodeWire { register: 0, bit: 0 }));
        // Tube 0: '1' (cathode 11) is output 9
        assert_eq!(table.wire(0, 11), Some(CathodeWire { register: 1, bit: 1 }));
        // Tube 3: '1' is output 39, the last one used
        assert_eq!(table.wire(3, 11), Some(CathodeWire { register: 4, bit: 7 }));
        // Cathodes outside 2..=11 stay unconnected
        assert_eq!(table.wire(0, 0), None);
        assert_eq!(table.wire(0, 12), None);
    }

    #[test]
    fn test_sequential_needs_enough_registers() {
        assert_eq!(
            WiringTable::sequential(NixieType::In12a, 4, 4),
            Err(WiringError::RegisterOutOfRange)
        );
    }
}
