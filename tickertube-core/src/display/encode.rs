//! Symbol decoding and shift-register encoding

use crate::config::wiring::WiringTable;

/// Whether the hardware can force a tube position dark
///
/// The cathode drivers have no separate blanking line, so a tube with no
/// cathode selected simply contributes no bits to the register image.
pub const EXPLICIT_BLANKING: bool = false;

/// Map each display symbol to a cathode index of its tube
///
/// Symbols the tube cannot show, and empty (zero) slots, become `None`.
pub fn decode(wiring: &WiringTable, value: &[u8], cathodes: &mut [Option<u8>]) {
    for ((tube, symbol), cathode) in wiring.tubes().iter().zip(value).zip(cathodes.iter_mut()) {
        *cathode = tube.tube_type.symbol_to_cathode(*symbol);
    }
}

/// Rebuild the register image from the selected cathodes
///
/// Every register is cleared first; then each selected cathode with a
/// wire sets its bit.
pub fn encode(wiring: &WiringTable, cathodes: &[Option<u8>], registers: &mut [u8]) {
    registers.fill(0);
    for (tube, cathode) in cathodes.iter().enumerate() {
        let Some(cathode) = *cathode else {
            continue;
        };
        if let Some(wire) = wiring.wire(tube, cathode) {
            if let Some(byte) = registers.get_mut(wire.register as usize) {
                *byte |= 1 << wire.bit;
            }
        }
    }
}
