//! High-Voltage Serial Programming for 8-pin and 14-pin ATtiny devices
//!
//! The target is held with 12V on !RESET and clocked through SCI; SDI
//! (data) and SII (instruction) are shifted in parallel, and the target
//! answers on SDO. Every transaction is one 11-bit frame per line:
//!
//! - Startbit: "0"
//! - 8 bits, most significant first
//! - 2 stopbits: "0"
//!
//! SDO is sampled before every rising SCI edge, so a response byte arrives
//! in the same 11 cycles. Between instructions the target holds SDO low
//! while busy.
//!
//! Instructions (SII) with operand (SDI):
//! - 0x4c: load command (0x80 chip erase, 0x40 write fuse, 0x08 read
//!   signature, 0x04 read fuse/lock)
//! - 0x0c: load address low byte
//! - 0x2c: load data low byte
//! - strobe pairs with SDI 0x00: latch and shift out data, or finish a
//!   write (the two bytes of a `FuseAddress`)

mod hardware;
mod low_level;
mod operations;
mod programming;
mod registers;

#[cfg(test)]
pub(crate) mod simulator;

pub use self::hardware::{
	Direction,
	Hardware,
	Pin,
	reliable_sleep,
};

pub use self::low_level::{
	FRAME_BITS,
	LowLevel,
};

pub use self::operations::{
	HvspOperations,
};

pub use self::programming::{
	ProgrammingMode,
	enter_programming_mode,
	power_down,
};

pub use self::registers::{
	FuseAddress,
	FuseBank,
	Fuses,
	LockBits,
};
