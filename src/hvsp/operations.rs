use std::time::Duration;

use super::registers::{
	command,
	instruction,
	ERASE_STROBE,
	FuseAddress,
	FuseBank,
	Fuses,
	LOCK_READ,
	LockBits,
	SIGNATURE_READ,
};
use super::{
	Hardware,
	LowLevel,
};
use crate::device::Signature;

// signature bytes 1 and 2; byte 0 is the manufacturer (0x1e)
const SIGNATURE_INDICES: [u8; 2] = [1, 2];

/// The HVSP instruction sequences. Every operation is a fixed series of
/// transactions; the order is part of the protocol.
///
/// None of these can fail: a corrupted transfer just yields wrong data.
pub trait HvspOperations {
	type Hardware: Hardware + ?Sized;

	fn hardware(&mut self) -> &mut Self::Hardware;

	fn response_timeout(&self) -> Duration;

	fn transact(&mut self, sdi: u8, sii: u8) -> u8 {
		let timeout = self.response_timeout();
		self.hardware().transact(sdi, sii, timeout)
	}

	fn wait_ready(&mut self) -> bool {
		let timeout = self.response_timeout();
		self.hardware().wait_ready(timeout)
	}

	fn read_signature(&mut self) -> Signature {
		let mut signature = 0u16;
		for &index in SIGNATURE_INDICES.iter() {
			self.transact(command::READ_SIGNATURE, instruction::LOAD_COMMAND);
			self.transact(index, instruction::LOAD_ADDRESS_LOW);
			self.transact(instruction::NOOP, SIGNATURE_READ.0);
			let value = self.transact(instruction::NOOP, SIGNATURE_READ.1);
			signature = (signature << 8) | u16::from(value);
		}
		debug!("signature bytes read: {:04x}", signature);
		Signature(signature)
	}

	fn read_fuse(&mut self, bank: FuseBank) -> u8 {
		let (latch, output) = bank.read_strobes();
		self.transact(command::READ_FUSE_LOCK, instruction::LOAD_COMMAND);
		self.transact(instruction::NOOP, latch);
		let value = self.transact(instruction::NOOP, output);
		debug!("{}: 0x{:02x}", bank, value);
		value
	}

	fn read_fuses(&mut self) -> Fuses {
		let low = self.read_fuse(FuseBank::Low);
		let high = self.read_fuse(FuseBank::High);
		let extended = self.read_fuse(FuseBank::Extended);
		Fuses { low, high, extended }
	}

	// no verification; read the fuses again afterwards
	fn write_fuse(&mut self, address: FuseAddress, value: u8) {
		debug!("writing 0x{:02x} to fuse {}", value, address);
		self.transact(command::WRITE_FUSE, instruction::LOAD_COMMAND);
		self.transact(value, instruction::LOAD_DATA_LOW);
		self.transact(instruction::NOOP, address.high());
		self.transact(instruction::NOOP, address.low());
	}

	fn read_lock_bits(&mut self) -> LockBits {
		self.transact(command::READ_FUSE_LOCK, instruction::LOAD_COMMAND);
		self.transact(instruction::NOOP, LOCK_READ.0);
		let lock_bits = LockBits(self.transact(instruction::NOOP, LOCK_READ.1));
		self.wait_ready();
		debug!("lock bits: {:?}", lock_bits);
		lock_bits
	}

	// clears flash and resets the lock bits; fuses are not touched
	fn erase_flash_and_lock_bits(&mut self) {
		debug!("chip erase");
		self.transact(command::CHIP_ERASE, instruction::LOAD_COMMAND);
		self.transact(instruction::NOOP, ERASE_STROBE.0);
		self.transact(instruction::NOOP, ERASE_STROBE.1);
		self.wait_ready();
	}
}
