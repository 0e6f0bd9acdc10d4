use std::fmt;
use std::str;

// SII instruction bytes; the SDI byte sent along carries the operand
pub mod instruction {
	pub const LOAD_COMMAND:      u8 = 0x4c;
	pub const LOAD_ADDRESS_LOW:  u8 = 0x0c;
	pub const LOAD_DATA_LOW:     u8 = 0x2c;
	pub const NOOP:              u8 = 0x00; // SDI byte for strobe-only frames
}

// SDI operand for `LOAD_COMMAND`
pub mod command {
	pub const CHIP_ERASE:        u8 = 0x80;
	pub const WRITE_FUSE:        u8 = 0x40;
	pub const READ_SIGNATURE:    u8 = 0x08;
	pub const READ_FUSE_LOCK:    u8 = 0x04;
}

// strobe pairs (SII): the first latches, the data appears on SDO during the second
pub(crate) const SIGNATURE_READ: (u8, u8) = (0x68, 0x6c);
pub(crate) const LOCK_READ:      (u8, u8) = (0x78, 0x7c);
pub(crate) const ERASE_STROBE:   (u8, u8) = (0x64, 0x6c);

const LOCK_BIT_1: u8 = 0x01;
const LOCK_BIT_2: u8 = 0x02;

/// Protocol selector for a fuse bank: high byte and low byte are the two
/// SII strobes finishing a fuse write.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FuseAddress(pub u16);

impl FuseAddress {
	pub const LFUSE: FuseAddress = FuseAddress(0x646c);
	pub const HFUSE: FuseAddress = FuseAddress(0x747c);
	pub const EFUSE: FuseAddress = FuseAddress(0x666e);

	pub fn high(&self) -> u8 {
		(self.0 >> 8) as u8
	}

	pub fn low(&self) -> u8 {
		self.0 as u8
	}
}

impl fmt::Display for FuseAddress {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		write!(f, "0x{:04x}", self.0)
	}
}

impl fmt::Debug for FuseAddress {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		write!(f, "FuseAddress(0x{:04x})", self.0)
	}
}

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub enum FuseBank {
	Low,
	High,
	Extended,
}

impl FuseBank {
	/// read order
	pub const ALL: [FuseBank; 3] = [FuseBank::Low, FuseBank::High, FuseBank::Extended];

	pub fn address(self) -> FuseAddress {
		match self {
			FuseBank::Low => FuseAddress::LFUSE,
			FuseBank::High => FuseAddress::HFUSE,
			FuseBank::Extended => FuseAddress::EFUSE,
		}
	}

	// SII strobe pair for reading this bank
	pub(crate) fn read_strobes(self) -> (u8, u8) {
		match self {
			FuseBank::Low => (0x68, 0x6c),
			FuseBank::High => (0x7a, 0x7e),
			FuseBank::Extended => (0x6a, 0x6e),
		}
	}

	pub fn name(self) -> &'static str {
		match self {
			FuseBank::Low => "LFUSE",
			FuseBank::High => "HFUSE",
			FuseBank::Extended => "EFUSE",
		}
	}
}

impl fmt::Display for FuseBank {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		f.write_str(self.name())
	}
}

impl str::FromStr for FuseBank {
	type Err = ::failure::Error;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.to_ascii_lowercase().as_str() {
			"l" | "low" | "lfuse" => Ok(FuseBank::Low),
			"h" | "high" | "hfuse" => Ok(FuseBank::High),
			"e" | "ext" | "extended" | "efuse" => Ok(FuseBank::Extended),
			_ => bail!("unknown fuse bank {:?} (expected low, high or extended)", s),
		}
	}
}

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct Fuses {
	pub low: u8,
	pub high: u8,
	pub extended: u8,
}

impl Fuses {
	pub fn get(&self, bank: FuseBank) -> u8 {
		match bank {
			FuseBank::Low => self.low,
			FuseBank::High => self.high,
			FuseBank::Extended => self.extended,
		}
	}
}

impl fmt::Display for Fuses {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		write!(f, "LFuse: {:02X}, HFuse: {:02X}, EFuse: {:02X}", self.low, self.high, self.extended)
	}
}

/// Raw lock byte: `x x x x x x LB2 LB1`; a cleared bit is programmed.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LockBits(pub u8);

impl LockBits {
	pub fn lb1_programmed(&self) -> bool {
		0 == self.0 & LOCK_BIT_1
	}

	pub fn lb2_programmed(&self) -> bool {
		0 == self.0 & LOCK_BIT_2
	}

	pub fn is_locked(&self) -> bool {
		self.lb1_programmed() || self.lb2_programmed()
	}
}

fn programmed(p: bool) -> &'static str {
	if p { "Programmed" } else { "Not Programmed" }
}

impl fmt::Display for LockBits {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		write!(f,
			"{:X} (LB1 {}, LB2 {})",
			self.0,
			programmed(self.lb1_programmed()),
			programmed(self.lb2_programmed()),
		)
	}
}

impl fmt::Debug for LockBits {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		write!(f, "0x{:02x} (", self.0)?;
		if self.lb1_programmed() { write!(f, " [LB1]")?; }
		if self.lb2_programmed() { write!(f, " [LB2]")?; }
		write!(f, " )")
	}
}
