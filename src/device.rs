use std::fmt;

use crate::hvsp::FuseBank;

/// Device signature bytes 1 and 2, big endian
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Signature(pub u16);

impl fmt::Display for Signature {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		write!(f, "{:04X}", self.0)
	}
}

impl fmt::Debug for Signature {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		write!(f, "Signature(0x{:04x})", self.0)
	}
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct DeviceProfile {
	pub name: &'static str,
	pub signature: Signature,
	pub pin_count: u8,
	/// fuses (re)written in "write defaults" mode, in this order
	pub fuse_defaults: &'static [(FuseBank, u8)],
}

// ATtiny13 has no extended fuse
const TINY13_DEFAULTS: &[(FuseBank, u8)] = &[
	(FuseBank::Low, 0x6a),
	(FuseBank::High, 0xff),
];

// written for the whole family, even for devices without an extended fuse
const TINY_X4_X5_DEFAULTS: &[(FuseBank, u8)] = &[
	(FuseBank::Low, 0x62),
	(FuseBank::High, 0xdf),
	(FuseBank::Extended, 0xff),
];

pub static KNOWN_DEVICES: [DeviceProfile; 7] = [
	DeviceProfile { name: "ATtiny13/ATtiny13A", signature: Signature(0x9007), pin_count: 8, fuse_defaults: TINY13_DEFAULTS },
	DeviceProfile { name: "ATtiny24", signature: Signature(0x910b), pin_count: 14, fuse_defaults: TINY_X4_X5_DEFAULTS },
	DeviceProfile { name: "ATtiny25", signature: Signature(0x9108), pin_count: 8, fuse_defaults: TINY_X4_X5_DEFAULTS },
	DeviceProfile { name: "ATtiny44", signature: Signature(0x9207), pin_count: 14, fuse_defaults: TINY_X4_X5_DEFAULTS },
	DeviceProfile { name: "ATtiny45", signature: Signature(0x9206), pin_count: 8, fuse_defaults: TINY_X4_X5_DEFAULTS },
	DeviceProfile { name: "ATtiny84", signature: Signature(0x930c), pin_count: 14, fuse_defaults: TINY_X4_X5_DEFAULTS },
	DeviceProfile { name: "ATtiny85", signature: Signature(0x930b), pin_count: 8, fuse_defaults: TINY_X4_X5_DEFAULTS },
];

pub fn lookup(signature: Signature) -> Option<&'static DeviceProfile> {
	KNOWN_DEVICES.iter().find(|device| device.signature == signature)
}
