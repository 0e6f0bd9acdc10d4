use std::time::Duration;

use super::{
	Hardware,
	Pin,
};

/// Number of clock cycles in one HVSP frame: start bit, 8 data bits, 2 stop bits
pub const FRAME_BITS: u32 = 11;

pub trait LowLevel: Hardware {
	// SDO goes high once the target is ready for the next instruction.
	//
	// Returns false if it didn't within `timeout`; that is not an error, the
	// caller just continues with whatever the line reads.
	fn wait_ready(&mut self, timeout: Duration) -> bool {
		let start = self.now();
		while !self.read_sdo() {
			if self.now() - start > timeout {
				warn!("SDO still low after {:?}, continuing anyway", timeout);
				return false;
			}
		}
		true
	}

	fn clock_pulse(&mut self) {
		self.set_pin(Pin::Sci, true);
		self.set_pin(Pin::Sci, false);
	}

	// clock `sdi` and `sii` out in parallel (highest bit first) while
	// sampling SDO before each rising clock edge.
	//
	// The frames are the bytes shifted left by 2: a leading 0 start bit
	// and two trailing 0 stop bits. The sampled frame is shifted back, so
	// the first sample (start bit) and the last two samples are dropped.
	//
	// There is no integrity check of any kind on the received data.
	fn transact(&mut self, sdi: u8, sii: u8, timeout: Duration) -> u8 {
		self.wait_ready(timeout);

		let sdi_frame = u16::from(sdi) << 2;
		let sii_frame = u16::from(sii) << 2;
		let mut input = 0u16;
		for bit in (0..FRAME_BITS).rev() {
			let bit_mask = 1u16 << bit;
			self.set_pin(Pin::Sdi, 0 != sdi_frame & bit_mask);
			self.set_pin(Pin::Sii, 0 != sii_frame & bit_mask);
			input <<= 1;
			if self.read_sdo() {
				input |= 1;
			}
			self.clock_pulse();
		}

		let result = (input >> 2) as u8;
		trace!("HVSP SDI 0x{:02x} SII 0x{:02x} -> SDO 0x{:02x} (frame 0x{:03x})", sdi, sii, result, input);
		result
	}
}

impl<H: Hardware + ?Sized> LowLevel for H {
}

#[cfg(test)]
mod test {
	use std::time::Duration;

	use super::{
		FRAME_BITS,
		LowLevel,
	};
	use crate::hvsp::simulator::{
		SimulatedTarget,
		Transaction,
	};

	const TIMEOUT: Duration = Duration::from_millis(300);

	#[test]
	fn clocks_eleven_cycles() {
		let mut sim = SimulatedTarget::new([0x1e, 0x93, 0x0b]);
		sim.transact(0x12, 0x34, TIMEOUT);
		assert_eq!(sim.clock_pulses, FRAME_BITS as usize);
		sim.transact(0xff, 0x00, TIMEOUT);
		assert_eq!(sim.clock_pulses, 2 * FRAME_BITS as usize);
	}

	#[test]
	fn sends_frames_msb_first() {
		let mut sim = SimulatedTarget::new([0x1e, 0x93, 0x0b]);
		sim.transact(0x80, 0x01, TIMEOUT);
		// start bit, then the data bits, then two stop bits
		assert_eq!(sim.sdi_bits, [false, true, false, false, false, false, false, false, false, false, false]);
		assert_eq!(sim.sii_bits, [false, false, false, false, false, false, false, false, true, false, false]);
		assert_eq!(sim.transactions, [Transaction { sdi: 0x80, sii: 0x01 }]);
	}

	#[test]
	fn drops_start_and_stop_samples() {
		let mut sim = SimulatedTarget::new([0x1e, 0x93, 0x0b]);

		sim.present_frame(0x7ff);
		assert_eq!(sim.transact(0, 0, TIMEOUT), 0xff);

		sim.present_frame(0x403);
		assert_eq!(sim.transact(0, 0, TIMEOUT), 0x00);

		sim.present_frame(0x404);
		assert_eq!(sim.transact(0, 0, TIMEOUT), 0x01);

		sim.present_frame(0x600);
		assert_eq!(sim.transact(0, 0, TIMEOUT), 0x80);
	}

	#[test]
	fn returns_every_byte_value() {
		let mut sim = SimulatedTarget::new([0x1e, 0x93, 0x0b]);
		for value in 0..=0xffu8 {
			sim.present_frame(0x400 | u16::from(value) << 2);
			assert_eq!(sim.transact(value, !value, TIMEOUT), value, "wrong result for 0x{:02x}", value);
		}
	}

	#[test]
	fn wait_ready_gives_up() {
		let mut sim = SimulatedTarget::new([0x1e, 0x93, 0x0b]);
		sim.stuck_low = true;
		let start = sim.elapsed();
		assert!(!sim.wait_ready(TIMEOUT));
		let waited = sim.elapsed() - start;
		assert!(waited > TIMEOUT);
		assert!(waited < TIMEOUT + Duration::from_millis(5));
	}

	#[test]
	fn transact_returns_with_sdo_stuck_low() {
		let mut sim = SimulatedTarget::new([0x1e, 0x93, 0x0b]);
		sim.stuck_low = true;
		for _ in 0..4 {
			assert_eq!(sim.transact(0x04, 0x4c, TIMEOUT), 0x00);
		}
		assert_eq!(sim.clock_pulses, 4 * FRAME_BITS as usize);
		assert!(sim.elapsed() < 4 * (TIMEOUT + Duration::from_millis(20)));
	}
}
