#[macro_use]
extern crate clap;
#[macro_use]
extern crate failure;
#[macro_use]
extern crate log;

extern crate hvsp_fuse_reset;
use hvsp_fuse_reset::*;

use std::process::exit;

use hvsp_fuse_reset::config::parse_byte;
use hvsp_fuse_reset::gpio::GpioHardware;
use hvsp_fuse_reset::hvsp::{
	FuseBank,
	HvspOperations,
	ProgrammingMode,
	enter_programming_mode,
};

fn get_param<T>(matches: &clap::ArgMatches, name: &str) -> AResult<T>
where
	T: std::str::FromStr,
	failure::Error: From<<T as std::str::FromStr>::Err>,
{
	let param = match matches.value_of(name) {
		Some(p) => p,
		None => bail!("missing parameter {}", name),
	};
	param.parse::<T>().map_err(|e| {
		let e = failure::Error::from(e);
		let msg = format!("invalid parameter {}: {}", name, e);
		e.context(msg).into()
	})
}

fn get_byte(matches: &clap::ArgMatches, name: &str) -> AResult<u8> {
	match matches.value_of(name) {
		Some(p) => parse_byte(p),
		None => bail!("missing parameter {}", name),
	}
}

// power the target up, run `f` in programming mode, power down again
fn with_target<F, R>(matches: &clap::ArgMatches, f: F) -> AResult<R>
where
	F: FnOnce(&mut ProgrammingMode<&mut GpioHardware>) -> AResult<R>,
{
	let config = Config::from_params(|name| matches.value_of(name).map(String::from))?;
	let mut hardware = gpio::open_hvsp(&config.chip, &config.pins)?;

	let mut target = enter_programming_mode(&mut hardware, &config.timing);
	let result = f(&mut target);
	target.power_down();
	result
}

fn signature(matches: &clap::ArgMatches) -> AResult<()> {
	with_target(matches, |target| {
		let signature = target.read_signature();
		match device::lookup(signature) {
			Some(device) => println!("{} ({})", signature, device.name),
			None => println!("{} (unknown)", signature),
		}
		Ok(())
	})
}

fn read(matches: &clap::ArgMatches) -> AResult<()> {
	with_target(matches, |target| {
		println!("{}", target.read_fuses());
		println!("Lock: {}", target.read_lock_bits());
		Ok(())
	})
}

fn write_fuse(matches: &clap::ArgMatches, sub_m: &clap::ArgMatches) -> AResult<()> {
	let bank: FuseBank = get_param(sub_m, "BANK")?;
	let value = get_byte(sub_m, "VALUE")?;

	with_target(matches, |target| {
		target.write_fuse(bank.address(), value);
		let fuses = target.read_fuses();
		let read_back = fuses.get(bank);
		ensure!(read_back == value,
			"Verify failed for {}: wrote 0x{:02x}, read 0x{:02x}", bank, value, read_back
		);
		println!("{}", fuses);
		Ok(())
	})
}

fn erase(matches: &clap::ArgMatches) -> AResult<()> {
	with_target(matches, |target| {
		target.erase_flash_and_lock_bits();
		println!("Lock: {}", target.read_lock_bits());
		Ok(())
	})
}

fn transact(matches: &clap::ArgMatches, sub_m: &clap::ArgMatches) -> AResult<()> {
	let sdi = get_byte(sub_m, "SDI")?;
	let sii = get_byte(sub_m, "SII")?;

	with_target(matches, |target| {
		let sdo = target.transact(sdi, sii);
		println!("SDI 0x{:02x} SII 0x{:02x} -> SDO 0x{:02x}", sdi, sii, sdo);
		Ok(())
	})
}

fn main_app() -> AResult<()> {
	let matches = clap_app!(@app (app_from_crate!())
		(@setting SubcommandRequiredElseHelp)
		(global_setting: clap::AppSettings::VersionlessSubcommands)
		(@arg vcc: --vcc +takes_value +required "GPIO line switching target VCC")
		(@arg reset: --reset +takes_value +required "GPIO line driving the (inverting) 12V level shifter for !RESET")
		(@arg sdi: --sdi +takes_value +required "GPIO line to target SDI (data in)")
		(@arg sii: --sii +takes_value +required "GPIO line to target SII (instruction in)")
		(@arg sdo: --sdo +takes_value +required "GPIO line from target SDO (data out)")
		(@arg sci: --sci +takes_value +required "GPIO line to target SCI (clock)")
		(@arg timeout: --timeout +takes_value "milliseconds to wait for SDO before each instruction (default 300)")
		(@arg chip: --chip +takes_value "GPIO chip number or device (default /dev/gpiochip0)")
		(@subcommand signature =>
			(about: "read the device signature")
		)
		(@subcommand read =>
			(about: "read fuses and lock bits")
		)
		(@subcommand write_fuse =>
			(about: "write a single fuse byte and read it back")
			(@arg BANK: +required "fuse bank: low, high or extended")
			(@arg VALUE: +required "fuse value (0x.. for hex)")
		)
		(@subcommand erase =>
			(about: "erase flash and lock bits")
		)
		(@subcommand transact =>
			(about: "send a single raw HVSP instruction")
			(@arg SDI: +required "data byte (0x.. for hex)")
			(@arg SII: +required "instruction byte (0x.. for hex)")
		)
	).get_matches();

	match matches.subcommand() {
		("signature", _) => {
			signature(&matches)
		}
		("read", _) => {
			read(&matches)
		}
		("write_fuse", Some(sub_m)) => {
			write_fuse(&matches, sub_m)
		}
		("erase", _) => {
			erase(&matches)
		}
		("transact", Some(sub_m)) => {
			transact(&matches, sub_m)
		}
		("", _) => bail!("no subcommand"),
		(cmd, _) => bail!("not implemented subcommand {:?}", cmd),
	}
}

fn main() {
	env_logger::from_env(env_logger::Env::default().default_filter_or("info")).init();

	if let Err(e) = main_app() {
		error!("Error: {}", e);
		exit(1);
	}
}
