use std::env;
use std::error::Error;
use std::io::{self, Write};

use smbios::{Config, EntryPointDescriptor, ScanWindow, Smbios, TableStatus};

type Return = std::result::Result<(), Box<dyn Error>>;

macro_rules! brint {
    ($fmt:expr $(, $($arg:tt)* )?) => {{
        eprint!(concat!("\x1B[1;96m[DMIDUMP]\x1B[0m ", $fmt) $(,$($arg)* )*);
    }}
}

struct Logger;

impl log::Log for Logger {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &log::Record) {
        if self.enabled(record.metadata()) {
            brint!("{:<5} {}\n", record.level(), record.args());
        }
    }

    fn flush(&self) {}
}

static LOGGER: Logger = Logger;

fn init_logger(level: log::LevelFilter) -> Return {
    log::set_logger(&LOGGER).map_err(|e| e.to_string())?;
    log::set_max_level(level);
    Ok(())
}

fn print_help() -> Return {
    print!("Usage: dmidump [options]\n\n");
    println!("--sysfs DIR          kernel DMI table directory");
    println!("--systab FILE        EFI system table listing");
    println!("--mem FILE           physical memory device");
    println!("--scan-base ADDR     start of the anchor scan window");
    println!("--scan-length LEN    length of the anchor scan window");
    println!("-v, -vv              more logging");
    Ok(())
}

fn parse_number(arg: &str) -> std::result::Result<u64, Box<dyn Error>> {
    let value = match arg.strip_prefix("0x").or_else(|| arg.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16)?,
        None => arg.parse()?,
    };
    Ok(value)
}

fn parse_args(mut args: impl Iterator<Item = String>) -> std::result::Result<Option<(Config, log::LevelFilter)>, Box<dyn Error>> {
    let mut config = Config::default();
    let mut window: ScanWindow = config.scan_window;
    let mut level = log::LevelFilter::Warn;

    while let Some(arg) = args.next() {
        let mut value = || args.next().ok_or_else(|| format!("{} needs a value", arg));
        match arg.as_str() {
            "--sysfs" => config = config.with_sysfs_dir(value()?),
            "--systab" => config = config.with_efi_systab(value()?),
            "--mem" => config = config.with_memory_device(value()?),
            "--scan-base" => window.base = parse_number(&value()?)?,
            "--scan-length" => window.length = usize::try_from(parse_number(&value()?)?)?,
            "-v" => level = log::LevelFilter::Info,
            "-vv" => level = log::LevelFilter::Debug,
            "-h" | "--help" | "help" => return Ok(None),
            other => return Err(format!("unknown argument {}", other).into()),
        }
    }

    let config = config.with_scan_window(window);
    Ok(Some((config, level)))
}

fn dump_entry_point(ep: &EntryPointDescriptor, out: &mut impl Write) -> io::Result<()> {
    writeln!(out, "Entry point: {:?}", ep.kind)?;
    writeln!(out, "\tChecksum: 0x{:02X} ({})", ep.checksum, if ep.checksum_valid { "OK" } else { "invalid" })?;
    writeln!(out, "\tLength: {}", ep.length)?;
    writeln!(out, "\tVersion: {}", ep.version)?;
    writeln!(out, "\tRevision: {}", ep.revision)?;
    if let Some(docrev) = ep.docrev {
        writeln!(out, "\tDocument revision: {}", docrev)?;
    }
    if let Some(size) = ep.max_structure_size {
        writeln!(out, "\tMaximum structure size: {}", size)?;
    }
    if let (Some(sum), Some(valid)) = (ep.intermediate_checksum, ep.intermediate_valid) {
        writeln!(out, "\tIntermediate checksum: 0x{:02X} ({})", sum, if valid { "OK" } else { "invalid" })?;
    }
    if let Some(bcd) = ep.bcd_revision {
        writeln!(out, "\tBCD revision: 0x{:02X}", bcd)?;
    }
    match ep.structure_count {
        Some(count) => writeln!(out, "\tTable length: {}\n\tStructures: {}", ep.table_length, count)?,
        None => writeln!(out, "\tTable maximum size: {}", ep.table_length)?,
    }
    writeln!(out, "\tTable address: 0x{:08X}", ep.table_address)?;
    Ok(())
}

fn dump(smbios: &Smbios, out: &mut impl Write) -> io::Result<()> {
    if !smbios.is_available() {
        writeln!(out, "No SMBIOS table found.")?;
        return Ok(());
    }

    writeln!(out, "SMBIOS {} present.", smbios.version_string())?;
    if let Some(source) = smbios.source() {
        writeln!(out, "Source: {:?}", source)?;
    }
    if let Some(ep) = smbios.entry_point() {
        dump_entry_point(ep, out)?;
    }
    match smbios.table_address() {
        Some(address) => writeln!(out, "{} structures occupying {} bytes.\nTable at 0x{:08X}.", smbios.structures_count(), smbios.table_size(), address)?,
        None => writeln!(out, "{} structures occupying {} bytes.", smbios.structures_count(), smbios.table_size())?,
    }
    if let TableStatus::Partial(status) = smbios.status() {
        writeln!(out, "Table is damaged, stopped early: {:?}", status)?;
    }

    for s in smbios.structures() {
        writeln!(out)?;
        writeln!(out, "Handle 0x{:04X}, DMI type {}, {} bytes", s.header.handle, s.header.typ, s.header.length)?;
        if let Some(kind) = s.header.kind() {
            writeln!(out, "\t{:?}", kind)?;
        }
        for (i, text) in s.strings().enumerate() {
            writeln!(out, "\tString {}: {}", i + 1, String::from_utf8_lossy(text))?;
        }
    }

    Ok(())
}

fn main() -> Return {
    let (config, level) = match parse_args(env::args().skip(1))? {
        Some(x) => x,
        None => return print_help(),
    };

    init_logger(level)?;

    let smbios = Smbios::with_config(config);
    let stdout = io::stdout();
    dump(&smbios, &mut stdout.lock())?;
    Ok(())
}
