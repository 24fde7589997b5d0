//! Bounded transactions against amdgpu sysfs attributes.
//!
//! Every accessor opens one attribute file below a card's `device/`
//! directory, performs exactly one read or write, and lets the `File` close
//! on return. Eligibility checks collapse every failure to `false`; the
//! mutating calls hand the failure back for the diagnostic line.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::Path;

use tracing::debug;

use crate::error::SysfsError;
use crate::pp_table::PpTable;

/// `PP_OVERDRIVE_MASK` bit of `amdgpu.ppfeaturemask`
pub const PP_OVERDRIVE_MASK: u32 = 0x4000;
pub const VENDOR_ID_AMD: u16 = 0x1002;

pub(crate) const VENDOR: &str = "vendor";
pub(crate) const ENABLE: &str = "enable";
pub(crate) const PP_OD_CLK_VOLTAGE: &str = "pp_od_clk_voltage";
pub(crate) const PP_TABLE: &str = "pp_table";

/// Command understood by `pp_od_clk_voltage`: restore default clocks/voltages
const RESET_COMMAND: &[u8] = b"r";

/// Whether manual PP table overriding is enabled system-wide.
pub fn global_override_active(mask_path: &Path) -> bool {
    let mask = read_hex(mask_path).and_then(|mask| {
        u32::try_from(mask).map_err(|_| SysfsError::parse(mask_path, &format!("{mask:#x}")))
    });

    match mask {
        Ok(mask) => mask & PP_OVERDRIVE_MASK != 0,
        Err(e) => {
            debug!("Feature mask unavailable: {e}");
            false
        }
    }
}

pub fn is_amd_vendor(device_dir: &Path) -> bool {
    let path = device_dir.join(VENDOR);
    match read_hex(&path) {
        Ok(vendor) => u16::try_from(vendor).is_ok_and(|vendor| vendor == VENDOR_ID_AMD),
        Err(e) => {
            debug!("Vendor check failed: {e}");
            false
        }
    }
}

pub fn is_device_enabled(device_dir: &Path) -> bool {
    let path = device_dir.join(ENABLE);
    let content = match read_attribute(&path) {
        Ok(content) => content,
        Err(e) => {
            debug!("Enable check failed: {e}");
            return false;
        }
    };

    match leading_digits(content.trim_start()).parse::<u64>() {
        Ok(1) => true,
        Ok(0) => false,
        _ => {
            debug!("{}", SysfsError::parse(&path, &content));
            false
        }
    }
}

/// Write the reset command to `pp_od_clk_voltage`.
pub fn reset_clock_voltage(device_dir: &Path) -> Result<(), SysfsError> {
    let path = device_dir.join(PP_OD_CLK_VOLTAGE);
    write_once(&path, RESET_COMMAND)
}

/// Read the whole `pp_table` attribute. Any failure yields an empty table,
/// which callers must treat as "leave this device alone".
pub fn fetch_pp_table(device_dir: &Path) -> PpTable {
    let path = device_dir.join(PP_TABLE);
    match read_pp_table(&path) {
        Ok(table) => {
            debug!("Fetched {} byte PP table from {}", table.len(), path.display());
            table
        }
        Err(e) => {
            debug!("PP table fetch failed: {e}");
            PpTable::new()
        }
    }
}

/// Write `table` back to `pp_table` in a single transaction.
pub fn upload_pp_table(device_dir: &Path, table: &PpTable) -> Result<(), SysfsError> {
    let path = device_dir.join(PP_TABLE);
    if table.is_empty() {
        return Err(SysfsError::EmptyTable { path });
    }

    write_once(&path, table.as_slice())
}

fn read_pp_table(path: &Path) -> Result<PpTable, SysfsError> {
    let mut table = PpTable::new();
    let mut file = File::open(path).map_err(|e| SysfsError::io(path, e))?;

    let size = file
        .seek(SeekFrom::End(0))
        .map_err(|e| SysfsError::io(path, e))?;
    if size == 0 {
        return Err(SysfsError::EmptyTable {
            path: path.to_path_buf(),
        });
    }

    let position = file
        .seek(SeekFrom::Start(0))
        .map_err(|e| SysfsError::io(path, e))?;
    if position != 0 {
        return Err(SysfsError::RewindFailed {
            path: path.to_path_buf(),
            position,
        });
    }

    let capacity = usize::try_from(size).map_err(|_| {
        SysfsError::io(
            path,
            io::Error::new(io::ErrorKind::InvalidData, "table larger than address space"),
        )
    })?;
    table.allocate(capacity)?;

    let read = file
        .read(table.capacity_mut())
        .map_err(|e| SysfsError::io(path, e))?;
    if read == 0 {
        return Err(SysfsError::EmptyTable {
            path: path.to_path_buf(),
        });
    }

    table.set_size(isize::try_from(read).unwrap_or(isize::MAX))?;
    Ok(table)
}

/// Open an existing attribute and write to it once.
fn write_once(path: &Path, bytes: &[u8]) -> Result<(), SysfsError> {
    let mut file = OpenOptions::new()
        .write(true)
        .open(path)
        .map_err(|e| SysfsError::io(path, e))?;

    write_all_once(&mut file, path, bytes)
}

/// One `write` call; anything short of `bytes.len()` is a failure.
fn write_all_once<W: Write>(writer: &mut W, path: &Path, bytes: &[u8]) -> Result<(), SysfsError> {
    let written = writer.write(bytes).map_err(|e| SysfsError::io(path, e))?;
    if written != bytes.len() {
        return Err(SysfsError::ShortWrite {
            path: path.to_path_buf(),
            written,
            expected: bytes.len(),
        });
    }

    Ok(())
}

fn read_attribute(path: &Path) -> Result<String, SysfsError> {
    fs::read_to_string(path).map_err(|e| SysfsError::io(path, e))
}

/// Parse a hexadecimal attribute such as `0x1002\n`. Leading whitespace and
/// an `0x` prefix are accepted; parsing stops at the first non-hex character.
fn read_hex(path: &Path) -> Result<u64, SysfsError> {
    let content = read_attribute(path)?;
    parse_hex(&content).ok_or_else(|| SysfsError::parse(path, &content))
}

fn parse_hex(content: &str) -> Option<u64> {
    let s = content.trim_start();
    let s = s
        .strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s);
    let end = s
        .find(|c: char| !c.is_ascii_hexdigit())
        .unwrap_or(s.len());
    u64::from_str_radix(&s[..end], 16).ok()
}

fn leading_digits(s: &str) -> &str {
    let end = s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len());
    &s[..end]
}
