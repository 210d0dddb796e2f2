//! Remote PE header and export table parsing

use crate::core::types::{Address, MirrorError, MirrorResult};
use crate::process::RemoteProcess;
use tracing::trace;

const DOS_SIGNATURE: u16 = 0x5A4D;
const NT_SIGNATURE: u32 = 0x0000_4550;
const PE32_MAGIC: u16 = 0x10B;
const PE32PLUS_MAGIC: u16 = 0x20B;
const FILE_HEADER_SIZE: usize = 20;
const EXPORT_NAME_MAX: usize = 256;
const MAX_EXPORTS: usize = 0x10000;

/// `IMAGE_FILE_HEADER.Machine`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Machine {
    I386,
    Amd64,
    Other(u16),
}

impl Machine {
    pub fn from_raw(raw: u16) -> Self {
        match raw {
            0x014C => Machine::I386,
            0x8664 => Machine::Amd64,
            other => Machine::Other(other),
        }
    }

    /// Pointer width for code built for this machine
    pub fn pointer_size(&self) -> Option<usize> {
        match self {
            Machine::I386 => Some(4),
            Machine::Amd64 => Some(8),
            Machine::Other(_) => None,
        }
    }
}

/// The parts of a mapped PE image the locator needs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeHeaders {
    pub base: Address,
    pub machine: Machine,
    pub size_of_image: u32,
    pub export_rva: u32,
    pub export_size: u32,
}

/// A named export resolved to an absolute address
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Export {
    pub name: String,
    pub address: Address,
}

/// Reads the DOS, NT and optional headers of the module mapped at `base`
pub fn read_headers(process: &RemoteProcess, base: Address) -> MirrorResult<PeHeaders> {
    if process.read_u16(base)? != DOS_SIGNATURE {
        return Err(MirrorError::invalid_pe("invalid DOS signature"));
    }
    let e_lfanew = process.read_u32(base + 0x3C)? as usize;
    if e_lfanew == 0 || e_lfanew > 0x1000 {
        return Err(MirrorError::invalid_pe(format!(
            "invalid e_lfanew offset 0x{:X}",
            e_lfanew
        )));
    }

    let nt = base + e_lfanew;
    if process.read_u32(nt)? != NT_SIGNATURE {
        return Err(MirrorError::invalid_pe("invalid PE signature"));
    }
    let machine = Machine::from_raw(process.read_u16(nt + 4)?);

    let optional = nt + 4 + FILE_HEADER_SIZE;
    let magic = process.read_u16(optional)?;
    let directories = match magic {
        PE32_MAGIC => optional + 96,
        PE32PLUS_MAGIC => optional + 112,
        other => {
            return Err(MirrorError::invalid_pe(format!(
                "unknown optional header magic 0x{:X}",
                other
            )))
        }
    };

    Ok(PeHeaders {
        base,
        machine,
        size_of_image: process.read_u32(optional + 56)?,
        export_rva: process.read_u32(directories)?,
        export_size: process.read_u32(directories + 4)?,
    })
}

/// Enumerates named exports; forwarded exports are skipped
pub fn exports(process: &RemoteProcess, headers: &PeHeaders) -> MirrorResult<Vec<Export>> {
    if headers.export_rva == 0 || headers.export_size == 0 {
        return Ok(Vec::new());
    }
    let base = headers.base;
    let directory = base + headers.export_rva as usize;
    let directory_end = directory + headers.export_size as usize;

    let function_count = process.read_u32(directory + 0x14)? as usize;
    let name_count = process.read_u32(directory + 0x18)? as usize;
    if function_count > MAX_EXPORTS || name_count > MAX_EXPORTS {
        return Err(MirrorError::invalid_pe(format!(
            "implausible export counts {} / {}",
            function_count, name_count
        )));
    }
    let functions = base + process.read_u32(directory + 0x1C)? as usize;
    let names = base + process.read_u32(directory + 0x20)? as usize;
    let ordinals = base + process.read_u32(directory + 0x24)? as usize;

    let name_rvas = process.read_bytes(names, name_count * 4)?;
    let ordinal_table = process.read_bytes(ordinals, name_count * 2)?;

    let mut exports = Vec::with_capacity(name_count);
    for i in 0..name_count {
        let ordinal =
            u16::from_le_bytes([ordinal_table[2 * i], ordinal_table[2 * i + 1]]) as usize;
        if ordinal >= function_count {
            continue;
        }
        let name_rva = u32::from_le_bytes([
            name_rvas[4 * i],
            name_rvas[4 * i + 1],
            name_rvas[4 * i + 2],
            name_rvas[4 * i + 3],
        ]) as usize;
        let rva = process.read_u32(functions + ordinal * 4)? as usize;
        let address = base + rva;
        if rva == 0 || (address >= directory && address < directory_end) {
            continue;
        }
        let name = process.read_c_string(base + name_rva, EXPORT_NAME_MAX)?;
        exports.push(Export { name, address });
    }
    trace!(base = %base, count = exports.len(), "Parsed export table");
    Ok(exports)
}

/// Resolves one export by exact name
pub fn find_export(
    process: &RemoteProcess,
    headers: &PeHeaders,
    name: &str,
) -> MirrorResult<Option<Address>> {
    Ok(exports(process, headers)?
        .into_iter()
        .find(|export| export.name == name)
        .map(|export| export.address))
}
