use anyhow::{anyhow, Context};
use goblin::elf::{section_header, Elf};
use std::fs;
use std::path::Path;

/// The pieces of an ELF binary the simulator cares about: executable code for
/// the instruction memory and initialised/zeroed data for the data memory.
#[derive(Debug, Default)]
pub struct ElfImage {
    pub entry: u64,
    pub text_base: u64,
    pub text: Vec<u8>,
    /// (load address, bytes) for every allocatable non-executable section.
    pub data_sections: Vec<(u64, Vec<u8>)>,
}

pub fn load_elf(path: &Path) -> anyhow::Result<ElfImage> {
    let data = fs::read(path).with_context(|| format!("failed to read {:?}", path))?;
    parse_elf(&data).with_context(|| format!("failed to load ELF {:?}", path))
}

pub fn parse_elf(data: &[u8]) -> anyhow::Result<ElfImage> {
    let elf = Elf::parse(data)?;

    let mut image = ElfImage {
        entry: elf.entry,
        ..ElfImage::default()
    };

    // Executable sections merge into one contiguous instruction image.
    let mut exec_sections: Vec<(u64, Vec<u8>)> = vec![];

    for section in &elf.section_headers {
        if section.sh_size == 0 || section.sh_addr == 0 {
            continue;
        }
        if section.sh_flags & (section_header::SHF_ALLOC as u64) == 0 {
            continue;
        }

        let addr = section.sh_addr;
        let size = section.sh_size as usize;
        let is_exec = section.sh_flags & (section_header::SHF_EXECINSTR as u64) != 0;
        let is_nobits = section.sh_type == section_header::SHT_NOBITS;

        let bytes: Vec<u8> = if is_nobits {
            // implicitly zeroed, not present in the file
            vec![0u8; size]
        } else {
            let offset = section.sh_offset as usize;
            if offset + size > data.len() {
                return Err(anyhow!(
                    "invalid section bounds: offset {} size {}",
                    offset,
                    size
                ));
            }
            data[offset..offset + size].to_vec()
        };

        if is_exec {
            exec_sections.push((addr, bytes));
        } else {
            image.data_sections.push((addr, bytes));
        }
    }

    if exec_sections.is_empty() {
        return Err(anyhow!("no executable sections"));
    }

    exec_sections.sort_by_key(|(addr, _)| *addr);
    let base = exec_sections[0].0;
    let end = exec_sections
        .iter()
        .map(|(addr, bytes)| addr + bytes.len() as u64)
        .max()
        .unwrap();

    let mut text = vec![0u8; (end - base) as usize];
    for (addr, bytes) in &exec_sections {
        let start = (addr - base) as usize;
        text[start..start + bytes.len()].copy_from_slice(bytes);
    }

    image.text_base = base;
    image.text = text;
    Ok(image)
}
