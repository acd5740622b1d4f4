//! Simulated controller for host tests
//!
//! [`SimChip`] implements [`RegisterIo`] over a sparse register map. Reads of
//! the T5 window pop queued messages (empty slots read as `0xFF`), reads of
//! T44 return the pending count followed by the first message. Every write
//! is logged and also lands in the register map.

use std::collections::{BTreeMap, VecDeque};
use std::vec::Vec;

use mxt_hal::RegisterIo;
use mxt_protocol::crc::{crc24, crc_bytes};
use mxt_protocol::object::{object_type, InfoBlock, ObjectEntry, ENTRY_SIZE, INFO_SIZE};

/// Bus failure injected by [`SimChip::fail_io`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimError;

/// Register-level model of a maXTouch
#[derive(Debug, Default)]
pub struct SimChip {
    regs: BTreeMap<u16, u8>,
    t5: Option<(u16, usize)>,
    t44: Option<u16>,
    messages: VecDeque<Vec<u8>>,
    writes: Vec<(u16, Vec<u8>)>,
    reads: Vec<(u16, usize)>,
    fail: bool,
}

impl SimChip {
    pub fn new() -> Self {
        Self::default()
    }

    /// Place an object table at address 0 and pick up the T5/T44 windows
    pub fn load_table(&mut self, table: &[u8]) {
        self.set_regs(0, table);

        let Ok(info) = InfoBlock::parse(table) else {
            return;
        };
        for chunk in table[INFO_SIZE..info.table_size().min(table.len())].chunks_exact(ENTRY_SIZE) {
            let Ok(entry) = ObjectEntry::parse(chunk) else {
                continue;
            };
            match entry.object_type {
                object_type::GEN_MESSAGE_T5 if self.t5.is_none() => {
                    let size = if info.messages_carry_crc() {
                        usize::from(entry.size)
                    } else {
                        usize::from(entry.size) - 1
                    };
                    self.t5 = Some((entry.start_address, size));
                }
                object_type::SPT_MESSAGECOUNT_T44 if self.t44.is_none() => {
                    self.t44 = Some(entry.start_address);
                }
                _ => {}
            }
        }
    }

    /// Preload registers
    pub fn set_regs(&mut self, addr: u16, data: &[u8]) {
        for (i, b) in data.iter().enumerate() {
            self.regs.insert(addr.wrapping_add(i as u16), *b);
        }
    }

    /// Register value
    pub fn reg(&self, addr: u16) -> u8 {
        self.regs.get(&addr).copied().unwrap_or(0)
    }

    /// Queue a message; short messages are padded with zeros
    pub fn push_message(&mut self, msg: &[u8]) {
        let size = self.t5.map(|(_, s)| s).unwrap_or(msg.len());
        let mut m = msg.to_vec();
        m.resize(size.max(msg.len()), 0);
        m.truncate(size);
        self.messages.push_back(m);
    }

    /// Messages not yet read
    pub fn pending(&self) -> usize {
        self.messages.len()
    }

    /// Make every following transfer fail
    pub fn fail_io(&mut self, fail: bool) {
        self.fail = fail;
    }

    /// All writes in order
    pub fn writes(&self) -> &[(u16, Vec<u8>)] {
        &self.writes
    }

    /// Payloads written to `addr`
    pub fn writes_to(&self, addr: u16) -> Vec<Vec<u8>> {
        self.writes
            .iter()
            .filter(|(a, _)| *a == addr)
            .map(|(_, d)| d.clone())
            .collect()
    }

    /// Reads issued at `addr` with their lengths
    pub fn reads_at(&self, addr: u16) -> Vec<usize> {
        self.reads
            .iter()
            .filter(|(a, _)| *a == addr)
            .map(|(_, len)| *len)
            .collect()
    }

    pub fn clear_log(&mut self) {
        self.writes.clear();
        self.reads.clear();
    }

    fn fill_messages(&mut self, buf: &mut [u8], msg_size: usize) {
        for slot in buf.chunks_mut(msg_size) {
            match self.messages.pop_front() {
                Some(msg) => {
                    let n = slot.len().min(msg.len());
                    slot[..n].copy_from_slice(&msg[..n]);
                    slot[n..].fill(0xFF);
                }
                None => slot.fill(0xFF),
            }
        }
    }
}

impl RegisterIo for SimChip {
    type Error = SimError;

    fn read(&mut self, addr: u16, buf: &mut [u8]) -> Result<(), SimError> {
        if self.fail {
            return Err(SimError);
        }
        self.reads.push((addr, buf.len()));

        match (self.t5, self.t44) {
            (Some((t5, size)), _) if addr == t5 => {
                self.fill_messages(buf, size);
            }
            (Some((_, size)), Some(t44)) if addr == t44 && !buf.is_empty() => {
                buf[0] = self.messages.len().min(255) as u8;
                self.fill_messages(&mut buf[1..], size);
            }
            _ => {
                for (i, b) in buf.iter_mut().enumerate() {
                    *b = self.reg(addr.wrapping_add(i as u16));
                }
            }
        }
        Ok(())
    }

    fn write(&mut self, addr: u16, data: &[u8]) -> Result<(), SimError> {
        if self.fail {
            return Err(SimError);
        }
        self.writes.push((addr, data.to_vec()));
        self.set_regs(addr, data);
        Ok(())
    }
}

/// Builds object tables with a valid CRC
#[derive(Debug, Clone)]
pub struct TableBuilder {
    info: InfoBlock,
    entries: Vec<ObjectEntry>,
}

impl Default for TableBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TableBuilder {
    pub fn new() -> Self {
        Self {
            info: InfoBlock {
                family: 0xA4,
                variant: 0x16,
                version: 0x21,
                build: 0xAA,
                matrix_x_size: 24,
                matrix_y_size: 14,
                num_objects: 0,
            },
            entries: Vec::new(),
        }
    }

    pub fn info(mut self, family: u8, version: u8) -> Self {
        self.info.family = family;
        self.info.version = version;
        self
    }

    pub fn object(
        self,
        object_type: u8,
        start_address: u16,
        size: u16,
        instances: u16,
        num_report_ids: u8,
    ) -> Self {
        self.entry(ObjectEntry {
            object_type,
            start_address,
            size,
            instances,
            num_report_ids,
        })
    }

    pub fn entry(mut self, entry: ObjectEntry) -> Self {
        self.entries.push(entry);
        self
    }

    pub fn build(&self) -> Vec<u8> {
        let mut info = self.info;
        info.num_objects = self.entries.len() as u8;

        let mut out = info.to_bytes().to_vec();
        for e in &self.entries {
            out.extend_from_slice(&e.to_bytes());
        }
        let crc = crc24(&out);
        out.extend_from_slice(&crc_bytes(crc));
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_t5_reads_pop_messages_then_invalid() {
        let mut chip = SimChip::new();
        chip.load_table(
            &TableBuilder::new()
                .object(object_type::GEN_MESSAGE_T5, 0x0100, 4, 1, 0)
                .build(),
        );
        chip.push_message(&[2, 0x80, 1]);

        let mut buf = [0u8; 6];
        chip.read(0x0100, &mut buf).unwrap();
        assert_eq!(buf, [2, 0x80, 1, 0xFF, 0xFF, 0xFF]);
        assert_eq!(chip.pending(), 0);
    }

    #[test]
    fn test_t44_prefixes_count() {
        let mut chip = SimChip::new();
        chip.load_table(
            &TableBuilder::new()
                .object(object_type::GEN_MESSAGE_T5, 0x0100, 4, 1, 0)
                .object(object_type::SPT_MESSAGECOUNT_T44, 0x00F0, 1, 1, 0)
                .build(),
        );
        chip.push_message(&[3, 1, 2]);
        chip.push_message(&[4, 5, 6]);

        let mut buf = [0u8; 3];
        chip.read(0x00F0, &mut buf).unwrap();
        assert_eq!(buf, [2, 3, 1]);
        assert_eq!(chip.pending(), 1);
    }

    #[test]
    fn test_writes_logged_and_stored() {
        let mut chip = SimChip::new();
        chip.write(0x0200, &[1, 2]).unwrap();
        assert_eq!(chip.reg(0x0201), 2);
        assert_eq!(chip.writes_to(0x0200), vec![vec![1, 2]]);
    }

    #[test]
    fn test_failure_injection() {
        let mut chip = SimChip::new();
        chip.fail_io(true);
        assert_eq!(chip.write(0, &[0]), Err(SimError));
    }
}
