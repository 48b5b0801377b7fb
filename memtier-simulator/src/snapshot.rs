//! Final disk contents.

use std::fmt;
use std::io::{self, Write};

/// `(id, value)` for every page left on disk, ordered by id. Pages still in
/// main memory when the simulation ends are not part of it.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DiskSnapshot {
    entries: Vec<(String, u32)>,
}

impl DiskSnapshot {
    pub fn new(entries: Vec<(String, u32)>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[(String, u32)] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<u32> {
        self.entries
            .iter()
            .find(|(entry, _)| entry == id)
            .map(|(_, value)| *value)
    }

    /// Writes one `<id> <value>` line per entry.
    pub fn write_to<W: Write>(&self, mut writer: W) -> io::Result<()> {
        for (id, value) in &self.entries {
            writeln!(writer, "{id} {value}")?;
        }
        writer.flush()
    }
}

impl From<Vec<(String, u32)>> for DiskSnapshot {
    fn from(entries: Vec<(String, u32)>) -> Self {
        Self::new(entries)
    }
}

impl fmt::Display for DiskSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (id, value) in &self.entries {
            writeln!(f, "{id} {value}")?;
        }
        Ok(())
    }
}
