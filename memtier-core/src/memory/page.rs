//! Resident state of one variable.

/// One named variable and the virtual time it was last touched.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Page {
    pub id: String,
    pub value: u32,
    /// Clock value of the most recent Store or Lookup.
    pub last_access: u64,
}

impl Page {
    pub fn new(id: impl Into<String>, value: u32, last_access: u64) -> Self {
        Self {
            id: id.into(),
            value,
            last_access,
        }
    }
}

/// Which tier currently holds a page.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Residency {
    Memory,
    Disk,
}
