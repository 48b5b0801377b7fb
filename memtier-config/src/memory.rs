//! Main memory sizing.

use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Default, Debug, Serialize, Deserialize, Validate, Clone, PartialEq, Eq)]
pub struct MemoryConfig {
    /// Number of pages main memory can hold. When unset the value is read
    /// from the `memconfig` file.
    #[serde(default)]
    pub capacity: Option<usize>,
}
