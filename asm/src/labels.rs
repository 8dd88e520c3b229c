//! The label table: written by the parser, read by the code generator.
//! Owned by the assembly pipeline; the VM never sees labels (spec §9).

use std::collections::HashMap;

pub type LabelTable = HashMap<String, u32>;
