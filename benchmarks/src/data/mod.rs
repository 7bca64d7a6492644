pub mod synthetic;

pub use synthetic::{SyntheticTable, SyntheticTarget};
