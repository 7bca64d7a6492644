//! Serialization of fitted preprocessing state.
//!
//! Fitted parameters (normalization statistics, label lists, ordinal
//! vocabularies) are plain numeric/string data and can be stored without
//! coupling to the matrices they were computed from.

use crate::error::PipelineError;
use std::path::Path;

/// A parameter representation that can be serialized to and from bytes.
///
/// Implementors should contain only plain data (e.g. `Vec<f64>`, label
/// strings), never borrowed matrices.
pub trait SerializableParams: Sized {
    /// Serialize the parameters into a byte buffer.
    fn to_bytes(&self) -> Result<Vec<u8>, PipelineError>;

    /// Deserialize the parameters from a byte buffer.
    fn from_bytes(bytes: &[u8]) -> Result<Self, PipelineError>;

    /// Write the serialized parameters to `path`.
    fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), PipelineError> {
        let bytes = self.to_bytes()?;
        std::fs::write(path, bytes)?;
        Ok(())
    }

    /// Read parameters previously written by [`SerializableParams::save_to_file`].
    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, PipelineError> {
        let bytes = std::fs::read(path)?;
        Self::from_bytes(&bytes)
    }
}

impl<T> SerializableParams for T
where
    T: serde::Serialize + for<'de> serde::Deserialize<'de>,
{
    fn to_bytes(&self) -> Result<Vec<u8>, PipelineError> {
        Ok(bincode::serialize(self)?)
    }

    fn from_bytes(bytes: &[u8]) -> Result<Self, PipelineError> {
        Ok(bincode::deserialize(bytes)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Stats {
        mean: Vec<f64>,
        labels: Vec<String>,
    }

    #[test]
    fn test_bytes_round_trip() {
        let stats = Stats {
            mean: vec![1.5, -2.0],
            labels: vec!["A".into(), "B".into()],
        };
        let bytes = stats.to_bytes().unwrap();
        assert_eq!(Stats::from_bytes(&bytes).unwrap(), stats);
    }

    #[test]
    fn test_from_bytes_rejects_garbage() {
        let result = Stats::from_bytes(&[0xff, 0xff, 0xff]);
        assert!(matches!(result, Err(PipelineError::Serialization(_))));
    }

    #[test]
    fn test_save_load_file() {
        let stats = Stats {
            mean: vec![0.25],
            labels: vec![],
        };
        let temp_file = std::env::temp_dir().join("tabular_nn_test_stats.bin");
        stats.save_to_file(&temp_file).unwrap();
        let loaded = Stats::load_from_file(&temp_file).unwrap();
        assert_eq!(loaded, stats);
        std::fs::remove_file(temp_file).ok();
    }
}
