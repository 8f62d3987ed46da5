//! Per procedure data kept between invocations.
//!
//! Records are stored as opaque bytes under a string key. Bend parameters travel as a fixed
//! layout [`StoredValues`] record, so the encoded size identifies the record layout.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use bincode::{Decode, Encode};
use serde::{Deserialize, Serialize};

use crate::curve::{
    BendParameters, ControlCurve, ControlPoints, CurveType, Outline, CURVE_SAMPLES, MAX_POINTS,
};
use crate::iteration::IterationState;

/// Key of the last values of the bend procedure.
pub const PROCEDURE_KEY: &str = "plug-in-curve-bend";
/// Key of the parameters at the first step of an animated run.
pub const ITER_FROM_KEY: &str = "plug_in_curve_bend_ITER_FROM";
/// Key of the parameters at the last step of an animated run.
pub const ITER_TO_KEY: &str = "plug_in_curve_bend_ITER_TO";

/// An error type for the parameter store.
#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    /// The store file could not be read or written.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// A record could not be encoded.
    #[error(transparent)]
    Encode(#[from] bincode::error::EncodeError),

    /// A record could not be decoded.
    #[error(transparent)]
    Decode(#[from] bincode::error::DecodeError),

    /// The store file is not valid JSON.
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// A record has a different size than the expected layout.
    #[error("Record {key} has {actual} bytes, expected {expected}")]
    SizeMismatch {
        /// Key of the record.
        key: String,
        /// Size of the expected layout.
        expected: usize,
        /// Size found in the store.
        actual: usize,
    },
}

fn config() -> impl bincode::config::Config {
    bincode::config::standard().with_fixed_int_encoding()
}

/// The fixed layout record of one parameter set plus the iteration position.
#[derive(Debug, Clone, Copy, PartialEq, Encode, Decode)]
pub struct StoredValues {
    /// Freehand samples, upper then lower.
    pub curve: [[u8; CURVE_SAMPLES]; 2],
    /// Control points `[x, y]`, upper then lower, `-1` marks unused slots.
    pub points: [[[f64; 2]; MAX_POINTS]; 2],
    /// `0` smooth, `1` freehand.
    pub curve_type: i32,
    /// Smoothing switch.
    pub smoothing: bool,
    /// Antialiasing switch.
    pub antialias: bool,
    /// Work on a copy switch.
    pub work_on_copy: bool,
    /// Rotation in degrees.
    pub rotation: f64,
    /// Steps of an animated run, `0` for a plain run.
    pub total_steps: i32,
    /// Current step of an animated run.
    pub current_step: f64,
}

impl StoredValues {
    /// Encoded size of every record.
    pub const ENCODED_LEN: usize = 2 * CURVE_SAMPLES + 2 * MAX_POINTS * 2 * 8 + 4 + 3 + 8 + 4 + 8;

    /// Record a parameter set at an iteration position.
    pub fn new(params: &BendParameters, state: IterationState) -> Self {
        Self {
            curve: [params.upper.samples, params.lower.samples],
            points: [params.upper.points.to_sentinel(), params.lower.points.to_sentinel()],
            curve_type: params.curve_type.code(),
            smoothing: params.smoothing,
            antialias: params.antialias,
            work_on_copy: params.work_on_copy,
            rotation: params.rotation,
            total_steps: state.total_steps,
            current_step: state.current_step,
        }
    }

    /// The parameter set of the record.
    pub fn parameters(&self) -> BendParameters {
        let curve = |i: usize| ControlCurve {
            points: ControlPoints::from_sentinel(&self.points[i]),
            samples: self.curve[i],
        };
        BendParameters {
            upper: curve(Outline::Upper.index()),
            lower: curve(Outline::Lower.index()),
            curve_type: CurveType::from_code(self.curve_type),
            smoothing: self.smoothing,
            antialias: self.antialias,
            work_on_copy: self.work_on_copy,
            rotation: self.rotation,
        }
    }

    /// The iteration position of the record.
    pub fn iteration_state(&self) -> IterationState {
        IterationState::new(self.total_steps, self.current_step)
    }

    /// Encode into the fixed layout.
    pub fn encode(&self) -> Result<Vec<u8>, StoreError> {
        Ok(bincode::encode_to_vec(self, config())?)
    }

    /// Decode a record, rejecting data of any other size.
    pub fn decode(key: &str, bytes: &[u8]) -> Result<Self, StoreError> {
        if bytes.len() != Self::ENCODED_LEN {
            return Err(StoreError::SizeMismatch {
                key: key.to_string(),
                expected: Self::ENCODED_LEN,
                actual: bytes.len(),
            });
        }
        let (values, _) = bincode::decode_from_slice(bytes, config())?;
        Ok(values)
    }
}

/// Keyed byte records, persisted as JSON.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParameterStore {
    records: BTreeMap<String, Vec<u8>>,
}

impl ParameterStore {
    /// An empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store raw bytes under `key`.
    pub fn set_data(&mut self, key: &str, data: Vec<u8>) {
        self.records.insert(key.to_string(), data);
    }

    /// Raw bytes stored under `key`.
    pub fn get_data(&self, key: &str) -> Option<&[u8]> {
        self.records.get(key).map(Vec::as_slice)
    }

    /// Store a parameter record under `key`.
    pub fn store_values(&mut self, key: &str, values: &StoredValues) -> Result<(), StoreError> {
        self.set_data(key, values.encode()?);
        log::debug!("stored values under {key}");
        Ok(())
    }

    /// The parameter record stored under `key`, `None` when there is none.
    pub fn retrieve_values(&self, key: &str) -> Result<Option<StoredValues>, StoreError> {
        self.get_data(key)
            .map(|bytes| StoredValues::decode(key, bytes))
            .transpose()
    }

    /// Write the store to a JSON file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), StoreError> {
        let mut w = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(&mut w, self)?;
        w.flush()?;
        Ok(())
    }

    /// Read a store from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let reader = BufReader::new(File::open(path)?);
        Ok(serde_json::from_reader(reader)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_params() -> BendParameters {
        let mut params = BendParameters {
            curve_type: CurveType::Freehand,
            rotation: 33.5,
            work_on_copy: true,
            ..Default::default()
        };
        params.upper.points.set(4, Some((0.25, 0.75)));
        params.lower.samples[9] = 0;
        params
    }

    #[test]
    fn layout_has_fixed_size() -> Result<(), StoreError> {
        let a = StoredValues::new(&BendParameters::default(), IterationState::default());
        let b = StoredValues::new(&sample_params(), IterationState::new(12, 3.5));
        assert_eq!(a.encode()?.len(), StoredValues::ENCODED_LEN);
        assert_eq!(b.encode()?.len(), StoredValues::ENCODED_LEN);
        Ok(())
    }

    #[test]
    fn values_round_trip() -> Result<(), StoreError> {
        let params = sample_params();
        let values = StoredValues::new(&params, IterationState::new(5, 2.0));

        let mut store = ParameterStore::new();
        store.store_values(PROCEDURE_KEY, &values)?;
        let restored = store
            .retrieve_values(PROCEDURE_KEY)?
            .ok_or(StoreError::SizeMismatch {
                key: PROCEDURE_KEY.into(),
                expected: 0,
                actual: 0,
            })?;

        assert_eq!(restored, values);
        assert_eq!(restored.parameters(), params);
        assert_eq!(restored.iteration_state(), IterationState::new(5, 2.0));
        Ok(())
    }

    #[test]
    fn missing_and_foreign_records() -> Result<(), StoreError> {
        let mut store = ParameterStore::new();
        assert_eq!(store.retrieve_values(ITER_FROM_KEY)?, None);

        store.set_data(ITER_FROM_KEY, vec![1, 2, 3]);
        assert!(matches!(
            store.retrieve_values(ITER_FROM_KEY),
            Err(StoreError::SizeMismatch { actual: 3, .. })
        ));
        Ok(())
    }

    #[test]
    fn json_file_round_trip() -> Result<(), Box<dyn std::error::Error>> {
        let mut store = ParameterStore::new();
        store.store_values(
            ITER_TO_KEY,
            &StoredValues::new(&sample_params(), IterationState::default()),
        )?;
        store.set_data("other", vec![42]);

        let dir = tempfile::tempdir()?;
        let path = dir.path().join("store.json");
        store.save(&path)?;
        assert_eq!(ParameterStore::load(&path)?, store);
        Ok(())
    }
}
