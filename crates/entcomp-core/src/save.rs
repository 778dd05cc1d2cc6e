use crate::{error::SaveError, traits::Persisted};
use serde::{Deserialize, Serialize};
use serde_json::Value;

///
/// SaveRecord
///
/// One persisted entity: its class id, the layout revision it was written
/// with, and the field data. Records from older revisions load with missing
/// fields at their defaults; records from newer revisions are refused.
///

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct SaveRecord {
    pub id: u32,
    pub revision: u32,
    pub data: Value,
}

impl SaveRecord {
    pub fn encode<T: Persisted>(entity: &T) -> Result<Self, SaveError> {
        let data = serde_json::to_value(entity).map_err(|e| SaveError::Serialize(e.to_string()))?;

        Ok(Self {
            id: T::CLASS_ID,
            revision: T::REVISION,
            data,
        })
    }

    pub fn decode<T: Persisted>(&self) -> Result<T, SaveError> {
        if self.id != T::CLASS_ID {
            return Err(SaveError::ClassMismatch {
                expected: T::CLASS_ID,
                found: self.id,
            });
        }
        if self.revision > T::REVISION {
            return Err(SaveError::FutureRevision {
                entity: T::NAME,
                found: self.revision,
                current: T::REVISION,
            });
        }

        T::deserialize(&self.data).map_err(|e| SaveError::Deserialize(e.to_string()))
    }

    pub fn to_json(&self) -> Result<String, SaveError> {
        serde_json::to_string(self).map_err(|e| SaveError::Serialize(e.to_string()))
    }

    pub fn from_json(source: &str) -> Result<Self, SaveError> {
        serde_json::from_str(source).map_err(|e| SaveError::Deserialize(e.to_string()))
    }
}

///
/// TESTS
///
