/*
 * Robin mail transfer agent
 *
 * Licensed under the Elastic License 2.0
 *
 * You should have received a copy of the Elastic License 2.0 along with
 * this program. If not, see https://www.elastic.co/licensing/elastic-license.
 *
 */

use serde::{de::Deserializer, ser::Serializer, Deserialize, Serialize};
use std::sync::{Arc, RwLock};

pub mod arc_rwlock {
    pub use super::*;

    pub fn serialize<S, T>(val: &Arc<RwLock<T>>, s: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
        T: Serialize,
    {
        T::serialize(&*val.read().unwrap(), s)
    }

    pub fn deserialize<'de, D, T>(d: D) -> Result<Arc<RwLock<T>>, D::Error>
    where
        D: Deserializer<'de>,
        T: Deserialize<'de>,
    {
        Ok(Arc::new(RwLock::new(T::deserialize(d)?)))
    }
}

pub mod arc_option {
    pub use super::*;

    pub fn serialize<S, T>(val: &Option<Arc<T>>, s: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
        T: Serialize,
    {
        match val {
            Some(val) => T::serialize(val, s),
            None => Option::serialize(&None::<T>, s),
        }
    }

    pub fn deserialize<'de, D, T>(d: D) -> Result<Option<Arc<T>>, D::Error>
    where
        D: Deserializer<'de>,
        T: Deserialize<'de>,
    {
        Option::<T>::deserialize(d)?.map_or_else(|| Ok(None), |val| Ok(Some(Arc::new(val))))
    }
}

/// Same trick as `arc_rwlock`, for a plain `Arc<Vec<u8>>` payload buffer —
/// shared cheaply across a session's clones rather than deep-copied.
pub mod arc_bytes {
    pub use super::*;

    pub fn serialize<S>(val: &Arc<Vec<u8>>, s: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serde_bytes_as_vec(val, s)
    }

    fn serde_bytes_as_vec<S>(val: &[u8], s: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        <Vec<u8> as Serialize>::serialize(&val.to_vec(), s)
    }

    pub fn deserialize<'de, D>(d: D) -> Result<Arc<Vec<u8>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(Arc::new(Vec::<u8>::deserialize(d)?))
    }
}
