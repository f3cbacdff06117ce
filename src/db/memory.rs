// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-process document store with Firestore-like semantics: documents are
//! JSON objects addressed by (collection, id), writes replace the document.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde::{de::DeserializeOwned, Serialize};

use crate::error::AppError;

#[derive(Default)]
pub(crate) struct MemoryStore {
    docs: DashMap<(String, String), serde_json::Value>,
}

impl MemoryStore {
    pub(crate) fn get<T: DeserializeOwned>(
        &self,
        collection: &str,
        id: &str,
    ) -> Result<Option<T>, AppError> {
        self.docs
            .get(&(collection.to_string(), id.to_string()))
            .map(|doc| serde_json::from_value(doc.value().clone()))
            .transpose()
            .map_err(|e| AppError::Database(e.to_string()))
    }

    pub(crate) fn put<T: Serialize>(
        &self,
        collection: &str,
        id: &str,
        obj: &T,
    ) -> Result<(), AppError> {
        let value = serde_json::to_value(obj).map_err(|e| AppError::Database(e.to_string()))?;
        self.docs
            .insert((collection.to_string(), id.to_string()), value);
        Ok(())
    }

    /// Store `obj` only if no document with this id exists yet.
    ///
    /// Returns false (and leaves the existing document alone) otherwise.
    pub(crate) fn insert_new<T: Serialize>(
        &self,
        collection: &str,
        id: &str,
        obj: &T,
    ) -> Result<bool, AppError> {
        let value = serde_json::to_value(obj).map_err(|e| AppError::Database(e.to_string()))?;
        match self.docs.entry((collection.to_string(), id.to_string())) {
            Entry::Occupied(_) => Ok(false),
            Entry::Vacant(slot) => {
                slot.insert(value);
                Ok(true)
            }
        }
    }

    /// Returns true if a document was removed.
    pub(crate) fn delete(&self, collection: &str, id: &str) -> bool {
        self.docs
            .remove(&(collection.to_string(), id.to_string()))
            .is_some()
    }

    /// All documents of a collection, in no particular order.
    pub(crate) fn all<T: DeserializeOwned>(&self, collection: &str) -> Result<Vec<T>, AppError> {
        self.docs
            .iter()
            .filter(|entry| entry.key().0 == collection)
            .map(|entry| serde_json::from_value(entry.value().clone()))
            .collect::<Result<Vec<T>, _>>()
            .map_err(|e| AppError::Database(e.to_string()))
    }
}
