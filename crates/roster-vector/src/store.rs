//! Combined vector + record store.

use std::collections::HashSet;

use roster_embeddings::Embedding;
use roster_types::Record;
use tracing::debug;

use crate::error::VectorError;
use crate::flat::FlatIndex;
use crate::index::{IndexStats, VectorIndex};

/// A search hit resolved to its record.
#[derive(Debug, Clone, Copy)]
pub struct Neighbor<'a> {
    pub position: usize,
    pub distance: f32,
    pub record: &'a Record,
}

/// Ordered sequence of `(vector, record)` pairs.
///
/// The vector at position `i` is the embedding of `records[i].content`. Both
/// halves are private and only grow together through [`IndexStore::push`].
#[derive(Debug, Clone)]
pub struct IndexStore {
    index: FlatIndex,
    records: Vec<Record>,
    ids: HashSet<String>,
    model: String,
}

impl IndexStore {
    /// Create an empty store for vectors of `dimension` produced by `model`.
    pub fn new(dimension: usize, model: impl Into<String>) -> Self {
        Self {
            index: FlatIndex::new(dimension),
            records: Vec::new(),
            ids: HashSet::new(),
            model: model.into(),
        }
    }

    /// Reassemble a store from already-paired halves.
    ///
    /// Fails with [`VectorError::Corruption`] if the halves differ in length or
    /// record ids repeat.
    pub fn from_parts(
        index: FlatIndex,
        records: Vec<Record>,
        model: impl Into<String>,
    ) -> Result<Self, VectorError> {
        if index.len() != records.len() {
            return Err(VectorError::Corruption(format!(
                "{} vectors but {} records",
                index.len(),
                records.len()
            )));
        }

        let mut ids = HashSet::with_capacity(records.len());
        for record in &records {
            if !ids.insert(record.id.clone()) {
                return Err(VectorError::Corruption(format!(
                    "record id {} appears twice",
                    record.id
                )));
            }
        }

        Ok(Self {
            index,
            records,
            ids,
            model: model.into(),
        })
    }

    /// Append one `(embedding, record)` pair and return its position.
    ///
    /// Nothing is modified when this returns an error.
    pub fn push(&mut self, embedding: &Embedding, record: Record) -> Result<usize, VectorError> {
        if self.ids.contains(&record.id) {
            return Err(VectorError::DuplicateId(record.id));
        }

        let position = self.index.add(embedding)?;
        debug_assert_eq!(position, self.records.len());

        self.ids.insert(record.id.clone());
        debug!(position, id = %record.id, "Stored record");
        self.records.push(record);
        Ok(position)
    }

    /// Up to `k` nearest records to `query`, by ascending distance.
    pub fn search(&self, query: &Embedding, k: usize) -> Result<Vec<Neighbor<'_>>, VectorError> {
        let hits = self.index.search(query, k)?;

        hits.into_iter()
            .map(|hit| {
                let record = self.records.get(hit.position).ok_or_else(|| {
                    VectorError::Corruption(format!("no record at position {}", hit.position))
                })?;
                Ok(Neighbor {
                    position: hit.position,
                    distance: hit.distance,
                    record,
                })
            })
            .collect()
    }

    /// Vector and record at `position`.
    pub fn get(&self, position: usize) -> Option<(&[f32], &Record)> {
        Some((self.index.get(position)?, self.records.get(position)?))
    }

    /// Iterate pairs in position order.
    pub fn iter(&self) -> impl Iterator<Item = (&[f32], &Record)> {
        self.index
            .as_slice()
            .chunks_exact(self.index.dimension().max(1))
            .zip(self.records.iter())
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn index(&self) -> &FlatIndex {
        &self.index
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn dimension(&self) -> usize {
        self.index.dimension()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn stats(&self) -> IndexStats {
        self.index.stats()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use roster_types::{GroupProfile, Profile};

    fn group(id: &str) -> Record {
        Record::new(
            format!("group_{}", id),
            format!("Group Name: {}.", id),
            Profile::Group(GroupProfile {
                group_id: id.to_string(),
                name: id.to_string(),
                level: "State".to_string(),
                description: String::new(),
                alternate_names: vec![],
            }),
        )
    }

    #[test]
    fn test_push_keeps_halves_aligned() {
        let mut store = IndexStore::new(2, "mock");
        assert_eq!(store.push(&Embedding::new(vec![0.0, 0.0]), group("a")).unwrap(), 0);
        assert_eq!(store.push(&Embedding::new(vec![1.0, 1.0]), group("b")).unwrap(), 1);

        assert_eq!(store.len(), 2);
        assert_eq!(store.index().len(), 2);

        let (vector, record) = store.get(1).unwrap();
        assert_eq!(vector, &[1.0, 1.0]);
        assert_eq!(record.id, "group_b");
    }

    #[test]
    fn test_failed_push_changes_nothing() {
        let mut store = IndexStore::new(2, "mock");
        store.push(&Embedding::new(vec![0.0, 0.0]), group("a")).unwrap();

        let wrong = store.push(&Embedding::new(vec![0.0; 3]), group("b"));
        assert!(matches!(wrong, Err(VectorError::DimensionMismatch { .. })));

        let dup = store.push(&Embedding::new(vec![1.0, 0.0]), group("a"));
        assert!(matches!(dup, Err(VectorError::DuplicateId(id)) if id == "group_a"));

        assert_eq!(store.len(), 1);
        assert_eq!(store.index().len(), 1);

        // The rejected id is still free.
        store.push(&Embedding::new(vec![1.0, 0.0]), group("b")).unwrap();
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_search_resolves_records() {
        let mut store = IndexStore::new(1, "mock");
        store.push(&Embedding::new(vec![0.0]), group("zero")).unwrap();
        store.push(&Embedding::new(vec![10.0]), group("ten")).unwrap();
        store.push(&Embedding::new(vec![3.0]), group("three")).unwrap();

        let neighbors = store.search(&Embedding::new(vec![2.0]), 2).unwrap();
        assert_eq!(neighbors.len(), 2);
        assert_eq!(neighbors[0].record.id, "group_three");
        assert_eq!(neighbors[0].position, 2);
        assert!((neighbors[0].distance - 1.0).abs() < 1e-6);
        assert_eq!(neighbors[1].record.id, "group_zero");
        assert!((neighbors[1].distance - 4.0).abs() < 1e-6);
    }

    #[test]
    fn test_from_parts_detects_drift() {
        let index = FlatIndex::from_raw(1, vec![0.0, 1.0]).unwrap();
        let result = IndexStore::from_parts(index, vec![group("a")], "mock");
        assert!(matches!(result, Err(VectorError::Corruption(_))));

        let index = FlatIndex::from_raw(1, vec![0.0, 1.0]).unwrap();
        let result = IndexStore::from_parts(index, vec![group("a"), group("a")], "mock");
        assert!(matches!(result, Err(VectorError::Corruption(_))));
    }

    #[test]
    fn test_iter_in_position_order() {
        let mut store = IndexStore::new(1, "mock");
        store.push(&Embedding::new(vec![5.0]), group("x")).unwrap();
        store.push(&Embedding::new(vec![6.0]), group("y")).unwrap();

        let pairs: Vec<(f32, &str)> = store
            .iter()
            .map(|(v, r)| (v[0], r.id.as_str()))
            .collect();
        assert_eq!(pairs, vec![(5.0, "group_x"), (6.0, "group_y")]);
    }
}
