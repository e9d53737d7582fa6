use std::collections::{BTreeMap, HashMap};
use std::sync::RwLock;

use crate::vector_store::{
    BoxFuture, Payload, ScoredVectorPoint, VectorPoint, VectorStore, VectorStoreError,
};

struct StoredPoint {
    vector: Vec<f32>,
    payload: Payload,
}

struct InMemoryCollection {
    dimension: u64,
    points: HashMap<String, StoredPoint>,
}

/// Brute-force cosine store used by tests and the `mock` feature.
pub struct InMemoryVectorStore {
    collections: RwLock<BTreeMap<String, InMemoryCollection>>,
}

impl InMemoryVectorStore {
    #[must_use]
    pub fn new() -> Self {
        Self {
            collections: RwLock::new(BTreeMap::new()),
        }
    }

    /// Number of points in `collection`, or `None` if it does not exist.
    #[must_use]
    pub fn point_count(&self, collection: &str) -> Option<usize> {
        self.collections
            .read()
            .ok()?
            .get(collection)
            .map(|c| c.points.len())
    }

    /// Payloads of every point in `collection`, in unspecified order.
    #[must_use]
    pub fn payloads(&self, collection: &str) -> Vec<Payload> {
        self.collections
            .read()
            .ok()
            .and_then(|cols| {
                cols.get(collection)
                    .map(|c| c.points.values().map(|p| p.payload.clone()).collect())
            })
            .unwrap_or_default()
    }

    /// Ids of every point in `collection`, sorted.
    #[must_use]
    pub fn ids(&self, collection: &str) -> Vec<String> {
        let mut ids: Vec<String> = self
            .collections
            .read()
            .ok()
            .and_then(|cols| cols.get(collection).map(|c| c.points.keys().cloned().collect()))
            .unwrap_or_default();
        ids.sort();
        ids
    }
}

impl Default for InMemoryVectorStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for InMemoryVectorStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryVectorStore").finish_non_exhaustive()
    }
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

impl VectorStore for InMemoryVectorStore {
    fn list_collections(&self) -> BoxFuture<'_, Result<Vec<String>, VectorStoreError>> {
        Box::pin(async move {
            let cols = self
                .collections
                .read()
                .map_err(|e| VectorStoreError::Connection(e.to_string()))?;
            Ok(cols.keys().cloned().collect())
        })
    }

    fn collection_exists(&self, collection: &str) -> BoxFuture<'_, Result<bool, VectorStoreError>> {
        let collection = collection.to_owned();
        Box::pin(async move {
            let cols = self
                .collections
                .read()
                .map_err(|e| VectorStoreError::Collection(e.to_string()))?;
            Ok(cols.contains_key(&collection))
        })
    }

    fn create_collection(
        &self,
        collection: &str,
        vector_size: u64,
    ) -> BoxFuture<'_, Result<(), VectorStoreError>> {
        let collection = collection.to_owned();
        Box::pin(async move {
            let mut cols = self
                .collections
                .write()
                .map_err(|e| VectorStoreError::Collection(e.to_string()))?;
            if cols.contains_key(&collection) {
                return Err(VectorStoreError::Collection(format!(
                    "collection {collection} already exists"
                )));
            }
            cols.insert(
                collection,
                InMemoryCollection {
                    dimension: vector_size,
                    points: HashMap::new(),
                },
            );
            Ok(())
        })
    }

    fn ensure_collection(
        &self,
        collection: &str,
        vector_size: u64,
    ) -> BoxFuture<'_, Result<(), VectorStoreError>> {
        let collection = collection.to_owned();
        Box::pin(async move {
            let mut cols = self
                .collections
                .write()
                .map_err(|e| VectorStoreError::Collection(e.to_string()))?;
            cols.entry(collection)
                .or_insert_with(|| InMemoryCollection {
                    dimension: vector_size,
                    points: HashMap::new(),
                });
            Ok(())
        })
    }

    fn delete_collection(&self, collection: &str) -> BoxFuture<'_, Result<(), VectorStoreError>> {
        let collection = collection.to_owned();
        Box::pin(async move {
            let mut cols = self
                .collections
                .write()
                .map_err(|e| VectorStoreError::Collection(e.to_string()))?;
            cols.remove(&collection).map(|_| ()).ok_or_else(|| {
                VectorStoreError::Collection(format!("collection {collection} not found"))
            })
        })
    }

    fn truncate(&self, collection: &str) -> BoxFuture<'_, Result<(), VectorStoreError>> {
        let collection = collection.to_owned();
        Box::pin(async move {
            let mut cols = self
                .collections
                .write()
                .map_err(|e| VectorStoreError::Delete(e.to_string()))?;
            if let Some(col) = cols.get_mut(&collection) {
                col.points.clear();
            }
            Ok(())
        })
    }

    fn upsert(
        &self,
        collection: &str,
        points: Vec<VectorPoint>,
    ) -> BoxFuture<'_, Result<(), VectorStoreError>> {
        let collection = collection.to_owned();
        Box::pin(async move {
            let mut cols = self
                .collections
                .write()
                .map_err(|e| VectorStoreError::Upsert(e.to_string()))?;
            let col = cols.get_mut(&collection).ok_or_else(|| {
                VectorStoreError::Upsert(format!("collection {collection} not found"))
            })?;
            if let Some(bad) = points
                .iter()
                .find(|p| p.vector.len() as u64 != col.dimension)
            {
                return Err(VectorStoreError::Upsert(format!(
                    "point {} has dimension {}, collection expects {}",
                    bad.id,
                    bad.vector.len(),
                    col.dimension
                )));
            }
            for p in points {
                col.points.insert(
                    p.id,
                    StoredPoint {
                        vector: p.vector,
                        payload: p.payload,
                    },
                );
            }
            Ok(())
        })
    }

    fn search(
        &self,
        collection: &str,
        vector: Vec<f32>,
        limit: u64,
    ) -> BoxFuture<'_, Result<Vec<ScoredVectorPoint>, VectorStoreError>> {
        let collection = collection.to_owned();
        Box::pin(async move {
            let cols = self
                .collections
                .read()
                .map_err(|e| VectorStoreError::Search(e.to_string()))?;
            let col = cols.get(&collection).ok_or_else(|| {
                VectorStoreError::Search(format!("collection {collection} not found"))
            })?;

            let mut scored: Vec<ScoredVectorPoint> = col
                .points
                .iter()
                .map(|(id, sp)| ScoredVectorPoint {
                    id: id.clone(),
                    score: cosine_similarity(&vector, &sp.vector),
                    payload: sp.payload.clone(),
                })
                .collect();

            scored.sort_by(|a, b| {
                b.score
                    .partial_cmp(&a.score)
                    .unwrap_or(std::cmp::Ordering::Equal)
                    .then_with(|| a.id.cmp(&b.id))
            });
            #[expect(clippy::cast_possible_truncation)]
            scored.truncate(limit as usize);
            Ok(scored)
        })
    }
}
