//! Category vocabulary
//!
//! Fixed bijection between category names and contiguous indices. Built once and
//! handed to the classifier; the same map must be used for training and prediction.

use crate::error::{CnnError, CnnResult};
use crate::tensor::Tensor;

/// The five cat breeds the classifier distinguishes, in index order.
pub const CAT_BREEDS: [&str; 5] = ["Abyssinian", "Bengal", "Bombay", "Egyptian", "Russian"];

/// Ordered, duplicate-free list of category names. Index = position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassMap {
    names: Vec<String>,
}

impl ClassMap {
    /// Build a map from an ordered list of names.
    ///
    /// Fails on an empty list or duplicate names.
    pub fn new<S: AsRef<str>>(names: &[S]) -> CnnResult<Self> {
        if names.is_empty() {
            return Err(CnnError::Configuration(
                "class map needs at least one category".to_string(),
            ));
        }
        let mut owned: Vec<String> = Vec::with_capacity(names.len());
        for name in names {
            let name: &str = name.as_ref();
            if owned.iter().any(|n| n == name) {
                return Err(CnnError::Configuration(format!(
                    "duplicate category '{}'",
                    name
                )));
            }
            owned.push(name.to_string());
        }
        Ok(Self { names: owned })
    }

    /// The fixed cat-breed vocabulary.
    pub fn cat_breeds() -> Self {
        Self {
            names: CAT_BREEDS.iter().map(|s| s.to_string()).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn index_of(&self, name: &str) -> CnnResult<usize> {
        self.names
            .iter()
            .position(|n| n == name)
            .ok_or_else(|| CnnError::LabelLookup(name.to_string()))
    }

    pub fn name_of(&self, index: usize) -> Option<&str> {
        self.names.get(index).map(String::as_str)
    }

    /// Map every label to its index, failing on the first unknown one.
    pub fn encode<S: AsRef<str>>(&self, labels: &[S]) -> CnnResult<Vec<usize>> {
        labels.iter().map(|l| self.index_of(l.as_ref())).collect()
    }

    /// (N, num_classes) one-hot matrix for the given indices.
    pub fn one_hot(&self, indices: &[usize]) -> CnnResult<Tensor> {
        let k = self.names.len();
        let mut data = vec![0.0f32; indices.len() * k];
        for (row, &idx) in indices.iter().enumerate() {
            if idx >= k {
                return Err(CnnError::LabelLookup(format!("index {}", idx)));
            }
            data[row * k + idx] = 1.0;
        }
        Tensor::new(vec![indices.len(), k], data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cat_breed_indices() {
        let map = ClassMap::cat_breeds();
        assert_eq!(map.len(), 5);
        assert_eq!(map.index_of("Abyssinian").unwrap(), 0);
        assert_eq!(map.index_of("Russian").unwrap(), 4);
        assert_eq!(map.name_of(2), Some("Bombay"));
        assert_eq!(map.name_of(5), None);
    }

    #[test]
    fn test_unknown_label() {
        let map = ClassMap::cat_breeds();
        let err = map.encode(&["Bengal", "Sphynx"]).unwrap_err();
        assert!(matches!(err, CnnError::LabelLookup(ref l) if l == "Sphynx"));
    }

    #[test]
    fn test_duplicate_names_rejected() {
        assert!(ClassMap::new(&["a", "b", "a"]).is_err());
        assert!(ClassMap::new::<&str>(&[]).is_err());
    }

    #[test]
    fn test_one_hot() {
        let map = ClassMap::cat_breeds();
        let t = map.one_hot(&[1, 4]).unwrap();
        assert_eq!(t.shape(), &[2, 5]);
        assert_eq!(
            t.data(),
            &[0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 1.0]
        );
    }
}
