use crate::layer::LayerInfo;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// LayerTree
// ---------------------------------------------------------------------------

/// Derived parent/child relation over a discovered layer set, computed
/// once and read-only afterward. Nodes are indices into the layer slice
/// the tree was built from.
#[derive(Debug)]
pub struct LayerTree {
    roots: Vec<usize>,
    children: HashMap<usize, Vec<usize>>,
    parents: Vec<Option<usize>>,
}

impl LayerTree {
    /// Build the forest. Parent resolution per layer: an explicit parent
    /// id that names another discovered layer wins (first-discovered
    /// layer claims a duplicated id); otherwise the closest filesystem
    /// ancestor that is itself a layer directory; otherwise the layer is
    /// a root. Resolution is a single lookup per layer, so cyclic id
    /// references cannot loop discovery.
    pub fn build(layers: &[LayerInfo]) -> Self {
        let mut by_id: HashMap<&str, usize> = HashMap::new();
        for (idx, layer) in layers.iter().enumerate() {
            if !layer.layer_id.is_empty() {
                by_id.entry(layer.layer_id.as_str()).or_insert(idx);
            }
        }
        let by_path: HashMap<&Path, usize> = layers
            .iter()
            .enumerate()
            .map(|(idx, layer)| (layer.path.as_path(), idx))
            .collect();

        let mut parents: Vec<Option<usize>> = Vec::with_capacity(layers.len());
        for (idx, layer) in layers.iter().enumerate() {
            let explicit = layer
                .parent_layer_id
                .as_deref()
                .and_then(|id| by_id.get(id).copied())
                .filter(|&parent| parent != idx);
            let parent = explicit.or_else(|| {
                layer
                    .path
                    .ancestors()
                    .skip(1)
                    .find_map(|dir| by_path.get(dir).copied())
            });
            parents.push(parent);
        }

        let mut roots: Vec<usize> = Vec::new();
        let mut children: HashMap<usize, Vec<usize>> = HashMap::new();
        for (idx, parent) in parents.iter().enumerate() {
            match parent {
                Some(p) => children.entry(*p).or_default().push(idx),
                None => roots.push(idx),
            }
        }

        let sort_key = |&idx: &usize| -> (String, PathBuf) {
            (layers[idx].layer_id.clone(), layers[idx].path.clone())
        };
        roots.sort_by_key(sort_key);
        for kids in children.values_mut() {
            kids.sort_by_key(sort_key);
        }

        Self {
            roots,
            children,
            parents,
        }
    }

    pub fn roots(&self) -> &[usize] {
        &self.roots
    }

    pub fn children(&self, idx: usize) -> &[usize] {
        self.children.get(&idx).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn parent(&self, idx: usize) -> Option<usize> {
        self.parents.get(idx).copied().flatten()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
