//! Lineage map construction
//!
//! Builds the two dependency orientations (child -> parents and
//! parent -> children) for a manifest. v4+ manifests ship both maps
//! natively; older manifests only declare per-node `depends_on` lists,
//! so the maps are reconstructed by inverting those.

use std::collections::HashMap;

use serde_json::Value;

use crate::document::ManifestDoc;
use dbtscope_core::SchemaCapabilities;

/// Bidirectional lineage maps.
///
/// The two maps are exact inverses of one another: every parent entry in
/// `parents[c]` has a mirrored child entry in `children[p]`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LineageMaps {
    /// child -> ordered list of parents (upstream)
    pub parents: HashMap<String, Vec<String>>,

    /// parent -> ordered list of children (downstream)
    pub children: HashMap<String, Vec<String>>,
}

impl LineageMaps {
    /// Build lineage maps for a manifest under the given capability profile.
    ///
    /// With native maps available, they are taken verbatim; a capability
    /// flag with no matching key in the document falls back to an empty map.
    /// Without them, maps are reconstructed from `depends_on.nodes`: child
    /// lists accumulate in manifest node-iteration order, which is document
    /// order, not sorted.
    pub fn build(manifest: &ManifestDoc, caps: &SchemaCapabilities) -> Self {
        if caps.has_parent_map && caps.has_child_map {
            return Self {
                parents: manifest.parent_map.clone(),
                children: manifest.child_map.clone(),
            };
        }

        tracing::info!("building lineage maps from node dependencies (legacy schema)");

        let mut parents: HashMap<String, Vec<String>> = HashMap::new();
        let mut children: HashMap<String, Vec<String>> = HashMap::new();

        for (node_id, node) in &manifest.nodes {
            let deps = depends_on_nodes(node);
            if deps.is_empty() {
                continue;
            }

            for parent_id in &deps {
                children
                    .entry(parent_id.clone())
                    .or_default()
                    .push(node_id.clone());
            }
            parents.insert(node_id.clone(), deps);
        }

        Self { parents, children }
    }
}

/// Upstream node ids declared under a node's `depends_on.nodes`.
///
/// An absent or malformed declaration contributes no edges.
fn depends_on_nodes(node: &Value) -> Vec<String> {
    node.get("depends_on")
        .and_then(|d| d.get("nodes"))
        .and_then(Value::as_array)
        .map(|nodes| {
            nodes
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_owned)
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::ManifestDoc;
    use pretty_assertions::assert_eq;

    fn caps(version: u32) -> SchemaCapabilities {
        SchemaCapabilities::new(version)
    }

    #[test]
    fn native_maps_are_used_verbatim() {
        let manifest = ManifestDoc::from_str(
            r#"{
                "parent_map": {"model.proj.a": ["model.proj.b"]},
                "child_map": {"model.proj.b": ["model.proj.a"]},
                "nodes": {
                    "model.proj.a": {"depends_on": {"nodes": ["model.proj.ignored"]}}
                }
            }"#,
        )
        .unwrap();

        let maps = LineageMaps::build(&manifest, &caps(4));

        assert_eq!(maps.parents["model.proj.a"], vec!["model.proj.b"]);
        assert_eq!(maps.children["model.proj.b"], vec!["model.proj.a"]);
        // depends_on is not consulted on the native path
        assert!(!maps.parents.contains_key("model.proj.ignored"));
    }

    #[test]
    fn flagged_but_missing_native_maps_fall_back_to_empty() {
        let manifest = ManifestDoc::from_str(r#"{"nodes": {"model.proj.a": {}}}"#).unwrap();
        let maps = LineageMaps::build(&manifest, &caps(12));

        assert!(maps.parents.is_empty());
        assert!(maps.children.is_empty());
    }

    #[test]
    fn legacy_maps_are_reconstructed_from_depends_on() {
        let manifest = ManifestDoc::from_str(
            r#"{
                "nodes": {
                    "model.proj.a": {"depends_on": {"nodes": ["model.proj.b"]}},
                    "model.proj.b": {}
                }
            }"#,
        )
        .unwrap();

        let maps = LineageMaps::build(&manifest, &caps(2));

        assert_eq!(maps.parents["model.proj.a"], vec!["model.proj.b"]);
        assert_eq!(maps.children["model.proj.b"], vec!["model.proj.a"]);
        assert!(!maps.parents.contains_key("model.proj.b"));
    }

    #[test]
    fn child_lists_follow_node_iteration_order() {
        let manifest = ManifestDoc::from_str(
            r#"{
                "nodes": {
                    "model.proj.z": {"depends_on": {"nodes": ["model.proj.base"]}},
                    "model.proj.a": {"depends_on": {"nodes": ["model.proj.base"]}},
                    "model.proj.m": {"depends_on": {"nodes": ["model.proj.base"]}}
                }
            }"#,
        )
        .unwrap();

        let maps = LineageMaps::build(&manifest, &caps(1));

        // Document order, not sorted
        assert_eq!(
            maps.children["model.proj.base"],
            vec!["model.proj.z", "model.proj.a", "model.proj.m"]
        );
    }

    #[test]
    fn reconstructed_maps_are_exact_inverses() {
        let manifest = ManifestDoc::from_str(
            r#"{
                "nodes": {
                    "model.proj.c": {"depends_on": {"nodes": ["model.proj.a", "model.proj.b"]}},
                    "model.proj.b": {"depends_on": {"nodes": ["model.proj.a"]}},
                    "model.proj.a": {}
                }
            }"#,
        )
        .unwrap();

        let maps = LineageMaps::build(&manifest, &caps(3));

        for (child, parents) in &maps.parents {
            for parent in parents {
                assert!(maps.children[parent].contains(child));
            }
        }
        for (parent, children) in &maps.children {
            for child in children {
                assert!(maps.parents[child].contains(parent));
            }
        }
    }

    #[test]
    fn empty_or_absent_dependency_lists_contribute_no_edges() {
        let manifest = ManifestDoc::from_str(
            r#"{
                "nodes": {
                    "model.proj.a": {"depends_on": {"nodes": []}},
                    "model.proj.b": {"depends_on": {}},
                    "model.proj.c": {}
                }
            }"#,
        )
        .unwrap();

        let maps = LineageMaps::build(&manifest, &caps(2));
        assert!(maps.parents.is_empty());
        assert!(maps.children.is_empty());
    }
}
