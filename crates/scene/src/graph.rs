//! Node arena and parent/child links.
//!
//! Nodes live in a `BTreeMap` keyed by [`NodeId`], so iteration over the
//! arena is deterministic. Spawning hands out sequential ids that are never
//! reused, which keeps ids stable for the lifetime of the scene and lets
//! renderer-side caches key off them.

use std::collections::{BTreeMap, BTreeSet};

use glam::Mat4;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::component::{Camera, Component, Light, Model, Transform};

/// Stable identity of a node within one [`Scene`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub u64);

/// Errors from graph operations.
#[derive(Debug, Error)]
pub enum SceneError {
    #[error("node {0:?} does not exist")]
    NodeNotFound(NodeId),
    #[error("node {0:?} already has a parent")]
    AlreadyAttached(NodeId),
    #[error("the root node cannot be removed")]
    RemoveRoot,
    #[error("parent chain of node {0:?} does not terminate")]
    CycleDetected(NodeId),
    #[error("animation channel: {0}")]
    BadChannel(&'static str),
}

/// One scene graph node: links plus an ordered component list.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Node {
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    components: Vec<Component>,
}

impl Node {
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Children in attachment order.
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn components(&self) -> &[Component] {
        &self.components
    }

    pub fn add_component(&mut self, component: Component) {
        self.components.push(component);
    }

    /// First transform component, if any.
    pub fn transform(&self) -> Option<&Transform> {
        self.components.iter().find_map(|c| match c {
            Component::Transform(t) => Some(t),
            _ => None,
        })
    }

    pub fn transform_mut(&mut self) -> Option<&mut Transform> {
        self.components.iter_mut().find_map(|c| match c {
            Component::Transform(t) => Some(t),
            _ => None,
        })
    }

    pub fn camera(&self) -> Option<&Camera> {
        self.components.iter().find_map(|c| match c {
            Component::Camera(cam) => Some(cam),
            _ => None,
        })
    }

    pub fn camera_mut(&mut self) -> Option<&mut Camera> {
        self.components.iter_mut().find_map(|c| match c {
            Component::Camera(cam) => Some(cam),
            _ => None,
        })
    }

    pub fn light(&self) -> Option<&Light> {
        self.components.iter().find_map(|c| match c {
            Component::Light(l) => Some(l),
            _ => None,
        })
    }

    pub fn model(&self) -> Option<&Model> {
        self.components.iter().find_map(|c| match c {
            Component::Model(m) => Some(m),
            _ => None,
        })
    }

    /// Local matrix from the first transform component, identity without one.
    pub fn local_matrix(&self) -> Mat4 {
        self.transform()
            .map(Transform::local_matrix)
            .unwrap_or(Mat4::IDENTITY)
    }
}

/// The scene graph. Owns every node and the root.
///
/// The root always exists and cannot be removed. Everything the renderer
/// visits hangs off it; detached nodes stay in the arena but are not drawn.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scene {
    nodes: BTreeMap<NodeId, Node>,
    root: NodeId,
    next_id: u64,
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

impl Scene {
    pub fn new() -> Self {
        let root = NodeId(0);
        let mut nodes = BTreeMap::new();
        nodes.insert(root, Node::default());
        Self {
            nodes,
            root,
            next_id: 1,
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Spawn a detached, empty node.
    pub fn spawn(&mut self) -> NodeId {
        let id = NodeId(self.next_id);
        self.next_id += 1;
        self.nodes.insert(id, Node::default());
        id
    }

    /// Spawn a detached node carrying the given components.
    pub fn spawn_with(&mut self, components: impl IntoIterator<Item = Component>) -> NodeId {
        let id = self.spawn();
        if let Some(node) = self.nodes.get_mut(&id) {
            node.components = components.into_iter().collect();
        }
        id
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(&id)
    }

    /// Attach `child` under `parent`. A node has one parent at a time;
    /// re-parenting means removing first.
    pub fn attach(&mut self, parent: NodeId, child: NodeId) -> Result<(), SceneError> {
        if !self.nodes.contains_key(&parent) {
            return Err(SceneError::NodeNotFound(parent));
        }
        let child_node = self
            .nodes
            .get_mut(&child)
            .ok_or(SceneError::NodeNotFound(child))?;
        if child_node.parent.is_some() {
            return Err(SceneError::AlreadyAttached(child));
        }
        child_node.parent = Some(parent);
        if let Some(parent_node) = self.nodes.get_mut(&parent) {
            parent_node.children.push(child);
        }
        Ok(())
    }

    /// Remove a node and everything under it. Returns how many nodes went.
    pub fn remove_subtree(&mut self, id: NodeId) -> Result<usize, SceneError> {
        if id == self.root {
            return Err(SceneError::RemoveRoot);
        }
        if !self.nodes.contains_key(&id) {
            return Err(SceneError::NodeNotFound(id));
        }
        let doomed = self.descendants(id);
        if let Some(parent) = self.nodes.get(&id).and_then(Node::parent) {
            if let Some(parent_node) = self.nodes.get_mut(&parent) {
                parent_node.children.retain(|&c| c != id);
            }
        }
        for node_id in &doomed {
            self.nodes.remove(node_id);
        }
        tracing::debug!(?id, removed = doomed.len(), "removed subtree");
        Ok(doomed.len())
    }

    /// World matrix of a node: the product of local matrices from the top of
    /// its parent chain down to itself.
    ///
    /// The walk is bounded by the arena size, so a parent chain that loops is
    /// reported as [`SceneError::CycleDetected`] instead of spinning.
    pub fn world_matrix(&self, id: NodeId) -> Result<Mat4, SceneError> {
        let mut chain = Vec::new();
        let mut current = Some(id);
        while let Some(node_id) = current {
            if chain.len() == self.nodes.len() {
                return Err(SceneError::CycleDetected(id));
            }
            let node = self
                .nodes
                .get(&node_id)
                .ok_or(SceneError::NodeNotFound(node_id))?;
            chain.push(node.local_matrix());
            current = node.parent;
        }
        Ok(chain
            .into_iter()
            .rev()
            .fold(Mat4::IDENTITY, |world, local| world * local))
    }

    /// Pre-order listing of a subtree: each node before its children, children
    /// in attachment order. Revisits are skipped, so the listing terminates
    /// even on a malformed graph.
    pub fn descendants(&self, start: NodeId) -> Vec<NodeId> {
        let mut order = Vec::new();
        let mut seen = BTreeSet::new();
        let mut stack = vec![start];
        while let Some(id) = stack.pop() {
            if !seen.insert(id) {
                continue;
            }
            let Some(node) = self.nodes.get(&id) else {
                continue;
            };
            order.push(id);
            stack.extend(node.children.iter().rev().copied());
        }
        order
    }

    /// First node under the root, in pre-order, matching the predicate.
    pub fn find(&self, predicate: impl Fn(&Node) -> bool) -> Option<NodeId> {
        self.descendants(self.root)
            .into_iter()
            .find(|id| self.nodes.get(id).is_some_and(&predicate))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::{Light, Transform};
    use glam::{Quat, Vec3};

    #[test]
    fn new_scene_has_only_the_root() {
        let scene = Scene::new();
        assert_eq!(scene.node_count(), 1);
        assert!(scene.node(scene.root()).is_some());
    }

    #[test]
    fn spawned_ids_are_sequential_and_never_reused() {
        let mut scene = Scene::new();
        let a = scene.spawn();
        let b = scene.spawn();
        assert_ne!(a, b);
        let root = scene.root();
        scene.attach(root, a).unwrap();
        scene.remove_subtree(a).unwrap();
        let c = scene.spawn();
        assert_ne!(c, a);
        assert_ne!(c, b);
    }

    #[test]
    fn attach_builds_parent_and_child_links() {
        let mut scene = Scene::new();
        let root = scene.root();
        let a = scene.spawn();
        let b = scene.spawn();
        scene.attach(root, a).unwrap();
        scene.attach(a, b).unwrap();

        assert_eq!(scene.node(b).unwrap().parent(), Some(a));
        assert_eq!(scene.node(root).unwrap().children(), &[a]);
        assert_eq!(scene.node(a).unwrap().children(), &[b]);
    }

    #[test]
    fn attach_rejects_unknown_nodes_and_double_parents() {
        let mut scene = Scene::new();
        let root = scene.root();
        let a = scene.spawn();
        scene.attach(root, a).unwrap();

        assert!(matches!(
            scene.attach(root, NodeId(99)),
            Err(SceneError::NodeNotFound(NodeId(99)))
        ));
        assert!(matches!(
            scene.attach(NodeId(99), a),
            Err(SceneError::NodeNotFound(NodeId(99)))
        ));
        assert!(matches!(
            scene.attach(root, a),
            Err(SceneError::AlreadyAttached(_))
        ));
    }

    #[test]
    fn remove_subtree_takes_descendants_along() {
        let mut scene = Scene::new();
        let root = scene.root();
        let a = scene.spawn();
        let b = scene.spawn();
        let c = scene.spawn();
        scene.attach(root, a).unwrap();
        scene.attach(a, b).unwrap();
        scene.attach(a, c).unwrap();

        let removed = scene.remove_subtree(a).unwrap();
        assert_eq!(removed, 3);
        assert!(scene.node(a).is_none());
        assert!(scene.node(b).is_none());
        assert!(scene.node(c).is_none());
        assert!(scene.node(root).unwrap().children().is_empty());
    }

    #[test]
    fn the_root_cannot_be_removed() {
        let mut scene = Scene::new();
        let root = scene.root();
        assert!(matches!(
            scene.remove_subtree(root),
            Err(SceneError::RemoveRoot)
        ));
    }

    #[test]
    fn world_matrix_of_detached_node_is_its_local_matrix() {
        let mut scene = Scene::new();
        let a = scene.spawn_with([Component::Transform(Transform::from_translation(
            Vec3::new(1.0, 2.0, 3.0),
        ))]);
        let world = scene.world_matrix(a).unwrap();
        assert!((world.w_axis.truncate() - Vec3::new(1.0, 2.0, 3.0)).length() < 1e-6);
    }

    #[test]
    fn translations_along_a_chain_add_up() {
        let mut scene = Scene::new();
        let root = scene.root();
        let a = scene.spawn_with([Component::Transform(Transform::from_translation(
            Vec3::new(1.0, 2.0, 3.0),
        ))]);
        let b = scene.spawn_with([Component::Transform(Transform::from_translation(
            Vec3::new(10.0, 20.0, 30.0),
        ))]);
        let c = scene.spawn_with([Component::Transform(Transform::from_translation(
            Vec3::new(100.0, 200.0, 300.0),
        ))]);
        scene.attach(root, a).unwrap();
        scene.attach(a, b).unwrap();
        scene.attach(b, c).unwrap();

        let world = scene.world_matrix(c).unwrap();
        let position = world.w_axis.truncate();
        assert!((position - Vec3::new(111.0, 222.0, 333.0)).length() < 1e-4);
    }

    #[test]
    fn parent_rotation_moves_child_positions() {
        let mut scene = Scene::new();
        let root = scene.root();
        let pivot = scene.spawn_with([Component::Transform(Transform::from_rotation(
            Quat::from_rotation_z(std::f32::consts::FRAC_PI_2),
        ))]);
        let child = scene.spawn_with([Component::Transform(Transform::from_translation(
            Vec3::X,
        ))]);
        scene.attach(root, pivot).unwrap();
        scene.attach(pivot, child).unwrap();

        let position = scene.world_matrix(child).unwrap().w_axis.truncate();
        assert!((position - Vec3::Y).length() < 1e-5);
    }

    #[test]
    fn parent_scale_stretches_child_offsets() {
        let mut scene = Scene::new();
        let root = scene.root();
        let parent = scene.spawn_with([Component::Transform(
            Transform::default().with_scale(Vec3::splat(2.0)),
        )]);
        let child = scene.spawn_with([Component::Transform(Transform::from_translation(
            Vec3::X,
        ))]);
        scene.attach(root, parent).unwrap();
        scene.attach(parent, child).unwrap();

        let position = scene.world_matrix(child).unwrap().w_axis.truncate();
        assert!((position - Vec3::new(2.0, 0.0, 0.0)).length() < 1e-5);
    }

    #[test]
    fn node_without_transform_contributes_identity() {
        let mut scene = Scene::new();
        let root = scene.root();
        let bare = scene.spawn();
        let child = scene.spawn_with([Component::Transform(Transform::from_translation(
            Vec3::new(0.0, 5.0, 0.0),
        ))]);
        scene.attach(root, bare).unwrap();
        scene.attach(bare, child).unwrap();

        let position = scene.world_matrix(child).unwrap().w_axis.truncate();
        assert!((position - Vec3::new(0.0, 5.0, 0.0)).length() < 1e-6);
    }

    #[test]
    fn looping_parent_chain_is_reported_not_followed() {
        let mut scene = Scene::new();
        let root = scene.root();
        let a = scene.spawn();
        scene.attach(root, a).unwrap();
        // root under its own descendant closes a loop
        scene.attach(a, root).unwrap();

        assert!(matches!(
            scene.world_matrix(a),
            Err(SceneError::CycleDetected(_))
        ));
    }

    #[test]
    fn descendants_lists_nodes_in_pre_order() {
        let mut scene = Scene::new();
        let root = scene.root();
        let a = scene.spawn();
        let a1 = scene.spawn();
        let a2 = scene.spawn();
        let b = scene.spawn();
        scene.attach(root, a).unwrap();
        scene.attach(a, a1).unwrap();
        scene.attach(a, a2).unwrap();
        scene.attach(root, b).unwrap();

        assert_eq!(scene.descendants(root), vec![root, a, a1, a2, b]);
    }

    #[test]
    fn find_returns_the_first_match_in_pre_order() {
        let mut scene = Scene::new();
        let root = scene.root();
        let first = scene.spawn_with([Component::Light(Light::default())]);
        let second = scene.spawn_with([Component::Light(Light::default())]);
        scene.attach(root, first).unwrap();
        scene.attach(root, second).unwrap();

        assert_eq!(scene.find(|n| n.light().is_some()), Some(first));
        assert_eq!(scene.find(|n| n.camera().is_some()), None);
    }

    #[test]
    fn component_accessors_return_the_first_match() {
        let mut scene = Scene::new();
        let id = scene.spawn_with([
            Component::Light(Light::new(0.25, 10.0)),
            Component::Light(Light::new(0.75, 20.0)),
        ]);
        let light = scene.node(id).unwrap().light().unwrap();
        assert_eq!(light.ambient, 0.25);
    }

    #[test]
    fn detached_nodes_are_invisible_to_find() {
        let mut scene = Scene::new();
        let _detached = scene.spawn_with([Component::Light(Light::default())]);
        assert_eq!(scene.find(|n| n.light().is_some()), None);
    }
}
