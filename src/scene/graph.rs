use crate::foundation::core::{Mat4, Pt3, Transform};
use crate::foundation::error::{ScenepixError, ScenepixResult};
use crate::foundation::math::BoundingSphere;
use crate::scene::camera::Camera;
use crate::scene::light::{Environment, Light};
use crate::scene::mesh::Mesh;

/// Index of a node inside its [`SceneGraph`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub(crate) u32);

/// Index of a mesh inside its [`SceneGraph`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MeshId(pub(crate) u32);

/// What a node carries besides its transform.
#[derive(Clone, Debug, PartialEq)]
pub enum NodeKind {
    /// Pure transform / grouping node.
    Group,
    /// Geometry instance.
    Mesh(MeshId),
    Camera(Camera),
    Light(Light),
}

#[derive(Clone, Debug)]
pub struct Node {
    pub name: String,
    pub transform: Transform,
    pub kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl Node {
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn is_camera(&self) -> bool {
        matches!(self.kind, NodeKind::Camera(_))
    }

    pub fn is_light(&self) -> bool {
        matches!(self.kind, NodeKind::Light(_))
    }

    pub fn camera(&self) -> Option<&Camera> {
        match &self.kind {
            NodeKind::Camera(c) => Some(c),
            _ => None,
        }
    }

    pub fn light(&self) -> Option<&Light> {
        match &self.kind {
            NodeKind::Light(l) => Some(l),
            _ => None,
        }
    }
}

/// Hierarchical scene: an arena of nodes under a single root, plus the meshes they reference.
///
/// Nodes are never deleted; detaching happens only through [`SceneGraph::reparent`].
#[derive(Clone, Debug)]
pub struct SceneGraph {
    nodes: Vec<Node>,
    meshes: Vec<Mesh>,
    environment: Option<Environment>,
}

impl Default for SceneGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl SceneGraph {
    /// Empty scene containing only the root group at the origin.
    pub fn new() -> Self {
        Self {
            nodes: vec![Node {
                name: "root".to_string(),
                transform: Transform::default(),
                kind: NodeKind::Group,
                parent: None,
                children: Vec::new(),
            }],
            meshes: Vec::new(),
            environment: None,
        }
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    /// Direct children of the root.
    pub fn top_level(&self) -> &[NodeId] {
        self.node(self.root()).children()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0 as usize]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0 as usize]
    }

    pub fn add_mesh(&mut self, mesh: Mesh) -> MeshId {
        self.meshes.push(mesh);
        MeshId((self.meshes.len() - 1) as u32)
    }

    pub fn mesh(&self, id: MeshId) -> &Mesh {
        &self.meshes[id.0 as usize]
    }

    pub fn meshes(&self) -> &[Mesh] {
        &self.meshes
    }

    /// Append a node as the last child of `parent`.
    pub fn add_node(
        &mut self,
        parent: NodeId,
        name: impl Into<String>,
        transform: Transform,
        kind: NodeKind,
    ) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Node {
            name: name.into(),
            transform,
            kind,
            parent: Some(parent),
            children: Vec::new(),
        });
        self.node_mut(parent).children.push(id);
        id
    }

    /// Move `id` (with its subtree) under `new_parent`, keeping its local transform.
    pub fn reparent(&mut self, id: NodeId, new_parent: NodeId) -> ScenepixResult<()> {
        if id == self.root() {
            return Err(ScenepixError::compose("the root node cannot be re-parented"));
        }
        if self.is_ancestor_or_self(id, new_parent) {
            return Err(ScenepixError::compose(format!(
                "re-parenting '{}' under its own subtree would create a cycle",
                self.node(id).name
            )));
        }
        if let Some(old) = self.node(id).parent {
            self.node_mut(old).children.retain(|&c| c != id);
        }
        self.node_mut(id).parent = Some(new_parent);
        self.node_mut(new_parent).children.push(id);
        Ok(())
    }

    fn is_ancestor_or_self(&self, ancestor: NodeId, mut node: NodeId) -> bool {
        loop {
            if node == ancestor {
                return true;
            }
            match self.node(node).parent {
                Some(p) => node = p,
                None => return false,
            }
        }
    }

    /// Local-to-world matrix of a node.
    pub fn world_matrix(&self, id: NodeId) -> Mat4 {
        let mut m = self.node(id).transform.to_matrix();
        let mut cur = self.node(id).parent;
        while let Some(p) = cur {
            m = self.node(p).transform.to_matrix() * m;
            cur = self.node(p).parent;
        }
        m
    }

    /// World position of a node's origin.
    pub fn world_position(&self, id: NodeId) -> Pt3 {
        self.world_matrix(id).transform_point(&Pt3::origin())
    }

    /// Depth-first, parent-before-children walk from the root with world matrices.
    pub fn walk(&self) -> Vec<(NodeId, Mat4)> {
        let mut out = Vec::with_capacity(self.nodes.len());
        let mut stack = vec![(self.root(), self.node(self.root()).transform.to_matrix())];
        while let Some((id, world)) = stack.pop() {
            out.push((id, world));
            for &c in self.node(id).children.iter().rev() {
                stack.push((c, world * self.node(c).transform.to_matrix()));
            }
        }
        out
    }

    /// Mesh instances reachable from the root, with their world matrices.
    pub fn mesh_instances(&self) -> impl Iterator<Item = (NodeId, MeshId, Mat4)> + '_ {
        self.walk()
            .into_iter()
            .filter_map(|(id, m)| match self.node(id).kind {
                NodeKind::Mesh(mesh) => Some((id, mesh, m)),
                _ => None,
            })
    }

    /// Camera and light nodes reachable from the root, with their world matrices.
    pub fn cameras(&self) -> Vec<(NodeId, Camera, Mat4)> {
        self.walk()
            .into_iter()
            .filter_map(|(id, m)| self.node(id).camera().map(|c| (id, *c, m)))
            .collect()
    }

    pub fn lights(&self) -> Vec<(NodeId, Light, Mat4)> {
        self.walk()
            .into_iter()
            .filter_map(|(id, m)| self.node(id).light().map(|l| (id, *l, m)))
            .collect()
    }

    /// World-space bounding sphere over geometry only; cameras and lights never contribute.
    pub fn bounding_sphere(&self) -> BoundingSphere {
        let points = self.world_vertices();
        BoundingSphere::from_points(points.iter())
    }

    /// Bounding sphere of the geometry under `id`, expressed in `id`'s local frame.
    pub fn local_bounding_sphere(&self, id: NodeId) -> BoundingSphere {
        let Some(inv) = self.world_matrix(id).try_inverse() else {
            return BoundingSphere::empty();
        };
        let points: Vec<Pt3> = self
            .mesh_instances()
            .filter(|(node, _, _)| self.is_ancestor_or_self(id, *node))
            .flat_map(|(_, mesh, m)| {
                let local = inv * m;
                self.mesh(mesh)
                    .positions
                    .iter()
                    .map(move |p| local.transform_point(p))
                    .collect::<Vec<_>>()
            })
            .collect();
        BoundingSphere::from_points(points.iter())
    }

    fn world_vertices(&self) -> Vec<Pt3> {
        let mut out = Vec::new();
        for (_, mesh, m) in self.mesh_instances() {
            out.extend(self.mesh(mesh).positions.iter().map(|p| m.transform_point(p)));
        }
        out
    }

    pub fn environment(&self) -> Option<Environment> {
        self.environment
    }

    pub fn set_environment(&mut self, env: Option<Environment>) {
        self.environment = env;
    }
}

#[cfg(test)]
#[path = "../../tests/unit/scene/graph.rs"]
mod tests;
