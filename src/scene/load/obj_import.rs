use crate::foundation::core::{Pt3, Transform, Vec3};
use crate::foundation::error::{ScenepixError, ScenepixResult};
use crate::scene::graph::{NodeKind, SceneGraph};
use crate::scene::mesh::Mesh;
use std::path::Path;

/// Each OBJ model becomes one top-level mesh node at the scene origin.
pub(super) fn load_obj(path: &Path) -> ScenepixResult<SceneGraph> {
    let opts = tobj::LoadOptions {
        triangulate: true,
        single_index: true,
        ..Default::default()
    };
    let (models, materials) = tobj::load_obj(path, &opts)
        .map_err(|e| ScenepixError::load(format!("parse OBJ '{}': {e}", path.display())))?;

    // Missing .mtl files are common and not fatal; geometry falls back to the default color.
    let materials = materials.unwrap_or_else(|e| {
        tracing::debug!(error = %e, "OBJ materials unavailable");
        Vec::new()
    });

    let mut scene = SceneGraph::new();
    for (i, model) in models.into_iter().enumerate() {
        let m = model.mesh;
        if m.indices.is_empty() {
            continue;
        }
        let positions = m
            .positions
            .chunks_exact(3)
            .map(|p| Pt3::new(p[0], p[1], p[2]))
            .collect::<Vec<_>>();
        let normals = (!m.normals.is_empty()).then(|| {
            m.normals
                .chunks_exact(3)
                .map(|n| Vec3::new(n[0], n[1], n[2]))
                .collect::<Vec<_>>()
        });
        let mut mesh = Mesh::new(positions, normals, m.indices)
            .map_err(|e| ScenepixError::load(format!("OBJ model {i} '{}': {e}", model.name)))?;
        if let Some(diffuse) = m
            .material_id
            .and_then(|id| materials.get(id))
            .and_then(|mat| mat.diffuse)
        {
            mesh = mesh.with_base_color(diffuse);
        }

        let mesh_id = scene.add_mesh(mesh);
        let name = if model.name.is_empty() {
            format!("model_{i}")
        } else {
            model.name
        };
        scene.add_node(
            scene.root(),
            name,
            Transform::default(),
            NodeKind::Mesh(mesh_id),
        );
    }
    Ok(scene)
}
