use crate::foundation::core::{Pt3, Quat, Transform, Vec3};
use crate::foundation::error::{ScenepixError, ScenepixResult};
use crate::scene::camera::Camera;
use crate::scene::graph::{NodeId, NodeKind, SceneGraph};
use crate::scene::mesh::Mesh;
use std::path::Path;

/// Import the default scene (or the first one) with its hierarchy, meshes and cameras.
pub(super) fn load_gltf(path: &Path) -> ScenepixResult<SceneGraph> {
    let (doc, buffers, _images) = gltf::import(path)
        .map_err(|e| ScenepixError::load(format!("parse glTF '{}': {e}", path.display())))?;

    let gltf_scene = doc
        .default_scene()
        .or_else(|| doc.scenes().next())
        .ok_or_else(|| {
            ScenepixError::load(format!("glTF '{}' contains no scenes", path.display()))
        })?;

    let mut scene = SceneGraph::new();
    let mut stack: Vec<(gltf::Node<'_>, NodeId)> = gltf_scene
        .nodes()
        .map(|n| (n, scene.root()))
        .collect::<Vec<_>>();
    stack.reverse();

    while let Some((node, parent)) = stack.pop() {
        let (t, r, s) = node.transform().decomposed();
        let transform = Transform {
            translation: Vec3::from(t),
            rotation: Quat::from_quaternion(nalgebra::Quaternion::new(r[3], r[0], r[1], r[2])),
            scale: Vec3::from(s),
        };
        let name = node
            .name()
            .map(str::to_string)
            .unwrap_or_else(|| format!("node_{}", node.index()));

        let kind = if node.camera().is_some() {
            NodeKind::Camera(import_camera(&node))
        } else {
            NodeKind::Group
        };
        let id = scene.add_node(parent, name.clone(), transform, kind);

        if let Some(mesh) = node.mesh() {
            for (pi, prim) in mesh.primitives().enumerate() {
                if prim.mode() != gltf::mesh::Mode::Triangles {
                    tracing::debug!(node = %name, mode = ?prim.mode(), "skipping non-triangle primitive");
                    continue;
                }
                let Some(m) = import_primitive(&prim, &buffers)? else {
                    continue;
                };
                let mesh_id = scene.add_mesh(m);
                scene.add_node(
                    id,
                    format!("{name}#{pi}"),
                    Transform::default(),
                    NodeKind::Mesh(mesh_id),
                );
            }
        }

        let mut children: Vec<_> = node.children().map(|c| (c, id)).collect();
        children.reverse();
        stack.extend(children);
    }
    Ok(scene)
}

fn import_camera(node: &gltf::Node<'_>) -> Camera {
    let mut cam = Camera::default();
    let Some(camera) = node.camera() else {
        return cam;
    };
    if let gltf::camera::Projection::Perspective(p) = camera.projection() {
        cam.yfov_deg = p.yfov().to_degrees();
        cam.znear = p.znear();
        if let Some(zfar) = p.zfar() {
            cam.zfar = zfar;
        }
    }
    cam
}

fn import_primitive(
    prim: &gltf::Primitive<'_>,
    buffers: &[gltf::buffer::Data],
) -> ScenepixResult<Option<Mesh>> {
    let reader = prim.reader(|buffer| Some(&buffers[buffer.index()]));
    let Some(positions) = reader.read_positions() else {
        return Ok(None);
    };
    let positions: Vec<Pt3> = positions.map(|[x, y, z]| Pt3::new(x, y, z)).collect();
    let normals = reader
        .read_normals()
        .map(|it| it.map(Vec3::from).collect::<Vec<_>>());
    let indices = match reader.read_indices() {
        Some(ix) => ix.into_u32().collect(),
        None => (0..positions.len() as u32).collect(),
    };
    let [r, g, b, _] = prim.material().pbr_metallic_roughness().base_color_factor();
    Ok(Some(
        Mesh::new(positions, normals, indices)?.with_base_color([r, g, b]),
    ))
}
