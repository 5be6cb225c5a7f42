use super::*;
use crate::foundation::core::Pt3;
use crate::scene::graph::NodeKind;

fn fixture(name: &str) -> AssetRef {
    AssetRef::new(Path::new("tests/data").join(name))
}

#[test]
fn asset_ref_names() {
    let a = AssetRef::new("models/Chair.Final.OBJ");
    assert_eq!(a.base_name(), "Chair.Final");
    assert_eq!(a.extension().as_deref(), Some("obj"));
    assert_eq!(a.to_string(), Path::new("models/Chair.Final.OBJ").display().to_string());
}

#[test]
fn supported_extension_filter_is_case_insensitive() {
    assert!(is_supported_asset(Path::new("a.obj")));
    assert!(is_supported_asset(Path::new("a.GLB")));
    assert!(is_supported_asset(Path::new("dir/a.gltf")));
    assert!(!is_supported_asset(Path::new("a.usdz")));
    assert!(!is_supported_asset(Path::new("obj")));
}

#[test]
fn obj_models_become_top_level_mesh_nodes() {
    let scene = FileSceneLoader.load(&fixture("two_parts.obj")).unwrap();
    let top = scene.node(scene.root()).children();
    assert_eq!(top.len(), 2);
    let names: Vec<&str> = top.iter().map(|&id| scene.node(id).name.as_str()).collect();
    assert_eq!(names, vec!["left", "right"]);
    for &id in top {
        assert!(matches!(scene.node(id).kind, NodeKind::Mesh(_)));
    }
    let s = scene.bounding_sphere();
    assert!((s.center - Pt3::new(0.0, 0.5, 0.0)).norm() < 1e-5);
}

#[test]
fn obj_quads_are_triangulated() {
    let scene = FileSceneLoader.load(&fixture("cube.obj")).unwrap();
    assert_eq!(scene.meshes().len(), 1);
    assert_eq!(scene.meshes()[0].triangle_count(), 12);
}

#[test]
fn gltf_hierarchy_meshes_and_cameras_are_imported() {
    let scene = FileSceneLoader.load(&fixture("triangle.gltf")).unwrap();
    assert_eq!(scene.meshes().len(), 1);
    assert_eq!(scene.meshes()[0].base_color, [1.0, 0.0, 0.0]);

    let cams = scene.cameras();
    assert_eq!(cams.len(), 1);
    assert!((cams[0].1.znear - 0.1).abs() < 1e-6);
    assert!((cams[0].1.zfar - 500.0).abs() < 1e-3);

    // Camera at z=50 must not stretch the geometry bound.
    let s = scene.bounding_sphere();
    assert!((s.center - Pt3::new(1.0, 1.0, -2.0)).norm() < 1e-5);
    assert!(s.radius < 2.0);
}

#[test]
fn gltf_perspective_cameras_keep_their_projection() {
    use crate::scene::camera::DEFAULT_ZFAR;

    let scene = FileSceneLoader.load(&fixture("cameras.gltf")).unwrap();
    let cams = scene.cameras();
    assert_eq!(cams.len(), 2);
    let by_name = |name: &str| {
        cams.iter()
            .find(|(id, _, _)| scene.node(*id).name == name)
            .copied()
            .unwrap()
    };

    let (finite, cam, _) = by_name("finite_cam");
    assert!((cam.yfov_deg - 0.5f32.to_degrees()).abs() < 1e-4);
    assert!((cam.znear - 0.25).abs() < 1e-6);
    assert!((cam.zfar - 120.0).abs() < 1e-4);
    assert!(cam.look_at.is_none());
    assert!((scene.world_position(finite) - Pt3::new(0.0, 5.0, 30.0)).norm() < 1e-5);

    let (_, cam, _) = by_name("infinite_cam");
    assert!((cam.yfov_deg - 1.0f32.to_degrees()).abs() < 1e-4);
    assert!((cam.znear - 2.0).abs() < 1e-6);
    assert_eq!(cam.zfar, DEFAULT_ZFAR);

    assert!(scene.meshes().is_empty());
    assert_eq!(scene.bounding_sphere().radius, 0.0);
}

#[test]
fn corrupt_missing_and_unsupported_files_fail_to_load() {
    for name in ["corrupt.obj", "does_not_exist.obj"] {
        let err = FileSceneLoader.load(&fixture(name)).unwrap_err();
        assert!(err.to_string().starts_with("load error:"), "{err}");
    }
    let err = FileSceneLoader
        .load(&AssetRef::new("Cargo.toml"))
        .unwrap_err();
    assert!(err.to_string().contains("unsupported asset format"), "{err}");
}
