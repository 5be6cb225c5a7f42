use super::*;

#[test]
fn rgb_hex_parse_and_format() {
    let c = Rgb8::from_hex("#FF3366").unwrap();
    assert_eq!(c, Rgb8::new(0xff, 0x33, 0x66));
    assert_eq!(c.to_hex(), "#ff3366");
    assert_eq!(Rgb8::from_hex("00ff00").unwrap(), Rgb8::new(0, 255, 0));
}

#[test]
fn rgb_hex_rejects_garbage() {
    assert!(Rgb8::from_hex("#fff").is_err());
    assert!(Rgb8::from_hex("#gg0000").is_err());
    assert!(Rgb8::from_hex("").is_err());
}

#[test]
fn rgb_serde_uses_hex_strings() {
    let json = serde_json::to_string(&Rgb8::new(1, 2, 3)).unwrap();
    assert_eq!(json, "\"#010203\"");
    let back: Rgb8 = serde_json::from_str("\"#0a0b0c\"").unwrap();
    assert_eq!(back, Rgb8::new(10, 11, 12));
    assert!(serde_json::from_str::<Rgb8>("\"blue\"").is_err());
}

#[test]
fn transform_matrix_applies_scale_then_rotation_then_translation() {
    let t = Transform {
        translation: Vec3::new(1.0, 2.0, 3.0),
        rotation: Quat::from_axis_angle(&Vec3::z_axis(), std::f32::consts::FRAC_PI_2),
        scale: Vec3::new(2.0, 2.0, 2.0),
    };
    let p = t.to_matrix().transform_point(&Pt3::new(1.0, 0.0, 0.0));
    assert!((p - Pt3::new(1.0, 4.0, 3.0)).norm() < 1e-5);
}

#[test]
fn default_transform_is_identity() {
    assert_eq!(Transform::default().to_matrix(), Mat4::identity());
}
