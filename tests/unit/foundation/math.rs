use super::*;
use std::f32::consts::{FRAC_PI_2, PI};

fn approx(a: &Vec3, b: &Vec3) -> bool {
    (a - b).norm() < 1e-5
}

#[test]
fn degree_conversions_roundtrip() {
    assert!((deg_to_rad(180.0) - PI).abs() < 1e-6);
    assert!((rad_to_deg(FRAC_PI_2) - 90.0).abs() < 1e-4);
}

#[test]
fn euler_xyz_is_intrinsic_x_then_y_then_z() {
    let q = euler_xyz(FRAC_PI_2, FRAC_PI_2, 0.0);
    let expected = Quat::from_axis_angle(&Vec3::x_axis(), FRAC_PI_2)
        * Quat::from_axis_angle(&Vec3::y_axis(), FRAC_PI_2);
    assert!((q.coords - expected.coords).norm() < 1e-6);

    // Intrinsic X then Y: the Y turn happens about the already-rotated Y axis.
    assert!(approx(&(q * Vec3::x()), &Vec3::new(0.0, 1.0, 0.0)));
}

#[test]
fn euler_zero_is_identity() {
    assert!(euler_xyz(0.0, 0.0, 0.0).angle() < 1e-7);
}

#[test]
fn look_rotation_points_negative_z_at_target() {
    let eye = Pt3::new(-15.0, 10.0, 10.0);
    let q = look_rotation(&eye, &Pt3::origin(), &Vec3::y());
    let forward = q * -Vec3::z();
    assert!(approx(&forward, &(Pt3::origin() - eye).normalize()));
}

#[test]
fn look_rotation_handles_straight_down() {
    let eye = Pt3::new(0.0, 20.0, 0.0);
    let q = look_rotation(&eye, &Pt3::origin(), &Vec3::y());
    assert!(approx(&(q * -Vec3::z()), &Vec3::new(0.0, -1.0, 0.0)));
}

#[test]
fn bounding_sphere_uses_box_center_and_farthest_point() {
    let pts = [
        Pt3::new(10.0, 0.0, 0.0),
        Pt3::new(-10.0, 0.0, 0.0),
        Pt3::new(0.0, 4.0, 0.0),
        Pt3::new(0.0, -4.0, 2.0),
    ];
    let s = BoundingSphere::from_points(pts.iter());
    assert!((s.center - Pt3::new(0.0, 0.0, 1.0)).norm() < 1e-6);
    assert!((s.radius - (100.0f32 + 1.0).sqrt()).abs() < 1e-5);
}

#[test]
fn bounding_sphere_of_nothing_is_empty() {
    let s = BoundingSphere::from_points(std::iter::empty::<&Pt3>());
    assert_eq!(s, BoundingSphere::empty());
    assert_eq!(s.effective_radius(), 1.0);
}

#[test]
fn effective_radius_floors_at_one() {
    for r in [0.0f32, 0.25, 0.999, 1.0, 3.5, 1000.0] {
        assert_eq!(effective_radius(r), r.max(1.0));
    }
    assert_eq!(effective_radius(f32::NAN), 1.0);
}

#[test]
fn normal_matrix_undoes_non_uniform_scale() {
    let m = Mat4::new_nonuniform_scaling(&Vec3::new(2.0, 1.0, 4.0));
    let n = normal_matrix(&m) * Vec3::new(1.0, 1.0, 1.0);
    assert!(approx(&n, &Vec3::new(0.5, 1.0, 0.25)), "{n:?}");

    // A singular block falls back to itself.
    let flat = Mat4::new_nonuniform_scaling(&Vec3::new(1.0, 0.0, 1.0));
    assert_eq!(normal_matrix(&flat), flat.fixed_view::<3, 3>(0, 0).into_owned());
}
