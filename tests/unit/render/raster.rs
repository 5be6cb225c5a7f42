use super::*;

fn tri(a: [f32; 3], b: [f32; 3], c: [f32; 3]) -> [Pt3; 3] {
    [Pt3::from(a), Pt3::from(b), Pt3::from(c)]
}

fn refs(tris: &[[Pt3; 3]]) -> impl Iterator<Item = [&Pt3; 3]> + '_ {
    tris.iter().map(|t| [&t[0], &t[1], &t[2]])
}

fn run(tris: &[[Pt3; 3]], w: u32, h: u32, aa: Antialiasing) -> Vec<Sample> {
    let projected = project(refs(tris), &Mat4::identity(), w, h);
    rasterize(&projected, w, h, sample_offsets(aa))
}

#[test]
fn sample_patterns_match_levels() {
    assert_eq!(sample_offsets(Antialiasing::None).len(), 1);
    assert_eq!(sample_offsets(Antialiasing::X2).len(), 2);
    assert_eq!(sample_offsets(Antialiasing::X4).len(), 4);
    for aa in [Antialiasing::None, Antialiasing::X2, Antialiasing::X4] {
        assert_eq!(sample_offsets(aa).len(), aa.samples());
        for [x, y] in sample_offsets(aa) {
            assert!((0.0..1.0).contains(x) && (0.0..1.0).contains(y));
        }
    }
}

#[test]
fn full_screen_quad_covers_every_sample() {
    let quad = [
        tri([-1.0, -1.0, 0.0], [1.0, -1.0, 0.0], [1.0, 1.0, 0.0]),
        tri([-1.0, -1.0, 0.0], [1.0, 1.0, 0.0], [-1.0, 1.0, 0.0]),
    ];
    let samples = run(&quad, 37, 21, Antialiasing::X4);
    assert_eq!(samples.len(), 37 * 21 * 4);
    for s in &samples {
        let (_, bary) = s.covered().unwrap();
        assert!((bary.sum() - 1.0).abs() < 1e-4);
        assert!(bary.iter().all(|&b| b > -1e-4));
    }
}

#[test]
fn winding_does_not_matter() {
    let ccw = [tri([-1.0, -1.0, 0.0], [1.0, -1.0, 0.0], [0.0, 1.0, 0.0])];
    let cw = [tri([-1.0, -1.0, 0.0], [0.0, 1.0, 0.0], [1.0, -1.0, 0.0])];
    let a = run(&ccw, 16, 16, Antialiasing::None);
    let b = run(&cw, 16, 16, Antialiasing::None);
    let covered = |v: &[Sample]| v.iter().filter(|s| s.covered().is_some()).count();
    assert!(covered(&a) > 0);
    assert_eq!(covered(&a), covered(&b));
}

#[test]
fn nearer_triangle_wins() {
    let tris = [
        tri([-1.0, -1.0, 0.5], [3.0, -1.0, 0.5], [-1.0, 3.0, 0.5]),
        tri([-1.0, -1.0, -0.5], [3.0, -1.0, -0.5], [-1.0, 3.0, -0.5]),
    ];
    let samples = run(&tris, 8, 8, Antialiasing::None);
    for s in &samples {
        assert_eq!(s.triangle, 1);
        assert!((s.depth + 0.5).abs() < 1e-5);
    }
}

#[test]
fn geometry_behind_the_near_plane_is_clipped() {
    let behind = [tri([-1.0, -1.0, -2.0], [3.0, -1.0, -2.0], [-1.0, 3.0, -2.0])];
    assert!(project(refs(&behind), &Mat4::identity(), 8, 8).is_empty());

    // One corner behind the near plane: the rest is still drawn.
    let crossing = [tri([-1.0, -1.0, 0.0], [1.0, -1.0, 0.0], [0.0, 1.0, -3.0])];
    let samples = run(&crossing, 16, 16, Antialiasing::None);
    let covered = samples.iter().filter(|s| s.covered().is_some()).count();
    assert!(covered > 0 && covered < 16 * 16);
}

#[test]
fn off_screen_triangles_are_dropped() {
    let far_right = [tri([2.0, -1.0, 0.0], [4.0, -1.0, 0.0], [3.0, 1.0, 0.0])];
    assert!(project(refs(&far_right), &Mat4::identity(), 8, 8).is_empty());
}
