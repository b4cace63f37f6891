use foothold_geom::{CameraView, IncrementalFrustum, Vec3};
use proptest::prelude::*;

fn arb_view() -> impl Strategy<Value = CameraView> {
    (
        (-50.0f32..50.0, -10.0f32..60.0, -50.0f32..50.0),
        -180.0f32..180.0,
        -89.0f32..89.0,
        30.0f32..110.0,
        0.5f32..2.5,
        0.01f32..1.0,
    )
        .prop_map(|((px, py, pz), yaw, pitch, fov, aspect, near)| {
            CameraView::from_yaw_pitch(Vec3::new(px, py, pz), yaw, pitch, fov, aspect, near, 1000.0)
        })
}

fn offset() -> impl Strategy<Value = Vec3> {
    (-30.0f32..30.0, -30.0f32..30.0, -30.0f32..30.0).prop_map(|(x, y, z)| Vec3::new(x, y, z))
}

proptest! {
    // Incremental test accepts exactly what the direct test accepts
    #[test]
    fn incremental_agrees_with_direct(view in arb_view(), far in 5.0f32..28.0, d in offset()) {
        let mut f = IncrementalFrustum::new(&view, Some(far));
        let p = view.position + d;
        f.prepare_x(p.x);
        f.prepare_xz(p.z);
        prop_assert_eq!(f.contains_y(p.y), f.contains(p));
    }

    // Same agreement along a grid sweep that reuses the x partials
    #[test]
    fn grid_sweep_agrees_with_direct(view in arb_view(), far in 5.0f32..28.0) {
        let mut f = IncrementalFrustum::new(&view, Some(far));
        let c = view.position;
        for ix in -12..=12 {
            let x = (c.x / 0.5).round() * 0.5 + ix as f32 * 0.5;
            f.prepare_x(x);
            for iz in -12..=12 {
                let z = (c.z / 0.5).round() * 0.5 + iz as f32 * 0.5;
                f.prepare_xz(z);
                for iy in -8..=8 {
                    let y = c.y + iy as f32 * 0.7;
                    prop_assert_eq!(f.contains_y(y), f.contains(Vec3::new(x, y, z)));
                }
            }
        }
    }

    // Anything inside lies within the horizontal bounding box
    #[test]
    fn contained_points_lie_in_xz_bounds(view in arb_view(), far in 5.0f32..28.0, d in offset()) {
        let f = IncrementalFrustum::new(&view, Some(far));
        let p = view.position + d;
        if f.contains(p) {
            let (min_x, max_x, min_z, max_z) = f.xz_bounds();
            let eps = 1e-3;
            prop_assert!(p.x >= min_x - eps && p.x <= max_x + eps);
            prop_assert!(p.z >= min_z - eps && p.z <= max_z + eps);
        }
    }

    // Quantized bounds always enclose the float bounds
    #[test]
    fn quantized_bounds_enclose(view in arb_view(), far in 5.0f32..28.0, step in 1i32..=20) {
        let f = IncrementalFrustum::new(&view, Some(far));
        let (min_x, max_x, min_z, max_z) = f.xz_bounds();
        let r = f.quantized_xz_bounds(step);
        let spacing = step as f32 / 10.0;
        prop_assert!(r.min_x as f32 / 10.0 <= min_x + 1e-3);
        prop_assert!(r.min_z as f32 / 10.0 <= min_z + 1e-3);
        prop_assert!((r.max_x - step) as f32 / 10.0 >= max_x - 1e-3);
        prop_assert!((r.max_z - step) as f32 / 10.0 >= max_z - 1e-3);
        prop_assert!(r.width() as f32 / 10.0 <= (max_x - min_x) + 3.0 * spacing + 1e-3);
    }
}
