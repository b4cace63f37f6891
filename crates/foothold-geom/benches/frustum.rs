use criterion::{Criterion, black_box, criterion_group, criterion_main};

use foothold_geom::{CameraView, IncrementalFrustum, Vec3};

const HALF: i32 = 20;
const SPACING: f32 = 0.5;

fn view() -> CameraView {
    CameraView::from_yaw_pitch(Vec3::new(0.3, 12.0, -0.7), 35.0, -20.0, 70.0, 16.0 / 9.0, 0.3, 1000.0)
}

fn heights() -> Vec<f32> {
    (0..8).map(|i| 4.0 + i as f32 * 2.5).collect()
}

fn bench_sweep(c: &mut Criterion) {
    let mut group = c.benchmark_group("frustum_sweep_41x41x8");
    let view = view();
    let ys = heights();

    group.bench_function("incremental", |b| {
        b.iter(|| {
            let mut f = IncrementalFrustum::new(&view, Some(10.0));
            let mut inside = 0u32;
            for ix in -HALF..=HALF {
                f.prepare_x(ix as f32 * SPACING);
                for iz in -HALF..=HALF {
                    f.prepare_xz(iz as f32 * SPACING);
                    for &y in &ys {
                        inside += u32::from(f.contains_y(y));
                    }
                }
            }
            black_box(inside);
        })
    });

    group.bench_function("direct", |b| {
        b.iter(|| {
            let f = IncrementalFrustum::new(&view, Some(10.0));
            let mut inside = 0u32;
            for ix in -HALF..=HALF {
                for iz in -HALF..=HALF {
                    for &y in &ys {
                        let p = Vec3::new(ix as f32 * SPACING, y, iz as f32 * SPACING);
                        inside += u32::from(f.contains(p));
                    }
                }
            }
            black_box(inside);
        })
    });

    group.finish();
}

criterion_group!(benches, bench_sweep);
criterion_main!(benches);
