use criterion::{black_box, criterion_group, criterion_main, Criterion};
use spotcount::core::RgbImage;
use spotcount::{run_pipeline, PipelineParams};

fn spotted_coat(width: usize, height: usize) -> RgbImage {
    let mut img = RgbImage::filled(width, height, [210, 170, 90]);
    for cy in (12..height - 12).step_by(24) {
        for cx in (12..width - 12).step_by(24) {
            let r = 3 + (cx + cy) % 5;
            for y in cy - r..=cy + r {
                for x in cx - r..=cx + r {
                    let dx = x as i64 - cx as i64;
                    let dy = y as i64 - cy as i64;
                    if dx * dx + dy * dy <= (r * r) as i64 {
                        img.set(x, y, [30, 25, 20]);
                    }
                }
            }
        }
    }
    img
}

fn bench_pipeline(c: &mut Criterion) {
    let img = spotted_coat(256, 192);
    let params = PipelineParams::spot_detection(30, 4, 8);
    c.bench_function("pipeline_256x192_r4_8", |b| {
        b.iter(|| run_pipeline(black_box(&img.view()), &params).expect("pipeline"))
    });
}

criterion_group!(benches, bench_pipeline);
criterion_main!(benches);
