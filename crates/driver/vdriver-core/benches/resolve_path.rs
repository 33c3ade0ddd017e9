use criterion::{black_box, criterion_group, criterion_main, Criterion};
use vdriver_core::{classify, reassemble, resolve_str};
use vdriver_test_fixtures::scenes;

fn bench_resolve(c: &mut Criterion) {
    let scene = scenes::load("basic").expect("basic scene");
    let cube = scene.object_id("Cube").expect("cube");
    let paths = [
        "size",
        "items[2]",
        "data.auto_smooth_angle",
        "modifiers[\"Subdivision\"].levels",
        "modifiers[1].mid_level[1]",
    ];

    let mut group = c.benchmark_group("resolve_path");
    group.bench_function("resolve", |b| {
        b.iter(|| {
            for path in paths {
                black_box(resolve_str(&scene, cube, black_box(path)).ok());
            }
        })
    });
    group.bench_function("reassemble", |b| {
        b.iter(|| {
            for path in paths {
                black_box(reassemble(&scene, cube, black_box(path)));
            }
        })
    });
    group.bench_function("classify", |b| {
        b.iter(|| {
            for path in paths {
                black_box(classify(&scene, cube, black_box(path)));
            }
        })
    });
    group.finish();
}

criterion_group!(benches, bench_resolve);
criterion_main!(benches);
