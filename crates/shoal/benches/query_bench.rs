use criterion::{black_box, criterion_group, criterion_main, Criterion};
use glam::Vec3;
use shoal::{Capability, EntityId, GridConfig, SpatialIndex, Team, TeamFilter, Trackable};

/// Scatters `count` contacts over a square of side `extent` on a fixed lattice.
fn populated_index(cell_size: f32, count: u64, extent: f32) -> SpatialIndex {
    let mut index = SpatialIndex::new(GridConfig::new(cell_size)).unwrap();
    let side = (count as f32).sqrt().ceil() as u64;
    for i in 0..count {
        let x = (i % side) as f32 / side as f32 * extent - extent / 2.0;
        let z = (i / side) as f32 / side as f32 * extent - extent / 2.0;
        let team = Team((i % 3) as u8);
        index.register(
            Trackable::new(EntityId::new(i), team, Capability::SURFACE),
            Vec3::new(x, 0.0, z),
        );
    }
    index
}

fn bench_query_range(c: &mut Criterion) {
    // ~2,500 contacts over a 100km box with 2km cells
    let index = populated_index(2000.0, 2500, 100_000.0);

    c.bench_function("query_range_10km", |b| {
        b.iter(|| {
            black_box(index.query_range(
                black_box(Vec3::ZERO),
                10_000.0,
                TeamFilter::Not(Team(0)),
                Capability::SURFACE,
            ))
        })
    });
}

fn bench_nearest(c: &mut Criterion) {
    let index = populated_index(2000.0, 2500, 100_000.0);

    c.bench_function("nearest_25km", |b| {
        b.iter(|| {
            black_box(index.nearest(
                black_box(Vec3::new(1234.0, 0.0, -4321.0)),
                25_000.0,
                TeamFilter::Not(Team(1)),
                Capability::all(),
            ))
        })
    });
}

fn bench_update_position(c: &mut Criterion) {
    let mut index = populated_index(2000.0, 2500, 100_000.0);
    let mut step = 0u64;

    c.bench_function("update_position_cross_cell", |b| {
        b.iter(|| {
            step = step.wrapping_add(1);
            let x = (step % 50) as f32 * 2000.0 - 50_000.0;
            index.update_position(black_box(EntityId::new(step % 2500)), Vec3::new(x, 0.0, 0.0));
        })
    });
}

criterion_group!(benches, bench_query_range, bench_nearest, bench_update_position);
criterion_main!(benches);
