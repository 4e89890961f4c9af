use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use kornia_associate::score::ScoreEuclideanSq;
use kornia_associate::{
    factory, Associate, AssociateDescription, AssociateGreedy, ConfigAssociateGreedy,
    ConfigAssociateNearestNeighbor, ExecutionStrategy,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

type Desc = [f64; 32];

fn random_descriptors(n: usize, seed: u64) -> Vec<Desc> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..n)
        .map(|_| std::array::from_fn(|_| rng.random_range(0.0..10.0)))
        .collect()
}

const STRATEGIES: [(&str, ExecutionStrategy); 4] = [
    ("serial", ExecutionStrategy::Serial),
    ("parallel_elements", ExecutionStrategy::ParallelElements),
    ("parallel_blocks_32", ExecutionStrategy::ParallelBlocks(32)),
    ("fixed_4", ExecutionStrategy::Fixed(4)),
];

fn bench_greedy(c: &mut Criterion) {
    let mut group = c.benchmark_group("associate_greedy");
    for &n in &[100usize, 500, 1000] {
        let src = random_descriptors(n, 42);
        let dst = random_descriptors(n, 43);
        group.throughput(Throughput::Elements((n * n) as u64));

        for (name, strategy) in STRATEGIES {
            let config = ConfigAssociateGreedy {
                score_ratio_threshold: 0.8,
                strategy,
                ..Default::default()
            };
            let alg = AssociateGreedy::new(ScoreEuclideanSq, &config).unwrap();
            group.bench_with_input(BenchmarkId::new(name, n), &n, |b, _| {
                b.iter(|| {
                    let matches = alg.associate(&src, &dst).unwrap();
                    std::hint::black_box(matches);
                })
            });
        }
    }
    group.finish();
}

fn bench_nearest_neighbor(c: &mut Criterion) {
    let mut group = c.benchmark_group("associate_kd_tree");
    for &n in &[1000usize, 10000] {
        let src = random_descriptors(n, 42);
        let dst = random_descriptors(n, 43);
        group.throughput(Throughput::Elements(n as u64));

        for (name, strategy) in STRATEGIES {
            let config = ConfigAssociateNearestNeighbor {
                strategy,
                ..Default::default()
            };
            let mut alg = factory::kd_tree::<32>(&config).unwrap();
            alg.set_source(&src);
            alg.set_destination(&dst);
            group.bench_with_input(BenchmarkId::new(name, n), &n, |b, _| {
                b.iter(|| {
                    alg.associate().unwrap();
                    std::hint::black_box(alg.matches().len());
                })
            });
        }
    }
    group.finish();
}

criterion_group!(benches, bench_greedy, bench_nearest_neighbor);
criterion_main!(benches);
