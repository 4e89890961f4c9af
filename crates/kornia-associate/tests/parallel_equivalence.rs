use kornia_associate::{
    factory, score::ScoreEuclideanSq, Associate, AssociateDescription, AssociateError,
    AssociateGreedy, AssociateGreedy2D, AssociatedIndex, ConfigAssociateGreedy,
    ConfigAssociateNearestNeighbor, ExecutionStrategy, GreedyMatches, Location, MaxDistance,
};
use rand::{rngs::StdRng, Rng, SeedableRng};

const NUM_FEATURES: usize = 200;

const PARALLEL: [ExecutionStrategy; 3] = [
    ExecutionStrategy::ParallelElements,
    ExecutionStrategy::ParallelBlocks(16),
    ExecutionStrategy::Fixed(3),
];

type Desc = [f64; 4];

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn random_descriptors(rng: &mut StdRng, n: usize) -> Vec<Desc> {
    (0..n)
        .map(|_| std::array::from_fn(|_| rng.random_range(0.0..10.0)))
        .collect()
}

fn random_locations(rng: &mut StdRng, n: usize) -> Vec<Location> {
    (0..n)
        .map(|_| [rng.random_range(0.0..100.0), rng.random_range(0.0..100.0)])
        .collect()
}

struct Dataset {
    src: Vec<Desc>,
    dst: Vec<Desc>,
    src_locations: Vec<Location>,
    dst_locations: Vec<Location>,
}

fn dataset() -> Dataset {
    let mut rng = StdRng::seed_from_u64(0xDEAD_BEEF);
    Dataset {
        src: random_descriptors(&mut rng, NUM_FEATURES),
        dst: random_descriptors(&mut rng, NUM_FEATURES),
        src_locations: random_locations(&mut rng, NUM_FEATURES),
        dst_locations: random_locations(&mut rng, NUM_FEATURES),
    }
}

fn greedy_config(
    backwards: bool,
    ratio: f64,
    strategy: ExecutionStrategy,
) -> ConfigAssociateGreedy {
    ConfigAssociateGreedy {
        backwards_validation: backwards,
        score_ratio_threshold: ratio,
        max_distance: MaxDistance::Absolute(20.0),
        strategy,
        ..Default::default()
    }
}

fn nn_config(ratio: f64, strategy: ExecutionStrategy) -> ConfigAssociateNearestNeighbor {
    ConfigAssociateNearestNeighbor {
        score_ratio_threshold: ratio,
        ratio_uses_sqrt: ratio < 1.0,
        max_error_threshold: None,
        strategy,
    }
}

fn run_greedy(
    data: &Dataset,
    config: &ConfigAssociateGreedy,
) -> Result<GreedyMatches, AssociateError> {
    AssociateGreedy::new(ScoreEuclideanSq, config)?.associate(&data.src, &data.dst)
}

fn run_greedy_2d(
    data: &Dataset,
    config: &ConfigAssociateGreedy,
) -> Result<GreedyMatches, AssociateError> {
    AssociateGreedy2D::new(ScoreEuclideanSq, config)?.associate(
        &data.src_locations,
        &data.src,
        &data.dst_locations,
        &data.dst,
    )
}

fn run_nn<A: AssociateDescription<Desc>>(
    mut alg: A,
    data: &Dataset,
) -> Result<Vec<AssociatedIndex>, AssociateError> {
    alg.set_source(&data.src);
    alg.set_destination(&data.dst);
    alg.associate()?;
    Ok(alg.matches().to_vec())
}

#[test]
fn test_greedy_parallel_equals_serial() -> Result<(), AssociateError> {
    init_logger();
    let data = dataset();
    for backwards in [false, true] {
        for ratio in [1.0, 0.1] {
            let expected = run_greedy(
                &data,
                &greedy_config(backwards, ratio, ExecutionStrategy::Serial),
            )?;
            if ratio >= 1.0 {
                assert!(expected.num_matched() > 0);
            }
            for strategy in PARALLEL {
                let found = run_greedy(&data, &greedy_config(backwards, ratio, strategy))?;
                assert_eq!(expected, found, "{strategy:?} backwards={backwards} ratio={ratio}");
            }
        }
    }
    Ok(())
}

#[test]
fn test_greedy_2d_parallel_equals_serial() -> Result<(), AssociateError> {
    init_logger();
    let data = dataset();
    for backwards in [false, true] {
        for ratio in [1.0, 0.1] {
            let expected = run_greedy_2d(
                &data,
                &greedy_config(backwards, ratio, ExecutionStrategy::Serial),
            )?;
            for strategy in PARALLEL {
                let found = run_greedy_2d(&data, &greedy_config(backwards, ratio, strategy))?;
                assert_eq!(expected, found, "{strategy:?} backwards={backwards} ratio={ratio}");
            }
        }
    }
    Ok(())
}

#[test]
fn test_nearest_neighbor_parallel_equals_serial() -> Result<(), AssociateError> {
    init_logger();
    let data = dataset();
    for ratio in [1.0, 0.1] {
        let serial = nn_config(ratio, ExecutionStrategy::Serial);
        let exhaustive = factory::exhaustive::<Desc, _>(&serial, ScoreEuclideanSq)?;
        let expected_ex = run_nn(exhaustive, &data)?;
        let expected_kd = run_nn(factory::kd_tree::<4>(&serial)?, &data)?;

        // every source finds a neighbor when the ratio test is disabled
        if ratio >= 1.0 {
            assert_eq!(expected_ex.len(), NUM_FEATURES);
        }
        assert_eq!(expected_ex.len(), expected_kd.len());

        for strategy in PARALLEL {
            let config = nn_config(ratio, strategy);
            let exhaustive = factory::exhaustive::<Desc, _>(&config, ScoreEuclideanSq)?;
            let found_ex = run_nn(exhaustive, &data)?;
            let found_kd = run_nn(factory::kd_tree::<4>(&config)?, &data)?;
            assert_eq!(expected_ex, found_ex, "exhaustive {strategy:?} ratio={ratio}");
            assert_eq!(expected_kd, found_kd, "kd-tree {strategy:?} ratio={ratio}");
        }
    }
    Ok(())
}

#[test]
fn test_invalid_strategy_fails() -> Result<(), AssociateError> {
    let data = dataset();
    let config = greedy_config(true, 1.0, ExecutionStrategy::Fixed(0));
    assert!(matches!(
        run_greedy(&data, &config),
        Err(AssociateError::Parallel(_))
    ));

    let config = nn_config(1.0, ExecutionStrategy::ParallelBlocks(0));
    assert!(matches!(
        run_nn(factory::kd_tree::<4>(&config)?, &data),
        Err(AssociateError::Parallel(_))
    ));
    Ok(())
}
