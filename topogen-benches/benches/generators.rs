//! Generator throughput benchmarks.
//!
//! Each group rebuilds the topology into one reused substrate, so the
//! measured time includes the reset that precedes every build.
#![expect(
    missing_docs,
    reason = "Criterion macros generate items without doc comments"
)]
use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use rand::{SeedableRng, rngs::SmallRng};

use topogen_benches::params::{BenchSetupError, GeneratorBenchParams};
use topogen_core::{
    BoundedNetwork, ConfigurationModel, ErdosRenyi, GeometricGraph, Lattice, RegularGraph,
    TopologyError,
};

/// Seed used for every benchmark random source.
const SEED: u64 = 42;

/// Node counts to benchmark.
const NODE_COUNTS: &[usize] = &[1_000, 10_000];

/// Target degree shared by every model.
const DEGREE: usize = 4;

#[derive(Debug, thiserror::Error)]
enum BenchError {
    #[error(transparent)]
    Setup(#[from] BenchSetupError),
    #[error(transparent)]
    Topology(#[from] TopologyError),
}

fn generators_impl(c: &mut Criterion) -> Result<(), BenchError> {
    let mut group = c.benchmark_group("generators");
    group.sample_size(20);

    for &nodes in NODE_COUNTS {
        let params = GeneratorBenchParams {
            nodes,
            degree: DEGREE,
        };
        let mut network = BoundedNetwork::new(params.capacity()?);
        let mut rng = SmallRng::seed_from_u64(SEED);

        // Surface configuration errors before Criterion starts timing.
        RegularGraph::new(DEGREE).build(&mut network, &mut rng)?;

        group.bench_with_input(BenchmarkId::new("erdos_renyi", params), &params, |b, p| {
            let generator = ErdosRenyi::new().with_links(p.nodes * p.degree / 2);
            b.iter(|| generator.build(&mut network, &mut rng));
        });
        group.bench_with_input(BenchmarkId::new("regular", params), &params, |b, p| {
            let generator = RegularGraph::new(p.degree);
            b.iter(|| generator.build(&mut network, &mut rng));
        });
        group.bench_with_input(BenchmarkId::new("configuration", params), &params, |b, _| {
            let generator = ConfigurationModel::new(vec![0.25, 0.25, 0.25, 0.25]);
            b.iter(|| generator.build(&mut network, &mut rng));
        });
        group.bench_with_input(BenchmarkId::new("lattice", params), &params, |b, p| {
            let side = p.nodes / 10;
            let generator = Lattice::new([10, side]).with_periodic(true);
            b.iter(|| generator.build(&mut network, &mut rng));
        });
        group.bench_with_input(BenchmarkId::new("geometric", params), &params, |b, p| {
            let generator = GeometricGraph::new().with_mean_degree(p.degree as f64);
            b.iter(|| generator.build(&mut network, &mut rng));
        });
    }

    group.finish();
    Ok(())
}

fn generators(c: &mut Criterion) {
    if let Err(err) = generators_impl(c) {
        panic!("generator benchmark setup failed: {err}");
    }
}

criterion_group!(benches, generators);
criterion_main!(benches);
