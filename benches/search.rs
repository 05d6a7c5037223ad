use criterion::{criterion_group, criterion_main, Criterion};
use rand::{rngs::StdRng, SeedableRng};
use rayon::ThreadPoolBuilder;
use std::hint::black_box;
use tile_merge::engine::{Board, Direction};
use tile_merge::search::{Sampler, SamplerParallel, SearchConfig};

fn corpus() -> Vec<Board> {
    let mut rng = StdRng::seed_from_u64(7777);
    let mut boards = Vec::new();
    let mut b = Board::new(4, 4, &mut rng).unwrap();
    for i in 0..16 {
        b.make_move(Direction::ALL[i % 4], &mut rng);
        boards.push(b.clone());
    }
    boards
}

fn bench_samplers(c: &mut Criterion) {
    let boards = corpus();
    let cfg = SearchConfig { iterations: 4, depth: 2, ..SearchConfig::default() };

    c.bench_function("sampler_seq/evaluate_directions", |bch| {
        let mut s = Sampler::with_config(cfg);
        let mut rng = StdRng::seed_from_u64(1);
        bch.iter(|| {
            let mut acc = 0.0;
            for bd in &boards {
                for d in s.evaluate_directions(bd, &mut rng).branches {
                    if d.valid { acc += d.score; }
                }
            }
            black_box(acc)
        })
    });

    // Pin a small pool for stability
    let pool = ThreadPoolBuilder::new().num_threads(4).build().unwrap();
    c.bench_function("sampler_par/evaluate_directions", |bch| {
        let mut s = SamplerParallel::with_config(cfg);
        let mut rng = StdRng::seed_from_u64(1);
        bch.iter(|| pool.install(|| {
            let mut acc = 0.0;
            for bd in &boards {
                for d in s.evaluate_directions(bd, &mut rng).branches {
                    if d.valid { acc += d.score; }
                }
            }
            black_box(acc)
        }))
    });
}

criterion_group!(search, bench_samplers);
criterion_main!(search);
