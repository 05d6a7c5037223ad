use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::Context;
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use log::info;
use rand::{rngs::StdRng, SeedableRng};

use tile_merge::config::Settings;
use tile_merge::engine::{Board, Direction};
use tile_merge::record::GameRecord;
use tile_merge::search::{Sampler, SamplerParallel, SearchStats};

#[derive(Parser, Debug)]
#[command(name = "tile-merge", version, about = "Let the sampling bot play one game")]
struct Args {
    /// TOML settings file; flags below override it
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,
    #[arg(long)]
    width: Option<usize>,
    #[arg(long)]
    height: Option<usize>,
    /// Sampling iterations per decision
    #[arg(long)]
    iterations: Option<u32>,
    /// Look-ahead depth below each root move
    #[arg(long)]
    depth: Option<u32>,
    /// RNG seed for a reproducible game
    #[arg(long)]
    seed: Option<u64>,
    /// Spread sampling iterations over all cores
    #[arg(long, default_value_t = false)]
    parallel: bool,
    /// Stop after this many moves
    #[arg(long)]
    max_moves: Option<u64>,
    /// Write a JSON game record here
    #[arg(long, value_name = "FILE")]
    record: Option<PathBuf>,
    /// Show a status line instead of printing every board
    #[arg(long, default_value_t = false)]
    quiet: bool,
}

enum Policy {
    Sequential(Sampler),
    Parallel(SamplerParallel),
}

impl Policy {
    fn play(&mut self, board: &mut Board, rng: &mut StdRng) -> Option<Direction> {
        match self {
            Policy::Sequential(s) => s.choose_best_move(board, rng),
            Policy::Parallel(s) => s.choose_best_move(board, rng),
        }
    }

    fn last_stats(&self) -> SearchStats {
        match self {
            Policy::Sequential(s) => s.last_stats(),
            Policy::Parallel(s) => s.last_stats(),
        }
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let mut settings = match &args.config {
        Some(path) => Settings::load(path).with_context(|| format!("loading {}", path.display()))?,
        None => Settings::default(),
    };
    if let Some(w) = args.width { settings.game.width = w; }
    if let Some(h) = args.height { settings.game.height = h; }
    if let Some(n) = args.iterations { settings.search.iterations = n; }
    if let Some(d) = args.depth { settings.search.depth = d; }
    settings.validate().context("invalid settings")?;

    let mut rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let mut board = settings.game.new_board(&mut rng)?;
    let mut policy = if args.parallel {
        Policy::Parallel(SamplerParallel::with_config(settings.search))
    } else {
        Policy::Sequential(Sampler::with_config(settings.search))
    };
    let engine_str = format!(
        "sampler iterations={} depth={}{}",
        settings.search.iterations,
        settings.search.depth,
        if args.parallel { " parallel" } else { "" }
    );
    let mut record = args.record.as_ref().map(|_| GameRecord::begin(&board, Some(engine_str.clone())));

    info!("{}x{} game, {}", board.width(), board.height(), engine_str);
    let pb = if args.quiet {
        let pb = ProgressBar::new_spinner();
        pb.set_style(ProgressStyle::with_template("{spinner} {elapsed_precise} | Moves: {msg}")?);
        pb.enable_steady_tick(Duration::from_millis(120));
        Some(pb)
    } else {
        println!("{}", board);
        None
    };

    let start = Instant::now();
    let mut total_evaluations: u64 = 0;
    let mut peak_evaluations: u64 = 0;
    let mut announced_win = false;
    while !board.is_game_over() {
        if args.max_moves.is_some_and(|max| board.move_count() >= max) {
            info!("stopping at the {} move limit", board.move_count());
            break;
        }
        let Some(dir) = policy.play(&mut board, &mut rng) else { break };
        let stats = policy.last_stats();
        total_evaluations = total_evaluations.saturating_add(stats.evaluations);
        peak_evaluations = peak_evaluations.max(stats.evaluations);
        if let Some(rec) = record.as_mut() {
            rec.push(dir, &board);
        }
        if board.has_won() && !announced_win {
            announced_win = true;
            info!("reached {} after {} moves", board.rules().winning_tile(), board.move_count());
        }
        match &pb {
            Some(pb) => pb.set_message(format!("{} | score: {}", board.move_count(), board.score())),
            None => println!("{}", board),
        }
    }
    if let Some(pb) = pb {
        pb.finish_and_clear();
    }
    let elapsed = start.elapsed().as_secs_f32();

    if let (Some(rec), Some(path)) = (record.as_mut(), args.record.as_ref()) {
        rec.finish(&board, elapsed);
        rec.write_file(path).with_context(|| format!("writing {}", path.display()))?;
        info!("record written to {}", path.display());
    }

    info!("game finished in {:.1}s", elapsed);
    println!(
        "Moves made: {}, Score: {}, Highest tile: {}, Won: {}, Boards evaluated: {}, Max boards evaluated for a move: {}",
        board.move_count(),
        board.score(),
        board.highest_tile(),
        board.has_won(),
        total_evaluations,
        peak_evaluations
    );
    Ok(())
}
