use clap::{Parser, ValueEnum};
use log::info;
use quintet_rooting::io::{
    rank_path, read_newick_trees, read_species_tree, write_best_tree, write_rank_file,
};
use quintet_rooting::rooting::{DEFAULT_SEED, RootingSettings, root_species_tree};
use quintet_rooting::{CostPolicy, SamplingPolicy, TopologyIndex};
use std::path::PathBuf;
use std::process;
use std::time::Instant;

/// Root an unrooted species tree from a set of gene trees by scoring every
/// possible root against 5-taxon (quintet) gene tree frequencies.
#[derive(Parser, Debug)]
#[command(name = "quintet-rooting", version, about = "Quintet-based rooting of species trees")]
struct Args {
    /// Path to the unrooted species tree (newick)
    #[arg(short = 't', long = "species-tree")]
    species_tree: PathBuf,

    /// Path to the gene trees (newick, one or more per line, optionally .gz)
    #[arg(short = 'g', long = "gene-trees")]
    gene_trees: PathBuf,

    /// Output path for the rooted species tree
    #[arg(short = 'o', long = "output")]
    output: PathBuf,

    /// Quintet sampling: d (exhaustive) | tc (triplet cover) | le | rl
    #[arg(long = "sampling", value_enum, default_value_t = SamplingArg::D)]
    sampling: SamplingArg,

    /// Cost function: d (default) | inq (inequalities only)
    #[arg(long = "cost", value_enum, default_value_t = CostArg::D)]
    cost: CostArg,

    /// Seed for random linear sampling
    #[arg(long = "seed", default_value_t = DEFAULT_SEED)]
    seed: u64,

    /// Also write every rooting with its confidence score to <output>.rank.cfn
    #[arg(long = "confidence", default_value_t = false)]
    confidence: bool,

    /// Worker threads (0 lets rayon decide)
    #[arg(long = "threads", default_value_t = 0)]
    threads: usize,

    /// Quiet mode: only warnings and errors are logged
    #[arg(short = 'q', long = "quiet", default_value_t = false)]
    quiet: bool,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum SamplingArg { D, Tc, Le, Rl }

#[derive(Copy, Clone, Debug, ValueEnum)]
enum CostArg { D, Inq }

impl From<SamplingArg> for SamplingPolicy {
    fn from(arg: SamplingArg) -> Self {
        match arg {
            SamplingArg::D => SamplingPolicy::Exhaustive,
            SamplingArg::Tc => SamplingPolicy::TripletCover,
            SamplingArg::Le => SamplingPolicy::LinearEncoding,
            SamplingArg::Rl => SamplingPolicy::RandomLinear,
        }
    }
}

impl From<CostArg> for CostPolicy {
    fn from(arg: CostArg) -> Self {
        match arg {
            CostArg::D => CostPolicy::Default,
            CostArg::Inq => CostPolicy::Inequality,
        }
    }
}

fn main() {
    let args = Args::parse();

    let default_level = if args.quiet { "warn" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    if args.threads > 0 {
        if let Err(e) = rayon::ThreadPoolBuilder::new()
            .num_threads(args.threads)
            .build_global()
        {
            eprintln!("Failed to start {} worker threads: {e}", args.threads);
            process::exit(1);
        }
    }

    // Read species and gene trees
    let t0 = Instant::now();
    let species = match read_species_tree(&args.species_tree) {
        Ok(t) => t,
        Err(e) => {
            eprintln!("Failed to read species tree {:?}: {e}", args.species_tree);
            process::exit(2);
        }
    };
    let genes = match read_newick_trees(&args.gene_trees) {
        Ok(g) => g,
        Err(e) => {
            eprintln!("Failed to read gene trees {:?}: {e}", args.gene_trees);
            process::exit(2);
        }
    };
    if genes.is_empty() {
        eprintln!("No gene trees parsed from {:?}.", args.gene_trees);
        process::exit(2);
    }
    info!("Reading in trees {:.3}s", t0.elapsed().as_secs_f64());

    let index = TopologyIndex::new();
    let settings = RootingSettings {
        sampling: args.sampling.into(),
        cost: args.cost.into(),
        seed: args.seed,
    };
    let outcome = match root_species_tree(&species, &genes, &settings, &index) {
        Ok(o) => o,
        Err(e) => {
            eprintln!("Failed to root species tree: {e}");
            process::exit(3);
        }
    };

    let t1 = Instant::now();
    if let Err(e) = write_best_tree(&args.output, &outcome.best.newick) {
        eprintln!("Failed to write output {:?}: {e}", args.output);
        process::exit(4);
    }
    if args.confidence {
        let rank = rank_path(&args.output);
        if let Err(e) = write_rank_file(&rank, &outcome.ranking) {
            eprintln!("Failed to write ranking {:?}: {e}", rank);
            process::exit(4);
        }
    }
    info!("Writing to output {:.3}s", t1.elapsed().as_secs_f64());
}
