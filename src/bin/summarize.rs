//! Summarize gem5 statistics of many runs into one csv table
use anyhow::Context;
use clap::Parser;
use gem5_experiments::{
    Aggregator, Flavor, RoiPolicy, RuleSet, discover_runs, new_progress_bar, preview_line,
    print_summary, write_csv, write_json,
};
use std::{fs::File, io::BufReader, path::PathBuf};

#[derive(Parser)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Run directories, parents of run directories or glob patterns
    #[arg(short, long, num_args = 1..)]
    roots: Vec<String>,

    /// A single statistics file
    #[arg(short, long)]
    stats: Option<PathBuf>,

    /// Csv destination, rows are appended to an existing file
    #[arg(short, long, default_value = "summary.csv")]
    out: PathBuf,

    /// Also dump full records as json
    #[arg(long)]
    json: Option<PathBuf>,

    /// How time counters behave across statistics dumps
    #[arg(long, value_enum, default_value_t = RoiPolicy::Delta)]
    roi_policy: RoiPolicy,

    /// Skip flavor detection
    #[arg(long, value_enum)]
    flavor: Option<Flavor>,

    /// Resolution rule tables in json, see `stats_info --dump-rules`
    #[arg(long)]
    rules: Option<PathBuf>,

    /// Statistics file name inside run directories
    #[arg(long, default_value = "stats.txt")]
    stats_name: String,

    /// Parse runs in parallel
    #[arg(short, long)]
    parallel: bool,

    /// Print the summary table
    #[arg(short, long)]
    table: bool,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Cli::parse();

    let rules: RuleSet = match &args.rules {
        Some(path) => serde_json::from_reader(BufReader::new(
            File::open(path).with_context(|| format!("unable to open {}", path.display()))?,
        ))
        .with_context(|| format!("invalid rule tables in {}", path.display()))?,
        None => RuleSet::default(),
    };
    let aggregator = Aggregator::new(&rules, args.roi_policy)?.with_flavor(args.flavor);

    let mut roots = args.roots.clone();
    if roots.is_empty() && args.stats.is_none() {
        roots.push(".".to_string());
    }
    let discovery = discover_runs(&roots, args.stats.as_deref(), &args.stats_name)?;
    println!("Found {} runs", discovery.runs.len());

    let progress = new_progress_bar(discovery.runs.len(), "runs");
    let (records, read_notices) = aggregator.process_all(&discovery.runs, args.parallel, &progress);

    for record in &records {
        println!("{}", preview_line(record));
    }
    for notice in discovery.notices.into_iter().chain(read_notices) {
        println!("NOTICE: {:#}", anyhow::Error::from(notice));
    }

    write_csv(&args.out, &records)?;
    println!("Wrote {} rows to {}", records.len(), args.out.display());
    if let Some(json) = &args.json {
        write_json(json, &records)?;
        println!("Wrote records to {}", json.display());
    }
    if args.table {
        print_summary(&records)?;
    }
    Ok(())
}
