//! Inspect the blocks of one gem5 statistics file
use clap::Parser;
use cli_table::{Cell, Table, print_stdout};
use gem5_experiments::{
    BlockMarkers, Flavor, Metric, Resolver, RuleSet, format_number, ipc_cpi, load_blocks, mpki,
};
use std::path::PathBuf;

#[derive(Parser)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to statistics file
    #[arg(required_unless_present = "dump_rules")]
    stats: Option<PathBuf>,

    /// Skip flavor detection
    #[arg(long, value_enum)]
    flavor: Option<Flavor>,

    /// Print the builtin resolution rule tables as json and exit
    #[arg(long)]
    dump_rules: bool,
}

fn cell(value: Option<f64>) -> cli_table::CellStruct {
    value.map_or("-".to_string(), format_number).cell()
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Cli::parse();

    let rules = RuleSet::default();
    if args.dump_rules {
        println!("{}", serde_json::to_string_pretty(&rules)?);
        return Ok(());
    }
    let Some(stats) = args.stats else {
        return Ok(());
    };

    let resolver = Resolver::new(&rules)?;
    let blocks = load_blocks(&stats, &BlockMarkers::default())?;
    println!("Got {} blocks in {}", blocks.len(), stats.display());

    let mut table = vec![];
    for block in &blocks {
        let flavor = args
            .flavor
            .unwrap_or_else(|| resolver.detect_flavor(&block.counters));
        let get = |metric| resolver.resolve(&block.counters, flavor, metric);
        let instructions = get(Metric::Instructions);
        let (ipc, _) = ipc_cpi(
            instructions,
            get(Metric::Cycles),
            get(Metric::Ipc),
            get(Metric::Cpi),
        );
        table.push(vec![
            block.index.cell(),
            block.counters.len().cell(),
            flavor.name().cell(),
            cell(get(Metric::HostSeconds)),
            cell(get(Metric::SimSeconds)),
            cell(instructions),
            cell(ipc),
            cell(mpki(get(Metric::L1iMisses), instructions)),
            cell(mpki(get(Metric::L1dMisses), instructions)),
            cell(mpki(get(Metric::L2Misses), instructions)),
        ]);
    }
    let table = table.table().title(vec![
        "Block".cell(),
        "# Counters".cell(),
        "Flavor".cell(),
        "hostSeconds".cell(),
        "simSeconds".cell(),
        "simInsts".cell(),
        "IPC".cell(),
        "L1I MPKI".cell(),
        "L1D MPKI".cell(),
        "L2 MPKI".cell(),
    ]);
    print_stdout(table)?;
    Ok(())
}
