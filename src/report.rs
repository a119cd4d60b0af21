use crate::{RunRecord, format_number, mean_of_present};
use anyhow::Context;
use cli_table::{Cell, CellStruct, Table, print_stdout};
use log::{info, warn};
use serde::Serialize;
use size::Size;
use std::{
    fs::{File, OpenOptions},
    io::{BufRead, BufReader, BufWriter},
    path::Path,
};

/// One column of the summary csv
pub struct Column {
    pub name: &'static str,
    pub value: fn(&RunRecord) -> Option<String>,
}

impl Column {
    fn new(name: &'static str, value: fn(&RunRecord) -> Option<String>) -> Self {
        Self { name, value }
    }
}

fn num(value: Option<f64>) -> Option<String> {
    value.map(format_number)
}

fn int(value: Option<u32>) -> Option<String> {
    value.map(|value| value.to_string())
}

/// The fixed column list, identity columns first
pub fn columns() -> Vec<Column> {
    vec![
        Column::new("config", |r| Some(r.run.clone())),
        Column::new("outdir", |r| Some(r.outdir.display().to_string())),
        Column::new("flavor", |r| r.flavor.map(|f| f.name().to_string())),
        Column::new("roi_mode", |r| Some(r.roi_mode.name().to_string())),
        Column::new("blocks", |r| Some(r.blocks.to_string())),
        Column::new("cpu", |r| r.params.cpu.clone()),
        Column::new("mode", |r| r.params.mode.clone()),
        Column::new("issueWidth", |r| int(r.params.issue_width)),
        Column::new("numROBEntries", |r| int(r.params.rob_entries)),
        Column::new("LQEntries", |r| int(r.params.lq_entries)),
        Column::new("SQEntries", |r| int(r.params.sq_entries)),
        Column::new("numCores", |r| int(r.params.cores)),
        Column::new("l1dSize", |r| r.params.l1d_size.clone()),
        Column::new("l1iSize", |r| r.params.l1i_size.clone()),
        Column::new("l2Size", |r| r.params.l2_size.clone()),
        Column::new("hostSeconds_total", |r| num(r.metrics.host_seconds_total)),
        Column::new("hostSeconds_ROI", |r| num(r.metrics.host_seconds_roi)),
        Column::new("simSeconds_total", |r| num(r.metrics.sim_seconds_total)),
        Column::new("simSeconds_ROI", |r| num(r.metrics.sim_seconds_roi)),
        Column::new("simInsts", |r| num(r.metrics.instructions)),
        Column::new("cycles", |r| num(r.metrics.cycles)),
        Column::new("IPC", |r| num(r.metrics.ipc)),
        Column::new("CPI", |r| num(r.metrics.cpi)),
        Column::new("L1I_accesses", |r| num(r.metrics.l1i.accesses)),
        Column::new("L1I_misses", |r| num(r.metrics.l1i.misses)),
        Column::new("L1I_MPKI", |r| num(r.metrics.l1i.mpki)),
        Column::new("L1I_miss_rate", |r| num(r.metrics.l1i.miss_rate)),
        Column::new("L1D_accesses", |r| num(r.metrics.l1d.accesses)),
        Column::new("L1D_misses", |r| num(r.metrics.l1d.misses)),
        Column::new("L1D_MPKI", |r| num(r.metrics.l1d.mpki)),
        Column::new("L1D_miss_rate", |r| num(r.metrics.l1d.miss_rate)),
        Column::new("L1_total_MPKI", |r| num(r.metrics.l1_total_mpki)),
        Column::new("L2_accesses", |r| num(r.metrics.l2.accesses)),
        Column::new("L2_misses", |r| num(r.metrics.l2.misses)),
        Column::new("L2_MPKI", |r| num(r.metrics.l2.mpki)),
        Column::new("L2_miss_rate", |r| num(r.metrics.l2.miss_rate)),
        Column::new("TLB_accesses", |r| num(r.metrics.tlb_accesses)),
        Column::new("TLB_misses", |r| num(r.metrics.tlb_misses)),
        Column::new("TLB_miss_rate", |r| num(r.metrics.tlb_miss_rate)),
        Column::new("bytesRead", |r| num(r.metrics.bytes_read)),
        Column::new("bytesWritten", |r| num(r.metrics.bytes_written)),
        Column::new("bytesTotal", |r| num(r.metrics.bytes_total)),
        Column::new("throughput_Bps", |r| num(r.metrics.throughput)),
        Column::new("avgMemAccLat_ticks", |r| num(r.metrics.avg_mem_latency_ticks)),
        Column::new("avgMemAccLat_ns", |r| num(r.metrics.avg_mem_latency_ns)),
    ]
}

pub fn header() -> Vec<&'static str> {
    columns().iter().map(|column| column.name).collect()
}

/// Cells of one record, unresolved metrics are empty strings
pub fn row(record: &RunRecord) -> Vec<String> {
    columns()
        .iter()
        .map(|column| (column.value)(record).unwrap_or_default())
        .collect()
}

/// First line of an existing output, `None` when there is none yet
fn existing_header(path: &Path) -> anyhow::Result<Option<String>> {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(err) => return Err(err).with_context(|| format!("unable to open {}", path.display())),
    };
    let mut first = String::new();
    BufReader::new(file).read_line(&mut first)?;
    let first = first.trim_end();
    Ok((!first.is_empty()).then(|| first.to_string()))
}

/// Append records to a csv file, writing the header only into a new or
/// empty file
pub fn write_csv<P: AsRef<Path>>(path: P, records: &[RunRecord]) -> anyhow::Result<()> {
    let path = path.as_ref();
    let header = header();

    let existing = existing_header(path)?;
    if let Some(existing) = &existing {
        if *existing != header.join(",") {
            warn!(
                "{} has a different header, appending rows anyway",
                path.display()
            );
        }
    }

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("unable to open {}", path.display()))?;
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(file);
    if existing.is_none() {
        writer.write_record(&header)?;
    }
    for record in records {
        writer.write_record(row(record))?;
    }
    writer.flush()?;
    info!("wrote {} rows to {}", records.len(), path.display());
    Ok(())
}

#[derive(Serialize)]
struct Summary<'a> {
    generated_at: String,
    records: &'a [RunRecord],
}

/// Dump full records as json, including every metric field
pub fn write_json<P: AsRef<Path>>(path: P, records: &[RunRecord]) -> anyhow::Result<()> {
    let path = path.as_ref();
    let file = File::create(path).with_context(|| format!("unable to create {}", path.display()))?;
    let summary = Summary {
        generated_at: chrono::Local::now().to_rfc3339(),
        records,
    };
    serde_json::to_writer_pretty(BufWriter::new(file), &summary)?;
    Ok(())
}

/// One-line console preview of a record
pub fn preview_line(record: &RunRecord) -> String {
    let flavor = record.flavor.map_or("-", |flavor| flavor.name());
    let m = &record.metrics;
    if let (Some(insts), Some(ipc), Some(l1i), Some(l1d), Some(l2)) =
        (m.instructions, m.ipc, m.l1i.mpki, m.l1d.mpki, m.l2.mpki)
    {
        format!(
            "[{flavor}] {}: simInsts={insts:.0} IPC={ipc:.4} L1I_MPKI={l1i:.3} L1D_MPKI={l1d:.3} L2_MPKI={l2:.3}",
            record.run
        )
    } else if let Some(throughput) = m.throughput {
        let latency = m
            .avg_mem_latency_ns
            .map_or("N/A".to_string(), |latency| format!("{latency:.3} ns"));
        format!(
            "[{flavor}] {}: throughput={}/s avgMemAccLat={latency}",
            record.run,
            Size::from_bytes(throughput)
        )
    } else {
        format!("[{flavor}] {}: (partial/incomplete)", record.run)
    }
}

fn fixed(value: Option<f64>, precision: usize) -> CellStruct {
    value
        .map_or("-".to_string(), |value| format!("{value:.precision$}"))
        .cell()
}

fn percent(value: Option<f64>) -> CellStruct {
    value
        .map_or("-".to_string(), |value| format!("{:.2} %", value * 100.0))
        .cell()
}

fn bandwidth(value: Option<f64>) -> CellStruct {
    value
        .map_or("-".to_string(), |value| format!("{}/s", Size::from_bytes(value)))
        .cell()
}

/// Print a console table of the headline metrics with an average row
pub fn print_summary(records: &[RunRecord]) -> anyhow::Result<()> {
    let cwd = std::env::current_dir()?;
    let mut table = vec![];
    for record in records {
        let m = &record.metrics;
        let outdir = if record.outdir.is_absolute() {
            pathdiff::diff_paths(&record.outdir, &cwd).unwrap_or_else(|| record.outdir.clone())
        } else {
            record.outdir.clone()
        };
        table.push(vec![
            record.run.as_str().cell(),
            outdir.display().to_string().cell(),
            record.flavor.map_or("-", |flavor| flavor.name()).cell(),
            record.blocks.cell(),
            fixed(m.ipc, 4),
            fixed(m.l1i.mpki, 3),
            fixed(m.l1d.mpki, 3),
            fixed(m.l2.mpki, 3),
            percent(m.tlb_miss_rate),
            bandwidth(m.throughput),
            fixed(m.avg_mem_latency_ns, 3),
        ]);
    }

    let average = |metric: fn(&RunRecord) -> Option<f64>| {
        mean_of_present(records.iter().map(metric))
    };
    table.push(vec![
        "Average".cell(),
        "".cell(),
        "".cell(),
        format!(
            "{:.1}",
            records.iter().map(|r| r.blocks as f64).sum::<f64>() / records.len().max(1) as f64
        )
        .cell(),
        fixed(average(|r| r.metrics.ipc), 4),
        fixed(average(|r| r.metrics.l1i.mpki), 3),
        fixed(average(|r| r.metrics.l1d.mpki), 3),
        fixed(average(|r| r.metrics.l2.mpki), 3),
        percent(average(|r| r.metrics.tlb_miss_rate)),
        bandwidth(average(|r| r.metrics.throughput)),
        fixed(average(|r| r.metrics.avg_mem_latency_ns), 3),
    ]);

    let table = table.table().title(vec![
        "Config".cell(),
        "Outdir".cell(),
        "Flavor".cell(),
        "Blocks".cell(),
        "IPC".cell(),
        "L1I MPKI".cell(),
        "L1D MPKI".cell(),
        "L2 MPKI".cell(),
        "TLB miss rate".cell(),
        "Throughput".cell(),
        "Mem. latency (ns)".cell(),
    ]);
    print_stdout(table)?;
    Ok(())
}
