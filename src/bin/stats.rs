//! Prints global and per-bucket statistics for a relation.

use anyhow::Context;
use clap::Parser;

#[derive(Parser)]
struct Args {
    /// Relation base name
    name: String,
    /// Emit machine-readable JSON instead of the human-readable table
    #[arg(long)]
    json: bool,
}

fn run() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut rel = malhf::Relation::open(&args.name, false).with_context(|| format!("opening relation {:?}", args.name))?;
    let stats = rel.stats().context("collecting relation stats")?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
    } else {
        print_human(&stats);
    }

    rel.close().context("closing relation after stats")?;
    Ok(())
}

fn main() {
    env_logger::init();
    if let Err(err) = run() {
        log::error!("{err:?}");
        std::process::exit(1);
    }
}

fn print_human(stats: &malhf::RelationStats) {
    println!("Global Info:");
    println!(
        "#attrs:{}  #pages:{}  #tuples:{}  d:{}  sp:{}",
        stats.nattrs, stats.npages, stats.ntups, stats.depth, stats.sp
    );
    println!("Choice vector");
    println!("{}", stats.choice_vector);
    println!("Bucket Info:");
    println!("#pages in data file : {}", stats.npages);
    for bucket in &stats.buckets {
        let chain: Vec<String> = bucket
            .chain
            .iter()
            .enumerate()
            .map(|(i, page)| {
                let tag = if i == 0 { "d" } else { "ov" };
                let ovf = page.ovflow.map(|id| id.to_string()).unwrap_or_else(|| "-".to_string());
                format!("({tag}{},{},{},{ovf})", page.page_id, page.ntuples, page.free_bytes)
            })
            .collect();
        println!("[{:>4}]  {}", bucket.bucket_id, chain.join(" -> "));
    }
}
