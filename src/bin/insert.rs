//! Inserts tuples, one per stdin line, into an existing relation.

use std::io::{self, BufRead};

use anyhow::Context;
use clap::Parser;

#[derive(Parser)]
struct Args {
    /// Relation base name
    name: String,
}

fn run() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut rel = malhf::Relation::open(&args.name, true).with_context(|| format!("opening relation {:?}", args.name))?;

    let stdin = io::stdin();
    let mut inserted = 0u64;
    for (lineno, line) in stdin.lock().lines().enumerate() {
        let line = line.with_context(|| format!("reading stdin line {}", lineno + 1))?;
        if line.is_empty() {
            continue;
        }
        let tuple = malhf::Tuple::parse(&line, rel.nattrs() as usize)
            .with_context(|| format!("parsing tuple on line {}: {line:?}", lineno + 1))?;
        rel.insert(&tuple)
            .with_context(|| format!("inserting tuple on line {}: {line:?}", lineno + 1))?;
        inserted += 1;
    }

    rel.close().context("closing relation after insert")?;
    log::info!("inserted {inserted} tuples into {:?}", args.name);
    println!("inserted {inserted} tuples");
    Ok(())
}

fn main() {
    env_logger::init();
    if let Err(err) = run() {
        log::error!("{err:?}");
        std::process::exit(1);
    }
}
