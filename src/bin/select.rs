//! Runs a partial-match query against a relation.

use anyhow::Context;
use clap::Parser;

#[derive(Parser)]
struct Args {
    /// Relation base name
    name: String,
    /// Query pattern: one comma-separated value per attribute. `?` means
    /// "any value"; a value containing `%` is matched with SQL-LIKE-style
    /// substring wildcarding.
    pattern: String,
    /// Projection: `*` (default) or comma-separated 1-based attribute indices
    #[arg(long, default_value = "*")]
    project: String,
}

fn run() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut rel = malhf::Relation::open(&args.name, false).with_context(|| format!("opening relation {:?}", args.name))?;
    let pattern = malhf::Pattern::parse(&args.pattern, rel.nattrs() as usize).context("parsing query pattern")?;
    let projection = malhf::Projection::parse(&args.project).context("parsing projection spec")?;

    let results: Vec<malhf::Tuple> = {
        let selection = malhf::Selection::new(&mut rel, pattern).context("starting selection")?;
        selection.collect()
    };

    for tuple in &results {
        println!("{}", projection.project(tuple)?);
    }
    log::info!("matched {} tuples in {:?}", results.len(), args.name);

    rel.close().context("closing relation after select")?;
    Ok(())
}

fn main() {
    env_logger::init();
    if let Err(err) = run() {
        log::error!("{err:?}");
        std::process::exit(1);
    }
}
