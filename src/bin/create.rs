//! Creates a new multi-attribute linear-hashed relation.

use anyhow::Context;
use clap::Parser;

/// Create a new relation: writes `<name>.info`, `<name>.data`, `<name>.ovflow`.
#[derive(Parser)]
struct Args {
    /// Relation base name (without `.info`/`.data`/`.ovflow`)
    name: String,
    /// Number of attributes per tuple
    nattrs: u32,
    /// Initial number of primary (bucket) pages
    #[arg(default_value_t = 1)]
    initial_pages: u32,
    /// Initial linear-hashing depth
    #[arg(default_value_t = 0)]
    initial_depth: u32,
    /// Choice vector: exactly 32 comma-separated "attr:bit" entries
    choice_vector: String,
}

fn run() -> anyhow::Result<()> {
    let args = Args::parse();

    let rel = malhf::Relation::create(
        &args.name,
        args.nattrs,
        args.initial_pages,
        args.initial_depth,
        &args.choice_vector,
    )
    .with_context(|| format!("creating relation {:?}", args.name))?;
    rel.close().context("closing relation after create")?;

    println!("created relation {:?}", args.name);
    Ok(())
}

fn main() {
    env_logger::init();
    if let Err(err) = run() {
        log::error!("{err:?}");
        std::process::exit(1);
    }
}
