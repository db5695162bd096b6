use crate::output::print_json;
use anyhow::Context;
use ralph_core::config::RunPaths;
use ralph_core::store::Store;

pub fn run(paths: &RunPaths, json: bool) -> anyhow::Result<()> {
    let store = Store::load(&paths.store)
        .with_context(|| format!("failed to load {}", paths.store.display()))?;
    let summary = store.summary()?;

    if json {
        return print_json(&summary);
    }

    println!("Store:    {}", paths.store.display());
    println!("Contexts: {}", summary.contexts);
    println!(
        "Stories:  {} ({} passing, {} pending)",
        summary.stories,
        summary.passing,
        summary.stories - summary.passing
    );
    println!("Last ID:  US-{}", summary.max_id);
    println!("Next ID:  US-{}", summary.next_id);
    Ok(())
}
