use crate::output::print_json;
use anyhow::Context;
use ralph_core::config::RunPaths;
use ralph_core::convert::{self, Progress};

pub fn run(paths: &RunPaths, dry_run: bool, json: bool) -> anyhow::Result<()> {
    if !json {
        println!("Reading {}...", paths.store.display());
    }

    let report = convert::convert(paths, dry_run, |progress| {
        if !json {
            print_progress(progress);
        }
    })
    .with_context(|| {
        format!(
            "conversion failed (store {} left unchanged)",
            paths.store.display()
        )
    })?;

    if json {
        return print_json(&report);
    }

    if !report.written {
        println!("\nDry run: {} not written", report.store.display());
    }
    println!("Total stories added: {}", report.total_stories);
    println!(
        "\nConversion complete! Added {} total stories.",
        report.total_stories
    );
    if report.total_stories > 0 {
        println!(
            "New stories: US-{} to US-{}",
            report.last_id + 1,
            report.last_id + report.total_stories as u64
        );
    }
    Ok(())
}

fn print_progress(progress: Progress<'_>) {
    match progress {
        Progress::StoreLoaded { last_id, next_id } => {
            println!("Last story ID: {last_id}, starting from US-{next_id}");
        }
        Progress::DocumentsFound(n) => println!("Found {n} pending PRDs"),
        Progress::Processing(path) => {
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            println!("\nProcessing {name}...");
        }
        Progress::Merged(doc) => {
            println!("  Context: {}", doc.name);
            println!(
                "  Created {} stories ({} to {})",
                doc.stories, doc.first_id, doc.last_id
            );
        }
        Progress::Writing(path) => println!("\nWriting updated {}...", path.display()),
    }
}
