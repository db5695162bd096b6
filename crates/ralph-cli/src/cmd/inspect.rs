use crate::output::{print_json, print_table};
use anyhow::Context;
use ralph_core::allocator::IdAllocator;
use ralph_core::config::RunPaths;
use ralph_core::convert::extract_document;
use ralph_core::document::ChangeDocument;
use ralph_core::store::Store;
use std::path::Path;

pub fn run(paths: &RunPaths, file: &Path, json: bool) -> anyhow::Result<()> {
    let doc = ChangeDocument::load(file)
        .with_context(|| format!("failed to read document {}", file.display()))?;

    // Number stories the way a real run would, when a store exists.
    let mut ids = if paths.store.exists() {
        Store::load(&paths.store)
            .with_context(|| format!("failed to load {}", paths.store.display()))?
            .id_allocator()?
    } else {
        IdAllocator::starting_at(1)
    };

    let extraction = extract_document(&doc, &mut ids)?;

    if json {
        return print_json(&serde_json::json!({
            "id": doc.id,
            "prdContext": extraction.context,
            "userStories": extraction.stories,
        }));
    }

    let ctx = &extraction.context;
    println!("{} ({})", ctx.name, doc.id);
    println!("\nOverview:   {}", ctx.overview);
    println!("Background: {}", ctx.background);
    println!("\nGoals:");
    for goal in &ctx.goals {
        println!("  - {goal}");
    }
    if let Some(concepts) = &ctx.core_concepts {
        println!("\nCore concepts:");
        for (term, definition) in concepts {
            println!("  {term}: {}", definition.as_str().unwrap_or_default());
        }
    }

    println!();
    let rows: Vec<Vec<String>> = extraction
        .stories
        .iter()
        .map(|s| {
            vec![
                s.id.clone(),
                s.priority.to_string(),
                s.acceptance_criteria.len().to_string(),
                s.title.clone(),
            ]
        })
        .collect();
    print_table(&["ID", "PRIORITY", "CRITERIA", "TITLE"], &rows);
    Ok(())
}
