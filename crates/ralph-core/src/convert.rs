use crate::allocator::{format_story_id, IdAllocator};
use crate::config::RunPaths;
use crate::context::{extract_context, PrdContext};
use crate::document::{self, ChangeDocument};
use crate::error::Result;
use crate::store::Store;
use crate::story::{extract_stories, UserStory};
use serde::Serialize;
use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// Reports
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentReport {
    pub id: String,
    pub name: String,
    pub stories: usize,
    pub first_id: String,
    pub last_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConvertReport {
    pub store: PathBuf,
    /// Highest story number before the run.
    pub last_id: u64,
    pub documents: Vec<DocumentReport>,
    pub total_stories: usize,
    pub written: bool,
}

/// What one document contributes to the store.
#[derive(Debug, Clone, PartialEq)]
pub struct Extraction {
    pub context: PrdContext,
    pub stories: Vec<UserStory>,
}

/// Run both extractors over one document, drawing story ids from `ids`.
pub fn extract_document(doc: &ChangeDocument, ids: &mut IdAllocator) -> Result<Extraction> {
    Ok(Extraction {
        context: extract_context(&doc.content, &doc.id),
        stories: extract_stories(&doc.content, &doc.id, ids)?,
    })
}

// ---------------------------------------------------------------------------
// Converter
// ---------------------------------------------------------------------------

/// Merges documents into an in-memory store, one at a time. Nothing reaches
/// disk until [`Converter::finish`] is followed by a save.
pub struct Converter {
    store: Store,
    ids: IdAllocator,
    last_id: u64,
    documents: Vec<DocumentReport>,
}

impl Converter {
    /// Fails when the store already holds the largest representable id.
    pub fn new(store: Store) -> Result<Self> {
        let ids = store.id_allocator()?;
        Ok(Self {
            store,
            last_id: ids.peek() - 1,
            ids,
            documents: Vec::new(),
        })
    }

    /// Highest story number present before any document was processed.
    pub fn last_id(&self) -> u64 {
        self.last_id
    }

    pub fn next_id(&self) -> u64 {
        self.ids.peek()
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn process(&mut self, doc: &ChangeDocument) -> Result<DocumentReport> {
        let first = self.ids.peek();
        let Extraction { context, stories } = extract_document(doc, &mut self.ids)?;

        self.store.set_context(&doc.id, &context)?;
        self.store.append_stories(&stories)?;

        tracing::debug!(
            doc = %doc.id,
            stories = stories.len(),
            next_id = self.ids.peek(),
            "document merged"
        );

        let report = DocumentReport {
            id: doc.id.clone(),
            name: context.name,
            stories: stories.len(),
            first_id: format_story_id(first),
            last_id: format_story_id(self.ids.peek() - 1),
        };
        self.documents.push(report.clone());
        Ok(report)
    }

    /// The merged store and the run report (marked unwritten).
    pub fn finish(self, store_path: PathBuf) -> (Store, ConvertReport) {
        let total_stories = self.documents.iter().map(|d| d.stories).sum();
        let report = ConvertReport {
            store: store_path,
            last_id: self.last_id,
            documents: self.documents,
            total_stories,
            written: false,
        };
        (self.store, report)
    }
}

/// Milestones of a [`convert`] run, in the order they happen.
#[derive(Debug, Clone, Copy)]
pub enum Progress<'a> {
    StoreLoaded { last_id: u64, next_id: u64 },
    DocumentsFound(usize),
    Processing(&'a Path),
    Merged(&'a DocumentReport),
    Writing(&'a Path),
}

/// Full run: load the store, merge every document, write the store once.
/// Any I/O or parse failure aborts before the store is touched.
pub fn convert(
    paths: &RunPaths,
    dry_run: bool,
    mut on_progress: impl FnMut(Progress<'_>),
) -> Result<ConvertReport> {
    let store = Store::load(&paths.store)?;
    let mut converter = Converter::new(store)?;
    on_progress(Progress::StoreLoaded {
        last_id: converter.last_id(),
        next_id: converter.next_id(),
    });

    let files = document::list_documents(&paths.prds_dir)?;
    on_progress(Progress::DocumentsFound(files.len()));

    for file in &files {
        on_progress(Progress::Processing(file.as_path()));
        let doc = ChangeDocument::load(file)?;
        let report = converter.process(&doc)?;
        on_progress(Progress::Merged(&report));
    }

    let (store, mut report) = converter.finish(paths.store.clone());
    if !dry_run {
        on_progress(Progress::Writing(paths.store.as_path()));
        store.save(&paths.store)?;
        report.written = true;
    }
    Ok(report)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
