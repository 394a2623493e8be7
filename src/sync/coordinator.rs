use std::num::NonZeroUsize;
use std::path::Path;

use futures_util::stream::{self, StreamExt};

use super::report::{SyncReport, TargetReport, TargetStatus};
use super::target::LanguageTarget;
use crate::error::{Error, Result};
use crate::resource::{DEFAULT_CHUNK_SIZE, Document, ResourceSet, Upserted, diff, escape};
use crate::translation::{Translator, ensure_complete};

/// How a translated batch is written into a target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergePolicy {
    /// Update existing entries and append the rest.
    Upsert,
    /// Append only. A batch touching an existing key is rejected as a whole.
    Insert,
}

/// Drives the base document and its translations through every sync operation.
///
/// The base document is always written before any target is touched. Work on
/// targets is isolated: one target failing never stops the others, and each
/// outcome lands in the returned [`SyncReport`].
pub struct SyncCoordinator<T> {
    base: Document,
    targets: Vec<LanguageTarget>,
    translator: T,
    workers: usize,
    chunk_size: usize,
}

impl SyncCoordinator<()> {
    /// A coordinator for operations that never call a translator.
    pub fn offline(base: Document, targets: Vec<LanguageTarget>) -> Self {
        Self::new(base, targets, ())
    }
}

impl<T> SyncCoordinator<T> {
    pub fn new(base: Document, targets: Vec<LanguageTarget>, translator: T) -> Self {
        Self {
            base,
            targets,
            translator,
            workers: std::thread::available_parallelism().map_or(1, NonZeroUsize::get),
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }

    /// Limits how many targets are translated at the same time.
    #[must_use]
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    /// Sets how many entries go into one request when translating everything.
    #[must_use]
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    pub const fn base(&self) -> &Document {
        &self.base
    }

    pub fn targets(&self) -> &[LanguageTarget] {
        &self.targets
    }

    /// Removes `key` from the base document and from every target.
    ///
    /// A key that is absent from a document counts as success.
    ///
    /// # Errors
    ///
    /// Fails if the base document cannot be written.
    pub fn delete_entry(&mut self, key: &str) -> Result<SyncReport> {
        self.base.delete_entry(key);
        self.base.flush(None)?;

        let targets = self
            .targets
            .iter_mut()
            .map(|target| {
                let removed = target.document_mut().delete_entry(key);
                let outcome = target.document().flush(None).map(|()| {
                    if removed {
                        TargetStatus::Removed(1)
                    } else {
                        TargetStatus::UpToDate
                    }
                });
                report(target, outcome)
            })
            .collect();

        Ok(SyncReport { targets })
    }

    /// Copies translations from an external document into the target for `language`.
    ///
    /// Only keys the target already has are updated; nothing is added.
    /// Returns the number of updated entries.
    ///
    /// # Errors
    ///
    /// Fails with [`Error::LanguageNotFound`] when no target has that language
    /// identifier, or when the external document cannot be read or the target
    /// cannot be written.
    pub fn update_translations_from_external_file(
        &mut self,
        path: &Path,
        language: &str,
    ) -> Result<usize> {
        let target = self
            .targets
            .iter_mut()
            .find(|target| target.language() == language)
            .ok_or_else(|| Error::LanguageNotFound(language.to_string()))?;
        let external = Document::load(path)?.snapshot();

        let document = target.document_mut();
        let mut updated = 0;
        for (key, value) in external.iter() {
            if document.contains(key) {
                document.update_entry(key, &escape(value))?;
                updated += 1;
            }
        }
        document.flush(None)?;

        Ok(updated)
    }

    /// The base entries missing from the target at `target_index`.
    ///
    /// # Errors
    ///
    /// Fails with [`Error::TargetIndex`] when the index is out of range.
    pub fn compare_base_to_target(&self, target_index: usize) -> Result<ResourceSet> {
        let target = self
            .targets
            .get(target_index)
            .ok_or(Error::TargetIndex {
                index: target_index,
                count: self.targets.len(),
            })?;

        Ok(diff(&self.base.snapshot(), &target.document().snapshot()).missing)
    }
}

impl<T: Translator> SyncCoordinator<T> {
    /// Translates the last `n` base entries into every target.
    ///
    /// With `dry_run`, the translated batches are reported and nothing is written.
    pub async fn translate_latest_to_all(&mut self, n: usize, dry_run: bool) -> SyncReport {
        let batch = self.base.snapshot_tail(n);
        self.fan_out(|_| batch.clone(), MergePolicy::Upsert, dry_run)
            .await
    }

    /// Translates the whole base document into every target, one chunk at a time.
    ///
    /// Targets are processed one after another. A target is only written once
    /// all of its chunks were translated.
    pub async fn translate_everything(&mut self) -> SyncReport {
        let chunks: Vec<ResourceSet> = self.base.snapshot_in_chunks(self.chunk_size).collect();
        let mut reports = Vec::with_capacity(self.targets.len());

        for target in &mut self.targets {
            let outcome = translate_chunks(&self.translator, target, &chunks).await;
            reports.push(report(target, outcome));
        }

        SyncReport { targets: reports }
    }

    /// Retranslates the given base entries into every target. Unknown keys are ignored.
    pub async fn translate_item_updates<S: AsRef<str>>(&mut self, keys: &[S]) -> SyncReport {
        let batch = self.base.snapshot().filter_keys(keys);
        self.fan_out(|_| batch.clone(), MergePolicy::Upsert, false)
            .await
    }

    /// Translates, per target, only the base entries that target lacks.
    pub async fn translate_missing_only(&mut self) -> SyncReport {
        let base = self.base.snapshot();
        self.fan_out(
            |target| diff(&base, &target.document().snapshot()).missing,
            MergePolicy::Insert,
            false,
        )
        .await
    }

    /// Adds `key` to the base document, writes it, then translates it into every target.
    ///
    /// # Errors
    ///
    /// Fails with [`Error::DuplicateKey`] if the base already has `key`, or
    /// with the write error of the base document. Targets are untouched then.
    pub async fn add_new_entry(&mut self, key: &str, value: &str) -> Result<SyncReport> {
        self.base.add_entry(key, value)?;
        self.base.flush(None)?;

        let batch: ResourceSet = [(key, value)].into_iter().collect();
        Ok(self
            .fan_out(|_| batch.clone(), MergePolicy::Insert, false)
            .await)
    }

    /// Translates already present base entries as new entries, one target at a time.
    pub async fn translate_new_entries<S: AsRef<str>>(&mut self, keys: &[S]) -> SyncReport {
        let batch = self.base.snapshot().filter_keys(keys);
        let mut reports = Vec::with_capacity(self.targets.len());

        for target in &mut self.targets {
            let outcome = sync_target(
                &self.translator,
                target,
                batch.clone(),
                MergePolicy::Insert,
                false,
            )
            .await;
            reports.push(report(target, outcome));
        }

        SyncReport { targets: reports }
    }

    /// Replaces the base value of `key`, writes the base document, then
    /// retranslates the entry into every target.
    ///
    /// # Errors
    ///
    /// Fails with [`Error::KeyNotFound`] if the base has no `key`, or with the
    /// write error of the base document. Targets are untouched then.
    pub async fn update_with_replace(&mut self, key: &str, new_value: &str) -> Result<SyncReport> {
        self.base.update_entry(key, new_value)?;
        self.base.flush(None)?;

        let batch: ResourceSet = [(key, new_value)].into_iter().collect();
        Ok(self
            .fan_out(|_| batch.clone(), MergePolicy::Upsert, false)
            .await)
    }

    /// Runs one translate, merge and flush pipeline per target, at most
    /// `workers` at a time. Reports keep the target order.
    async fn fan_out<F>(&mut self, select: F, policy: MergePolicy, dry_run: bool) -> SyncReport
    where
        F: Fn(&LanguageTarget) -> ResourceSet,
    {
        let Self {
            targets,
            translator,
            workers,
            ..
        } = self;
        let translator = &*translator;

        let jobs: Vec<_> = targets
            .iter_mut()
            .map(|target| {
                let batch = select(target);
                (target, batch)
            })
            .collect();

        let targets: Vec<TargetReport> = stream::iter(jobs)
            .map(|(target, batch)| async move {
                let outcome = sync_target(translator, target, batch, policy, dry_run).await;
                report(target, outcome)
            })
            .buffered(*workers)
            .collect()
            .await;

        SyncReport { targets }
    }
}

fn report(target: &LanguageTarget, outcome: Result<TargetStatus>) -> TargetReport {
    TargetReport {
        language: target.language().to_string(),
        location: target.location(),
        outcome,
    }
}

async fn sync_target<T: Translator + ?Sized>(
    translator: &T,
    target: &mut LanguageTarget,
    batch: ResourceSet,
    policy: MergePolicy,
    dry_run: bool,
) -> Result<TargetStatus> {
    if batch.is_empty() {
        return Ok(TargetStatus::UpToDate);
    }
    if policy == MergePolicy::Insert {
        ensure_absent(target.document(), &batch)?;
    }

    let translated = translate_batch(translator, &batch, target.language()).await?;
    if dry_run {
        return Ok(TargetStatus::DryRun(translated));
    }

    apply(target.document_mut(), &translated, policy)
}

async fn translate_chunks<T: Translator + ?Sized>(
    translator: &T,
    target: &mut LanguageTarget,
    chunks: &[ResourceSet],
) -> Result<TargetStatus> {
    let mut translated = ResourceSet::new();
    for chunk in chunks {
        for (key, value) in translate_batch(translator, chunk, target.language()).await? {
            translated.insert(key, value);
        }
    }

    if translated.is_empty() {
        return Ok(TargetStatus::UpToDate);
    }
    apply(target.document_mut(), &translated, MergePolicy::Upsert)
}

/// Translates `batch`, checks the reply covers every key and escapes each value.
async fn translate_batch<T: Translator + ?Sized>(
    translator: &T,
    batch: &ResourceSet,
    language: &str,
) -> Result<ResourceSet> {
    let translation_error = |source| Error::Translation {
        language: language.to_string(),
        source,
    };

    let response = translator
        .translate(batch, language)
        .await
        .map_err(translation_error)?;
    let complete = ensure_complete(batch, &response).map_err(translation_error)?;

    Ok(complete
        .into_iter()
        .map(|(key, value)| {
            let value = escape(&value);
            (key, value)
        })
        .collect())
}

fn ensure_absent(document: &Document, batch: &ResourceSet) -> Result<()> {
    match batch.keys().find(|key| document.contains(key)) {
        Some(key) => Err(Error::DuplicateKey(key.to_string())),
        None => Ok(()),
    }
}

/// Merges `translated` into `document` and writes it.
fn apply(
    document: &mut Document,
    translated: &ResourceSet,
    policy: MergePolicy,
) -> Result<TargetStatus> {
    let (mut added, mut updated) = (0, 0);
    for (key, value) in translated.iter() {
        match policy {
            MergePolicy::Upsert => match document.upsert_entry(key, value) {
                Upserted::Added => added += 1,
                Upserted::Updated => updated += 1,
            },
            MergePolicy::Insert => {
                document.add_entry(key, value)?;
                added += 1;
            }
        }
    }
    document.flush(None)?;

    Ok(TargetStatus::Merged { added, updated })
}
