//! Batch entry point: raw setup text in, processed items out.

use crate::{Error, InvalidSetupItem, Result, SetupItem, SetupItemProcessor};
use host::{CategoryStore, Logger, Site};

/// A line that failed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidLine {
    /// 1-based line number in the submitted text.
    pub line: usize,
    pub reason: InvalidSetupItem,
}

/// Result of splitting and parsing a block of setup text.
#[derive(Debug, Default)]
pub struct Batch {
    pub items: Vec<SetupItem>,
    pub invalid: Vec<InvalidLine>,
}

/// Parse every non-blank line of `text`.
///
/// Invalid lines are collected rather than aborting the batch. Host
/// failures during category expansion are returned as errors.
pub fn parse_batch<S>(text: &str, store: &S) -> Result<Batch>
where
    S: CategoryStore + ?Sized,
{
    let mut batch = Batch::default();
    for (index, line) in text.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        match SetupItem::parse(line, store) {
            Ok(item) => batch.items.push(item),
            Err(Error::InvalidItem(reason)) => batch.invalid.push(InvalidLine {
                line: index + 1,
                reason,
            }),
            Err(err) => return Err(err),
        }
    }
    Ok(batch)
}

/// Counts reported after a batch run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchReport {
    pub processed: usize,
    pub invalid: usize,
}

/// The queued setup task: parse submitted text and apply it to the site.
pub struct SetupJob<'a, H: ?Sized, L> {
    site: &'a H,
    logger: L,
}

impl<'a, H, L> SetupJob<'a, H, L>
where
    H: Site + ?Sized,
    L: Logger,
{
    pub fn new(site: &'a H, logger: L) -> Self {
        Self { site, logger }
    }

    /// Run the job to completion.
    ///
    /// Invalid lines are logged and skipped; valid items are processed in
    /// submission order.
    pub fn run(&self, text: &str) -> Result<BatchReport> {
        let batch = parse_batch(text, self.site)?;
        tracing::info!(
            items = batch.items.len(),
            invalid = batch.invalid.len(),
            "applying blocks setup"
        );

        for invalid in &batch.invalid {
            tracing::warn!(line = invalid.line, code = invalid.reason.code(), "invalid setup line");
            self.logger.log_message(&format!(
                "Invalid blocks setup item on line {}: {}",
                invalid.line, invalid.reason
            ));
        }

        SetupItemProcessor::new(self.site, &self.logger).process_bulk(&batch.items)?;

        let report = BatchReport {
            processed: batch.items.len(),
            invalid: batch.invalid.len(),
        };
        tracing::info!(processed = report.processed, "blocks setup finished");
        Ok(report)
    }
}
