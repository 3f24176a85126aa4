//! Explicit state of one run: the validated configuration and the opened
//! catalog. Every engine call goes through a `RunContext` instead of
//! reaching for shared globals.

use crate::catalog::Catalog;
use crate::commit::{self, CommitReport};
use crate::config::Config;
use crate::errors::{KatalError, Result};
use crate::fs_ops::{format_bytes, has_room_for, required_space};
use crate::naming::preview_names;
use crate::platform;
use crate::report::Reporter;
use crate::select::{self, Selection, SelectionOutcome};

/// How many example target names the selection report shows.
pub const PREVIEW_LIMIT: usize = 6;

pub struct RunContext {
    config: Config,
    catalog: Catalog,
}

impl RunContext {
    /// Open (or create) the catalog of the configured target directory.
    pub fn open(config: Config) -> Result<Self> {
        let catalog = Catalog::open(&config.target_path)?;
        Ok(Self { config, catalog })
    }

    pub fn with_catalog(config: Config, catalog: Catalog) -> Self {
        Self { config, catalog }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Walk the source and build the selection against the current catalog.
    pub fn select(&self, reporter: &mut dyn Reporter) -> Result<SelectionOutcome> {
        let known = self.catalog.load_hashes()?;
        select::select(
            &self.config.source_path,
            &self.config.sieves,
            &known,
            self.config.verbosity.is_high(),
            reporter,
        )
    }

    /// `(source, full target path)` for the first `limit` selected files.
    pub fn preview(&self, selection: &Selection, limit: usize) -> Result<Vec<(String, String)>> {
        let base = self.catalog.len()?;
        Ok(
            preview_names(&self.config.target_name_template, selection, base, limit)
                .into_iter()
                .map(|(src, name)| (src, self.config.target_path.join(name).display().to_string()))
                .collect(),
        )
    }

    /// Select with the header, per-file lines and the closing summary
    /// (sizes, counts, free space, example names).
    pub fn select_and_report(&self, reporter: &mut dyn Reporter) -> Result<SelectionOutcome> {
        reporter.report(
            "  = selecting files according to the instructions in the config file. Please wait... =",
        );
        reporter.report("  o sieves :");
        if self.config.sieves.is_empty() {
            reporter.report("    ! no sieve defined: nothing can be selected");
        }
        for sieve in &self.config.sieves {
            reporter.report(&format!("    o {sieve}"));
        }
        reporter.report("  o file list :");

        let outcome = self.select(reporter)?;
        let available = platform::free_space_bytes(&self.config.target_path)
            .map_err(|e| KatalError::file_io(&self.config.target_path, e))?;
        self.report_outcome(&outcome, available, reporter)?;
        Ok(outcome)
    }

    /// Closing summary of a selection, given the free space of the target.
    pub fn report_outcome(
        &self,
        outcome: &SelectionOutcome,
        available: u64,
        reporter: &mut dyn Reporter,
    ) -> Result<()> {
        let selection = &outcome.selection;
        reporter.report(&format!(
            "    o size of the selected files : {} ({} bytes)",
            format_bytes(selection.total_size()),
            selection.total_size()
        ));
        if selection.is_empty() {
            reporter.report("    ! no file selected !");
        } else {
            reporter.report(&format!(
                "    o number of selected files : {} (after discarding {} file(s), {:.2}% of all the files)",
                selection.len(),
                outcome.rejected,
                discarded_percentage(selection.len(), outcome.rejected)
            ));
        }
        let required = required_space(selection.total_size());
        reporter.report(&format!(
            "    o required space : {required} bytes; available space on disk : {available} bytes"
        ));
        if !has_room_for(selection.total_size(), available) {
            reporter.report("    ! not enough free space on the target disk !");
        }
        for (src, target) in self.preview(selection, PREVIEW_LIMIT)? {
            reporter.report(&format!(
                "    o e.g. ... \"{src}\" would be copied as \"{target}\" ."
            ));
        }
        Ok(())
    }

    /// Copy the selection into the target directory and extend the catalog.
    pub fn commit(
        &mut self,
        selection: &Selection,
        reporter: &mut dyn Reporter,
    ) -> Result<CommitReport> {
        commit::commit(
            selection,
            &self.config.target_path,
            &mut self.catalog,
            &self.config.target_name_template,
            reporter,
        )
    }

    /// Same as [`RunContext::commit`] with a caller-supplied free-space figure.
    pub fn commit_with_free_space(
        &mut self,
        selection: &Selection,
        available: u64,
        reporter: &mut dyn Reporter,
    ) -> Result<CommitReport> {
        commit::commit_with_free_space(
            selection,
            &self.config.target_path,
            &mut self.catalog,
            &self.config.target_name_template,
            available,
            reporter,
        )
    }
}

/// Share of discarded files among all files examined, in percent.
pub fn discarded_percentage(selected: usize, discarded: usize) -> f64 {
    let all = selected + discarded;
    if all == 0 {
        0.0
    } else {
        discarded as f64 * 100.0 / all as f64
    }
}
