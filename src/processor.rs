//! Core template processing orchestration.
//! Walks the template root in canonical order and, file by file, decides between
//! substitution and a byte-exact copy before handing the payload to the materializer.

use log::{debug, info};
use std::fs;
use std::path::{Path, PathBuf};

use crate::classify::as_text;
use crate::context::RenderContext;
use crate::error::{Error, Result};
use crate::materialize::write_file;
use crate::renderer::{has_markers, MiniJinjaRenderer, TemplateRenderer};
use crate::walker::{walk_template_root, RelativeFilePath};

/// How a destination file's bytes were produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderOutcome {
    /// The file contained markers and went through substitution.
    Rendered,
    /// The file was copied byte-for-byte (binary, or text without markers).
    Copied,
}

/// Totals of a completed run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RenderResult {
    pub rendered_files: usize,
    pub copied_files: usize,
}

impl RenderResult {
    fn record(&mut self, outcome: RenderOutcome) {
        match outcome {
            RenderOutcome::Rendered => self.rendered_files += 1,
            RenderOutcome::Copied => self.copied_files += 1,
        }
    }
}

/// Renders one template root into one destination.
pub struct Processor<'a> {
    engine: &'a dyn TemplateRenderer,
    template_root: &'a Path,
    output_root: &'a Path,
    context: &'a RenderContext,
}

impl<'a> Processor<'a> {
    pub fn new(
        engine: &'a dyn TemplateRenderer,
        template_root: &'a Path,
        output_root: &'a Path,
        context: &'a RenderContext,
    ) -> Self {
        Self { engine, template_root, output_root, context }
    }

    /// Processes every template file in canonical order.
    ///
    /// The first failing file aborts the run: later files are not touched and
    /// files already written stay in place.
    ///
    /// # Errors
    /// * `Error::InvalidTemplateRoot` before any other I/O when the root is not a directory
    /// * `Error::UnreadableSourceFile` when the first failing entry could not be walked
    /// * any error of [`Processor::process`] for the first failing file
    pub fn run(&self) -> Result<RenderResult> {
        let is_dir = fs::metadata(self.template_root).map(|m| m.is_dir()).unwrap_or(false);
        if !is_dir {
            return Err(Error::InvalidTemplateRoot {
                template_dir: self.template_root.display().to_string(),
            });
        }

        debug!("Processing template {}...", self.template_root.display());
        let mut result = RenderResult::default();
        for entry in walk_template_root(self.template_root)? {
            let relative = entry.into_path()?;
            let outcome = self.process(&relative)?;
            result.record(outcome);
        }

        info!(
            "{} files rendered, {} files copied",
            result.rendered_files, result.copied_files
        );
        Ok(result)
    }

    /// Renders or copies a single template file into the output root.
    pub fn process(&self, relative: &RelativeFilePath) -> Result<RenderOutcome> {
        let source = relative.to_path(self.template_root);
        let unreadable = |source: std::io::Error| Error::UnreadableSourceFile {
            path: relative.to_string(),
            source,
        };

        let content = fs::read(&source).map_err(unreadable)?;
        let permissions = fs::metadata(&source).map_err(unreadable)?.permissions();

        match as_text(&content) {
            Some(text) if has_markers(text) => {
                let rendered = self.engine.render(relative.as_str(), text, self.context)?;
                write_file(self.output_root, relative, rendered.as_bytes(), permissions)?;
                debug!("Rendered: '{relative}'");
                Ok(RenderOutcome::Rendered)
            }
            Some(_) => {
                write_file(self.output_root, relative, &content, permissions)?;
                debug!("Copied: '{relative}'");
                Ok(RenderOutcome::Copied)
            }
            None => {
                write_file(self.output_root, relative, &content, permissions)?;
                debug!("Copied binary: '{relative}'");
                Ok(RenderOutcome::Copied)
            }
        }
    }
}

/// Renders `template_dir` into `destination_dir` with the default MiniJinja engine.
pub fn render_template_dir<P: AsRef<Path>, Q: AsRef<Path>>(
    template_dir: P,
    destination_dir: Q,
    context: &RenderContext,
) -> Result<RenderResult> {
    let engine = MiniJinjaRenderer::new();
    Processor::new(&engine, template_dir.as_ref(), destination_dir.as_ref(), context).run()
}

/// Creates the working directory and checks that it is safe to render into.
///
/// # Arguments
/// * `workdir` - Target directory path for generated output
/// * `overwrite` - Whether a directory with existing content is acceptable
///
/// # Errors
/// * `Error::WorkdirNotEmptyError` if the directory has entries and overwrite is false
pub fn prepare_workdir<P: AsRef<Path>>(workdir: P, overwrite: bool) -> Result<PathBuf> {
    let workdir = workdir.as_ref();
    fs::create_dir_all(workdir)?;

    if !overwrite && fs::read_dir(workdir)?.next().is_some() {
        return Err(Error::WorkdirNotEmptyError { workdir: workdir.display().to_string() });
    }
    Ok(workdir.to_path_buf())
}
