//! `quill build` command implementation.

use std::path::PathBuf;

use clap::Args;
use quill_config::{CliSettings, Config};
use quill_renderer::AnchorOptions;
use quill_site::{
    BuildDriver, BuildOptions, DocumentPipeline, HandlebarsOptions, MarkdownOptions,
    PipelineConfig,
};

use crate::error::CliError;
use crate::output::Output;

/// Arguments for the build command.
#[derive(Args)]
pub(crate) struct BuildArgs {
    /// Path to configuration file (default: auto-discover quill.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Markdown source directory (overrides config).
    #[arg(short, long)]
    source_dir: Option<PathBuf>,

    /// Templates directory (overrides config).
    #[arg(short, long)]
    templates_dir: Option<PathBuf>,

    /// Output directory (overrides config).
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Stop at the first document that fails to render.
    #[arg(long)]
    fail_fast: bool,

    /// Print every written file with its size.
    #[arg(long)]
    report: bool,

    /// Enable verbose output.
    #[arg(short, long)]
    pub(crate) verbose: bool,
}

impl BuildArgs {
    pub(crate) fn execute(self, output: &Output) -> Result<(), CliError> {
        let cli_settings = CliSettings {
            source_dir: self.source_dir,
            templates_dir: self.templates_dir,
            output_dir: self.output_dir,
            fail_fast: self.fail_fast.then_some(true),
        };
        let config = Config::load(self.config.as_deref(), Some(&cli_settings))?;
        let content = &config.content_resolved;

        output.info(&format!("Source: {}", content.source_dir.display()));
        output.info(&format!("Output: {}", content.output_dir.display()));

        let pipeline = DocumentPipeline::new(pipeline_config(&config)?)?;
        let report = BuildDriver::new(pipeline, build_options(&config)).build()?;

        if self.report {
            for line in report.size_lines() {
                output.detail(&line);
            }
        }

        for failure in &report.failures {
            output.error(&format!(
                "{} [{}]: {failure}",
                failure.path().display(),
                failure.phase()
            ));
        }

        if !report.is_success() {
            output.warning(&format!(
                "Wrote {} file(s), {} failed",
                report.written.len(),
                report.failures.len()
            ));
            return Err(CliError::Failed {
                count: report.failures.len(),
            });
        }

        output.success(&format!(
            "Built {} file(s) to {}",
            report.written.len(),
            content.output_dir.display()
        ));
        Ok(())
    }
}

/// Translate the loaded configuration into pipeline settings.
fn pipeline_config(config: &Config) -> Result<PipelineConfig, CliError> {
    let content = &config.content_resolved;
    let mut pipeline = PipelineConfig::new(&content.templates_dir)
        .with_site(serde_json::to_value(&config.data)?);

    for (name, path) in &config.layouts_resolved {
        pipeline = pipeline.with_layout(name.clone(), path.clone());
    }
    pipeline
        .templates
        .partial_extensions
        .clone_from(&config.handlebars.partial_extensions);
    pipeline
        .templates
        .layout_extension
        .clone_from(&config.handlebars.layout_extension);

    pipeline.handlebars = HandlebarsOptions {
        strict: config.handlebars.strict,
        no_escape: config.handlebars.no_escape,
        prevent_indent: config.handlebars.prevent_indent,
    };

    let markdown = &config.markdown;
    pipeline.markdown = MarkdownOptions {
        html: markdown.html,
        linkify: markdown.linkify,
        typographer: markdown.typographer,
        anchors: AnchorOptions {
            permalink: markdown.anchors.permalink,
            permalink_symbol: markdown.anchors.permalink_symbol.clone(),
        },
        highlight: markdown.highlight,
        toc: markdown.toc,
        gfm: markdown.gfm,
    };
    pipeline.target_extension.clone_from(&content.target_extension);
    Ok(pipeline)
}

fn build_options(config: &Config) -> BuildOptions {
    let content = &config.content_resolved;
    let mut options = BuildOptions::new(&content.source_dir, &content.output_dir);
    options.extensions.clone_from(&content.extensions);
    options.fail_fast = config.build.fail_fast;
    options
}
