// src/main.rs
use anyhow::Context;
use clap::Parser;
use confluence_export::{
    build_sink, setup_logging, CommandLineInput, ConfigFile, ConfluenceHttpClient,
    ConfluenceRepository, ConvertOptions, ExportPipeline, ExportReport, ExportSettings,
    PipelineConfig, SinkSettings, TransportSettings,
};
use std::process::ExitCode;
use std::sync::Arc;

/// Resolves configuration, runs the export and returns its report.
async fn execute_export(config: &PipelineConfig) -> anyhow::Result<ExportReport> {
    let client = ConfluenceHttpClient::new(
        config.base_url.clone(),
        &config.credentials,
        TransportSettings {
            max_in_flight: config.concurrency,
            page_size: config.page_size,
            ..TransportSettings::default()
        },
    )
    .context("failed to build the HTTP client")?;
    let repository: Arc<dyn ConfluenceRepository> = Arc::new(client);

    let pipeline = ExportPipeline::new(
        repository.clone(),
        ExportSettings {
            base_url: config.base_url.clone(),
            concurrency: config.concurrency,
            include_attachments: config.include_attachments,
            convert: ConvertOptions {
                preserve_links: config.preserve_links,
                attachment_dir: None,
            },
        },
    );

    let scopes = pipeline
        .plan_scopes(
            config.space_key.as_ref(),
            config.page_id.as_ref(),
            config.recursive,
        )
        .await
        .context("failed to list spaces")?;

    let mut sink = build_sink(
        config.output_type,
        &SinkSettings {
            output_dir: config.output_dir.clone(),
            include_front_matter: config.include_front_matter,
            include_attachments: config.include_attachments,
        },
        repository,
    );

    let report = pipeline
        .run(&scopes, sink.as_mut())
        .await
        .with_context(|| format!("{} output failed", config.output_type))?;
    Ok(report)
}

/// Prints the end-of-run summary.
fn report_completion(report: &ExportReport) {
    println!(
        "Exported {} of {} page(s) from {} scope(s) in {:.1}s",
        report.pages_processed,
        report.pages_discovered,
        report.scopes.len(),
        report.elapsed.as_secs_f64()
    );

    if !report.page_failures.is_empty() {
        println!("{} page(s) failed:", report.pages_failed());
        for failure in &report.page_failures {
            println!(
                "  - {} / {} ({}): {}",
                failure.scope, failure.title, failure.kind, failure.error
            );
        }
    }

    for failure in &report.scope_failures {
        eprintln!("Failed to export {}: {}", failure.scope, failure.error);
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let cli = CommandLineInput::parse();

    let file = ConfigFile::load(&cli.config)?;
    let (level, log_file) = file.logging_settings(cli.verbose);
    setup_logging(level, &log_file)?;

    let config = PipelineConfig::resolve(cli, file)?;
    log::info!(
        "Exporting from {} to {} output in {}",
        config.base_url,
        config.output_type,
        config.output_dir.display()
    );

    let report = execute_export(&config).await?;
    report_completion(&report);

    if report.is_success() {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}
