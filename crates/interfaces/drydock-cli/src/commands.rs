use anyhow::{Context, Result};
use camino::Utf8PathBuf;
use drydock_core::FolderSnapshot;
use drydock_pipeline::{BatchReport, ExportEngine, ExportOptions, ExportRequest, PlanSummary};
use humansize::{format_size, DECIMAL};
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

use crate::profiles;

fn build_engine(service_url: &str) -> Result<ExportEngine> {
    let client = drydock_infra::net::default_http_client().context("Failed to build HTTP client")?;
    ExportEngine::new(client, service_url).context("Invalid service URL")
}

fn spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap(),
    );
    pb.enable_steady_tick(Duration::from_millis(100));
    pb.set_message(message.to_string());
    pb
}

pub async fn cmd_export(
    service_url: String,
    root: Utf8PathBuf,
    format: String,
    delay_ms: u64,
    force: bool,
    profile_id: Option<String>,
) -> Result<BatchReport> {
    println!(":: Exporting design archives...");
    println!("   Service: {}", service_url);
    println!("   Output:  {}", root);

    let engine = build_engine(&service_url)?;

    let delay_ms = drydock_config::clamp_stabilization_delay_ms(delay_ms);
    let options = ExportOptions {
        format,
        skip_existing: !force,
        stabilization_delay: Duration::from_millis(delay_ms),
    };
    let req = ExportRequest {
        export_root: root.clone(),
        options,
    };

    let report = engine.export_all(&req).await.context("Batch export failed")?;

    println!("\n:: Export Result");
    println!("   Hubs:     {}", report.hubs);
    println!("   Projects: {}", report.projects);
    println!(
        "   Exported: {} ({})",
        report.stats.exported,
        format_size(report.stats.bytes_exported, DECIMAL)
    );
    println!("   Skipped:  {}", report.stats.skipped);
    println!("   Filtered: {}", report.stats.filtered);
    println!("   Failed:   {}", report.stats.failed);
    println!("   Output root: {}", root);

    if let Some(id) = profile_id {
        // Stamping is bookkeeping; a failure here must not fail the export.
        if let Err(e) = profiles::ProfileManager::new().stamp_last_export(&id) {
            tracing::warn!(profile = %id, error = %e, "could not stamp profile");
        }
    }

    Ok(report)
}

pub async fn cmd_plan(
    service_url: String,
    root: Utf8PathBuf,
    format: String,
) -> Result<PlanSummary> {
    println!(":: Analyzing remote tree...");
    println!("   Service: {}", service_url);
    println!("   Output:  {}", root);

    let engine = build_engine(&service_url)?;

    let pb = spinner("Walking remote hierarchy...");
    let snapshot = engine.snapshot().await.context("Snapshot failed")?;
    pb.finish_with_message("Snapshot complete.");

    let options = ExportOptions {
        format,
        ..ExportOptions::default()
    };
    let summary = drydock_pipeline::evaluate(&snapshot, &root, &options);

    println!("\n:: Plan Result");
    println!("   Pending exports: {}", summary.pending());
    println!("   Up to date:      {}", summary.up_to_date());
    println!("   Other formats:   {}", summary.other_format());

    if summary.is_up_to_date() {
        println!("   Status:          Up to date");
    } else {
        println!("   Status:          Exports pending (run `export`)");
    }

    Ok(summary)
}

pub async fn cmd_tree(service_url: String, output: Option<Utf8PathBuf>) -> Result<()> {
    println!(":: Reading remote hierarchy...");
    println!("   Service: {}", service_url);

    let engine = build_engine(&service_url)?;

    let pb = spinner("Walking remote hierarchy...");
    let snapshot = engine.snapshot().await.context("Snapshot failed")?;
    pb.finish_with_message("Snapshot complete.");

    if let Some(out) = output {
        let json = serde_json::to_string_pretty(&snapshot)?;
        std::fs::write(&out, json)
            .with_context(|| format!("Failed to write snapshot to {}", out))?;
        println!(":: Saved snapshot to {}", out);
        return Ok(());
    }

    println!();
    for hub in &snapshot {
        println!("{}", hub.name);
        for project in &hub.projects {
            println!("  {}", project.name);
            print_folder(&project.root, 2);
        }
    }

    Ok(())
}

fn print_folder(folder: &FolderSnapshot, depth: usize) {
    let pad = "  ".repeat(depth);
    for file in &folder.files {
        println!("{pad}{}.{}", file.name, file.extension);
    }
    for sub in &folder.folders {
        println!("{pad}{}/", sub.name);
        print_folder(sub, depth + 1);
    }
}
