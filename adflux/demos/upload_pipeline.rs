use std::sync::Arc;
use std::time::Duration;

use adflux::UploadPipeline;
use adflux_mock::MockUploader;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();

    // Lines marked FAIL are rejected by the mock uploader.
    let lines: Vec<String> = (0..25)
        .map(|i| {
            let gclid = if i % 7 == 3 { format!("FAIL-{i}") } else { format!("gclid-{i}") };
            format!(r#"{{"gclid":"{gclid}","timestampMicros":"1704067200000000"}}"#)
        })
        .collect();

    let pipeline = UploadPipeline::new(Arc::new(MockUploader::new()))
        .batch_size(10)
        .deadline(Duration::from_secs(10))
        .batch_prefix("demo");
    let report = pipeline.run(&lines).await?;

    println!(
        "{} line(s) in {} batch(es), {} failed",
        report.total_lines,
        report.batches.len(),
        report.failed_lines
    );
    for (error, failed) in &report.grouped_failed {
        println!("{error}: {} line(s)", failed.len());
        for line in failed {
            println!("  {line}");
        }
    }
    println!("{}", serde_json::to_string_pretty(&report)?);

    Ok(())
}
