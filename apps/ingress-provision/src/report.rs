//! Human-readable and JSON run reports.

use std::fmt;
use std::path::Path;

use anyhow::{Context, Result};
use ingress_core::pipeline::{RunReport, RunStatus};
use ingress_core::record::Disposition;

/// Render the report for a terminal.
#[must_use]
pub fn render_summary(report: &RunReport) -> String {
    Summary(report).to_string().trim_end().to_owned()
}

struct Summary<'a>(&'a RunReport);

impl fmt::Display for Summary<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let report = self.0;
        let record = &report.record;

        match (&report.status, &report.failure) {
            (RunStatus::Failed, Some(failure)) => writeln!(
                f,
                "Provisioning FAILED at step {} [{}]: {}",
                failure.step, failure.category, failure.message
            )?,
            _ => writeln!(f, "Provisioning succeeded")?,
        }

        if let Some(bucket) = &record.bucket {
            writeln!(f, "  bucket        {} ({})", bucket.arn, disposition(bucket.disposition))?;
        }
        if let Some(queue) = &record.queue {
            writeln!(f, "  queue         {} ({})", queue.arn, disposition(queue.disposition))?;
            writeln!(f, "  queue url     {}", queue.url)?;
        }
        if let Some(written) = record.queue_policy_written {
            writeln!(f, "  queue policy  {}", written_or_unchanged(written))?;
        }
        if let Some(written) = record.notification_written {
            writeln!(f, "  notification  {}", written_or_unchanged(written))?;
        }
        if let Some((_, arn)) = &record.identity.user {
            writeln!(f, "  user          {arn}")?;
        }
        if let Some((_, arn)) = &record.identity.policy {
            let attached = if record.identity.policy_attached {
                "attached"
            } else {
                "not attached"
            };
            writeln!(f, "  policy        {arn} ({attached})")?;
        }
        if let Some(id) = &record.identity.access_key_id {
            writeln!(f, "  access key    {id}")?;
        }

        if report.status == RunStatus::Failed && !report.created_resources.is_empty() {
            writeln!(f, "Created before the failure (remove manually if unwanted):")?;
            for resource in &report.created_resources {
                writeln!(f, "  {:<13} {}", resource.kind.as_str(), resource.id)?;
            }
        }
        Ok(())
    }
}

fn written_or_unchanged(written: bool) -> &'static str {
    if written { "written" } else { "unchanged" }
}

fn disposition(d: Disposition) -> &'static str {
    match d {
        Disposition::Created => "created",
        Disposition::Adopted => "adopted",
    }
}

/// Write the report as pretty JSON.
pub fn write_json(path: &Path, report: &RunReport) -> Result<()> {
    let json = serde_json::to_string_pretty(report).context("failed to serialize run report")?;
    std::fs::write(path, json).with_context(|| format!("failed to write report {}", path.display()))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use ingress_core::{Emulator, IdentityService, IngressConfig, Pipeline, Services};
    use ingress_model::AwsRegion;

    use super::*;

    fn pipeline() -> (Arc<Emulator>, Pipeline) {
        let emulator = Arc::new(Emulator::new(AwsRegion::default()));
        let config = IngressConfig::builder()
            .bucket_name("b1")
            .queue_name("q1")
            .user_name("u1")
            .build();
        let pipeline = Pipeline::new(config, Services::from_shared(emulator.clone())).unwrap();
        (emulator, pipeline)
    }

    #[tokio::test]
    async fn test_should_summarize_successful_run() {
        let (_emulator, pipeline) = pipeline();
        let outcome = pipeline.run().await.unwrap();

        let text = render_summary(&outcome.report());
        assert!(text.starts_with("Provisioning succeeded"));
        assert!(text.contains("arn:aws:s3:::b1 (created)"));
        assert!(text.contains("queue policy  written"));
        assert!(!text.contains("Created before the failure"));
    }

    #[tokio::test]
    async fn test_should_list_created_resources_on_failure() {
        let (emulator, pipeline) = pipeline();
        emulator.create_user("u1").await.unwrap();
        let failure = pipeline.run().await.unwrap_err();

        let text = render_summary(&failure.report());
        let headline = "Provisioning FAILED at step 5/5 provision identity [NameCollision]";
        assert!(text.starts_with(headline));
        assert!(text.contains("Created before the failure"));
        assert!(text.contains("bucket        b1"));
    }

    #[tokio::test]
    async fn test_should_write_json_report() {
        let (_emulator, pipeline) = pipeline();
        let outcome = pipeline.run().await.unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.json");

        write_json(&path, &outcome.report()).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["status"], "succeeded");
        assert_eq!(value["record"]["bucket"]["name"], "b1");
        assert_eq!(value["createdResources"].as_array().map(Vec::len), Some(5));
    }
}
