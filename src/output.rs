//! Output formatting for CLI display.
//!
//! Provides the [`PrettyPrint`] trait for human-readable output
//! as an alternative to JSON serialization.

use chrono::{DateTime, Utc};

use crate::{App, Job, Metadata, Organization, Space};

/// Trait for human-readable key-value output.
pub trait PrettyPrint {
    /// Returns a formatted string for terminal display.
    fn pretty_print(&self) -> String;
}

fn push_timestamps(
    lines: &mut Vec<String>,
    created: Option<&DateTime<Utc>>,
    updated: Option<&DateTime<Utc>>,
) {
    if let Some(created) = created {
        lines.push(format!("Created:        {}", created.format("%Y-%m-%d %H:%M:%S UTC")));
    }
    if let Some(updated) = updated {
        lines.push(format!("Updated:        {}", updated.format("%Y-%m-%d %H:%M:%S UTC")));
    }
}

fn push_labels(lines: &mut Vec<String>, metadata: &Metadata) {
    let labels: Vec<String> = metadata
        .labels
        .iter()
        .filter_map(|(k, v)| v.as_ref().map(|v| format!("{k}={v}")))
        .collect();
    if !labels.is_empty() {
        lines.push(format!("Labels:         {}", labels.join(", ")));
    }
}

impl PrettyPrint for App {
    fn pretty_print(&self) -> String {
        let divider = "─".repeat(self.guid.len().max(30));

        let mut lines = vec![
            format!("App: {}", self.name),
            divider,
            format!("Guid:           {}", self.guid),
            format!("State:          {}", self.state),
        ];

        if let Some(space) = self.space_guid() {
            lines.push(format!("Space:          {}", space));
        }

        if let Some(ref lifecycle) = self.lifecycle {
            lines.push(format!("Lifecycle:      {}", lifecycle.lifecycle_type));
        }

        push_timestamps(&mut lines, self.created_at.as_ref(), self.updated_at.as_ref());
        push_labels(&mut lines, &self.metadata);
        lines.join("\n")
    }
}

impl PrettyPrint for Organization {
    fn pretty_print(&self) -> String {
        let divider = "─".repeat(self.guid.len().max(30));

        let mut lines = vec![
            format!("Organization: {}", self.name),
            divider,
            format!("Guid:           {}", self.guid),
        ];

        if self.suspended {
            lines.push("Status:         suspended".to_string());
        }

        push_timestamps(&mut lines, self.created_at.as_ref(), self.updated_at.as_ref());
        push_labels(&mut lines, &self.metadata);
        lines.join("\n")
    }
}

impl PrettyPrint for Space {
    fn pretty_print(&self) -> String {
        let divider = "─".repeat(self.guid.len().max(30));

        let mut lines = vec![
            format!("Space: {}", self.name),
            divider,
            format!("Guid:           {}", self.guid),
        ];

        if let Some(org) = self.organization_guid() {
            lines.push(format!("Organization:   {}", org));
        }

        push_timestamps(&mut lines, self.created_at.as_ref(), self.updated_at.as_ref());
        push_labels(&mut lines, &self.metadata);
        lines.join("\n")
    }
}

impl PrettyPrint for Job {
    fn pretty_print(&self) -> String {
        let header = format!("Job: {}", self.guid);
        let divider = "─".repeat(header.len().max(30));

        let mut lines = vec![
            header,
            divider,
            format!("Operation:      {}", self.operation),
            format!("State:          {}", self.state),
        ];

        for error in &self.errors {
            lines.push(format!("Error:          {}", error));
        }
        for warning in &self.warnings {
            lines.push(format!("Warning:        {}", warning.detail));
        }

        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_pretty_print_format() {
        let app: App = serde_json::from_value(serde_json::json!({
            "guid": "app-1",
            "name": "web",
            "state": "STARTED",
            "relationships": {"space": {"data": {"guid": "space-1"}}},
            "metadata": {"labels": {"team": "payments"}, "annotations": {}}
        }))
        .unwrap();

        let output = app.pretty_print();
        assert!(output.starts_with("App: web"));
        assert!(output.contains("State:          STARTED"));
        assert!(output.contains("Space:          space-1"));
        assert!(output.contains("team=payments"));
    }

    #[test]
    fn test_job_pretty_print_lists_errors() {
        let job: Job = serde_json::from_value(serde_json::json!({
            "guid": "job-1",
            "operation": "app.delete",
            "state": "FAILED",
            "errors": [{"code": 10008, "title": "CF-UnprocessableEntity", "detail": "nope"}]
        }))
        .unwrap();

        let output = job.pretty_print();
        assert!(output.contains("State:          FAILED"));
        assert!(output.contains("CF-UnprocessableEntity (10008): nope"));
    }
}
