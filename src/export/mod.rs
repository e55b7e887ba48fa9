//! Finalized step export.
//!
//! The downstream runner consumes an ordered step list; JSON and YAML
//! carry the full bundles, CSV is the flat hand-off format for the
//! CSV-driven replay tooling.

use std::io::Write;
use std::str::FromStr;

use anyhow::{bail, Context, Result};

use crate::recorder::Step;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Json,
    Yaml,
    Csv,
}

impl FromStr for ExportFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(ExportFormat::Json),
            "yaml" | "yml" => Ok(ExportFormat::Yaml),
            "csv" => Ok(ExportFormat::Csv),
            other => bail!("unknown export format '{other}' (expected json, yaml or csv)"),
        }
    }
}

/// Write the finalized steps to `out` in the requested format.
pub fn write_steps<W: Write>(steps: &[Step], format: ExportFormat, out: W) -> Result<()> {
    match format {
        ExportFormat::Json => {
            serde_json::to_writer_pretty(out, steps).context("serializing steps to JSON")
        }
        ExportFormat::Yaml => {
            serde_yaml::to_writer(out, steps).context("serializing steps to YAML")
        }
        ExportFormat::Csv => write_csv(steps, out),
    }
}

fn write_csv<W: Write>(steps: &[Step], out: W) -> Result<()> {
    let mut writer = csv::Writer::from_writer(out);
    writer.write_record(["order", "event", "path", "value", "label", "x", "y"])?;
    for step in steps {
        writer.write_record([
            step.order.to_string(),
            step.event.to_string(),
            step.path.clone(),
            step.value.clone().unwrap_or_default(),
            step.label.clone().unwrap_or_default(),
            step.coords.map(|c| c.x.to_string()).unwrap_or_default(),
            step.coords.map(|c| c.y.to_string()).unwrap_or_default(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recorder::{CapturedStep, LocatorBundle, StepKind};

    fn steps() -> Vec<Step> {
        let open = CapturedStep::new(StepKind::Open, LocatorBundle::for_page("https://a.test/"))
            .with_value("https://a.test/");
        let input = CapturedStep::new(
            StepKind::Input,
            LocatorBundle {
                id: Some("email".into()),
                xpath: "/html[1]/body[1]/input[1]".into(),
                ..Default::default()
            },
        )
        .with_value("jane@corp.com")
        .with_label(Some("Email".into()));
        vec![
            Step::from_captured(1, &open),
            Step::from_captured(2, &input),
        ]
    }

    #[test]
    fn test_format_parsing() {
        assert_eq!("json".parse::<ExportFormat>().unwrap(), ExportFormat::Json);
        assert_eq!("YAML".parse::<ExportFormat>().unwrap(), ExportFormat::Yaml);
        assert_eq!("yml".parse::<ExportFormat>().unwrap(), ExportFormat::Yaml);
        assert!("xml".parse::<ExportFormat>().is_err());
    }

    #[test]
    fn test_json_round_trip() {
        let mut buf = Vec::new();
        write_steps(&steps(), ExportFormat::Json, &mut buf).unwrap();
        let parsed: Vec<Step> = serde_json::from_slice(&buf).unwrap();
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0].order, 1);
        assert_eq!(parsed[1].value.as_deref(), Some("jane@corp.com"));
    }

    #[test]
    fn test_csv_layout() {
        let mut buf = Vec::new();
        write_steps(&steps(), ExportFormat::Csv, &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some("order,event,path,value,label,x,y"));
        assert!(lines.next().unwrap().starts_with("1,open,"));
        let input_line = lines.next().unwrap();
        assert!(input_line.contains("jane@corp.com"));
        assert!(input_line.contains("Email"));
    }
}
