//! Configuration for the merge tool
//!
//! CLI arguments and environment variable handling using clap. The library
//! itself takes no configuration (every aggregation call is self-contained),
//! so these options only shape one invocation of the tool.

use clap::Parser;
use std::path::PathBuf;

/// Merge recorded fan-out responses into one document
///
/// Reads one payload file per backend node, in fan-out response order, and
/// prints the aggregated document to stdout. Useful for replaying a
/// container's node responses when debugging a bad merge.
#[derive(Parser, Debug, Clone)]
#[command(name = "gathering")]
#[command(about = "Merge per-node list responses into a single document")]
pub struct Args {
    /// Payload files, one per node, in fan-out response order
    #[arg(required = true)]
    pub payloads: Vec<PathBuf>,

    /// Declared wire format of the payloads (JSON, JAXB or XSTREAM)
    #[arg(long, env = "GATHERING_FORMAT", default_value = "JSON")]
    pub format: String,

    /// Field to sort the merged elements by (e.g. processInstanceId)
    #[arg(long, env = "GATHERING_SORT")]
    pub sort: Option<String>,

    /// Sort descending instead of ascending
    #[arg(long, default_value = "false")]
    pub descending: bool,

    /// 0-based page of the merged result to keep
    #[arg(long, requires = "page_size")]
    pub page: Option<usize>,

    /// Page size; required whenever --page is given
    #[arg(long)]
    pub page_size: Option<usize>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "warn")]
    pub log_level: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_full_invocation() {
        let args = Args::try_parse_from([
            "gathering",
            "--format",
            "jaxb",
            "--sort",
            "ProcessId",
            "--descending",
            "--page",
            "1",
            "--page-size",
            "10",
            "node-a.xml",
            "node-b.xml",
        ])
        .unwrap();
        assert_eq!(args.payloads.len(), 2);
        assert_eq!(args.format, "jaxb");
        assert_eq!(args.sort.as_deref(), Some("ProcessId"));
        assert!(args.descending);
        assert_eq!(args.page, Some(1));
        assert_eq!(args.page_size, Some(10));
    }

    #[test]
    fn page_requires_page_size() {
        let result = Args::try_parse_from(["gathering", "--page", "1", "node-a.json"]);
        assert!(result.is_err());
    }

    #[test]
    fn payload_files_are_mandatory() {
        assert!(Args::try_parse_from(["gathering"]).is_err());
    }
}
