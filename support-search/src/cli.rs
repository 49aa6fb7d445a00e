//! Command line interface.

use chrono::{DateTime, NaiveDate, Utc};
use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "support-search")]
#[command(about = "Index and search the support site content", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// OpenSearch URL, overriding OPENSEARCH_URL
    #[arg(long, global = true)]
    pub opensearch_url: Option<String>,

    /// Index name prefix, overriding ES_INDEX_PREFIX
    #[arg(long, global = true)]
    pub index_prefix: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Index documents of the selected types
    Reindex(ReindexArgs),
    /// Create every missing index
    InitIndices,
    /// Drop every index
    DeleteIndices,
    /// Run a search and print the response
    Search(SearchArgs),
    /// Remove a value from an array field of every document of a type
    RemoveFromField(RemoveFromFieldArgs),
    /// Report whether the engine is reachable and healthy
    Health,
}

#[derive(Args, Debug, Clone)]
pub struct ReindexArgs {
    /// Only reindex these document types
    #[arg(long, num_args = 1..)]
    pub limit: Vec<String>,

    /// Percentage of each type's rows to index
    #[arg(long, conflicts_with = "count")]
    pub percentage: Option<f64>,

    /// Number of each type's rows to index
    #[arg(long)]
    pub count: Option<usize>,

    /// Rows per bulk job
    #[arg(long, default_value_t = 5000)]
    pub sql_chunk_size: usize,

    /// Documents per bulk request, defaulting to ES_BULK_CHUNK_SIZE
    #[arg(long)]
    pub elastic_chunk_size: Option<usize>,

    /// Bulk request timeout in seconds, defaulting to ES_TIMEOUT_SECS
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Only rows updated before this date or RFC 3339 time
    #[arg(long, value_parser = parse_datetime)]
    pub updated_before: Option<DateTime<Utc>>,

    /// Only rows updated after this date or RFC 3339 time
    #[arg(long, value_parser = parse_datetime)]
    pub updated_after: Option<DateTime<Utc>>,

    /// Print how many rows would be indexed and stop
    #[arg(long)]
    pub print_sql_count: bool,
}

#[derive(Args, Debug, Clone)]
pub struct SearchArgs {
    /// Query text
    pub q: String,

    /// Bitmask of content kinds: 1 wiki, 2 questions, 4 forums, 8 profiles
    #[arg(short, long)]
    pub w: Option<String>,

    #[arg(long)]
    pub page: Option<String>,

    #[arg(long)]
    pub locale: Option<String>,

    /// Product slug
    #[arg(long)]
    pub product: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct RemoveFromFieldArgs {
    /// Document type name, e.g. WikiDocument
    pub doc_type: String,

    /// Array field to scrub
    pub field: String,

    /// Value to remove, parsed as JSON when possible
    pub value: String,
}

/// Parse `2024-01-31` (midnight UTC) or an RFC 3339 timestamp.
pub fn parse_datetime(value: &str) -> Result<DateTime<Utc>, String> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Ok(parsed.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
        .ok_or_else(|| format!("invalid date {:?}, expected YYYY-MM-DD or RFC 3339", value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_parse_reindex_flags() {
        let cli = Cli::try_parse_from([
            "support-search",
            "reindex",
            "--limit",
            "WikiDocument",
            "QuestionDocument",
            "--percentage",
            "50",
            "--updated-after",
            "2024-01-31",
            "--print-sql-count",
        ])
        .unwrap();

        match cli.command {
            Command::Reindex(args) => {
                assert_eq!(args.limit, vec!["WikiDocument", "QuestionDocument"]);
                assert_eq!(args.percentage, Some(50.0));
                assert_eq!(args.sql_chunk_size, 5000);
                assert_eq!(
                    args.updated_after,
                    Some(Utc.with_ymd_and_hms(2024, 1, 31, 0, 0, 0).unwrap())
                );
                assert!(args.print_sql_count);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_count_conflicts_with_percentage() {
        assert!(Cli::try_parse_from([
            "support-search",
            "reindex",
            "--count",
            "10",
            "--percentage",
            "5"
        ])
        .is_err());
    }

    #[test]
    fn test_parse_datetime() {
        assert_eq!(
            parse_datetime("2024-02-01T08:30:00+01:00").unwrap(),
            Utc.with_ymd_and_hms(2024, 2, 1, 7, 30, 0).unwrap()
        );
        assert!(parse_datetime("yesterday").is_err());
    }
}
