mod manifest;
mod parser;
mod pipeline;
mod types;
mod usage;

pub use manifest::{build_unit_graph, fingerprint_sql};
pub use parser::{normalize_query_history, normalize_query_record};
pub use pipeline::{parse_manifest, parse_query_history, parse_usage_records, read_json_file};
pub use types::{IngestError, Result};
pub use usage::usage_events_from_value;
