//! Output contract: typed report, schema validation and formatters

pub mod formatter;
pub mod report;
pub mod schema;

pub use formatter::{save_report_to_file, OutputFormatter, ReportGenerator};
pub use report::AssignmentOutput;
pub use schema::{get_schema, SchemaValidator, ValidationReport};
