//! Output formatting and export module

pub mod release_csv;
pub mod reports;

pub use release_csv::{format_release_csv, write_release_csv};
pub use reports::{
    display_pipeline_report,
    format_compact_table,
    format_key_listing,
    format_proportion_table,
    format_summary,
    format_ticket_table,
};
