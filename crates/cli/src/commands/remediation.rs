//! Remediation guidance command

use anyhow::Result;
use serde::Serialize;
use tabled::Tabled;

use advisor_lib::RemediationTable;

use crate::output::{print_table, OutputFormat};

/// Row for the remediation table
#[derive(Tabled, Serialize)]
pub struct RemediationTableRow {
    #[tabled(rename = "Issue")]
    pub issue: String,
    #[tabled(rename = "Remediation")]
    pub remediation: String,
}

impl RemediationTableRow {
    pub fn from_table(table: &RemediationTable) -> Vec<Self> {
        table
            .iter()
            .map(|(check, text)| Self {
                issue: check.label().to_string(),
                remediation: text.to_string(),
            })
            .collect()
    }
}

/// Print the static remediation table
pub fn show_remediation(format: OutputFormat) -> Result<()> {
    let table = RemediationTable::standard()?;
    print_table(&RemediationTableRow::from_table(&table), format)
}
