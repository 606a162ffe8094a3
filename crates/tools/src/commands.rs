//! Diagnostic commands
//!
//! Output is written line by line to the supplied writer. A failed lookup
//! aborts the command; lines already written stay written.

use std::io::{self, Write};

use comfy_table::{presets::UTF8_FULL, Cell, Table};
use ethers::types::Address;
use ethers::utils::to_checksum;
use thiserror::Error;
use tracing::debug;

use crate::chain::{AccountBackend, ChainError};
use crate::network::{ProfileIssue, ProfileRegistry};
use crate::units;

#[derive(Error, Debug)]
pub enum CommandError {
    #[error(transparent)]
    Chain(#[from] ChainError),

    #[error("output error: {0}")]
    Io(#[from] io::Error),
}

/// One row of the `balances` table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BalanceRow {
    pub address: Address,
    pub eth_balance: String,
}

/// Print every account address, one per line, in enumeration order.
pub async fn list_accounts<W: Write>(
    backend: &dyn AccountBackend,
    out: &mut W,
) -> Result<usize, CommandError> {
    let accounts = backend.accounts().await?;
    for account in &accounts {
        writeln!(out, "{}", to_checksum(account, None))?;
    }
    Ok(accounts.len())
}

/// Fetch each balance sequentially, preserving enumeration order.
pub async fn collect_balances(
    backend: &dyn AccountBackend,
) -> Result<Vec<BalanceRow>, CommandError> {
    let accounts = backend.accounts().await?;
    let mut rows = Vec::with_capacity(accounts.len());
    for address in accounts {
        let wei = backend.balance(&address).await?;
        debug!(%address, %wei, "fetched balance");
        rows.push(BalanceRow {
            address,
            eth_balance: units::format_ether(wei),
        });
    }
    Ok(rows)
}

pub async fn list_balances<W: Write>(
    backend: &dyn AccountBackend,
    out: &mut W,
) -> Result<usize, CommandError> {
    let rows = collect_balances(backend).await?;
    render_balance_table(&rows, out)?;
    Ok(rows.len())
}

/// Render the `(index) | address | ethBalance` table.
pub fn render_balance_table<W: Write>(rows: &[BalanceRow], out: &mut W) -> io::Result<()> {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_header(vec!["(index)", "address", "ethBalance"]);
    for (index, row) in rows.iter().enumerate() {
        table.add_row(vec![
            Cell::new(index),
            Cell::new(to_checksum(&row.address, None)),
            Cell::new(&row.eth_balance),
        ]);
    }
    writeln!(out, "{table}")
}

/// List every configured profile without exposing secrets.
pub fn list_networks<W: Write>(registry: &ProfileRegistry, out: &mut W) -> io::Result<()> {
    for profile in registry.iter() {
        let chain_id = profile
            .chain_id
            .map(|id| id.to_string())
            .unwrap_or_else(|| "-".to_string());
        let endpoint = profile
            .endpoint
            .as_ref()
            .map(|e| e.redacted())
            .unwrap_or_else(|| "(in-process)".to_string());
        writeln!(
            out,
            "{:<24} {:<10} {:>7}  {}  [{}]",
            profile.name,
            profile.kind,
            chain_id,
            endpoint,
            profile.credential_source.describe()
        )?;
    }
    Ok(())
}

/// Print validation findings. Returns the number of issues.
pub fn report_issues<W: Write>(issues: &[ProfileIssue], out: &mut W) -> io::Result<usize> {
    if issues.is_empty() {
        writeln!(out, "All network profiles look complete")?;
    }
    for issue in issues {
        writeln!(out, "{issue}")?;
    }
    Ok(issues.len())
}
