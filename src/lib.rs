pub mod concurrent_ledger;
pub mod config;
pub mod engine;
pub mod error;
pub mod ledger;
pub mod models;
pub mod service;
pub mod store;

use std::io::{Read, Write};

use tracing::{info, warn};

use concurrent_ledger::ShardedLedger;
use config::LedgerConfig;
use error::Result;
use models::{BalanceRow, OperationType, PointsOperation};

/// Apply points operations from a CSV reader and write balances to a CSV writer
///
/// Input rows are `type,user,payer,points,date` where `type` is `earn` or
/// `spend`. A spend with an empty payer draws on all payers. Rows that fail
/// to parse or that the ledger rejects are skipped.
pub async fn process_operations<R: Read, W: Write>(
    reader: R,
    writer: W,
    config: &LedgerConfig,
) -> Result<()> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let ledger = ShardedLedger::new(config.num_shards);

    for (row, result) in csv_reader.deserialize::<PointsOperation>().enumerate() {
        match result {
            Ok(operation) => apply_operation(&ledger, row + 1, operation).await,
            Err(err) => warn!(row = row + 1, error = %err, "skipping malformed row"),
        }
    }

    write_balances(&ledger, writer).await?;

    Ok(())
}

async fn apply_operation(ledger: &ShardedLedger, row: usize, operation: PointsOperation) {
    let user = operation.user.as_str();
    let payer = operation.payer.as_deref();

    let outcome = match operation.op_type {
        OperationType::Earn => match (payer, operation.date.as_deref()) {
            (Some(payer), Some(date)) => ledger
                .earn(user, payer, operation.points, date)
                .await
                .map(|_| ()),
            _ => {
                warn!(row, user, "skipping earn without payer or date");
                return;
            }
        },
        OperationType::Spend => ledger
            .spend(user, payer, operation.points)
            .await
            .map(|receipt| {
                info!(row, user, lines = receipt.len(), "spend applied");
            }),
    };

    if let Err(err) = outcome {
        warn!(row, user, error = %err, "skipping rejected operation");
    }
}

/// Write every user's balances to CSV
async fn write_balances<W: Write>(ledger: &ShardedLedger, writer: W) -> Result<()> {
    let mut csv_writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);

    let all_balances = ledger.all_balances().await?;

    csv_writer.write_record(["user", "payer", "points"])?;
    for (user, balances) in &all_balances {
        for balance in balances {
            csv_writer.serialize(BalanceRow {
                user,
                payer: &balance.payer,
                points: balance.points,
            })?;
        }
    }

    csv_writer.flush()?;
    Ok(())
}
