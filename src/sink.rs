use std::fs;
use std::fs::File;
use std::path::Path;
use std::sync::Arc;

use arrow::array::ArrayRef;
use arrow::array::Float64Builder;
use arrow::array::StringBuilder;
use arrow::array::TimestampMillisecondBuilder;
use arrow::datatypes::DataType;
use arrow::datatypes::Field;
use arrow::datatypes::Schema;
use arrow::datatypes::SchemaRef;
use arrow::datatypes::TimeUnit;
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use parquet::basic::Compression;
use parquet::file::properties::WriterProperties;
use tracing::info;
use uuid::Uuid;

use crate::error::Result;
use crate::players::PLAYER_ID_LEN;
use crate::timeseries::PaymentRecord;
use crate::timeseries::StatsRecord;

pub const STATS_TABLE: &str = "player_stats";
pub const PAYMENTS_TABLE: &str = "player_payments";

/// Write discipline for one dataset directory.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum WritePolicy {
    /// Delete the dataset directory first; the run produces a clean
    /// snapshot.
    Replace,
    /// Add a new part file alongside existing ones, leaving them untouched.
    Append,
}

pub fn stats_schema() -> SchemaRef {
    Arc::new(Schema::new(vec![
        Field::new("player_id", DataType::Utf8, false),
        Field::new(
            "ts",
            DataType::Timestamp(TimeUnit::Millisecond, Some("UTC".into())),
            false,
        ),
        Field::new("win_loss_ratio", DataType::Float64, false),
        Field::new("games_played", DataType::Float64, false),
        Field::new("time_in_game", DataType::Float64, false),
    ]))
}

pub fn payments_schema() -> SchemaRef {
    Arc::new(Schema::new(vec![
        Field::new("player_id", DataType::Utf8, false),
        Field::new(
            "ts",
            DataType::Timestamp(TimeUnit::Millisecond, Some("UTC".into())),
            false,
        ),
        Field::new("amount", DataType::Float64, false),
        Field::new("transactions", DataType::Float64, false),
    ]))
}

pub fn stats_batch(records: &[StatsRecord]) -> Result<RecordBatch> {
    let cap = records.len();
    let mut player_id = StringBuilder::with_capacity(cap, cap * PLAYER_ID_LEN);
    let mut ts = TimestampMillisecondBuilder::with_capacity(cap).with_timezone("UTC");
    let mut win_loss_ratio = Float64Builder::with_capacity(cap);
    let mut games_played = Float64Builder::with_capacity(cap);
    let mut time_in_game = Float64Builder::with_capacity(cap);

    for record in records {
        player_id.append_value(&record.player_id);
        ts.append_value(record.ts.timestamp_millis());
        win_loss_ratio.append_value(record.win_loss_ratio);
        games_played.append_value(record.games_played);
        time_in_game.append_value(record.time_in_game);
    }

    let cols: Vec<ArrayRef> = vec![
        Arc::new(player_id.finish()),
        Arc::new(ts.finish()),
        Arc::new(win_loss_ratio.finish()),
        Arc::new(games_played.finish()),
        Arc::new(time_in_game.finish()),
    ];

    Ok(RecordBatch::try_new(stats_schema(), cols)?)
}

pub fn payments_batch(records: &[PaymentRecord]) -> Result<RecordBatch> {
    let cap = records.len();
    let mut player_id = StringBuilder::with_capacity(cap, cap * PLAYER_ID_LEN);
    let mut ts = TimestampMillisecondBuilder::with_capacity(cap).with_timezone("UTC");
    let mut amount = Float64Builder::with_capacity(cap);
    let mut transactions = Float64Builder::with_capacity(cap);

    for record in records {
        player_id.append_value(&record.player_id);
        ts.append_value(record.ts.timestamp_millis());
        amount.append_value(record.amount);
        transactions.append_value(record.transactions);
    }

    let cols: Vec<ArrayRef> = vec![
        Arc::new(player_id.finish()),
        Arc::new(ts.finish()),
        Arc::new(amount.finish()),
        Arc::new(transactions.finish()),
    ];

    Ok(RecordBatch::try_new(payments_schema(), cols)?)
}

/// Writes both streams under `base_dir` as partitioned parquet datasets.
///
/// A failed write is not rolled back; the dataset being written must be
/// treated as corrupt and regenerated with a replace run.
pub fn persist(
    base_dir: &Path,
    stats: &[StatsRecord],
    payments: &[PaymentRecord],
    policy: WritePolicy,
) -> Result<()> {
    fs::create_dir_all(base_dir)?;

    write_dataset(&base_dir.join(STATS_TABLE), stats_batch(stats)?, policy)?;
    write_dataset(&base_dir.join(PAYMENTS_TABLE), payments_batch(payments)?, policy)?;

    Ok(())
}

fn write_dataset(path: &Path, batch: RecordBatch, policy: WritePolicy) -> Result<()> {
    match policy {
        WritePolicy::Replace => {
            info!("saving {} row(s) to {:?}", batch.num_rows(), path);
            if path.exists() {
                fs::remove_dir_all(path)?;
            }
        }
        WritePolicy::Append => {
            info!("appending {} row(s) to {:?}", batch.num_rows(), path);
        }
    }
    fs::create_dir_all(path)?;

    let file = File::create(path.join(format!("part-{}.parquet", Uuid::new_v4())))?;
    let props = WriterProperties::builder()
        .set_compression(Compression::SNAPPY)
        .build();
    let mut writer = ArrowWriter::try_new(file, batch.schema(), Some(props))?;
    writer.write(&batch)?;
    writer.close()?;

    Ok(())
}
