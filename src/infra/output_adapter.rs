use crate::app::ports::RecordSink;
use crate::types::{ComparisonRecord, ProductRecord};
use anyhow::Context;
use std::fs::OpenOptions;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::info;

/// Writes records as NDJSON, one object per line. Comparison records are written
/// in their flattened report-row form.
pub struct JsonLinesSink {
    writer: Mutex<BufWriter<std::fs::File>>,
    path: PathBuf,
}

impl JsonLinesSink {
    pub fn create(path: &Path) -> anyhow::Result<Self> {
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("creating output directory {}", dir.display()))?;
        }
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(path)
            .with_context(|| format!("opening {}", path.display()))?;
        info!("Writing records to {}", path.display());
        Ok(Self {
            writer: Mutex::new(BufWriter::new(file)),
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write_lines<T: serde::Serialize>(&self, items: impl Iterator<Item = T>) -> anyhow::Result<()> {
        let mut writer = self
            .writer
            .lock()
            .map_err(|_| anyhow::anyhow!("output writer poisoned"))?;
        for item in items {
            serde_json::to_writer(&mut *writer, &item)?;
            writer.write_all(b"\n")?;
        }
        writer.flush()?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl RecordSink for JsonLinesSink {
    async fn write_comparisons(&self, records: &[ComparisonRecord]) -> anyhow::Result<()> {
        self.write_lines(records.iter().map(ComparisonRecord::to_row))
    }

    async fn write_products(&self, records: &[ProductRecord]) -> anyhow::Result<()> {
        self.write_lines(records.iter())
    }
}
