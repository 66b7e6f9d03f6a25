//! CSV scalar log.
//!
//! Each run gets its own directory holding a `scalars.csv` with the columns
//! `step,tag,value,wall_time`, where `wall_time` is seconds since the writer
//! was created. The file is easy to plot with any spreadsheet or dataframe
//! library.

use std::fs::{File, create_dir_all};
use std::io::{Write, BufWriter};
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::error::Result;
use super::Recorder;

/// Appends scalars to `<log_dir>/<run_name>/scalars.csv`.
pub struct ScalarWriter {
    run_dir: PathBuf,
    start: Instant,
    writer: BufWriter<File>,
}

impl ScalarWriter {
    /// Create the run directory and the CSV file with its header.
    ///
    /// # Arguments
    /// * `log_dir` - Directory to save logs
    /// * `run_name` - Name of this training run
    pub fn new<P: AsRef<Path>>(log_dir: P, run_name: &str) -> Result<Self> {
        let run_dir = log_dir.as_ref().join(run_name);
        create_dir_all(&run_dir)?;

        let mut writer = BufWriter::new(File::create(run_dir.join("scalars.csv"))?);
        writeln!(writer, "step,tag,value,wall_time")?;

        Ok(Self {
            run_dir,
            start: Instant::now(),
            writer,
        })
    }

    /// Log a scalar value
    pub fn add_scalar(&mut self, tag: &str, value: f32, step: u64) -> Result<()> {
        let wall_time = self.start.elapsed().as_secs_f64();
        writeln!(self.writer, "{},{},{},{:.3}", step, tag, value, wall_time)?;
        Ok(())
    }

    pub fn run_dir(&self) -> &Path {
        &self.run_dir
    }

    pub fn csv_path(&self) -> PathBuf {
        self.run_dir.join("scalars.csv")
    }
}

impl Recorder for ScalarWriter {
    fn record(&mut self, name: &str, value: f32, step: u64) -> Result<()> {
        self.add_scalar(name, value, step)
    }

    fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}

impl Drop for ScalarWriter {
    fn drop(&mut self) {
        let _ = self.writer.flush();
    }
}
