// CSV output: one row per standardized metric per tick, written inline on
// the sample callback. A closed stdout (downstream pipe gone) surfaces as
// an io error so the caller can wind down cleanly.

use std::io::{self, BufWriter, Write};

use crate::metrics::MetricBatch;

pub struct CsvWriter<W: Write> {
    out: W,
    header_written: bool,
}

impl CsvWriter<BufWriter<io::Stdout>> {
    pub fn stdout() -> Self {
        CsvWriter::new(BufWriter::new(io::stdout()))
    }
}

impl<W: Write> CsvWriter<W> {
    pub fn new(out: W) -> Self {
        CsvWriter {
            out,
            header_written: false,
        }
    }

    /// Write one tick. Rows follow the batch's emission order, which is
    /// the series' first-seen order.
    pub fn write_tick(&mut self, timestamp: f64, batch: &MetricBatch) -> io::Result<()> {
        if !self.header_written {
            writeln!(self.out, "timestamp,metric,value")?;
            self.header_written = true;
        }
        for (name, value) in batch {
            writeln!(self.out, "{timestamp:.6},{name},{value}")?;
        }
        self.out.flush()
    }
}
