// Disk throughput collectors. Linux parses /proc/diskstats and converts the
// cumulative byte counters to rates; the powermetrics path already carries
// device-wide byte rates.

use super::{Collector, RateReader};
use crate::metrics::{sanitize_segment, MetricBatch, PlatformContext, Sample};

/// Sector unit used by the diskstats interface regardless of hardware.
const SECTOR_BYTES: f64 = 512.0;

pub struct ProcDiskCollector {
    path: String,
}

impl ProcDiskCollector {
    pub fn new() -> Self {
        ProcDiskCollector {
            path: "/proc/diskstats".into(),
        }
    }
}

impl Collector for ProcDiskCollector {
    fn domain(&self) -> &'static str {
        "disk"
    }

    fn collect(
        &mut self,
        _sample: &Sample,
        rates: &mut RateReader,
    ) -> anyhow::Result<MetricBatch> {
        let contents = std::fs::read_to_string(&self.path)?;
        let devices = parse_diskstats(&contents);
        if devices.is_empty() {
            anyhow::bail!("no block devices in diskstats");
        }
        Ok(rates_from_counters(&devices, rates))
    }
}

/// Cumulative read/write bytes for one block device.
#[derive(Debug, Clone, PartialEq)]
pub struct DiskCounters {
    pub name: String,
    pub read_bytes: f64,
    pub write_bytes: f64,
}

/// Parse /proc/diskstats, keeping whole devices and skipping partitions and
/// virtual devices.
///
/// Field layout per line: major minor name reads-completed reads-merged
/// sectors-read ms-reading writes-completed writes-merged sectors-written …
pub fn parse_diskstats(contents: &str) -> Vec<DiskCounters> {
    let mut devices = Vec::new();
    for line in contents.lines() {
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() < 10 {
            continue;
        }
        let name = fields[2];
        if !is_physical_device(name) {
            continue;
        }
        let sectors_read: f64 = match fields[5].parse() {
            Ok(v) => v,
            Err(_) => continue,
        };
        let sectors_written: f64 = match fields[9].parse() {
            Ok(v) => v,
            Err(_) => continue,
        };
        devices.push(DiskCounters {
            name: name.to_string(),
            read_bytes: sectors_read * SECTOR_BYTES,
            write_bytes: sectors_written * SECTOR_BYTES,
        });
    }
    devices
}

/// Whole-device names only: sda yes, sda1 no, nvme0n1 yes, nvme0n1p2 no.
fn is_physical_device(name: &str) -> bool {
    if name.starts_with("loop")
        || name.starts_with("ram")
        || name.starts_with("zram")
        || name.starts_with("dm-")
        || name.starts_with("md")
    {
        return false;
    }
    if name.starts_with("nvme") || name.starts_with("mmcblk") {
        // Partitions carry a pN suffix.
        return !partition_suffix(name, 'p');
    }
    if name.starts_with("sd") || name.starts_with("hd") || name.starts_with("vd") {
        return !name.ends_with(|c: char| c.is_ascii_digit());
    }
    true
}

fn partition_suffix(name: &str, marker: char) -> bool {
    let bytes = name.as_bytes();
    let mut idx = bytes.len();
    while idx > 0 && bytes[idx - 1].is_ascii_digit() {
        idx -= 1;
    }
    idx > 0 && idx < bytes.len() && bytes[idx - 1] == marker as u8
}

/// Totals first, then per-device rates; counters go through the rate reader.
pub fn rates_from_counters(devices: &[DiskCounters], rates: &mut RateReader) -> MetricBatch {
    let mut batch = MetricBatch::new();
    let mut total_read = 0.0;
    let mut total_write = 0.0;
    let mut per_device = Vec::with_capacity(devices.len() * 2);
    for dev in devices {
        let seg = sanitize_segment(&dev.name);
        let read = rates.next(&format!("disk.{seg}.read"), dev.read_bytes);
        let write = rates.next(&format!("disk.{seg}.write"), dev.write_bytes);
        total_read += read;
        total_write += write;
        per_device.push((format!("disk.device.{seg}.read.bytes_per_sec"), read));
        per_device.push((format!("disk.device.{seg}.write.bytes_per_sec"), write));
    }
    batch.push(("disk.total.read.bytes_per_sec".into(), total_read));
    batch.push(("disk.total.write.bytes_per_sec".into(), total_write));
    batch.extend(per_device);
    batch
}

/// Device-wide byte rates from the powermetrics document.
pub struct PowerMetricsDiskCollector;

impl PowerMetricsDiskCollector {
    pub fn new() -> Self {
        PowerMetricsDiskCollector
    }
}

impl Collector for PowerMetricsDiskCollector {
    fn domain(&self) -> &'static str {
        "disk"
    }

    fn collect(
        &mut self,
        sample: &Sample,
        _rates: &mut RateReader,
    ) -> anyhow::Result<MetricBatch> {
        let doc = match &sample.raw {
            PlatformContext::PowerMetrics(doc) => doc,
            PlatformContext::Polling { .. } => {
                anyhow::bail!("powermetrics document missing from sample")
            }
        };
        let disk = doc
            .disk
            .as_ref()
            .ok_or_else(|| anyhow::anyhow!("document has no disk section"))?;
        Ok(vec![
            ("disk.total.read.bytes_per_sec".into(), disk.rbytes_per_s),
            ("disk.total.write.bytes_per_sec".into(), disk.wbytes_per_s),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DISKSTATS: &str = "\
   8       0 sda 1000 0 2000 500 300 0 4000 700 0 0 0
   8       1 sda1 900 0 1800 450 250 0 3500 600 0 0 0
 259       0 nvme0n1 100 0 800 40 50 0 1600 30 0 0 0
 259       1 nvme0n1p1 90 0 700 35 40 0 1500 25 0 0 0
   7       0 loop0 10 0 80 4 0 0 0 0 0 0 0
";

    #[test]
    fn test_parse_keeps_whole_devices_only() {
        let devices = parse_diskstats(DISKSTATS);
        let names: Vec<&str> = devices.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["sda", "nvme0n1"]);
    }

    #[test]
    fn test_sector_counts_become_bytes() {
        let devices = parse_diskstats(DISKSTATS);
        assert_eq!(devices[0].read_bytes, 2000.0 * 512.0);
        assert_eq!(devices[0].write_bytes, 4000.0 * 512.0);
    }

    #[test]
    fn test_physical_device_filter() {
        assert!(is_physical_device("sda"));
        assert!(!is_physical_device("sda2"));
        assert!(is_physical_device("nvme0n1"));
        assert!(!is_physical_device("nvme0n1p2"));
        assert!(is_physical_device("mmcblk0"));
        assert!(!is_physical_device("mmcblk0p1"));
        assert!(!is_physical_device("loop3"));
        assert!(!is_physical_device("dm-0"));
    }

    #[test]
    fn test_rates_totals_precede_devices() {
        let mut rates = RateReader::new(1.0);
        let devices = vec![
            DiskCounters {
                name: "sda".into(),
                read_bytes: 1000.0,
                write_bytes: 0.0,
            },
            DiskCounters {
                name: "sdb".into(),
                read_bytes: 500.0,
                write_bytes: 0.0,
            },
        ];
        rates_from_counters(&devices, &mut rates);
        let advanced = vec![
            DiskCounters {
                name: "sda".into(),
                read_bytes: 1300.0,
                write_bytes: 0.0,
            },
            DiskCounters {
                name: "sdb".into(),
                read_bytes: 700.0,
                write_bytes: 0.0,
            },
        ];
        let batch = rates_from_counters(&advanced, &mut rates);
        assert_eq!(batch[0].0, "disk.total.read.bytes_per_sec");
        assert_eq!(batch[0].1, 500.0);
        assert_eq!(batch[2].0, "disk.device.sda.read.bytes_per_sec");
        assert_eq!(batch[2].1, 300.0);
    }
}
