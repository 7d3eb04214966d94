// Prometheus text exposition. Dotted names become snake_case identifiers;
// hierarchical families (cpu cores, gpu devices, disks, interfaces) carry
// their instance segments as labels instead.

use crate::store::SeriesExport;

/// Prometheus-safe identifier plus labels for one standardized name.
pub fn metric_identity(name: &str) -> (String, Vec<(&'static str, String)>) {
    let segments: Vec<&str> = name.split('.').collect();
    match segments.as_slice() {
        ["cpu", cluster, idx, "core", id, "utilization", "percent"] => (
            "cpu_utilization_percent".into(),
            vec![
                ("cluster", cluster.to_string()),
                ("cluster_index", idx.to_string()),
                ("core", id.to_string()),
            ],
        ),
        ["cpu", cluster, idx, "total", "utilization", "percent"] => (
            "cpu_utilization_percent".into(),
            vec![
                ("cluster", cluster.to_string()),
                ("cluster_index", idx.to_string()),
            ],
        ),
        ["gpu", vendor, idx, "compute", "utilization", "percent"] => (
            "gpu_compute_utilization_percent".into(),
            vec![
                ("vendor", vendor.to_string()),
                ("gpu_index", idx.to_string()),
            ],
        ),
        ["gpu", vendor, idx, "memory", attr, "bytes"] => (
            format!("gpu_memory_{attr}_bytes"),
            vec![
                ("vendor", vendor.to_string()),
                ("gpu_index", idx.to_string()),
            ],
        ),
        ["disk", "device", device, direction, "bytes_per_sec"] => (
            format!("disk_{direction}_bytes_per_sec"),
            vec![("device", device.to_string())],
        ),
        ["network", "interface", interface, direction, "bytes_per_sec"] => (
            format!("network_{direction}_bytes_per_sec"),
            vec![("interface", interface.to_string())],
        ),
        _ => (flatten(name), Vec::new()),
    }
}

/// Lowercase and replace every non-alphanumeric with an underscore.
fn flatten(name: &str) -> String {
    name.chars()
        .map(|ch| {
            let ch = ch.to_ascii_lowercase();
            if ch.is_ascii_lowercase() || ch.is_ascii_digit() {
                ch
            } else {
                '_'
            }
        })
        .collect()
}

fn escape_label(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Render the full exposition: one HELP/TYPE header per family, then every
/// series of that family.
pub fn render(export: &[(String, SeriesExport)]) -> String {
    // Group by family, preserving first-seen family order.
    let mut family_order: Vec<String> = Vec::new();
    let mut families: std::collections::HashMap<String, Vec<(Vec<(&'static str, String)>, f64)>> =
        std::collections::HashMap::new();
    for (name, series) in export {
        let (family, labels) = metric_identity(name);
        if !families.contains_key(&family) {
            family_order.push(family.clone());
        }
        families
            .entry(family)
            .or_default()
            .push((labels, series.current));
    }

    let mut out = String::new();
    for family in family_order {
        let series = &families[&family];
        out.push_str(&format!("# HELP {family} System telemetry gauge.\n"));
        out.push_str(&format!("# TYPE {family} gauge\n"));
        for (labels, value) in series {
            if labels.is_empty() {
                out.push_str(&format!("{family} {value}\n"));
            } else {
                let rendered: Vec<String> = labels
                    .iter()
                    .map(|(key, val)| format!("{key}=\"{}\"", escape_label(val)))
                    .collect();
                out.push_str(&format!("{family}{{{}}} {value}\n", rendered.join(",")));
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn export_of(pairs: &[(&str, f64)]) -> Vec<(String, SeriesExport)> {
        pairs
            .iter()
            .map(|(name, value)| {
                (
                    name.to_string(),
                    SeriesExport {
                        current: *value,
                        history: vec![*value],
                    },
                )
            })
            .collect()
    }

    #[test]
    fn test_core_name_maps_to_labeled_gauge() {
        let (family, labels) = metric_identity("cpu.performance.0.core.2.utilization.percent");
        assert_eq!(family, "cpu_utilization_percent");
        assert_eq!(
            labels,
            vec![
                ("cluster", "performance".to_string()),
                ("cluster_index", "0".to_string()),
                ("core", "2".to_string()),
            ]
        );
    }

    #[test]
    fn test_cluster_total_has_no_core_label() {
        let (family, labels) = metric_identity("cpu.performance.0.total.utilization.percent");
        assert_eq!(family, "cpu_utilization_percent");
        assert_eq!(labels.len(), 2);
    }

    #[test]
    fn test_flat_names_flatten() {
        assert_eq!(
            metric_identity("memory.system.total.used.percent").0,
            "memory_system_total_used_percent"
        );
        assert_eq!(
            metric_identity("disk.total.read.bytes_per_sec").0,
            "disk_total_read_bytes_per_sec"
        );
        assert_eq!(
            metric_identity("accel.ane.utilization.percent").0,
            "accel_ane_utilization_percent"
        );
    }

    #[test]
    fn test_instance_families_carry_labels() {
        let (family, labels) = metric_identity("disk.device.nvme0n1.read.bytes_per_sec");
        assert_eq!(family, "disk_read_bytes_per_sec");
        assert_eq!(labels, vec![("device", "nvme0n1".to_string())]);

        let (family, labels) = metric_identity("network.interface.en0.tx.bytes_per_sec");
        assert_eq!(family, "network_tx_bytes_per_sec");
        assert_eq!(labels, vec![("interface", "en0".to_string())]);
    }

    #[test]
    fn test_render_sample_line() {
        let export = export_of(&[("cpu.performance.0.core.2.utilization.percent", 70.0)]);
        let text = render(&export);
        assert!(text.contains("# TYPE cpu_utilization_percent gauge\n"));
        assert!(text.contains(
            "cpu_utilization_percent{cluster=\"performance\",cluster_index=\"0\",core=\"2\"} 70\n"
        ));
    }

    #[test]
    fn test_render_one_header_per_family() {
        let export = export_of(&[
            ("cpu.performance.0.core.0.utilization.percent", 10.0),
            ("cpu.performance.0.core.1.utilization.percent", 20.0),
        ]);
        let text = render(&export);
        assert_eq!(text.matches("# HELP cpu_utilization_percent").count(), 1);
        assert_eq!(text.matches("core=\"").count(), 2);
    }

    #[test]
    fn test_label_escaping() {
        assert_eq!(escape_label("a\"b\\c"), "a\\\"b\\\\c");
    }
}
