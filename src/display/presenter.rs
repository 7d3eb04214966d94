// Presenters: pure transforms from standardized names to display rows.
// They never touch the store or the terminal; the layout in display::rows
// drives them with the current mode aggregate.

use super::format;
use super::modes::{CpuMode, GpuMode, MemoryMode, Modes, PowerMode, Toggle, ViewMode};
use crate::metrics::domain_of;

/// One visible chart row.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub name: String,
    pub title: String,
    pub indent: u16,
}

pub trait Presenter {
    fn domain(&self) -> &'static str;

    /// Display title under the current modes; None hides the series.
    fn display_name(&self, name: &str, modes: &Modes) -> Option<String>;

    fn indent(&self, _name: &str, _modes: &Modes) -> u16 {
        0
    }

    /// Stable per-domain re-grouping of the domain's series names.
    fn arrange(&self, _names: &mut Vec<String>) {}
}

/// Format a value according to the unit segment of its name.
pub fn format_value(name: &str, value: f64) -> String {
    match name.rsplit('.').next() {
        Some("percent") => format::percent(value),
        Some("watts") => format::watts(value),
        Some("bytes_per_sec") => format::bytes_per_sec(value),
        Some("bytes") => format::bytes(value),
        Some("count") => format!("{value:.0}"),
        _ => format!("{value:.1}"),
    }
}

/// Renderer denominator: percents are capped at 100, rates scale to the
/// power-of-10 ceiling of the window maximum.
pub fn scale_for(name: &str, window_max: f64) -> f64 {
    match name.rsplit('.').next() {
        Some("percent") => 100.0,
        _ => format::power_of_ten_ceiling(window_max),
    }
}

fn capitalize(segment: &str) -> String {
    let mut chars = segment.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

// ---- CPU ----

enum CpuKind {
    Total,
    Core(u32),
}

struct CpuName<'a> {
    cluster: &'a str,
    kind: CpuKind,
}

fn parse_cpu(name: &str) -> Option<CpuName<'_>> {
    // cpu.<cluster>.<idx>.total.utilization.percent
    // cpu.<cluster>.<idx>.core.<id>.utilization.percent
    let segments: Vec<&str> = name.split('.').collect();
    match segments.as_slice() {
        ["cpu", cluster, _idx, "total", "utilization", "percent"] => Some(CpuName {
            cluster,
            kind: CpuKind::Total,
        }),
        ["cpu", cluster, _idx, "core", id, "utilization", "percent"] => Some(CpuName {
            cluster,
            kind: CpuKind::Core(id.parse().ok()?),
        }),
        _ => None,
    }
}

pub struct CpuPresenter;

impl Presenter for CpuPresenter {
    fn domain(&self) -> &'static str {
        "cpu"
    }

    fn display_name(&self, name: &str, modes: &Modes) -> Option<String> {
        let parsed = parse_cpu(name)?;
        match (parsed.kind, modes.cpu) {
            (CpuKind::Total, CpuMode::All) => None,
            (CpuKind::Total, _) => Some(format!("{} total", capitalize(parsed.cluster))),
            (CpuKind::Core(_), CpuMode::ByCluster) => None,
            (CpuKind::Core(id), _) => {
                Some(format!("{} CPU {id}", capitalize(parsed.cluster)))
            }
        }
    }

    fn indent(&self, name: &str, modes: &Modes) -> u16 {
        // Core rows nest under their cluster total when both are visible.
        match parse_cpu(name) {
            Some(CpuName {
                kind: CpuKind::Core(_),
                ..
            }) if modes.cpu == CpuMode::ByCore => 2,
            _ => 0,
        }
    }

    fn arrange(&self, names: &mut Vec<String>) {
        use std::collections::HashMap;
        // Clusters are ordered by the minimum core id they contain; inside
        // a cluster the total precedes the cores.
        let mut min_core: HashMap<String, u32> = HashMap::new();
        for name in names.iter() {
            if let Some(CpuName {
                cluster,
                kind: CpuKind::Core(id),
            }) = parse_cpu(name)
            {
                let entry = min_core.entry(cluster.to_string()).or_insert(u32::MAX);
                *entry = (*entry).min(id);
            }
        }
        names.sort_by_key(|name| match parse_cpu(name) {
            Some(parsed) => {
                let cluster_rank = min_core.get(parsed.cluster).copied().unwrap_or(u32::MAX);
                match parsed.kind {
                    CpuKind::Total => (0u8, cluster_rank, 0u32),
                    CpuKind::Core(id) => (0u8, cluster_rank, id + 1),
                }
            }
            // cpu.total.count and anything unparsed sinks to the end.
            None => (1u8, u32::MAX, u32::MAX),
        });
    }
}

// ---- GPU ----

pub struct GpuPresenter;

impl Presenter for GpuPresenter {
    fn domain(&self) -> &'static str {
        "gpu"
    }

    fn display_name(&self, name: &str, modes: &Modes) -> Option<String> {
        if modes.gpu == GpuMode::Collapsed {
            return None;
        }
        let segments: Vec<&str> = name.split('.').collect();
        match segments.as_slice() {
            ["gpu", vendor, idx, "compute", "utilization", "percent"] => {
                Some(format!("{} GPU {idx}", capitalize(vendor)))
            }
            ["gpu", vendor, idx, "memory", "used", "bytes"]
                if modes.gpu == GpuMode::LoadAndVram =>
            {
                Some(format!("{} GPU {idx} VRAM", capitalize(vendor)))
            }
            _ => None,
        }
    }

    fn indent(&self, name: &str, _modes: &Modes) -> u16 {
        if name.ends_with(".memory.used.bytes") {
            2
        } else {
            0
        }
    }
}

// ---- Memory ----

pub struct MemoryPresenter;

impl Presenter for MemoryPresenter {
    fn domain(&self) -> &'static str {
        "memory"
    }

    fn display_name(&self, name: &str, modes: &Modes) -> Option<String> {
        match name {
            "memory.system.total.used.percent" => Some("RAM used".into()),
            _ if modes.memory == MemoryMode::Percent => None,
            "memory.system.total.used.bytes" => Some("RAM used bytes".into()),
            "memory.system.available.bytes" => Some("RAM available".into()),
            "memory.system.free.bytes" => Some("RAM free".into()),
            _ => None,
        }
    }

    fn indent(&self, name: &str, _modes: &Modes) -> u16 {
        if name.ends_with(".bytes") {
            2
        } else {
            0
        }
    }
}

// ---- Swap ----

pub struct SwapPresenter;

impl Presenter for SwapPresenter {
    fn domain(&self) -> &'static str {
        "swap"
    }

    fn display_name(&self, name: &str, modes: &Modes) -> Option<String> {
        if modes.swap == Toggle::Hide {
            return None;
        }
        (name == "swap.system.used.bytes").then(|| "Swap used".to_string())
    }
}

// ---- Disk ----

pub struct DiskPresenter;

impl Presenter for DiskPresenter {
    fn domain(&self) -> &'static str {
        "disk"
    }

    fn display_name(&self, name: &str, modes: &Modes) -> Option<String> {
        if modes.disk == Toggle::Hide {
            return None;
        }
        // Per-device series feed the data outputs; the chart shows totals.
        match name {
            "disk.total.read.bytes_per_sec" => Some("Disk read".into()),
            "disk.total.write.bytes_per_sec" => Some("Disk write".into()),
            _ => None,
        }
    }
}

// ---- Network ----

pub struct NetworkPresenter;

impl Presenter for NetworkPresenter {
    fn domain(&self) -> &'static str {
        "network"
    }

    fn display_name(&self, name: &str, modes: &Modes) -> Option<String> {
        if modes.network == Toggle::Hide {
            return None;
        }
        match name {
            "network.total.rx.bytes_per_sec" => Some("Network RX".into()),
            "network.total.tx.bytes_per_sec" => Some("Network TX".into()),
            _ => None,
        }
    }
}

// ---- Power ----

pub struct PowerPresenter;

impl Presenter for PowerPresenter {
    fn domain(&self) -> &'static str {
        "power"
    }

    fn display_name(&self, name: &str, modes: &Modes) -> Option<String> {
        if modes.power == PowerMode::Off {
            return None;
        }
        match name {
            "power.component.total.consumption.watts" => Some("Total power".into()),
            _ if modes.power == PowerMode::Combined => None,
            "power.component.cpu.consumption.watts" => Some("CPU power".into()),
            "power.component.gpu.consumption.watts" => Some("GPU power".into()),
            "power.component.ane.consumption.watts" => Some("ANE power".into()),
            _ => None,
        }
    }

    fn indent(&self, name: &str, _modes: &Modes) -> u16 {
        if name == "power.component.total.consumption.watts" {
            0
        } else {
            2
        }
    }
}

// ---- ANE ----

pub struct AnePresenter;

impl Presenter for AnePresenter {
    fn domain(&self) -> &'static str {
        "accel"
    }

    fn display_name(&self, name: &str, _modes: &Modes) -> Option<String> {
        (name == "accel.ane.utilization.percent").then(|| "ANE util".to_string())
    }
}

/// Presenter set consulted by the layout; one per domain.
pub struct PresenterRegistry {
    presenters: Vec<Box<dyn Presenter>>,
}

impl PresenterRegistry {
    pub fn new() -> Self {
        PresenterRegistry {
            presenters: vec![
                Box::new(CpuPresenter),
                Box::new(GpuPresenter),
                Box::new(AnePresenter),
                Box::new(MemoryPresenter),
                Box::new(SwapPresenter),
                Box::new(PowerPresenter),
                Box::new(DiskPresenter),
                Box::new(NetworkPresenter),
            ],
        }
    }

    pub fn for_domain(&self, domain: &str) -> Option<&dyn Presenter> {
        self.presenters
            .iter()
            .find(|p| p.domain() == domain)
            .map(|p| p.as_ref())
    }
}

impl Default for PresenterRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Build the visible rows for the series in `names` (store insertion
/// order). Domains keep their first-appearance order; inside a domain the
/// presenter may re-group.
pub fn rows(names: &[String], modes: &Modes, registry: &PresenterRegistry) -> Vec<Row> {
    let mut domain_order: Vec<&str> = Vec::new();
    for name in names {
        let domain = domain_of(name);
        if !domain_order.contains(&domain) {
            domain_order.push(domain);
        }
    }

    let mut out = Vec::new();
    for domain in domain_order {
        let mut domain_names: Vec<String> = names
            .iter()
            .filter(|n| domain_of(n) == domain)
            .cloned()
            .collect();
        let Some(presenter) = registry.for_domain(domain) else {
            continue;
        };
        presenter.arrange(&mut domain_names);
        for name in domain_names {
            if let Some(title) = presenter.display_name(&name, modes) {
                let indent = presenter.indent(&name, modes);
                out.push(Row {
                    name,
                    title,
                    indent,
                });
            }
        }
    }
    out
}

/// Whether the ruler shows the current value under this view mode.
pub fn shows_value(view: ViewMode) -> bool {
    matches!(view, ViewMode::One | ViewMode::All)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn default_modes() -> Modes {
        Modes {
            view: ViewMode::One,
            cpu: CpuMode::ByCore,
            gpu: GpuMode::LoadOnly,
            swap: Toggle::Show,
            network: Toggle::Show,
            disk: Toggle::Show,
            power: PowerMode::Combined,
            memory: MemoryMode::Percent,
        }
    }

    fn cpu_names() -> Vec<String> {
        // Deliberately shuffled: efficiency first, totals after cores.
        [
            "cpu.efficiency.1.core.2.utilization.percent",
            "cpu.efficiency.1.core.3.utilization.percent",
            "cpu.efficiency.1.total.utilization.percent",
            "cpu.performance.0.core.0.utilization.percent",
            "cpu.performance.0.core.1.utilization.percent",
            "cpu.performance.0.total.utilization.percent",
            "cpu.total.count",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect()
    }

    #[test]
    fn test_by_core_shows_totals_then_cores_by_min_core_id() {
        let registry = PresenterRegistry::new();
        let visible = rows(&cpu_names(), &default_modes(), &registry);
        let titles: Vec<&str> = visible.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(
            titles,
            vec![
                "Performance total",
                "Performance CPU 0",
                "Performance CPU 1",
                "Efficiency total",
                "Efficiency CPU 2",
                "Efficiency CPU 3",
            ]
        );
    }

    #[test]
    fn test_by_cluster_shows_totals_only() {
        let mut modes = default_modes();
        modes.cpu = CpuMode::ByCluster;
        let registry = PresenterRegistry::new();
        let visible = rows(&cpu_names(), &modes, &registry);
        let titles: Vec<&str> = visible.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, vec!["Performance total", "Efficiency total"]);
    }

    #[test]
    fn test_all_shows_cores_without_totals() {
        let mut modes = default_modes();
        modes.cpu = CpuMode::All;
        let registry = PresenterRegistry::new();
        let visible = rows(&cpu_names(), &modes, &registry);
        assert!(visible.iter().all(|r| !r.title.ends_with("total")));
        assert_eq!(visible.len(), 4);
        assert_eq!(visible[0].indent, 0);
    }

    #[test]
    fn test_core_rows_indent_under_cluster_totals() {
        let registry = PresenterRegistry::new();
        let visible = rows(&cpu_names(), &default_modes(), &registry);
        assert_eq!(visible[0].indent, 0);
        assert_eq!(visible[1].indent, 2);
    }

    #[test]
    fn test_mode_cycle_round_trip_restores_visible_set() {
        let registry = PresenterRegistry::new();
        let mut modes = default_modes();
        modes.cpu = CpuMode::All;
        let before = rows(&cpu_names(), &modes, &registry);
        modes.cpu = modes.cpu.next().next().next();
        let after = rows(&cpu_names(), &modes, &registry);
        assert_eq!(before, after);
    }

    #[test]
    fn test_count_series_hidden() {
        let registry = PresenterRegistry::new();
        let names = vec!["cpu.total.count".to_string(), "gpu.total.count".to_string()];
        assert!(rows(&names, &default_modes(), &registry).is_empty());
    }

    #[test]
    fn test_gpu_modes() {
        let registry = PresenterRegistry::new();
        let names: Vec<String> = vec![
            "gpu.apple.0.compute.utilization.percent".into(),
            "gpu.apple.0.memory.used.bytes".into(),
            "gpu.apple.0.memory.total.bytes".into(),
        ];
        let mut modes = default_modes();

        modes.gpu = GpuMode::Collapsed;
        assert!(rows(&names, &modes, &registry).is_empty());

        modes.gpu = GpuMode::LoadOnly;
        let visible = rows(&names, &modes, &registry);
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].title, "Apple GPU 0");

        modes.gpu = GpuMode::LoadAndVram;
        let visible = rows(&names, &modes, &registry);
        assert_eq!(visible.len(), 2);
        assert_eq!(visible[1].title, "Apple GPU 0 VRAM");
        assert_eq!(visible[1].indent, 2);
    }

    #[test]
    fn test_power_modes() {
        let registry = PresenterRegistry::new();
        let names: Vec<String> = vec![
            "power.component.total.consumption.watts".into(),
            "power.component.cpu.consumption.watts".into(),
            "power.component.gpu.consumption.watts".into(),
            "power.component.ane.consumption.watts".into(),
        ];
        let mut modes = default_modes();

        assert_eq!(rows(&names, &modes, &registry).len(), 1);

        modes.power = PowerMode::All;
        assert_eq!(rows(&names, &modes, &registry).len(), 4);

        modes.power = PowerMode::Off;
        assert!(rows(&names, &modes, &registry).is_empty());
    }

    #[test]
    fn test_memory_modes() {
        let registry = PresenterRegistry::new();
        let names: Vec<String> = vec![
            "memory.system.total.used.percent".into(),
            "memory.system.total.used.bytes".into(),
            "memory.system.available.bytes".into(),
        ];
        let mut modes = default_modes();
        assert_eq!(rows(&names, &modes, &registry).len(), 1);

        modes.memory = MemoryMode::All;
        assert_eq!(rows(&names, &modes, &registry).len(), 3);
    }

    #[test]
    fn test_format_by_unit() {
        assert_eq!(
            format_value("cpu.performance.0.total.utilization.percent", 65.0),
            "65.0%"
        );
        assert_eq!(
            format_value("power.component.total.consumption.watts", 3.75),
            "3.8W"
        );
        assert_eq!(
            format_value("disk.total.read.bytes_per_sec", 1500.0),
            "1.5KB/s"
        );
        assert_eq!(format_value("swap.system.used.bytes", 512.0), "512.0B");
        assert_eq!(format_value("cpu.total.count", 8.0), "8");
    }

    #[test]
    fn test_scale_policy() {
        assert_eq!(scale_for("cpu.cpu.0.core.0.utilization.percent", 73.0), 100.0);
        assert_eq!(scale_for("disk.total.read.bytes_per_sec", 7_000.0), 10_000.0);
        assert_eq!(scale_for("swap.system.used.bytes", 0.0), 1.0);
    }
}
