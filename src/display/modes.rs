// Per-domain display modes. Every mode cycles with next(); the hotkey table
// in the input layer maps one character to one mode.

use clap::ValueEnum;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
#[value(rename_all = "snake_case")]
pub enum ViewMode {
    /// Titles only.
    Off,
    /// Titles plus the current value.
    One,
    /// Titles, current value, scale and window annotations.
    All,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
#[value(rename_all = "snake_case")]
pub enum CpuMode {
    /// Per-core rows without cluster totals.
    All,
    /// Cluster totals only.
    ByCluster,
    /// Cluster totals followed by their cores.
    ByCore,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
#[value(rename_all = "snake_case")]
pub enum GpuMode {
    Collapsed,
    LoadOnly,
    LoadAndVram,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
#[value(rename_all = "snake_case")]
pub enum Toggle {
    Show,
    Hide,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
#[value(rename_all = "snake_case")]
pub enum PowerMode {
    /// Total draw only.
    Combined,
    /// Total plus per-component rows.
    All,
    Off,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
#[value(rename_all = "snake_case")]
pub enum MemoryMode {
    /// Used percent only.
    Percent,
    /// Percent plus the byte breakdown.
    All,
}

impl ViewMode {
    pub fn next(self) -> Self {
        match self {
            ViewMode::Off => ViewMode::One,
            ViewMode::One => ViewMode::All,
            ViewMode::All => ViewMode::Off,
        }
    }
}

impl CpuMode {
    pub fn next(self) -> Self {
        match self {
            CpuMode::All => CpuMode::ByCluster,
            CpuMode::ByCluster => CpuMode::ByCore,
            CpuMode::ByCore => CpuMode::All,
        }
    }
}

impl GpuMode {
    pub fn next(self) -> Self {
        match self {
            GpuMode::Collapsed => GpuMode::LoadOnly,
            GpuMode::LoadOnly => GpuMode::LoadAndVram,
            GpuMode::LoadAndVram => GpuMode::Collapsed,
        }
    }
}

impl Toggle {
    pub fn next(self) -> Self {
        match self {
            Toggle::Show => Toggle::Hide,
            Toggle::Hide => Toggle::Show,
        }
    }
}

impl PowerMode {
    pub fn next(self) -> Self {
        match self {
            PowerMode::Combined => PowerMode::All,
            PowerMode::All => PowerMode::Off,
            PowerMode::Off => PowerMode::Combined,
        }
    }
}

impl MemoryMode {
    pub fn next(self) -> Self {
        match self {
            MemoryMode::Percent => MemoryMode::All,
            MemoryMode::All => MemoryMode::Percent,
        }
    }
}

/// The full mode aggregate the presenters consult.
#[derive(Debug, Clone, Copy)]
pub struct Modes {
    pub view: ViewMode,
    pub cpu: CpuMode,
    pub gpu: GpuMode,
    pub swap: Toggle,
    pub network: Toggle,
    pub disk: Toggle,
    pub power: PowerMode,
    pub memory: MemoryMode,
}

impl Modes {
    /// Cycle the mode registered under a hotkey. Returns false for an
    /// unbound key.
    pub fn toggle(&mut self, key: char) -> bool {
        match key {
            'v' => self.view = self.view.next(),
            'c' => self.cpu = self.cpu.next(),
            'g' => self.gpu = self.gpu.next(),
            'd' => self.disk = self.disk.next(),
            'n' => self.network = self.network.next(),
            's' => self.swap = self.swap.next(),
            'p' => self.power = self.power.next(),
            'm' => self.memory = self.memory.next(),
            _ => return false,
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cycles_wrap_around() {
        assert_eq!(CpuMode::ByCore.next(), CpuMode::All);
        assert_eq!(ViewMode::All.next(), ViewMode::Off);
        assert_eq!(GpuMode::LoadAndVram.next(), GpuMode::Collapsed);
        assert_eq!(PowerMode::Off.next(), PowerMode::Combined);
        assert_eq!(MemoryMode::All.next(), MemoryMode::Percent);
    }

    #[test]
    fn test_toggle_twice_restores_visibility_mode() {
        let start = Toggle::Show;
        assert_eq!(start.next().next(), start);
    }

    #[test]
    fn test_hotkey_table() {
        let mut modes = Modes {
            view: ViewMode::One,
            cpu: CpuMode::All,
            gpu: GpuMode::LoadOnly,
            swap: Toggle::Show,
            network: Toggle::Show,
            disk: Toggle::Show,
            power: PowerMode::Combined,
            memory: MemoryMode::Percent,
        };
        assert!(modes.toggle('c'));
        assert_eq!(modes.cpu, CpuMode::ByCluster);
        assert!(modes.toggle('s'));
        assert_eq!(modes.swap, Toggle::Hide);
        assert!(!modes.toggle('x'));
    }
}
