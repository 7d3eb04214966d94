// Display state shared between the input handler and the renderer: the
// mode aggregate plus the scroll viewport, behind one mutex.

pub mod format;
pub mod modes;
pub mod presenter;
pub mod viewport;

use modes::Modes;
use viewport::Viewport;

use crate::config::Config;

#[derive(Debug, Clone, Copy)]
pub struct DisplayState {
    pub modes: Modes,
    pub viewport: Viewport,
    /// Set by the input handler, cleared by the renderer after a frame.
    pub dirty: bool,
}

impl DisplayState {
    pub fn from_config(config: &Config) -> Self {
        DisplayState {
            modes: Modes {
                view: config.view,
                cpu: config.cpu,
                gpu: config.gpu,
                swap: config.swap,
                network: config.network,
                disk: config.disk,
                power: config.power,
                memory: config.memory,
            },
            viewport: Viewport::default(),
            dirty: true,
        }
    }
}
