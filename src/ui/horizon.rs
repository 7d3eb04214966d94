// Horizon cells: a value row is folded onto one character line by mapping
// each value to one of 24 banded cells (3 colors x 8 eighth-block glyphs).

use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::Color;
use ratatui::widgets::Widget;

/// Intensity steps per color.
pub const BANDS_PER_COLOR: usize = 8;

const BLOCKS: [char; BANDS_PER_COLOR] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

#[derive(Debug, Clone, Copy)]
pub struct BandCell {
    pub ch: char,
    pub fg: Color,
    pub bg: Color,
}

/// Ordered cell table for one metric domain. Each color folds the previous
/// one underneath, so a value climbing past a band boundary keeps its
/// history readable.
pub struct ColorBand {
    cells: Vec<BandCell>,
}

impl ColorBand {
    pub fn new(colors: [u8; 3]) -> Self {
        let mut cells = Vec::with_capacity(colors.len() * BANDS_PER_COLOR);
        let mut underneath = Color::Reset;
        for color in colors {
            let fg = Color::Indexed(color);
            for ch in BLOCKS {
                cells.push(BandCell {
                    ch,
                    fg,
                    bg: underneath,
                });
            }
            underneath = fg;
        }
        // Idle charts render blank rather than a sliver line.
        cells[0].ch = ' ';
        ColorBand { cells }
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn cell(&self, value: f64, scale_max: f64) -> BandCell {
        self.cells[cell_index(value, scale_max, self.cells.len())]
    }
}

/// `clamp(floor(len * value / scale_max), 0, len - 1)`.
pub fn cell_index(value: f64, scale_max: f64, len: usize) -> usize {
    if len == 0 {
        return 0;
    }
    if !value.is_finite() || !scale_max.is_finite() || scale_max <= 0.0 || value <= 0.0 {
        return 0;
    }
    let idx = (len as f64 * value / scale_max).floor() as usize;
    idx.min(len - 1)
}

/// 256-color ramps per domain, dark to bright.
pub fn palette_for_domain(domain: &str) -> [u8; 3] {
    match domain {
        "cpu" => [22, 34, 46],       // greens
        "gpu" => [52, 124, 196],     // reds
        "accel" => [53, 127, 201],   // magentas
        "memory" => [17, 19, 21],    // blues
        "swap" => [94, 130, 166],    // browns
        "power" => [58, 142, 214],   // ambers
        "disk" => [238, 244, 250],   // grays
        "network" => [23, 37, 51],   // cyans
        _ => [238, 244, 250],
    }
}

/// One chart line. `values` holds exactly one value per column.
pub struct HorizonRow<'a> {
    pub values: &'a [f64],
    pub scale_max: f64,
    pub band: &'a ColorBand,
}

impl Widget for HorizonRow<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.width == 0 || area.height == 0 {
            return;
        }
        for (col, value) in self.values.iter().take(area.width as usize).enumerate() {
            let cell = self.band.cell(*value, self.scale_max);
            let target = &mut buf[(area.x + col as u16, area.y)];
            target.set_char(cell.ch);
            target.set_fg(cell.fg);
            target.set_bg(cell.bg);
        }
    }
}
