//! ASCII rendering of acre and tile grids, for terminals and debug dumps.

use std::fmt::Write;

use crate::acre::Acre;
use crate::terrain::Terrain;
use crate::tile::Tile;
use crate::tilemap::Tilemap;

/// ASCII rendering modes for the tile grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AsciiMode {
    /// Cliffs, slopes, rivers and beaches over elevation digits.
    Features,
    /// Elevation digits only.
    Height,
    /// Resolved cliff floors, `.` for everything else.
    Floors,
}

impl AsciiMode {
    pub fn name(&self) -> &'static str {
        match self {
            AsciiMode::Features => "Features",
            AsciiMode::Height => "Height",
            AsciiMode::Floors => "Floors",
        }
    }

    pub fn all() -> &'static [AsciiMode] {
        &[AsciiMode::Features, AsciiMode::Height, AsciiMode::Floors]
    }
}

/// Digit for an elevation, `-` for the beach level below zero.
pub fn height_char(elevation: i32) -> char {
    match elevation {
        e if e < 0 => '-',
        e => char::from_digit(e as u32 % 36, 36).unwrap_or('?'),
    }
}

/// Character for one tile in [`AsciiMode::Features`].
pub fn feature_char(tile: &Tile) -> char {
    if tile.waterfall {
        return 'W';
    }
    if tile.river {
        return '~';
    }
    if tile.river_edge {
        return ',';
    }
    if tile.slope {
        return if tile.slope_edge1 || tile.slope_edge2 { '|' } else { '/' };
    }
    if tile.cliff {
        return match (tile.merge_cliff, tile.beach_cliff) {
            (true, _) => '+',
            (false, true) => 'b',
            (false, false) => '#',
        };
    }
    if tile.beach {
        return '.';
    }
    height_char(tile.elevation)
}

/// Acre grid as elevation digits followed by cliff flags, one acre per cell.
///
/// Each cell reads `<elevation><W><S><E>`, with `-` for a missing cliff.
pub fn render_acres(acres: &Tilemap<Acre>) -> String {
    let mut out = String::new();
    for y in 0..acres.height {
        for x in 0..acres.width {
            let a = acres.get(x, y);
            let _ = write!(
                out,
                "{}{}{}{}{} ",
                height_char(a.elevation),
                if a.has_west_cliff { 'W' } else { '-' },
                if a.has_south_cliff { 'S' } else { '-' },
                if a.has_east_cliff { 'E' } else { '-' },
                if a.has_river() { '~' } else { ' ' }
            );
        }
        out.truncate(out.trim_end().len());
        out.push('\n');
    }
    out
}

/// Tile grid as text, one character per tile.
pub fn render_tiles(terrain: &Terrain, mode: AsciiMode) -> String {
    let mut out = String::with_capacity((terrain.width() + 1) * terrain.height());
    for y in 0..terrain.height() {
        for x in 0..terrain.width() {
            let tile = terrain.tiles.get(x, y);
            let c = match mode {
                AsciiMode::Features => feature_char(tile),
                AsciiMode::Height => height_char(tile.elevation),
                AsciiMode::Floors if tile.cliff && tile.floor_resolved => height_char(tile.floor),
                AsciiMode::Floors => '.',
            };
            out.push(c);
        }
        out.push('\n');
    }
    out
}

/// Legend for [`AsciiMode::Features`].
pub fn feature_legend() -> String {
    let mut legend = String::new();
    legend.push_str("LEGEND:\n");
    legend.push_str("  # = Cliff        b = Beach cliff   + = Merged cliff\n");
    legend.push_str("  / = Slope        | = Slope wall    . = Beach\n");
    legend.push_str("  ~ = River        , = River edge    W = Waterfall\n");
    legend.push_str("  0-9 = Flat ground at that elevation\n");
    legend
}
