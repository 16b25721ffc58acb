//! Debug script to watch cliff walks step by step as ASCII

use std::fs::File;
use std::io::Write;

use cliff_terrain::ascii::{render_acres, render_tiles, AsciiMode};
use cliff_terrain::{CliffCatalog, TerrainConfig, TerrainGenerator};

fn main() {
    env_logger::init();

    let seed = std::env::args().nth(1).and_then(|s| s.parse().ok()).unwrap_or(12345u64);
    let every: usize = std::env::args().nth(2).and_then(|s| s.parse().ok()).unwrap_or(25);

    let config = TerrainConfig {
        seed,
        acres_x: 4,
        acres_y: 4,
        ..TerrainConfig::default()
    };
    let catalog = CliffCatalog::defaults().unwrap();
    let mut generator = TerrainGenerator::new(config, catalog).unwrap();

    let mut file = File::create("walk_debug.txt").unwrap();
    writeln!(file, "=== CLIFF WALK DEBUG seed={} ===", seed).unwrap();
    writeln!(file, "{}", render_acres(&generator.terrain().acres)).unwrap();

    let mut step = 0;
    loop {
        let more = match generator.step() {
            Ok(more) => more,
            Err(e) => {
                writeln!(file, "FAILED after {} steps: {}", step, e).unwrap();
                println!("Walk failed after {} steps: {}", step, e);
                break;
            }
        };
        step += 1;

        if let Some(walker) = generator.current_walker() {
            if step % every == 0 {
                writeln!(
                    file,
                    "--- step {} island {} elevation {} cursor {:?}",
                    step,
                    walker.island(),
                    walker.elevation(),
                    walker.cursor().map(|c| (c.x, c.y, c.forward))
                )
                .unwrap();
                write!(file, "{}", render_tiles(generator.terrain(), AsciiMode::Features)).unwrap();
            }
        }
        if !more {
            break;
        }
    }

    for walk in generator.walks() {
        writeln!(file, "{:?}", walk).unwrap();
    }
    writeln!(file, "--- final after {} steps", step).unwrap();
    write!(file, "{}", render_tiles(generator.terrain(), AsciiMode::Features)).unwrap();
    write!(file, "{}", render_tiles(generator.terrain(), AsciiMode::Floors)).unwrap();
    println!("Wrote walk_debug.txt ({} steps, {} walks)", step, generator.walks().len());
}
