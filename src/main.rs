use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use cliff_terrain::ascii::{feature_legend, render_acres, render_tiles, AsciiMode};
use cliff_terrain::export::export_png;
use cliff_terrain::scatter::beach_height_samples;
use cliff_terrain::{CliffCatalog, Result, TerrainConfig, TerrainGenerator};

#[derive(Parser, Debug)]
#[command(name = "cliff_terrain")]
#[command(about = "Generate layered island terrain with cliffs, slopes and rivers")]
struct Args {
    /// Random seed (uses random seed if not specified)
    #[arg(short, long)]
    seed: Option<u64>,

    /// Acre grid width (overrides the config file)
    #[arg(long)]
    acres_x: Option<usize>,

    /// Acre grid height (overrides the config file)
    #[arg(long)]
    acres_y: Option<usize>,

    /// Generation config as JSON
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Cliff catalog as JSON (uses the built-in catalog if not specified)
    #[arg(long)]
    catalog: Option<PathBuf>,

    /// Print the acre grid and tile map as ASCII
    #[arg(long)]
    ascii: bool,

    /// Export the tile map to PNG (specify output path)
    #[arg(long)]
    png: Option<PathBuf>,

    /// Pixels per tile in the PNG
    #[arg(long, default_value = "4")]
    png_scale: u32,

    /// Print progress after every finished cliff walk
    #[arg(long)]
    incremental: bool,
}

fn main() -> ExitCode {
    env_logger::init();
    let args = Args::parse();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Generation failed: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<()> {
    let mut config = match &args.config {
        Some(path) => TerrainConfig::load(path)?,
        None => TerrainConfig::default(),
    };
    if let Some(seed) = args.seed {
        config.seed = seed;
    }
    if let Some(x) = args.acres_x {
        config.acres_x = x;
    }
    if let Some(y) = args.acres_y {
        config.acres_y = y;
    }
    let catalog = match &args.catalog {
        Some(path) => CliffCatalog::load_from(path)?,
        None => CliffCatalog::defaults()?,
    };

    let mut generator = TerrainGenerator::new(config, catalog)?;
    println!("Generating terrain with seed: {}", generator.seed());
    println!(
        "Map size: {}x{} acres, {} cliff walks queued",
        generator.config().acres_x,
        generator.config().acres_y,
        generator.pending_walks()
    );

    if args.incremental {
        let mut finished = 0;
        while generator.step()? {
            if generator.walks().len() > finished {
                finished = generator.walks().len();
                if let Some(walk) = generator.walks().last() {
                    println!(
                        "  Walk {} done: island {} at elevation {} ({} tiles, {} reverts)",
                        finished, walk.island, walk.elevation, walk.tiles, walk.reverts
                    );
                }
            }
        }
    } else {
        generator.run()?;
    }

    let terrain = generator.terrain();
    println!(
        "Done: {} islands, {} cliff tiles, {} slopes, {} rivers, {} waterfalls, {} decorations",
        terrain.islands.len(),
        terrain.cliff_count(),
        terrain.slopes.len(),
        terrain.rivers.len(),
        terrain.waterfalls.len(),
        terrain.decorations.len()
    );
    let beaches = beach_height_samples(terrain, generator.config());
    println!(
        "Beach collision: {} regions, {} samples",
        beaches.len(),
        beaches.values().map(Vec::len).sum::<usize>()
    );

    if args.ascii {
        println!();
        print!("{}", render_acres(&terrain.acres));
        println!();
        print!("{}", render_tiles(terrain, AsciiMode::Features));
        print!("{}", feature_legend());
    }
    if let Some(path) = &args.png {
        export_png(terrain, path, args.png_scale)?;
        println!("Exported tile map to {}", path.display());
    }
    Ok(())
}
