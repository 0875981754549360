//! CLI utility for headless navigation mesh tile editing

use anyhow::{anyhow, Context, Result};
use clap::{ArgMatches, Args as ClapArgs, CommandFactory, FromArgMatches, Parser, Subcommand};
use glam::Vec3;
use std::path::{Path, PathBuf};

use navmesh_editor::tools::TileTool;
use navmesh_editor::{
    BuildSettings, Editor, InputGeometry, NavMeshSession, TileGrid, TileMesh, TriangleTileBuilder,
};

/// A CLI utility for building and editing tiled navigation meshes
#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Args {
    #[clap(subcommand)]
    command: Commands,
}

/// Input mesh and build settings shared by all commands
#[derive(ClapArgs, Debug)]
struct SceneArgs {
    /// Input mesh file (OBJ format)
    #[clap(long, value_parser)]
    input: PathBuf,

    /// Build settings file (JSON)
    #[clap(long, value_parser)]
    config: Option<PathBuf>,

    /// Tile size in cells, 0 builds a single untiled mesh
    #[clap(long)]
    tile_size: Option<i32>,

    /// Cell size (horizontal resolution)
    #[clap(long)]
    cell_size: Option<f32>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Build every tile of the input mesh
    BuildAll {
        #[clap(flatten)]
        scene: SceneArgs,

        /// Write the effective build settings to this file
        #[clap(long, value_parser)]
        save_config: Option<PathBuf>,
    },

    /// Build all tiles, then apply scripted tile edits
    Edit {
        #[clap(flatten)]
        scene: SceneArgs,

        /// Rebuild the tile under this position (x,y,z); may be repeated
        #[clap(long, value_parser = parse_vector)]
        build: Vec<Vec3>,

        /// Remove the tile under this position (x,y,z); may be repeated
        #[clap(long, value_parser = parse_vector)]
        remove: Vec<Vec3>,
    },

    /// Print the tile containing a position
    Locate {
        #[clap(flatten)]
        scene: SceneArgs,

        /// Position (x,y,z)
        #[clap(long, value_parser = parse_vector)]
        point: Vec3,
    },
}

/// Parse a comma-separated vector
fn parse_vector(s: &str) -> Result<Vec3, String> {
    let parts: Vec<&str> = s.split(',').collect();

    if parts.len() != 3 {
        return Err(format!(
            "Vector must have 3 components, got {}",
            parts.len()
        ));
    }

    let x = parts[0].trim().parse::<f32>().map_err(|e| e.to_string())?;
    let y = parts[1].trim().parse::<f32>().map_err(|e| e.to_string())?;
    let z = parts[2].trim().parse::<f32>().map_err(|e| e.to_string())?;

    Ok(Vec3::new(x, y, z))
}

/// Edit clicks in command-line order, `true` marks a removal
fn ordered_clicks(matches: &ArgMatches, build: &[Vec3], remove: &[Vec3]) -> Vec<(Vec3, bool)> {
    let build_at = matches.indices_of("build").into_iter().flatten();
    let remove_at = matches.indices_of("remove").into_iter().flatten();

    let mut clicks: Vec<(usize, Vec3, bool)> = build_at
        .zip(build.iter())
        .map(|(i, p)| (i, *p, false))
        .chain(remove_at.zip(remove.iter()).map(|(i, p)| (i, *p, true)))
        .collect();
    clicks.sort_by_key(|(i, _, _)| *i);
    clicks.into_iter().map(|(_, p, shift)| (p, shift)).collect()
}

fn main() -> Result<()> {
    env_logger::init();
    let matches = Args::command().get_matches();
    let args = Args::from_arg_matches(&matches).unwrap_or_else(|e| e.exit());

    match args.command {
        Commands::BuildAll { scene, save_config } => build_all(&scene, save_config.as_deref()),
        Commands::Edit {
            scene,
            build,
            remove,
        } => {
            let clicks = match matches.subcommand_matches("edit") {
                Some(edit_matches) => ordered_clicks(edit_matches, &build, &remove),
                None => Vec::new(),
            };
            edit(&scene, &clicks)
        }
        Commands::Locate { scene, point } => locate(&scene, point),
    }
}

fn load_settings(scene: &SceneArgs) -> Result<BuildSettings> {
    let mut settings = match &scene.config {
        Some(path) => BuildSettings::load_from_json(path)
            .with_context(|| format!("Failed to load build settings from {}", path.display()))?,
        None => BuildSettings::default(),
    };
    if let Some(tile_size) = scene.tile_size {
        settings.tile_size = tile_size;
    }
    if let Some(cell_size) = scene.cell_size {
        settings.cell_size = cell_size;
    }
    settings
        .validate()
        .map_err(|e| anyhow!("Invalid build settings: {}", e))?;
    Ok(settings)
}

fn load_scene(scene: &SceneArgs) -> Result<(BuildSettings, InputGeometry)> {
    let settings = load_settings(scene)?;

    println!("Loading mesh from {}...", scene.input.display());
    let geometry = InputGeometry::from_obj(&scene.input)
        .map_err(|e| anyhow!("Failed to load mesh: {}", e))?;
    let mesh = geometry.mesh();
    println!(
        "Loaded mesh with {} vertices and {} triangles",
        mesh.vert_count, mesh.tri_count
    );
    println!(
        "Mesh bounds: min={:?}, max={:?}",
        geometry.mesh_bounds_min(),
        geometry.mesh_bounds_max()
    );

    Ok((settings, geometry))
}

fn print_mesh_summary(session: &NavMeshSession<TileMesh>) {
    match session.nav_mesh() {
        Some(mesh) => println!(
            "Navigation mesh: {} tiles, {} triangles, {} kB",
            mesh.tile_count(),
            mesh.total_triangles(),
            mesh.memory_bytes().div_ceil(1024)
        ),
        None => println!("No navigation mesh"),
    }
}

/// Build every tile of the input mesh
fn build_all(scene: &SceneArgs, save_config: Option<&Path>) -> Result<()> {
    let (settings, geometry) = load_scene(scene)?;
    let grid = TileGrid::new(
        geometry.mesh_bounds_min(),
        geometry.mesh_bounds_max(),
        &settings,
    );
    if let Some(grid) = grid {
        println!("Tile grid: {}x{}", grid.width(), grid.height());
    } else {
        println!("Tile size is 0, building a single tile");
    }

    if let Some(path) = save_config {
        settings
            .save_to_json(path)
            .with_context(|| format!("Failed to save build settings to {}", path.display()))?;
        println!("Saved build settings to {}", path.display());
    }

    let mut session = NavMeshSession::with_geometry(settings, geometry);
    let mut tool = TileTool::new(TriangleTileBuilder::new());
    let report = tool
        .build_all(&mut session)
        .map_err(|e| anyhow!("Failed to build navigation mesh: {}", e))?;

    println!("{}", report);
    if !report.success {
        return Err(anyhow!("Navigation mesh build failed"));
    }
    print_mesh_summary(&session);
    Ok(())
}

/// Build all tiles, then replay clicks through the tile tool
fn edit(scene: &SceneArgs, clicks: &[(Vec3, bool)]) -> Result<()> {
    let (settings, geometry) = load_scene(scene)?;

    let mut editor: Editor<TileMesh> = Editor::new(settings);
    editor.load_geometry(geometry)?;
    editor.set_tool(Box::new(TileTool::new(TriangleTileBuilder::new())))?;

    let report = editor
        .with_tool(|tool: &mut TileTool<TriangleTileBuilder>, session| tool.build_all(session))?
        .ok_or_else(|| anyhow!("Tile tool is not active"))?;
    println!("{}", report);

    for &(point, shift) in clicks {
        // Cast straight down onto the point
        let origin = point + Vec3::Y * 100.0;
        editor.click(origin, point, shift)?;

        let outcome = editor
            .tool_as::<TileTool<TriangleTileBuilder>>()
            .and_then(|tool| tool.last_outcome())
            .cloned()
            .ok_or_else(|| anyhow!("No outcome recorded for edit at {}", point))?;
        let verb = if shift { "remove" } else { "build" };
        println!("{} at {}: {}", verb, point, outcome);
        if outcome.is_failure() {
            log::warn!("Edit at {} failed", point);
        }
    }

    print_mesh_summary(editor.session());
    Ok(())
}

/// Print the tile containing a position
fn locate(scene: &SceneArgs, point: Vec3) -> Result<()> {
    let (settings, geometry) = load_scene(scene)?;
    let grid = TileGrid::new(geometry.mesh_bounds_min(), geometry.mesh_bounds_max(), &settings)
        .ok_or_else(|| anyhow!("Tile size is 0, the navigation mesh is not tiled"))?;

    let coord = grid.coord_at(point);
    let bounds = grid.bounds(coord);
    println!("Tile: {}", coord);
    println!("Bounds: min={:?}, max={:?}", bounds.bmin, bounds.bmax);
    if !grid.contains(coord) {
        println!(
            "Warning: tile lies outside the {}x{} grid",
            grid.width(),
            grid.height()
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_vector() {
        assert_eq!(parse_vector("1,2.5,-3").unwrap(), Vec3::new(1.0, 2.5, -3.0));
        assert_eq!(parse_vector(" 1, 2, 3").unwrap(), Vec3::new(1.0, 2.0, 3.0));
        assert!(parse_vector("1,2").is_err());
        assert!(parse_vector("a,b,c").is_err());
    }

    #[test]
    fn test_cli_parses_repeated_edits() {
        let args = Args::try_parse_from([
            "navmesh-editor",
            "edit",
            "--input",
            "level.obj",
            "--tile-size",
            "16",
            "--build",
            "1,0,1",
            "--build",
            "5,0,5",
            "--remove",
            "9,0,9",
        ])
        .unwrap();

        match args.command {
            Commands::Edit {
                scene,
                build,
                remove,
            } => {
                assert_eq!(scene.tile_size, Some(16));
                assert!(scene.config.is_none());
                assert_eq!(build.len(), 2);
                assert_eq!(remove, vec![Vec3::new(9.0, 0.0, 9.0)]);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_edit_clicks_keep_argument_order() {
        let matches = Args::command()
            .try_get_matches_from([
                "navmesh-editor",
                "edit",
                "--input",
                "level.obj",
                "--remove",
                "9,0,9",
                "--build",
                "1,0,1",
                "--remove",
                "5,0,5",
            ])
            .unwrap();
        let args = Args::from_arg_matches(&matches).unwrap();
        let Commands::Edit { build, remove, .. } = args.command else {
            panic!("expected edit command");
        };

        let edit_matches = matches.subcommand_matches("edit").unwrap();
        let clicks = ordered_clicks(edit_matches, &build, &remove);
        assert_eq!(
            clicks,
            vec![
                (Vec3::new(9.0, 0.0, 9.0), true),
                (Vec3::new(1.0, 0.0, 1.0), false),
                (Vec3::new(5.0, 0.0, 5.0), true),
            ]
        );
    }

    #[test]
    fn test_settings_overrides_are_validated() {
        let scene = SceneArgs {
            input: PathBuf::from("level.obj"),
            config: None,
            tile_size: Some(8),
            cell_size: Some(0.5),
        };
        let settings = load_settings(&scene).unwrap();
        assert_eq!(settings.tile_size, 8);
        assert_eq!(settings.cell_size, 0.5);

        let bad = SceneArgs {
            cell_size: Some(-1.0),
            ..scene
        };
        assert!(load_settings(&bad).is_err());
    }
}
