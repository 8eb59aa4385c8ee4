use anyhow::Context;
use clap::{Parser, Subcommand};
use glam::{Vec2, Vec3};
use heightscape_common::{Camera, Extent};
use heightscape_input::{Action, Navigator};
use heightscape_render::{
    DemoScene, DirectionalLight, DrawList, Frame, FrameRenderer, SepiaVignette, TraceRenderer,
};
use heightscape_terrain::{HeightfieldMesh, TerrainConfig};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "heightscape-cli", about = "Headless tools for the heightscape demo")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print version and crate info
    Info,
    /// Build a terrain mesh from a heightmap and print its statistics
    Terrain {
        /// Heightmap image; the red channel is the height
        heightmap: PathBuf,
        #[arg(long, default_value_t = 200.0)]
        width: f32,
        #[arg(long, default_value_t = 200.0)]
        depth: f32,
        #[arg(long, default_value_t = 100)]
        x_slices: u32,
        #[arg(long, default_value_t = 100)]
        z_slices: u32,
        #[arg(long, default_value_t = 15.0)]
        max_height: f32,
        /// Print the statistics as JSON
        #[arg(long)]
        json: bool,
    },
    /// Trace the passes and draws of the demo frame
    FramePlan {
        /// Animation and navigation steps to run before tracing
        #[arg(short, long, default_value_t = 0)]
        steps: u32,
        /// Movement keys held during the steps (any of wasdeq)
        #[arg(long, default_value = "")]
        keys: String,
        /// Viewport size used for the projection
        #[arg(long, default_value_t = 1280)]
        width: u32,
        #[arg(long, default_value_t = 720)]
        height: u32,
    },
    /// Run one colour through the sepia/vignette post-process
    PostProbe {
        r: f32,
        g: f32,
        b: f32,
        /// Screen texture coordinate, 0..1 from the top-left
        #[arg(long, default_value_t = 0.5)]
        u: f32,
        #[arg(long, default_value_t = 0.5)]
        v: f32,
    },
}

fn info() -> String {
    [
        format!("heightscape-cli v{}", env!("CARGO_PKG_VERSION")),
        format!("terrain: {}", heightscape_terrain::crate_info()),
        format!("assets: {}", heightscape_assets::crate_info()),
        format!("input: {}", heightscape_input::crate_info()),
        format!("render: {}", heightscape_render::crate_info()),
        format!("render-wgpu: {}", heightscape_render_wgpu::crate_info()),
    ]
    .join("\n")
}

fn terrain_report(mesh: &HeightfieldMesh, json: bool) -> anyhow::Result<String> {
    let stats = mesh.stats();
    if json {
        return serde_json::to_string_pretty(&stats).context("serialize mesh stats");
    }
    Ok(format!(
        "vertices={} indices={} triangles={}\nheight min={:.3} max={:.3}\nsource={:?}",
        stats.vertex_count,
        stats.index_count,
        stats.triangle_count,
        stats.min_height,
        stats.max_height,
        stats.source
    ))
}

fn frame_plan(steps: u32, keys: &str, viewport: Extent) -> anyhow::Result<String> {
    let mut scene = DemoScene::new();
    let mut navigator = Navigator::new();
    let mut camera = Camera::new();
    camera.set_location(Vec3::new(0.0, 30.0, 0.0));
    camera.set_ratio(viewport.at_least_one().aspect_ratio());

    for key in keys.chars() {
        match Action::from_key(key, true) {
            Action::Noop => anyhow::bail!("'{key}' is not a movement key"),
            action => navigator.apply(action),
        }
    }
    // The first update applies the initial pitch, as on the first displayed frame.
    navigator.update(&mut camera);
    for _ in 0..steps {
        scene.update();
        navigator.update(&mut camera);
    }

    let mut draws = DrawList::new();
    scene.collect(&mut draws);
    let light = DirectionalLight::default();
    let frame = Frame {
        view: camera.view_matrix(),
        projection: camera.projection_matrix(),
        light: &light,
        items: &draws,
    };
    let trace = TraceRenderer::new().render_frame(&frame)?;

    let eye = camera.location();
    Ok(format!(
        "camera=({:.2}, {:.2}, {:.2}) cube_angle={:.2}\n{trace}",
        eye.x,
        eye.y,
        eye.z,
        scene.angle()
    ))
}

fn post_probe(rgb: Vec3, texcoord: Vec2) -> String {
    let sepia = SepiaVignette::sepia(rgb);
    let vignette = SepiaVignette::vignette(texcoord);
    let out = SepiaVignette::apply(rgb.extend(1.0), texcoord);
    format!(
        "sepia=({:.4}, {:.4}, {:.4}) vignette={:.4}\nout=({:.4}, {:.4}, {:.4}, {:.4})",
        sepia.x, sepia.y, sepia.z, vignette, out.x, out.y, out.z, out.w
    )
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match cli.command {
        Commands::Info => println!("{}", info()),
        Commands::Terrain {
            heightmap,
            width,
            depth,
            x_slices,
            z_slices,
            max_height,
            json,
        } => {
            let config = TerrainConfig {
                world_width: width,
                world_depth: depth,
                x_slices,
                z_slices,
                max_height,
            };
            let mesh = HeightfieldMesh::load(&heightmap, &config)?;
            tracing::debug!(path = %heightmap.display(), "terrain built");
            println!("{}", terrain_report(&mesh, json)?);
        }
        Commands::FramePlan {
            steps,
            keys,
            width,
            height,
        } => {
            print!("{}", frame_plan(steps, &keys, Extent::new(width, height))?);
        }
        Commands::PostProbe { r, g, b, u, v } => {
            println!("{}", post_probe(Vec3::new(r, g, b), Vec2::new(u, v)));
        }
    }

    Ok(())
}
