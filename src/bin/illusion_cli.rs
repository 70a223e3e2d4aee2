#[cfg(target_arch = "wasm32")]
fn main() {}

#[cfg(not(target_arch = "wasm32"))]
fn main() -> anyhow::Result<()> {
    native::run()
}

#[cfg(not(target_arch = "wasm32"))]
mod native {
    use std::fs;
    use std::path::{Path, PathBuf};

    use anyhow::{Context, Result, bail};
    use clap::{ArgAction, Args, Parser, Subcommand};
    use dual_text_engine::config::IllusionConfig;
    use dual_text_engine::export::{
        GLB_MAGIC, GlbDocument, GlbOptions, facets_to_mesh, parse_ascii_stl, parse_binary_stl,
    };
    use dual_text_engine::font::{FontChoice, load_font};
    use dual_text_engine::geom::TriangleMesh;
    use dual_text_engine::pipeline::{ExportFormat, export_mesh, generate_illusion};
    use tracing::info;
    use tracing_subscriber::EnvFilter;

    #[derive(Parser)]
    #[command(name = "illusion_cli")]
    #[command(about = "Build dual-read text solids that show one word from the front and another from the side")]
    #[command(version)]
    struct Cli {
        /// More log output (-v debug, -vv trace). `RUST_LOG` also applies.
        #[arg(short, long, action = ArgAction::Count, global = true)]
        verbose: u8,

        #[command(subcommand)]
        command: Command,
    }

    #[derive(Subcommand)]
    enum Command {
        /// Generate a solid and write it as GLB or STL.
        Generate(GenerateArgs),
        /// Print a summary of a GLB or STL file.
        Inspect {
            #[arg(name = "FILE")]
            file: PathBuf,
        },
    }

    #[derive(Args)]
    struct GenerateArgs {
        /// Word read from the front.
        #[arg(name = "WORD_A")]
        word_a: Option<String>,
        /// Word read from the side; same length as WORD_A.
        #[arg(name = "WORD_B")]
        word_b: Option<String>,
        /// JSON request file; flags given here override its values.
        #[arg(long)]
        config: Option<PathBuf>,
        /// `builtin` / `Sans` for the block font, or a TTF/OTF path.
        #[arg(long)]
        font: Option<String>,
        #[arg(long)]
        glyph_size: Option<f64>,
        #[arg(long)]
        depth: Option<f64>,
        /// Shift of the side word along +X.
        #[arg(long)]
        padding: Option<f64>,
        /// Edge rounding in [0, 1].
        #[arg(long)]
        fillet: Option<f64>,
        /// Keep one mesh group per word instead of a single group.
        #[arg(long)]
        separate_groups: bool,
        /// glb, stl or stl-binary.
        #[arg(long)]
        format: Option<ExportFormat>,
        /// Mark the GLB material as unlit.
        #[arg(long)]
        unlit: bool,
        /// Output file; defaults to `<worda>_<wordb>.<ext>`.
        #[arg(short, long)]
        out: Option<PathBuf>,
        #[arg(long)]
        overwrite: bool,
    }

    pub fn run() -> Result<()> {
        let cli = Cli::parse();
        init_tracing(cli.verbose)?;

        match cli.command {
            Command::Generate(args) => cmd_generate(args),
            Command::Inspect { file } => cmd_inspect(&file),
        }
    }

    fn init_tracing(verbose: u8) -> Result<()> {
        let level = match verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        };
        tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env().add_directive(level.parse()?))
            .with_writer(std::io::stderr)
            .with_target(false)
            .init();
        Ok(())
    }

    fn resolve_config(args: &GenerateArgs) -> Result<IllusionConfig> {
        let mut config = match args.config.as_deref() {
            Some(path) => IllusionConfig::from_path(path)?,
            None => IllusionConfig::default(),
        };
        if let Some(word) = &args.word_a {
            config.word_a.clone_from(word);
        }
        if let Some(word) = &args.word_b {
            config.word_b.clone_from(word);
        }
        if let Some(font) = &args.font {
            config.font = FontChoice::from_name(font);
        }
        if let Some(value) = args.glyph_size {
            config.glyph_size = value;
        }
        if let Some(value) = args.depth {
            config.depth = value;
        }
        if let Some(value) = args.padding {
            config.padding = value;
        }
        if let Some(value) = args.fillet {
            config.fillet = value;
        }
        if let Some(format) = args.format {
            config.format = format;
        }
        if args.separate_groups {
            config.merge_groups = false;
        }
        if args.unlit {
            config.unlit = true;
        }
        Ok(config)
    }

    fn cmd_generate(args: GenerateArgs) -> Result<()> {
        let config = resolve_config(&args)?;
        let request = config.to_request().context("invalid request")?;
        let font = load_font(&config.font).with_context(|| format!("load font {}", config.font))?;

        let solid = generate_illusion(&request, font.as_ref())?;
        let name = format!("{}_{}", request.word_a, request.word_b);
        let glb = GlbOptions {
            unlit: config.unlit,
            ..GlbOptions::default()
        };
        let bytes = export_mesh(&solid.mesh, config.format, &name, &glb)
            .with_context(|| format!("encode {}", config.format))?;

        let path = args
            .out
            .unwrap_or_else(|| PathBuf::from(format!("{}.{}", name.to_lowercase(), config.format.extension())));
        write_output(&path, &bytes, args.overwrite)?;
        info!("wrote {} ({} bytes)", path.display(), bytes.len());

        println!("{}", serde_json::to_string_pretty(&solid.report)?);
        Ok(())
    }

    fn write_output(path: &Path, bytes: &[u8], overwrite: bool) -> Result<()> {
        if path.exists() && !overwrite {
            bail!("refusing to overwrite existing file {} (use --overwrite)", path.display());
        }
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).with_context(|| format!("create dir {}", parent.display()))?;
        }
        fs::write(path, bytes).with_context(|| format!("write {}", path.display()))
    }

    fn cmd_inspect(path: &Path) -> Result<()> {
        let bytes = fs::read(path).with_context(|| format!("read {}", path.display()))?;

        if bytes.get(..4) == Some(&GLB_MAGIC.to_le_bytes()[..]) {
            let doc = GlbDocument::from_bytes(&bytes).with_context(|| format!("parse GLB {}", path.display()))?;
            println!(
                "{}: GLB v{}, {} bytes, {} primitives, {} vertices, {} triangles",
                path.display(),
                doc.version,
                doc.total_length,
                doc.primitive_count(),
                doc.vertex_count(),
                doc.triangle_count()
            );
            return Ok(());
        }

        let ascii = std::str::from_utf8(&bytes)
            .ok()
            .filter(|text| text.trim_start().starts_with("solid"))
            .and_then(|text| parse_ascii_stl(text).ok());
        let (kind, facets) = match ascii {
            Some(facets) => ("ASCII STL", facets),
            None => (
                "binary STL",
                parse_binary_stl(&bytes).with_context(|| format!("parse STL {}", path.display()))?,
            ),
        };
        let mesh = facets_to_mesh(&facets);
        println!("{}: {kind}, {} triangles{}", path.display(), mesh.triangle_count(), bounds_summary(&mesh));
        Ok(())
    }

    fn bounds_summary(mesh: &TriangleMesh) -> String {
        mesh.bounds().map_or_else(String::new, |b| {
            let size = b.size();
            format!(", size {:.3} x {:.3} x {:.3}", size.x, size.y, size.z)
        })
    }
}
