#[cfg(target_arch = "wasm32")]
fn main() {
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    if let Err(err) = native::run() {
        eprintln!("basemesh_cli error: {err}");
        std::process::exit(1);
    }
}

#[cfg(not(target_arch = "wasm32"))]
mod native {
    use basemesh_engine::catalog::{Catalog, CatalogConfig};
    use basemesh_engine::model::{BaseMesh, Bone};
    use basemesh_engine::parse::base_mesh_xml;
    use basemesh_engine::summary::{MeshSummary, summarize_mesh};
    use std::fs;
    use std::path::{Path, PathBuf};
    use time::OffsetDateTime;

    const USAGE: &str = r#"basemesh_cli (basemesh-engine)

USAGE:
  basemesh_cli list <dir>
  basemesh_cli inspect <file>
  basemesh_cli summarize <file> [options]
  basemesh_cli catalog <dir> [--mesh <name>] [options]

OPTIONS (summarize, catalog):
  --out <path>       Write slider metadata JSON to this file instead of stdout
  --session <id>     Session id recorded in the metadata (default: derived from the clock)
  --overwrite        Overwrite an existing --out file
  -h, --help         Show this help

Set RUST_LOG=debug for parser diagnostics.
"#;

    pub fn run() -> Result<(), String> {
        let args: Vec<String> = std::env::args().skip(1).collect();
        let mut args = Args::new(args);

        let Some(command) = args.next() else {
            print_usage();
            return Ok(());
        };

        match command.as_str() {
            "list" => cmd_list(&mut args),
            "inspect" => cmd_inspect(&mut args),
            "summarize" => cmd_summarize(&mut args),
            "catalog" => cmd_catalog(&mut args),
            "-h" | "--help" | "help" => {
                print_usage();
                Ok(())
            }
            other => Err(format!("unknown command `{other}`\n\n{USAGE}")),
        }
    }

    fn print_usage() {
        println!("{USAGE}");
    }

    fn cmd_list(args: &mut Args) -> Result<(), String> {
        let dir = PathBuf::from(args.next().ok_or("missing catalog directory")?);
        let catalog = Catalog::load_dir(&dir).map_err(|e| e.to_string())?;
        if catalog.is_empty() {
            println!("no base meshes in {}", dir.display());
            return Ok(());
        }
        for mesh in catalog.iter() {
            println!(
                "{}\tv{}\t{} vertices\t{} layers",
                mesh.name(),
                mesh.version(),
                mesh.vertex_count(),
                mesh.weight_layers().len()
            );
        }
        Ok(())
    }

    fn cmd_inspect(args: &mut Args) -> Result<(), String> {
        let path = PathBuf::from(args.next().ok_or("missing document path")?);
        let mesh = load_mesh(&path)?;
        let summary = summarize_mesh(&mesh);
        let stats = summary.statistics;

        println!("{} (version {}, unit {})", mesh.name(), mesh.version(), mesh.unit());
        for (key, value) in mesh.metadata().iter() {
            println!("  {key}: {value}");
        }
        println!(
            "vertices: {}  faces: {}  triangles: {}",
            stats.vertex_count, stats.face_count, stats.triangle_count
        );

        println!("bones: {}", stats.bone_count);
        for root in mesh.root_bones() {
            print_bone_tree(&mesh, root, 1);
        }

        println!("weight layers: {}", stats.weight_layer_count);
        for layer in &summary.layers {
            println!(
                "  {} [{}{}] bones={} affected={} max={:.4}",
                layer.name,
                layer.layer_type,
                if layer.normalised { ", normalised" } else { "" },
                layer.bone_count,
                layer.affected_vertices,
                layer.max_weight
            );
        }

        println!("sizing: {}", stats.sizing_parameter_count);
        for parameter in mesh.sizing().values() {
            let flag = if parameter.is_within_bounds() { "" } else { "  (out of bounds)" };
            println!("  {} = {} {}{flag}", parameter.name, parameter.value, parameter.unit);
        }
        Ok(())
    }

    fn print_bone_tree(mesh: &BaseMesh, bone: &Bone, depth: usize) {
        println!("{}{} (length {:.4})", "  ".repeat(depth), bone.name, bone.length());
        // Parents are not validated, so guard against cycles by depth.
        if depth > mesh.bones().len() {
            return;
        }
        for child in mesh.children_of(&bone.name) {
            print_bone_tree(mesh, child, depth + 1);
        }
    }

    fn cmd_summarize(args: &mut Args) -> Result<(), String> {
        let path = PathBuf::from(args.next().ok_or("missing document path")?);
        let Some(output) = OutputOptions::parse(args, &[])? else {
            return Ok(());
        };

        let mesh = load_mesh(&path)?;
        emit_metadata(summarize_mesh(&mesh), &output)
    }

    fn cmd_catalog(args: &mut Args) -> Result<(), String> {
        let dir = PathBuf::from(args.next().ok_or("missing catalog directory")?);
        let Some(output) = OutputOptions::parse(args, &["--mesh"])? else {
            return Ok(());
        };

        let mut config = CatalogConfig::new(dir);
        if let Some(mesh) = output.mesh.clone() {
            config = config.with_default_mesh(mesh);
        }
        let catalog = Catalog::load(&config).map_err(|e| e.to_string())?;
        let mesh = catalog.resolve_default(&config).map_err(|e| e.to_string())?;
        emit_metadata(summarize_mesh(mesh), &output)
    }

    fn load_mesh(path: &Path) -> Result<BaseMesh, String> {
        base_mesh_xml::parse_file(path).map_err(|e| format!("{}: {e}", path.display()))
    }

    struct OutputOptions {
        out: Option<PathBuf>,
        session: Option<String>,
        mesh: Option<String>,
        overwrite: bool,
    }

    impl OutputOptions {
        /// `None` when help was printed.
        fn parse(args: &mut Args, extra: &[&str]) -> Result<Option<Self>, String> {
            let mut options = Self {
                out: None,
                session: None,
                mesh: None,
                overwrite: false,
            };
            while let Some(arg) = args.next() {
                match arg.as_str() {
                    "--out" => options.out = Some(PathBuf::from(args.value("--out")?)),
                    "--session" => options.session = Some(args.value("--session")?),
                    "--mesh" if extra.contains(&"--mesh") => {
                        options.mesh = Some(args.value("--mesh")?);
                    }
                    "--overwrite" => options.overwrite = true,
                    "-h" | "--help" => {
                        print_usage();
                        return Ok(None);
                    }
                    other => return Err(format!("unknown option `{other}`\n\n{USAGE}")),
                }
            }
            Ok(Some(options))
        }
    }

    fn emit_metadata(summary: MeshSummary, output: &OutputOptions) -> Result<(), String> {
        let now = OffsetDateTime::now_utc();
        let session = output
            .session
            .clone()
            .unwrap_or_else(|| format!("{:x}", now.unix_timestamp_nanos()));
        let metadata = summary.into_metadata(session, now);
        let json = metadata.to_json().map_err(|e| format!("serialize metadata: {e}"))?;

        match output.out.as_deref() {
            Some(path) => write_text_file(path, &json, output.overwrite),
            None => {
                println!("{json}");
                Ok(())
            }
        }
    }

    fn write_text_file(path: &Path, text: &str, overwrite: bool) -> Result<(), String> {
        if path.exists() && !overwrite {
            return Err(format!(
                "refusing to overwrite existing file {} (use --overwrite)",
                path.display()
            ));
        }
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .map_err(|e| format!("create dir {}: {e}", parent.display()))?;
        }
        fs::write(path, text).map_err(|e| format!("write {}: {e}", path.display()))
    }

    struct Args {
        args: Vec<String>,
        pos: usize,
    }

    impl Args {
        fn new(args: Vec<String>) -> Self {
            Self { args, pos: 0 }
        }

        fn next(&mut self) -> Option<String> {
            let arg = self.args.get(self.pos)?.clone();
            self.pos += 1;
            Some(arg)
        }

        fn value(&mut self, flag: &str) -> Result<String, String> {
            self.next()
                .ok_or_else(|| format!("missing value for {flag}"))
        }
    }
}
