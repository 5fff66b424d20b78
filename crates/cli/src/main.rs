//! CLI tool for exporting DOM snapshots to PowerPoint slides.

use anyhow::{Context, Result};
use clap::Parser;
use dompptx_core::{
    build_presentation, resolve_root, DomSnapshot, ExportOptions, ExportTarget, FsImageLoader,
};
use std::fs::File;
use std::io::{self, BufReader, Write};
use std::path::{Path, PathBuf};

/// Export a rendered DOM snapshot as a 16:9 PowerPoint slide.
#[derive(Parser, Debug)]
#[command(name = "dom-to-pptx")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// DOM snapshot JSON file, or `-` for stdin
    input: PathBuf,

    /// Selector of the element to export (default: snapshot root)
    #[arg(short, long)]
    selector: Option<String>,

    /// Output .pptx file (default: export.pptx)
    #[arg(short = 'o', long = "file-name")]
    file_name: Option<String>,

    /// Directory that relative image paths resolve against
    /// (default: the snapshot's directory)
    #[arg(long)]
    assets: Option<PathBuf>,

    /// Print the slide objects as JSON instead of writing a file
    #[arg(long)]
    dump: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    if args.verbose {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug")).init();
    } else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    }

    let dom = load_snapshot(&args.input)?;
    log::debug!("Loaded {} snapshot nodes", dom.len());

    let loader = FsImageLoader::new(assets_dir(&args.input, args.assets.as_ref()));
    let target = match &args.selector {
        Some(selector) => ExportTarget::Selector(selector),
        None => ExportTarget::Element(dom.root()),
    };

    if args.dump {
        let root = resolve_root(&dom, target).context("Failed to resolve export root")?;
        let presentation = build_presentation(&dom, root, &loader);
        let json = serde_json::to_string_pretty(&presentation)
            .context("Failed to serialize slide objects")?;

        let mut stdout = io::stdout().lock();
        writeln!(stdout, "{}", json)?;
        return Ok(());
    }

    let options = export_options(args.file_name.as_deref());
    let written = dompptx_pptx::export_to_pptx(&dom, target, &options, &loader)
        .with_context(|| format!("Failed to export {}", args.input.display()))?;

    if args.verbose {
        eprintln!("Written to: {}", written.display());
    }

    Ok(())
}

/// Read a snapshot from a file, or from stdin for `-`.
fn load_snapshot(input: &Path) -> Result<DomSnapshot> {
    if input.as_os_str() == "-" {
        return DomSnapshot::from_reader(io::stdin().lock()).context("Failed to read snapshot from stdin");
    }

    let file =
        File::open(input).with_context(|| format!("Failed to open {}", input.display()))?;
    DomSnapshot::from_reader(BufReader::new(file))
        .with_context(|| format!("Failed to parse {}", input.display()))
}

/// Where relative image sources are looked up.
fn assets_dir(input: &Path, assets: Option<&PathBuf>) -> PathBuf {
    match assets {
        Some(dir) => dir.clone(),
        None => input
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default(),
    }
}

fn export_options(file_name: Option<&str>) -> ExportOptions {
    match file_name {
        Some(name) => ExportOptions::new().with_file_name(name),
        None => ExportOptions::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assets_dir_defaults_to_snapshot_directory() {
        let input = PathBuf::from("snapshots/card.json");
        assert_eq!(assets_dir(&input, None), PathBuf::from("snapshots"));

        let assets = PathBuf::from("/srv/assets");
        assert_eq!(assets_dir(&input, Some(&assets)), assets);
        assert_eq!(assets_dir(Path::new("-"), None), PathBuf::new());
    }

    #[test]
    fn test_export_options() {
        assert_eq!(export_options(None).file_name, "export.pptx");
        assert_eq!(export_options(Some("deck.pptx")).file_name, "deck.pptx");
        assert_eq!(export_options(Some("  ")).file_name, "export.pptx");
    }

    #[test]
    fn test_args_parse() {
        let args = Args::try_parse_from([
            "dom-to-pptx",
            "page.json",
            "-s",
            "#hero",
            "-o",
            "hero.pptx",
            "--dump",
        ])
        .unwrap();
        assert_eq!(args.selector.as_deref(), Some("#hero"));
        assert_eq!(args.file_name.as_deref(), Some("hero.pptx"));
        assert!(args.dump);
        assert!(!args.verbose);
    }
}
