use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use parcel_engine::geojson::{read_reference_features, summarize};
use parcel_engine::prelude::*;
use std::path::{Path, PathBuf};
use tracing_subscriber::fmt::SubscriberBuilder;

mod provenance;
mod script;

#[derive(Parser)]
#[command(name = "parcel-cli")]
#[command(about = "Headless runner for the parcel editing engine")]
struct Cmd {
    #[command(subcommand)]
    action: Action,
}

#[derive(Subcommand)]
enum Action {
    /// Replay a JSON script of editor operations and write the GeoJSON export
    Replay {
        #[arg(long)]
        script: PathBuf,
        #[arg(long)]
        out: PathBuf,
        /// Editor configuration (JSON, partial files allowed)
        #[arg(long)]
        config: Option<PathBuf>,
        /// Reference features as a GeoJSON FeatureCollection
        #[arg(long)]
        references: Option<PathBuf>,
        /// Layer type for reference features without a `layer` property
        #[arg(long, default_value = "field")]
        default_layer: String,
        /// Start from an existing export instead of an empty document
        #[arg(long)]
        input: Option<PathBuf>,
        /// Stop at the first failed step
        #[arg(long)]
        strict: bool,
        /// Also write the event transcript next to the export
        #[arg(long)]
        transcript: bool,
    },
    /// Import an export and print invariant violations as JSON
    Check {
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Print a small provenance JSON block
    Report,
}

fn main() -> Result<()> {
    SubscriberBuilder::default().with_target(false).init();
    let cmd = Cmd::parse();
    match cmd.action {
        Action::Replay {
            script,
            out,
            config,
            references,
            default_layer,
            input,
            strict,
            transcript,
        } => replay(ReplayArgs {
            script,
            out,
            config,
            references,
            default_layer,
            input,
            strict,
            transcript,
        }),
        Action::Check { input, config } => check(&input, config.as_deref()),
        Action::Report => report(),
    }
}

struct ReplayArgs {
    script: PathBuf,
    out: PathBuf,
    config: Option<PathBuf>,
    references: Option<PathBuf>,
    default_layer: String,
    input: Option<PathBuf>,
    strict: bool,
    transcript: bool,
}

fn read_to_string(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))
}

fn load_config(path: Option<&Path>) -> Result<EditorCfg> {
    match path {
        Some(p) => EditorCfg::from_json_str(&read_to_string(p)?)
            .with_context(|| format!("parsing config {}", p.display())),
        None => Ok(EditorCfg::default()),
    }
}

fn load_document(path: &Path, cfg: &EditorCfg) -> Result<Document> {
    let fc = FeatureCollection::from_json_str(&read_to_string(path)?)
        .with_context(|| format!("parsing {}", path.display()))?;
    Ok(import_document(&fc, &CrsTransform::identity(), cfg.geom())?)
}

fn replay(args: ReplayArgs) -> Result<()> {
    tracing::info!(script = %args.script.display(), out = %args.out.display(), "replay");
    let cfg = load_config(args.config.as_deref())?;
    let script = script::Script::from_json_str(&read_to_string(&args.script)?)
        .with_context(|| format!("parsing script {}", args.script.display()))?;
    let doc = match &args.input {
        Some(p) => load_document(p, &cfg)?,
        None => Document::new(),
    };
    let mut editor = Editor::with_document(cfg, ViewTransform::default(), doc);
    if let Some(p) = &args.references {
        let fc = FeatureCollection::from_json_str(&read_to_string(p)?)
            .with_context(|| format!("parsing references {}", p.display()))?;
        let refs = read_reference_features(&fc, &CrsTransform::identity(), &args.default_layer);
        tracing::info!(count = refs.len(), "references loaded");
        editor.set_references(refs);
    }

    let transcript = script::replay(&mut editor, &script, args.strict)?;
    let violations = editor.check_invariants();
    for v in &violations {
        tracing::warn!(violation = ?v, "invariant broken after replay");
    }

    let fc = export_document(editor.document(), &CrsTransform::identity());
    let (area, length) = summarize(&fc);
    if let Some(parent) = args.out.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    std::fs::write(&args.out, fc.to_json_string()?)
        .with_context(|| format!("writing {}", args.out.display()))?;
    if args.transcript {
        let path = args.out.with_extension("events.json");
        std::fs::write(&path, serde_json::to_vec_pretty(&transcript)?)
            .with_context(|| format!("writing {}", path.display()))?;
    }
    tracing::info!(
        applied = transcript.applied,
        failed = transcript.failures.len(),
        parcels = editor.document().parcels.len(),
        parcel_area_sqm = area,
        linear_m = length,
        "export written"
    );

    let mut payload = provenance::Payload::new(serde_json::json!({
        "steps": script.steps.len(),
        "applied": transcript.applied,
        "failed": transcript.failures.len(),
        "violations": violations.len(),
        "strict": args.strict,
    }))
    .with_input(&args.script);
    for p in [&args.config, &args.references, &args.input].into_iter().flatten() {
        payload = payload.with_input(p);
    }
    provenance::write_sidecar(&args.out, payload)?;
    Ok(())
}

fn check(input: &Path, config: Option<&Path>) -> Result<()> {
    let cfg = load_config(config)?;
    let doc = load_document(input, &cfg)?;
    let violations = doc.check_invariants(cfg.geom(), &GeoClipper, cfg.area_threshold());
    tracing::info!(
        input = %input.display(),
        parcels = doc.parcels.len(),
        violations = violations.len(),
        "check"
    );
    println!("{}", serde_json::to_string_pretty(&violations)?);
    Ok(())
}

fn report() -> Result<()> {
    let obj = provenance::summary(serde_json::json!({}));
    println!("{}", serde_json::to_string_pretty(&obj)?);
    Ok(())
}
