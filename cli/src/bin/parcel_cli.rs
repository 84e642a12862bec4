use clap::{Parser, Subcommand};
use cli::LabelerConfig;
use color_eyre::eyre::{eyre, Result};
use parcel::{
    export_by_label, parse_expected_total, AutoClassifier, AutoClassifySummary, CancelFlag, ImageId, Label,
    LabelFilter, LabelSession, ParcelError, SharedSession,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::{self, EnvFilter};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Labeler configuration (.toml or .json)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print labeling progress and read rates
    Stats {
        /// Folder holding the parcel images
        #[arg(short, long)]
        folder: PathBuf,
        /// Expected number of parcels (overrides the config)
        #[arg(short, long)]
        expected_total: Option<String>,
    },
    /// Classify one image and save a revision
    Label {
        #[arg(short, long)]
        folder: PathBuf,
        /// File name or full path of the image
        #[arg(short, long)]
        image: String,
        /// One of: no_code, read_failure, occluded, image_quality, damaged, other, unclassified
        #[arg(short, long)]
        label: String,
    },
    /// List images with their label and parcel index
    List {
        #[arg(short, long)]
        folder: PathBuf,
        /// Only show images with this label
        #[arg(short, long)]
        label: Option<String>,
    },
    /// List started parcels in index order
    Parcels {
        #[arg(short, long)]
        folder: PathBuf,
    },
    /// Label never-touched images by barcode presence
    AutoClassify {
        #[arg(short, long)]
        folder: PathBuf,
    },
    /// Run the barcode detector on one image
    Detect {
        #[arg(short, long)]
        image: PathBuf,
    },
    /// Copy classified images into one folder per label
    Export {
        #[arg(short, long)]
        folder: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Poll the folder for new images until Ctrl+C
    Watch {
        #[arg(short, long)]
        folder: PathBuf,
        /// Seconds between polls (overrides the config)
        #[arg(long)]
        interval: Option<u64>,
        /// Auto-classify new images as they arrive
        #[arg(long)]
        auto_classify: bool,
    },
    /// Print the JSON schema of the configuration file
    ConfigSchema,
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info"))
        )
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => LabelerConfig::from_file(path)?,
        None => LabelerConfig::default(),
    };

    match cli.command {
        Commands::Stats { folder, expected_total } => {
            let expected = match expected_total {
                Some(text) => parse_expected_total(&text),
                None => config.expected_total(),
            };
            let session = LabelSession::open(&folder)?;
            println!("{}", session.statistics(expected));
        }
        Commands::Label { folder, image, label } => {
            label_image(&folder, &image, &label)?;
        }
        Commands::List { folder, label } => {
            list_images(&folder, label.as_deref())?;
        }
        Commands::Parcels { folder } => {
            let session = LabelSession::open(&folder)?;
            for parcel in session.parcels() {
                println!(
                    "{}\t{}\t{}\t{} image(s)",
                    parcel.index.map(|i| i.to_string()).unwrap_or_else(|| "-".into()),
                    parcel.key,
                    parcel.label,
                    parcel.images
                );
            }
        }
        Commands::AutoClassify { folder } => {
            let session = LabelSession::open(&folder)?.into_shared();
            let targets = session.read().map_err(|_| ParcelError::LockPoisoned)?.unlabelled();
            info!("Auto-classifying {} never-labelled image(s)", targets.len());

            let summary = auto_classify(&session, &config, targets).await?;
            save(&session)?;
            println!(
                "{} classified ({} no_code, {} read_failure), {} skipped, {} failed{}",
                summary.processed,
                summary.no_code,
                summary.read_failure,
                summary.skipped,
                summary.failed,
                if summary.cancelled { ", cancelled" } else { "" }
            );
        }
        Commands::Detect { image } => {
            let report = config.detector()?.detect_file(&image)?;
            let stage = report.stage.map(|s| s.to_string()).unwrap_or_else(|| "none".into());
            println!("{}: {} candidate region(s), stage {}", image.display(), report.count, stage);
        }
        Commands::Export { folder, output } => {
            export(&folder, output).await?;
        }
        Commands::Watch { folder, interval, auto_classify } => {
            let interval = interval
                .map(|secs| Duration::from_secs(secs.max(1)))
                .unwrap_or_else(|| config.poll_interval());
            watch(&folder, interval, auto_classify || config.auto_classify_new, &config).await?;
        }
        Commands::ConfigSchema => {
            println!("{}", LabelerConfig::schema()?);
        }
    }

    Ok(())
}

fn label_image(folder: &Path, name: &str, label: &str) -> Result<()> {
    let label = Label::parse(label)?;
    let mut session = LabelSession::open(folder)?;
    let image = session
        .resolve(name)
        .cloned()
        .ok_or_else(|| eyre!("No image named '{}' in {:?}", name, folder))?;

    if let Some(index) = session.set_label(&image, label)? {
        info!("Parcel of {} started as #{}", image.file_name(), index);
    }
    let path = session.save()?;
    info!("Saved {:?}", path);

    let index = session.parcel_index(&image);
    println!(
        "{} -> {} (parcel #{})",
        image.file_name(),
        label,
        index.map(|i| i.to_string()).unwrap_or_else(|| "-".into())
    );
    Ok(())
}

fn list_images(folder: &Path, label: Option<&str>) -> Result<()> {
    let filter = match label {
        Some(text) => LabelFilter::Only(Label::parse(text)?),
        None => LabelFilter::All,
    };
    let session = LabelSession::open(folder)?;

    for image in session.filter(filter) {
        let index = session.parcel_index(image);
        println!(
            "{}\t{}\t{}",
            image.file_name(),
            session.effective_label(image),
            index.map(|i| i.to_string()).unwrap_or_else(|| "-".into())
        );
    }
    Ok(())
}

fn save(session: &SharedSession) -> Result<()> {
    let guard = session.read().map_err(|_| ParcelError::LockPoisoned)?;
    let path = guard.save()?;
    info!("Saved {:?}", path);
    Ok(())
}

/// Run detection on a blocking thread; Ctrl+C stops after the current image
async fn auto_classify(
    session: &SharedSession,
    config: &LabelerConfig,
    targets: Vec<ImageId>,
) -> Result<AutoClassifySummary> {
    let classifier = AutoClassifier::new(config.detector()?);
    let cancel = classifier.cancel_flag();
    let shared = Arc::clone(session);
    let mut task = tokio::task::spawn_blocking(move || classifier.run(&shared, &targets));

    let summary = tokio::select! {
        result = &mut task => result??,
        _ = tokio::signal::ctrl_c() => {
            warn!("Received Ctrl+C, stopping after the current image");
            cancel.cancel();
            task.await??
        }
    };
    Ok(summary)
}

async fn export(folder: &Path, output: PathBuf) -> Result<()> {
    let session = LabelSession::open(folder)?;
    let cancel = CancelFlag::new();
    let flag = cancel.clone();
    let mut task = tokio::task::spawn_blocking(move || export_by_label(&session, &output, &flag));

    let summary = tokio::select! {
        result = &mut task => result??,
        _ = tokio::signal::ctrl_c() => {
            warn!("Received Ctrl+C, stopping after the current file");
            cancel.cancel();
            task.await??
        }
    };

    println!(
        "{} copied, {} failed{}",
        summary.copied,
        summary.failed,
        if summary.cancelled { ", cancelled" } else { "" }
    );
    Ok(())
}

async fn watch(folder: &Path, interval: Duration, auto: bool, config: &LabelerConfig) -> Result<()> {
    let session = LabelSession::open(folder)?.into_shared();
    let mut ticker = tokio::time::interval(interval);
    // The first tick completes immediately
    ticker.tick().await;

    info!("Watching {:?} every {:?}, Ctrl+C to stop", folder, interval);

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = tokio::signal::ctrl_c() => {
                info!("Monitoring stopped");
                break;
            }
        }

        let added = session.write().map_err(|_| ParcelError::LockPoisoned)?.refresh()?;
        if added.is_empty() {
            continue;
        }
        for image in &added {
            println!("new: {}", image.file_name());
        }

        if auto {
            let summary = auto_classify(&session, config, added).await?;
            save(&session)?;
            if summary.cancelled {
                info!("Monitoring stopped");
                break;
            }
        }
    }

    Ok(())
}
