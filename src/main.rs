use anyhow::Context;
use clap::{Args as ClapArgs, Parser, Subcommand};
use furnrec::export::{self, OutputFormat};
use furnrec::{
    load_csv, BundleStore, EncoderConfig, Error, Field, ModelBundle, RecordFilter, RestApi,
    DEFAULT_TOP_N,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

/// Content-based furniture recommendations for renters
#[derive(Parser, Debug)]
#[command(name = "furnrec")]
#[command(about = "Train and query a furniture recommendation model", long_about = None)]
struct Args {
    /// Log level
    #[arg(long, default_value = "info", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Build a model bundle from a CSV dataset
    Train {
        /// Rentals CSV file
        #[arg(short, long)]
        input: PathBuf,

        /// Where to write the model bundle
        #[arg(short, long, default_value = "model.bin")]
        output: PathBuf,

        /// Comma-separated columns forming the combined text
        #[arg(long, value_delimiter = ',')]
        fields: Option<Vec<String>>,
    },

    /// Recommend furniture similar to a named item or to the first filter match
    Recommend {
        #[command(flatten)]
        model: ModelArgs,

        /// Anchor on the first record with this recommended_furniture value
        #[arg(
            long,
            conflicts_with_all = [
                "apartment_type",
                "location",
                "budget_range",
                "preferred_style",
                "search"
            ]
        )]
        name: Option<String>,

        #[command(flatten)]
        filter: FilterArgs,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Rank records against a free-text description
    Query {
        #[command(flatten)]
        model: ModelArgs,

        /// Description, e.g. "small studio minimalist sofa"
        #[arg(long)]
        text: String,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Pick a random record, optionally within a filter
    Surprise {
        #[command(flatten)]
        model: ModelArgs,

        #[command(flatten)]
        filter: FilterArgs,
    },

    /// List the values available for each filter
    Options {
        #[command(flatten)]
        model: ModelArgs,
    },

    /// Serve the query interface over HTTP
    Serve {
        #[command(flatten)]
        model: ModelArgs,

        /// HTTP API port
        #[arg(long, default_value_t = 8080)]
        http_port: u16,
    },
}

#[derive(ClapArgs, Debug)]
struct ModelArgs {
    /// Path to the model bundle
    #[arg(short, long, default_value = "model.bin")]
    model: PathBuf,
}

impl ModelArgs {
    fn load(&self) -> anyhow::Result<ModelBundle> {
        BundleStore::new(&self.model)
            .load()
            .with_context(|| format!("failed to load model bundle {:?}", self.model))
    }
}

#[derive(ClapArgs, Debug)]
struct FilterArgs {
    #[arg(long)]
    apartment_type: Option<String>,
    #[arg(long)]
    location: Option<String>,
    #[arg(long)]
    budget_range: Option<String>,
    #[arg(long)]
    preferred_style: Option<String>,
    /// Case-insensitive search in the furniture name
    #[arg(long)]
    search: Option<String>,
}

impl FilterArgs {
    fn filter(&self) -> RecordFilter {
        RecordFilter {
            apartment_type: self.apartment_type.clone(),
            location: self.location.clone(),
            budget_range: self.budget_range.clone(),
            preferred_style: self.preferred_style.clone(),
            search: self.search.clone(),
        }
        .normalized()
    }
}

#[derive(ClapArgs, Debug)]
struct OutputArgs {
    /// Number of recommendations
    #[arg(short = 'n', long, default_value_t = DEFAULT_TOP_N)]
    top_n: usize,

    /// Keep only the best entry per furniture name
    #[arg(long)]
    dedupe: bool,

    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    format: OutputFormat,

    /// Write to a file instead of stdout
    #[arg(long)]
    out: Option<PathBuf>,
}

impl OutputArgs {
    fn dedupe_by(&self) -> Option<Field> {
        self.dedupe.then_some(Field::RecommendedFurniture)
    }

    fn emit(&self, recommendations: &[furnrec::Recommendation]) -> anyhow::Result<()> {
        if recommendations.is_empty() {
            println!("No recommendations found. Try adjusting your filters.");
            return Ok(());
        }
        match &self.out {
            Some(path) => {
                let file = std::fs::File::create(path)?;
                export::write(std::io::BufWriter::new(file), self.format, recommendations)?;
                info!("Recommendations written to {:?}", path);
            }
            None => export::write(std::io::stdout().lock(), self.format, recommendations)?,
        }
        Ok(())
    }
}

fn train(input: PathBuf, output: PathBuf, fields: Option<Vec<String>>) -> anyhow::Result<()> {
    let config = match fields {
        Some(names) => EncoderConfig::new(
            names
                .iter()
                .map(|n| n.parse::<Field>())
                .collect::<Result<Vec<_>, _>>()?,
        )?,
        None => EncoderConfig::default(),
    };

    let dataset = load_csv(&input).with_context(|| format!("failed to read dataset {:?}", input))?;
    info!("Loaded {} rows, {} usable", dataset.total_rows, dataset.records.len());

    let bundle = ModelBundle::train(dataset.records, &config)?;
    BundleStore::new(&output).save(&bundle)?;

    let summary = bundle.summary();
    if summary.zero_vectors > 0 {
        warn!(
            "{} records have no usable terms and will never be recommended",
            summary.zero_vectors
        );
    }
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

fn init_tracing(level: &str) -> anyhow::Result<()> {
    let log_level = match level {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing(&args.log_level)?;

    match args.command {
        Command::Train { input, output, fields } => train(input, output, fields)?,

        Command::Recommend { model, name, filter, output } => {
            let bundle = model.load()?;
            let recommender = bundle.recommender()?;
            match name {
                Some(name) => match recommender.recommend_for(
                    Field::RecommendedFurniture,
                    &name,
                    output.top_n,
                    output.dedupe_by(),
                ) {
                    Ok(recs) => output.emit(&recs)?,
                    Err(e @ Error::AnchorNotFound { .. }) => println!("No match: {}", e),
                    Err(e) => return Err(e.into()),
                },
                None => {
                    let result = recommender.recommend_filtered(
                        &filter.filter(),
                        output.top_n,
                        output.dedupe_by(),
                    );
                    if let Some(pick) = &result.top_pick {
                        println!("Top pick: {}", pick.recommended_furniture);
                    }
                    output.emit(&result.recommendations)?;
                }
            }
        }

        Command::Query { model, text, output } => {
            let bundle = model.load()?;
            let recs = bundle.recommender()?.query(&text, output.top_n, output.dedupe_by())?;
            output.emit(&recs)?;
        }

        Command::Surprise { model, filter } => {
            let bundle = model.load()?;
            match bundle.records().sample(&filter.filter(), &mut rand::rng()) {
                Some(record) => println!("{}", serde_json::to_string_pretty(&record.listing())?),
                None => println!("No records match these filters."),
            }
        }

        Command::Options { model } => {
            let bundle = model.load()?;
            for field in Field::FILTERABLE {
                println!("{}: {}", field, bundle.records().distinct(field).join(", "));
            }
        }

        Command::Serve { model, http_port } => {
            let bundle = Arc::new(model.load()?);
            info!("Starting furnrec v{}", env!("CARGO_PKG_VERSION"));

            let http_handle = std::thread::spawn(move || {
                info!("Starting HTTP server on port {}", http_port);
                let sys = actix_web::rt::System::new();
                sys.block_on(async {
                    if let Err(e) = RestApi::start(bundle, http_port).await {
                        eprintln!("HTTP server error: {}", e);
                    }
                })
            });

            info!("HTTP API: http://localhost:{}/", http_port);

            tokio::select! {
                _ = tokio::signal::ctrl_c() => {
                    info!("Shutdown signal received");
                }
                _ = tokio::task::spawn_blocking(move || {
                    http_handle.join().ok();
                }) => {
                    info!("HTTP server stopped");
                }
            }
            info!("Shutting down...");
        }
    }

    Ok(())
}
