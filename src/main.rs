use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand};
use globset::{Glob, GlobSet, GlobSetBuilder};
use tracing::info;

use binsize::definitions::JsonDefinitionCache;
use binsize::logging::{init_tracing, init_tracing_json};
use binsize::maptree::{self, DEFAULT_SECTIONS};
use binsize::statistics::{
    apps_category, render_rows_with_categories, rows_with_categories, CategoryRules, Statistics,
};
use binsize::{BinSizeConfig, BinarySize, DataRow, Language};

#[derive(Parser, Debug)]
#[command(name = "binsize")]
#[command(about = "Attribute firmware size to symbols, functions and modules", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// JSON configuration file; missing keys keep their defaults.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Firmware `core/` directory module paths are relative to.
    #[arg(long, global = true)]
    core_dir: Option<PathBuf>,

    /// Debug-level logging (RUST_LOG still takes precedence).
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Log as JSON lines on stderr.
    #[arg(long, global = true)]
    log_json: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the size of every symbol, optionally filtered.
    Get(GetArgs),

    /// Sum sizes per category.
    ///
    /// Without --rules, rows are grouped by their app directory under src/apps/.
    Stats(StatsArgs),

    /// Nested prefix-tree size report straight from a linker map.
    MapTree(MapTreeArgs),
}

#[derive(Args, Debug)]
struct InputArgs {
    /// Firmware ELF to run the size tool on.
    #[arg(conflicts_with = "csv")]
    binary: Option<PathBuf>,

    /// Previously captured size-tool CSV output instead of a binary.
    #[arg(long)]
    csv: Option<PathBuf>,

    /// Section to include (repeatable). Defaults to the configured sections.
    #[arg(short, long = "section")]
    sections: Vec<String>,

    /// Linker map used to split `[section X]` bucket rows.
    #[arg(long)]
    map: Option<PathBuf>,

    /// Keep raw symbols, skip classification and aggregation.
    #[arg(long)]
    no_processing: bool,

    /// Classify but do not merge alike rows.
    #[arg(long)]
    no_aggregation: bool,

    /// Look up source definitions (slow unless cached).
    #[arg(long)]
    add_definitions: bool,
}

#[derive(Args, Debug)]
struct GetArgs {
    #[command(flatten)]
    input: InputArgs,

    /// Only rows of this language (C, Rust or mpy).
    #[arg(long)]
    language: Option<String>,

    /// Only rows of this app under src/apps/.
    #[arg(long)]
    app: Option<String>,

    /// Only rows whose module matches this glob (repeatable).
    #[arg(long = "module")]
    modules: Vec<String>,

    /// Only rows whose function name contains this text.
    #[arg(long)]
    func_name: Option<String>,

    /// Only rows containing this text in any field.
    #[arg(long)]
    grep: Option<String>,

    /// Keep the loader's row order.
    #[arg(long)]
    no_sort: bool,

    /// Append raw symbols to every line.
    #[arg(long)]
    debug: bool,

    /// Write the report to a file instead of stdout.
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct StatsArgs {
    #[command(flatten)]
    input: InputArgs,

    /// JSON rule file: [{"name": ..., "prefixes": [...]}], first match wins.
    #[arg(long)]
    rules: Option<PathBuf>,

    /// Report rows no category claims as "None".
    #[arg(long)]
    include_none: bool,

    /// Also list every row with its category.
    #[arg(long)]
    with_data: bool,

    /// Write the report to a file instead of stdout.
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct MapTreeArgs {
    /// GNU ld map file.
    map: PathBuf,

    /// Output section to include (repeatable). Defaults to .flash and .data.
    #[arg(short, long = "section")]
    sections: Vec<String>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "info" };
    if cli.log_json {
        init_tracing_json(level);
    } else {
        init_tracing(level);
    }

    let config = load_config(&cli)?;
    match cli.command {
        Commands::Get(args) => get(args, &config),
        Commands::Stats(args) => stats(args, &config),
        Commands::MapTree(args) => map_tree(args),
    }
}

fn load_config(cli: &Cli) -> anyhow::Result<BinSizeConfig> {
    let mut config = match &cli.config {
        Some(path) => BinSizeConfig::from_file(path)?,
        None => BinSizeConfig::default(),
    };
    if let Some(core_dir) = &cli.core_dir {
        config.layout.core_dir = core_dir.clone();
    }
    Ok(config)
}

fn read_text(path: &Path) -> anyhow::Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

/// Load, enrich and classify rows as requested on the command line.
fn prepare(input: &InputArgs, config: &BinSizeConfig) -> anyhow::Result<BinarySize> {
    let sections = if input.sections.is_empty() {
        config.sections.clone()
    } else {
        input.sections.clone()
    };

    let pipeline = BinarySize::from_config(config);
    let mut pipeline = match (&input.binary, &input.csv) {
        (Some(binary), _) => pipeline.load_file(binary, Some(sections.as_slice()))?,
        (None, Some(csv)) => pipeline.load_csv(&read_text(csv)?, Some(sections.as_slice()))?,
        (None, None) => bail!("either a binary or --csv is required"),
    };

    if let Some(map) = &input.map {
        pipeline = pipeline.use_map_file(&read_text(map)?, &sections)?;
    }
    if input.no_processing {
        return Ok(pipeline);
    }

    pipeline = pipeline.add_basic_info()?;
    if !input.no_aggregation {
        pipeline = pipeline.aggregate()?;
    }
    if input.add_definitions {
        let cache_path = config.layout.core_dir.join(&config.cache_file);
        let mut cache = JsonDefinitionCache::open(cache_path, &config.layout.core_dir)?;
        pipeline = pipeline.add_definitions(&mut cache, None)?;
    }
    Ok(pipeline)
}

fn build_globset(globs: &[String]) -> anyhow::Result<Option<GlobSet>> {
    if globs.is_empty() {
        return Ok(None);
    }
    let mut builder = GlobSetBuilder::new();
    for g in globs {
        builder.add(Glob::new(g).with_context(|| format!("invalid module glob `{g}`"))?);
    }
    Ok(Some(builder.build()?))
}

/// Row filters of `binsize get`; all given ones must match.
#[derive(Debug, Default)]
struct RowFilter {
    language: Option<Language>,
    app: Option<String>,
    modules: Option<GlobSet>,
    func_name: Option<String>,
    grep: Option<String>,
}

impl RowFilter {
    fn from_args(args: &GetArgs) -> anyhow::Result<Self> {
        Ok(Self {
            language: args.language.as_deref().map(str::parse).transpose()?,
            app: args.app.clone(),
            modules: build_globset(&args.modules)?,
            func_name: args.func_name.clone(),
            grep: args.grep.clone(),
        })
    }

    fn is_empty(&self) -> bool {
        self.language.is_none()
            && self.app.is_none()
            && self.modules.is_none()
            && self.func_name.is_none()
            && self.grep.is_none()
    }

    fn matches(&self, row: &DataRow) -> bool {
        if self.language.is_some_and(|language| row.language != language) {
            return false;
        }
        if let Some(app) = &self.app {
            if apps_category(row).as_deref() != Some(app.as_str()) {
                return false;
            }
        }
        if let Some(modules) = &self.modules {
            if !modules.is_match(&row.module_name) {
                return false;
            }
        }
        if let Some(func_name) = &self.func_name {
            if !row.function_name.contains(func_name.as_str()) {
                return false;
            }
        }
        if let Some(grep) = &self.grep {
            if !row.to_string().contains(grep.as_str()) {
                return false;
            }
        }
        true
    }
}

fn get(args: GetArgs, config: &BinSizeConfig) -> anyhow::Result<()> {
    let filter = RowFilter::from_args(&args)?;
    let mut pipeline = prepare(&args.input, config)?;
    if !filter.is_empty() {
        pipeline = pipeline.filter(|row| filter.matches(row))?;
    }
    if !args.no_sort {
        pipeline = pipeline.sort()?;
    }
    pipeline.show(args.output.as_deref(), args.debug, None)?;
    Ok(())
}

fn stats(args: StatsArgs, config: &BinSizeConfig) -> anyhow::Result<()> {
    let rules = args
        .rules
        .as_deref()
        .map(CategoryRules::from_file)
        .transpose()?;
    let categorize = |row: &DataRow| match &rules {
        Some(rules) => rules.categorize(row),
        None => apps_category(row),
    };

    let pipeline = prepare(&args.input, config)?;
    let rows = pipeline.rows()?;
    let statistics = Statistics::compute(rows, categorize, args.include_none);

    let mut output = statistics.render();
    if args.with_data {
        let tagged = rows_with_categories(rows, categorize, args.include_none);
        output = format!("{output}\n\n{}", render_rows_with_categories(&tagged));
    }
    write_output(&output, args.output.as_deref())
}

fn map_tree(args: MapTreeArgs) -> anyhow::Result<()> {
    let sections: Vec<String> = if args.sections.is_empty() {
        DEFAULT_SECTIONS.iter().map(|s| s.to_string()).collect()
    } else {
        args.sections
    };
    let report = maptree::map_tree_report(&read_text(&args.map)?, &sections)?;
    write_output(&report, None)
}

fn write_output(text: &str, path: Option<&Path>) -> anyhow::Result<()> {
    match path {
        Some(path) => {
            info!(path = %path.display(), "Saving report");
            std::fs::write(path, text)
                .with_context(|| format!("failed to write {}", path.display()))?;
        }
        None => println!("{text}"),
    }
    Ok(())
}
