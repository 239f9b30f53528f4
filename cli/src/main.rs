//! pageflow CLI - paged document pagination tool

use std::fs;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

use pageflow::{
    parse_file_with_options, DocumentStats, EstimatingMeasurer, JsonFormat, Measurer,
    PageSelection, PageSize, Pageflow, PaginationOptions, ParseOptions, RenderOptions,
    DEFAULT_MAX_PASSES,
};

#[derive(Parser)]
#[command(name = "pageflow")]
#[command(author = "iyulab")]
#[command(version)]
#[command(about = "Paginate paged HTML and JSON documents", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Re-flow a document so that every page fits
    Paginate {
        /// Input document (HTML or JSON)
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Output file (stdout if not specified)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "html")]
        format: OutputFormat,

        /// Pagination options as JSON
        #[arg(long, value_name = "FILE")]
        config: Option<PathBuf>,

        /// Paper size; overrides the configured page height
        #[arg(long, value_enum)]
        page_size: Option<PaperSize>,

        /// Top and bottom margin in inches, used with --page-size
        #[arg(long, default_value = "1.0")]
        margin: f32,

        /// Reject malformed input instead of repairing it
        #[arg(long)]
        strict: bool,

        /// Page range for text output (e.g., "1-10", "1,3,5")
        #[arg(long)]
        pages: Option<String>,

        /// Label numbered pages in the output
        #[arg(long)]
        page_labels: bool,

        /// Give up after this many layout passes
        #[arg(long, default_value_t = DEFAULT_MAX_PASSES)]
        max_passes: usize,
    },

    /// Show pages, estimated heights and outline of a document
    Info {
        /// Input document (HTML or JSON)
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Pagination options as JSON
        #[arg(long, value_name = "FILE")]
        config: Option<PathBuf>,

        /// Print statistics as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show version information
    Version,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    /// Paged HTML
    Html,
    /// JSON document model
    Json,
    /// Plain text, pages separated by form feeds
    Text,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum PaperSize {
    /// US Letter
    Letter,
    /// US Legal
    Legal,
    /// ISO A4
    A4,
}

impl From<PaperSize> for PageSize {
    fn from(size: PaperSize) -> Self {
        match size {
            PaperSize::Letter => PageSize::Letter,
            PaperSize::Legal => PageSize::Legal,
            PaperSize::A4 => PageSize::A4,
        }
    }
}

struct PaginateArgs<'a> {
    input: &'a Path,
    output: Option<&'a Path>,
    format: OutputFormat,
    config: Option<&'a Path>,
    page_size: Option<PaperSize>,
    margin: f32,
    strict: bool,
    pages: Option<&'a str>,
    page_labels: bool,
    max_passes: usize,
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    let result = match cli.command {
        Some(Commands::Paginate {
            input,
            output,
            format,
            config,
            page_size,
            margin,
            strict,
            pages,
            page_labels,
            max_passes,
        }) => cmd_paginate(&PaginateArgs {
            input: &input,
            output: output.as_deref(),
            format,
            config: config.as_deref(),
            page_size,
            margin,
            strict,
            pages: pages.as_deref(),
            page_labels,
            max_passes,
        }),
        Some(Commands::Info {
            input,
            config,
            json,
        }) => cmd_info(&input, config.as_deref(), json),
        Some(Commands::Version) => {
            cmd_version();
            Ok(())
        }
        None => {
            println!("{}", "Usage: pageflow paginate <FILE> [-o OUTPUT]".yellow());
            println!("       pageflow --help for more information");
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("{}: {}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

fn load_options(config: Option<&Path>) -> Result<PaginationOptions, Box<dyn std::error::Error>> {
    match config {
        Some(path) => {
            let json = fs::read_to_string(path)?;
            Ok(PaginationOptions::from_json(&json)?)
        }
        None => Ok(PaginationOptions::default()),
    }
}

fn cmd_paginate(args: &PaginateArgs) -> Result<(), Box<dyn std::error::Error>> {
    let page_selection = if let Some(p) = args.pages {
        PageSelection::parse(p).map_err(|e| format!("Invalid page range: {}", e))?
    } else {
        PageSelection::All
    };

    let options = load_options(args.config)?;
    let render_options = RenderOptions::new()
        .with_numbering(options.numbering)
        .with_page_labels(args.page_labels)
        .with_pages(page_selection);

    let mut builder = Pageflow::new()
        .with_pagination_options(options)
        .with_render_options(render_options)
        .with_max_passes(args.max_passes);
    if !args.strict {
        builder = builder.lenient();
    }
    if let Some(size) = args.page_size {
        builder = builder.with_page_size(size.into(), args.margin);
    }

    // Only draw progress when stdout is free for it.
    let pb = match args.output {
        Some(_) => ProgressBar::new_spinner(),
        None => ProgressBar::hidden(),
    };
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
    pb.set_message(format!("Paginating {}...", args.input.display()));

    let result = builder.parse(args.input)?;
    log::info!(
        "{} pages after {} passes ({} moves)",
        result.document.page_count(),
        result.report.passes,
        result.report.moves
    );

    let rendered = match args.format {
        OutputFormat::Html => result.to_html()?,
        OutputFormat::Json => result.to_json(JsonFormat::Pretty)?,
        OutputFormat::Text => result.to_text()?,
    };
    pb.finish_and_clear();

    if result.report.skipped > 0 {
        eprintln!(
            "{} {} page(s) hold a single node taller than the page",
            "Warning:".yellow().bold(),
            result.report.skipped
        );
    }

    if let Some(path) = args.output {
        fs::write(path, &rendered)?;
        println!(
            "{} {} ({} pages, {} moves)",
            "Saved to".green(),
            path.display(),
            result.document.page_count(),
            result.report.moves
        );
    } else {
        println!("{}", rendered);
    }

    Ok(())
}

fn cmd_info(
    input: &Path,
    config: Option<&Path>,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let options = load_options(config)?;
    let doc = parse_file_with_options(input, ParseOptions::new().lenient())?;
    let stats = DocumentStats::collect(&doc);

    if json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
        return Ok(());
    }

    println!("{}", "Document Information".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());

    println!("{}: {}", "File".bold(), input.display());
    if let Some(ref title) = doc.metadata.title {
        println!("{}: {}", "Title".bold(), title);
    }
    if let Some(ref author) = doc.metadata.author {
        println!("{}: {}", "Author".bold(), author);
    }
    println!("{}: {}", "Pages".bold(), doc.page_count());
    println!("{}: {}", "Positions".bold(), doc.content_size());

    println!();
    println!("{}", "Pages".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());

    let measurer = EstimatingMeasurer::new();
    for (index, page) in doc.pages().iter().enumerate() {
        let height = measurer.content_height(page).unwrap_or(0.0);
        let label = match options.numbering.label(index) {
            Some(n) => format!("p. {}", n),
            None => "-".to_string(),
        };
        let line = format!(
            "  {:>3}  {:<6} {:>3} blocks  {:>7.1} / {:.0}",
            index + 1,
            label,
            page.block_count(),
            height,
            options.nominal_height
        );
        if height > options.nominal_height {
            println!("{} {}", line.red(), "overflow".red().bold());
        } else {
            println!("{}", line);
        }
    }

    let outline = doc.outline();
    if !outline.is_empty() {
        println!();
        println!("{}", "Outline".cyan().bold());
        println!("{}", "─".repeat(40).dimmed());
        print_outline(&outline.items, 1);
    }

    println!();
    println!("{}", "Content Statistics".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());

    println!("{}: {}", "Paragraphs".bold(), stats.paragraph_count);
    println!("{}: {}", "Headings".bold(), stats.heading_count);
    println!("{}: {}", "Tables".bold(), stats.table_count);
    println!("{}: {}", "Images".bold(), stats.image_count);
    println!("{}: {}", "Words".bold(), stats.word_count);
    println!("{}: {}", "Characters".bold(), stats.char_count);

    Ok(())
}

fn print_outline(items: &[pageflow::model::OutlineItem], depth: usize) {
    for item in items {
        println!(
            "{}{} {}",
            "  ".repeat(depth),
            item.title,
            format!("(page {})", item.page).dimmed()
        );
        print_outline(&item.children, depth + 1);
    }
}

fn cmd_version() {
    println!("{} {}", "pageflow".cyan().bold(), env!("CARGO_PKG_VERSION"));
    println!("Paged document pagination tool");
    println!();
    println!("Repository: {}", "https://github.com/iyulab/pageflow".dimmed());
    println!("License: MIT");
}
