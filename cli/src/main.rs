//! docxstyle CLI - DOCX structure classification and formatting tool

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

use docxstyle::pipeline::download_name;
use docxstyle::{
    Classifier, DocxPackage, ElementKind, ExternalConverter, FormatRequest, HighlightPolicy,
    OpenOptions, PassthroughRefiner, Pipeline, StyleConfig,
};

#[derive(Parser)]
#[command(name = "docxstyle")]
#[command(author = "iyulab")]
#[command(version)]
#[command(about = "Classify DOCX structure and apply consistent styles", long_about = None)]
struct Cli {
    /// Input DOCX file
    #[arg(value_name = "FILE")]
    input: Option<PathBuf>,

    /// Output file
    #[arg(value_name = "OUTPUT")]
    output: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Format a document by structural kind
    Format {
        /// Input DOCX file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Output file (defaults to <name>_formatted.docx next to the input)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        #[command(flatten)]
        style: StyleArgs,
    },

    /// Print the classified elements as JSON
    Classify {
        /// Input DOCX file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Output file (stdout if not specified)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Include text snapshots
        #[arg(long)]
        text: bool,

        /// Output compact JSON
        #[arg(long)]
        compact: bool,
    },

    /// Show document information
    Info {
        /// Input DOCX file
        #[arg(value_name = "FILE")]
        input: PathBuf,
    },

    /// Show version information
    Version,
}

#[derive(Args, Default)]
struct StyleArgs {
    /// Style configuration as inline JSON or a path to a JSON file
    #[arg(long, value_name = "JSON", env = "DOCXSTYLE_CONFIG")]
    config: Option<String>,

    /// Title font family
    #[arg(long)]
    title_font: Option<String>,

    /// Title font size in points
    #[arg(long)]
    title_size: Option<u32>,

    /// Heading font family
    #[arg(long)]
    heading_font: Option<String>,

    /// Heading font size in points
    #[arg(long)]
    heading_size: Option<u32>,

    /// Body paragraph font family
    #[arg(long)]
    para_font: Option<String>,

    /// Body paragraph font size in points
    #[arg(long)]
    para_size: Option<u32>,

    /// Leave titles not bold
    #[arg(long)]
    no_bold_titles: bool,

    /// Do not highlight runs
    #[arg(long)]
    no_highlight: bool,

    /// Use the analyzer highlight colors
    #[arg(long)]
    analyzer_colors: bool,

    /// Image border width in points
    #[arg(long, value_name = "POINTS")]
    border_pt: Option<f64>,

    /// Office converter used to render a preview
    #[arg(long, value_name = "PROGRAM")]
    preview: Option<PathBuf>,

    /// Preview converter timeout in seconds
    #[arg(long, value_name = "SECS", default_value = "60")]
    preview_timeout: u64,
}

impl StyleArgs {
    fn to_config(&self) -> Result<StyleConfig, Box<dyn std::error::Error>> {
        let mut config = match &self.config {
            Some(value) if value.trim_start().starts_with('{') => StyleConfig::from_json(value)?,
            Some(path) => {
                log::debug!("Loading style configuration from {}", path);
                StyleConfig::from_json(&fs::read_to_string(path)?)?
            }
            None => StyleConfig::default(),
        };

        if let Some(font) = &self.title_font {
            config.title_font = font.clone();
        }
        if let Some(size) = self.title_size {
            config.title_size = size;
        }
        if let Some(font) = &self.heading_font {
            config.heading_font = font.clone();
        }
        if let Some(size) = self.heading_size {
            config.heading_size = size;
        }
        if let Some(font) = &self.para_font {
            config.para_font = font.clone();
        }
        if let Some(size) = self.para_size {
            config.para_size = size;
        }
        if self.no_bold_titles {
            config.bold_titles = false;
        }
        if self.no_highlight {
            config.highlight = false;
        }
        if self.analyzer_colors {
            config.highlight_colors = HighlightPolicy::analyzer();
        }
        if let Some(points) = self.border_pt {
            config.image_border_pt = points;
        }

        config.validate()?;
        Ok(config)
    }

    fn pipeline(&self) -> Pipeline {
        let pipeline = Pipeline::new();
        match &self.preview {
            Some(program) => pipeline
                .with_preview(
                    ExternalConverter::new()
                        .with_program(program)
                        .with_timeout(Duration::from_secs(self.preview_timeout)),
                )
                .with_refiner(PassthroughRefiner),
            None => pipeline,
        }
    }
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    let result = match cli.command {
        Some(Commands::Format {
            input,
            output,
            style,
        }) => cmd_format(&input, output.as_deref(), &style),
        Some(Commands::Classify {
            input,
            output,
            text,
            compact,
        }) => cmd_classify(&input, output.as_deref(), text, compact),
        Some(Commands::Info { input }) => cmd_info(&input),
        Some(Commands::Version) => {
            cmd_version();
            Ok(())
        }
        None => {
            // Default behavior: format if input is provided
            if let Some(input) = cli.input {
                cmd_format(&input, cli.output.as_deref(), &StyleArgs::default())
            } else {
                println!("{}", "Usage: docxstyle <FILE> [OUTPUT]".yellow());
                println!("       docxstyle --help for more information");
                Ok(())
            }
        }
    };

    if let Err(e) = result {
        eprintln!("{}: {}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

fn cmd_format(
    input: &Path,
    output: Option<&Path>,
    style: &StyleArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    let file_name = input
        .file_name()
        .unwrap_or_default()
        .to_string_lossy()
        .into_owned();
    let output_path = output
        .map(|p| p.to_path_buf())
        .unwrap_or_else(|| default_output_path(input));
    log::debug!("Formatting {} -> {}", input.display(), output_path.display());

    let pb = ProgressBar::new(3);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {msg}")
            .unwrap()
            .progress_chars("#>-"),
    );

    pb.set_message("Reading document...");
    let config = style.to_config()?;
    let request = FormatRequest::new(file_name, fs::read(input)?, config);
    pb.inc(1);

    pb.set_message("Formatting...");
    let response = style.pipeline().run(&request)?;
    pb.inc(1);

    pb.set_message("Writing output...");
    fs::write(&output_path, &response.data)?;
    pb.inc(1);

    pb.finish_with_message("Done!");

    let stats = &response.stats;
    println!("\n{}", "Formatting summary:".green().bold());
    println!("  {} {} elements", "├─".dimmed(), response.elements.len());
    println!(
        "  {} {} runs formatted, {} highlighted",
        "├─".dimmed(),
        stats.runs_formatted,
        stats.runs_highlighted
    );
    println!("  {} {} images bordered", "├─".dimmed(), stats.images_bordered);
    println!(
        "  {} {} tables formatted, {} skipped",
        "├─".dimmed(),
        stats.tables_formatted,
        stats.tables_skipped
    );
    println!("  {} {}", "└─".dimmed(), output_path.display());

    Ok(())
}

/// `<name>_formatted.docx` next to the input.
fn default_output_path(input: &Path) -> PathBuf {
    let file_name = input.file_name().unwrap_or_default().to_string_lossy();
    input
        .parent()
        .unwrap_or_else(|| Path::new("."))
        .join(download_name(&file_name))
}

fn cmd_classify(
    input: &Path,
    output: Option<&Path>,
    text: bool,
    compact: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let package = DocxPackage::open(input)?;
    let elements = Classifier::new().with_text(text).classify(package.document());

    let json = if compact {
        serde_json::to_string(&elements)?
    } else {
        serde_json::to_string_pretty(&elements)?
    };

    if let Some(path) = output {
        fs::write(path, &json)?;
        println!("{} {}", "Saved to".green(), path.display());
    } else {
        println!("{}", json);
    }

    Ok(())
}

fn cmd_info(input: &Path) -> Result<(), Box<dyn std::error::Error>> {
    // Lenient mode: show structure even if styles or properties are broken
    let package = DocxPackage::open_with_options(input, OpenOptions::new().lenient())?;
    let doc = package.document();
    let metadata = &doc.metadata;

    println!("{}", "Document Information".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());

    println!("{}: {}", "File".bold(), input.display());
    println!("{}: {}", "Main part".bold(), package.main_part());
    println!("{}: {}", "Parts".bold(), package.part_names().len());

    if let Some(ref title) = metadata.title {
        println!("{}: {}", "Title".bold(), title);
    }
    if let Some(ref author) = metadata.author {
        println!("{}: {}", "Author".bold(), author);
    }
    if let Some(ref last_modified_by) = metadata.last_modified_by {
        println!("{}: {}", "Last modified by".bold(), last_modified_by);
    }
    if let Some(revision) = metadata.revision {
        println!("{}: {}", "Revision".bold(), revision);
    }
    if let Some(ref created) = metadata.created {
        println!("{}: {}", "Created".bold(), created);
    }
    if let Some(ref modified) = metadata.modified {
        println!("{}: {}", "Modified".bold(), modified);
    }

    println!();
    println!("{}", "Structure".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());

    let elements = Classifier::new().classify(doc);
    let count = |kind: ElementKind| elements.iter().filter(|e| e.kind == kind).count();
    let text = doc.plain_text();

    println!("{}: {}", "Paragraphs".bold(), doc.paragraph_count());
    println!("{}: {}", "Titles".bold(), count(ElementKind::Title));
    println!("{}: {}", "Headings".bold(), count(ElementKind::Heading));
    println!("{}: {}", "Body paragraphs".bold(), count(ElementKind::Paragraph));
    println!("{}: {}", "Tables".bold(), doc.table_count());
    println!("{}: {}", "Images".bold(), doc.image_count());
    println!("{}: {}", "Words".bold(), text.split_whitespace().count());
    println!("{}: {}", "Styles".bold(), doc.styles().len());

    Ok(())
}

fn cmd_version() {
    println!("{} {}", "docxstyle".cyan().bold(), env!("CARGO_PKG_VERSION"));
    println!("DOCX structure classification and formatting tool");
    println!();
    println!("License: MIT");
}
