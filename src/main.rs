use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use serde_json::json;

use docx_rewrite::docx::edit::{self, Position, Target};
use docx_rewrite::docx::{comments, pictures, properties, search};
use docx_rewrite::model::Alignment;
use docx_rewrite::{Document, Error};

#[derive(Parser, Debug)]
#[command(name = "docx-rewrite")]
#[command(about = "Formatting-preserving edits and inspection of DOCX files", long_about = None)]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Replace text everywhere in the body, keeping run formatting
    Replace {
        file: PathBuf,
        #[arg(short, long)]
        search: String,
        #[arg(short, long)]
        replace: String,
        /// Write here instead of back to FILE
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Print all paragraph text
    Text { file: PathBuf },
    /// Core properties and statistics
    Info { file: PathBuf },
    /// Paragraph and table outline
    Structure { file: PathBuf },
    /// List comments
    Comments {
        file: PathBuf,
        /// Only comments by this author (case-insensitive)
        #[arg(long)]
        author: Option<String>,
        /// Only comments anchored in this paragraph
        #[arg(long)]
        paragraph: Option<usize>,
    },
    /// Find text, reporting paragraph and offset of every hit
    Find {
        file: PathBuf,
        #[arg(short, long)]
        text: String,
        #[arg(long)]
        ignore_case: bool,
        #[arg(long)]
        whole_word: bool,
    },
    /// Text and style of one paragraph
    Paragraph {
        file: PathBuf,
        #[arg(long)]
        index: usize,
    },
    /// Insert a paragraph next to an anchor paragraph
    InsertParagraph {
        file: PathBuf,
        #[command(flatten)]
        anchor: Anchor,
        #[arg(long)]
        text: String,
        /// Style name; defaults to the anchor's style
        #[arg(long)]
        style: Option<String>,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Insert a heading next to an anchor paragraph
    InsertHeading {
        file: PathBuf,
        #[command(flatten)]
        anchor: Anchor,
        #[arg(long)]
        text: String,
        /// Style name; defaults to "Heading 1"
        #[arg(long)]
        style: Option<String>,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Insert a numbered list next to an anchor paragraph
    InsertList {
        file: PathBuf,
        #[command(flatten)]
        anchor: Anchor,
        /// One list item; repeat for more
        #[arg(long = "item", required = true)]
        items: Vec<String>,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Delete everything under a heading, up to the next heading
    DeleteSection {
        file: PathBuf,
        #[arg(long)]
        heading: String,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Replace everything under a heading with new paragraphs
    ReplaceSection {
        file: PathBuf,
        #[arg(long)]
        heading: String,
        /// One new paragraph; repeat for more
        #[arg(long = "paragraph")]
        paragraphs: Vec<String>,
        #[arg(long)]
        style: Option<String>,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Replace everything between two anchor paragraphs with new paragraphs
    ReplaceBetween {
        file: PathBuf,
        #[arg(long)]
        start: String,
        /// Defaults to the next bold, all-caps or sized paragraph
        #[arg(long)]
        end: Option<String>,
        /// One new paragraph; repeat for more
        #[arg(long = "paragraph")]
        paragraphs: Vec<String>,
        #[arg(long)]
        style: Option<String>,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Inspect or edit pictures
    Pictures {
        #[command(subcommand)]
        action: PictureAction,
    },
    /// Apply a paragraph style by name
    Restyle {
        file: PathBuf,
        #[arg(long)]
        paragraph: usize,
        #[arg(long)]
        style: String,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

/// The paragraph an insertion is placed next to.
#[derive(Args, Debug)]
struct Anchor {
    /// Index of the anchor paragraph
    #[arg(long = "at", conflicts_with = "near", required_unless_present = "near")]
    at: Option<usize>,
    /// Anchor on the first paragraph containing this text
    #[arg(long)]
    near: Option<String>,
    /// Insert before the anchor instead of after it
    #[arg(long)]
    before: bool,
}

impl Anchor {
    fn target(&self) -> Target<'_> {
        match (self.at, &self.near) {
            (Some(index), _) => Target::Index(index),
            (None, Some(text)) => Target::Text(text),
            (None, None) => Target::Text(""),
        }
    }

    fn position(&self) -> Position {
        if self.before {
            Position::Before
        } else {
            Position::After
        }
    }
}

/// Which pictures a picture command applies to.
#[derive(Args, Debug)]
struct Selection {
    /// Picture index; repeat or comma-separate for several
    #[arg(
        long = "index",
        value_delimiter = ',',
        required_unless_present = "all",
        conflicts_with = "all"
    )]
    indices: Vec<usize>,
    /// Every picture in the document
    #[arg(long)]
    all: bool,
}

#[derive(Subcommand, Debug)]
enum PictureAction {
    List {
        file: PathBuf,
    },
    Resize {
        file: PathBuf,
        #[command(flatten)]
        selection: Selection,
        /// Width in inches
        #[arg(long)]
        width: Option<f64>,
        /// Height in inches
        #[arg(long)]
        height: Option<f64>,
        /// Do not derive the missing dimension from the aspect ratio
        #[arg(long)]
        no_keep_aspect: bool,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    Align {
        file: PathBuf,
        #[command(flatten)]
        selection: Selection,
        /// left, center, right or justify
        #[arg(long, value_parser = parse_alignment)]
        alignment: Alignment,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Align and/or resize the pictures within size bounds (inches)
    BySize {
        file: PathBuf,
        #[arg(long)]
        min_width: Option<f64>,
        #[arg(long)]
        max_width: Option<f64>,
        #[arg(long)]
        min_height: Option<f64>,
        #[arg(long)]
        max_height: Option<f64>,
        #[arg(long, value_parser = parse_alignment)]
        alignment: Option<Alignment>,
        /// New width in inches, aspect ratio kept
        #[arg(long)]
        width: Option<f64>,
        /// New height in inches, aspect ratio kept
        #[arg(long)]
        height: Option<f64>,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn parse_alignment(val: &str) -> Result<Alignment, String> {
    Alignment::parse(val)
        .ok_or_else(|| format!("invalid alignment '{val}', expected left, center, right or justify"))
}

fn save(doc: &mut Document, file: &Path, output: Option<&Path>) -> Result<PathBuf, Error> {
    let target = output.unwrap_or(file);
    doc.save(target)?;
    Ok(target.to_path_buf())
}

fn run(command: Command) -> Result<serde_json::Value, Error> {
    match command {
        Command::Replace {
            file,
            search,
            replace,
            output,
        } => {
            let target = output.unwrap_or_else(|| file.clone());
            let count = docx_rewrite::replace_in_file(&file, &target, &search, &replace)?;
            Ok(json!({
                "success": true,
                "replacements": count,
                "output": target.display().to_string(),
            }))
        }
        Command::Text { file } => {
            let doc = Document::open(&file)?;
            Ok(json!({ "success": true, "text": properties::extract_text(&doc) }))
        }
        Command::Info { file } => {
            let doc = Document::open(&file)?;
            Ok(json!({ "success": true, "properties": properties::properties(&doc) }))
        }
        Command::Structure { file } => {
            let doc = Document::open(&file)?;
            Ok(json!({ "success": true, "structure": properties::structure(&doc) }))
        }
        Command::Comments {
            file,
            author,
            paragraph,
        } => {
            let doc = Document::open(&file)?;
            let mut found = comments::extract_comments(&doc);
            if let Some(author) = author {
                found = comments::filter_by_author(found, &author);
            }
            if let Some(index) = paragraph {
                found = comments::for_paragraph(found, index);
            }
            Ok(json!({
                "success": true,
                "total_comments": found.len(),
                "comments": found,
            }))
        }
        Command::Pictures { action } => match action {
            PictureAction::List { file } => {
                let doc = Document::open(&file)?;
                let found = pictures::list_pictures(&doc);
                Ok(json!({
                    "success": true,
                    "total_pictures": found.len(),
                    "pictures": found,
                }))
            }
            PictureAction::Resize {
                file,
                selection,
                width,
                height,
                no_keep_aspect,
                output,
            } => {
                let mut doc = Document::open(&file)?;
                let keep_aspect = !no_keep_aspect;
                let result = match selection.indices.as_slice() {
                    _ if selection.all => json!(pictures::resize_all_pictures(
                        &mut doc,
                        width,
                        height,
                        keep_aspect
                    )?),
                    &[index] => json!(pictures::resize_picture(
                        &mut doc,
                        index,
                        width,
                        height,
                        keep_aspect
                    )?),
                    indices => json!(pictures::resize_pictures(
                        &mut doc,
                        indices,
                        width,
                        height,
                        keep_aspect
                    )?),
                };
                let target = save(&mut doc, &file, output.as_deref())?;
                Ok(json!({
                    "success": true,
                    "result": result,
                    "output": target.display().to_string(),
                }))
            }
            PictureAction::Align {
                file,
                selection,
                alignment,
                output,
            } => {
                let mut doc = Document::open(&file)?;
                let result = match selection.indices.as_slice() {
                    _ if selection.all => json!(pictures::align_all_pictures(&mut doc, alignment)),
                    &[index] => {
                        pictures::align_picture(&mut doc, index, alignment)?;
                        json!({ "index": index, "success": true })
                    }
                    indices => json!(pictures::align_pictures(&mut doc, indices, alignment)?),
                };
                let target = save(&mut doc, &file, output.as_deref())?;
                Ok(json!({
                    "success": true,
                    "alignment": alignment.as_jc(),
                    "result": result,
                    "output": target.display().to_string(),
                }))
            }
            PictureAction::BySize {
                file,
                min_width,
                max_width,
                min_height,
                max_height,
                alignment,
                width,
                height,
                output,
            } => {
                let mut doc = Document::open(&file)?;
                let filter = pictures::SizeFilter {
                    min_width,
                    max_width,
                    min_height,
                    max_height,
                };
                let batch =
                    pictures::process_pictures_by_size(&mut doc, &filter, alignment, width, height)?;
                let edited = !batch.aligned.is_empty() || !batch.resized.is_empty();
                let target = if edited {
                    Some(save(&mut doc, &file, output.as_deref())?.display().to_string())
                } else {
                    None
                };
                Ok(json!({
                    "success": true,
                    "pictures": batch,
                    "output": target,
                }))
            }
        },
        Command::Find {
            file,
            text,
            ignore_case,
            whole_word,
        } => {
            let doc = Document::open(&file)?;
            let hits = search::find_text(&doc, &text, !ignore_case, whole_word)?;
            Ok(json!({
                "success": true,
                "query": text,
                "total_count": hits.len(),
                "occurrences": hits,
            }))
        }
        Command::Paragraph { file, index } => {
            let doc = Document::open(&file)?;
            Ok(json!({ "success": true, "paragraph": search::paragraph_text(&doc, index)? }))
        }
        Command::InsertParagraph {
            file,
            anchor,
            text,
            style,
            output,
        } => {
            let mut doc = Document::open(&file)?;
            let index = edit::insert_paragraph(
                &mut doc,
                anchor.target(),
                anchor.position(),
                &text,
                style.as_deref(),
            )?;
            let target = save(&mut doc, &file, output.as_deref())?;
            Ok(json!({
                "success": true,
                "paragraph": index,
                "output": target.display().to_string(),
            }))
        }
        Command::InsertHeading {
            file,
            anchor,
            text,
            style,
            output,
        } => {
            let mut doc = Document::open(&file)?;
            let index = edit::insert_heading(
                &mut doc,
                anchor.target(),
                anchor.position(),
                &text,
                style.as_deref(),
            )?;
            let target = save(&mut doc, &file, output.as_deref())?;
            Ok(json!({
                "success": true,
                "paragraph": index,
                "output": target.display().to_string(),
            }))
        }
        Command::InsertList {
            file,
            anchor,
            items,
            output,
        } => {
            let mut doc = Document::open(&file)?;
            let index =
                edit::insert_numbered_list(&mut doc, anchor.target(), anchor.position(), &items)?;
            let target = save(&mut doc, &file, output.as_deref())?;
            Ok(json!({
                "success": true,
                "paragraph": index,
                "items": items.len(),
                "output": target.display().to_string(),
            }))
        }
        Command::DeleteSection {
            file,
            heading,
            output,
        } => {
            let mut doc = Document::open(&file)?;
            let removed = edit::delete_block_under_heading(&mut doc, &heading)?;
            let target = save(&mut doc, &file, output.as_deref())?;
            Ok(json!({
                "success": true,
                "removed": removed,
                "output": target.display().to_string(),
            }))
        }
        Command::ReplaceSection {
            file,
            heading,
            paragraphs,
            style,
            output,
        } => {
            let mut doc = Document::open(&file)?;
            let outcome =
                edit::replace_block_under_heading(&mut doc, &heading, &paragraphs, style.as_deref())?;
            let target = save(&mut doc, &file, output.as_deref())?;
            Ok(json!({
                "success": true,
                "result": outcome,
                "output": target.display().to_string(),
            }))
        }
        Command::ReplaceBetween {
            file,
            start,
            end,
            paragraphs,
            style,
            output,
        } => {
            let mut doc = Document::open(&file)?;
            let outcome = edit::replace_block_between_anchors(
                &mut doc,
                &start,
                end.as_deref(),
                &paragraphs,
                style.as_deref(),
            )?;
            let target = save(&mut doc, &file, output.as_deref())?;
            Ok(json!({
                "success": true,
                "result": outcome,
                "output": target.display().to_string(),
            }))
        }
        Command::Restyle {
            file,
            paragraph,
            style,
            output,
        } => {
            let mut doc = Document::open(&file)?;
            let target_paragraph = doc.paragraph(paragraph)?;
            doc.set_paragraph_style(target_paragraph, &style)?;
            let target = save(&mut doc, &file, output.as_deref())?;
            Ok(json!({
                "success": true,
                "paragraph": paragraph,
                "style": style,
                "output": target.display().to_string(),
            }))
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();

    let (value, code) = match run(cli.command) {
        Ok(value) => (value, ExitCode::SUCCESS),
        Err(e) => {
            log::debug!("{e:?}");
            (
                json!({ "success": false, "error": e.to_string() }),
                ExitCode::FAILURE,
            )
        }
    };
    match serde_json::to_string_pretty(&value) {
        Ok(text) => println!("{text}"),
        Err(e) => {
            eprintln!("Error: {e}");
            return ExitCode::FAILURE;
        }
    }
    code
}
