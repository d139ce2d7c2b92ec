//! # Tutor Harness CLI (`tutor`)
//!
//! The `tutor` binary is the primary interface for Tutor Harness. It ingests
//! documents into an in-memory knowledge base and answers questions about
//! them with grounded, cited responses.
//!
//! ## Usage
//!
//! ```bash
//! tutor --config ./config/tutor.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `tutor ask "<question>" --file <doc>` | Answer a question from the given documents |
//! | `tutor search "<query>" --file <doc>` | Print ranked passages for a query |
//! | `tutor chunks <doc>` | Show how a document would be chunked |
//! | `tutor quiz --file <doc>` | Generate a practice quiz from the documents |
//! | `tutor stats --file <doc>` | Ingest and print knowledge-base statistics |
//! | `tutor serve` | Start the JSON HTTP server |
//!
//! ## Examples
//!
//! ```bash
//! # Ask with a beginner-level explanation (the default)
//! tutor ask "What is Newton's first law?" --file physics.pdf
//!
//! # Ask for a technical explanation across several documents
//! tutor ask "How does inertia relate to mass?" \
//!     --file physics.pdf --file mechanics.pdf --level advanced
//!
//! # Inspect retrieval without calling the generation service
//! tutor search "conservation of momentum" --file physics.pdf
//!
//! # Start the HTTP server (knowledge base lives for the process)
//! tutor serve --config ./config/tutor.toml
//! ```

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use tutor_harness::config;
use tutor_harness::index::KnowledgeBase;
use tutor_harness::{chunk, compose, generate, ingest, serve};

/// Tutor Harness — a local-first document Q&A engine with lexical retrieval
/// and grounded, cited answers.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. See `config/tutor.example.toml` for a full example. When the file
/// does not exist, built-in defaults are used.
#[derive(Parser)]
#[command(
    name = "tutor",
    about = "Tutor Harness — answer questions from your documents with grounded citations",
    version,
    long_about = "Tutor Harness ingests PDF and plain-text documents into an in-memory \
    knowledge base of sentence-aligned chunks, ranks chunks against a question by lexical \
    overlap, and forwards the best passages to a text-generation service to produce an \
    answer grounded in the documents."
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/tutor.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Answer a question from the given documents.
    ///
    /// Ingests the documents, retrieves the most relevant passages, and
    /// makes a single generation call grounded in them. Requires a
    /// configured generation provider (e.g. `GOOGLE_AI_API_KEY` for the
    /// default `gemini` provider).
    Ask {
        /// The question to answer.
        question: String,

        /// Document file to ingest (PDF, .txt, .md). Repeatable.
        #[arg(long = "file", required = true)]
        files: Vec<PathBuf>,

        /// Explanation complexity: `beginner` or `advanced`.
        #[arg(long, default_value = "beginner")]
        level: String,
    },

    /// Print ranked passages for a query.
    ///
    /// Pure retrieval; no generation call is made. Useful for inspecting
    /// what context an `ask` would be grounded in.
    Search {
        /// The search query string.
        query: String,

        /// Document file to ingest (PDF, .txt, .md). Repeatable.
        #[arg(long = "file", required = true)]
        files: Vec<PathBuf>,

        /// Maximum number of passages to return.
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Show how a document would be chunked.
    ///
    /// Prints every chunk with its character length and sentence count.
    Chunks {
        /// Document file to inspect (PDF, .txt, .md).
        file: PathBuf,

        /// Override the configured chunk size (characters).
        #[arg(long)]
        chunk_size: Option<usize>,
    },

    /// Generate a practice quiz from the documents.
    Quiz {
        /// Document file to ingest (PDF, .txt, .md). Repeatable.
        #[arg(long = "file", required = true)]
        files: Vec<PathBuf>,

        /// Topic to focus the quiz on. Defaults to a broad sweep of the
        /// ingested material.
        #[arg(long)]
        topic: Option<String>,

        /// Number of questions to generate.
        #[arg(long, default_value_t = 5)]
        count: usize,
    },

    /// Ingest documents and print knowledge-base statistics.
    Stats {
        /// Document file to ingest (PDF, .txt, .md). Repeatable.
        #[arg(long = "file", required = true)]
        files: Vec<PathBuf>,
    },

    /// Start the JSON HTTP server.
    ///
    /// Binds to the address configured in `[server].bind` and holds the
    /// knowledge base in memory for the lifetime of the process.
    Serve,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Ask {
            question,
            files,
            level,
        } => {
            let kb = KnowledgeBase::new();
            ingest::ingest_files(&kb, &cfg, &files)?;

            let generator = generate::create_generator(&cfg.generation)?;
            let response =
                compose::generate_answer(&kb, generator.as_ref(), &question, &level).await?;

            println!();
            println!("{}", response.answer);

            if !response.sources.is_empty() {
                println!();
                println!("Sources:");
                for source in &response.sources {
                    println!(
                        "  {} (confidence {:.2}; terms: {})",
                        source.filename,
                        source.confidence,
                        source.matching_terms.join(", ")
                    );
                }
            }
        }

        Commands::Search {
            query,
            files,
            limit,
        } => {
            let kb = KnowledgeBase::new();
            ingest::ingest_files(&kb, &cfg, &files)?;

            let results = kb.search(&query, limit.unwrap_or(cfg.retrieval.max_results));
            if results.is_empty() {
                println!("No results.");
                return Ok(());
            }

            println!();
            for (i, result) in results.iter().enumerate() {
                println!(
                    "{}. [{:.2}] {} (chunk {})",
                    i + 1,
                    result.score,
                    result.filename,
                    result.ordinal_index
                );
                println!("    matching: {}", result.matching_tokens.join(", "));
                println!("    excerpt: \"{}\"", excerpt(&result.text));
                println!();
            }
        }

        Commands::Chunks { file, chunk_size } => {
            let text = ingest::load_text(&file)?;
            let size = chunk_size.unwrap_or(cfg.chunking.chunk_size);
            let records = chunk::chunk_text(&text, size, cfg.chunking.overlap);

            if records.is_empty() {
                println!("No chunks (document has no extractable text).");
                return Ok(());
            }

            for (i, record) in records.iter().enumerate() {
                println!(
                    "[chunk {}] {} chars, {} sentences",
                    i, record.length, record.sentence_count
                );
                println!("{}", record.text);
                println!();
            }
            println!("total: {} chunks", records.len());
        }

        Commands::Quiz {
            files,
            topic,
            count,
        } => {
            let kb = KnowledgeBase::new();
            ingest::ingest_files(&kb, &cfg, &files)?;

            let generator = generate::create_generator(&cfg.generation)?;
            let quiz =
                compose::generate_quiz(&kb, generator.as_ref(), topic.as_deref(), count).await?;

            println!();
            println!("{}", quiz.quiz);
            println!();
            println!("Built from: {}", quiz.source_documents.join(", "));
        }

        Commands::Stats { files } => {
            let kb = KnowledgeBase::new();
            ingest::ingest_files(&kb, &cfg, &files)?;

            let stats = kb.stats();
            println!();
            println!("Tutor Harness — Knowledge Base Stats");
            println!("====================================");
            println!();
            println!("  Documents:   {}", stats.document_count);
            println!("  Chunks:      {}", stats.chunk_count);
            println!();
            for doc in &stats.documents {
                println!(
                    "  {:<28} {:>4} chunks {:>8} chars",
                    doc.filename, doc.chunk_count, doc.total_chars
                );
            }
        }

        Commands::Serve => {
            serve::run_server(&cfg).await?;
        }
    }

    Ok(())
}

/// Single-line excerpt for search output.
fn excerpt(text: &str) -> String {
    const MAX: usize = 240;
    let flat = text.replace('\n', " ");
    if flat.chars().count() <= MAX {
        flat
    } else {
        let mut cut: String = flat.chars().take(MAX).collect();
        cut.push_str("...");
        cut
    }
}
