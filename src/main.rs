//! kniga - FB2 inspection CLI

use std::process::ExitCode;

use clap::Parser;

#[derive(Parser)]
#[command(name = "kniga")]
#[command(version, about = "Inspect FB2 books", long_about = None)]
#[command(after_help = "EXAMPLES:
    kniga book.fb2              Show title and section count
    kniga -H book.fb2           Also list section headings")]
struct Cli {
    /// Input FB2 file
    #[arg(value_name = "INPUT")]
    input: String,

    /// List section headings
    #[arg(short = 'H', long)]
    headings: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match show_info(&cli.input, cli.headings) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn show_info(path: &str, headings: bool) -> Result<(), kniga::ParseError> {
    let doc = kniga::read_fb2(path)?;

    println!("File: {path}");
    if let Some(ref title) = doc.title {
        println!("Title: {title}");
    }
    println!("Sections: {}", doc.sections.len());
    let paragraphs: usize = doc.sections.iter().map(|s| s.paragraphs.len()).sum();
    println!("Paragraphs: {paragraphs}");
    if let Some(ref cover) = doc.cover_image {
        println!("Cover: {} bytes", cover.len());
    }

    if headings {
        for section in &doc.sections {
            if let Some(ref heading) = section.heading {
                println!("  - {heading}");
            }
        }
    }

    Ok(())
}
