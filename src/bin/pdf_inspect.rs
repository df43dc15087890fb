//! Debug tool listing the images a PDF carries
//! Run with: cargo run --bin pdf_inspect -- file.pdf

use anyhow::{Context, Result};
use clap::Parser;
use std::collections::BTreeSet;
use std::path::PathBuf;

use pdf_compressor::pdf::{collect_images, has_metadata, image_info, load_document, page_images};
use pdf_compressor::report::format_file_size;

#[derive(Parser, Debug)]
#[command(name = "pdf_inspect", about = "Print page count, metadata and images of a PDF")]
struct Args {
    /// PDF file to inspect
    input: PathBuf,
}

fn main() -> Result<()> {
    let args = Args::parse();
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Warn)
        .parse_default_env()
        .init();

    let doc = load_document(&args.input)
        .with_context(|| format!("Failed to load {}", args.input.display()))?;
    let pages = doc.get_pages();

    println!("File:     {}", args.input.display());
    println!("Version:  {}", doc.version);
    println!("Pages:    {}", pages.len());
    println!("Metadata: {}", if has_metadata(&doc) { "yes" } else { "no" });

    let mut on_pages: BTreeSet<_> = BTreeSet::new();
    for (number, page_id) in &pages {
        let ids = page_images(&doc, *page_id);
        if !ids.is_empty() {
            let list: Vec<String> = ids.iter().map(|id| format!("{} {}", id.0, id.1)).collect();
            println!("Page {:>4}: {}", number, list.join(", "));
        }
        on_pages.extend(ids);
    }

    let images = collect_images(&doc);
    println!();
    println!(
        "{:>8}  {:<9} {:>11} {:>4}  {:<14} {:<16} {:>10}",
        "Object", "Role", "Size", "BPC", "Color space", "Filters", "Bytes"
    );

    let mut total = 0usize;
    for image in &images {
        let Some(info) = image_info(&doc, image.id) else {
            continue;
        };
        total += info.size_bytes;
        let marker = if on_pages.contains(&info.id) { "" } else { " *" };
        println!(
            "{:>8}  {:<9} {:>11} {:>4}  {:<14} {:<16} {:>10}{}",
            format!("{} {}", info.id.0, info.id.1),
            format!("{:?}", info.role),
            format!("{}x{}", info.width, info.height),
            info.bits_per_component
                .map(|b| b.to_string())
                .unwrap_or_else(|| "-".to_string()),
            info.color_space,
            if info.filters.is_empty() {
                "-".to_string()
            } else {
                info.filters.join(" ")
            },
            info.size_bytes,
            marker
        );
    }

    println!();
    println!(
        "{} images, {} of image data (* = not drawn directly on a page)",
        images.len(),
        format_file_size(total as u64)
    );

    Ok(())
}
