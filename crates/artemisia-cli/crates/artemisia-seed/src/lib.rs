use anyhow::{Context, Result};
use artemisia_catalog::Category;
use artemisia_context::project::SiteProject;
use console::style;
use dialoguer::Confirm;
use rust_xlsxwriter::Workbook;
use std::fs;
use std::path::Path;

/// Starter data for one category: header row and product rows.
pub struct SampleSheet {
    pub category: Category,
    pub headers: &'static [&'static str],
    pub rows: &'static [&'static [&'static str]],
}

/// Sheet name used in every generated workbook.
pub const SHEET_NAME: &str = "Products";

pub const SAMPLES: &[SampleSheet] = &[
    SampleSheet {
        category: Category::IrPellets,
        headers: &["Product Name", "Strength", "Description", "Mesh Size", "Status"],
        rows: &[
            &["Omeprazole IR Pellets", "20mg", "Immediate release pellets for acid reduction", "16-20", "Available"],
            &["Esomeprazole IR Pellets", "40mg", "Immediate release pellets for GERD treatment", "18-25", "Available"],
        ],
    },
    SampleSheet {
        category: Category::SrCrPrPellets,
        headers: &["Product Name", "Strength", "Description", "Release Profile", "Status"],
        rows: &[
            &["Tramadol SR Pellets", "100mg", "Sustained release pellets for pain management", "12 hours", "Available"],
            &["Metformin CR Pellets", "500mg", "Controlled release pellets for diabetes", "24 hours", "Available"],
        ],
    },
    SampleSheet {
        category: Category::EcDrPellets,
        headers: &["Product Name", "Strength", "Description", "Coating Type", "Status"],
        rows: &[
            &["Omeprazole EC Pellets", "20mg", "Enteric coated pellets for gastric protection", "Eudragit L30D-55", "Available"],
            &["Pantoprazole DR Pellets", "40mg", "Delayed release pellets for acid suppression", "Eudragit L100-55", "Available"],
        ],
    },
    SampleSheet {
        category: Category::Granules,
        headers: &["Product Name", "Strength", "Description", "Particle Size", "Status"],
        rows: &[
            &["Paracetamol Granules", "500mg", "High-quality granules for analgesic formulations", "200-400 microns", "Available"],
            &["Ibuprofen Granules", "200mg", "Anti-inflammatory granules", "250-500 microns", "Available"],
        ],
    },
    SampleSheet {
        category: Category::InertCorePellets,
        headers: &["Product Name", "Size Range", "Description", "Composition", "Status"],
        rows: &[
            &["Sugar Spheres NF", "16-20 mesh", "High-quality sugar spheres for coating", "Sucrose & Starch", "Available"],
            &["Microcrystalline Cellulose Spheres", "18-25 mesh", "MCC pellets for drug layering", "100% MCC", "Available"],
        ],
    },
];

/// Run the `artemisia seed` command in the current site.
pub fn run(force: bool) -> Result<()> {
    let project = SiteProject::load_cwd()?;
    let data_dir = project.data_dir();

    println!();
    println!("  {}", style("Writing sample product spreadsheets").bold().cyan());
    println!();

    let existing: Vec<String> = SAMPLES
        .iter()
        .map(|s| s.category.source_file_name())
        .filter(|f| data_dir.join(f).exists())
        .map(String::from)
        .collect();

    if !force && !existing.is_empty() {
        for file in &existing {
            println!("  {}  data/{}", style("!").yellow().bold(), file);
        }
        let overwrite = Confirm::new()
            .with_prompt(format!("  {}", style("Overwrite existing files?").bold()))
            .default(false)
            .interact()
            .context("Failed to read confirmation")?;
        if !overwrite {
            println!();
            println!("  {}", style("Nothing written.").dim());
            return Ok(());
        }
        println!();
    }

    let files = write_samples(&data_dir)?;
    for file in &files {
        println!("  {}  data/{}", style("+").green().bold(), style(file).dim());
    }

    println!();
    println!(
        "  {} Edit these files to add your actual product data.",
        style("Done.").green().bold()
    );
    println!();
    Ok(())
}

/// Write every sample workbook into `data_dir`, replacing existing files.
/// Returns the file names written.
pub fn write_samples(data_dir: &Path) -> Result<Vec<String>> {
    fs::create_dir_all(data_dir)
        .with_context(|| format!("Failed to create {}", data_dir.display()))?;

    let mut written = Vec::new();
    for sample in SAMPLES {
        let file = sample.category.source_file_name();
        write_sample(sample, &data_dir.join(file))
            .with_context(|| format!("Failed to write {file}"))?;
        written.push(file.to_string());
    }
    Ok(written)
}

fn write_sample(sample: &SampleSheet, path: &Path) -> Result<()> {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.set_name(SHEET_NAME)?;

    for (col, header) in sample.headers.iter().enumerate() {
        sheet.write_string(0, col as u16, *header)?;
    }
    for (row, values) in sample.rows.iter().enumerate() {
        for (col, value) in values.iter().enumerate() {
            sheet.write_string(row as u32 + 1, col as u16, *value)?;
        }
    }

    workbook.save(path)?;
    Ok(())
}
