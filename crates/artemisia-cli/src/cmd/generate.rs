use anyhow::Result;
use artemisia_context::project::SiteProject;
use artemisia_context::settings::BuildSettings;
use artemisia_publish::generate_site;
use console::style;

pub fn run() -> Result<()> {
    let project = SiteProject::load_cwd()?;
    let settings = BuildSettings::from_env();

    println!();
    let report = generate_site(&project, &settings)?;

    for target in &report.written {
        println!("  {}  dist/{}", style("+").green().bold(), style(target).dim());
    }
    for template_id in &report.skipped {
        println!(
            "  {}  {} {}",
            style("-").yellow().bold(),
            template_id,
            style("(no view, skipped)").dim()
        );
    }

    println!();
    println!(
        "  {} Generated {} page(s) in dist/ and docs/ (version {})",
        style("Done.").green().bold(),
        report.written.len(),
        settings.version
    );
    println!();
    Ok(())
}
