use crate::model::{AffectedEntry, Finding, ProjectReport, ScanReport, Severity};
use anyhow::Result;
use tabled::{settings::Style, Table, Tabled};

#[derive(Tabled)]
struct VulnRow {
    #[tabled(rename = "Severity")]
    severity: String,
    #[tabled(rename = "Package")]
    package: String,
    #[tabled(rename = "Declared")]
    declared: String,
    #[tabled(rename = "Bad Version")]
    malicious: String,
    #[tabled(rename = "Match")]
    match_type: String,
}

#[derive(Tabled)]
struct AffectedRow {
    #[tabled(rename = "Package")]
    package: String,
    #[tabled(rename = "Declared")]
    declared: String,
    #[tabled(rename = "Locked")]
    locked: String,
    #[tabled(rename = "Known Bad Versions")]
    malicious: String,
}

pub fn print_cli_table(report: &ScanReport) -> Result<()> {
    println!();
    println!(
        "Scan completed at: {}",
        report.scan_time.format("%Y-%m-%d %H:%M:%S UTC")
    );

    if report.projects.is_empty() {
        println!();
        println!("No projects found.");
    }

    for project in &report.projects {
        print_project(project);
    }

    println!();
    print_summary(report);

    Ok(())
}

fn print_project(project: &ProjectReport) {
    println!();
    println!("{}", project.manifest_path.display());

    if let Some(error) = &project.error {
        println!("  \x1b[31mskipped:\x1b[0m {}", error);
        return;
    }

    let classification = &project.classification;
    if classification.is_clean() {
        println!("  No known-bad packages.");
        return;
    }

    if !classification.vulnerabilities.is_empty() {
        println!();
        println!(
            "  Found {} vulnerable dependencies:",
            classification.vulnerabilities.len()
        );

        let mut findings: Vec<&Finding> = classification.vulnerabilities.iter().collect();
        // High first; the sort is stable so list order survives within a severity.
        findings.sort_by(|a, b| b.severity.cmp(&a.severity));

        let rows: Vec<VulnRow> = findings
            .iter()
            .map(|f| VulnRow {
                severity: format_severity(&f.severity),
                package: truncate(&f.package, 40),
                declared: truncate(&f.declared_version, 24),
                malicious: f.malicious_version.clone(),
                match_type: f.match_type.to_string(),
            })
            .collect();

        let table = Table::new(rows).with(Style::rounded()).to_string();
        println!("{}", table);
    }

    if !classification.affected_packages.is_empty() {
        println!();
        println!(
            "  Depends on {} packages with known-bad versions (not currently selected):",
            classification.affected_packages.len()
        );

        let rows: Vec<AffectedRow> = classification
            .affected_packages
            .iter()
            .map(affected_row)
            .collect();

        let table = Table::new(rows).with(Style::rounded()).to_string();
        println!("{}", table);
    }
}

fn affected_row(entry: &AffectedEntry) -> AffectedRow {
    AffectedRow {
        package: truncate(&entry.package, 40),
        declared: truncate(&entry.declared_version, 24),
        locked: entry
            .locked_version
            .clone()
            .unwrap_or_else(|| "-".to_string()),
        malicious: truncate(&entry.malicious_versions.join(", "), 50),
    }
}

fn format_severity(severity: &Severity) -> String {
    match severity {
        Severity::High => "\x1b[91mHIGH\x1b[0m".to_string(),
        Severity::Medium => "\x1b[33mMEDIUM\x1b[0m".to_string(),
    }
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", cut)
    }
}

fn print_summary(report: &ScanReport) {
    let count = |severity: Severity| {
        report
            .projects
            .iter()
            .flat_map(|p| &p.classification.vulnerabilities)
            .filter(|f| f.severity == severity)
            .count()
    };

    println!("Summary:");
    println!("  Projects scanned: {}", report.projects.len());
    if report.failed_projects() > 0 {
        println!("  Projects skipped: {}", report.failed_projects());
    }
    println!(
        "  Vulnerable dependencies: {} ({} high, {} medium)",
        report.total_vulnerabilities(),
        count(Severity::High),
        count(Severity::Medium)
    );
    println!("  Affected dependencies: {}", report.total_affected());
}
