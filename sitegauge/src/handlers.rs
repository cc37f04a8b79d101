use clap::ArgMatches;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use sitegauge_analyzer::pipeline::{AnalysisOutcome, Analyzer};
use sitegauge_core::registry::Registry;
use sitegauge_core::report::{ReportFormat, render, save_report};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

// Helper functions shared by the analyze and batch handlers

/// Load URLs from either a file or a single URL argument
pub fn load_urls_from_source(
    url: Option<&Url>,
    hosts_file: Option<&PathBuf>,
) -> Result<Vec<String>, String> {
    if let Some(hosts_file_path) = hosts_file {
        load_urls_from_file(hosts_file_path)
    } else if let Some(url) = url {
        Ok(vec![url.as_str().to_string()])
    } else {
        Err("Either --url or --hosts-file must be provided".to_string())
    }
}

/// Load and parse URLs from a file
pub fn load_urls_from_file(path: &PathBuf) -> Result<Vec<String>, String> {
    let content = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read hosts file {}: {}", path.display(), e))?;

    let urls: Vec<String> = content
        .lines()
        .filter(|line| !line.trim().is_empty())
        .filter_map(|line| parse_url_line(line.trim()))
        .collect();

    if urls.is_empty() {
        return Err(format!("No valid URLs found in {}", path.display()));
    }

    Ok(urls)
}

/// Parse a single line as a URL, trying to add http:// if needed
pub fn parse_url_line(line: &str) -> Option<String> {
    if Url::parse(line).is_ok() {
        return Some(line.to_string());
    }

    let with_scheme = format!("http://{}", line);
    if Url::parse(&with_scheme).is_ok() {
        return Some(with_scheme);
    }

    None
}

fn registry_path(args: &ArgMatches) -> PathBuf {
    let raw = args
        .get_one::<String>("database")
        .map(|s| s.as_str())
        .unwrap_or("~/.config/sitegauge/sitegauge.db");
    PathBuf::from(shellexpand::tilde(raw).as_ref())
}

fn analysis_spinner(message: String) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg}")
            .unwrap(),
    );
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner.set_message(message);
    spinner
}

fn save_to_registry(db_path: &Path, config: &sitegauge_analyzer::config::SiteConfiguration) {
    if let Some(parent) = db_path.parent()
        && let Err(e) = fs::create_dir_all(parent)
    {
        eprintln!("{} {}", "[!] Could not create registry directory:".red(), e);
        return;
    }
    match Registry::new(db_path) {
        Ok(mut registry) => match registry.save_configuration(config) {
            Ok(id) => println!("{} {}", "Stored as".dimmed(), id.dimmed()),
            Err(e) => eprintln!("{} {}", "[!] Could not store configuration:".red(), e),
        },
        Err(e) => eprintln!("{} {}", "[!] Could not open registry:".red(), e),
    }
}

fn print_outcome_line(outcome: &AnalysisOutcome) {
    match outcome {
        AnalysisOutcome::Complete(config) => {
            println!(
                "  {} {} {} ({:.0}% confidence, {} candidates)",
                "ok".green(),
                config.source_url,
                config.detection.site_type.as_str().cyan(),
                config.detection.confidence * 100.0,
                config.candidates.len()
            );
        }
        AnalysisOutcome::Failed { url, error } => {
            println!("  {} {} ({})", "failed".red(), url, error);
        }
    }
}

// Subcommand handlers

pub fn handle_init(args: &ArgMatches) {
    let dir = args.get_one::<String>("PATH").unwrap();
    let force = args.get_flag("force");

    let expanded = shellexpand::tilde(dir);
    let registry_dir = Path::new(expanded.as_ref());
    let db_path = registry_dir.join("sitegauge.db");

    if Registry::exists(&db_path) && !force {
        println!("{}", "[WARNING] Registry already exists:".yellow());
        println!("  - Database: {}", db_path.display());
        println!("Re-run with --force to overwrite it.");
        return;
    }

    if let Err(e) = fs::create_dir_all(registry_dir) {
        eprintln!("{} {}", "[!] Could not create directory:".red(), e);
        return;
    }
    if Registry::exists(&db_path) {
        Registry::drop(&db_path);
    }

    match Registry::new(&db_path) {
        Ok(_) => println!("{} {}", "Registry initialized at".green(), db_path.display()),
        Err(e) => eprintln!("{} {}", "[!] Could not create registry:".red(), e),
    }
}

pub async fn handle_analyze(args: &ArgMatches) {
    let url = args.get_one::<Url>("url").unwrap();
    let depth = *args.get_one::<usize>("depth").unwrap();
    let allowed: Vec<String> = args
        .get_many::<String>("allow-domain")
        .map(|values| values.cloned().collect())
        .unwrap_or_default();
    let format_name = args.get_one::<String>("format").unwrap();
    let Some(format) = ReportFormat::from_str(format_name) else {
        eprintln!("{} {}", "[!] Unknown report format:".red(), format_name);
        std::process::exit(2);
    };

    let spinner = analysis_spinner(format!("Analyzing {}", url));

    let analyzer = Analyzer::over_http()
        .with_max_depth(depth)
        .with_allowed_domains(allowed);

    match analyzer.analyze(url.as_str()).await {
        Ok(AnalysisOutcome::Complete(config)) => {
            spinner.finish_and_clear();
            print_outcome_line(&AnalysisOutcome::Complete(config.clone()));

            if !args.get_flag("no-save") {
                save_to_registry(&registry_path(args), &config);
            }

            if let Some(output) = args.get_one::<String>("output") {
                let path = PathBuf::from(shellexpand::tilde(output).as_ref());
                match save_report(&config, &format, &path) {
                    Ok(()) => println!("Report written to {}", path.display()),
                    Err(e) => eprintln!("{} {}", "[!] Could not write report:".red(), e),
                }
            } else {
                println!("{}", render(&config, &format));
            }
        }
        Ok(outcome @ AnalysisOutcome::Failed { .. }) => {
            spinner.finish_and_clear();
            print_outcome_line(&outcome);
            std::process::exit(1);
        }
        Err(e) => {
            spinner.finish_and_clear();
            eprintln!("{} {}", "[!] Analysis aborted:".red(), e);
            std::process::exit(1);
        }
    }
}

pub async fn handle_batch(args: &ArgMatches) {
    let hosts_file = args.get_one::<PathBuf>("hosts-file").unwrap();
    let depth = *args.get_one::<usize>("depth").unwrap();
    let workers = *args.get_one::<usize>("workers").unwrap();

    let urls = match load_urls_from_file(hosts_file) {
        Ok(urls) => urls,
        Err(e) => {
            eprintln!("{} {}", "[!]".red(), e);
            std::process::exit(2);
        }
    };

    let spinner = analysis_spinner(format!(
        "Analyzing {} sites with {} workers",
        urls.len(),
        workers
    ));

    let analyzer = Analyzer::over_http().with_max_depth(depth);
    let outcomes = match analyzer.analyze_many(&urls, workers).await {
        Ok(outcomes) => outcomes,
        Err(e) => {
            spinner.finish_and_clear();
            eprintln!("{} {}", "[!] Batch aborted:".red(), e);
            std::process::exit(1);
        }
    };
    spinner.finish_and_clear();

    let mut completed = 0usize;
    for outcome in &outcomes {
        print_outcome_line(outcome);
        if let AnalysisOutcome::Complete(config) = outcome {
            completed += 1;
            if !args.get_flag("no-save") {
                save_to_registry(&registry_path(args), config);
            }
        }
    }

    println!(
        "\n{} {}/{} sites configured",
        "Done:".bold(),
        completed,
        outcomes.len()
    );
}

pub fn handle_sites_list(args: &ArgMatches) {
    let db_path = registry_path(args);
    if !Registry::exists(&db_path) {
        println!("No registry found at {}. Run `sitegauge init` first.", db_path.display());
        return;
    }

    let registry = match Registry::new(&db_path) {
        Ok(registry) => registry,
        Err(e) => {
            eprintln!("{} {}", "[!] Could not open registry:".red(), e);
            std::process::exit(1);
        }
    };

    match registry.list_websites() {
        Ok(websites) => {
            if websites.is_empty() {
                println!("Registry is empty.");
                return;
            }
            for site in websites {
                println!(
                    "  {:>4.0}% {:<14} {}  {}",
                    site.confidence * 100.0,
                    site.site_type.as_str().cyan(),
                    site.base_url,
                    site.name.unwrap_or_default().dimmed()
                );
            }
        }
        Err(e) => eprintln!("{} {}", "[!] Could not list websites:".red(), e),
    }
}

pub fn handle_sites_show(args: &ArgMatches) {
    let base_url = args.get_one::<String>("URL").unwrap();
    let db_path = registry_path(args);
    if !Registry::exists(&db_path) {
        println!("No registry found at {}. Run `sitegauge init` first.", db_path.display());
        return;
    }

    let registry = match Registry::new(&db_path) {
        Ok(registry) => registry,
        Err(e) => {
            eprintln!("{} {}", "[!] Could not open registry:".red(), e);
            std::process::exit(1);
        }
    };

    let record = match registry.find_by_url(base_url) {
        Ok(Some(record)) => record,
        Ok(None) => {
            println!("No stored configuration for {}", base_url);
            return;
        }
        Err(e) => {
            eprintln!("{} {}", "[!] Lookup failed:".red(), e);
            std::process::exit(1);
        }
    };

    println!("{}", record.base_url.bold());
    if let Some(name) = &record.name {
        println!("  Name:       {}", name);
    }
    println!("  Domain:     {}", record.domain);
    println!(
        "  Type:       {} ({:.0}% confidence)",
        record.site_type.as_str().cyan(),
        record.confidence * 100.0
    );
    if let Some(description) = &record.description {
        println!("  About:      {}", description);
    }
    println!("  Analyzed:   {}", record.analyzed_at);

    if let Ok(capabilities) = registry.capabilities_for(&record.id) {
        println!("  Capabilities:");
        for capability in capabilities {
            println!(
                "    {} {:<14} {:.2}",
                if capability.enabled { "[x]" } else { "[ ]" },
                capability.kind.as_str(),
                capability.confidence
            );
        }
    }

    if let Ok(candidates) = registry.candidates_for(&record.id) {
        println!("  Candidate URLs ({}):", candidates.len());
        for candidate in candidates.iter().take(15) {
            println!("    {:.2} {}", candidate.score, candidate.url);
        }
    }
}
