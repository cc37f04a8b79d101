pub mod registry;
pub mod report;

pub use registry::{Registry, StoredCandidate, StoredCapability, WebsiteRecord};
pub use report::{ReportFormat, render, save_report};

use colored::Colorize;

pub fn print_banner() {
    let banner = r#"
        _ __
  _____(_) /____  ____ _____ ___  ______ ____
 / ___/ / __/ _ \/ __ `/ __ `/ / / / __ `/ _ \
(__  ) / /_/  __/ /_/ / /_/ / /_/ / /_/ /  __/
/____/_/\__/\___/\__, /\__,_/\__,_/\__, /\___/
                /____/            /____/
"#;
    println!("{}", banner.cyan());
    println!(
        "  {}",
        format!("sitegauge v{}", env!("CARGO_PKG_VERSION")).dimmed()
    );
    println!();
}
