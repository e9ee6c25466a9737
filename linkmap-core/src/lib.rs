pub mod crawl;
pub mod data;
pub mod query;

use colored::Colorize;

const BANNER: &str = r#"
 _ _       _
| (_)_ __ | | ___ __ ___   __ _ _ __
| | | '_ \| |/ / '_ ` _ \ / _` | '_ \
| | | | | |   <| | | | | | (_| | |_) |
|_|_|_| |_|_|\_\_| |_| |_|\__,_| .__/
                               |_|
"#;

/// Print the startup banner.
pub fn print_banner() {
    println!("{}", BANNER.bright_cyan());
    println!(
        "{}",
        format!("  v{} - who links to whom", env!("CARGO_PKG_VERSION")).bright_white()
    );
    println!();
}
