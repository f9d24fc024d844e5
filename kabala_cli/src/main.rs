mod commands;
mod output;

use anyhow::Result;
use clap::Parser;

use crate::output::OutputFormat;

#[derive(Parser)]
#[command(name = "kabala-update")]
#[command(about = "Refresh KABALA city cost-of-living metrics and country inflation rates")]
struct Cli {
    /// Output format for the run summary: table or json
    #[arg(long, default_value = "table")]
    output: String,

    #[command(flatten)]
    update: commands::update::UpdateArgs,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("kabala_lib=info".parse()?)
                .add_directive("kabala_http=info".parse()?)
                .add_directive("kabala_cli=info".parse()?),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();

    let format = match cli.output.as_str() {
        "json" => OutputFormat::Json,
        _ => OutputFormat::Table,
    };

    commands::update::run(&cli.update, &format).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_parse() {
        let cli = Cli::try_parse_from([
            "kabala-update",
            "--city",
            "berlin",
            "--dry-run",
            "--resume",
            "--output",
            "json",
        ])
        .unwrap();
        assert_eq!(cli.update.city.as_deref(), Some("berlin"));
        assert!(cli.update.dry_run);
        assert!(cli.update.resume);
        assert!(!cli.update.inflation);
        assert_eq!(cli.output, "json");
    }

    #[test]
    fn defaults_without_flags() {
        let cli = Cli::try_parse_from(["kabala-update"]).unwrap();
        assert_eq!(cli.update.city, None);
        assert!(!cli.update.dry_run);
        assert_eq!(cli.update.cities_path, None);
        assert_eq!(cli.output, "table");
    }

    #[test]
    fn city_flag_requires_value() {
        assert!(Cli::try_parse_from(["kabala-update", "--city"]).is_err());
    }
}
