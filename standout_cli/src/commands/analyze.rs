use crate::cli::Cli;
use crate::commands::{CommandError, Result};
use crate::output::{format_output, ReportOutput, Theme};
use chrono::Utc;
use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;
use standout_core::{
    export_report, Analyzer, Annotator, Config, ConfigOverrides, GoogleSheetsClient,
    HeuristicAnnotator, ManualNotes, SheetsConfig, YouTubeClient,
};

fn spinner(message: &str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
        spinner.set_style(style);
    }
    spinner.set_message(message.to_string());
    spinner.enable_steady_tick(std::time::Duration::from_millis(100));
    spinner
}

async fn export(sheets: &SheetsConfig, report: &standout_core::AnalysisReport) -> Result<String> {
    let client = GoogleSheetsClient::new(sheets).map_err(|e| e.into_export())?;
    Ok(export_report(&client, report).await?)
}

pub async fn run(cli: &Cli) -> Result<()> {
    let overrides = ConfigOverrides {
        api_key: cli.api_key.clone(),
        spreadsheet_id: cli.spreadsheet_id.clone(),
        credentials_path: cli.credentials.clone(),
        skip_export: cli.no_export,
    };
    let config = Config::from_env(&overrides)?;
    tracing::debug!(
        export = config.sheets.is_some(),
        limit = cli.limit,
        top = cli.top,
        "Configuration loaded"
    );

    let annotator: Box<dyn Annotator> = match &cli.notes {
        Some(path) => Box::new(ManualNotes::load(path)?),
        None => Box::new(HeuristicAnnotator),
    };
    let analyzer = Analyzer::new(YouTubeClient::new(&config.youtube)?)
        .with_upload_limit(usize::from(cli.limit))
        .with_top_limit(usize::from(cli.top))
        .with_annotator(annotator);

    let theme = Theme::new(!cli.no_color && std::env::var_os("NO_COLOR").is_none());
    let machine = cli.output.is_machine();

    let progress = (!machine).then(|| spinner("Analysing channel uploads..."));
    let result = analyzer.analyze(&cli.url, Utc::now()).await;
    if let Some(p) = &progress {
        p.finish_and_clear();
    }
    let report = result?;

    let Some(sheets) = config.sheets.as_ref() else {
        format_output(&ReportOutput::new(&report), cli.output, &theme)?;
        return Ok(());
    };

    if machine {
        // Structured output is one document, export outcome included.
        let exported = export(sheets, &report).await;
        let mut out = ReportOutput::new(&report);
        match &exported {
            Ok(url) => out.spreadsheet_url = Some(url.clone()),
            Err(e) => out.export_error = Some(e.to_string()),
        }
        format_output(&out, cli.output, &theme)?;
        match exported {
            Ok(_) => Ok(()),
            Err(CommandError::Core(e)) => Err(CommandError::Reported(e)),
            Err(other) => Err(other),
        }
    } else {
        format_output(&ReportOutput::new(&report), cli.output, &theme)?;
        let progress = spinner("Writing spreadsheet...");
        let exported = export(sheets, &report).await;
        progress.finish_and_clear();
        let url = exported?;
        println!();
        println!("{} {}", "Spreadsheet updated:".style(theme.good), url);
        Ok(())
    }
}
