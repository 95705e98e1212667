use dvtag_adapters::{
    present_blocked, present_change, present_metadata, present_report_json,
    present_statistics_json, present_summary,
};
use dvtag_application::FileReport;
use dvtag_domain::RunStatistics;

#[derive(Debug, Clone, Copy, Default)]
pub struct OutputOptions {
    pub quiet: bool,
    pub verbose: bool,
    pub json: bool,
    pub apply: bool,
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct RenderedFile {
    pub stdout: Vec<String>,
    pub stderr: Vec<String>,
}

/// Blocked overrides and failures are shown even in quiet mode.
pub fn render_file(report: &FileReport, options: &OutputOptions) -> RenderedFile {
    let mut rendered = RenderedFile::default();
    if options.json {
        rendered.stdout.push(present_report_json(report));
        return rendered;
    }

    let chatty = !options.quiet;
    if chatty {
        rendered.stdout.push(report.path.display().to_string());
    }

    if let Some(failure) = &report.failure {
        rendered
            .stderr
            .push(format!("{}: {failure}", report.path.display()));
        return rendered;
    }

    if chatty && options.verbose {
        if let Some(metadata) = &report.metadata {
            rendered.stdout.extend(present_metadata(
                metadata,
                report.reconciliation.recorded_utc,
            ));
        }
    }

    if chatty {
        if let Some(error) = &report.tag_read_error {
            rendered
                .stdout
                .push(format!("  Tags cannot be read for this file: {error}"));
        }
        if report.tags.as_ref().is_some_and(|tags| !tags.writable) {
            rendered
                .stdout
                .push("  Tags are not writable for this file.".to_string());
        }
        for change in &report.reconciliation.changes {
            rendered.stdout.push(present_change(change, options.apply));
        }
    }

    for blocked in &report.reconciliation.blocked {
        rendered.stdout.push(present_blocked(blocked));
    }

    if report.outcome.tags_saved {
        rendered.stdout.push("  Tags saved.".to_string());
    }
    for error in &report.outcome.errors {
        rendered
            .stderr
            .push(format!("{}: {error}", report.path.display()));
    }

    rendered
}

pub fn render_summary(statistics: &RunStatistics, options: &OutputOptions) -> Vec<String> {
    if options.json {
        return vec![present_statistics_json(statistics)];
    }
    let mut lines = Vec::new();
    if !options.quiet {
        lines.push(String::new());
    }
    lines.extend(present_summary(statistics, options.apply));
    lines
}
