//! Report writers for every supported output format.

use colored::*;
use std::io::Write;

use crate::config::OutputFormat;
use crate::core::{AnalysisReport, Priority, Recommendation};

pub trait OutputWriter {
    fn write_report(&mut self, report: &AnalysisReport) -> anyhow::Result<()>;
}

/// Pick the writer for a format.
pub fn create_writer<W: Write + 'static>(
    format: OutputFormat,
    writer: W,
) -> Box<dyn OutputWriter> {
    match format {
        OutputFormat::Json => Box::new(JsonWriter::new(writer)),
        OutputFormat::Yaml => Box::new(YamlWriter::new(writer)),
        OutputFormat::Markdown => Box::new(MarkdownWriter::new(writer)),
        OutputFormat::Html => Box::new(HtmlWriter::new(writer)),
    }
}

pub struct JsonWriter<W: Write> {
    writer: W,
}

impl<W: Write> JsonWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }
}

impl<W: Write> OutputWriter for JsonWriter<W> {
    fn write_report(&mut self, report: &AnalysisReport) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(report)?;
        self.writer.write_all(json.as_bytes())?;
        writeln!(self.writer)?;
        Ok(())
    }
}

pub struct YamlWriter<W: Write> {
    writer: W,
}

impl<W: Write> YamlWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }
}

impl<W: Write> OutputWriter for YamlWriter<W> {
    fn write_report(&mut self, report: &AnalysisReport) -> anyhow::Result<()> {
        serde_yaml::to_writer(&mut self.writer, report)?;
        Ok(())
    }
}

pub struct MarkdownWriter<W: Write> {
    writer: W,
}

impl<W: Write> MarkdownWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    fn write_header(&mut self, report: &AnalysisReport) -> anyhow::Result<()> {
        writeln!(self.writer, "# Test Redundancy Report")?;
        writeln!(self.writer)?;
        writeln!(
            self.writer,
            "Generated: {}",
            report.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
        )?;
        writeln!(self.writer, "Algorithm: {}", report.algorithm)?;
        writeln!(self.writer)?;
        Ok(())
    }

    fn write_summary(&mut self, report: &AnalysisReport) -> anyhow::Result<()> {
        let m = &report.metrics;
        writeln!(self.writer, "## Summary")?;
        writeln!(self.writer)?;
        writeln!(self.writer, "| Metric | Value |")?;
        writeln!(self.writer, "|--------|-------|")?;
        writeln!(self.writer, "| Total tests | {} |", m.total_tests)?;
        writeln!(self.writer, "| Clusters found | {} |", m.clusters_found)?;
        writeln!(self.writer, "| Findings | {} |", m.redundancy_findings)?;
        writeln!(self.writer, "| Redundant tests | {} |", m.redundant_tests)?;
        writeln!(
            self.writer,
            "| Potential reduction | {:.2}% |",
            m.reduction_percentage
        )?;
        writeln!(self.writer)?;
        Ok(())
    }

    fn write_finding(&mut self, index: usize, rec: &Recommendation) -> anyhow::Result<()> {
        let f = &rec.finding;
        writeln!(
            self.writer,
            "### {}. Cluster {} — {} priority",
            index + 1,
            f.cluster_id,
            f.priority.display_name()
        )?;
        writeln!(self.writer)?;
        writeln!(self.writer, "{}", f.recommendation)?;
        writeln!(self.writer)?;
        writeln!(self.writer, "- **Keep:** `{}`", f.representative)?;
        for id in &f.redundant_tests {
            writeln!(self.writer, "- Remove: `{id}`")?;
        }
        writeln!(self.writer)?;
        writeln!(
            self.writer,
            "Score {:.2} | cluster size {} | saves {:.1}s | coverage overlap {:.0}%",
            f.redundancy_score,
            f.analysis.cluster_size,
            f.analysis.execution_time_saved_sec,
            f.analysis.coverage_overlap_pct
        )?;
        writeln!(self.writer)?;
        for bullet in &rec.rationale {
            writeln!(self.writer, "> {bullet}")?;
        }
        writeln!(self.writer)?;
        Ok(())
    }
}

impl<W: Write> OutputWriter for MarkdownWriter<W> {
    fn write_report(&mut self, report: &AnalysisReport) -> anyhow::Result<()> {
        self.write_header(report)?;
        self.write_summary(report)?;
        if report.recommendations.is_empty() {
            writeln!(self.writer, "No redundancy findings.")?;
            return Ok(());
        }
        writeln!(self.writer, "## Findings")?;
        writeln!(self.writer)?;
        for (i, rec) in report.recommendations.iter().enumerate() {
            self.write_finding(i, rec)?;
        }
        Ok(())
    }
}

pub struct HtmlWriter<W: Write> {
    writer: W,
}

impl<W: Write> HtmlWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    fn priority_class(priority: Priority) -> &'static str {
        match priority {
            Priority::High => "high",
            Priority::Medium => "medium",
            Priority::Low => "low",
        }
    }
}

impl<W: Write> OutputWriter for HtmlWriter<W> {
    fn write_report(&mut self, report: &AnalysisReport) -> anyhow::Result<()> {
        let m = &report.metrics;
        writeln!(self.writer, "<!DOCTYPE html>")?;
        writeln!(self.writer, "<html><head><meta charset=\"utf-8\">")?;
        writeln!(self.writer, "<title>Test Redundancy Report</title>")?;
        writeln!(
            self.writer,
            "<style>body{{font-family:sans-serif;margin:2em}}\
             .high{{color:#b00}}.medium{{color:#b60}}.low{{color:#666}}\
             table{{border-collapse:collapse}}td,th{{border:1px solid #ccc;padding:4px 8px}}</style>"
        )?;
        writeln!(self.writer, "</head><body>")?;
        writeln!(self.writer, "<h1>Test Redundancy Report</h1>")?;
        writeln!(
            self.writer,
            "<p>Generated {} — algorithm {}</p>",
            report.generated_at.format("%Y-%m-%d %H:%M:%S UTC"),
            html_escape::encode_text(&report.algorithm)
        )?;
        writeln!(
            self.writer,
            "<table><tr><th>Total tests</th><th>Clusters</th><th>Findings</th>\
             <th>Redundant tests</th><th>Reduction</th></tr>\
             <tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{:.2}%</td></tr></table>",
            m.total_tests,
            m.clusters_found,
            m.redundancy_findings,
            m.redundant_tests,
            m.reduction_percentage
        )?;

        for rec in &report.recommendations {
            let f = &rec.finding;
            writeln!(
                self.writer,
                "<h2 class=\"{}\">Cluster {} — {} priority</h2>",
                Self::priority_class(f.priority),
                f.cluster_id,
                f.priority.display_name()
            )?;
            writeln!(
                self.writer,
                "<p>{}</p>",
                html_escape::encode_text(&f.recommendation)
            )?;
            writeln!(
                self.writer,
                "<p>Keep <code>{}</code></p>",
                html_escape::encode_text(&f.representative)
            )?;
            writeln!(self.writer, "<ul>")?;
            for id in &f.redundant_tests {
                writeln!(
                    self.writer,
                    "<li>Remove <code>{}</code></li>",
                    html_escape::encode_text(id)
                )?;
            }
            writeln!(self.writer, "</ul>")?;
        }
        writeln!(self.writer, "</body></html>")?;
        Ok(())
    }
}

/// One-screen terminal summary printed after the report is written.
pub fn print_terminal_summary(report: &AnalysisReport) {
    let m = &report.metrics;
    eprintln!();
    eprintln!(
        "{} {} tests, {} clusters, {} findings",
        "Analysis complete:".bold(),
        m.total_tests,
        m.clusters_found,
        m.redundancy_findings
    );
    if m.redundant_tests > 0 {
        eprintln!(
            "{} {} redundant tests ({:.2}% of the suite)",
            "Potential reduction:".bold(),
            m.redundant_tests.to_string().red(),
            m.reduction_percentage
        );
    } else {
        eprintln!("{}", "No redundant tests detected.".green());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{
        FindingAnalysis, PotentialSavings, RecommendedAction, RedundancyFinding, RunMetrics,
    };

    fn sample_report() -> AnalysisReport {
        let finding = RedundancyFinding {
            cluster_id: 0,
            representative: "tests/AuthTest.php::testLogin".to_string(),
            redundant_tests: vec!["tests/AuthTest.php::testLoginAgain".to_string()],
            redundancy_score: 0.97,
            recommendation: "Remove 1 highly redundant tests (97% similar). Keep only the \
                             representative test for this functionality."
                .to_string(),
            priority: Priority::High,
            analysis: FindingAnalysis {
                avg_similarity: 0.97,
                cluster_size: 2,
                redundant_count: 1,
                execution_time_saved_sec: 0.1,
                coverage_overlap_pct: 100.0,
            },
        };
        AnalysisReport {
            generated_at: chrono::DateTime::from_timestamp(1_700_000_000, 0).unwrap(),
            algorithm: "dbscan".to_string(),
            metrics: RunMetrics {
                total_tests: 2,
                clusters_found: 1,
                redundancy_findings: 1,
                redundant_tests: 1,
                reduction_percentage: 50.0,
            },
            recommendations: vec![Recommendation {
                finding,
                action: RecommendedAction::Merge,
                rationale: vec!["Tests are 97% similar.".to_string()],
                numeric_priority: 123.4,
                potential_savings: PotentialSavings {
                    time_saved_ms: 100,
                    time_saved_sec: 0.1,
                    lines_reduction: 2,
                    test_count_reduction: 1,
                    percentage_reduction: 50.0,
                },
            }],
        }
    }

    #[test]
    fn test_json_writer_round_trips() {
        let mut buffer = Vec::new();
        JsonWriter::new(&mut buffer)
            .write_report(&sample_report())
            .unwrap();
        let parsed: AnalysisReport = serde_json::from_slice(&buffer).unwrap();
        assert_eq!(parsed.metrics.redundant_tests, 1);
        assert_eq!(parsed.recommendations.len(), 1);
    }

    #[test]
    fn test_markdown_contains_summary_and_finding() {
        let mut buffer = Vec::new();
        MarkdownWriter::new(&mut buffer)
            .write_report(&sample_report())
            .unwrap();
        let text = String::from_utf8(buffer).unwrap();
        assert!(text.contains("# Test Redundancy Report"));
        assert!(text.contains("| Total tests | 2 |"));
        assert!(text.contains("tests/AuthTest.php::testLogin"));
        assert!(text.contains("high priority"));
    }

    #[test]
    fn test_html_escapes_ids() {
        let mut report = sample_report();
        report.recommendations[0].finding.representative = "Weird<Test>::m".to_string();
        let mut buffer = Vec::new();
        HtmlWriter::new(&mut buffer).write_report(&report).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        assert!(text.contains("Weird&lt;Test&gt;::m"));
        assert!(!text.contains("Weird<Test>"));
    }

    #[test]
    fn test_yaml_writer_emits_document() {
        let mut buffer = Vec::new();
        YamlWriter::new(&mut buffer)
            .write_report(&sample_report())
            .unwrap();
        let text = String::from_utf8(buffer).unwrap();
        assert!(text.contains("redundant_tests"));
    }
}
