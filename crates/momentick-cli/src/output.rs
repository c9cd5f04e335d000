use std::io::Write;

use momentick_core::{ConstituentRecord, IndexSpec, PresentationFrame, PriceHistory, UtcDateTime};
use serde::Serialize;

use crate::cli::OutputFormat;
use crate::error::CliError;

const NAME_WIDTH: usize = 24;

/// One code passed through symbol resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Resolution {
    pub code: String,
    pub symbol: Option<String>,
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum Report<'a> {
    Indices(&'a [IndexSpec]),
    Universe {
        index: &'a str,
        constituents: &'a [ConstituentRecord],
    },
    Resolutions(&'a [Resolution]),
    Frames(&'a [PresentationFrame]),
    History(&'a PriceHistory),
}

pub fn render(
    report: &Report<'_>,
    format: OutputFormat,
    pretty: bool,
    out: &mut impl Write,
) -> Result<(), CliError> {
    match format {
        OutputFormat::Json => {
            let payload = if pretty {
                serde_json::to_string_pretty(report)?
            } else {
                serde_json::to_string(report)?
            };
            writeln!(out, "{payload}")?;
        }
        OutputFormat::Table => render_table(report, out)?,
    }
    out.flush()?;
    Ok(())
}

fn render_table(report: &Report<'_>, out: &mut impl Write) -> Result<(), CliError> {
    match report {
        Report::Indices(indices) => {
            writeln!(out, "{:<12} FAMILY", "INDEX")?;
            for spec in *indices {
                writeln!(out, "{:<12} {}", spec.name, spec.family)?;
            }
        }
        Report::Universe {
            index,
            constituents,
        } => {
            writeln!(out, "{index}: {} constituents", constituents.len())?;
            writeln!(out, "{:<8} {:<NAME_WIDTH$} {:>8}", "CODE", "NAME", "WEIGHT")?;
            for record in *constituents {
                writeln!(
                    out,
                    "{:<8} {:<NAME_WIDTH$} {:>8.2}",
                    record.code(),
                    truncate(record.name()),
                    record.weight()
                )?;
            }
        }
        Report::Resolutions(resolutions) => {
            for resolution in *resolutions {
                match (&resolution.symbol, &resolution.error) {
                    (Some(symbol), _) => writeln!(out, "{:<8} -> {symbol}", resolution.code)?,
                    (None, Some(error)) => writeln!(out, "{:<8} !! {error}", resolution.code)?,
                    (None, None) => writeln!(out, "{:<8} -> ?", resolution.code)?,
                }
            }
        }
        Report::Frames(frames) => {
            for (position, frame) in frames.iter().enumerate() {
                if position > 0 {
                    writeln!(out)?;
                }
                render_frame(frame, out)?;
            }
        }
        Report::History(history) => render_history(history, out)?,
    }
    Ok(())
}

fn render_history(history: &PriceHistory, out: &mut impl Write) -> Result<(), CliError> {
    writeln!(out, "{}", history.title)?;
    writeln!(
        out,
        "sessions: {}  shown: {}",
        history.sessions,
        history.points.len()
    )?;
    writeln!(
        out,
        "{:<10} {:>10} {:>10} {:>12} {:>10} {:>10} {:>10}",
        "DATE", "OPEN", "CLOSE", "VOLUME", "EMA_20", "EMA_50", "EMA_200"
    )?;
    for point in &history.points {
        writeln!(
            out,
            "{:<10} {:>10.2} {:>10.2} {:>12} {:>10.2} {:>10.2} {:>10.2}",
            point.date.date(),
            point.open,
            point.close,
            point.volume,
            point.ema_20,
            point.ema_50,
            point.ema_200,
        )?;
    }
    Ok(())
}

fn render_frame(frame: &PresentationFrame, out: &mut impl Write) -> Result<(), CliError> {
    writeln!(out, "{}", frame.title)?;
    writeln!(
        out,
        "mode: {}  baseline: {}  intraday: {}  x-axis: {}",
        serde_json::to_value(frame.mode)?.as_str().unwrap_or("-"),
        stamp(frame.last_baseline_at),
        stamp(frame.last_intraday_at),
        serde_json::to_value(frame.x_axis)?.as_str().unwrap_or("-"),
    )?;
    writeln!(
        out,
        "{:<8} {:<NAME_WIDTH$} {:>7} {:>9} {:>9}  {:<8} STATUS",
        "CODE", "NAME", "WEIGHT", "PCT_CHG", "VOL_RATIO", "BUCKET"
    )?;
    for row in &frame.rows {
        let status = match row.unavailable_reason {
            Some(reason) => reason.as_str(),
            None => "complete",
        };
        writeln!(
            out,
            "{:<8} {:<NAME_WIDTH$} {:>7.2} {:>9} {:>9}  {:<8} {status}",
            row.code,
            truncate(&row.name),
            row.weight,
            row.pct_change
                .map(|value| format!("{value:+.2}"))
                .unwrap_or_else(|| String::from("-")),
            row.volume_ratio
                .map(|value| format!("{value:.2}"))
                .unwrap_or_else(|| String::from("-")),
            row.bucket.label(),
        )?;
    }

    let counts = frame
        .bucket_counts()
        .iter()
        .map(|(bucket, count)| format!("{}={count}", bucket.label()))
        .collect::<Vec<_>>()
        .join(" ");
    writeln!(out, "buckets: {counts}")?;
    Ok(())
}

fn stamp(value: Option<UtcDateTime>) -> String {
    value
        .map(UtcDateTime::format_rfc3339)
        .unwrap_or_else(|| String::from("-"))
}

fn truncate(name: &str) -> String {
    if name.chars().count() <= NAME_WIDTH {
        return name.to_owned();
    }
    let mut short: String = name.chars().take(NAME_WIDTH - 1).collect();
    short.push('~');
    short
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use momentick_core::{DailyBar, EngineConfig, MomentumEngine, StaticGateway, SymbolFamily};

    async fn frame() -> PresentationFrame {
        let history: Vec<DailyBar> = (0..12)
            .map(|day| {
                let date = UtcDateTime::from_unix_timestamp(1_704_067_200 + day * 86_400)
                    .expect("valid timestamp");
                let (close, volume) = match day {
                    9 => (100.0, 100),
                    10 => (105.0, 150),
                    _ => (100.0, 100),
                };
                DailyBar::new(date, close, close, volume).expect("valid bar")
            })
            .collect();
        let gateway = StaticGateway::new().with_history("0005.HK", history);
        let engine =
            MomentumEngine::new(Arc::new(gateway), EngineConfig::default()).expect("valid config");
        let records = [
            ConstituentRecord::new("5", "HSBC Holdings", 8.21).expect("valid"),
            ConstituentRecord::new("12345", "Too Long Code Holdings Limited", 1.0).expect("valid"),
        ];
        let set = engine
            .load_baseline("HSI", SymbolFamily::Numeric, &records)
            .await;
        PresentationFrame::from_set(&set)
    }

    #[tokio::test]
    async fn table_shows_metrics_and_neutral_rows() {
        let frame = frame().await;
        let mut out = Vec::new();
        render(&Report::Frames(&[frame]), OutputFormat::Table, false, &mut out).expect("render");
        let text = String::from_utf8(out).expect("utf8");

        assert!(text.starts_with("HSI Volume Ratio: Today VS.10 Days Average\n"));
        assert!(text.contains("mode: baseline_ready"));
        let hsbc = text.lines().find(|line| line.starts_with("5 ")).expect("HSBC row");
        assert!(hsbc.contains("+5.00"));
        assert!(hsbc.contains("1.50"));
        assert!(hsbc.contains(">1"));
        let rejected = text.lines().find(|line| line.starts_with("12345")).expect("rejected row");
        assert!(rejected.contains("Too Long Code Holdings ~"));
        assert!(rejected.ends_with("invalid_symbol"));
        assert!(text.contains("buckets: >1=1 neutral=1"));
    }

    #[tokio::test]
    async fn json_keeps_rows_in_order() {
        let frame = frame().await;
        let mut out = Vec::new();
        render(&Report::Frames(&[frame]), OutputFormat::Json, false, &mut out).expect("render");
        let value: serde_json::Value = serde_json::from_slice(&out).expect("json");

        let rows = value[0]["rows"].as_array().expect("rows");
        assert_eq!(rows[0]["code"], "5");
        assert_eq!(rows[0]["pct_change"], 5.0);
        assert_eq!(rows[0]["bucket"], "above_one");
        assert_eq!(rows[1]["volume_ratio"], serde_json::Value::Null);
        assert_eq!(value[0]["x_axis"], "log");
    }

    #[test]
    fn resolutions_show_symbol_or_error() {
        let resolutions = [
            Resolution {
                code: String::from("5"),
                symbol: Some(String::from("0005.HK")),
                error: None,
            },
            Resolution {
                code: String::from("12345"),
                symbol: None,
                error: Some(String::from("too long")),
            },
        ];
        let mut out = Vec::new();
        render(&Report::Resolutions(&resolutions), OutputFormat::Table, false, &mut out)
            .expect("render");
        let text = String::from_utf8(out).expect("utf8");
        assert_eq!(text, "5        -> 0005.HK\n12345    !! too long\n");
    }

    fn price_history() -> PriceHistory {
        let bars: Vec<DailyBar> = [10.0, 31.0]
            .into_iter()
            .enumerate()
            .map(|(day, close)| {
                let date = UtcDateTime::from_unix_timestamp(1_704_153_600 + day as i64 * 86_400)
                    .expect("valid timestamp");
                DailyBar::new(date, close, close, 1_000).expect("valid bar")
            })
            .collect();
        let symbol = SymbolFamily::Numeric.resolve("700").expect("valid symbol");
        PriceHistory::from_bars(&symbol, &bars, bars[1].date)
    }

    #[test]
    fn history_table_lists_sessions_with_averages() {
        let history = price_history();
        let mut out = Vec::new();
        render(&Report::History(&history), OutputFormat::Table, false, &mut out).expect("render");
        let text = String::from_utf8(out).expect("utf8");

        let mut lines = text.lines();
        assert_eq!(lines.next(), Some("0700.HK Stock Price and EMA 20/50/200"));
        assert_eq!(lines.next(), Some("sessions: 2  shown: 2"));
        let last = text.lines().last().expect("row");
        assert!(last.starts_with("2024-01-03"));
        assert!(last.ends_with("12.00      10.82      10.21"));
    }

    #[test]
    fn history_json_carries_ema_fields() {
        let history = price_history();
        let mut out = Vec::new();
        render(&Report::History(&history), OutputFormat::Json, false, &mut out).expect("render");
        let value: serde_json::Value = serde_json::from_slice(&out).expect("json");

        assert_eq!(value["symbol"], "0700.HK");
        assert_eq!(value["points"][1]["close"], 31.0);
        assert_eq!(value["points"][1]["ema_20"], 12.0);
        assert_eq!(value["points"][0]["ema_200"], 10.0);
    }
}
