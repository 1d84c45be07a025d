use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Args;
use serde::Serialize;

use crate::app::{App, SnapshotSource};
use crate::config::{AppConfig, ConfigPaths};
use crate::insights::{
    AchievementStatus, DayKey, EmotionShare, Insights, StreakSummary, TrendDirection, TrendPoint,
    WeekDelta,
};
use crate::records::ActivityKind;

#[derive(Args, Debug, Clone, Default)]
pub struct SourceArgs {
    /// Activity snapshot JSON, or `-` for stdin. Defaults to piped stdin, then
    /// snapshot.json in the data directory.
    #[arg(long)]
    pub data: Option<PathBuf>,
    /// Reference day (YYYY-MM-DD) used instead of the current local date
    #[arg(long)]
    pub today: Option<String>,
    /// Print JSON instead of text
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug, Clone)]
pub struct StreakArgs {
    #[command(flatten)]
    pub source: SourceArgs,
    /// Activity kind whose streak is shown
    #[arg(long, default_value_t = ActivityKind::Journal)]
    pub kind: ActivityKind,
}

pub fn summary(config: Arc<AppConfig>, paths: &ConfigPaths, args: SourceArgs) -> Result<()> {
    let app = load_app(config, paths, &args)?;
    print!("{}", run_summary(&app, &args)?);
    Ok(())
}

pub fn streak(config: Arc<AppConfig>, paths: &ConfigPaths, args: StreakArgs) -> Result<()> {
    let app = load_app(config, paths, &args.source)?;
    print!("{}", run_streak(&app, &args)?);
    Ok(())
}

pub fn achievements(config: Arc<AppConfig>, paths: &ConfigPaths, args: SourceArgs) -> Result<()> {
    let app = load_app(config, paths, &args)?;
    print!("{}", run_achievements(&app, &args)?);
    Ok(())
}

pub fn emotions(config: Arc<AppConfig>, paths: &ConfigPaths, args: SourceArgs) -> Result<()> {
    let app = load_app(config, paths, &args)?;
    print!("{}", run_emotions(&app, &args)?);
    Ok(())
}

pub fn trend(config: Arc<AppConfig>, paths: &ConfigPaths, args: SourceArgs) -> Result<()> {
    let app = load_app(config, paths, &args)?;
    print!("{}", run_trend(&app, &args)?);
    Ok(())
}

fn load_app(config: Arc<AppConfig>, paths: &ConfigPaths, args: &SourceArgs) -> Result<App> {
    let stdin_is_tty = atty::is(atty::Stream::Stdin);
    let source = resolve_source(args.data.as_deref(), paths, stdin_is_tty)?;
    tracing::debug!(?source, "loading activity snapshot");
    App::load(config, &source)
}

fn resolve_source(
    data: Option<&Path>,
    paths: &ConfigPaths,
    stdin_is_tty: bool,
) -> Result<SnapshotSource> {
    match data {
        Some(path) if path == Path::new("-") => Ok(SnapshotSource::Stdin),
        Some(path) => Ok(SnapshotSource::File(path.to_path_buf())),
        None if !stdin_is_tty => Ok(SnapshotSource::Stdin),
        None if paths.snapshot_path.exists() => {
            Ok(SnapshotSource::File(paths.snapshot_path.clone()))
        }
        None => bail!(
            "no activity snapshot: pass --data FILE, pipe JSON on stdin, or place one at {}",
            paths.snapshot_path.display()
        ),
    }
}

fn parse_today(raw: Option<&str>) -> Result<Option<DayKey>> {
    let Some(raw) = raw else {
        return Ok(None);
    };
    match DayKey::parse(raw.trim()) {
        Some(day) => Ok(Some(day)),
        None => bail!("--today expects YYYY-MM-DD, got '{raw}'"),
    }
}

fn insights_for(app: &App, args: &SourceArgs) -> Result<Arc<Insights>> {
    let today = parse_today(args.today.as_deref())?;
    Ok(app.insights(today))
}

fn render_json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    let mut out = serde_json::to_string_pretty(value).context("serializing output as json")?;
    out.push('\n');
    Ok(out)
}

fn run_summary(app: &App, args: &SourceArgs) -> Result<String> {
    let insights = insights_for(app, args)?;
    if args.json {
        return render_json(&*insights);
    }
    Ok(format_summary(&insights, app.skipped().len()))
}

fn run_streak(app: &App, args: &StreakArgs) -> Result<String> {
    let today = app.today(parse_today(args.source.today.as_deref())?);
    let summary = app.state().streak(args.kind, today);
    if args.source.json {
        return render_json(&summary);
    }
    Ok(format_streak(args.kind, &summary))
}

fn run_achievements(app: &App, args: &SourceArgs) -> Result<String> {
    let insights = insights_for(app, args)?;
    if args.json {
        return render_json(&insights.achievements);
    }
    Ok(format_achievements(&insights.achievements))
}

fn run_emotions(app: &App, args: &SourceArgs) -> Result<String> {
    let insights = insights_for(app, args)?;
    if args.json {
        return render_json(&insights.emotion_distribution);
    }
    Ok(format_emotions(&insights.emotion_distribution))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TrendReport<'a> {
    weekly_trend: &'a [TrendPoint; 7],
    week_over_week: WeekDelta,
}

fn run_trend(app: &App, args: &SourceArgs) -> Result<String> {
    let insights = insights_for(app, args)?;
    if args.json {
        return render_json(&TrendReport {
            weekly_trend: &insights.weekly_trend,
            week_over_week: insights.week_over_week,
        });
    }
    Ok(format_trend(&insights.weekly_trend, insights.week_over_week))
}

fn format_summary(insights: &Insights, skipped: usize) -> String {
    let mut out = String::new();
    let _ = writeln!(&mut out, "Insights for {}", insights.today);
    for (kind, summary) in [
        (ActivityKind::Journal, &insights.streaks.journal),
        (ActivityKind::Mood, &insights.streaks.mood),
        (ActivityKind::Chat, &insights.streaks.chat),
    ] {
        let _ = writeln!(
            &mut out,
            "  {:<8} streak {} (longest {}, {} entries)",
            kind.to_string(),
            plural(summary.streak_length, "day"),
            summary.longest_streak,
            summary.total_entries
        );
    }
    if let (Some(next), Some(remaining)) = (
        insights.streak_milestone.next,
        insights.streak_milestone.remaining_to_next,
    ) {
        let _ = writeln!(
            &mut out,
            "  next streak milestone: {} ({} to go)",
            plural(next, "day"),
            remaining
        );
    }
    let _ = writeln!(&mut out, "  positivity: {}%", insights.positivity_percent);

    let unlocked = insights
        .achievements
        .iter()
        .filter(|status| status.achieved)
        .count();
    let _ = writeln!(
        &mut out,
        "  achievements: {unlocked}/{} unlocked",
        insights.achievements.len()
    );

    if !insights.emotion_distribution.is_empty() {
        let top = insights
            .emotion_distribution
            .iter()
            .take(3)
            .map(|share| format!("{} {}%", share.label, share.percentage))
            .collect::<Vec<_>>()
            .join(", ");
        let _ = writeln!(&mut out, "  top emotions: {top}");
    }
    let _ = writeln!(
        &mut out,
        "  week over week: {}",
        format_delta(insights.week_over_week)
    );

    let mood = &insights.mood;
    if mood.check_ins > 0 {
        let mut line = format!("  mood check-ins: {}", mood.check_ins);
        if let Some(average) = mood.average_score {
            let _ = write!(&mut line, ", average {average:.1}");
        }
        if let Some(latest) = mood.latest_score {
            let _ = write!(&mut line, ", latest {latest}");
        }
        if let Some(emotion) = &mood.most_common_emotion {
            let _ = write!(&mut line, ", mostly {emotion}");
        }
        let _ = writeln!(&mut out, "{line}");
    }
    if skipped > 0 {
        let _ = writeln!(
            &mut out,
            "  ({} skipped during import)",
            plural(skipped as u32, "record")
        );
    }
    out
}

fn format_streak(kind: ActivityKind, summary: &StreakSummary) -> String {
    let mut out = String::new();
    let _ = writeln!(
        &mut out,
        "{kind} streak: {}",
        plural(summary.streak_length, "day")
    );
    let _ = writeln!(
        &mut out,
        "    longest {}",
        plural(summary.longest_streak, "day")
    );
    let _ = writeln!(
        &mut out,
        "    entries {} across {}",
        summary.total_entries,
        plural(summary.total_distinct_days, "day")
    );
    match summary.last_active_day {
        Some(day) => {
            let _ = writeln!(&mut out, "    last    {day}");
        }
        None => {
            let _ = writeln!(&mut out, "    last    never");
        }
    }
    out
}

fn format_achievements(statuses: &[AchievementStatus]) -> String {
    if statuses.is_empty() {
        return "No achievements defined.\n".to_string();
    }
    let width = statuses
        .iter()
        .map(|status| status.label.len())
        .max()
        .unwrap_or(0);
    let mut out = String::new();
    for status in statuses {
        let mark = if status.achieved { "x" } else { " " };
        let _ = write!(
            &mut out,
            "[{mark}] {:<width$}  {}/{}",
            status.label,
            status.current.min(status.goal),
            status.goal
        );
        if !status.achieved {
            let _ = write!(&mut out, "  ({} to go)", status.remaining);
        }
        out.push('\n');
    }
    out
}

fn format_emotions(shares: &[EmotionShare]) -> String {
    if shares.is_empty() {
        return "No journal entries yet.\n".to_string();
    }
    let mut out = String::new();
    for share in shares {
        let _ = writeln!(
            &mut out,
            "{:<10} {:>3}%  {:>4}  {}",
            share.label,
            share.percentage,
            share.count,
            share.color
        );
    }
    out
}

fn format_trend(points: &[TrendPoint; 7], delta: WeekDelta) -> String {
    let mut out = String::new();
    for point in points {
        let score = point
            .score
            .map(|score| format!("{score:+}"))
            .unwrap_or_else(|| "-".to_string());
        let _ = writeln!(&mut out, "{} {}  {:>3}", point.day_label, point.day, score);
    }
    let _ = writeln!(&mut out, "week over week: {}", format_delta(delta));
    out
}

fn format_delta(delta: WeekDelta) -> String {
    match delta.direction {
        TrendDirection::Neutral => "no change".to_string(),
        direction => format!("{direction} {}%", delta.percentage),
    }
}

fn plural(count: u32, noun: &str) -> String {
    if count == 1 {
        format!("{count} {noun}")
    } else {
        format!("{count} {noun}s")
    }
}
