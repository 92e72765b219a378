use miette::{IntoDiagnostic, Result, WrapErr};
use owo_colors::OwoColorize;
use time::{format_description::FormatItem, macros::format_description, OffsetDateTime, UtcOffset};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::{
    fmt::{format, FmtContext, FormatEvent, FormatFields},
    registry::LookupSpan,
    FmtSubscriber,
};

/// Initialize the logging system.
///
/// Must be called before any thread is spawned, or the local time offset
/// cannot be determined and UTC is used instead.
pub fn init_logging(level: Level) -> Result<()> {
    let local_offset = UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC);

    // Module paths only help when digging into the details
    let formatter = LineFormatter::new(local_offset, level >= Level::DEBUG);

    let subscriber = FmtSubscriber::builder()
        .event_format(formatter)
        .with_max_level(level)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .into_diagnostic()
        .wrap_err("Setting default subscriber failed")
}

/// One line per event: `time level thread [target] message`
struct LineFormatter {
    offset: UtcOffset,
    time_format: &'static [FormatItem<'static>],
    show_target: bool,
}

impl LineFormatter {
    fn new(offset: UtcOffset, show_target: bool) -> Self {
        Self {
            offset,
            time_format: format_description!("[hour]:[minute]:[second]"),
            show_target,
        }
    }
}

impl<S, N> FormatEvent<S, N> for LineFormatter
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: format::Writer<'_>,
        event: &Event<'_>,
    ) -> std::fmt::Result {
        let metadata = event.metadata();

        let now = OffsetDateTime::now_utc().to_offset(self.offset).time();
        let now = now.format(self.time_format).map_err(|_| std::fmt::Error)?;
        let thread = std::thread::current();
        let thread_name = thread.name().unwrap_or("?");

        if writer.has_ansi_escapes() {
            let level = match *metadata.level() {
                Level::ERROR => metadata.level().red().to_string(),
                Level::WARN => metadata.level().yellow().to_string(),
                Level::DEBUG => metadata.level().blue().to_string(),
                Level::TRACE => metadata.level().magenta().to_string(),
                _ => metadata.level().green().to_string(),
            };

            write!(
                &mut writer,
                "{} {:>5} {} ",
                now.dimmed(),
                level,
                thread_name.yellow(),
            )?;
        } else {
            write!(
                &mut writer,
                "{} {:>5} {} ",
                now,
                metadata.level(),
                thread_name,
            )?;
        }

        if self.show_target {
            let target = metadata.target();
            if writer.has_ansi_escapes() {
                write!(&mut writer, "{} ", target.dimmed())?;
            } else {
                write!(&mut writer, "{target} ")?;
            }
        }

        ctx.field_format().format_fields(writer.by_ref(), event)?;

        writeln!(writer)
    }
}
