// Copyright (c) The piglit Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use std::fmt;
use swrite::{SWrite, swrite};
use tracing::{
    Event, Level, Subscriber,
    field::{Field, Visit},
    level_filters::LevelFilter,
};
use tracing_subscriber::{
    Layer,
    filter::Targets,
    fmt::{FmtContext, FormatEvent, FormatFields, format},
    layer::SubscriberExt,
    registry::LookupSpan,
    util::SubscriberInitExt,
};

/// The environment variable that controls which log messages are shown, in `tracing-subscriber`
/// `Targets` syntax. Defaults to `info`.
pub(crate) const LOG_ENV: &str = "PIGLIT_LOG";

static INIT_LOGGER: std::sync::Once = std::sync::Once::new();

/// Installs the global logger, writing to stderr. Later calls do nothing.
pub(crate) fn init_logger() {
    INIT_LOGGER.call_once(|| {
        let level_str = std::env::var_os(LOG_ENV).unwrap_or_default();
        let level_str = level_str
            .into_string()
            .unwrap_or_else(|_| panic!("{LOG_ENV} is not UTF-8"));

        let targets = parse_targets(&level_str)
            .unwrap_or_else(|err| panic!("unable to parse {LOG_ENV}: {err}"));

        let layer = tracing_subscriber::fmt::layer()
            .event_format(SimpleFormatter)
            .with_writer(std::io::stderr)
            .with_filter(targets);

        tracing_subscriber::registry().with(layer).init();
    });
}

fn parse_targets(level_str: &str) -> Result<Targets, tracing_subscriber::filter::ParseError> {
    // An empty string means the default level.
    if level_str.is_empty() {
        Ok(Targets::new().with_default(LevelFilter::INFO))
    } else {
        level_str.parse()
    }
}

/// Formats events as `level: message`, without timestamps or targets.
struct SimpleFormatter;

impl<S, N> FormatEvent<S, N> for SimpleFormatter
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        _ctx: &FmtContext<'_, S, N>,
        mut writer: format::Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        let level = match *event.metadata().level() {
            Level::ERROR => "error",
            Level::WARN => "warning",
            Level::INFO => "info",
            Level::DEBUG => "debug",
            Level::TRACE => "trace",
        };
        write!(writer, "{level}: ")?;

        let mut visitor = MessageVisitor::default();
        event.record(&mut visitor);
        writeln!(writer, "{}{}", visitor.message, visitor.fields)
    }
}

static MESSAGE_FIELD: &str = "message";

/// Collects the message of an event, and any other fields as ` name=value`.
#[derive(Default)]
struct MessageVisitor {
    message: String,
    fields: String,
}

impl Visit for MessageVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == MESSAGE_FIELD {
            swrite!(self.message, "{value:?}");
        } else {
            swrite!(self.fields, " {}={value:?}", field.name());
        }
    }
}
