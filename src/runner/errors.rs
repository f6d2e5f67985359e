use std::path::Path;

use owo_colors::{OwoColorize, Stream};

use coolck::errors::{Diagnostic, DiagnosticMessage, Level};
use coolck::position::Span;

fn format_level(level: Level) -> String {
    match level {
        Level::Fatal => format!(
            "{}",
            "fatal:".if_supports_color(Stream::Stderr, |text| text.red())
        ),

        Level::Error => format!(
            "{}",
            "error:".if_supports_color(Stream::Stderr, |text| text.bright_red())
        ),
    }
}

fn format_location(path: Option<&Path>, span: Option<&Span>) -> String {
    match (path, span) {
        (None, None) => "".to_owned(),
        (Some(path), None) => format!("{}: ", path.display()),
        (None, Some(span)) => format!("{}: ", span),
        (Some(path), Some(span)) => format!("{}:{}: ", path.display(), span),
    }
}

/// Renders a diagnostic as a single line: the level tag first, then the location and the message.
fn format_diagnostic(path: Option<&Path>, diagnostic: &Diagnostic) -> String {
    let Diagnostic {
        level,
        message: DiagnosticMessage { span, message },
        source,
    } = diagnostic;

    let level = format_level(*level);
    let location = format_location(path, span.as_ref());

    match source {
        // spanned errors are rendered into the message already
        Some(source) if span.is_none() && source.to_string() != *message => {
            format!("{} {}{}: {}", level, location, message, source)
        }

        _ => format!("{} {}{}", level, location, message),
    }
}

pub fn print_diagnostic(path: Option<&Path>, diagnostic: &Diagnostic) {
    eprintln!("{}", format_diagnostic(path, diagnostic));
}
