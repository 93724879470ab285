//! Real-time echo of step lines to stdout.

use crossterm::{
    execute,
    style::{Color, Print, ResetColor, SetForegroundColor},
};
use std::io::{IsTerminal, Write, stdout};

use super::step::{Severity, Step};

fn color(severity: Severity) -> Option<Color> {
    match severity {
        Severity::Info | Severity::Data => None,
        Severity::Success => Some(Color::Green),
        Severity::Warning => Some(Color::Yellow),
        Severity::Error => Some(Color::Red),
        Severity::Screenshot => Some(Color::Magenta),
        Severity::Report => Some(Color::Cyan),
    }
}

/// Print a step line, coloured by severity when stdout is a terminal
pub fn echo(step: &Step) {
    let line = step.line();
    let mut out = stdout().lock();

    let colored = match color(step.severity) {
        Some(c) if out.is_terminal() => execute!(
            out,
            SetForegroundColor(c),
            Print(&line),
            ResetColor,
            Print("\n")
        )
        .is_ok(),
        _ => false,
    };

    if !colored {
        let _ = writeln!(out, "{}", line);
    }
}
