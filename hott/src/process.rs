use colored::Colorize;
use hott::{Error, Kind, Report};

/// The message of an error, with a caret under the faulty text of parse errors, the sides of
/// mismatches, the goal of failing tactics and their hints.
pub fn describe(err: &Error) -> String {
    let mut string = match err.kind {
        Kind::Parser(parser::Error {
            kind: parser::ErrorKind::CannotParse(ref message),
            location: loc,
        }) if loc.start.line == loc.end.line && loc.start.column > 0 => {
            if loc.start.column >= loc.end.column {
                format!("{:0w1$}^\n{message}", "", w1 = loc.start.column - 1)
            } else {
                format!(
                    "{:0w1$}^{:-<w2$}^\n{message}",
                    "",
                    "",
                    w1 = loc.start.column - 1,
                    w2 = loc.end.column - loc.start.column - 1,
                )
            }
        },
        _ => format!("{}: {err}", err.kind_name()),
    };

    if let Some((expected, actual)) = err.sides() {
        string.push_str(&format!("\n  expected: {expected}\n  got: {actual}"));
    }
    if let Some(goal) = err.goal() {
        string.push_str(&format!("\n  goal:\n{goal}"));
    }
    if !err.hints().is_empty() {
        string.push_str(&format!("\n  hints: {}", err.hints().join("; ")));
    }
    string
}

pub fn print_ok(message: &str) {
    if message.is_empty() {
        println!("{}", "\u{2713}".green());
    }
    for line in message.lines() {
        println!("{} {line}", "\u{2713}".green());
    }
}

pub fn print_err(message: &str) {
    for line in message.lines() {
        eprintln!("{} {line}", "\u{2717}".red());
    }
}

/// Prints the outcome of a command, prefixing errors by their position in `source`.
pub fn print_outcome(source: &str, outcome: anyhow::Result<String>) {
    match outcome {
        Ok(message) => print_ok(&message),
        Err(err) => {
            let string = match err.downcast_ref::<Error>() {
                Some(err) => match err.location {
                    Some(location) => format!("{source}:{}: {}", location.start, describe(err)),
                    None => describe(err),
                },
                None => format!("{err:#}"),
            };
            print_err(&string);
        },
    }
}

/// Prints a line per item of a script, and the diagnostics of those that failed.
pub fn print_report(report: &Report) {
    for item in &report.items {
        if item.is_success() {
            print_ok(&format!("{} {}", item.kind, item.name));
        }
    }
    for diagnostic in report.diagnostics() {
        print_err(&diagnostic.to_string());
    }
    if !report.success() {
        let failures = report.failures().count() + usize::from(report.parse_error.is_some());
        eprintln!("{}: {failures} error(s)", report.file);
    }
}
