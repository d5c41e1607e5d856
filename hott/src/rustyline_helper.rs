use std::borrow::Cow::{self, Borrowed, Owned};

use colored::Colorize;
use hott::interpreter::{COMBINATORS, TACTICS};
use rustyline::completion::{Completer, Pair};
use rustyline::highlight::Highlighter;
use rustyline::hint::HistoryHinter;
use rustyline::validate::{ValidationContext, ValidationResult, Validator};
use rustyline::{Cmd, ConditionalEventHandler, Context, Event, EventContext, RepeatCount, Result};
use rustyline_derive::{Helper, Hinter};

/// Commands of the interactive mode, highlighted along with tactic names
const KEYWORDS: [&str; 11] = [
    "Theorem",
    "Definition",
    "Axiom",
    "Proof",
    "Qed",
    "qed",
    "goals",
    "extract",
    "abort",
    "eval",
    "synth",
];

fn words() -> impl Iterator<Item = &'static str> {
    KEYWORDS.into_iter().chain(TACTICS).chain(COMBINATORS)
}

/// An Helper for a RustyLine Editor that implements:
/// - a standard hinter
/// - customs validator, completer and highlighter
#[derive(Helper, Hinter)]
pub struct RustyLineHelper {
    color: bool,
    #[rustyline(Hinter)]
    hinter: HistoryHinter,
}

impl RustyLineHelper {
    pub const fn new(color: bool) -> Self {
        Self {
            color,
            hinter: HistoryHinter {},
        }
    }
}

/// The start of the word ending at `pos`
fn word_start(line: &str, pos: usize) -> usize {
    line.get(..pos)
        .and_then(|before| before.rfind(|c: char| c.is_whitespace() || c == '(' || c == ')'))
        .map_or(0, |ix| ix + 1)
}

/// An Handler for the tab event: indents unless a word is being typed
pub struct TabEventHandler;
impl ConditionalEventHandler for TabEventHandler {
    fn handle(&self, _: &Event, n: RepeatCount, _: bool, ctx: &EventContext) -> Option<Cmd> {
        if word_start(ctx.line(), ctx.pos()) < ctx.pos() {
            return None;
        }
        Some(Cmd::Insert(n, "  ".to_owned()))
    }
}

/// Completion of commands and tactic names
impl Completer for RustyLineHelper {
    type Candidate = Pair;

    fn complete(&self, line: &str, pos: usize, _ctx: &Context<'_>) -> Result<(usize, Vec<Pair>)> {
        let start = word_start(line, pos);
        let prefix = line.get(start..pos).unwrap_or_default();
        if prefix.is_empty() {
            return Ok((pos, Vec::new()));
        }
        let candidates = words()
            .filter(|word| word.starts_with(prefix))
            .map(|word| Pair {
                display: word.to_owned(),
                replacement: word.to_owned(),
            })
            .collect();
        Ok((start, candidates))
    }
}

/// A variation of MatchingBracketValidator, also accounting for braces
impl Validator for RustyLineHelper {
    fn validate(&self, ctx: &mut ValidationContext) -> Result<ValidationResult> {
        Ok(validate_brackets(ctx.input()).unwrap_or(ValidationResult::Valid(None)))
    }
}

fn validate_brackets(input: &str) -> Option<ValidationResult> {
    let mut stack = vec![];

    for c in input.chars() {
        match c {
            '(' | '{' => stack.push(c),
            ')' | '}' => match stack.pop() {
                Some(open) if open == matching_bracket(c) => {},
                Some(_) => {
                    return Some(ValidationResult::Invalid(Some(format!("\nMismatched brackets: {c} is not properly closed"))))
                },
                None => return Some(ValidationResult::Invalid(Some(format!("\nMismatched brackets: {c} is unpaired")))),
            },
            _ => {},
        }
    }

    if stack.is_empty() { None } else { Some(ValidationResult::Incomplete) }
}

/// A variation of MatchingBrackerHighlighter:
/// no check occurs before cursor
/// see: https://docs.rs/rustyline/10.0.0/rustyline/highlight/struct.MatchingBracketHighlighter.html
impl Highlighter for RustyLineHelper {
    fn highlight_hint<'h>(&self, hint: &'h str) -> Cow<'h, str> {
        if !self.color {
            return Owned(hint.to_owned());
        }
        Owned(format!("{}", hint.bold()))
    }

    fn highlight_char(&self, _line: &str, _pos: usize) -> bool {
        self.color
    }

    fn highlight<'l>(&self, line: &'l str, pos: usize) -> Cow<'l, str> {
        if line.len() <= 1 || !self.color {
            return Borrowed(line);
        }
        let mut copy = line.to_owned();

        if let Some((matching, pos)) = get_bracket(line, pos).and_then(|bracket| find_matching_bracket(line, pos, bracket)) {
            copy.replace_range(pos..=pos, &format!("{}", matching.to_string().blue().bold()));
        }
        words().for_each(|keyword| replace_inplace(&mut copy, keyword, &format!("{}", keyword.blue().bold())));
        Owned(copy)
    }
}

/// Variation of the std replace function that only replace full words
pub fn replace_inplace(input: &mut String, from: &str, to: &str) {
    let mut offset = 0;
    while let Some(pos) = input.get(offset..).and_then(|rest| rest.find(from)) {
        let start = offset + pos;
        let end = start + from.len();
        let before = start == 0 || input.as_bytes().get(start - 1) == Some(&b' ');
        let after = end == input.len() || input.as_bytes().get(end) == Some(&b' ');
        if before && after {
            input.replace_range(start..end, to);
            offset = start + to.len();
        } else {
            offset = end;
        }
    }
}

fn find_matching_bracket(line: &str, pos: usize, bracket: char) -> Option<(char, usize)> {
    let matching = matching_bracket(bracket);
    let mut to_match = 1_usize;

    let mut match_bracket = |b: u8| {
        if char::from(b) == matching {
            to_match -= 1;
        } else if char::from(b) == bracket {
            to_match += 1;
        };
        to_match == 0
    };

    if is_open_bracket(bracket) {
        // forward search
        line.get(pos + 1..)?.bytes().position(&mut match_bracket).map(|pos2| (matching, pos2 + pos + 1))
    } else {
        // backward search
        line.get(..pos)?.bytes().rev().position(&mut match_bracket).map(|pos2| (matching, pos - pos2 - 1))
    }
}

/// Check if the cursor is on a bracket
fn get_bracket(line: &str, pos: usize) -> Option<char> {
    line.as_bytes().get(pos).map(|&b| char::from(b)).filter(|&c| matches!(c, '(' | ')' | '{' | '}'))
}

const fn matching_bracket(bracket: char) -> char {
    match bracket {
        '(' => ')',
        ')' => '(',
        '{' => '}',
        _ => '{',
    }
}

const fn is_open_bracket(bracket: char) -> bool {
    matches!(bracket, '(' | '{')
}
