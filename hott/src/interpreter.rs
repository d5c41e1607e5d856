//! Reading tactic lines into tactics.
//!
//! A tactic line is a tactic name followed by its arguments. Arguments are whitespace-separated
//! words, parenthesised groups counting as one word; tactics expecting a term join them back and
//! read them as a surface term, elaborated in the context of the goal when the tactic runs.
//!
//! Lines may also compose tactics:
//!
//! ```text
//! t1 ; t2            sequence
//! t1 || t2           alternative
//! try t   repeat t   progress t   complete t   all t   do N t
//! first (t1) (t2) …  ( t )
//! ```
//!
//! A proof block sharing its line with `Proof` or `Qed` may hold several tactics one after the
//! other, each one starting at a tactic name.

use elaboration::Elaborator;
use tactics::primitives::{
    apply, assumption, auto, constructor, contradiction, exact, exists, intro, intro_n, intros, left, reflexivity, right,
    simpl, split, trivial, unfold,
};
use tactics::elimination::{cases, destruct, induction};
use tactics::rewrite::{rewrite, rewrite_rev};
use tactics::tactic::{all, complete, do_n, fail_with, first, no_op, orelse, progress, repeat, seq, try_};
use tactics::{Argument, Tactic};

use crate::error::{Error, Kind, Result};

/// Names of the tactics taking arguments, or none.
pub const TACTICS: [&str; 26] = [
    "intro",
    "intros",
    "exact",
    "assumption",
    "apply",
    "refl",
    "reflexivity",
    "split",
    "exists",
    "left",
    "right",
    "destruct",
    "cases",
    "induction",
    "constructor",
    "contradiction",
    "rewrite",
    "rewrite_rev",
    "simpl",
    "unfold",
    "trivial",
    "auto",
    "idtac",
    "fail",
    "first",
    "undo",
];

/// Names of the combinators taking a tactic as argument.
pub const COMBINATORS: [&str; 6] = ["try", "repeat", "progress", "complete", "all", "do"];

fn is_keyword(word: &str) -> bool {
    TACTICS.contains(&word) || COMBINATORS.contains(&word)
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Token<'src> {
    Word(&'src str),

    /// A parenthesised or braced group, delimiters included.
    Group(&'src str),
    Semicolon,
    Bar,
}

fn error<T>(message: String) -> Result<T> {
    Err(Error::new(Kind::TacticLine(message)))
}

fn tokenize(line: &str) -> Result<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut chars = line.char_indices().peekable();

    while let Some(&(start, c)) = chars.peek() {
        match c {
            _ if c.is_whitespace() => {
                chars.next();
            },
            ';' => {
                chars.next();
                tokens.push(Token::Semicolon);
            },
            '|' => {
                chars.next();
                if chars.next_if(|&(_, c)| c == '|').is_none() {
                    return error("expected || between alternatives".to_owned());
                }
                tokens.push(Token::Bar);
            },
            '(' | '{' => {
                let mut depth = 0_usize;
                let mut end = None;
                for (ix, c) in chars.by_ref() {
                    match c {
                        '(' | '{' => depth += 1,
                        ')' | '}' => {
                            depth -= 1;
                            if depth == 0 {
                                end = Some(ix + 1);
                                break;
                            }
                        },
                        _ => {},
                    }
                }
                let Some(end) = end else {
                    return error(format!("unbalanced parenthesis in {line}"));
                };
                tokens.push(Token::Group(line.get(start..end).unwrap_or_default()));
            },
            ')' | '}' => return error(format!("unbalanced parenthesis in {line}")),
            _ => {
                let mut end = line.len();
                while let Some(&(ix, c)) = chars.peek() {
                    if c.is_whitespace() || matches!(c, ';' | '|' | '(' | ')' | '{' | '}') {
                        end = ix;
                        break;
                    }
                    chars.next();
                }
                tokens.push(Token::Word(line.get(start..end).unwrap_or_default()));
            },
        }
    }
    Ok(tokens)
}

/// A term argument, checked to be well-formed right away and elaborated when the tactic runs.
fn term(tactic: &str, words: &[&str]) -> Result<Argument> {
    if words.is_empty() {
        return error(format!("{tactic} requires a term argument"));
    }
    let text = words.join(" ");
    parser::parse_surface(&text)?;

    Ok(Argument::deferred(move |state, goal, expected| {
        let builder = parser::parse_surface(&text)
            .map_err(|err| tactics::Error::failed(format!("cannot read {text}: {err}")))?;
        let mut elaborator = Elaborator::new(state.environment(), state.metas());
        Ok(match expected {
            Some(ty) => elaborator.elaborate(&goal.context, &builder, ty)?,
            None => elaborator.infer(&goal.context, &builder)?.0,
        })
    }))
}

fn name(tactic: &str, words: &[&str]) -> Result<String> {
    match *words {
        [name] => Ok(name.to_owned()),
        _ => error(format!("{tactic} requires a hypothesis name")),
    }
}

fn nothing(tactic: &str, words: &[&str]) -> Result<()> {
    if words.is_empty() {
        Ok(())
    } else {
        error(format!("{tactic} takes no argument, got {}", words.join(" ")))
    }
}

/// Builds a tactic from its name and arguments.
fn atomic(tactic: &str, words: &[&str]) -> Result<Tactic> {
    let owned = || words.iter().map(|&word| word.to_owned()).collect::<Vec<_>>();
    Ok(match tactic {
        "intro" => match *words {
            [] => intro(None),
            [name] => intro(Some(name.to_owned())),
            _ => intro_n(owned()),
        },
        "intros" if words.is_empty() => intros(),
        "intros" => intro_n(owned()),
        "exact" => exact(term(tactic, words)?),
        "apply" => apply(term(tactic, words)?),
        "exists" => exists(term(tactic, words)?),
        "rewrite" => match *words {
            ["<-", ref rest @ ..] => rewrite_rev(term(tactic, rest)?),
            _ => rewrite(term(tactic, words)?),
        },
        "rewrite_rev" => rewrite_rev(term(tactic, words)?),
        "destruct" => destruct(name(tactic, words)?),
        "cases" => cases(name(tactic, words)?),
        "induction" => induction(name(tactic, words)?),
        "unfold" => unfold(name(tactic, words)?),
        "fail" if words.is_empty() => fail_with("fail"),
        "fail" => fail_with(words.join(" ")),
        _ => {
            nothing(tactic, words)?;
            match tactic {
                "assumption" => assumption(),
                "refl" | "reflexivity" => reflexivity(),
                "split" => split(),
                "left" => left(),
                "right" => right(),
                "constructor" => constructor(),
                "contradiction" => contradiction(),
                "simpl" => simpl(),
                "trivial" => trivial(),
                "auto" => auto(),
                "idtac" => no_op(),
                "undo" => return error("undo is only available interactively".to_owned()),
                _ => return error(format!("unknown tactic: {tactic}")),
            }
        },
    })
}

struct Reader<'src> {
    tokens: Vec<Token<'src>>,
    position: usize,

    /// Whether a tactic name ends the arguments of the previous tactic.
    inline: bool,
}

impl<'src> Reader<'src> {
    fn peek(&self) -> Option<Token<'src>> {
        self.tokens.get(self.position).copied()
    }

    fn next(&mut self) -> Option<Token<'src>> {
        let token = self.peek();
        self.position += 1;
        token
    }

    fn at_end(&self) -> bool {
        self.position >= self.tokens.len()
    }

    /// `alternative (; alternative)*`
    fn sequence(&mut self) -> Result<Tactic> {
        let mut tactics = vec![self.alternative()?];
        while self.peek() == Some(Token::Semicolon) {
            self.next();
            tactics.push(self.alternative()?);
        }
        Ok(if tactics.len() == 1 { tactics.remove(0) } else { seq(tactics) })
    }

    /// `prefix (|| prefix)*`
    fn alternative(&mut self) -> Result<Tactic> {
        let mut tactic = self.prefix()?;
        while self.peek() == Some(Token::Bar) {
            self.next();
            tactic = orelse(tactic, self.prefix()?);
        }
        Ok(tactic)
    }

    fn prefix(&mut self) -> Result<Tactic> {
        match self.next() {
            Some(Token::Group(group)) if group.starts_with('(') => group_tactic(group),
            Some(Token::Word("try")) => Ok(try_(self.prefix()?)),
            Some(Token::Word("repeat")) => Ok(repeat(self.prefix()?)),
            Some(Token::Word("progress")) => Ok(progress(self.prefix()?)),
            Some(Token::Word("complete")) => Ok(complete(self.prefix()?)),
            Some(Token::Word("all")) => Ok(all(self.prefix()?)),
            Some(Token::Word("do")) => match self.next() {
                Some(Token::Word(count)) => match count.parse() {
                    Ok(count) => Ok(do_n(count, self.prefix()?)),
                    Err(_) => error(format!("do expects a number of iterations, got {count}")),
                },
                _ => error("do expects a number of iterations".to_owned()),
            },
            Some(Token::Word("first")) => {
                let mut alternatives = Vec::new();
                while let Some(Token::Group(group)) = self.peek() {
                    self.next();
                    alternatives.push(group_tactic(group)?);
                }
                if alternatives.is_empty() {
                    return error("first expects parenthesised tactics".to_owned());
                }
                Ok(first(alternatives))
            },
            Some(Token::Word(tactic)) => {
                let mut words = Vec::new();
                while let Some(token) = self.peek() {
                    match token {
                        Token::Word(word) if self.inline && is_keyword(word) => break,
                        Token::Word(word) | Token::Group(word) => words.push(word),
                        Token::Semicolon | Token::Bar => break,
                    }
                    self.next();
                }
                atomic(tactic, &words)
            },
            Some(Token::Group(group)) => error(format!("expected a tactic, got {group}")),
            Some(Token::Semicolon | Token::Bar) | None => error("expected a tactic".to_owned()),
        }
    }
}

/// The tactic between the parentheses of a group.
fn group_tactic(group: &str) -> Result<Tactic> {
    let inner = group.get(1..group.len() - 1).unwrap_or_default();
    let tactics = read(inner, false)?;
    Ok(if tactics.len() == 1 {
        tactics.into_iter().next().unwrap_or_else(no_op)
    } else {
        seq(tactics)
    })
}

/// Reads the tactics of a line. Inline lines may hold several tactics, one after the other.
///
/// # Errors
/// Fails on unknown tactics, on wrong arguments, and on malformed terms.
pub fn read(line: &str, inline: bool) -> Result<Vec<Tactic>> {
    let mut reader = Reader {
        tokens: tokenize(line)?,
        position: 0,
        inline,
    };

    let mut tactics = Vec::new();
    while !reader.at_end() {
        tactics.push(reader.sequence()?);
        if !reader.at_end() && !inline {
            return error(format!("unexpected text after the tactic in {line}"));
        }
    }
    Ok(tactics)
}
