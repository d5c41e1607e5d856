//! Reading `.htt` proof scripts.
//!
//! A script is a line-oriented sequence of items:
//!
//! ```text
//! Definition NAME : TYPE := BODY
//! Axiom NAME : TYPE
//! Theorem NAME : TYPE
//! Proof
//!   TACTIC
//!   …
//! Qed
//! ```
//!
//! A proof may also be written on the line of its theorem, as in
//! `Theorem NAME : TYPE Proof TACTIC … Qed`. `--` starts a comment running to the end of the line.
//! Terms and tactics are kept as text, to be parsed by whoever runs the script.

use core::fmt;

use kernel::location::Location;

use crate::error::{Error, ErrorKind, Result};

/// A tactic block of a proof, with the line it was written on.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct TacticLine<'src> {
    pub line: usize,
    pub text: &'src str,

    /// Whether the block shares its line with other parts of the proof, in which case it may hold
    /// several tactics.
    pub inline: bool,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Item<'src> {
    Definition {
        name: &'src str,
        ty: &'src str,
        body: &'src str,
        line: usize,
    },

    Axiom {
        name: &'src str,
        ty: &'src str,
        line: usize,
    },

    Theorem {
        name: &'src str,
        ty: &'src str,
        proof: Vec<TacticLine<'src>>,
        line: usize,
    },
}

impl<'src> Item<'src> {
    #[inline]
    #[must_use]
    pub const fn name(&self) -> &'src str {
        match *self {
            Item::Definition { name, .. } | Item::Axiom { name, .. } | Item::Theorem { name, .. } => name,
        }
    }

    #[inline]
    #[must_use]
    pub const fn line(&self) -> usize {
        match *self {
            Item::Definition { line, .. } | Item::Axiom { line, .. } | Item::Theorem { line, .. } => line,
        }
    }

    #[inline]
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match *self {
            Item::Definition { .. } => "Definition",
            Item::Axiom { .. } => "Axiom",
            Item::Theorem { .. } => "Theorem",
        }
    }
}

impl fmt::Display for Item<'_> {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Item::Definition { name, ty, body, .. } => write!(f, "Definition {name} : {ty} := {body}"),
            Item::Axiom { name, ty, .. } => write!(f, "Axiom {name} : {ty}"),
            Item::Theorem { name, ty, ref proof, .. } => {
                write!(f, "Theorem {name} : {ty} Proof")?;
                proof.iter().try_for_each(|tactic| write!(f, " {}", tactic.text))?;
                write!(f, " Qed")
            },
        }
    }
}

fn script_error<T>(line: usize, message: &str) -> Result<T> {
    Err(Error::new(ErrorKind::Script(message.to_owned()), Location::line(line)))
}

/// Removes a `--` comment, which must start a word.
fn strip_comment(line: &str) -> &str {
    let mut previous = ' ';
    for (ix, c) in line.char_indices() {
        if c == '-' && previous.is_whitespace() && line.get(ix..).map_or(false, |rest| rest.starts_with("--")) {
            return line.get(..ix).unwrap_or(line);
        }
        previous = c;
    }
    line
}

/// Splits a text around the first occurrence of a keyword, as a whole word outside of any
/// parenthesised group.
fn split_keyword<'src>(text: &'src str, keyword: &str) -> Option<(&'src str, &'src str)> {
    let mut depth = 0_usize;
    let mut previous = ' ';
    for (ix, c) in text.char_indices() {
        match c {
            '(' | '{' => depth += 1,
            ')' | '}' => depth = depth.saturating_sub(1),
            _ => {},
        }
        if depth == 0 && previous.is_whitespace() && text.get(ix..).map_or(false, |rest| rest.starts_with(keyword)) {
            let after = text.get(ix + keyword.len()..).unwrap_or_default();
            if after.chars().next().map_or(true, char::is_whitespace) {
                let before = text.get(..ix).unwrap_or_default();
                return Some((before.trim(), after.trim()));
            }
        }
        previous = c;
    }
    None
}

/// Splits `NAME : REST`.
fn declaration(text: &str, line: usize) -> Result<(&str, &str)> {
    let Some((name, rest)) = text.split_once(':') else {
        return script_error(line, "expected NAME : TYPE");
    };
    let name = name.trim();
    if name.is_empty() || name.contains(char::is_whitespace) {
        return script_error(line, "expected a single name before the colon");
    }
    Ok((name, rest.trim()))
}

/// A theorem whose proof is being read.
struct Pending<'src> {
    name: &'src str,
    ty: &'src str,
    line: usize,
    proof: Vec<TacticLine<'src>>,

    /// Whether `Proof` was seen.
    started: bool,
}

impl<'src> Pending<'src> {
    fn finish(self) -> Item<'src> {
        Item::Theorem {
            name: self.name,
            ty: self.ty,
            proof: self.proof,
            line: self.line,
        }
    }

    /// Reads the text following `Proof`, returning whether it ends with `Qed`.
    fn read(&mut self, text: &'src str, line: usize, inline: bool) -> Result<bool> {
        let (tactics, closed) = match text.strip_suffix("Qed") {
            Some(tactics) if tactics.is_empty() || tactics.ends_with(char::is_whitespace) => (tactics.trim(), true),
            _ => (text, false),
        };
        if split_keyword(tactics, "Proof").is_some() {
            return script_error(line, &format!("Proof given twice for {}", self.name));
        }
        if !tactics.is_empty() {
            self.proof.push(TacticLine {
                line,
                text: tactics,
                inline,
            });
        }
        Ok(closed)
    }
}

/// Parse a script into its items, with their line numbers.
///
/// # Errors
/// Fails on lines that are not part of any item, and on theorems whose proof is not delimited by
/// `Proof` and `Qed`.
#[inline]
pub fn parse_script(input: &str) -> Result<Vec<Item>> {
    let mut items = Vec::new();
    let mut pending: Option<Pending> = None;

    for (ix, raw) in input.lines().enumerate() {
        let line = ix + 1;
        let text = strip_comment(raw).trim();
        if text.is_empty() {
            continue;
        }

        if let Some(mut theorem) = pending.take() {
            if theorem.started {
                if starts_item(text) {
                    return script_error(theorem.line, &format!("missing Qed for {}", theorem.name));
                }
                if theorem.read(text, line, false)? {
                    items.push(theorem.finish());
                } else {
                    pending = Some(theorem);
                }
                continue;
            }
            match text.strip_prefix("Proof") {
                Some(rest) if rest.is_empty() || rest.starts_with(char::is_whitespace) => {
                    theorem.started = true;
                    if theorem.read(rest.trim(), line, !rest.trim().is_empty())? {
                        items.push(theorem.finish());
                    } else {
                        pending = Some(theorem);
                    }
                    continue;
                },
                _ => return script_error(line, &format!("expected Proof for {}", theorem.name)),
            }
        }

        let (keyword, rest) = text.split_once(char::is_whitespace).unwrap_or((text, ""));
        match keyword {
            "Definition" => {
                let (name, rest) = declaration(rest, line)?;
                let Some((ty, body)) = rest.split_once(":=") else {
                    return script_error(line, "expected Definition NAME : TYPE := BODY");
                };
                items.push(Item::Definition {
                    name,
                    ty: ty.trim(),
                    body: body.trim(),
                    line,
                });
            },
            "Axiom" => {
                let (name, ty) = declaration(rest, line)?;
                items.push(Item::Axiom { name, ty, line });
            },
            "Theorem" => {
                let (name, rest) = declaration(rest, line)?;
                let mut theorem = Pending {
                    name,
                    ty: rest,
                    line,
                    proof: Vec::new(),
                    started: false,
                };
                if let Some((ty, proof)) = split_keyword(rest, "Proof") {
                    theorem.ty = ty;
                    theorem.started = true;
                    if theorem.read(proof, line, true)? {
                        items.push(theorem.finish());
                        continue;
                    }
                }
                pending = Some(theorem);
            },
            "Proof" => return script_error(line, "Proof without Theorem"),
            "Qed" => return script_error(line, "Qed without Proof"),
            _ => return script_error(line, &format!("unexpected {keyword}, expected Definition, Axiom or Theorem")),
        }
    }

    match pending {
        Some(theorem) => script_error(theorem.line, &format!("missing Qed for {}", theorem.name)),
        None => Ok(items),
    }
}

fn starts_item(text: &str) -> bool {
    ["Definition ", "Axiom ", "Theorem "].iter().any(|keyword| text.starts_with(keyword))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn items() {
        let script = "\
-- natural numbers
Definition one : Nat := (succ zero)
Axiom funext : Type  -- not really

Theorem id : (Pi A Type (Pi x (Var 0) (Var 1)))
Proof
  intro A
  intro x
  assumption
Qed
";
        let items = parse_script(script).unwrap();
        assert_eq!(items, vec![
            Item::Definition {
                name: "one",
                ty: "Nat",
                body: "(succ zero)",
                line: 2,
            },
            Item::Axiom {
                name: "funext",
                ty: "Type",
                line: 3,
            },
            Item::Theorem {
                name: "id",
                ty: "(Pi A Type (Pi x (Var 0) (Var 1)))",
                proof: vec![
                    TacticLine {
                        line: 7,
                        text: "intro A",
                        inline: false,
                    },
                    TacticLine {
                        line: 8,
                        text: "intro x",
                        inline: false,
                    },
                    TacticLine {
                        line: 9,
                        text: "assumption",
                        inline: false,
                    },
                ],
                line: 5,
            },
        ]);
    }

    #[test]
    fn inline_proofs() {
        let items = parse_script("Theorem r : (Id Nat zero zero) Proof reflexivity Qed").unwrap();
        assert_eq!(items, vec![Item::Theorem {
            name: "r",
            ty: "(Id Nat zero zero)",
            proof: vec![TacticLine {
                line: 1,
                text: "reflexivity",
                inline: true,
            }],
            line: 1,
        }]);

        let items = parse_script("Theorem ex-falso : (Pi e Empty Unit)\nProof intro e contradiction Qed").unwrap();
        let Item::Theorem { ref proof, .. } = items[0] else {
            panic!("expected a theorem");
        };
        assert_eq!(proof, &vec![TacticLine {
            line: 2,
            text: "intro e contradiction",
            inline: true,
        }]);
    }

    #[test]
    fn keywords_inside_terms() {
        let items = parse_script("Theorem t : (Pi Proof Type Proof) Proof intros Qed").unwrap();
        let Item::Theorem { ty, .. } = items[0] else {
            panic!("expected a theorem");
        };
        assert_eq!(ty, "(Pi Proof Type Proof)");
    }

    #[test]
    fn empty_scripts() {
        assert_eq!(parse_script(""), Ok(Vec::new()));
        assert_eq!(parse_script("-- nothing\n\n   -- at all\n"), Ok(Vec::new()));
    }

    #[test]
    fn malformed_scripts() {
        let err = parse_script("Proof\nQed").unwrap_err();
        assert_eq!(err.to_string(), "Proof without Theorem");
        assert_eq!(err.kind_name(), "parse error");

        let err = parse_script("Axiom a : Type\nQed").unwrap_err();
        assert_eq!(err.to_string(), "Qed without Proof");
        assert_eq!(err.location, Location::line(2));

        let err = parse_script("Theorem t : Unit\nProof\n  constructor\n").unwrap_err();
        assert_eq!(err.to_string(), "missing Qed for t");
        assert_eq!(err.location, Location::line(1));

        let err = parse_script("Theorem t : Unit\nProof\nAxiom a : Type").unwrap_err();
        assert_eq!(err.to_string(), "missing Qed for t");

        let err = parse_script("Theorem t : Unit\nconstructor").unwrap_err();
        assert_eq!(err.to_string(), "expected Proof for t");

        assert!(parse_script("Definition d : Nat").is_err());
        assert!(parse_script("Lemma l : Nat").is_err());
    }
}
