//! The interactive proof mode.

use hott::{run_line, Session};
use rustyline::error::ReadlineError;
use rustyline::{Cmd, Editor, EventHandler, KeyCode, KeyEvent, Modifiers};
use tactics::ProofState;

use crate::process::{describe, print_err, print_ok};
use crate::rustyline_helper::{RustyLineHelper, TabEventHandler};

const VERSION: &str = env!("CARGO_PKG_VERSION");
const NAME: &str = env!("CARGO_PKG_NAME");

/// A theorem being proved.
struct Proof {
    name: String,
    state: ProofState,
}

struct Prover {
    session: Session,
    proof: Option<Proof>,
}

type Outcome = Result<String, String>;

fn failure(err: &hott::Error) -> String {
    describe(err)
}

impl Prover {
    fn item(&mut self, line: &str) -> Outcome {
        let items = parser::parse_script(line).map_err(|err| failure(&err.into()))?;
        items.iter().try_fold(String::new(), |_, item| {
            self.session.run_item(item).map_err(|err| failure(&err))?;
            Ok(format!("{} {} added", item.kind(), item.name()))
        })
    }

    fn start(&mut self, statement: &str) -> Outcome {
        let Some((name, ty)) = statement.split_once(':') else {
            return Err("expected Theorem NAME : TYPE".to_owned());
        };
        let name = name.trim();
        if self.session.environment().contains(name) {
            return Err(format!("{name} is already defined"));
        }
        let state = self.session.start_proof(ty.trim()).map_err(|err| failure(&err))?;
        let message = state.format_state();
        self.proof = Some(Proof {
            name: name.to_owned(),
            state,
        });
        Ok(message)
    }

    /// Handles a line while a theorem is being proved.
    fn step(&mut self, line: &str) -> Outcome {
        let Some(ref mut proof) = self.proof else {
            return Err("no theorem is being proved, start one with Theorem NAME : TYPE".to_owned());
        };
        match line {
            "Proof" => Ok(String::new()),
            "goals" => Ok(proof.state.format_state()),
            "undo" => {
                proof.state.undo().map_err(|err| failure(&err.into()))?;
                Ok(proof.state.format_state())
            },
            "extract" => proof.state.extract().map(|term| term.to_string()).map_err(|err| failure(&err.into())),
            "abort" => {
                self.proof = None;
                Ok("proof aborted".to_owned())
            },
            "qed" | "Qed" => {
                let term = self.session.qed(&proof.name, &proof.state).map_err(|err| failure(&err))?;
                let message = format!("Theorem {} added\n{term}", proof.name);
                self.proof = None;
                Ok(message)
            },
            _ => {
                run_line(&mut proof.state, line, true).map_err(|err| failure(&err))?;
                Ok(proof.state.format_state())
            },
        }
    }

    fn process(&mut self, line: &str) -> Outcome {
        let line = line.trim();
        if let Some(statement) = line.strip_prefix("Theorem ") {
            return self.start(statement);
        }
        if line.starts_with("Definition ") || line.starts_with("Axiom ") {
            return self.item(line);
        }
        if let Some(expr) = line.strip_prefix("eval ") {
            return self.session.eval(expr).map(|term| term.to_string()).map_err(|err| failure(&err));
        }
        if let Some(expr) = line.strip_prefix("synth ") {
            return self.session.synth(expr).map(|(_, ty)| ty.to_string()).map_err(|err| failure(&err));
        }
        self.step(line)
    }
}

pub fn repl(session: Session, color: bool) -> rustyline::Result<()> {
    let helper = RustyLineHelper::new(color);
    let mut rl = Editor::<RustyLineHelper>::new()?;
    rl.set_helper(Some(helper));
    rl.bind_sequence(KeyEvent::from('\t'), EventHandler::Conditional(Box::new(TabEventHandler)));
    rl.bind_sequence(KeyEvent(KeyCode::Enter, Modifiers::ALT), EventHandler::Simple(Cmd::Newline));
    println!("Welcome to {NAME} {VERSION}");

    let mut prover = Prover { session, proof: None };

    loop {
        let prompt = if prover.proof.is_some() { "proof \u{00BB} " } else { "\u{00BB} " };
        match rl.readline(prompt) {
            Ok(line) if !line.trim().is_empty() => {
                rl.add_history_entry(line.as_str());
                match prover.process(&line) {
                    Ok(message) => print_ok(&message),
                    Err(message) => print_err(&message),
                }
            },
            Ok(_) | Err(ReadlineError::Interrupted) => {},
            Err(ReadlineError::Eof) => break,
            Err(err) => return Err(err),
        }
    }
    Ok(())
}
