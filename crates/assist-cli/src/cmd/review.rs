use crate::output::{print_json, print_report, print_rewrite};
use anyhow::Context;
use assist_core::analyzer::AnalysisReport;
use assist_core::session::{Resolution, Session};
use assist_core::types::Finding;
use std::io::{BufRead, Write};
use std::path::Path;

const HELP: &str = "\
Commands:
  choose N K   pick option K for decision N
  action N K   take suggested action K on finding N
  ignore N     hide advisory N's category for this session
  apply        write chosen options into the document and re-analyze
  analyze      re-analyze without writing
  help         show this help
  quit         leave (unapplied choices are discarded)";

#[derive(Debug, PartialEq, Eq)]
enum ReviewCommand {
    Choose { finding: usize, option: usize },
    Action { finding: usize, action: usize },
    Ignore { finding: usize },
    Apply,
    Analyze,
    Help,
    Quit,
}

enum Flow {
    Continue,
    Quit,
}

pub fn run(root: &Path, file: Option<&Path>, json: bool) -> anyhow::Result<()> {
    let path = super::context_path(root, file)?;
    let mut session = Session::default();
    let report = session
        .analyze(&path)
        .with_context(|| format!("failed to analyze {}", path.display()))?;
    show(&report, json)?;
    if !json {
        println!("\n{HELP}");
    }

    let stdin = std::io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        if !json {
            print!("> ");
            std::io::stdout().flush()?;
        }
        let Some(line) = lines.next() else { break };
        let line = line.context("failed to read stdin")?;
        let command = match parse_command(&line) {
            Ok(Some(c)) => c,
            Ok(None) => continue,
            Err(msg) => {
                eprintln!("error: {msg}");
                continue;
            }
        };
        match execute(&mut session, &path, command, json) {
            Ok(Flow::Continue) => {}
            Ok(Flow::Quit) => break,
            Err(e) => eprintln!("error: {e:#}"),
        }
    }

    let pending = session.decisions().len();
    if pending > 0 && !json {
        println!("{pending} choix non appliqué(s).");
    }
    Ok(())
}

fn execute(
    session: &mut Session,
    path: &Path,
    command: ReviewCommand,
    json: bool,
) -> anyhow::Result<Flow> {
    let say = |msg: String| {
        if !json {
            println!("{msg}");
        }
    };

    match command {
        ReviewCommand::Choose { finding, option } => {
            let f = finding_at(session, finding)?;
            if !f.is_decision() {
                anyhow::bail!("finding #{finding} is not a decision");
            }
            let category = category_of(f, finding)?;
            let choice = f
                .options
                .get(option.wrapping_sub(1))
                .cloned()
                .ok_or_else(|| anyhow::anyhow!("finding #{finding} has no option {option}"))?;
            session.choose(&category, &choice)?;
            say(format!("Choix enregistré : {category} = {choice}"));
        }
        ReviewCommand::Action { finding, action } => {
            let f = finding_at(session, finding)?;
            let category = category_of(f, finding)?;
            let label = f
                .suggested_actions
                .get(action.wrapping_sub(1))
                .cloned()
                .ok_or_else(|| anyhow::anyhow!("finding #{finding} has no action {action}"))?;
            if session.record_action(&category, &label)? {
                say(format!("Catégorie ignorée : {category}"));
            } else {
                say(format!("Action notée : {label}"));
            }
        }
        ReviewCommand::Ignore { finding } => {
            let f = finding_at(session, finding)?;
            if f.is_decision() {
                anyhow::bail!("finding #{finding} is a decision and cannot be ignored; use 'choose'");
            }
            let category = category_of(f, finding)?;
            session.resolve(Resolution::Ignored {
                category: category.clone(),
            })?;
            say(format!("Catégorie ignorée : {category}"));
        }
        ReviewCommand::Apply => {
            let outcome = session
                .apply_and_reanalyze(path)
                .context("failed to apply decisions")?;
            if json {
                print_json(&outcome)?;
            } else {
                if let Some(rewrite) = &outcome.rewrite {
                    print_rewrite(path, rewrite);
                }
                print_report(&outcome.report);
            }
        }
        ReviewCommand::Analyze => {
            let report = session.analyze(path)?;
            show(&report, json)?;
        }
        ReviewCommand::Help => say(HELP.to_string()),
        ReviewCommand::Quit => return Ok(Flow::Quit),
    }
    Ok(Flow::Continue)
}

fn show(report: &AnalysisReport, json: bool) -> anyhow::Result<()> {
    if json {
        print_json(report)
    } else {
        print_report(report);
        Ok(())
    }
}

/// 1-based lookup into the displayed findings.
fn finding_at(session: &Session, n: usize) -> anyhow::Result<&Finding> {
    session
        .findings()
        .get(n.wrapping_sub(1))
        .ok_or_else(|| anyhow::anyhow!("no finding #{n}"))
}

fn category_of(f: &Finding, n: usize) -> anyhow::Result<String> {
    f.category
        .clone()
        .ok_or_else(|| anyhow::anyhow!("finding #{n} has no category"))
}

fn parse_command(line: &str) -> Result<Option<ReviewCommand>, String> {
    let words: Vec<&str> = line.split_whitespace().collect();
    let Some((&head, args)) = words.split_first() else {
        return Ok(None);
    };
    let num = |i: usize| -> Result<usize, String> {
        let raw = args
            .get(i)
            .ok_or_else(|| format!("'{head}' expects {} number(s)", i + 1))?;
        match raw.parse::<usize>() {
            Ok(n) if n > 0 => Ok(n),
            _ => Err(format!("'{raw}' is not a positive number")),
        }
    };

    let command = match head.to_lowercase().as_str() {
        "choose" | "c" => ReviewCommand::Choose {
            finding: num(0)?,
            option: num(1)?,
        },
        "action" | "a" => ReviewCommand::Action {
            finding: num(0)?,
            action: num(1)?,
        },
        "ignore" | "i" => ReviewCommand::Ignore { finding: num(0)? },
        "apply" => ReviewCommand::Apply,
        "analyze" => ReviewCommand::Analyze,
        "help" | "?" => ReviewCommand::Help,
        "quit" | "exit" | "q" => ReviewCommand::Quit,
        other => return Err(format!("unknown command '{other}' (try 'help')")),
    };
    Ok(Some(command))
}
