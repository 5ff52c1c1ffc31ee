//! Interactive session loop.

use std::borrow::Cow::{self, Borrowed, Owned};
use std::sync::Arc;

use anyhow::Result;
use colored::Colorize;
use rustyline::completion::{Completer, Pair};
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::validate::Validator;
use rustyline::{Context, Editor, Helper};
use tokio::sync::mpsc;

use crate::commands::{ButtonField, COMMAND_NAMES, EditField, HELP, ReplCommand};
use crate::event_layer::AutoSaveEvent;
use crate::render::{TerminalObserver, render_buffer, render_progress, render_screen};
use scriptflow_application::ScriptViewer;
use scriptflow_core::ScriptflowError;
use scriptflow_core::session::{ButtonAction, NavigationOutcome};

/// Completion, highlighting and hints for the command names.
#[derive(Clone)]
struct ReplHelper;

impl Helper for ReplHelper {}

impl Completer for ReplHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let line = &line[..pos];
        if line.contains(' ') {
            return Ok((0, vec![]));
        }
        let candidates = COMMAND_NAMES
            .iter()
            .filter(|cmd| cmd.starts_with(line))
            .map(|cmd| Pair {
                display: cmd.to_string(),
                replacement: cmd.to_string(),
            })
            .collect();
        Ok((0, candidates))
    }
}

impl Highlighter for ReplHelper {
    fn highlight<'l>(&self, line: &'l str, _pos: usize) -> Cow<'l, str> {
        match line.split_whitespace().next() {
            Some(first) if COMMAND_NAMES.contains(&first) => {
                Owned(format!("{}{}", first.bright_cyan(), &line[first.len()..]))
            }
            _ => Borrowed(line),
        }
    }

    fn highlight_char(&self, _line: &str, _pos: usize, _forced: bool) -> bool {
        true
    }
}

impl Hinter for ReplHelper {
    type Hint = String;

    fn hint(&self, line: &str, pos: usize, _ctx: &Context<'_>) -> Option<String> {
        let line = &line[..pos];
        if line.is_empty() || line.contains(' ') {
            return None;
        }
        COMMAND_NAMES
            .iter()
            .find(|cmd| cmd.starts_with(line) && cmd.len() > line.len())
            .map(|cmd| cmd[line.len()..].to_string())
    }
}

impl Validator for ReplHelper {}

/// Runs the REPL until `quit` or end of input, then flushes pending saves.
pub async fn run(viewer: Arc<ScriptViewer>, mut events: mpsc::UnboundedReceiver<AutoSaveEvent>) -> Result<()> {
    viewer.add_observer(Arc::new(TerminalObserver)).await;

    let event_printer = tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            let line = format!(
                "autosave {} {}: {}",
                event.op.as_deref().unwrap_or("?"),
                event.id.as_deref().unwrap_or("?"),
                event.message
            );
            if event.is_failure() {
                println!("{}", line.red());
            } else {
                println!("{}", line.bright_black());
            }
        }
    });

    println!("{}", "=== Scriptflow ===".bright_magenta().bold());
    println!("{}", "Type 'help' for commands, 'quit' to exit.".bright_black());

    match viewer.bootstrap().await {
        Ok(origin) => tracing::debug!("[Repl] Bootstrapped from {:?}", origin),
        Err(e) => eprintln!("{}", format!("Could not load the script: {}", e).red()),
    }

    let mut rl = Editor::new()?;
    rl.set_helper(Some(ReplHelper));

    loop {
        match rl.readline("scriptflow> ") {
            Ok(line) => {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }
                let _ = rl.add_history_entry(trimmed);

                let command = match ReplCommand::parse(trimmed) {
                    Ok(command) => command,
                    Err(message) => {
                        println!("{}", message.yellow());
                        continue;
                    }
                };
                if command == ReplCommand::Quit {
                    break;
                }
                if let Err(e) = execute(&viewer, command).await {
                    report(&e);
                }
            }
            Err(rustyline::error::ReadlineError::Interrupted) => {
                println!("{}", "CTRL-C detected. Type 'quit' to exit.".yellow());
            }
            Err(rustyline::error::ReadlineError::Eof) => break,
            Err(err) => {
                eprintln!("{}", format!("Error: {:?}", err).red());
                break;
            }
        }
    }

    let flushed = viewer.flush().await;
    if flushed > 0 {
        println!("{}", format!("Saved {} pending change(s).", flushed).bright_black());
    }
    println!("{}", "Goodbye!".bright_green());

    event_printer.abort();
    Ok(())
}

fn report(error: &ScriptflowError) {
    if error.is_user_visible() {
        println!("{}", error.to_string().yellow());
    } else {
        eprintln!("{}", error.to_string().red());
    }
}

fn report_outcome(outcome: NavigationOutcome) {
    if outcome == NavigationOutcome::Ignored {
        println!("{}", "Nothing to open there.".bright_black());
    }
}

/// Executes one parsed command against the viewer.
pub async fn execute(viewer: &ScriptViewer, command: ReplCommand) -> Result<(), ScriptflowError> {
    match command {
        ReplCommand::Show => {
            let rendered = viewer
                .with_context(|ctx| {
                    ctx.current_screen()
                        .map(|screen| render_screen(screen, &ctx.progress()))
                })
                .await;
            match rendered {
                Some(text) => print!("{}", text),
                None => println!("{}", "No screen loaded.".bright_black()),
            }
        }
        ReplCommand::Press(index) => match viewer.press_button(index).await? {
            ButtonAction::Navigated(outcome) => report_outcome(outcome),
            ButtonAction::ResetRequested => {}
        },
        ReplCommand::Go(id) => report_outcome(viewer.goto(&id).await),
        ReplCommand::Back => report_outcome(viewer.back().await),
        ReplCommand::Reset => viewer.hard_reset().await?,
        ReplCommand::Service(service_type) => {
            viewer.select_service_type(service_type).await;
            println!("{}", format!("Service: {}", service_type).bright_black());
        }
        ReplCommand::Person(person_type) => {
            viewer.select_person_type(person_type).await?;
            println!("{}", format!("Person: {}", person_type).bright_black());
        }
        ReplCommand::Product(product) => {
            viewer.select_product(&product).await?;
            println!("{}", format!("Product: {}", product).bright_black());
        }
        ReplCommand::Start => report_outcome(viewer.start().await?),
        ReplCommand::Tab => {
            let disposition = viewer
                .with_context(|ctx| ctx.current_screen().map(|s| s.disposition().to_string()))
                .await;
            if let Some(disposition) = disposition {
                println!("{} {}", "Tabulação:".bright_yellow(), disposition);
            }
        }
        ReplCommand::Jump(None) => {
            for (i, (id, title)) in viewer.jump_list().await.iter().enumerate() {
                println!("  {:>2}. {} {}", i + 1, title, format!("({})", id).bright_black());
            }
        }
        ReplCommand::Jump(Some(index)) => {
            let list = viewer.jump_list().await;
            let (id, _) = list
                .get(index)
                .ok_or_else(|| ScriptflowError::validation("No such entry in the jump list."))?;
            report_outcome(viewer.goto(id).await);
        }
        ReplCommand::Find(term) => report_outcome(viewer.find(&term).await?),
        ReplCommand::Progress => println!("{}", render_progress(&viewer.progress().await)),
        ReplCommand::Admin(id) => {
            let id = match id {
                Some(id) => id,
                None => viewer
                    .with_context(|ctx| ctx.current_id().map(str::to_string))
                    .await
                    .ok_or_else(|| ScriptflowError::validation("No current screen to edit."))?,
            };
            let buffer = viewer
                .begin_edit(&id)
                .await
                .ok_or_else(|| ScriptflowError::not_found("screen", id.clone()))?;
            print!("{}", render_buffer(&buffer));
        }
        ReplCommand::Edit(field, value) => {
            let number = if field.is_numeric() {
                Some(value.trim_end_matches("px").parse::<u32>().map_err(|_| {
                    ScriptflowError::validation(format!("'{}' is not a size in pixels", value))
                })?)
            } else {
                None
            };
            edit_buffer(viewer, |b| match field {
                EditField::Id => b.id = value,
                EditField::Title => b.title = value,
                EditField::Body => b.body = value,
                EditField::Tab => b.tab = value,
                EditField::FontSizeTitle => b.font_size_title = number,
                EditField::FontSizeBody => b.font_size_body = number,
                EditField::FontSizeButtons => b.font_size_buttons = number,
                EditField::PaddingBody => b.padding_body = number,
            })
            .await?;
        }
        ReplCommand::ButtonAdd => edit_buffer(viewer, |b| b.add_button_row()).await?,
        ReplCommand::ButtonRemove(index) => {
            viewer
                .remove_button_row(index)
                .await
                .ok_or_else(|| ScriptflowError::validation("No such button row."))?;
            show_buffer(viewer).await;
        }
        ReplCommand::ButtonSet(index, field, value) => {
            let mut found = false;
            edit_buffer(viewer, |b| {
                if let Some(row) = b.buttons.get_mut(index) {
                    found = true;
                    match field {
                        ButtonField::Label => row.label = value,
                        ButtonField::Next => row.next = value,
                        ButtonField::Primary => {
                            row.primary = matches!(value.as_str(), "true" | "yes" | "sim" | "1")
                        }
                    }
                }
            })
            .await?;
            if !found {
                return Err(ScriptflowError::validation("No such button row."));
            }
        }
        ReplCommand::Apply => {
            let applied = viewer.apply_edit().await?;
            let note = if applied.renamed() {
                format!("Saved '{}' (renamed from '{}').", applied.screen.id, applied.previous_id)
            } else {
                format!("Saved '{}'.", applied.screen.id)
            };
            println!("{}", note.bright_green());
        }
        ReplCommand::Delete(id) => {
            let id = match id {
                Some(id) => id,
                None => viewer
                    .edit_buffer()
                    .await
                    .map(|b| b.id)
                    .ok_or_else(|| ScriptflowError::validation("Nothing to delete: no screen under edit."))?,
            };
            let removed = viewer.delete_screen(&id).await?;
            println!("{}", format!("Deleted '{}'.", removed.id).bright_green());
        }
        ReplCommand::Flush => {
            let flushed = viewer.flush().await;
            let stats = viewer.autosave_stats().unwrap_or_default();
            println!(
                "{}",
                format!(
                    "Flushed {} write(s). Totals: {} saved, {} deleted, {} failed.",
                    flushed, stats.upserts, stats.deletes, stats.failures
                )
                .bright_black()
            );
        }
        ReplCommand::Help => println!("{}", HELP),
        ReplCommand::Quit => {}
    }
    Ok(())
}

async fn edit_buffer(
    viewer: &ScriptViewer,
    f: impl FnOnce(&mut scriptflow_core::admin::EditBuffer),
) -> Result<(), ScriptflowError> {
    if !viewer.update_buffer(f).await {
        return Err(ScriptflowError::validation("No screen under edit. Use 'admin' first."));
    }
    show_buffer(viewer).await;
    Ok(())
}

async fn show_buffer(viewer: &ScriptViewer) {
    if let Some(buffer) = viewer.edit_buffer().await {
        print!("{}", render_buffer(&buffer));
    }
}
