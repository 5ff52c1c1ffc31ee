//! REPL command grammar.

use scriptflow_core::session::{PersonType, ServiceType};

/// Command names offered for completion.
pub const COMMAND_NAMES: &[&str] = &[
    "show", "press", "go", "back", "reset", "service", "person", "product", "start", "tab",
    "jump", "find", "progress", "admin", "edit", "button", "apply", "delete", "flush", "help",
    "quit",
];

/// A field of the edit form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditField {
    Id,
    Title,
    Body,
    Tab,
    FontSizeTitle,
    FontSizeBody,
    FontSizeButtons,
    PaddingBody,
}

impl EditField {
    fn parse(name: &str) -> Option<Self> {
        Some(match name {
            "id" => Self::Id,
            "title" => Self::Title,
            "body" => Self::Body,
            "tab" => Self::Tab,
            "font-title" => Self::FontSizeTitle,
            "font-body" => Self::FontSizeBody,
            "font-buttons" => Self::FontSizeButtons,
            "padding" => Self::PaddingBody,
            _ => return None,
        })
    }

    pub fn is_numeric(self) -> bool {
        matches!(
            self,
            Self::FontSizeTitle | Self::FontSizeBody | Self::FontSizeButtons | Self::PaddingBody
        )
    }
}

/// A field of one button row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonField {
    Label,
    Next,
    Primary,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplCommand {
    Show,
    /// Zero-based button index.
    Press(usize),
    Go(String),
    Back,
    Reset,
    Service(ServiceType),
    Person(PersonType),
    Product(String),
    Start,
    Tab,
    /// List the jump menu, or jump to a zero-based entry.
    Jump(Option<usize>),
    Find(String),
    Progress,
    /// Bind the edit form to a screen (the current one when omitted).
    Admin(Option<String>),
    Edit(EditField, String),
    ButtonAdd,
    ButtonRemove(usize),
    ButtonSet(usize, ButtonField, String),
    Apply,
    Delete(Option<String>),
    Flush,
    Help,
    Quit,
}

impl ReplCommand {
    /// Parses one input line. Numbers typed by the user are one-based.
    pub fn parse(line: &str) -> Result<Self, String> {
        let line = line.trim();
        let (name, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
        let rest = rest.trim();

        let command = match name {
            "show" | "s" => Self::Show,
            "press" | "p" => Self::Press(index(rest)?),
            "go" => Self::Go(required(rest, "go <id>")?),
            "back" | "b" => Self::Back,
            "reset" => Self::Reset,
            "service" => Self::Service(
                ServiceType::from_selector(rest)
                    .ok_or_else(|| "usage: service <ativo|receptivo>".to_string())?,
            ),
            "person" => Self::Person(PersonType::from_selector(&required(rest, "person <pf|pj>")?)),
            "product" => Self::Product(required(rest, "product <name>")?),
            "start" => Self::Start,
            "tab" => Self::Tab,
            "jump" => Self::Jump(if rest.is_empty() { None } else { Some(index(rest)?) }),
            "find" => Self::Find(required(rest, "find <term>")?),
            "progress" => Self::Progress,
            "admin" => Self::Admin(optional(rest)),
            "edit" => {
                let (field, value) = rest.split_once(char::is_whitespace).unwrap_or((rest, ""));
                let field = EditField::parse(field).ok_or_else(|| {
                    "usage: edit <id|title|body|tab|font-title|font-body|font-buttons|padding> <value>"
                        .to_string()
                })?;
                Self::Edit(field, value.trim().to_string())
            }
            "button" => Self::parse_button(rest)?,
            "apply" => Self::Apply,
            "delete" => Self::Delete(optional(rest)),
            "flush" => Self::Flush,
            "help" | "?" => Self::Help,
            "quit" | "exit" | "q" => Self::Quit,
            other => return Err(format!("unknown command '{}', try 'help'", other)),
        };
        Ok(command)
    }

    fn parse_button(rest: &str) -> Result<Self, String> {
        const USAGE: &str = "usage: button add | rm <n> | set <n> <label|next|primary> <value>";
        let mut parts = rest.splitn(4, char::is_whitespace);
        match parts.next() {
            Some("add") => Ok(Self::ButtonAdd),
            Some("rm") => Ok(Self::ButtonRemove(index(parts.next().unwrap_or(""))?)),
            Some("set") => {
                let n = index(parts.next().unwrap_or(""))?;
                let field = match parts.next() {
                    Some("label") => ButtonField::Label,
                    Some("next") => ButtonField::Next,
                    Some("primary") => ButtonField::Primary,
                    _ => return Err(USAGE.to_string()),
                };
                Ok(Self::ButtonSet(n, field, parts.next().unwrap_or("").trim().to_string()))
            }
            _ => Err(USAGE.to_string()),
        }
    }
}

fn index(value: &str) -> Result<usize, String> {
    match value.trim().parse::<usize>() {
        Ok(n) if n >= 1 => Ok(n - 1),
        _ => Err(format!("expected a number from 1, got '{}'", value.trim())),
    }
}

fn required(value: &str, usage: &str) -> Result<String, String> {
    optional(value).ok_or_else(|| format!("usage: {}", usage))
}

fn optional(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

pub const HELP: &str = "\
Navigation
  show                      redraw the current screen
  press <n>                 press button n
  go <id> | back            jump to a screen | go back
  reset                     restart the session
  service <ativo|receptivo> person <pf|pj> product <name>
  start                     open the selected product's first screen
  tab | progress            disposition | progress of the current screen
  jump [n]                  list visited screens, or revisit entry n
  find <term>               open the first screen mentioning <term>
Admin
  admin [id]                edit a screen (current one by default)
  edit <field> <value>      id, title, body, tab, font-title, font-body, font-buttons, padding
  button add | rm <n> | set <n> <label|next|primary> <value>
  apply | delete [id]       save the form | delete a screen
  flush                     push pending saves now
  help | quit";
