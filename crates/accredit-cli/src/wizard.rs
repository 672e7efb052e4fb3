use accredit_spec::{
    FieldErrors, FieldKind, FieldSpec, FieldValue, StepView, build_step_payload, render_json_ui,
    render_text,
};

/// Controls which bits of state the wizard prints.
#[derive(Copy, Clone, Eq, PartialEq)]
pub enum Verbosity {
    /// Clean output: step headers and prompts only.
    Clean,
    /// Verbose output: full step rendering, choices, and parse expectations.
    Verbose,
}

impl Verbosity {
    pub fn from_verbose(verbose: bool) -> Self {
        if verbose {
            Verbosity::Verbose
        } else {
            Verbosity::Clean
        }
    }

    pub fn is_verbose(&self) -> bool {
        matches!(self, Verbosity::Verbose)
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, clap::ValueEnum)]
pub enum RenderMode {
    Text,
    Json,
}

/// A line typed at a field prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Answer for the field.
    Value(String),
    /// Blank line: keep the current value.
    Keep,
    Clear,
    /// Skip the remaining fields and try to advance.
    Next,
    Back,
    /// 1-based step number.
    Jump(usize),
    Quit,
}

impl Command {
    pub fn parse(line: &str) -> Result<Self, AnswerParseError> {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return Ok(Command::Keep);
        }
        let Some(command) = trimmed.strip_prefix(':') else {
            return Ok(Command::Value(trimmed.to_string()));
        };
        let mut parts = command.split_whitespace();
        match (parts.next(), parts.next()) {
            (Some("next"), None) => Ok(Command::Next),
            (Some("back"), None) => Ok(Command::Back),
            (Some("clear"), None) => Ok(Command::Clear),
            (Some("quit" | "exit"), None) => Ok(Command::Quit),
            (Some("jump"), Some(step)) => step
                .parse::<usize>()
                .ok()
                .filter(|step| *step > 0)
                .map(Command::Jump)
                .ok_or_else(|| {
                    AnswerParseError::new(
                        "Step numbers start at 1.",
                        Some(format!("could not read step number '{}'", step)),
                    )
                }),
            _ => Err(AnswerParseError::new(
                "Unknown command. Use :next, :back, :jump N, :clear or :quit.",
                None,
            )),
        }
    }
}

/// Prints step views, prompts, and errors.
pub struct WizardPresenter {
    verbosity: Verbosity,
    format: RenderMode,
    header_printed: bool,
}

impl WizardPresenter {
    pub fn new(verbosity: Verbosity, format: RenderMode) -> Self {
        Self {
            verbosity,
            format,
            header_printed: false,
        }
    }

    pub fn show_header(&mut self, title: &str, description: Option<&str>) {
        if self.header_printed {
            return;
        }
        println!("Form: {}", title);
        if self.verbosity.is_verbose()
            && let Some(description) = description
        {
            println!("Help: {}", description);
        }
        println!("Commands: :next, :back, :jump N, :clear, :quit (blank keeps the current value)");
        self.header_printed = true;
    }

    pub fn show_step(&self, view: &StepView<'_>) {
        let payload = build_step_payload(view);
        match self.format {
            RenderMode::Json => {
                println!("{}", render_json_ui(&payload));
            }
            RenderMode::Text if self.verbosity.is_verbose() => {
                println!("{}", render_text(&payload));
            }
            RenderMode::Text => {
                println!(
                    "Step {}/{}: {}",
                    payload.progress.position, payload.progress.total, payload.title
                );
            }
        }
    }

    pub fn show_prompt(&self, field: &FieldSpec, current: Option<&FieldValue>) {
        let mut line = field.title.clone();
        if field.is_required() {
            line.push_str(" *");
        }
        if let Some(hint) = kind_hint(field) {
            line.push(' ');
            line.push_str(&hint);
        }
        if let Some(current) = current.filter(|value| !value.is_blank()) {
            line.push_str(&format!(" [{}]", current));
        }
        println!("{}", line);
        if let Some(description) = &field.description {
            println!("{}", description);
        }
        if self.verbosity.is_verbose() && !field.choices.is_empty() {
            for (index, choice) in field.choices.iter().enumerate() {
                println!("  {}) {} ({})", index + 1, choice.label, choice.id);
            }
        }
    }

    pub fn show_errors(&self, errors: &FieldErrors) {
        println!("Please fix the following before continuing:");
        for (field, message) in errors {
            println!("  {}: {}", field, message);
        }
    }

    pub fn show_parse_error(&self, error: &AnswerParseError) {
        eprintln!("Invalid answer: {}", error.user_message);
        if self.verbosity.is_verbose()
            && let Some(debug) = &error.debug_message
        {
            eprintln!("  Expected: {}", debug);
        }
    }

    pub fn show_message(&self, message: &str) {
        println!("{}", message);
    }
}

fn kind_hint(field: &FieldSpec) -> Option<String> {
    match field.kind {
        FieldKind::Boolean => Some("(yes/no)".to_string()),
        FieldKind::Number => Some("(number)".to_string()),
        FieldKind::Document => Some("(document reference)".to_string()),
        FieldKind::Choice if !field.choices.is_empty() => Some(format!(
            "({})",
            field
                .choices
                .iter()
                .map(|choice| choice.id.as_str())
                .collect::<Vec<_>>()
                .join("/")
        )),
        FieldKind::Choice | FieldKind::Text => None,
    }
}

/// Error produced when parsing answers from the user.
#[derive(Debug, PartialEq, Eq)]
pub struct AnswerParseError {
    pub user_message: String,
    pub debug_message: Option<String>,
}

impl AnswerParseError {
    pub fn new(user_message: impl Into<String>, debug_message: Option<String>) -> Self {
        Self {
            user_message: user_message.into(),
            debug_message,
        }
    }
}

/// Converts typed input into a value for `field`.
///
/// Numbers that fail to parse are kept as text so the step validators report them.
pub fn parse_answer(field: &FieldSpec, raw: &str) -> Result<FieldValue, AnswerParseError> {
    let raw = raw.trim();
    match field.kind {
        FieldKind::Text => Ok(FieldValue::text(raw)),
        FieldKind::Number => Ok(raw
            .parse::<f64>()
            .ok()
            .filter(|value| value.is_finite())
            .map(FieldValue::Number)
            .unwrap_or_else(|| FieldValue::text(raw))),
        FieldKind::Boolean => parse_boolean(raw),
        FieldKind::Choice => parse_choice(field, raw),
        FieldKind::Document => Ok(FieldValue::Document(raw.to_string())),
    }
}

fn parse_boolean(raw: &str) -> Result<FieldValue, AnswerParseError> {
    match raw.to_lowercase().as_str() {
        "true" | "t" | "yes" | "y" | "1" => Ok(FieldValue::Boolean(true)),
        "false" | "f" | "no" | "n" | "0" => Ok(FieldValue::Boolean(false)),
        _ => Err(AnswerParseError::new(
            "Please enter yes or no.",
            Some("expected boolean (y/n/true/false)".to_string()),
        )),
    }
}

/// Accepts an option id, its label, or its 1-based position.
fn parse_choice(field: &FieldSpec, raw: &str) -> Result<FieldValue, AnswerParseError> {
    if field.choices.is_empty() {
        return Ok(FieldValue::text(raw));
    }
    let by_position = raw
        .parse::<usize>()
        .ok()
        .and_then(|position| position.checked_sub(1))
        .and_then(|index| field.choices.get(index));
    let choice = field
        .choices
        .iter()
        .find(|choice| choice.id.eq_ignore_ascii_case(raw))
        .or_else(|| {
            field
                .choices
                .iter()
                .find(|choice| choice.label.eq_ignore_ascii_case(raw))
        })
        .or(by_position);

    match choice {
        Some(choice) => Ok(FieldValue::text(choice.id.clone())),
        None => {
            let allowed = field
                .choices
                .iter()
                .map(|choice| choice.id.as_str())
                .collect::<Vec<_>>();
            Err(AnswerParseError::new(
                format!("Choose one of: {}.", allowed.join(", ")),
                Some(format!("allowed values: {}", allowed.join(", "))),
            ))
        }
    }
}
