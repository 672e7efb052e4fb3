mod config;
mod wizard;

use accredit_api::{AccreditationApi, HttpApi, School, SchoolQuery, Session, submit_draft};
use accredit_spec::{
    Advance, DraftRepository, DraftStore, FieldValue, Pagination, Record, StepSequencer, StepSpec,
    WizardSpec, collect_option_ids, validate_form,
};
use clap::{Parser, Subcommand};
use serde_json::Value;
use std::collections::BTreeSet;
use std::fs;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use wizard::{Command as PromptCommand, RenderMode, Verbosity, WizardPresenter, parse_answer};

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

const DEFAULT_REQUEST_TYPE: &str = "accreditation";

#[derive(Parser)]
#[command(
    author,
    version,
    about = "School accreditation request wizard",
    long_about = "Fills accreditation requests step by step, keeps drafts between runs, and submits them to the accreditation service"
)]
struct Cli {
    /// Directory holding drafts and the session (defaults to ACCREDIT_DATA_DIR or ./.accredit).
    #[arg(long, value_name = "DIR", global = true)]
    data_dir: Option<PathBuf>,
    /// Show verbose output and debug logs.
    #[arg(long, alias = "debug", global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the accreditation wizard in a text shell.
    Wizard {
        /// Path to the WizardSpec JSON describing the steps.
        #[arg(long, value_name = "SPEC")]
        spec: PathBuf,
        /// Render output mode for each step.
        #[arg(long, value_enum, default_value_t = RenderMode::Text)]
        format: RenderMode,
    },
    /// Validate a JSON answers file against the wizard's field rules.
    Validate {
        #[arg(long, value_name = "SPEC")]
        spec: PathBuf,
        #[arg(long, value_name = "ANSWERS")]
        answers: PathBuf,
        /// Only validate this step id.
        #[arg(long, value_name = "ID")]
        step: Option<u32>,
    },
    /// Inspect or discard the saved draft.
    Draft {
        #[command(subcommand)]
        action: DraftAction,
    },
    /// Send the saved draft to the accreditation service.
    Submit {
        #[arg(long, value_name = "SPEC")]
        spec: PathBuf,
        /// School id (defaults to the school stored in the session).
        #[arg(long, value_name = "ID")]
        school: Option<String>,
        #[arg(long, value_name = "TYPE", default_value = DEFAULT_REQUEST_TYPE)]
        request_type: String,
        /// API base URL (defaults to ACCREDIT_API_URL).
        #[arg(long, value_name = "URL")]
        api_url: Option<String>,
    },
    /// Search the schools directory.
    Schools {
        #[arg(long, value_name = "TEXT")]
        query: Option<String>,
        /// Only list accredited schools.
        #[arg(long)]
        accredited: bool,
        #[arg(long, default_value_t = 1)]
        page: usize,
        #[arg(long, default_value_t = accredit_spec::pagination::DEFAULT_PER_PAGE)]
        per_page: usize,
        #[arg(long, value_name = "URL")]
        api_url: Option<String>,
    },
    /// Check an accreditation certificate number.
    Verify {
        number: String,
        #[arg(long, value_name = "URL")]
        api_url: Option<String>,
    },
    /// Store a session token and the school requests are made for.
    Login {
        #[arg(long)]
        token: String,
        #[arg(long, value_name = "NAME")]
        user: Option<String>,
        #[arg(long, value_name = "ID")]
        school: Option<String>,
    },
    /// Remove the stored session.
    Logout,
    /// Print the JSON schema of the wizard definition format.
    Schema,
}

#[derive(Subcommand)]
enum DraftAction {
    /// Print the saved draft and the options it selects.
    Show {
        #[arg(long, value_name = "SPEC")]
        spec: PathBuf,
    },
    /// Delete the saved draft.
    Clear {
        #[arg(long, value_name = "SPEC")]
        spec: PathBuf,
    },
}

fn main() -> CliResult<()> {
    let cli = Cli::parse();
    config::init_logging(cli.verbose);
    let data_dir = cli.data_dir;
    match cli.command {
        Command::Wizard { spec, format } => run_wizard(&spec, data_dir, cli.verbose, format),
        Command::Validate {
            spec,
            answers,
            step,
        } => run_validate(&spec, &answers, step),
        Command::Draft { action } => match action {
            DraftAction::Show { spec } => run_draft_show(&spec, data_dir),
            DraftAction::Clear { spec } => run_draft_clear(&spec, data_dir),
        },
        Command::Submit {
            spec,
            school,
            request_type,
            api_url,
        } => run_submit(&spec, data_dir, school, &request_type, api_url),
        Command::Schools {
            query,
            accredited,
            page,
            per_page,
            api_url,
        } => run_schools(
            data_dir,
            api_url,
            SchoolQuery {
                search: query,
                accredited_only: accredited,
                page,
                per_page,
            },
        ),
        Command::Verify { number, api_url } => run_verify(data_dir, api_url, &number),
        Command::Login {
            token,
            user,
            school,
        } => run_login(data_dir, token, user, school),
        Command::Logout => run_logout(data_dir),
        Command::Schema => run_schema(),
    }
}

fn load_spec(path: &Path) -> CliResult<WizardSpec> {
    WizardSpec::from_path(path).map_err(|err| err.to_string().into())
}

fn run_wizard(
    spec_path: &Path,
    data_dir: Option<PathBuf>,
    verbose: bool,
    format: RenderMode,
) -> CliResult<()> {
    let spec = load_spec(spec_path)?;
    let backend = config::backend(data_dir)?;
    let store = DraftStore::with_key(&backend, config::draft_key(&spec.id));
    info!(form = %spec.id, key = store.key(), "starting wizard");

    let mut presenter = WizardPresenter::new(Verbosity::from_verbose(verbose), format);
    presenter.show_header(&spec.title, spec.description.as_deref());

    let mut sequencer = StepSequencer::new(spec.steps.clone(), &store)?;
    let stdin = io::stdin();
    let outcome = drive_wizard(&mut sequencer, &presenter, &mut stdin.lock())?;
    match outcome {
        WizardOutcome::Completed => {
            presenter.show_message("All steps are complete and saved.");
            presenter.show_message("Run `accredit submit --spec <SPEC>` to send the request.");
        }
        WizardOutcome::Quit => {
            presenter.show_message("Wizard stopped. Completed steps are saved as a draft.");
        }
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WizardOutcome {
    Completed,
    Quit,
}

/// What to do once the prompts for the current step end.
enum StepAction {
    Advance,
    Back,
    Jump(usize),
    Quit,
}

/// Runs the prompt loop until every step is saved or the user quits.
///
/// End of input counts as quitting; unsaved edits on the current step are dropped.
fn drive_wizard<R: DraftRepository>(
    sequencer: &mut StepSequencer<R>,
    presenter: &WizardPresenter,
    input: &mut impl BufRead,
) -> CliResult<WizardOutcome> {
    loop {
        presenter.show_step(&sequencer.view());
        match fill_step(sequencer, presenter, input)? {
            StepAction::Advance => match sequencer.next() {
                Advance::Moved(index) => debug!(index, "moved to step"),
                Advance::Completed => return Ok(WizardOutcome::Completed),
                Advance::Blocked(errors) => presenter.show_errors(&errors),
            },
            StepAction::Back => {
                if sequencer.index() == 0 {
                    presenter.show_message("Already at the first step.");
                }
                sequencer.previous();
            }
            StepAction::Jump(position) => {
                if let Err(err) = sequencer.jump_to(position - 1) {
                    presenter.show_message(&format!("Cannot jump: {}.", err));
                }
            }
            StepAction::Quit => return Ok(WizardOutcome::Quit),
        }
    }
}

fn fill_step<R: DraftRepository>(
    sequencer: &mut StepSequencer<R>,
    presenter: &WizardPresenter,
    input: &mut impl BufRead,
) -> CliResult<StepAction> {
    let fields = sequencer.current_step().fields.clone();
    for field in &fields {
        loop {
            presenter.show_prompt(field, sequencer.current_data().get(&field.id));
            print!("> ");
            io::stdout().flush()?;
            let mut line = String::new();
            if input.read_line(&mut line)? == 0 {
                return Ok(StepAction::Quit);
            }
            let command = match PromptCommand::parse(&line) {
                Ok(command) => command,
                Err(err) => {
                    presenter.show_parse_error(&err);
                    continue;
                }
            };
            match command {
                PromptCommand::Keep => break,
                PromptCommand::Clear => {
                    sequencer.update(&field.id, field.kind.blank_value())?;
                    break;
                }
                PromptCommand::Value(raw) => match parse_answer(field, &raw) {
                    Ok(value) => {
                        sequencer.update(&field.id, value)?;
                        break;
                    }
                    Err(err) => presenter.show_parse_error(&err),
                },
                PromptCommand::Next => return Ok(StepAction::Advance),
                PromptCommand::Back => return Ok(StepAction::Back),
                PromptCommand::Jump(position) => return Ok(StepAction::Jump(position)),
                PromptCommand::Quit => return Ok(StepAction::Quit),
            }
        }
    }
    Ok(StepAction::Advance)
}

fn run_validate(spec_path: &Path, answers_path: &Path, only_step: Option<u32>) -> CliResult<()> {
    let spec = load_spec(spec_path)?;
    let answers: Value = serde_json::from_str(&fs::read_to_string(answers_path)?)?;
    let answers = record_from_json(&answers)?;

    let steps: Vec<&StepSpec> = match only_step {
        Some(id) => vec![
            spec.step(id)
                .ok_or_else(|| format!("wizard '{}' has no step {}", spec.id, id))?,
        ],
        None => spec.steps.iter().collect(),
    };

    let mut errors = Vec::new();
    for step in &steps {
        let Some(validators) = step.validators() else {
            continue;
        };
        let mut record = step.blank_record();
        for (key, value) in &answers {
            if step.field(key).is_some() {
                record.insert(key.clone(), value.clone());
            }
        }
        let result = validate_form(&record, &validators);
        errors.extend(
            result
                .errors
                .into_iter()
                .map(|(field, message)| (step.id, field, message)),
        );
    }
    let unknown = unknown_fields(&spec.steps, &answers);

    let valid = errors.is_empty() && unknown.is_empty();
    println!(
        "Validation result: {}",
        if valid { "valid" } else { "invalid" }
    );
    if !errors.is_empty() {
        println!("Errors:");
        for (step, field, message) in &errors {
            println!("  step {} {} - {}", step, field, message);
        }
    }
    if !unknown.is_empty() {
        println!("Unknown answer fields: {}", unknown.join(", "));
    }

    if valid {
        Ok(())
    } else {
        Err("validation failed".into())
    }
}

/// Keys that no step declares.
fn unknown_fields(steps: &[StepSpec], answers: &Record) -> Vec<String> {
    let declared: BTreeSet<&str> = steps
        .iter()
        .flat_map(|step| step.fields.iter().map(|field| field.id.as_str()))
        .collect();
    answers
        .keys()
        .filter(|key| !declared.contains(key.as_str()))
        .cloned()
        .collect()
}

/// Plain JSON answers (`{"field": "text" | number | bool | null}`) as a record.
fn record_from_json(value: &Value) -> CliResult<Record> {
    let object = value
        .as_object()
        .ok_or("answers must be a JSON object keyed by field id")?;
    let mut record = Record::new();
    for (key, value) in object {
        let value = match value {
            Value::Null => FieldValue::text(""),
            Value::String(text) => FieldValue::text(text.clone()),
            Value::Bool(flag) => FieldValue::Boolean(*flag),
            Value::Number(number) => FieldValue::Number(
                number
                    .as_f64()
                    .ok_or_else(|| format!("field '{}' is not a representable number", key))?,
            ),
            Value::Array(_) | Value::Object(_) => {
                return Err(
                    format!("field '{}' must be a string, number or boolean", key).into(),
                );
            }
        };
        record.insert(key.clone(), value);
    }
    Ok(record)
}

fn run_draft_show(spec_path: &Path, data_dir: Option<PathBuf>) -> CliResult<()> {
    let spec = load_spec(spec_path)?;
    let backend = config::backend(data_dir)?;
    let store = DraftStore::with_key(&backend, config::draft_key(&spec.id));
    let draft = store.load();
    if draft.is_empty() {
        println!("No saved draft for '{}'.", spec.id);
        return Ok(());
    }

    for step in &spec.steps {
        let Some(record) = draft.step(step.id) else {
            continue;
        };
        println!("Step {}: {}", step.id, step.title);
        for (field, value) in record.iter().filter(|(_, value)| !value.is_blank()) {
            println!("  {} = {}", field, value);
        }
    }
    let options = collect_option_ids(&spec.steps, &draft);
    if !options.is_empty() {
        println!("Selected options: {}", options.join(", "));
    }
    Ok(())
}

fn run_draft_clear(spec_path: &Path, data_dir: Option<PathBuf>) -> CliResult<()> {
    let spec = load_spec(spec_path)?;
    let backend = config::backend(data_dir)?;
    DraftStore::with_key(&backend, config::draft_key(&spec.id)).clear();
    println!("Draft for '{}' cleared.", spec.id);
    Ok(())
}

fn run_submit(
    spec_path: &Path,
    data_dir: Option<PathBuf>,
    school: Option<String>,
    request_type: &str,
    api_url: Option<String>,
) -> CliResult<()> {
    let spec = load_spec(spec_path)?;
    let backend = config::backend(data_dir)?;
    let api = HttpApi::new(config::api_config(api_url, &backend)?);
    let school = school
        .or_else(|| Session::load(&backend).and_then(|session| session.school_id))
        .unwrap_or_default();
    let store = DraftStore::with_key(&backend, config::draft_key(&spec.id));

    let receipt = submit_draft(&api, &store, &spec.steps, &school, request_type)
        .map_err(|err| err.user_message())?;
    println!("Request {} submitted.", receipt.id);
    if let Some(status) = receipt.status {
        println!("Status: {}", status);
    }
    if let Some(message) = receipt.message {
        println!("{}", message);
    }
    Ok(())
}

fn run_schools(
    data_dir: Option<PathBuf>,
    api_url: Option<String>,
    query: SchoolQuery,
) -> CliResult<()> {
    let backend = config::backend(data_dir)?;
    let api = HttpApi::new(config::api_config(api_url, &backend)?);
    let page = api
        .search_schools(&query)
        .map_err(|err| err.user_message())?;
    if page.data.is_empty() {
        println!("No schools found.");
        return Ok(());
    }
    for school in &page.data {
        println!("{}", describe_school(school));
    }
    print_paging(&page.pagination());
    Ok(())
}

fn describe_school(school: &School) -> String {
    let mut line = format!("{}  {}", school.id, school.name);
    if let Some(code) = &school.code {
        line.push_str(&format!(" ({})", code));
    }
    if let Some(district) = &school.district {
        line.push_str(&format!(", {}", district));
    }
    if school.accredited {
        line.push_str(" [accredited]");
    }
    line
}

fn print_paging(paging: &Pagination) {
    println!(
        "Showing {} (page {} of {})",
        paging.range_label(),
        paging.page,
        paging.total_pages()
    );
    if paging.has_next() {
        println!("More results: --page {}", paging.next_page().page);
    }
}

fn run_verify(data_dir: Option<PathBuf>, api_url: Option<String>, number: &str) -> CliResult<()> {
    let backend = config::backend(data_dir)?;
    let api = HttpApi::new(config::api_config(api_url, &backend)?);
    let certificate = api
        .verify_certificate(number)
        .map_err(|err| err.user_message())?;
    println!(
        "Certificate {}: {}",
        certificate.number,
        if certificate.valid { "valid" } else { "NOT valid" }
    );
    println!("School: {}", certificate.school_name);
    if let Some(combination) = &certificate.combination {
        println!("Combination: {}", combination);
    }
    println!("Issued: {}", certificate.issued_on);
    if let Some(expires) = &certificate.expires_on {
        println!("Expires: {}", expires);
    }
    Ok(())
}

fn run_login(
    data_dir: Option<PathBuf>,
    token: String,
    user_name: Option<String>,
    school_id: Option<String>,
) -> CliResult<()> {
    if token.trim().is_empty() {
        return Err("token cannot be empty".into());
    }
    let backend = config::backend(data_dir)?;
    let session = Session {
        token: token.trim().to_string(),
        user_name,
        school_id,
    };
    session.save(&backend)?;
    match &session.user_name {
        Some(name) => println!("Signed in as {}.", name),
        None => println!("Session saved."),
    }
    Ok(())
}

fn run_logout(data_dir: Option<PathBuf>) -> CliResult<()> {
    let backend = config::backend(data_dir)?;
    Session::clear(&backend)?;
    println!("Signed out.");
    Ok(())
}

fn run_schema() -> CliResult<()> {
    let schema = schemars::schema_for!(WizardSpec);
    println!("{}", serde_json::to_string_pretty(&schema)?);
    Ok(())
}
