use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::api::client::{ApiClient, ApiRequest};
use crate::cli::commands::*;
use crate::cli::output::*;
use crate::io::doc_io::{read_json, write_json};
use crate::io::{config_io, session_io};
use crate::model::activity::{Activity, ChecklistItem, DateBound, Measurement};
use crate::model::cell::CellValue;
use crate::model::config::Config;
use crate::model::doc_tree::{DocNode, DocTree, NewFile};
use crate::model::project::{Project, ProjectStatus};
use crate::model::table::TableDoc;
use crate::model::user::{ProjectRef, Role, User};
use crate::ops::checklist_ops::{self, ChecklistEdit, EditOutcome};
use crate::ops::measurement_ops::{self, MeasurementError};
use crate::ops::table_ops::TableEngine;
use crate::ops::tree_ops;
use crate::ops::validate::{
    self, FieldError, FormMode, ProjectForm, UserForm, password_strength, strength_label,
};

type CmdResult = Result<(), Box<dyn Error>>;

/// Where relative paths resolve and how results print
struct Ctx {
    dir: PathBuf,
    json: bool,
}

impl Ctx {
    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.dir.join(path)
        }
    }

    fn print_json<T: serde::Serialize>(&self, value: &T) -> CmdResult {
        println!("{}", serde_json::to_string_pretty(value)?);
        Ok(())
    }
}

fn print_lines(lines: &[String]) {
    for line in lines {
        println!("{}", line);
    }
}

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

pub fn dispatch(cli: Cli) -> CmdResult {
    let dir = match cli.dir {
        Some(ref dir) => fs::canonicalize(dir)
            .map_err(|e| format!("cannot resolve -C path '{}': {}", dir.display(), e))?,
        None => PathBuf::from("."),
    };
    let ctx = Ctx {
        dir,
        json: cli.json,
    };

    match cli.command {
        Commands::Table(cmd) => cmd_table(&ctx, cmd.action),
        Commands::Item(cmd) => cmd_item(&ctx, cmd.action),
        Commands::Measure(cmd) => cmd_measure(&ctx, cmd.action),
        Commands::Docs(cmd) => cmd_docs(&ctx, cmd.action),
        Commands::Validate(cmd) => cmd_validate(&ctx, cmd.action),
        Commands::Session(cmd) => cmd_session(&ctx, cmd.action),
        Commands::Config(cmd) => cmd_config(&ctx, cmd.action),
        Commands::Plan(cmd) => cmd_plan(&ctx, cmd.action),
        Commands::Users(args) => cmd_users(&ctx, args),
    }
}

// ---------------------------------------------------------------------------
// Table targets
// ---------------------------------------------------------------------------

/// The document a table was read from, kept for write-back
enum TableSource {
    Bare(TableDoc),
    Item { activity: Activity, name: String },
    Measurement { activity: Activity, doc: TableDoc },
    Po {
        activity: Activity,
        index: usize,
        doc: TableDoc,
    },
}

struct LoadedTable {
    path: PathBuf,
    source: TableSource,
    engine: TableEngine,
}

fn load_table(ctx: &Ctx, target: &TableTarget) -> Result<LoadedTable, Box<dyn Error>> {
    let path = ctx.resolve(&target.file);

    if let Some(ref name) = target.item {
        let activity: Activity = read_json(&path)?;
        let item = activity
            .item(name)
            .ok_or_else(|| checklist_ops::ChecklistError::ItemNotFound(name.clone()))?;
        let engine = checklist_ops::table_engine(item)?;
        return Ok(LoadedTable {
            path,
            source: TableSource::Item {
                activity,
                name: name.clone(),
            },
            engine,
        });
    }

    if target.measurement {
        let activity: Activity = read_json(&path)?;
        let Measurement::Table(doc) = measurement_ops::resolve_measurement(&activity)? else {
            return Err("measurement is not a table".into());
        };
        return Ok(LoadedTable {
            path,
            engine: TableEngine::from_doc(&doc),
            source: TableSource::Measurement { activity, doc },
        });
    }

    if let Some(n) = target.po {
        let index = n.checked_sub(1).ok_or("PO entries are numbered from 1")?;
        let mut activity: Activity = read_json(&path)?;
        let entry = measurement_ops::po_entry_mut(&mut activity, index)?;
        let doc: TableDoc = serde_json::from_value(entry.clone())?;
        return Ok(LoadedTable {
            path,
            engine: TableEngine::from_doc(&doc),
            source: TableSource::Po {
                activity,
                index,
                doc,
            },
        });
    }

    let doc: TableDoc = read_json(&path)?;
    Ok(LoadedTable {
        path,
        engine: TableEngine::from_doc(&doc),
        source: TableSource::Bare(doc),
    })
}

/// Write the engine's rows back into the document they came from.
/// Returns false when a disabled item refused the edit.
fn save_table(table: LoadedTable) -> Result<bool, Box<dyn Error>> {
    let LoadedTable {
        path,
        source,
        engine,
    } = table;
    match source {
        TableSource::Bare(mut doc) => {
            engine.write_into(&mut doc);
            write_json(&path, &doc)?;
        }
        TableSource::Item { mut activity, name } => {
            let item = checklist_ops::find_item_mut(&mut activity, &name)?;
            match checklist_ops::apply_edit(item, ChecklistEdit::Table(engine.data()))? {
                EditOutcome::Applied => write_json(&path, &activity)?,
                EditOutcome::Rejected | EditOutcome::Unchanged => {
                    eprintln!("{} is disabled; nothing saved", name);
                    return Ok(false);
                }
            }
        }
        TableSource::Measurement {
            mut activity,
            mut doc,
        } => {
            engine.write_into(&mut doc);
            measurement_ops::store_measurement(&mut activity, &Measurement::Table(doc))?;
            write_json(&path, &activity)?;
        }
        TableSource::Po {
            mut activity,
            index,
            mut doc,
        } => {
            engine.write_into(&mut doc);
            *measurement_ops::po_entry_mut(&mut activity, index)? = serde_json::to_value(&doc)?;
            write_json(&path, &activity)?;
        }
    }
    Ok(true)
}

/// Convert a 1-based row/column pair from the command line
fn zero_based(row: usize, col: usize) -> Result<(usize, usize), Box<dyn Error>> {
    match (row.checked_sub(1), col.checked_sub(1)) {
        (Some(r), Some(c)) => Ok((r, c)),
        _ => Err("rows and columns are numbered from 1".into()),
    }
}

// ---------------------------------------------------------------------------
// Table commands
// ---------------------------------------------------------------------------

fn cmd_table(ctx: &Ctx, action: TableAction) -> CmdResult {
    match action {
        TableAction::Show(target) => cmd_table_show(ctx, target),
        TableAction::AddRow(target) => cmd_table_add_row(ctx, target),
        TableAction::RmRow(args) => cmd_table_rm_row(ctx, args),
        TableAction::Set(args) => cmd_table_set(ctx, args),
        TableAction::Total(target) => cmd_table_total(ctx, target),
        TableAction::Attach(args) => cmd_table_attach(ctx, args),
    }
}

fn cmd_table_show(ctx: &Ctx, target: TableTarget) -> CmdResult {
    let table = load_table(ctx, &target)?;
    if ctx.json {
        ctx.print_json(&table_to_json(&table.engine))
    } else {
        print_lines(&format_table(&table.engine));
        Ok(())
    }
}

fn cmd_table_add_row(ctx: &Ctx, target: TableTarget) -> CmdResult {
    let mut table = load_table(ctx, &target)?;
    let row = table
        .engine
        .add_row()
        .ok_or("table is not multi-row; cannot add a row")?;
    if !save_table(table)? {
        return Ok(());
    }
    if ctx.json {
        ctx.print_json(&RowJson { row: row + 1 })
    } else {
        println!("{}", row + 1);
        Ok(())
    }
}

fn cmd_table_rm_row(ctx: &Ctx, args: RmRowArgs) -> CmdResult {
    let row = args.row.checked_sub(1).ok_or("rows are numbered from 1")?;
    if row == 0 && !args.force {
        return Err("refusing to remove row 1 without --force".into());
    }
    let mut table = load_table(ctx, &args.target)?;
    table.engine.remove_row(row)?;
    save_table(table)?;
    Ok(())
}

fn cmd_table_set(ctx: &Ctx, args: SetCellArgs) -> CmdResult {
    let (row, col) = zero_based(args.row, args.col)?;
    let mut table = load_table(ctx, &args.target)?;
    table.engine.update_cell(row, col, args.value)?;
    let json = ctx.json.then(|| table_to_json(&table.engine));
    if save_table(table)?
        && let Some(json) = json
    {
        ctx.print_json(&json)?;
    }
    Ok(())
}

fn cmd_table_total(ctx: &Ctx, target: TableTarget) -> CmdResult {
    let table = load_table(ctx, &target)?;
    let total = table
        .engine
        .final_total()
        .ok_or("table has no final total")?;
    if ctx.json {
        ctx.print_json(&total)
    } else {
        println!("{}", total);
        Ok(())
    }
}

fn cmd_table_attach(ctx: &Ctx, args: AttachArgs) -> CmdResult {
    let (row, col) = zero_based(args.row, args.col)?;
    let local = ctx.resolve(&args.local);
    let mut table = load_table(ctx, &args.target)?;
    table.engine.stage_file(row, col, &local)?;

    match args.stored {
        Some(stored) => {
            let count = table
                .engine
                .commit_staged(|_| Ok::<_, String>(stored.clone()))?;
            if save_table(table)? && !ctx.json {
                println!("attached {} file(s)", count);
            }
            Ok(())
        }
        None => {
            // Nothing uploaded yet: show what the upload would send
            let (client, config) = api_client(ctx)?;
            let requests: Vec<ApiRequest> = table
                .engine
                .staged()
                .map(|f| client.upload_file(&f.local_path, &config.uploads.activity_path))
                .collect();
            print_requests(ctx, &requests)
        }
    }
}

// ---------------------------------------------------------------------------
// Checklist item commands
// ---------------------------------------------------------------------------

fn cmd_item(ctx: &Ctx, action: ItemAction) -> CmdResult {
    match action {
        ItemAction::Ls(args) => cmd_item_ls(ctx, args),
        ItemAction::Check(args) => {
            let path = ctx.resolve(&args.file);
            let mut activity: Activity = read_json(&path)?;
            let item = checklist_ops::find_item_mut(&mut activity, &args.item)?;
            let outcome = checklist_ops::apply_edit(item, ChecklistEdit::Checkbox(!args.off))?;
            finish_item_edit(ctx, &path, &activity, &args.item, outcome)
        }
        ItemAction::Select(args) => {
            let path = ctx.resolve(&args.file);
            let mut activity: Activity = read_json(&path)?;
            let item = checklist_ops::find_item_mut(&mut activity, &args.item)?;
            let selection = selection_value(item, &args.value);
            let outcome = checklist_ops::apply_edit(item, ChecklistEdit::Dropdown(selection))?;
            finish_item_edit(ctx, &path, &activity, &args.item, outcome)
        }
        ItemAction::Dates(args) => cmd_item_dates(ctx, args),
        ItemAction::File(args) => {
            let path = ctx.resolve(&args.file);
            let mut activity: Activity = read_json(&path)?;
            let item = checklist_ops::find_item_mut(&mut activity, &args.item)?;
            let outcome = checklist_ops::apply_edit(item, ChecklistEdit::FileUpload(args.path))?;
            finish_item_edit(ctx, &path, &activity, &args.item, outcome)
        }
    }
}

fn cmd_item_ls(ctx: &Ctx, args: ActivityArg) -> CmdResult {
    let activity: Activity = read_json(&ctx.resolve(&args.file))?;
    if ctx.json {
        let items: Vec<ItemJson> = activity.checklists.iter().map(item_to_json).collect();
        return ctx.print_json(&items);
    }
    if activity.checklists.is_empty() {
        println!("(no items)");
    }
    for item in &activity.checklists {
        println!("{}", format_item(item));
    }
    Ok(())
}

fn cmd_item_dates(ctx: &Ctx, args: DatesArgs) -> CmdResult {
    if args.from.is_none() && args.to.is_none() {
        return Err("nothing to set; pass --from and/or --to".into());
    }
    let path = ctx.resolve(&args.file);
    let mut activity: Activity = read_json(&path)?;
    let item = checklist_ops::find_item_mut(&mut activity, &args.item)?;

    let mut outcome = EditOutcome::Unchanged;
    for (bound, raw) in [(DateBound::From, &args.from), (DateBound::To, &args.to)] {
        let Some(raw) = raw else { continue };
        let date = checklist_ops::parse_date_input(raw)?;
        match checklist_ops::apply_edit(item, ChecklistEdit::DateRange(bound, Some(date)))? {
            EditOutcome::Applied => outcome = EditOutcome::Applied,
            EditOutcome::Rejected => {
                outcome = EditOutcome::Rejected;
                break;
            }
            EditOutcome::Unchanged => {}
        }
    }
    finish_item_edit(ctx, &path, &activity, &args.item, outcome)
}

/// Numbers match numeric options; everything else is a string.
fn selection_value(item: &ChecklistItem, raw: &str) -> Value {
    match serde_json::from_str::<serde_json::Number>(raw) {
        Ok(n)
            if item
                .options
                .iter()
                .any(|o| o.value == CellValue::Number(n.clone())) =>
        {
            Value::Number(n)
        }
        _ => Value::String(raw.to_string()),
    }
}

fn finish_item_edit(
    ctx: &Ctx,
    path: &Path,
    activity: &Activity,
    name: &str,
    outcome: EditOutcome,
) -> CmdResult {
    match outcome {
        EditOutcome::Applied => write_json(path, activity)?,
        EditOutcome::Rejected => {
            eprintln!("{} is disabled; nothing changed", name);
            return Ok(());
        }
        EditOutcome::Unchanged => return Ok(()),
    }
    if let Some(item) = activity.item(name) {
        if ctx.json {
            ctx.print_json(&item_to_json(item))?;
        } else {
            println!("{}", format_item(item));
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Measurement commands
// ---------------------------------------------------------------------------

fn cmd_measure(ctx: &Ctx, action: MeasureAction) -> CmdResult {
    match action {
        MeasureAction::Show(args) => {
            let activity: Activity = read_json(&ctx.resolve(&args.file))?;
            let measurement = measurement_ops::resolve_measurement(&activity)?;
            if ctx.json {
                ctx.print_json(&measurement.to_value()?)
            } else {
                print_lines(&format_measurement(&measurement));
                Ok(())
            }
        }
        MeasureAction::Set(args) => cmd_measure_set(ctx, args),
        MeasureAction::Template(args) => cmd_measure_template(ctx, args),
    }
}

fn cmd_measure_set(ctx: &Ctx, args: MeasureSetArgs) -> CmdResult {
    let path = ctx.resolve(&args.file);
    let mut activity: Activity = read_json(&path)?;
    let mut measurement = measurement_ops::resolve_measurement(&activity)?;
    let Measurement::Lot(lot) = &mut measurement else {
        return Err("measurement is not a LOT measurement; use `fb table set --measurement`".into());
    };
    if measurement_ops::set_lot_value(lot, &args.value) == EditOutcome::Rejected {
        eprintln!("measurement is disabled; nothing changed");
        return Ok(());
    }
    measurement_ops::store_measurement(&mut activity, &measurement)?;
    write_json(&path, &activity)?;
    if !ctx.json {
        print_lines(&format_measurement(&measurement));
    }
    Ok(())
}

fn cmd_measure_template(ctx: &Ctx, args: TemplateArgs) -> CmdResult {
    let path = ctx.resolve(&args.file);
    let mut activity: Activity = read_json(&path)?;
    let po = activity
        .po_value
        .as_ref()
        .ok_or(MeasurementError::MissingPo)?;
    let template = measurement_ops::template_from_po(po);

    if args.write {
        let first = match &template {
            Value::Array(entries) => entries.first().cloned().ok_or(MeasurementError::MissingPo)?,
            other => other.clone(),
        };
        measurement_ops::store_measurement(&mut activity, &Measurement::from_value(&first)?)?;
        write_json(&path, &activity)?;
    }
    ctx.print_json(&template)
}

// ---------------------------------------------------------------------------
// Document tree commands
// ---------------------------------------------------------------------------

fn cmd_docs(ctx: &Ctx, action: DocsAction) -> CmdResult {
    match action {
        DocsAction::Ls(args) => cmd_docs_ls(ctx, args),
        DocsAction::Mkdir(args) => {
            let path = ctx.resolve(&args.file);
            let mut project: Project = read_json(&path)?;
            let parent = tree_ops::split_path(&args.parent);
            let name = tree_ops::folder_name(&args.name)?;
            project.docs = tree_ops::add_folder(&project.docs, &parent, name)?;
            write_json(&path, &project)?;
            Ok(())
        }
        DocsAction::Add(args) => {
            let path = ctx.resolve(&args.file);
            let mut project: Project = read_json(&path)?;
            let folder = tree_ops::split_path(&args.folder);
            let file = NewFile {
                name: args.name,
                value: args.value,
            };
            project.docs = tree_ops::add_files(&project.docs, &folder, &[file])?;
            write_json(&path, &project)?;
            Ok(())
        }
        DocsAction::Rm(args) => update_docs_file(ctx, args, |tree, path| {
            tree_ops::remove_file(tree, path)
        }),
        DocsAction::Hide(args) => update_docs_file(ctx, args, |tree, path| {
            tree_ops::set_file_hidden(tree, path, true)
        }),
        DocsAction::Unhide(args) => update_docs_file(ctx, args, |tree, path| {
            tree_ops::set_file_hidden(tree, path, false)
        }),
    }
}

fn cmd_docs_ls(ctx: &Ctx, args: DocsLsArgs) -> CmdResult {
    let project: Project = read_json(&ctx.resolve(&args.file))?;
    let session = session_io::load_session(&ctx.dir)?;
    let role = if args.admin || session.is_admin() {
        Role::Admin
    } else {
        Role::User
    };
    let tree = tree_ops::visible_tree(&project.docs, role);
    if ctx.json {
        ctx.print_json(&tree)
    } else {
        print_lines(&format_tree(&tree, role == Role::Admin));
        Ok(())
    }
}

/// Apply a file edit; a path naming no file is an error.
fn update_docs_file<F>(ctx: &Ctx, args: DocsPathArgs, edit: F) -> CmdResult
where
    F: FnOnce(&DocTree, &[String]) -> DocTree,
{
    let path = ctx.resolve(&args.file);
    let mut project: Project = read_json(&path)?;
    let segments = tree_ops::split_path(&args.path);
    match tree_ops::find_node(&project.docs, &segments) {
        Some(DocNode::File { .. }) => {}
        _ => return Err(tree_ops::TreeError::PathNotFound(args.path).into()),
    }
    project.docs = edit(&project.docs, &segments);
    write_json(&path, &project)?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Validation commands
// ---------------------------------------------------------------------------

fn cmd_validate(ctx: &Ctx, action: ValidateAction) -> CmdResult {
    match action {
        ValidateAction::User(args) => {
            let mode = if args.edit {
                FormMode::Edit
            } else {
                FormMode::Create
            };
            let form = user_form(ctx, args.form)?;
            match form.validate(mode) {
                Ok(payload) => ctx.print_json(&payload),
                Err(errors) => report_field_errors(ctx, &errors),
            }
        }
        ValidateAction::Project(args) => match project_form(args)?.validate() {
            Ok(payload) => ctx.print_json(&payload),
            Err(errors) => report_field_errors(ctx, &errors),
        },
    }
}

fn user_form(ctx: &Ctx, args: UserFormArgs) -> Result<UserForm, Box<dyn Error>> {
    let role: Role = args.role.parse()?;
    let projects = args
        .projects
        .iter()
        .map(|raw| {
            let (uuid, name) = raw
                .split_once('=')
                .ok_or_else(|| format!("expected UUID=NAME, got '{}'", raw))?;
            Ok(ProjectRef {
                uuid: uuid.to_string(),
                name: name.to_string(),
            })
        })
        .collect::<Result<Vec<_>, String>>()?;
    if !args.password.is_empty() && !ctx.json {
        eprintln!(
            "password strength: {}",
            strength_label(password_strength(&args.password))
        );
    }
    Ok(UserForm {
        name: args.name,
        phone: args.phone,
        password: args.password,
        confirm: args.confirm,
        role,
        projects,
    })
}

fn project_form(args: ProjectFormArgs) -> Result<ProjectForm, Box<dyn Error>> {
    let status = ProjectStatus::parse_status(&args.status)
        .ok_or_else(|| format!("unknown status: {}", args.status))?;
    Ok(ProjectForm {
        name: args.name,
        description: args.description,
        status,
    })
}

fn report_field_errors(ctx: &Ctx, errors: &[FieldError]) -> CmdResult {
    if ctx.json {
        ctx.print_json(&FieldErrorsJson {
            valid: false,
            errors,
        })?;
    } else {
        print_lines(&format_field_errors(errors));
    }
    Err(format!("{} field(s) invalid", errors.len()).into())
}

// ---------------------------------------------------------------------------
// Session and config commands
// ---------------------------------------------------------------------------

fn cmd_session(ctx: &Ctx, action: SessionAction) -> CmdResult {
    match action {
        SessionAction::Login(args) => {
            let user: User = read_json(&ctx.resolve(&args.user))?;
            if args.token.trim().is_empty() {
                return Err("token must not be empty".into());
            }
            let mut session = session_io::load_session(&ctx.dir)?;
            session.login(args.token, user, args.expires_in);
            session_io::save_session(&ctx.dir, &session)?;
            if !ctx.json {
                println!("signed in as {}", session.name().unwrap_or_default());
            }
            Ok(())
        }
        SessionAction::Logout => {
            session_io::clear_session(&ctx.dir)?;
            if !ctx.json {
                println!("signed out");
            }
            Ok(())
        }
        SessionAction::Whoami => {
            let session = session_io::load_session(&ctx.dir)?;
            if ctx.json {
                return ctx.print_json(&whoami_to_json(&session));
            }
            match (session.name(), session.role()) {
                (Some(name), Some(role)) if session.is_authenticated() => {
                    println!("{} ({})", name, role)
                }
                _ => println!("not signed in"),
            }
            Ok(())
        }
    }
}

fn cmd_config(ctx: &Ctx, action: ConfigAction) -> CmdResult {
    match action {
        ConfigAction::Get(args) => {
            let config = config_io::load_config(&ctx.dir)?;
            println!("{}", config_io::get_value(&config, &args.key)?);
            Ok(())
        }
        ConfigAction::Set(args) => {
            let (_, mut doc) = config_io::read_config(&ctx.dir)?;
            config_io::set_value(&mut doc, &args.key, &args.value)?;
            config_io::write_config(&ctx.dir, &doc)?;
            Ok(())
        }
    }
}

// ---------------------------------------------------------------------------
// Request planning
// ---------------------------------------------------------------------------

fn api_client(ctx: &Ctx) -> Result<(ApiClient, Config), Box<dyn Error>> {
    let config = config_io::load_config(&ctx.dir)?;
    let session = session_io::load_session(&ctx.dir)?;
    Ok((ApiClient::new(&config.backend).with_session(&session), config))
}

fn print_requests(ctx: &Ctx, requests: &[ApiRequest]) -> CmdResult {
    if ctx.json {
        let redacted: Vec<ApiRequest> = requests.iter().map(redact).collect();
        return ctx.print_json(&redacted);
    }
    for (i, req) in requests.iter().enumerate() {
        if i > 0 {
            println!();
        }
        print_lines(&format_request(req));
    }
    Ok(())
}

fn cmd_plan(ctx: &Ctx, action: PlanAction) -> CmdResult {
    let (client, config) = api_client(ctx)?;
    let request = match action {
        PlanAction::SaveDocs(args) => {
            let project: Project = read_json(&ctx.resolve(&args.file))?;
            client.save_project_docs(project.uuid.as_deref(), &project.docs)?
        }
        PlanAction::Upload(args) => return cmd_plan_upload(ctx, &client, &config, args),
        PlanAction::Download(args) => client.download_url(&args.value)?,
        PlanAction::Delete(args) => client.delete_file(&args.value)?,
        PlanAction::Projects => client.list_projects(),
        PlanAction::Users => client.list_users(),
        PlanAction::SetActive(args) => client.set_user_active(Some(&args.id), !args.off)?,
        PlanAction::SaveUser(args) => {
            let mode = if args.id.is_some() {
                FormMode::Edit
            } else {
                FormMode::Create
            };
            let payload = match user_form(ctx, args.form)?.validate(mode) {
                Ok(payload) => payload,
                Err(errors) => return report_field_errors(ctx, &errors),
            };
            match args.id.as_deref() {
                Some(id) => client.update_user(Some(id), &payload)?,
                None => client.create_user(&payload)?,
            }
        }
        PlanAction::SaveProject(args) => {
            let payload = match project_form(args.form)?.validate() {
                Ok(payload) => payload,
                Err(errors) => return report_field_errors(ctx, &errors),
            };
            match args.uuid.as_deref() {
                Some(uuid) => client.update_project(Some(uuid), &payload)?,
                None => client.create_project(&payload)?,
            }
        }
    };
    print_requests(ctx, &[request])
}

fn cmd_plan_upload(
    ctx: &Ctx,
    client: &ApiClient,
    config: &Config,
    args: PlanUploadArgs,
) -> CmdResult {
    let project: Project = read_json(&ctx.resolve(&args.file))?;
    let folder = tree_ops::split_path(&args.folder);
    let base = config.docs.base_path_for(project.uuid.as_deref());
    let storage = tree_ops::upload_prefix(&base, &folder);

    let mut requests = Vec::new();
    for local in &args.locals {
        let local = ctx.resolve(local);
        let name = local
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let size = fs::metadata(&local).ok().map(|m| m.len());
        if let Err(e) = validate::check_upload_size(&name, size, config.uploads.max_file_size) {
            eprintln!("warning: {}", e);
            continue;
        }
        requests.push(client.upload_file(&local, &storage));
    }
    if requests.is_empty() {
        return Err("no files to upload".into());
    }
    print_requests(ctx, &requests)
}

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

/// A saved `/users` response, or just its array
#[derive(serde::Deserialize)]
#[serde(untagged)]
enum UserList {
    Response { users: Vec<User> },
    Bare(Vec<User>),
}

fn cmd_users(ctx: &Ctx, args: UsersArgs) -> CmdResult {
    let users = match read_json::<UserList>(&ctx.resolve(&args.file))? {
        UserList::Response { users } | UserList::Bare(users) => users,
    };
    let matched = validate::filter_users(&users, args.query.as_deref().unwrap_or_default());
    if ctx.json {
        ctx.print_json(&matched)
    } else {
        print_lines(&format_users(&matched));
        Ok(())
    }
}
