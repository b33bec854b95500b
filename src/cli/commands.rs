use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "fb", about = concat!("fieldbook v", env!("CARGO_PKG_VERSION"), " - checklists, measurements and project docs as JSON"), version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Log debug output to stderr (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Resolve files, config and session against a different directory
    #[arg(short = 'C', long = "dir", global = true)]
    pub dir: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show and edit tables (bare table files, table items, measurements, PO entries)
    Table(TableCmd),
    /// Edit checklist items of an activity
    Item(ItemCmd),
    /// Show and edit an activity's measurement
    Measure(MeasureCmd),
    /// Browse and edit a project's document tree
    Docs(DocsCmd),
    /// Validate user and project forms
    Validate(ValidateCmd),
    /// Sign in, sign out, show the current user
    Session(SessionCmd),
    /// Read or change fieldbook.toml
    Config(ConfigCmd),
    /// Print the backend request an operation would send
    Plan(PlanCmd),
    /// List users from a saved user list, optionally filtered by name
    Users(UsersArgs),
}

// ---------------------------------------------------------------------------
// Tables
// ---------------------------------------------------------------------------

/// Which table inside a JSON file to work on. Without a selector the file
/// itself is a table document.
#[derive(Args, Clone)]
pub struct TableTarget {
    /// JSON file (table or activity)
    pub file: PathBuf,
    /// Table checklist item, by name
    #[arg(long, conflicts_with_all = ["measurement", "po"])]
    pub item: Option<String>,
    /// The activity's measurement table
    #[arg(long, conflicts_with = "po")]
    pub measurement: bool,
    /// PO entry (1-based)
    #[arg(long, value_name = "N")]
    pub po: Option<usize>,
}

#[derive(Args)]
pub struct TableCmd {
    #[command(subcommand)]
    pub action: TableAction,
}

#[derive(Subcommand)]
pub enum TableAction {
    /// Print the table
    Show(TableTarget),
    /// Append a row built from the template row
    AddRow(TableTarget),
    /// Remove a row (1-based)
    RmRow(RmRowArgs),
    /// Set a cell value (1-based row and column)
    Set(SetCellArgs),
    /// Print the table's final total
    Total(TableTarget),
    /// Attach an uploaded file to an image cell
    Attach(AttachArgs),
}

#[derive(Args)]
pub struct RmRowArgs {
    #[command(flatten)]
    pub target: TableTarget,
    /// Row number (1-based)
    pub row: usize,
    /// Allow removing the first row
    #[arg(long)]
    pub force: bool,
}

#[derive(Args)]
pub struct SetCellArgs {
    #[command(flatten)]
    pub target: TableTarget,
    /// Row number (1-based)
    pub row: usize,
    /// Column number (1-based)
    pub col: usize,
    /// New value
    #[arg(allow_hyphen_values = true)]
    pub value: String,
}

#[derive(Args)]
pub struct AttachArgs {
    #[command(flatten)]
    pub target: TableTarget,
    /// Row number (1-based)
    pub row: usize,
    /// Column number (1-based)
    pub col: usize,
    /// Local file
    pub local: PathBuf,
    /// Storage path the backend returned for the upload
    #[arg(long)]
    pub stored: Option<String>,
}

// ---------------------------------------------------------------------------
// Checklist items
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct ItemCmd {
    #[command(subcommand)]
    pub action: ItemAction,
}

#[derive(Subcommand)]
pub enum ItemAction {
    /// List an activity's checklist items
    Ls(ActivityArg),
    /// Check (or with --off, uncheck) a checkbox item
    Check(CheckArgs),
    /// Pick a dropdown option (toggles on multi-select items)
    Select(SelectArgs),
    /// Set one or both ends of a date-range item
    Dates(DatesArgs),
    /// Set a file-upload item's storage path
    File(FileArgs),
}

#[derive(Args)]
pub struct ActivityArg {
    /// Activity JSON file
    pub file: PathBuf,
}

#[derive(Args)]
pub struct CheckArgs {
    /// Activity JSON file
    pub file: PathBuf,
    /// Item name
    pub item: String,
    /// Uncheck instead
    #[arg(long)]
    pub off: bool,
}

#[derive(Args)]
pub struct SelectArgs {
    /// Activity JSON file
    pub file: PathBuf,
    /// Item name
    pub item: String,
    /// Option value (JSON numbers are matched as numbers)
    pub value: String,
}

#[derive(Args)]
pub struct DatesArgs {
    /// Activity JSON file
    pub file: PathBuf,
    /// Item name
    pub item: String,
    /// Start date (YYYY-MM-DD or RFC 3339)
    #[arg(long)]
    pub from: Option<String>,
    /// End date (YYYY-MM-DD or RFC 3339)
    #[arg(long)]
    pub to: Option<String>,
}

#[derive(Args)]
pub struct FileArgs {
    /// Activity JSON file
    pub file: PathBuf,
    /// Item name
    pub item: String,
    /// Storage path of the uploaded file
    pub path: String,
}

// ---------------------------------------------------------------------------
// Measurements
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct MeasureCmd {
    #[command(subcommand)]
    pub action: MeasureAction,
}

#[derive(Subcommand)]
pub enum MeasureAction {
    /// Show the measurement (SAME_AS_PO is shown as its template)
    Show(ActivityArg),
    /// Set a LOT measurement's value
    Set(MeasureSetArgs),
    /// Print the blank template built from the PO value
    Template(TemplateArgs),
}

#[derive(Args)]
pub struct MeasureSetArgs {
    /// Activity JSON file
    pub file: PathBuf,
    /// New value
    #[arg(allow_hyphen_values = true)]
    pub value: String,
}

#[derive(Args)]
pub struct TemplateArgs {
    /// Activity JSON file
    pub file: PathBuf,
    /// Store the template as the activity's measurement
    #[arg(long)]
    pub write: bool,
}

// ---------------------------------------------------------------------------
// Document tree
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct DocsCmd {
    #[command(subcommand)]
    pub action: DocsAction,
}

#[derive(Subcommand)]
pub enum DocsAction {
    /// Print the document tree
    Ls(DocsLsArgs),
    /// Create a folder
    Mkdir(MkdirArgs),
    /// Add an uploaded file to a folder
    Add(DocsAddArgs),
    /// Remove a file
    Rm(DocsPathArgs),
    /// Hide a file from non-admin users
    Hide(DocsPathArgs),
    /// Show a hidden file again
    Unhide(DocsPathArgs),
}

#[derive(Args)]
pub struct DocsLsArgs {
    /// Project JSON file
    pub file: PathBuf,
    /// Show hidden files (defaults to the session's role)
    #[arg(long)]
    pub admin: bool,
}

#[derive(Args)]
pub struct MkdirArgs {
    /// Project JSON file
    pub file: PathBuf,
    /// Parent folder path, `/`-separated (empty for the root)
    pub parent: String,
    /// New folder name
    pub name: String,
}

#[derive(Args)]
pub struct DocsAddArgs {
    /// Project JSON file
    pub file: PathBuf,
    /// Folder path, `/`-separated (empty for the root)
    pub folder: String,
    /// Display name
    pub name: String,
    /// Storage path the backend returned for the upload
    pub value: String,
}

#[derive(Args)]
pub struct DocsPathArgs {
    /// Project JSON file
    pub file: PathBuf,
    /// File path, `/`-separated
    pub path: String,
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct ValidateCmd {
    #[command(subcommand)]
    pub action: ValidateAction,
}

#[derive(Subcommand)]
pub enum ValidateAction {
    /// Validate a user form and print the request body
    User(ValidateUserArgs),
    /// Validate a project form and print the request body
    Project(ProjectFormArgs),
}

#[derive(Args)]
pub struct UserFormArgs {
    #[arg(long, default_value = "")]
    pub name: String,
    #[arg(long, default_value = "")]
    pub phone: String,
    #[arg(long, default_value = "")]
    pub password: String,
    #[arg(long, default_value = "")]
    pub confirm: String,
    /// user or admin
    #[arg(long, default_value = "user")]
    pub role: String,
    /// Assigned project as UUID=NAME (repeatable)
    #[arg(long = "project", value_name = "UUID=NAME")]
    pub projects: Vec<String>,
}

#[derive(Args)]
pub struct ValidateUserArgs {
    #[command(flatten)]
    pub form: UserFormArgs,
    /// Validate as an edit of an existing user
    #[arg(long)]
    pub edit: bool,
}

#[derive(Args)]
pub struct ProjectFormArgs {
    #[arg(long, default_value = "")]
    pub name: String,
    #[arg(long, default_value = "")]
    pub description: String,
    /// READY, IN_PROGRESS, COMPLETED or DELETED
    #[arg(long, default_value = "READY")]
    pub status: String,
}

// ---------------------------------------------------------------------------
// Session and config
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct SessionCmd {
    #[command(subcommand)]
    pub action: SessionAction,
}

#[derive(Subcommand)]
pub enum SessionAction {
    /// Store a token and user from a login response
    Login(LoginArgs),
    /// Forget the stored session
    Logout,
    /// Show the signed-in user
    Whoami,
}

#[derive(Args)]
pub struct LoginArgs {
    /// Bearer token
    #[arg(long)]
    pub token: String,
    /// User JSON file from the login response
    #[arg(long)]
    pub user: PathBuf,
    #[arg(long)]
    pub expires_in: Option<String>,
}

#[derive(Args)]
pub struct ConfigCmd {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Print a value (dotted key, e.g. backend.url)
    Get(ConfigGetArgs),
    /// Set a value in fieldbook.toml
    Set(ConfigSetArgs),
}

#[derive(Args)]
pub struct ConfigGetArgs {
    pub key: String,
}

#[derive(Args)]
pub struct ConfigSetArgs {
    pub key: String,
    pub value: String,
}

// ---------------------------------------------------------------------------
// Request planning
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct PlanCmd {
    #[command(subcommand)]
    pub action: PlanAction,
}

#[derive(Subcommand)]
pub enum PlanAction {
    /// Save a project's document tree
    SaveDocs(ProjectArg),
    /// Upload local files into a project folder
    Upload(PlanUploadArgs),
    /// Fetch a download URL for a stored file
    Download(StoredPathArg),
    /// Delete a stored file
    Delete(StoredPathArg),
    /// List projects
    Projects,
    /// List users
    Users,
    /// Activate or deactivate a user
    SetActive(SetActiveArgs),
    /// Create a user, or update one with --id
    SaveUser(PlanUserArgs),
    /// Create a project, or update one with --uuid
    SaveProject(PlanProjectArgs),
}

#[derive(Args)]
pub struct ProjectArg {
    /// Project JSON file
    pub file: PathBuf,
}

#[derive(Args)]
pub struct PlanUploadArgs {
    /// Project JSON file
    pub file: PathBuf,
    /// Folder path, `/`-separated (empty for the root)
    pub folder: String,
    /// Local files
    #[arg(required = true)]
    pub locals: Vec<PathBuf>,
}

#[derive(Args)]
pub struct StoredPathArg {
    /// Storage path
    pub value: String,
}

#[derive(Args)]
pub struct SetActiveArgs {
    /// User id
    pub id: String,
    /// Deactivate instead of activate
    #[arg(long)]
    pub off: bool,
}

#[derive(Args)]
pub struct PlanUserArgs {
    /// Existing user id; the form is validated as an edit
    #[arg(long)]
    pub id: Option<String>,
    #[command(flatten)]
    pub form: UserFormArgs,
}

#[derive(Args)]
pub struct PlanProjectArgs {
    /// Existing project uuid
    #[arg(long)]
    pub uuid: Option<String>,
    #[command(flatten)]
    pub form: ProjectFormArgs,
}

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct UsersArgs {
    /// User list JSON (a `/users` response or a bare array)
    pub file: PathBuf,
    /// Case-insensitive name search
    #[arg(long, short)]
    pub query: Option<String>,
}
