use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Parser, Debug)]
#[command(
    name = "myco",
    about = "Track mushroom grows from inoculation to harvest",
    version,
    propagate_version = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Output as structured JSON.
    #[arg(long, global = true)]
    pub json: bool,

    /// Log debug output to stderr (overrides MYCO_LOG).
    #[arg(long, short, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialize a .myco directory
    Init,

    /// Start tracking a new grow
    New(NewArgs),

    /// List grows
    List(ListArgs),

    /// Show one grow in detail
    Show(IdArgs),

    /// Move a grow to its next stage
    Advance(AdvanceArgs),

    /// Set a grow's stage directly
    Stage(StageArgs),

    /// Toggle a grow between Active and Archived
    Archive(IdArgs),

    /// Toggle an Agar or LC culture between Active and Stored
    Store(IdArgs),

    /// Finish harvesting and archive the grow
    Harvest(IdArgs),

    /// Record or update flushes
    Flush(FlushArgs),

    /// Attach a note to a stage
    Note(NoteArgs),

    /// Attach a photo reference to a stage
    Photo(PhotoArgs),

    /// Edit grow fields
    Edit(EditArgs),

    /// Delete a grow permanently
    Delete(IdArgs),

    /// Manage the strain catalogue
    Strain(StrainArgs),

    /// Manage the supply catalogue
    Supply(SupplyArgs),

    /// Summary statistics over grows
    Analytics(AnalyticsArgs),

    /// Show stage reminders that are due
    Remind(RemindArgs),
}

impl Commands {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Init => "init",
            Self::New(_) => "new",
            Self::List(_) => "list",
            Self::Show(_) => "show",
            Self::Advance(_) => "advance",
            Self::Stage(_) => "stage",
            Self::Archive(_) => "archive",
            Self::Store(_) => "store",
            Self::Harvest(_) => "harvest",
            Self::Flush(_) => "flush",
            Self::Note(_) => "note",
            Self::Photo(_) => "photo",
            Self::Edit(_) => "edit",
            Self::Delete(_) => "delete",
            Self::Strain(_) => "strain",
            Self::Supply(_) => "supply",
            Self::Analytics(_) => "analytics",
            Self::Remind(_) => "remind",
        }
    }
}

// ── Argument structs ───────────────────────────────────────────────────────

#[derive(Args, Debug)]
pub struct IdArgs {
    /// Grow ID (full, bare hash, or unique prefix)
    pub id: String,
}

#[derive(Args, Debug)]
pub struct NewArgs {
    /// Strain name
    #[arg(long)]
    pub strain: String,

    /// Culture type (Agar, LC, Grain Jar, Bulk, ...)
    #[arg(long = "type", default_value = "")]
    pub grow_type: String,

    /// Total cost; defaults to the catalogued cost of the recipe items
    #[arg(long)]
    pub cost: Option<f64>,

    /// Short label shown in lists
    #[arg(long)]
    pub abbr: Option<String>,

    /// Inoculation date (YYYY-MM-DD or RFC 3339); defaults to now
    #[arg(long)]
    pub inoculated: Option<String>,

    /// Recipe name
    #[arg(long)]
    pub recipe: Option<String>,

    /// Recipe item as NAME or NAME:AMOUNT (repeatable). Names or IDs of
    /// catalogued supplies are linked and drawn from stock.
    #[arg(long = "item")]
    pub items: Vec<String>,

    /// Do not draw catalogued items from stock
    #[arg(long)]
    pub no_consume: bool,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Dataset {
    #[default]
    Active,
    Stored,
    Archived,
    All,
}

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Which grows to show, by status
    #[arg(long, value_enum, default_value_t = Dataset::Active)]
    pub dataset: Dataset,

    /// Only this strain
    #[arg(long)]
    pub strain: Option<String>,

    /// Only this culture type
    #[arg(long = "type")]
    pub grow_type: Option<String>,

    /// Only this stage
    #[arg(long)]
    pub stage: Option<String>,
}

#[derive(Args, Debug)]
pub struct AdvanceArgs {
    /// Grow ID
    pub id: String,

    /// When the new stage was entered; defaults to now
    #[arg(long)]
    pub date: Option<String>,
}

#[derive(Args, Debug)]
pub struct StageArgs {
    /// Grow ID
    pub id: String,

    /// Target stage
    pub stage: String,

    /// When the stage was entered; defaults to now
    #[arg(long)]
    pub date: Option<String>,
}

#[derive(Args, Debug)]
pub struct FlushArgs {
    #[command(subcommand)]
    pub command: FlushCommand,
}

#[derive(Subcommand, Debug)]
pub enum FlushCommand {
    /// Append an empty flush
    Add(IdArgs),

    /// Update one flush (1-based index)
    Set(FlushSetArgs),
}

#[derive(Args, Debug)]
pub struct FlushSetArgs {
    /// Grow ID
    pub id: String,

    /// Flush number, starting at 1
    pub index: usize,

    /// Wet weight in grams
    #[arg(long)]
    pub wet: Option<f64>,

    /// Dry weight in grams
    #[arg(long)]
    pub dry: Option<f64>,

    /// Harvest date of this flush
    #[arg(long)]
    pub date: Option<String>,
}

#[derive(Args, Debug)]
pub struct NoteArgs {
    /// Grow ID
    pub id: String,

    /// Note text
    pub text: String,

    /// Stage to file the note under; defaults to the current stage
    #[arg(long)]
    pub stage: Option<String>,
}

#[derive(Args, Debug)]
pub struct PhotoArgs {
    /// Grow ID
    pub id: String,

    /// Path or URL of the photo
    pub path: String,

    /// Stage to file the photo under; defaults to the current stage
    #[arg(long)]
    pub stage: Option<String>,

    /// Caption
    #[arg(long)]
    pub caption: Option<String>,
}

#[derive(Args, Debug)]
pub struct EditArgs {
    /// Grow ID
    pub id: String,

    #[arg(long)]
    pub strain: Option<String>,

    #[arg(long)]
    pub abbr: Option<String>,

    #[arg(long = "type")]
    pub grow_type: Option<String>,

    #[arg(long)]
    pub cost: Option<f64>,

    #[arg(long)]
    pub recipe: Option<String>,
}

#[derive(Args, Debug)]
pub struct StrainArgs {
    #[command(subcommand)]
    pub command: StrainCommand,
}

#[derive(Subcommand, Debug)]
pub enum StrainCommand {
    /// Add a strain
    Add(StrainFields),

    /// List strains
    List,

    /// Update a strain's details
    Edit(StrainEditArgs),

    /// Remove a strain
    Remove(StrainNameArgs),
}

#[derive(Args, Debug)]
pub struct StrainFields {
    /// Strain name
    pub name: String,

    /// Scientific name
    #[arg(long)]
    pub scientific: Option<String>,

    /// Photo URL
    #[arg(long)]
    pub photo: Option<String>,

    #[arg(long)]
    pub description: Option<String>,
}

#[derive(Args, Debug)]
pub struct StrainEditArgs {
    #[command(flatten)]
    pub fields: StrainFields,

    /// Rename the strain
    #[arg(long)]
    pub rename: Option<String>,
}

#[derive(Args, Debug)]
pub struct StrainNameArgs {
    /// Strain name
    pub name: String,
}

#[derive(Args, Debug)]
pub struct SupplyArgs {
    #[command(subcommand)]
    pub command: SupplyCommand,
}

#[derive(Subcommand, Debug)]
pub enum SupplyCommand {
    /// Add a supply
    Add(SupplyAddArgs),

    /// List supplies
    List,

    /// Update a supply's details
    Edit(SupplyEditArgs),

    /// Remove a supply
    Remove(SupplyIdentArgs),
}

#[derive(Args, Debug)]
pub struct SupplyAddArgs {
    /// Supply name
    pub name: String,

    /// Price per unit
    #[arg(long, default_value_t = 0.0)]
    pub cost: f64,

    /// Quantity in stock
    #[arg(long, default_value_t = 0.0)]
    pub quantity: f64,

    /// Stock unit (g, ml, jar, ...)
    #[arg(long, default_value = "")]
    pub unit: String,
}

#[derive(Args, Debug)]
pub struct SupplyEditArgs {
    /// Supply ID or name
    pub supply: String,

    /// Rename the supply
    #[arg(long)]
    pub name: Option<String>,

    #[arg(long)]
    pub cost: Option<f64>,

    #[arg(long)]
    pub quantity: Option<f64>,

    #[arg(long)]
    pub unit: Option<String>,
}

#[derive(Args, Debug)]
pub struct SupplyIdentArgs {
    /// Supply ID or name
    pub supply: String,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GroupBy {
    #[default]
    Strain,
    Recipe,
}

#[derive(Args, Debug)]
pub struct AnalyticsArgs {
    /// Only this strain
    #[arg(long)]
    pub strain: Option<String>,

    /// Start of date range, inclusive (YYYY-MM-DD)
    #[arg(long)]
    pub from: Option<String>,

    /// End of date range, inclusive (YYYY-MM-DD)
    #[arg(long)]
    pub to: Option<String>,

    /// Include inactive grows in the per-grow breakdowns
    #[arg(long)]
    pub all: bool,

    /// Group the contamination rate by strain or recipe
    #[arg(long, value_enum, default_value_t = GroupBy::Strain)]
    pub group_by: GroupBy,
}

#[derive(Args, Debug)]
pub struct RemindArgs {
    /// Evaluate as of this time instead of now
    #[arg(long)]
    pub now: Option<String>,

    /// Record the listed reminders as delivered
    #[arg(long)]
    pub mark: bool,
}
