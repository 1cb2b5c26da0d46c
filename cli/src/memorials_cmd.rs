use anyhow::Context;
use anyhow::Result;
use clap::Args;
use clap::Parser;
use clap::Subcommand;
use memorial_core::Account;
use memorial_core::Directory;
use memorial_core::config::Config;
use memorial_core::memorial::Editor;
use memorial_core::memorial::ImageRef;
use memorial_core::memorial::MemorialPatch;
use memorial_core::memorial::NewMemorial;
use memorial_core::memorial::RECENT_LIMIT;
use memorial_state::StateRuntime;
use memorial_state::StoreError;
use serde::Serialize;

#[derive(Debug, Parser)]
pub struct MemorialsCommand {
    #[command(subcommand)]
    subcommand: MemorialsSubcommand,
}

#[derive(Debug, Subcommand)]
enum MemorialsSubcommand {
    /// Create a memorial page.
    Create(CreateArgs),
    /// List recent memorials, or those of one author.
    List(ListArgs),
    /// Show a memorial by id or slug.
    Show(ShowArgs),
    /// Edit a memorial. Only its author or an administrator may edit.
    Edit(EditArgs),
}

#[derive(Debug, Args)]
struct ImageArgs {
    /// Profile image URL.
    #[arg(long = "image-url")]
    image_url: Option<String>,
    /// Short description of the profile image.
    #[arg(long = "image-hint", requires = "image_url")]
    image_hint: Option<String>,
}

impl ImageArgs {
    fn into_image(self) -> Option<ImageRef> {
        self.image_url.map(|url| ImageRef {
            url,
            hint: self.image_hint.unwrap_or_default(),
        })
    }
}

#[derive(Debug, Args)]
struct CreateArgs {
    /// Email of the author account.
    #[arg(long = "as", value_name = "EMAIL")]
    author: String,
    /// Name of the person remembered.
    #[arg(long)]
    name: String,
    /// Life span, e.g. "1950 - 2024".
    #[arg(long = "life-span")]
    life_span: String,
    /// Biography text.
    #[arg(long)]
    bio: Option<String>,
    #[command(flatten)]
    image: ImageArgs,
}

#[derive(Debug, Args)]
struct ListArgs {
    /// Only list memorials created by this account.
    #[arg(long, value_name = "EMAIL")]
    author: Option<String>,
    /// Maximum number of memorials to print.
    #[arg(long, default_value_t = RECENT_LIMIT)]
    limit: usize,
}

#[derive(Debug, Args)]
struct ShowArgs {
    /// Memorial id or slug.
    #[arg(value_name = "ID_OR_SLUG")]
    key: String,
}

#[derive(Debug, Args)]
struct EditArgs {
    /// Memorial id.
    #[arg(value_name = "ID")]
    id: String,
    /// Email of the account making the edit.
    #[arg(long = "as", value_name = "EMAIL")]
    editor: String,
    #[arg(long)]
    name: Option<String>,
    #[arg(long = "life-span")]
    life_span: Option<String>,
    #[arg(long)]
    bio: Option<String>,
    #[command(flatten)]
    image: ImageArgs,
}

impl MemorialsCommand {
    pub async fn run(self, config: &Config) -> Result<()> {
        let runtime = StateRuntime::from_config(config);
        match self.subcommand {
            MemorialsSubcommand::Create(args) => run_create(&runtime, args).await,
            MemorialsSubcommand::List(args) => run_list(&runtime, args).await,
            MemorialsSubcommand::Show(args) => run_show(&runtime, args),
            MemorialsSubcommand::Edit(args) => run_edit(&runtime, args).await,
        }
    }
}

async fn run_create(runtime: &StateRuntime, args: CreateArgs) -> Result<()> {
    let author = resolve_account(runtime, &args.author).await?;
    let memorial = runtime.memorials.create(
        &author.uid,
        NewMemorial {
            name: args.name,
            life_span: args.life_span,
            bio: args.bio,
            profile_image: args.image.into_image(),
        },
    )?;
    print_json(&memorial)
}

async fn run_list(runtime: &StateRuntime, args: ListArgs) -> Result<()> {
    let mut memorials = match args.author {
        Some(email) => {
            let author = resolve_account(runtime, &email).await?;
            runtime.memorials.list_by_author(&author.uid)?
        }
        None => runtime.memorials.list_recent(args.limit)?,
    };
    memorials.truncate(args.limit);
    for memorial in memorials {
        println!("{} {} ({}) {}", memorial.id, memorial.name, memorial.life_span, memorial.slug);
    }
    Ok(())
}

fn run_show(runtime: &StateRuntime, args: ShowArgs) -> Result<()> {
    let memorial = match runtime.memorials.get(&args.key) {
        Ok(memorial) => memorial,
        Err(StoreError::NotFound(_)) => runtime.memorials.find_by_slug(&args.key)?,
        Err(err) => return Err(err.into()),
    };
    print_json(&memorial)
}

async fn run_edit(runtime: &StateRuntime, args: EditArgs) -> Result<()> {
    let editor = resolve_account(runtime, &args.editor).await?;
    let patch = MemorialPatch {
        name: args.name,
        life_span: args.life_span,
        bio: args.bio,
        profile_image: args.image.into_image(),
    };
    let memorial = runtime.memorials.update(
        &args.id,
        Editor {
            uid: &editor.uid,
            is_admin: editor.custom_claims.is_admin(),
        },
        patch,
    )?;
    print_json(&memorial)
}

async fn resolve_account(runtime: &StateRuntime, email: &str) -> Result<Account> {
    runtime
        .directory
        .get_account_by_email(email)
        .await
        .with_context(|| format!("failed to look up {email}"))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
