use clap::{ArgAction, Args, Parser, Subcommand};

#[derive(Parser, Debug, Clone)]
#[command(
    name = "mirrordesk",
    version,
    about = "headless admin and catalog client for REST collections",
    long_about = "mirrordesk mirrors the posts and comments collections of a json-server style API, applies admin actions (create, edit, soft delete, restore, permanent delete) and writes the rendered tables to an HTML snapshot. It also browses a static product catalog with search, sort and pagination.\n\nExamples:\n  mirrordesk posts list\n  mirrordesk posts add --title \"Hello\" --views 10\n  mirrordesk --update-mode replace posts delete 3\n  mirrordesk catalog --search shirt --sort price-asc --page 2\n  mirrordesk fix-images ./db.json\n\nTip: Use --config to persist the API URL and update mode."
)]
pub struct CliArgs {
    #[arg(
        short = 'v',
        long = "verbose",
        action = ArgAction::Count,
        global = true,
        help_heading = "Output",
        help = "Increase log verbosity (-v, -vv)."
    )]
    pub verbose: u8,

    #[arg(
        long = "no-color",
        global = true,
        help_heading = "Output",
        help = "Disable colored terminal output."
    )]
    pub no_color: bool,

    #[arg(
        short = 'o',
        long = "output",
        value_name = "FILE",
        global = true,
        help_heading = "Output",
        help = "Where to write the HTML snapshot (default: mirrordesk.html)."
    )]
    pub output: Option<String>,

    #[arg(
        short = 'C',
        long = "config",
        value_name = "FILE",
        global = true,
        help_heading = "Input",
        help = "Path to config file (defaults to ~/.mirrordesk/config.yml)."
    )]
    pub config: Option<String>,

    #[arg(
        short = 'a',
        long = "api",
        visible_alias = "api-url",
        value_name = "URL",
        global = true,
        help_heading = "Connection",
        help = "Base URL of the collection API (default: http://localhost:3000)."
    )]
    pub api_url: Option<String>,

    #[arg(
        long = "catalog-url",
        value_name = "URL",
        global = true,
        help_heading = "Connection",
        help = "URL of the static product snapshot; must be http(s)."
    )]
    pub catalog_url: Option<String>,

    #[arg(
        short = 'm',
        long = "update-mode",
        value_name = "MODE",
        global = true,
        help_heading = "Connection",
        help = "How updates are sent: patch (changed fields) or replace (read, overlay, PUT)."
    )]
    pub update_mode: Option<String>,

    #[arg(
        long = "ignore-status",
        global = true,
        help_heading = "Connection",
        help = "Accept non-2xx responses to create/update/delete."
    )]
    pub ignore_status: bool,

    #[arg(
        long = "timeout",
        value_name = "SECONDS",
        global = true,
        help_heading = "Connection",
        help = "Request timeout in seconds (default: none)."
    )]
    pub timeout: Option<u64>,

    #[arg(
        short = 'y',
        long = "yes",
        visible_alias = "assume-yes",
        global = true,
        help_heading = "Prompts",
        help = "Answer yes to every confirmation prompt."
    )]
    pub yes: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Manage posts.
    Posts {
        #[command(subcommand)]
        action: PostsCommand,
    },
    /// Manage comments.
    Comments {
        #[command(subcommand)]
        action: CommentsCommand,
    },
    /// Browse the product catalog.
    Catalog(CatalogArgs),
    /// Load posts and comments and write the admin snapshot.
    Page,
    /// Rewrite a product document's images from the category pools (writes FILE.backup first).
    FixImages {
        #[arg(value_name = "FILE")]
        file: String,
    },
    /// Write a commented default config file if none exists.
    InitConfig,
}

#[derive(Subcommand, Debug, Clone)]
pub enum PostsCommand {
    /// List all posts, including soft-deleted ones.
    List,
    /// Create a post.
    Add {
        #[arg(long)]
        title: String,
        #[arg(long)]
        views: String,
    },
    /// Edit a post; omitted fields keep their current value.
    Edit {
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        views: Option<String>,
    },
    /// Soft-delete a post.
    Delete { id: String },
    /// Restore a soft-deleted post.
    Restore { id: String },
    /// Permanently delete a post.
    Purge { id: String },
}

#[derive(Subcommand, Debug, Clone)]
pub enum CommentsCommand {
    /// List all comments.
    List,
    /// Create a comment on a post.
    Add {
        #[arg(long)]
        text: String,
        #[arg(long = "post", value_name = "POST_ID")]
        post_id: String,
    },
    /// Edit a comment; omitted fields keep their current value.
    Edit {
        id: String,
        #[arg(long)]
        text: Option<String>,
        #[arg(long = "post", value_name = "POST_ID")]
        post_id: Option<String>,
    },
    /// Delete a comment.
    Delete { id: String },
}

#[derive(Args, Debug, Clone, Default)]
pub struct CatalogArgs {
    #[arg(
        short = 's',
        long = "search",
        value_name = "TERM",
        help = "Case-insensitive title filter."
    )]
    pub search: Option<String>,

    #[arg(
        long = "sort",
        value_name = "KEY",
        help = "default, price-asc, price-desc, title-asc or title-desc."
    )]
    pub sort: Option<String>,

    #[arg(long = "page-size", value_name = "N", help = "Products per page.")]
    pub page_size: Option<usize>,

    #[arg(
        short = 'p',
        long = "page",
        value_name = "N",
        help = "1-based page number; out-of-range pages are ignored."
    )]
    pub page: Option<usize>,
}
