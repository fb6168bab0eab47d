use std::collections::HashMap;
use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::time::Duration;

use clap::{error::ErrorKind, CommandFactory, Parser};
use colored::Colorize;

use crate::catalog::{CatalogController, SortKey, DEFAULT_PAGE_SIZE};
use crate::cli::args::{CatalogArgs, CliArgs, Command, CommentsCommand, PostsCommand};
use crate::cli::validation;
use crate::client::{CatalogSource, HttpBackend, HttpOptions, UpdateMode};
use crate::config::{self, ConfigFile};
use crate::handlers::{AdminSession, Outcome};
use crate::images;
use crate::render::page::{render_document, PageKind};
use crate::view::{CommentForm, CountLabel, FormKind, MemoryView, PostForm, Region, View};

fn format_kv_line(label: &str, value: &str) {
    println!(":: {:<10}: {}", label, value);
}

fn render_custom_help() -> String {
    let cmd = CliArgs::command();
    let mut out = String::new();

    if let Some(version) = cmd.get_version() {
        out.push_str(cmd.get_name());
        out.push(' ');
        out.push_str(version);
        out.push('\n');
    } else {
        out.push_str(cmd.get_name());
        out.push('\n');
    }

    if let Some(long_about) = cmd.get_long_about().or_else(|| cmd.get_about()) {
        out.push('\n');
        out.push_str(&long_about.to_string());
        out.push('\n');
    }

    out.push('\n');
    out.push_str("Usage: ");
    out.push_str(cmd.get_name());
    out.push_str(" [OPTIONS] <COMMAND>\n\n");

    out.push_str("Commands:\n");
    for sub in cmd.get_subcommands() {
        let about = sub.get_about().map(|a| a.to_string()).unwrap_or_default();
        out.push_str(&format!("  {:<12}{}\n", sub.get_name(), about.trim()));
    }
    out.push('\n');

    let mut sections: Vec<(String, Vec<&clap::Arg>)> = Vec::new();
    let mut section_idx: HashMap<String, usize> = HashMap::new();

    for arg in cmd.get_arguments() {
        if arg.is_hide_set() {
            continue;
        }

        let heading = arg.get_help_heading().unwrap_or("Options").to_string();

        let idx = match section_idx.get(&heading).copied() {
            Some(i) => i,
            None => {
                sections.push((heading.clone(), Vec::new()));
                let i = sections.len() - 1;
                section_idx.insert(heading, i);
                i
            }
        };

        sections[idx].1.push(arg);
    }

    for (heading, args) in sections {
        out.push_str(&heading);
        out.push_str(":\n");

        for arg in args {
            let mut parts: Vec<String> = Vec::new();

            if let Some(short) = arg.get_short() {
                parts.push(format!("-{short}"));
            }

            if let Some(long) = arg.get_long() {
                parts.push(format!("--{long}"));
            }

            if let Some(aliases) = arg.get_visible_aliases() {
                for alias in aliases {
                    let rendered = format!("--{alias}");
                    if !parts.iter().any(|p| p == &rendered) {
                        parts.push(rendered);
                    }
                }
            }

            let mut flags = parts.join(", ");

            if arg.get_action().takes_values() {
                let value_name = arg
                    .get_value_names()
                    .and_then(|names| names.first())
                    .map(|name| name.as_str())
                    .unwrap_or("VALUE");
                flags.push_str(&format!(" <{value_name}>"));
            }

            out.push_str("  ");
            out.push_str(&flags);
            out.push('\n');

            if let Some(help) = arg.get_help() {
                let help = help.to_string();
                if !help.trim().is_empty() {
                    out.push_str("          ");
                    out.push_str(help.trim());
                    out.push('\n');
                }
            }

            out.push('\n');
        }
    }

    out
}

fn format_bool(value: bool) -> &'static str {
    if value {
        "true"
    } else {
        "false"
    }
}

#[derive(Clone, Debug)]
struct RunConfig {
    api_url: String,
    catalog_url: String,
    update_mode: UpdateMode,
    check_status: bool,
    page_size: usize,
    timeout: Option<Duration>,
    output: String,
    no_color: bool,
    assume_yes: bool,
    verbose: u8,
    config_path: Option<PathBuf>,
    command: Command,
}

fn build_run_config(args: CliArgs, cfg: ConfigFile) -> Result<RunConfig, String> {
    validation::validate(&args)?;

    let update_mode_raw = args
        .update_mode
        .or(cfg.update_mode)
        .unwrap_or_else(|| "patch".to_string());
    let update_mode = UpdateMode::parse(&update_mode_raw).ok_or_else(|| {
        format!("invalid update_mode '{update_mode_raw}', expected patch or replace")
    })?;

    let page_size = cfg.page_size.unwrap_or(DEFAULT_PAGE_SIZE);
    if page_size == 0 {
        return Err("invalid page_size, expected positive integer".to_string());
    }

    let timeout = args
        .timeout
        .or(cfg.timeout)
        .filter(|secs| *secs > 0)
        .map(Duration::from_secs);

    Ok(RunConfig {
        api_url: args
            .api_url
            .or(cfg.api_url)
            .unwrap_or_else(|| config::DEFAULT_API_URL.to_string()),
        catalog_url: args
            .catalog_url
            .or(cfg.catalog_url)
            .unwrap_or_else(|| config::DEFAULT_CATALOG_URL.to_string()),
        update_mode,
        check_status: !args.ignore_status && cfg.check_status.unwrap_or(true),
        page_size,
        timeout,
        output: args
            .output
            .or(cfg.output)
            .unwrap_or_else(|| config::DEFAULT_OUTPUT.to_string()),
        no_color: args.no_color || cfg.no_color.unwrap_or(false),
        assume_yes: args.yes || cfg.assume_yes.unwrap_or(false),
        verbose: args.verbose,
        config_path: args.config.map(|p| config::expand_tilde(&p)),
        command: args.command,
    })
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .try_init();
}

/// Terminal-backed view: regions are collected for the HTML snapshot,
/// alerts are printed, confirmations are read from stdin.
struct TerminalView {
    inner: MemoryView,
    assume_yes: bool,
}

impl TerminalView {
    fn new(assume_yes: bool) -> Self {
        Self {
            inner: MemoryView::new(),
            assume_yes,
        }
    }
}

impl View for TerminalView {
    fn show(&mut self, region: Region, markup: String) {
        self.inner.show(region, markup);
    }

    fn set_count(&mut self, label: CountLabel, count: usize) {
        self.inner.set_count(label, count);
    }

    fn fill_post_form(&mut self, form: PostForm) {
        self.inner.fill_post_form(form);
    }

    fn fill_comment_form(&mut self, form: CommentForm) {
        self.inner.fill_comment_form(form);
    }

    fn clear_form(&mut self, kind: FormKind) {
        self.inner.clear_form(kind);
    }

    fn alert(&mut self, message: &str) {
        eprintln!("{} {}", "!!".red().bold(), message.red());
        self.inner.alert(message);
    }

    fn confirm(&mut self, message: &str) -> bool {
        if self.assume_yes {
            self.inner.answer_confirms([true]);
            return self.inner.confirm(message);
        }
        print!("{} {} [y/N] ", "??".yellow().bold(), message);
        let _ = std::io::stdout().flush();
        let mut line = String::new();
        let answer = match std::io::stdin().lock().read_line(&mut line) {
            Ok(_) => matches!(line.trim().to_lowercase().as_str(), "y" | "yes"),
            Err(_) => false,
        };
        self.inner.answer_confirms([answer]);
        self.inner.confirm(message)
    }
}

async fn write_snapshot(view: &MemoryView, kind: PageKind, output: &str) -> Result<(), String> {
    let title = match kind {
        PageKind::Admin => "Posts & Comments Admin",
        PageKind::Catalog => "Product Catalog",
    };
    let html = render_document(view, kind, title);
    tokio::fs::write(output, html)
        .await
        .map_err(|e| format!("failed to write snapshot '{output}': {e}"))?;
    format_kv_line("Snapshot", output);
    Ok(())
}

fn outcome_result(what: &str, outcome: Outcome) -> Result<(), String> {
    match outcome {
        Outcome::Applied => {
            println!("{} {}", "ok".green().bold(), what);
            Ok(())
        }
        Outcome::Cancelled => Ok(()),
        Outcome::NotFound => Err(format!("{what}: not found")),
        Outcome::Rejected(e) => Err(format!("{what}: {e}")),
        Outcome::Failed(e) => Err(format!("{what}: {e}")),
    }
}

fn print_posts(session: &AdminSession<HttpBackend, TerminalView>) {
    for post in session.posts().items() {
        let line = format!("#{:<5} {:<40} {:>8}", post.id, post.title, post.views);
        if post.is_deleted {
            println!("{} {}", line.dimmed().strikethrough(), "[deleted]".red());
        } else {
            println!("{line}");
        }
    }
    format_kv_line("Posts", &session.posts().len().to_string());
}

fn print_comments(session: &AdminSession<HttpBackend, TerminalView>) {
    let posts = session.posts().items();
    for comment in session.comments().items() {
        let label = crate::render::post_label(posts, &comment.post_id);
        println!(
            "#{:<5} {:<40} {} {}",
            comment.id,
            comment.text,
            format!("post {}", comment.post_id).cyan(),
            format!("({label})").dimmed()
        );
    }
    format_kv_line("Comments", &session.comments().len().to_string());
}

async fn run_posts(
    session: &mut AdminSession<HttpBackend, TerminalView>,
    action: PostsCommand,
) -> Result<(), String> {
    match action {
        PostsCommand::List => {
            print_posts(session);
            Ok(())
        }
        PostsCommand::Add { title, views } => {
            let form = PostForm {
                id: String::new(),
                title,
                views,
            };
            let outcome = session.save_post(&form).await;
            outcome_result("create post", outcome)
        }
        PostsCommand::Edit { id, title, views } => {
            outcome_result(&format!("post {id}"), session.edit_post(&id))?;
            let mut form = session.view().inner.post_form().clone();
            if let Some(title) = title {
                form.title = title;
            }
            if let Some(views) = views {
                form.views = views;
            }
            let outcome = session.save_post(&form).await;
            outcome_result(&format!("update post {id}"), outcome)
        }
        PostsCommand::Delete { id } => {
            let outcome = session.soft_delete_post(&id).await;
            outcome_result(&format!("delete post {id}"), outcome)
        }
        PostsCommand::Restore { id } => {
            let outcome = session.restore_post(&id).await;
            outcome_result(&format!("restore post {id}"), outcome)
        }
        PostsCommand::Purge { id } => {
            let outcome = session.hard_delete_post(&id).await;
            outcome_result(&format!("permanently delete post {id}"), outcome)
        }
    }
}

async fn run_comments(
    session: &mut AdminSession<HttpBackend, TerminalView>,
    action: CommentsCommand,
) -> Result<(), String> {
    match action {
        CommentsCommand::List => {
            print_comments(session);
            Ok(())
        }
        CommentsCommand::Add { text, post_id } => {
            let form = CommentForm {
                id: String::new(),
                text,
                post_id,
            };
            let outcome = session.save_comment(&form).await;
            outcome_result("create comment", outcome)
        }
        CommentsCommand::Edit { id, text, post_id } => {
            outcome_result(&format!("comment {id}"), session.edit_comment(&id))?;
            let mut form = session.view().inner.comment_form().clone();
            if let Some(text) = text {
                form.text = text;
            }
            if let Some(post_id) = post_id {
                form.post_id = post_id;
            }
            let outcome = session.save_comment(&form).await;
            outcome_result(&format!("update comment {id}"), outcome)
        }
        CommentsCommand::Delete { id } => {
            let outcome = session.delete_comment(&id).await;
            outcome_result(&format!("delete comment {id}"), outcome)
        }
    }
}

async fn run_admin(run: &RunConfig) -> Result<(), String> {
    let backend = HttpBackend::new(
        &run.api_url,
        HttpOptions {
            timeout: run.timeout,
            check_status: run.check_status,
        },
    )
    .map_err(|e| e.to_string())?;

    format_kv_line("API", backend.base_url());
    format_kv_line("Update", run.update_mode.label());
    format_kv_line("Status", format_bool(run.check_status));

    let mut session = AdminSession::new(
        backend,
        TerminalView::new(run.assume_yes),
        run.update_mode,
    );
    session.init().await;
    if !session.posts().is_loaded() {
        let view = session.into_view();
        write_snapshot(&view.inner, PageKind::Admin, &run.output).await?;
        return Err(format!("could not load posts from {}", run.api_url));
    }

    let result = match run.command.clone() {
        Command::Posts { action } => run_posts(&mut session, action).await,
        Command::Comments { action } => run_comments(&mut session, action).await,
        _ => {
            print_posts(&session);
            print_comments(&session);
            Ok(())
        }
    };

    let view = session.into_view();
    write_snapshot(&view.inner, PageKind::Admin, &run.output).await?;
    result
}

async fn run_catalog(run: &RunConfig, args: CatalogArgs) -> Result<(), String> {
    let source = CatalogSource::new(&run.catalog_url, run.timeout).map_err(|e| e.to_string())?;
    format_kv_line("Catalog", source.url());

    let mut view = TerminalView::new(run.assume_yes);
    let mut catalog = CatalogController::new(run.page_size);
    if let Err(e) = catalog.reload(&source).await {
        log::error!("error loading catalog: {e}");
        view.show(
            Region::ProductGrid,
            format!(
                r#"<div class="col-12 text-center text-danger">{}</div>"#,
                crate::render::escape_html(
                    "Failed to load products. Serve db.json over HTTP; opening it as a local file will not work."
                )
            ),
        );
        write_snapshot(&view.inner, PageKind::Catalog, &run.output).await?;
        return Err(e.to_string());
    }

    if let Some(term) = args.search.as_deref() {
        catalog.apply_filter(term);
    }
    if let Some(raw) = args.sort.as_deref() {
        let key = SortKey::parse(raw).ok_or_else(|| format!("invalid sort '{raw}'"))?;
        catalog.apply_sort(key);
    }
    if let Some(size) = args.page_size {
        catalog.set_page_size(size);
    }
    if let Some(page) = args.page {
        if !catalog.go_to_page(page) {
            log::warn!(
                "page {page} is out of range (1..={}), staying on page {}",
                catalog.total_pages(),
                catalog.page()
            );
        }
    }

    catalog.show(&mut view);
    for product in catalog.page_items() {
        println!(
            "#{:<5} {:<40} {:>10} {}",
            product.id,
            product.title,
            crate::render::format_price(product.price).green(),
            product.category.name.dimmed()
        );
    }
    format_kv_line(
        "Showing",
        &format!(
            "page {}/{} of {} matching ({} total)",
            catalog.page(),
            catalog.total_pages().max(1),
            catalog.filtered_len(),
            catalog.mirror_len()
        ),
    );
    write_snapshot(&view.inner, PageKind::Catalog, &run.output).await
}

fn run_fix_images(file: &str) -> Result<(), String> {
    let path = config::expand_tilde(file);
    let report = images::fix_images_file(&path).map_err(|e| e.to_string())?;
    format_kv_line("Backup", &report.backup.display().to_string());
    format_kv_line("Replaced", &report.replaced.to_string());
    Ok(())
}

fn run_init_config(path: Option<PathBuf>) -> Result<(), String> {
    let path = path
        .or_else(config::default_config_path)
        .ok_or_else(|| "could not determine home directory for config".to_string())?;
    if config::ensure_default_config_file(&path)? {
        format_kv_line("Created", &path.display().to_string());
    } else {
        format_kv_line("Exists", &path.display().to_string());
    }
    Ok(())
}

async fn run_async(run: RunConfig) -> Result<(), String> {
    if run.no_color {
        colored::control::set_override(false);
    }
    match run.command.clone() {
        Command::Catalog(args) => run_catalog(&run, args).await,
        Command::FixImages { file } => run_fix_images(&file),
        Command::InitConfig => run_init_config(run.config_path.clone()),
        Command::Posts { .. } | Command::Comments { .. } | Command::Page => run_admin(&run).await,
    }
}

pub fn run_cli() -> Result<(), String> {
    let args = match CliArgs::try_parse() {
        Ok(args) => args,
        Err(e) => match e.kind() {
            ErrorKind::DisplayHelp => {
                print!("{}", render_custom_help());
                return Ok(());
            }
            ErrorKind::DisplayVersion => {
                let cmd = CliArgs::command();
                print!("{}", cmd.render_version());
                return Ok(());
            }
            _ => return Err(e.to_string()),
        },
    };

    let cfg = match args.config.as_deref() {
        Some(path) => config::load_config(&config::expand_tilde(path), false)?,
        None => match config::default_config_path() {
            Some(path) => config::load_config(&path, true)?,
            None => ConfigFile::default(),
        },
    };

    let run = build_run_config(args, cfg)?;
    init_logging(run.verbose);

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| format!("failed to build runtime: {e}"))?;

    rt.block_on(run_async(run))
}
