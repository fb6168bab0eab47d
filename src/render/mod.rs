pub mod page;

use crate::catalog::PageControl;
use crate::models::{Comment, Post, Product};
use crate::view::{Action, ActionKind, CountLabel, Region, View};

pub const POST_COLUMNS: usize = 5;
pub const COMMENT_COLUMNS: usize = 4;

/// Label shown for a comment whose post is missing from the posts mirror.
pub const MISSING_POST_LABEL: &str = "N/A";

pub const PLACEHOLDER_IMAGE: &str = "https://placehold.co/600x400?text=No+Image";

pub fn escape_html(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

fn action_button(action: &Action, class: &str, label: &str) -> String {
    format!(
        r#"<button type="button" class="btn {class}" data-action="{}" data-id="{}" title="{label}">{label}</button>"#,
        action.kind.as_str(),
        escape_html(&action.id),
    )
}

/// Controls a post row carries, in display order. A soft-deleted post swaps
/// its delete control for restore; hard delete is always present.
pub fn post_actions(post: &Post) -> Vec<Action> {
    let toggle = if post.is_deleted {
        ActionKind::RestorePost
    } else {
        ActionKind::SoftDeletePost
    };
    vec![
        Action::new(ActionKind::EditPost, post.id.clone()),
        Action::new(toggle, post.id.clone()),
        Action::new(ActionKind::HardDeletePost, post.id.clone()),
    ]
}

pub fn comment_actions(comment: &Comment) -> Vec<Action> {
    vec![
        Action::new(ActionKind::EditComment, comment.id.clone()),
        Action::new(ActionKind::DeleteComment, comment.id.clone()),
    ]
}

fn button_for(action: &Action) -> String {
    match action.kind {
        ActionKind::EditPost | ActionKind::EditComment => {
            action_button(action, "btn-outline-warning", "Edit")
        }
        ActionKind::SoftDeletePost => action_button(action, "btn-outline-danger", "Delete"),
        ActionKind::RestorePost => action_button(action, "btn-outline-success", "Restore"),
        ActionKind::HardDeletePost => {
            action_button(action, "btn-outline-dark", "Delete permanently")
        }
        ActionKind::DeleteComment => action_button(action, "btn-outline-danger", "Delete"),
    }
}

pub fn placeholder_row(colspan: usize, message: &str) -> String {
    format!(
        r#"<tr class="placeholder"><td colspan="{colspan}" class="text-center py-4">{}</td></tr>"#,
        escape_html(message)
    )
}

pub fn error_row(colspan: usize, message: &str) -> String {
    format!(
        r#"<tr class="load-error"><td colspan="{colspan}" class="text-center text-danger">{}</td></tr>"#,
        escape_html(message)
    )
}

pub fn render_posts(posts: &[Post]) -> String {
    if posts.is_empty() {
        return placeholder_row(POST_COLUMNS, "No posts yet");
    }
    let mut out = String::new();
    for post in posts {
        let (row_class, badge) = if post.is_deleted {
            (
                "deleted text-decoration-line-through text-muted",
                r#"<span class="badge bg-danger">Deleted</span>"#,
            )
        } else {
            ("", r#"<span class="badge bg-success">Active</span>"#)
        };
        let buttons: String = post_actions(post).iter().map(button_for).collect();
        out.push_str(&format!(
            r#"<tr class="{row_class}" data-id="{id}"><td class="fw-bold">#{id}</td><td>{title}</td><td>{views}</td><td>{badge}</td><td><div class="btn-group btn-group-sm" role="group">{buttons}</div></td></tr>"#,
            id = escape_html(&post.id),
            title = escape_html(&post.title),
            views = post.views,
        ));
        out.push('\n');
    }
    out
}

pub fn post_label<'a>(posts: &'a [Post], post_id: &str) -> &'a str {
    posts
        .iter()
        .find(|p| p.id == post_id)
        .map(|p| p.title.as_str())
        .unwrap_or(MISSING_POST_LABEL)
}

/// Comments resolve their post's title from `posts`, so render them after
/// the posts mirror is loaded.
pub fn render_comments(comments: &[Comment], posts: &[Post]) -> String {
    if comments.is_empty() {
        return placeholder_row(COMMENT_COLUMNS, "No comments yet");
    }
    let mut out = String::new();
    for comment in comments {
        let buttons: String = comment_actions(comment).iter().map(button_for).collect();
        out.push_str(&format!(
            r#"<tr data-id="{id}"><td class="fw-bold">#{id}</td><td>{text}</td><td><span class="badge bg-info">{post_id}</span><small class="text-muted d-block">{label}</small></td><td><div class="btn-group btn-group-sm" role="group">{buttons}</div></td></tr>"#,
            id = escape_html(&comment.id),
            text = escape_html(&comment.text),
            post_id = escape_html(&comment.post_id),
            label = escape_html(post_label(posts, &comment.post_id)),
        ));
        out.push('\n');
    }
    out
}

/// Options for the comment form's post picker. Soft-deleted posts are left
/// out.
pub fn render_post_options(posts: &[Post]) -> String {
    let mut out = String::from(r#"<option value="">Select a post...</option>"#);
    for post in posts.iter().filter(|p| !p.is_deleted) {
        out.push_str(&format!(
            r#"<option value="{id}">{id} - {title}</option>"#,
            id = escape_html(&post.id),
            title = escape_html(&post.title),
        ));
    }
    out
}

pub fn show_posts<V: View + ?Sized>(view: &mut V, posts: &[Post]) {
    view.show(Region::PostsTable, render_posts(posts));
    view.set_count(CountLabel::Posts, posts.len());
}

pub fn show_post_options<V: View + ?Sized>(view: &mut V, posts: &[Post]) {
    view.show(Region::PostOptions, render_post_options(posts));
}

pub fn show_comments<V: View + ?Sized>(view: &mut V, comments: &[Comment], posts: &[Post]) {
    view.show(Region::CommentsTable, render_comments(comments, posts));
    view.set_count(CountLabel::Comments, comments.len());
}

pub fn format_price(price: f64) -> String {
    format!("${price:.2}")
}

/// First usable product image, then the category image, then the
/// placeholder.
pub fn product_image(product: &Product) -> &str {
    if let Some(url) = product.images.first() {
        return url;
    }
    product
        .category
        .image
        .as_deref()
        .filter(|u| u.starts_with("http://") || u.starts_with("https://"))
        .unwrap_or(PLACEHOLDER_IMAGE)
}

pub fn render_products(products: &[&Product]) -> String {
    if products.is_empty() {
        return r#"<div class="col-12 placeholder text-center py-5">No products found</div>"#
            .to_string();
    }
    let mut out = String::new();
    for product in products {
        out.push_str(&format!(
            r#"<div class="col product-card" data-id="{id}"><div class="card h-100"><img src="{src}" class="card-img-top" alt="{title}" loading="lazy" onerror="this.onerror=null;this.src='{fallback}'"><div class="card-body"><span class="badge bg-secondary">{category}</span><h5 class="card-title">{title}</h5><p class="card-text text-muted">{description}</p></div><div class="card-footer fw-bold">{price}</div></div></div>"#,
            id = escape_html(&product.id),
            src = escape_html(product_image(product)),
            fallback = PLACEHOLDER_IMAGE,
            title = escape_html(&product.title),
            category = escape_html(&product.category.name),
            description = escape_html(&product.description),
            price = format_price(product.price),
        ));
        out.push('\n');
    }
    out
}

pub fn render_pagination(controls: &[PageControl]) -> String {
    if controls.is_empty() {
        return String::new();
    }
    let mut out = String::from(r#"<ul class="pagination justify-content-center">"#);
    for control in controls {
        let item = match control {
            PageControl::Previous(target) => nav_item("&laquo;", *target),
            PageControl::Next(target) => nav_item("&raquo;", *target),
            PageControl::Page { number, current } => {
                if *current {
                    format!(
                        r#"<li class="page-item active" aria-current="page"><span class="page-link">{number}</span></li>"#
                    )
                } else {
                    format!(
                        r##"<li class="page-item"><a class="page-link" href="#" data-page="{number}">{number}</a></li>"##
                    )
                }
            }
            PageControl::Ellipsis => {
                r#"<li class="page-item disabled"><span class="page-link">&hellip;</span></li>"#
                    .to_string()
            }
        };
        out.push_str(&item);
    }
    out.push_str("</ul>");
    out
}

fn nav_item(label: &str, target: Option<usize>) -> String {
    match target {
        Some(page) => format!(
            r##"<li class="page-item"><a class="page-link" href="#" data-page="{page}">{label}</a></li>"##
        ),
        None => format!(
            r#"<li class="page-item disabled"><span class="page-link">{label}</span></li>"#
        ),
    }
}
