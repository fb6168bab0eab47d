use serde_json::{json, Map, Value};
use thiserror::Error;

use crate::client::{self, Backend, ClientError, UpdateMode};
use crate::mirror::Mirror;
use crate::models::{self, Collection, Comment, Post};
use crate::render::{self, COMMENT_COLUMNS, POST_COLUMNS};
use crate::view::{Action, ActionKind, CommentForm, FormKind, PostForm, Region, View};

const LOAD_ERROR: &str = "Failed to load data. Make sure the API server is running.";

const CONFIRM_SOFT_DELETE: &str = "Are you sure you want to delete this post?";
const CONFIRM_RESTORE: &str = "Are you sure you want to restore this post?";
const CONFIRM_HARD_DELETE: &str =
    "Are you sure you want to PERMANENTLY delete this post? This cannot be undone!";
const CONFIRM_DELETE_COMMENT: &str = "Are you sure you want to delete this comment?";

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Please enter a title!")]
    MissingTitle,

    #[error("Please enter the number of views!")]
    MissingViews,

    #[error("Views must be a number, got '{value}'!")]
    InvalidViews { value: String },

    #[error("Please fill in all fields!")]
    MissingCommentFields,
}

/// What a handler ended up doing. Every non-`Applied` outcome other than
/// `Cancelled` and `NotFound` has already been surfaced through
/// [`View::alert`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    Applied,
    /// The user declined the confirmation prompt. Nothing was sent.
    Cancelled,
    /// Input failed validation. Nothing was sent.
    Rejected(ValidationError),
    /// The network call failed.
    Failed(String),
    /// The id is not in the mirror.
    NotFound,
}

/// One admin page: the posts and comments mirrors plus the backend and view
/// they are synchronized through. Every mutation ends in a reload of the
/// affected mirror(s); the mirrors are never patched locally.
pub struct AdminSession<B, V> {
    backend: B,
    view: V,
    posts: Mirror<Post>,
    comments: Mirror<Comment>,
    update_mode: UpdateMode,
}

impl<B: Backend, V: View> AdminSession<B, V> {
    pub fn new(backend: B, view: V, update_mode: UpdateMode) -> Self {
        Self {
            backend,
            view,
            posts: Mirror::new(),
            comments: Mirror::new(),
            update_mode,
        }
    }

    pub fn posts(&self) -> &Mirror<Post> {
        &self.posts
    }

    pub fn comments(&self) -> &Mirror<Comment> {
        &self.comments
    }

    pub fn view(&self) -> &V {
        &self.view
    }

    pub fn view_mut(&mut self) -> &mut V {
        &mut self.view
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn update_mode(&self) -> UpdateMode {
        self.update_mode
    }

    pub fn into_view(self) -> V {
        self.view
    }

    /// Posts first: comment rows look up their post's title.
    pub async fn init(&mut self) {
        self.load_posts().await;
        self.load_comments().await;
    }

    pub async fn load_posts(&mut self) -> bool {
        match self.posts.reload(&self.backend).await {
            Ok(_) => {
                render::show_posts(&mut self.view, self.posts.items());
                render::show_post_options(&mut self.view, self.posts.items());
                true
            }
            Err(e) => {
                log::error!("error loading posts: {e}");
                self.view
                    .show(Region::PostsTable, render::error_row(POST_COLUMNS, LOAD_ERROR));
                false
            }
        }
    }

    pub async fn load_comments(&mut self) -> bool {
        match self.comments.reload(&self.backend).await {
            Ok(_) => {
                render::show_comments(&mut self.view, self.comments.items(), self.posts.items());
                true
            }
            Err(e) => {
                log::error!("error loading comments: {e}");
                self.view.show(
                    Region::CommentsTable,
                    render::error_row(COMMENT_COLUMNS, LOAD_ERROR),
                );
                false
            }
        }
    }

    pub async fn dispatch(&mut self, action: &Action) -> Outcome {
        match action.kind {
            ActionKind::EditPost => self.edit_post(&action.id),
            ActionKind::SoftDeletePost => self.soft_delete_post(&action.id).await,
            ActionKind::RestorePost => self.restore_post(&action.id).await,
            ActionKind::HardDeletePost => self.hard_delete_post(&action.id).await,
            ActionKind::EditComment => self.edit_comment(&action.id),
            ActionKind::DeleteComment => self.delete_comment(&action.id).await,
        }
    }

    /// Fills the post form from the mirror.
    pub fn edit_post(&mut self, id: &str) -> Outcome {
        let Some(post) = self.posts.find(id) else {
            return Outcome::NotFound;
        };
        let form = PostForm {
            id: post.id.clone(),
            title: post.title.clone(),
            views: post.views.to_string(),
        };
        self.view.fill_post_form(form);
        Outcome::Applied
    }

    /// Creates when `form.id` is empty, updates otherwise. Saving always
    /// sends `isDeleted: false`, so editing a soft-deleted post restores it.
    pub async fn save_post(&mut self, form: &PostForm) -> Outcome {
        let (title, views) = match validate_post(form) {
            Ok(parsed) => parsed,
            Err(e) => return self.reject(e),
        };
        let mut fields = Map::new();
        fields.insert("title".to_string(), Value::String(title));
        fields.insert("views".to_string(), json!(views));
        fields.insert("isDeleted".to_string(), Value::Bool(false));

        let id = form.id.trim();
        let result = if id.is_empty() {
            let new_id = self.posts.next_id();
            fields.insert("id".to_string(), Value::String(new_id.clone()));
            log::info!("creating post {new_id}");
            self.backend
                .create(Collection::Posts, Value::Object(fields))
                .await
                .map(drop)
        } else {
            log::info!("updating post {id} ({})", self.update_mode.label());
            client::update(&self.backend, Collection::Posts, id, fields, self.update_mode)
                .await
                .map(drop)
        };

        match result {
            Ok(()) => {
                self.view.clear_form(FormKind::Post);
                self.load_posts().await;
                Outcome::Applied
            }
            Err(e) => self.fail("error saving post", "Error saving post!", e),
        }
    }

    pub async fn soft_delete_post(&mut self, id: &str) -> Outcome {
        self.set_post_deleted(id, true, CONFIRM_SOFT_DELETE).await
    }

    pub async fn restore_post(&mut self, id: &str) -> Outcome {
        self.set_post_deleted(id, false, CONFIRM_RESTORE).await
    }

    async fn set_post_deleted(&mut self, id: &str, deleted: bool, prompt: &str) -> Outcome {
        if !self.view.confirm(prompt) {
            return Outcome::Cancelled;
        }
        let mut fields = Map::new();
        fields.insert("isDeleted".to_string(), Value::Bool(deleted));
        let result =
            client::update(&self.backend, Collection::Posts, id, fields, self.update_mode).await;
        match result {
            Ok(_) => {
                log::info!("post {id} isDeleted={deleted}");
                self.load_posts().await;
                Outcome::Applied
            }
            Err(e) if deleted => self.fail("error soft deleting post", "Error deleting post!", e),
            Err(e) => self.fail("error restoring post", "Error restoring post!", e),
        }
    }

    /// Permanent removal. Comments that point at the post are left alone;
    /// they are reloaded so their labels fall back to the missing-post text.
    pub async fn hard_delete_post(&mut self, id: &str) -> Outcome {
        if !self.view.confirm(CONFIRM_HARD_DELETE) {
            return Outcome::Cancelled;
        }
        match self.backend.remove(Collection::Posts, id).await {
            Ok(()) => {
                log::info!("post {id} permanently deleted");
                self.load_posts().await;
                self.load_comments().await;
                Outcome::Applied
            }
            Err(e) => self.fail(
                "error hard deleting post",
                "Error permanently deleting post!",
                e,
            ),
        }
    }

    pub fn edit_comment(&mut self, id: &str) -> Outcome {
        let Some(comment) = self.comments.find(id) else {
            return Outcome::NotFound;
        };
        let form = CommentForm {
            id: comment.id.clone(),
            text: comment.text.clone(),
            post_id: comment.post_id.clone(),
        };
        self.view.fill_comment_form(form);
        Outcome::Applied
    }

    pub async fn save_comment(&mut self, form: &CommentForm) -> Outcome {
        let text = form.text.trim();
        let post_id = form.post_id.trim();
        if text.is_empty() || post_id.is_empty() {
            return self.reject(ValidationError::MissingCommentFields);
        }
        let mut fields = Map::new();
        fields.insert("text".to_string(), Value::String(text.to_string()));
        fields.insert("postId".to_string(), Value::String(post_id.to_string()));

        let id = form.id.trim();
        let result = if id.is_empty() {
            let new_id = self.comments.next_id();
            fields.insert("id".to_string(), Value::String(new_id.clone()));
            log::info!("creating comment {new_id} on post {post_id}");
            self.backend
                .create(Collection::Comments, Value::Object(fields))
                .await
                .map(drop)
        } else {
            log::info!("updating comment {id} ({})", self.update_mode.label());
            client::update(
                &self.backend,
                Collection::Comments,
                id,
                fields,
                self.update_mode,
            )
            .await
            .map(drop)
        };

        match result {
            Ok(()) => {
                self.view.clear_form(FormKind::Comment);
                self.load_comments().await;
                Outcome::Applied
            }
            Err(e) => self.fail("error saving comment", "Error saving comment!", e),
        }
    }

    pub async fn delete_comment(&mut self, id: &str) -> Outcome {
        if !self.view.confirm(CONFIRM_DELETE_COMMENT) {
            return Outcome::Cancelled;
        }
        match self.backend.remove(Collection::Comments, id).await {
            Ok(()) => {
                log::info!("comment {id} deleted");
                self.load_comments().await;
                Outcome::Applied
            }
            Err(e) => self.fail("error deleting comment", "Error deleting comment!", e),
        }
    }

    fn reject(&mut self, err: ValidationError) -> Outcome {
        self.view.alert(&err.to_string());
        Outcome::Rejected(err)
    }

    fn fail(&mut self, context: &str, message: &str, err: ClientError) -> Outcome {
        log::error!("{context}: {err}");
        self.view.alert(message);
        Outcome::Failed(err.to_string())
    }
}

/// Presence checks plus an integer parse of `views`.
pub fn validate_post(form: &PostForm) -> Result<(String, i64), ValidationError> {
    let title = form.title.trim();
    if title.is_empty() {
        return Err(ValidationError::MissingTitle);
    }
    let views = form.views.trim();
    if views.is_empty() {
        return Err(ValidationError::MissingViews);
    }
    let views = models::parse_int_prefix(views).ok_or_else(|| ValidationError::InvalidViews {
        value: views.to_string(),
    })?;
    Ok((title.to_string(), views))
}
