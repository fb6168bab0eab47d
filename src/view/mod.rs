use std::collections::{HashMap, VecDeque};

/// Named containers the renderer writes into.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Region {
    PostsTable,
    CommentsTable,
    PostOptions,
    ProductGrid,
    Pagination,
}

impl Region {
    pub fn element_id(self) -> &'static str {
        match self {
            Region::PostsTable => "postsTableBody",
            Region::CommentsTable => "commentsTableBody",
            Region::PostOptions => "commentPostId",
            Region::ProductGrid => "productGrid",
            Region::Pagination => "pagination",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CountLabel {
    Posts,
    Comments,
    Products,
}

impl CountLabel {
    pub fn element_id(self) -> &'static str {
        match self {
            CountLabel::Posts => "postCount",
            CountLabel::Comments => "commentCount",
            CountLabel::Products => "productCount",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FormKind {
    Post,
    Comment,
}

/// Raw post form input. `id` empty means create.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PostForm {
    pub id: String,
    pub title: String,
    pub views: String,
}

/// Raw comment form input. `id` empty means create.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CommentForm {
    pub id: String,
    pub text: String,
    pub post_id: String,
}

/// Everything the handlers and renderer need from the page, bound once.
pub trait View {
    fn show(&mut self, region: Region, markup: String);

    fn set_count(&mut self, label: CountLabel, count: usize);

    fn fill_post_form(&mut self, form: PostForm);

    fn fill_comment_form(&mut self, form: CommentForm);

    fn clear_form(&mut self, kind: FormKind);

    /// Blocking user-facing message.
    fn alert(&mut self, message: &str);

    /// Blocking yes/no prompt.
    fn confirm(&mut self, message: &str) -> bool;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ActionKind {
    EditPost,
    SoftDeletePost,
    RestorePost,
    HardDeletePost,
    EditComment,
    DeleteComment,
}

impl ActionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ActionKind::EditPost => "edit-post",
            ActionKind::SoftDeletePost => "soft-delete-post",
            ActionKind::RestorePost => "restore-post",
            ActionKind::HardDeletePost => "hard-delete-post",
            ActionKind::EditComment => "edit-comment",
            ActionKind::DeleteComment => "delete-comment",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Some(match value.trim() {
            "edit-post" => ActionKind::EditPost,
            "soft-delete-post" => ActionKind::SoftDeletePost,
            "restore-post" => ActionKind::RestorePost,
            "hard-delete-post" => ActionKind::HardDeletePost,
            "edit-comment" => ActionKind::EditComment,
            "delete-comment" => ActionKind::DeleteComment,
            _ => return None,
        })
    }
}

/// A row control as emitted in markup (`data-action` / `data-id`) and fed
/// back into the session's dispatcher.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Action {
    pub kind: ActionKind,
    pub id: String,
}

impl Action {
    pub fn new(kind: ActionKind, id: impl Into<String>) -> Self {
        Self {
            kind,
            id: id.into(),
        }
    }

    pub fn from_attributes(kind: &str, id: &str) -> Option<Self> {
        let id = id.trim();
        if id.is_empty() {
            return None;
        }
        Some(Self::new(ActionKind::parse(kind)?, id))
    }
}

/// View that keeps everything in memory. Confirm prompts are answered from a
/// queue, falling back to `default_confirm` once it is drained.
#[derive(Clone, Debug, Default)]
pub struct MemoryView {
    regions: HashMap<Region, String>,
    counts: HashMap<CountLabel, usize>,
    post_form: PostForm,
    comment_form: CommentForm,
    alerts: Vec<String>,
    prompts: Vec<String>,
    answers: VecDeque<bool>,
    default_confirm: bool,
}

impl MemoryView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_default_confirm(mut self, answer: bool) -> Self {
        self.default_confirm = answer;
        self
    }

    pub fn answer_confirms(&mut self, answers: impl IntoIterator<Item = bool>) {
        self.answers.extend(answers);
    }

    pub fn region(&self, region: Region) -> Option<&str> {
        self.regions.get(&region).map(String::as_str)
    }

    pub fn count(&self, label: CountLabel) -> Option<usize> {
        self.counts.get(&label).copied()
    }

    pub fn post_form(&self) -> &PostForm {
        &self.post_form
    }

    pub fn comment_form(&self) -> &CommentForm {
        &self.comment_form
    }

    pub fn alerts(&self) -> &[String] {
        &self.alerts
    }

    pub fn prompts(&self) -> &[String] {
        &self.prompts
    }
}

impl View for MemoryView {
    fn show(&mut self, region: Region, markup: String) {
        self.regions.insert(region, markup);
    }

    fn set_count(&mut self, label: CountLabel, count: usize) {
        self.counts.insert(label, count);
    }

    fn fill_post_form(&mut self, form: PostForm) {
        self.post_form = form;
    }

    fn fill_comment_form(&mut self, form: CommentForm) {
        self.comment_form = form;
    }

    fn clear_form(&mut self, kind: FormKind) {
        match kind {
            FormKind::Post => self.post_form = PostForm::default(),
            FormKind::Comment => self.comment_form = CommentForm::default(),
        }
    }

    fn alert(&mut self, message: &str) {
        self.alerts.push(message.to_string());
    }

    fn confirm(&mut self, message: &str) -> bool {
        self.prompts.push(message.to_string());
        self.answers.pop_front().unwrap_or(self.default_confirm)
    }
}
