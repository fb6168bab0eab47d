use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{json, Map, Value};

use crate::catalog::{CatalogController, SortKey};
use crate::client::{self, Backend, ClientError, UpdateMode};
use crate::handlers::{AdminSession, Outcome, ValidationError};
use crate::models::{Collection, Product};
use crate::view::{Action, CommentForm, CountLabel, MemoryView, PostForm, Region};

/// json-server stand-in. Every call is recorded as `METHOD /collection[/id]`.
#[derive(Default)]
struct MemoryBackend {
    posts: Mutex<Vec<Value>>,
    comments: Mutex<Vec<Value>>,
    calls: Mutex<Vec<String>>,
    bodies: Mutex<Vec<Value>>,
    offline: AtomicBool,
}

impl MemoryBackend {
    fn seeded(posts: Value, comments: Value) -> Self {
        let backend = Self::default();
        if let Value::Array(items) = posts {
            *backend.posts.lock().unwrap() = items;
        }
        if let Value::Array(items) = comments {
            *backend.comments.lock().unwrap() = items;
        }
        backend
    }

    fn store(&self, collection: Collection) -> &Mutex<Vec<Value>> {
        match collection {
            Collection::Posts => &self.posts,
            Collection::Comments => &self.comments,
        }
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn mutations(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter(|c| !c.starts_with("GET "))
            .collect()
    }

    fn stored(&self, collection: Collection, id: &str) -> Option<Value> {
        self.store(collection)
            .lock()
            .unwrap()
            .iter()
            .find(|v| id_of(v) == id)
            .cloned()
    }

    fn go_offline(&self) {
        self.offline.store(true, Ordering::SeqCst);
    }
}

fn id_of(value: &Value) -> String {
    match value.get("id") {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}

#[async_trait]
impl Backend for MemoryBackend {
    async fn list(&self, collection: Collection) -> Result<Vec<Value>, ClientError> {
        self.record(format!("GET /{collection}"));
        if self.offline.load(Ordering::SeqCst) {
            return Err(ClientError::Shape {
                url: format!("/{collection}"),
                message: "connection refused".to_string(),
            });
        }
        Ok(self.store(collection).lock().unwrap().clone())
    }

    async fn get(&self, collection: Collection, id: &str) -> Result<Value, ClientError> {
        self.record(format!("GET /{collection}/{id}"));
        self.stored(collection, id)
            .ok_or_else(|| ClientError::NotFound {
                collection,
                id: id.to_string(),
            })
    }

    async fn create(&self, collection: Collection, data: Value) -> Result<Value, ClientError> {
        self.record(format!("POST /{collection}"));
        self.bodies.lock().unwrap().push(data.clone());
        self.store(collection).lock().unwrap().push(data.clone());
        Ok(data)
    }

    async fn patch(
        &self,
        collection: Collection,
        id: &str,
        fields: Map<String, Value>,
    ) -> Result<Value, ClientError> {
        self.record(format!("PATCH /{collection}/{id}"));
        self.bodies.lock().unwrap().push(Value::Object(fields.clone()));
        let mut items = self.store(collection).lock().unwrap();
        let record = items
            .iter_mut()
            .find(|v| id_of(v) == id)
            .ok_or_else(|| ClientError::NotFound {
                collection,
                id: id.to_string(),
            })?;
        if let Some(object) = record.as_object_mut() {
            object.extend(fields);
        }
        Ok(record.clone())
    }

    async fn replace(
        &self,
        collection: Collection,
        id: &str,
        data: Value,
    ) -> Result<Value, ClientError> {
        self.record(format!("PUT /{collection}/{id}"));
        self.bodies.lock().unwrap().push(data.clone());
        let mut items = self.store(collection).lock().unwrap();
        let record = items
            .iter_mut()
            .find(|v| id_of(v) == id)
            .ok_or_else(|| ClientError::NotFound {
                collection,
                id: id.to_string(),
            })?;
        *record = data.clone();
        Ok(data)
    }

    async fn remove(&self, collection: Collection, id: &str) -> Result<(), ClientError> {
        self.record(format!("DELETE /{collection}/{id}"));
        let mut items = self.store(collection).lock().unwrap();
        let before = items.len();
        items.retain(|v| id_of(v) != id);
        if items.len() == before {
            return Err(ClientError::NotFound {
                collection,
                id: id.to_string(),
            });
        }
        Ok(())
    }
}

fn sample_posts() -> Value {
    json!([
        {"id": "1", "title": "First", "views": 10, "isDeleted": false},
        {"id": "2", "title": "Second", "views": "25", "author": "ann"},
        {"id": 3, "title": "Third", "views": 0, "isDeleted": false}
    ])
}

fn sample_comments() -> Value {
    json!([
        {"id": "1", "text": "nice", "postId": "1"},
        {"id": "2", "text": "meh", "postId": 2}
    ])
}

async fn session_with(
    backend: MemoryBackend,
    mode: UpdateMode,
) -> AdminSession<MemoryBackend, MemoryView> {
    let view = MemoryView::new().with_default_confirm(true);
    let mut session = AdminSession::new(backend, view, mode);
    session.init().await;
    session
}

fn rows(markup: &str) -> usize {
    markup.matches("<tr").count()
}

fn region(session: &AdminSession<MemoryBackend, MemoryView>, region: Region) -> String {
    session.view().region(region).unwrap_or_default().to_string()
}

#[tokio::test]
async fn init_renders_one_row_per_record() {
    let session = session_with(
        MemoryBackend::seeded(sample_posts(), sample_comments()),
        UpdateMode::Patch,
    )
    .await;

    assert_eq!(session.posts().len(), 3);
    assert_eq!(rows(&region(&session, Region::PostsTable)), 3);
    assert_eq!(session.view().count(CountLabel::Posts), Some(3));
    assert_eq!(rows(&region(&session, Region::CommentsTable)), 2);
    assert_eq!(session.view().count(CountLabel::Comments), Some(2));
    assert_eq!(
        session.backend().calls(),
        vec!["GET /posts".to_string(), "GET /comments".to_string()]
    );
}

#[tokio::test]
async fn first_post_gets_id_one() {
    let mut session = session_with(MemoryBackend::default(), UpdateMode::Patch).await;
    assert!(region(&session, Region::PostsTable).contains("No posts yet"));
    assert_eq!(session.view().count(CountLabel::Posts), Some(0));

    let form = PostForm {
        id: String::new(),
        title: "Hello".to_string(),
        views: "5".to_string(),
    };
    assert_eq!(session.save_post(&form).await, Outcome::Applied);

    let created = session.backend().stored(Collection::Posts, "1").unwrap();
    assert_eq!(created["title"], "Hello");
    assert_eq!(created["views"], 5);
    assert_eq!(created["isDeleted"], false);
    assert_eq!(session.posts().len(), 1);
    assert_eq!(session.view().count(CountLabel::Posts), Some(1));
}

#[tokio::test]
async fn new_id_is_max_numeric_plus_one() {
    let backend = MemoryBackend::seeded(
        json!([
            {"id": "3", "title": "a", "views": 1},
            {"id": "7", "title": "b", "views": 1},
            {"id": "x", "title": "c", "views": 1}
        ]),
        json!([]),
    );
    let mut session = session_with(backend, UpdateMode::Patch).await;
    let form = PostForm {
        id: String::new(),
        title: "d".to_string(),
        views: "1".to_string(),
    };
    assert_eq!(session.save_post(&form).await, Outcome::Applied);
    assert!(session.posts().find("8").is_some());
}

#[tokio::test]
async fn soft_delete_keeps_count_and_offers_restore() {
    let mut session = session_with(
        MemoryBackend::seeded(sample_posts(), sample_comments()),
        UpdateMode::Patch,
    )
    .await;

    assert_eq!(session.soft_delete_post("1").await, Outcome::Applied);
    assert_eq!(session.posts().len(), 3);
    assert_eq!(session.view().count(CountLabel::Posts), Some(3));
    assert!(session.posts().find("1").unwrap().is_deleted);

    let table = region(&session, Region::PostsTable);
    assert!(table.contains(r#"data-action="restore-post" data-id="1""#));
    assert!(!table.contains(r#"data-action="soft-delete-post" data-id="1""#));
    assert!(!region(&session, Region::PostOptions).contains(r#"value="1""#));
    assert_eq!(
        session.backend().mutations(),
        vec!["PATCH /posts/1".to_string()]
    );

    assert_eq!(session.restore_post("1").await, Outcome::Applied);
    assert!(!session.posts().find("1").unwrap().is_deleted);
    assert!(region(&session, Region::PostOptions).contains(r#"<option value="1">1 - First</option>"#));
}

#[tokio::test]
async fn comment_without_post_renders_with_fallback_label() {
    let backend = MemoryBackend::seeded(
        sample_posts(),
        json!([
            {"id": "1", "text": "nice", "postId": "1"},
            {"id": "2", "text": "stray", "postId": null},
            {"id": "3", "text": "lost"}
        ]),
    );
    let session = session_with(backend, UpdateMode::Patch).await;

    assert!(session.comments().is_loaded());
    assert_eq!(session.view().count(CountLabel::Comments), Some(3));
    let table = region(&session, Region::CommentsTable);
    assert!(!table.contains("load-error"));
    assert_eq!(table.matches("N/A").count(), 2);
}

#[tokio::test]
async fn hard_delete_reloads_comments_and_labels_orphans() {
    let mut session = session_with(
        MemoryBackend::seeded(sample_posts(), sample_comments()),
        UpdateMode::Patch,
    )
    .await;

    assert_eq!(session.hard_delete_post("1").await, Outcome::Applied);
    assert_eq!(session.posts().len(), 2);
    assert_eq!(session.view().count(CountLabel::Posts), Some(2));

    let orphan = session.comments().find("1").unwrap();
    assert_eq!(orphan.post_id, "1");
    assert!(region(&session, Region::CommentsTable).contains("N/A"));
    assert_eq!(
        session
            .backend()
            .calls()
            .iter()
            .filter(|c| *c == "GET /comments")
            .count(),
        2
    );
}

#[tokio::test]
async fn declined_confirmation_sends_nothing() {
    let backend = MemoryBackend::seeded(sample_posts(), sample_comments());
    let mut session = AdminSession::new(backend, MemoryView::new(), UpdateMode::Patch);
    session.init().await;

    assert_eq!(session.soft_delete_post("1").await, Outcome::Cancelled);
    assert_eq!(session.hard_delete_post("1").await, Outcome::Cancelled);
    assert_eq!(session.delete_comment("1").await, Outcome::Cancelled);
    assert!(session.backend().mutations().is_empty());
    assert_eq!(session.view().prompts().len(), 3);
}

#[tokio::test]
async fn invalid_forms_never_reach_the_backend() {
    let mut session = session_with(
        MemoryBackend::seeded(sample_posts(), sample_comments()),
        UpdateMode::Patch,
    )
    .await;
    let calls_before = session.backend().calls().len();

    let missing_title = PostForm {
        id: String::new(),
        title: "   ".to_string(),
        views: "4".to_string(),
    };
    assert_eq!(
        session.save_post(&missing_title).await,
        Outcome::Rejected(ValidationError::MissingTitle)
    );
    let missing_post = CommentForm {
        id: String::new(),
        text: "hi".to_string(),
        post_id: String::new(),
    };
    assert_eq!(
        session.save_comment(&missing_post).await,
        Outcome::Rejected(ValidationError::MissingCommentFields)
    );

    assert_eq!(session.backend().calls().len(), calls_before);
    assert_eq!(
        session.view().alerts(),
        &["Please enter a title!".to_string(), "Please fill in all fields!".to_string()]
    );
}

#[tokio::test]
async fn failed_reload_keeps_the_previous_mirror() {
    let mut session = session_with(
        MemoryBackend::seeded(sample_posts(), sample_comments()),
        UpdateMode::Patch,
    )
    .await;
    session.backend().go_offline();

    assert!(!session.load_posts().await);
    assert!(!session.load_comments().await);
    assert_eq!(session.posts().len(), 3);
    assert_eq!(session.comments().len(), 2);

    let posts = region(&session, Region::PostsTable);
    assert!(posts.contains("load-error"));
    assert!(posts.contains(r#"colspan="5""#));
    assert!(region(&session, Region::CommentsTable).contains(r#"colspan="4""#));
}

#[tokio::test]
async fn edit_fills_form_and_saving_restores_deleted_post() {
    let backend = MemoryBackend::seeded(
        json!([{"id": "4", "title": "Gone", "views": 9, "isDeleted": true}]),
        json!([]),
    );
    let mut session = session_with(backend, UpdateMode::Patch).await;

    let action = Action::from_attributes("edit-post", "4").unwrap();
    assert_eq!(session.dispatch(&action).await, Outcome::Applied);
    let mut form = session.view().post_form().clone();
    assert_eq!(form.title, "Gone");
    assert_eq!(form.views, "9");

    form.title = "Back".to_string();
    assert_eq!(session.save_post(&form).await, Outcome::Applied);
    let post = session.posts().find("4").unwrap();
    assert_eq!(post.title, "Back");
    assert!(!post.is_deleted);
    assert_eq!(session.view().post_form(), &PostForm::default());

    let missing = Action::from_attributes("edit-post", "40").unwrap();
    assert_eq!(session.dispatch(&missing).await, Outcome::NotFound);
}

#[tokio::test]
async fn replace_mode_reads_then_puts_whole_record() {
    let mut session = session_with(
        MemoryBackend::seeded(sample_posts(), sample_comments()),
        UpdateMode::Replace,
    )
    .await;

    assert_eq!(session.soft_delete_post("2").await, Outcome::Applied);
    assert_eq!(
        session.backend().mutations(),
        vec!["PUT /posts/2".to_string()]
    );
    assert!(session
        .backend()
        .calls()
        .contains(&"GET /posts/2".to_string()));

    let stored = session.backend().stored(Collection::Posts, "2").unwrap();
    assert_eq!(stored["author"], "ann");
    assert_eq!(stored["isDeleted"], true);
    assert_eq!(stored["title"], "Second");
}

#[tokio::test]
async fn comments_create_and_update() {
    let mut session = session_with(
        MemoryBackend::seeded(sample_posts(), sample_comments()),
        UpdateMode::Patch,
    )
    .await;

    let form = CommentForm {
        id: String::new(),
        text: "  great post ".to_string(),
        post_id: "3".to_string(),
    };
    assert_eq!(session.save_comment(&form).await, Outcome::Applied);
    let created = session.comments().find("3").unwrap();
    assert_eq!(created.text, "great post");
    assert_eq!(created.post_id, "3");
    assert_eq!(session.view().count(CountLabel::Comments), Some(3));

    assert_eq!(session.edit_comment("2"), Outcome::Applied);
    let mut form = session.view().comment_form().clone();
    assert_eq!(form.post_id, "2");
    form.text = "better".to_string();
    assert_eq!(session.save_comment(&form).await, Outcome::Applied);
    assert_eq!(session.comments().find("2").unwrap().text, "better");

    assert_eq!(session.delete_comment("2").await, Outcome::Applied);
    assert!(session.comments().find("2").is_none());
    assert_eq!(session.view().count(CountLabel::Comments), Some(2));
}

#[tokio::test]
async fn update_of_missing_record_in_replace_mode_is_not_found() {
    let backend = MemoryBackend::seeded(sample_posts(), json!([]));
    let mut fields = Map::new();
    fields.insert("isDeleted".to_string(), Value::Bool(true));
    let err = client::update(&backend, Collection::Posts, "99", fields, UpdateMode::Replace)
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::NotFound { .. }));
    assert!(backend.mutations().is_empty());
}

fn catalog(n: usize) -> Vec<Product> {
    let items: Vec<Value> = (1..=n)
        .map(|i| {
            let title = if i % 2 == 0 {
                format!("Shirt {i}")
            } else {
                format!("Mug {i}")
            };
            let price = (i * 7 % 50) as f64 + 0.5;
            json!({
                "id": i,
                "title": title,
                "price": price,
                "category": {"name": "Clothes"},
                "images": "[\"https://img.test/a.png\"]"
            })
        })
        .collect();
    client::parse_catalog(Value::Array(items)).unwrap()
}

#[test]
fn catalog_filter_then_clear_restores_everything() {
    let mut ctl = CatalogController::new(10);
    ctl.replace(catalog(12));
    assert!(ctl.go_to_page(2));

    ctl.apply_filter("  SHIRT ");
    assert_eq!(ctl.page(), 1);
    assert_eq!(ctl.filtered_len(), 6);
    assert!(ctl.filtered().iter().all(|p| p.title.starts_with("Shirt")));

    ctl.apply_filter("");
    assert_eq!(ctl.filtered_len(), 12);
    assert_eq!(ctl.mirror_len(), 12);
}

#[test]
fn catalog_price_sorts_reverse_each_other() {
    let mut ctl = CatalogController::new(10);
    ctl.replace(catalog(9));

    ctl.apply_sort(SortKey::PriceAsc);
    let asc: Vec<f64> = ctl.filtered().iter().map(|p| p.price).collect();
    assert!(asc.windows(2).all(|w| w[0] <= w[1]));

    ctl.apply_sort(SortKey::PriceDesc);
    let mut desc: Vec<f64> = ctl.filtered().iter().map(|p| p.price).collect();
    desc.reverse();
    assert_eq!(asc, desc);
}

#[test]
fn catalog_sort_after_filter_touches_only_matches() {
    let mut ctl = CatalogController::new(3);
    ctl.replace(catalog(20));
    assert!(ctl.go_to_page(2));

    ctl.apply_filter("shirt");
    assert_eq!(ctl.page(), 1);
    assert_eq!(ctl.filtered_len(), 10);
    assert!(ctl.go_to_page(3));

    ctl.apply_sort(SortKey::PriceAsc);
    assert_eq!(ctl.page(), 3);
    assert_eq!(ctl.filtered_len(), 10);
    assert!(ctl.filtered().iter().all(|p| p.title.starts_with("Shirt")));
    let asc: Vec<String> = ctl.filtered().iter().map(|p| p.id.clone()).collect();

    ctl.apply_sort(SortKey::PriceDesc);
    assert_eq!(ctl.page(), 3);
    let mut desc: Vec<String> = ctl.filtered().iter().map(|p| p.id.clone()).collect();
    desc.reverse();
    assert_eq!(asc, desc);
}

#[test]
fn catalog_filter_after_sort_returns_to_mirror_order() {
    let mut ctl = CatalogController::new(10);
    ctl.replace(catalog(6));
    ctl.apply_sort(SortKey::PriceDesc);

    ctl.apply_filter("");
    let ids: Vec<&str> = ctl.filtered().iter().map(|p| p.id.as_str()).collect();
    assert_eq!(ids, vec!["1", "2", "3", "4", "5", "6"]);

    ctl.apply_filter("shirt");
    let ids: Vec<&str> = ctl.filtered().iter().map(|p| p.id.as_str()).collect();
    assert_eq!(ids, vec!["2", "4", "6"]);
}

#[test]
fn catalog_pagination_bounds() {
    let mut ctl = CatalogController::new(10);
    ctl.replace(catalog(25));
    assert_eq!(ctl.total_pages(), 3);

    assert!(ctl.go_to_page(3));
    assert_eq!(ctl.page_items().len(), 5);
    assert!(!ctl.go_to_page(0));
    assert!(!ctl.go_to_page(4));
    assert_eq!(ctl.page(), 3);

    let mut view = MemoryView::new();
    ctl.show(&mut view);
    assert_eq!(view.count(CountLabel::Products), Some(25));
    assert!(view.region(Region::Pagination).unwrap().contains("active"));
    assert_eq!(
        view.region(Region::ProductGrid)
            .unwrap()
            .matches("product-card")
            .count(),
        5
    );
}

#[test]
fn single_page_catalog_has_no_controls() {
    let mut ctl = CatalogController::new(10);
    ctl.replace(catalog(4));
    let mut view = MemoryView::new();
    ctl.show(&mut view);
    assert_eq!(view.region(Region::Pagination), Some(""));
    assert!(view
        .region(Region::ProductGrid)
        .unwrap()
        .contains("https://img.test/a.png"));
}

#[test]
fn fix_images_rewrites_file_and_keeps_backup() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("db.json");
    let original = json!({
        "products": [
            {"id": 7, "title": "Sneaker", "category": {"name": "Shoes"}, "images": "[\"broken\"]"},
            {"id": "10", "title": "Thing", "images": []}
        ]
    });
    std::fs::write(&path, serde_json::to_string(&original).unwrap()).unwrap();

    let report = crate::images::fix_images_file(&path).unwrap();
    assert_eq!(report.replaced, 2);
    assert_eq!(report.backup, dir.path().join("db.json.backup"));

    let backup: Value =
        serde_json::from_str(&std::fs::read_to_string(&report.backup).unwrap()).unwrap();
    assert_eq!(backup, original);

    let written = std::fs::read_to_string(&path).unwrap();
    assert!(written.contains("\n    \"products\""));
    let fixed: Value = serde_json::from_str(&written).unwrap();
    assert_eq!(
        fixed["products"][0]["images"],
        json!([crate::images::image_for(7, "Shoes").unwrap()])
    );
    assert_eq!(
        fixed["products"][1]["images"],
        json!([crate::images::image_for(10, "Miscellaneous").unwrap()])
    );
}

mod http {
    use super::*;

    use axum::extract::{Path, State};
    use axum::http::StatusCode;
    use axum::routing::get;
    use axum::{Json, Router};

    use crate::client::{CatalogSource, HttpBackend, HttpOptions};

    type Seen = Arc<Mutex<Vec<(String, Value)>>>;

    async fn show_post(Path(id): Path<String>) -> Result<Json<Value>, StatusCode> {
        if id == "99" {
            return Err(StatusCode::NOT_FOUND);
        }
        Ok(Json(json!({
            "id": id,
            "title": "Stored",
            "views": 3,
            "isDeleted": false,
            "author": "ann"
        })))
    }

    async fn patch_post(
        State(seen): State<Seen>,
        Path(_id): Path<String>,
        Json(body): Json<Value>,
    ) -> Json<Value> {
        seen.lock().unwrap().push(("PATCH".to_string(), body.clone()));
        Json(body)
    }

    async fn put_post(
        State(seen): State<Seen>,
        Path(_id): Path<String>,
        Json(body): Json<Value>,
    ) -> Json<Value> {
        seen.lock().unwrap().push(("PUT".to_string(), body.clone()));
        Json(body)
    }

    async fn delete_post(State(seen): State<Seen>, Path(_id): Path<String>) -> StatusCode {
        seen.lock().unwrap().push(("DELETE".to_string(), Value::Null));
        StatusCode::INTERNAL_SERVER_ERROR
    }

    async fn list_posts() -> Json<Value> {
        Json(json!([{"id": 1, "title": "Numeric id", "views": "12"}]))
    }

    async fn db_json() -> Json<Value> {
        Json(json!({
            "products": [
                {"id": 1, "title": "Mug", "price": "4.5", "category": {"name": "Misc"},
                 "images": "[\"https://img.test/mug.png\"]"}
            ]
        }))
    }

    async fn serve(seen: Seen) -> String {
        let app = Router::new()
            .route("/posts", get(list_posts))
            .route(
                "/posts/:id",
                get(show_post)
                    .patch(patch_post)
                    .put(put_post)
                    .delete(delete_post),
            )
            .route("/db.json", get(db_json))
            .with_state(seen);
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }

    fn backend(base: &str, check_status: bool) -> HttpBackend {
        HttpBackend::new(
            base,
            HttpOptions {
                timeout: Some(std::time::Duration::from_secs(5)),
                check_status,
            },
        )
        .unwrap()
    }

    fn deleted_flag() -> Map<String, Value> {
        let mut fields = Map::new();
        fields.insert("isDeleted".to_string(), Value::Bool(true));
        fields
    }

    #[tokio::test]
    async fn patch_sends_only_changed_fields() {
        let seen = Seen::default();
        let base = serve(seen.clone()).await;
        let backend = backend(&base, true);

        client::update(&backend, Collection::Posts, "5", deleted_flag(), UpdateMode::Patch)
            .await
            .unwrap();

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].0, "PATCH");
        assert_eq!(seen[0].1, json!({"isDeleted": true}));
    }

    #[tokio::test]
    async fn replace_puts_the_full_record_with_unknown_fields() {
        let seen = Seen::default();
        let base = serve(seen.clone()).await;
        let backend = backend(&format!("{base}/"), true);

        client::update(&backend, Collection::Posts, "5", deleted_flag(), UpdateMode::Replace)
            .await
            .unwrap();

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].0, "PUT");
        assert_eq!(
            seen[0].1,
            json!({"id": "5", "title": "Stored", "views": 3, "isDeleted": true, "author": "ann"})
        );
    }

    #[tokio::test]
    async fn missing_record_is_not_found() {
        let base = serve(Seen::default()).await;
        let err = backend(&base, true)
            .get(Collection::Posts, "99")
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::NotFound { .. }));
    }

    #[tokio::test]
    async fn status_check_can_be_switched_off() {
        let base = serve(Seen::default()).await;

        let err = backend(&base, true)
            .remove(Collection::Posts, "5")
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Status { status: 500, .. }));

        backend(&base, false)
            .remove(Collection::Posts, "5")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn list_decodes_lenient_fields() {
        let base = serve(Seen::default()).await;
        let posts: Vec<crate::models::Post> = client::list(&backend(&base, true)).await.unwrap();
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].id, "1");
        assert_eq!(posts[0].views, 12);
        assert!(!posts[0].is_deleted);
    }

    #[tokio::test]
    async fn catalog_source_fetches_over_http_only() {
        let base = serve(Seen::default()).await;
        let source = CatalogSource::new(&format!("{base}/db.json"), None).unwrap();
        let products = source.fetch().await.unwrap();
        assert_eq!(products.len(), 1);
        assert_eq!(products[0].price, 4.5);
        assert_eq!(products[0].images, vec!["https://img.test/mug.png".to_string()]);

        let err = CatalogSource::new("file:///srv/db.json", None).unwrap_err();
        assert!(matches!(err, ClientError::NotHttp { .. }));
    }
}
