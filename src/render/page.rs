use crate::view::{CountLabel, MemoryView, Region};

use super::escape_html;

/// Which sections a snapshot carries.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PageKind {
    Admin,
    Catalog,
}

fn region_or_empty(view: &MemoryView, region: Region) -> &str {
    view.region(region).unwrap_or("")
}

fn count_or_dash(view: &MemoryView, label: CountLabel) -> String {
    view.count(label)
        .map(|n| n.to_string())
        .unwrap_or_else(|| "-".to_string())
}

fn admin_sections(view: &MemoryView) -> String {
    format!(
        r####"      <section class="mb-5">
        <div class="d-flex align-items-center justify-content-between mb-3">
          <h2 class="h4 mb-0">Posts <span id="{post_count_id}" class="badge bg-primary">{post_count}</span></h2>
        </div>
        <div class="table-responsive">
          <table class="table table-hover align-middle">
            <thead class="table-light">
              <tr><th>ID</th><th>Title</th><th>Views</th><th>Status</th><th>Actions</th></tr>
            </thead>
            <tbody id="{posts_id}">
{posts}
            </tbody>
          </table>
        </div>
      </section>

      <section class="mb-5">
        <div class="d-flex align-items-center justify-content-between mb-3">
          <h2 class="h4 mb-0">Comments <span id="{comment_count_id}" class="badge bg-primary">{comment_count}</span></h2>
        </div>
        <div class="mb-3">
          <label class="form-label" for="{options_id}">Post</label>
          <select id="{options_id}" class="form-select">{options}</select>
        </div>
        <div class="table-responsive">
          <table class="table table-hover align-middle">
            <thead class="table-light">
              <tr><th>ID</th><th>Text</th><th>Post</th><th>Actions</th></tr>
            </thead>
            <tbody id="{comments_id}">
{comments}
            </tbody>
          </table>
        </div>
      </section>
"####,
        post_count_id = CountLabel::Posts.element_id(),
        post_count = count_or_dash(view, CountLabel::Posts),
        posts_id = Region::PostsTable.element_id(),
        posts = region_or_empty(view, Region::PostsTable),
        comment_count_id = CountLabel::Comments.element_id(),
        comment_count = count_or_dash(view, CountLabel::Comments),
        options_id = Region::PostOptions.element_id(),
        options = region_or_empty(view, Region::PostOptions),
        comments_id = Region::CommentsTable.element_id(),
        comments = region_or_empty(view, Region::CommentsTable),
    )
}

fn catalog_sections(view: &MemoryView) -> String {
    format!(
        r####"      <section class="mb-5">
        <h2 class="h4 mb-3">Products <span id="{count_id}" class="badge bg-primary">{count}</span></h2>
        <div id="{grid_id}" class="row row-cols-1 row-cols-md-3 g-4">
{grid}
        </div>
        <nav id="{pagination_id}" class="mt-4">{pagination}</nav>
      </section>
"####,
        count_id = CountLabel::Products.element_id(),
        count = count_or_dash(view, CountLabel::Products),
        grid_id = Region::ProductGrid.element_id(),
        grid = region_or_empty(view, Region::ProductGrid),
        pagination_id = Region::Pagination.element_id(),
        pagination = region_or_empty(view, Region::Pagination),
    )
}

/// Full HTML document around the regions a view has collected. Row
/// controls are wired through one delegated listener that re-emits them as
/// `mirrordesk:action` events carrying `{ action, id }`.
pub fn render_document(view: &MemoryView, kind: PageKind, title: &str) -> String {
    let body = match kind {
        PageKind::Admin => admin_sections(view),
        PageKind::Catalog => catalog_sections(view),
    };
    let alerts: String = view
        .alerts()
        .iter()
        .map(|a| {
            format!(
                r#"      <div class="alert alert-warning" role="alert">{}</div>
"#,
                escape_html(a)
            )
        })
        .collect();

    format!(
        r####"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8"/>
  <meta content="width=device-width, initial-scale=1.0" name="viewport"/>
  <title>{title}</title>
  <link href="https://cdn.jsdelivr.net/npm/bootstrap@5.3.3/dist/css/bootstrap.min.css" rel="stylesheet"/>
  <style>
    tr.deleted td {{ opacity: 0.6; }}
    .product-card img {{ object-fit: cover; height: 200px; }}
  </style>
</head>
<body class="bg-light">
  <header class="navbar bg-dark navbar-dark px-4 mb-4">
    <span class="navbar-brand">{title}</span>
  </header>
  <main class="container">
{alerts}{body}  </main>
  <script>
    document.addEventListener("click", function (ev) {{
      var el = ev.target.closest("[data-action]");
      if (!el) return;
      document.dispatchEvent(new CustomEvent("mirrordesk:action", {{
        detail: {{ action: el.dataset.action, id: el.dataset.id }}
      }}));
    }});
  </script>
</body>
</html>
"####,
        title = escape_html(title),
    )
}
