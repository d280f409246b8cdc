//! Budget routes: the public view and admin editing.
//!
//! Reads are open to everyone. Every write goes through the budget editor
//! with the request's [`Admin`] gate, so an unprivileged caller gets a 403
//! and the tree is left as it was. Edits live in memory until the year is
//! saved; a remote snapshot arriving before that replaces them.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{delete, get, post},
};
use desa_core::budget::{
    BudgetEditor, BudgetError, BudgetTree, EditOutcome, Field, FieldPath, YearFilter, YearKey,
    YearView, view,
};
use desa_shared::types::{SectorId, SubItemId};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use crate::AppState;
use crate::error::ApiResult;
use crate::middleware::Admin;

/// Creates the budget routes (admin middleware is applied by the caller).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/budgets", get(list_budgets))
        .route("/budgets/years", get(list_years))
        .route("/budgets/{year}", get(get_budget))
        .route("/budgets/{year}/open", post(open_year))
        .route("/budgets/{year}/fields", post(set_field))
        .route("/budgets/{year}/sectors", post(add_sector))
        .route("/budgets/{year}/sectors/{sector_id}", delete(remove_sector))
        .route("/budgets/{year}/sectors/{sector_id}/subs", post(add_sub))
        .route(
            "/budgets/{year}/sectors/{sector_id}/subs/{sub_id}",
            delete(remove_sub),
        )
        .route("/budgets/{year}/reset", post(reset_year))
        .route("/budgets/{year}/save", post(save_year))
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Query for the public listing.
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    /// A year key, or `all` (the default).
    pub year: Option<String>,
}

/// Public listing.
#[derive(Debug, Serialize)]
pub struct BudgetListResponse {
    /// Year cards, newest first.
    pub years: Vec<YearView>,
}

/// Year selector options.
#[derive(Debug, Serialize)]
pub struct YearOptionsResponse {
    /// Year keys, newest first.
    pub years: Vec<YearKey>,
}

/// Request body for writing one field.
#[derive(Debug, Deserialize)]
pub struct SetFieldRequest {
    /// Sector holding the field (or the sub-item).
    pub sector_id: Option<SectorId>,
    /// Sub-item holding the field.
    pub sub_id: Option<SubItemId>,
    /// Field to write.
    pub field: Field,
    /// Input value; strings are tolerant-parsed, numbers keep their value.
    #[serde(default)]
    pub value: Value,
}

impl SetFieldRequest {
    fn path(&self) -> FieldPath {
        FieldPath {
            sector: self.sector_id.clone(),
            sub: self.sub_id.clone(),
            field: self.field,
        }
    }
}

/// Response for a successful save.
#[derive(Debug, Serialize)]
pub struct SaveResponse {
    /// Saved year.
    pub year: YearKey,
    /// Always `true`.
    pub saved: bool,
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Runs one editor call against the shared tree.
async fn edit_year<F>(
    state: &AppState,
    raw_year: &str,
    action: &'static str,
    f: F,
) -> ApiResult<Json<EditOutcome>>
where
    F: FnOnce(&mut BudgetTree, &YearKey) -> Result<EditOutcome, BudgetError>,
{
    let key = YearKey::parse(raw_year)?;
    let outcome = state.store.lock().await.edit(|tree| f(tree, &key))?;
    info!(year = %key, action, changed = outcome.changed, "budget edited");
    Ok(Json(outcome))
}

// ============================================================================
// Route Handlers
// ============================================================================

/// GET `/budgets?year=` - Public view of every year or one year.
///
/// A year that no longer exists falls back to every year.
async fn list_budgets(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Json<BudgetListResponse> {
    let store = state.store.lock().await;
    let filter = YearFilter::parse(query.year.as_deref().unwrap_or_default()).resolve(store.tree());
    Json(BudgetListResponse {
        years: view::render_public(store.tree(), &filter),
    })
}

/// GET `/budgets/years` - Year selector options.
async fn list_years(State(state): State<AppState>) -> Json<YearOptionsResponse> {
    let store = state.store.lock().await;
    Json(YearOptionsResponse {
        years: view::year_options(store.tree()),
    })
}

/// GET `/budgets/{year}` - One year's view.
async fn get_budget(
    State(state): State<AppState>,
    Path(year): Path<String>,
) -> ApiResult<Json<YearView>> {
    let key = YearKey::parse(&year)?;
    let store = state.store.lock().await;
    let budget = store
        .tree()
        .get(&key)
        .ok_or_else(|| BudgetError::YearNotFound(key.to_string()))?;
    Ok(Json(view::render_year(budget)))
}

/// POST `/budgets/{year}/open` - Ensure the year exists (template on first open).
async fn open_year(
    State(state): State<AppState>,
    admin: Admin,
    Path(year): Path<String>,
) -> ApiResult<Json<EditOutcome>> {
    edit_year(&state, &year, "open", |tree, key| {
        BudgetEditor::new(admin.gate()).open_year(tree, key)
    })
    .await
}

/// POST `/budgets/{year}/fields` - Write a name, percentage, note or total.
async fn set_field(
    State(state): State<AppState>,
    admin: Admin,
    Path(year): Path<String>,
    Json(payload): Json<SetFieldRequest>,
) -> ApiResult<Json<EditOutcome>> {
    let path = payload.path();
    edit_year(&state, &year, "set_field", |tree, key| {
        BudgetEditor::new(admin.gate()).set_field_value(tree, key, &path, &payload.value)
    })
    .await
}

/// POST `/budgets/{year}/sectors` - Append a blank sector.
async fn add_sector(
    State(state): State<AppState>,
    admin: Admin,
    Path(year): Path<String>,
) -> ApiResult<Json<EditOutcome>> {
    edit_year(&state, &year, "add_sector", |tree, key| {
        BudgetEditor::new(admin.gate()).add_sector(tree, key)
    })
    .await
}

/// DELETE `/budgets/{year}/sectors/{sector_id}` - Remove a sector.
async fn remove_sector(
    State(state): State<AppState>,
    admin: Admin,
    Path((year, sector_id)): Path<(String, SectorId)>,
) -> ApiResult<Json<EditOutcome>> {
    edit_year(&state, &year, "remove_sector", |tree, key| {
        BudgetEditor::new(admin.gate()).remove_sector(tree, key, &sector_id)
    })
    .await
}

/// POST `/budgets/{year}/sectors/{sector_id}/subs` - Append a blank sub-item.
async fn add_sub(
    State(state): State<AppState>,
    admin: Admin,
    Path((year, sector_id)): Path<(String, SectorId)>,
) -> ApiResult<Json<EditOutcome>> {
    edit_year(&state, &year, "add_sub", |tree, key| {
        BudgetEditor::new(admin.gate()).add_sub(tree, key, &sector_id)
    })
    .await
}

/// DELETE `/budgets/{year}/sectors/{sector_id}/subs/{sub_id}` - Remove a sub-item.
async fn remove_sub(
    State(state): State<AppState>,
    admin: Admin,
    Path((year, sector_id, sub_id)): Path<(String, SectorId, SubItemId)>,
) -> ApiResult<Json<EditOutcome>> {
    edit_year(&state, &year, "remove_sub", |tree, key| {
        BudgetEditor::new(admin.gate()).remove_sub(tree, key, &sector_id, &sub_id)
    })
    .await
}

/// POST `/budgets/{year}/reset` - Reseed the year from the template.
async fn reset_year(
    State(state): State<AppState>,
    admin: Admin,
    Path(year): Path<String>,
) -> ApiResult<Json<EditOutcome>> {
    edit_year(&state, &year, "reset", |tree, key| {
        BudgetEditor::new(admin.gate()).reset_year(tree, key)
    })
    .await
}

/// POST `/budgets/{year}/save` - Persist the year to the document store.
async fn save_year(
    State(state): State<AppState>,
    admin: Admin,
    Path(year): Path<String>,
) -> ApiResult<Json<SaveResponse>> {
    let key = YearKey::parse(&year)?;
    // The lock is held for the whole round trip, so saves never interleave.
    state
        .store
        .lock()
        .await
        .save_year(&admin.gate(), &key)
        .await?;
    Ok(Json(SaveResponse {
        year: key,
        saved: true,
    }))
}

#[cfg(test)]
#[path = "budgets_tests.rs"]
mod tests;
