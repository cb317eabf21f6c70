use crate::config::AppConfig;
use crate::data::MapData;
use crate::error::ChoroplethError;
use crate::render;
use crate::tooltip::{Pointer, Tooltip};
use crate::types::{EducationRecord, TopologyFeature};
use anyhow::Result;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{Html, Json},
    routing::get,
    Router,
};
use geo::{BoundingRect, Contains, Point};
use rstar::{RTree, RTreeObject, AABB};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tracing::info;

// Wrapper for RTree indexing
pub struct CountyIndex {
    index: usize,
    aabb: AABB<[f64; 2]>,
}

impl RTreeObject for CountyIndex {
    type Envelope = AABB<[f64; 2]>;
    fn envelope(&self) -> Self::Envelope {
        self.aabb
    }
}

pub struct AppState {
    pub data: MapData,
    pub page: String,
    pub tree: RTree<CountyIndex>,
    pub padding_top: f64,
}

#[derive(Deserialize)]
pub struct CountyParams {
    fips: u32,
}

#[derive(Deserialize)]
pub struct TooltipParams {
    fips: u32,
    x: f64,
    y: f64,
}

#[derive(Deserialize)]
pub struct QueryParams {
    x: f64,
    y: f64,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct CountyResponse {
    #[serde(flatten)]
    record: EducationRecord,
    fill: &'static str,
}

impl AppState {
    pub fn new(config: &AppConfig, data: MapData) -> Result<Self> {
        let page = render::render_page(&data, &config.layout)?;

        info!("Building spatial index for {} counties...", data.features.len());
        let tree_items: Vec<CountyIndex> = data
            .features
            .iter()
            .enumerate()
            .filter_map(|(i, feature)| {
                let rect = feature.geometry.bounding_rect()?;
                Some(CountyIndex {
                    index: i,
                    aabb: AABB::from_corners([rect.min().x, rect.min().y], [rect.max().x, rect.max().y]),
                })
            })
            .collect();
        let tree = RTree::bulk_load(tree_items);

        Ok(Self {
            data,
            page,
            tree,
            padding_top: config.layout.padding_top,
        })
    }

    fn county(&self, record: &EducationRecord) -> CountyResponse {
        CountyResponse {
            record: record.clone(),
            fill: self.data.scale.color(record.bachelors_or_higher),
        }
    }

    /// County under a point given in drawing-surface coordinates.
    pub fn locate(&self, x: f64, y: f64) -> Option<&TopologyFeature> {
        // Counties are drawn shifted down by the title block
        let (mx, my) = (x, y - self.padding_top);
        let point = Point::new(mx, my);
        let envelope = AABB::from_point([mx, my]);

        self.tree
            .locate_in_envelope_intersecting(&envelope)
            .filter_map(|candidate| self.data.features.get(candidate.index))
            .find(|feature| feature.geometry.contains(&point))
    }

    /// Tooltip as it would look after hovering `fips` at the given pointer.
    pub fn hover(&self, fips: u32, pointer: Pointer) -> Result<Tooltip, ChoroplethError> {
        let mut tooltip = Tooltip::default();
        tooltip.enter(Some(fips), self.data.index.get(fips), pointer)?;
        Ok(tooltip)
    }
}

pub fn router(state: Arc<AppState>, files: &Path) -> Router {
    Router::new()
        .route("/", get(page_handler))
        .route("/api/county", get(county_handler))
        .route("/api/tooltip", get(tooltip_handler))
        .route("/api/query", get(query_handler))
        .nest_service("/files", ServeDir::new(files))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub async fn start_server(config: AppConfig, data: MapData) -> Result<()> {
    let state = Arc::new(AppState::new(&config, data)?);

    let port = config.server.port;
    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    info!("Starting server on http://{}", addr);

    let files = config
        .output
        .html
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    let app = router(state, files);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

async fn page_handler(State(state): State<Arc<AppState>>) -> Html<String> {
    Html(state.page.clone())
}

async fn county_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<CountyParams>,
) -> Json<Option<CountyResponse>> {
    Json(state.data.index.get(params.fips).map(|r| state.county(r)))
}

async fn tooltip_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<TooltipParams>,
) -> Result<Json<Tooltip>, StatusCode> {
    let pointer = Pointer {
        page_x: params.x,
        page_y: params.y,
    };
    state
        .hover(params.fips, pointer)
        .map(Json)
        .map_err(|_| StatusCode::NOT_FOUND)
}

async fn query_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<QueryParams>,
) -> Json<Option<CountyResponse>> {
    let county = state
        .locate(params.x, params.y)
        .and_then(|feature| state.data.record_for(feature))
        .map(|record| state.county(record));
    Json(county)
}
