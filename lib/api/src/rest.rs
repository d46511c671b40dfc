use actix_cors::Cors;
use actix_web::{web, App, HttpResponse, HttpServer, Result as ActixResult};
use furnrec_core::{Error, Field, Listing, RecordFilter};
use furnrec_similarity::{Recommendation, DEFAULT_TOP_N};
use furnrec_storage::ModelBundle;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{info, warn};

// Filter fields are listed out: query-string decoding cannot parse
// numbers or booleans through a flattened struct
#[derive(Deserialize)]
struct RecommendParams {
    apartment_type: Option<String>,
    location: Option<String>,
    budget_range: Option<String>,
    preferred_style: Option<String>,
    search: Option<String>,
    top_n: Option<usize>,
    #[serde(default)]
    dedupe: bool,
}

impl RecommendParams {
    fn filter(&self) -> RecordFilter {
        RecordFilter {
            apartment_type: self.apartment_type.clone(),
            location: self.location.clone(),
            budget_range: self.budget_range.clone(),
            preferred_style: self.preferred_style.clone(),
            search: self.search.clone(),
        }
        .normalized()
    }
}

#[derive(Deserialize)]
struct AnchorParams {
    top_n: Option<usize>,
    #[serde(default)]
    dedupe: bool,
}

#[derive(Deserialize)]
struct QueryRequest {
    text: String,
    top_n: Option<usize>,
    #[serde(default)]
    dedupe: bool,
}

#[derive(Serialize)]
struct ModelInfo {
    schema_version: u32,
    created_at: String,
    records: usize,
    vocabulary: usize,
    fingerprint: String,
}

#[derive(Serialize)]
struct RecommendationsResponse {
    result: Vec<Recommendation>,
}

#[derive(Serialize)]
struct SurpriseResponse {
    result: Option<Listing>,
}

fn dedupe_field(dedupe: bool) -> Option<Field> {
    dedupe.then_some(Field::RecommendedFurniture)
}

pub struct RestApi;

impl RestApi {
    pub async fn start(bundle: Arc<ModelBundle>, port: u16) -> std::io::Result<()> {
        info!("Serving {} records on port {}", bundle.records().len(), port);
        HttpServer::new(move || {
            let cors = Cors::default()
                .allow_any_origin()
                .allow_any_method()
                .allow_any_header()
                .max_age(3600);

            App::new()
                .wrap(cors)
                .configure(Self::routes(bundle.clone()))
        })
        .bind(("0.0.0.0", port))?
        .run()
        .await
    }

    /// Route table, shared by the server and tests
    pub fn routes(bundle: Arc<ModelBundle>) -> impl FnOnce(&mut web::ServiceConfig) {
        move |cfg| {
            cfg.app_data(web::Data::new(bundle))
                .route("/", web::get().to(model_info))
                .route("/options", web::get().to(filter_options))
                .route("/recommendations", web::get().to(recommend_filtered))
                .route("/recommendations/{name}", web::get().to(recommend_for))
                .route("/query", web::post().to(text_query))
                .route("/surprise", web::get().to(surprise));
        }
    }
}

async fn model_info(bundle: web::Data<Arc<ModelBundle>>) -> ActixResult<HttpResponse> {
    Ok(HttpResponse::Ok().json(ModelInfo {
        schema_version: bundle.schema_version,
        created_at: bundle.created_at.to_rfc3339(),
        records: bundle.records().len(),
        vocabulary: bundle.vectorizer().vocabulary_size(),
        fingerprint: bundle.fingerprint().to_string(),
    }))
}

async fn filter_options(bundle: web::Data<Arc<ModelBundle>>) -> ActixResult<HttpResponse> {
    let options: BTreeMap<&str, Vec<&str>> = Field::FILTERABLE
        .iter()
        .map(|&field| (field.name(), bundle.records().distinct(field)))
        .collect();
    Ok(HttpResponse::Ok().json(options))
}

fn internal_error(e: Error) -> HttpResponse {
    warn!("Query failed: {}", e);
    HttpResponse::InternalServerError().json(serde_json::json!({
        "error": e.to_string()
    }))
}

async fn recommend_filtered(
    bundle: web::Data<Arc<ModelBundle>>,
    params: web::Query<RecommendParams>,
) -> ActixResult<HttpResponse> {
    let filter = params.filter();

    let recommender = match bundle.recommender() {
        Ok(r) => r,
        Err(e) => return Ok(internal_error(e)),
    };
    let result = recommender.recommend_filtered(
        &filter,
        params.top_n.unwrap_or(DEFAULT_TOP_N),
        dedupe_field(params.dedupe),
    );
    Ok(HttpResponse::Ok().json(result))
}

async fn recommend_for(
    bundle: web::Data<Arc<ModelBundle>>,
    path: web::Path<String>,
    params: web::Query<AnchorParams>,
) -> ActixResult<HttpResponse> {
    let name = path.into_inner();
    let recommender = match bundle.recommender() {
        Ok(r) => r,
        Err(e) => return Ok(internal_error(e)),
    };

    match recommender.recommend_for(
        Field::RecommendedFurniture,
        &name,
        params.top_n.unwrap_or(DEFAULT_TOP_N),
        dedupe_field(params.dedupe),
    ) {
        Ok(result) => Ok(HttpResponse::Ok().json(RecommendationsResponse { result })),
        Err(e @ Error::AnchorNotFound { .. }) => {
            Ok(HttpResponse::NotFound().json(serde_json::json!({
                "error": e.to_string()
            })))
        }
        Err(e) => Ok(internal_error(e)),
    }
}

async fn text_query(
    bundle: web::Data<Arc<ModelBundle>>,
    req: web::Json<QueryRequest>,
) -> ActixResult<HttpResponse> {
    let result = bundle.recommender().and_then(|r| {
        r.query(&req.text, req.top_n.unwrap_or(DEFAULT_TOP_N), dedupe_field(req.dedupe))
    });
    match result {
        Ok(result) => Ok(HttpResponse::Ok().json(RecommendationsResponse { result })),
        Err(e) => Ok(internal_error(e)),
    }
}

async fn surprise(
    bundle: web::Data<Arc<ModelBundle>>,
    filter: web::Query<RecordFilter>,
) -> ActixResult<HttpResponse> {
    let filter = filter.into_inner().normalized();
    let result = bundle
        .records()
        .sample(&filter, &mut rand::rng())
        .map(|r| r.listing());
    Ok(HttpResponse::Ok().json(SurpriseResponse { result }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{test, App};
    use furnrec_core::{Record, RecordTable};
    use furnrec_similarity::EncoderConfig;

    fn bundle() -> Arc<ModelBundle> {
        let row = |id: &str, apt: &str, furniture: &str| Record {
            rental_id: id.to_string(),
            apartment_type: apt.to_string(),
            location: "Downtown".to_string(),
            renter_type: "Student".to_string(),
            budget_range: "Low".to_string(),
            preferred_style: "Minimalist".to_string(),
            recommended_furniture: furniture.to_string(),
        };
        let records = RecordTable::new(vec![
            row("R1", "Studio", "Sofa bed"),
            row("R2", "Loft", "Desk lamp"),
            row("R3", "Studio", "Sofa"),
        ]);
        Arc::new(ModelBundle::train(records, &EncoderConfig::default()).unwrap())
    }

    #[actix_web::test]
    async fn test_recommend_by_name() {
        let app = test::init_service(App::new().configure(RestApi::routes(bundle()))).await;
        let req = test::TestRequest::get().uri("/recommendations/Sofa%20bed?top_n=1").to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["result"][0]["recommended_furniture"], "Sofa");
        assert_eq!(body["result"].as_array().unwrap().len(), 1);
    }

    #[actix_web::test]
    async fn test_unknown_name_is_not_found() {
        let app = test::init_service(App::new().configure(RestApi::routes(bundle()))).await;
        let req = test::TestRequest::get().uri("/recommendations/Hammock").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), actix_web::http::StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn test_filter_with_no_match_is_empty() {
        let app = test::init_service(App::new().configure(RestApi::routes(bundle()))).await;
        let req = test::TestRequest::get()
            .uri("/recommendations?apartment_type=Castle&location=Any")
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert!(body["top_pick"].is_null());
        assert_eq!(body["recommendations"].as_array().unwrap().len(), 0);
    }

    #[actix_web::test]
    async fn test_filter_picks_first_match() {
        let app = test::init_service(App::new().configure(RestApi::routes(bundle()))).await;
        let req = test::TestRequest::get()
            .uri("/recommendations?apartment_type=Any&search=lamp")
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["top_pick"]["recommended_furniture"], "Desk lamp");
        assert_eq!(body["recommendations"].as_array().unwrap().len(), 2);
    }

    #[actix_web::test]
    async fn test_options_sorted() {
        let app = test::init_service(App::new().configure(RestApi::routes(bundle()))).await;
        let req = test::TestRequest::get().uri("/options").to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["apartment_type"], serde_json::json!(["Loft", "Studio"]));
    }

    #[actix_web::test]
    async fn test_text_query() {
        let app = test::init_service(App::new().configure(RestApi::routes(bundle()))).await;
        let req = test::TestRequest::post()
            .uri("/query")
            .set_json(serde_json::json!({ "text": "desk lamp", "top_n": 1 }))
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["result"][0]["recommended_furniture"], "Desk lamp");
    }

    #[actix_web::test]
    async fn test_surprise_respects_filter() {
        let app = test::init_service(App::new().configure(RestApi::routes(bundle()))).await;
        let req = test::TestRequest::get().uri("/surprise?apartment_type=Loft").to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["result"]["recommended_furniture"], "Desk lamp");
    }
}
