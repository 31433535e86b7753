use actix_web::http::StatusCode;
use actix_web::{post, web, App, HttpResponse, HttpResponseBuilder, HttpServer, Responder};
use actix_web_helmet::Helmet;
use churnpred::features::values_from_named;
use churnpred::{predict_values, ChurnStatus, Config, Label, ModelArtifact};
use clap::Parser;
use log::{info, warn};
use serde_derive::Serialize;
use serde_json::{Map, Value};
use std::path::PathBuf;

#[derive(Parser)]
struct Cli {
    #[arg(long)]
    host: Option<String>,
    #[arg(short, long)]
    port: Option<u16>,
    #[arg(short, long, value_name = "PATH")]
    model: Option<PathBuf>,
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,
}

struct AppState {
    model: ModelArtifact,
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Cli::parse();

    let config = Config::load(args.config.as_deref()).map_err(std::io::Error::other)?;
    let model_path = config.model_path(args.model.as_deref());
    let model = ModelArtifact::load(&model_path).map_err(std::io::Error::other)?;
    info!("serving {} model from {}", model.estimator.kind(), model_path.display());

    let state = web::Data::new(AppState { model });
    let host = args.host.unwrap_or(config.host);
    let port = args.port.unwrap_or(config.port);
    info!("listening on http://{}:{}", host, port);

    HttpServer::new(move || {
        App::new()
            .wrap(Helmet::default())
            .app_data(state.clone())
            .service(predict)
    })
    .bind((host, port))?
    .run()
    .await
}

#[derive(Serialize)]
struct PredictResponse {
    prediction: Label,
    status: ChurnStatus,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

#[post("/api/predict")]
async fn predict(state: web::Data<AppState>, body: web::Json<Map<String, Value>>) -> impl Responder {
    let result = values_from_named(&body).and_then(|values| predict_values(&state.model, &values));
    match result {
        Ok(label) => HttpResponse::Ok().json(PredictResponse {
            status: ChurnStatus::from_label(&label),
            prediction: label,
        }),
        Err(e) => {
            warn!("prediction failed: {}", e);
            let code = if e.is_input_error() {
                StatusCode::BAD_REQUEST
            } else {
                StatusCode::INTERNAL_SERVER_ERROR
            };
            HttpResponseBuilder::new(code).json(ErrorResponse {
                error: e.to_string(),
            })
        }
    }
}
