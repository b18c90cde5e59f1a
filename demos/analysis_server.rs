use argh::FromArgs;
use axum::{
    Json, Router,
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use serde_json::{Value, json};
use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
    time::Duration,
};

// defaults for the server
const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8000;
const DEFAULT_PROCESSING_MS: u64 = 3_000;

const LABELS: [&str; 5] = ["Acne", "Eczema", "Psoriasis", "Rosacea", "Melasma"];

#[derive(FromArgs)]
/// Stand-in analysis service for exercising the dermalens client locally.
struct ServerArgs {
    /// the host to run the server on
    #[argh(option, short = 'h', default = "DEFAULT_HOST.to_string()")]
    host: String,

    /// the port to run the server on
    #[argh(option, short = 'p', default = "DEFAULT_PORT")]
    port: u16,

    /// how long a fake analysis takes, in milliseconds
    #[argh(option, short = 't', default = "DEFAULT_PROCESSING_MS")]
    processing_ms: u64,
}

#[derive(Clone)]
struct AppState {
    tasks: Arc<Mutex<HashMap<String, Value>>>,
    processing_time: Duration,
}

fn bad_request(message: &str) -> (StatusCode, Json<Value>) {
    (StatusCode::BAD_REQUEST, Json(json!({ "error": message })))
}

async fn post_upload(State(state): State<AppState>, mut multipart: Multipart) -> impl IntoResponse {
    let mut upload = None;
    loop {
        match multipart.next_field().await {
            Ok(Some(field)) => {
                if field.name() != Some("image") {
                    continue;
                }
                let filename = field.file_name().unwrap_or_default().to_string();
                match field.bytes().await {
                    Ok(bytes) => upload = Some((filename, bytes)),
                    Err(e) => return bad_request(&e.to_string()),
                }
            }
            Ok(None) => break,
            Err(e) => return bad_request(&e.to_string()),
        }
    }

    let Some((filename, bytes)) = upload else {
        return bad_request("Missing \"image\" field");
    };
    if filename.is_empty() {
        return bad_request("No selected file");
    }

    let task_id = uuid::Uuid::new_v4().to_string();
    state
        .tasks
        .lock()
        .unwrap()
        .insert(task_id.clone(), json!({ "status": "processing" }));

    log::info!("Task {}: accepted {} ({} bytes)", task_id, filename, bytes.len());

    tokio::spawn(analyze_in_background(state.clone(), task_id.clone(), bytes.to_vec()));

    (
        StatusCode::ACCEPTED,
        Json(json!({
            "success": true,
            "message": "Image upload accepted, processing in background.",
            "task_id": task_id,
            "status_url": format!("/result/{task_id}"),
        })),
    )
}

async fn analyze_in_background(state: AppState, task_id: String, image: Vec<u8>) {
    tokio::time::sleep(state.processing_time).await;

    let outcome = match classify(&image) {
        Some((label, confidence)) => {
            log::info!("Task {}: prediction {} ({:.2})", task_id, label, confidence);
            json!({
                "status": "completed",
                "prediction": label,
                "confidence": confidence,
                "full_output": { "predicted_class": label, "confidence": confidence },
            })
        }
        None => {
            log::warn!("Task {}: prediction failed", task_id);
            json!({ "status": "failed", "error": "Image could not be analysed" })
        }
    };

    state.tasks.lock().unwrap().insert(task_id, outcome);
}

// deterministic stand-in for a real classifier
fn classify(image: &[u8]) -> Option<(&'static str, f64)> {
    if image.is_empty() {
        return None;
    }
    let checksum = image.iter().fold(0usize, |acc, b| acc.wrapping_mul(31).wrapping_add(*b as usize));
    let label = LABELS[checksum % LABELS.len()];
    let confidence = 0.5 + (checksum % 50) as f64 / 100.0;
    Some((label, confidence))
}

async fn get_result(
    State(state): State<AppState>,
    Path(task_id): Path<String>,
) -> impl IntoResponse {
    let result = state
        .tasks
        .lock()
        .unwrap()
        .get(&task_id)
        .cloned()
        .unwrap_or_else(|| json!({ "status": "not_found" }));
    Json(result)
}

async fn post_recommend(Json(payload): Json<Value>) -> impl IntoResponse {
    let Some(skin_disease) = payload.get("skin_disease").and_then(Value::as_str) else {
        return bad_request("Please provide skin_disease and allergies in request body");
    };
    if skin_disease.trim().is_empty() {
        return bad_request("skin_disease cannot be empty");
    }

    let allergies: Vec<String> = match payload.get("allergies") {
        Some(Value::String(s)) => dermalens::AllergyList::parse(s).into_vec(),
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect(),
        Some(_) => return bad_request("allergies must be a string or list"),
        None => return bad_request("Please provide skin_disease and allergies in request body"),
    };

    log::info!("Getting recommendations for: {}", skin_disease);

    let triggers = |name: &str| {
        let name = name.to_lowercase();
        allergies
            .iter()
            .any(|allergy| name.contains(&allergy.to_lowercase()))
    };

    let healthy_foods: Vec<Value> = [
        ("Salmon", "Omega-3 fatty acids", "Reduces skin inflammation"),
        ("Spinach", "Vitamin A, Vitamin C", "Supports skin repair"),
        ("Walnuts", "Omega-3, Zinc", "Strengthens the skin barrier"),
        ("Greek yogurt", "Probiotics", "Balances the gut-skin axis"),
        ("Sweet potato", "Beta-carotene", "Protects against UV damage"),
    ]
    .into_iter()
    .filter(|(name, _, _)| !triggers(*name))
    .map(|(name, nutrients, benefit)| json!({ "name": name, "nutrients": nutrients, "benefit": benefit }))
    .collect();

    let supplements: Vec<Value> = [
        ("Vitamin D", "1000 IU", "Regulates skin cell growth"),
        ("Zinc", "30 mg", "Supports wound healing"),
        ("Fish oil", "1 g", "Reduces inflammation"),
    ]
    .into_iter()
    .filter(|(name, _, _)| !triggers(*name))
    .map(|(name, dosage, benefit)| json!({ "name": name, "dosage": dosage, "benefit": benefit }))
    .collect();

    let mut foods_to_avoid = vec!["Refined sugar".to_string(), "Fried foods".to_string()];
    foods_to_avoid.extend(allergies.iter().cloned());

    (
        StatusCode::OK,
        Json(json!({
            "condition": skin_disease,
            "healthy_foods": healthy_foods,
            "foods_to_avoid": foods_to_avoid,
            "supplements": supplements,
        })),
    )
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args: ServerArgs = argh::from_env();

    // format the host and port
    let addr = format!("{}:{}", args.host, args.port);

    let state = AppState {
        tasks: Arc::new(Mutex::new(HashMap::new())),
        processing_time: Duration::from_millis(args.processing_ms),
    };

    let app = Router::new()
        .route(
            "/",
            get(|| async {
                Json(json!({
                    "message": "Skin Disease Recommendation API",
                    "usage": "POST to /recommend with {\"skin_disease\": \"condition_name\"}",
                }))
            }),
        )
        .route("/health", get(|| async { Json(json!({ "status": "API is running" })) }))
        .route("/upload", post(post_upload))
        .route("/result/{task_id}", get(get_result))
        .route("/recommend", post(post_recommend))
        .with_state(state);

    log::info!("Starting the analysis server");
    log::info!("Listening on: {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
