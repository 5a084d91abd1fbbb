use std::env;
use std::io;
use std::sync::Mutex;

use actix_cors::Cors;
use actix_web::{get, put, web, App, HttpResponse, HttpServer, Responder};

use log::info;
use serde::Deserialize;
use vomm_core::{GenerateInput, VariableOrderMarkov};

/// Tokens exchanged over HTTP are plain strings.
type Model = VariableOrderMarkov<String>;

/// Struct representing query parameters for the `/v1/generate` endpoint
#[derive(Deserialize)]
struct GenerateParams {
	length: Option<usize>,
	order: Option<usize>,
	primer: Option<String>, // comma separated tokens, random vocabulary token if absent
	seed: Option<u64>,
}

#[derive(Deserialize)]
struct ResetQuery {
	max_order: Option<usize>,
}

struct SharedData {
	model: Model,
}

impl GenerateParams {
	/// Builds the model input; validation is left to the model.
	fn generate_input(&self) -> GenerateInput<String> {
		let mut input = GenerateInput::new(self.length.unwrap_or(30));
		if let Some(primer) = &self.primer {
			input = input.with_primer(
				primer
					.split(',')
					.map(str::trim)
					.filter(|s| !s.is_empty())
					.map(str::to_owned)
					.collect(),
			);
		}
		if let Some(order) = self.order {
			input = input.with_order(order);
		}
		input
	}
}

/// One sequence per non-empty line, tokens separated by whitespace.
fn parse_sequences(body: &str) -> Vec<Vec<String>> {
	body.lines()
		.map(|line| line.split_whitespace().map(str::to_owned).collect::<Vec<_>>())
		.filter(|sequence| !sequence.is_empty())
		.collect()
}

/// `/v1/generate` endpoint handler.
///
/// Generates a continuation using the shared model based on query parameters.
/// Returns the `Generation` as JSON; an early halt is reported in its `halt` field.
#[get("/v1/generate")]
async fn get_generated(data: web::Data<Mutex<SharedData>>, query: web::Query<GenerateParams>) -> impl Responder {
	let input = query.generate_input();

	let mut shared_data = match data.lock() {
		Ok(m) => m,
		Err(_) => return HttpResponse::InternalServerError().body("Model lock failed"),
	};

	let result = match query.seed {
		Some(seed) => shared_data.model.generate_seeded(&input, seed),
		None => shared_data.model.generate(&input, &mut rand::rng()),
	};

	match result {
		Ok(generation) => HttpResponse::Ok().json(generation),
		Err(e) => HttpResponse::BadRequest().body(e.to_string()),
	}
}

#[put("/v1/train")]
async fn put_train(data: web::Data<Mutex<SharedData>>, body: String) -> impl Responder {
	let sequences = parse_sequences(&body);

	let mut shared_data = match data.lock() {
		Ok(m) => m,
		Err(_) => return HttpResponse::InternalServerError().body("Model lock failed"),
	};
	shared_data.model.train_corpus(&sequences);

	HttpResponse::Ok().body(format!("Trained {} sequences", sequences.len()))
}

#[get("/v1/vocabulary")]
async fn get_vocabulary(data: web::Data<Mutex<SharedData>>) -> impl Responder {
	let shared_data = match data.lock() {
		Ok(m) => m,
		Err(_) => return HttpResponse::InternalServerError().body("Model lock failed"),
	};
	let tokens: Vec<&str> = shared_data.model.vocabulary().iter().map(String::as_str).collect();
	HttpResponse::Ok().body(tokens.join("\n"))
}

#[put("/v1/reset")]
async fn put_reset(data: web::Data<Mutex<SharedData>>, query: web::Query<ResetQuery>) -> impl Responder {
	let mut shared_data = match data.lock() {
		Ok(m) => m,
		Err(_) => return HttpResponse::InternalServerError().body("Model lock failed"),
	};

	let max_order = query.max_order.unwrap_or(shared_data.model.max_order());
	match Model::new(max_order) {
		Ok(model) => {
			shared_data.model = model;
			HttpResponse::Ok().body(format!("Model reset with max_order {max_order}"))
		}
		Err(e) => HttpResponse::BadRequest().body(e.to_string()),
	}
}

/// Main entry point for the server.
///
/// Creates an empty model, wraps it in a `Mutex` so training and generation
/// never overlap, and starts an Actix-web HTTP server.
///
/// # Configuration
/// - `VOMM_BIND`: listen address, `127.0.0.1:5000` by default.
/// - `VOMM_MAX_ORDER`: initial maximum order, 3 by default.
/// - `RUST_LOG`: log filter for `env_logger`.
#[actix_web::main]
async fn main() -> io::Result<()> {
	env_logger::init();

	let bind = env::var("VOMM_BIND").unwrap_or_else(|_| "127.0.0.1:5000".to_owned());
	let max_order = match env::var("VOMM_MAX_ORDER") {
		Ok(value) => value
			.parse::<usize>()
			.map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, format!("VOMM_MAX_ORDER: {e}")))?,
		Err(_) => 3,
	};

	let model = Model::new(max_order).map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
	let shared_model = web::Data::new(Mutex::new(SharedData { model }));

	info!("listening on {bind} with max_order {max_order}");
	HttpServer::new(move || {
		App::new()
			.wrap(Cors::permissive())
			.app_data(shared_model.clone())
			.service(get_generated)
			.service(put_train)
			.service(get_vocabulary)
			.service(put_reset)
	})
		.bind(bind)?
		.run()
		.await
}
