//! Design API Server - HTTP routes for suggestions and image generation

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{anyhow, Result};
use http_body_util::{BodyExt, Full, Limited};
use hyper::body::{Bytes, Incoming};
use hyper::header::{HeaderValue, CONTENT_TYPE};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::json;
use tokio::net::TcpListener;
use tokio::sync::RwLock;
use tracing::{error, info, warn};
use uuid::Uuid;

use super::types::{GenerateFromImageRequest, GenerateRequest, GenerateResponse};
use crate::config::Config;
use crate::enhancer::KnowledgeTables;
use crate::error::ApiError;
use crate::generation::{GenerationOutcome, GenerationPipeline};
use crate::utils::image_codec::{decode_seed_image, encode_for_transport};

/// Ports tried after the configured one when it is in use
const MAX_PORT_ATTEMPTS: u16 = 100;

/// Shared state handed to every request
pub struct AppState {
    pub config: Arc<Config>,
    pub pipeline: Arc<GenerationPipeline>,
    pub tables: Arc<KnowledgeTables>,
}

/// Design API HTTP Server
pub struct DesignServer {
    state: Arc<AppState>,
    port: Arc<RwLock<u16>>,
    running: Arc<RwLock<bool>>,
}

impl DesignServer {
    pub fn new(config: Arc<Config>, pipeline: Arc<GenerationPipeline>) -> Self {
        let tables = pipeline.enhancer().tables().clone();
        let port = config.port;
        Self {
            state: Arc::new(AppState {
                config,
                pipeline,
                tables,
            }),
            port: Arc::new(RwLock::new(port)),
            running: Arc::new(RwLock::new(false)),
        }
    }

    /// Bind and spawn the accept loop, returning the bound address
    pub async fn start(&self) -> Result<SocketAddr> {
        {
            let mut running = self.running.write().await;
            if *running {
                let port = *self.port.read().await;
                return Ok(SocketAddr::new(self.state.config.bind_addr()?.ip(), port));
            }
            *running = true;
        }

        let listener = match self.bind().await {
            Ok(l) => l,
            Err(e) => {
                let mut running = self.running.write().await;
                *running = false;
                return Err(e);
            }
        };

        let local_addr = listener.local_addr()?;
        {
            let mut port_lock = self.port.write().await;
            *port_lock = local_addr.port();
        }

        info!("Design API server started: http://{}", local_addr);

        let state = self.state.clone();

        tokio::spawn(async move {
            loop {
                let (stream, _) = match listener.accept().await {
                    Ok(conn) => conn,
                    Err(e) => {
                        error!("Failed to accept connection: {}", e);
                        continue;
                    }
                };

                let io = TokioIo::new(stream);
                let state = state.clone();

                tokio::spawn(async move {
                    let service = service_fn(|req| {
                        let state = state.clone();
                        async move { handle_request(req, state).await }
                    });

                    if let Err(e) = http1::Builder::new().serve_connection(io, service).await {
                        if !e.to_string().contains("connection closed") {
                            error!("Error serving connection: {}", e);
                        }
                    }
                });
            }
        });

        Ok(local_addr)
    }

    /// Try the configured port, then the following ones while they are in use
    async fn bind(&self) -> Result<TcpListener> {
        let base = self.state.config.bind_addr()?;
        let mut port = base.port();

        for _ in 0..MAX_PORT_ATTEMPTS {
            match TcpListener::bind(SocketAddr::new(base.ip(), port)).await {
                Ok(l) => return Ok(l),
                Err(e) if e.kind() == std::io::ErrorKind::AddrInUse && port != 0 => {
                    let next = port
                        .checked_add(1)
                        .ok_or_else(|| anyhow!("Could not find available port"))?;
                    warn!("Port {} is in use, trying {}", port, next);
                    port = next;
                }
                Err(e) => return Err(anyhow!("Failed to bind to port {}: {}", port, e)),
            }
        }

        Err(anyhow!("Could not find available port"))
    }

    /// Start and serve until Ctrl-C
    pub async fn run(&self) -> Result<()> {
        self.start().await?;
        tokio::signal::ctrl_c().await?;
        info!("Shutting down design API server");
        Ok(())
    }

    /// Get server port
    pub async fn get_port(&self) -> u16 {
        *self.port.read().await
    }
}

/// Handle HTTP request
async fn handle_request(
    req: Request<Incoming>,
    state: Arc<AppState>,
) -> Result<Response<Full<Bytes>>, hyper::Error> {
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    // Handle CORS preflight
    if method == Method::OPTIONS {
        return Ok(cors_response(empty_response(StatusCode::OK)));
    }

    let request_id = Uuid::new_v4();
    info!("[{}] {} {}", request_id, method, path);

    let result = match (method, path.as_str()) {
        (Method::GET, "/api/design-suggestions") => Ok(serve_suggestions(&state.tables)),
        (Method::POST, "/api/generate") => handle_generate(req, &state, request_id).await,
        (Method::POST, "/api/generate_from_image") => {
            handle_generate_from_image(req, &state, request_id).await
        }
        _ => Err(ApiError::NotFound),
    };

    let response = result.unwrap_or_else(|e| {
        warn!("[{}] {}", request_id, e);
        json_error_response(&e)
    });

    Ok(cors_response(response))
}

/// Return the knowledge tables verbatim
pub fn serve_suggestions(tables: &KnowledgeTables) -> Response<Full<Bytes>> {
    json_response(StatusCode::OK, tables)
}

async fn handle_generate(
    req: Request<Incoming>,
    state: &AppState,
    request_id: Uuid,
) -> Result<Response<Full<Bytes>>, ApiError> {
    let body = read_body_with_limit(req, state.config.max_body_bytes).await?;
    let request: GenerateRequest = parse_json(&body)?;
    let params = request.params(state.config.max_images)?;
    let prompt = request.prompt.unwrap_or_default();

    info!(
        "[{}] text-to-image: {} image(s), guidance {}, {} steps",
        request_id, params.num_images, params.guidance_scale, params.steps
    );

    let outcome = state.pipeline.generate(&prompt, &params).await;
    Ok(outcome_response(outcome, prompt, state.config.jpeg_quality).await)
}

async fn handle_generate_from_image(
    req: Request<Incoming>,
    state: &AppState,
    request_id: Uuid,
) -> Result<Response<Full<Bytes>>, ApiError> {
    let body = read_body_with_limit(req, state.config.max_body_bytes).await?;
    let request: GenerateFromImageRequest = parse_json(&body)?;

    let encoded = match request.image.as_deref().map(str::trim) {
        Some(image) if !image.is_empty() => image.to_string(),
        _ => return Err(ApiError::invalid("No image provided.")),
    };
    let params = request.params(state.config.max_images)?;
    let strength = request.strength()?;

    let init_image = decode_seed_image_blocking(encoded).await?;

    let prompt = request.prompt.unwrap_or_default();

    info!(
        "[{}] img2img: {} image(s), guidance {}, {} steps, strength {}",
        request_id, params.num_images, params.guidance_scale, params.steps, strength
    );

    let outcome = state
        .pipeline
        .generate_from_image(&init_image, &prompt, &params, strength)
        .await;
    Ok(outcome_response(outcome, prompt, state.config.jpeg_quality).await)
}

/// Decode the seed image off the async runtime.
/// Bad input is a client error; a failed decode task is a server fault.
async fn decode_seed_image_blocking(encoded: String) -> Result<Vec<u8>, ApiError> {
    tokio::task::spawn_blocking(move || decode_seed_image(&encoded))
        .await
        .map_err(|e| ApiError::Internal(format!("image decode task failed: {}", e)))?
        .map_err(|e| ApiError::invalid(format!("Invalid image: {}", e)))
}

/// Encode rendered images for transport and pick the status.
/// A slot that fails to encode is reported like a failed render.
pub async fn outcome_response(
    outcome: GenerationOutcome,
    original_prompt: String,
    jpeg_quality: u8,
) -> Response<Full<Bytes>> {
    let GenerationOutcome {
        enhanced_prompt,
        images,
        error,
    } = outcome;
    let requested = images.len();

    let encoded = tokio::task::spawn_blocking(move || {
        images
            .into_iter()
            .map(|slot| slot.map(|bytes| encode_for_transport(&bytes, jpeg_quality)))
            .collect::<Vec<_>>()
    })
    .await
    .unwrap_or_else(|e| {
        error!("Image encoding task failed: {}", e);
        Vec::new()
    });

    let mut errors: Vec<String> = error.into_iter().collect();
    let mut images: Vec<Option<String>> = Vec::with_capacity(requested);
    for slot in encoded {
        match slot {
            Some(Ok(b64)) => images.push(Some(b64)),
            Some(Err(e)) => {
                warn!("Failed to encode generated image: {}", e);
                errors.push(format!("Error: {}", e));
                images.push(None);
            }
            None => images.push(None),
        }
    }
    if images.len() < requested {
        errors.push("Error: image encoding failed".to_string());
        images.resize(requested, None);
    }

    let all_failed = requested > 0 && images.iter().all(Option::is_none);
    let error = if errors.is_empty() {
        None
    } else if all_failed {
        Some(ApiError::Generation(errors.join("; ")).to_string())
    } else {
        Some(errors.join("; "))
    };

    let status = if all_failed {
        StatusCode::INTERNAL_SERVER_ERROR
    } else {
        StatusCode::OK
    };

    json_response(
        status,
        &GenerateResponse {
            images,
            enhanced_prompt,
            original_prompt,
            error,
        },
    )
}

fn parse_json<T: DeserializeOwned>(body: &Bytes) -> Result<T, ApiError> {
    serde_json::from_slice(body).map_err(|_| ApiError::invalid("Invalid request body"))
}

/// Add CORS headers; the web client is served from another origin
pub fn cors_response(mut response: Response<Full<Bytes>>) -> Response<Full<Bytes>> {
    let headers = response.headers_mut();
    headers.insert("Access-Control-Allow-Origin", HeaderValue::from_static("*"));
    headers.insert(
        "Access-Control-Allow-Methods",
        HeaderValue::from_static("GET, POST, OPTIONS"),
    );
    headers.insert(
        "Access-Control-Allow-Headers",
        HeaderValue::from_static("Content-Type"),
    );
    response
}

/// Read request body with size limit (streaming enforcement to prevent memory exhaustion)
async fn read_body_with_limit(req: Request<Incoming>, max_size: usize) -> Result<Bytes, ApiError> {
    let limited = Limited::new(req.into_body(), max_size);
    match limited.collect().await {
        Ok(collected) => Ok(collected.to_bytes()),
        Err(e) => {
            if e.to_string().contains("length limit exceeded") {
                Err(ApiError::BodyTooLarge(max_size))
            } else {
                Err(ApiError::invalid("Failed to read body"))
            }
        }
    }
}

fn empty_response(status: StatusCode) -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(Bytes::new()));
    *response.status_mut() = status;
    response
}

/// Create JSON error response
pub fn json_error_response(error: &ApiError) -> Response<Full<Bytes>> {
    json_response(error.status(), &json!({ "error": error.to_string() }))
}

/// Create JSON response
pub fn json_response<T: Serialize + ?Sized>(status: StatusCode, body: &T) -> Response<Full<Bytes>> {
    let body = serde_json::to_string(body).unwrap_or_else(|e| {
        json!({ "error": format!("Serialization failed: {}", e) }).to_string()
    });
    let mut response = Response::new(Full::new(Bytes::from(body)));
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    response
}
