use serde_json::json;

pub fn client() -> reqwest::Client {
    reqwest::Client::new()
}

pub fn exit_error(message: &str, docs_hint: Option<&str>) -> ! {
    let mut err = json!({
        "error": "cli_error",
        "message": message
    });
    if let Some(hint) = docs_hint {
        err["docs_hint"] = json!(hint);
    }
    eprintln!("{}", pretty(&err));
    std::process::exit(1);
}

pub fn pretty(value: &serde_json::Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

/// Response of a completed request: HTTP status plus parsed JSON body.
pub struct ApiResponse {
    pub status: u16,
    pub body: serde_json::Value,
}

impl ApiResponse {
    /// Exit codes: 0=success (2xx), 1=client error (4xx), 2=server error (5xx)
    pub fn exit_code(&self) -> i32 {
        match self.status {
            200..=299 => 0,
            400..=499 => 1,
            _ => 2,
        }
    }
}

/// Send a request and decode the JSON body. Connection failures print a
/// structured error and map to exit code 3.
pub async fn api_request(
    api_url: &str,
    method: reqwest::Method,
    path: &str,
    body: Option<serde_json::Value>,
) -> Result<ApiResponse, i32> {
    let url = format!("{}{path}", api_url.trim_end_matches('/'));
    tracing::debug!(%method, %url, "sending request");

    let mut req = client().request(method, &url);
    if let Some(b) = body {
        req = req.json(&b);
    }

    let resp = match req.send().await {
        Ok(r) => r,
        Err(e) => {
            let err = json!({
                "error": "connection_error",
                "message": format!("{e}"),
                "docs_hint": "Is the API server running? Check LOSTFOUND_API_URL."
            });
            eprintln!("{}", pretty(&err));
            return Err(3);
        }
    };

    let status = resp.status().as_u16();
    tracing::debug!(status, "response received");

    let body = match resp.json::<serde_json::Value>().await {
        Ok(v) => v,
        Err(e) => json!({"error": "invalid_response", "message": format!("{e}")}),
    };

    Ok(ApiResponse { status, body })
}
