use crate::util::{api_request, pretty};

pub async fn run(api_url: &str) -> i32 {
    match api_request(api_url, reqwest::Method::GET, "/health", None).await {
        Ok(response) => {
            println!("{}", pretty(&response.body));
            response.exit_code()
        }
        Err(code) => code,
    }
}
