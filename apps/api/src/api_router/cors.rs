use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderValue, Method};
use appdeck_core::AppError;
use tower_http::cors::{AllowOrigin, CorsLayer};

const PREVIEW_METHODS: [Method; 5] = [
    Method::GET,
    Method::POST,
    Method::PUT,
    Method::DELETE,
    Method::OPTIONS,
];

/// Builds the CORS layer for the editor frontend.
///
/// `frontend_urls` may list several origins separated by commas.
pub(super) fn build_cors_layer(frontend_urls: &str) -> Result<CorsLayer, AppError> {
    let origins = parse_origins(frontend_urls)?;

    Ok(CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(PREVIEW_METHODS)
        .allow_headers([CONTENT_TYPE]))
}

fn parse_origins(frontend_urls: &str) -> Result<Vec<HeaderValue>, AppError> {
    let origins = frontend_urls
        .split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .map(|origin| {
            HeaderValue::from_str(origin.trim_end_matches('/')).map_err(|error| {
                AppError::Validation(format!("invalid FRONTEND_URL origin '{origin}': {error}"))
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    if origins.is_empty() {
        return Err(AppError::Validation(
            "FRONTEND_URL must name at least one origin".to_owned(),
        ));
    }

    Ok(origins)
}

#[cfg(test)]
mod tests {
    use appdeck_core::AppError;

    use super::parse_origins;

    #[test]
    fn splits_and_normalizes_origins() {
        let origins = parse_origins("http://localhost:3000/, https://deck.example.com")
            .unwrap_or_default();
        assert_eq!(
            origins,
            vec!["http://localhost:3000", "https://deck.example.com"]
        );
    }

    #[test]
    fn rejects_blank_or_invalid_origins() {
        assert!(matches!(parse_origins(" , "), Err(AppError::Validation(_))));
        assert!(matches!(
            parse_origins("http://bad\norigin"),
            Err(AppError::Validation(_))
        ));
    }
}
