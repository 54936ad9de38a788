//! Loading a dataset from remote URLs

use super::{ImageResolver, LoadedData, parse_json};
use crate::{DataError, Result};
use serde_json::Value;

/// Where to fetch a remote dataset from. Only the geometry URL is required.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RemoteSource {
    pub geometry_url: String,
    pub metadata_url: Option<String>,
    pub objects_url: Option<String>,
    /// Base path images are served under, joined with the image id
    pub image_base_path: Option<String>,
}

impl RemoteSource {
    pub fn new(geometry_url: impl Into<String>) -> Self {
        Self {
            geometry_url: geometry_url.into(),
            ..Default::default()
        }
    }
}

/// Builds image URLs from a base path. Holds no resources.
#[derive(Debug, Clone)]
pub struct RemoteImageResolver {
    base_path: Option<String>,
}

impl RemoteImageResolver {
    pub fn new(base_path: Option<&str>) -> Self {
        Self {
            base_path: non_blank(base_path).map(|base| base.trim_end_matches('/').to_string()),
        }
    }
}

impl ImageResolver for RemoteImageResolver {
    fn resolve(&mut self, image_id: &str) -> Option<String> {
        let base = self.base_path.as_ref()?;
        Some(format!("{}/{}", base, image_id))
    }

    fn cleanup(&mut self) {}
}

/// Fetch a dataset.
///
/// Geometry, metadata and objects are requested concurrently; the first failure
/// aborts the whole load. Missing or blank optional URLs are simply absent.
pub async fn load_from_urls(source: &RemoteSource) -> Result<LoadedData> {
    #[cfg(feature = "profiling")]
    profiling::scope!("loader::load_from_urls");

    let client = reqwest::Client::new();

    let (trajectory_geometry, shot_metadata, object_annotations) = tokio::try_join!(
        fetch_json(&client, &source.geometry_url),
        fetch_optional_json(&client, non_blank(source.metadata_url.as_deref())),
        fetch_optional_json(&client, non_blank(source.objects_url.as_deref())),
    )?;

    tracing::info!("Loaded dataset from {}", source.geometry_url);

    Ok(LoadedData {
        trajectory_geometry,
        shot_metadata,
        object_annotations,
        image_resolver: Box::new(RemoteImageResolver::new(
            source.image_base_path.as_deref(),
        )),
    })
}

fn non_blank(url: Option<&str>) -> Option<&str> {
    url.map(str::trim).filter(|url| !url.is_empty())
}

async fn fetch_json(client: &reqwest::Client, url: &str) -> Result<Value> {
    let http_error = |source| DataError::Http {
        url: url.to_string(),
        source,
    };

    tracing::debug!("Fetching {}", url);
    let text = client
        .get(url)
        .send()
        .await
        .map_err(http_error)?
        .error_for_status()
        .map_err(http_error)?
        .text()
        .await
        .map_err(http_error)?;

    parse_json(url, &text)
}

async fn fetch_optional_json(client: &reqwest::Client, url: Option<&str>) -> Result<Option<Value>> {
    match url {
        Some(url) => fetch_json(client, url).await.map(Some),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    type Route = (&'static str, u16, &'static str);

    /// Minimal HTTP server answering each path with a fixed status and body
    async fn serve(routes: Vec<Route>) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                let routes = routes.clone();
                tokio::spawn(async move {
                    let mut buf = vec![0u8; 4096];
                    let n = socket.read(&mut buf).await.unwrap_or(0);
                    let request = String::from_utf8_lossy(&buf[..n]).to_string();
                    let path = request.split_whitespace().nth(1).unwrap_or("/");
                    let (status, body) = routes
                        .iter()
                        .find(|(p, _, _)| *p == path)
                        .map(|(_, status, body)| (*status, *body))
                        .unwrap_or((404, "not found"));
                    let response = format!(
                        "HTTP/1.1 {} X\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                        status,
                        body.len(),
                        body
                    );
                    let _ = socket.write_all(response.as_bytes()).await;
                });
            }
        });

        format!("http://{}", addr)
    }

    const GEOMETRY: &str = r#"{"trajectories": [{"cameras": [
        {"id": "img1", "coordinates": [47.671, -122.274, 14.3], "rotation": [0, 0, 0, 1]}
    ]}]}"#;

    #[test]
    fn test_resolver_joins_base_path() {
        let mut resolver = RemoteImageResolver::new(Some("https://cdn.example.com/run1/images/"));
        assert_eq!(
            resolver.resolve("img1.jpg").as_deref(),
            Some("https://cdn.example.com/run1/images/img1.jpg")
        );

        let mut resolver = RemoteImageResolver::new(Some("./images"));
        assert_eq!(resolver.resolve("a.png").as_deref(), Some("./images/a.png"));
    }

    #[test]
    fn test_resolver_without_base_path() {
        let mut resolver = RemoteImageResolver::new(None);
        assert!(resolver.resolve("img1.jpg").is_none());

        let mut resolver = RemoteImageResolver::new(Some("   "));
        assert!(resolver.resolve("img1.jpg").is_none());

        resolver.cleanup();
        resolver.cleanup();
    }

    #[tokio::test]
    async fn test_load_all_urls() {
        let base = serve(vec![
            ("/trajectory.geojson", 200, GEOMETRY),
            ("/trajectory.json", 200, r#"[{"shots": {"img1": {"capture_time": 3.5}}}]"#),
            ("/objects.geojson", 200, r#"{"type": "FeatureCollection", "features": []}"#),
        ])
        .await;

        let source = RemoteSource {
            geometry_url: format!("{}/trajectory.geojson", base),
            metadata_url: Some(format!("{}/trajectory.json", base)),
            objects_url: Some(format!("{}/objects.geojson", base)),
            image_base_path: Some(format!("{}/images", base)),
        };
        let mut data = load_from_urls(&source).await.unwrap();

        let trajectory = data.parse();
        assert_eq!(trajectory.cameras[0].capture_time, Some(3.5));
        assert!(data.objects().is_some());
        assert_eq!(
            data.resolve_image("img1.jpg"),
            Some(format!("{}/images/img1.jpg", base))
        );
        data.cleanup();
    }

    #[tokio::test]
    async fn test_optional_urls_absent() {
        let base = serve(vec![("/t.geojson", 200, GEOMETRY)]).await;

        let mut source = RemoteSource::new(format!("{}/t.geojson", base));
        source.metadata_url = Some(String::new());
        let data = load_from_urls(&source).await.unwrap();

        assert!(data.shot_metadata.is_none());
        assert!(data.object_annotations.is_none());
        assert_eq!(data.parse().len(), 1);
    }

    #[tokio::test]
    async fn test_error_status_fails_whole_load() {
        let base = serve(vec![("/t.geojson", 200, GEOMETRY)]).await;

        let mut source = RemoteSource::new(format!("{}/t.geojson", base));
        source.metadata_url = Some(format!("{}/missing.json", base));
        let err = load_from_urls(&source).await.unwrap_err();
        assert!(matches!(err, DataError::Http { ref url, .. } if url.ends_with("missing.json")));
    }

    #[tokio::test]
    async fn test_malformed_json_fails() {
        let base = serve(vec![("/t.geojson", 200, "<html>")]).await;
        let err = load_from_urls(&RemoteSource::new(format!("{}/t.geojson", base)))
            .await
            .unwrap_err();
        assert!(matches!(err, DataError::Json { .. }));
    }

    #[tokio::test]
    async fn test_unreachable_source_fails() {
        let err = load_from_urls(&RemoteSource::new("http://127.0.0.1:1/trajectory.geojson"))
            .await
            .unwrap_err();
        assert!(matches!(err, DataError::Http { .. }));
    }
}
