//! HTTP lookup service.
//!
//! | Route                                   | Response                     |
//! |-----------------------------------------|------------------------------|
//! | `GET /locate?callnumber=..&location=..` | `LocateResult`               |
//! | `GET /health`                           | loaded locations, build time |
//!
//! Not-located answers are still `200`; only a missing parameter is `400`.

mod lifecycle;
mod response;
mod snapshot;

use crate::{
    config::LocatorConfig,
    debug, log,
    utils::date::display_millis,
};
use anyhow::Result;
use crossbeam::channel;
use response::Reply;
use serde::Serialize;
use snapshot::{Snapshot, Snapshots};
use std::borrow::Cow;
use std::sync::Arc;
use tiny_http::{Method, Request, Server};

/// Bind, load every location and answer requests until Ctrl+C.
pub fn serve(config: &LocatorConfig) -> Result<()> {
    let snapshots = Arc::new(Snapshots::load(
        config.location_codes().map(String::from).collect(),
        Arc::new(config.normalizer()),
        Box::new(config.artifact_store()),
        Box::new(config.meta_store()),
    ));
    let first = snapshots.current();
    if first.cache.is_empty() {
        log!("warning"; "no location loaded, every lookup will answer no_index");
    } else {
        log!("serve"; "loaded {}", first.cache.locations().join(", "));
    }
    drop(first);

    let (server, addr) = lifecycle::bind_with_retry(config.serve.interface, config.serve.port)?;
    let server = Arc::new(server);

    let (shutdown_tx, shutdown_rx) = channel::unbounded::<()>();
    lifecycle::register_shutdown(Arc::clone(&server), shutdown_tx.clone())?;

    let reloader = config.serve.reload_interval().map(|interval| {
        debug!("serve"; "checking for new indexes every {}s", interval.as_secs());
        lifecycle::spawn_reloader(Arc::clone(&snapshots), interval, shutdown_rx)
    });

    log!("serve"; "http://{}", addr);
    run_request_loop(&server, &snapshots);

    let _ = shutdown_tx.send(());
    lifecycle::wait_for_shutdown(reloader);
    Ok(())
}

fn run_request_loop(server: &Server, snapshots: &Arc<Snapshots>) {
    let pool = match rayon::ThreadPoolBuilder::new().num_threads(4).build() {
        Ok(pool) => pool,
        Err(e) => {
            log!("error"; "failed to create thread pool: {}", e);
            return;
        }
    };

    for request in server.incoming_requests() {
        let snapshots = Arc::clone(snapshots);
        pool.spawn(move || {
            if let Err(e) = handle_request(request, &snapshots) {
                log!("serve"; "request error: {e}");
            }
        });
    }
}

fn handle_request(request: Request, snapshots: &Snapshots) -> Result<()> {
    if lifecycle::is_shutdown() {
        return response::respond_unavailable(request);
    }

    let reply = match request.method() {
        Method::Get | Method::Head => route(request.url(), &snapshots.current()),
        _ => Reply::error(405, "method not allowed"),
    };
    debug!("serve"; "{} {} -> {}", request.method(), request.url(), reply.status);
    response::send(request, reply)
}

/// Answer a request URL (path and query string) from `snapshot`.
fn route(url: &str, snapshot: &Snapshot) -> Reply {
    let (path, query) = url.split_once('?').unwrap_or((url, ""));

    match path.trim_end_matches('/') {
        "/locate" => {
            let params = QueryParams::parse(query);
            let call_number = match params.required("callnumber") {
                Ok(value) => value,
                Err(reply) => return reply,
            };
            let location = match params.required("location") {
                Ok(value) => value,
                Err(reply) => return reply,
            };
            Reply::ok(&snapshot.cache.resolve(&call_number, &location))
        }
        "/health" => Reply::ok(&Health::of(snapshot)),
        _ => Reply::not_found(),
    }
}

/// Decoded query string pairs.
struct QueryParams<'a> {
    pairs: Vec<(Cow<'a, str>, Cow<'a, str>)>,
}

impl<'a> QueryParams<'a> {
    fn parse(query: &'a str) -> Self {
        Self {
            pairs: url::form_urlencoded::parse(query.as_bytes()).collect(),
        }
    }

    /// First non-blank value of `name`, or a `400` reply.
    fn required(&self, name: &str) -> Result<String, Reply> {
        self.pairs
            .iter()
            .find(|(key, value)| key == name && !value.trim().is_empty())
            .map(|(_, value)| value.to_string())
            .ok_or_else(|| Reply::bad_request(format!("missing parameter `{name}`")))
    }
}

#[derive(Serialize)]
struct Health<'a> {
    status: &'static str,
    locations: Vec<&'a str>,
    updated: Option<u64>,
    updated_at: Option<String>,
}

impl<'a> Health<'a> {
    fn of(snapshot: &'a Snapshot) -> Self {
        Self {
            status: "ok",
            locations: snapshot.cache.locations(),
            updated: snapshot.updated,
            updated_at: snapshot.updated.map(display_millis),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::callnumber::LcNormalizer;
    use crate::index::{ArtifactStore, JsonArtifactStore, build_location};
    use crate::locate::LocationCache;
    use serde_json::json;
    use tempfile::TempDir;

    fn snapshot() -> (TempDir, Snapshot) {
        let dir = TempDir::new().unwrap();
        let store = JsonArtifactStore::new(dir.path());
        let rows = json!([
            {"begin": "PS3568.U8", "aisle": "12A", "floor": "3"},
            {"begin": "QA76.73", "aisle": "14B", "floor": "3"},
        ]);
        let rows = rows
            .as_array()
            .unwrap()
            .iter()
            .map(|r| r.as_object().cloned().unwrap());
        let (data, _) = build_location("rock", rows, &LcNormalizer);
        store.save("rock", &data).unwrap();

        let cache = LocationCache::load(["rock"], &store, Arc::new(LcNormalizer));
        (
            dir,
            Snapshot {
                cache,
                updated: Some(1_718_461_845_000),
                stamps: Vec::new(),
            },
        )
    }

    #[test]
    fn test_route_locate() {
        let (_dir, snapshot) = snapshot();
        let reply = route(
            "/locate?callnumber=PS3568.U812%20R57x%201994&location=rock",
            &snapshot,
        );
        assert_eq!(reply.status, 200);
        assert_eq!(
            reply.body,
            json!({
                "floor": "3",
                "aisle": "12A",
                "display_aisle": "12",
                "side": "A",
                "location": "rock",
                "located": true,
                "reason": null,
            })
        );
    }

    #[test]
    fn test_route_not_located_is_ok() {
        let (_dir, snapshot) = snapshot();
        let reply = route("/locate?callnumber=AA1&location=ROCK", &snapshot);
        assert_eq!(reply.status, 200);
        assert_eq!(reply.body["located"], false);
        assert_eq!(reply.body["reason"], "before_first_range");

        let reply = route("/locate?callnumber=QA1&location=sci", &snapshot);
        assert_eq!(reply.body["reason"], "no_index");
    }

    #[test]
    fn test_route_missing_parameter() {
        let (_dir, snapshot) = snapshot();
        let reply = route("/locate?callnumber=QA76", &snapshot);
        assert_eq!(reply.status, 400);
        assert_eq!(reply.body["error"], "missing parameter `location`");

        let reply = route("/locate?callnumber=+&location=rock", &snapshot);
        assert_eq!(reply.status, 400);
        assert_eq!(reply.body["error"], "missing parameter `callnumber`");
    }

    #[test]
    fn test_route_health_and_unknown() {
        let (_dir, snapshot) = snapshot();
        let reply = route("/health", &snapshot);
        assert_eq!(
            reply.body,
            json!({
                "status": "ok",
                "locations": ["rock"],
                "updated": 1_718_461_845_000u64,
                "updated_at": "2024-06-15T14:30:45Z",
            })
        );

        assert_eq!(route("/", &snapshot).status, 404);
        assert_eq!(route("/locate/extra", &snapshot).status, 404);
    }
}
