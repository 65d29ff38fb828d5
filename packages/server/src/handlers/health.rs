/// Liveness probe. Does not touch the metadata store.
pub async fn ping() -> &'static str {
    "pong"
}
