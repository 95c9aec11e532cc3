use anyhow::{bail, Context, Result};
use std::path::Path;
use std::sync::Arc;

use denguewatch::config::Config;
use denguewatch::dataset;
use denguewatch::logging::{json_log, log_at, obj, v_num, v_str, Domain, Level};
use denguewatch::server::{router, AppState};

#[tokio::main]
async fn main() -> Result<()> {
    let cfg = Config::from_env();
    let path = Path::new(&cfg.dataset_path);

    let schema = dataset::validate_schema(path).map_err(anyhow::Error::msg)?;
    if !schema.ok {
        bail!("dataset schema invalid: {}", schema.message);
    }

    let ds = dataset::load_csv(path).map_err(anyhow::Error::msg)?;
    let hash = dataset::file_sha256(path).map_err(anyhow::Error::msg)?;
    json_log(
        Domain::Dataset,
        obj(&[
            ("path", v_str(&cfg.dataset_path)),
            ("rows", v_num(ds.len() as f64)),
            ("bad_rows", v_num(ds.bad_rows() as f64)),
            ("departments", v_num(ds.departments().len() as f64)),
            ("sha256", v_str(&hash)),
        ]),
    );
    if ds.is_empty() {
        log_at(
            Level::Warn,
            Domain::Dataset,
            obj(&[("warning", v_str("dataset_has_no_rows"))]),
        );
    }

    let state = AppState::new(Arc::new(ds), cfg.default_department.clone());
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(&cfg.bind_addr)
        .await
        .with_context(|| format!("bind {}", cfg.bind_addr))?;
    json_log(
        Domain::System,
        obj(&[
            ("status", v_str("listening")),
            ("addr", v_str(&cfg.bind_addr)),
            ("default_department", v_str(&cfg.default_department)),
        ]),
    );
    axum::serve(listener, app).await?;
    Ok(())
}
