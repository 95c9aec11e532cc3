#[derive(Clone)]
pub struct Config {
    pub dataset_path: String,
    pub bind_addr: String,
    pub default_department: String,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            dataset_path: std::env::var("DATASET_PATH")
                .unwrap_or_else(|_| "data/datos_abiertos_vigilancia_dengue_2000_2023.csv".to_string()),
            bind_addr: std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8050".to_string()),
            default_department: std::env::var("DEFAULT_DEPARTMENT").unwrap_or_else(|_| "PIURA".to_string()),
        }
    }
}
