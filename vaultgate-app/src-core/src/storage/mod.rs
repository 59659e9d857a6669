mod config;

pub use config::{
    apply_env_overrides, default_data_dir, init_data_dir, load_settings, save_settings,
    AppSettings, LockPolicy, DATA_DIR_ENV, DATA_SERVICE_ENV,
};
