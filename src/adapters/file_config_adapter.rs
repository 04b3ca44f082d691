//! INI file configuration adapter.
//!
//! Sections read by vixpe:
//!
//! ```ini
//! [data]
//! date_column = Date
//! close_column = Nifty_Close
//! indicator_a_column = VIX
//! indicator_b_column = Nifty_PE
//! date_format = %Y-%m-%d
//! lenient = false
//!
//! [strategy]
//! name = VIX + PE
//! entry_a_max = 13
//! entry_b_max = 18
//! entry_combine = and
//! exit_a_min = 18
//! exit_b_min = 22
//! max_holding_days = 30
//! entry = AND(AT_MOST(vix, 13), AT_MOST(pe, 18))
//! exit = OR(AT_LEAST(vix, 18), AT_LEAST(pe, 22))
//! ```

use crate::domain::config_validation::parse_flag;
use crate::domain::error::VixpeError;
use crate::ports::config_port::ConfigPort;
use configparser::ini::Ini;
use std::path::Path;

#[derive(Debug)]
pub struct FileConfigAdapter {
    config: Ini,
}

impl FileConfigAdapter {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, VixpeError> {
        let path = path.as_ref();
        let mut config = Ini::new();
        config
            .load(path)
            .map_err(|reason| VixpeError::ConfigParse {
                file: path.display().to_string(),
                reason,
            })?;
        Ok(Self { config })
    }

    pub fn from_string(content: &str) -> Result<Self, VixpeError> {
        let mut config = Ini::new();
        config
            .read(content.to_string())
            .map_err(|reason| VixpeError::ConfigParse {
                file: "<string>".to_string(),
                reason,
            })?;
        Ok(Self { config })
    }

    /// An adapter with no keys; every lookup falls back to its default.
    pub fn empty() -> Self {
        Self { config: Ini::new() }
    }
}

impl ConfigPort for FileConfigAdapter {
    fn get_string(&self, section: &str, key: &str) -> Option<String> {
        self.config.get(section, key)
    }

    fn get_int(&self, section: &str, key: &str, default: i64) -> i64 {
        self.config
            .getint(section, key)
            .ok()
            .flatten()
            .unwrap_or(default)
    }

    fn get_double(&self, section: &str, key: &str, default: f64) -> f64 {
        self.config
            .getfloat(section, key)
            .ok()
            .flatten()
            .unwrap_or(default)
    }

    fn get_bool(&self, section: &str, key: &str, default: bool) -> bool {
        self.config
            .get(section, key)
            .as_deref()
            .and_then(parse_flag)
            .unwrap_or(default)
    }
}
